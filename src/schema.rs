//! Column-contract validation for input tables
//!
//! Every table the loader hands to the analytics core passes through
//! [`validate_schema`] first. A failure here is fatal for the sections that
//! depend on the offending table, but siblings built from the other tables
//! still run.

use polars::prelude::*;

use crate::error::ReportError;

/// How a required column is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Values must parse as finite floating-point numbers (nulls allowed;
    /// missing values are the consumers' concern, not a schema violation).
    Numeric,
    /// Presence-only check; carried as an opaque label.
    Label,
}

/// A single column requirement.
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub kind: ColumnKind,
}

impl ColumnSpec {
    pub const fn numeric(name: &'static str) -> Self {
        ColumnSpec {
            name,
            kind: ColumnKind::Numeric,
        }
    }

    pub const fn label(name: &'static str) -> Self {
        ColumnSpec {
            name,
            kind: ColumnKind::Label,
        }
    }
}

/// Check that `df` carries every required column and that numeric columns
/// hold finite numbers.
///
/// Reports all missing columns at once; numeric violations are reported per
/// column with the first offending condition found.
pub fn validate_schema(
    table: &str,
    df: &DataFrame,
    required: &[ColumnSpec],
) -> Result<(), ReportError> {
    let present: Vec<&str> = df.get_column_names().iter().map(|s| s.as_str()).collect();

    let missing: Vec<&str> = required
        .iter()
        .map(|spec| spec.name)
        .filter(|name| !present.contains(name))
        .collect();
    if !missing.is_empty() {
        return Err(ReportError::Schema {
            table: table.to_string(),
            detail: format!("missing column(s): {}", missing.join(", ")),
        });
    }

    for spec in required.iter().filter(|s| s.kind == ColumnKind::Numeric) {
        let column = df.column(spec.name).map_err(|e| ReportError::Schema {
            table: table.to_string(),
            detail: e.to_string(),
        })?;
        let cast = column
            .cast(&DataType::Float64)
            .map_err(|_| ReportError::Schema {
                table: table.to_string(),
                detail: format!("column '{}' is not numeric", spec.name),
            })?;
        // Non-strict cast turns unparseable values into nulls; any new null
        // is a value that failed to parse as a number.
        if cast.null_count() > column.null_count() {
            return Err(ReportError::Schema {
                table: table.to_string(),
                detail: format!("column '{}' contains non-numeric values", spec.name),
            });
        }
        let values = cast.f64().map_err(|e| ReportError::Schema {
            table: table.to_string(),
            detail: e.to_string(),
        })?;
        if values.into_iter().flatten().any(|v| !v.is_finite()) {
            return Err(ReportError::Schema {
                table: table.to_string(),
                detail: format!("column '{}' contains non-finite values", spec.name),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn specs() -> [ColumnSpec; 2] {
        [ColumnSpec::label("segment"), ColumnSpec::numeric("value")]
    }

    #[test]
    fn test_valid_schema_passes() {
        let df = df!(
            "segment" => ["Champions", "Lost Customers"],
            "value" => [1.5, 2.5],
        )
        .unwrap();

        assert!(validate_schema("t", &df, &specs()).is_ok());
    }

    #[test]
    fn test_missing_columns_are_all_named() {
        let df = df!("other" => [1.0]).unwrap();

        let err = validate_schema("t", &df, &specs()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("segment") && message.contains("value"), "got: {message}");
    }

    #[test]
    fn test_non_numeric_values_are_rejected() {
        let df = df!(
            "segment" => ["Champions", "Loyal"],
            "value" => ["1.5", "not-a-number"],
        )
        .unwrap();

        let err = validate_schema("t", &df, &specs()).unwrap_err();
        assert!(err.to_string().contains("non-numeric"), "got: {err}");
    }

    #[test]
    fn test_numeric_strings_are_accepted() {
        let df = df!(
            "segment" => ["Champions"],
            "value" => ["1.5"],
        )
        .unwrap();

        assert!(validate_schema("t", &df, &specs()).is_ok());
    }

    #[test]
    fn test_non_finite_values_are_rejected() {
        let df = df!(
            "segment" => ["Champions"],
            "value" => [f64::NAN],
        )
        .unwrap();

        let err = validate_schema("t", &df, &specs()).unwrap_err();
        assert!(err.to_string().contains("non-finite"), "got: {err}");
    }

    #[test]
    fn test_nulls_in_numeric_column_are_allowed() {
        let df = df!(
            "segment" => ["Champions", "Loyal"],
            "value" => [Some(1.5), None],
        )
        .unwrap();

        assert!(validate_schema("t", &df, &specs()).is_ok());
    }
}
