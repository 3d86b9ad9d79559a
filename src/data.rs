//! Domain types and CSV table loading using Polars
//!
//! The loader reads the three precomputed tables the upstream segmentation
//! pipeline writes out: the per-customer RFM table, the long-format
//! per-segment statistics table, and the transaction-value cluster
//! distribution. Each load is gated by the schema validator before any
//! values are extracted.

use std::fmt;
use std::path::Path;

use anyhow::Context;
use polars::prelude::*;
use serde::Serialize;

use crate::schema::{validate_schema, ColumnSpec};

/// The three RFM metrics, in their canonical order.
pub const METRICS: [Metric; 3] = [Metric::Recency, Metric::Frequency, Metric::Monetary];

/// Table name used in schema errors for the per-customer RFM table.
pub const RFM_TABLE: &str = "rfm_df";
/// Table name used in schema errors for the long-format statistics table.
pub const SEGMENT_STATS_TABLE: &str = "segment_analysis";
/// Table name used in schema errors for the cluster distribution table.
pub const DISTRIBUTION_TABLE: &str = "segment_distribution";

/// One of the behavioral metrics characterizing a customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Recency,
    Frequency,
    Monetary,
}

impl Metric {
    /// Lowercase name as it appears in source tables and pivoted column names.
    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Recency => "recency",
            Metric::Frequency => "frequency",
            Metric::Monetary => "monetary",
        }
    }

    /// Parse a metric name from a source table (case-insensitive).
    pub fn parse(name: &str) -> Option<Metric> {
        match name.trim().to_ascii_lowercase().as_str() {
            "recency" => Some(Metric::Recency),
            "frequency" => Some(Metric::Frequency),
            "monetary" => Some(Metric::Monetary),
            _ => None,
        }
    }

    /// Position of this metric in [`METRICS`].
    pub(crate) fn index(self) -> usize {
        match self {
            Metric::Recency => 0,
            Metric::Frequency => 1,
            Metric::Monetary => 2,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the per-metric statistics the long table carries for each segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Statistic {
    Mean,
    Median,
    Distribution,
}

impl Statistic {
    /// Capitalized name, exactly as the renderer expects in pivoted columns.
    pub fn as_str(self) -> &'static str {
        match self {
            Statistic::Mean => "Mean",
            Statistic::Median => "Median",
            Statistic::Distribution => "Distribution",
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the per-customer RFM table.
///
/// Metric values are optional at ingest: rows with missing values are
/// excluded from the descriptive-statistics and correlation computations
/// rather than treated as fatal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerRecord {
    pub customer_id: String,
    pub recency: Option<f64>,
    pub frequency: Option<f64>,
    pub monetary: Option<f64>,
    pub segment: String,
}

impl CustomerRecord {
    /// The value of a single metric, if present.
    pub fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Recency => self.recency,
            Metric::Frequency => self.frequency,
            Metric::Monetary => self.monetary,
        }
    }

    /// All three metric values, if every one is present and finite.
    pub fn complete_rfm(&self) -> Option<[f64; 3]> {
        match (self.recency, self.frequency, self.monetary) {
            (Some(r), Some(f), Some(m)) if r.is_finite() && f.is_finite() && m.is_finite() => {
                Some([r, f, m])
            }
            _ => None,
        }
    }
}

/// One row of the long-format segment statistics table.
///
/// `distribution` is an auxiliary value computed upstream; it is carried
/// through the pivot unmodified.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentMetricStat {
    pub segment: String,
    pub metric: Metric,
    pub mean: f64,
    pub median: f64,
    pub distribution: f64,
}

/// One transaction-value tier of the cluster distribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterBucket {
    pub label: String,
    pub proportion: f64,
}

const RFM_COLUMNS: [ColumnSpec; 5] = [
    ColumnSpec::label("CustomerID"),
    ColumnSpec::numeric("recency"),
    ColumnSpec::numeric("frequency"),
    ColumnSpec::numeric("monetary"),
    ColumnSpec::label("Customer_Segment"),
];

const SEGMENT_STATS_COLUMNS: [ColumnSpec; 5] = [
    ColumnSpec::label("Segment"),
    ColumnSpec::label("Metric"),
    ColumnSpec::numeric("Mean"),
    ColumnSpec::numeric("Median"),
    ColumnSpec::numeric("Distribution"),
];

const DISTRIBUTION_COLUMNS: [ColumnSpec; 2] = [
    ColumnSpec::label("segment"),
    ColumnSpec::numeric("proportion"),
];

/// Load the per-customer RFM table.
///
/// Rows missing an id or segment label are skipped with a warning; rows
/// missing metric values are kept and filtered later by the consumers.
pub fn load_customer_table(path: &Path) -> crate::Result<Vec<CustomerRecord>> {
    let df = read_csv(path)?;
    validate_schema(RFM_TABLE, &df, &RFM_COLUMNS)?;

    let ids = df.column("CustomerID")?.cast(&DataType::String)?;
    let ids = ids.str()?;
    let recency = df.column("recency")?.cast(&DataType::Float64)?;
    let recency = recency.f64()?;
    let frequency = df.column("frequency")?.cast(&DataType::Float64)?;
    let frequency = frequency.f64()?;
    let monetary = df.column("monetary")?.cast(&DataType::Float64)?;
    let monetary = monetary.f64()?;
    let segments = df.column("Customer_Segment")?.cast(&DataType::String)?;
    let segments = segments.str()?;

    let mut records = Vec::with_capacity(df.height());
    let mut skipped = 0usize;
    for i in 0..df.height() {
        let (Some(id), Some(segment)) = (ids.get(i), segments.get(i)) else {
            skipped += 1;
            continue;
        };
        records.push(CustomerRecord {
            customer_id: id.to_string(),
            recency: recency.get(i),
            frequency: frequency.get(i),
            monetary: monetary.get(i),
            segment: segment.to_string(),
        });
    }
    if skipped > 0 {
        log::warn!("{RFM_TABLE}: skipped {skipped} row(s) missing an id or segment label");
    }
    log::debug!("{RFM_TABLE}: loaded {} customer record(s)", records.len());
    Ok(records)
}

/// Load the long-format segment statistics table.
pub fn load_segment_stats(path: &Path) -> crate::Result<Vec<SegmentMetricStat>> {
    let df = read_csv(path)?;
    validate_schema(SEGMENT_STATS_TABLE, &df, &SEGMENT_STATS_COLUMNS)?;

    let segments = df.column("Segment")?.cast(&DataType::String)?;
    let segments = segments.str()?;
    let metrics = df.column("Metric")?.cast(&DataType::String)?;
    let metrics = metrics.str()?;
    let means = df.column("Mean")?.cast(&DataType::Float64)?;
    let means = means.f64()?;
    let medians = df.column("Median")?.cast(&DataType::Float64)?;
    let medians = medians.f64()?;
    let distributions = df.column("Distribution")?.cast(&DataType::Float64)?;
    let distributions = distributions.f64()?;

    let mut rows = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let segment = segments
            .get(i)
            .with_context(|| format!("{SEGMENT_STATS_TABLE}: missing Segment at row {i}"))?;
        let metric_name = metrics
            .get(i)
            .with_context(|| format!("{SEGMENT_STATS_TABLE}: missing Metric at row {i}"))?;
        let metric = Metric::parse(metric_name).with_context(|| {
            format!("{SEGMENT_STATS_TABLE}: unknown metric '{metric_name}' at row {i}")
        })?;
        rows.push(SegmentMetricStat {
            segment: segment.to_string(),
            metric,
            mean: means
                .get(i)
                .with_context(|| format!("{SEGMENT_STATS_TABLE}: missing Mean at row {i}"))?,
            median: medians
                .get(i)
                .with_context(|| format!("{SEGMENT_STATS_TABLE}: missing Median at row {i}"))?,
            distribution: distributions.get(i).with_context(|| {
                format!("{SEGMENT_STATS_TABLE}: missing Distribution at row {i}")
            })?,
        });
    }
    log::debug!("{SEGMENT_STATS_TABLE}: loaded {} stat row(s)", rows.len());
    Ok(rows)
}

/// Load the transaction-value cluster distribution table.
pub fn load_cluster_distribution(path: &Path) -> crate::Result<Vec<ClusterBucket>> {
    let df = read_csv(path)?;
    validate_schema(DISTRIBUTION_TABLE, &df, &DISTRIBUTION_COLUMNS)?;

    let labels = df.column("segment")?.cast(&DataType::String)?;
    let labels = labels.str()?;
    let proportions = df.column("proportion")?.cast(&DataType::Float64)?;
    let proportions = proportions.f64()?;

    let mut buckets = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let label = labels
            .get(i)
            .with_context(|| format!("{DISTRIBUTION_TABLE}: missing segment label at row {i}"))?;
        let proportion = proportions
            .get(i)
            .with_context(|| format!("{DISTRIBUTION_TABLE}: missing proportion at row {i}"))?;
        buckets.push(ClusterBucket {
            label: label.to_string(),
            proportion,
        });
    }
    Ok(buckets)
}

fn read_csv(path: &Path) -> crate::Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.into()))?
        .finish()
        .with_context(|| format!("failed to read CSV table from {}", path.display()))?;
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(lines: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        file
    }

    #[test]
    fn test_load_customer_table() {
        let file = write_csv(&[
            "CustomerID,recency,frequency,monetary,Customer_Segment",
            "17850,5,10,500.0,Champions",
            "13047,40,1,20.0,Lost Customers",
        ]);

        let records = load_customer_table(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].customer_id, "17850");
        assert_eq!(records[0].segment, "Champions");
        assert_eq!(records[0].complete_rfm(), Some([5.0, 10.0, 500.0]));
    }

    #[test]
    fn test_missing_metric_value_is_not_fatal() {
        let file = write_csv(&[
            "CustomerID,recency,frequency,monetary,Customer_Segment",
            "17850,5,10,500.0,Champions",
            "13047,40,,20.0,Lost Customers",
        ]);

        let records = load_customer_table(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].frequency, None);
        assert_eq!(records[1].complete_rfm(), None);
    }

    #[test]
    fn test_missing_column_fails_schema() {
        let file = write_csv(&[
            "CustomerID,recency,frequency,Customer_Segment",
            "17850,5,10,Champions",
        ]);

        let err = load_customer_table(file.path()).unwrap_err();
        assert!(err.to_string().contains("monetary"), "got: {err}");
    }

    #[test]
    fn test_load_segment_stats() {
        let file = write_csv(&[
            "Segment,Metric,Mean,Median,Distribution",
            "Champions,recency,6.5,5.0,1.2",
            "Champions,monetary,480.0,500.0,0.8",
        ]);

        let rows = load_segment_stats(file.path()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].metric, Metric::Recency);
        assert_eq!(rows[1].median, 500.0);
    }

    #[test]
    fn test_unknown_metric_is_rejected() {
        let file = write_csv(&[
            "Segment,Metric,Mean,Median,Distribution",
            "Champions,velocity,1.0,1.0,1.0",
        ]);

        let err = load_segment_stats(file.path()).unwrap_err();
        assert!(err.to_string().contains("velocity"), "got: {err}");
    }

    #[test]
    fn test_load_cluster_distribution() {
        let file = write_csv(&[
            "segment,proportion",
            "Low-Value,0.2991",
            "Mid-Value,0.5992",
            "High-Value,0.1017",
        ]);

        let buckets = load_cluster_distribution(file.path()).unwrap();
        assert_eq!(buckets.len(), 3);
        assert_eq!(buckets[0].label, "Low-Value");
        assert_eq!(buckets[2].proportion, 0.1017);
    }
}
