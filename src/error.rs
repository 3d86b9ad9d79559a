//! Typed errors for the analytics core

use crate::data::Metric;
use thiserror::Error;

/// Failure modes of the report analytics components.
///
/// Clonable so the report assembler can hand the same failure to every
/// section that depends on the failed product.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReportError {
    /// An input table is missing required columns, or a numeric column
    /// carries values that do not parse as finite numbers.
    #[error("schema violation in table '{table}': {detail}")]
    Schema { table: String, detail: String },

    /// The long-format statistics table repeats a (segment, metric) key,
    /// which makes the pivot undefined.
    #[error("duplicate (segment, metric) key: ('{segment}', '{metric}')")]
    DuplicateKey { segment: String, metric: Metric },

    /// Ranking was requested for a metric no wide row carries.
    #[error("no segments carry a median for metric '{metric}'")]
    EmptyInput { metric: Metric },

    /// Cluster bucket proportions are negative or do not sum to 1.
    #[error("cluster distribution integrity violation: {detail}")]
    DistributionIntegrity { detail: String },
}
