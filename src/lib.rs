//! RfmLens: report analytics over a precomputed customer-segmentation dataset
//!
//! Turns three flat tables — per-customer RFM values with segment labels, a
//! long-format per-segment/per-metric statistics table, and a transaction-value
//! cluster distribution — into the derived products a segmentation report
//! renders: a wide segment table, per-segment descriptive statistics, a
//! best-segment-per-metric ranking, a Spearman correlation matrix, and a
//! validated value-distribution table.

pub mod cli;
pub mod correlation;
pub mod data;
pub mod distribution;
pub mod error;
pub mod rank;
pub mod report;
pub mod reshape;
pub mod schema;
pub mod stats;

// Re-export public items for easier access
pub use cli::Args;
pub use correlation::{spearman_matrix, CorrelationCell, CorrelationMatrix};
pub use data::{
    load_cluster_distribution, load_customer_table, load_segment_stats, ClusterBucket,
    CustomerRecord, Metric, SegmentMetricStat, Statistic, METRICS,
};
pub use distribution::validate_distribution;
pub use error::ReportError;
pub use rank::{best_segments, MetricLeader};
pub use report::{build_report, ReportBundle};
pub use reshape::{column_name, pivot_segment_stats, WideSegmentRow};
pub use stats::{summarize_by_segment, SegmentSummary};

/// Common result type used by the loader and CLI layers
pub type Result<T> = anyhow::Result<T>;
