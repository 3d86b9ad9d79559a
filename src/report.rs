//! Report assembly with per-section failure isolation
//!
//! Each derived product is computed independently; a failure in one section
//! never prevents the others from being built. The ranking section depends
//! on the pivot and inherits its error when the wide table is unavailable.

use serde::Serialize;
use serde_json::json;

use crate::correlation::{spearman_matrix, CorrelationMatrix};
use crate::data::{ClusterBucket, CustomerRecord, Metric, SegmentMetricStat};
use crate::distribution::validate_distribution;
use crate::error::ReportError;
use crate::rank::{best_segments, MetricLeader};
use crate::reshape::{pivot_segment_stats, WideSegmentRow};
use crate::stats::{summarize_by_segment, SegmentSummary};

/// The five derived products of one report cycle, each carried as its own
/// result so the caller can render a partial report with explicit
/// "unavailable" placeholders.
#[derive(Debug, Clone)]
pub struct ReportBundle {
    pub wide_segments: Result<Vec<WideSegmentRow>, ReportError>,
    pub segment_summaries: Result<Vec<SegmentSummary>, ReportError>,
    pub metric_leaders: Result<Vec<MetricLeader>, ReportError>,
    pub correlation: Result<CorrelationMatrix, ReportError>,
    pub value_distribution: Result<Vec<ClusterBucket>, ReportError>,
}

/// Build all five products from the three (already validated or failed)
/// input tables.
///
/// A table-level failure is propagated to exactly the sections that consume
/// that table; siblings built from the other tables still run.
pub fn build_report(
    customers: Result<Vec<CustomerRecord>, ReportError>,
    segment_stats: Result<Vec<SegmentMetricStat>, ReportError>,
    buckets: Result<Vec<ClusterBucket>, ReportError>,
    metrics: &[Metric],
) -> ReportBundle {
    let wide_segments = segment_stats.and_then(|rows| pivot_segment_stats(&rows));
    let metric_leaders = wide_segments
        .as_ref()
        .map_err(Clone::clone)
        .and_then(|wide| best_segments(wide, metrics));

    let segment_summaries = customers
        .as_ref()
        .map(|records| summarize_by_segment(records, metrics))
        .map_err(Clone::clone);
    let correlation = customers.map(|records| spearman_matrix(&records));

    let value_distribution = buckets.and_then(|table| validate_distribution(&table));

    ReportBundle {
        wide_segments,
        segment_summaries,
        metric_leaders,
        correlation,
        value_distribution,
    }
}

impl ReportBundle {
    /// JSON view of the bundle; failed sections become
    /// `{"status": "unavailable", "reason": ...}` objects.
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "segment_comparison": section_json(&self.wide_segments),
            "descriptive_statistics": section_json(&self.segment_summaries),
            "metric_leaders": section_json(&self.metric_leaders),
            "correlation": section_json(&self.correlation),
            "value_distribution": section_json(&self.value_distribution),
        })
    }
}

fn section_json<T: Serialize>(section: &Result<T, ReportError>) -> serde_json::Value {
    match section {
        Ok(data) => json!({ "status": "ok", "data": data }),
        Err(err) => json!({ "status": "unavailable", "reason": err.to_string() }),
    }
}
