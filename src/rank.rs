//! Best-segment-per-metric ranking over the pivoted segment table

use serde::Serialize;

use crate::data::{Metric, Statistic};
use crate::error::ReportError;
use crate::reshape::WideSegmentRow;

/// The segment with the highest median for one metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricLeader {
    pub metric: Metric,
    pub segment: String,
    pub median: f64,
}

/// Find, for each requested metric, the segment whose `Median_{metric}` cell
/// is the numeric maximum.
///
/// Rows are scanned in input order and a tie keeps the first segment seen,
/// so repeated calls over the same table are identical. Rows whose median
/// cell is absent for a metric are skipped; if no row carries the metric the
/// ranking fails with [`ReportError::EmptyInput`].
pub fn best_segments(
    wide: &[WideSegmentRow],
    metrics: &[Metric],
) -> Result<Vec<MetricLeader>, ReportError> {
    metrics
        .iter()
        .map(|&metric| {
            let mut best: Option<(&str, f64)> = None;
            for row in wide {
                let Some(value) = row.get(Statistic::Median, metric) else {
                    continue;
                };
                match best {
                    Some((_, current)) if value <= current => {}
                    _ => best = Some((row.segment.as_str(), value)),
                }
            }
            let (segment, median) = best.ok_or(ReportError::EmptyInput { metric })?;
            Ok(MetricLeader {
                metric,
                segment: segment.to_string(),
                median,
            })
        })
        .collect()
}
