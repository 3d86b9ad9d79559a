//! Per-segment descriptive statistics over the raw customer table

use std::collections::HashMap;

use serde::Serialize;

use crate::data::{CustomerRecord, Metric};

/// Display precision for summary statistics, in decimal places.
const SUMMARY_PRECISION: i32 = 2;

/// Mean, median and sample standard deviation of one metric within one
/// segment, rounded to display precision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentSummary {
    pub segment: String,
    pub metric: Metric,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
}

/// Summarize each requested metric per segment.
///
/// Only rows with a complete, finite RFM triple contribute. Segments left
/// empty by that filter are omitted rather than emitted as NaN rows, and a
/// single-customer segment reports a standard deviation of zero. Segment
/// order follows first appearance among the contributing rows.
pub fn summarize_by_segment(customers: &[CustomerRecord], metrics: &[Metric]) -> Vec<SegmentSummary> {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<[f64; 3]>> = HashMap::new();
    let mut filtered = 0usize;

    for record in customers {
        let Some(rfm) = record.complete_rfm() else {
            filtered += 1;
            continue;
        };
        if !groups.contains_key(record.segment.as_str()) {
            order.push(&record.segment);
        }
        groups.entry(record.segment.as_str()).or_default().push(rfm);
    }
    if filtered > 0 {
        log::debug!("descriptive stats: excluded {filtered} row(s) with missing RFM values");
    }

    let mut summaries = Vec::with_capacity(order.len() * metrics.len());
    for segment in order {
        let rows = &groups[segment];
        for &metric in metrics {
            let values: Vec<f64> = rows.iter().map(|rfm| rfm[metric.index()]).collect();
            let mean_value = mean(&values);
            summaries.push(SegmentSummary {
                segment: segment.to_string(),
                metric,
                mean: round_to(mean_value, SUMMARY_PRECISION),
                median: round_to(median(&values), SUMMARY_PRECISION),
                std_dev: round_to(sample_std(&values, mean_value), SUMMARY_PRECISION),
            });
        }
    }
    summaries
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Sample standard deviation with Bessel's correction; zero for a single
/// observation rather than NaN.
pub(crate) fn sample_std(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let variance = values
        .iter()
        .map(|v| {
            let diff = v - mean;
            diff * diff
        })
        .sum::<f64>()
        / (values.len() - 1) as f64;
    variance.sqrt()
}

pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
