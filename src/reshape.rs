//! Long-to-wide pivot of the segment statistics table
//!
//! The renderer locates pivoted values by the exact column-name convention
//! `{Statistic}_{metric}` (capitalized statistic, lowercase metric), e.g.
//! `Median_recency`. Cells are a typed mapping from explicit
//! (statistic, metric) keys; nothing relies on positional flattening.

use std::collections::{BTreeMap, HashMap};

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::data::{Metric, SegmentMetricStat, Statistic};
use crate::error::ReportError;

/// Renderer-facing name of a pivoted cell, e.g. `Median_recency`.
pub fn column_name(statistic: Statistic, metric: Metric) -> String {
    format!("{}_{}", statistic.as_str(), metric.as_str())
}

/// One pivoted row: a segment plus its (statistic, metric) cells.
///
/// A (segment, metric) pair absent from the source long table leaves the
/// corresponding cells absent here, never zero-filled.
#[derive(Debug, Clone, PartialEq)]
pub struct WideSegmentRow {
    pub segment: String,
    cells: BTreeMap<(Statistic, Metric), f64>,
}

impl WideSegmentRow {
    fn new(segment: &str) -> Self {
        WideSegmentRow {
            segment: segment.to_string(),
            cells: BTreeMap::new(),
        }
    }

    /// The value of one cell, if the source table carried it.
    pub fn get(&self, statistic: Statistic, metric: Metric) -> Option<f64> {
        self.cells.get(&(statistic, metric)).copied()
    }

    /// All populated cells, ordered by (statistic, metric).
    pub fn cells(&self) -> impl Iterator<Item = (Statistic, Metric, f64)> + '_ {
        self.cells
            .iter()
            .map(|(&(statistic, metric), &value)| (statistic, metric, value))
    }
}

impl Serialize for WideSegmentRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1 + self.cells.len()))?;
        map.serialize_entry("Segment", &self.segment)?;
        for ((statistic, metric), value) in &self.cells {
            map.serialize_entry(&column_name(*statistic, *metric), value)?;
        }
        map.end()
    }
}

/// Pivot the long-format statistics table into one row per segment.
///
/// Rows come out in first-appearance order of their segment. A repeated
/// (segment, metric) key is an input-integrity violation and fails with
/// [`ReportError::DuplicateKey`] instead of picking one value arbitrarily.
pub fn pivot_segment_stats(rows: &[SegmentMetricStat]) -> Result<Vec<WideSegmentRow>, ReportError> {
    let mut wide: Vec<WideSegmentRow> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let slot = match index.get(&row.segment) {
            Some(&i) => i,
            None => {
                index.insert(row.segment.clone(), wide.len());
                wide.push(WideSegmentRow::new(&row.segment));
                wide.len() - 1
            }
        };

        let target = &mut wide[slot];
        if target.cells.contains_key(&(Statistic::Mean, row.metric)) {
            return Err(ReportError::DuplicateKey {
                segment: row.segment.clone(),
                metric: row.metric,
            });
        }
        target.cells.insert((Statistic::Mean, row.metric), row.mean);
        target
            .cells
            .insert((Statistic::Median, row.metric), row.median);
        target
            .cells
            .insert((Statistic::Distribution, row.metric), row.distribution);
    }

    Ok(wide)
}
