//! Spearman rank correlation of the RFM metrics across all customers
//!
//! Spearman is computed as Pearson correlation over rank-transformed values,
//! with ties broken by average rank. Degenerate inputs (fewer than two
//! complete rows, or a constant metric) leave the affected cells explicitly
//! undefined instead of fabricating a 0 or 1.

use ndarray::Array2;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::data::{CustomerRecord, Metric, METRICS};
use crate::stats::round_to;

/// Display precision for correlation coefficients, in decimal places.
const CORRELATION_PRECISION: i32 = 3;

/// One entry of the correlation matrix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CorrelationCell {
    Defined(f64),
    /// Correlation is mathematically undefined for this pair (degenerate
    /// input); serialized as `null`.
    Undefined,
}

impl CorrelationCell {
    pub fn value(self) -> Option<f64> {
        match self {
            CorrelationCell::Defined(v) => Some(v),
            CorrelationCell::Undefined => None,
        }
    }

    pub fn is_defined(self) -> bool {
        matches!(self, CorrelationCell::Defined(_))
    }
}

/// Symmetric 3x3 Spearman correlation matrix keyed by metric.
///
/// Computed fresh from the customer table on each invocation and immutable
/// afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    cells: [[CorrelationCell; 3]; 3],
}

impl CorrelationMatrix {
    /// The cell for a metric pair. Symmetric: `get(a, b) == get(b, a)`.
    pub fn get(&self, a: Metric, b: Metric) -> CorrelationCell {
        self.cells[a.index()][b.index()]
    }
}

impl Serialize for CorrelationMatrix {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut outer = serializer.serialize_map(Some(METRICS.len()))?;
        for row in METRICS {
            let inner: Vec<(&str, CorrelationCell)> = METRICS
                .iter()
                .map(|&col| (col.as_str(), self.get(row, col)))
                .collect();
            let inner: std::collections::BTreeMap<&str, CorrelationCell> =
                inner.into_iter().collect();
            outer.serialize_entry(row.as_str(), &inner)?;
        }
        outer.end()
    }
}

/// Compute the Spearman correlation matrix over all customers with a
/// complete, finite RFM triple.
pub fn spearman_matrix(customers: &[CustomerRecord]) -> CorrelationMatrix {
    let rows: Vec<[f64; 3]> = customers
        .iter()
        .filter_map(CustomerRecord::complete_rfm)
        .collect();
    let excluded = customers.len() - rows.len();
    if excluded > 0 {
        log::debug!("correlation: excluded {excluded} row(s) with missing RFM values");
    }

    let n = rows.len();
    if n < 2 {
        return CorrelationMatrix {
            cells: [[CorrelationCell::Undefined; 3]; 3],
        };
    }

    let mut data = Array2::zeros((n, 3));
    for (i, rfm) in rows.iter().enumerate() {
        for j in 0..3 {
            data[[i, j]] = rfm[j];
        }
    }

    let ranks: Vec<Vec<f64>> = (0..3)
        .map(|j| average_ranks(&data.column(j).to_vec()))
        .collect();

    let mut cells = [[CorrelationCell::Undefined; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            cells[i][j] = if i == j {
                if constant(&ranks[i]) {
                    CorrelationCell::Undefined
                } else {
                    CorrelationCell::Defined(1.0)
                }
            } else {
                match pearson(&ranks[i], &ranks[j]) {
                    Some(r) => {
                        CorrelationCell::Defined(round_to(r.clamp(-1.0, 1.0), CORRELATION_PRECISION))
                    }
                    None => CorrelationCell::Undefined,
                }
            };
        }
    }

    CorrelationMatrix { cells }
}

/// Rank-transform values, assigning tied values their average rank
/// (1-based, as in the usual Spearman convention).
fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| {
        values[a]
            .partial_cmp(&values[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut ranks = vec![0.0; values.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        // Positions i..=j hold tied values; each gets the average rank.
        let rank = (i + j) as f64 / 2.0 + 1.0;
        for k in i..=j {
            ranks[order[k]] = rank;
        }
        i = j + 1;
    }
    ranks
}

/// Pearson correlation; `None` when either variable has zero variance.
fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let numerator: f64 = x
        .iter()
        .zip(y.iter())
        .map(|(xi, yi)| (xi - mean_x) * (yi - mean_y))
        .sum();
    let sum_sq_x: f64 = x.iter().map(|xi| (xi - mean_x).powi(2)).sum();
    let sum_sq_y: f64 = y.iter().map(|yi| (yi - mean_y).powi(2)).sum();

    let denominator = (sum_sq_x * sum_sq_y).sqrt();
    if denominator == 0.0 {
        None
    } else {
        Some(numerator / denominator)
    }
}

fn constant(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}
