//! Validation of the precomputed transaction-value cluster distribution

use crate::data::ClusterBucket;
use crate::error::ReportError;

/// Allowed deviation of the proportion sum from 1.
pub const PROPORTION_TOLERANCE: f64 = 1e-6;

/// Validate the bucket table and pass it through unchanged.
///
/// Proportions must be non-negative, finite and sum to 1 within
/// [`PROPORTION_TOLERANCE`]. A violation is an upstream computation bug and
/// fails with [`ReportError::DistributionIntegrity`]; the table is never
/// silently renormalized.
pub fn validate_distribution(buckets: &[ClusterBucket]) -> Result<Vec<ClusterBucket>, ReportError> {
    for bucket in buckets {
        if !bucket.proportion.is_finite() || bucket.proportion < 0.0 {
            return Err(ReportError::DistributionIntegrity {
                detail: format!(
                    "bucket '{}' has invalid proportion {}",
                    bucket.label, bucket.proportion
                ),
            });
        }
    }

    let sum: f64 = buckets.iter().map(|b| b.proportion).sum();
    if (sum - 1.0).abs() > PROPORTION_TOLERANCE {
        return Err(ReportError::DistributionIntegrity {
            detail: format!("proportions sum to {sum:.6}, expected 1"),
        });
    }

    Ok(buckets.to_vec())
}
