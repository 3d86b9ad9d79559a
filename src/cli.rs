//! Command-line interface definitions and argument parsing

use clap::Parser;

use crate::data::Metric;

/// Segmentation report CLI over precomputed RFM analysis tables
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the per-customer RFM table CSV
    #[arg(long, default_value = "rfm_df.csv")]
    pub rfm: String,

    /// Path to the long-format segment statistics CSV
    #[arg(long, default_value = "segment_analysis.csv")]
    pub segments: String,

    /// Path to the transaction-value cluster distribution CSV
    #[arg(long, default_value = "segment_distribution.csv")]
    pub distribution: String,

    /// Metrics to summarize and rank, comma-separated
    /// Example: --metrics "recency,monetary"
    #[arg(short, long, default_value = "recency,frequency,monetary")]
    pub metrics: String,

    /// Emit the report as JSON instead of text
    #[arg(long)]
    pub json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Parse the metric list from the `--metrics` string.
    pub fn parse_metrics(&self) -> crate::Result<Vec<Metric>> {
        self.metrics
            .split(',')
            .map(|name| {
                Metric::parse(name)
                    .ok_or_else(|| anyhow::anyhow!("unknown metric: '{}'", name.trim()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(metrics: &str) -> Args {
        Args {
            rfm: "rfm_df.csv".to_string(),
            segments: "segment_analysis.csv".to_string(),
            distribution: "segment_distribution.csv".to_string(),
            metrics: metrics.to_string(),
            json: false,
            verbose: false,
        }
    }

    #[test]
    fn test_parse_metrics() {
        let parsed = args("recency,frequency,monetary").parse_metrics().unwrap();
        assert_eq!(parsed, vec![Metric::Recency, Metric::Frequency, Metric::Monetary]);

        let parsed = args(" monetary ").parse_metrics().unwrap();
        assert_eq!(parsed, vec![Metric::Monetary]);

        assert!(args("recency,velocity").parse_metrics().is_err());
    }
}
