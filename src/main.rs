//! RfmLens: segmentation report CLI over precomputed RFM tables
//!
//! This is the entrypoint that orchestrates table loading, report assembly,
//! and text or JSON output. Sections whose input table failed validation are
//! reported as unavailable without aborting the rest of the report.

use std::path::Path;

use anyhow::Result;
use clap::Parser;
use rfmlens::{
    build_report, data, Args, CorrelationCell, ReportBundle, ReportError, METRICS,
};

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let metrics = args.parse_metrics()?;

    if args.verbose {
        println!("RfmLens - Customer Segmentation Report");
        println!("======================================\n");
        println!("Input tables:");
        println!("  rfm table:          {}", args.rfm);
        println!("  segment statistics: {}", args.segments);
        println!("  value distribution: {}\n", args.distribution);
    }

    let customers = load_section(
        data::load_customer_table(Path::new(&args.rfm)),
        data::RFM_TABLE,
    );
    let segment_stats = load_section(
        data::load_segment_stats(Path::new(&args.segments)),
        data::SEGMENT_STATS_TABLE,
    );
    let buckets = load_section(
        data::load_cluster_distribution(Path::new(&args.distribution)),
        data::DISTRIBUTION_TABLE,
    );

    let bundle = build_report(customers, segment_stats, buckets, &metrics);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&bundle.to_json())?);
    } else {
        render_text(&bundle);
    }

    Ok(())
}

/// Map a table load failure into the core's typed error so its dependent
/// sections come out as "unavailable" while the siblings still render.
fn load_section<T>(
    loaded: Result<Vec<T>>,
    table: &str,
) -> std::result::Result<Vec<T>, ReportError> {
    loaded.map_err(|err| match err.downcast::<ReportError>() {
        Ok(report_err) => report_err,
        Err(other) => ReportError::Schema {
            table: table.to_string(),
            detail: other.to_string(),
        },
    })
}

fn render_text(bundle: &ReportBundle) {
    println!("=== Segment Comparison ===");
    match &bundle.wide_segments {
        Ok(wide) => {
            for row in wide {
                let cells: Vec<String> = row
                    .cells()
                    .map(|(statistic, metric, value)| {
                        format!("{}={:.2}", rfmlens::column_name(statistic, metric), value)
                    })
                    .collect();
                println!("{}: {}", row.segment, cells.join(", "));
            }
        }
        Err(err) => println!("section unavailable: {err}"),
    }

    println!("\n=== Descriptive Statistics ===");
    match &bundle.segment_summaries {
        Ok(summaries) => {
            for summary in summaries {
                println!(
                    "{} / {}: mean={:.2}, median={:.2}, std={:.2}",
                    summary.segment, summary.metric, summary.mean, summary.median, summary.std_dev
                );
            }
        }
        Err(err) => println!("section unavailable: {err}"),
    }

    println!("\n=== Key Insights ===");
    match &bundle.metric_leaders {
        Ok(leaders) => {
            for leader in leaders {
                println!(
                    "Highest {}: {} segment with median {:.2}",
                    leader.metric, leader.segment, leader.median
                );
            }
        }
        Err(err) => println!("section unavailable: {err}"),
    }

    println!("\n=== Correlation (Spearman) ===");
    match &bundle.correlation {
        Ok(matrix) => {
            let header: Vec<&str> = METRICS.iter().map(|m| m.as_str()).collect();
            println!("{:>12} {:>10} {:>10} {:>10}", "", header[0], header[1], header[2]);
            for row in METRICS {
                let cells: Vec<String> = METRICS
                    .iter()
                    .map(|&col| match matrix.get(row, col) {
                        CorrelationCell::Defined(v) => format!("{v:>10.3}"),
                        CorrelationCell::Undefined => format!("{:>10}", "n/a"),
                    })
                    .collect();
                println!("{:>12} {}", row.as_str(), cells.join(" "));
            }
        }
        Err(err) => println!("section unavailable: {err}"),
    }

    println!("\n=== Transaction Value Distribution ===");
    match &bundle.value_distribution {
        Ok(buckets) => {
            for bucket in buckets {
                println!("{}: {:.2}%", bucket.label, bucket.proportion * 100.0);
            }
        }
        Err(err) => println!("section unavailable: {err}"),
    }
}
