//! Integration tests for RfmLens

use std::io::Write;

use rfmlens::{
    build_report, load_cluster_distribution, load_customer_table, load_segment_stats,
    CorrelationCell, Metric, ReportError, Statistic, METRICS,
};
use tempfile::NamedTempFile;

fn write_csv(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
    file
}

/// Per-customer RFM table with four segments; one row has a missing value.
fn rfm_csv() -> NamedTempFile {
    write_csv(&[
        "CustomerID,recency,frequency,monetary,Customer_Segment",
        "17850,5,10,500.0,Champions",
        "12345,8,12,620.0,Champions",
        "13047,40,1,20.0,Lost Customers",
        "98765,55,2,35.0,Lost Customers",
        "55555,3,4,150.0,Recent Customers",
        "66666,12,,80.0,Loyal Customers",
    ])
}

/// Long-format statistics for two metrics across three segments.
fn segment_stats_csv() -> NamedTempFile {
    write_csv(&[
        "Segment,Metric,Mean,Median,Distribution",
        "Champions,recency,6.5,6.5,1.2",
        "Champions,monetary,560.0,560.0,0.8",
        "Lost Customers,recency,47.5,47.5,2.0",
        "Lost Customers,monetary,27.5,27.5,2.2",
        "Recent Customers,recency,3.0,3.0,0.4",
    ])
}

fn distribution_csv() -> NamedTempFile {
    write_csv(&[
        "segment,proportion",
        "Low-Value,0.2991",
        "Mid-Value,0.5992",
        "High-Value,0.1017",
    ])
}

#[test]
fn test_end_to_end_report() {
    let rfm = rfm_csv();
    let stats = segment_stats_csv();
    let dist = distribution_csv();

    let customers = load_customer_table(rfm.path()).unwrap();
    assert_eq!(customers.len(), 6);

    let bundle = build_report(
        Ok(customers),
        Ok(load_segment_stats(stats.path()).unwrap()),
        Ok(load_cluster_distribution(dist.path()).unwrap()),
        &METRICS,
    );

    // Pivot: one row per segment, cells named by the renderer convention.
    let wide = bundle.wide_segments.unwrap();
    assert_eq!(wide.len(), 3);
    assert_eq!(wide[0].segment, "Champions");
    assert_eq!(wide[0].get(Statistic::Median, Metric::Monetary), Some(560.0));
    // Recent Customers has no monetary row; the cell stays absent.
    assert_eq!(wide[2].get(Statistic::Median, Metric::Monetary), None);

    // Descriptive stats: the Loyal Customers row lost its frequency value,
    // so that segment is omitted entirely.
    let summaries = bundle.segment_summaries.unwrap();
    let segments: Vec<&str> = summaries.iter().map(|s| s.segment.as_str()).collect();
    assert!(!segments.contains(&"Loyal Customers"));
    let champions_monetary = summaries
        .iter()
        .find(|s| s.segment == "Champions" && s.metric == Metric::Monetary)
        .unwrap();
    assert_eq!(champions_monetary.mean, 560.0);
    assert_eq!(champions_monetary.median, 560.0);

    // Ranking: Champions lead monetary, Lost Customers lead recency.
    let leaders = bundle.metric_leaders.unwrap();
    let monetary = leaders.iter().find(|l| l.metric == Metric::Monetary).unwrap();
    assert_eq!(monetary.segment, "Champions");
    assert_eq!(monetary.median, 560.0);
    let recency = leaders.iter().find(|l| l.metric == Metric::Recency).unwrap();
    assert_eq!(recency.segment, "Lost Customers");

    // Correlation: defined, bounded, symmetric, diagonal of 1.
    let matrix = bundle.correlation.unwrap();
    for a in METRICS {
        assert_eq!(matrix.get(a, a), CorrelationCell::Defined(1.0));
        for b in METRICS {
            assert_eq!(matrix.get(a, b), matrix.get(b, a));
            let value = matrix.get(a, b).value().unwrap();
            assert!((-1.0..=1.0).contains(&value));
        }
    }

    // Distribution: passed through unchanged.
    let buckets = bundle.value_distribution.unwrap();
    assert_eq!(buckets.len(), 3);
    assert_eq!(buckets[1].proportion, 0.5992);
}

#[test]
fn test_duplicate_segment_metric_key_isolates_pivot_failure() {
    let rfm = rfm_csv();
    let dist = distribution_csv();
    let stats = write_csv(&[
        "Segment,Metric,Mean,Median,Distribution",
        "Champions,recency,6.5,6.5,1.2",
        "Champions,recency,7.0,7.0,1.3",
    ]);

    let bundle = build_report(
        Ok(load_customer_table(rfm.path()).unwrap()),
        Ok(load_segment_stats(stats.path()).unwrap()),
        Ok(load_cluster_distribution(dist.path()).unwrap()),
        &METRICS,
    );

    assert_eq!(
        bundle.wide_segments.unwrap_err(),
        ReportError::DuplicateKey {
            segment: "Champions".to_string(),
            metric: Metric::Recency,
        }
    );
    // Sibling sections built from the other tables still succeed.
    assert!(bundle.segment_summaries.is_ok());
    assert!(bundle.correlation.is_ok());
    assert!(bundle.value_distribution.is_ok());
}

#[test]
fn test_inconsistent_distribution_is_flagged_not_renormalized() {
    let dist = write_csv(&[
        "segment,proportion",
        "Low-Value,0.30",
        "Mid-Value,0.57",
        "High-Value,0.10",
    ]);

    let err = rfmlens::validate_distribution(&load_cluster_distribution(dist.path()).unwrap())
        .unwrap_err();
    assert!(matches!(err, ReportError::DistributionIntegrity { .. }));
}

#[test]
fn test_schema_failure_renders_partial_report() {
    let stats = segment_stats_csv();
    let dist = distribution_csv();
    let bad_rfm = write_csv(&[
        "CustomerID,recency,frequency,Customer_Segment",
        "17850,5,10,Champions",
    ]);

    let customers = load_customer_table(bad_rfm.path());
    assert!(customers.is_err());
    let failure = match customers.unwrap_err().downcast::<ReportError>() {
        Ok(report_err) => report_err,
        Err(other) => panic!("expected a schema error, got: {other}"),
    };
    assert!(matches!(failure, ReportError::Schema { .. }));

    let bundle = build_report(
        Err(failure),
        Ok(load_segment_stats(stats.path()).unwrap()),
        Ok(load_cluster_distribution(dist.path()).unwrap()),
        &METRICS,
    );

    let view = bundle.to_json();
    assert_eq!(view["descriptive_statistics"]["status"], "unavailable");
    assert_eq!(view["correlation"]["status"], "unavailable");
    assert_eq!(view["segment_comparison"]["status"], "ok");
    assert_eq!(view["metric_leaders"]["status"], "ok");
    assert_eq!(view["value_distribution"]["status"], "ok");
}

#[test]
fn test_ranking_is_deterministic_across_runs() {
    let stats = write_csv(&[
        "Segment,Metric,Mean,Median,Distribution",
        "Big Spenders,monetary,900.0,900.0,0.1",
        "Champions,monetary,900.0,900.0,0.2",
    ]);
    let rows = load_segment_stats(stats.path()).unwrap();

    for _ in 0..3 {
        let wide = rfmlens::pivot_segment_stats(&rows).unwrap();
        let leaders = rfmlens::best_segments(&wide, &[Metric::Monetary]).unwrap();
        assert_eq!(leaders[0].segment, "Big Spenders");
    }
}
