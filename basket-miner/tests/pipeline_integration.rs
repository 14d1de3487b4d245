//! Integration tests for the end-to-end basket analysis pipeline.

use std::fs::File;
use std::io::Write;

use basket_miner::formatters::{FormatterConfig, JsonFormatter, ReportFormatter};
use basket_miner::prelude::*;
use basket_miner::sources::CsvSource;
use tempfile::TempDir;

/// Writes the sales export used by most tests.
fn create_sales_csv(dir: &TempDir, name: &str) -> String {
    let path = dir.path().join(name);
    let mut file = File::create(&path).unwrap();
    writeln!(file, "No transaksi,Items,Jenis,Qty").unwrap();
    writeln!(file, "1001,Kemeja,Atasan,1").unwrap();
    writeln!(file, "1001,Dasi,Atasan,1").unwrap();
    writeln!(file, "1001,Celana,Bawahan,1").unwrap();
    writeln!(file, "1002,Kemeja,Atasan,2").unwrap();
    writeln!(file, "1002,Celana,Bawahan,1").unwrap();
    writeln!(file, "1003,Rok,Bawahan,1").unwrap();
    writeln!(file, "1004,Topi,Aksesoris,0").unwrap();
    file.flush().unwrap();
    path.to_str().unwrap().to_string()
}

#[tokio::test]
async fn test_csv_end_to_end() {
    let dir = TempDir::new().unwrap();
    let path = create_sales_csv(&dir, "sales.csv");

    let source = CsvSource::new(path).unwrap();
    let report = BasketAnalysis::new(AnalysisConfig::default())
        .unwrap()
        .analyze_source(&source)
        .await
        .unwrap();

    assert_eq!(report.record_count, 7);
    assert_eq!(report.skipped_rows, 0);
    assert_eq!(
        report.dataset_columns,
        vec!["No transaksi", "Items", "Jenis", "Qty"]
    );
    assert_eq!(report.categories, vec!["Atasan", "Bawahan", "Aksesoris"]);
    assert_eq!(report.top_items[0].item, "Kemeja");
    assert_eq!(report.top_items[0].quantity, 3.0);

    assert_eq!(report.global.transaction_count, 4);
    assert!(report.global.failure.is_none());

    let atasan = report.rules_for("Atasan").unwrap();
    assert_eq!(atasan[0].to_string(), "{Dasi} -> {Kemeja}");
    assert_eq!(atasan[0].confidence, 1.0);
    assert!(atasan[0].conviction.is_infinite());

    // Celana and Rok never share a basket.
    let bawahan = report.rules_for("Bawahan").unwrap();
    assert!(bawahan.is_empty());

    let failures = report.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, "Aksesoris");
    assert!(matches!(
        failures[0].1,
        BasketError::InsufficientData { .. }
    ));
    assert!(!report.is_complete());
}

#[tokio::test]
async fn test_glob_with_custom_columns() {
    let dir = TempDir::new().unwrap();
    for (name, rows) in [
        ("jan.csv", vec!["1,bread,bakery,1", "1,butter,dairy,1", "2,bread,bakery,3"]),
        ("feb.csv", vec!["3,milk,dairy,1", "3,butter,dairy,2", "4,milk,dairy,1"]),
    ] {
        let mut file = File::create(dir.path().join(name)).unwrap();
        writeln!(file, "order_id,product,aisle,units").unwrap();
        for row in rows {
            writeln!(file, "{row}").unwrap();
        }
        file.flush().unwrap();
    }

    let pattern = format!("{}/*.csv", dir.path().display());
    let source = CsvSource::from_glob(pattern).unwrap();
    assert_eq!(source.paths().len(), 2);

    let config = AnalysisConfig::default()
        .with_columns(DatasetColumns::new("order_id", "product", "aisle", "units"))
        .with_mining(
            MiningConfig::default()
                .with_metric(Metric::Confidence)
                .with_min_threshold(1.0),
        );
    let report = BasketAnalysis::new(config)
        .unwrap()
        .analyze_source(&source)
        .await
        .unwrap();

    assert_eq!(report.record_count, 6);
    assert_eq!(report.categories.len(), 2);
    // Dairy baskets: {butter}, {milk, butter}, {milk}.
    let dairy = report.rules_for("dairy").unwrap();
    assert!(dairy.is_empty());
    assert!(report.rules_for("bakery").unwrap().is_empty());
    assert!(report.is_complete());
}

#[tokio::test]
async fn test_missing_column_aborts_analysis() {
    let dir = TempDir::new().unwrap();
    let path = create_sales_csv(&dir, "sales.csv");

    let config = AnalysisConfig::default().with_columns(DatasetColumns::new(
        "No transaksi",
        "Items",
        "Kategori",
        "Qty",
    ));
    let err = BasketAnalysis::new(config)
        .unwrap()
        .analyze_source(&CsvSource::new(path).unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, BasketError::ColumnNotFound { ref column } if column == "Kategori"));
    assert!(!err.is_partition_local());
}

#[tokio::test]
async fn test_idempotent_rule_lists() {
    let dir = TempDir::new().unwrap();
    let path = create_sales_csv(&dir, "sales.csv");
    let source = CsvSource::new(path).unwrap();
    let analysis = BasketAnalysis::new(AnalysisConfig::default()).unwrap();

    let first = analysis.analyze_source(&source).await.unwrap();
    let second = analysis.analyze_source(&source).await.unwrap();

    let config = FormatterConfig::detailed().with_timestamps(false);
    let formatter = JsonFormatter::new();
    assert_eq!(
        formatter.format_with_config(&first, &config).unwrap(),
        formatter.format_with_config(&second, &config).unwrap()
    );
}

#[tokio::test]
async fn test_json_report_shape() {
    let dir = TempDir::new().unwrap();
    let path = create_sales_csv(&dir, "sales.csv");
    let report = BasketAnalysis::new(AnalysisConfig::default())
        .unwrap()
        .analyze_source(&CsvSource::new(path).unwrap())
        .await
        .unwrap();

    let output = JsonFormatter::new().format(&report).unwrap();
    let json: serde_json::Value = serde_json::from_str(&output).unwrap();

    assert!(json["source"].as_str().unwrap().starts_with("CSV file"));
    assert_eq!(json["mining"]["metric"], "lift");
    assert_eq!(json["mining"]["min_support"], 0.01);
    assert!(json["global"]["analysis"]["rules"].as_array().unwrap().len() <= 5);
    assert!(json["category_outcomes"][2]["failure"]
        .as_str()
        .unwrap()
        .contains("Aksesoris"));
    assert_eq!(
        json["category_outcomes"][0]["analysis"]["vocabulary"],
        serde_json::json!(["Kemeja", "Dasi"])
    );
}

#[test]
fn test_invalid_thresholds_rejected_before_mining() {
    let config = AnalysisConfig::default().with_mining(
        MiningConfig::default()
            .with_metric(Metric::Confidence)
            .with_min_threshold(1.5),
    );
    assert!(matches!(
        BasketAnalysis::new(config),
        Err(BasketError::InvalidThreshold { .. })
    ));

    let err = "foo".parse::<Metric>().unwrap_err();
    assert!(matches!(err, BasketError::MetricUnavailable { ref metric } if metric == "foo"));
}
