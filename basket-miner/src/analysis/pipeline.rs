//! End-to-end market-basket analysis over a sales dataset.
//!
//! One global mining run over all transactions, then one independent run
//! per category. Partition-local failures are collected into the report;
//! only loading errors abort [`BasketAnalysis::analyze_source`].

use chrono::{DateTime, Utc};
use datafusion::prelude::SessionContext;
use serde::Serialize;
use tracing::{info, instrument, warn};

use super::partition::{
    group_transactions, mine_partition, serialize_failure, CategoryOutcome, CategoryPartitioner,
    PartitionAnalysis, SalesRecord,
};
use super::summary::{distinct_categories, top_items, ItemPopularity};
use crate::config::{AnalysisConfig, MiningConfig};
use crate::error::{BasketError, Result};
use crate::log_data_op;
use crate::logging::LogConfig;
use crate::mining::Rule;
use crate::sources::{load_sales_records, DataSource, LoadedDataset};

const TABLE_NAME: &str = "sales";

/// Partition name used for the run over the whole dataset.
pub const GLOBAL_PARTITION: &str = "global";

/// Result of mining every transaction regardless of category.
#[derive(Debug, Serialize)]
pub struct GlobalAnalysis {
    pub transaction_count: usize,
    pub analysis: Option<PartitionAnalysis>,
    #[serde(serialize_with = "serialize_failure")]
    pub failure: Option<BasketError>,
}

impl GlobalAnalysis {
    pub fn rules(&self) -> &[Rule] {
        self.analysis
            .as_ref()
            .map(|a| a.rules.as_slice())
            .unwrap_or_default()
    }
}

/// Everything the display layer needs from one analysis.
#[derive(Debug, Serialize)]
pub struct AnalysisReport {
    pub generated_at: DateTime<Utc>,
    pub source: String,
    pub dataset_columns: Vec<String>,
    pub record_count: usize,
    pub skipped_rows: usize,
    pub mining: MiningConfig,
    pub categories: Vec<String>,
    pub top_items: Vec<ItemPopularity>,
    pub global: GlobalAnalysis,
    pub category_outcomes: Vec<CategoryOutcome>,
}

impl AnalysisReport {
    /// Ranked rules of one category, if that category exists.
    pub fn rules_for(&self, category: &str) -> Option<&[Rule]> {
        self.category_outcomes
            .iter()
            .find(|o| o.category == category)
            .map(CategoryOutcome::rules)
    }

    /// Every partition that failed, with its failure.
    pub fn failures(&self) -> Vec<(&str, &BasketError)> {
        let global = self
            .global
            .failure
            .as_ref()
            .map(|err| (GLOBAL_PARTITION, err));
        global
            .into_iter()
            .chain(
                self.category_outcomes
                    .iter()
                    .filter_map(|o| o.failure.as_ref().map(|err| (o.category.as_str(), err))),
            )
            .collect()
    }

    /// True when the global run and every category run succeeded.
    pub fn is_complete(&self) -> bool {
        self.global.failure.is_none() && self.category_outcomes.iter().all(|o| o.is_success())
    }
}

/// Runs the global and per-category pipelines with one configuration.
///
/// ```rust
/// use basket_miner::analysis::{BasketAnalysis, SalesRecord};
/// use basket_miner::config::AnalysisConfig;
///
/// let records = vec![
///     SalesRecord::new("1", "shirt", "tops", 1.0),
///     SalesRecord::new("1", "tie", "tops", 1.0),
///     SalesRecord::new("2", "shirt", "tops", 1.0),
/// ];
/// let analysis = BasketAnalysis::new(AnalysisConfig::default()).unwrap();
/// let report = analysis.analyze_records(&records);
/// assert!(report.is_complete());
/// assert_eq!(report.rules_for("tops").unwrap().len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct BasketAnalysis {
    config: AnalysisConfig,
    log_config: LogConfig,
}

impl BasketAnalysis {
    /// Validates the configuration up front so no run starts with bad thresholds.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            log_config: LogConfig::default(),
        })
    }

    pub fn with_log_config(mut self, log_config: LogConfig) -> Self {
        self.log_config = log_config;
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Registers `source`, loads its records and analyzes them.
    #[instrument(skip(self, source), fields(source = %source.description()))]
    pub async fn analyze_source(&self, source: &dyn DataSource) -> Result<AnalysisReport> {
        let ctx = SessionContext::new();
        source.register(&ctx, TABLE_NAME).await?;

        let loaded = load_sales_records(&ctx, TABLE_NAME, &self.config.columns).await?;
        log_data_op!(
            self.log_config,
            source = %source.description(),
            records = loaded.records.len(),
            skipped = loaded.skipped_rows,
            "Loaded dataset"
        );

        let mut report = self.analyze_loaded(loaded);
        report.source = source.description();
        Ok(report)
    }

    /// Analyzes records already loaded by the caller.
    pub fn analyze_records(&self, records: &[SalesRecord]) -> AnalysisReport {
        self.analyze_loaded(LoadedDataset {
            columns: self
                .config
                .columns
                .names()
                .iter()
                .map(|c| c.to_string())
                .collect(),
            records: records.to_vec(),
            skipped_rows: 0,
        })
    }

    fn analyze_loaded(&self, loaded: LoadedDataset) -> AnalysisReport {
        let LoadedDataset {
            columns,
            records,
            skipped_rows,
        } = loaded;

        let global = self.run_global(&records);

        let partitioner = CategoryPartitioner::new(self.config.mining.clone())
            .with_log_config(self.log_config.clone());
        let mut category_outcomes = partitioner.run(&records);
        if let Some(limit) = self.config.rules_per_category {
            for outcome in &mut category_outcomes {
                if let Some(analysis) = outcome.analysis.as_mut() {
                    analysis.rules.truncate(limit);
                }
            }
        }

        let failed = category_outcomes.iter().filter(|o| !o.is_success()).count();
        info!(
            records = records.len(),
            categories = category_outcomes.len(),
            failed_categories = failed,
            "Basket analysis complete"
        );

        AnalysisReport {
            generated_at: Utc::now(),
            source: "in-memory records".to_string(),
            dataset_columns: columns,
            record_count: records.len(),
            skipped_rows,
            mining: self.config.mining.clone(),
            categories: distinct_categories(&records),
            top_items: top_items(&records, self.config.top_items),
            global,
            category_outcomes,
        }
    }

    fn run_global(&self, records: &[SalesRecord]) -> GlobalAnalysis {
        let transactions = group_transactions(records);
        let transaction_count = transactions.len();

        match mine_partition(GLOBAL_PARTITION, &transactions, &self.config.mining) {
            Ok(analysis) => GlobalAnalysis {
                transaction_count,
                analysis: Some(analysis),
                failure: None,
            },
            Err(err) => {
                warn!(error = %err, "Global analysis failed; continuing with categories");
                GlobalAnalysis {
                    transaction_count,
                    analysis: None,
                    failure: Some(err),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::MemorySource;

    fn records() -> Vec<SalesRecord> {
        vec![
            SalesRecord::new("1", "Kemeja", "Atasan", 1.0),
            SalesRecord::new("1", "Dasi", "Atasan", 1.0),
            SalesRecord::new("1", "Celana", "Bawahan", 2.0),
            SalesRecord::new("2", "Kemeja", "Atasan", 1.0),
            SalesRecord::new("2", "Celana", "Bawahan", 1.0),
            SalesRecord::new("3", "Rok", "Bawahan", 1.0),
        ]
    }

    #[test]
    fn test_invalid_config_rejected_up_front() {
        let config = AnalysisConfig::default()
            .with_mining(MiningConfig::default().with_min_support(1.5));
        assert!(matches!(
            BasketAnalysis::new(config),
            Err(BasketError::InvalidThreshold { .. })
        ));
    }

    #[test]
    fn test_report_contents() {
        let analysis = BasketAnalysis::new(AnalysisConfig::default()).unwrap();
        let report = analysis.analyze_records(&records());

        assert_eq!(report.record_count, 6);
        assert_eq!(report.categories, vec!["Atasan", "Bawahan"]);
        assert_eq!(report.top_items[0].item, "Celana");
        assert_eq!(report.global.transaction_count, 3);
        assert!(!report.global.rules().is_empty());
        assert!(report.is_complete());
        assert!(report.failures().is_empty());
        assert_eq!(report.rules_for("Atasan").unwrap().len(), 2);
        assert!(report.rules_for("Sepatu").is_none());
    }

    #[test]
    fn test_global_failure_does_not_stop_categories() {
        let data = vec![SalesRecord::new("1", "Kemeja", "Atasan", 0.0)];
        let report = BasketAnalysis::new(AnalysisConfig::default())
            .unwrap()
            .analyze_records(&data);

        let failures = report.failures();
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].0, GLOBAL_PARTITION);
        assert_eq!(failures[1].0, "Atasan");
        assert!(failures.iter().all(|(_, err)| err.is_partition_local()));
    }

    #[test]
    fn test_rules_per_category_cap() {
        let config = AnalysisConfig::default().with_rules_per_category(1);
        let report = BasketAnalysis::new(config)
            .unwrap()
            .analyze_records(&records());
        assert_eq!(report.rules_for("Atasan").unwrap().len(), 1);
        assert_eq!(report.rules_for("Atasan").unwrap()[0].to_string(), "{Dasi} -> {Kemeja}");

        let atasan = report
            .category_outcomes
            .iter()
            .find(|o| o.category == "Atasan")
            .and_then(|o| o.analysis.as_ref())
            .unwrap();
        assert_eq!(atasan.total_rules, 2);
    }

    #[tokio::test]
    async fn test_analyze_source_matches_records() {
        let config = AnalysisConfig::default();
        let source = MemorySource::from_records(&records(), &config.columns).unwrap();
        let analysis = BasketAnalysis::new(config).unwrap();

        let from_source = analysis.analyze_source(&source).await.unwrap();
        let from_records = analysis.analyze_records(&records());

        assert!(from_source.source.contains("In-memory data"));
        assert_eq!(
            from_source.dataset_columns,
            vec!["No transaksi", "Items", "Jenis", "Qty"]
        );
        assert_eq!(
            from_source.rules_for("Bawahan"),
            from_records.rules_for("Bawahan")
        );
        assert_eq!(from_source.global.rules(), from_records.global.rules());
    }
}
