//! Configuration for mining runs and dataset column mapping.
//!
//! Defaults reproduce the fixed parameters of the category pipeline:
//! minimum support 0.01, rules filtered on lift with a minimum of 0.1.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BasketError, Result};
use crate::mining::{AprioriOptions, Metric};

/// Parameters shared by every mining run (global and per category).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MiningConfig {
    /// Minimum itemset support, in `(0, 1]`
    pub min_support: f64,
    /// Metric used to filter rules
    pub metric: Metric,
    /// Minimum value of `metric` a rule must reach
    pub min_threshold: f64,
    /// Largest itemset size to mine
    pub max_len: Option<usize>,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            min_support: 0.01,
            metric: Metric::Lift,
            min_threshold: 0.1,
            max_len: None,
        }
    }
}

impl MiningConfig {
    pub fn with_min_support(mut self, min_support: f64) -> Self {
        self.min_support = min_support;
        self
    }

    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_min_threshold(mut self, min_threshold: f64) -> Self {
        self.min_threshold = min_threshold;
        self
    }

    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = Some(max_len);
        self
    }

    /// Options handed to [`apriori`](crate::mining::apriori).
    pub fn apriori_options(&self) -> AprioriOptions {
        AprioriOptions {
            min_support: self.min_support,
            max_len: self.max_len,
        }
    }

    /// Validates every threshold before any computation starts.
    pub fn validate(&self) -> Result<()> {
        self.apriori_options().validate()?;
        if !self.min_threshold.is_finite() {
            return Err(BasketError::invalid_threshold(
                "min_threshold",
                self.min_threshold,
                "must be a finite number",
            ));
        }
        self.metric.validate_threshold(self.min_threshold)
    }
}

/// Names of the source columns holding each field of a sales record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetColumns {
    pub transaction: String,
    pub item: String,
    pub category: String,
    pub quantity: String,
}

impl Default for DatasetColumns {
    fn default() -> Self {
        Self {
            transaction: "No transaksi".to_string(),
            item: "Items".to_string(),
            category: "Jenis".to_string(),
            quantity: "Qty".to_string(),
        }
    }
}

impl DatasetColumns {
    pub fn new(
        transaction: impl Into<String>,
        item: impl Into<String>,
        category: impl Into<String>,
        quantity: impl Into<String>,
    ) -> Self {
        Self {
            transaction: transaction.into(),
            item: item.into(),
            category: category.into(),
            quantity: quantity.into(),
        }
    }

    /// The four column names in load order.
    pub fn names(&self) -> [&str; 4] {
        [
            self.transaction.as_str(),
            self.item.as_str(),
            self.category.as_str(),
            self.quantity.as_str(),
        ]
    }
}

/// Full configuration of a [`BasketAnalysis`](crate::analysis::BasketAnalysis).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub mining: MiningConfig,
    pub columns: DatasetColumns,
    /// How many items to keep in the popularity ranking
    pub top_items: usize,
    /// Cap on rules kept per category; `None` keeps all
    pub rules_per_category: Option<usize>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            mining: MiningConfig::default(),
            columns: DatasetColumns::default(),
            top_items: 10,
            rules_per_category: None,
        }
    }
}

impl AnalysisConfig {
    pub fn with_mining(mut self, mining: MiningConfig) -> Self {
        self.mining = mining;
        self
    }

    pub fn with_columns(mut self, columns: DatasetColumns) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_top_items(mut self, top_items: usize) -> Self {
        self.top_items = top_items;
        self
    }

    pub fn with_rules_per_category(mut self, limit: usize) -> Self {
        self.rules_per_category = Some(limit);
        self
    }

    /// Parses a JSON document; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        self.mining.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_category_pipeline() {
        let config = MiningConfig::default();
        assert_eq!(config.min_support, 0.01);
        assert_eq!(config.metric, Metric::Lift);
        assert_eq!(config.min_threshold, 0.1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_thresholds() {
        let err = MiningConfig::default()
            .with_min_support(0.0)
            .validate()
            .unwrap_err();
        assert!(matches!(err, BasketError::InvalidThreshold { .. }));

        let err = MiningConfig::default()
            .with_metric(Metric::Confidence)
            .with_min_threshold(2.0)
            .validate()
            .unwrap_err();
        assert!(matches!(err, BasketError::InvalidThreshold { .. }));

        let err = MiningConfig::default()
            .with_min_threshold(f64::INFINITY)
            .validate()
            .unwrap_err();
        assert!(matches!(err, BasketError::InvalidThreshold { ref parameter, .. } if parameter == "min_threshold"));
    }

    #[test]
    fn test_json_partial_config() {
        let config = AnalysisConfig::from_json_str(
            r#"{"mining": {"min_support": 0.2, "metric": "confidence"}, "top_items": 3}"#,
        )
        .unwrap();
        assert_eq!(config.mining.min_support, 0.2);
        assert_eq!(config.mining.metric, Metric::Confidence);
        assert_eq!(config.mining.min_threshold, 0.1);
        assert_eq!(config.columns, DatasetColumns::default());
        assert_eq!(config.top_items, 3);
    }

    #[test]
    fn test_json_unknown_metric() {
        let err = AnalysisConfig::from_json_str(r#"{"mining": {"metric": "foo"}}"#).unwrap_err();
        assert!(matches!(err, BasketError::Serialization(_)));
    }

    #[test]
    fn test_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("basket.json");
        std::fs::write(&path, r#"{"columns": {"category": "Category"}}"#).unwrap();

        let config = AnalysisConfig::from_json_file(&path).unwrap();
        assert_eq!(config.columns.category, "Category");
        assert_eq!(config.columns.item, "Items");

        let missing = AnalysisConfig::from_json_file(dir.path().join("missing.json"));
        assert!(matches!(missing, Err(BasketError::Io(_))));
    }
}
