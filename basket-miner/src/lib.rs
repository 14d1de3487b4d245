//! # basket-miner - Market Basket Analysis for Rust
//!
//! basket-miner turns flat sales lines (transaction id, item, category,
//! quantity) into association rules of the form "customers who bought X
//! also bought Y". It loads data through DataFusion, mines frequent
//! itemsets with Apriori, scores rules by support, confidence, lift,
//! leverage and conviction, and ranks them for every product category.
//!
//! ## Quick Start
//!
//! ```rust
//! use basket_miner::prelude::*;
//! use basket_miner::sources::MemorySource;
//!
//! # async fn example() -> basket_miner::error::Result<()> {
//! let records = vec![
//!     SalesRecord::new("1001", "Kemeja", "Atasan", 1.0),
//!     SalesRecord::new("1001", "Dasi", "Atasan", 1.0),
//!     SalesRecord::new("1002", "Kemeja", "Atasan", 2.0),
//!     SalesRecord::new("1002", "Celana", "Bawahan", 1.0),
//! ];
//!
//! let config = AnalysisConfig::default();
//! let source = MemorySource::from_records(&records, &config.columns)?;
//!
//! let report = BasketAnalysis::new(config)?.analyze_source(&source).await?;
//! for rule in report.rules_for("Atasan").unwrap_or_default() {
//!     println!("{rule}: confidence {:.2}, lift {:.2}", rule.confidence, rule.lift);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Mining Without a Data Source
//!
//! The mining core works on plain item lists:
//!
//! ```rust
//! use basket_miner::mining::{apriori, association_rules, AprioriOptions, Metric, TransactionEncoder};
//!
//! let baskets = vec![vec!["A", "B", "C"], vec!["A", "B"], vec!["A"], vec!["B", "C"]];
//! let (_, matrix) = TransactionEncoder::fit_transform(&baskets).unwrap();
//! let frequent = apriori(&matrix, &AprioriOptions::new(0.25)).unwrap();
//! assert_eq!(frequent.len(), 7);
//!
//! let rules = association_rules(&frequent, Metric::Confidence, 1.0).unwrap();
//! assert_eq!(rules.len(), 2);
//! ```
//!
//! ## Architecture
//!
//! - **`mining`**: transaction encoding, Apriori and rule generation
//! - **`analysis`**: category partitioning, the end-to-end pipeline and item popularity
//! - **`sources`**: CSV and in-memory data sources and record loading
//! - **`config`**: mining thresholds and dataset column mapping
//! - **`formatters`**: JSON, plain text and Markdown reports
//! - **`logging`**: `tracing` configuration helpers

pub mod analysis;
pub mod config;
pub mod error;
pub mod formatters;
pub mod logging;
pub mod mining;
pub mod prelude;
pub mod sources;
