//! Prelude for commonly used types and traits in basket-miner.

pub use crate::analysis::{AnalysisReport, BasketAnalysis, CategoryOutcome, SalesRecord};
pub use crate::config::{AnalysisConfig, DatasetColumns, MiningConfig};
pub use crate::error::{BasketError, ErrorContext, Result};
pub use crate::formatters::{FormatterConfig, ReportFormatter};
pub use crate::logging::LogConfig;
pub use crate::mining::{Metric, Rule, Transaction};
pub use crate::sources::DataSource;
