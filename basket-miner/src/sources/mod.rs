//! Data sources for sales datasets.
//!
//! A source registers itself as a table in a DataFusion [`SessionContext`];
//! [`load_sales_records`] then reads the four mapped columns out of that
//! table into typed [`SalesRecord`](crate::analysis::SalesRecord)s.

use async_trait::async_trait;
use datafusion::prelude::SessionContext;
use std::fmt::Debug;

use crate::error::{BasketError, Result};

mod csv;
mod loader;
mod memory;

pub use csv::{CsvOptions, CsvSource};
pub use loader::{load_sales_records, LoadedDataset};
pub use memory::MemorySource;

/// A data source that can be registered with a DataFusion context.
///
/// # Examples
///
/// ```rust,ignore
/// use basket_miner::sources::{CsvSource, DataSource};
///
/// # async fn example() -> basket_miner::error::Result<()> {
/// let source = CsvSource::new("data/sales.csv")?;
/// let ctx = SessionContext::new();
/// source.register(&ctx, "sales").await?;
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait DataSource: Debug + Send + Sync {
    /// Registers this data source under `table_name`.
    async fn register(&self, ctx: &SessionContext, table_name: &str) -> Result<()>;

    /// Returns a human-readable description of this data source.
    fn description(&self) -> String;
}

/// Expands glob patterns into the list of matching files.
pub(crate) fn expand_globs(patterns: &[String]) -> Result<Vec<String>> {
    let mut paths = Vec::new();
    for pattern in patterns {
        let matches = glob::glob(pattern).map_err(|e| {
            BasketError::Configuration(format!("Invalid glob pattern '{pattern}': {e}"))
        })?;

        for entry in matches {
            let path = entry.map_err(|e| BasketError::Io(e.into_error()))?;
            if path.is_file() {
                if let Some(path_str) = path.to_str() {
                    paths.push(path_str.to_string());
                }
            }
        }
    }

    if paths.is_empty() {
        return Err(BasketError::data_source(
            "file",
            "No files found matching glob patterns",
        ));
    }

    paths.sort();
    Ok(paths)
}
