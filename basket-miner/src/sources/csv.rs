//! CSV file source implementation.

use async_trait::async_trait;
use datafusion::prelude::*;
use tracing::{debug, info, instrument};

use super::DataSource;
use crate::error::{BasketError, Result};

/// Options for configuring CSV file reading.
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Whether the CSV file has a header row
    pub has_header: bool,
    /// Field delimiter (default: ',')
    pub delimiter: u8,
    /// Quote character (default: '"')
    pub quote: u8,
    /// Maximum records to read for schema inference
    pub schema_infer_max_records: usize,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            has_header: true,
            delimiter: b',',
            quote: b'"',
            schema_infer_max_records: 1000,
        }
    }
}

/// One or more CSV files read as a single table.
///
/// # Examples
///
/// ```rust,ignore
/// use basket_miner::sources::{CsvOptions, CsvSource};
///
/// let source = CsvSource::new("data/sales.csv")?;
///
/// let options = CsvOptions {
///     delimiter: b';',
///     ..Default::default()
/// };
/// let source = CsvSource::with_options("data/sales_eu.csv", options)?;
///
/// let source = CsvSource::from_glob("data/2024-*.csv")?;
/// ```
#[derive(Debug, Clone)]
pub struct CsvSource {
    paths: Vec<String>,
    options: CsvOptions,
}

impl CsvSource {
    /// Creates a new CSV source from a single file path.
    pub fn new(path: impl Into<String>) -> Result<Self> {
        Self::from_paths(vec![path.into()])
    }

    /// Creates a new CSV source with custom options.
    pub fn with_options(path: impl Into<String>, options: CsvOptions) -> Result<Self> {
        Ok(Self::new(path)?.with_custom_options(options))
    }

    /// Creates a CSV source from multiple file paths.
    pub fn from_paths(paths: Vec<String>) -> Result<Self> {
        if paths.is_empty() {
            return Err(BasketError::Configuration(
                "At least one path must be provided".to_string(),
            ));
        }
        Ok(Self {
            paths,
            options: CsvOptions::default(),
        })
    }

    /// Creates a CSV source from a glob pattern.
    pub fn from_glob(pattern: impl Into<String>) -> Result<Self> {
        Self::from_globs(vec![pattern.into()])
    }

    /// Creates a CSV source from multiple glob patterns.
    pub fn from_globs(patterns: Vec<String>) -> Result<Self> {
        let paths = super::expand_globs(&patterns)?;
        Self::from_paths(paths)
    }

    /// Sets custom options for this CSV source.
    pub fn with_custom_options(mut self, options: CsvOptions) -> Self {
        self.options = options;
        self
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn options(&self) -> &CsvOptions {
        &self.options
    }

    /// File extension DataFusion should accept, taken from the first path.
    fn file_extension(&self) -> String {
        std::path::Path::new(&self.paths[0])
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{ext}"))
            .unwrap_or_else(|| ".csv".to_string())
    }
}

#[async_trait]
impl DataSource for CsvSource {
    #[instrument(skip(self, ctx), fields(
        table.name = %table_name,
        source.type = "csv",
        source.files = self.paths.len(),
        csv.delimiter = %self.options.delimiter as char,
        csv.has_header = self.options.has_header
    ))]
    async fn register(&self, ctx: &SessionContext, table_name: &str) -> Result<()> {
        info!(
            table.name = %table_name,
            source.paths = ?self.paths,
            "Registering CSV data source"
        );

        let extension = self.file_extension();
        let read_options = CsvReadOptions::new()
            .has_header(self.options.has_header)
            .delimiter(self.options.delimiter)
            .quote(self.options.quote)
            .schema_infer_max_records(self.options.schema_infer_max_records)
            .file_extension(&extension);

        if self.paths.len() == 1 {
            ctx.register_csv(table_name, &self.paths[0], read_options)
                .await?;
        } else {
            let df = ctx.read_csv(self.paths.clone(), read_options).await?;
            ctx.register_table(table_name, df.into_view())?;
        }

        debug!(
            table.name = %table_name,
            source.files = self.paths.len(),
            "CSV data source registered successfully"
        );
        Ok(())
    }

    fn description(&self) -> String {
        if self.paths.len() == 1 {
            let path = &self.paths[0];
            format!("CSV file: {path}")
        } else {
            let count = self.paths.len();
            format!("CSV files: {count} files")
        }
    }
}
