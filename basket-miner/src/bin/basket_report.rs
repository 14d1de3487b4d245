//! `basket-report`: mines association rules from sales CSV files.
//!
//! **Usage:**
//! ```text
//! basket-report data/sales.csv [--min-support 0.01] [--metric lift] [--min-threshold 0.1]
//!               [--format human|json|markdown] [--rules 5]
//! ```
//!
//! Exits non-zero when the data cannot be loaded or the thresholds are
//! invalid. Categories without enough data are reported and skipped.

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::Level;

use basket_miner::analysis::BasketAnalysis;
use basket_miner::config::AnalysisConfig;
use basket_miner::formatters::{
    FormatterConfig, HumanFormatter, JsonFormatter, MarkdownFormatter, ReportFormatter,
};
use basket_miner::logging::setup::{init_logging, LoggingConfig};
use basket_miner::logging::LogConfig;
use basket_miner::mining::Metric;
use basket_miner::sources::CsvSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Human,
    Json,
    Markdown,
}

/// Market basket analysis over sales transactions.
#[derive(Parser, Debug)]
#[command(name = "basket-report", version, about, long_about = None)]
struct Args {
    /// CSV files or glob patterns to analyze
    #[arg(required = true)]
    paths: Vec<String>,

    /// JSON configuration file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Minimum itemset support, in (0, 1]
    #[arg(long)]
    min_support: Option<f64>,

    /// Rule filter metric: support, confidence, lift, leverage or conviction
    #[arg(long)]
    metric: Option<String>,

    /// Minimum value of the filter metric
    #[arg(long)]
    min_threshold: Option<f64>,

    /// Largest itemset size to mine
    #[arg(long)]
    max_len: Option<usize>,

    /// Number of best-selling items to list
    #[arg(long)]
    top: Option<usize>,

    /// Rules shown per category
    #[arg(long, default_value_t = 5)]
    rules: usize,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    format: OutputFormat,

    #[arg(long)]
    transaction_column: Option<String>,

    #[arg(long)]
    item_column: Option<String>,

    #[arg(long)]
    category_column: Option<String>,

    #[arg(long)]
    quantity_column: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Debug-level logging with per-category details
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// Loads the configuration file, if any, and applies flag overrides.
    fn analysis_config(&self) -> Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::from_json_file(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => AnalysisConfig::default(),
        };

        let mining = &mut config.mining;
        if let Some(min_support) = self.min_support {
            mining.min_support = min_support;
        }
        if let Some(name) = &self.metric {
            mining.metric = name.parse::<Metric>()?;
        }
        if let Some(min_threshold) = self.min_threshold {
            mining.min_threshold = min_threshold;
        }
        if let Some(max_len) = self.max_len {
            mining.max_len = Some(max_len);
        }

        if let Some(column) = &self.transaction_column {
            config.columns.transaction = column.clone();
        }
        if let Some(column) = &self.item_column {
            config.columns.item = column.clone();
        }
        if let Some(column) = &self.category_column {
            config.columns.category = column.clone();
        }
        if let Some(column) = &self.quantity_column {
            config.columns.quantity = column.clone();
        }
        if let Some(top) = self.top {
            config.top_items = top;
        }

        Ok(config)
    }

    fn formatter_config(&self) -> FormatterConfig {
        let use_colors = self.format == OutputFormat::Human && std::io::stdout().is_terminal();
        FormatterConfig::default()
            .with_max_rules(i32::try_from(self.rules).unwrap_or(i32::MAX))
            .with_colors(use_colors)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let logging = if args.verbose {
        LoggingConfig::development()
    } else {
        LoggingConfig::default().with_level(Level::WARN)
    };
    init_logging(logging.with_json_format(args.json_logs))
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;

    let config = args.analysis_config()?;
    let log_config = if args.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };
    let analysis = BasketAnalysis::new(config)?.with_log_config(log_config);

    let source = CsvSource::from_globs(args.paths.clone())?;
    let report = analysis
        .analyze_source(&source)
        .await
        .with_context(|| format!("failed to analyze {}", args.paths.join(", ")))?;

    let formatter_config = args.formatter_config();
    let output = match args.format {
        OutputFormat::Human => HumanFormatter::new().format_with_config(&report, &formatter_config),
        OutputFormat::Json => JsonFormatter::new().format_with_config(&report, &formatter_config),
        OutputFormat::Markdown => {
            MarkdownFormatter::new().format_with_config(&report, &formatter_config)
        }
    }?;
    print!("{output}");

    Ok(())
}
