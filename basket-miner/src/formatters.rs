//! Report formatting for basket analysis results.
//!
//! This module renders an [`AnalysisReport`] as JSON for programmatic
//! consumers, as plain text for terminals, or as Markdown for documents.
//!
//! # Examples
//!
//! ```rust
//! use basket_miner::analysis::{BasketAnalysis, SalesRecord};
//! use basket_miner::config::AnalysisConfig;
//! use basket_miner::formatters::{HumanFormatter, ReportFormatter};
//!
//! let records = vec![
//!     SalesRecord::new("1", "shirt", "tops", 1.0),
//!     SalesRecord::new("1", "tie", "tops", 1.0),
//! ];
//! let report = BasketAnalysis::new(AnalysisConfig::default())
//!     .unwrap()
//!     .analyze_records(&records);
//! let output = HumanFormatter::new().format(&report).unwrap();
//! assert!(output.contains("Category: tops"));
//! ```

use std::fmt::{self, Write};

use serde_json::Value;

use crate::analysis::{AnalysisReport, PartitionAnalysis};
use crate::error::{BasketError, Result};
use crate::mining::Rule;

/// Configuration options for rendering analysis reports.
#[derive(Debug, Clone)]
pub struct FormatterConfig {
    /// Maximum number of rules shown per partition (-1 for all)
    pub max_rules: i32,
    /// Include the item popularity ranking
    pub include_top_items: bool,
    /// Include frequent itemsets and the encoded matrix
    pub include_itemsets: bool,
    /// Whether to use colorized output (for human formatter)
    pub use_colors: bool,
    /// Whether to include the generation timestamp
    pub include_timestamps: bool,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            max_rules: 5,
            include_top_items: true,
            include_itemsets: false,
            use_colors: true,
            include_timestamps: true,
        }
    }
}

impl FormatterConfig {
    /// Creates a minimal configuration showing only per-partition summaries.
    pub fn minimal() -> Self {
        Self {
            max_rules: 0,
            include_top_items: false,
            include_itemsets: false,
            use_colors: false,
            include_timestamps: false,
        }
    }

    /// Creates a detailed configuration showing everything.
    pub fn detailed() -> Self {
        Self {
            max_rules: -1,
            include_top_items: true,
            include_itemsets: true,
            use_colors: true,
            include_timestamps: true,
        }
    }

    /// Creates a configuration suitable for CI logs.
    pub fn ci() -> Self {
        Self {
            max_rules: 20,
            include_top_items: true,
            include_itemsets: false,
            use_colors: false,
            include_timestamps: true,
        }
    }

    /// Sets the maximum number of rules shown per partition.
    pub fn with_max_rules(mut self, max: i32) -> Self {
        self.max_rules = max;
        self
    }

    pub fn with_itemsets(mut self, include: bool) -> Self {
        self.include_itemsets = include;
        self
    }

    pub fn with_top_items(mut self, include: bool) -> Self {
        self.include_top_items = include;
        self
    }

    /// Sets whether to use colorized output.
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    pub fn with_timestamps(mut self, include: bool) -> Self {
        self.include_timestamps = include;
        self
    }

    fn rules_to_show<'a>(&self, rules: &'a [Rule]) -> &'a [Rule] {
        if self.max_rules < 0 {
            rules
        } else {
            &rules[..rules.len().min(self.max_rules as usize)]
        }
    }
}

/// Trait for rendering analysis reports into an output format.
///
/// ```rust
/// use basket_miner::analysis::AnalysisReport;
/// use basket_miner::formatters::ReportFormatter;
///
/// struct CountFormatter;
///
/// impl ReportFormatter for CountFormatter {
///     fn format(&self, report: &AnalysisReport) -> basket_miner::error::Result<String> {
///         let categories = report.category_outcomes.len();
///         Ok(format!("{categories} categories"))
///     }
/// }
/// ```
pub trait ReportFormatter {
    /// Formats a report with the formatter's own configuration.
    fn format(&self, report: &AnalysisReport) -> Result<String>;

    /// Formats a report with custom configuration.
    fn format_with_config(
        &self,
        report: &AnalysisReport,
        _config: &FormatterConfig,
    ) -> Result<String> {
        self.format(report)
    }
}

/// Formats reports as structured JSON.
///
/// Infinite conviction values are written as `null`.
#[derive(Debug, Clone)]
pub struct JsonFormatter {
    config: FormatterConfig,
    pretty: bool,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self {
            config: FormatterConfig::default(),
            pretty: true,
        }
    }

    pub fn with_config(config: FormatterConfig) -> Self {
        Self {
            config,
            pretty: true,
        }
    }

    /// Sets whether to use pretty-printed JSON.
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for JsonFormatter {
    fn format(&self, report: &AnalysisReport) -> Result<String> {
        self.format_with_config(report, &self.config)
    }

    fn format_with_config(
        &self,
        report: &AnalysisReport,
        config: &FormatterConfig,
    ) -> Result<String> {
        let filtered = filter_report_value(report, config)?;

        let output = if self.pretty {
            serde_json::to_string_pretty(&filtered)
        } else {
            serde_json::to_string(&filtered)
        };
        output.map_err(|e| BasketError::Serialization(format!("Failed to serialize report: {e}")))
    }
}

/// Formats reports as plain text for terminals and logs.
#[derive(Debug, Clone)]
pub struct HumanFormatter {
    config: FormatterConfig,
}

impl HumanFormatter {
    pub fn new() -> Self {
        Self {
            config: FormatterConfig::default(),
        }
    }

    pub fn with_config(config: FormatterConfig) -> Self {
        Self { config }
    }
}

impl Default for HumanFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for HumanFormatter {
    fn format(&self, report: &AnalysisReport) -> Result<String> {
        self.format_with_config(report, &self.config)
    }

    fn format_with_config(
        &self,
        report: &AnalysisReport,
        config: &FormatterConfig,
    ) -> Result<String> {
        let mut output = String::new();
        write_human(&mut output, report, config).map_err(render_error)?;
        Ok(output)
    }
}

fn write_human(out: &mut String, report: &AnalysisReport, config: &FormatterConfig) -> fmt::Result {
    let (bold, yellow, reset) = if config.use_colors {
        ("\x1b[1m", "\x1b[33m", "\x1b[0m")
    } else {
        ("", "", "")
    };

    writeln!(out)?;
    writeln!(out, "{bold}Market Basket Analysis{reset}")?;
    writeln!(out)?;
    writeln!(out, "Source: {}", report.source)?;
    if config.include_timestamps {
        writeln!(out, "Generated: {}", report.generated_at.to_rfc3339())?;
    }
    writeln!(out, "Columns: {}", report.dataset_columns.join(", "))?;
    writeln!(
        out,
        "Records: {} ({} skipped)",
        report.record_count, report.skipped_rows
    )?;
    writeln!(
        out,
        "Mining: min_support {}, {} >= {}",
        report.mining.min_support, report.mining.metric, report.mining.min_threshold
    )?;
    writeln!(out, "Categories: {}", report.categories.join(", "))?;

    if config.include_top_items && !report.top_items.is_empty() {
        writeln!(out)?;
        writeln!(out, "Top items:")?;
        for (i, item) in report.top_items.iter().enumerate() {
            writeln!(out, "   {:>2}. {} ({})", i + 1, item.item, item.quantity)?;
        }
    }

    for section in sections(report) {
        writeln!(out)?;
        writeln!(
            out,
            "{bold}{}{reset} ({} transactions)",
            section.title, section.transaction_count
        )?;

        if let Some(err) = section.failure {
            writeln!(out, "   {yellow}No rules: {err}{reset}")?;
            continue;
        }
        let Some(analysis) = section.analysis else {
            continue;
        };

        writeln!(
            out,
            "   Vocabulary: {} items, frequent itemsets: {}, rules: {}",
            analysis.vocabulary().len(),
            analysis.itemsets.len(),
            analysis.total_rules
        )?;

        if config.include_itemsets {
            writeln!(out, "   Frequent itemsets:")?;
            for itemset in &analysis.itemsets {
                writeln!(
                    out,
                    "      {{{}}} support {}",
                    itemset.items.join(", "),
                    format_metric(itemset.support)
                )?;
            }
        }

        let shown = config.rules_to_show(&analysis.rules);
        for (i, rule) in shown.iter().enumerate() {
            writeln!(
                out,
                "   {:>2}. {}  support {}  confidence {}  lift {}  leverage {}  conviction {}",
                i + 1,
                rule,
                format_metric(rule.support),
                format_metric(rule.confidence),
                format_metric(rule.lift),
                format_metric(rule.leverage),
                format_metric(rule.conviction)
            )?;
        }
        let hidden = analysis.total_rules.saturating_sub(shown.len());
        if hidden > 0 {
            writeln!(
                out,
                "   ... and {hidden} more rules (use --rules to show more)"
            )?;
        }
    }

    writeln!(out)
}

/// Formats reports as Markdown suitable for documentation.
#[derive(Debug, Clone)]
pub struct MarkdownFormatter {
    config: FormatterConfig,
    heading_level: u8,
}

impl MarkdownFormatter {
    pub fn new() -> Self {
        Self {
            config: FormatterConfig::default(),
            heading_level: 2,
        }
    }

    pub fn with_config(config: FormatterConfig) -> Self {
        Self {
            config,
            heading_level: 2,
        }
    }

    /// Sets the base heading level for the output.
    pub fn with_heading_level(mut self, level: u8) -> Self {
        self.heading_level = level.clamp(1, 6);
        self
    }
}

impl Default for MarkdownFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for MarkdownFormatter {
    fn format(&self, report: &AnalysisReport) -> Result<String> {
        self.format_with_config(report, &self.config)
    }

    fn format_with_config(
        &self,
        report: &AnalysisReport,
        config: &FormatterConfig,
    ) -> Result<String> {
        let mut output = String::new();
        write_markdown(&mut output, report, config, self.heading_level).map_err(render_error)?;
        Ok(output)
    }
}

fn write_markdown(
    out: &mut String,
    report: &AnalysisReport,
    config: &FormatterConfig,
    heading_level: u8,
) -> fmt::Result {
    let h = "#".repeat(heading_level as usize);

    writeln!(out, "{h} Market Basket Analysis")?;
    writeln!(out)?;
    writeln!(out, "**Source:** {}", report.source)?;
    if config.include_timestamps {
        writeln!(out, "**Generated:** {}", report.generated_at.to_rfc3339())?;
    }
    writeln!(out)?;
    writeln!(out, "| Setting | Value |")?;
    writeln!(out, "|---------|-------|")?;
    writeln!(out, "| Records | {} |", report.record_count)?;
    writeln!(out, "| Skipped rows | {} |", report.skipped_rows)?;
    writeln!(out, "| Min support | {} |", report.mining.min_support)?;
    writeln!(
        out,
        "| Rule filter | {} >= {} |",
        report.mining.metric, report.mining.min_threshold
    )?;
    writeln!(out, "| Categories | {} |", report.categories.join(", "))?;

    if config.include_top_items && !report.top_items.is_empty() {
        writeln!(out)?;
        writeln!(out, "{h}# Top Items")?;
        writeln!(out)?;
        writeln!(out, "| Rank | Item | Quantity |")?;
        writeln!(out, "|------|------|----------|")?;
        for (i, item) in report.top_items.iter().enumerate() {
            writeln!(out, "| {} | {} | {} |", i + 1, item.item, item.quantity)?;
        }
    }

    for section in sections(report) {
        writeln!(out)?;
        writeln!(out, "{h}# {}", section.title)?;
        writeln!(out)?;
        writeln!(out, "- **Transactions:** {}", section.transaction_count)?;

        if let Some(err) = section.failure {
            writeln!(out)?;
            writeln!(out, "> **Note:** {err}")?;
            continue;
        }
        let Some(analysis) = section.analysis else {
            continue;
        };

        writeln!(out, "- **Vocabulary:** {} items", analysis.vocabulary().len())?;
        writeln!(out, "- **Frequent itemsets:** {}", analysis.itemsets.len())?;
        writeln!(out, "- **Rules:** {}", analysis.total_rules)?;

        if config.include_itemsets {
            writeln!(out)?;
            writeln!(out, "| Itemset | Support |")?;
            writeln!(out, "|---------|---------|")?;
            for itemset in &analysis.itemsets {
                writeln!(
                    out,
                    "| {} | {} |",
                    itemset.items.join(", "),
                    format_metric(itemset.support)
                )?;
            }
        }

        let shown = config.rules_to_show(&analysis.rules);
        if !shown.is_empty() {
            writeln!(out)?;
            writeln!(
                out,
                "| Antecedents | Consequents | Support | Confidence | Lift | Leverage | Conviction |"
            )?;
            writeln!(
                out,
                "|-------------|-------------|---------|------------|------|----------|------------|"
            )?;
            for rule in shown {
                writeln!(
                    out,
                    "| {} | {} | {} | {} | {} | {} | {} |",
                    rule.antecedents.join(", "),
                    rule.consequents.join(", "),
                    format_metric(rule.support),
                    format_metric(rule.confidence),
                    format_metric(rule.lift),
                    format_metric(rule.leverage),
                    format_metric(rule.conviction)
                )?;
            }
        }
        let hidden = analysis.total_rules.saturating_sub(shown.len());
        if hidden > 0 {
            writeln!(out)?;
            writeln!(
                out,
                "> **Note:** {hidden} additional rules not shown in this report."
            )?;
        }
    }

    Ok(())
}

/// One partition of the report, global or per category.
struct Section<'a> {
    title: String,
    transaction_count: usize,
    analysis: Option<&'a PartitionAnalysis>,
    failure: Option<&'a BasketError>,
}

fn sections(report: &AnalysisReport) -> Vec<Section<'_>> {
    let global = Section {
        title: "All transactions".to_string(),
        transaction_count: report.global.transaction_count,
        analysis: report.global.analysis.as_ref(),
        failure: report.global.failure.as_ref(),
    };
    std::iter::once(global)
        .chain(report.category_outcomes.iter().map(|outcome| Section {
            title: format!("Category: {}", outcome.category),
            transaction_count: outcome.transaction_count,
            analysis: outcome.analysis.as_ref(),
            failure: outcome.failure.as_ref(),
        }))
        .collect()
}

/// Three decimals, `inf` for infinite conviction.
fn format_metric(value: f64) -> String {
    if value == f64::INFINITY {
        "inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        format!("{value:.3}")
    }
}

fn render_error(e: fmt::Error) -> BasketError {
    BasketError::Internal(format!("Failed to render report: {e}"))
}

/// Serializes the report and drops what `config` excludes.
fn filter_report_value(report: &AnalysisReport, config: &FormatterConfig) -> Result<Value> {
    let mut value = serde_json::to_value(report)?;

    if let Some(obj) = value.as_object_mut() {
        if !config.include_timestamps {
            obj.remove("generated_at");
        }
        if !config.include_top_items {
            obj.remove("top_items");
        }
    }

    if let (Some(analysis), Some(slot)) = (
        report.global.analysis.as_ref(),
        value.get_mut("global").and_then(|g| g.get_mut("analysis")),
    ) {
        filter_analysis(slot, analysis, config);
    }

    if let Some(outcomes) = value
        .get_mut("category_outcomes")
        .and_then(Value::as_array_mut)
    {
        for (outcome, slot) in report.category_outcomes.iter().zip(outcomes.iter_mut()) {
            if let (Some(analysis), Some(slot)) =
                (outcome.analysis.as_ref(), slot.get_mut("analysis"))
            {
                filter_analysis(slot, analysis, config);
            }
        }
    }

    Ok(value)
}

fn filter_analysis(slot: &mut Value, analysis: &PartitionAnalysis, config: &FormatterConfig) {
    let Some(obj) = slot.as_object_mut() else {
        return;
    };

    obj.insert(
        "vocabulary".to_string(),
        Value::from(analysis.vocabulary().to_vec()),
    );
    obj.insert(
        "itemset_count".to_string(),
        Value::from(analysis.itemsets.len()),
    );
    obj.insert("rule_count".to_string(), Value::from(analysis.total_rules));

    if !config.include_itemsets {
        obj.remove("itemsets");
        obj.remove("matrix");
    }
    if config.max_rules >= 0 {
        if let Some(Value::Array(rules)) = obj.get_mut("rules") {
            rules.truncate(config.max_rules as usize);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{BasketAnalysis, SalesRecord};
    use crate::config::{AnalysisConfig, MiningConfig};

    fn create_test_report() -> AnalysisReport {
        build_test_report(AnalysisConfig::default())
    }

    fn capped_test_report(limit: usize) -> AnalysisReport {
        build_test_report(AnalysisConfig::default().with_rules_per_category(limit))
    }

    fn build_test_report(config: AnalysisConfig) -> AnalysisReport {
        let records = vec![
            SalesRecord::new("1", "Kemeja", "Atasan", 1.0),
            SalesRecord::new("1", "Dasi", "Atasan", 1.0),
            SalesRecord::new("1", "Jas", "Atasan", 1.0),
            SalesRecord::new("2", "Kemeja", "Atasan", 1.0),
            SalesRecord::new("2", "Jas", "Atasan", 1.0),
            SalesRecord::new("3", "Rok", "Bawahan", 0.0),
        ];
        let config = config.with_mining(MiningConfig::default().with_min_support(0.5));
        BasketAnalysis::new(config)
            .unwrap()
            .analyze_records(&records)
    }

    #[test]
    fn test_formatter_config() {
        let config = FormatterConfig::default();
        assert_eq!(config.max_rules, 5);
        assert!(config.use_colors);
        assert!(!config.include_itemsets);

        let minimal = FormatterConfig::minimal();
        assert_eq!(minimal.max_rules, 0);
        assert!(!minimal.include_top_items);

        let detailed = FormatterConfig::detailed();
        assert_eq!(detailed.max_rules, -1);
        assert!(detailed.include_itemsets);
    }

    #[test]
    fn test_format_metric() {
        assert_eq!(format_metric(0.5), "0.500");
        assert_eq!(format_metric(f64::INFINITY), "inf");
        assert_eq!(format_metric(1.0 / 3.0), "0.333");
    }

    #[test]
    fn test_json_formatter() {
        let report = create_test_report();
        let output = JsonFormatter::new().format(&report).unwrap();
        let json: Value = serde_json::from_str(&output).unwrap();

        let atasan = &json["category_outcomes"][0];
        assert_eq!(atasan["category"], "Atasan");
        assert_eq!(atasan["analysis"]["vocabulary"][0], "Kemeja");
        assert!(atasan["analysis"].get("matrix").is_none());
        // The top-ranked rule has confidence 1.
        assert!(atasan["analysis"]["rules"][0]["conviction"].is_null());

        let bawahan = &json["category_outcomes"][1];
        assert!(bawahan["analysis"].is_null());
        assert!(bawahan["failure"]
            .as_str()
            .unwrap()
            .contains("Insufficient data"));
    }

    #[test]
    fn test_json_formatter_respects_config() {
        let report = create_test_report();
        let config = FormatterConfig::minimal();
        let output = JsonFormatter::new()
            .with_pretty(false)
            .format_with_config(&report, &config)
            .unwrap();
        assert!(!output.contains('\n'));

        let json: Value = serde_json::from_str(&output).unwrap();
        assert!(json.get("generated_at").is_none());
        assert!(json.get("top_items").is_none());
        let atasan = &json["category_outcomes"][0]["analysis"];
        assert_eq!(atasan["rules"].as_array().unwrap().len(), 0);
        assert!(atasan["rule_count"].as_u64().unwrap() > 0);
    }

    #[test]
    fn test_human_formatter() {
        let report = create_test_report();
        let output = HumanFormatter::new().format(&report).unwrap();
        assert!(output.contains("\x1b[1mMarket Basket Analysis\x1b[0m"));
        assert!(output.contains("No rules: Insufficient data"));

        let config = FormatterConfig::default().with_colors(false);
        let output = HumanFormatter::new()
            .format_with_config(&report, &config)
            .unwrap();
        assert!(!output.contains("\x1b["));
        assert!(output.contains("Category: Atasan (2 transactions)"));
        assert!(output.contains("conviction inf"));
        assert!(output.contains("Top items:"));
    }

    #[test]
    fn test_human_formatter_truncates_rules() {
        let report = create_test_report();
        let total = report.rules_for("Atasan").unwrap().len();
        assert!(total > 1);

        let config = FormatterConfig::default().with_max_rules(1);
        let output = HumanFormatter::with_config(config).format(&report).unwrap();
        assert!(output.contains(&format!("... and {} more rules", total - 1)));
    }

    #[test]
    fn test_counts_ignore_rules_per_category_cap() {
        let uncapped = create_test_report();
        let total = uncapped.rules_for("Atasan").unwrap().len();
        assert!(total > 1);

        let report = capped_test_report(1);
        assert_eq!(report.rules_for("Atasan").unwrap().len(), 1);

        let config = FormatterConfig::default().with_colors(false);
        let json: Value = serde_json::from_str(
            &JsonFormatter::new().format_with_config(&report, &config).unwrap(),
        )
        .unwrap();
        let atasan = &json["category_outcomes"][0]["analysis"];
        assert_eq!(atasan["rule_count"].as_u64().unwrap(), total as u64);
        assert_eq!(atasan["rules"].as_array().unwrap().len(), 1);

        let human = HumanFormatter::new()
            .format_with_config(&report, &config)
            .unwrap();
        assert!(human.contains(&format!("rules: {total}")));
        assert!(human.contains(&format!("... and {} more rules", total - 1)));

        let markdown = MarkdownFormatter::new().format(&report).unwrap();
        assert!(markdown.contains(&format!("- **Rules:** {total}")));
        assert!(markdown.contains(&format!("> **Note:** {} additional rules", total - 1)));
    }

    #[test]
    fn test_markdown_formatter() {
        let report = create_test_report();
        let output = MarkdownFormatter::new().format(&report).unwrap();
        assert!(output.contains("## Market Basket Analysis"));
        assert!(output.contains("### Category: Atasan"));
        assert!(output.contains("| Antecedents | Consequents |"));
        assert!(output.contains("> **Note:** Insufficient data"));

        let output = MarkdownFormatter::new()
            .with_heading_level(1)
            .format(&report)
            .unwrap();
        assert!(output.starts_with("# Market Basket Analysis"));
    }
}
