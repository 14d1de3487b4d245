//! Category partitioning and the per-partition mining pipeline.
//!
//! Records are split by category label and each category is mined on its
//! own: its own vocabulary, matrix, itemsets and rules. Support is measured
//! relative to the category's transaction count, so merging two categories'
//! results does not reproduce a run over their union. Small categories can
//! end up with no frequent itemset at all at the default threshold; that is
//! reported as [`BasketError::InsufficientData`] for the category alone.

use std::collections::HashMap;

use serde::{Deserialize, Serialize, Serializer};
use tracing::{info, instrument, warn};

use crate::config::MiningConfig;
use crate::error::{BasketError, Result};
use crate::log_partition;
use crate::logging::{truncate_field, LogConfig};
use crate::mining::{
    apriori, association_rules, rank_rules, BooleanMatrix, FrequentItemsets, Rule, Transaction,
    TransactionEncoder,
};

/// One line of the sales dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub transaction_id: String,
    pub item: String,
    pub category: String,
    pub quantity: f64,
}

impl SalesRecord {
    pub fn new(
        transaction_id: impl Into<String>,
        item: impl Into<String>,
        category: impl Into<String>,
        quantity: f64,
    ) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            item: item.into(),
            category: category.into(),
            quantity,
        }
    }
}

/// Builds one basket per transaction id from sales lines.
///
/// Quantities are summed per (transaction, item) and an item is present
/// when its total is positive. A transaction whose items all total zero is
/// kept as an empty basket so it still counts toward support. Transactions
/// and items keep their first-appearance order.
pub fn group_transactions<'a, I>(records: I) -> Vec<Transaction>
where
    I: IntoIterator<Item = &'a SalesRecord>,
{
    let mut order: Vec<(String, Vec<(String, f64)>)> = Vec::new();
    let mut positions: HashMap<&'a str, usize> = HashMap::new();

    for record in records {
        let idx = *positions
            .entry(record.transaction_id.as_str())
            .or_insert_with(|| {
                order.push((record.transaction_id.clone(), Vec::new()));
                order.len() - 1
            });

        let lines = &mut order[idx].1;
        match lines.iter_mut().find(|(item, _)| *item == record.item) {
            Some((_, total)) => *total += record.quantity,
            None => lines.push((record.item.clone(), record.quantity)),
        }
    }

    order
        .into_iter()
        .map(|(id, lines)| {
            let items = lines
                .into_iter()
                .filter(|(_, total)| *total > 0.0)
                .map(|(item, _)| item);
            Transaction::new(id, items)
        })
        .collect()
}

/// Everything one mining run produced.
#[derive(Debug, Clone, Serialize)]
pub struct PartitionAnalysis {
    pub name: String,
    pub matrix: BooleanMatrix,
    pub itemsets: FrequentItemsets,
    /// Rules ranked by confidence, then lift
    pub rules: Vec<Rule>,
    /// Rules generated before any cap was applied to `rules`
    pub total_rules: usize,
}

impl PartitionAnalysis {
    /// Column vocabulary of the partition's matrix.
    pub fn vocabulary(&self) -> &[String] {
        self.matrix.columns()
    }
}

/// Runs encoder, miner and rule generator over one set of baskets.
///
/// Fails with [`BasketError::InsufficientData`] when no itemset reaches the
/// support threshold; a partition whose frequent itemsets are all single
/// items succeeds with an empty rule list.
#[instrument(skip(transactions, config), fields(partition = %name, transactions = transactions.len()))]
pub fn mine_partition(
    name: &str,
    transactions: &[Transaction],
    config: &MiningConfig,
) -> Result<PartitionAnalysis> {
    let (_, matrix) = TransactionEncoder::fit_transform(transactions)?;
    let itemsets = apriori(&matrix, &config.apriori_options())?;
    if itemsets.is_empty() {
        return Err(BasketError::insufficient_data(
            name,
            format!(
                "no itemset reaches min_support {} over {} transactions",
                config.min_support,
                matrix.n_rows()
            ),
        ));
    }

    let mut rules = association_rules(&itemsets, config.metric, config.min_threshold)?;
    rank_rules(&mut rules);

    Ok(PartitionAnalysis {
        name: name.to_string(),
        matrix,
        itemsets,
        total_rules: rules.len(),
        rules,
    })
}

/// The transactions of a single category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryPartition {
    pub category: String,
    pub transactions: Vec<Transaction>,
}

/// Result of mining one category: either an analysis or a failure notice.
#[derive(Debug, Serialize)]
pub struct CategoryOutcome {
    pub category: String,
    pub transaction_count: usize,
    pub analysis: Option<PartitionAnalysis>,
    #[serde(serialize_with = "serialize_failure")]
    pub failure: Option<BasketError>,
}

impl CategoryOutcome {
    /// Ranked rules, empty when the category failed.
    pub fn rules(&self) -> &[Rule] {
        self.analysis
            .as_ref()
            .map(|a| a.rules.as_slice())
            .unwrap_or_default()
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

pub(crate) fn serialize_failure<S>(
    failure: &Option<BasketError>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match failure {
        Some(err) => serializer.serialize_some(&err.to_string()),
        None => serializer.serialize_none(),
    }
}

/// Splits sales records by category and mines each category independently.
///
/// ```rust
/// use basket_miner::analysis::{CategoryPartitioner, SalesRecord};
/// use basket_miner::config::MiningConfig;
///
/// let records = vec![
///     SalesRecord::new("1", "shirt", "tops", 1.0),
///     SalesRecord::new("1", "tie", "tops", 1.0),
///     SalesRecord::new("2", "shirt", "tops", 2.0),
///     SalesRecord::new("3", "jeans", "bottoms", 1.0),
/// ];
/// let outcomes = CategoryPartitioner::new(MiningConfig::default()).run(&records);
/// assert_eq!(outcomes.len(), 2);
/// assert_eq!(outcomes[0].category, "tops");
/// assert_eq!(outcomes[0].rules()[0].to_string(), "{tie} -> {shirt}");
/// ```
#[derive(Debug, Clone, Default)]
pub struct CategoryPartitioner {
    config: MiningConfig,
    log_config: LogConfig,
}

impl CategoryPartitioner {
    pub fn new(config: MiningConfig) -> Self {
        Self {
            config,
            log_config: LogConfig::default(),
        }
    }

    pub fn with_log_config(mut self, log_config: LogConfig) -> Self {
        self.log_config = log_config;
        self
    }

    pub fn config(&self) -> &MiningConfig {
        &self.config
    }

    /// Groups records by category, in first-appearance order of the labels.
    pub fn partition(&self, records: &[SalesRecord]) -> Vec<CategoryPartition> {
        let mut labels: Vec<&str> = Vec::new();
        let mut members: HashMap<&str, Vec<&SalesRecord>> = HashMap::new();
        for record in records {
            let category = record.category.as_str();
            members
                .entry(category)
                .or_insert_with(|| {
                    labels.push(category);
                    Vec::new()
                })
                .push(record);
        }

        labels
            .into_iter()
            .map(|label| CategoryPartition {
                category: label.to_string(),
                transactions: group_transactions(members.remove(label).unwrap_or_default()),
            })
            .collect()
    }

    /// Mines every category; a failing category never stops the others.
    #[instrument(skip(self, records), fields(records = records.len()))]
    pub fn run(&self, records: &[SalesRecord]) -> Vec<CategoryOutcome> {
        self.partition(records)
            .into_iter()
            .map(|partition| self.run_partition(partition))
            .collect()
    }

    fn run_partition(&self, partition: CategoryPartition) -> CategoryOutcome {
        let CategoryPartition {
            category,
            transactions,
        } = partition;
        let transaction_count = transactions.len();

        match mine_partition(&category, &transactions, &self.config) {
            Ok(analysis) => {
                log_partition!(
                    self.log_config,
                    category = %truncate_field(&category, self.log_config.max_field_length),
                    vocabulary = analysis.vocabulary().len(),
                    itemsets = analysis.itemsets.len(),
                    "Category mined"
                );
                info!(
                    category = %category,
                    transactions = transaction_count,
                    rules = analysis.rules.len(),
                    "Category analysis complete"
                );
                CategoryOutcome {
                    category,
                    transaction_count,
                    analysis: Some(analysis),
                    failure: None,
                }
            }
            Err(err) => {
                warn!(
                    category = %category,
                    transactions = transaction_count,
                    error = %err,
                    "Category analysis failed; continuing with remaining categories"
                );
                CategoryOutcome {
                    category,
                    transaction_count,
                    analysis: None,
                    failure: Some(err),
                }
            }
        }
    }
}
