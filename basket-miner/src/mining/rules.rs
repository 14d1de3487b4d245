//! Association rule derivation, scoring and ranking.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::itemset::{FrequentItemsets, Itemset};
use crate::error::{BasketError, Result};

/// Metric used to filter association rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Support,
    Confidence,
    Lift,
    Leverage,
    Conviction,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::Support,
        Metric::Confidence,
        Metric::Lift,
        Metric::Leverage,
        Metric::Conviction,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Support => "support",
            Metric::Confidence => "confidence",
            Metric::Lift => "lift",
            Metric::Leverage => "leverage",
            Metric::Conviction => "conviction",
        }
    }

    /// Reads this metric's value off a rule.
    pub fn value(&self, rule: &Rule) -> f64 {
        match self {
            Metric::Support => rule.support,
            Metric::Confidence => rule.confidence,
            Metric::Lift => rule.lift,
            Metric::Leverage => rule.leverage,
            Metric::Conviction => rule.conviction,
        }
    }

    /// Checks that `threshold` is meaningful for this metric.
    ///
    /// Support and confidence are fractions, so their thresholds must lie in
    /// `[0, 1]`; the other metrics only reject NaN.
    pub fn validate_threshold(&self, threshold: f64) -> Result<()> {
        if threshold.is_nan() {
            return Err(BasketError::invalid_threshold(
                self.as_str(),
                threshold,
                "threshold must be a number",
            ));
        }
        if matches!(self, Metric::Support | Metric::Confidence)
            && !(0.0..=1.0).contains(&threshold)
        {
            return Err(BasketError::invalid_threshold(
                self.as_str(),
                threshold,
                "must be in [0, 1]",
            ));
        }
        Ok(())
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts only the exact lowercase names of [`Metric::as_str`].
impl FromStr for Metric {
    type Err = BasketError;

    fn from_str(s: &str) -> Result<Self> {
        Metric::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| BasketError::MetricUnavailable {
                metric: s.to_string(),
            })
    }
}

/// A directional rule `antecedents -> consequents` with its scores.
///
/// `conviction` is `f64::INFINITY` when `confidence` is 1.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rule {
    pub antecedents: Vec<String>,
    pub consequents: Vec<String>,
    pub antecedent_support: f64,
    pub consequent_support: f64,
    pub support: f64,
    pub confidence: f64,
    pub lift: f64,
    pub leverage: f64,
    pub conviction: f64,
}

impl Rule {
    fn score(antecedent: &Itemset, consequent: &Itemset, support: f64) -> Self {
        let antecedent_support = antecedent.support;
        let consequent_support = consequent.support;
        let confidence = support / antecedent_support;
        let lift = confidence / consequent_support;
        let leverage = support - antecedent_support * consequent_support;
        let conviction = if confidence >= 1.0 {
            f64::INFINITY
        } else {
            (1.0 - consequent_support) / (1.0 - confidence)
        };

        Self {
            antecedents: antecedent.items.clone(),
            consequents: consequent.items.clone(),
            antecedent_support,
            consequent_support,
            support,
            confidence,
            lift,
            leverage,
            conviction,
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{}}} -> {{{}}}",
            self.antecedents.join(", "),
            self.consequents.join(", ")
        )
    }
}

/// Derives every rule whose `metric` value is at least `min_threshold`.
///
/// For each frequent itemset of two or more items (in miner order), every
/// non-empty proper subset becomes an antecedent and its complement the
/// consequent. Antecedents are enumerated from the largest size down, and
/// lexicographically by column position within one size. An empty itemset
/// collection, or one holding only single items, yields no rules.
///
/// ```rust
/// use basket_miner::mining::{apriori, association_rules, AprioriOptions, Metric, TransactionEncoder};
///
/// let baskets = vec![vec!["A", "B"], vec!["A", "B"], vec!["A"]];
/// let (_, matrix) = TransactionEncoder::fit_transform(&baskets).unwrap();
/// let frequent = apriori(&matrix, &AprioriOptions::new(0.5)).unwrap();
/// let rules = association_rules(&frequent, Metric::Confidence, 1.0).unwrap();
/// assert_eq!(rules.len(), 1);
/// assert_eq!(rules[0].to_string(), "{B} -> {A}");
/// ```
#[instrument(skip(frequent), fields(itemsets = frequent.len()))]
pub fn association_rules(
    frequent: &FrequentItemsets,
    metric: Metric,
    min_threshold: f64,
) -> Result<Vec<Rule>> {
    metric.validate_threshold(min_threshold)?;

    let mut rules = Vec::new();
    for itemset in frequent.iter().filter(|i| i.len() >= 2) {
        for size in (1..itemset.len()).rev() {
            for positions in combinations(itemset.len(), size) {
                let (antecedent, consequent) = split_columns(&itemset.columns, &positions);
                let antecedent = lookup(frequent, &antecedent)?;
                let consequent = lookup(frequent, &consequent)?;

                let rule = Rule::score(antecedent, consequent, itemset.support);
                if metric.value(&rule) >= min_threshold {
                    rules.push(rule);
                }
            }
        }
    }

    debug!(
        metric = %metric,
        min_threshold,
        rules = rules.len(),
        "Generated association rules"
    );
    Ok(rules)
}

/// Same as [`association_rules`] with the metric given by name.
///
/// Unknown names fail with [`BasketError::MetricUnavailable`] before any
/// rule is derived.
pub fn association_rules_by_name(
    frequent: &FrequentItemsets,
    metric: &str,
    min_threshold: f64,
) -> Result<Vec<Rule>> {
    let metric = metric.parse::<Metric>()?;
    association_rules(frequent, metric, min_threshold)
}

/// Sorts rules by confidence, then lift, both descending.
///
/// The sort is stable, so rules tied on both keys keep generation order.
pub fn rank_rules(rules: &mut [Rule]) {
    rules.sort_by(compare_rank);
}

fn compare_rank(a: &Rule, b: &Rule) -> Ordering {
    b.confidence
        .total_cmp(&a.confidence)
        .then_with(|| b.lift.total_cmp(&a.lift))
}

fn lookup<'a>(frequent: &'a FrequentItemsets, columns: &[usize]) -> Result<&'a Itemset> {
    frequent.get(columns).ok_or_else(|| {
        BasketError::Internal(format!(
            "support of subset {columns:?} is missing from the frequent itemsets"
        ))
    })
}

fn split_columns(columns: &[usize], picked: &[usize]) -> (Vec<usize>, Vec<usize>) {
    let mut antecedent = Vec::with_capacity(picked.len());
    let mut consequent = Vec::with_capacity(columns.len() - picked.len());
    for (pos, &col) in columns.iter().enumerate() {
        if picked.contains(&pos) {
            antecedent.push(col);
        } else {
            consequent.push(col);
        }
    }
    (antecedent, consequent)
}

/// All `k`-combinations of `0..n`, in lexicographic order.
fn combinations(n: usize, k: usize) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    if k == 0 || k > n {
        return out;
    }

    let mut current: Vec<usize> = (0..k).collect();
    loop {
        out.push(current.clone());

        // Rightmost position that can still advance.
        let Some(i) = (0..k).rev().find(|&i| current[i] < n - k + i) else {
            return out;
        };
        current[i] += 1;
        for j in i + 1..k {
            current[j] = current[j - 1] + 1;
        }
    }
}
