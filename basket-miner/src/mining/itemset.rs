//! Frequent itemsets and the collection the miner hands to the rule generator.

use std::collections::HashMap;

use serde::Serialize;

/// A non-empty set of items together with its support.
///
/// `columns` holds the ascending vocabulary positions of the members and
/// `items` their names in the same order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Itemset {
    pub items: Vec<String>,
    #[serde(skip)]
    pub columns: Vec<usize>,
    pub support: f64,
}

impl Itemset {
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns true if `item` is a member of this itemset.
    pub fn contains(&self, item: &str) -> bool {
        self.items.iter().any(|i| i == item)
    }
}

/// All itemsets meeting the support threshold, level by level.
///
/// Itemsets are stored in discovery order: every 1-itemset first, then
/// every 2-itemset, and so on; within one level they follow the
/// lexicographic order of their column positions. Every subset of a stored
/// itemset is stored too, so supports of antecedents and consequents can be
/// looked up directly.
#[derive(Debug, Clone, Serialize)]
pub struct FrequentItemsets {
    vocabulary: Vec<String>,
    n_transactions: usize,
    min_support: f64,
    itemsets: Vec<Itemset>,
    #[serde(skip)]
    lookup: HashMap<Vec<usize>, usize>,
}

impl FrequentItemsets {
    pub(crate) fn new(vocabulary: Vec<String>, n_transactions: usize, min_support: f64) -> Self {
        Self {
            vocabulary,
            n_transactions,
            min_support,
            itemsets: Vec::new(),
            lookup: HashMap::new(),
        }
    }

    pub(crate) fn push(&mut self, columns: Vec<usize>, support: f64) {
        let items = columns
            .iter()
            .map(|&c| self.vocabulary[c].clone())
            .collect();
        self.lookup.insert(columns.clone(), self.itemsets.len());
        self.itemsets.push(Itemset {
            items,
            columns,
            support,
        });
    }

    /// Column labels of the matrix the itemsets were mined from.
    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn n_transactions(&self) -> usize {
        self.n_transactions
    }

    pub fn min_support(&self) -> f64 {
        self.min_support
    }

    pub fn len(&self) -> usize {
        self.itemsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.itemsets.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Itemset> {
        self.itemsets.iter()
    }

    pub fn as_slice(&self) -> &[Itemset] {
        &self.itemsets
    }

    /// Itemsets with exactly `size` members.
    pub fn of_size(&self, size: usize) -> impl Iterator<Item = &Itemset> + '_ {
        self.itemsets.iter().filter(move |i| i.len() == size)
    }

    /// Size of the largest itemset, or 0 when empty.
    pub fn max_size(&self) -> usize {
        self.itemsets.iter().map(Itemset::len).max().unwrap_or(0)
    }

    /// Looks up an itemset by its ascending column positions.
    pub fn get(&self, columns: &[usize]) -> Option<&Itemset> {
        self.lookup.get(columns).map(|&idx| &self.itemsets[idx])
    }

    /// Support of the itemset with the given ascending column positions.
    pub fn support_of(&self, columns: &[usize]) -> Option<f64> {
        self.get(columns).map(|i| i.support)
    }

    /// Looks up an itemset by item names, in any order.
    pub fn find<S: AsRef<str>>(&self, items: &[S]) -> Option<&Itemset> {
        let mut columns = items
            .iter()
            .map(|name| {
                self.vocabulary
                    .iter()
                    .position(|v| v == name.as_ref())
            })
            .collect::<Option<Vec<_>>>()?;
        columns.sort_unstable();
        columns.dedup();
        self.get(&columns)
    }
}

impl<'a> IntoIterator for &'a FrequentItemsets {
    type Item = &'a Itemset;
    type IntoIter = std::slice::Iter<'a, Itemset>;

    fn into_iter(self) -> Self::IntoIter {
        self.itemsets.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FrequentItemsets {
        let mut sets =
            FrequentItemsets::new(vec!["A".into(), "B".into(), "C".into()], 4, 0.25);
        sets.push(vec![0], 0.75);
        sets.push(vec![1], 0.75);
        sets.push(vec![0, 1], 0.5);
        sets
    }

    #[test]
    fn test_lookup_by_columns_and_names() {
        let sets = sample();
        assert_eq!(sets.support_of(&[0, 1]), Some(0.5));
        assert_eq!(sets.support_of(&[2]), None);
        assert_eq!(sets.find(&["B", "A"]).map(|i| i.support), Some(0.5));
        assert!(sets.find(&["Z"]).is_none());
    }

    #[test]
    fn test_items_follow_column_order() {
        let sets = sample();
        let pair = sets.get(&[0, 1]).unwrap();
        assert_eq!(pair.items, vec!["A".to_string(), "B".to_string()]);
        assert!(pair.contains("B"));
        assert_eq!(sets.max_size(), 2);
        assert_eq!(sets.of_size(1).count(), 2);
    }
}
