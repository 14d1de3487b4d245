//! Level-wise Apriori search for frequent itemsets.
//!
//! Level `k` candidates are built by joining frequent `(k-1)`-itemsets that
//! share their first `k-2` columns. A candidate survives to support counting
//! only if every one of its `(k-1)`-subsets was frequent, since no superset
//! of an infrequent itemset can be frequent. The search stops at the first
//! level that yields no frequent itemset, or at `max_len`.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::encoder::BooleanMatrix;
use super::itemset::FrequentItemsets;
use crate::error::{BasketError, Result};

/// Parameters for an Apriori run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AprioriOptions {
    /// Minimum support, in `(0, 1]`.
    pub min_support: f64,
    /// Largest itemset size to search for; `None` means unbounded.
    pub max_len: Option<usize>,
}

impl AprioriOptions {
    pub fn new(min_support: f64) -> Self {
        Self {
            min_support,
            max_len: None,
        }
    }

    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = Some(max_len);
        self
    }

    /// Checks that the support threshold and length cap are usable.
    pub fn validate(&self) -> Result<()> {
        if !(self.min_support > 0.0 && self.min_support <= 1.0) {
            return Err(BasketError::invalid_threshold(
                "min_support",
                self.min_support,
                "must be in (0, 1]",
            ));
        }
        if self.max_len == Some(0) {
            return Err(BasketError::Configuration(
                "max_len must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for AprioriOptions {
    fn default() -> Self {
        Self::new(0.01)
    }
}

/// Mines every itemset of `matrix` whose support is at least `options.min_support`.
///
/// Returns an empty collection (not an error) when no single item is
/// frequent. Fails with [`BasketError::InvalidThreshold`] for a threshold
/// outside `(0, 1]` and [`BasketError::EmptyInput`] for a matrix with no rows.
///
/// ```rust
/// use basket_miner::mining::{apriori, AprioriOptions, TransactionEncoder};
///
/// let baskets = vec![vec!["A", "B"], vec!["A", "B", "C"], vec!["A"], vec!["B", "C"]];
/// let (_, matrix) = TransactionEncoder::fit_transform(&baskets).unwrap();
/// let frequent = apriori(&matrix, &AprioriOptions::new(0.5)).unwrap();
/// assert_eq!(frequent.find(&["A", "B"]).map(|i| i.support), Some(0.5));
/// ```
#[instrument(skip(matrix), fields(rows = matrix.n_rows(), cols = matrix.n_cols()))]
pub fn apriori(matrix: &BooleanMatrix, options: &AprioriOptions) -> Result<FrequentItemsets> {
    options.validate()?;
    if matrix.n_rows() == 0 {
        return Err(BasketError::EmptyInput(
            "cannot mine a matrix with no transactions".to_string(),
        ));
    }

    let n_rows = matrix.n_rows() as f64;
    let mut frequent = FrequentItemsets::new(
        matrix.columns().to_vec(),
        matrix.n_rows(),
        options.min_support,
    );

    let mut level: Vec<Vec<usize>> = Vec::new();
    for col in 0..matrix.n_cols() {
        let support = matrix.count_rows_with_all(&[col]) as f64 / n_rows;
        if support >= options.min_support {
            frequent.push(vec![col], support);
            level.push(vec![col]);
        }
    }
    debug!(level = 1, frequent = level.len(), "Apriori level complete");

    let mut k = 2;
    while !level.is_empty() && options.max_len.map_or(true, |max| k <= max) {
        let candidates = generate_candidates(&level, |subset| frequent.get(subset).is_some());
        let candidate_count = candidates.len();

        let mut next = Vec::new();
        for candidate in candidates {
            let support = matrix.count_rows_with_all(&candidate) as f64 / n_rows;
            if support >= options.min_support {
                frequent.push(candidate.clone(), support);
                next.push(candidate);
            }
        }

        debug!(
            level = k,
            candidates = candidate_count,
            frequent = next.len(),
            "Apriori level complete"
        );
        level = next;
        k += 1;
    }

    Ok(frequent)
}

/// Joins lexicographically ordered `(k-1)`-itemsets sharing a `(k-2)` prefix
/// and drops candidates with an infrequent `(k-1)`-subset.
///
/// The output is again in lexicographic order.
fn generate_candidates<F>(level: &[Vec<usize>], is_frequent: F) -> Vec<Vec<usize>>
where
    F: Fn(&[usize]) -> bool,
{
    let mut candidates = Vec::new();
    let Some(width) = level.first().map(Vec::len) else {
        return candidates;
    };
    let prefix = width - 1;

    for (i, left) in level.iter().enumerate() {
        for right in &level[i + 1..] {
            if left[..prefix] != right[..prefix] {
                // Same-prefix itemsets are contiguous in lexicographic order.
                break;
            }

            let mut candidate = left.clone();
            candidate.push(right[prefix]);

            // The two subsets dropping either of the last two columns are
            // `left` and `right` themselves.
            let all_subsets_frequent = (0..prefix).all(|skip| {
                let subset: Vec<usize> = candidate
                    .iter()
                    .enumerate()
                    .filter(|(pos, _)| *pos != skip)
                    .map(|(_, &col)| col)
                    .collect();
                is_frequent(&subset)
            });

            if all_subsets_frequent {
                candidates.push(candidate);
            }
        }
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mining::encoder::TransactionEncoder;
    use std::collections::HashSet;

    fn matrix_of(baskets: &[Vec<&str>]) -> BooleanMatrix {
        TransactionEncoder::fit_transform(baskets).unwrap().1
    }

    fn scenario() -> BooleanMatrix {
        matrix_of(&[
            vec!["A", "B"],
            vec!["A", "B", "C"],
            vec!["A"],
            vec!["B", "C"],
        ])
    }

    #[test]
    fn test_reference_scenario() {
        let frequent = apriori(&scenario(), &AprioriOptions::new(0.25)).unwrap();

        let support = |items: &[&str]| frequent.find(items).map(|i| i.support);
        assert_eq!(support(&["A"]), Some(0.75));
        assert_eq!(support(&["B"]), Some(0.75));
        assert_eq!(support(&["C"]), Some(0.5));
        assert_eq!(support(&["A", "B"]), Some(0.5));
        assert_eq!(support(&["A", "C"]), Some(0.25));
        assert_eq!(support(&["B", "C"]), Some(0.5));
        assert_eq!(support(&["A", "B", "C"]), Some(0.25));
        assert_eq!(frequent.len(), 7);
    }

    #[test]
    fn test_itemsets_are_emitted_level_by_level() {
        let frequent = apriori(&scenario(), &AprioriOptions::new(0.25)).unwrap();
        let sizes: Vec<usize> = frequent.iter().map(|i| i.len()).collect();
        assert_eq!(sizes, vec![1, 1, 1, 2, 2, 2, 3]);

        let pairs: Vec<Vec<usize>> = frequent.of_size(2).map(|i| i.columns.clone()).collect();
        assert_eq!(pairs, vec![vec![0, 1], vec![0, 2], vec![1, 2]]);
    }

    #[test]
    fn test_higher_threshold_prunes_supersets() {
        let frequent = apriori(&scenario(), &AprioriOptions::new(0.5)).unwrap();
        assert!(frequent.find(&["A", "C"]).is_none());
        assert!(frequent.find(&["A", "B", "C"]).is_none());
        assert_eq!(frequent.find(&["B", "C"]).map(|i| i.support), Some(0.5));
    }

    #[test]
    fn test_no_frequent_items_is_empty_not_error() {
        let matrix = matrix_of(&[vec!["A"], vec!["B"], vec!["C"], vec!["D"]]);
        let frequent = apriori(&matrix, &AprioriOptions::new(0.5)).unwrap();
        assert!(frequent.is_empty());
    }

    #[test]
    fn test_threshold_must_be_in_unit_interval() {
        let matrix = scenario();
        for bad in [0.0, -0.1, 1.5, f64::NAN] {
            let err = apriori(&matrix, &AprioriOptions::new(bad)).unwrap_err();
            assert!(matches!(err, BasketError::InvalidThreshold { .. }), "{bad}");
        }
        assert!(apriori(&matrix, &AprioriOptions::new(1.0)).is_ok());
    }

    #[test]
    fn test_max_len_caps_search() {
        let options = AprioriOptions::new(0.25).with_max_len(2);
        let frequent = apriori(&scenario(), &options).unwrap();
        assert_eq!(frequent.max_size(), 2);
        assert_eq!(frequent.len(), 6);

        let err = apriori(&scenario(), &AprioriOptions::new(0.25).with_max_len(0)).unwrap_err();
        assert!(matches!(err, BasketError::Configuration(_)));
    }

    #[test]
    fn test_empty_matrix_is_rejected() {
        let matrix = BooleanMatrix::from_rows(vec!["A".to_string()], vec![]).unwrap();
        let err = apriori(&matrix, &AprioriOptions::default()).unwrap_err();
        assert!(matches!(err, BasketError::EmptyInput(_)));
    }

    #[test]
    fn test_candidate_pruning_drops_infrequent_subsets() {
        // {0,1}, {0,2} join to {0,1,2} but {1,2} is missing.
        let level = vec![vec![0, 1], vec![0, 2]];
        let frequent: HashSet<Vec<usize>> = level.iter().cloned().collect();
        let candidates = generate_candidates(&level, |s| frequent.contains(s));
        assert!(candidates.is_empty());

        let level = vec![vec![0, 1], vec![0, 2], vec![1, 2]];
        let frequent: HashSet<Vec<usize>> = level.iter().cloned().collect();
        let candidates = generate_candidates(&level, |s| frequent.contains(s));
        assert_eq!(candidates, vec![vec![0, 1, 2]]);
    }

    #[test]
    fn test_single_item_candidates_join_all_pairs() {
        let level = vec![vec![0], vec![2], vec![5]];
        let candidates = generate_candidates(&level, |_| true);
        assert_eq!(candidates, vec![vec![0, 2], vec![0, 5], vec![2, 5]]);
    }
}
