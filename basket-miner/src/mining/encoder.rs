//! One-hot encoding of transaction baskets.
//!
//! [`TransactionEncoder`] learns a vocabulary of distinct item names in
//! first-appearance order and turns item lists into a [`BooleanMatrix`]
//! whose columns follow that vocabulary.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{BasketError, Result};

/// A single basket: an order identifier plus the items it contains.
///
/// Items may repeat; duplicates collapse to a single `true` cell when encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub items: Vec<String>,
}

impl Transaction {
    pub fn new<I, S>(id: impl Into<String>, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            items: items.into_iter().map(Into::into).collect(),
        }
    }
}

impl AsRef<[String]> for Transaction {
    fn as_ref(&self) -> &[String] {
        &self.items
    }
}

/// Dense item-presence matrix: one row per transaction, one column per vocabulary item.
///
/// Deserialized matrices are checked the same way [`BooleanMatrix::from_rows`]
/// checks its input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMatrix")]
pub struct BooleanMatrix {
    columns: Vec<String>,
    n_rows: usize,
    cells: Vec<bool>,
}

#[derive(Deserialize)]
struct RawMatrix {
    columns: Vec<String>,
    n_rows: usize,
    cells: Vec<bool>,
}

impl TryFrom<RawMatrix> for BooleanMatrix {
    type Error = BasketError;

    fn try_from(raw: RawMatrix) -> Result<Self> {
        let expected = raw.n_rows.checked_mul(raw.columns.len());
        if expected != Some(raw.cells.len()) {
            return Err(BasketError::Configuration(format!(
                "matrix of {} rows and {} columns cannot hold {} cells",
                raw.n_rows,
                raw.columns.len(),
                raw.cells.len()
            )));
        }
        Ok(Self {
            columns: raw.columns,
            n_rows: raw.n_rows,
            cells: raw.cells,
        })
    }
}

impl BooleanMatrix {
    /// Builds a matrix from explicit rows.
    ///
    /// Every row must have exactly `columns.len()` cells.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<bool>>) -> Result<Self> {
        let width = columns.len();
        let mut cells = Vec::with_capacity(rows.len() * width);
        for (idx, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(BasketError::Configuration(format!(
                    "row {idx} has {} cells but the matrix has {width} columns",
                    row.len()
                )));
            }
            cells.extend_from_slice(row);
        }
        Ok(Self {
            columns,
            n_rows: rows.len(),
            cells,
        })
    }

    fn zeroed(columns: Vec<String>, n_rows: usize) -> Self {
        let cells = vec![false; n_rows * columns.len()];
        Self {
            columns,
            n_rows,
            cells,
        }
    }

    /// Column labels, in vocabulary order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn get(&self, row: usize, col: usize) -> bool {
        self.cells[row * self.n_cols() + col]
    }

    fn set(&mut self, row: usize, col: usize) {
        let width = self.n_cols();
        self.cells[row * width + col] = true;
    }

    /// Returns the cells of one row.
    pub fn row(&self, row: usize) -> &[bool] {
        let width = self.n_cols();
        &self.cells[row * width..(row + 1) * width]
    }

    /// Iterates over all rows.
    pub fn rows(&self) -> impl Iterator<Item = &[bool]> + '_ {
        (0..self.n_rows).map(move |r| self.row(r))
    }

    /// Names of the items present in `row`, in column order.
    pub fn row_items(&self, row: usize) -> Vec<String> {
        self.row(row)
            .iter()
            .zip(&self.columns)
            .filter(|(present, _)| **present)
            .map(|(_, name)| name.clone())
            .collect()
    }

    /// Number of rows in which every column of `cols` is set.
    ///
    /// An empty `cols` matches every row.
    pub fn count_rows_with_all(&self, cols: &[usize]) -> usize {
        self.rows()
            .filter(|row| cols.iter().all(|&c| row[c]))
            .count()
    }

    /// Fraction of rows in which every column of `cols` is set.
    pub fn support(&self, cols: &[usize]) -> f64 {
        if self.n_rows == 0 {
            return 0.0;
        }
        self.count_rows_with_all(cols) as f64 / self.n_rows as f64
    }
}

/// Learns a stable item vocabulary and one-hot encodes baskets against it.
///
/// Item names are compared by exact string equality; no trimming or case
/// folding is applied.
///
/// ```rust
/// use basket_miner::mining::TransactionEncoder;
///
/// let baskets = vec![vec!["shirt", "belt"], vec!["belt", "shirt", "belt"]];
/// let (encoder, matrix) = TransactionEncoder::fit_transform(&baskets).unwrap();
/// assert_eq!(encoder.vocabulary(), ["shirt", "belt"]);
/// assert_eq!(matrix.n_rows(), 2);
/// assert!(matrix.get(1, 0) && matrix.get(1, 1));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TransactionEncoder {
    vocabulary: Vec<String>,
    positions: HashMap<String, usize>,
}

impl TransactionEncoder {
    /// Builds the vocabulary from the given transactions.
    ///
    /// Fails with [`BasketError::EmptyInput`] when `transactions` is empty.
    #[instrument(skip(transactions), fields(transactions = transactions.len()))]
    pub fn fit<T, S>(transactions: &[T]) -> Result<Self>
    where
        T: AsRef<[S]>,
        S: AsRef<str>,
    {
        if transactions.is_empty() {
            return Err(BasketError::EmptyInput(
                "cannot derive a vocabulary from zero transactions".to_string(),
            ));
        }

        let mut encoder = Self::default();
        for transaction in transactions {
            for item in transaction.as_ref() {
                let item = item.as_ref();
                if !encoder.positions.contains_key(item) {
                    encoder
                        .positions
                        .insert(item.to_string(), encoder.vocabulary.len());
                    encoder.vocabulary.push(item.to_string());
                }
            }
        }

        debug!(
            vocabulary_size = encoder.vocabulary.len(),
            "Fitted transaction vocabulary"
        );
        Ok(encoder)
    }

    /// Encodes transactions against the fitted vocabulary.
    ///
    /// Items that were not seen during [`fit`](Self::fit) are rejected.
    pub fn transform<T, S>(&self, transactions: &[T]) -> Result<BooleanMatrix>
    where
        T: AsRef<[S]>,
        S: AsRef<str>,
    {
        if transactions.is_empty() {
            return Err(BasketError::EmptyInput(
                "cannot encode zero transactions".to_string(),
            ));
        }

        let mut matrix = BooleanMatrix::zeroed(self.vocabulary.clone(), transactions.len());
        for (row, transaction) in transactions.iter().enumerate() {
            for item in transaction.as_ref() {
                let item = item.as_ref();
                let col = self.positions.get(item).copied().ok_or_else(|| {
                    BasketError::Configuration(format!(
                        "item '{item}' is not part of the fitted vocabulary"
                    ))
                })?;
                matrix.set(row, col);
            }
        }
        Ok(matrix)
    }

    /// Fits the vocabulary and encodes the same transactions in one pass.
    pub fn fit_transform<T, S>(transactions: &[T]) -> Result<(Self, BooleanMatrix)>
    where
        T: AsRef<[S]>,
        S: AsRef<str>,
    {
        let encoder = Self::fit(transactions)?;
        let matrix = encoder.transform(transactions)?;
        Ok((encoder, matrix))
    }

    /// Maps every matrix row back to its item names.
    pub fn inverse_transform(&self, matrix: &BooleanMatrix) -> Vec<Vec<String>> {
        (0..matrix.n_rows()).map(|r| matrix.row_items(r)).collect()
    }

    /// Distinct item names in first-appearance order.
    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    /// Column position of `item`, if it is in the vocabulary.
    pub fn position(&self, item: &str) -> Option<usize> {
        self.positions.get(item).copied()
    }
}
