//! The mining core: one-hot encoding, Apriori and association rules.
//!
//! Data flows strictly left to right:
//!
//! ```text
//! baskets -> TransactionEncoder -> BooleanMatrix -> apriori -> FrequentItemsets
//!         -> association_rules -> rank_rules
//! ```
//!
//! Every step is a pure function of its inputs.

pub mod apriori;
pub mod encoder;
pub mod itemset;
pub mod rules;

pub use apriori::{apriori, AprioriOptions};
pub use encoder::{BooleanMatrix, Transaction, TransactionEncoder};
pub use itemset::{FrequentItemsets, Itemset};
pub use rules::{association_rules, association_rules_by_name, rank_rules, Metric, Rule};
