//! Category-partitioned mining and dataset summaries.
//!
//! [`BasketAnalysis`] is the entry point: it runs one mining pass over the
//! whole dataset and one per category label, and bundles the outcomes with
//! the item popularity ranking into an [`AnalysisReport`].

pub mod partition;
pub mod pipeline;
pub mod summary;

pub use partition::{
    group_transactions, mine_partition, CategoryOutcome, CategoryPartition, CategoryPartitioner,
    PartitionAnalysis, SalesRecord,
};
pub use pipeline::{AnalysisReport, BasketAnalysis, GlobalAnalysis, GLOBAL_PARTITION};
pub use summary::{distinct_categories, top_items, ItemPopularity};
