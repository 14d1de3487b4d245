//! In-memory Arrow source.

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use datafusion::datasource::MemTable;
use datafusion::prelude::SessionContext;
use tracing::instrument;

use super::DataSource;
use crate::analysis::SalesRecord;
use crate::config::DatasetColumns;
use crate::error::{BasketError, ErrorContext, Result};

/// Record batches already held in memory, registered as one table.
#[derive(Debug, Clone)]
pub struct MemorySource {
    batches: Vec<RecordBatch>,
}

impl MemorySource {
    /// Wraps record batches sharing one schema.
    pub fn new(batches: Vec<RecordBatch>) -> Result<Self> {
        let Some(first) = batches.first() else {
            return Err(BasketError::data_source(
                "Memory",
                "At least one record batch must be provided",
            ));
        };
        let schema = first.schema();
        if batches.iter().any(|b| b.schema() != schema) {
            return Err(BasketError::data_source(
                "Memory",
                "All record batches must share the same schema",
            ));
        }
        Ok(Self { batches })
    }

    /// Builds a single batch from typed records, named after `columns`.
    pub fn from_records(records: &[SalesRecord], columns: &DatasetColumns) -> Result<Self> {
        let schema = Arc::new(Schema::new(vec![
            Field::new(&columns.transaction, DataType::Utf8, false),
            Field::new(&columns.item, DataType::Utf8, false),
            Field::new(&columns.category, DataType::Utf8, false),
            Field::new(&columns.quantity, DataType::Float64, false),
        ]));

        let arrays: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from_iter_values(
                records.iter().map(|r| r.transaction_id.as_str()),
            )),
            Arc::new(StringArray::from_iter_values(
                records.iter().map(|r| r.item.as_str()),
            )),
            Arc::new(StringArray::from_iter_values(
                records.iter().map(|r| r.category.as_str()),
            )),
            Arc::new(Float64Array::from_iter_values(
                records.iter().map(|r| r.quantity),
            )),
        ];

        let batch = RecordBatch::try_new(schema, arrays)?;
        Self::new(vec![batch])
    }

    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(RecordBatch::num_rows).sum()
    }
}

#[async_trait]
impl DataSource for MemorySource {
    #[instrument(skip(self, ctx), fields(table.name = %table_name, source.type = "memory"))]
    async fn register(&self, ctx: &SessionContext, table_name: &str) -> Result<()> {
        let schema = self.batches[0].schema();
        let table = MemTable::try_new(schema, vec![self.batches.clone()])
            .context("Failed to build in-memory table")?;
        ctx.register_table(table_name, Arc::new(table))?;
        Ok(())
    }

    fn description(&self) -> String {
        let count = self.batches.len();
        let rows = self.num_rows();
        format!("In-memory data: {count} batches, {rows} rows")
    }
}
