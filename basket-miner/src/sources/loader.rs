//! Reads mapped sales columns out of a registered table.

use arrow::array::{Array, ArrayRef, Float64Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use datafusion::prelude::SessionContext;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::analysis::SalesRecord;
use crate::config::DatasetColumns;
use crate::error::{BasketError, Result};

/// Sales records read from a table, plus what the table looked like.
#[derive(Debug, Clone, Serialize)]
pub struct LoadedDataset {
    /// Every column name of the source table, in schema order
    pub columns: Vec<String>,
    pub records: Vec<SalesRecord>,
    /// Rows dropped because the transaction, item or category was null
    pub skipped_rows: usize,
}

/// Loads every row of `table_name` as a [`SalesRecord`].
///
/// The four columns named by `columns` must exist, otherwise
/// [`BasketError::ColumnNotFound`] is returned before any data is read.
/// Identifiers, item names and categories are cast to strings and the
/// quantity to `f64`; a null or unparsable quantity counts as 0.
#[instrument(skip(ctx, columns))]
pub async fn load_sales_records(
    ctx: &SessionContext,
    table_name: &str,
    columns: &DatasetColumns,
) -> Result<LoadedDataset> {
    let df = ctx.table(table_name).await?;
    let available: Vec<String> = df
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();

    for name in columns.names() {
        if !available.iter().any(|c| c == name) {
            return Err(BasketError::ColumnNotFound {
                column: name.to_string(),
            });
        }
    }

    let batches = df.select_columns(&columns.names())?.collect().await?;

    let mut records = Vec::new();
    let mut skipped_rows = 0;
    for batch in &batches {
        let ids = string_column(batch.column(0))?;
        let items = string_column(batch.column(1))?;
        let categories = string_column(batch.column(2))?;
        let quantities = cast(batch.column(3), &DataType::Float64)?;
        let quantities = quantities
            .as_any()
            .downcast_ref::<Float64Array>()
            .ok_or_else(|| BasketError::Internal("Expected Float64 array for quantity".into()))?;

        for row in 0..batch.num_rows() {
            if ids.is_null(row) || items.is_null(row) || categories.is_null(row) {
                skipped_rows += 1;
                continue;
            }
            let quantity = if quantities.is_null(row) {
                0.0
            } else {
                quantities.value(row)
            };
            records.push(SalesRecord {
                transaction_id: ids.value(row).to_string(),
                item: items.value(row).to_string(),
                category: categories.value(row).to_string(),
                quantity,
            });
        }
    }

    if skipped_rows > 0 {
        warn!(
            table.name = %table_name,
            skipped_rows,
            "Skipped rows with null transaction, item or category"
        );
    }
    debug!(
        table.name = %table_name,
        rows = records.len(),
        "Loaded sales records"
    );

    Ok(LoadedDataset {
        columns: available,
        records,
        skipped_rows,
    })
}

/// Casts any column to UTF-8 so ids stored as integers read the same as strings.
fn string_column(column: &ArrayRef) -> Result<StringArray> {
    let utf8 = cast(column, &DataType::Utf8)?;
    utf8.as_any()
        .downcast_ref::<StringArray>()
        .cloned()
        .ok_or_else(|| BasketError::Internal("Expected Utf8 array after cast".into()))
}
