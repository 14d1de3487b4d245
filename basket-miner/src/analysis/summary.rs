//! Dataset-level summaries shown next to the mined rules.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use super::partition::SalesRecord;

/// Total quantity sold for one item across the dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemPopularity {
    pub item: String,
    pub quantity: f64,
}

/// The `n` items with the largest total quantity, largest first.
///
/// Items with equal totals keep their first-appearance order.
pub fn top_items(records: &[SalesRecord], n: usize) -> Vec<ItemPopularity> {
    let mut totals: Vec<ItemPopularity> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for record in records {
        match positions.get(record.item.as_str()) {
            Some(&idx) => totals[idx].quantity += record.quantity,
            None => {
                positions.insert(record.item.as_str(), totals.len());
                totals.push(ItemPopularity {
                    item: record.item.clone(),
                    quantity: record.quantity,
                });
            }
        }
    }

    totals.sort_by(|a, b| b.quantity.total_cmp(&a.quantity));
    totals.truncate(n);
    totals
}

/// Category labels in first-appearance order.
pub fn distinct_categories(records: &[SalesRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter(|r| seen.insert(r.category.as_str()))
        .map(|r| r.category.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<SalesRecord> {
        vec![
            SalesRecord::new("1", "kaos", "atasan", 2.0),
            SalesRecord::new("1", "rok", "bawahan", 1.0),
            SalesRecord::new("2", "kaos", "atasan", 1.0),
            SalesRecord::new("3", "topi", "aksesoris", 3.0),
            SalesRecord::new("3", "rok", "bawahan", 2.0),
        ]
    }

    #[test]
    fn test_top_items_orders_by_quantity() {
        let top = top_items(&records(), 10);
        let names: Vec<&str> = top.iter().map(|p| p.item.as_str()).collect();
        // kaos, rok and topi all total 3; first appearance breaks the tie.
        assert_eq!(names, vec!["kaos", "rok", "topi"]);
        assert_eq!(top[0].quantity, 3.0);
    }

    #[test]
    fn test_top_items_truncates() {
        let mut data = records();
        data.push(SalesRecord::new("4", "sepatu", "alas kaki", 5.0));
        let top = top_items(&data, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].item, "sepatu");
        assert!(top_items(&data, 0).is_empty());
    }

    #[test]
    fn test_distinct_categories() {
        assert_eq!(
            distinct_categories(&records()),
            vec!["atasan", "bawahan", "aksesoris"]
        );
        assert!(distinct_categories(&[]).is_empty());
    }
}
