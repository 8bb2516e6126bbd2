use crate::domain::stock::StockRecord;

/// Records ordered by performance, best first, then paged. Ties keep ticker order.
pub fn top_performers(records: &[StockRecord], offset: usize, limit: usize) -> Vec<StockRecord> {
    let mut sorted: Vec<&StockRecord> = records.iter().collect();
    sorted.sort_by(|a, b| {
        b.performance
            .total_cmp(&a.performance)
            .then_with(|| a.id.cmp(&b.id))
    });
    sorted.into_iter().skip(offset).take(limit).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, performance: f64) -> StockRecord {
        StockRecord {
            id: id.to_string(),
            price: 1.0,
            volume: 1,
            market_cap: None,
            performance,
        }
    }

    #[test]
    fn sorts_descending_and_pages() {
        let records = vec![
            record("A", 0.1),
            record("B", 0.5),
            record("C", -0.2),
            record("D", 0.5),
            record("E", 0.3),
        ];
        let ids = |v: Vec<StockRecord>| v.into_iter().map(|r| r.id).collect::<Vec<_>>();

        assert_eq!(ids(top_performers(&records, 0, 3)), vec!["B", "D", "E"]);
        assert_eq!(ids(top_performers(&records, 3, 5)), vec!["A", "C"]);
        assert!(top_performers(&records, 10, 5).is_empty());
        assert!(top_performers(&records, 0, 0).is_empty());
    }
}
