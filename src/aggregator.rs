use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::info;

use crate::models::{AggregatedRecord, CategorizedRecord};

type GroupKey = (Option<String>, String, NaiveDate, String);

/// Collapse rows sharing (cleaned label, category, date, establishment),
/// summing quantity and the three totals. The first original label seen for
/// a group is kept. Output is sorted by key; no group is dropped.
pub fn aggregate(rows: Vec<CategorizedRecord>) -> Vec<AggregatedRecord> {
    let input = rows.len();
    let mut groups: BTreeMap<GroupKey, AggregatedRecord> = BTreeMap::new();

    for CategorizedRecord { record, category } in rows {
        let key = (
            record.label.clone(),
            category.clone(),
            record.date,
            record.establishment.clone(),
        );
        let entry = groups.entry(key).or_insert_with(|| AggregatedRecord {
            label: record.label,
            category,
            date: record.date,
            establishment: record.establishment,
            quantity: 0.0,
            total_ht: 0.0,
            tva: 0.0,
            total_ttc: 0.0,
            original_label: record.original_label,
        });
        entry.quantity += record.quantity;
        entry.total_ht += record.total_ht;
        entry.tva += record.tva;
        entry.total_ttc += record.total_ttc;
    }

    let out: Vec<AggregatedRecord> = groups.into_values().collect();
    info!(rows = input, groups = out.len(), "aggregated sales");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SalesRecord;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn row(label: &str, original: &str, day: u32, qty: f64, ttc: f64) -> CategorizedRecord {
        CategorizedRecord {
            record: SalesRecord {
                date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
                original_label: Some(original.to_string()),
                label: Some(label.to_string()),
                quantity: qty,
                total_ht: ttc / 1.2,
                tva: ttc - ttc / 1.2,
                total_ttc: ttc,
                establishment: "BAR01".to_string(),
            },
            category: "Cat".to_string(),
        }
    }

    fn as_input(rows: &[AggregatedRecord]) -> Vec<CategorizedRecord> {
        rows.iter()
            .map(|r| CategorizedRecord {
                record: SalesRecord {
                    date: r.date,
                    original_label: r.original_label.clone(),
                    label: r.label.clone(),
                    quantity: r.quantity,
                    total_ht: r.total_ht,
                    tva: r.tva,
                    total_ttc: r.total_ttc,
                    establishment: r.establishment.clone(),
                },
                category: r.category.clone(),
            })
            .collect()
    }

    #[test]
    fn test_groups_and_sums() {
        let out = aggregate(vec![
            row("Café", "Café", 1, 2.0, 4.8),
            row("Café", "Café (a): 01/01/2024", 1, 1.0, 2.4),
            row("Café", "Café", 2, 1.0, 2.4),
        ]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(out[0].quantity, 3.0);
        assert!(close(out[0].total_ttc, 7.2));
        assert_eq!(out[1].quantity, 1.0);
    }

    #[test]
    fn test_keeps_first_original_label() {
        let out = aggregate(vec![
            row("Latte", "Latte (a):", 1, 1.0, 3.0),
            row("Latte", "Latte", 1, 1.0, 3.0),
        ]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].original_label.as_deref(), Some("Latte (a):"));
    }

    #[test]
    fn test_splits_on_establishment_and_category() {
        let a = row("Café", "Café", 1, 1.0, 2.0);
        let mut b = row("Café", "Café", 1, 1.0, 2.0);
        b.record.establishment = "BAR02".to_string();
        let mut c = row("Café", "Café", 1, 1.0, 2.0);
        c.category = "Autre".to_string();
        assert_eq!(aggregate(vec![a, b, c]).len(), 3);
    }

    #[test]
    fn test_zero_quantity_group_kept() {
        let out = aggregate(vec![
            row("Remboursement", "Remboursement", 3, 1.0, 5.0),
            row("Remboursement", "Remboursement", 3, -1.0, -5.0),
        ]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].quantity, 0.0);
        assert!(close(out[0].total_ttc, 0.0));
    }

    #[test]
    fn test_missing_label_is_its_own_group() {
        let mut a = row("x", "x", 1, 1.0, 1.0);
        a.record.label = None;
        a.record.original_label = None;
        let out = aggregate(vec![a, row("x", "x", 1, 1.0, 1.0)]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].label, None);
    }

    #[test]
    fn test_sum_invariant() {
        let rows = vec![
            row("A", "A", 1, 1.0, 1.1),
            row("B", "B", 1, 2.0, 2.2),
            row("A", "A 01/01/24", 1, 3.0, 3.3),
            row("B", "B", 2, 4.0, 4.4),
            row("A", "A", 1, 5.0, 5.5),
        ];
        let expected_a: f64 = rows
            .iter()
            .filter(|r| r.record.label.as_deref() == Some("A"))
            .map(|r| r.record.total_ttc)
            .sum();
        let total_in: f64 = rows.iter().map(|r| r.record.total_ttc).sum();
        let out = aggregate(rows);
        let a = out.iter().find(|r| r.label_str() == "A").unwrap();
        assert!(close(a.total_ttc, expected_a));
        let total_out: f64 = out.iter().map(|r| r.total_ttc).sum();
        assert!(close(total_in, total_out));
        assert!(out.len() <= 5);
    }

    #[test]
    fn test_reaggregation_is_stable() {
        let once = aggregate(vec![
            row("A", "A", 1, 1.0, 1.5),
            row("A", "A", 1, 2.0, 2.5),
            row("B", "B", 2, 1.0, 9.0),
        ]);
        let twice = aggregate(as_input(&once));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate(Vec::new()).is_empty());
    }
}
