use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::info;

use crate::aggregator::aggregate;
use crate::categorizer::{categorize_records, RuleSet};
use crate::error::Result;
use crate::importer::{coerce_all, read_raw};
use crate::models::AggregatedRecord;

/// Hex SHA-256 of an upload. Equal fingerprints give equal [`load`] results.
pub fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Turn a raw journal export into the aggregated sales table.
///
/// Every row is typed before anything is categorized, so a schema or format
/// error returns before any partial table exists.
pub fn load(bytes: &[u8], rules: &RuleSet) -> Result<Vec<AggregatedRecord>> {
    let raw = read_raw(bytes)?;
    let typed = coerce_all(&raw)?;
    let categorized = categorize_records(rules, typed);
    Ok(aggregate(categorized))
}

pub fn load_file(path: &Path, rules: &RuleSet) -> Result<Vec<AggregatedRecord>> {
    let bytes = std::fs::read(path)?;
    info!(file = %path.display(), fingerprint = %fingerprint(&bytes), "loading sales journal");
    load(&bytes, rules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CaisseError;
    use chrono::NaiveDate;

    const HEADER: &str = "Date;Libellé;Quantité;Total HT;TVA;Total TTC;Code établissement\n";

    fn latin1(text: &str) -> Vec<u8> {
        text.chars().map(|c| u8::try_from(c).unwrap()).collect()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn sample() -> Vec<u8> {
        latin1(&format!(
            "{HEADER}\
             01/01/2024;Café espresso;2;4,00;0,80;4,80;BAR01\n\
             01/01/2024;Café espresso (a): 01/01/2024;1;2,00;0,40;2,40;BAR01\n\
             02/01/2024;Bière 1664;3;10,00;2,00;12,00;BAR01\n"
        ))
    }

    #[test]
    fn test_end_to_end() {
        let rules = RuleSet::builtin().unwrap();
        let out = load(&sample(), &rules).unwrap();
        assert_eq!(out.len(), 2);

        let beer = out.iter().find(|r| r.label_str() == "Bière 1664").unwrap();
        assert_eq!(beer.category, "Alcool - Bière");
        assert_eq!(beer.date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(beer.quantity, 3.0);
        assert!(close(beer.total_ttc, 12.0));

        let coffee = out.iter().find(|r| r.label_str() == "Café espresso").unwrap();
        assert_eq!(coffee.category, "Boisson Chaude - Café/Chocolat");
        assert_eq!(coffee.date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(coffee.quantity, 3.0);
        assert!(close(coffee.total_ttc, 7.2));
        assert!(close(coffee.total_ht, 6.0));
        assert!(close(coffee.tva, 1.2));
        assert_eq!(coffee.original_label.as_deref(), Some("Café espresso"));
        assert_eq!(coffee.establishment, "BAR01");
    }

    #[test]
    fn test_same_bytes_same_result() {
        let rules = RuleSet::builtin().unwrap();
        assert_eq!(load(&sample(), &rules).unwrap(), load(&sample(), &rules).unwrap());
        assert_eq!(fingerprint(&sample()), fingerprint(&sample()));
        assert_eq!(fingerprint(&sample()).len(), 64);
    }

    #[test]
    fn test_schema_error_aborts() {
        let rules = RuleSet::builtin().unwrap();
        let bytes = latin1("Date;Libellé\n01/01/2024;Café\n");
        assert!(matches!(load(&bytes, &rules), Err(CaisseError::Schema { .. })));
    }

    #[test]
    fn test_one_bad_date_aborts_whole_load() {
        let rules = RuleSet::builtin().unwrap();
        let bytes = latin1(&format!(
            "{HEADER}\
             01/01/2024;Café;1;2,00;0,40;2,40;BAR01\n\
             2024-01-02;Café;1;2,00;0,40;2,40;BAR01\n"
        ));
        match load(&bytes, &rules) {
            Err(CaisseError::Format { line, column, .. }) => {
                assert_eq!(line, 3);
                assert_eq!(column, "Date");
            }
            other => panic!("expected format error, got {other:?}"),
        }
    }

    #[test]
    fn test_noisy_quantity_does_not_abort() {
        let rules = RuleSet::builtin().unwrap();
        let bytes = latin1(&format!("{HEADER}01/01/2024;Thé vert;?;2,00;0,40;2,40;BAR01\n"));
        let out = load(&bytes, &rules).unwrap();
        assert_eq!(out[0].quantity, 0.0);
        assert_eq!(out[0].category, "Boisson Chaude - Thé");
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.csv");
        std::fs::write(&path, sample()).unwrap();
        let rules = RuleSet::builtin().unwrap();
        assert_eq!(load_file(&path, &rules).unwrap().len(), 2);
    }
}
