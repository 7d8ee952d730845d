use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::error::{CaisseError, Result};
use crate::models::{RawRecord, SalesRecord};
use crate::normalizer::normalize;

pub const COL_DATE: &str = "Date";
pub const COL_LABEL: &str = "Libellé";
pub const COL_QUANTITY: &str = "Quantité";
pub const COL_TOTAL_HT: &str = "Total HT";
pub const COL_TVA: &str = "TVA";
pub const COL_TOTAL_TTC: &str = "Total TTC";
pub const COL_ESTABLISHMENT: &str = "Code établissement";

pub const REQUIRED_COLUMNS: [&str; 7] = [
    COL_DATE,
    COL_LABEL,
    COL_QUANTITY,
    COL_TOTAL_HT,
    COL_TVA,
    COL_TOTAL_TTC,
    COL_ESTABLISHMENT,
];

/// First- and second-tier breakdown columns some tills append. Ignored.
pub const DROPPED_COLUMNS: [&str; 6] = ["AQTE1", "ATTC1", "AHT1", "AQTE2", "ATTC2", "AHT2"];

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Decode an ISO-8859-1 export: every byte is the code point of the same value.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Parse a comma-decimal amount such as `12,50`. No thousands separator.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let s = raw.trim().replace(',', ".");
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Strict `DD/MM/YYYY`; rejects impossible calendar dates such as 31/02.
pub fn parse_date_dmy(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let parts: Vec<&str> = raw.split('/').collect();
    if parts.len() != 3 || parts[2].len() != 4 {
        return None;
    }
    if parts.iter().any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit())) {
        return None;
    }
    let d: u32 = parts[0].parse().ok()?;
    let m: u32 = parts[1].parse().ok()?;
    let y: i32 = parts[2].parse().ok()?;
    NaiveDate::from_ymd_opt(y, m, d)
}

/// Quantities are noisy: anything unreadable counts as zero.
pub fn parse_quantity(raw: Option<&str>) -> f64 {
    raw.map(str::trim)
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

fn non_empty(field: Option<&str>) -> Option<String> {
    field.filter(|f| !f.trim().is_empty()).map(str::to_string)
}

/// Labels keep their raw text; only a truly empty field is missing.
fn raw_label(field: Option<&str>) -> Option<String> {
    field.filter(|f| !f.is_empty()).map(str::to_string)
}

fn format_error(line: u64, column: &str, value: Option<&String>, expected: &'static str) -> CaisseError {
    CaisseError::Format {
        line,
        column: column.to_string(),
        value: value.cloned().unwrap_or_default(),
        expected,
    }
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Split the upload into raw text rows, checking the header first.
pub fn read_raw(bytes: &[u8]) -> Result<Vec<RawRecord>> {
    let text = decode_latin1(bytes);
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: HashMap<String, usize> = rdr
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim().to_string(), i))
        .collect();

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !headers.contains_key(**c))
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(CaisseError::Schema { missing });
    }

    let dropped: Vec<&str> = DROPPED_COLUMNS
        .iter()
        .copied()
        .filter(|c| headers.contains_key(*c))
        .collect();
    if !dropped.is_empty() {
        debug!(columns = ?dropped, "dropping administrative columns");
    }

    let idx = |name: &str| headers[name];
    let (i_date, i_label, i_qty) = (idx(COL_DATE), idx(COL_LABEL), idx(COL_QUANTITY));
    let (i_ht, i_tva, i_ttc) = (idx(COL_TOTAL_HT), idx(COL_TVA), idx(COL_TOTAL_TTC));
    let i_code = idx(COL_ESTABLISHMENT);

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        rows.push(RawRecord {
            line,
            date: non_empty(record.get(i_date)),
            label: raw_label(record.get(i_label)),
            quantity: non_empty(record.get(i_qty)),
            total_ht: non_empty(record.get(i_ht)),
            tva: non_empty(record.get(i_tva)),
            total_ttc: non_empty(record.get(i_ttc)),
            establishment: non_empty(record.get(i_code)),
        });
    }
    info!(rows = rows.len(), "read sales journal");
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Coercion
// ---------------------------------------------------------------------------

fn coerce_amount(raw: &RawRecord, value: Option<&String>, column: &str) -> Result<f64> {
    value
        .and_then(|v| parse_amount(v))
        .ok_or_else(|| format_error(raw.line, column, value, "a comma-decimal amount"))
}

/// Type one raw row. Dates and amounts must parse; quantity falls back to 0.
/// The cleaned label is derived here from the original one.
pub fn coerce(raw: &RawRecord) -> Result<SalesRecord> {
    let date = raw
        .date
        .as_deref()
        .and_then(parse_date_dmy)
        .ok_or_else(|| format_error(raw.line, COL_DATE, raw.date.as_ref(), "a DD/MM/YYYY date"))?;
    let total_ht = coerce_amount(raw, raw.total_ht.as_ref(), COL_TOTAL_HT)?;
    let tva = coerce_amount(raw, raw.tva.as_ref(), COL_TVA)?;
    let total_ttc = coerce_amount(raw, raw.total_ttc.as_ref(), COL_TOTAL_TTC)?;

    Ok(SalesRecord {
        date,
        original_label: raw.label.clone(),
        label: normalize(raw.label.as_deref()),
        quantity: parse_quantity(raw.quantity.as_deref()),
        total_ht,
        tva,
        total_ttc,
        establishment: raw
            .establishment
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string(),
    })
}

/// Type every row; the first failure aborts the whole load.
pub fn coerce_all(rows: &[RawRecord]) -> Result<Vec<SalesRecord>> {
    rows.iter().map(coerce).collect()
}
