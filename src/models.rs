use chrono::NaiveDate;
use serde::Serialize;

/// One line of the uploaded journal, as text, before any coercion.
/// `None` marks a field that is absent from the row or left empty.
#[derive(Debug, Clone, Default)]
pub struct RawRecord {
    pub line: u64,
    pub date: Option<String>,
    pub label: Option<String>,
    pub quantity: Option<String>,
    pub total_ht: Option<String>,
    pub tva: Option<String>,
    pub total_ttc: Option<String>,
    pub establishment: Option<String>,
}

/// Typed projection of a [`RawRecord`] with its cleaned label.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesRecord {
    pub date: NaiveDate,
    pub original_label: Option<String>,
    pub label: Option<String>,
    pub quantity: f64,
    pub total_ht: f64,
    pub tva: f64,
    pub total_ttc: f64,
    pub establishment: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategorizedRecord {
    pub record: SalesRecord,
    pub category: String,
}

/// Output column names, in serialization order.
pub const OUTPUT_COLUMNS: [&str; 9] = [
    "Libellé",
    "Catégorie",
    "Date",
    "Code_établissement",
    "Quantité",
    "Total_HT",
    "TVA",
    "Total_TTC",
    "Libellé_Original",
];

/// Final output row. Serialized with the column names the dashboard and
/// report layers read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedRecord {
    #[serde(rename = "Libellé")]
    pub label: Option<String>,
    #[serde(rename = "Catégorie")]
    pub category: String,
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Code_établissement")]
    pub establishment: String,
    #[serde(rename = "Quantité")]
    pub quantity: f64,
    #[serde(rename = "Total_HT")]
    pub total_ht: f64,
    #[serde(rename = "TVA")]
    pub tva: f64,
    #[serde(rename = "Total_TTC")]
    pub total_ttc: f64,
    #[serde(rename = "Libellé_Original")]
    pub original_label: Option<String>,
}

impl AggregatedRecord {
    pub fn label_str(&self) -> &str {
        self.label.as_deref().unwrap_or("")
    }
}
