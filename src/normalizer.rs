use once_cell::sync::Lazy;
use regex::Regex;

static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{1,2}[/-]\d{1,2}[/-]\d{2,4}").expect("valid date pattern"));
static MARKER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\([aA]\):").expect("valid marker pattern"));
static SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid space pattern"));

/// Strip embedded dates and `(a):` markers from an item label, then collapse
/// whitespace. A missing label stays missing.
pub fn normalize(label: Option<&str>) -> Option<String> {
    label.map(normalize_str)
}

pub fn normalize_str(label: &str) -> String {
    let without_dates = DATE_RE.replace_all(label, "");
    let without_markers = MARKER_RE.replace_all(&without_dates, "");
    SPACE_RE
        .replace_all(&without_markers, " ")
        .trim()
        .to_string()
}
