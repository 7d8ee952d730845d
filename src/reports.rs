use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate};

use crate::error::CaisseError;
use crate::models::AggregatedRecord;

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// Row selection. `None` leaves a dimension unrestricted; an empty set
/// selects nothing.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub categories: Option<BTreeSet<String>>,
    pub articles: Option<BTreeSet<String>>,
}

impl Filter {
    pub fn between(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
            ..Self::default()
        }
    }

    pub fn matches(&self, row: &AggregatedRecord) -> bool {
        self.from.map_or(true, |d| row.date >= d)
            && self.to.map_or(true, |d| row.date <= d)
            && self
                .categories
                .as_ref()
                .map_or(true, |c| c.contains(&row.category))
            && self
                .articles
                .as_ref()
                .map_or(true, |a| a.contains(row.label_str()))
    }

    pub fn apply<'a>(&self, rows: &'a [AggregatedRecord]) -> Vec<&'a AggregatedRecord> {
        rows.iter().filter(|r| self.matches(r)).collect()
    }
}

/// Sorted distinct articles of the given categories, or of every category
/// when none is selected.
pub fn available_articles(rows: &[AggregatedRecord], categories: &BTreeSet<String>) -> Vec<String> {
    let set: BTreeSet<&str> = rows
        .iter()
        .filter(|r| categories.is_empty() || categories.contains(&r.category))
        .map(|r| r.label_str())
        .collect();
    set.into_iter().map(str::to_string).collect()
}

/// First and last sale dates.
pub fn date_span(rows: &[AggregatedRecord]) -> Option<(NaiveDate, NaiveDate)> {
    let min = rows.iter().map(|r| r.date).min()?;
    let max = rows.iter().map(|r| r.date).max()?;
    Some((min, max))
}

// ---------------------------------------------------------------------------
// KPIs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Kpis {
    pub total_ttc: f64,
    pub total_ht: f64,
    pub quantity: f64,
    pub average_price: f64,
    pub distinct_articles: usize,
    pub distinct_categories: usize,
}

impl Kpis {
    /// Values in display order, for the comparison table.
    pub fn values(&self) -> [f64; 6] {
        [
            self.total_ttc,
            self.total_ht,
            self.quantity,
            self.average_price,
            self.distinct_articles as f64,
            self.distinct_categories as f64,
        ]
    }
}

pub const KPI_LABELS: [&str; 6] = [
    "Chiffre d'Affaires TTC",
    "Chiffre d'Affaires HT",
    "Volume d'Articles Vendus",
    "Prix Moyen par Article",
    "Nombre d'Articles Différents",
    "Nombre de Catégories",
];

const KPI_IS_MONEY: [bool; 6] = [true, true, false, true, false, false];

pub fn get_kpis(rows: &[&AggregatedRecord]) -> Kpis {
    if rows.is_empty() {
        return Kpis::default();
    }
    let total_ttc: f64 = rows.iter().map(|r| r.total_ttc).sum();
    let total_ht: f64 = rows.iter().map(|r| r.total_ht).sum();
    let quantity: f64 = rows.iter().map(|r| r.quantity).sum();
    let articles: BTreeSet<&str> = rows.iter().map(|r| r.label_str()).collect();
    let categories: BTreeSet<&str> = rows.iter().map(|r| r.category.as_str()).collect();
    Kpis {
        total_ttc,
        total_ht,
        quantity,
        average_price: if quantity > 0.0 { total_ttc / quantity } else { 0.0 },
        distinct_articles: articles.len(),
        distinct_categories: categories.len(),
    }
}

// ---------------------------------------------------------------------------
// Period comparison
// ---------------------------------------------------------------------------

pub struct KpiChange {
    pub label: &'static str,
    /// Amount in euros rather than a count.
    pub money: bool,
    pub first: f64,
    pub second: f64,
    pub change_pct: f64,
}

pub struct Comparison {
    pub changes: Vec<KpiChange>,
    pub first_categories: Vec<RankedItem>,
    pub second_categories: Vec<RankedItem>,
}

/// Relative change from `a` to `b` in percent; 0 when `a` is 0.
pub fn change_pct(a: f64, b: f64) -> f64 {
    if a != 0.0 {
        (b - a) / a * 100.0
    } else {
        0.0
    }
}

pub fn compare(first: &[&AggregatedRecord], second: &[&AggregatedRecord], limit: usize) -> Comparison {
    let k1 = get_kpis(first);
    let k2 = get_kpis(second);
    let changes = KPI_LABELS
        .into_iter()
        .zip(KPI_IS_MONEY)
        .zip(k1.values().into_iter().zip(k2.values()))
        .map(|((label, money), (a, b))| KpiChange {
            label,
            money,
            first: a,
            second: b,
            change_pct: change_pct(a, b),
        })
        .collect();
    Comparison {
        first_categories: top(first, Dimension::Category, Measure::Ttc, limit),
        second_categories: top(second, Dimension::Category, Measure::Ttc, limit),
        changes,
    }
}

// ---------------------------------------------------------------------------
// Time-series rollup
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Frequency {
    Day,
    Week,
    #[default]
    Month,
}

impl Frequency {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    /// Last day of the period containing `date`. Weeks close on Sunday.
    pub fn period_end(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Self::Day => date,
            Self::Week => {
                let to_sunday = 6 - date.weekday().num_days_from_monday() as i64;
                date + Duration::days(to_sunday)
            }
            Self::Month => last_day_of_month(date),
        }
    }

    fn next_end(&self, end: NaiveDate) -> NaiveDate {
        match self {
            Self::Day => end + Duration::days(1),
            Self::Week => end + Duration::days(7),
            Self::Month => last_day_of_month(end + Duration::days(1)),
        }
    }
}

impl FromStr for Frequency {
    type Err = CaisseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" | "jour" | "d" => Ok(Self::Day),
            "week" | "semaine" | "w" => Ok(Self::Week),
            "month" | "mois" | "m" => Ok(Self::Month),
            other => Err(CaisseError::Other(format!(
                "Unknown frequency: {other} (expected day, week or month)"
            ))),
        }
    }
}

fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    let (y, m) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(y, m, 1)
        .and_then(|d| d.pred_opt())
        .unwrap_or(date)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    pub period_end: NaiveDate,
    pub total_ttc: f64,
}

/// Total TTC per period over a gapless range from the first to the last
/// period with sales.
pub fn rollup(rows: &[&AggregatedRecord], freq: Frequency) -> Vec<Bucket> {
    let mut sums: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for r in rows {
        *sums.entry(freq.period_end(r.date)).or_default() += r.total_ttc;
    }
    let (Some(&first), Some(&last)) = (sums.keys().next(), sums.keys().next_back()) else {
        return Vec::new();
    };
    let mut buckets = Vec::new();
    let mut end = first;
    while end <= last {
        buckets.push(Bucket {
            period_end: end,
            total_ttc: sums.get(&end).copied().unwrap_or(0.0),
        });
        end = freq.next_end(end);
    }
    buckets
}

// ---------------------------------------------------------------------------
// Rankings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Measure {
    #[default]
    Ttc,
    Quantity,
}

impl Measure {
    fn of(&self, row: &AggregatedRecord) -> f64 {
        match self {
            Self::Ttc => row.total_ttc,
            Self::Quantity => row.quantity,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Ttc => "Chiffre d'Affaires (TTC)",
            Self::Quantity => "Volume des Ventes (Quantité)",
        }
    }
}

impl FromStr for Measure {
    type Err = CaisseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ttc" | "revenue" => Ok(Self::Ttc),
            "quantity" | "qty" | "quantite" | "quantité" => Ok(Self::Quantity),
            other => Err(CaisseError::Other(format!(
                "Unknown measure: {other} (expected ttc or quantity)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dimension {
    #[default]
    Article,
    Category,
}

impl Dimension {
    fn of<'a>(&self, row: &'a AggregatedRecord) -> &'a str {
        match self {
            Self::Article => row.label_str(),
            Self::Category => row.category.as_str(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Article => "Article",
            Self::Category => "Catégorie",
        }
    }
}

impl FromStr for Dimension {
    type Err = CaisseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "article" | "articles" => Ok(Self::Article),
            "category" | "categories" | "categorie" | "catégorie" => Ok(Self::Category),
            other => Err(CaisseError::Other(format!(
                "Unknown dimension: {other} (expected article or category)"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedItem {
    pub name: String,
    pub total: f64,
}

fn totals_by(rows: &[&AggregatedRecord], dim: Dimension, measure: Measure) -> Vec<RankedItem> {
    let mut sums: BTreeMap<&str, f64> = BTreeMap::new();
    for r in rows {
        *sums.entry(dim.of(r)).or_default() += measure.of(r);
    }
    sums.into_iter()
        .map(|(name, total)| RankedItem {
            name: name.to_string(),
            total,
        })
        .collect()
}

/// Highest `limit` groups by measure; ties keep name order.
pub fn top(rows: &[&AggregatedRecord], dim: Dimension, measure: Measure, limit: usize) -> Vec<RankedItem> {
    let mut items = totals_by(rows, dim, measure);
    // stable sort: BTreeMap already ordered names ascending
    items.sort_by(|a, b| b.total.total_cmp(&a.total));
    items.truncate(limit);
    items
}

pub struct ShareItem {
    pub category: String,
    pub total: f64,
    pub pct: f64,
}

pub struct CategorySplit {
    pub items: Vec<ShareItem>,
    pub total: f64,
}

pub fn split(rows: &[&AggregatedRecord], measure: Measure) -> CategorySplit {
    let mut totals = totals_by(rows, Dimension::Category, measure);
    totals.sort_by(|a, b| b.total.total_cmp(&a.total));
    let total: f64 = totals.iter().map(|i| i.total).sum();
    let items = totals
        .into_iter()
        .map(|i| ShareItem {
            pct: if total != 0.0 { i.total * 100.0 / total } else { 0.0 },
            category: i.name,
            total: i.total,
        })
        .collect();
    CategorySplit { items, total }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn rec(label: &str, category: &str, date: NaiveDate, qty: f64, ttc: f64) -> AggregatedRecord {
        AggregatedRecord {
            label: Some(label.to_string()),
            category: category.to_string(),
            date,
            establishment: "BAR01".to_string(),
            quantity: qty,
            total_ht: ttc / 2.0,
            tva: ttc / 2.0,
            total_ttc: ttc,
            original_label: Some(label.to_string()),
        }
    }

    fn sample() -> Vec<AggregatedRecord> {
        vec![
            rec("Café", "Chaud", d(2024, 1, 1), 3.0, 7.5),
            rec("Thé", "Chaud", d(2024, 1, 3), 1.0, 3.0),
            rec("Bière", "Alcool", d(2024, 1, 15), 4.0, 24.0),
            rec("Café", "Chaud", d(2024, 3, 2), 2.0, 5.0),
        ]
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_filter_dates_inclusive() {
        let rows = sample();
        let f = Filter::between(d(2024, 1, 1), d(2024, 1, 15));
        assert_eq!(f.apply(&rows).len(), 3);
    }

    #[test]
    fn test_filter_categories_and_articles() {
        let rows = sample();
        let f = Filter {
            categories: Some(set(&["Chaud"])),
            articles: Some(set(&["Café", "Bière"])),
            ..Filter::default()
        };
        let out = f.apply(&rows);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|r| r.label_str() == "Café"));
    }

    #[test]
    fn test_empty_selection_selects_nothing() {
        let rows = sample();
        let f = Filter {
            categories: Some(BTreeSet::new()),
            ..Filter::default()
        };
        assert!(f.apply(&rows).is_empty());
        assert_eq!(Filter::default().apply(&rows).len(), 4);
    }

    #[test]
    fn test_available_articles() {
        let rows = sample();
        assert_eq!(available_articles(&rows, &set(&["Chaud"])), vec!["Café", "Thé"]);
        assert_eq!(available_articles(&rows, &BTreeSet::new()), vec!["Bière", "Café", "Thé"]);
    }

    #[test]
    fn test_date_span() {
        assert_eq!(date_span(&sample()), Some((d(2024, 1, 1), d(2024, 3, 2))));
        assert_eq!(date_span(&[]), None);
    }

    #[test]
    fn test_kpis() {
        let rows = sample();
        let k = get_kpis(&Filter::default().apply(&rows));
        assert_eq!(k.total_ttc, 39.5);
        assert_eq!(k.quantity, 10.0);
        assert_eq!(k.average_price, 3.95);
        assert_eq!(k.distinct_articles, 3);
        assert_eq!(k.distinct_categories, 2);
    }

    #[test]
    fn test_kpis_zero_quantity_and_empty() {
        let rows = vec![rec("Remise", "Autre", d(2024, 1, 1), 0.0, 5.0)];
        let k = get_kpis(&Filter::default().apply(&rows));
        assert_eq!(k.average_price, 0.0);
        assert_eq!(get_kpis(&[]), Kpis::default());
    }

    #[test]
    fn test_change_pct() {
        assert_eq!(change_pct(100.0, 150.0), 50.0);
        assert_eq!(change_pct(200.0, 100.0), -50.0);
        assert_eq!(change_pct(0.0, 100.0), 0.0);
    }

    #[test]
    fn test_compare_periods() {
        let rows = sample();
        let jan = Filter::between(d(2024, 1, 1), d(2024, 1, 31));
        let mar = Filter::between(d(2024, 3, 1), d(2024, 3, 31));
        let cmp = compare(&jan.apply(&rows), &mar.apply(&rows), 10);
        assert_eq!(cmp.changes.len(), 6);
        assert_eq!(cmp.changes[0].first, 34.5);
        assert_eq!(cmp.changes[0].second, 5.0);
        assert!(cmp.changes[0].money);
        assert!(!cmp.changes[2].money);
        assert_eq!(cmp.changes[4].label, "Nombre d'Articles Différents");
        assert_eq!(cmp.changes[4].change_pct, (1.0 - 3.0) / 3.0 * 100.0);
        assert_eq!(cmp.first_categories[0].name, "Alcool");
        assert_eq!(cmp.second_categories.len(), 1);
    }

    #[test]
    fn test_period_end() {
        // 2024-01-03 is a Wednesday
        assert_eq!(Frequency::Week.period_end(d(2024, 1, 3)), d(2024, 1, 7));
        assert_eq!(Frequency::Week.period_end(d(2024, 1, 7)), d(2024, 1, 7));
        assert_eq!(Frequency::Month.period_end(d(2024, 2, 10)), d(2024, 2, 29));
        assert_eq!(Frequency::Month.period_end(d(2023, 12, 5)), d(2023, 12, 31));
        assert_eq!(Frequency::Day.period_end(d(2024, 2, 10)), d(2024, 2, 10));
    }

    #[test]
    fn test_rollup_month_fills_gaps() {
        let rows = sample();
        let buckets = rollup(&Filter::default().apply(&rows), Frequency::Month);
        assert_eq!(
            buckets,
            vec![
                Bucket { period_end: d(2024, 1, 31), total_ttc: 34.5 },
                Bucket { period_end: d(2024, 2, 29), total_ttc: 0.0 },
                Bucket { period_end: d(2024, 3, 31), total_ttc: 5.0 },
            ]
        );
    }

    #[test]
    fn test_rollup_week_and_day() {
        let rows = sample();
        let selected = Filter::between(d(2024, 1, 1), d(2024, 1, 15)).apply(&rows);
        let weeks = rollup(&selected, Frequency::Week);
        assert_eq!(weeks.len(), 3);
        assert_eq!(weeks[0].total_ttc, 10.5);
        assert_eq!(weeks[1].total_ttc, 0.0);
        assert_eq!(weeks[2].period_end, d(2024, 1, 21));
        let days = rollup(&selected, Frequency::Day);
        assert_eq!(days.len(), 15);
        assert!(rollup(&[], Frequency::Day).is_empty());
    }

    #[test]
    fn test_top_articles_by_measure() {
        let rows = sample();
        let all = Filter::default().apply(&rows);
        let by_ttc = top(&all, Dimension::Article, Measure::Ttc, 2);
        assert_eq!(by_ttc.len(), 2);
        assert_eq!(by_ttc[0].name, "Bière");
        assert_eq!(by_ttc[1], RankedItem { name: "Café".to_string(), total: 12.5 });
        let by_qty = top(&all, Dimension::Article, Measure::Quantity, 10);
        assert_eq!(by_qty[0].name, "Café");
        assert_eq!(by_qty[0].total, 5.0);
    }

    #[test]
    fn test_top_ties_by_name() {
        let rows = vec![
            rec("B", "X", d(2024, 1, 1), 1.0, 1.0),
            rec("A", "X", d(2024, 1, 1), 1.0, 1.0),
        ];
        let items = top(&Filter::default().apply(&rows), Dimension::Article, Measure::Ttc, 10);
        assert_eq!(items[0].name, "A");
    }

    #[test]
    fn test_split_shares() {
        let rows = sample();
        let s = split(&Filter::default().apply(&rows), Measure::Quantity);
        assert_eq!(s.total, 10.0);
        assert_eq!(s.items[0].category, "Chaud");
        assert_eq!(s.items[0].pct, 60.0);
        assert_eq!(s.items[1].pct, 40.0);
        assert!(split(&[], Measure::Ttc).items.is_empty());
    }

    #[test]
    fn test_parse_options() {
        assert_eq!("Semaine".parse::<Frequency>().unwrap(), Frequency::Week);
        assert_eq!("quantity".parse::<Measure>().unwrap(), Measure::Quantity);
        assert_eq!("category".parse::<Dimension>().unwrap(), Dimension::Category);
        assert!("year".parse::<Frequency>().is_err());
    }
}
