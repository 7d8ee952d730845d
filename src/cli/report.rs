use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::error::{CaisseError, Result};
use crate::fmt::{count, euro, signed_pct};
use crate::reports::{self, Dimension, Filter, Frequency, Measure, RankedItem};
use crate::settings::load_settings;

use super::{load_table, parse_cli_date, FilterArgs};

fn measure_cell(measure: Measure, val: f64) -> Cell {
    match measure {
        Measure::Ttc => Cell::new(euro(val)),
        Measure::Quantity => Cell::new(count(val)),
    }
}

fn change_cell(pct: f64) -> Cell {
    let text = signed_pct(pct);
    if pct > 0.0 {
        Cell::new(text.green())
    } else if pct < 0.0 {
        Cell::new(text.red())
    } else {
        Cell::new(text)
    }
}

fn range_label(filter: &Filter) -> String {
    match (filter.from, filter.to) {
        (Some(f), Some(t)) => format!("du {} au {}", f.format("%d/%m/%Y"), t.format("%d/%m/%Y")),
        (Some(f), None) => format!("depuis le {}", f.format("%d/%m/%Y")),
        (None, Some(t)) => format!("jusqu'au {}", t.format("%d/%m/%Y")),
        (None, None) => "toute la période".to_string(),
    }
}

pub fn kpi(file: &str, rules: Option<&str>, filter: &FilterArgs) -> Result<()> {
    let rows = load_table(file, rules)?;
    let filter = filter.to_filter()?;
    let selected = filter.apply(&rows);
    if selected.is_empty() {
        println!("No sales match the selected filters.");
        return Ok(());
    }
    let k = reports::get_kpis(&selected);

    let mut table = Table::new();
    table.set_header(vec!["Indicateur", "Valeur"]);
    table.add_row(vec![Cell::new("Chiffre d'Affaires Total (TTC)"), Cell::new(euro(k.total_ttc))]);
    table.add_row(vec![Cell::new("Chiffre d'Affaires Total (HT)"), Cell::new(euro(k.total_ht))]);
    table.add_row(vec![Cell::new("Volume d'Articles Vendus"), Cell::new(count(k.quantity))]);
    table.add_row(vec![Cell::new("Prix Moyen par Article (TTC)"), Cell::new(euro(k.average_price))]);
    table.add_row(vec![Cell::new("Articles Différents"), Cell::new(k.distinct_articles)]);
    table.add_row(vec![Cell::new("Catégories"), Cell::new(k.distinct_categories)]);

    println!("Indicateurs Clés ({})\n{table}", range_label(&filter));
    Ok(())
}

pub fn trend(
    file: &str,
    rules: Option<&str>,
    frequency: Option<String>,
    filter: &FilterArgs,
) -> Result<()> {
    let freq: Frequency = match frequency {
        Some(f) => f.parse()?,
        None => load_settings().frequency(),
    };
    let rows = load_table(file, rules)?;
    let filter = filter.to_filter()?;
    let buckets = reports::rollup(&filter.apply(&rows), freq);
    if buckets.is_empty() {
        println!("No sales match the selected filters.");
        return Ok(());
    }

    let period_header = match freq {
        Frequency::Day => "Jour",
        Frequency::Week => "Semaine (fin)",
        Frequency::Month => "Mois",
    };
    let mut table = Table::new();
    table.set_header(vec![period_header, "Total TTC"]);
    for b in &buckets {
        let period = match freq {
            Frequency::Month => b.period_end.format("%m/%Y").to_string(),
            _ => b.period_end.format("%d/%m/%Y").to_string(),
        };
        table.add_row(vec![Cell::new(period), Cell::new(euro(b.total_ttc))]);
    }
    let total: f64 = buckets.iter().map(|b| b.total_ttc).sum();
    table.add_row(vec![Cell::new("Total".bold()), Cell::new(euro(total))]);
    println!("Évolution du Chiffre d'Affaires ({})\n{table}", range_label(&filter));
    Ok(())
}

fn ranked_table(header: &str, measure: Measure, items: &[RankedItem]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["#", header, measure.label()]);
    for (i, item) in items.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&item.name),
            measure_cell(measure, item.total),
        ]);
    }
    table
}

pub fn top(
    file: &str,
    rules: Option<&str>,
    by: &str,
    dimension: &str,
    limit: Option<usize>,
    filter: &FilterArgs,
) -> Result<()> {
    let measure: Measure = by.parse()?;
    let dim: Dimension = dimension.parse()?;
    let limit = limit.unwrap_or_else(|| load_settings().top_limit);
    let rows = load_table(file, rules)?;
    let filter = filter.to_filter()?;
    let items = reports::top(&filter.apply(&rows), dim, measure, limit);
    if items.is_empty() {
        println!("No sales match the selected filters.");
        return Ok(());
    }
    let table = ranked_table(dim.label(), measure, &items);
    println!("Top {limit} par {}\n{table}", measure.label());
    Ok(())
}

pub fn split(file: &str, rules: Option<&str>, by: &str, filter: &FilterArgs) -> Result<()> {
    let measure: Measure = by.parse()?;
    let rows = load_table(file, rules)?;
    let filter = filter.to_filter()?;
    let data = reports::split(&filter.apply(&rows), measure);
    if data.items.is_empty() {
        println!("No sales match the selected filters.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Catégorie", measure.label(), "%"]);
    for item in &data.items {
        table.add_row(vec![
            Cell::new(&item.category),
            measure_cell(measure, item.total),
            Cell::new(format!("{:.1}%", item.pct)),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total".bold()),
        measure_cell(measure, data.total),
        Cell::new(""),
    ]);
    println!("Répartition par Catégorie\n{table}");
    Ok(())
}

fn period(from: &str, to: &str) -> Result<Filter> {
    let (from, to) = (parse_cli_date(from)?, parse_cli_date(to)?);
    if from > to {
        return Err(CaisseError::Other(format!(
            "Period starts after it ends: {} > {}",
            from.format("%d/%m/%Y"),
            to.format("%d/%m/%Y")
        )));
    }
    Ok(Filter::between(from, to))
}

#[allow(clippy::too_many_arguments)]
pub fn compare(
    file: &str,
    rules: Option<&str>,
    from1: &str,
    to1: &str,
    from2: &str,
    to2: &str,
    name1: &str,
    name2: &str,
) -> Result<()> {
    let first = period(from1, to1)?;
    let second = period(from2, to2)?;
    let limit = load_settings().top_limit;
    let rows = load_table(file, rules)?;
    let cmp = reports::compare(&first.apply(&rows), &second.apply(&rows), limit);

    let mut table = Table::new();
    table.set_header(vec!["Indicateur", name1, name2, "Évolution (%)"]);
    for change in &cmp.changes {
        let (a, b) = if change.money {
            (euro(change.first), euro(change.second))
        } else {
            (count(change.first), count(change.second))
        };
        table.add_row(vec![
            Cell::new(change.label),
            Cell::new(a),
            Cell::new(b),
            change_cell(change.change_pct),
        ]);
    }
    println!(
        "{name1}: {}\n{name2}: {}\n{table}",
        range_label(&first),
        range_label(&second)
    );

    if !cmp.first_categories.is_empty() {
        println!(
            "\nTop {limit} Catégories - {name1}\n{}",
            ranked_table("Catégorie", Measure::Ttc, &cmp.first_categories)
        );
    }
    if !cmp.second_categories.is_empty() {
        println!(
            "\nTop {limit} Catégories - {name2}\n{}",
            ranked_table("Catégorie", Measure::Ttc, &cmp.second_categories)
        );
    }
    Ok(())
}
