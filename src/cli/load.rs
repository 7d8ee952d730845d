use std::collections::BTreeMap;
use std::path::Path;

use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::fmt::{count, euro};
use crate::pipeline::{fingerprint, load};
use crate::reports::date_span;

use super::resolve_rules;

pub fn run(file: &str, rules: Option<&str>) -> Result<()> {
    let path = Path::new(file);
    let bytes = std::fs::read(path)?;
    let rules = resolve_rules(rules)?;
    let rows = load(&bytes, &rules)?;

    println!("File:         {}", path.display());
    println!("Fingerprint:  {}", fingerprint(&bytes));
    println!("Rows:         {} (after grouping)", rows.len());
    match date_span(&rows) {
        Some((first, last)) => println!(
            "Period:       {} to {}",
            first.format("%d/%m/%Y"),
            last.format("%d/%m/%Y")
        ),
        None => {
            println!("Period:       (no sales)");
            return Ok(());
        }
    }

    let mut per_category: BTreeMap<&str, (usize, f64, f64)> = BTreeMap::new();
    for r in &rows {
        let e = per_category.entry(r.category.as_str()).or_default();
        e.0 += 1;
        e.1 += r.quantity;
        e.2 += r.total_ttc;
    }

    let mut table = Table::new();
    table.set_header(vec!["Catégorie", "Lignes", "Quantité", "Total TTC"]);
    for (category, (n, qty, ttc)) in &per_category {
        table.add_row(vec![
            Cell::new(category),
            Cell::new(n),
            Cell::new(count(*qty)),
            Cell::new(euro(*ttc)),
        ]);
    }
    let total: f64 = rows.iter().map(|r| r.total_ttc).sum();
    table.add_row(vec![
        Cell::new("Total".bold()),
        Cell::new(rows.len()),
        Cell::new(""),
        Cell::new(euro(total)),
    ]);
    println!("\n{table}");
    Ok(())
}
