use std::collections::BTreeSet;

use comfy_table::{Cell, Table};

use crate::categorizer::FALLBACK_CATEGORY;
use crate::error::Result;
use crate::reports::available_articles;

use super::{load_table, resolve_rules};

pub fn list(rules: Option<&str>) -> Result<()> {
    let rules = resolve_rules(rules)?;

    let mut table = Table::new();
    table.set_header(vec!["#", "Catégorie", "Mots-clés"]);
    for (i, rule) in rules.rules().iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&rule.category),
            Cell::new(rule.keywords.join(", ")),
        ]);
    }
    table.add_row(vec![Cell::new("-"), Cell::new(FALLBACK_CATEGORY), Cell::new("(no match)")]);
    println!("{table}");
    println!("{} categories", rules.categories().len());
    Ok(())
}

/// Distinct articles of the given categories (all when none given).
pub fn articles(file: &str, rules: Option<&str>, categories: &[String]) -> Result<()> {
    let rows = load_table(file, rules)?;
    let selected: BTreeSet<String> = categories.iter().cloned().collect();
    let names = available_articles(&rows, &selected);
    if names.is_empty() {
        println!("No articles found.");
        return Ok(());
    }
    for name in &names {
        println!("{name}");
    }
    eprintln!("{} articles", names.len());
    Ok(())
}
