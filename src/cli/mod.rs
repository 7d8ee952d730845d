pub mod categories;
pub mod config;
pub mod export;
pub mod load;
pub mod report;

use std::collections::BTreeSet;
use std::path::Path;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::categorizer::RuleSet;
use crate::error::{CaisseError, Result};
use crate::importer::parse_date_dmy;
use crate::models::AggregatedRecord;
use crate::pipeline;
use crate::reports::Filter;
use crate::settings::{expand_rules_path, load_settings};

/// Accepts the journal's own `DD/MM/YYYY` as well as ISO dates.
pub(crate) fn parse_cli_date(raw: &str) -> Result<NaiveDate> {
    parse_date_dmy(raw)
        .or_else(|| NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok())
        .ok_or_else(|| {
            CaisseError::Other(format!("Invalid date: {raw} (expected DD/MM/YYYY or YYYY-MM-DD)"))
        })
}

/// `--rules` first, then the configured table, then the built-in one.
pub(crate) fn resolve_rules(rules: Option<&str>) -> Result<RuleSet> {
    let configured = load_settings().rules_path;
    let path = rules
        .map(str::to_string)
        .or(configured)
        .map(|p| expand_rules_path(&p));
    RuleSet::resolve(path.as_deref())
}

pub(crate) fn load_table(file: &str, rules: Option<&str>) -> Result<Vec<AggregatedRecord>> {
    let rules = resolve_rules(rules)?;
    pipeline::load_file(Path::new(file), &rules)
}

#[derive(Parser)]
#[command(
    name = "caisse",
    about = "Clean, categorize and aggregate point-of-sale sales journals."
)]
pub struct Cli {
    /// Category table (JSON) to use instead of the configured one
    #[arg(long, global = true)]
    pub rules: Option<String>,
    /// Show debug diagnostics on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Start date, inclusive: DD/MM/YYYY or YYYY-MM-DD
    #[arg(long = "from")]
    pub from_date: Option<String>,
    /// End date, inclusive: DD/MM/YYYY or YYYY-MM-DD
    #[arg(long = "to")]
    pub to_date: Option<String>,
    /// Keep only this category (repeatable)
    #[arg(long = "category")]
    pub categories: Vec<String>,
    /// Keep only this article (repeatable)
    #[arg(long = "article")]
    pub articles: Vec<String>,
}

impl FilterArgs {
    pub fn to_filter(&self) -> Result<Filter> {
        let as_set = |v: &[String]| -> Option<BTreeSet<String>> {
            if v.is_empty() {
                None
            } else {
                Some(v.iter().cloned().collect())
            }
        };
        let from = self.from_date.as_deref().map(parse_cli_date).transpose()?;
        let to = self.to_date.as_deref().map(parse_cli_date).transpose()?;
        if let (Some(f), Some(t)) = (from, to) {
            if f > t {
                return Err(CaisseError::Other(
                    "--from must not be after --to".to_string(),
                ));
            }
        }
        Ok(Filter {
            from,
            to,
            categories: as_set(self.categories.as_slice()),
            articles: as_set(self.articles.as_slice()),
        })
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the pipeline and summarize the cleaned table.
    Load {
        /// Sales journal (CSV, ';' separated, Latin-1)
        file: String,
    },
    /// Key figures: revenue, volume, average price.
    Kpi {
        file: String,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Revenue (TTC) per day, week or month.
    Trend {
        file: String,
        /// day, week or month (default from settings)
        #[arg(long)]
        frequency: Option<String>,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Best-selling articles or categories.
    Top {
        file: String,
        /// Rank by: ttc or quantity
        #[arg(long, default_value = "ttc")]
        by: String,
        /// Rank: article or category
        #[arg(long, default_value = "article")]
        dimension: String,
        /// Number of rows (default from settings)
        #[arg(long)]
        limit: Option<usize>,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Share of each category.
    Split {
        file: String,
        /// Split by: ttc or quantity
        #[arg(long, default_value = "ttc")]
        by: String,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Compare two periods.
    Compare {
        file: String,
        #[arg(long)]
        from1: String,
        #[arg(long)]
        to1: String,
        #[arg(long)]
        from2: String,
        #[arg(long)]
        to2: String,
        #[arg(long, default_value = "Période 1")]
        name1: String,
        #[arg(long, default_value = "Période 2")]
        name2: String,
    },
    /// Write the cleaned table as CSV or JSON.
    Export {
        file: String,
        /// Output path (default: stdout)
        #[arg(long)]
        output: Option<String>,
        /// JSON instead of CSV
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// List the category table in evaluation order.
    Categories,
    /// List distinct articles, optionally restricted to categories.
    Articles {
        file: String,
        /// Only articles of this category (repeatable)
        #[arg(long = "category")]
        categories: Vec<String>,
    },
    /// Show or change settings.
    Settings {
        /// Category table to use by default ("" to reset)
        #[arg(long = "rules-path")]
        rules_path: Option<String>,
        /// Default number of rows for `top`
        #[arg(long = "top-limit")]
        top_limit: Option<usize>,
        /// Default rollup frequency: day, week or month
        #[arg(long)]
        frequency: Option<String>,
    },
}
