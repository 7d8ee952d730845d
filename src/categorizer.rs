use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CaisseError, Result};
use crate::models::{CategorizedRecord, SalesRecord};

/// Category for labels no rule matches.
pub const FALLBACK_CATEGORY: &str = "Autre";

const BUILTIN_TABLE: &str = include_str!("../assets/categories.json");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub category: String,
    pub keywords: Vec<String>,
}

impl CategoryRule {
    fn matches(&self, label_lower: &str) -> bool {
        self.keywords.iter().any(|k| label_lower.contains(k.as_str()))
    }
}

/// Ordered keyword table. Rules are tried top to bottom and the first one
/// with a keyword contained in the lower-cased label wins.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<CategoryRule>,
}

impl RuleSet {
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_TABLE)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let rules: Vec<CategoryRule> = serde_json::from_str(text)?;
        Self::new(rules)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
            .map_err(|e| CaisseError::Rules(format!("{}: {e}", path.display())))
    }

    /// External table when a path is given, built-in table otherwise.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => {
                debug!(path = %p.display(), "loading category table");
                Self::from_file(p)
            }
            None => Self::builtin(),
        }
    }

    pub fn new(rules: Vec<CategoryRule>) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut normalized = Vec::with_capacity(rules.len());
        for rule in rules {
            let category = rule.category.trim().to_string();
            if category.is_empty() {
                return Err(CaisseError::Rules("category name cannot be empty".to_string()));
            }
            if !seen.insert(category.clone()) {
                return Err(CaisseError::Rules(format!("category listed twice: {category}")));
            }
            if rule.keywords.is_empty() {
                return Err(CaisseError::Rules(format!("no keywords for {category}")));
            }
            let mut keywords = Vec::with_capacity(rule.keywords.len());
            for k in &rule.keywords {
                if k.is_empty() {
                    return Err(CaisseError::Rules(format!("empty keyword in {category}")));
                }
                keywords.push(k.to_lowercase());
            }
            normalized.push(CategoryRule { category, keywords });
        }
        Ok(Self { rules: normalized })
    }

    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    /// Every category this table can produce, in rule order, fallback last.
    pub fn categories(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self.rules.iter().map(|r| r.category.as_str()).collect();
        if !out.contains(&FALLBACK_CATEGORY) {
            out.push(FALLBACK_CATEGORY);
        }
        out
    }

    pub fn categorize(&self, label: Option<&str>) -> &str {
        let Some(label) = label else {
            return FALLBACK_CATEGORY;
        };
        let lower = label.to_lowercase();
        self.rules
            .iter()
            .find(|r| r.matches(&lower))
            .map(|r| r.category.as_str())
            .unwrap_or(FALLBACK_CATEGORY)
    }
}

/// Tag each record with the category of its cleaned label.
pub fn categorize_records(rules: &RuleSet, records: Vec<SalesRecord>) -> Vec<CategorizedRecord> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    let out: Vec<CategorizedRecord> = records
        .into_iter()
        .map(|record| {
            let category = rules.categorize(record.label.as_deref()).to_string();
            *counts.entry(category.clone()).or_default() += 1;
            CategorizedRecord { record, category }
        })
        .collect();
    for (category, n) in &counts {
        debug!(category = %category, rows = n, "categorized");
    }
    out
}
