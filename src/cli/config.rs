use crate::error::{CaisseError, Result};
use crate::reports::Frequency;
use crate::settings::{expand_rules_path, load_settings, save_settings, settings_path};

pub fn run(
    rules_path: Option<String>,
    top_limit: Option<usize>,
    frequency: Option<String>,
) -> Result<()> {
    let mut settings = load_settings();
    let changed = rules_path.is_some() || top_limit.is_some() || frequency.is_some();

    if let Some(p) = rules_path {
        settings.rules_path = if p.trim().is_empty() {
            None
        } else {
            let path = expand_rules_path(&p);
            let path = std::fs::canonicalize(&path).unwrap_or(path);
            Some(path.to_string_lossy().into_owned())
        };
    }
    if let Some(n) = top_limit {
        if n == 0 {
            return Err(CaisseError::Settings("top limit must be at least 1".to_string()));
        }
        settings.top_limit = n;
    }
    if let Some(f) = frequency {
        let freq: Frequency = f.parse()?;
        settings.frequency = freq.key().to_string();
    }
    if changed {
        save_settings(&settings)?;
        println!("Saved {}", settings_path().display());
    }

    println!("Settings:     {}", settings_path().display());
    println!(
        "Rules:        {}",
        settings.rules_path.as_deref().unwrap_or("(built-in table)")
    );
    println!("Top limit:    {}", settings.top_limit);
    println!("Frequency:    {}", settings.frequency().key());
    Ok(())
}
