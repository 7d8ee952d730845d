use std::path::PathBuf;

use crate::error::Result;
use crate::export::{write_csv, write_json};

use super::{load_table, FilterArgs};

pub fn run(
    file: &str,
    rules: Option<&str>,
    output: Option<String>,
    json: bool,
    filter: &FilterArgs,
) -> Result<()> {
    let rows = load_table(file, rules)?;
    let filter = filter.to_filter()?;
    let selected = filter.apply(&rows);

    match output.map(PathBuf::from) {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            let file = std::fs::File::create(&path)?;
            if json {
                write_json(&selected, file)?;
            } else {
                write_csv(&selected, file)?;
            }
            eprintln!("Wrote {} rows to {}", selected.len(), path.display());
        }
        None => {
            let stdout = std::io::stdout().lock();
            if json {
                write_json(&selected, stdout)?;
            } else {
                write_csv(&selected, stdout)?;
            }
        }
    }
    Ok(())
}
