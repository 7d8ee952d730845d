use std::io::Write;

use crate::error::Result;
use crate::models::{AggregatedRecord, OUTPUT_COLUMNS};

/// Write the aggregated table as `;`-separated CSV with the downstream
/// column names. The header is written even when no row is selected.
pub fn write_csv<W: Write>(rows: &[&AggregatedRecord], out: W) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().delimiter(b';').from_writer(out);
    if rows.is_empty() {
        wtr.write_record(OUTPUT_COLUMNS)?;
    }
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<W: Write>(rows: &[&AggregatedRecord], mut out: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut out, rows)?;
    writeln!(out)?;
    Ok(())
}
