use std::path::Path;

use anyhow::Result;

use crate::api::{cell_text, Row};
use crate::search::results::is_reserved;
use crate::search::SearchSettings;

/// Write lookup rows to CSV. The header is the union of all non-reserved
/// keys in first-seen order; missing cells are empty.
pub fn export_rows_to_csv(rows: &[Row], path: &Path, settings: &SearchSettings) -> Result<usize> {
    let mut headers: Vec<&str> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !is_reserved(key, settings) && !headers.contains(&key.as_str()) {
                headers.push(key);
            }
        }
    }

    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(&headers)?;

    for row in rows {
        let record: Vec<String> = headers.iter().map(|h| cell_text(row.get(*h))).collect();
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(rows.len())
}
