//! CSV boundary: load a table, work out which column carries the name,
//! hand the rest of the row through untouched for later export.

use std::fs::File;
use std::path::Path;

use log::{info, warn};

use crate::error::IngestError;
use crate::models::{NameRecord, build_records};

/// Headers recognized as the name column when none is requested, compared
/// after lowercasing and dropping spaces, underscores and hyphens.
const NAME_HEADERS: [&str; 4] = ["studentname", "name", "fullname", "student"];

/// A loaded CSV with its name column resolved. Rows keep every original
/// cell so exports can reproduce them verbatim.
#[derive(Debug, Clone)]
pub struct NameTable {
    pub path: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub name_idx: usize,
}

impl NameTable {
    pub fn name_header(&self) -> &str {
        &self.headers[self.name_idx]
    }

    /// Records in row order. A short row yields an empty original, which
    /// normalizes to the empty string downstream.
    pub fn records(&self) -> Vec<NameRecord> {
        build_records(
            self.rows
                .iter()
                .map(|row| row.get(self.name_idx).cloned().unwrap_or_default()),
        )
    }
}

pub fn load_name_table(
    path: impl AsRef<Path>,
    name_column: Option<&str>,
) -> Result<NameTable, IngestError> {
    let path = path.as_ref().display().to_string();
    let file = File::open(&path).map_err(|source| IngestError::Io {
        path: path.clone(),
        source,
    })?;
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|source| IngestError::Csv {
            path: path.clone(),
            source,
        })?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let name_idx = resolve_name_column(&headers, name_column, &path)?;

    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|source| IngestError::Csv {
            path: path.clone(),
            source,
        })?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    info!(
        "loaded {} rows from {} (name column '{}')",
        rows.len(),
        path,
        headers[name_idx]
    );
    Ok(NameTable {
        path,
        headers,
        rows,
        name_idx,
    })
}

fn resolve_name_column(
    headers: &[String],
    requested: Option<&str>,
    path: &str,
) -> Result<usize, IngestError> {
    if headers.is_empty() {
        return Err(IngestError::Empty {
            path: path.to_string(),
        });
    }
    if let Some(want) = requested {
        return headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(want))
            .ok_or_else(|| IngestError::MissingColumn {
                column: want.to_string(),
                path: path.to_string(),
                headers: headers.join(", "),
            });
    }
    if let Some(i) = headers
        .iter()
        .position(|h| NAME_HEADERS.contains(&canonical_header(h).as_str()))
    {
        return Ok(i);
    }
    warn!(
        "no conventional name column in {} (headers: {}); using first column '{}'",
        path,
        headers.join(", "),
        headers[0]
    );
    Ok(0)
}

fn canonical_header(header: &str) -> String {
    header
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(*c, ' ' | '_' | '-'))
        .collect()
}
