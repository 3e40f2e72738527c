// ABOUTME: Output writers for extracted datasets.
// ABOUTME: Renders records and table rows as CSV/text and any dataset as pretty-printed JSON.

//! Output format conversion module.
//!
//! `text` and `csv` produce the same comma-separated output. Form data is
//! nested and only has a JSON rendering; callers should pass the job's
//! `json_only` flag through [`OutputFormat::resolve`] first.

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use crate::dataset::Dataset;
use crate::error::{Result, ScrapeError};
use crate::extractors::fields::{FieldList, Record};
use crate::extractors::table::Table;

/// The serialization format for extracted data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Csv,
    Json,
}

impl OutputFormat {
    /// The format actually used: nested data always goes out as JSON.
    pub fn resolve(self, json_only: bool) -> Self {
        if json_only {
            OutputFormat::Json
        } else {
            self
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OutputFormat::Text => "text",
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for OutputFormat {
    type Err = ScrapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            other => Err(ScrapeError::UnknownFormat(other.to_string())),
        }
    }
}

/// Write `data` to `out` in `format`.
///
/// `fields` gives the CSV header and column order. For records without a field
/// list the first record's keys are used; table rows get a header only when
/// `fields` is given.
pub fn write_dataset<W: Write>(
    mut out: W,
    data: &Dataset,
    fields: Option<&FieldList>,
    format: OutputFormat,
) -> Result<()> {
    match (format, data) {
        (OutputFormat::Json, _) => {
            serde_json::to_writer_pretty(&mut out, data)?;
            writeln!(out)?;
        }
        (_, Dataset::Records(records)) => write_records_csv(out, records, fields)?,
        (_, Dataset::Rows(rows)) => write_rows_csv(out, rows, fields)?,
        (OutputFormat::Text, Dataset::Forms(_)) => return Err(ScrapeError::Unrepresentable("text")),
        (OutputFormat::Csv, Dataset::Forms(_)) => return Err(ScrapeError::Unrepresentable("csv")),
    }
    Ok(())
}

fn write_records_csv<W: Write>(out: W, records: &[Record], fields: Option<&FieldList>) -> Result<()> {
    let columns: Vec<String> = match fields {
        Some(fields) => {
            let mut seen = Vec::new();
            for name in fields.iter() {
                if !seen.iter().any(|s: &String| s == name) {
                    seen.push(name.to_string());
                }
            }
            seen
        }
        None => records
            .first()
            .map(|r| r.iter().map(|(k, _)| k.to_string()).collect())
            .unwrap_or_default(),
    };

    let mut writer = csv::Writer::from_writer(out);
    if columns.is_empty() {
        return Ok(());
    }
    writer.write_record(&columns)?;
    for record in records {
        writer.write_record(columns.iter().map(|c| record.get(c).unwrap_or_default()))?;
    }
    writer.flush()?;
    Ok(())
}

fn write_rows_csv<W: Write>(out: W, rows: &Table, fields: Option<&FieldList>) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(out);
    if let Some(fields) = fields {
        writer.write_record(fields.iter())?;
    }
    for row in rows {
        writer.write_record(row.iter().map(|cell| cell.to_flat_string()))?;
    }
    writer.flush()?;
    Ok(())
}
