// ABOUTME: Dataset is the extracted result of one page or a whole paginated run.
// ABOUTME: Flat records, table rows, or the nested forms report.

use serde::Serialize;

use crate::error::{Result, ScrapeError};

use crate::extractors::fields::Record;
use crate::extractors::forms::FormsReport;
use crate::extractors::table::Table;

/// Extracted data in one of the three shapes the extractors produce.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Dataset {
    Records(Vec<Record>),
    Rows(Table),
    Forms(FormsReport),
}

impl Dataset {
    /// An empty dataset of the same shape as `self`.
    pub fn empty_like(&self) -> Self {
        match self {
            Dataset::Records(_) => Dataset::Records(Vec::new()),
            Dataset::Rows(_) => Dataset::Rows(Vec::new()),
            Dataset::Forms(_) => Dataset::Forms(FormsReport::default()),
        }
    }

    /// Number of records, rows or forms. This is what the page-size rule counts.
    pub fn len(&self) -> usize {
        match self {
            Dataset::Records(records) => records.len(),
            Dataset::Rows(rows) => rows.len(),
            Dataset::Forms(report) => report.list.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Name of the shape, for messages.
    pub fn shape(&self) -> &'static str {
        match self {
            Dataset::Records(_) => "records",
            Dataset::Rows(_) => "table rows",
            Dataset::Forms(_) => "forms",
        }
    }

    /// Append `other` to `self`.
    ///
    /// An empty `self` takes on the shape of `other`. Appending a different
    /// shape to non-empty data is an error and leaves `self` untouched.
    pub fn extend(&mut self, other: Dataset) -> Result<()> {
        match (self, other) {
            (Dataset::Records(acc), Dataset::Records(more)) => acc.extend(more),
            (Dataset::Rows(acc), Dataset::Rows(more)) => acc.extend(more),
            (Dataset::Forms(acc), Dataset::Forms(more)) => acc.merge(more),
            (acc, more) if acc.is_empty() => *acc = more,
            (acc, more) => {
                return Err(ScrapeError::ShapeMismatch {
                    expected: acc.shape(),
                    found: more.shape(),
                });
            }
        }
        Ok(())
    }

    pub fn records(&self) -> Option<&[Record]> {
        match self {
            Dataset::Records(records) => Some(records),
            _ => None,
        }
    }

    pub fn records_mut(&mut self) -> Option<&mut Vec<Record>> {
        match self {
            Dataset::Records(records) => Some(records),
            _ => None,
        }
    }
}

impl Default for Dataset {
    fn default() -> Self {
        Dataset::Records(Vec::new())
    }
}
