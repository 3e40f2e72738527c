// ABOUTME: Table extraction: walks tbody/tr/td structure into rows of cells, recursing into nested tables.
// ABOUTME: Also locates the target table on a page by class or id scope.

//! HTML table extraction.
//!
//! Rows are taken from `./tbody/tr` when present and from `./tr` otherwise.
//! Only direct `td` children are read. A cell holding nested tables yields
//! those tables instead of its own text.

use scraper::ElementRef;
use serde::Serialize;

use crate::error::Result;
use crate::extractors::patterns::Scope;
use crate::page::Page;
use crate::xpath::compiled::get_or_compile;

/// A table cell: plain text, or the tables nested directly inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Tables(Vec<Table>),
}

impl Cell {
    /// Text for a flat (CSV) cell; nested tables render as compact JSON.
    pub fn to_flat_string(&self) -> String {
        match self {
            Cell::Text(text) => text.clone(),
            Cell::Tables(tables) => serde_json::to_string(tables).unwrap_or_default(),
        }
    }
}

pub type Row = Vec<Cell>;
pub type Table = Vec<Row>;

fn child_elements<'a>(element: ElementRef<'a>, name: &'a str) -> impl Iterator<Item = ElementRef<'a>> {
    element
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |child| child.value().name() == name)
}

fn table_rows(table: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let body_rows: Vec<_> = child_elements(table, "tbody")
        .flat_map(|body| child_elements(body, "tr"))
        .collect();
    if !body_rows.is_empty() {
        return body_rows;
    }
    child_elements(table, "tr").collect()
}

fn cell_text(cell: ElementRef<'_>, normalize_whitespace: bool) -> String {
    let text = cell.text().collect::<Vec<_>>().join(" ");
    if normalize_whitespace {
        text.replace(['\r', '\n'], " ").trim().to_string()
    } else {
        text
    }
}

/// Extract every data row of `table`.
///
/// With `normalize_whitespace`, CR and LF become spaces and the cell is trimmed;
/// interior runs of spaces are left alone.
pub fn extract_table(table: ElementRef<'_>, normalize_whitespace: bool) -> Table {
    table_rows(table)
        .into_iter()
        .map(|row| {
            child_elements(row, "td")
                .map(|cell| {
                    let nested: Vec<_> = child_elements(cell, "table").collect();
                    if nested.is_empty() {
                        Cell::Text(cell_text(cell, normalize_whitespace))
                    } else {
                        Cell::Tables(
                            nested
                                .into_iter()
                                .map(|inner| extract_table(inner, normalize_whitespace))
                                .collect(),
                        )
                    }
                })
                .collect()
        })
        .collect()
}

/// The first table on `page` matching `scope`, if any.
pub fn find_table<'p>(page: &'p Page, scope: &Scope) -> Result<Option<ElementRef<'p>>> {
    let query = scope.query("//table", "")?;
    let xpath = get_or_compile(&query)?;
    Ok(page.select(&xpath)?.into_iter().next())
}

/// Locate the scoped table and extract it; no match yields an empty table.
pub fn extract_page_table(page: &Page, scope: &Scope) -> Result<Table> {
    Ok(find_table(page, scope)?
        .map(|table| extract_table(table, true))
        .unwrap_or_default())
}
