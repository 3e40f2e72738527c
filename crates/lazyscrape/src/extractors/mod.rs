// ABOUTME: Extraction strategies that turn matched elements into datasets.
// ABOUTME: Covers field selection, tables, the named pattern library and form extraction.

//! Extraction from parsed pages.
//!
//! Submodules:
//! - `fields`: field lists, records and the per-element field selector.
//! - `table`: row/cell walking for HTML tables.
//! - `patterns`: the named pattern registry and class/id scoping.
//! - `forms`: nested form extraction used by the `getforms` pattern.

pub mod fields;
pub mod forms;
pub mod patterns;
pub mod table;
