// ABOUTME: The fixed registry of named extraction patterns and the class/id scope they share.
// ABOUTME: Patterns build scoped XPath queries, run them, and shape the matches into a Dataset.

//! Built-in extraction patterns.
//!
//! | name        | alias            | selects                          |
//! |-------------|------------------|----------------------------------|
//! | `simpleul`  | `simple-list`    | `//ul/li//a`                     |
//! | `simpleopt` | `simple-options` | `//select/option`                |
//! | `exturls`   | `external-links` | `//a` with an http(s) href       |
//! | `getforms`  | `forms`          | every `form` and its controls    |
//!
//! The first three accept a class or id scope applied to their outer element.
//! When both are given the class wins.

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::absolutize::is_absolute;
use crate::dataset::Dataset;
use crate::error::{Result, ScrapeError};
use crate::extractors::fields::{
    extract_tags, FieldList, DEFAULT_SELECT_FIELDS, DEFAULT_URL_FIELDS,
};
use crate::extractors::forms::extract_forms;
use crate::page::Page;
use crate::xpath::{self, compiled::get_or_compile};

/// Optional class or id restriction on a pattern's outer element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    pub class: Option<String>,
    pub id: Option<String>,
}

impl Scope {
    pub fn new(class: Option<String>, id: Option<String>) -> Self {
        Self { class, id }
    }

    pub fn class(class: impl Into<String>) -> Self {
        Self {
            class: Some(class.into()),
            id: None,
        }
    }

    pub fn id(id: impl Into<String>) -> Self {
        Self {
            class: None,
            id: Some(id.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.class.is_none() && self.id.is_none()
    }

    /// The predicate for this scope, e.g. `[@class='menu']`, or `""` when unscoped.
    pub fn predicate(&self) -> Result<String> {
        let (attr, value) = match (&self.class, &self.id) {
            (Some(class), _) => ("class", class),
            (None, Some(id)) => ("id", id),
            (None, None) => return Ok(String::new()),
        };
        let quoted = xpath::literal(value).ok_or_else(|| {
            ScrapeError::InvalidSelector(format!(
                "{attr} value {value:?} contains both quote characters"
            ))
        })?;
        Ok(format!("[@{attr}={quoted}]"))
    }

    /// `head` + predicate + `tail`.
    pub fn query(&self, head: &str, tail: &str) -> Result<String> {
        Ok(format!("{head}{}{tail}", self.predicate()?))
    }
}

/// A named extraction strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pattern {
    SimpleList,
    SimpleOptions,
    ExternalLinks,
    Forms,
}

impl Pattern {
    pub const ALL: [Pattern; 4] = [
        Pattern::SimpleList,
        Pattern::SimpleOptions,
        Pattern::ExternalLinks,
        Pattern::Forms,
    ];

    /// Look up a pattern by registry name or alias.
    pub fn lookup(name: &str) -> Result<Self> {
        let wanted = name.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.name() == wanted || p.alias() == wanted)
            .ok_or_else(|| ScrapeError::UnknownPattern(wanted.to_string()))
    }

    pub fn name(self) -> &'static str {
        match self {
            Pattern::SimpleList => "simpleul",
            Pattern::SimpleOptions => "simpleopt",
            Pattern::ExternalLinks => "exturls",
            Pattern::Forms => "getforms",
        }
    }

    pub fn alias(self) -> &'static str {
        match self {
            Pattern::SimpleList => "simple-list",
            Pattern::SimpleOptions => "simple-options",
            Pattern::ExternalLinks => "external-links",
            Pattern::Forms => "forms",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Pattern::SimpleList => "Links inside unordered list items",
            Pattern::SimpleOptions => "Options of select elements",
            Pattern::ExternalLinks => "Links with an absolute http(s) href",
            Pattern::Forms => "Web forms with their inputs, textareas, buttons and selects",
        }
    }

    /// Field list used when the caller gives none. Forms have no flat fields.
    pub fn default_fields(self) -> Option<FieldList> {
        match self {
            Pattern::SimpleList | Pattern::ExternalLinks => {
                Some(FieldList::new(DEFAULT_URL_FIELDS.iter().copied()))
            }
            Pattern::SimpleOptions => Some(FieldList::new(DEFAULT_SELECT_FIELDS.iter().copied())),
            Pattern::Forms => None,
        }
    }

    /// Whether the output is nested and can only be written as JSON.
    pub fn json_only(self) -> bool {
        matches!(self, Pattern::Forms)
    }

    fn query(self, scope: &Scope) -> Result<String> {
        match self {
            Pattern::SimpleList => scope.query("//ul", "/li//a"),
            Pattern::SimpleOptions => scope.query("//select", "/option"),
            Pattern::ExternalLinks => scope.query("//a", ""),
            Pattern::Forms => Ok("//form".to_string()),
        }
    }

    /// Run the pattern on `page`.
    ///
    /// `fields` falls back to [`Pattern::default_fields`] when `None`; it is
    /// ignored by [`Pattern::Forms`].
    pub fn extract(self, page: &Page, scope: &Scope, fields: Option<&FieldList>) -> Result<Dataset> {
        let query = self.query(scope)?;
        debug!(pattern = self.name(), query = %query, "running pattern");
        let xpath = get_or_compile(&query)?;
        let matched = page.select(&xpath)?;

        if self == Pattern::Forms {
            return Ok(Dataset::Forms(extract_forms(matched)));
        }

        let defaults = self.default_fields().unwrap_or_default();
        let fields = fields.unwrap_or(&defaults);
        let elements: Vec<_> = match self {
            Pattern::ExternalLinks => matched
                .into_iter()
                .filter(|a| a.value().attr("href").is_some_and(is_absolute))
                .collect(),
            _ => matched,
        };
        Ok(Dataset::Records(extract_tags(elements, fields)))
    }
}

impl FromStr for Pattern {
    type Err = ScrapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pattern::lookup(s)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
