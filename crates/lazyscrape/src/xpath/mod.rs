// ABOUTME: XPath 1.0 lookup over HTML pages, evaluated by sxd_xpath on a mirror of scraper's tree.
// ABOUTME: Exposes the XPath type, its error enum, and literal quoting for scoped queries.

//! XPath support for HTML documents.
//!
//! Pages are parsed by `scraper` (html5ever), which repairs the markup the
//! way browsers do. For evaluation the parsed tree is copied into an
//! `sxd_document` and the expression runs through `sxd_xpath`, so the full
//! XPath 1.0 language is available: every axis, the core function library,
//! arithmetic and unions. Matches are mapped back to `scraper` elements.
//!
//! Names are matched as the HTML parser stores them, which is lowercase.
//! Expressions must select elements; a result that is a string, number,
//! boolean, or contains text or attribute nodes is an
//! [`XPathError::NotElements`].

pub mod compiled;
mod mirror;

use std::fmt;
use std::str::FromStr;

use scraper::{ElementRef, Html};
use sxd_document::Package;
use sxd_xpath::{Context, Factory, Value};
use thiserror::Error;

use self::mirror::Mirror;

/// Errors produced while compiling or evaluating an XPath expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum XPathError {
    #[error("empty XPath expression")]
    Empty,

    #[error("XPath syntax error in '{expr}': {message}")]
    Syntax { expr: String, message: String },

    #[error("XPath evaluation of '{expr}' failed: {message}")]
    Evaluation { expr: String, message: String },

    #[error("XPath '{expr}' must select elements")]
    NotElements { expr: String },
}

/// An XPath expression that is known to compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XPath {
    source: String,
}

impl XPath {
    /// Compile an expression.
    pub fn parse(expr: &str) -> Result<Self, XPathError> {
        let source = expr.trim().to_string();
        compile(&source)?;
        Ok(Self { source })
    }

    /// The source text this expression was compiled from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Evaluate against the document root, returning matched elements in document order.
    pub fn select<'a>(&self, html: &'a Html) -> Result<Vec<ElementRef<'a>>, XPathError> {
        let compiled = compile(&self.source)?;
        let package = Package::new();
        let document = package.as_document();
        let mirror = Mirror::build(&document, html);

        let context = Context::new();
        let value = compiled
            .evaluate(&context, document.root())
            .map_err(|e| XPathError::Evaluation {
                expr: self.source.clone(),
                message: e.to_string(),
            })?;

        let Value::Nodeset(nodes) = value else {
            return Err(self.not_elements());
        };
        nodes
            .document_order()
            .into_iter()
            .map(|node| mirror.element(html, node).ok_or_else(|| self.not_elements()))
            .collect()
    }

    fn not_elements(&self) -> XPathError {
        XPathError::NotElements {
            expr: self.source.clone(),
        }
    }
}

fn compile(source: &str) -> Result<sxd_xpath::XPath, XPathError> {
    if source.is_empty() {
        return Err(XPathError::Empty);
    }
    Factory::new()
        .build(source)
        .map_err(|e| XPathError::Syntax {
            expr: source.to_string(),
            message: e.to_string(),
        })?
        .ok_or(XPathError::Empty)
}

impl FromStr for XPath {
    type Err = XPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        XPath::parse(s)
    }
}

impl fmt::Display for XPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Quote `value` as an XPath string literal.
///
/// XPath 1.0 has no escape sequences, so a value containing both quote
/// characters cannot be written as a single literal and yields `None`.
pub fn literal(value: &str) -> Option<String> {
    if !value.contains('\'') {
        Some(format!("'{}'", value))
    } else if !value.contains('"') {
        Some(format!("\"{}\"", value))
    } else {
        None
    }
}
