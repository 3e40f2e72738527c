// ABOUTME: Process-wide cache of compiled XPath expressions keyed by source text.
// ABOUTME: Pattern queries and paginated runs reuse one compiled expression per string.

//! Expression caching for repeated queries.
//!
//! Pagination re-runs the same query on every page and the pattern library
//! builds the same scoped queries over and over, so compiled expressions are
//! kept behind a `RwLock` and shared as `Arc<XPath>`. Compile failures are
//! cached too.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;

use super::{XPath, XPathError};

type Compiled = Result<Arc<XPath>, XPathError>;

static XPATH_CACHE: Lazy<RwLock<HashMap<String, Compiled>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Gets or compiles an expression, caching the result.
pub fn get_or_compile(expr: &str) -> Compiled {
    {
        let cache = XPATH_CACHE.read().unwrap_or_else(|e| e.into_inner());
        if let Some(cached) = cache.get(expr) {
            return cached.clone();
        }
    }

    let compiled = XPath::parse(expr).map(Arc::new);
    let mut cache = XPATH_CACHE.write().unwrap_or_else(|e| e.into_inner());
    // Another thread may have inserted while we compiled.
    cache
        .entry(expr.to_string())
        .or_insert(compiled)
        .clone()
}
