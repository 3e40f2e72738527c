// ABOUTME: Resolves relative URLs in href/src/srcset fields of extracted records.
// ABOUTME: Uses the loose six-character http(s) prefix test to decide what is already absolute.

use tracing::debug;
use url::Url;

use crate::extractors::fields::{FieldList, Record};

/// Field names whose values are treated as URLs.
pub const URL_FIELDS: &[&str] = &["href", "src", "srcset"];

/// True when `value` starts with `http:/` or `https:`.
///
/// This is a plain prefix test on the first six characters, not scheme
/// parsing: `http:/x` counts as absolute, `ftp://x` and `//cdn/x` do not.
pub fn is_absolute(value: &str) -> bool {
    value.starts_with("http:/") || value.starts_with("https:")
}

/// Whether `fields` names any URL-bearing field.
pub fn has_url_fields(fields: &FieldList) -> bool {
    URL_FIELDS.iter().any(|name| fields.contains(name))
}

/// Resolve relative URL fields of every record against `base`, in place.
///
/// Empty values, absolute values and values that fail to resolve are left as
/// they are.
pub fn absolutize(records: &mut [Record], fields: &FieldList, base: &Url) {
    let present: Vec<&str> = URL_FIELDS
        .iter()
        .copied()
        .filter(|name| fields.contains(name))
        .collect();
    if present.is_empty() {
        return;
    }

    for record in records.iter_mut() {
        for name in &present {
            let Some(value) = record.get_mut(name) else {
                continue;
            };
            if value.is_empty() || is_absolute(value) {
                continue;
            }
            match base.join(value) {
                Ok(resolved) => *value = resolved.to_string(),
                Err(e) => debug!(value = %value, error = %e, "left unresolvable url as is"),
            }
        }
    }
}
