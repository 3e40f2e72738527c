// ABOUTME: Field lists, flat records, and the per-element field selector.
// ABOUTME: Resolves _tag/_text pseudo-fields and literal attributes into one Record per element.

//! Field selection for matched elements.
//!
//! A [`FieldList`] names the columns to pull from each element. Two names are
//! reserved:
//! - `_tag` yields the element's tag name.
//! - `_text` yields all descendant text, whitespace-collapsed and trimmed.
//!
//! Every other name is read as an attribute. A missing attribute resolves to
//! an empty string, so selection never fails.

use std::fmt;

use scraper::ElementRef;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Pseudo-field holding the element's concatenated text.
pub const TEXT_FIELD: &str = "_text";
/// Pseudo-field holding the element's tag name.
pub const TAG_FIELD: &str = "_tag";

/// Defaults for raw XPath extraction.
pub const DEFAULT_FIELDS: &[&str] = &[TAG_FIELD, "class", "id", TEXT_FIELD];
/// Defaults for link-shaped patterns.
pub const DEFAULT_URL_FIELDS: &[&str] = &[TEXT_FIELD, "href"];
/// Defaults for option-shaped patterns.
pub const DEFAULT_SELECT_FIELDS: &[&str] = &[TEXT_FIELD, "value"];

/// Ordered list of requested field names. Duplicates are kept; they collapse
/// into one key when a record is built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldList(Vec<String>);

impl FieldList {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    /// Parse a comma-separated list such as `"src,alt,href,_text"`.
    pub fn parse(spec: &str) -> Self {
        Self::new(
            spec.split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty()),
        )
    }

    pub fn defaults() -> Self {
        Self::new(DEFAULT_FIELDS.iter().copied())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|f| f == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FieldList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(","))
    }
}

/// One extracted row: field name to string value, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    entries: Vec<(String, String)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value; an existing key is overwritten in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut String> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Collapses runs of whitespace (including CR/LF) into single spaces and trims.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Descendant text nodes joined with a space, whitespace-collapsed.
pub fn element_text(element: ElementRef<'_>) -> String {
    normalize_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

/// Build one record from `element` for every name in `fields`.
pub fn select_fields(element: ElementRef<'_>, fields: &FieldList) -> Record {
    let mut record = Record::new();
    for name in fields.iter() {
        let value = match name {
            TAG_FIELD => element.value().name().to_string(),
            TEXT_FIELD => element_text(element),
            attr => element
                .value()
                .attr(attr)
                .map(|v| v.trim().to_string())
                .unwrap_or_default(),
        };
        record.insert(name, value);
    }
    record
}

/// Apply [`select_fields`] to each element, preserving order and count.
pub fn extract_tags<'a, I>(elements: I, fields: &FieldList) -> Vec<Record>
where
    I: IntoIterator<Item = ElementRef<'a>>,
{
    elements
        .into_iter()
        .map(|el| select_fields(el, fields))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use scraper::{Html, Selector};

    fn first<'a>(html: &'a Html, css: &str) -> ElementRef<'a> {
        html.select(&Selector::parse(css).unwrap()).next().unwrap()
    }

    #[test]
    fn text_field_collapses_whitespace() {
        let html = Html::parse_fragment("<p>  a\n b  </p>");
        let record = select_fields(first(&html, "p"), &FieldList::parse("_text"));
        assert_eq!(record.get(TEXT_FIELD), Some("a b"));
    }

    #[test]
    fn text_field_joins_nested_text_with_space() {
        let html = Html::parse_fragment("<p>Hello<b>big</b>\r\n world</p>");
        let record = select_fields(first(&html, "p"), &FieldList::parse("_text"));
        assert_eq!(record.get(TEXT_FIELD), Some("Hello big world"));
    }

    #[test]
    fn missing_attribute_is_empty_string() {
        let html = Html::parse_fragment(r#"<a href="/x">x</a>"#);
        let record = select_fields(first(&html, "a"), &FieldList::parse("title,href"));
        assert_eq!(record.get("title"), Some(""));
        assert_eq!(record.get("href"), Some("/x"));
    }

    #[test]
    fn attributes_are_trimmed_and_tag_reported() {
        let html = Html::parse_fragment(r#"<img src="  /a.png " alt="A">"#);
        let record = select_fields(first(&html, "img"), &FieldList::parse("_tag,src,alt"));
        let pairs: Vec<(&str, &str)> = record.iter().collect();
        assert_eq!(pairs, vec![("_tag", "img"), ("src", "/a.png"), ("alt", "A")]);
    }

    #[test]
    fn duplicate_fields_overwrite_in_place() {
        let html = Html::parse_fragment(r#"<a id="i" href="/h">t</a>"#);
        let record = select_fields(first(&html, "a"), &FieldList::parse("href,id,href"));
        assert_eq!(record.len(), 2);
        let keys: Vec<&str> = record.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["href", "id"]);
    }

    #[test]
    fn extract_tags_preserves_order_and_length() {
        let html = Html::parse_fragment(r#"<a href="1">a</a><a>b</a><a href="3">c</a>"#);
        let anchors: Vec<_> = html.select(&Selector::parse("a").unwrap()).collect();
        let records = extract_tags(anchors, &FieldList::parse("_text,href"));
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].get("href"), Some(""));
        assert_eq!(records[2].get(TEXT_FIELD), Some("c"));
    }

    #[test]
    fn field_list_parsing_trims_and_drops_empty() {
        let fields = FieldList::parse(" src, ,alt ,");
        assert_eq!(fields.iter().collect::<Vec<_>>(), vec!["src", "alt"]);
        assert_eq!(fields.to_string(), "src,alt");
    }

    #[test]
    fn record_serializes_in_insertion_order() {
        let record: Record = vec![("b", "2"), ("a", "1")].into_iter().collect();
        assert_eq!(serde_json::to_string(&record).unwrap(), r#"{"b":"2","a":"1"}"#);
    }
}
