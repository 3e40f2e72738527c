// ABOUTME: Form extraction: collects each form's attributes and its input, textarea, button and select controls.
// ABOUTME: Output is nested JSON ({total, list}) and cannot be flattened into records.

use scraper::ElementRef;
use serde::Serialize;
use serde_json::{Map, Value};

const FORM_ATTRS: &[&str] = &["name", "id", "action", "class", "method"];
const INPUT_ATTRS: &[&str] = &["name", "id", "type", "class", "value", "src", "size"];
const TEXTAREA_ATTRS: &[&str] = &["name", "id", "size", "class"];
const BUTTON_ATTRS: &[&str] = &["name", "id", "value", "class"];
const SELECT_ATTRS: &[&str] = &["name", "id", "multiple", "size", "class"];
const OPTION_ATTRS: &[&str] = &["value", "selected", "class"];

/// One extracted form: its own attributes plus a list per control tag name.
pub type Form = Map<String, Value>;

/// All forms found across one or more pages.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FormsReport {
    pub total: usize,
    pub list: Vec<Form>,
}

impl FormsReport {
    /// Append another page's forms.
    pub fn merge(&mut self, other: FormsReport) {
        self.total += other.total;
        self.list.extend(other.list);
    }
}

fn control_attrs(tag: &str) -> Option<&'static [&'static str]> {
    match tag {
        "input" => Some(INPUT_ATTRS),
        "textarea" => Some(TEXTAREA_ATTRS),
        "button" => Some(BUTTON_ATTRS),
        "select" => Some(SELECT_ATTRS),
        _ => None,
    }
}

fn copy_attrs(element: ElementRef<'_>, names: &[&str], into: &mut Map<String, Value>) {
    for name in names {
        if let Some(value) = element.value().attr(name) {
            into.insert((*name).to_string(), Value::String(value.to_string()));
        }
    }
}

/// The text before the element's first child element, or null.
fn leading_text(element: ElementRef<'_>) -> Value {
    element
        .first_child()
        .and_then(|node| node.value().as_text().map(|t| Value::String(t.to_string())))
        .unwrap_or(Value::Null)
}

fn control(element: ElementRef<'_>, attrs: &[&str]) -> Map<String, Value> {
    let mut entry = Map::new();
    entry.insert("text".to_string(), leading_text(element));
    copy_attrs(element, attrs, &mut entry);
    entry
}

fn extract_form(form: ElementRef<'_>) -> Form {
    let mut out = Map::new();
    copy_attrs(form, FORM_ATTRS, &mut out);

    for element in form.descendants().skip(1).filter_map(ElementRef::wrap) {
        let tag = element.value().name();
        let Some(attrs) = control_attrs(tag) else {
            continue;
        };
        let mut entry = control(element, attrs);
        if tag == "select" {
            let options = element
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|child| child.value().name() == "option")
                .map(|option| Value::Object(control(option, OPTION_ATTRS)))
                .collect();
            entry.insert("options".to_string(), Value::Array(options));
        }

        let slot = out
            .entry(tag.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(items) = slot {
            items.push(Value::Object(entry));
        }
    }
    out
}

/// Extract every form element in `forms`, in document order.
pub fn extract_forms<'a, I>(forms: I) -> FormsReport
where
    I: IntoIterator<Item = ElementRef<'a>>,
{
    let list: Vec<Form> = forms.into_iter().map(extract_form).collect();
    FormsReport {
        total: list.len(),
        list,
    }
}
