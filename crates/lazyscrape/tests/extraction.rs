// ABOUTME: Fixture-based tests running every extraction mode against a saved catalog page.
// ABOUTME: Covers pattern defaults, scoping, absolutization, tables, forms and rendered output.

use lazyscrape::absolutize::absolutize;
use lazyscrape::{
    write_dataset, Cell, Dataset, FieldList, OutputFormat, Page, Pattern, Record, Scope, XPath,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::fs;
use url::Url;

fn load_html_fixture(name: &str) -> String {
    let path = format!(
        "{}/tests/fixtures/html/{}.html",
        env!("CARGO_MANIFEST_DIR"),
        name
    );
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("failed to read {}: {}", path, e))
}

fn catalog() -> Page {
    Page::parse(
        &load_html_fixture("catalog"),
        Url::parse("http://shop.test/catalog/").unwrap(),
    )
}

fn records(data: Dataset) -> Vec<Record> {
    match data {
        Dataset::Records(records) => records,
        other => panic!("expected records, got {:?}", other),
    }
}

fn column(records: &[Record], field: &str) -> Vec<String> {
    records
        .iter()
        .map(|r| r.get(field).unwrap_or_default().to_string())
        .collect()
}

fn text(s: &str) -> Cell {
    Cell::Text(s.to_string())
}

#[test]
fn simple_list_reproduces_default_columns() {
    let page = catalog();
    let records = records(
        Pattern::SimpleList
            .extract(&page, &Scope::default(), None)
            .unwrap(),
    );
    assert_eq!(records.len(), 5);
    for record in &records {
        let keys: Vec<&str> = record.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["_text", "href"]);
    }
    assert_eq!(
        column(&records, "_text"),
        vec!["Home", "Catalog", "Blog", "Books and Magazines", "Music"]
    );
}

#[test]
fn scoped_list_with_absolutized_links() {
    let page = catalog();
    let fields = FieldList::parse("_text,href,title");
    let mut found = records(
        Pattern::SimpleList
            .extract(&page, &Scope::id("categories"), Some(&fields))
            .unwrap(),
    );
    absolutize(&mut found, &fields, page.url());
    assert_eq!(
        column(&found, "href"),
        vec![
            "http://shop.test/catalog/books.html",
            "http://shop.test/catalog/music.html"
        ]
    );
    assert_eq!(column(&found, "title"), vec!["Books", ""]);
}

#[test]
fn class_scope_wins_over_id() {
    let page = catalog();
    let scope = Scope::new(Some("nav".into()), Some("categories".into()));
    let found = records(Pattern::SimpleList.extract(&page, &scope, None).unwrap());
    assert_eq!(column(&found, "href"), vec!["/", "/catalog/", "https://blog.example.org/"]);
}

#[test]
fn external_links_keep_http_prefixes_only() {
    let page = catalog();
    let found = records(
        Pattern::ExternalLinks
            .extract(&page, &Scope::default(), None)
            .unwrap(),
    );
    assert_eq!(
        column(&found, "href"),
        vec!["https://blog.example.org/", "http://partner.example.net/"]
    );
}

#[test]
fn select_options() {
    let page = catalog();
    let found = records(
        Pattern::SimpleOptions
            .extract(&page, &Scope::id("sort"), None)
            .unwrap(),
    );
    assert_eq!(column(&found, "value"), vec!["relevance", "price", "date"]);
    assert_eq!(column(&found, "_text"), vec!["Relevance", "Price", "Newest"]);
}

#[test]
fn raw_xpath_with_default_fields() {
    let page = catalog();
    let xpath = XPath::parse("//p[@class='footer']/*").unwrap();
    let found = lazyscrape::extractors::fields::extract_tags(page.select(&xpath).unwrap(), &FieldList::defaults());
    assert_eq!(column(&found, "_tag"), vec!["a", "a", "a", "img"]);
    assert_eq!(column(&found, "_text")[3], "");
}

#[test]
fn price_table_skips_header_and_nests_variants() {
    let page = catalog();
    let table = lazyscrape::extractors::table::extract_page_table(&page, &Scope::class("prices")).unwrap();
    assert_eq!(
        table,
        vec![
            vec![text("Notebook"), text("4.50"), text("-")],
            vec![
                text("Pen"),
                text("1.20"),
                Cell::Tables(vec![vec![
                    vec![text("blue"), text("0.00")],
                    vec![text("red"), text("0.10")],
                ]]),
            ],
        ]
    );
}

#[test]
fn forms_report() {
    let page = catalog();
    let data = Pattern::Forms.extract(&page, &Scope::default(), None).unwrap();
    let value = serde_json::to_value(&data).unwrap();
    assert_eq!(value["total"], json!(1));
    let form = &value["list"][0];
    assert_eq!(form["name"], json!("search"));
    assert_eq!(form["action"], json!("/search"));
    assert_eq!(form["class"], json!("inline"));
    assert_eq!(
        form["input"],
        json!([{"text": null, "type": "text", "name": "q", "size": "30"}])
    );
    assert_eq!(form["button"][0]["text"], json!("Search"));
    let options = form["select"][0]["options"].as_array().unwrap();
    assert_eq!(options.len(), 3);
    assert_eq!(options[0]["selected"], json!(""));
    assert_eq!(options[2]["class"], json!("muted"));
}

#[test]
fn scoped_list_as_csv() {
    let page = catalog();
    let data = Pattern::SimpleList
        .extract(&page, &Scope::id("categories"), None)
        .unwrap();
    let fields = Pattern::SimpleList.default_fields();
    let mut out = Vec::new();
    write_dataset(&mut out, &data, fields.as_ref(), OutputFormat::Csv).unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "_text,href\nBooks and Magazines,books.html\nMusic,music.html\n"
    );
}
