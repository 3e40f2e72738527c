// ABOUTME: The Scraper facade: runs a Job (URL, extraction mode, fields, pagination) to an Outcome.
// ABOUTME: Wires fetch, parse, extraction, URL absolutization and the pagination driver together.

//! Fetch-and-extract orchestration.
//!
//! A [`Job`] names one URL and how to extract from it. [`Scraper::run`]
//! fetches the page (or every page of a [`Pagination`]), parses it, extracts
//! with the job's [`Mode`] and, when asked, absolutizes URL fields against
//! each page's resolved URL.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};
use url::Url;

use crate::absolutize::absolutize;
use crate::dataset::Dataset;
use crate::error::{Result, ScrapeError};
use crate::extractors::fields::{extract_tags, FieldList};
use crate::extractors::patterns::{Pattern, Scope};
use crate::extractors::table::extract_page_table;
use crate::options::ScraperBuilder;
use crate::page::Page;
use crate::paginate::{paginate, Pagination, StopReason};
use crate::resource::{Fetcher, Method, PageRequest};
use crate::xpath::XPath;

/// How records are pulled out of each page.
#[derive(Debug, Clone)]
pub enum Mode {
    /// Elements matched by a raw XPath expression.
    XPath(XPath),
    /// A named pattern from the registry.
    Pattern(Pattern),
    /// The first table matching the job's scope.
    Table,
}

impl Mode {
    /// Field list used when the job gives none.
    pub fn default_fields(&self) -> Option<FieldList> {
        match self {
            Mode::XPath(_) => Some(FieldList::defaults()),
            Mode::Pattern(pattern) => pattern.default_fields(),
            Mode::Table => None,
        }
    }

    pub fn json_only(&self) -> bool {
        match self {
            Mode::Pattern(pattern) => pattern.json_only(),
            _ => false,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::XPath(xpath) => write!(f, "xpath {}", xpath),
            Mode::Pattern(pattern) => write!(f, "pattern {}", pattern),
            Mode::Table => f.write_str("table"),
        }
    }
}

/// One extraction job.
#[derive(Debug, Clone)]
pub struct Job {
    pub url: Url,
    pub method: Method,
    pub mode: Mode,
    /// Overrides the mode's default fields. For tables these are header names.
    pub fields: Option<FieldList>,
    pub scope: Scope,
    pub absolutize: bool,
    pub pagination: Option<Pagination>,
}

impl Job {
    /// A GET job with default fields, no scope and no pagination.
    pub fn new(url: &str, mode: Mode) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| ScrapeError::invalid_url(url, e.to_string()))?;
        Ok(Self {
            url,
            method: Method::Get,
            mode,
            fields: None,
            scope: Scope::default(),
            absolutize: false,
            pagination: None,
        })
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn fields(mut self, fields: FieldList) -> Self {
        self.fields = Some(fields);
        self
    }

    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn absolutize(mut self, absolutize: bool) -> Self {
        self.absolutize = absolutize;
        self
    }

    pub fn paginate(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }

    /// Explicit fields, else the mode's defaults.
    pub fn effective_fields(&self) -> Option<FieldList> {
        self.fields.clone().or_else(|| self.mode.default_fields())
    }
}

/// Result of running a job.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub data: Dataset,
    /// Column names for tabular output, if any.
    pub fields: Option<FieldList>,
    /// The data is nested and must be written as JSON.
    pub json_only: bool,
    pub pages: usize,
    /// Why pagination ended; `None` for single-page jobs.
    pub stop: Option<StopReason>,
}

/// Runs extraction jobs through a fetcher.
#[derive(Clone)]
pub struct Scraper {
    fetcher: Arc<dyn Fetcher>,
    max_pages: usize,
}

impl Scraper {
    pub fn new(fetcher: Arc<dyn Fetcher>, max_pages: usize) -> Self {
        Self { fetcher, max_pages }
    }

    pub fn builder() -> ScraperBuilder {
        ScraperBuilder::new()
    }

    /// Fetch and parse one page.
    pub fn fetch_page(&self, request: &PageRequest) -> Result<Page> {
        let fetched = self.fetcher.fetch(request)?;
        debug!(url = %request.url, final_url = %fetched.final_url, bytes = fetched.body.len(), "fetched page");
        Ok(Page::parse(&fetched.text(), fetched.final_url.clone()))
    }

    /// Extract from an already parsed page.
    pub fn extract(&self, page: &Page, job: &Job, fields: Option<&FieldList>) -> Result<Dataset> {
        let mut data = match &job.mode {
            Mode::XPath(xpath) => {
                let defaults = FieldList::defaults();
                Dataset::Records(extract_tags(page.select(xpath)?, fields.unwrap_or(&defaults)))
            }
            Mode::Pattern(pattern) => pattern.extract(page, &job.scope, fields)?,
            Mode::Table => Dataset::Rows(extract_page_table(page, &job.scope)?),
        };
        if job.absolutize {
            if let (Some(fields), Some(records)) = (fields, data.records_mut()) {
                absolutize(records, fields, page.url());
            }
        }
        Ok(data)
    }

    /// Run `job` to completion.
    ///
    /// A fetch failure on any page aborts the run and discards data gathered
    /// so far.
    pub fn run(&self, job: &Job) -> Result<Outcome> {
        let fields = job.effective_fields();
        let base = PageRequest {
            url: job.url.clone(),
            method: job.method,
            form: Vec::new(),
        };
        info!(url = %job.url, mode = %job.mode, "starting extraction");

        let (data, pages, stop) = match &job.pagination {
            None => {
                let page = self.fetch_page(&base)?;
                (self.extract(&page, job, fields.as_ref())?, 1, None)
            }
            Some(pagination) => {
                let result = paginate(pagination, self.max_pages, |index| {
                    let request = base.with_page(&pagination.page_key, index);
                    let page = self.fetch_page(&request)?;
                    let data = self.extract(&page, job, fields.as_ref())?;
                    info!(url = %request.url, index, items = data.len(), "page extracted");
                    Ok(data)
                })?;
                (result.data, result.pages, Some(result.stop))
            }
        };

        info!(items = data.len(), pages, "extraction finished");
        Ok(Outcome {
            data,
            fields: match job.mode {
                Mode::Table => job.fields.clone(),
                _ => fields,
            },
            json_only: job.mode.json_only(),
            pages,
            stop,
        })
    }
}

impl fmt::Debug for Scraper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scraper")
            .field("max_pages", &self.max_pages)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::table::Cell;
    use crate::paginate::PageRange;
    use crate::resource::FetchResult;
    use bytes::Bytes;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    /// Serves canned HTML keyed by full request URL and records every request.
    #[derive(Default)]
    struct Canned {
        pages: Vec<(String, String)>,
        seen: Mutex<Vec<PageRequest>>,
    }

    impl Canned {
        fn with(mut self, url: &str, body: &str) -> Self {
            self.pages.push((url.to_string(), body.to_string()));
            self
        }
    }

    impl Fetcher for Canned {
        fn fetch(&self, request: &PageRequest) -> Result<FetchResult> {
            self.seen.lock().unwrap().push(request.clone());
            let body = self
                .pages
                .iter()
                .find(|(url, _)| url == request.url.as_str())
                .map(|(_, body)| body.clone())
                .ok_or_else(|| ScrapeError::Status {
                    url: request.url.to_string(),
                    status: 404,
                })?;
            Ok(FetchResult {
                status: 200,
                final_url: request.url.clone(),
                content_type: Some("text/html; charset=utf-8".into()),
                body: Bytes::from(body),
            })
        }
    }

    fn scraper(fetcher: Canned) -> (Scraper, Arc<Canned>) {
        let fetcher = Arc::new(fetcher);
        (Scraper::new(fetcher.clone(), 1000), fetcher)
    }

    #[test]
    fn xpath_job_uses_default_fields() {
        let (scraper, _) = scraper(Canned::default().with(
            "http://site.test/",
            r#"<div class="c" id="i">Hi <b>there</b></div>"#,
        ));
        let job = Job::new("http://site.test/", Mode::XPath("//div".parse().unwrap())).unwrap();
        let outcome = scraper.run(&job).unwrap();
        assert_eq!(outcome.fields.unwrap().to_string(), "_tag,class,id,_text");
        let records = outcome.data.records().unwrap();
        assert_eq!(
            records[0].iter().collect::<Vec<_>>(),
            vec![("_tag", "div"), ("class", "c"), ("id", "i"), ("_text", "Hi there")]
        );
        assert_eq!(outcome.stop, None);
        assert_eq!(outcome.pages, 1);
    }

    #[test]
    fn absolutize_uses_page_url() {
        let (scraper, _) = scraper(Canned::default().with(
            "http://site.test/dir/",
            r#"<ul><li><a href="/page?id=1">One</a></li><li><a href="http://already.test/x">Two</a></li></ul>"#,
        ));
        let job = Job::new("http://site.test/dir/", Mode::Pattern(Pattern::SimpleList))
            .unwrap()
            .absolutize(true);
        let outcome = scraper.run(&job).unwrap();
        let hrefs: Vec<_> = outcome
            .data
            .records()
            .unwrap()
            .iter()
            .map(|r| r.get("href").unwrap().to_string())
            .collect();
        assert_eq!(hrefs, vec!["http://site.test/page?id=1", "http://already.test/x"]);
    }

    #[test]
    fn get_pagination_appends_page_key() {
        let page = |n: usize| "<ul>".to_string() + &"<li><a href='x'>x</a></li>".repeat(n) + "</ul>";
        let (scraper, fetcher) = scraper(
            Canned::default()
                .with("http://site.test/list?q=a&p=1", &page(2))
                .with("http://site.test/list?q=a&p=2", &page(2))
                .with("http://site.test/list?q=a&p=3", &page(1)),
        );
        let job = Job::new("http://site.test/list?q=a", Mode::Pattern(Pattern::SimpleList))
            .unwrap()
            .paginate(Pagination::new("p", PageRange::parse("1,-1,1,2").unwrap()));
        let outcome = scraper.run(&job).unwrap();
        assert_eq!(outcome.data.len(), 5);
        assert_eq!(outcome.pages, 3);
        assert_eq!(outcome.stop, Some(StopReason::ShortPage));
        assert_eq!(fetcher.seen.lock().unwrap().len(), 3);
    }

    #[test]
    fn post_pagination_sends_page_in_form() {
        let (scraper, fetcher) = scraper(
            Canned::default().with("http://site.test/search", "<select><option value='1'>a</option></select>"),
        );
        let job = Job::new("http://site.test/search", Mode::Pattern(Pattern::SimpleOptions))
            .unwrap()
            .method(Method::Post)
            .paginate(Pagination::new("offset", PageRange::parse("0,20,10").unwrap()));
        let outcome = scraper.run(&job).unwrap();
        assert_eq!(outcome.data.len(), 3);
        let forms: Vec<_> = fetcher
            .seen
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.encoded_form())
            .collect();
        assert_eq!(forms, vec!["offset=0", "offset=10", "offset=20"]);
    }

    #[test]
    fn fetch_failure_mid_run_aborts() {
        let (scraper, _) = scraper(
            Canned::default()
                .with("http://site.test/?page=1", "<a href='http://x'>x</a>")
                .with("http://site.test/?page=2", "<a href='http://x'>x</a>"),
        );
        let job = Job::new("http://site.test/", Mode::Pattern(Pattern::ExternalLinks))
            .unwrap()
            .paginate(Pagination::new("page", PageRange::parse("1,5,1").unwrap()));
        let err = scraper.run(&job).unwrap_err();
        assert!(err.is_fetch());
    }

    #[test]
    fn table_job_keeps_only_explicit_fields() {
        let (scraper, _) = scraper(Canned::default().with(
            "http://site.test/t",
            "<table class='grid'><tr><td>a</td><td>/rel</td></tr></table>",
        ));
        let job = Job::new("http://site.test/t", Mode::Table)
            .unwrap()
            .scope(Scope::class("grid"))
            .absolutize(true);
        let outcome = scraper.run(&job).unwrap();
        assert!(outcome.fields.is_none());
        assert_eq!(
            outcome.data,
            Dataset::Rows(vec![vec![Cell::Text("a".into()), Cell::Text("/rel".into())]])
        );
    }

    #[test]
    fn paginated_table_counts_rows_per_page() {
        let table = |page: i64, rows: usize| {
            let body: String = (0..rows)
                .map(|r| format!("<tr><td>{page}.{r}</td></tr>"))
                .collect();
            format!("<table id='results'>{body}</table>")
        };
        let (scraper, fetcher) = scraper(
            Canned::default()
                .with("http://site.test/rows?page=1", &table(1, 2))
                .with("http://site.test/rows?page=2", &table(2, 2))
                .with("http://site.test/rows?page=3", &table(3, 1)),
        );
        let job = Job::new("http://site.test/rows", Mode::Table)
            .unwrap()
            .scope(Scope::id("results"))
            .paginate(Pagination::new("page", PageRange::parse("1,-1,1,2").unwrap()));
        let outcome = scraper.run(&job).unwrap();

        assert_eq!(outcome.pages, 3);
        assert_eq!(outcome.stop, Some(StopReason::ShortPage));
        assert_eq!(fetcher.seen.lock().unwrap().len(), 3);
        let Dataset::Rows(rows) = outcome.data else {
            panic!("expected table rows");
        };
        let firsts: Vec<String> = rows.iter().map(|row| row[0].to_flat_string()).collect();
        assert_eq!(firsts, vec!["1.0", "1.1", "2.0", "2.1", "3.0"]);
    }

    #[test]
    fn forms_job_is_json_only() {
        let (scraper, _) = scraper(Canned::default().with("http://site.test/f", "<form id='f'></form>"));
        let job = Job::new("http://site.test/f", Mode::Pattern(Pattern::Forms)).unwrap();
        let outcome = scraper.run(&job).unwrap();
        assert!(outcome.json_only);
        assert!(outcome.fields.is_none());
        assert_eq!(outcome.data.len(), 1);
    }

    #[test]
    fn invalid_job_url() {
        let err = Job::new("not a url", Mode::Table).unwrap_err();
        assert!(matches!(err, ScrapeError::InvalidUrl { .. }));
    }
}
