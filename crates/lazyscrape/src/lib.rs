// ABOUTME: Main library entry point for lazyscrape, the XPath and pattern based HTML record extractor.
// ABOUTME: Re-exports the public API: Scraper, ScraperBuilder, Job, Mode, Pattern, Dataset, ScrapeError and output helpers.

//! lazyscrape - pull structured records out of HTML pages.
//!
//! Pages are fetched (optionally page by page over a numeric range), parsed,
//! and turned into records with a raw XPath expression, a named pattern, or
//! a table walk. Records can then be written as CSV or JSON.
//!
//! # Example
//!
//! ```no_run
//! use lazyscrape::{Job, Mode, OutputFormat, Pattern, ScrapeError, Scraper};
//!
//! fn main() -> Result<(), ScrapeError> {
//!     let scraper = Scraper::builder().build()?;
//!     let job = Job::new("https://example.com/", Mode::Pattern(Pattern::SimpleList))?
//!         .absolutize(true);
//!     let outcome = scraper.run(&job)?;
//!     let format = OutputFormat::Csv.resolve(outcome.json_only);
//!     lazyscrape::write_dataset(std::io::stdout(), &outcome.data, outcome.fields.as_ref(), format)?;
//!     Ok(())
//! }
//! ```

pub mod absolutize;
pub mod dataset;
pub mod error;
pub mod extractors;
pub mod formats;
pub mod options;
pub mod page;
pub mod paginate;
pub mod resource;
pub mod scraper;
pub mod xpath;

pub use crate::dataset::Dataset;
pub use crate::error::{Result, ScrapeError};
pub use crate::extractors::fields::{FieldList, Record};
pub use crate::extractors::forms::FormsReport;
pub use crate::extractors::patterns::{Pattern, Scope};
pub use crate::extractors::table::{Cell, Table};
pub use crate::formats::{write_dataset, OutputFormat};
pub use crate::options::{Options, ScraperBuilder};
pub use crate::page::Page;
pub use crate::paginate::{PageRange, Pagination, StopReason};
pub use crate::resource::cache::{DirCache, MemoryCache, PageCache};
pub use crate::resource::{FetchResult, Fetcher, Method, PageRequest};
pub use crate::scraper::{Job, Mode, Outcome, Scraper};
pub use crate::xpath::{XPath, XPathError};
