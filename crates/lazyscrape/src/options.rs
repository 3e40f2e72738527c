// ABOUTME: Configuration options for lazyscrape: the Options struct and the ScraperBuilder.
// ABOUTME: ScraperBuilder provides a fluent API for constructing Scraper instances with custom settings.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::paginate::DEFAULT_MAX_PAGES;
use crate::resource::cache::{CachingFetcher, PageCache};
use crate::resource::{Fetcher, HttpFetcher, HttpOptions};
use crate::scraper::Scraper;

/// Default user agent, `lscraper/<version>`.
pub fn default_user_agent() -> String {
    format!("lscraper/{}", env!("CARGO_PKG_VERSION"))
}

/// Configuration options for the scraper.
#[derive(Clone)]
pub struct Options {
    pub timeout: Duration,
    pub user_agent: String,
    pub headers: Vec<(String, String)>,
    pub insecure: bool,
    pub max_pages: usize,
    pub cache: Option<Arc<dyn PageCache>>,
    pub fetcher: Option<Arc<dyn Fetcher>>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: default_user_agent(),
            headers: Vec::new(),
            insecure: false,
            max_pages: DEFAULT_MAX_PAGES,
            cache: None,
            fetcher: None,
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .field("headers", &self.headers)
            .field("insecure", &self.insecure)
            .field("max_pages", &self.max_pages)
            .field("cache", &self.cache.is_some())
            .field("fetcher", &self.fetcher.is_some())
            .finish()
    }
}

/// Builder for constructing Scraper instances with custom configuration.
#[derive(Debug, Clone, Default)]
pub struct ScraperBuilder {
    opts: Options,
}

impl ScraperBuilder {
    /// Create a new ScraperBuilder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.opts.timeout = timeout;
        self
    }

    /// Set the User-Agent header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.opts.user_agent = user_agent.into();
        self
    }

    /// Add a custom header to all requests.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.opts.headers.push((key.into(), value.into()));
        self
    }

    /// Accept invalid TLS certificates.
    pub fn insecure(mut self, insecure: bool) -> Self {
        self.opts.insecure = insecure;
        self
    }

    /// Cap on pages fetched by one paginated run. Zero is treated as one.
    pub fn max_pages(mut self, max_pages: usize) -> Self {
        self.opts.max_pages = max_pages;
        self
    }

    /// Read pages through `cache`.
    pub fn cache(mut self, cache: impl PageCache + 'static) -> Self {
        self.opts.cache = Some(Arc::new(cache));
        self
    }

    /// Use a custom fetcher instead of the built-in HTTP client.
    ///
    /// Timeout, user agent, header and TLS settings only apply to the built-in
    /// client.
    pub fn fetcher(mut self, fetcher: impl Fetcher + 'static) -> Self {
        self.opts.fetcher = Some(Arc::new(fetcher));
        self
    }

    /// Build the Scraper with the configured options.
    pub fn build(self) -> Result<Scraper> {
        let opts = self.opts;
        let base: Arc<dyn Fetcher> = match opts.fetcher {
            Some(fetcher) => fetcher,
            None => Arc::new(HttpFetcher::new(&HttpOptions {
                timeout: opts.timeout,
                user_agent: opts.user_agent,
                headers: opts.headers,
                insecure: opts.insecure,
            })?),
        };
        let fetcher: Arc<dyn Fetcher> = match opts.cache {
            Some(cache) => Arc::new(CachingFetcher::new(base, cache)),
            None => base,
        };
        Ok(Scraper::new(fetcher, opts.max_pages))
    }
}
