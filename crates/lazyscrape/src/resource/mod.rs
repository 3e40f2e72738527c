// ABOUTME: Resource fetching: page requests, the Fetcher trait and the blocking reqwest implementation.
// ABOUTME: Handles GET/POST, custom headers, content-length limits and charset decoding.

pub mod cache;

use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use tracing::info;
use url::Url;

use crate::error::{Result, ScrapeError};

/// Maximum allowed content length (10 MB).
pub const MAX_CONTENT_LENGTH: usize = 10 * 1024 * 1024;

/// HTTP method for a page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Get => "GET",
            Method::Post => "POST",
        })
    }
}

/// One page to fetch. POST requests send `form` as an urlencoded body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub url: Url,
    pub method: Method,
    pub form: Vec<(String, String)>,
}

impl PageRequest {
    pub fn get(url: Url) -> Self {
        Self {
            url,
            method: Method::Get,
            form: Vec::new(),
        }
    }

    pub fn post(url: Url) -> Self {
        Self {
            url,
            method: Method::Post,
            form: Vec::new(),
        }
    }

    /// The request for page `index` under `key`.
    ///
    /// GET appends `key=index` to the query string, keeping existing pairs.
    /// POST adds it as a form field instead.
    pub fn with_page(&self, key: &str, index: i64) -> Self {
        let mut next = self.clone();
        let value = index.to_string();
        match self.method {
            Method::Get => {
                next.url.query_pairs_mut().append_pair(key, &value);
            }
            Method::Post => next.form.push((key.to_string(), value)),
        }
        next
    }

    /// The form payload as an urlencoded string.
    pub fn encoded_form(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.form.iter())
            .finish()
    }
}

/// Result of a successful fetch operation.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub status: u16,
    pub final_url: Url,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl FetchResult {
    /// Decode the body, using the content-type charset when present.
    pub fn text(&self) -> String {
        decode_body(&self.body, self.content_type.as_deref())
    }
}

/// Anything that can turn a page request into a response body.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, request: &PageRequest) -> Result<FetchResult>;
}

/// Settings for [`HttpFetcher`].
#[derive(Debug, Clone)]
pub struct HttpOptions {
    pub timeout: Duration,
    pub user_agent: String,
    pub headers: Vec<(String, String)>,
    pub insecure: bool,
}

/// Fetcher backed by a blocking reqwest client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    headers: Vec<(String, String)>,
}

impl HttpFetcher {
    pub fn new(opts: &HttpOptions) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(opts.user_agent.clone())
            .timeout(opts.timeout)
            .danger_accept_invalid_certs(opts.insecure)
            .build()
            .map_err(|e| ScrapeError::fetch("<client>", anyhow::anyhow!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            headers: opts.headers.clone(),
        })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, request: &PageRequest) -> Result<FetchResult> {
        let url = request.url.as_str();
        let scheme = request.url.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(ScrapeError::invalid_url(url, "scheme must be http or https"));
        }

        info!(method = %request.method, url, "fetching page");
        let mut builder = match request.method {
            Method::Get => self.client.get(request.url.clone()),
            Method::Post => self.client.post(request.url.clone()).form(&request.form),
        };
        for (key, value) in &self.headers {
            builder = builder.header(key, value);
        }

        let response = builder
            .send()
            .map_err(|e| ScrapeError::fetch(url, anyhow::anyhow!("request failed: {}", e)))?;

        if let Some(len) = response.content_length() {
            if len as usize > MAX_CONTENT_LENGTH {
                return Err(ScrapeError::fetch(url, anyhow::anyhow!("content too large")));
            }
        }

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_lowercase());

        let body = response
            .bytes()
            .map_err(|e| ScrapeError::fetch(url, anyhow::anyhow!("failed to read body: {}", e)))?;
        if body.len() > MAX_CONTENT_LENGTH {
            return Err(ScrapeError::fetch(url, anyhow::anyhow!("content too large")));
        }

        Ok(FetchResult {
            status: status.as_u16(),
            final_url,
            content_type,
            body,
        })
    }
}

/// Decode body bytes to a String using charset from content-type header or detection.
fn decode_body(body: &[u8], content_type: Option<&str>) -> String {
    if let Some(encoding) = content_type
        .and_then(extract_charset)
        .and_then(|charset| encoding_rs::Encoding::for_label(charset.as_bytes()))
    {
        let (decoded, _, _) = encoding.decode(body);
        return decoded.into_owned();
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(body, true);
    let encoding = detector.guess(None, true);
    let (decoded, _, _) = encoding.decode(body);
    decoded.into_owned()
}

/// Extract charset value from Content-Type header.
fn extract_charset(content_type: &str) -> Option<String> {
    content_type
        .to_lowercase()
        .split(';')
        .find_map(|part| part.trim().strip_prefix("charset=").map(str::to_string))
        .map(|charset| charset.trim_matches('"').trim_matches('\'').to_string())
}
