// ABOUTME: Page pairs a parsed HTML document with the URL it was resolved from.
// ABOUTME: Extraction reads a Page for the duration of one call; it is never cached.

use scraper::{ElementRef, Html};
use url::Url;

use crate::xpath::{XPath, XPathError};

/// One fetched and parsed HTML page.
pub struct Page {
    url: Url,
    html: Html,
}

impl Page {
    /// Parse `html` as a full document fetched from `url`.
    pub fn parse(html: &str, url: Url) -> Self {
        Self {
            url,
            html: Html::parse_document(html),
        }
    }

    /// The resolved URL of the response, used as the base for relative links.
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn html(&self) -> &Html {
        &self.html
    }

    /// Elements matching `xpath`, in document order.
    pub fn select(&self, xpath: &XPath) -> Result<Vec<ElementRef<'_>>, XPathError> {
        xpath.select(&self.html)
    }
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page").field("url", &self.url.as_str()).finish()
    }
}
