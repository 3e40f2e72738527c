// ABOUTME: Optional page cache: the PageCache trait, directory and in-memory stores, and a caching Fetcher.
// ABOUTME: Keys are BLAKE3 hashes of the request URL plus the form payload for POST requests.

//! Read-through page cache.
//!
//! A [`CachingFetcher`] wraps another [`Fetcher`]. On a hit it replays the
//! stored body and final URL; on a miss it fetches, decodes and stores the
//! page. Cache read failures count as misses and write failures are logged,
//! so a broken cache never fails a run.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::{Duration, SystemTime};

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use super::{FetchResult, Fetcher, Method, PageRequest};
use crate::error::{Result, ScrapeError};

/// Byte store keyed by hex strings.
pub trait PageCache: Send + Sync {
    fn get(&self, key: &str) -> Option<Vec<u8>>;
    fn set(&self, key: &str, value: &[u8]) -> Result<()>;
}

/// Cache key for `request`: BLAKE3 of the URL, plus the encoded form for POST.
pub fn cache_key(request: &PageRequest) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(request.url.as_str().as_bytes());
    if request.method == Method::Post {
        hasher.update(b"\n");
        hasher.update(request.encoded_form().as_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// One file per key under a directory, optionally expiring by modification time.
#[derive(Debug, Clone)]
pub struct DirCache {
    dir: PathBuf,
    ttl: Option<Duration>,
}

impl DirCache {
    /// Open (and create) the cache directory.
    pub fn open(dir: impl AsRef<Path>, ttl: Option<Duration>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| {
            ScrapeError::Cache(anyhow::anyhow!("cannot create {}: {}", dir.display(), e))
        })?;
        Ok(Self { dir, ttl })
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn expired(&self, path: &Path) -> bool {
        let Some(ttl) = self.ttl else {
            return false;
        };
        fs::metadata(path)
            .and_then(|meta| meta.modified())
            .ok()
            .and_then(|modified| SystemTime::now().duration_since(modified).ok())
            .is_some_and(|age| age > ttl)
    }
}

impl PageCache for DirCache {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        let path = self.path(key);
        if self.expired(&path) {
            debug!(key, "cache entry expired");
            return None;
        }
        fs::read(&path).ok()
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        fs::write(self.path(key), value)?;
        Ok(())
    }
}

/// Process-local cache, mostly for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PageCache for MemoryCache {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.read().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    final_url: String,
    body: String,
}

/// Fetcher that consults a [`PageCache`] before delegating.
pub struct CachingFetcher {
    inner: Arc<dyn Fetcher>,
    cache: Arc<dyn PageCache>,
}

impl CachingFetcher {
    pub fn new(inner: Arc<dyn Fetcher>, cache: Arc<dyn PageCache>) -> Self {
        Self { inner, cache }
    }

    fn lookup(&self, key: &str) -> Option<FetchResult> {
        let raw = self.cache.get(key)?;
        let entry: CacheEntry = match serde_json::from_slice(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                debug!(key, error = %e, "ignoring unreadable cache entry");
                return None;
            }
        };
        let final_url = Url::parse(&entry.final_url).ok()?;
        Some(FetchResult {
            status: 200,
            final_url,
            content_type: Some("text/html; charset=utf-8".to_string()),
            body: Bytes::from(entry.body),
        })
    }
}

impl Fetcher for CachingFetcher {
    fn fetch(&self, request: &PageRequest) -> Result<FetchResult> {
        let key = cache_key(request);
        if let Some(hit) = self.lookup(&key) {
            debug!(url = %request.url, key = %key, "cache hit");
            return Ok(hit);
        }
        debug!(url = %request.url, key = %key, "cache miss");

        let fetched = self.inner.fetch(request)?;
        let entry = CacheEntry {
            final_url: fetched.final_url.to_string(),
            body: fetched.text(),
        };
        let stored = serde_json::to_vec(&entry)
            .map_err(ScrapeError::from)
            .and_then(|bytes| self.cache.set(&key, &bytes));
        if let Err(e) = stored {
            warn!(url = %request.url, error = %e, "failed to write cache entry");
        }
        Ok(fetched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        calls: Arc<AtomicUsize>,
    }

    impl Fetcher for Counting {
        fn fetch(&self, request: &PageRequest) -> Result<FetchResult> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(FetchResult {
                status: 200,
                final_url: request.url.join("final").unwrap(),
                content_type: Some("text/html".into()),
                body: Bytes::from(format!("<p>{n}</p>")),
            })
        }
    }

    fn request(url: &str) -> PageRequest {
        PageRequest::get(Url::parse(url).unwrap())
    }

    #[test]
    fn key_depends_on_post_payload() {
        let get = request("http://site.test/a");
        let post = PageRequest::post(get.url.clone());
        assert_eq!(cache_key(&get), cache_key(&get.clone()));
        assert_ne!(cache_key(&get), cache_key(&post));
        assert_ne!(
            cache_key(&post.with_page("p", 1)),
            cache_key(&post.with_page("p", 2))
        );
        assert_eq!(cache_key(&get).len(), 64);
    }

    #[test]
    fn second_fetch_is_served_from_cache() {
        let calls = Arc::new(AtomicUsize::new(0));
        let fetcher = CachingFetcher::new(
            Arc::new(Counting { calls: calls.clone() }),
            Arc::new(MemoryCache::new()),
        );
        let req = request("http://site.test/dir/page");
        let first = fetcher.fetch(&req).unwrap();
        let second = fetcher.fetch(&req).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first.text(), second.text());
        assert_eq!(second.final_url.as_str(), "http://site.test/dir/final");
    }

    #[test]
    fn dir_cache_round_trips_and_expires() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = DirCache::open(tmp.path().join("nested"), None).unwrap();
        cache.set("abc", b"payload").unwrap();
        assert_eq!(cache.get("abc").as_deref(), Some(&b"payload"[..]));
        assert!(cache.get("missing").is_none());

        let expiring = DirCache::open(tmp.path().join("nested"), Some(Duration::ZERO)).unwrap();
        std::thread::sleep(Duration::from_millis(20));
        assert!(expiring.get("abc").is_none());
    }

    #[test]
    fn corrupt_entry_is_a_miss() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = MemoryCache::new();
        let req = request("http://site.test/x");
        cache.set(&cache_key(&req), b"not json").unwrap();
        let fetcher = CachingFetcher::new(Arc::new(Counting { calls: calls.clone() }), Arc::new(cache));
        fetcher.fetch(&req).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
