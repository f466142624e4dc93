//! Static asset fetchers.
//!
//! The dashboard reads every dataset as a same-origin static file. The
//! [`Fetcher`] trait abstracts over where those files come from so the
//! pipeline runs the same against HTTP, the local filesystem, or memory.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::DatasetError;

/// Source of static text assets (CSV and `GeoJSON` files).
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches the asset at `path` as text.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError`] if the asset cannot be retrieved.
    async fn fetch_text(&self, path: &str) -> Result<String, DatasetError>;
}

/// Fetches assets over HTTP, resolving relative paths against a base URL.
pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFetcher {
    /// Creates a fetcher rooted at `base_url`.
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Resolves `path` to an absolute URL. Absolute URLs pass through.
    #[must_use]
    pub fn resolve(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch_text(&self, path: &str) -> Result<String, DatasetError> {
        let url = self.resolve(path);
        log::debug!("GET {url}");

        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(DatasetError::Status {
                path: url,
                status: resp.status().as_u16(),
            });
        }

        let body = resp.text().await?;
        log::debug!("Downloaded {} bytes from {url}", body.len());
        Ok(body)
    }
}

/// Reads assets from a directory on the local filesystem.
pub struct FileFetcher {
    root: PathBuf,
}

impl FileFetcher {
    /// Creates a fetcher that resolves paths under `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl Fetcher for FileFetcher {
    async fn fetch_text(&self, path: &str) -> Result<String, DatasetError> {
        let full = self.root.join(path.trim_start_matches('/'));
        log::debug!("Reading {}", full.display());
        Ok(tokio::fs::read_to_string(&full).await?)
    }
}

/// In-memory asset store that counts how often each path is fetched.
///
/// Paths without an entry fail with a `404` status, mirroring a missing
/// static file.
#[derive(Default)]
pub struct MemoryFetcher {
    files: Mutex<BTreeMap<String, String>>,
    fetches: Mutex<BTreeMap<String, usize>>,
}

impl MemoryFetcher {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) an asset, returning `self` for chaining.
    #[must_use]
    pub fn with_file(self, path: impl Into<String>, contents: impl Into<String>) -> Self {
        self.insert(path, contents);
        self
    }

    /// Adds or replaces an asset.
    pub fn insert(&self, path: impl Into<String>, contents: impl Into<String>) {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.into(), contents.into());
    }

    /// Removes an asset so later fetches fail.
    pub fn remove(&self, path: &str) {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(path);
    }

    /// Number of fetch attempts made for `path`, successful or not.
    #[must_use]
    pub fn fetch_count(&self, path: &str) -> usize {
        self.fetches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl Fetcher for MemoryFetcher {
    async fn fetch_text(&self, path: &str) -> Result<String, DatasetError> {
        *self
            .fetches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(path.to_string())
            .or_insert(0) += 1;

        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .cloned()
            .ok_or_else(|| DatasetError::Status {
                path: path.to_string(),
                status: 404,
            })
    }
}
