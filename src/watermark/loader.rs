//! Resource loading for background and watermark images.
//!
//! # Supported Sources
//!
//! - `assets/logo.png`, `asset://logo.png` - bundled asset under the assets dir
//! - `https://example.com/image.png` - remote resource (non-2xx is a failure)
//! - `file:///tmp/image.png`, `/tmp/image.png` - local file
//! - `data:image/png;base64,...` - inline data
//!
//! Any other `scheme://path` is treated as a bundled asset, the way mobile
//! bundlers hand out resource references.
//!
//! # Caching
//!
//! [`CachingLoader`] keeps raw bytes of remote and bundled resources in an
//! in-memory cache with a TTL; local files and inline data are never cached.

use async_trait::async_trait;
use base64::Engine;
use moka::future::Cache;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{MarkerError, MarkerResult};

/// Parsed resource location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceUri {
    /// Path relative to the assets directory
    Asset(PathBuf),
    /// http(s) URL
    Remote(String),
    /// Local filesystem path
    File(PathBuf),
    /// Base64 payload of a `data:` URI
    Inline(String),
}

impl ResourceUri {
    /// Parse a source string.
    ///
    /// # Errors
    ///
    /// Returns `LoadImageFailed` for empty sources, non-base64 `data:` URIs
    /// and asset paths that escape the assets directory.
    pub fn parse(source: &str) -> MarkerResult<Self> {
        let source = source.trim();
        if source.is_empty() {
            return Err(MarkerError::load_failed(source, "empty source"));
        }

        if source.starts_with("http://") || source.starts_with("https://") {
            return Ok(Self::Remote(source.to_string()));
        }

        if let Some(rest) = source.strip_prefix("data:") {
            let (meta, payload) = rest
                .split_once(',')
                .ok_or_else(|| MarkerError::load_failed(truncate(source), "malformed data uri"))?;
            if !meta.ends_with(";base64") {
                return Err(MarkerError::load_failed(
                    truncate(source),
                    "only base64 data uris are supported",
                ));
            }
            return Ok(Self::Inline(payload.to_string()));
        }

        if let Some(path) = source.strip_prefix("file://") {
            return Ok(Self::File(PathBuf::from(path)));
        }

        let asset = if let Some(rest) = source.strip_prefix("assets/") {
            Some(rest)
        } else if let Some(idx) = source.find("://").filter(|i| *i > 0) {
            Some(&source[idx + 3..])
        } else {
            None
        };

        match asset {
            Some(rest) => Ok(Self::Asset(safe_relative(source, rest)?)),
            None => Ok(Self::File(PathBuf::from(source))),
        }
    }

    /// Whether bytes from this location may be cached.
    pub fn is_cacheable(&self) -> bool {
        matches!(self, Self::Asset(_) | Self::Remote(_))
    }
}

fn truncate(source: &str) -> &str {
    match source.char_indices().nth(48) {
        Some((idx, _)) => &source[..idx],
        None => source,
    }
}

fn safe_relative(source: &str, rest: &str) -> MarkerResult<PathBuf> {
    let path = PathBuf::from(rest);
    let escapes = path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if rest.is_empty() || escapes {
        return Err(MarkerError::load_failed(
            source,
            "asset path must stay inside the assets directory",
        ));
    }
    Ok(path)
}

/// Source of raw resource bytes.
#[async_trait]
pub trait ResourceLoader: Send + Sync {
    /// Load the bytes behind `uri`.
    async fn load(&self, uri: &str) -> MarkerResult<Vec<u8>>;
}

/// Loader for every [`ResourceUri`] kind.
#[derive(Clone)]
pub struct DefaultResourceLoader {
    assets_dir: PathBuf,
    http_client: reqwest::Client,
}

impl std::fmt::Debug for DefaultResourceLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultResourceLoader")
            .field("assets_dir", &self.assets_dir)
            .finish()
    }
}

impl DefaultResourceLoader {
    /// Create a loader resolving assets under `assets_dir`.
    ///
    /// # Errors
    ///
    /// Returns `InternalRenderError` if the HTTP client cannot be created.
    pub fn new(assets_dir: impl Into<PathBuf>, timeout: Duration) -> MarkerResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MarkerError::render(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            assets_dir: assets_dir.into(),
            http_client,
        })
    }

    pub fn assets_dir(&self) -> &Path {
        &self.assets_dir
    }

    async fn read_file(&self, source: &str, path: &Path) -> MarkerResult<Vec<u8>> {
        tokio::fs::read(path)
            .await
            .map_err(|e| MarkerError::load_failed(source, format!("{}: {}", path.display(), e)))
    }

    async fn fetch_remote(&self, url: &str) -> MarkerResult<Vec<u8>> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| MarkerError::load_failed(url, format!("HTTP fetch failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(MarkerError::load_failed(
                url,
                format!("HTTP request failed with status: {}", response.status()),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| MarkerError::load_failed(url, format!("Failed to read HTTP body: {}", e)))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl ResourceLoader for DefaultResourceLoader {
    async fn load(&self, uri: &str) -> MarkerResult<Vec<u8>> {
        let bytes = match ResourceUri::parse(uri)? {
            ResourceUri::Asset(rel) => self.read_file(uri, &self.assets_dir.join(rel)).await?,
            ResourceUri::File(path) => self.read_file(uri, &path).await?,
            ResourceUri::Remote(url) => self.fetch_remote(&url).await?,
            ResourceUri::Inline(payload) => base64::engine::general_purpose::STANDARD
                .decode(payload.trim())
                .map_err(|e| MarkerError::load_failed(truncate(uri), format!("invalid base64: {}", e)))?,
        };

        tracing::debug!(source = truncate(uri), bytes = bytes.len(), "Loaded resource");
        Ok(bytes)
    }
}

/// Configuration for [`CachingLoader`].
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub max_entries: u64,
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 100,
            ttl: Duration::from_secs(3600),
        }
    }
}

/// Wraps a loader with an in-memory cache of remote and bundled resources.
#[derive(Clone)]
pub struct CachingLoader<L> {
    inner: L,
    cache: Cache<String, Arc<Vec<u8>>>,
}

impl<L> CachingLoader<L> {
    pub fn new(inner: L, config: CacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_entries)
            .time_to_live(config.ttl)
            .build();
        Self { inner, cache }
    }

    pub fn cache_size(&self) -> u64 {
        self.cache.entry_count()
    }

    pub async fn is_cached(&self, uri: &str) -> bool {
        self.cache.get(uri).await.is_some()
    }

    pub async fn clear_cache(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }
}

#[async_trait]
impl<L: ResourceLoader> ResourceLoader for CachingLoader<L> {
    async fn load(&self, uri: &str) -> MarkerResult<Vec<u8>> {
        let cacheable = ResourceUri::parse(uri)?.is_cacheable();
        if cacheable {
            if let Some(hit) = self.cache.get(uri).await {
                return Ok(hit.as_ref().clone());
            }
        }

        let bytes = self.inner.load(uri).await?;
        if cacheable {
            self.cache
                .insert(uri.to_string(), Arc::new(bytes.clone()))
                .await;
        }
        Ok(bytes)
    }
}
