//! High-level mark API.
//!
//! # Pipeline
//!
//! validate → load and decode every resource → prepare background → lay out
//! → compose onto a raster surface → encode → persist (or data URI)
//!
//! Every resource is loaded and decoded before any drawing starts, so a load
//! failure never leaves a partially drawn canvas or a partial output file.
//!
//! # Example
//!
//! ```ignore
//! use image_marker::config::MarkerConfig;
//! use image_marker::watermark::ImageMarker;
//!
//! let marker = ImageMarker::from_config(MarkerConfig::default())?;
//! let output = marker.mark_json(r#"{
//!     "backgroundImage": {"src": "assets/photo.jpg"},
//!     "watermarkTexts": [{"text": "hello", "position": {"position": "center"}}]
//! }"#).await?;
//! ```

use futures::future::try_join_all;
use image::RgbaImage;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use super::codec::{self, encoder_for, jpeg_data_uri, ImageEncoder};
use super::compositor::{compose, MarkPlan};
use super::font::FontBook;
use super::loader::{CachingLoader, DefaultResourceLoader, ResourceLoader};
use super::options::{MarkRequest, RawMarkOptions, SaveFormat, Watermarks};
use super::position::LayoutContext;
use super::raster::RasterSurface;
use super::storage::OutputStore;
use crate::config::MarkerConfig;
use crate::error::{MarkerError, MarkerResult};

/// Where a marked image ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkOutput {
    /// Persisted `png`/`jpg` file
    File(PathBuf),
    /// `data:image/jpeg;base64,...`
    DataUri(String),
}

impl MarkOutput {
    pub fn as_path(&self) -> Option<&std::path::Path> {
        match self {
            Self::File(path) => Some(path),
            Self::DataUri(_) => None,
        }
    }
}

/// Encoded image that has not been persisted.
#[derive(Debug, Clone)]
pub struct RenderedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub extension: &'static str,
    pub mime_type: &'static str,
}

/// Loader stack built from configuration.
pub enum ConfiguredLoader {
    Cached(CachingLoader<DefaultResourceLoader>),
    Direct(DefaultResourceLoader),
}

#[async_trait::async_trait]
impl ResourceLoader for ConfiguredLoader {
    async fn load(&self, uri: &str) -> MarkerResult<Vec<u8>> {
        match self {
            Self::Cached(loader) => loader.load(uri).await,
            Self::Direct(loader) => loader.load(uri).await,
        }
    }
}

/// Marks background images with text or image watermarks.
///
/// Holds only immutable state; one instance serves concurrent requests.
pub struct ImageMarker<L = ConfiguredLoader> {
    config: MarkerConfig,
    loader: L,
    fonts: Arc<FontBook>,
    store: OutputStore,
}

impl ImageMarker<ConfiguredLoader> {
    /// Build a marker with the default loader stack and the fonts found in
    /// `config.fonts_dir`.
    pub fn from_config(config: MarkerConfig) -> MarkerResult<Self> {
        let direct = DefaultResourceLoader::new(&config.assets_dir, config.http_timeout())?;
        let loader = if config.resource_cache.enabled {
            ConfiguredLoader::Cached(CachingLoader::new(
                direct,
                config.resource_cache.to_cache_config(),
            ))
        } else {
            ConfiguredLoader::Direct(direct)
        };

        let mut fonts = match &config.fonts_dir {
            Some(dir) => FontBook::discover(dir, config.font_search_depth)?,
            None => FontBook::new(),
        };
        if let Some(family) = &config.default_font {
            fonts.set_default(family.clone());
        }
        if fonts.is_empty() {
            tracing::warn!("No fonts loaded; text will render as placeholder boxes");
        }

        Ok(Self::new(config, loader, fonts))
    }
}

impl<L: ResourceLoader> ImageMarker<L> {
    pub fn new(config: MarkerConfig, loader: L, fonts: FontBook) -> Self {
        let store = OutputStore::new(&config.output_dir);
        Self {
            config,
            loader,
            fonts: Arc::new(fonts),
            store,
        }
    }

    pub fn config(&self) -> &MarkerConfig {
        &self.config
    }

    pub fn fonts(&self) -> &FontBook {
        &self.fonts
    }

    /// Mark from raw JSON options; text when `watermarkTexts` is present,
    /// images otherwise.
    pub async fn mark_json(&self, json: &str) -> MarkerResult<MarkOutput> {
        let raw = RawMarkOptions::from_json(json)?;
        let request = MarkRequest::from_raw(&raw, &self.config.request_defaults())?;
        self.mark(&request).await
    }

    /// Mark with text watermarks.
    pub async fn mark_with_text(&self, raw: &RawMarkOptions) -> MarkerResult<MarkOutput> {
        let request = MarkRequest::from_text_options(raw, &self.config.request_defaults())?;
        self.mark(&request).await
    }

    /// Mark with image watermarks.
    pub async fn mark_with_image(&self, raw: &RawMarkOptions) -> MarkerResult<MarkOutput> {
        let request = MarkRequest::from_image_options(raw, &self.config.request_defaults())?;
        self.mark(&request).await
    }

    /// Render a validated request and persist it, or return it as a data URI
    /// for `base64`.
    pub async fn mark(&self, request: &MarkRequest) -> MarkerResult<MarkOutput> {
        let rendered = self.render(request).await?;

        match request.save_format {
            SaveFormat::Base64 => Ok(MarkOutput::DataUri(jpeg_data_uri(&rendered.bytes))),
            SaveFormat::Png | SaveFormat::Jpg => {
                let store = self.store.clone();
                let filename = request.filename.clone();
                let RenderedImage {
                    bytes, extension, ..
                } = rendered;
                let path = tokio::task::spawn_blocking(move || {
                    store.persist(&bytes, filename.as_deref(), extension)
                })
                .await
                .map_err(|e| MarkerError::render(format!("persist task failed: {}", e)))??;
                tracing::info!(path = %path.display(), "Marked image saved");
                Ok(MarkOutput::File(path))
            }
        }
    }

    /// Render a validated request to encoded bytes without persisting.
    pub async fn render(&self, request: &MarkRequest) -> MarkerResult<RenderedImage> {
        let started = Instant::now();
        let (background, marks) = self.load_resources(request).await?;

        let background = codec::prepare_background(background, &request.background, request.max_size);
        let (width, height) = background.dimensions();
        let ctx = LayoutContext::new(
            width as f32,
            height as f32,
            self.config.margin,
            self.config.anchor_strategy,
        );

        let plan = match &request.watermarks {
            Watermarks::Texts(texts) => MarkPlan::for_texts(texts, &ctx, self.fonts.as_ref())?,
            Watermarks::Images(images) => {
                let sizes: Vec<(u32, u32)> = marks.iter().map(|m| m.dimensions()).collect();
                MarkPlan::for_images(images, &sizes, &ctx)?
            }
        }
        .with_background_alpha(request.background.alpha);

        let mut surface = RasterSurface::new(width, height, &self.fonts)?;
        compose(&plan, Some(&background), &marks, &mut surface)?;
        let image = surface.to_image()?;

        let encoder = encoder_for(request.save_format, request.quality);
        let bytes = encoder.encode(&image)?;

        tracing::info!(
            background = %request.background.uri,
            watermarks = request.watermarks.len(),
            width,
            height,
            format = encoder.extension(),
            bytes = bytes.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Rendered marked image"
        );

        Ok(RenderedImage {
            bytes,
            width,
            height,
            extension: encoder.extension(),
            mime_type: encoder.mime_type(),
        })
    }

    /// Load and decode the background and every watermark image.
    async fn load_resources(&self, request: &MarkRequest) -> MarkerResult<(RgbaImage, Vec<RgbaImage>)> {
        let mark_uris: Vec<&str> = match &request.watermarks {
            Watermarks::Texts(_) => Vec::new(),
            Watermarks::Images(images) => images.iter().map(|m| m.image.uri.as_str()).collect(),
        };

        let background_uri = request.background.uri.as_str();
        let (background, marks) = futures::try_join!(
            self.load_image(background_uri),
            try_join_all(mark_uris.iter().map(|uri| self.load_image(uri))),
        )?;

        if background.width() == 0 || background.height() == 0 {
            return Err(MarkerError::load_failed(background_uri, "image has no pixels"));
        }

        Ok((background, marks))
    }

    async fn load_image(&self, uri: &str) -> MarkerResult<RgbaImage> {
        let bytes = self.loader.load(uri).await?;
        codec::decode(&bytes, uri)
    }
}
