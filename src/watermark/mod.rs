//! Watermark layout and compositing.
//!
//! A mark request is validated into a [`MarkRequest`], laid out against the
//! prepared background into a [`MarkPlan`], replayed onto a
//! [`DrawingSurface`] and encoded.
//!
//! # Features
//!
//! - **Text watermarks** with multi-line wrapping, alignment, italic/skew,
//!   synthetic bold, underline/strike-through, shadow, rotation and
//!   fit/stretch backgrounds with per-corner radii
//! - **Image watermarks** with scale, rotation and opacity, drawn in list order
//! - **7 anchors** plus absolute or percentage offsets
//! - **Resources** from bundled assets, local files, HTTP(S) or data URIs
//!
//! # Request Example
//!
//! ```json
//! {
//!   "backgroundImage": {"src": "assets/photo.jpg", "scale": 0.5},
//!   "watermarkTexts": [{
//!     "text": "© 2024",
//!     "position": {"position": "bottomRight"},
//!     "style": {"color": "#FFFFFF", "fontSize": 24, "shadowStyle": {"radius": 4}}
//!   }],
//!   "saveFormat": "jpg",
//!   "quality": 90
//! }
//! ```
//!
//! # Quick Layout Check
//!
//! ```
//! use image_marker::watermark::{Anchor, Color, Position};
//! use image_marker::watermark::position::{resolve_position, AnchorStrategy, PositionSpec};
//!
//! let pos = resolve_position(
//!     &PositionSpec::Anchor(Anchor::Center),
//!     20.0, 1000.0, 800.0, 60.0, 40.0,
//!     AnchorStrategy::Inset,
//! );
//! assert_eq!(pos, Position::new(470.0, 380.0));
//! assert_eq!(Color::parse("#FF0000").unwrap(), Color::new(255, 0, 0));
//! ```

pub mod codec;
pub mod color;
pub mod compositor;
pub mod font;
pub mod geometry;
pub mod image_placer;
pub mod loader;
pub mod marker;
pub mod options;
pub mod position;
pub mod raster;
pub mod storage;
pub mod text_layout;

// Re-export main types for convenience
pub use codec::{encoder_for, ImageEncoder, JpegEncoder, PngEncoder};
pub use color::Color;
pub use compositor::{compose, DrawOp, DrawingSurface, MarkElement, MarkPlan, RecordingSurface};
pub use font::{FontBook, FontMetrics, FontSpec, LineMetrics, MonospaceMetrics};
pub use geometry::{CornerRadius, Dimension, Position, Rect, Rotation};
pub use image_placer::{place_images, ImagePlacement};
pub use loader::{CachingLoader, DefaultResourceLoader, ResourceLoader, ResourceUri};
pub use marker::{ImageMarker, MarkOutput, RenderedImage};
pub use options::{
    MarkRequest, RawMarkOptions, SaveFormat, TextStyle, WatermarkImage, WatermarkText, Watermarks,
};
pub use position::{Anchor, AnchorStrategy, LayoutContext, PositionSpec};
pub use raster::RasterSurface;
pub use storage::OutputStore;
pub use text_layout::{layout_text, TextLayout};
