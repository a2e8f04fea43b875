//! Position calculation for watermark placement.
//!
//! Turns a [`PositionSpec`] (a named anchor or explicit X/Y offsets) into the
//! top-left pixel position of an element on the canvas.
//!
//! # Example
//!
//! ```
//! use image_marker::watermark::position::{resolve_position, AnchorStrategy, PositionSpec};
//! use image_marker::watermark::{Anchor, Position};
//!
//! let spec = PositionSpec::Anchor(Anchor::BottomRight);
//! let pos = resolve_position(&spec, 10.0, 800.0, 600.0, 100.0, 50.0, AnchorStrategy::Inset);
//! assert_eq!(pos, Position::new(690.0, 540.0)); // 800 - 100 - 10, 600 - 50 - 10
//! ```

use serde::{Deserialize, Serialize};

use super::geometry::{Dimension, Position};

/// Named reference point on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Anchor {
    TopLeft,
    TopCenter,
    TopRight,
    Center,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl Anchor {
    pub const ALL: [Anchor; 7] = [
        Anchor::TopLeft,
        Anchor::TopCenter,
        Anchor::TopRight,
        Anchor::Center,
        Anchor::BottomLeft,
        Anchor::BottomCenter,
        Anchor::BottomRight,
    ];

    /// Map an anchor name to an anchor. Unknown names map to `BottomRight`,
    /// matching what existing callers of the marker API rely on.
    pub fn from_name(name: &str) -> Self {
        match name {
            "topLeft" => Self::TopLeft,
            "topCenter" => Self::TopCenter,
            "topRight" => Self::TopRight,
            "center" => Self::Center,
            "bottomLeft" => Self::BottomLeft,
            "bottomCenter" => Self::BottomCenter,
            _ => Self::BottomRight,
        }
    }
}

/// Which set of anchor formulas to apply.
///
/// Two divergent formula sets exist in deployed clients. `Inset` always keeps
/// the margin on every edge and is the default; the legacy variants reproduce
/// the older text and image formulas for callers that depend on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorStrategy {
    #[default]
    Inset,
    /// `topLeft` sits one element-height lower and `topRight` ignores the margin.
    LegacyText,
    /// `bottomCenter` is shifted left by the margin.
    LegacyImage,
}

/// Canvas-wide inputs shared by every element laid out on one canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayoutContext {
    pub canvas_width: f32,
    pub canvas_height: f32,
    pub margin: f32,
    pub strategy: AnchorStrategy,
}

impl LayoutContext {
    pub fn new(canvas_width: f32, canvas_height: f32, margin: f32, strategy: AnchorStrategy) -> Self {
        Self {
            canvas_width,
            canvas_height,
            margin,
            strategy,
        }
    }

    /// Position of an element of the given size on this canvas.
    pub fn place(&self, spec: &PositionSpec, width: f32, height: f32) -> Position {
        resolve_position(
            spec,
            self.margin,
            self.canvas_width,
            self.canvas_height,
            width,
            height,
            self.strategy,
        )
    }
}

/// Placement request for a single element.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub enum PositionSpec {
    /// A named anchor; explicit offsets are ignored when one is present.
    Anchor(Anchor),
    /// Explicit offsets. A missing axis resolves to 0.
    Offsets {
        x: Option<Dimension>,
        y: Option<Dimension>,
    },
    /// Nothing specified: behaves like `Anchor(TopLeft)`.
    #[default]
    Default,
}

/// Resolve a loosely typed offset: plain numbers parse directly, `"NN%"` is
/// `relative_to * NN / 100`, anything unparsable is 0.
///
/// ```
/// use image_marker::watermark::position::resolve_percent;
///
/// assert_eq!(resolve_percent("50%", 200.0), 100.0);
/// assert_eq!(resolve_percent("30", 200.0), 30.0);
/// assert_eq!(resolve_percent("bogus", 200.0), 0.0);
/// ```
pub fn resolve_percent(value: &str, relative_to: f32) -> f32 {
    Dimension::parse(value)
        .map(|d| d.resolve(relative_to))
        .unwrap_or(0.0)
}

/// Calculate the position of an anchored element.
///
/// # Arguments
///
/// * `anchor` - The named anchor
/// * `margin` - Margin from edges in pixels
/// * `canvas_width`, `canvas_height` - Canvas dimensions
/// * `width`, `height` - Element dimensions
/// * `strategy` - Formula set to apply
///
/// Coordinates may be negative if the element is larger than the canvas.
pub fn anchor_position(
    anchor: Anchor,
    margin: f32,
    canvas_width: f32,
    canvas_height: f32,
    width: f32,
    height: f32,
    strategy: AnchorStrategy,
) -> Position {
    let m = margin;
    let center_x = (canvas_width - width) / 2.0;
    let center_y = (canvas_height - height) / 2.0;
    let right = canvas_width - width - m;
    let bottom = canvas_height - height - m;

    match (anchor, strategy) {
        (Anchor::TopLeft, AnchorStrategy::LegacyText) => Position::new(m, height + m),
        (Anchor::TopRight, AnchorStrategy::LegacyText) => {
            Position::new(canvas_width - width, m)
        }
        (Anchor::BottomCenter, AnchorStrategy::LegacyImage) => {
            Position::new(center_x - m, bottom)
        }

        // Top row
        (Anchor::TopLeft, _) => Position::new(m, m),
        (Anchor::TopCenter, _) => Position::new(center_x, m),
        (Anchor::TopRight, _) => Position::new(right, m),

        (Anchor::Center, _) => Position::new(center_x, center_y),

        // Bottom row
        (Anchor::BottomLeft, _) => Position::new(m, bottom),
        (Anchor::BottomCenter, _) => Position::new(center_x, bottom),
        (Anchor::BottomRight, _) => Position::new(right, bottom),
    }
}

/// Resolve any [`PositionSpec`] to a pixel position.
pub fn resolve_position(
    spec: &PositionSpec,
    margin: f32,
    canvas_width: f32,
    canvas_height: f32,
    width: f32,
    height: f32,
    strategy: AnchorStrategy,
) -> Position {
    match spec {
        PositionSpec::Anchor(anchor) => anchor_position(
            *anchor,
            margin,
            canvas_width,
            canvas_height,
            width,
            height,
            strategy,
        ),
        PositionSpec::Offsets { x, y } => Position::new(
            x.map(|d| d.resolve(canvas_width)).unwrap_or(0.0),
            y.map(|d| d.resolve(canvas_height)).unwrap_or(0.0),
        ),
        PositionSpec::Default => anchor_position(
            Anchor::TopLeft,
            margin,
            canvas_width,
            canvas_height,
            width,
            height,
            strategy,
        ),
    }
}
