//! Mark request options.
//!
//! Requests arrive as loosely typed camelCase JSON ([`RawMarkOptions`]):
//! offsets and padding may be numbers or strings, image sources may be an
//! object, a JSON-encoded object or a bare uri. [`MarkRequest::from_raw`]
//! validates all of it up front and produces fully defaulted value types, so
//! nothing downstream has to re-check a field.

use serde::{Deserialize, Serialize};

use super::color::Color;
use super::geometry::{CornerRadius, Dimension, Insets, RadiusValue};
use super::position::{Anchor, PositionSpec};
use crate::error::{MarkerError, MarkerResult};

pub const DEFAULT_FONT_SIZE: f32 = 14.0;
pub const DEFAULT_QUALITY: u8 = 100;
pub const DEFAULT_MAX_SIZE: u32 = 2048;

// ============================================================================
// Raw (wire) types
// ============================================================================

/// A value that may be sent as a JSON number or string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberOrString {
    Number(f64),
    Text(String),
}

impl NumberOrString {
    fn to_dimension(&self) -> Option<Dimension> {
        match self {
            Self::Number(n) if n.is_finite() => Some(Dimension::Absolute(*n as f32)),
            Self::Number(_) => None,
            Self::Text(s) => Dimension::parse(s),
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => format!("'{}'", s),
        }
    }
}

/// Image source descriptor (`{ uri, width, height, scale }`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSrcDescriptor {
    pub uri: String,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub scale: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawSrc {
    Descriptor(RawSrcDescriptor),
    Text(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawImageOptions {
    pub src: Option<RawSrc>,
    pub scale: Option<f64>,
    pub rotate: Option<f64>,
    pub alpha: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPositionOptions {
    #[serde(rename = "X", default)]
    pub x: Option<NumberOrString>,
    #[serde(rename = "Y", default)]
    pub y: Option<NumberOrString>,
    #[serde(default)]
    pub position: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawWatermarkImageOptions {
    #[serde(flatten)]
    pub image: RawImageOptions,
    pub position: Option<RawPositionOptions>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawShadowStyle {
    pub dx: Option<f64>,
    pub dy: Option<f64>,
    pub radius: Option<f64>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPadding {
    pub padding: Option<NumberOrString>,
    pub padding_left: Option<NumberOrString>,
    pub padding_right: Option<NumberOrString>,
    pub padding_top: Option<NumberOrString>,
    pub padding_bottom: Option<NumberOrString>,
    pub padding_horizontal: Option<NumberOrString>,
    pub padding_vertical: Option<NumberOrString>,
    #[serde(rename = "paddingX")]
    pub padding_x: Option<NumberOrString>,
    #[serde(rename = "paddingY")]
    pub padding_y: Option<NumberOrString>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRadiusValue {
    pub x: NumberOrString,
    pub y: NumberOrString,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCornerRadius {
    pub top_left: Option<RawRadiusValue>,
    pub top_right: Option<RawRadiusValue>,
    pub bottom_left: Option<RawRadiusValue>,
    pub bottom_right: Option<RawRadiusValue>,
    pub all: Option<RawRadiusValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTextBackgroundStyle {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub color: Option<String>,
    #[serde(flatten)]
    pub padding: RawPadding,
    pub corner_radius: Option<RawCornerRadius>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTextStyle {
    pub color: Option<String>,
    pub font_name: Option<String>,
    pub font_size: Option<f64>,
    pub shadow_style: Option<RawShadowStyle>,
    pub text_background_style: Option<RawTextBackgroundStyle>,
    pub underline: Option<bool>,
    #[serde(rename = "skewX")]
    pub skew_x: Option<f64>,
    pub strike_through: Option<bool>,
    pub text_align: Option<String>,
    pub italic: Option<bool>,
    pub bold: Option<bool>,
    pub rotate: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTextOptions {
    pub text: Option<String>,
    /// Deprecated spelling of `position`.
    pub position_options: Option<RawPositionOptions>,
    pub position: Option<RawPositionOptions>,
    pub style: Option<RawTextStyle>,
}

/// Top-level request, as sent by callers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMarkOptions {
    pub background_image: Option<RawImageOptions>,
    pub watermark_texts: Option<Vec<RawTextOptions>>,
    pub watermark_image: Option<RawImageOptions>,
    pub watermark_positions: Option<RawPositionOptions>,
    pub watermark_images: Option<Vec<RawWatermarkImageOptions>>,
    pub quality: Option<f64>,
    pub filename: Option<String>,
    pub save_format: Option<String>,
    pub max_size: Option<f64>,
}

impl RawMarkOptions {
    /// Deserialize from a JSON document.
    pub fn from_json(json: &str) -> MarkerResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| MarkerError::invalid_parameter("options", e.to_string()))
    }
}

// ============================================================================
// Validated types
// ============================================================================

/// Output encoding requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveFormat {
    #[default]
    Png,
    Jpg,
    /// JPEG bytes returned as a `data:` URI
    Base64,
}

impl SaveFormat {
    /// Unknown names fall back to PNG.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Self::Jpg,
            "base64" => Self::Base64,
            "png" => Self::Png,
            other => {
                tracing::warn!(save_format = other, "Unknown save format, using png");
                Self::Png
            }
        }
    }

    /// File extension of the encoded bytes (without the dot).
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpg | Self::Base64 => "jpg",
        }
    }
}

/// A validated image reference plus its per-use options.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageSource {
    pub uri: String,
    /// Intrinsic width from the source descriptor, if known.
    pub width: Option<f32>,
    pub height: Option<f32>,
    /// Pixel density of the descriptor.
    pub density: f32,
    pub scale: f32,
    pub rotate: f32,
    pub alpha: f32,
}

impl ImageSource {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            width: None,
            height: None,
            density: 1.0,
            scale: 1.0,
            rotate: 0.0,
            alpha: 1.0,
        }
    }

    /// Size before `scale` is applied, when the descriptor declares one.
    pub fn intrinsic_size(&self) -> Option<(f32, f32)> {
        match (self.width, self.height) {
            (Some(w), Some(h)) => Some((w * self.density, h * self.density)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl TextAlign {
    pub fn from_name(name: &str) -> MarkerResult<Self> {
        match name {
            "left" => Ok(Self::Left),
            "center" => Ok(Self::Center),
            "right" => Ok(Self::Right),
            other => Err(MarkerError::invalid_parameter(
                "textAlign",
                format!("expected left, center or right, got '{}'", other),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Shadow {
    pub radius: f32,
    pub dx: f32,
    pub dy: f32,
    pub color: Color,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum BackgroundType {
    /// Padded box around the text (`"none"` / `"fit"`)
    #[default]
    Fit,
    /// Extends to both horizontal canvas edges
    StretchX,
    /// Extends to both vertical canvas edges
    StretchY,
}

impl BackgroundType {
    pub fn parse(name: Option<&str>) -> MarkerResult<Self> {
        match name {
            None | Some("none") | Some("fit") | Some("") => Ok(Self::Fit),
            Some("stretchX") => Ok(Self::StretchX),
            Some("stretchY") => Ok(Self::StretchY),
            Some(other) => Err(MarkerError::style(format!(
                "unknown text background type '{}'",
                other
            ))),
        }
    }
}

/// Per-side padding, unresolved.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Padding {
    pub left: Dimension,
    pub top: Dimension,
    pub right: Dimension,
    pub bottom: Dimension,
}

impl Default for Padding {
    fn default() -> Self {
        Self::uniform(Dimension::Absolute(0.0))
    }
}

impl Padding {
    pub fn uniform(value: Dimension) -> Self {
        Self {
            left: value,
            top: value,
            right: value,
            bottom: value,
        }
    }

    /// Parse a CSS-like shorthand: `"10"`, `"10 20%"`, `"10 20 30"` or
    /// `"10 20 30 40"` (top, right, bottom, left).
    pub fn parse_shorthand(value: &str) -> MarkerResult<Self> {
        let parts = value
            .split_whitespace()
            .map(|p| {
                Dimension::parse(p)
                    .ok_or_else(|| MarkerError::style(format!("invalid padding value '{}'", p)))
            })
            .collect::<MarkerResult<Vec<_>>>()?;

        let (top, right, bottom, left) = match parts.as_slice() {
            [all] => (*all, *all, *all, *all),
            [v, h] => (*v, *h, *v, *h),
            [t, h, b] => (*t, *h, *b, *h),
            [t, r, b, l] => (*t, *r, *b, *l),
            _ => {
                return Err(MarkerError::style(format!(
                    "padding shorthand takes 1 to 4 values, got '{}'",
                    value
                )))
            }
        };

        Ok(Self {
            left,
            top,
            right,
            bottom,
        })
    }

    /// Resolve to pixels: horizontal sides against `canvas_width`, vertical
    /// sides against `canvas_height`.
    pub fn resolve(&self, canvas_width: f32, canvas_height: f32) -> Insets {
        Insets {
            left: self.left.resolve(canvas_width),
            top: self.top.resolve(canvas_height),
            right: self.right.resolve(canvas_width),
            bottom: self.bottom.resolve(canvas_height),
        }
    }

    fn from_raw(raw: &RawPadding) -> MarkerResult<Self> {
        let mut padding = match &raw.padding {
            Some(NumberOrString::Text(s)) => Self::parse_shorthand(s)?,
            Some(n) => Self::uniform(style_dimension("padding", n)?),
            None => Self::default(),
        };

        let horizontal = raw
            .padding_horizontal
            .as_ref()
            .or(raw.padding_x.as_ref());
        if let Some(h) = horizontal {
            let h = style_dimension("paddingHorizontal", h)?;
            padding.left = h;
            padding.right = h;
        }

        let vertical = raw.padding_vertical.as_ref().or(raw.padding_y.as_ref());
        if let Some(v) = vertical {
            let v = style_dimension("paddingVertical", v)?;
            padding.top = v;
            padding.bottom = v;
        }

        if let Some(v) = &raw.padding_left {
            padding.left = style_dimension("paddingLeft", v)?;
        }
        if let Some(v) = &raw.padding_right {
            padding.right = style_dimension("paddingRight", v)?;
        }
        if let Some(v) = &raw.padding_top {
            padding.top = style_dimension("paddingTop", v)?;
        }
        if let Some(v) = &raw.padding_bottom {
            padding.bottom = style_dimension("paddingBottom", v)?;
        }

        Ok(padding)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextBackgroundStyle {
    pub kind: BackgroundType,
    pub color: Color,
    pub padding: Padding,
    pub corner_radius: CornerRadius,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextStyle {
    pub color: Color,
    pub font_family: Option<String>,
    pub font_size: f32,
    pub shadow: Option<Shadow>,
    pub background: Option<TextBackgroundStyle>,
    pub underline: bool,
    pub strike_through: bool,
    pub align: TextAlign,
    pub italic: bool,
    /// Skew angle in degrees
    pub skew_x: f32,
    pub bold: bool,
    /// Rotation in degrees
    pub rotate: f32,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            color: Color::black(),
            font_family: None,
            font_size: DEFAULT_FONT_SIZE,
            shadow: None,
            background: None,
            underline: false,
            strike_through: false,
            align: TextAlign::Left,
            italic: false,
            skew_x: 0.0,
            bold: false,
            rotate: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatermarkText {
    pub text: String,
    pub position: PositionSpec,
    pub style: TextStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatermarkImage {
    pub image: ImageSource,
    pub position: PositionSpec,
}

/// The watermarks of a request. A request marks either text or images.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Watermarks {
    Texts(Vec<WatermarkText>),
    Images(Vec<WatermarkImage>),
}

impl Watermarks {
    pub fn len(&self) -> usize {
        match self {
            Self::Texts(t) => t.len(),
            Self::Images(i) => i.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Fallback values for fields a request leaves out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RequestDefaults {
    pub font_size: f32,
    pub quality: u8,
    pub max_size: u32,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            font_size: DEFAULT_FONT_SIZE,
            quality: DEFAULT_QUALITY,
            max_size: DEFAULT_MAX_SIZE,
        }
    }
}

/// A fully validated mark request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkRequest {
    pub background: ImageSource,
    pub quality: u8,
    pub max_size: u32,
    pub filename: Option<String>,
    pub save_format: SaveFormat,
    pub watermarks: Watermarks,
}

impl MarkRequest {
    /// Validate a request, marking text when `watermarkTexts` is present and
    /// images otherwise.
    pub fn from_raw(raw: &RawMarkOptions, defaults: &RequestDefaults) -> MarkerResult<Self> {
        if raw.watermark_texts.is_some() {
            Self::from_text_options(raw, defaults)
        } else {
            Self::from_image_options(raw, defaults)
        }
    }

    /// Validate a text mark request.
    pub fn from_text_options(raw: &RawMarkOptions, defaults: &RequestDefaults) -> MarkerResult<Self> {
        let base = Base::parse(raw, defaults)?;
        let texts = match &raw.watermark_texts {
            Some(texts) if !texts.is_empty() => texts
                .iter()
                .map(|t| parse_text(t, defaults))
                .collect::<MarkerResult<Vec<_>>>()?,
            _ => return Err(MarkerError::params_required("marker text or image is required")),
        };
        Ok(base.with(Watermarks::Texts(texts)))
    }

    /// Validate an image mark request: `watermarkImages` in order, then the
    /// legacy `watermarkImage` positioned by `watermarkPositions`.
    pub fn from_image_options(raw: &RawMarkOptions, defaults: &RequestDefaults) -> MarkerResult<Self> {
        let base = Base::parse(raw, defaults)?;

        let mut images = Vec::new();
        for entry in raw.watermark_images.iter().flatten() {
            images.push(WatermarkImage {
                image: parse_image(&entry.image)?,
                position: parse_image_position(entry.position.as_ref()),
            });
        }
        if let Some(legacy) = &raw.watermark_image {
            images.push(WatermarkImage {
                image: parse_image(legacy)?,
                position: parse_image_position(raw.watermark_positions.as_ref()),
            });
        }

        if images.is_empty() {
            return Err(MarkerError::params_required("marker text or image is required"));
        }
        Ok(base.with(Watermarks::Images(images)))
    }
}

/// Fields shared by both request kinds.
struct Base {
    background: ImageSource,
    quality: u8,
    max_size: u32,
    filename: Option<String>,
    save_format: SaveFormat,
}

impl Base {
    fn parse(raw: &RawMarkOptions, defaults: &RequestDefaults) -> MarkerResult<Self> {
        let background = raw
            .background_image
            .as_ref()
            .ok_or_else(|| MarkerError::params_required("backgroundImage is required"))?;
        let background = parse_image(background)?;

        let quality = match raw.quality {
            None => defaults.quality,
            Some(q) if q.is_finite() && (0.0..=100.0).contains(&q) => q.round() as u8,
            Some(q) => {
                return Err(MarkerError::invalid_parameter(
                    "quality",
                    format!("must be between 0 and 100, got {}", q),
                ))
            }
        };

        let max_size = match raw.max_size {
            None => defaults.max_size,
            Some(m) if m.is_finite() && m >= 1.0 => m.round() as u32,
            Some(m) => {
                return Err(MarkerError::invalid_parameter(
                    "maxSize",
                    format!("must be a positive number, got {}", m),
                ))
            }
        };

        Ok(Self {
            background,
            quality,
            max_size,
            filename: raw.filename.clone().filter(|f| !f.trim().is_empty()),
            save_format: raw
                .save_format
                .as_deref()
                .map(SaveFormat::from_name)
                .unwrap_or_default(),
        })
    }

    fn with(self, watermarks: Watermarks) -> MarkRequest {
        MarkRequest {
            background: self.background,
            quality: self.quality,
            max_size: self.max_size,
            filename: self.filename,
            save_format: self.save_format,
            watermarks,
        }
    }
}

fn finite(param: &str, value: f64) -> MarkerResult<f32> {
    if value.is_finite() {
        Ok(value as f32)
    } else {
        Err(MarkerError::invalid_parameter(
            param,
            format!("must be a finite number, got {}", value),
        ))
    }
}

fn parse_src(src: &RawSrc) -> MarkerResult<RawSrcDescriptor> {
    match src {
        RawSrc::Descriptor(d) => Ok(d.clone()),
        RawSrc::Text(s) if s.trim_start().starts_with('{') => serde_json::from_str(s)
            .map_err(|e| MarkerError::invalid_parameter("src", format!("invalid descriptor: {}", e))),
        RawSrc::Text(s) => Ok(RawSrcDescriptor {
            uri: s.clone(),
            width: None,
            height: None,
            scale: None,
        }),
    }
}

fn parse_image(raw: &RawImageOptions) -> MarkerResult<ImageSource> {
    let src = raw
        .src
        .as_ref()
        .ok_or_else(|| MarkerError::params_required("image is required"))?;
    let descriptor = parse_src(src)?;
    if descriptor.uri.trim().is_empty() {
        return Err(MarkerError::params_required("image is required"));
    }

    let scale = match raw.scale {
        None => 1.0,
        Some(s) => {
            let s = finite("scale", s)?;
            if s <= 0.0 {
                return Err(MarkerError::invalid_parameter(
                    "scale",
                    format!("must be greater than 0, got {}", s),
                ));
            }
            s
        }
    };

    let alpha = match raw.alpha {
        None => 1.0,
        Some(a) => {
            let a = finite("alpha", a)?;
            if !(0.0..=1.0).contains(&a) {
                return Err(MarkerError::invalid_parameter(
                    "alpha",
                    format!("must be between 0 and 1, got {}", a),
                ));
            }
            a
        }
    };

    let density = match descriptor.scale {
        Some(d) if d.is_finite() && d > 0.0 => d as f32,
        _ => 1.0,
    };

    Ok(ImageSource {
        uri: descriptor.uri,
        width: descriptor.width.filter(|w| w.is_finite() && *w > 0.0).map(|w| w as f32),
        height: descriptor.height.filter(|h| h.is_finite() && *h > 0.0).map(|h| h as f32),
        density,
        scale,
        rotate: raw.rotate.map(|r| finite("rotate", r)).transpose()?.unwrap_or(0.0),
        alpha,
    })
}

/// Named anchor first, then explicit offsets, then the default.
///
/// A text position with a single axis still uses offsets; the missing axis
/// resolves to 0.
pub fn parse_position(raw: Option<&RawPositionOptions>) -> PositionSpec {
    let Some(raw) = raw else {
        return PositionSpec::Default;
    };

    if let Some(name) = raw.position.as_deref() {
        return PositionSpec::Anchor(Anchor::from_name(name));
    }

    if raw.x.is_none() && raw.y.is_none() {
        return PositionSpec::Default;
    }
    offsets(raw)
}

/// Image positions use offsets only when both axes are given.
pub fn parse_image_position(raw: Option<&RawPositionOptions>) -> PositionSpec {
    match raw {
        Some(raw) if raw.position.is_none() && (raw.x.is_none() || raw.y.is_none()) => {
            PositionSpec::Default
        }
        other => parse_position(other),
    }
}

fn offsets(raw: &RawPositionOptions) -> PositionSpec {

    let offset = |axis: &str, value: &Option<NumberOrString>| {
        value.as_ref().map(|v| {
            v.to_dimension().unwrap_or_else(|| {
                tracing::warn!(axis, value = %v.describe(), "Unparsable offset, using 0");
                Dimension::Absolute(0.0)
            })
        })
    };

    PositionSpec::Offsets {
        x: offset("X", &raw.x),
        y: offset("Y", &raw.y),
    }
}

fn style_dimension(field: &str, value: &NumberOrString) -> MarkerResult<Dimension> {
    value
        .to_dimension()
        .ok_or_else(|| MarkerError::style(format!("invalid {} value {}", field, value.describe())))
}

fn parse_radius(field: &str, raw: &RawRadiusValue) -> MarkerResult<RadiusValue> {
    Ok(RadiusValue {
        x: style_dimension(field, &raw.x)?,
        y: style_dimension(field, &raw.y)?,
    })
}

fn parse_corner_radius(raw: &RawCornerRadius) -> MarkerResult<CornerRadius> {
    let all = raw
        .all
        .as_ref()
        .map(|r| parse_radius("cornerRadius.all", r))
        .transpose()?;
    let corner = |field: &str, value: &Option<RawRadiusValue>| {
        value
            .as_ref()
            .map(|r| parse_radius(field, r))
            .transpose()
            .map(|v| v.or(all))
    };

    Ok(CornerRadius {
        top_left: corner("cornerRadius.topLeft", &raw.top_left)?,
        top_right: corner("cornerRadius.topRight", &raw.top_right)?,
        bottom_right: corner("cornerRadius.bottomRight", &raw.bottom_right)?,
        bottom_left: corner("cornerRadius.bottomLeft", &raw.bottom_left)?,
    })
}

fn parse_background(raw: &RawTextBackgroundStyle) -> MarkerResult<TextBackgroundStyle> {
    Ok(TextBackgroundStyle {
        kind: BackgroundType::parse(raw.kind.as_deref())?,
        color: Color::parse_opt(raw.color.as_deref())?.unwrap_or_else(Color::black),
        padding: Padding::from_raw(&raw.padding)?,
        corner_radius: raw
            .corner_radius
            .as_ref()
            .map(parse_corner_radius)
            .transpose()?
            .unwrap_or_default(),
    })
}

fn parse_shadow(raw: &RawShadowStyle) -> MarkerResult<Shadow> {
    let value = |field: &str, v: Option<f64>| match v {
        None => Ok(0.0),
        Some(v) if v.is_finite() => Ok(v as f32),
        Some(v) => Err(MarkerError::style(format!("invalid shadow {} {}", field, v))),
    };

    let radius = value("radius", raw.radius)?;
    if radius < 0.0 {
        return Err(MarkerError::style(format!(
            "shadow radius must not be negative, got {}",
            radius
        )));
    }

    Ok(Shadow {
        radius,
        dx: value("dx", raw.dx)?,
        dy: value("dy", raw.dy)?,
        color: Color::parse_opt(raw.color.as_deref())?.unwrap_or_else(Color::black),
    })
}

fn parse_style(raw: Option<&RawTextStyle>, defaults: &RequestDefaults) -> MarkerResult<TextStyle> {
    let Some(raw) = raw else {
        return Ok(TextStyle {
            font_size: defaults.font_size,
            ..TextStyle::default()
        });
    };

    let font_size = match raw.font_size {
        None => defaults.font_size,
        Some(s) if s == 0.0 => defaults.font_size,
        Some(s) => {
            let s = finite("fontSize", s)?;
            if s < 0.0 {
                return Err(MarkerError::invalid_parameter(
                    "fontSize",
                    format!("must be greater than 0, got {}", s),
                ));
            }
            s
        }
    };

    Ok(TextStyle {
        color: Color::parse_opt(raw.color.as_deref())?.unwrap_or_else(Color::black),
        font_family: raw.font_name.clone().filter(|f| !f.is_empty()),
        font_size,
        shadow: raw.shadow_style.as_ref().map(parse_shadow).transpose()?,
        background: raw
            .text_background_style
            .as_ref()
            .map(parse_background)
            .transpose()?,
        underline: raw.underline.unwrap_or(false),
        strike_through: raw.strike_through.unwrap_or(false),
        align: raw
            .text_align
            .as_deref()
            .map(TextAlign::from_name)
            .transpose()?
            .unwrap_or_default(),
        italic: raw.italic.unwrap_or(false),
        skew_x: raw.skew_x.map(|s| finite("skewX", s)).transpose()?.unwrap_or(0.0),
        bold: raw.bold.unwrap_or(false),
        rotate: raw.rotate.map(|r| finite("rotate", r)).transpose()?.unwrap_or(0.0),
    })
}

fn parse_text(raw: &RawTextOptions, defaults: &RequestDefaults) -> MarkerResult<WatermarkText> {
    let text = raw
        .text
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| MarkerError::params_required("mark text is required"))?;

    Ok(WatermarkText {
        text: text.to_string(),
        position: parse_position(raw.position.as_ref().or(raw.position_options.as_ref())),
        style: parse_style(raw.style.as_ref(), defaults)?,
    })
}
