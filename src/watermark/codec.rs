//! Image decode, pixel preparation and output encoding.
//!
//! Decoding detects the format from magic bytes (falling back to the uri
//! extension). Encoders share one trait so the marker can pick PNG or JPEG
//! from the requested [`SaveFormat`].

use base64::Engine;
use image::codecs::jpeg::JpegEncoder as ImageJpegEncoder;
use image::codecs::png::PngEncoder as ImagePngEncoder;
use image::imageops::FilterType;
use image::{ImageEncoder as _, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

use super::options::{ImageSource, SaveFormat};
use crate::error::{MarkerError, MarkerResult};

/// Prefix of base64 output. The payload is always JPEG.
pub const JPEG_DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";

/// Detect image format from bytes or the uri's extension.
pub fn detect_format(data: &[u8], uri: &str) -> MarkerResult<ImageFormat> {
    if let Ok(format) = image::guess_format(data) {
        return Ok(format);
    }

    let ext = uri
        .rsplit('.')
        .next()
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "png" => Ok(ImageFormat::Png),
        "jpg" | "jpeg" => Ok(ImageFormat::Jpeg),
        "gif" => Ok(ImageFormat::Gif),
        "webp" => Ok(ImageFormat::WebP),
        _ => Err(MarkerError::load_failed(uri, "unrecognized image format")),
    }
}

/// Decode `data` loaded from `uri` into RGBA8.
pub fn decode(data: &[u8], uri: &str) -> MarkerResult<RgbaImage> {
    let format = detect_format(data, uri)?;
    let image = image::load_from_memory_with_format(data, format)
        .map_err(|e| MarkerError::load_failed(uri, e.to_string()))?;
    Ok(image.to_rgba8())
}

/// Resize to exactly `width` x `height` (no-op when already that size).
pub fn resize_to(image: RgbaImage, width: u32, height: u32) -> RgbaImage {
    let (width, height) = (width.max(1), height.max(1));
    if image.dimensions() == (width, height) {
        return image;
    }
    image::imageops::resize(&image, width, height, FilterType::Triangle)
}

/// Scale `(width, height)` down so neither side exceeds `max_size`.
pub fn fit_within(width: u32, height: u32, max_size: u32) -> (u32, u32) {
    let longest = width.max(height);
    if max_size == 0 || longest <= max_size {
        return (width, height);
    }
    let ratio = max_size as f32 / longest as f32;
    (
        ((width as f32 * ratio).round() as u32).max(1),
        ((height as f32 * ratio).round() as u32).max(1),
    )
}

/// Background pixels as drawn: scaled by `scale`, rotated by `rotate`
/// (the canvas grows to the rotated bounds) and capped at `max_size`.
///
/// The cap is folded into the scale before any resampling, so the source is
/// resized once and never grows past the final size.
pub fn prepare_background(image: RgbaImage, source: &ImageSource, max_size: u32) -> RgbaImage {
    let (w, h) = image.dimensions();
    let rotated = source.rotate % 360.0 != 0.0;
    let scale = effective_scale(w, h, source.scale, source.rotate, max_size);

    let sw = (w as f64 * scale).round() as u32;
    let sh = (h as f64 * scale).round() as u32;
    let scaled = resize_to(image, sw, sh);

    if !rotated {
        return scaled;
    }
    let rotated = rotate_image(&scaled, source.rotate);
    let (rw, rh) = rotated.dimensions();
    let (fw, fh) = fit_within(rw, rh, max_size);
    resize_to(rotated, fw, fh)
}

/// `scale` reduced so the rotated bounds of the scaled image fit `max_size`.
fn effective_scale(width: u32, height: u32, scale: f32, rotate: f32, max_size: u32) -> f64 {
    let scale = scale as f64;
    if max_size == 0 {
        return scale;
    }
    let (sin, cos) = (rotate as f64).to_radians().sin_cos();
    let (sw, sh) = (width as f64 * scale, height as f64 * scale);
    let bound_w = sw * cos.abs() + sh * sin.abs();
    let bound_h = sw * sin.abs() + sh * cos.abs();
    let longest = bound_w.max(bound_h);
    if longest <= max_size as f64 {
        scale
    } else {
        scale * max_size as f64 / longest
    }
}

/// Rotate clockwise by `degrees` into a canvas large enough for the result.
/// Uncovered corners are transparent.
pub fn rotate_image(image: &RgbaImage, degrees: f32) -> RgbaImage {
    let (sin, cos) = degrees.to_radians().sin_cos();
    let src_w = image.width() as f32;
    let src_h = image.height() as f32;

    let dst_w = (src_w * cos.abs() + src_h * sin.abs()).round().max(1.0) as u32;
    let dst_h = (src_w * sin.abs() + src_h * cos.abs()).round().max(1.0) as u32;
    let mut rotated = RgbaImage::new(dst_w, dst_h);

    let (cx, cy) = (src_w / 2.0, src_h / 2.0);
    let (dst_cx, dst_cy) = (dst_w as f32 / 2.0, dst_h as f32 / 2.0);

    for (dx, dy, pixel) in rotated.enumerate_pixels_mut() {
        // Sample at pixel centers, inverse-rotated into the source
        let rx = dx as f32 + 0.5 - dst_cx;
        let ry = dy as f32 + 0.5 - dst_cy;
        let sx = rx * cos + ry * sin + cx - 0.5;
        let sy = -rx * sin + ry * cos + cy - 0.5;

        if let Some(sample) = sample_bilinear(image, sx, sy) {
            *pixel = sample;
        }
    }

    rotated
}

fn sample_bilinear(image: &RgbaImage, x: f32, y: f32) -> Option<Rgba<u8>> {
    let (w, h) = (image.width() as f32, image.height() as f32);
    if x < -0.5 || y < -0.5 || x > w - 0.5 || y > h - 0.5 {
        return None;
    }

    let x = x.clamp(0.0, w - 1.0);
    let y = y.clamp(0.0, h - 1.0);
    let (x0, y0) = (x.floor() as u32, y.floor() as u32);
    let x1 = (x0 + 1).min(image.width() - 1);
    let y1 = (y0 + 1).min(image.height() - 1);
    let (fx, fy) = (x - x0 as f32, y - y0 as f32);

    let p00 = image.get_pixel(x0, y0);
    let p10 = image.get_pixel(x1, y0);
    let p01 = image.get_pixel(x0, y1);
    let p11 = image.get_pixel(x1, y1);

    let channel = |c: usize| -> u8 {
        let v = p00[c] as f32 * (1.0 - fx) * (1.0 - fy)
            + p10[c] as f32 * fx * (1.0 - fy)
            + p01[c] as f32 * (1.0 - fx) * fy
            + p11[c] as f32 * fx * fy;
        v.round().clamp(0.0, 255.0) as u8
    };

    Some(Rgba([channel(0), channel(1), channel(2), channel(3)]))
}

/// Encoder for one output format.
pub trait ImageEncoder: Send + Sync {
    fn encode(&self, image: &RgbaImage) -> MarkerResult<Vec<u8>>;

    /// File extension without the dot
    fn extension(&self) -> &'static str;

    fn mime_type(&self) -> &'static str;
}

/// JPEG encoder; alpha is discarded.
#[derive(Debug, Clone, Copy)]
pub struct JpegEncoder {
    quality: u8,
}

impl JpegEncoder {
    /// Quality is clamped to 1..=100.
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }
}

impl ImageEncoder for JpegEncoder {
    fn encode(&self, image: &RgbaImage) -> MarkerResult<Vec<u8>> {
        let rgb = rgba_to_rgb(image.as_raw());
        let mut output = Cursor::new(Vec::new());
        ImageJpegEncoder::new_with_quality(&mut output, self.quality)
            .write_image(&rgb, image.width(), image.height(), image::ColorType::Rgb8)
            .map_err(|e| MarkerError::render(format!("jpeg encode failed: {}", e)))?;
        Ok(output.into_inner())
    }

    fn extension(&self) -> &'static str {
        "jpg"
    }

    fn mime_type(&self) -> &'static str {
        "image/jpeg"
    }
}

/// Lossless PNG encoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngEncoder;

impl ImageEncoder for PngEncoder {
    fn encode(&self, image: &RgbaImage) -> MarkerResult<Vec<u8>> {
        let mut output = Cursor::new(Vec::new());
        ImagePngEncoder::new(&mut output)
            .write_image(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ColorType::Rgba8,
            )
            .map_err(|e| MarkerError::render(format!("png encode failed: {}", e)))?;
        Ok(output.into_inner())
    }

    fn extension(&self) -> &'static str {
        "png"
    }

    fn mime_type(&self) -> &'static str {
        "image/png"
    }
}

/// Encoder for a save format. `Base64` output is JPEG.
pub fn encoder_for(format: SaveFormat, quality: u8) -> Box<dyn ImageEncoder> {
    match format {
        SaveFormat::Png => Box::new(PngEncoder),
        SaveFormat::Jpg | SaveFormat::Base64 => Box::new(JpegEncoder::new(quality)),
    }
}

/// `data:image/jpeg;base64,...` for JPEG bytes.
pub fn jpeg_data_uri(jpeg: &[u8]) -> String {
    let mut uri = String::with_capacity(JPEG_DATA_URI_PREFIX.len() + jpeg.len() * 4 / 3 + 4);
    uri.push_str(JPEG_DATA_URI_PREFIX);
    base64::engine::general_purpose::STANDARD.encode_string(jpeg, &mut uri);
    uri
}

fn rgba_to_rgb(rgba: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(rgba.len() / 4 * 3);
    for chunk in rgba.chunks_exact(4) {
        rgb.extend_from_slice(&chunk[..3]);
    }
    rgb
}
