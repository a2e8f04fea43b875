//! Color parsing for text, shadow and background styles.
//!
//! Supports `#RGB`, `#RRGGBB` and `#AARRGGBB` (alpha first, the way mobile
//! platforms spell ARGB colors).

use serde::Serialize;

use crate::error::{MarkerError, MarkerResult};

/// Parsed RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn with_alpha(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn black() -> Self {
        Self::new(0, 0, 0)
    }

    pub const fn white() -> Self {
        Self::new(255, 255, 255)
    }

    /// Parse a hex color string.
    ///
    /// ```
    /// use image_marker::watermark::Color;
    ///
    /// assert_eq!(Color::parse("#FF0000").unwrap(), Color::new(255, 0, 0));
    /// assert_eq!(Color::parse("#80FF0000").unwrap().a, 0x80);
    /// assert!(Color::parse("not-a-color").is_err());
    /// ```
    pub fn parse(value: &str) -> MarkerResult<Self> {
        let trimmed = value.trim();
        let hex = trimmed.strip_prefix('#').ok_or_else(|| {
            MarkerError::style(format!("color must start with '#', got '{}'", value))
        })?;

        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(MarkerError::style(format!(
                "color contains non-hex characters: '{}'",
                value
            )));
        }

        let channel = |s: &str| {
            u8::from_str_radix(s, 16)
                .map_err(|_| MarkerError::style(format!("invalid hex digit in '{}'", value)))
        };

        match hex.len() {
            3 => {
                // Each digit doubled: 0xF -> 0xFF
                let r = channel(&hex[0..1])?;
                let g = channel(&hex[1..2])?;
                let b = channel(&hex[2..3])?;
                Ok(Self::new(r * 17, g * 17, b * 17))
            }
            6 => Ok(Self::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            8 => Ok(Self::with_alpha(
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
                channel(&hex[6..8])?,
                channel(&hex[0..2])?,
            )),
            n => Err(MarkerError::style(format!(
                "color must be #RGB, #RRGGBB or #AARRGGBB, got {} hex digits in '{}'",
                n, value
            ))),
        }
    }

    /// Parse an optional color field, keeping `None` when the field is absent.
    pub fn parse_opt(value: Option<&str>) -> MarkerResult<Option<Self>> {
        value.map(Self::parse).transpose()
    }
}
