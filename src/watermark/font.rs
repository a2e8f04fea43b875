//! Font metrics for text layout.
//!
//! The layout engine never touches glyph data directly; it asks a
//! [`FontMetrics`] implementation for string widths and line metrics.
//! [`FontBook`] answers from real font files (via `ab_glyph`), and
//! [`MonospaceMetrics`] gives a deterministic approximation when no font file
//! is available.

use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{MarkerError, MarkerResult};

/// Font family plus pixel size.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FontSpec {
    pub family: Option<String>,
    pub size: f32,
}

impl FontSpec {
    pub fn new(family: Option<String>, size: f32) -> Self {
        Self { family, size }
    }
}

/// Vertical metrics of one line, in pixels. Both values are positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LineMetrics {
    pub ascent: f32,
    pub descent: f32,
}

impl LineMetrics {
    pub fn line_height(&self) -> f32 {
        self.ascent + self.descent
    }
}

/// Source of text measurements.
pub trait FontMetrics {
    /// Advance width of `text` on a single line.
    fn text_width(&self, font: &FontSpec, text: &str) -> f32;

    /// Ascent/descent for the font at its size.
    fn line_metrics(&self, font: &FontSpec) -> LineMetrics;
}

/// Fixed-advance approximation: every character is `advance * size` wide.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceMetrics {
    pub advance: f32,
    pub ascent: f32,
    pub descent: f32,
}

impl Default for MonospaceMetrics {
    fn default() -> Self {
        Self {
            advance: 0.6,
            ascent: 0.8,
            descent: 0.2,
        }
    }
}

impl FontMetrics for MonospaceMetrics {
    fn text_width(&self, font: &FontSpec, text: &str) -> f32 {
        text.chars().count() as f32 * self.advance * font.size
    }

    fn line_metrics(&self, font: &FontSpec) -> LineMetrics {
        LineMetrics {
            ascent: self.ascent * font.size,
            descent: self.descent * font.size,
        }
    }
}

/// Registered font files keyed by family name (the file stem).
#[derive(Clone, Default)]
pub struct FontBook {
    families: BTreeMap<String, FontArc>,
    default_family: Option<String>,
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook")
            .field("families", &self.families.keys().collect::<Vec<_>>())
            .field("default_family", &self.default_family)
            .finish()
    }
}

const FONT_EXTENSIONS: &[&str] = &["ttf", "otf"];

/// Collect font files under `root`, descending at most `max_depth` levels.
///
/// Font directories are flat or one or two levels deep, so an explicit
/// work list is enough.
pub fn find_font_files(root: &Path, max_depth: usize) -> MarkerResult<Vec<PathBuf>> {
    let mut found = Vec::new();
    let mut pending = vec![(root.to_path_buf(), 0usize)];

    while let Some((dir, depth)) = pending.pop() {
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if depth == 0 => return Err(MarkerError::Io(e)),
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "Skipping unreadable font directory");
                continue;
            }
        };

        for entry in entries {
            let path = entry?.path();
            if path.is_dir() {
                if depth < max_depth {
                    pending.push((path, depth + 1));
                }
            } else if path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| FONT_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
                .unwrap_or(false)
            {
                found.push(path);
            }
        }
    }

    found.sort();
    Ok(found)
}

impl FontBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every font file found under `dir`.
    pub fn discover(dir: &Path, max_depth: usize) -> MarkerResult<Self> {
        let mut book = Self::new();
        for path in find_font_files(dir, max_depth)? {
            let Some(family) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let bytes = std::fs::read(&path)?;
            match book.insert(family, bytes) {
                Ok(()) => tracing::debug!(family, path = %path.display(), "Registered font"),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Ignoring unparsable font file")
                }
            }
        }
        Ok(book)
    }

    /// Register a font from raw file bytes.
    pub fn insert(&mut self, family: &str, bytes: Vec<u8>) -> MarkerResult<()> {
        let font = FontArc::try_from_vec(bytes)
            .map_err(|e| MarkerError::style(format!("invalid font data for '{}': {}", family, e)))?;
        self.families.insert(family.to_string(), font);
        Ok(())
    }

    pub fn set_default(&mut self, family: impl Into<String>) {
        self.default_family = Some(family.into());
    }

    pub fn families(&self) -> impl Iterator<Item = &str> {
        self.families.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    /// Font for `family`, falling back to the default family and then to the
    /// first registered family.
    pub fn resolve(&self, family: Option<&str>) -> Option<&FontArc> {
        family
            .and_then(|f| self.families.get(f))
            .or_else(|| {
                self.default_family
                    .as_deref()
                    .and_then(|f| self.families.get(f))
            })
            .or_else(|| self.families.values().next())
    }
}

/// Advance width of `text` with kerning, as `ab_glyph` lays it out.
pub fn glyph_advance(font: &FontArc, size: f32, text: &str) -> f32 {
    let scaled = font.as_scaled(PxScale::from(size));
    let mut width = 0.0f32;
    let mut prev_glyph: Option<ab_glyph::GlyphId> = None;

    for c in text.chars() {
        let glyph_id = scaled.glyph_id(c);
        if let Some(prev) = prev_glyph {
            width += scaled.kern(prev, glyph_id);
        }
        width += scaled.h_advance(glyph_id);
        prev_glyph = Some(glyph_id);
    }

    width
}

impl FontMetrics for FontBook {
    fn text_width(&self, font: &FontSpec, text: &str) -> f32 {
        match self.resolve(font.family.as_deref()) {
            Some(f) => glyph_advance(f, font.size, text),
            None => MonospaceMetrics::default().text_width(font, text),
        }
    }

    fn line_metrics(&self, font: &FontSpec) -> LineMetrics {
        match self.resolve(font.family.as_deref()) {
            Some(f) => {
                let scaled = f.as_scaled(PxScale::from(font.size));
                LineMetrics {
                    ascent: scaled.ascent().abs(),
                    descent: scaled.descent().abs(),
                }
            }
            None => MonospaceMetrics::default().line_metrics(font),
        }
    }
}
