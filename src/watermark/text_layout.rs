//! Text measurement, wrapping and geometry.
//!
//! [`layout_text`] is a pure function of the text entry, the canvas and a
//! [`FontMetrics`] source. The resulting [`TextLayout`] carries everything the
//! compositor needs: one run per visual row, decoration lines, the background
//! shape and the rotation pivot.

use serde::Serialize;

use super::color::Color;
use super::font::{FontMetrics, FontSpec};
use super::geometry::{CornerPath, Insets, Position, Rect, Rotation};
use super::options::{BackgroundType, Shadow, TextAlign, WatermarkText};
use super::position::LayoutContext;
use crate::error::{MarkerError, MarkerResult};

/// Horizontal shear applied for `italic`.
pub const ITALIC_SHEAR: f32 = -0.25;

const DECORATION_WIDTH: f32 = 2.0;
const BOLD_DECORATION_WIDTH: f32 = 4.0;

/// How glyph runs of one text entry are painted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunStyle {
    pub font: FontSpec,
    pub color: Color,
    /// Horizontal shear factor (x += shear * -y)
    pub shear: f32,
    pub bold: bool,
}

/// One visual row, positioned at its baseline origin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextRow {
    pub text: String,
    pub x: f32,
    pub baseline: f32,
    pub width: f32,
}

/// Underline or strike-through segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Decoration {
    pub start: Position,
    pub end: Position,
    pub width: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum BackgroundShape {
    Rect(Rect),
    Path(CornerPath),
}

impl BackgroundShape {
    pub fn bounds(&self) -> Rect {
        match self {
            Self::Rect(r) => *r,
            Self::Path(p) => p.rect,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextBackground {
    pub shape: BackgroundShape,
    pub color: Color,
}

/// Complete geometry of one text watermark.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextLayout {
    pub position: Position,
    /// Measured block: `position` to `position + (block width, height)`
    pub bounds: Rect,
    pub line_height: f32,
    pub ascent: f32,
    pub rows: Vec<TextRow>,
    pub decorations: Vec<Decoration>,
    pub background: Option<TextBackground>,
    pub rotation: Option<Rotation>,
    pub style: RunStyle,
    pub shadow: Option<Shadow>,
}

/// Split `line` into chunks of roughly `block_width` each.
///
/// Chunks are cut every `round(chars * block_width / line_width)` characters,
/// which assumes evenly wide glyphs; a proportional font can leave a chunk
/// slightly wider than the block.
pub fn wrap_line(line: &str, line_width: f32, block_width: f32) -> Vec<String> {
    if line_width <= block_width || line.is_empty() {
        return vec![line.to_string()];
    }

    let chars: Vec<char> = line.chars().collect();
    let per_row = ((chars.len() as f32 * block_width / line_width).round() as usize).max(1);

    chars
        .chunks(per_row)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// Shear factor for the style's italic and skew settings. An explicit skew
/// angle replaces the italic default.
pub fn shear_for(italic: bool, skew_x_degrees: f32) -> f32 {
    if skew_x_degrees != 0.0 {
        -skew_x_degrees.to_radians().tan()
    } else if italic {
        ITALIC_SHEAR
    } else {
        0.0
    }
}

/// Lay out one text watermark.
pub fn layout_text(
    mark: &WatermarkText,
    ctx: &LayoutContext,
    metrics: &dyn FontMetrics,
) -> MarkerResult<TextLayout> {
    if mark.text.is_empty() {
        return Err(MarkerError::params_required("mark text is required"));
    }

    let style = &mark.style;
    let font = FontSpec::new(style.font_family.clone(), style.font_size);
    let line_metrics = metrics.line_metrics(&font);
    let line_height = line_metrics.line_height();
    let ascent = line_metrics.ascent;

    let padding = style
        .background
        .as_ref()
        .map(|bg| bg.padding.resolve(ctx.canvas_width, ctx.canvas_height))
        .unwrap_or_default();

    // Measure logical lines
    let lines: Vec<(&str, f32)> = mark
        .text
        .split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .map(|l| (l, metrics.text_width(&font, l)))
        .collect();

    let widest = lines.iter().map(|(_, w)| *w).fold(0.0f32, f32::max);
    let mut available = ctx.canvas_width - 2.0 * ctx.margin;
    if style.background.is_some() {
        available -= padding.horizontal();
    }
    let block_width = widest.min(available.max(0.0));

    // Wrap into visual rows
    let mut row_texts = Vec::new();
    for (line, width) in &lines {
        row_texts.extend(wrap_line(line, *width, block_width));
    }

    let height = line_height * row_texts.len() as f32;
    let position = ctx.place(&mark.position, block_width, height);
    let bounds = Rect::from_origin_size(position, block_width, height);

    let rows: Vec<TextRow> = row_texts
        .into_iter()
        .enumerate()
        .map(|(i, text)| {
            let width = metrics.text_width(&font, &text);
            let x = match style.align {
                TextAlign::Left => position.x,
                TextAlign::Center => position.x + (block_width - width) / 2.0,
                TextAlign::Right => position.x + block_width - width,
            };
            TextRow {
                text,
                x,
                baseline: position.y + i as f32 * line_height + ascent,
                width,
            }
        })
        .collect();

    let decorations = decorations_for(&rows, ascent, style.underline, style.strike_through, style.bold);

    let background = style.background.as_ref().map(|bg| {
        let rect = background_rect(bg.kind, &bounds, &padding, ctx);
        let shape = if bg.corner_radius.is_empty() {
            BackgroundShape::Rect(rect)
        } else {
            BackgroundShape::Path(bg.corner_radius.path(rect))
        };
        TextBackground {
            shape,
            color: bg.color,
        }
    });

    let pivot = background
        .as_ref()
        .map(|bg| bg.shape.bounds().center())
        .unwrap_or_else(|| bounds.center());

    tracing::debug!(
        rows = rows.len(),
        x = position.x,
        y = position.y,
        width = block_width,
        height,
        "Laid out text watermark"
    );

    Ok(TextLayout {
        position,
        bounds,
        line_height,
        ascent,
        rows,
        decorations,
        background,
        rotation: Rotation::around(style.rotate, pivot),
        style: RunStyle {
            font,
            color: style.color,
            shear: shear_for(style.italic, style.skew_x),
            bold: style.bold,
        },
        shadow: style.shadow,
    })
}

fn decorations_for(
    rows: &[TextRow],
    ascent: f32,
    underline: bool,
    strike_through: bool,
    bold: bool,
) -> Vec<Decoration> {
    let width = if bold {
        BOLD_DECORATION_WIDTH
    } else {
        DECORATION_WIDTH
    };
    let mut decorations = Vec::new();

    for row in rows.iter().filter(|r| r.width > 0.0) {
        let line_at = |y: f32| Decoration {
            start: Position::new(row.x, y),
            end: Position::new(row.x + row.width, y),
            width,
        };
        if underline {
            decorations.push(line_at(row.baseline + ascent / 4.0));
        }
        if strike_through {
            decorations.push(line_at(row.baseline - ascent / 4.0));
        }
    }

    decorations
}

/// Background rectangle for a measured text block.
pub fn background_rect(
    kind: BackgroundType,
    bounds: &Rect,
    padding: &Insets,
    ctx: &LayoutContext,
) -> Rect {
    let padded = bounds.outset(padding);
    match kind {
        BackgroundType::Fit => padded,
        BackgroundType::StretchX => Rect::new(0.0, padded.top, ctx.canvas_width, padded.bottom),
        BackgroundType::StretchY => Rect::new(padded.left, 0.0, padded.right, ctx.canvas_height),
    }
}
