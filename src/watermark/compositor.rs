//! Drawing order for a mark request.
//!
//! A [`MarkPlan`] is the complete, ordered geometry of one request. [`compose`]
//! replays it against a [`DrawingSurface`]: the background first, then each
//! element inside its own `save`/`restore` bracket, rotated around its pivot
//! when it has one.
//!
//! # Example
//!
//! ```
//! use image_marker::watermark::compositor::{compose, DrawOp, MarkPlan, RecordingSurface};
//!
//! let plan = MarkPlan::new(100.0, 80.0, Vec::new());
//! let mut surface = RecordingSurface::new();
//! compose(&plan, None, &[], &mut surface).unwrap();
//! assert!(surface.ops().is_empty());
//! ```

use image::RgbaImage;
use serde::Serialize;

use super::color::Color;
use super::font::FontMetrics;
use super::geometry::{CornerPath, Position, Rect};
use super::image_placer::{place_images, ImagePlacement};
use super::options::{Shadow, WatermarkImage, WatermarkText};
use super::position::LayoutContext;
use super::text_layout::{layout_text, BackgroundShape, Decoration, RunStyle, TextLayout};
use crate::error::{MarkerError, MarkerResult};

/// One positioned watermark.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum MarkElement {
    Text(TextLayout),
    Image(ImagePlacement),
}

/// Ordered geometry of a whole request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkPlan {
    pub canvas_width: f32,
    pub canvas_height: f32,
    /// Opacity of the background image
    pub background_alpha: f32,
    pub elements: Vec<MarkElement>,
}

impl MarkPlan {
    pub fn new(canvas_width: f32, canvas_height: f32, elements: Vec<MarkElement>) -> Self {
        Self {
            canvas_width,
            canvas_height,
            background_alpha: 1.0,
            elements,
        }
    }

    pub fn with_background_alpha(mut self, alpha: f32) -> Self {
        self.background_alpha = alpha.clamp(0.0, 1.0);
        self
    }

    /// Lay out text watermarks in list order.
    pub fn for_texts(
        texts: &[WatermarkText],
        ctx: &LayoutContext,
        metrics: &dyn FontMetrics,
    ) -> MarkerResult<Self> {
        let elements = texts
            .iter()
            .map(|t| layout_text(t, ctx, metrics).map(MarkElement::Text))
            .collect::<MarkerResult<Vec<_>>>()?;
        Ok(Self::new(ctx.canvas_width, ctx.canvas_height, elements))
    }

    /// Place image watermarks in list order.
    pub fn for_images(
        images: &[WatermarkImage],
        decoded_sizes: &[(u32, u32)],
        ctx: &LayoutContext,
    ) -> MarkerResult<Self> {
        let elements = place_images(images, decoded_sizes, ctx)?
            .into_iter()
            .map(MarkElement::Image)
            .collect();
        Ok(Self::new(ctx.canvas_width, ctx.canvas_height, elements))
    }
}

/// Target of composition.
///
/// Coordinates are canvas pixels under the current transform. `save` pushes
/// the transform and shadow state, `restore` pops it.
pub trait DrawingSurface {
    fn save(&mut self) -> MarkerResult<()>;
    fn restore(&mut self) -> MarkerResult<()>;
    fn translate(&mut self, dx: f32, dy: f32) -> MarkerResult<()>;
    /// Rotate clockwise by `degrees` around `center`.
    fn rotate(&mut self, degrees: f32, center: Position) -> MarkerResult<()>;
    /// Shadow applied to subsequent text and line draws; `None` detaches it.
    fn set_shadow(&mut self, shadow: Option<&Shadow>) -> MarkerResult<()>;
    fn draw_rect(&mut self, rect: &Rect, color: Color) -> MarkerResult<()>;
    fn draw_path(&mut self, path: &CornerPath, color: Color) -> MarkerResult<()>;
    /// Draw `image` scaled into `dest` with an extra opacity factor.
    fn draw_image(&mut self, image: &RgbaImage, dest: &Rect, alpha: f32) -> MarkerResult<()>;
    /// Draw one glyph run with its baseline origin at `origin`.
    fn draw_text_run(&mut self, text: &str, origin: Position, style: &RunStyle) -> MarkerResult<()>;
    fn draw_line(&mut self, line: &Decoration, color: Color) -> MarkerResult<()>;
}

/// Replay `plan` onto `surface`.
///
/// `images[i]` is the decoded pixel data for the placement with `index == i`.
/// The first failing surface call aborts composition.
pub fn compose<S: DrawingSurface + ?Sized>(
    plan: &MarkPlan,
    background: Option<&RgbaImage>,
    images: &[RgbaImage],
    surface: &mut S,
) -> MarkerResult<()> {
    if let Some(bg) = background {
        let dest = Rect::new(0.0, 0.0, plan.canvas_width, plan.canvas_height);
        surface.draw_image(bg, &dest, plan.background_alpha)?;
    }

    for element in &plan.elements {
        surface.save()?;
        match element {
            MarkElement::Text(layout) => {
                if let Some(rotation) = layout.rotation {
                    surface.rotate(rotation.degrees, rotation.center)?;
                }
                draw_text(layout, surface)?;
            }
            MarkElement::Image(placement) => {
                if let Some(rotation) = placement.rotation {
                    surface.rotate(rotation.degrees, rotation.center)?;
                }
                let image = images.get(placement.index).ok_or_else(|| {
                    MarkerError::render(format!(
                        "no decoded image for watermark {} ({})",
                        placement.index, placement.uri
                    ))
                })?;
                surface.draw_image(image, &placement.bounds(), placement.alpha)?;
            }
        }
        surface.restore()?;
    }

    Ok(())
}

fn draw_text<S: DrawingSurface + ?Sized>(layout: &TextLayout, surface: &mut S) -> MarkerResult<()> {
    if let Some(bg) = &layout.background {
        match &bg.shape {
            BackgroundShape::Rect(rect) => surface.draw_rect(rect, bg.color)?,
            BackgroundShape::Path(path) => surface.draw_path(path, bg.color)?,
        }
    }

    if let Some(shadow) = &layout.shadow {
        surface.set_shadow(Some(shadow))?;
    }

    for row in layout.rows.iter().filter(|r| !r.text.is_empty()) {
        surface.draw_text_run(
            &row.text,
            Position::new(row.x, row.baseline),
            &layout.style,
        )?;
    }
    for line in &layout.decorations {
        surface.draw_line(line, layout.style.color)?;
    }

    if layout.shadow.is_some() {
        surface.set_shadow(None)?;
    }
    Ok(())
}

/// A recorded surface call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DrawOp {
    Save,
    Restore,
    Translate { dx: f32, dy: f32 },
    Rotate { degrees: f32, center: Position },
    SetShadow(Option<Shadow>),
    Rect { rect: Rect, color: Color },
    Path { path: CornerPath, color: Color },
    Image { width: u32, height: u32, dest: Rect, alpha: f32 },
    Text { text: String, origin: Position, style: RunStyle },
    Line { line: Decoration, color: Color },
}

/// Surface that records calls instead of drawing.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    ops: Vec<DrawOp>,
    depth: usize,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<DrawOp> {
        self.ops
    }

    /// Open `save` brackets.
    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl DrawingSurface for RecordingSurface {
    fn save(&mut self) -> MarkerResult<()> {
        self.depth += 1;
        self.ops.push(DrawOp::Save);
        Ok(())
    }

    fn restore(&mut self) -> MarkerResult<()> {
        self.depth = self
            .depth
            .checked_sub(1)
            .ok_or_else(|| MarkerError::render("restore without matching save"))?;
        self.ops.push(DrawOp::Restore);
        Ok(())
    }

    fn translate(&mut self, dx: f32, dy: f32) -> MarkerResult<()> {
        self.ops.push(DrawOp::Translate { dx, dy });
        Ok(())
    }

    fn rotate(&mut self, degrees: f32, center: Position) -> MarkerResult<()> {
        self.ops.push(DrawOp::Rotate { degrees, center });
        Ok(())
    }

    fn set_shadow(&mut self, shadow: Option<&Shadow>) -> MarkerResult<()> {
        self.ops.push(DrawOp::SetShadow(shadow.copied()));
        Ok(())
    }

    fn draw_rect(&mut self, rect: &Rect, color: Color) -> MarkerResult<()> {
        self.ops.push(DrawOp::Rect { rect: *rect, color });
        Ok(())
    }

    fn draw_path(&mut self, path: &CornerPath, color: Color) -> MarkerResult<()> {
        self.ops.push(DrawOp::Path { path: *path, color });
        Ok(())
    }

    fn draw_image(&mut self, image: &RgbaImage, dest: &Rect, alpha: f32) -> MarkerResult<()> {
        self.ops.push(DrawOp::Image {
            width: image.width(),
            height: image.height(),
            dest: *dest,
            alpha,
        });
        Ok(())
    }

    fn draw_text_run(&mut self, text: &str, origin: Position, style: &RunStyle) -> MarkerResult<()> {
        self.ops.push(DrawOp::Text {
            text: text.to_string(),
            origin,
            style: style.clone(),
        });
        Ok(())
    }

    fn draw_line(&mut self, line: &Decoration, color: Color) -> MarkerResult<()> {
        self.ops.push(DrawOp::Line { line: *line, color });
        Ok(())
    }
}
