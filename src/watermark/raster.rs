//! Raster drawing surface backed by a tiny-skia pixmap.
//!
//! Glyph runs are built from `ab_glyph` outlines into a single path per run
//! and filled (plus stroked for synthetic bold). Shapes drawn while a shadow
//! is attached are queued; when the shadow is detached they are painted into
//! one layer sized to their bounds, blurred, composited, and then drawn on top.

use ab_glyph::{Font, FontArc, OutlineCurve, Point, PxScale, ScaleFont};
use image::RgbaImage;
use tiny_skia::{
    FillRule, IntSize, Paint, Path, PathBuilder, Pixmap, PixmapPaint, Stroke, Transform,
};

use super::color::Color;
use super::compositor::DrawingSurface;
use super::font::{FontBook, MonospaceMetrics};
use super::geometry::{CornerPath, PathCommand, Position, Rect};
use super::options::Shadow;
use super::text_layout::{Decoration, RunStyle};
use crate::error::{MarkerError, MarkerResult};

#[derive(Debug, Clone, Copy)]
struct SurfaceState {
    transform: Transform,
    shadow: Option<Shadow>,
}

impl Default for SurfaceState {
    fn default() -> Self {
        Self {
            transform: Transform::identity(),
            shadow: None,
        }
    }
}

#[derive(Clone)]
enum Shape {
    Fill(Path),
    Stroke(Path, f32),
}

impl Shape {
    /// Device-space bounds under `transform`, including stroke width and
    /// one pixel of anti-aliasing.
    fn device_bounds(&self, transform: Transform) -> (f32, f32, f32, f32) {
        let (path, pad) = match self {
            Shape::Fill(path) => (path, 0.0),
            Shape::Stroke(path, width) => (path, width / 2.0),
        };
        let b = path.bounds();
        let mut corners = [
            tiny_skia::Point::from_xy(b.left() - pad, b.top() - pad),
            tiny_skia::Point::from_xy(b.right() + pad, b.top() - pad),
            tiny_skia::Point::from_xy(b.right() + pad, b.bottom() + pad),
            tiny_skia::Point::from_xy(b.left() - pad, b.bottom() + pad),
        ];
        transform.map_points(&mut corners);
        corners.iter().fold(
            (f32::MAX, f32::MAX, f32::MIN, f32::MIN),
            |(l, t, r, bt), p| (l.min(p.x - 1.0), t.min(p.y - 1.0), r.max(p.x + 1.0), bt.max(p.y + 1.0)),
        )
    }
}

struct Painted {
    shapes: Vec<Shape>,
    color: Color,
    transform: Transform,
}

/// Shapes waiting for their shared shadow layer.
struct ShadowBatch {
    shadow: Shadow,
    painted: Vec<Painted>,
}

/// [`DrawingSurface`] that paints into an RGBA pixmap.
pub struct RasterSurface<'f> {
    pixmap: Pixmap,
    fonts: &'f FontBook,
    state: SurfaceState,
    stack: Vec<SurfaceState>,
    pending: Option<ShadowBatch>,
}

impl<'f> RasterSurface<'f> {
    /// Create a transparent surface.
    pub fn new(width: u32, height: u32, fonts: &'f FontBook) -> MarkerResult<Self> {
        let pixmap = Pixmap::new(width, height).ok_or_else(|| {
            MarkerError::render(format!("cannot allocate {}x{} surface", width, height))
        })?;
        Ok(Self {
            pixmap,
            fonts,
            state: SurfaceState::default(),
            stack: Vec::new(),
            pending: None,
        })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Un-premultiplied RGBA copy of the surface. Queued shadowed shapes
    /// are painted first.
    pub fn to_image(&mut self) -> MarkerResult<RgbaImage> {
        self.flush_shadow()?;
        let mut data = Vec::with_capacity(self.pixmap.data().len());
        for pixel in self.pixmap.pixels() {
            let c = pixel.demultiply();
            data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        RgbaImage::from_raw(self.width(), self.height(), data)
            .ok_or_else(|| MarkerError::render("surface buffer size mismatch"))
    }

    fn paint_shapes(&mut self, shapes: &[Shape], color: Color, transform: Transform) -> MarkerResult<()> {
        let Some(shadow) = self.state.shadow else {
            self.flush_shadow()?;
            fill_shapes(&mut self.pixmap, shapes, &paint_for(color), transform);
            return Ok(());
        };

        if self.pending.as_ref().is_some_and(|batch| batch.shadow != shadow) {
            self.flush_shadow()?;
        }
        let batch = self.pending.get_or_insert_with(|| ShadowBatch {
            shadow,
            painted: Vec::new(),
        });
        batch.painted.push(Painted {
            shapes: shapes.to_vec(),
            color,
            transform,
        });
        Ok(())
    }

    /// Paint the queued shadow layer, then the queued shapes over it.
    fn flush_shadow(&mut self) -> MarkerResult<()> {
        let Some(batch) = self.pending.take() else {
            return Ok(());
        };
        let shadow = batch.shadow;

        if let Some((left, top, width, height)) = self.shadow_region(&batch) {
            let mut layer = Pixmap::new(width, height).ok_or_else(|| {
                MarkerError::render(format!("cannot allocate {}x{} shadow layer", width, height))
            })?;
            let paint = paint_for(shadow.color);
            for painted in &batch.painted {
                let local = painted.transform.post_translate(-(left as f32), -(top as f32));
                fill_shapes(&mut layer, &painted.shapes, &paint, local);
            }
            blur_premultiplied(layer.data_mut(), width, height, shadow.radius);
            self.pixmap.draw_pixmap(
                left,
                top,
                layer.as_ref(),
                &PixmapPaint::default(),
                Transform::from_translate(shadow.dx, shadow.dy),
                None,
            );
        }

        for painted in &batch.painted {
            fill_shapes(
                &mut self.pixmap,
                &painted.shapes,
                &paint_for(painted.color),
                painted.transform,
            );
        }
        Ok(())
    }

    /// Layer rectangle `(left, top, width, height)` in canvas pixels: the
    /// shapes' bounds grown by the blur reach and clipped to the part of the
    /// canvas the offset shadow can land on.
    fn shadow_region(&self, batch: &ShadowBatch) -> Option<(i32, i32, u32, u32)> {
        let (mut l, mut t, mut r, mut b) = (f32::MAX, f32::MAX, f32::MIN, f32::MIN);
        for painted in &batch.painted {
            for shape in &painted.shapes {
                let (sl, st, sr, sb) = shape.device_bounds(painted.transform);
                l = l.min(sl);
                t = t.min(st);
                r = r.max(sr);
                b = b.max(sb);
            }
        }

        let shadow = batch.shadow;
        let reach = blur_reach(shadow.radius) as f32;
        let visible_l = -shadow.dx - reach;
        let visible_t = -shadow.dy - reach;
        let visible_r = self.width() as f32 - shadow.dx + reach;
        let visible_b = self.height() as f32 - shadow.dy + reach;

        let left = (l - reach).max(visible_l).floor();
        let top = (t - reach).max(visible_t).floor();
        let right = (r + reach).min(visible_r).ceil();
        let bottom = (b + reach).min(visible_b).ceil();
        if !(right > left && bottom > top) {
            return None;
        }
        Some((left as i32, top as i32, (right - left) as u32, (bottom - top) as u32))
    }
}

fn paint_for(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = true;
    paint
}

fn fill_shapes(target: &mut Pixmap, shapes: &[Shape], paint: &Paint, transform: Transform) {
    for shape in shapes {
        match shape {
            Shape::Fill(path) => target.fill_path(path, paint, FillRule::Winding, transform, None),
            Shape::Stroke(path, width) => {
                let stroke = Stroke {
                    width: *width,
                    ..Stroke::default()
                };
                target.stroke_path(path, paint, &stroke, transform, None)
            }
        }
    }
}

/// Premultiplied pixmap copy of an RGBA image.
pub fn pixmap_from_image(image: &RgbaImage) -> MarkerResult<Pixmap> {
    let size = IntSize::from_wh(image.width(), image.height())
        .ok_or_else(|| MarkerError::render("cannot draw an empty image"))?;

    let mut data = Vec::with_capacity(image.as_raw().len());
    for pixel in image.pixels() {
        let [r, g, b, a] = pixel.0;
        let premultiply = |c: u8| ((c as u16 * a as u16 + 127) / 255) as u8;
        data.extend_from_slice(&[premultiply(r), premultiply(g), premultiply(b), a]);
    }

    Pixmap::from_vec(data, size).ok_or_else(|| MarkerError::render("invalid image buffer"))
}

/// Separable gaussian blur over premultiplied RGBA8, in place.
///
/// `radius` follows the canvas shadow convention: sigma is half the radius.
pub fn blur_premultiplied(data: &mut [u8], width: u32, height: u32, radius: f32) {
    let reach = blur_reach(radius);
    if reach == 0 || width == 0 || height == 0 {
        return;
    }
    let sigma = radius / 2.0;
    let mut kernel: Vec<f32> = (-reach..=reach)
        .map(|i| (-(i * i) as f32 / (2.0 * sigma * sigma)).exp())
        .collect();
    let sum: f32 = kernel.iter().sum();
    kernel.iter_mut().for_each(|k| *k /= sum);

    let (w, h) = (width as i32, height as i32);
    let mut tmp = vec![0u8; data.len()];

    // Horizontal then vertical pass, clamping at the edges
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0f32; 4];
            for (ki, k) in kernel.iter().enumerate() {
                let sx = (x + ki as i32 - reach).clamp(0, w - 1);
                let idx = ((y * w + sx) * 4) as usize;
                for c in 0..4 {
                    acc[c] += data[idx + c] as f32 * k;
                }
            }
            let out = ((y * w + x) * 4) as usize;
            for c in 0..4 {
                tmp[out + c] = acc[c].round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    for y in 0..h {
        for x in 0..w {
            let mut acc = [0f32; 4];
            for (ki, k) in kernel.iter().enumerate() {
                let sy = (y + ki as i32 - reach).clamp(0, h - 1);
                let idx = ((sy * w + x) * 4) as usize;
                for c in 0..4 {
                    acc[c] += tmp[idx + c] as f32 * k;
                }
            }
            let out = ((y * w + x) * 4) as usize;
            for c in 0..4 {
                data[out + c] = acc[c].round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    // Keep premultiplied invariant: color <= alpha
    for px in data.chunks_exact_mut(4) {
        let a = px[3];
        for c in &mut px[..3] {
            *c = (*c).min(a);
        }
    }
}

/// Kernel half-width in pixels for a shadow `radius`; 0 when no blur applies.
fn blur_reach(radius: f32) -> i32 {
    let sigma = radius / 2.0;
    if sigma < 0.5 {
        0
    } else {
        (sigma * 3.0).ceil() as i32
    }
}

/// Path of a glyph run in run-local pixels: origin on the baseline, y down.
pub fn glyph_run_path(font: &FontArc, size: f32, text: &str) -> Option<Path> {
    let scaled = font.as_scaled(PxScale::from(size));
    let (sx, sy) = (scaled.h_scale_factor(), scaled.v_scale_factor());
    let mut pb = PathBuilder::new();
    let mut caret = 0.0f32;
    let mut prev = None;

    for c in text.chars() {
        let id = scaled.glyph_id(c);
        if let Some(p) = prev {
            caret += scaled.kern(p, id);
        }

        if let Some(outline) = font.outline(id) {
            let map = |p: Point| (caret + p.x * sx, -p.y * sy);
            let mut last: Option<Point> = None;
            for curve in &outline.curves {
                let (start, end) = match curve {
                    OutlineCurve::Line(a, b) => (*a, *b),
                    OutlineCurve::Quad(a, _, b) => (*a, *b),
                    OutlineCurve::Cubic(a, _, _, b) => (*a, *b),
                };
                if last != Some(start) {
                    let (x, y) = map(start);
                    pb.move_to(x, y);
                }
                match curve {
                    OutlineCurve::Line(_, b) => {
                        let (x, y) = map(*b);
                        pb.line_to(x, y);
                    }
                    OutlineCurve::Quad(_, ctrl, b) => {
                        let (cx, cy) = map(*ctrl);
                        let (x, y) = map(*b);
                        pb.quad_to(cx, cy, x, y);
                    }
                    OutlineCurve::Cubic(_, c1, c2, b) => {
                        let (c1x, c1y) = map(*c1);
                        let (c2x, c2y) = map(*c2);
                        let (x, y) = map(*b);
                        pb.cubic_to(c1x, c1y, c2x, c2y, x, y);
                    }
                }
                last = Some(end);
            }
        }

        caret += scaled.h_advance(id);
        prev = Some(id);
    }

    pb.finish()
}

/// Placeholder boxes for each visible character, used when no font file is
/// registered. Boxes follow [`MonospaceMetrics`] so they match the layout.
fn placeholder_run_path(size: f32, text: &str) -> Option<Path> {
    let metrics = MonospaceMetrics::default();
    let advance = metrics.advance * size;
    let ascent = metrics.ascent * size;
    let mut pb = PathBuilder::new();

    for (i, c) in text.chars().enumerate() {
        if c.is_whitespace() {
            continue;
        }
        let left = i as f32 * advance + advance * 0.1;
        if let Some(rect) = tiny_skia::Rect::from_xywh(left, -ascent * 0.9, advance * 0.8, ascent * 0.9) {
            pb.push_rect(rect);
        }
    }

    pb.finish()
}

fn corner_path(path: &CornerPath) -> Option<Path> {
    let mut pb = PathBuilder::new();
    for command in path.commands() {
        match command {
            PathCommand::MoveTo(p) => pb.move_to(p.x, p.y),
            PathCommand::LineTo(p) => pb.line_to(p.x, p.y),
            PathCommand::QuadTo { control, end } => pb.quad_to(control.x, control.y, end.x, end.y),
            PathCommand::Close => pb.close(),
        }
    }
    pb.finish()
}

impl DrawingSurface for RasterSurface<'_> {
    fn save(&mut self) -> MarkerResult<()> {
        self.stack.push(self.state);
        Ok(())
    }

    fn restore(&mut self) -> MarkerResult<()> {
        self.flush_shadow()?;
        self.state = self
            .stack
            .pop()
            .ok_or_else(|| MarkerError::render("restore without matching save"))?;
        Ok(())
    }

    fn translate(&mut self, dx: f32, dy: f32) -> MarkerResult<()> {
        self.state.transform = self.state.transform.pre_translate(dx, dy);
        Ok(())
    }

    fn rotate(&mut self, degrees: f32, center: Position) -> MarkerResult<()> {
        let (sin, cos) = degrees.to_radians().sin_cos();
        let rotation = Transform::from_row(cos, sin, -sin, cos, 0.0, 0.0);
        self.state.transform = self
            .state
            .transform
            .pre_translate(center.x, center.y)
            .pre_concat(rotation)
            .pre_translate(-center.x, -center.y);
        Ok(())
    }

    fn set_shadow(&mut self, shadow: Option<&Shadow>) -> MarkerResult<()> {
        self.flush_shadow()?;
        self.state.shadow = shadow.copied();
        Ok(())
    }

    fn draw_rect(&mut self, rect: &Rect, color: Color) -> MarkerResult<()> {
        let Some(r) = tiny_skia::Rect::from_ltrb(rect.left, rect.top, rect.right, rect.bottom) else {
            // Zero-area rect
            return Ok(());
        };
        let transform = self.state.transform;
        self.paint_shapes(&[Shape::Fill(PathBuilder::from_rect(r))], color, transform)
    }

    fn draw_path(&mut self, path: &CornerPath, color: Color) -> MarkerResult<()> {
        let Some(p) = corner_path(path) else {
            return Ok(());
        };
        let transform = self.state.transform;
        self.paint_shapes(&[Shape::Fill(p)], color, transform)
    }

    fn draw_image(&mut self, image: &RgbaImage, dest: &Rect, alpha: f32) -> MarkerResult<()> {
        self.flush_shadow()?;
        let source = pixmap_from_image(image)?;
        let paint = PixmapPaint {
            opacity: alpha.clamp(0.0, 1.0),
            quality: tiny_skia::FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        let transform = self
            .state
            .transform
            .pre_translate(dest.left, dest.top)
            .pre_scale(
                dest.width() / image.width() as f32,
                dest.height() / image.height() as f32,
            );
        self.pixmap
            .draw_pixmap(0, 0, source.as_ref(), &paint, transform, None);
        Ok(())
    }

    fn draw_text_run(&mut self, text: &str, origin: Position, style: &RunStyle) -> MarkerResult<()> {
        let path = match self.fonts.resolve(style.font.family.as_deref()) {
            Some(font) => glyph_run_path(font, style.font.size, text),
            None => {
                tracing::warn!(
                    family = style.font.family.as_deref().unwrap_or("default"),
                    "No font registered, drawing placeholder glyphs"
                );
                placeholder_run_path(style.font.size, text)
            }
        };
        let Some(path) = path else {
            // Whitespace only
            return Ok(());
        };

        let shear = Transform::from_row(1.0, 0.0, style.shear, 1.0, 0.0, 0.0);
        let transform = self
            .state
            .transform
            .pre_translate(origin.x, origin.y)
            .pre_concat(shear);

        let mut shapes = vec![Shape::Fill(path.clone())];
        if style.bold {
            shapes.push(Shape::Stroke(path, (style.font.size / 24.0).max(1.0)));
        }
        self.paint_shapes(&shapes, style.color, transform)
    }

    fn draw_line(&mut self, line: &Decoration, color: Color) -> MarkerResult<()> {
        let mut pb = PathBuilder::new();
        pb.move_to(line.start.x, line.start.y);
        pb.line_to(line.end.x, line.end.y);
        let Some(path) = pb.finish() else {
            return Ok(());
        };
        let transform = self.state.transform;
        self.paint_shapes(&[Shape::Stroke(path, line.width)], color, transform)
    }
}
