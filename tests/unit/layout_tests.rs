// Layout and compositing-order tests
//
// These run the pure layout functions against a recording surface, so every
// expectation is exact geometry rather than pixels.

use image::{Rgba, RgbaImage};
use image_marker::watermark::font::{FontMetrics, FontSpec, LineMetrics, MonospaceMetrics};
use image_marker::watermark::options::{
    BackgroundType, ImageSource, Shadow, TextBackgroundStyle, TextStyle,
};
use image_marker::watermark::position::{resolve_percent, resolve_position};
use image_marker::watermark::{
    compose, layout_text, Anchor, AnchorStrategy, Color, DrawOp, LayoutContext, MarkElement,
    MarkPlan, Position, PositionSpec, RecordingSurface, Rect, WatermarkImage, WatermarkText,
};
use rstest::rstest;

/// Every non-empty string measures 60x40.
struct FixedMetrics;

impl FontMetrics for FixedMetrics {
    fn text_width(&self, _font: &FontSpec, text: &str) -> f32 {
        if text.is_empty() {
            0.0
        } else {
            60.0
        }
    }

    fn line_metrics(&self, _font: &FontSpec) -> LineMetrics {
        LineMetrics {
            ascent: 32.0,
            descent: 8.0,
        }
    }
}

fn text(value: &str, position: PositionSpec) -> WatermarkText {
    WatermarkText {
        text: value.to_string(),
        position,
        style: TextStyle::default(),
    }
}

fn image(uri: &str, position: PositionSpec) -> WatermarkImage {
    WatermarkImage {
        image: ImageSource::new(uri),
        position,
    }
}

fn background(kind: BackgroundType) -> TextBackgroundStyle {
    TextBackgroundStyle {
        kind,
        color: Color::white(),
        padding: Default::default(),
        corner_radius: Default::default(),
    }
}

#[rstest]
#[case(Anchor::TopLeft)]
#[case(Anchor::TopCenter)]
#[case(Anchor::TopRight)]
#[case(Anchor::Center)]
#[case(Anchor::BottomLeft)]
#[case(Anchor::BottomCenter)]
#[case(Anchor::BottomRight)]
fn test_inset_anchor_keeps_element_inside_margins(#[case] anchor: Anchor) {
    let (w, h, m) = (640.0, 480.0, 20.0);
    let (ew, eh) = (100.0, 50.0);
    let pos = resolve_position(&PositionSpec::Anchor(anchor), m, w, h, ew, eh, AnchorStrategy::Inset);

    assert!(pos.x >= m && pos.x + ew <= w - m, "{:?} x = {}", anchor, pos.x);
    assert!(pos.y >= m && pos.y + eh <= h - m, "{:?} y = {}", anchor, pos.y);
}

#[rstest]
#[case("50%", 200.0, 100.0)]
#[case("30", 200.0, 30.0)]
#[case("bogus", 200.0, 0.0)]
#[case("25%", 400.0, 100.0)]
fn test_resolve_percent(#[case] value: &str, #[case] relative_to: f32, #[case] expected: f32) {
    assert_eq!(resolve_percent(value, relative_to), expected);
}

#[test]
fn test_centered_text_lands_at_expected_origin() {
    // Test: "hi" measuring 60x40 on 1000x800 centers at (470, 380)
    let ctx = LayoutContext::new(1000.0, 800.0, 20.0, AnchorStrategy::Inset);
    let plan = MarkPlan::for_texts(
        &[text("hi", PositionSpec::Anchor(Anchor::Center))],
        &ctx,
        &FixedMetrics,
    )
    .unwrap();

    let style = match &plan.elements[0] {
        MarkElement::Text(layout) => {
            assert_eq!(layout.position, Position::new(470.0, 380.0));
            layout.style.clone()
        }
        other => panic!("expected text element, got {:?}", other),
    };

    let mut surface = RecordingSurface::new();
    compose(&plan, None, &[], &mut surface).unwrap();

    // Baseline sits one ascent below the top
    assert_eq!(
        surface.ops()[1],
        DrawOp::Text {
            text: "hi".to_string(),
            origin: Position::new(470.0, 412.0),
            style,
        }
    );
}

#[test]
fn test_multiline_height_is_rows_times_line_height() {
    let ctx = LayoutContext::new(1000.0, 800.0, 20.0, AnchorStrategy::Inset);
    let layout = layout_text(
        &text("a\nb\nc", PositionSpec::Default),
        &ctx,
        &MonospaceMetrics::default(),
    )
    .unwrap();

    assert_eq!(layout.rows.len(), 3);
    assert_eq!(layout.bounds.height(), 3.0 * layout.line_height);
}

#[test]
fn test_layout_is_idempotent() {
    let ctx = LayoutContext::new(800.0, 600.0, 20.0, AnchorStrategy::Inset);
    let mut mark = text("repeat me", PositionSpec::Anchor(Anchor::BottomRight));
    mark.style.rotate = 30.0;
    mark.style.underline = true;

    let metrics = MonospaceMetrics::default();
    let first = MarkPlan::for_texts(&[mark.clone()], &ctx, &metrics).unwrap();
    let second = MarkPlan::for_texts(&[mark], &ctx, &metrics).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_images_compose_in_list_order() {
    // Test: [A(topLeft), B(bottomRight)] on 500x500, margin 10, B is 50x50
    let ctx = LayoutContext::new(500.0, 500.0, 10.0, AnchorStrategy::Inset);
    let marks = [
        image("a.png", PositionSpec::Anchor(Anchor::TopLeft)),
        image("b.png", PositionSpec::Anchor(Anchor::BottomRight)),
    ];
    let plan = MarkPlan::for_images(&marks, &[(30, 30), (50, 50)], &ctx).unwrap();

    let decoded = [
        RgbaImage::from_pixel(30, 30, Rgba([255, 0, 0, 255])),
        RgbaImage::from_pixel(50, 50, Rgba([0, 0, 255, 255])),
    ];
    let canvas = RgbaImage::new(500, 500);

    let mut surface = RecordingSurface::new();
    compose(&plan, Some(&canvas), &decoded, &mut surface).unwrap();

    assert_eq!(
        surface.into_ops(),
        vec![
            DrawOp::Image {
                width: 500,
                height: 500,
                dest: Rect::new(0.0, 0.0, 500.0, 500.0),
                alpha: 1.0,
            },
            DrawOp::Save,
            DrawOp::Image {
                width: 30,
                height: 30,
                dest: Rect::new(10.0, 10.0, 40.0, 40.0),
                alpha: 1.0,
            },
            DrawOp::Restore,
            DrawOp::Save,
            DrawOp::Image {
                width: 50,
                height: 50,
                dest: Rect::new(440.0, 440.0, 490.0, 490.0),
                alpha: 1.0,
            },
            DrawOp::Restore,
        ]
    );
}

#[test]
fn test_text_draw_order_with_background_shadow_and_underline() {
    let ctx = LayoutContext::new(400.0, 300.0, 10.0, AnchorStrategy::Inset);
    let mut mark = text("hi", PositionSpec::Anchor(Anchor::TopLeft));
    mark.style.underline = true;
    mark.style.rotate = 45.0;
    mark.style.shadow = Some(Shadow {
        radius: 2.0,
        dx: 1.0,
        dy: 1.0,
        color: Color::black(),
    });
    mark.style.background = Some(background(BackgroundType::Fit));

    let plan = MarkPlan::for_texts(&[mark], &ctx, &FixedMetrics).unwrap();
    let mut surface = RecordingSurface::new();
    compose(&plan, None, &[], &mut surface).unwrap();

    let kinds: Vec<&str> = surface
        .ops()
        .iter()
        .map(|op| match op {
            DrawOp::Save => "save",
            DrawOp::Restore => "restore",
            DrawOp::Rotate { .. } => "rotate",
            DrawOp::Rect { .. } => "rect",
            DrawOp::SetShadow(Some(_)) => "shadow-on",
            DrawOp::SetShadow(None) => "shadow-off",
            DrawOp::Text { .. } => "text",
            DrawOp::Line { .. } => "line",
            _ => "other",
        })
        .collect();

    assert_eq!(
        kinds,
        vec!["save", "rotate", "rect", "shadow-on", "text", "line", "shadow-off", "restore"]
    );
    assert_eq!(surface.depth(), 0);

    match &surface.ops()[1] {
        DrawOp::Rotate { degrees, center } => {
            assert_eq!(*degrees, 45.0);
            // Fit background equals the text bounds (10, 10)-(70, 50)
            assert_eq!(*center, Position::new(40.0, 30.0));
        }
        other => panic!("expected rotate, got {:?}", other),
    }
}

#[test]
fn test_stretch_x_background_spans_canvas_width() {
    let ctx = LayoutContext::new(400.0, 300.0, 10.0, AnchorStrategy::Inset);
    let mut mark = text("hi", PositionSpec::Anchor(Anchor::Center));
    mark.style.background = Some(background(BackgroundType::StretchX));

    let layout = layout_text(&mark, &ctx, &FixedMetrics).unwrap();
    let bounds = layout.background.unwrap().shape.bounds();
    assert_eq!(bounds.left, 0.0);
    assert_eq!(bounds.right, 400.0);
    assert_eq!(bounds.top, layout.bounds.top);
    assert_eq!(bounds.bottom, layout.bounds.bottom);
}

#[rstest]
#[case(r#"{"X": 100}"#, Position::new(10.0, 10.0))]
#[case(r#"{"Y": 100}"#, Position::new(10.0, 10.0))]
#[case(r#"{"X": 100, "Y": 40}"#, Position::new(100.0, 40.0))]
fn test_single_axis_image_offset_uses_default_corner(
    #[case] position: &str,
    #[case] expected: Position,
) {
    // Test: 50x50 image on 500x500, margin 10
    let json = format!(
        r#"{{"backgroundImage": {{"src": "bg.png"}},
            "watermarkImages": [{{"src": "a.png", "position": {}}}]}}"#,
        position
    );
    let raw = image_marker::watermark::RawMarkOptions::from_json(&json).unwrap();
    let request = image_marker::watermark::MarkRequest::from_raw(
        &raw,
        &image_marker::watermark::options::RequestDefaults::default(),
    )
    .unwrap();
    let image_marker::watermark::Watermarks::Images(marks) = &request.watermarks else {
        panic!("expected image watermarks");
    };

    let ctx = LayoutContext::new(500.0, 500.0, 10.0, AnchorStrategy::Inset);
    let placements =
        image_marker::watermark::place_images(marks, &[(50, 50)], &ctx).unwrap();
    assert_eq!(placements[0].position, expected);
}
