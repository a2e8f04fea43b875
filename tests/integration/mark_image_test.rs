//! Image Mark End-to-End Tests
//!
//! Tests the complete image flow:
//!   JSON options → resource loading → placement → raster surface → output file
//!
//! Fixtures: 400x300 white background, 40x20 red logo, 10x10 blue badge.

use super::test_harness::{open_rgba, solid_png, MarkerTestHarness};
use base64::Engine;
use image_marker::watermark::{MarkOutput, RawMarkOptions};

const RED: [u8; 4] = [255, 0, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];
const WHITE: [u8; 4] = [255, 255, 255, 255];

#[tokio::test]
async fn test_images_land_on_their_anchors() {
    let harness = MarkerTestHarness::new();

    let output = harness
        .marker
        .mark_json(
            r#"{
                "backgroundImage": {"src": "assets/bg.png"},
                "watermarkImages": [
                    {"src": "assets/logo.png", "position": {"position": "topLeft"}},
                    {"src": "assets/badge.png", "position": {"position": "bottomRight"}}
                ]
            }"#,
        )
        .await
        .unwrap();

    let image = open_rgba(output.as_path().unwrap());
    // logo at (10, 10), badge at (380, 280)
    assert_eq!(image.get_pixel(20, 15).0, RED);
    assert_eq!(image.get_pixel(385, 285).0, BLUE);
    assert_eq!(image.get_pixel(5, 5).0, WHITE);
    assert_eq!(image.get_pixel(395, 295).0, WHITE);
}

#[tokio::test]
async fn test_margin_comes_from_config() {
    let harness = MarkerTestHarness::with_config(|config| config.margin = 0.0);

    let output = harness
        .marker
        .mark_json(
            r#"{"backgroundImage": {"src": "assets/bg.png"},
                "watermarkImages": [{"src": "assets/logo.png", "position": {"position": "topLeft"}}]}"#,
        )
        .await
        .unwrap();

    let image = open_rgba(output.as_path().unwrap());
    assert_eq!(image.get_pixel(1, 1).0, RED);
    assert_eq!(image.get_pixel(45, 1).0, WHITE);
}

#[tokio::test]
async fn test_later_images_draw_on_top() {
    let harness = MarkerTestHarness::new();

    let output = harness
        .marker
        .mark_json(
            r#"{
                "backgroundImage": {"src": "assets/bg.png"},
                "watermarkImages": [
                    {"src": "assets/logo.png", "position": {"position": "center"}},
                    {"src": "assets/badge.png", "position": {"position": "center"}}
                ]
            }"#,
        )
        .await
        .unwrap();

    let image = open_rgba(output.as_path().unwrap());
    assert_eq!(image.get_pixel(200, 150).0, BLUE);
    assert_eq!(image.get_pixel(182, 142).0, RED);
}

#[tokio::test]
async fn test_legacy_watermark_image_is_drawn_last() {
    let harness = MarkerTestHarness::new();

    let output = harness
        .marker
        .mark_json(
            r#"{
                "backgroundImage": {"src": "assets/bg.png"},
                "watermarkImages": [{"src": "assets/logo.png", "position": {"position": "center"}}],
                "watermarkImage": {"src": "assets/badge.png"},
                "watermarkPositions": {"position": "center"}
            }"#,
        )
        .await
        .unwrap();

    let image = open_rgba(output.as_path().unwrap());
    assert_eq!(image.get_pixel(200, 150).0, BLUE);
}

#[tokio::test]
async fn test_scale_and_declared_size() {
    let harness = MarkerTestHarness::new();

    let output = harness
        .marker
        .mark_json(
            r#"{
                "backgroundImage": {"src": "assets/bg.png"},
                "watermarkImages": [
                    {"src": "assets/logo.png", "scale": 0.5, "position": {"position": "topLeft"}},
                    {"src": {"uri": "assets/badge.png", "width": 30, "height": 30},
                     "position": {"X": 100, "Y": 100}}
                ]
            }"#,
        )
        .await
        .unwrap();

    let image = open_rgba(output.as_path().unwrap());
    // logo scaled to 20x10 at (10, 10)
    assert_eq!(image.get_pixel(25, 15).0, RED);
    assert_eq!(image.get_pixel(35, 15).0, WHITE);
    // badge declared 30x30 at (100, 100)
    assert_eq!(image.get_pixel(125, 125).0, BLUE);
    assert_eq!(image.get_pixel(135, 135).0, WHITE);
}

#[tokio::test]
async fn test_half_transparent_watermark_blends() {
    let harness = MarkerTestHarness::new();

    let output = harness
        .marker
        .mark_json(
            r#"{
                "backgroundImage": {"src": "assets/bg.png"},
                "watermarkImages": [{"src": "assets/badge.png", "alpha": 0.5,
                                     "position": {"position": "center"}}]
            }"#,
        )
        .await
        .unwrap();

    let pixel = open_rgba(output.as_path().unwrap()).get_pixel(200, 150).0;
    assert!((120..=136).contains(&pixel[0]), "red channel {}", pixel[0]);
    assert!((120..=136).contains(&pixel[1]), "green channel {}", pixel[1]);
    assert_eq!(pixel[2], 255);
}

#[tokio::test]
async fn test_rotated_background_swaps_dimensions() {
    let harness = MarkerTestHarness::new();

    let output = harness
        .marker
        .mark_json(
            r#"{
                "backgroundImage": {"src": "assets/bg.png", "rotate": 90},
                "watermarkImages": [{"src": "assets/badge.png"}]
            }"#,
        )
        .await
        .unwrap();

    assert_eq!(open_rgba(output.as_path().unwrap()).dimensions(), (300, 400));
}

#[tokio::test]
async fn test_large_background_scale_is_capped_by_max_size() {
    let harness = MarkerTestHarness::new();

    let output = harness
        .marker
        .mark_json(
            r#"{
                "backgroundImage": {"src": "assets/bg.png", "scale": 50},
                "watermarkImages": [{"src": "assets/badge.png"}],
                "maxSize": 100
            }"#,
        )
        .await
        .unwrap();

    assert_eq!(open_rgba(output.as_path().unwrap()).dimensions(), (100, 75));
}

#[tokio::test]
async fn test_inline_and_asset_scheme_sources() {
    let harness = MarkerTestHarness::new();
    let inline = base64::engine::general_purpose::STANDARD.encode(solid_png(50, 40, WHITE));

    let json = format!(
        r#"{{
            "backgroundImage": {{"src": "data:image/png;base64,{}"}},
            "watermarkImages": [{{"src": "asset://badge.png", "position": {{"position": "topLeft"}}}}],
            "filename": "inline.png"
        }}"#,
        inline
    );
    let output = harness.marker.mark_json(&json).await.unwrap();

    assert_eq!(output, MarkOutput::File(harness.output_dir().join("inline.png")));
    let image = open_rgba(output.as_path().unwrap());
    assert_eq!(image.dimensions(), (50, 40));
    assert_eq!(image.get_pixel(15, 15).0, BLUE);
}

#[tokio::test]
async fn test_local_file_source() {
    let harness = MarkerTestHarness::new();
    let local = harness.root().join("local.png");
    std::fs::write(&local, solid_png(10, 10, RED)).unwrap();

    let raw = RawMarkOptions::from_json(&format!(
        r#"{{"backgroundImage": {{"src": "assets/bg.png"}},
            "watermarkImage": {{"src": "file://{}"}},
            "watermarkPositions": {{"position": "topLeft"}}}}"#,
        local.display()
    ))
    .unwrap();

    let output = harness.marker.mark_with_image(&raw).await.unwrap();
    assert_eq!(open_rgba(output.as_path().unwrap()).get_pixel(15, 15).0, RED);
}

#[tokio::test]
async fn test_undecodable_watermark_fails_before_drawing() {
    let harness = MarkerTestHarness::new();
    std::fs::write(harness.root().join("assets").join("junk.png"), b"not an image").unwrap();

    let err = harness
        .marker
        .mark_json(
            r#"{"backgroundImage": {"src": "assets/bg.png"},
                "watermarkImages": [{"src": "assets/junk.png"}]}"#,
        )
        .await
        .unwrap_err();

    assert_eq!(err.code(), "LOAD_IMAGE_FAILED");
    assert!(harness.output_files().is_empty());
}
