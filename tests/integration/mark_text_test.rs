//! Text Mark End-to-End Tests
//!
//! Tests the complete text flow:
//!   JSON options → validation → layout → raster surface → encoder → output file
//!
//! Resources come from a temp `assets/` tree; no fonts are registered, so
//! glyphs render as placeholder boxes and metrics are monospace.

use super::test_harness::{open_rgba, MarkerTestHarness};
use image_marker::watermark::{MarkOutput, RawMarkOptions};

#[tokio::test]
async fn test_text_mark_writes_named_file() {
    // Test: a filename without extension gets the save format's extension
    let harness = MarkerTestHarness::new();

    let output = harness
        .marker
        .mark_json(
            r#"{
                "backgroundImage": {"src": "assets/bg.png"},
                "watermarkTexts": [{"text": "hello", "position": {"position": "center"}}],
                "saveFormat": "jpg",
                "quality": 80,
                "filename": "photo"
            }"#,
        )
        .await
        .unwrap();

    let expected = harness.output_dir().join("photo.jpg");
    assert_eq!(output, MarkOutput::File(expected.clone()));
    assert_eq!(harness.output_files(), vec![expected.clone()]);
    assert_eq!(open_rgba(&expected).dimensions(), (400, 300));
}

#[tokio::test]
async fn test_generated_file_name_uses_uuid_suffix() {
    let harness = MarkerTestHarness::new();

    let output = harness
        .marker
        .mark_json(
            r#"{"backgroundImage": {"src": "assets/bg.png"},
                "watermarkTexts": [{"text": "hi"}]}"#,
        )
        .await
        .unwrap();

    let path = output.as_path().unwrap();
    let name = path.file_name().unwrap().to_str().unwrap();
    assert!(name.ends_with("_image_marker.png"), "unexpected name {}", name);
}

#[tokio::test]
async fn test_stretch_x_background_spans_canvas() {
    // Test: stretchX background covers [0, W] across the text's rows
    let harness = MarkerTestHarness::new();

    let output = harness
        .marker
        .mark_json(
            r##"{
                "backgroundImage": {"src": "assets/bg.png"},
                "watermarkTexts": [{
                    "text": "hi",
                    "position": {"position": "topLeft"},
                    "style": {
                        "fontSize": 40,
                        "textBackgroundStyle": {"type": "stretchX", "color": "#00FF00"}
                    }
                }]
            }"##,
        )
        .await
        .unwrap();

    let image = open_rgba(output.as_path().unwrap());
    // Row spans y 10..50 at font size 40
    assert_eq!(image.get_pixel(2, 30).0, [0, 255, 0, 255]);
    assert_eq!(image.get_pixel(397, 30).0, [0, 255, 0, 255]);
    assert_eq!(image.get_pixel(200, 150).0, [255, 255, 255, 255]);
    assert_eq!(image.get_pixel(200, 5).0, [255, 255, 255, 255]);
}

#[tokio::test]
async fn test_invalid_background_color_leaves_no_output() {
    let harness = MarkerTestHarness::new();

    let err = harness
        .marker
        .mark_json(
            r#"{
                "backgroundImage": {"src": "assets/bg.png"},
                "watermarkTexts": [{
                    "text": "hi",
                    "style": {"textBackgroundStyle": {"type": "fit", "color": "not-a-color"}}
                }]
            }"#,
        )
        .await
        .unwrap_err();

    assert_eq!(err.code(), "STYLE_PARSE_ERROR");
    assert!(harness.output_files().is_empty());
}

#[tokio::test]
async fn test_validation_errors_have_stable_codes() {
    let harness = MarkerTestHarness::new();

    let cases = [
        (r#"{"watermarkTexts": [{"text": "hi"}]}"#, "PARAMS_REQUIRED"),
        (
            r#"{"backgroundImage": {"src": "assets/bg.png"}, "watermarkTexts": []}"#,
            "PARAMS_REQUIRED",
        ),
        (
            r#"{"backgroundImage": {"src": "assets/bg.png"},
                "watermarkTexts": [{"text": "hi"}], "quality": 150}"#,
            "INVALID_PARAMETER",
        ),
        (
            r#"{"backgroundImage": {"src": "assets/missing.png"},
                "watermarkTexts": [{"text": "hi"}]}"#,
            "LOAD_IMAGE_FAILED",
        ),
    ];

    for (json, code) in cases {
        let err = harness.marker.mark_json(json).await.unwrap_err();
        assert_eq!(err.code(), code, "for {}", json);
    }
    assert!(harness.output_files().is_empty());
}

#[tokio::test]
async fn test_mark_with_text_requires_texts() {
    let harness = MarkerTestHarness::new();
    let raw = RawMarkOptions::from_json(
        r#"{"backgroundImage": {"src": "assets/bg.png"},
            "watermarkImages": [{"src": "assets/logo.png"}]}"#,
    )
    .unwrap();

    let err = harness.marker.mark_with_text(&raw).await.unwrap_err();
    assert_eq!(err.code(), "PARAMS_REQUIRED");
}

#[tokio::test]
async fn test_base64_output_for_text() {
    let harness = MarkerTestHarness::new();

    let output = harness
        .marker
        .mark_json(
            r#"{"backgroundImage": {"src": "assets/bg.png"},
                "watermarkTexts": [{"text": "hi", "style": {"bold": true, "underline": true}}],
                "saveFormat": "base64"}"#,
        )
        .await
        .unwrap();

    match output {
        MarkOutput::DataUri(uri) => assert!(uri.starts_with("data:image/jpeg;base64,")),
        other => panic!("expected data uri, got {:?}", other),
    }
    assert!(harness.output_files().is_empty());
}

#[tokio::test]
async fn test_concurrent_requests_get_distinct_files() {
    let harness = MarkerTestHarness::new();
    let json = r#"{"backgroundImage": {"src": "assets/bg.png"},
                   "watermarkTexts": [{"text": "same"}]}"#;

    let (a, b) = tokio::join!(harness.marker.mark_json(json), harness.marker.mark_json(json));
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_ne!(a, b);
    assert_eq!(harness.output_files().len(), 2);
}
