// Mark request validation tests
//
// Exercise the JSON surface end to end: raw camelCase options in, validated
// MarkRequest (or a coded error) out.

use image_marker::error::MarkerResult;
use image_marker::watermark::geometry::Dimension;
use image_marker::watermark::options::{RequestDefaults, TextAlign};
use image_marker::watermark::{
    Anchor, Color, MarkRequest, PositionSpec, RawMarkOptions, SaveFormat, WatermarkText,
    Watermarks,
};

fn parse(json: &str) -> MarkerResult<MarkRequest> {
    let raw = RawMarkOptions::from_json(json)?;
    MarkRequest::from_raw(&raw, &RequestDefaults::default())
}

fn texts(request: &MarkRequest) -> &[WatermarkText] {
    match &request.watermarks {
        Watermarks::Texts(t) => t,
        Watermarks::Images(_) => panic!("expected text watermarks"),
    }
}

#[test]
fn test_unknown_anchor_falls_back_to_bottom_right() {
    let request = parse(
        r#"{"backgroundImage": {"src": "bg.png"},
            "watermarkTexts": [{"text": "x", "position": {"position": "somewhere"}}]}"#,
    )
    .unwrap();
    assert_eq!(texts(&request)[0].position, PositionSpec::Anchor(Anchor::BottomRight));
}

#[test]
fn test_offsets_accept_numbers_and_percentages() {
    let request = parse(
        r#"{"backgroundImage": {"src": "bg.png"},
            "watermarkTexts": [{"text": "x", "positionOptions": {"X": "25%", "Y": 40}}]}"#,
    )
    .unwrap();
    assert_eq!(
        texts(&request)[0].position,
        PositionSpec::Offsets {
            x: Some(Dimension::Percent(25.0)),
            y: Some(Dimension::Absolute(40.0)),
        }
    );
}

#[test]
fn test_save_format_fallback_and_defaults() {
    let request = parse(
        r#"{"backgroundImage": {"src": "bg.png"},
            "watermarkTexts": [{"text": "x"}], "saveFormat": "tiff"}"#,
    )
    .unwrap();
    assert_eq!(request.save_format, SaveFormat::Png);
    assert_eq!(request.quality, 100);
    assert_eq!(request.max_size, 2048);
    assert_eq!(request.filename, None);
}

#[test]
fn test_style_fields_are_parsed() {
    let request = parse(
        r##"{"backgroundImage": {"src": "bg.png"},
            "watermarkTexts": [{"text": "x", "style": {
                "color": "#80FF0000", "fontSize": 0, "textAlign": "center",
                "italic": true, "bold": true, "rotate": -15,
                "shadowStyle": {"dx": 2, "dy": 3, "radius": 4, "color": "#000"},
                "textBackgroundStyle": {"type": "stretchY", "padding": "5 10", "color": "#FFF"}
            }}]}"##,
    )
    .unwrap();

    let style = &texts(&request)[0].style;
    assert_eq!(style.color, Color::with_alpha(255, 0, 0, 0x80));
    assert_eq!(style.font_size, 14.0);
    assert_eq!(style.align, TextAlign::Center);
    assert!(style.italic && style.bold);
    assert_eq!(style.rotate, -15.0);

    let shadow = style.shadow.unwrap();
    assert_eq!((shadow.dx, shadow.dy, shadow.radius), (2.0, 3.0, 4.0));

    let background = style.background.as_ref().unwrap();
    assert_eq!(background.padding.top, Dimension::Absolute(5.0));
    assert_eq!(background.padding.left, Dimension::Absolute(10.0));
    assert_eq!(background.color, Color::white());
}

#[test]
fn test_malformed_styles_are_errors() {
    let cases = [
        r#"{"color": "red"}"#,
        r##"{"shadowStyle": {"color": "#12"}}"##,
        r#"{"textBackgroundStyle": {"type": "diagonal"}}"#,
        r#"{"textBackgroundStyle": {"type": "fit", "padding": "1 2 3 4 5"}}"#,
    ];

    for style in cases {
        let json = format!(
            r#"{{"backgroundImage": {{"src": "bg.png"}},
                "watermarkTexts": [{{"text": "x", "style": {}}}]}}"#,
            style
        );
        let err = parse(&json).unwrap_err();
        assert_eq!(err.code(), "STYLE_PARSE_ERROR", "for {}", style);
    }
}

#[test]
fn test_image_parameters_are_range_checked() {
    let cases = [
        (r#"{"src": "a.png", "scale": 0}"#, "INVALID_PARAMETER"),
        (r#"{"src": "a.png", "alpha": 1.5}"#, "INVALID_PARAMETER"),
        (r#"{"scale": 1}"#, "PARAMS_REQUIRED"),
    ];

    for (image, code) in cases {
        let json = format!(
            r#"{{"backgroundImage": {{"src": "bg.png"}}, "watermarkImages": [{}]}}"#,
            image
        );
        let err = parse(&json).unwrap_err();
        assert_eq!(err.code(), code, "for {}", image);
    }
}

#[test]
fn test_src_descriptor_as_json_string() {
    let request = parse(
        r#"{"backgroundImage": {"src": "{\"uri\": \"bg.png\", \"width\": 100, \"height\": 50, \"scale\": 2}"},
            "watermarkTexts": [{"text": "x"}]}"#,
    )
    .unwrap();

    assert_eq!(request.background.uri, "bg.png");
    assert_eq!(request.background.intrinsic_size(), Some((200.0, 100.0)));
}

#[test]
fn test_malformed_json_is_invalid_parameter() {
    let err = parse("{not json").unwrap_err();
    assert_eq!(err.code(), "INVALID_PARAMETER");
}
