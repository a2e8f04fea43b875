// Error code tests

use image_marker::error::MarkerError;

#[test]
fn test_every_variant_has_a_stable_code() {
    let cases = [
        (MarkerError::params_required("backgroundImage"), "PARAMS_REQUIRED"),
        (MarkerError::invalid_parameter("quality", "too high"), "INVALID_PARAMETER"),
        (MarkerError::load_failed("assets/a.png", "missing"), "LOAD_IMAGE_FAILED"),
        (MarkerError::style("bad color"), "STYLE_PARSE_ERROR"),
        (MarkerError::render("surface gone"), "INTERNAL_RENDER_ERROR"),
        (
            MarkerError::from(std::io::Error::new(std::io::ErrorKind::Other, "disk full")),
            "IO_ERROR",
        ),
    ];

    for (err, code) in cases {
        assert_eq!(err.code(), code, "for {}", err);
    }
}

#[test]
fn test_messages_carry_context() {
    let err = MarkerError::load_failed(
        "https://example.com/a.png",
        "HTTP request failed with status: 404",
    );
    let message = err.to_string();
    assert!(message.contains("https://example.com/a.png"));
    assert!(message.contains("404"));

    let err = MarkerError::invalid_parameter("alpha", "must be between 0 and 1, got 2");
    assert!(err.to_string().contains("alpha"));
}

#[test]
fn test_validation_errors_are_flagged() {
    assert!(MarkerError::params_required("x").is_validation());
    assert!(MarkerError::invalid_parameter("x", "y").is_validation());
    assert!(MarkerError::style("x").is_validation());
    assert!(!MarkerError::render("x").is_validation());
    assert!(!MarkerError::load_failed("x", "y").is_validation());
}
