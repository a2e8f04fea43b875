//! Error types for image marking.
//!
//! Every failure carries a stable machine-readable code (see [`MarkerError::code`])
//! alongside its human-readable message, so callers can branch on the code
//! without parsing text.

use thiserror::Error;

/// Errors that can occur while validating, laying out, drawing or saving a mark request.
#[derive(Error, Debug)]
pub enum MarkerError {
    /// A required field is absent (background image, mark text, watermark image)
    #[error("Missing required parameter: {0}")]
    ParamsRequired(String),

    /// A field is present but out of range (quality, scale, alpha)
    #[error("Invalid parameter '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    /// Resource fetch or decode failed (including non-2xx HTTP responses)
    #[error("Failed to load image '{source_uri}': {message}")]
    LoadImageFailed { source_uri: String, message: String },

    /// Malformed color string, shadow, padding or corner radius
    #[error("Failed to parse style: {0}")]
    StyleParseError(String),

    /// A drawing surface or encoder operation failed
    #[error("Render error: {0}")]
    InternalRenderError(String),

    /// Output persistence failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the crate.
pub type MarkerResult<T> = Result<T, MarkerError>;

impl MarkerError {
    pub fn params_required(what: impl Into<String>) -> Self {
        Self::ParamsRequired(what.into())
    }

    pub fn invalid_parameter(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }

    pub fn load_failed(source_uri: impl Into<String>, message: impl Into<String>) -> Self {
        Self::LoadImageFailed {
            source_uri: source_uri.into(),
            message: message.into(),
        }
    }

    pub fn style(message: impl Into<String>) -> Self {
        Self::StyleParseError(message.into())
    }

    pub fn render(message: impl Into<String>) -> Self {
        Self::InternalRenderError(message.into())
    }

    /// Stable error code for this error category.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ParamsRequired(_) => "PARAMS_REQUIRED",
            Self::InvalidParameter { .. } => "INVALID_PARAMETER",
            Self::LoadImageFailed { .. } => "LOAD_IMAGE_FAILED",
            Self::StyleParseError(_) => "STYLE_PARSE_ERROR",
            Self::InternalRenderError(_) => "INTERNAL_RENDER_ERROR",
            Self::Io(_) => "IO_ERROR",
        }
    }

    /// Whether the error was raised before any drawing began.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ParamsRequired(_) | Self::InvalidParameter { .. } | Self::StyleParseError(_)
        )
    }
}
