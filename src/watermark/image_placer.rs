//! Placement of image watermarks.

use serde::Serialize;

use super::geometry::{Position, Rect, Rotation};
use super::options::{ImageSource, WatermarkImage};
use super::position::LayoutContext;
use crate::error::{MarkerError, MarkerResult};

/// Where and how one watermark image is drawn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImagePlacement {
    /// Index of the image in the request's watermark list (and in the
    /// decoded image slice handed to the compositor).
    pub index: usize,
    pub uri: String,
    pub position: Position,
    pub width: f32,
    pub height: f32,
    pub rotation: Option<Rotation>,
    pub alpha: f32,
}

impl ImagePlacement {
    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.position, self.width, self.height)
    }

    /// Target pixel size, at least 1x1.
    pub fn pixel_size(&self) -> (u32, u32) {
        (
            (self.width.round() as u32).max(1),
            (self.height.round() as u32).max(1),
        )
    }
}

/// Drawn size of an image: its declared size (or the decoded size when the
/// source declares none) times `scale`.
pub fn placed_size(source: &ImageSource, decoded: (u32, u32)) -> (f32, f32) {
    let (w, h) = source
        .intrinsic_size()
        .unwrap_or((decoded.0 as f32, decoded.1 as f32));
    (w * source.scale, h * source.scale)
}

/// Place every watermark image in list order.
///
/// `decoded_sizes[i]` is the pixel size of the decoded `marks[i]`.
pub fn place_images(
    marks: &[WatermarkImage],
    decoded_sizes: &[(u32, u32)],
    ctx: &LayoutContext,
) -> MarkerResult<Vec<ImagePlacement>> {
    if marks.len() != decoded_sizes.len() {
        return Err(MarkerError::render(format!(
            "{} watermark images but {} decoded sizes",
            marks.len(),
            decoded_sizes.len()
        )));
    }

    Ok(marks
        .iter()
        .zip(decoded_sizes)
        .enumerate()
        .map(|(index, (mark, decoded))| {
            let (width, height) = placed_size(&mark.image, *decoded);
            let position = ctx.place(&mark.position, width, height);
            let center = Position::new(position.x + width / 2.0, position.y + height / 2.0);

            tracing::debug!(
                index,
                uri = %mark.image.uri,
                x = position.x,
                y = position.y,
                width,
                height,
                "Placed watermark image"
            );

            ImagePlacement {
                index,
                uri: mark.image.uri.clone(),
                position,
                width,
                height,
                rotation: Rotation::around(mark.image.rotate, center),
                alpha: mark.image.alpha,
            }
        })
        .collect())
}
