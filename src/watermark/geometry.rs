//! Geometry value types shared by the layout engine and the compositor.
//!
//! Everything here is a plain value: positions, rectangles, insets and the
//! rounded-rectangle outline used for text backgrounds.

use serde::Serialize;

/// A point on the canvas, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle given by its edges.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn from_origin_size(origin: Position, width: f32, height: f32) -> Self {
        Self::new(origin.x, origin.y, origin.x + width, origin.y + height)
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn center(&self) -> Position {
        Position::new(
            (self.left + self.right) / 2.0,
            (self.top + self.bottom) / 2.0,
        )
    }

    /// Grow the rectangle outward by `insets`.
    pub fn outset(&self, insets: &Insets) -> Self {
        Self::new(
            self.left - insets.left,
            self.top - insets.top,
            self.right + insets.right,
            self.bottom + insets.bottom,
        )
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        self.left <= other.left
            && self.top <= other.top
            && self.right >= other.right
            && self.bottom >= other.bottom
    }
}

/// Rotation in degrees (clockwise) around a pivot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rotation {
    pub degrees: f32,
    pub center: Position,
}

impl Rotation {
    /// `None` for a zero angle, so callers can skip the transform.
    pub fn around(degrees: f32, center: Position) -> Option<Self> {
        (degrees != 0.0).then_some(Self { degrees, center })
    }
}

/// Resolved per-side spacing in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Insets {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Insets {
    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }
}

/// A length that is either absolute pixels or a percentage of some reference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Dimension {
    Absolute(f32),
    Percent(f32),
}

impl Dimension {
    /// Parse `"12"`, `"12.5"` or `"40%"`. Returns `None` for anything else.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if let Some(percent) = value.strip_suffix('%') {
            let p: f32 = percent.trim().parse().ok()?;
            p.is_finite().then_some(Self::Percent(p))
        } else {
            let v: f32 = value.parse().ok()?;
            v.is_finite().then_some(Self::Absolute(v))
        }
    }

    /// Resolve to pixels, treating percentages as relative to `relative_to`.
    pub fn resolve(self, relative_to: f32) -> f32 {
        match self {
            Self::Absolute(v) => v,
            Self::Percent(p) => relative_to * p / 100.0,
        }
    }
}

/// One rounded corner: a quadratic curve from `start` to `end` pulled toward
/// `control` (the sharp corner point).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CornerPathSegment {
    pub start: Position,
    pub control: Position,
    pub end: Position,
}

/// A drawing command of a filled outline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum PathCommand {
    MoveTo(Position),
    LineTo(Position),
    QuadTo { control: Position, end: Position },
    Close,
}

/// Corner radii for one corner; each axis absolute or a percentage of the
/// background rect's width (x) or height (y).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RadiusValue {
    pub x: Dimension,
    pub y: Dimension,
}

/// Per-corner radius configuration in clockwise order from the top-left.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CornerRadius {
    pub top_left: Option<RadiusValue>,
    pub top_right: Option<RadiusValue>,
    pub bottom_right: Option<RadiusValue>,
    pub bottom_left: Option<RadiusValue>,
}

impl CornerRadius {
    pub fn is_empty(&self) -> bool {
        self.top_left.is_none()
            && self.top_right.is_none()
            && self.bottom_right.is_none()
            && self.bottom_left.is_none()
    }

    /// Build the outline of `rect` with these corners.
    pub fn path(&self, rect: Rect) -> CornerPath {
        let w = rect.width();
        let h = rect.height();
        // Radii never exceed half the rect so opposite corners cannot cross.
        let radii = |value: &Option<RadiusValue>| {
            value.map(|r| {
                (
                    r.x.resolve(w).clamp(0.0, (w / 2.0).max(0.0)),
                    r.y.resolve(h).clamp(0.0, (h / 2.0).max(0.0)),
                )
            })
        };

        let top_left = radii(&self.top_left).map(|(rx, ry)| CornerPathSegment {
            start: Position::new(rect.left, rect.top + ry),
            control: Position::new(rect.left, rect.top),
            end: Position::new(rect.left + rx, rect.top),
        });
        let top_right = radii(&self.top_right).map(|(rx, ry)| CornerPathSegment {
            start: Position::new(rect.right - rx, rect.top),
            control: Position::new(rect.right, rect.top),
            end: Position::new(rect.right, rect.top + ry),
        });
        let bottom_right = radii(&self.bottom_right).map(|(rx, ry)| CornerPathSegment {
            start: Position::new(rect.right, rect.bottom - ry),
            control: Position::new(rect.right, rect.bottom),
            end: Position::new(rect.right - rx, rect.bottom),
        });
        let bottom_left = radii(&self.bottom_left).map(|(rx, ry)| CornerPathSegment {
            start: Position::new(rect.left + rx, rect.bottom),
            control: Position::new(rect.left, rect.bottom),
            end: Position::new(rect.left, rect.bottom - ry),
        });

        CornerPath {
            rect,
            corners: [top_left, top_right, bottom_right, bottom_left],
        }
    }
}

/// Rounded-rectangle outline: four optional corner curves around `rect`.
/// A missing corner is drawn as a sharp 90° joint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CornerPath {
    pub rect: Rect,
    pub corners: [Option<CornerPathSegment>; 4],
}

impl CornerPath {
    /// Flatten into move/line/quad commands, clockwise from the top-left corner.
    pub fn commands(&self) -> Vec<PathCommand> {
        let r = self.rect;
        let sharp = [
            Position::new(r.left, r.top),
            Position::new(r.right, r.top),
            Position::new(r.right, r.bottom),
            Position::new(r.left, r.bottom),
        ];

        let mut commands = Vec::with_capacity(10);
        for (i, corner) in self.corners.iter().enumerate() {
            match corner {
                Some(seg) => {
                    commands.push(if i == 0 {
                        PathCommand::MoveTo(seg.start)
                    } else {
                        PathCommand::LineTo(seg.start)
                    });
                    commands.push(PathCommand::QuadTo {
                        control: seg.control,
                        end: seg.end,
                    });
                }
                None => commands.push(if i == 0 {
                    PathCommand::MoveTo(sharp[i])
                } else {
                    PathCommand::LineTo(sharp[i])
                }),
            }
        }
        commands.push(PathCommand::Close);
        commands
    }
}
