//! Rectangles in the three coordinate spaces the engine works with.
//!
//! * [`NormRect`] - fractions of the slide (unit square), produced by
//!   templates and by measurement.
//! * [`PixelRect`] - absolute pixels on a rendering surface.
//! * [`Size`] - a plain width/height pair used by the scale calculator.

use serde::{Deserialize, Serialize};

/// Tolerance allowed past the unit square's far edges.
pub const CONTAINMENT_EPSILON: f64 = 0.02;

/// A rectangle in normalized slide coordinates.
///
/// Accepts `{x, y, w, h}` as well as the `{x, y, width, height}` form written
/// by the editor and by stored layout variants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormRect {
    /// Left edge as a fraction of slide width.
    pub x: f64,
    /// Top edge as a fraction of slide height.
    pub y: f64,
    /// Width as a fraction of slide width.
    #[serde(alias = "width")]
    pub w: f64,
    /// Height as a fraction of slide height.
    #[serde(alias = "height")]
    pub h: f64,
}

impl NormRect {
    /// Create a new normalized rectangle.
    #[must_use]
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Right edge.
    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    /// Area in unit-square terms.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.w * self.h
    }

    /// All four components are finite and the extent is non-negative.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.w.is_finite()
            && self.h.is_finite()
            && self.w >= 0.0
            && self.h >= 0.0
    }

    /// Whether the rectangle lies inside the unit square, allowing `epsilon`
    /// of overshoot on the right and bottom edges.
    #[must_use]
    pub fn within_unit(&self, epsilon: f64) -> bool {
        self.is_valid()
            && self.x >= 0.0
            && self.y >= 0.0
            && self.right() <= 1.0 + epsilon
            && self.bottom() <= 1.0 + epsilon
    }

    /// Read a rectangle out of an untyped JSON object.
    ///
    /// Returns `None` unless `x`, `y` and either `w`/`width` and
    /// `h`/`height` are all numbers.
    #[must_use]
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        let obj = value.as_object()?;
        let num = |primary: &str, alias: &str| {
            obj.get(primary)
                .or_else(|| obj.get(alias))
                .and_then(serde_json::Value::as_f64)
        };
        Some(Self {
            x: num("x", "x")?,
            y: num("y", "y")?,
            w: num("w", "width")?,
            h: num("h", "height")?,
        })
    }
}

/// A rectangle in rendering-surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelRect {
    /// Left edge in pixels.
    pub left: f64,
    /// Top edge in pixels.
    pub top: f64,
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl PixelRect {
    /// Create a new pixel rectangle.
    #[must_use]
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Whether the rectangle has a positive, finite extent on both axes.
    #[must_use]
    pub fn has_area(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    /// Express this rectangle as fractions of `container`.
    ///
    /// Returns `None` when the container has no area.
    #[must_use]
    pub fn normalize_within(&self, container: &PixelRect) -> Option<NormRect> {
        if !container.has_area() {
            return None;
        }
        Some(NormRect {
            x: (self.left - container.left) / container.width,
            y: (self.top - container.top) / container.height,
            w: self.width / container.width,
            h: self.height / container.height,
        })
    }

    /// Size of this rectangle.
    #[must_use]
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// A width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl Size {
    /// Create a new size.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Both dimensions are finite and positive.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}
