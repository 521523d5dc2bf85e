//! Mapping normalized slide coordinates onto the output document canvas.

use serde::{Deserialize, Serialize};

use crate::geometry::NormRect;
use crate::region::RegionKey;
use crate::slide::RegionMap;

/// Width of the exported 16:9 page in document units (inches).
pub const DOCUMENT_WIDTH: f64 = 10.0;

/// Height of the exported 16:9 page in document units (inches).
pub const DOCUMENT_HEIGHT: f64 = 5.625;

/// A rectangle in absolute document units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DocRect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub w: f64,
    /// Height.
    pub h: f64,
}

impl DocRect {
    /// Create a new document rectangle.
    #[must_use]
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Area in square document units.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.w * self.h
    }

    /// Width over height; zero for a flat rectangle.
    #[must_use]
    pub fn aspect(&self) -> f64 {
        if self.h > 0.0 {
            self.w / self.h
        } else {
            0.0
        }
    }
}

/// The output document's page dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DocumentCanvas {
    /// Page width in document units.
    pub width: f64,
    /// Page height in document units.
    pub height: f64,
}

impl Default for DocumentCanvas {
    fn default() -> Self {
        Self {
            width: DOCUMENT_WIDTH,
            height: DOCUMENT_HEIGHT,
        }
    }
}

impl DocumentCanvas {
    /// Map a normalized rectangle onto the page.
    ///
    /// Returns `None` when any component is not a finite number or the
    /// extent is negative.
    #[must_use]
    pub fn to_document(&self, rect: &NormRect) -> Option<DocRect> {
        if !rect.is_valid() {
            return None;
        }
        Some(DocRect {
            x: rect.x * self.width,
            y: rect.y * self.height,
            w: rect.w * self.width,
            h: rect.h * self.height,
        })
    }
}

/// Keep the valid regions of a measured or stored layout.
///
/// Returns `None` when no region survives, in which case the slide has no
/// usable layout.
#[must_use]
pub fn normalize_layout(layout: &RegionMap) -> Option<RegionMap> {
    let valid: RegionMap = layout
        .iter()
        .filter(|(key, rect)| {
            let ok = rect.is_valid();
            if !ok {
                tracing::warn!("Discarding invalid {} rectangle {:?}", key, rect);
            }
            ok
        })
        .map(|(key, rect)| (*key, *rect))
        .collect();

    if valid.is_empty() {
        None
    } else {
        Some(valid)
    }
}

/// [`normalize_layout`] for untyped input such as a slide's stored layout.
///
/// Entries with unknown keys, non-object values or non-numeric components
/// are skipped. Returns `None` when the input is not an object or nothing
/// valid remains.
#[must_use]
pub fn normalize_raw_layout(layout: &serde_json::Value) -> Option<RegionMap> {
    let obj = layout.as_object()?;
    let mut valid = RegionMap::new();
    for (name, value) in obj {
        let Ok(key) = name.parse::<RegionKey>() else {
            tracing::debug!("Skipping unknown layout region {:?}", name);
            continue;
        };
        match NormRect::from_value(value).filter(NormRect::is_valid) {
            Some(rect) => {
                valid.insert(key, rect);
            }
            None => tracing::warn!("Discarding invalid {} rectangle {}", key, value),
        }
    }

    if valid.is_empty() {
        None
    } else {
        Some(valid)
    }
}
