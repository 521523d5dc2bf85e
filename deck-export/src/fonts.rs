//! Export font sizing.
//!
//! Base sizes per text role are shrunk by the deck's global content scale
//! so every slide shrinks by the same ratio. When live measurement is not
//! available a coarser factor derived from character density can stand in.

use deck_core::content::{parse_content, text_length};
use deck_core::{MeasuredLayout, Slide};
use serde::{Deserialize, Serialize};

/// Smallest font size written to a document.
pub const MIN_FONT_SIZE: u32 = 8;

/// Bullet glyphs are drawn this much larger than their text.
pub const BULLET_RATIO: f64 = 1.2;

/// Text roles with their own base size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRole {
    /// Title on a title or Q&A slide.
    TitleSlide,
    /// Title on any other slide.
    TitleNormal,
    /// Body text.
    ContentNormal,
    /// Timeline item text and marker labels.
    ContentTimeline,
}

/// Base font sizes in points, before scaling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FontSizes {
    /// Title on a title slide.
    pub title_slide: f64,
    /// Title on other slides.
    pub title_normal: f64,
    /// Body text.
    pub content_normal: f64,
    /// Timeline text.
    pub content_timeline: f64,
}

impl Default for FontSizes {
    fn default() -> Self {
        Self {
            title_slide: 44.0,
            title_normal: 28.0,
            content_normal: 16.0,
            content_timeline: 14.0,
        }
    }
}

impl FontSizes {
    /// Base size for a role.
    #[must_use]
    pub fn base(&self, role: TextRole) -> f64 {
        match role {
            TextRole::TitleSlide => self.title_slide,
            TextRole::TitleNormal => self.title_normal,
            TextRole::ContentNormal => self.content_normal,
            TextRole::ContentTimeline => self.content_timeline,
        }
    }

    /// Base sizes shrunk by a density factor, keeping each role readable.
    #[must_use]
    pub fn with_density_factor(&self, factor: f64) -> Self {
        let adjust = |base: f64, floor: f64| (base * factor).round().max(floor);
        Self {
            title_slide: adjust(self.title_slide, 24.0),
            title_normal: adjust(self.title_normal, 18.0),
            content_normal: adjust(self.content_normal, 10.0),
            content_timeline: adjust(self.content_timeline, 9.0),
        }
    }

    /// Size for `role` at `scale`.
    #[must_use]
    pub fn scaled(&self, role: TextRole, scale: f64) -> u32 {
        to_points(self.base(role) * scale)
    }
}

/// Bullet glyph size for text of `text_size`.
#[must_use]
pub fn bullet_size(text_size: u32) -> u32 {
    to_points(f64::from(text_size) * BULLET_RATIO)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_points(size: f64) -> u32 {
    if !size.is_finite() {
        return MIN_FONT_SIZE;
    }
    (size.round() as u32).max(MIN_FONT_SIZE)
}

/// When the density factor is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DensityMode {
    /// Only when no content scale was measured.
    #[default]
    WhenUnmeasured,
    /// Always, on top of the measured scale.
    Always,
    /// Never.
    Never,
}

impl DensityMode {
    /// Whether to apply the density factor given the measured scale.
    #[must_use]
    pub fn applies(self, measured_scale: Option<f64>) -> bool {
        match self {
            Self::WhenUnmeasured => measured_scale.is_none(),
            Self::Always => true,
            Self::Never => false,
        }
    }
}

/// Character density of one slide.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlideDensity {
    /// Characters per unit of normalized text area.
    pub density: f64,
    /// Parsed content items.
    pub items: usize,
}

/// Density of a slide laid out as `layout`, or `None` when it has no text
/// area.
#[must_use]
pub fn slide_density(slide: &Slide, layout: &MeasuredLayout) -> Option<SlideDensity> {
    let parsed = parse_content(slide.content.as_deref());
    let chars = parsed.total_chars() + text_length(&slide.title);

    let areas: Vec<f64> = layout
        .iter()
        .filter(|(key, _)| key.carries_body_text())
        .map(|(_, rect)| rect.area())
        .collect();
    if areas.is_empty() {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let mean_area = areas.iter().sum::<f64>() / areas.len() as f64;
    if mean_area <= 0.0 {
        return None;
    }

    #[allow(clippy::cast_precision_loss)]
    let density = chars as f64 / mean_area;
    (density > 0.0).then_some(SlideDensity {
        density,
        items: parsed.total_items(),
    })
}

/// Deck-wide shrink factor from the densest slide.
#[must_use]
pub fn density_factor<I>(densities: I) -> f64
where
    I: IntoIterator<Item = SlideDensity>,
{
    let (max_density, max_items) = densities
        .into_iter()
        .fold((0.0_f64, 0_usize), |(d, n), s| (d.max(s.density), n.max(s.items)));

    if max_density > 800.0 {
        0.7
    } else if max_density > 500.0 {
        0.8
    } else if max_density > 300.0 {
        0.9
    } else if max_items > 8 {
        0.85
    } else if max_items > 6 {
        0.95
    } else {
        1.0
    }
}


#[cfg(test)]
mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn scaled_size_never_below_floor(scale in 0.0f64..2.0) {
            let sizes = FontSizes::default();
            for role in [
                TextRole::TitleSlide,
                TextRole::TitleNormal,
                TextRole::ContentNormal,
                TextRole::ContentTimeline,
            ] {
                prop_assert!(sizes.scaled(role, scale) >= MIN_FONT_SIZE);
            }
        }

        #[test]
        fn smaller_scale_never_grows_text(a in 0.0f64..1.5, b in 0.0f64..1.5) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let sizes = FontSizes::default();
            prop_assert!(
                sizes.scaled(TextRole::ContentNormal, lo) <= sizes.scaled(TextRole::ContentNormal, hi)
            );
        }

        #[test]
        fn density_factor_in_range(density in 0.0f64..2000.0, items in 0usize..20) {
            let factor = density_factor([SlideDensity { density, items }]);
            prop_assert!((0.7..=1.0).contains(&factor));
        }
    }
}
