//! Catalog of named layout variants assigned to slides at generation time.
//!
//! Where the classifier derives a layout from content, a variant is a fixed
//! arrangement picked per slide type so consecutive slides look different.
//! The pick is delegated to a [`SelectionStrategy`] so callers control
//! whether it is reproducible.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::geometry::NormRect;
use crate::region::RegionKey;
use crate::slide::{RegionMap, Slide, SlideType};

/// A named, fixed region arrangement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutVariant {
    /// Variant name.
    pub name: &'static str,
    /// Slide types the variant is suitable for.
    pub applies_to: &'static [SlideType],
    /// Region positions.
    pub regions: &'static [(RegionKey, NormRect)],
}

impl LayoutVariant {
    /// Whether the variant places an image.
    #[must_use]
    pub fn has_image(&self) -> bool {
        self.regions.iter().any(|(key, _)| *key == RegionKey::Image)
    }

    /// Region positions as a map.
    #[must_use]
    pub fn region_map(&self) -> RegionMap {
        self.regions.iter().copied().collect()
    }
}

const CONTENT_TYPES: &[SlideType] = &[SlideType::ContentSlide, SlideType::AgendaSlide];
const TITLE_TYPES: &[SlideType] = &[SlideType::TitleSlide];
const QA_TYPES: &[SlideType] = &[SlideType::QandA];
const CONCLUSION_TYPES: &[SlideType] = &[SlideType::ConclusionSlide];

const fn r(x: f64, y: f64, w: f64, h: f64) -> NormRect {
    NormRect::new(x, y, w, h)
}

/// Every known layout variant.
pub const VARIANTS: &[LayoutVariant] = &[
    LayoutVariant {
        name: "LeftImageRightContent",
        applies_to: CONTENT_TYPES,
        regions: &[
            (RegionKey::Title, r(0.08, 0.06, 0.84, 0.08)),
            (RegionKey::Image, r(0.08, 0.18, 0.38, 0.68)),
            (RegionKey::Content, r(0.52, 0.18, 0.40, 0.68)),
        ],
    },
    LayoutVariant {
        name: "RightImageLeftContent",
        applies_to: CONTENT_TYPES,
        regions: &[
            (RegionKey::Title, r(0.08, 0.06, 0.84, 0.08)),
            (RegionKey::Content, r(0.08, 0.18, 0.40, 0.68)),
            (RegionKey::Image, r(0.54, 0.18, 0.38, 0.68)),
        ],
    },
    LayoutVariant {
        name: "TopImageBottomContent",
        applies_to: CONTENT_TYPES,
        regions: &[
            (RegionKey::Title, r(0.08, 0.06, 0.84, 0.08)),
            (RegionKey::Image, r(0.08, 0.18, 0.84, 0.35)),
            (RegionKey::Content, r(0.08, 0.58, 0.84, 0.34)),
        ],
    },
    LayoutVariant {
        name: "BottomImageTopContent",
        applies_to: CONTENT_TYPES,
        regions: &[
            (RegionKey::Title, r(0.08, 0.06, 0.84, 0.08)),
            (RegionKey::Content, r(0.08, 0.18, 0.84, 0.35)),
            (RegionKey::Image, r(0.08, 0.58, 0.84, 0.34)),
        ],
    },
    LayoutVariant {
        name: "TwoColumnTextImage",
        applies_to: CONTENT_TYPES,
        regions: &[
            (RegionKey::Title, r(0.08, 0.06, 0.84, 0.07)),
            (RegionKey::Content, r(0.08, 0.18, 0.38, 0.68)),
            (RegionKey::Image, r(0.54, 0.18, 0.38, 0.68)),
        ],
    },
    LayoutVariant {
        name: "ContentOnlyLayout",
        applies_to: CONTENT_TYPES,
        regions: &[
            (RegionKey::Title, r(0.08, 0.06, 0.84, 0.08)),
            (RegionKey::Content, r(0.08, 0.18, 0.84, 0.72)),
        ],
    },
    LayoutVariant {
        name: "CenteredContentWithSideImage",
        applies_to: CONTENT_TYPES,
        regions: &[
            (RegionKey::Title, r(0.08, 0.06, 0.84, 0.08)),
            (RegionKey::Content, r(0.08, 0.18, 0.60, 0.68)),
            (RegionKey::Image, r(0.72, 0.25, 0.20, 0.50)),
        ],
    },
    LayoutVariant {
        name: "CenteredTitleWithImage",
        applies_to: TITLE_TYPES,
        regions: &[
            (RegionKey::Title, r(0.15, 0.25, 0.70, 0.20)),
            (RegionKey::Image, r(0.25, 0.50, 0.50, 0.35)),
        ],
    },
    LayoutVariant {
        name: "FullImageWithOverlayTitle",
        applies_to: TITLE_TYPES,
        regions: &[
            (RegionKey::Image, r(0.0, 0.0, 1.0, 1.0)),
            (RegionKey::Title, r(0.20, 0.35, 0.60, 0.30)),
        ],
    },
    LayoutVariant {
        name: "MinimalTitleOnly",
        applies_to: TITLE_TYPES,
        regions: &[(RegionKey::Title, r(0.15, 0.40, 0.70, 0.20))],
    },
    LayoutVariant {
        name: "TitleWithSubtitle",
        applies_to: TITLE_TYPES,
        regions: &[
            (RegionKey::Title, r(0.10, 0.30, 0.80, 0.15)),
            (RegionKey::Content, r(0.15, 0.50, 0.70, 0.10)),
            (RegionKey::Image, r(0.35, 0.65, 0.30, 0.25)),
        ],
    },
    LayoutVariant {
        name: "SideImageTitle",
        applies_to: TITLE_TYPES,
        regions: &[
            (RegionKey::Title, r(0.08, 0.30, 0.50, 0.25)),
            (RegionKey::Image, r(0.65, 0.20, 0.27, 0.60)),
        ],
    },
    LayoutVariant {
        name: "CenteredQALayout",
        applies_to: QA_TYPES,
        regions: &[
            (RegionKey::Title, r(0.25, 0.35, 0.50, 0.30)),
            (RegionKey::Image, r(0.35, 0.70, 0.30, 0.25)),
        ],
    },
    LayoutVariant {
        name: "FullScreenQA",
        applies_to: QA_TYPES,
        regions: &[
            (RegionKey::Title, r(0.08, 0.35, 0.60, 0.20)),
            (RegionKey::Image, r(0.72, 0.25, 0.20, 0.40)),
        ],
    },
    LayoutVariant {
        name: "MinimalQA",
        applies_to: QA_TYPES,
        regions: &[(RegionKey::Title, r(0.20, 0.45, 0.60, 0.10))],
    },
    LayoutVariant {
        name: "ConclusionWithImage",
        applies_to: CONCLUSION_TYPES,
        regions: &[
            (RegionKey::Title, r(0.15, 0.20, 0.70, 0.15)),
            (RegionKey::Content, r(0.15, 0.40, 0.70, 0.25)),
            (RegionKey::Image, r(0.30, 0.70, 0.40, 0.25)),
        ],
    },
    LayoutVariant {
        name: "FullImageConclusion",
        applies_to: CONCLUSION_TYPES,
        regions: &[
            (RegionKey::Title, r(0.08, 0.10, 0.60, 0.12)),
            (RegionKey::Content, r(0.08, 0.26, 0.60, 0.50)),
            (RegionKey::Image, r(0.72, 0.20, 0.20, 0.40)),
        ],
    },
];

/// Whether a stored variant rectangle is acceptable: origin inside the
/// slide, extent above 2% and at most the full slide, and overshooting the
/// far edges by no more than 2%.
#[must_use]
pub fn is_valid_variant_rect(rect: &NormRect) -> bool {
    rect.is_valid()
        && (0.0..=1.0).contains(&rect.x)
        && (0.0..=1.0).contains(&rect.y)
        && rect.w > 0.02
        && rect.w <= 1.0
        && rect.h > 0.02
        && rect.h <= 1.0
        && rect.right() <= 1.02
        && rect.bottom() <= 1.02
}

/// Picks one of `candidates` options.
pub trait SelectionStrategy: Send {
    /// Return an index in `0..candidates`. Never called with zero.
    fn pick(&mut self, candidates: usize) -> usize;
}

/// Cycles through the candidates in order.
#[derive(Debug, Clone, Default)]
pub struct RoundRobin {
    next: usize,
}

impl RoundRobin {
    /// Start from the first candidate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SelectionStrategy for RoundRobin {
    fn pick(&mut self, candidates: usize) -> usize {
        let choice = self.next % candidates;
        self.next = self.next.wrapping_add(1);
        choice
    }
}

/// Uniformly random choice from a seedable generator.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    /// Reproducible sequence from `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Sequence seeded from the operating system.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl SelectionStrategy for SeededRandom {
    fn pick(&mut self, candidates: usize) -> usize {
        self.rng.gen_range(0..candidates)
    }
}

/// The layout chosen for a slide.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedLayout {
    /// Variant name, or `None` when a fallback was used.
    pub variant: Option<&'static str>,
    /// Region positions.
    pub regions: RegionMap,
}

/// Pick a layout variant for a slide type.
///
/// With `has_image`, only variants placing an image are considered. When no
/// variant applies, or the picked one fails validation, the fixed fallback
/// for the slide type is used.
pub fn select_layout<S>(slide_type: SlideType, has_image: bool, strategy: &mut S) -> SelectedLayout
where
    S: SelectionStrategy + ?Sized,
{
    let candidates: Vec<&LayoutVariant> = VARIANTS
        .iter()
        .filter(|v| v.applies_to.contains(&slide_type))
        .filter(|v| !has_image || v.has_image())
        .collect();

    if candidates.is_empty() {
        tracing::warn!(
            "No layout variants for {:?} with image={}, using fallback",
            slide_type,
            has_image
        );
        return SelectedLayout {
            variant: None,
            regions: fallback_layout(slide_type, has_image),
        };
    }

    let variant = candidates[strategy.pick(candidates.len()) % candidates.len()];
    if !variant.regions.iter().all(|(_, rect)| is_valid_variant_rect(rect)) {
        tracing::warn!(
            "Layout variant {} for {:?} failed validation, using fallback",
            variant.name,
            slide_type
        );
        return SelectedLayout {
            variant: None,
            regions: fallback_layout(slide_type, has_image),
        };
    }

    SelectedLayout {
        variant: Some(variant.name),
        regions: variant.region_map(),
    }
}

/// Fixed layout used when no variant can be chosen.
#[must_use]
pub fn fallback_layout(slide_type: SlideType, has_image: bool) -> RegionMap {
    let regions: &[(RegionKey, NormRect)] = match (slide_type, has_image) {
        (SlideType::TitleSlide, true) => &[
            (RegionKey::Title, r(0.15, 0.25, 0.70, 0.20)),
            (RegionKey::Image, r(0.25, 0.50, 0.50, 0.35)),
        ],
        (SlideType::TitleSlide, false) => &[(RegionKey::Title, r(0.15, 0.40, 0.70, 0.20))],
        (SlideType::QandA, true) => &[
            (RegionKey::Title, r(0.25, 0.35, 0.50, 0.30)),
            (RegionKey::Image, r(0.35, 0.70, 0.30, 0.25)),
        ],
        (SlideType::QandA, false) => &[(RegionKey::Title, r(0.20, 0.45, 0.60, 0.10))],
        (_, true) => &[
            (RegionKey::Title, r(0.08, 0.06, 0.84, 0.08)),
            (RegionKey::Content, r(0.08, 0.18, 0.40, 0.68)),
            (RegionKey::Image, r(0.54, 0.18, 0.38, 0.68)),
        ],
        (_, false) => &[
            (RegionKey::Title, r(0.08, 0.06, 0.84, 0.08)),
            (RegionKey::Content, r(0.08, 0.18, 0.84, 0.72)),
        ],
    };
    regions.iter().copied().collect()
}

/// Attach a variant layout to every slide that has none.
///
/// Returns the number of slides updated.
pub fn assign_variant_layouts<S>(slides: &mut [Slide], strategy: &mut S) -> usize
where
    S: SelectionStrategy + ?Sized,
{
    let mut assigned = 0;
    for slide in slides.iter_mut().filter(|s| s.layout.is_none()) {
        let selected = select_layout(slide.slide_type, slide.has_image(), strategy);
        tracing::debug!(
            "Slide {} gets layout {}",
            slide.slide_number,
            selected.variant.unwrap_or("fallback")
        );
        *slide = std::mem::take(slide).with_layout(&selected.regions);
        assigned += 1;
    }
    assigned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_variant_is_valid() {
        for variant in VARIANTS {
            for (key, rect) in variant.regions {
                assert!(
                    is_valid_variant_rect(rect),
                    "{} {} invalid: {:?}",
                    variant.name,
                    key,
                    rect
                );
            }
            assert!(variant.regions.iter().any(|(k, _)| *k == RegionKey::Title));
        }
    }

    #[test]
    fn test_variant_rect_validation_bounds() {
        assert!(is_valid_variant_rect(&NormRect::new(0.0, 0.0, 1.0, 1.0)));
        assert!(is_valid_variant_rect(&NormRect::new(0.5, 0.5, 0.5, 0.51)));
        assert!(!is_valid_variant_rect(&NormRect::new(0.5, 0.5, 0.53, 0.5)));
        assert!(!is_valid_variant_rect(&NormRect::new(0.1, 0.1, 0.02, 0.5)));
        assert!(!is_valid_variant_rect(&NormRect::new(-0.1, 0.1, 0.5, 0.5)));
    }

    #[test]
    fn test_round_robin_cycles() {
        let mut strategy = RoundRobin::new();
        let picks: Vec<_> = (0..5).map(|_| strategy.pick(3)).collect();
        assert_eq!(picks, vec![0, 1, 2, 0, 1]);
    }

    #[test]
    fn test_seeded_random_is_reproducible() {
        let mut a = SeededRandom::new(42);
        let mut b = SeededRandom::new(42);
        let first: Vec<_> = (0..10).map(|_| a.pick(7)).collect();
        let second: Vec<_> = (0..10).map(|_| b.pick(7)).collect();
        assert_eq!(first, second);
        assert!(first.iter().all(|&i| i < 7));
    }

    #[test]
    fn test_image_slides_get_image_variants() {
        let mut strategy = RoundRobin::new();
        for _ in 0..10 {
            let selected = select_layout(SlideType::ContentSlide, true, &mut strategy);
            assert!(selected.variant.is_some());
            assert!(selected.regions.contains_key(&RegionKey::Image));
        }
    }

    #[test]
    fn test_qa_round_robin_order() {
        let mut strategy = RoundRobin::new();
        let names: Vec<_> = (0..3)
            .map(|_| select_layout(SlideType::QandA, false, &mut strategy).variant)
            .collect();
        assert_eq!(
            names,
            vec![Some("CenteredQALayout"), Some("FullScreenQA"), Some("MinimalQA")]
        );
    }

    #[test]
    fn test_unknown_type_uses_fallback() {
        let selected = select_layout(SlideType::Coordinate, true, &mut RoundRobin::new());
        assert_eq!(selected.variant, None);
        assert_eq!(selected.regions, fallback_layout(SlideType::ContentSlide, true));
    }

    #[test]
    fn test_assign_skips_slides_with_layout() {
        let mut slides = vec![
            Slide::new(SlideType::TitleSlide, "Intro"),
            Slide::new(SlideType::ContentSlide, "Body").with_layout(&fallback_layout(
                SlideType::ContentSlide,
                false,
            )),
        ];
        let before = slides[1].clone();
        let assigned = assign_variant_layouts(&mut slides, &mut SeededRandom::new(7));
        assert_eq!(assigned, 1);
        assert!(slides[0].layout_positions().is_some());
        assert_eq!(slides[1], before);
    }
}
