//! Region geometry for every layout archetype.

use serde::{Deserialize, Serialize};

use crate::classifier::{classify, LayoutChoice};
use crate::geometry::{NormRect, CONTAINMENT_EPSILON};
use crate::region::RegionKey;
use crate::slide::{RegionMap, Slide};

/// Title band used whenever an archetype has no better place for the title.
const STANDARD_TITLE: NormRect = NormRect::new(0.05, 0.1, 0.9, 0.15);

/// Title band shared by the list-like archetypes.
const LIST_TITLE: NormRect = NormRect::new(0.05, 0.05, 0.9, 0.1);

/// Title band shared by the timeline archetypes.
const TIMELINE_TITLE: NormRect = NormRect::new(0.05, 0.02, 0.9, 0.13);

/// Most columns a multi-column layout will lay out.
pub const MAX_COLUMNS: usize = 6;

/// Most items a pyramid can stack inside the slide.
pub const MAX_PYRAMID_ITEMS: usize = 8;

/// Normalized regions of one slide's layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutTemplate {
    /// Archetype name the template was generated for.
    pub archetype: String,
    /// Region rectangles; regions the archetype leaves empty are absent.
    pub regions: RegionMap,
}

impl LayoutTemplate {
    fn new(archetype: &str) -> Self {
        Self {
            archetype: archetype.to_string(),
            regions: RegionMap::new(),
        }
    }

    fn with(mut self, key: RegionKey, rect: NormRect) -> Self {
        self.regions.insert(key, rect);
        self
    }

    /// Number of regions a renderer is expected to produce.
    #[must_use]
    pub fn expected_count(&self) -> usize {
        self.regions.len()
    }

    /// Region keys in layout order.
    pub fn keys(&self) -> impl Iterator<Item = &RegionKey> {
        self.regions.keys()
    }

    /// Rectangle of one region.
    #[must_use]
    pub fn get(&self, key: &RegionKey) -> Option<&NormRect> {
        self.regions.get(key)
    }

    /// Whether the template contains `key`.
    #[must_use]
    pub fn contains(&self, key: &RegionKey) -> bool {
        self.regions.contains_key(key)
    }
}

/// Template for the slide at `index`, classifying it first.
///
/// Coordinate slides without a title only get a title region when their
/// layout supplies one.
#[must_use]
pub fn template_for_slide(slide: &Slide, index: usize) -> LayoutTemplate {
    let choice = classify(slide, index);
    let mut template = generate(&choice);
    if let LayoutChoice::Coordinate { positions } = &choice {
        if !slide.has_title() && !positions.contains_key(&RegionKey::Title) {
            template.regions.remove(&RegionKey::Title);
        }
    }
    template
}

/// Generate the region template for a layout choice.
#[must_use]
pub fn generate(choice: &LayoutChoice) -> LayoutTemplate {
    let name = choice.name();
    match choice {
        LayoutChoice::TitleSpecial { has_image } => {
            let template =
                LayoutTemplate::new(name).with(RegionKey::Title, NormRect::new(0.1, 0.3, 0.8, 0.4));
            if *has_image {
                template.with(RegionKey::Image, NormRect::new(0.4, 0.75, 0.2, 0.15))
            } else {
                template
            }
        }

        LayoutChoice::Coordinate { positions } => coordinate(name, positions),

        LayoutChoice::ImageContentStack => LayoutTemplate::new(name)
            .with(RegionKey::Title, NormRect::new(0.05, 0.05, 0.9, 0.12))
            .with(RegionKey::Image, NormRect::new(0.1, 0.2, 0.8, 0.4))
            .with(RegionKey::Content, NormRect::new(0.05, 0.62, 0.9, 0.33)),

        LayoutChoice::ImageFocus { is_image_left } => {
            let (text_x, image_x) = if *is_image_left {
                (0.68, 0.05)
            } else {
                (0.05, 0.32)
            };
            LayoutTemplate::new(name)
                .with(RegionKey::Title, NormRect::new(text_x, 0.2, 0.27, 0.15))
                .with(RegionKey::Content, NormRect::new(text_x, 0.38, 0.27, 0.42))
                .with(RegionKey::Image, NormRect::new(image_x, 0.1, 0.6, 0.8))
        }

        LayoutChoice::AlternatingSplit { is_image_left } => {
            let (text_x, image_x) = if *is_image_left {
                (0.52, 0.05)
            } else {
                (0.05, 0.52)
            };
            LayoutTemplate::new(name)
                .with(RegionKey::Title, NormRect::new(text_x, 0.1, 0.43, 0.15))
                .with(RegionKey::Content, NormRect::new(text_x, 0.28, 0.43, 0.62))
                .with(RegionKey::Image, NormRect::new(image_x, 0.15, 0.43, 0.7))
        }

        LayoutChoice::MultiColumn { columns } => {
            let columns = (*columns).clamp(1, MAX_COLUMNS);
            #[allow(clippy::cast_precision_loss)]
            let col_width = 0.9 / columns as f64;
            (0..columns).fold(
                LayoutTemplate::new(name).with(RegionKey::Title, LIST_TITLE),
                |template, i| {
                    #[allow(clippy::cast_precision_loss)]
                    let x = 0.05 + i as f64 * col_width;
                    template.with(
                        RegionKey::Column(i),
                        NormRect::new(x, 0.18, col_width - 0.02, 0.77),
                    )
                },
            )
        }

        LayoutChoice::CompactList => LayoutTemplate::new(name)
            .with(RegionKey::Title, LIST_TITLE)
            .with(RegionKey::Content, NormRect::new(0.05, 0.18, 0.9, 0.77)),

        LayoutChoice::ZigzagTimeline { item_count } => zigzag(name, (*item_count).max(1)),

        LayoutChoice::Pyramid { item_count } => {
            pyramid(name, (*item_count).clamp(1, MAX_PYRAMID_ITEMS))
        }

        LayoutChoice::StandardText { title_height } => {
            let title_height = if title_height.is_finite() {
                title_height.clamp(0.05, 0.5)
            } else {
                STANDARD_TITLE.h
            };
            let content_y = 0.1 + title_height + 0.05;
            LayoutTemplate::new(name)
                .with(RegionKey::Title, NormRect::new(0.05, 0.1, 0.9, title_height))
                .with(
                    RegionKey::Content,
                    NormRect::new(0.05, content_y, 0.9, 1.0 - content_y - 0.1),
                )
        }
    }
}

fn coordinate(name: &str, positions: &RegionMap) -> LayoutTemplate {
    let mut template = LayoutTemplate::new(name);
    for (key, rect) in positions {
        if rect.within_unit(CONTAINMENT_EPSILON) {
            template.regions.insert(*key, *rect);
        } else {
            tracing::warn!("Dropping out-of-bounds {} position {:?}", key, rect);
        }
    }
    template
        .regions
        .entry(RegionKey::Title)
        .or_insert(STANDARD_TITLE);
    template
}

#[allow(clippy::cast_precision_loss)]
fn zigzag(name: &str, count: usize) -> LayoutTemplate {
    let item_height = 0.8 / count as f64;
    let marker = f64::min(0.06, item_height * 0.6);

    (0..count).fold(
        LayoutTemplate::new(name)
            .with(RegionKey::Title, TIMELINE_TITLE)
            .with(RegionKey::Line, NormRect::new(0.4975, 0.2, 0.005, 0.75)),
        |template, i| {
            let y = 0.18 + i as f64 * item_height;
            let text_x = if i % 2 == 0 { 0.05 } else { 0.53 };
            template
                .with(
                    RegionKey::Marker(i),
                    NormRect::new(
                        0.5 - marker / 2.0,
                        y + item_height / 2.0 - marker / 2.0,
                        marker,
                        marker,
                    ),
                )
                .with(
                    RegionKey::ItemText(i),
                    NormRect::new(text_x, y, 0.42, item_height),
                )
        },
    )
}

#[allow(clippy::cast_precision_loss)]
fn pyramid(name: &str, count: usize) -> LayoutTemplate {
    const MARKER: f64 = 0.06;
    let item_height = f64::max(0.1, 0.8 / count as f64);

    (0..count).fold(
        LayoutTemplate::new(name).with(RegionKey::Title, TIMELINE_TITLE),
        |template, i| {
            let y = 0.18 + i as f64 * item_height;
            template
                .with(
                    RegionKey::Marker(i),
                    NormRect::new(0.1, y + item_height / 2.0 - MARKER / 2.0, MARKER, MARKER),
                )
                .with(
                    RegionKey::ItemText(i),
                    NormRect::new(0.2, y, 0.7, item_height),
                )
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slide::SlideType;

    fn assert_close(actual: &NormRect, expected: (f64, f64, f64, f64)) {
        let (x, y, w, h) = expected;
        assert!(
            (actual.x - x).abs() < 1e-9
                && (actual.y - y).abs() < 1e-9
                && (actual.w - w).abs() < 1e-9
                && (actual.h - h).abs() < 1e-9,
            "{actual:?} != {expected:?}"
        );
    }

    #[test]
    fn test_title_special_image_only_when_present() {
        let with = generate(&LayoutChoice::TitleSpecial { has_image: true });
        assert_eq!(with.expected_count(), 2);
        assert_close(with.get(&RegionKey::Image).unwrap(), (0.4, 0.75, 0.2, 0.15));

        let without = generate(&LayoutChoice::TitleSpecial { has_image: false });
        assert_eq!(without.expected_count(), 1);
        assert!(!without.contains(&RegionKey::Image));
    }

    #[test]
    fn test_alternating_split_mirrors() {
        let left = generate(&LayoutChoice::AlternatingSplit {
            is_image_left: true,
        });
        assert_close(left.get(&RegionKey::Image).unwrap(), (0.05, 0.15, 0.43, 0.7));
        assert_close(left.get(&RegionKey::Content).unwrap(), (0.52, 0.28, 0.43, 0.62));

        let right = generate(&LayoutChoice::AlternatingSplit {
            is_image_left: false,
        });
        assert_close(right.get(&RegionKey::Image).unwrap(), (0.52, 0.15, 0.43, 0.7));
        assert_close(right.get(&RegionKey::Title).unwrap(), (0.05, 0.1, 0.43, 0.15));
    }

    #[test]
    fn test_standard_text_content_follows_title() {
        let template = generate(&LayoutChoice::StandardText { title_height: 0.2 });
        assert_close(template.get(&RegionKey::Title).unwrap(), (0.05, 0.1, 0.9, 0.2));
        assert_close(template.get(&RegionKey::Content).unwrap(), (0.05, 0.35, 0.9, 0.55));
    }

    #[test]
    fn test_multi_column_regions() {
        let template = generate(&LayoutChoice::MultiColumn { columns: 2 });
        assert_eq!(template.expected_count(), 3);
        assert_close(template.get(&RegionKey::Column(0)).unwrap(), (0.05, 0.18, 0.43, 0.77));
        assert_close(template.get(&RegionKey::Column(1)).unwrap(), (0.5, 0.18, 0.43, 0.77));
    }

    #[test]
    fn test_zigzag_items_alternate_sides() {
        let template = generate(&LayoutChoice::ZigzagTimeline { item_count: 5 });
        // title + line + 5 markers + 5 texts
        assert_eq!(template.expected_count(), 12);
        assert_close(template.get(&RegionKey::ItemText(0)).unwrap(), (0.05, 0.18, 0.42, 0.16));
        assert_close(template.get(&RegionKey::ItemText(1)).unwrap(), (0.53, 0.34, 0.42, 0.16));
        let marker = template.get(&RegionKey::Marker(0)).unwrap();
        assert!((marker.w - 0.06).abs() < 1e-9);
        assert!((marker.x + marker.w / 2.0 - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_pyramid_geometry() {
        let template = generate(&LayoutChoice::Pyramid { item_count: 4 });
        assert_eq!(template.expected_count(), 9);
        assert_close(template.get(&RegionKey::ItemText(3)).unwrap(), (0.2, 0.78, 0.7, 0.2));
        assert_close(template.get(&RegionKey::Marker(0)).unwrap(), (0.1, 0.25, 0.06, 0.06));
    }

    #[test]
    fn test_coordinate_passes_positions_and_adds_title() {
        let mut positions = RegionMap::new();
        positions.insert(RegionKey::Image, NormRect::new(0.6, 0.2, 0.3, 0.6));
        positions.insert(RegionKey::Content, NormRect::new(0.5, 0.5, 0.9, 0.9));
        let template = generate(&LayoutChoice::Coordinate { positions });
        assert_eq!(template.expected_count(), 2);
        assert_close(template.get(&RegionKey::Image).unwrap(), (0.6, 0.2, 0.3, 0.6));
        assert_eq!(template.get(&RegionKey::Title), Some(&STANDARD_TITLE));
    }

    #[test]
    fn test_untitled_coordinate_slide_has_no_title_region() {
        let mut layout = RegionMap::new();
        layout.insert(RegionKey::Image, NormRect::new(0.1, 0.1, 0.8, 0.8));
        let untitled = Slide::new(SlideType::Coordinate, "").with_layout(&layout);
        let template = template_for_slide(&untitled, 0);
        assert_eq!(template.archetype, "coordinate");
        assert!(!template.contains(&RegionKey::Title));
        assert_eq!(template.expected_count(), 1);

        let titled = Slide::new(SlideType::Coordinate, "Map").with_layout(&layout);
        assert_eq!(template_for_slide(&titled, 0).get(&RegionKey::Title), Some(&STANDARD_TITLE));
    }

    #[test]
    fn test_unknown_archetype_falls_back_to_standard_text() {
        let template = generate(&LayoutChoice::from_name("radial", &serde_json::Value::Null));
        assert_eq!(template.archetype, "standard-text");
        assert!(template.contains(&RegionKey::Title));
        assert!(template.contains(&RegionKey::Content));
    }

    #[test]
    fn test_template_for_slide_has_title_and_image() {
        let slide = Slide::new(SlideType::ContentSlide, "Roadmap")
            .with_content("- one\n- two")
            .with_image("r.png");
        let template = template_for_slide(&slide, 0);
        assert!(template.contains(&RegionKey::Title));
        assert!(template.contains(&RegionKey::Image));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn arb_choice() -> impl Strategy<Value = LayoutChoice> {
            prop_oneof![
                any::<bool>().prop_map(|has_image| LayoutChoice::TitleSpecial { has_image }),
                Just(LayoutChoice::ImageContentStack),
                any::<bool>().prop_map(|is_image_left| LayoutChoice::ImageFocus { is_image_left }),
                any::<bool>()
                    .prop_map(|is_image_left| LayoutChoice::AlternatingSplit { is_image_left }),
                (0usize..20).prop_map(|columns| LayoutChoice::MultiColumn { columns }),
                Just(LayoutChoice::CompactList),
                (0usize..40).prop_map(|item_count| LayoutChoice::ZigzagTimeline { item_count }),
                (0usize..40).prop_map(|item_count| LayoutChoice::Pyramid { item_count }),
                (-1.0f64..2.0).prop_map(|title_height| LayoutChoice::StandardText { title_height }),
            ]
        }

        proptest! {
            #[test]
            fn prop_regions_stay_inside_slide(choice in arb_choice()) {
                let template = generate(&choice);
                prop_assert!(template.contains(&RegionKey::Title));
                for (key, rect) in &template.regions {
                    prop_assert!(
                        rect.within_unit(CONTAINMENT_EPSILON),
                        "{} of {} escapes the slide: {:?}", key, template.archetype, rect
                    );
                }
            }
        }
    }
}
