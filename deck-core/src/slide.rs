//! Slide and theme data as delivered by the generation backend.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::coords::normalize_raw_layout;
use crate::editor::CanvasElement;
use crate::geometry::NormRect;
use crate::region::RegionKey;

/// Region rectangles of one slide, keyed by region.
pub type RegionMap = BTreeMap<RegionKey, NormRect>;

/// Kind of slide, as labelled by the generation backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SlideType {
    /// Opening slide with a large centered title.
    TitleSlide,
    /// Agenda listing.
    AgendaSlide,
    /// Regular content slide.
    ContentSlide,
    /// Closing/summary slide.
    ConclusionSlide,
    /// Questions slide.
    #[serde(rename = "Q&A")]
    QandA,
    /// Slide whose regions are given explicitly by its `layout`.
    Coordinate,
    /// Any type the engine does not know; laid out like a content slide.
    #[default]
    #[serde(other)]
    Unknown,
}

impl SlideType {
    /// Title and Q&A slides share the centered, large-title treatment.
    #[must_use]
    pub fn is_title_like(self) -> bool {
        matches!(self, Self::TitleSlide | Self::QandA)
    }
}

/// A single slide.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slide {
    /// 1-based slide number assigned by the backend.
    #[serde(default)]
    pub slide_number: u32,
    /// Slide kind.
    #[serde(rename = "type", default)]
    pub slide_type: SlideType,
    /// Slide title.
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    /// Markdown-ish body text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Footer text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
    /// Header text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    /// Speaker notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker_notes: Option<String>,
    /// Pre-computed region positions. Kept untyped so malformed entries from
    /// the host can be filtered instead of rejecting the whole slide.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<serde_json::Value>,
    /// Elements written by the canvas editor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canvas_elements: Option<Vec<CanvasElement>>,
}

impl Slide {
    /// Create a slide of the given type and title.
    #[must_use]
    pub fn new(slide_type: SlideType, title: impl Into<String>) -> Self {
        Self {
            slide_type,
            title: title.into(),
            ..Self::default()
        }
    }

    /// Set the slide number.
    #[must_use]
    pub fn with_number(mut self, slide_number: u32) -> Self {
        self.slide_number = slide_number;
        self
    }

    /// Set the body content.
    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Set the image URL.
    #[must_use]
    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    /// Attach explicit region positions.
    #[must_use]
    pub fn with_layout(mut self, layout: &RegionMap) -> Self {
        self.layout = serde_json::to_value(layout).ok();
        self
    }

    /// Whether the slide has body text.
    #[must_use]
    pub fn has_content(&self) -> bool {
        self.content
            .as_deref()
            .is_some_and(|c| !c.trim().is_empty())
    }

    /// Whether the slide has an image.
    #[must_use]
    pub fn has_image(&self) -> bool {
        self.image_url
            .as_deref()
            .is_some_and(|u| !u.trim().is_empty())
    }

    /// Whether the slide has a non-empty title.
    #[must_use]
    pub fn has_title(&self) -> bool {
        !self.title.trim().is_empty()
    }

    /// The valid entries of the attached layout, if any.
    #[must_use]
    pub fn layout_positions(&self) -> Option<RegionMap> {
        self.layout.as_ref().and_then(normalize_raw_layout)
    }
}

/// Default background color.
pub const DEFAULT_BACKGROUND: &str = "#FFFFFF";
/// Default primary (heading/accent) color.
pub const DEFAULT_PRIMARY: &str = "#1f2937";
/// Default body text color.
pub const DEFAULT_TEXT: &str = "#374151";
/// Default font family for headings and body.
pub const DEFAULT_FONT: &str = "Inter";

/// Visual theme for a presentation.
///
/// Every field is optional on the wire; accessors fall back to the defaults
/// above, which also serve as the fallback theme when none can be fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    /// Page background color.
    #[serde(default)]
    pub background_color: Option<String>,
    /// Heading and accent color.
    #[serde(default)]
    pub primary_color: Option<String>,
    /// Secondary accent color.
    #[serde(default)]
    pub secondary_color: Option<String>,
    /// Body text color.
    #[serde(default)]
    pub text_color: Option<String>,
    /// Heading font family.
    #[serde(default)]
    pub heading_font: Option<String>,
    /// Body font family.
    #[serde(default)]
    pub body_font: Option<String>,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background_color: Some(DEFAULT_BACKGROUND.to_string()),
            primary_color: Some(DEFAULT_PRIMARY.to_string()),
            secondary_color: None,
            text_color: Some(DEFAULT_TEXT.to_string()),
            heading_font: Some(DEFAULT_FONT.to_string()),
            body_font: Some(DEFAULT_FONT.to_string()),
        }
    }
}

impl Theme {
    /// Background color, or the default.
    #[must_use]
    pub fn background_color(&self) -> &str {
        non_empty(self.background_color.as_deref()).unwrap_or(DEFAULT_BACKGROUND)
    }

    /// Primary color, or the default.
    #[must_use]
    pub fn primary_color(&self) -> &str {
        non_empty(self.primary_color.as_deref()).unwrap_or(DEFAULT_PRIMARY)
    }

    /// Secondary color, falling back to the primary color.
    #[must_use]
    pub fn secondary_color(&self) -> &str {
        non_empty(self.secondary_color.as_deref()).unwrap_or_else(|| self.primary_color())
    }

    /// Body text color, or the default.
    #[must_use]
    pub fn text_color(&self) -> &str {
        non_empty(self.text_color.as_deref()).unwrap_or(DEFAULT_TEXT)
    }

    /// Heading font, or the default.
    #[must_use]
    pub fn heading_font(&self) -> &str {
        non_empty(self.heading_font.as_deref()).unwrap_or(DEFAULT_FONT)
    }

    /// Body font, or the default.
    #[must_use]
    pub fn body_font(&self) -> &str {
        non_empty(self.body_font.as_deref()).unwrap_or(DEFAULT_FONT)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slide_from_backend_json() {
        let json = r#"{
            "slideNumber": 2,
            "type": "Q&A",
            "title": "Questions?",
            "imageUrl": "https://img.example/q.png",
            "speakerNotes": "Thank the audience"
        }"#;
        let slide: Slide = serde_json::from_str(json).unwrap();
        assert_eq!(slide.slide_number, 2);
        assert_eq!(slide.slide_type, SlideType::QandA);
        assert!(slide.has_image());
        assert!(!slide.has_content());
        assert_eq!(slide.speaker_notes.as_deref(), Some("Thank the audience"));
    }

    #[test]
    fn test_unknown_slide_type_and_null_title() {
        let slide: Slide =
            serde_json::from_str(r#"{"type": "ChartSlide", "title": null, "content": "  "}"#)
                .unwrap();
        assert_eq!(slide.slide_type, SlideType::Unknown);
        assert_eq!(slide.title, "");
        assert!(!slide.has_content());
        assert!(!slide.has_title());
    }

    #[test]
    fn test_layout_positions_filters_invalid_entries() {
        let slide: Slide = serde_json::from_str(
            r#"{
                "type": "Coordinate",
                "title": "T",
                "layout": {
                    "title": {"x": 0.1, "y": 0.1, "width": 0.8, "height": 0.1},
                    "image": {"x": "left", "y": 0.1, "w": 0.2, "h": 0.2},
                    "footer": {"x": 0.1, "y": 0.9, "w": 0.8, "h": 0.05}
                }
            }"#,
        )
        .unwrap();
        let positions = slide.layout_positions().unwrap();
        assert_eq!(positions.len(), 1);
        assert!(positions.contains_key(&RegionKey::Title));
    }

    #[test]
    fn test_theme_defaults_for_missing_fields() {
        let theme: Theme =
            serde_json::from_str(r##"{"primary_color": "#ff0000", "text_color": ""}"##).unwrap();
        assert_eq!(theme.primary_color(), "#ff0000");
        assert_eq!(theme.text_color(), DEFAULT_TEXT);
        assert_eq!(theme.background_color(), DEFAULT_BACKGROUND);
        assert_eq!(theme.secondary_color(), "#ff0000");
        assert_eq!(theme.heading_font(), DEFAULT_FONT);
    }
}
