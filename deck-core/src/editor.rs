//! Free-form slide editing on a fixed pixel canvas.
//!
//! The editor shows one slide as absolutely positioned elements on a
//! 1280x720 canvas. Moves are clamped to the canvas, alignment guides are
//! computed against sibling elements, and saving converts element pixels
//! back into the normalized layout the rest of the engine consumes.

use serde::{Deserialize, Serialize};

use crate::content::editor_plain_text;
use crate::error::{DeckError, DeckResult};
use crate::geometry::{NormRect, PixelRect, Size};
use crate::region::RegionKey;
use crate::slide::{Slide, SlideType, Theme};

/// Editor canvas settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasConfig {
    /// Canvas width in pixels.
    pub width: f64,
    /// Canvas height in pixels.
    pub height: f64,
    /// Distance under which an edge or center produces a guide.
    pub snap_threshold: f64,
    /// Padding around the selection outline.
    pub selection_padding: f64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
            snap_threshold: 8.0,
            selection_padding: 5.0,
        }
    }
}

/// Which slide field an element edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementRole {
    /// The slide title.
    Title,
    /// The slide body.
    Content,
    /// The slide image.
    Image,
}

impl ElementRole {
    /// Layout region the role maps to.
    #[must_use]
    pub fn region(self) -> RegionKey {
        match self {
            Self::Title => RegionKey::Title,
            Self::Content => RegionKey::Content,
            Self::Image => RegionKey::Image,
        }
    }
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    /// Left aligned.
    #[default]
    Left,
    /// Centered.
    Center,
    /// Right aligned.
    Right,
}

/// Vertical text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlign {
    /// Top aligned.
    #[default]
    Top,
    /// Centered.
    Middle,
    /// Bottom aligned.
    Bottom,
}

/// The content of a canvas element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementKind {
    /// A text box.
    #[serde(rename_all = "camelCase")]
    Text {
        /// Text content.
        #[serde(default)]
        text: String,
        /// Font size in pixels.
        #[serde(default = "default_font_size")]
        font_size: f64,
        /// Font family.
        #[serde(default = "default_font_family")]
        font_family: String,
        /// Text color.
        #[serde(default = "default_fill")]
        fill: String,
        /// Horizontal alignment.
        #[serde(default)]
        align: TextAlign,
        /// Vertical alignment.
        #[serde(default)]
        vertical_align: VerticalAlign,
        /// Font style, e.g. `normal` or `bold`.
        #[serde(default = "default_font_style")]
        font_style: String,
        /// Line height multiplier.
        #[serde(default = "default_line_height")]
        line_height: f64,
    },
    /// An image.
    Image {
        /// Image URL.
        src: String,
    },
    /// A filled rectangle.
    #[serde(rename_all = "camelCase")]
    Shape {
        /// Fill color.
        #[serde(default = "default_fill")]
        fill: String,
        /// Corner radius in pixels.
        #[serde(default)]
        corner_radius: f64,
    },
}

fn default_font_size() -> f64 {
    20.0
}

fn default_font_family() -> String {
    "Arial".to_string()
}

fn default_fill() -> String {
    "#000000".to_string()
}

fn default_font_style() -> String {
    "normal".to_string()
}

fn default_line_height() -> f64 {
    1.2
}

fn default_width() -> f64 {
    200.0
}

fn default_height() -> f64 {
    50.0
}

impl ElementKind {
    /// A text element with default styling.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            font_size: default_font_size(),
            font_family: default_font_family(),
            fill: default_fill(),
            align: TextAlign::default(),
            vertical_align: VerticalAlign::default(),
            font_style: default_font_style(),
            line_height: default_line_height(),
        }
    }

    /// An image element.
    #[must_use]
    pub fn image(src: impl Into<String>) -> Self {
        Self::Image { src: src.into() }
    }
}

/// An element positioned on the editor canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasElement {
    /// Element identifier, unique within the slide.
    pub id: String,
    /// Slide field this element edits, if any.
    #[serde(rename = "elementType", default, skip_serializing_if = "Option::is_none")]
    pub role: Option<ElementRole>,
    /// Left edge in pixels.
    #[serde(default)]
    pub x: f64,
    /// Top edge in pixels.
    #[serde(default)]
    pub y: f64,
    /// Width in pixels.
    #[serde(default = "default_width")]
    pub width: f64,
    /// Height in pixels.
    #[serde(default = "default_height")]
    pub height: f64,
    /// Element content.
    #[serde(flatten)]
    pub kind: ElementKind,
}

impl CanvasElement {
    /// Create an element with a random id and the default 200x50 size.
    #[must_use]
    pub fn new(kind: ElementKind) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: None,
            x: 0.0,
            y: 0.0,
            width: default_width(),
            height: default_height(),
            kind,
        }
    }

    /// Set the id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the role.
    #[must_use]
    pub fn with_role(mut self, role: ElementRole) -> Self {
        self.role = Some(role);
        self
    }

    /// Set position and size.
    #[must_use]
    pub fn with_bounds(mut self, bounds: PixelRect) -> Self {
        self.x = bounds.left;
        self.y = bounds.top;
        self.width = bounds.width;
        self.height = bounds.height;
        self
    }

    /// Position and size.
    #[must_use]
    pub fn bounds(&self) -> PixelRect {
        PixelRect::new(self.x, self.y, self.width, self.height)
    }

    /// Check if a canvas point is within this element.
    #[must_use]
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }

    fn right(&self) -> f64 {
        self.x + self.width
    }

    fn bottom(&self) -> f64 {
        self.y + self.height
    }

    fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    fn center_y(&self) -> f64 {
        self.y + self.height / 2.0
    }
}

/// Alignment guides shown while dragging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapGuides {
    /// X positions of vertical guide lines.
    pub vertical: Vec<f64>,
    /// Y positions of horizontal guide lines.
    pub horizontal: Vec<f64>,
}

impl SnapGuides {
    /// Whether no guide is shown.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertical.is_empty() && self.horizontal.is_empty()
    }
}

fn push_unique(guides: &mut Vec<f64>, value: f64) {
    if !guides.contains(&value) {
        guides.push(value);
    }
}

impl CanvasConfig {
    /// Clamp a candidate position so an element of `width` x `height` stays
    /// on the canvas.
    #[must_use]
    pub fn constrain_to_bounds(&self, width: f64, height: f64, x: f64, y: f64) -> (f64, f64) {
        (
            x.min(self.width - width).max(0.0),
            y.min(self.height - height).max(0.0),
        )
    }

    /// Guides for `dragged` against every other element and the canvas
    /// center.
    #[must_use]
    pub fn snap_guides(&self, dragged: &CanvasElement, elements: &[CanvasElement]) -> SnapGuides {
        let threshold = self.snap_threshold;
        let near = |a: f64, b: f64| (a - b).abs() < threshold;
        let mut guides = SnapGuides::default();

        for el in elements.iter().filter(|el| el.id != dragged.id) {
            let vertical = [
                (el.x, dragged.x, el.x),
                (el.right(), dragged.right(), el.right()),
                (el.x, dragged.right(), el.x),
                (el.right(), dragged.x, el.right()),
                (el.center_x(), dragged.center_x(), el.center_x()),
            ];
            for (a, b, at) in vertical {
                if near(a, b) {
                    push_unique(&mut guides.vertical, at);
                }
            }

            let horizontal = [
                (el.y, dragged.y, el.y),
                (el.bottom(), dragged.bottom(), el.bottom()),
                (el.y, dragged.bottom(), el.y),
                (el.bottom(), dragged.y, el.bottom()),
                (el.center_y(), dragged.center_y(), el.center_y()),
            ];
            for (a, b, at) in horizontal {
                if near(a, b) {
                    push_unique(&mut guides.horizontal, at);
                }
            }
        }

        let canvas_center_x = self.width / 2.0;
        let canvas_center_y = self.height / 2.0;
        if near(dragged.center_x(), canvas_center_x) {
            push_unique(&mut guides.vertical, canvas_center_x);
        }
        if near(dragged.center_y(), canvas_center_y) {
            push_unique(&mut guides.horizontal, canvas_center_y);
        }

        guides
    }

    /// Outline drawn around a selected element.
    #[must_use]
    pub fn selection_bounds(&self, element: &CanvasElement) -> PixelRect {
        let pad = self.selection_padding;
        PixelRect::new(
            element.x - pad,
            element.y - pad,
            element.width + pad * 2.0,
            element.height + pad * 2.0,
        )
    }

    /// Element pixels as fractions of the canvas.
    #[must_use]
    pub fn pixels_to_layout(&self, bounds: &PixelRect) -> NormRect {
        NormRect::new(
            bounds.left / self.width,
            bounds.top / self.height,
            bounds.width / self.width,
            bounds.height / self.height,
        )
    }

    /// Normalized rectangle in canvas pixels.
    #[must_use]
    pub fn layout_to_pixels(&self, rect: &NormRect) -> PixelRect {
        PixelRect::new(
            rect.x * self.width,
            rect.y * self.height,
            rect.w * self.width,
            rect.h * self.height,
        )
    }
}

/// Place an image of `image` size so it covers `bounds`, cropping the
/// overflow equally on both sides.
#[must_use]
pub fn image_cover_fit(image: Size, bounds: &PixelRect) -> PixelRect {
    if !image.is_positive() || !bounds.has_area() {
        return *bounds;
    }
    let box_aspect = bounds.width / bounds.height;
    let image_aspect = image.width / image.height;

    if image_aspect > box_aspect {
        let width = bounds.height * image_aspect;
        PixelRect::new(
            bounds.left - (width - bounds.width) / 2.0,
            bounds.top,
            width,
            bounds.height,
        )
    } else {
        let height = bounds.width / image_aspect;
        PixelRect::new(
            bounds.left,
            bounds.top - (height - bounds.height) / 2.0,
            bounds.width,
            height,
        )
    }
}

struct RoleBoxes {
    title: Option<PixelRect>,
    content: Option<PixelRect>,
    image: Option<PixelRect>,
}

fn default_boxes(slide_type: SlideType) -> RoleBoxes {
    let title_band = PixelRect::new(80.0, 240.0, 1120.0, 160.0);
    let heading = PixelRect::new(80.0, 60.0, 1120.0, 90.0);
    let centered_image = PixelRect::new(440.0, 420.0, 400.0, 225.0);
    let side_image = PixelRect::new(80.0, 180.0, 400.0, 450.0);

    match slide_type {
        SlideType::TitleSlide | SlideType::ConclusionSlide => RoleBoxes {
            title: Some(title_band),
            content: None,
            image: Some(centered_image),
        },
        SlideType::AgendaSlide => RoleBoxes {
            title: Some(heading),
            content: Some(PixelRect::new(80.0, 180.0, 1120.0, 480.0)),
            image: Some(side_image),
        },
        SlideType::ContentSlide => RoleBoxes {
            title: Some(heading),
            content: Some(PixelRect::new(520.0, 180.0, 680.0, 480.0)),
            image: Some(side_image),
        },
        SlideType::QandA => RoleBoxes {
            title: Some(title_band),
            content: None,
            image: None,
        },
        SlideType::Coordinate | SlideType::Unknown => RoleBoxes {
            title: None,
            content: None,
            image: None,
        },
    }
}

/// Build editor elements for a slide that has never been edited.
///
/// Regions come from the slide's stored layout when it has one, otherwise
/// from fixed per-type positions.
#[must_use]
pub fn slide_to_elements(slide: &Slide, theme: &Theme, config: &CanvasConfig) -> Vec<CanvasElement> {
    let defaults = default_boxes(slide.slide_type);
    let stored = slide.layout_positions().unwrap_or_default();
    let place = |key: RegionKey, fallback: Option<PixelRect>, last_resort: PixelRect| {
        stored
            .get(&key)
            .map(|rect| config.layout_to_pixels(rect))
            .or(fallback)
            .unwrap_or(last_resort)
    };
    let suffix = if slide.slide_number > 0 {
        slide.slide_number.to_string()
    } else {
        uuid::Uuid::new_v4().to_string()
    };

    let mut elements = Vec::new();

    if slide.has_title() {
        let bounds = place(
            RegionKey::Title,
            defaults.title,
            PixelRect::new(80.0, 60.0, 1120.0, 100.0),
        );
        let font_size = if slide.slide_type == SlideType::TitleSlide {
            72.0
        } else {
            48.0
        };
        elements.push(
            CanvasElement::new(ElementKind::Text {
                text: slide.title.clone(),
                font_size,
                font_family: theme.heading_font().to_string(),
                fill: theme.primary_color().to_string(),
                align: TextAlign::Left,
                vertical_align: VerticalAlign::Middle,
                font_style: "bold".to_string(),
                line_height: default_line_height(),
            })
            .with_id(format!("title-{suffix}"))
            .with_role(ElementRole::Title)
            .with_bounds(bounds),
        );
    }

    if slide.has_content() {
        let bounds = place(
            RegionKey::Content,
            defaults.content,
            PixelRect::new(80.0, 180.0, 1120.0, 450.0),
        );
        elements.push(
            CanvasElement::new(ElementKind::Text {
                text: editor_plain_text(slide.content.as_deref()),
                font_size: 28.0,
                font_family: theme.body_font().to_string(),
                fill: theme.text_color().to_string(),
                align: TextAlign::Left,
                vertical_align: VerticalAlign::Top,
                font_style: default_font_style(),
                line_height: 1.5,
            })
            .with_id(format!("content-{suffix}"))
            .with_role(ElementRole::Content)
            .with_bounds(bounds),
        );
    }

    if let Some(url) = slide.image_url.as_deref().filter(|_| slide.has_image()) {
        let bounds = place(
            RegionKey::Image,
            defaults.image,
            PixelRect::new(440.0, 420.0, 400.0, 225.0),
        );
        elements.push(
            CanvasElement::new(ElementKind::image(url))
                .with_id(format!("image-{suffix}"))
                .with_role(ElementRole::Image)
                .with_bounds(bounds),
        );
    }

    elements
}

/// Result of moving an element.
#[derive(Debug, Clone, PartialEq)]
pub struct DragUpdate {
    /// Clamped left edge.
    pub x: f64,
    /// Clamped top edge.
    pub y: f64,
    /// Guides at the new position.
    pub guides: SnapGuides,
}

/// Elements of one slide under edit.
#[derive(Debug, Clone, Default)]
pub struct EditorScene {
    config: CanvasConfig,
    elements: Vec<CanvasElement>,
    selected: Option<String>,
    guides: SnapGuides,
}

impl EditorScene {
    /// Create an empty scene.
    #[must_use]
    pub fn new(config: CanvasConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Open a slide, reusing its saved elements when present.
    #[must_use]
    pub fn from_slide(slide: &Slide, theme: &Theme, config: CanvasConfig) -> Self {
        let elements = slide
            .canvas_elements
            .clone()
            .unwrap_or_else(|| slide_to_elements(slide, theme, &config));
        Self {
            config,
            elements,
            ..Self::default()
        }
    }

    /// Canvas settings.
    #[must_use]
    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    /// Elements in paint order.
    #[must_use]
    pub fn elements(&self) -> &[CanvasElement] {
        &self.elements
    }

    /// Element by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&CanvasElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    fn get_mut(&mut self, id: &str) -> DeckResult<&mut CanvasElement> {
        self.elements
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| DeckError::ElementNotFound(id.to_string()))
    }

    /// Add an element on top.
    ///
    /// # Errors
    ///
    /// Returns [`DeckError::InvalidOperation`] if the id is already used.
    pub fn add_element(&mut self, element: CanvasElement) -> DeckResult<()> {
        if self.get(&element.id).is_some() {
            return Err(DeckError::InvalidOperation(format!(
                "duplicate element id {}",
                element.id
            )));
        }
        self.elements.push(element);
        Ok(())
    }

    /// Remove an element.
    ///
    /// # Errors
    ///
    /// Returns [`DeckError::ElementNotFound`] if no element has `id`.
    pub fn remove_element(&mut self, id: &str) -> DeckResult<CanvasElement> {
        let index = self
            .elements
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| DeckError::ElementNotFound(id.to_string()))?;
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        Ok(self.elements.remove(index))
    }

    /// Topmost element containing the point.
    #[must_use]
    pub fn element_at(&self, x: f64, y: f64) -> Option<&CanvasElement> {
        self.elements.iter().rev().find(|e| e.contains_point(x, y))
    }

    /// Select an element, clearing any guides.
    ///
    /// # Errors
    ///
    /// Returns [`DeckError::ElementNotFound`] if no element has `id`.
    pub fn select(&mut self, id: &str) -> DeckResult<()> {
        if self.get(id).is_none() {
            return Err(DeckError::ElementNotFound(id.to_string()));
        }
        self.selected = Some(id.to_string());
        self.guides = SnapGuides::default();
        Ok(())
    }

    /// Clear the selection.
    pub fn deselect_all(&mut self) {
        self.selected = None;
    }

    /// Selected element.
    #[must_use]
    pub fn selected(&self) -> Option<&CanvasElement> {
        self.selected.as_deref().and_then(|id| self.get(id))
    }

    /// Outline of the selected element.
    #[must_use]
    pub fn selection_bounds(&self) -> Option<PixelRect> {
        self.selected().map(|e| self.config.selection_bounds(e))
    }

    /// Guides from the last drag step.
    #[must_use]
    pub fn guides(&self) -> &SnapGuides {
        &self.guides
    }

    /// Move an element, clamped to the canvas, and compute guides for its
    /// new position.
    ///
    /// # Errors
    ///
    /// Returns [`DeckError::ElementNotFound`] if no element has `id`.
    pub fn drag_to(&mut self, id: &str, x: f64, y: f64) -> DeckResult<DragUpdate> {
        let config = self.config;
        let element = self.get_mut(id)?;
        let (x, y) = config.constrain_to_bounds(element.width, element.height, x, y);
        element.x = x;
        element.y = y;
        let moved = element.clone();

        self.guides = config.snap_guides(&moved, &self.elements);
        Ok(DragUpdate {
            x,
            y,
            guides: self.guides.clone(),
        })
    }

    /// Finish a drag, hiding guides.
    pub fn end_drag(&mut self) {
        self.guides = SnapGuides::default();
    }

    /// Resize an element, keeping it on the canvas.
    ///
    /// # Errors
    ///
    /// Returns [`DeckError::ElementNotFound`] if no element has `id`, or
    /// [`DeckError::InvalidOperation`] for a non-positive size.
    pub fn resize(&mut self, id: &str, width: f64, height: f64) -> DeckResult<()> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(DeckError::InvalidOperation(format!(
                "invalid size {width}x{height}"
            )));
        }
        let config = self.config;
        let element = self.get_mut(id)?;
        element.width = width.min(config.width);
        element.height = height.min(config.height);
        let (x, y) = config.constrain_to_bounds(element.width, element.height, element.x, element.y);
        element.x = x;
        element.y = y;
        Ok(())
    }

    /// Write the edit back into `slide`: the elements are stored on the
    /// slide, and the positions of role-tagged elements are merged into its
    /// layout.
    #[must_use]
    pub fn apply_to_slide(&self, slide: &Slide) -> Slide {
        let mut layout = match slide.layout.clone() {
            Some(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        };
        for element in &self.elements {
            let Some(role) = element.role else {
                continue;
            };
            let rect = self.config.pixels_to_layout(&element.bounds());
            if let Ok(value) = serde_json::to_value(rect) {
                layout.insert(role.region().to_string(), value);
            }
        }

        let mut updated = slide.clone();
        updated.layout = Some(serde_json::Value::Object(layout));
        updated.canvas_elements = Some(self.elements.clone());
        updated
    }
}
