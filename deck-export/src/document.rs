//! Output document model.
//!
//! A [`Deck`] is a format-neutral list of pages, each holding positioned
//! text boxes, images and shapes in document units. The PPTX and SVG
//! writers render a `Deck`; it also serializes to JSON directly.

use deck_core::DocRect;
use serde::{Deserialize, Serialize};

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HAlign {
    /// Left aligned.
    #[default]
    Left,
    /// Centered.
    Center,
}

/// Vertical text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VAlign {
    /// Top aligned.
    #[default]
    Top,
    /// Centered.
    Middle,
}

/// A run of uniformly styled text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRun {
    /// Text content.
    pub text: String,
    /// Font family.
    pub font_face: String,
    /// Font size in points.
    pub font_size: u32,
    /// Colour as `RRGGBB`.
    pub color: String,
    /// Bold weight.
    pub bold: bool,
}

/// A positioned text box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBox {
    /// Box position.
    pub rect: DocRect,
    /// Runs rendered in order on one paragraph.
    pub runs: Vec<TextRun>,
    /// Horizontal alignment.
    pub align: HAlign,
    /// Vertical alignment.
    pub valign: VAlign,
}

impl TextBox {
    /// Concatenated text of all runs.
    #[must_use]
    pub fn plain_text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// How an image fills its box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSizing {
    /// Fill the box, cropping overflow.
    Cover,
    /// Fit inside the box.
    Contain,
}

/// A positioned image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageBox {
    /// Box position.
    pub rect: DocRect,
    /// Image URL.
    pub src: String,
    /// Fill mode.
    pub sizing: ImageSizing,
    /// Intrinsic width over height of the image.
    #[serde(default = "square")]
    pub aspect: f64,
}

fn square() -> f64 {
    1.0
}

/// A filled rounded rectangle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeBox {
    /// Shape position.
    pub rect: DocRect,
    /// Fill colour as `RRGGBB`.
    pub fill: String,
    /// Corner radius in document units.
    pub corner_radius: f64,
}

/// Something drawn on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Primitive {
    /// Text box.
    Text(TextBox),
    /// Image.
    Image(ImageBox),
    /// Shape.
    Shape(ShapeBox),
}

/// One exported slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// Number of the source slide.
    pub slide_number: u32,
    /// Background colour as `RRGGBB`.
    pub background: Option<String>,
    /// Primitives in paint order.
    pub primitives: Vec<Primitive>,
}

impl Page {
    /// Text boxes on the page.
    pub fn text_boxes(&self) -> impl Iterator<Item = &TextBox> {
        self.primitives.iter().filter_map(|p| match p {
            Primitive::Text(text) => Some(text),
            _ => None,
        })
    }
}

/// Receives primitives page by page.
pub trait DocumentBuilder {
    /// Start a new page; later primitives land on it.
    fn begin_page(&mut self, slide_number: u32, background: Option<String>);

    /// Add a text box to the current page.
    fn add_text(&mut self, text: TextBox);

    /// Add an image to the current page.
    fn add_image(&mut self, image: ImageBox);

    /// Add a shape to the current page.
    fn add_shape(&mut self, shape: ShapeBox);
}

/// A format-neutral exported presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deck {
    /// Presentation title.
    pub title: String,
    /// Page width in document units.
    pub width: f64,
    /// Page height in document units.
    pub height: f64,
    /// Pages in order.
    pub pages: Vec<Page>,
}

impl Deck {
    /// Create an empty deck.
    #[must_use]
    pub fn new(title: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            title: title.into(),
            width,
            height,
            pages: Vec::new(),
        }
    }

    fn push(&mut self, primitive: Primitive) {
        match self.pages.last_mut() {
            Some(page) => page.primitives.push(primitive),
            None => tracing::warn!("Primitive added before any page was started"),
        }
    }
}

impl DocumentBuilder for Deck {
    fn begin_page(&mut self, slide_number: u32, background: Option<String>) {
        self.pages.push(Page {
            slide_number,
            background,
            primitives: Vec::new(),
        });
    }

    fn add_text(&mut self, text: TextBox) {
        self.push(Primitive::Text(text));
    }

    fn add_image(&mut self, image: ImageBox) {
        self.push(Primitive::Image(image));
    }

    fn add_shape(&mut self, shape: ShapeBox) {
        self.push(Primitive::Shape(shape));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str) -> TextRun {
        TextRun {
            text: text.to_string(),
            font_face: "Inter".to_string(),
            font_size: 16,
            color: "000000".to_string(),
            bold: false,
        }
    }

    #[test]
    fn test_primitives_land_on_current_page() {
        let mut deck = Deck::new("Demo", 10.0, 5.625);
        deck.add_text(TextBox {
            rect: DocRect::new(0.0, 0.0, 1.0, 1.0),
            runs: vec![run("orphan")],
            align: HAlign::Left,
            valign: VAlign::Top,
        });
        assert!(deck.pages.is_empty());

        deck.begin_page(1, Some("FFFFFF".to_string()));
        deck.add_text(TextBox {
            rect: DocRect::new(0.5, 0.5, 9.0, 1.0),
            runs: vec![run("Hello, "), run("world")],
            align: HAlign::Center,
            valign: VAlign::Top,
        });
        deck.begin_page(2, None);
        deck.add_shape(ShapeBox {
            rect: DocRect::new(1.0, 1.0, 0.5, 0.5),
            fill: "1F2937".to_string(),
            corner_radius: 0.25,
        });

        assert_eq!(deck.pages.len(), 2);
        assert_eq!(deck.pages[0].text_boxes().next().unwrap().plain_text(), "Hello, world");
        assert_eq!(deck.pages[1].primitives.len(), 1);
    }

    #[test]
    fn test_json_shape() {
        let mut deck = Deck::new("Demo", 10.0, 5.625);
        deck.begin_page(3, None);
        deck.add_image(ImageBox {
            rect: DocRect::new(1.0, 1.0, 4.0, 2.0),
            src: "https://img.example/a.png".to_string(),
            sizing: ImageSizing::Contain,
            aspect: 1.0,
        });
        let json = serde_json::to_value(&deck).unwrap();
        assert_eq!(json["pages"][0]["slideNumber"], 3);
        assert_eq!(json["pages"][0]["primitives"][0]["kind"], "image");
        assert_eq!(json["pages"][0]["primitives"][0]["sizing"], "contain");
    }
}
