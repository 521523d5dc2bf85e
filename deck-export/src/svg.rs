//! SVG preview writer.
//!
//! Renders every page of a [`Deck`] into one SVG document, pages stacked
//! top to bottom with a gap between them. Text is not wrapped; the output
//! is a positional preview, not a faithful typesetting of the deck.

use std::fmt::Write as _;

use crate::document::{Deck, HAlign, ImageBox, ImageSizing, Page, Primitive, ShapeBox, TextBox, VAlign};
use crate::error::ExportResult;

/// Vertical gap between pages, in document units.
pub const PAGE_GAP: f64 = 0.25;

const POINTS_PER_UNIT: f64 = 72.0;

/// Renders a [`Deck`] as SVG markup.
#[derive(Debug, Clone, Copy)]
pub struct SvgWriter {
    pixels_per_unit: f64,
}

impl SvgWriter {
    /// Create a writer drawing `pixels_per_unit` pixels per document unit.
    #[must_use]
    pub fn new(pixels_per_unit: f64) -> Self {
        let pixels_per_unit = if pixels_per_unit.is_finite() && pixels_per_unit > 0.0 {
            pixels_per_unit
        } else {
            128.0
        };
        Self { pixels_per_unit }
    }

    fn px(&self, units: f64) -> f64 {
        units * self.pixels_per_unit
    }

    /// Render all pages.
    ///
    /// # Errors
    ///
    /// Returns an error if markup cannot be formatted.
    pub fn render(&self, deck: &Deck) -> ExportResult<String> {
        #[allow(clippy::cast_precision_loss)]
        let pages = deck.pages.len() as f64;
        let width = self.px(deck.width);
        let height = self.px(deck.height * pages + PAGE_GAP * (pages - 1.0).max(0.0));

        let mut svg = String::with_capacity(4096);
        write!(
            svg,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" \
             width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">"
        )?;

        for (i, page) in deck.pages.iter().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let top = self.px((deck.height + PAGE_GAP) * i as f64);
            self.render_page(&mut svg, deck, page, top)?;
        }

        svg.push_str("</svg>");
        Ok(svg)
    }

    fn render_page(&self, svg: &mut String, deck: &Deck, page: &Page, top: f64) -> ExportResult<()> {
        write!(
            svg,
            "<g id=\"slide-{}\" transform=\"translate(0,{top})\">",
            page.slide_number
        )?;
        let fill = page.background.as_deref().unwrap_or("FFFFFF");
        write!(
            svg,
            "<rect x=\"0\" y=\"0\" width=\"{}\" height=\"{}\" fill=\"#{}\"/>",
            self.px(deck.width),
            self.px(deck.height),
            escape_xml(fill)
        )?;

        for primitive in &page.primitives {
            match primitive {
                Primitive::Text(text) => self.render_text(svg, text)?,
                Primitive::Image(image) => self.render_image(svg, image)?,
                Primitive::Shape(shape) => self.render_shape(svg, shape)?,
            }
        }

        svg.push_str("</g>");
        Ok(())
    }

    fn render_text(&self, svg: &mut String, text: &TextBox) -> ExportResult<()> {
        let (x, anchor) = match text.align {
            HAlign::Left => (self.px(text.rect.x), "start"),
            HAlign::Center => (self.px(text.rect.x + text.rect.w / 2.0), "middle"),
        };
        let (y, baseline) = match text.valign {
            VAlign::Top => (self.px(text.rect.y), "hanging"),
            VAlign::Middle => (self.px(text.rect.y + text.rect.h / 2.0), "middle"),
        };
        write!(
            svg,
            "<text x=\"{x}\" y=\"{y}\" text-anchor=\"{anchor}\" dominant-baseline=\"{baseline}\">"
        )?;
        for run in &text.runs {
            let size = f64::from(run.font_size) * self.pixels_per_unit / POINTS_PER_UNIT;
            let weight = if run.bold { "bold" } else { "normal" };
            write!(
                svg,
                "<tspan font-family=\"{}\" font-size=\"{size:.1}\" font-weight=\"{weight}\" fill=\"#{}\">{}</tspan>",
                escape_xml(&run.font_face),
                escape_xml(&run.color),
                escape_xml(&run.text)
            )?;
        }
        svg.push_str("</text>");
        Ok(())
    }

    fn render_image(&self, svg: &mut String, image: &ImageBox) -> ExportResult<()> {
        let aspect = match image.sizing {
            ImageSizing::Cover => "xMidYMid slice",
            ImageSizing::Contain => "xMidYMid meet",
        };
        write!(
            svg,
            "<image x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" preserveAspectRatio=\"{aspect}\" href=\"{}\"/>",
            self.px(image.rect.x),
            self.px(image.rect.y),
            self.px(image.rect.w),
            self.px(image.rect.h),
            escape_xml(&image.src)
        )?;
        Ok(())
    }

    fn render_shape(&self, svg: &mut String, shape: &ShapeBox) -> ExportResult<()> {
        let radius = self.px(shape.corner_radius.min(shape.rect.w.min(shape.rect.h) / 2.0));
        write!(
            svg,
            "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"{radius}\" fill=\"#{}\"/>",
            self.px(shape.rect.x),
            self.px(shape.rect.y),
            self.px(shape.rect.w),
            self.px(shape.rect.h),
            escape_xml(&shape.fill)
        )?;
        Ok(())
    }
}

/// Escape special XML characters.
#[must_use]
pub fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentBuilder, TextRun};
    use deck_core::DocRect;

    fn deck_with_pages(n: u32) -> Deck {
        let mut deck = Deck::new("Demo", 10.0, 5.0);
        for number in 1..=n {
            deck.begin_page(number, Some("1F2937".to_string()));
            deck.add_text(TextBox {
                rect: DocRect::new(1.0, 1.0, 8.0, 1.0),
                runs: vec![TextRun {
                    text: format!("Slide <{number}>"),
                    font_face: "Inter".to_string(),
                    font_size: 36,
                    color: "FFFFFF".to_string(),
                    bold: true,
                }],
                align: HAlign::Center,
                valign: VAlign::Middle,
            });
        }
        deck
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a<b>&\"c'"), "a&lt;b&gt;&amp;&quot;c&apos;");
    }

    #[test]
    fn test_pages_are_stacked() {
        let svg = SvgWriter::new(100.0).render(&deck_with_pages(2)).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("height=\"1025\""));
        assert!(svg.contains("<g id=\"slide-1\" transform=\"translate(0,0)\">"));
        assert!(svg.contains("<g id=\"slide-2\" transform=\"translate(0,525)\">"));
        assert!(svg.contains("fill=\"#1F2937\""));
    }

    #[test]
    fn test_text_is_centered_and_escaped() {
        let svg = SvgWriter::new(72.0).render(&deck_with_pages(1)).unwrap();
        assert!(svg.contains("x=\"360\" y=\"108\" text-anchor=\"middle\""));
        assert!(svg.contains("font-size=\"36.0\""));
        assert!(svg.contains("Slide &lt;1&gt;"));
    }

    #[test]
    fn test_image_and_shape() {
        let mut deck = Deck::new("Demo", 10.0, 5.0);
        deck.begin_page(1, None);
        deck.add_image(ImageBox {
            rect: DocRect::new(0.0, 0.0, 5.0, 5.0),
            src: "https://img.example/a.png?x=1&y=2".to_string(),
            sizing: ImageSizing::Cover,
            aspect: 1.0,
        });
        deck.add_shape(ShapeBox {
            rect: DocRect::new(1.0, 1.0, 0.5, 0.5),
            fill: "2563EB".to_string(),
            corner_radius: 1.0,
        });
        let svg = SvgWriter::new(10.0).render(&deck).unwrap();
        assert!(svg.contains("preserveAspectRatio=\"xMidYMid slice\""));
        assert!(svg.contains("a.png?x=1&amp;y=2"));
        assert!(svg.contains("rx=\"2.5\""));
        assert!(svg.contains("fill=\"#FFFFFF\""));
    }
}
