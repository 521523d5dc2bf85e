//! Deck export orchestration.
//!
//! Combines slides, theme, measured layouts and the global content scale
//! into a [`Deck`], then hands it to a format writer.

use std::fmt;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use deck_core::content::{parse_content, ContentItem};
use deck_core::coords::normalize_layout;
use deck_core::{DocRect, DocumentCanvas, MeasuredLayout, RegionKey, Slide, Theme};

use crate::color::{hex_or, to_hex, FALLBACK_HEX};
use crate::document::{
    Deck, DocumentBuilder, HAlign, ImageBox, ImageSizing, ShapeBox, TextBox, TextRun, VAlign,
};
use crate::error::{ExportError, ExportResult};
use crate::fonts::{bullet_size, density_factor, slide_density, DensityMode, FontSizes, TextRole};
use crate::pptx::PptxWriter;
use crate::svg::SvgWriter;

/// Width of the bullet glyph column in document units.
const BULLET_WIDTH: f64 = 0.25;

/// Images larger than this (square units) and wider than [`COVER_ASPECT`]
/// are cropped to fill their box.
const COVER_AREA: f64 = 15.0;
const COVER_ASPECT: f64 = 1.5;

/// Generated slide images are square.
pub const DEFAULT_IMAGE_ASPECT: f64 = 1.0;

/// Export output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// PowerPoint package.
    Pptx,
    /// SVG preview of every page.
    Svg,
    /// The document model as JSON.
    Json,
}

impl ExportFormat {
    /// File extension without the dot.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Pptx => "pptx",
            Self::Svg => "svg",
            Self::Json => "json",
        }
    }

    /// Format implied by a path's extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pptx" => Ok(Self::Pptx),
            "svg" => Ok(Self::Svg),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown export format: {other}")),
        }
    }
}

/// Configuration for deck export.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Output page dimensions.
    pub canvas: DocumentCanvas,
    /// Base font sizes.
    pub font_sizes: FontSizes,
    /// When the character-density factor is applied.
    pub density_mode: DensityMode,
    /// SVG preview resolution.
    pub svg_pixels_per_unit: f64,
    /// Presentation title; defaults to the first slide's title.
    pub title: Option<String>,
    /// Width over height assumed for slide images, which are generated
    /// square unless the host knows better.
    pub image_aspect: f64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            canvas: DocumentCanvas::default(),
            font_sizes: FontSizes::default(),
            density_mode: DensityMode::default(),
            svg_pixels_per_unit: 128.0,
            title: None,
            image_aspect: DEFAULT_IMAGE_ASPECT,
        }
    }
}

/// Resolved theme values for one export.
struct Palette {
    background: Option<String>,
    primary: String,
    text: String,
    marker_label: String,
    heading_font: String,
    body_font: String,
}

impl Palette {
    fn from_theme(theme: &Theme) -> Self {
        let background = to_hex(theme.background_color());
        Self {
            marker_label: background.clone().unwrap_or_else(|| "FFFFFF".to_string()),
            background,
            primary: hex_or(theme.primary_color(), FALLBACK_HEX),
            text: hex_or(theme.text_color(), FALLBACK_HEX),
            heading_font: theme.heading_font().to_string(),
            body_font: theme.body_font().to_string(),
        }
    }
}

/// Exports measured slides to documents.
pub struct DeckExporter {
    config: ExportConfig,
}

impl DeckExporter {
    /// Create a new exporter with the given configuration.
    #[must_use]
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    /// Create an exporter with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(ExportConfig::default())
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Build the document model.
    ///
    /// `measured_layouts[i]` is the measured layout of `slides[i]`; slides
    /// without a usable layout are skipped. `global_scale` is the deck-wide
    /// content scale, `None` when nothing was measured.
    #[must_use]
    pub fn build(
        &self,
        slides: &[Slide],
        theme: &Theme,
        measured_layouts: &[Option<MeasuredLayout>],
        global_scale: Option<f64>,
    ) -> Deck {
        let title = self
            .config
            .title
            .clone()
            .or_else(|| slides.first().map(|s| s.title.clone()))
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| "Presentation".to_string());
        let mut deck = Deck::new(title, self.config.canvas.width, self.config.canvas.height);
        self.build_into(&mut deck, slides, theme, measured_layouts, global_scale);
        deck
    }

    /// Emit every exportable slide into `builder`, returning the page count.
    pub fn build_into<B>(
        &self,
        builder: &mut B,
        slides: &[Slide],
        theme: &Theme,
        measured_layouts: &[Option<MeasuredLayout>],
        global_scale: Option<f64>,
    ) -> usize
    where
        B: DocumentBuilder + ?Sized,
    {
        let layouts: Vec<Option<MeasuredLayout>> = (0..slides.len())
            .map(|index| {
                measured_layouts
                    .get(index)
                    .and_then(Option::as_ref)
                    .and_then(normalize_layout)
            })
            .collect();

        let sizes = self.font_sizes(slides, &layouts, global_scale);
        let scale = global_scale
            .filter(|s| s.is_finite() && *s > 0.0)
            .unwrap_or(1.0);
        let palette = Palette::from_theme(theme);

        let mut pages = 0;
        for (index, (slide, layout)) in slides.iter().zip(&layouts).enumerate() {
            let Some(layout) = layout else {
                tracing::warn!(
                    "Skipping slide {} - missing or invalid layout measurements",
                    index + 1
                );
                continue;
            };
            let number = if slide.slide_number > 0 {
                slide.slide_number
            } else {
                u32::try_from(index + 1).unwrap_or(u32::MAX)
            };
            let page = PageContext {
                canvas: &self.config.canvas,
                palette: &palette,
                sizes: &sizes,
                scale,
                image_aspect: self.config.image_aspect,
            };
            builder.begin_page(number, palette.background.clone());
            page.emit(builder, slide, layout);
            pages += 1;
        }

        tracing::info!("Built {} of {} slides at scale {:.3}", pages, slides.len(), scale);
        pages
    }

    fn font_sizes(
        &self,
        slides: &[Slide],
        layouts: &[Option<MeasuredLayout>],
        global_scale: Option<f64>,
    ) -> FontSizes {
        let base = self.config.font_sizes;
        if !self.config.density_mode.applies(global_scale) {
            return base;
        }
        let factor = density_factor(
            slides
                .iter()
                .zip(layouts)
                .filter_map(|(slide, layout)| slide_density(slide, layout.as_ref()?)),
        );
        tracing::debug!("Content density factor {:.2}", factor);
        base.with_density_factor(factor)
    }

    /// Encode a deck in `format`.
    ///
    /// # Errors
    ///
    /// Returns an error if the deck has no pages or encoding fails.
    pub fn render(&self, deck: &Deck, format: ExportFormat) -> ExportResult<Vec<u8>> {
        if deck.pages.is_empty() {
            return Err(ExportError::Empty(
                "no slide had a usable layout".to_string(),
            ));
        }
        match format {
            ExportFormat::Pptx => {
                let mut buf = Cursor::new(Vec::new());
                PptxWriter::new(&mut buf).write(deck)?;
                Ok(buf.into_inner())
            }
            ExportFormat::Svg => {
                let svg = SvgWriter::new(self.config.svg_pixels_per_unit).render(deck)?;
                Ok(svg.into_bytes())
            }
            ExportFormat::Json => Ok(serde_json::to_vec_pretty(deck)?),
        }
    }

    /// Encode a deck into `writer`.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or writing fails.
    pub fn export_to_writer<W>(&self, deck: &Deck, format: ExportFormat, writer: &mut W) -> ExportResult<()>
    where
        W: Write + ?Sized,
    {
        let bytes = self.render(deck, format)?;
        writer.write_all(&bytes)?;
        writer.flush()?;
        Ok(())
    }

    /// Encode a deck into a file, replacing it only once the output is
    /// complete.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails or the file cannot be written.
    pub fn export_to_path(&self, deck: &Deck, format: ExportFormat, path: &Path) -> ExportResult<PathBuf> {
        let bytes = self.render(deck, format)?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut file = tempfile::NamedTempFile::new_in(dir)?;
        file.write_all(&bytes)?;
        file.flush()?;
        file.persist(path)?;

        tracing::info!("Exported {} pages to {}", deck.pages.len(), path.display());
        Ok(path.to_path_buf())
    }
}

struct PageContext<'a> {
    canvas: &'a DocumentCanvas,
    palette: &'a Palette,
    sizes: &'a FontSizes,
    scale: f64,
    image_aspect: f64,
}

impl PageContext<'_> {
    fn doc(&self, layout: &MeasuredLayout, key: RegionKey) -> Option<DocRect> {
        layout.get(&key).and_then(|rect| self.canvas.to_document(rect))
    }

    fn emit<B>(&self, builder: &mut B, slide: &Slide, layout: &MeasuredLayout)
    where
        B: DocumentBuilder + ?Sized,
    {
        let title_like = slide.slide_type.is_title_like();

        if slide.has_title() {
            if let Some(rect) = self.doc(layout, RegionKey::Title) {
                let role = if title_like {
                    TextRole::TitleSlide
                } else {
                    TextRole::TitleNormal
                };
                builder.add_text(TextBox {
                    rect,
                    runs: vec![TextRun {
                        text: slide.title.clone(),
                        font_face: self.palette.heading_font.clone(),
                        font_size: self.sizes.scaled(role, self.scale),
                        color: self.palette.primary.clone(),
                        bold: true,
                    }],
                    align: if title_like { HAlign::Center } else { HAlign::Left },
                    valign: VAlign::Top,
                });
            }
        }

        if let Some(src) = slide.image_url.as_deref().filter(|_| slide.has_image()) {
            if let Some(rect) = self.doc(layout, RegionKey::Image) {
                builder.add_image(ImageBox {
                    rect,
                    src: src.to_string(),
                    sizing: image_sizing(&rect),
                    aspect: self.image_aspect,
                });
            }
        }

        let items = parse_content(slide.content.as_deref()).items;
        let timeline: Vec<usize> = layout
            .keys()
            .filter_map(|key| match key {
                RegionKey::ItemText(n) => Some(*n),
                _ => None,
            })
            .collect();

        if timeline.is_empty() {
            self.emit_blocks(builder, &items, layout);
        } else {
            self.emit_timeline(builder, &items, layout, &timeline);
        }
    }

    fn emit_blocks<B>(&self, builder: &mut B, items: &[ContentItem], layout: &MeasuredLayout)
    where
        B: DocumentBuilder + ?Sized,
    {
        let blocks: Vec<DocRect> = layout
            .iter()
            .filter(|(key, _)| key.is_content_block())
            .filter_map(|(_, rect)| self.canvas.to_document(rect))
            .collect();
        if blocks.is_empty() || items.is_empty() {
            return;
        }

        let per_block = items.len().div_ceil(blocks.len());
        let text_size = self.sizes.scaled(TextRole::ContentNormal, self.scale);
        for (block, chunk) in blocks.iter().zip(items.chunks(per_block)) {
            #[allow(clippy::cast_precision_loss)]
            let item_height = block.h / chunk.len() as f64;
            for (i, item) in chunk.iter().enumerate() {
                #[allow(clippy::cast_precision_loss)]
                let rect = DocRect::new(block.x, block.y + i as f64 * item_height, block.w, item_height);
                self.bulleted_text(builder, item, rect, text_size);
            }
        }
    }

    fn emit_timeline<B>(
        &self,
        builder: &mut B,
        items: &[ContentItem],
        layout: &MeasuredLayout,
        timeline: &[usize],
    ) where
        B: DocumentBuilder + ?Sized,
    {
        let text_size = self.sizes.scaled(TextRole::ContentTimeline, self.scale);
        for (i, (n, item)) in timeline.iter().zip(items).enumerate() {
            if let Some(marker) = self.doc(layout, RegionKey::Marker(*n)) {
                builder.add_shape(ShapeBox {
                    rect: marker,
                    fill: self.palette.primary.clone(),
                    corner_radius: marker.w.min(marker.h) / 2.0,
                });
                builder.add_text(TextBox {
                    rect: marker,
                    runs: vec![TextRun {
                        text: (i + 1).to_string(),
                        font_face: self.palette.body_font.clone(),
                        font_size: text_size,
                        color: self.palette.marker_label.clone(),
                        bold: true,
                    }],
                    align: HAlign::Center,
                    valign: VAlign::Middle,
                });
            }
            if let Some(rect) = self.doc(layout, RegionKey::ItemText(*n)) {
                self.bulleted_text(builder, item, rect, text_size);
            }
        }
    }

    fn bulleted_text<B>(&self, builder: &mut B, item: &ContentItem, rect: DocRect, text_size: u32)
    where
        B: DocumentBuilder + ?Sized,
    {
        let body_run = |text: String, color: &str, bold: bool| TextRun {
            text,
            font_face: self.palette.body_font.clone(),
            font_size: text_size,
            color: color.to_string(),
            bold,
        };

        let runs = if item.has_title && !item.description.is_empty() {
            vec![
                body_run(format!("{}: ", item.title), &self.palette.primary, true),
                body_run(item.description.clone(), &self.palette.text, false),
            ]
        } else {
            let text = item.display_text();
            if text.is_empty() {
                return;
            }
            let color = if item.has_title {
                &self.palette.primary
            } else {
                &self.palette.text
            };
            vec![body_run(text.to_string(), color, item.has_title)]
        };

        builder.add_text(TextBox {
            rect: DocRect::new(rect.x, rect.y, BULLET_WIDTH, rect.h),
            runs: vec![TextRun {
                text: "•".to_string(),
                font_face: self.palette.body_font.clone(),
                font_size: bullet_size(text_size),
                color: self.palette.primary.clone(),
                bold: true,
            }],
            align: HAlign::Left,
            valign: VAlign::Top,
        });
        builder.add_text(TextBox {
            rect: DocRect::new(
                rect.x + BULLET_WIDTH,
                rect.y,
                (rect.w - BULLET_WIDTH).max(0.0),
                rect.h,
            ),
            runs,
            align: HAlign::Left,
            valign: VAlign::Top,
        });
    }
}

/// Large, wide image boxes are filled; everything else fits inside.
fn image_sizing(rect: &DocRect) -> ImageSizing {
    if rect.area() > COVER_AREA && rect.aspect() > COVER_ASPECT {
        ImageSizing::Cover
    } else {
        ImageSizing::Contain
    }
}
