//! # Saorsa Deck Export
//!
//! Turns measured slide layouts into documents. Normalized region
//! rectangles are mapped onto a 16:9 page in document units, text is sized
//! from the deck's global content scale, and the resulting [`Deck`] is
//! written as PPTX, an SVG preview, or JSON.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    deck-export                      │
//! ├─────────────────────────────────────────────────────┤
//! │  Slides + measured layouts + global scale           │
//! │           │                                         │
//! │           ▼                                         │
//! │  DeckExporter::build ──► Deck (pages, primitives)   │
//! │           │                                         │
//! │           ▼                                         │
//! │  PptxWriter  │  SvgWriter  │  serde_json            │
//! └─────────────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod color;
pub mod document;
pub mod error;
pub mod export;
pub mod fonts;
pub mod pptx;
pub mod svg;

pub use document::{
    Deck, DocumentBuilder, HAlign, ImageBox, ImageSizing, Page, Primitive, ShapeBox, TextBox,
    TextRun, VAlign,
};
pub use error::{ExportError, ExportResult};
pub use export::{DeckExporter, ExportConfig, ExportFormat, DEFAULT_IMAGE_ASPECT};
pub use fonts::{DensityMode, FontSizes, TextRole};
pub use pptx::PptxWriter;
pub use svg::SvgWriter;

/// Deck export version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
