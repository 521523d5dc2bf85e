//! # Saorsa Deck Core
//!
//! Adaptive slide layout: decides how each slide's regions are arranged,
//! learns where a host actually rendered them, and works out how far
//! overflowing text has to shrink before the deck is exported.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                     deck-core                       │
//! ├─────────────────────────────────────────────────────┤
//! │  Content parser  ──►  Classifier  ──►  Templates    │
//! │  - bullet items       - density        - regions    │
//! │  - bold titles        - layout choice  - archetypes │
//! ├─────────────────────────────────────────────────────┤
//! │  Measurement      │  Scaling        │  Session      │
//! │  - RenderSurface  │  - fit factor   │  - readiness  │
//! │  - convergence    │  - global min   │  - timeout    │
//! ├─────────────────────────────────────────────────────┤
//! │  Editor canvas    │  Layout variants                │
//! │  - clamp / snap   │  - per-type coordinate tables   │
//! └─────────────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod classifier;
pub mod content;
pub mod coords;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod measure;
pub mod region;
pub mod scale;
pub mod session;
pub mod slide;
pub mod template;
pub mod variant;

pub use classifier::{classify, ContentDensity, LayoutChoice};
pub use content::{parse_content, text_length, ContentItem, ParsedContent};
pub use coords::{DocRect, DocumentCanvas};
pub use editor::{
    image_cover_fit, CanvasConfig, CanvasElement, EditorScene, ElementKind, ElementRole, SnapGuides,
};
pub use error::{DeckError, DeckResult};
pub use geometry::{NormRect, PixelRect, Size};
pub use measure::{
    ConvergencePolicy, FrameTicker, IntervalTicker, LayoutMeasurer, LayoutObserver,
    MeasureOutcome, MeasuredLayout, RenderSurface,
};
pub use region::RegionKey;
pub use scale::{AdaptiveScaler, BlockMetrics, ScaleProbe, MIN_SCALE};
pub use session::{LayoutSession, Readiness, SlidePlan, DEFAULT_SAFETY_TIMEOUT};
pub use slide::{RegionMap, Slide, SlideType, Theme};
pub use template::{template_for_slide, LayoutTemplate};
pub use variant::{assign_variant_layouts, RoundRobin, SeededRandom, SelectionStrategy};

/// Deck core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
