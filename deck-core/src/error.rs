//! Error types for slide layout operations.

use thiserror::Error;

/// Result type for slide layout operations.
pub type DeckResult<T> = Result<T, DeckError>;

/// Errors that can occur in slide layout operations.
///
/// Classification and template generation never fail; they fall back to the
/// standard text archetype. Errors surface only at the edges: parsing region
/// keys from untrusted input, editor operations on unknown elements, and
/// (de)serialization.
#[derive(Debug, Error)]
pub enum DeckError {
    /// A region key string is not part of the region vocabulary.
    #[error("Invalid region key: {0}")]
    InvalidRegionKey(String),

    /// Element not found in the editor scene.
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// Invalid editor operation.
    #[error("Invalid operation on element: {0}")]
    InvalidOperation(String),

    /// Slide index outside the session's deck.
    #[error("Slide index {index} out of range (deck has {len} slides)")]
    SlideOutOfRange {
        /// Requested slide index.
        index: usize,
        /// Number of slides in the deck.
        len: usize,
    },

    /// Slide or layout serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
