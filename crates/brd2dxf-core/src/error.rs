//! Error types for board extraction.
//!
//! All errors raised while reading a board file are fatal: the conversion
//! is a one-shot batch transformation and no partial output is written.

use thiserror::Error;

/// Errors raised while extracting the board model from a `.brd` document.
#[derive(Debug, Error)]
pub enum BoardError {
    /// The document is not well-formed XML.
    #[error("XML parse error: {0}")]
    XmlParse(#[from] roxmltree::Error),

    /// The document does not have the expected EAGLE board structure.
    #[error("Invalid board structure: {0}")]
    InvalidStructure(String),

    /// A required element is missing.
    #[error("Missing required element: {0}")]
    MissingElement(&'static str),

    /// A required attribute is missing.
    #[error("Missing required attribute '{attr}' on element '{element}'")]
    MissingAttribute {
        /// The element the attribute was expected on.
        element: &'static str,
        /// The missing attribute name.
        attr: &'static str,
    },

    /// A numeric attribute could not be parsed.
    #[error("Invalid numeric value '{value}' for attribute '{attr}' on element '{element}'")]
    InvalidNumber {
        /// The element carrying the attribute.
        element: &'static str,
        /// The attribute name.
        attr: &'static str,
        /// The raw attribute value.
        value: String,
    },

    /// A rotation string could not be parsed.
    #[error("Invalid rotation value '{0}'")]
    InvalidRotation(String),
}

/// Result type alias for board extraction.
pub type Result<T> = std::result::Result<T, BoardError>;
