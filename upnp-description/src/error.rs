//! Error types for description parsing

use thiserror::Error;

use crate::ordered_map::DuplicateKeyError;

/// Errors that can occur while parsing a description document
#[derive(Error, Debug)]
pub enum DescriptionError {
    /// The document does not have the element structure a description expects
    #[error("Invalid description structure: expected {expected}, found {found}")]
    Structure { expected: String, found: String },

    /// The underlying XML is malformed
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// A key was inserted twice into an ordered container
    #[error(transparent)]
    DuplicateKey(#[from] DuplicateKeyError),

    /// A URL in the document (or the document URL itself) could not be resolved
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl DescriptionError {
    pub(crate) fn structure(expected: impl Into<String>, found: impl Into<String>) -> Self {
        DescriptionError::Structure {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// True for errors caused by the shape of the document rather than its syntax
    pub fn is_structure_error(&self) -> bool {
        matches!(self, DescriptionError::Structure { .. })
    }
}

/// Result type alias for description operations
pub type Result<T> = std::result::Result<T, DescriptionError>;
