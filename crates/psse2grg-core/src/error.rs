//! Error types shared by every translation stage.
//!
//! Structural problems abort a translation and surface as a [`GrgError`].
//! Data-quality problems do not: they are collected as warnings in
//! [`crate::diagnostics::Diagnostics`] and the pass continues.
//!
//! # Example
//!
//! ```ignore
//! use psse2grg_core::{GrgError, GrgResult};
//!
//! fn check_header(ic: i64) -> GrgResult<()> {
//!     if ic != 0 {
//!         return Err(GrgError::MalformedHeader(format!("change data (ic={ic})")));
//!     }
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Unified error type for all translation operations.
#[derive(Error, Debug)]
pub enum GrgError {
    /// I/O errors (file access)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A RAW record could not be read
    #[error("Parse error: {0}")]
    Parse(String),

    /// The RAW case identification record is unusable
    #[error("Malformed case header: {0}")]
    MalformedHeader(String),

    /// A RAW section that cannot be translated carried data
    #[error("Unsupported section '{section}' has data at line {line}")]
    UnsupportedSection { section: &'static str, line: usize },

    /// Some elements of a collection carry a source id and some do not
    #[error("Inconsistent identity in {collection}: {tagged} of {total} elements carry a source id")]
    InconsistentIdentity {
        collection: String,
        tagged: usize,
        total: usize,
    },

    /// A record names a bus that is not in the bus table
    #[error("Unknown bus {bus} referenced by {component}")]
    UnknownBus { bus: i64, component: String },

    /// Substation clustering produced a partition that splits a transformer
    #[error("Topology invariant violated: {0}")]
    TopologyInvariant(String),

    /// A tap position does not select any tap changer step
    #[error("Tap setting error: {0}")]
    TapSetting(String),

    /// A component kind or parameter combination with no translation
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// A hierarchical document failed structural validation
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// A named mapping selector does not exist in the document
    #[error("Missing mapping '{0}'")]
    MissingMapping(String),

    /// Input file type could not be determined
    #[error("Unrecognized input format: {0}")]
    UnrecognizedFormat(String),

    /// JSON (de)serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience type alias for Results using GrgError.
pub type GrgResult<T> = Result<T, GrgError>;

impl GrgError {
    /// Shorthand for a [`GrgError::Parse`] pinned to a RAW line number.
    pub fn parse_at(line: usize, message: impl std::fmt::Display) -> Self {
        GrgError::Parse(format!("line {line}: {message}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GrgError::UnsupportedSection {
            section: "FACTS device",
            line: 42,
        };
        assert!(err.to_string().contains("FACTS device"));
        assert!(err.to_string().contains("42"));
    }

    #[test]
    fn test_inconsistent_identity_display() {
        let err = GrgError::InconsistentIdentity {
            collection: "load".into(),
            tagged: 2,
            total: 3,
        };
        assert_eq!(
            err.to_string(),
            "Inconsistent identity in load: 2 of 3 elements carry a source id"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: GrgError = io_err.into();
        assert!(matches!(err, GrgError::Io(_)));
    }

    #[test]
    fn test_question_mark_operator() {
        fn inner() -> GrgResult<()> {
            Err(GrgError::TopologyInvariant("split".into()))
        }

        fn outer() -> GrgResult<()> {
            inner()?;
            Ok(())
        }

        assert!(outer().is_err());
    }
}
