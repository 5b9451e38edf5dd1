//! Error types shared across the engine
//!
//! Scene text that cannot be parsed surfaces as a [`SceneError`] carrying the
//! byte offset of the failure. Resource failures are [`ResourceError`]s, but they
//! never leave the resource cache: the cache logs them and hands out a null handle.

use thiserror::Error;

/// Failure while reading or writing a scene description
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("unexpected end of input at byte {offset}")]
    UnexpectedEof { offset: usize },

    #[error("expected '{expected}' at byte {offset}, found '{found}'")]
    Expected {
        expected: char,
        found: char,
        offset: usize,
    },

    #[error("invalid number '{text}' at byte {offset}")]
    InvalidNumber { text: String, offset: usize },

    #[error("unknown node keyword '{keyword}' at byte {offset}")]
    UnknownKeyword { keyword: String, offset: usize },

    #[error("invalid unit '{found}' at byte {offset}, expected one of p % w h")]
    InvalidUnit { found: char, offset: usize },

    #[error("invalid alignment '{found}' at byte {offset}")]
    InvalidAlignment { found: char, offset: usize },

    #[error("invalid overflow mode '{found}' at byte {offset}, expected s, v or n")]
    InvalidOverflow { found: char, offset: usize },

    #[error("invalid colour literal '{text}' at byte {offset}")]
    InvalidColor { text: String, offset: usize },

    #[error("scene file I/O failed")]
    Io(#[from] std::io::Error),
}

impl SceneError {
    /// Byte offset into the source text, when the error came from parsing
    pub fn offset(&self) -> Option<usize> {
        match self {
            SceneError::UnexpectedEof { offset }
            | SceneError::Expected { offset, .. }
            | SceneError::InvalidNumber { offset, .. }
            | SceneError::UnknownKeyword { offset, .. }
            | SceneError::InvalidUnit { offset, .. }
            | SceneError::InvalidAlignment { offset, .. }
            | SceneError::InvalidOverflow { offset, .. }
            | SceneError::InvalidColor { offset, .. } => Some(*offset),
            SceneError::Io(_) => None,
        }
    }
}

/// Failure while opening or decoding a texture, model or font
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("failed to read '{path}'")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image '{path}'")]
    Image {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to load model '{path}'")]
    Model {
        path: String,
        #[source]
        source: tobj::LoadError,
    },

    #[error("failed to parse font '{path}': {reason}")]
    Font { path: String, reason: String },

    #[error("resource '{path}' is empty")]
    Empty { path: String },
}

/// Failure of a structural tree edit
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("node is not part of this tree")]
    UnknownNode,

    #[error("attaching the node would make it its own ancestor")]
    WouldCycle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_errors_report_offset() {
        let err = SceneError::Expected {
            expected: ')',
            found: ',',
            offset: 12,
        };
        assert_eq!(err.offset(), Some(12));
        assert_eq!(err.to_string(), "expected ')' at byte 12, found ','");
    }

    #[test]
    fn test_io_error_has_no_offset() {
        let err: SceneError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(err.offset().is_none());
    }
}
