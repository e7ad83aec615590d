//! Error types for theme resolution.
//!
//! Resolution itself is permissive: unknown categories fall back to the
//! generic merger and bad logarithm bases are sanitized with a flag instead of
//! failing. [`ThemeError`] covers what is left: structural problems in the
//! supplied options, palette construction, document loading, and use of a
//! manager after [`dispose`](crate::ThemeManager::dispose).

use std::path::PathBuf;

use thiserror::Error;

/// Error type for all fallible theme operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ThemeError {
    /// The manager (or the manager behind a colour handle) was disposed.
    #[error("theme manager disposed")]
    Disposed,

    /// A colour was requested before a palette was created.
    #[error("palette has not been initialized")]
    PaletteNotInitialized,

    /// The `palette` option names no built-in palette.
    #[error("unknown palette '{0}'")]
    UnknownPalette(String),

    /// A palette entry could not be parsed as a colour.
    #[error("invalid color '{value}': {reason}")]
    InvalidColor {
        /// The offending value, as written.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// An option value has the wrong shape for its category.
    #[error("malformed '{category}' options: expected {expected}")]
    MalformedOptions {
        /// Category (or option) name.
        category: String,
        /// Description of the expected shape.
        expected: &'static str,
    },

    /// A theme or options document could not be read.
    #[error("failed to load {}: {message}", .path.display())]
    Load {
        /// Path of the document.
        path: PathBuf,
        /// Underlying I/O message.
        message: String,
    },

    /// A theme or options document could not be parsed.
    #[error("failed to parse {}: {message}", display_path(.path))]
    Parse {
        /// Path of the document, when it came from disk.
        path: Option<PathBuf>,
        /// Parser message.
        message: String,
    },
}

fn display_path(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => path.display().to_string(),
        None => "<inline>".to_string(),
    }
}

impl ThemeError {
    pub(crate) fn malformed(category: impl Into<String>, expected: &'static str) -> Self {
        ThemeError::MalformedOptions {
            category: category.into(),
            expected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disposed_display() {
        assert_eq!(ThemeError::Disposed.to_string(), "theme manager disposed");
    }

    #[test]
    fn test_malformed_display() {
        let err = ThemeError::malformed("series", "an object");
        assert!(err.to_string().contains("'series'"));
        assert!(err.to_string().contains("an object"));
    }

    #[test]
    fn test_parse_display_without_path() {
        let err = ThemeError::Parse {
            path: None,
            message: "unexpected end".into(),
        };
        assert_eq!(err.to_string(), "failed to parse <inline>: unexpected end");
    }

    #[test]
    fn test_load_display_has_path() {
        let err = ThemeError::Load {
            path: PathBuf::from("/themes/light.yaml"),
            message: "not found".into(),
        };
        assert!(err.to_string().contains("/themes/light.yaml"));
    }
}
