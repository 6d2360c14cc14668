//! Error types for selector parsing.

/// Result type alias for selector operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while parsing a selector.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The selector text is not valid selector syntax.
    #[error("Invalid selector '{selector}' at line {line}, column {column}: {message}")]
    Parse {
        selector: String,
        message: String,
        line: u32,
        column: u32,
    },

    /// The selector text contained no selector at all.
    #[error("Empty selector")]
    Empty,

    /// The pseudo-class is syntactically valid but not supported.
    #[error("Unsupported pseudo-class ':{0}'")]
    UnsupportedPseudoClass(String),
}

impl Error {
    /// Create a parse error.
    pub fn parse(
        selector: impl Into<String>,
        message: impl Into<String>,
        line: u32,
        column: u32,
    ) -> Self {
        Self::Parse {
            selector: selector.into(),
            message: message.into(),
            line,
            column,
        }
    }
}
