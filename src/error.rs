//! Error types for the analyzer.
//!
//! There is a single semantic error kind: every phase, from weeding to type
//! checking, reports violations as a [`SemanticError`] with a human-readable
//! message and, where available, a source position. The driver wraps it in
//! [`AnalyzeError`] together with I/O and syntax failures and maps the result
//! onto process exit codes.

use crate::types::Span;
use std::path::PathBuf;
use thiserror::Error;

/// A static rule violation. Analysis aborts on the first one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}{}", .span.map(|s| format!(" (line {})", s.line)).unwrap_or_default())]
pub struct SemanticError {
    pub message: String,
    pub span: Option<Span>,
}

impl SemanticError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            span: None,
        }
    }

    pub fn at(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span: Some(span),
        }
    }
}

/// Top-level analyzer failure.
#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error("Failed to read file '{}': {source}", path.display())]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Syntax error in '{}' at line {line}", path.display())]
    Syntax { path: PathBuf, line: u32 },

    #[error("Failed to initialize parser: {0}")]
    ParserInit(String),

    #[error(transparent)]
    Semantic(#[from] SemanticError),
}

impl AnalyzeError {
    /// Exit code contract: rejected programs exit 42, internal failures 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Semantic(_) | Self::Syntax { .. } => 42,
            _ => 1,
        }
    }
}

/// Result of a semantic phase.
pub type SemanticResult<T> = Result<T, SemanticError>;

/// Result of a whole-analysis operation.
pub type AnalyzeResult<T> = Result<T, AnalyzeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semantic_error_formats_span() {
        let plain = SemanticError::new("Cyclic dependency found");
        assert_eq!(plain.to_string(), "Cyclic dependency found");

        let at = SemanticError::at("Integer number too large", Span::new(7, 13));
        assert_eq!(at.to_string(), "Integer number too large (line 7)");
    }

    #[test]
    fn exit_codes() {
        let semantic: AnalyzeError = SemanticError::new("nope").into();
        assert_eq!(semantic.exit_code(), 42);

        let syntax = AnalyzeError::Syntax {
            path: PathBuf::from("A.java"),
            line: 3,
        };
        assert_eq!(syntax.exit_code(), 42);

        let io = AnalyzeError::FileRead {
            path: PathBuf::from("A.java"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(io.exit_code(), 1);
    }
}
