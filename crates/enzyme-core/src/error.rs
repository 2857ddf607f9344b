//! Unified Error Model
use std::fmt;
use thiserror::Error;

/// Which side of the binary exchange with the driver program was violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Bytes handed to the child's standard input.
    Input,
    /// Bytes collected from the child's standard output.
    Output,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Input => write!(f, "stdin"),
            Self::Output => write!(f, "stdout"),
        }
    }
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("SHAPE/{0}")]
    ShapeMismatch(String),

    #[error("CODEGEN/{0}")]
    CodeGen(String),

    #[error("TEMPLATE/{0}")]
    Template(String),

    #[error("BUILD/{message}\n{diagnostics}")]
    Build { message: String, diagnostics: String },

    #[error("EXEC/{reason}\n{diagnostics}")]
    Execution { reason: String, diagnostics: String },

    #[error("PROTOCOL/{direction}: expected {expected} bytes, got {actual}")]
    Protocol {
        direction: Direction,
        expected: usize,
        actual: usize,
    },

    #[error("CONFIG/{0}")]
    Config(String),

    #[error("IO/{0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub fn shape(msg: impl Into<String>) -> Self {
        Self::ShapeMismatch(msg.into())
    }

    pub fn codegen(msg: impl Into<String>) -> Self {
        Self::CodeGen(msg.into())
    }

    pub fn execution(reason: impl Into<String>, diagnostics: impl Into<String>) -> Self {
        Self::Execution {
            reason: reason.into(),
            diagnostics: diagnostics.into(),
        }
    }

    /// Short category tag, matching the message prefix.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ShapeMismatch(_) => "SHAPE",
            Self::CodeGen(_) => "CODEGEN",
            Self::Template(_) => "TEMPLATE",
            Self::Build { .. } => "BUILD",
            Self::Execution { .. } => "EXEC",
            Self::Protocol { .. } => "PROTOCOL",
            Self::Config(_) => "CONFIG",
            Self::Io(_) => "IO",
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_category_prefix() {
        let err = EngineError::shape("trailing size 3, expected 4");
        assert_eq!(err.to_string(), "SHAPE/trailing size 3, expected 4");
        assert_eq!(err.kind(), "SHAPE");

        let err = EngineError::Protocol {
            direction: Direction::Output,
            expected: 16,
            actual: 12,
        };
        assert_eq!(err.to_string(), "PROTOCOL/stdout: expected 16 bytes, got 12");
    }

    #[test]
    fn build_error_includes_diagnostics() {
        let err = EngineError::Build {
            message: "cc exited with status 1".to_string(),
            diagnostics: "main.c:3: error: expected ';'".to_string(),
        };
        let text = err.to_string();
        assert!(text.starts_with("BUILD/cc exited"));
        assert!(text.contains("expected ';'"));
    }
}
