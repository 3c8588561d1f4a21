//! Template rendering errors.

use std::{fmt, path::PathBuf};

use thiserror::Error;

/// A location in template text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourcePos {
    /// Byte offset from the start of the text.
    pub offset: usize,
    /// 1-based line.
    pub line: usize,
    /// 1-based column, counted in characters.
    pub column: usize,
}

impl fmt::Display for SourcePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Template rendering errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// A template file could not be read.
    #[error("could not read template {path}: {message}")]
    FileRead { path: PathBuf, message: String },

    /// Malformed tag syntax or a missing required attribute.
    #[error("{file}:{pos}: {message}")]
    Syntax {
        file: String,
        pos: SourcePos,
        message: String,
    },

    /// A tag name with no registered processor.
    #[error("{file}:{pos}: unknown tag `{name}` (offset {})", .pos.offset)]
    UnknownTag {
        file: String,
        pos: SourcePos,
        name: String,
    },

    /// A named template or asset that does not exist.
    #[error("{file}:{pos}: unresolved {kind} `{name}`")]
    UnresolvedReference {
        file: String,
        pos: SourcePos,
        kind: String,
        name: String,
    },

    /// Nested renders went deeper than the limit.
    #[error("{file}: template nesting deeper than {limit} levels")]
    RecursionLimit { file: String, limit: usize },
}

/// Result type for template operations.
pub type Result<T> = std::result::Result<T, RenderError>;

impl RenderError {
    /// Create a syntax error.
    pub fn syntax(file: impl Into<String>, pos: SourcePos, message: impl Into<String>) -> Self {
        Self::Syntax {
            file: file.into(),
            pos,
            message: message.into(),
        }
    }

    /// File the error was raised in.
    pub fn file(&self) -> String {
        match self {
            Self::FileRead { path, .. } => path.display().to_string(),
            Self::Syntax { file, .. }
            | Self::UnknownTag { file, .. }
            | Self::UnresolvedReference { file, .. }
            | Self::RecursionLimit { file, .. } => file.clone(),
        }
    }

    /// Position in the file, where known.
    pub fn pos(&self) -> Option<SourcePos> {
        match self {
            Self::Syntax { pos, .. }
            | Self::UnknownTag { pos, .. }
            | Self::UnresolvedReference { pos, .. } => Some(*pos),
            Self::FileRead { .. } | Self::RecursionLimit { .. } => None,
        }
    }
}
