//! Diagnostics produced while indexing a file.
//!
//! Parse errors and malformed declarations are reported here instead of
//! aborting the file: the rest of the file is still indexed.

use std::sync::Arc;

use crate::base::{FileId, LineCol, LineIndex, TextRange};
use crate::parser::SyntaxError;
use crate::psi::StructuralError;

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
}

/// A diagnostic message with location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    /// The file containing this diagnostic.
    pub file: FileId,
    /// Byte range in the file.
    pub range: TextRange,
    /// Start of `range` as line and column (0-indexed).
    pub start: LineCol,
    /// Severity level.
    pub severity: Severity,
    /// Error code (e.g., "E0201").
    pub code: Option<Arc<str>>,
    /// The diagnostic message.
    pub message: Arc<str>,
}

impl Diagnostic {
    pub fn new(
        file: FileId,
        range: TextRange,
        line_index: &LineIndex,
        severity: Severity,
        message: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            file,
            range,
            start: line_index.line_col(range.start()),
            severity,
            code: None,
            message: message.into(),
        }
    }

    /// Set the error code.
    pub fn with_code(mut self, code: impl Into<Arc<str>>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn from_syntax_error(file: FileId, error: &SyntaxError, line_index: &LineIndex) -> Self {
        Self::new(file, error.range, line_index, Severity::Error, error.message.as_str())
            .with_code(error.code.as_str())
    }

    /// A declaration whose stub could not be built; only that declaration is lost.
    pub fn from_structural_error(
        file: FileId,
        error: &StructuralError,
        line_index: &LineIndex,
    ) -> Self {
        Self::new(file, error.range, line_index, Severity::Warning, error.to_string())
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}
