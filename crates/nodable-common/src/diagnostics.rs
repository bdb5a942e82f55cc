//! Diagnostics - structured, non-throwing error/warning reporting.
//!
//! Core entry points never panic or raise exceptions on bad input; they
//! return `false`/`None` and append structured `Diagnostic` values to a
//! `DiagnosticBag`. Hosts match on `code` rather than parsing message text.

use crate::span::Span;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DiagnosticCategory {
    Error,
    Warning,
    Message,
}

/// Stable numeric diagnostic codes, grouped by phase.
pub mod diagnostic_codes {
    pub const LEX_UNRECOGNIZED_BYTE: u32 = 1001;

    pub const SYNTAX_UNBALANCED_PARENS: u32 = 2001;
    pub const SYNTAX_TRAILING_OPERATOR: u32 = 2002;
    pub const SYNTAX_OPERATOR_FOLLOWED_BY_OPERATOR: u32 = 2003;
    pub const SYNTAX_EXPECTED_TOKEN: u32 = 2004;

    pub const PARSE_PRODUCTION_FAILED: u32 = 3001;

    pub const UNDECLARED_IDENTIFIER: u32 = 3101;

    pub const COMPILE_MISSING_SCOPE: u32 = 4001;
    pub const COMPILE_INVOKABLE_NOT_FOUND: u32 = 4002;
    pub const COMPILE_ARITY_MISMATCH: u32 = 4003;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub category: DiagnosticCategory,
    pub code: u32,
    pub span: Span,
    pub message: String,
}

impl Diagnostic {
    #[must_use]
    pub fn error(code: u32, span: Span, message: impl Into<String>) -> Self {
        Self { category: DiagnosticCategory::Error, code, span, message: message.into() }
    }

    #[must_use]
    pub fn warning(code: u32, span: Span, message: impl Into<String>) -> Self {
        Self { category: DiagnosticCategory::Warning, code, span, message: message.into() }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self.category {
            DiagnosticCategory::Error => "error",
            DiagnosticCategory::Warning => "warning",
            DiagnosticCategory::Message => "message",
        };
        write!(f, "{label}[N{}] at {}: {}", self.code, self.span, self.message)
    }
}

/// An ordered collection of diagnostics produced during one `lex`/`parse`/
/// `compile` call. Cleared at the start of each call.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticBag {
    entries: Vec<Diagnostic>,
}

impl DiagnosticBag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        if diagnostic.category == DiagnosticCategory::Warning {
            tracing::warn!(code = diagnostic.code, span = %diagnostic.span, "{}", diagnostic.message);
        } else {
            tracing::debug!(code = diagnostic.code, span = %diagnostic.span, "{}", diagnostic.message);
        }
        self.entries.push(diagnostic);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.entries.iter().any(|d| d.category == DiagnosticCategory::Error)
    }

    #[must_use]
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
