//! A single token: a kind tag plus three contiguous byte ranges (prefix,
//! body, suffix) inside a shared source buffer.

use std::sync::Arc;

use nodable_common::Span;

use crate::kind::TokenKind;

/// A token produced by the lexer.
///
/// Invariant: `prefix`, `body` and `suffix` are contiguous, non-overlapping
/// ranges inside `buffer` (`prefix.end == body.start` and
/// `body.end == suffix.start`), so that concatenating
/// `prefix ++ body ++ suffix` for every token in ribbon order — plus the
/// ribbon's global prefix/suffix — reproduces the source exactly.
#[derive(Clone, Debug)]
pub struct Token {
    kind: TokenKind,
    buffer: Arc<str>,
    prefix: Span,
    body: Span,
    suffix: Span,
    /// Index within the owning ribbon; `u32::MAX` for detached/null tokens.
    index: u32,
}

impl Token {
    #[must_use]
    pub fn new(kind: TokenKind, buffer: Arc<str>, prefix: Span, body: Span, suffix: Span, index: u32) -> Self {
        debug_assert_eq!(prefix.end, body.start, "prefix/body must be contiguous");
        debug_assert_eq!(body.end, suffix.start, "body/suffix must be contiguous");
        Self { kind, buffer, prefix, body, suffix, index }
    }

    /// A synthetic token carrying no bytes, used where the grammar allows
    /// an optional construct that wasn't present in the source (e.g. a
    /// `for` loop's omitted clauses).
    #[must_use]
    pub fn none(buffer: Arc<str>, pos: u32) -> Self {
        let empty = Span::at(pos);
        Self { kind: TokenKind::None, buffer, prefix: empty, body: empty, suffix: empty, index: u32::MAX }
    }

    #[must_use]
    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    #[must_use]
    pub fn index(&self) -> u32 {
        self.index
    }

    #[must_use]
    pub fn is_none(&self) -> bool {
        self.kind == TokenKind::None
    }

    #[must_use]
    pub fn prefix(&self) -> Span {
        self.prefix
    }

    #[must_use]
    pub fn body(&self) -> Span {
        self.body
    }

    #[must_use]
    pub fn suffix(&self) -> Span {
        self.suffix
    }

    /// The lexeme text (without prefix/suffix).
    #[must_use]
    pub fn lexeme(&self) -> &str {
        self.body.slice(&self.buffer)
    }

    #[must_use]
    pub fn prefix_text(&self) -> &str {
        self.prefix.slice(&self.buffer)
    }

    #[must_use]
    pub fn suffix_text(&self) -> &str {
        self.suffix.slice(&self.buffer)
    }

    /// Appends `bytes` (taken from the same buffer) to this token's suffix.
    /// Used by the lexer's ignored-token attachment policy.
    pub fn extend_suffix_to(&mut self, new_end: u32) {
        self.suffix = Span::new(self.suffix.start, new_end);
    }

    /// Extends this token's prefix backwards to `new_start`.
    pub fn extend_prefix_from(&mut self, new_start: u32) {
        self.prefix = Span::new(new_start, self.prefix.end);
    }

    /// Serializes this token verbatim: prefix, body, suffix.
    #[must_use]
    pub fn full_text(&self) -> String {
        format!("{}{}{}", self.prefix_text(), self.lexeme(), self.suffix_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_text_reassembles_prefix_body_suffix() {
        let buffer: Arc<str> = Arc::from(" a ");
        let token = Token::new(
            TokenKind::Identifier,
            buffer,
            Span::new(0, 1),
            Span::new(1, 2),
            Span::new(2, 3),
            0,
        );
        assert_eq!(token.full_text(), " a ");
        assert_eq!(token.lexeme(), "a");
    }
}
