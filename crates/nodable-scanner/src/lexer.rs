//! Lexer — turns a source buffer into a [`TokenRibbon`], preserving every
//! byte as prefix/suffix attached to the nearest real token.

use std::sync::Arc;

use nodable_common::Span;
use rustc_hash::FxHashMap;

use crate::kind::TokenKind;
use crate::ribbon::TokenRibbon;
use crate::token::Token;

/// Longest-match operator lexemes, ordered by decreasing length so the scan
/// below always finds the longest one first.
const OPERATORS: &[&str] =
    &["<=>", "==", "!=", ">=", "<=", "=>", "+=", "-=", "*=", "/=", "-", "!", "/", "*", "+", ">", "<", "="];

fn keyword_table() -> FxHashMap<&'static str, TokenKind> {
    let mut map = FxHashMap::default();
    map.insert("if", TokenKind::KeywordIf);
    map.insert("else", TokenKind::KeywordElse);
    map.insert("for", TokenKind::KeywordFor);
    map.insert("while", TokenKind::KeywordWhile);
    map.insert("operator", TokenKind::KeywordOperator);
    map.insert("bool", TokenKind::KeywordBool);
    map.insert("int", TokenKind::KeywordInt);
    map.insert("i16", TokenKind::KeywordI16);
    map.insert("double", TokenKind::KeywordDouble);
    map.insert("string", TokenKind::KeywordString);
    map.insert("any", TokenKind::KeywordAny);
    map.insert("true", TokenKind::LiteralBool);
    map.insert("false", TokenKind::LiteralBool);
    map
}

/// A byte in the source matched no lexical rule. Lexing halts immediately;
/// no partial ribbon is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub position: u32,
    pub byte: u8,
}

impl std::fmt::Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unrecognized byte {:#04x} at offset {}", self.byte, self.position)
    }
}

impl std::error::Error for LexError {}

struct Scanner {
    buffer: Arc<str>,
    bytes: Vec<u8>,
    pos: u32,
    keywords: FxHashMap<&'static str, TokenKind>,
    pending_start: Option<u32>,
    pending_end: u32,
}

/// Lexes `source` into a [`TokenRibbon`]. See the module docs for the
/// ignored-token attachment policy that preserves byte-exact round-tripping.
pub fn lex(source: &str) -> Result<TokenRibbon, LexError> {
    let buffer: Arc<str> = Arc::from(source);
    let bytes = buffer.as_bytes().to_vec();
    let mut scanner = Scanner {
        buffer: Arc::clone(&buffer),
        bytes,
        pos: 0,
        keywords: keyword_table(),
        pending_start: None,
        pending_end: 0,
    };
    let mut ribbon = TokenRibbon::new(buffer);

    while (scanner.pos as usize) < scanner.bytes.len() {
        if let Some((start, end)) = scanner.scan_ignore()? {
            scanner.attach_ignore(&mut ribbon, start, end);
            continue;
        }
        let (kind, body) = scanner.scan_real_token()?;
        scanner.push_real_token(&mut ribbon, kind, body);
    }

    scanner.finish(&mut ribbon);
    Ok(ribbon)
}

impl Scanner {
    fn byte_at(&self, pos: u32) -> Option<u8> {
        self.bytes.get(pos as usize).copied()
    }

    fn attach_ignore(&mut self, ribbon: &mut TokenRibbon, start: u32, end: u32) {
        if ribbon.is_empty() {
            ribbon.set_global_prefix_end(end);
            return;
        }
        match self.pending_start {
            Some(_) => self.pending_end = end,
            None => {
                self.pending_start = Some(start);
                self.pending_end = end;
            }
        }
    }

    fn push_real_token(&mut self, ribbon: &mut TokenRibbon, kind: TokenKind, body: Span) {
        if let Some(pending_start) = self.pending_start.take() {
            let pending_end = self.pending_end;
            let accepts_suffix_on_prev =
                ribbon.tokens().last().map(|t| t.kind().accepts_suffix()).unwrap_or(false);
            if accepts_suffix_on_prev {
                if let Some(last_index) = ribbon.len().checked_sub(1) {
                    self.extend_last_suffix(ribbon, last_index, pending_end);
                }
                let index = u32::try_from(ribbon.len()).unwrap_or(u32::MAX);
                let token = Token::new(kind, Arc::clone(&self.buffer), Span::at(body.start), body, Span::at(body.end), index);
                ribbon.push(token);
            } else {
                let index = u32::try_from(ribbon.len()).unwrap_or(u32::MAX);
                let token =
                    Token::new(kind, Arc::clone(&self.buffer), Span::new(pending_start, body.start), body, Span::at(body.end), index);
                ribbon.push(token);
            }
        } else {
            let index = u32::try_from(ribbon.len()).unwrap_or(u32::MAX);
            let token = Token::new(kind, Arc::clone(&self.buffer), Span::at(body.start), body, Span::at(body.end), index);
            ribbon.push(token);
        }
    }

    fn extend_last_suffix(&self, ribbon: &mut TokenRibbon, index: usize, new_end: u32) {
        ribbon.extend_suffix_at(index, new_end);
    }

    fn finish(&mut self, ribbon: &mut TokenRibbon) {
        if let Some(pending_start) = self.pending_start.take() {
            ribbon.set_global_suffix_start(pending_start);
            let _ = self.pending_end;
        } else {
            let len = u32::try_from(self.bytes.len()).unwrap_or(u32::MAX);
            ribbon.set_global_suffix_start(len);
        }
    }

    /// Scans one ignore chunk (a run of whitespace, or one comment) if the
    /// cursor sits on one; returns its `[start, end)` byte range.
    fn scan_ignore(&mut self) -> Result<Option<(u32, u32)>, LexError> {
        let start = self.pos;
        match self.byte_at(self.pos) {
            Some(b' ' | b'\t' | b'\n' | b'\r') => {
                while matches!(self.byte_at(self.pos), Some(b' ' | b'\t' | b'\n' | b'\r')) {
                    self.pos += 1;
                }
                Ok(Some((start, self.pos)))
            }
            Some(b'/') if self.byte_at(self.pos + 1) == Some(b'/') => {
                self.pos += 2;
                while let Some(b) = self.byte_at(self.pos) {
                    self.pos += 1;
                    if b == b'\n' {
                        break;
                    }
                }
                Ok(Some((start, self.pos)))
            }
            Some(b'/') if self.byte_at(self.pos + 1) == Some(b'*') => {
                self.pos += 2;
                let mut prev = 0u8;
                loop {
                    match self.byte_at(self.pos) {
                        None => break,
                        Some(b) => {
                            self.pos += 1;
                            if prev == b'*' && b == b'/' {
                                break;
                            }
                            prev = b;
                        }
                    }
                }
                Ok(Some((start, self.pos)))
            }
            _ => Ok(None),
        }
    }

    fn scan_real_token(&mut self) -> Result<(TokenKind, Span), LexError> {
        let start = self.pos;
        let b = self.byte_at(self.pos).expect("scan_real_token called at EOF");
        match b {
            b'(' => {
                self.pos += 1;
                Ok((TokenKind::ParenthesisOpen, Span::new(start, self.pos)))
            }
            b')' => {
                self.pos += 1;
                Ok((TokenKind::ParenthesisClose, Span::new(start, self.pos)))
            }
            b'{' => {
                self.pos += 1;
                Ok((TokenKind::ScopeBegin, Span::new(start, self.pos)))
            }
            b'}' => {
                self.pos += 1;
                Ok((TokenKind::ScopeEnd, Span::new(start, self.pos)))
            }
            b';' => {
                self.pos += 1;
                Ok((TokenKind::EndOfInstruction, Span::new(start, self.pos)))
            }
            b',' => {
                self.pos += 1;
                Ok((TokenKind::ListSeparator, Span::new(start, self.pos)))
            }
            b'"' => self.scan_string(),
            b'0'..=b'9' => Ok(self.scan_number()),
            b'A'..=b'Z' | b'a'..=b'z' | b'_' => Ok(self.scan_identifier_or_keyword()),
            _ => {
                if let Some(op) = self.try_scan_operator() {
                    Ok((TokenKind::Operator, op))
                } else {
                    Err(LexError { position: start, byte: b })
                }
            }
        }
    }

    fn try_scan_operator(&mut self) -> Option<Span> {
        let start = self.pos;
        let remaining = self.bytes.get(start as usize..)?;
        for op in OPERATORS {
            if remaining.starts_with(op.as_bytes()) {
                self.pos += u32::try_from(op.len()).unwrap_or(0);
                return Some(Span::new(start, self.pos));
            }
        }
        None
    }

    fn scan_number(&mut self) -> (TokenKind, Span) {
        let start = self.pos;
        while matches!(self.byte_at(self.pos), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
        let mut is_double = false;
        if self.byte_at(self.pos) == Some(b'.') && matches!(self.byte_at(self.pos + 1), Some(b'0'..=b'9')) {
            is_double = true;
            self.pos += 1;
            while matches!(self.byte_at(self.pos), Some(b'0'..=b'9')) {
                self.pos += 1;
            }
        }
        let kind = if is_double { TokenKind::LiteralDouble } else { TokenKind::LiteralInt };
        (kind, Span::new(start, self.pos))
    }

    fn scan_string(&mut self) -> Result<(TokenKind, Span), LexError> {
        let start = self.pos;
        self.pos += 1; // opening quote
        loop {
            match self.byte_at(self.pos) {
                None => return Err(LexError { position: start, byte: b'"' }),
                Some(b'\\') if self.byte_at(self.pos + 1) == Some(b'"') => {
                    self.pos += 2;
                }
                Some(b'"') => {
                    self.pos += 1;
                    break;
                }
                Some(_) => {
                    self.pos += 1;
                }
            }
        }
        Ok((TokenKind::LiteralString, Span::new(start, self.pos)))
    }

    fn scan_identifier_or_keyword(&mut self) -> (TokenKind, Span) {
        let start = self.pos;
        while matches!(self.byte_at(self.pos), Some(b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_')) {
            self.pos += 1;
        }
        let span = Span::new(start, self.pos);
        let lexeme = span.slice(&self.buffer);
        let kind = self.keywords.get(lexeme).copied().unwrap_or(TokenKind::Identifier);
        (kind, span)
    }
}
