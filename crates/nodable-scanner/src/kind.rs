//! Token kinds — the binary-exact set needed for interoperability with
//! other nodable components (serializer, compiler, any future host).

/// The kind tag carried by every [`crate::Token`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Sentinel used for the ribbon's synthetic "null token" returned by
    /// `eat_if` when the next token doesn't match.
    None,

    Identifier,
    /// An operator lexeme (`+`, `==`, `<=>`, `=`, ...). The concrete symbol
    /// lives in the token's body text; see `nodable_lang` for the
    /// precedence/arity table keyed by that text.
    Operator,

    LiteralBool,
    LiteralInt,
    LiteralDouble,
    LiteralString,
    /// Reserved for interop with hosts that type permissive `any`-typed
    /// literals distinctly; never produced by this lexer.
    LiteralAny,
    /// Reserved for a literal whose type could not be determined; never
    /// produced by this lexer (numeric/string/bool literals are always
    /// unambiguous here).
    LiteralUnknown,

    KeywordIf,
    KeywordElse,
    KeywordFor,
    KeywordWhile,
    KeywordOperator,
    KeywordBool,
    KeywordInt,
    KeywordI16,
    KeywordDouble,
    KeywordString,
    KeywordAny,

    ParenthesisOpen,
    ParenthesisClose,
    ScopeBegin,
    ScopeEnd,
    EndOfInstruction,
    /// Reserved for hosts that want an explicit end-of-line token; this
    /// lexer folds newlines into `Ignore` per the attachment policy.
    EndOfLine,
    ListSeparator,

    /// Whitespace or a comment; never forwarded to the parser.
    Ignore,
}

impl TokenKind {
    /// Type keyword kinds — `bool | int | i16 | double | string | any`.
    #[must_use]
    pub const fn is_type_keyword(self) -> bool {
        matches!(
            self,
            Self::KeywordBool
                | Self::KeywordInt
                | Self::KeywordI16
                | Self::KeywordDouble
                | Self::KeywordString
                | Self::KeywordAny
        )
    }

    #[must_use]
    pub const fn is_literal(self) -> bool {
        matches!(
            self,
            Self::LiteralBool
                | Self::LiteralInt
                | Self::LiteralDouble
                | Self::LiteralString
                | Self::LiteralAny
                | Self::LiteralUnknown
        )
    }

    /// Kinds that "accept suffix" per the lexer's ignored-token attachment
    /// policy: every kind except `Identifier` and the two parenthesis
    /// kinds.
    #[must_use]
    pub const fn accepts_suffix(self) -> bool {
        !matches!(self, Self::Identifier | Self::ParenthesisOpen | Self::ParenthesisClose)
    }
}
