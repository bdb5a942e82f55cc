//! Language definition — operator precedence/arity and type keyword
//! vocabulary, bundled into a single explicit [`Language`] value.
//!
//! There is no process-wide singleton here: a `Language` is constructed
//! once (typically via `Language::default()`) and passed to every parser,
//! serializer and compiler call that needs it, per the "no global
//! singletons" design note.

pub mod operator;
pub mod value_type;

pub use operator::{Arity, OperatorDef};
pub use value_type::ValueType;

use rustc_hash::FxHashMap;

use nodable_scanner::TokenKind;

/// An explicit bundle of the language's operator table and type-keyword
/// mapping. Stateless and `Clone`-cheap; build one and share it by
/// reference.
#[derive(Clone, Debug)]
pub struct Language {
    operators: FxHashMap<&'static str, OperatorDef>,
}

impl Default for Language {
    fn default() -> Self {
        let mut operators = FxHashMap::default();
        for def in operator::BUILTIN_OPERATORS {
            operators.insert(def.symbol, *def);
        }
        Self { operators }
    }
}

impl Language {
    /// Looks up an operator by its textual symbol (e.g. `"+"`, `"<=>"`).
    #[must_use]
    pub fn operator(&self, symbol: &str) -> Option<OperatorDef> {
        self.operators.get(symbol).copied()
    }

    /// Maps a type-keyword token kind to its [`ValueType`].
    #[must_use]
    pub fn type_of_keyword(&self, kind: TokenKind) -> Option<ValueType> {
        value_type::from_keyword(kind)
    }
}
