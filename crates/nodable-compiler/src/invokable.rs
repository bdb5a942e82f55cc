//! The invokable registry: maps an operator/function identifier plus its
//! argument types to a [`FunctionId`] the VM knows how to execute.
//!
//! Only the operators `spec.md` §4.5's ambient addition names are
//! registered — the four arithmetic operators, the six comparisons, and
//! unary `!` (plus unary `-`, grouped under "arithmetic" since it shares
//! the `-` symbol with binary subtraction). Plain assignment (`=`) lexes,
//! parses, and compiles, but it isn't in this table: `nodable_compiler`'s
//! lowering pass special-cases it into a direct store instead of routing
//! it through invokable resolution (assignment has no result type to
//! overload on; it just writes a value into an existing variable's frame
//! slot). Compound assignment (`+=`, `-=`, `*=`, `/=`) and the two exotic
//! comparison spellings (`=>`, `<=>`) still lex and parse but resolve to
//! no invokable and have no special-cased lowering, so an expression built
//! around one of those fails pre-compilation validity.

use nodable_lang::ValueType;

/// A stable handle the VM dispatches on; not a raw index into the
/// registry table so the table's order is free to change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FunctionId(pub u32);

#[derive(Clone, Debug)]
pub struct Invokable {
    pub name: &'static str,
    pub arg_types: Vec<ValueType>,
    pub id: FunctionId,
}

impl Invokable {
    #[must_use]
    pub fn arity(&self) -> usize {
        self.arg_types.len()
    }
}

macro_rules! invokable {
    ($id:expr, $name:expr, [$($ty:expr),*]) => {
        Invokable { name: $name, arg_types: vec![$($ty),*], id: FunctionId($id) }
    };
}

/// The built-in table, grounded in `spec.md` §4.5's "exact match preferred,
/// implicit conversion fallback allowed" — ids are stable within a process
/// but not meant to be persisted.
#[must_use]
pub fn builtin_invokables() -> Vec<Invokable> {
    use ValueType::{Bool, Double, Int, String as Str};
    vec![
        invokable!(0, "+", [Int, Int]),
        invokable!(1, "+", [Double, Double]),
        invokable!(2, "+", [Str, Str]),
        invokable!(3, "-", [Int, Int]),
        invokable!(4, "-", [Double, Double]),
        invokable!(5, "-", [Int]),
        invokable!(6, "-", [Double]),
        invokable!(7, "*", [Int, Int]),
        invokable!(8, "*", [Double, Double]),
        invokable!(9, "/", [Int, Int]),
        invokable!(10, "/", [Double, Double]),
        invokable!(11, "==", [Int, Int]),
        invokable!(12, "==", [Double, Double]),
        invokable!(13, "==", [Str, Str]),
        invokable!(14, "==", [Bool, Bool]),
        invokable!(15, "!=", [Int, Int]),
        invokable!(16, "!=", [Double, Double]),
        invokable!(17, "!=", [Str, Str]),
        invokable!(18, "!=", [Bool, Bool]),
        invokable!(19, "<", [Int, Int]),
        invokable!(20, "<", [Double, Double]),
        invokable!(21, ">", [Int, Int]),
        invokable!(22, ">", [Double, Double]),
        invokable!(23, "<=", [Int, Int]),
        invokable!(24, "<=", [Double, Double]),
        invokable!(25, ">=", [Int, Int]),
        invokable!(26, ">=", [Double, Double]),
        invokable!(27, "!", [Bool]),
    ]
}

fn matches_exact(declared: ValueType, actual: ValueType) -> bool {
    declared == actual || actual == ValueType::Any
}

fn matches_widened(declared: ValueType, actual: ValueType) -> bool {
    matches_exact(declared, actual) || (declared == ValueType::Double && actual == ValueType::Int)
}

/// Resolves `name(arg_types)` to a registered invokable. Tries an exact
/// type match first; if none exists, retries allowing `int` arguments to
/// widen into a `double` parameter.
#[must_use]
pub fn resolve(table: &[Invokable], name: &str, arg_types: &[ValueType]) -> Option<FunctionId> {
    table
        .iter()
        .find(|inv| {
            inv.name == name
                && inv.arity() == arg_types.len()
                && inv.arg_types.iter().zip(arg_types).all(|(&d, &a)| matches_exact(d, a))
        })
        .or_else(|| {
            table.iter().find(|inv| {
                inv.name == name
                    && inv.arity() == arg_types.len()
                    && inv.arg_types.iter().zip(arg_types).all(|(&d, &a)| matches_widened(d, a))
            })
        })
        .map(|inv| inv.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_exact_int_addition() {
        let table = builtin_invokables();
        assert_eq!(resolve(&table, "+", &[ValueType::Int, ValueType::Int]), Some(FunctionId(0)));
    }

    #[test]
    fn widens_int_argument_into_double_overload() {
        let table = builtin_invokables();
        assert_eq!(resolve(&table, "+", &[ValueType::Int, ValueType::Double]), Some(FunctionId(1)));
    }

    #[test]
    fn any_typed_argument_matches_exactly() {
        let table = builtin_invokables();
        assert_eq!(resolve(&table, "==", &[ValueType::Any, ValueType::Int]), Some(FunctionId(11)));
    }

    #[test]
    fn unregistered_assignment_operator_has_no_invokable() {
        let table = builtin_invokables();
        assert_eq!(resolve(&table, "=", &[ValueType::Int, ValueType::Int]), None);
    }

    #[test]
    fn unknown_name_resolves_to_none() {
        let table = builtin_invokables();
        assert_eq!(resolve(&table, "%", &[ValueType::Int, ValueType::Int]), None);
    }
}
