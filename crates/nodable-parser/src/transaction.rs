//! RAII-equivalent guard around a ribbon transaction.
//!
//! The guard only owns the saved cursor; the nodes created under a
//! transaction are tracked separately by [`crate::parser::Parser`] in a
//! stack of vectors, one per nesting level. That split exists because a
//! node created by a successfully committed *nested* transaction must
//! still be destroyable if an *enclosing* transaction later rolls back —
//! tracking the list on the guard itself would lose that chain the moment
//! the nested guard committed and dropped.

use nodable_scanner::SavedCursor;

/// Every transaction must be resolved by exactly one call to
/// [`Parser::commit_transaction`](crate::parser::Parser::commit_transaction)
/// or [`Parser::rollback_transaction`](crate::parser::Parser::rollback_transaction).
/// Dropping an unresolved guard is a parser bug, not a user-facing error.
pub(crate) struct TransactionGuard {
    saved: SavedCursor,
    resolved: bool,
}

impl TransactionGuard {
    pub(crate) fn new(saved: SavedCursor) -> Self {
        Self { saved, resolved: false }
    }

    pub(crate) fn saved(&self) -> SavedCursor {
        self.saved
    }

    pub(crate) fn resolve(mut self) {
        self.resolved = true;
    }
}

impl Drop for TransactionGuard {
    fn drop(&mut self) {
        debug_assert!(self.resolved, "transaction guard dropped without commit or rollback");
    }
}
