//! Common types shared across the nodable core crates.
//!
//! This crate is the base layer of the workspace: it has no dependency on
//! any other `nodable-*` crate, so it can be used from the scanner, the
//! graph, the parser, the serializer and the compiler without creating
//! cycles.
//!
//! - Source spans (`Span`, `Spanned`)
//! - Diagnostics (`Diagnostic`, `DiagnosticCategory`, `diagnostic_codes`)
//! - Logging setup shared by the CLI and by tests

pub mod diagnostics;
pub mod logging;
pub mod span;

pub use diagnostics::{Diagnostic, DiagnosticBag, DiagnosticCategory, diagnostic_codes};
pub use span::{Span, Spanned};
