//! Core utilities and foundation types shared by every phase of the
//! compiler: symbol interning, source locations, typed arena indices,
//! diagnostics, and the structural error types the phase crates use to
//! report internal failures.
//!
//! Nothing in this crate is specific to the language being compiled -
//! `llpc-lex`, `llpc-par`, `llpc-sem`, `llpc-frame` and `llpc-gen` each
//! build their own domain types on top of what lives here.

pub mod def_id;
pub mod diagnostic;
pub mod error;
pub mod index_vec;
pub mod span;
pub mod symbol;

pub use def_id::{DefId, DefIdGenerator};
pub use diagnostic::{Diagnostic, DiagnosticBuilder, DiagnosticCode, Handler, Level, SourceSnippet};
pub use error::{
    DiagnosticError, DiagnosticResult, IndexVecError, IndexVecResult, SourceMapError,
    SourceMapResult, SymbolError, SymbolResult,
};
pub use index_vec::{Idx, IndexVec};
pub use span::{FileId, SourceFile, SourceMap, Span};
pub use symbol::{InternerStats, Symbol, SymbolPretty};

pub use rustc_hash::{FxHashMap, FxHashSet};
