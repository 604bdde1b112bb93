//! Semantic analysis: name resolution, typing, and control-flow checks over
//! the AST that `llpc-par` produces.
//!
//! The symbol table (`scope`) models scopes as a tree of `Scope`s reached by
//! an `IndexVec<ScopeId, Scope>` plus a cursor, since analysis only ever
//! visits one function at a time depth-first. `analysis` walks the AST in
//! that order, filling in the `Cell`/`RefCell` annotation fields the parser
//! left empty (`comp_id`, `lv_type`, `ret_type`, `func_def`, `parent_func`)
//! and reporting every semantic error through the shared `Handler`.

pub mod analysis;
pub mod scope;
pub mod types;

#[cfg(test)]
mod edge_cases;

use llpc_par::ast::Ast;
use llpc_util::Handler;

pub use analysis::SemanticAnalyzer;
pub use scope::{EntryKind, Entry, FuncState, PassMode, Parameter, Scope, ScopeId, SymbolTable};
pub use types::{equal_types, fpar_lists_match};

/// Runs semantic analysis over `ast`, reporting errors through `handler`.
/// Returns the number of errors reported.
pub fn analyze(ast: &Ast, handler: &mut Handler) -> usize {
    let root_name = ast.funcs[ast.root].header.id;
    let mut analyzer = SemanticAnalyzer::new(root_name, handler);
    analyzer.analyze(ast);
    analyzer.error_count()
}
