//! Stack-frame planning (§4.3): walks the semantically-analyzed AST from the
//! root function down, assigning each function an opaque frame struct with
//! an access-link slot (if nested) followed by one slot per parameter, then
//! one slot per local variable. The layout order is deterministic and is
//! the same order `llpc-gen` walks when lowering lvalues.

pub mod frame;
pub mod planner;

#[cfg(test)]
mod edge_cases;

use llpc_par::ast::Ast;
pub use llpc_par::ast::FrameId;
use llpc_util::index_vec::IndexVec;

pub use frame::{StackFrame, VarRecord};
pub use planner::FramePlanner;

/// Plans stack frames for every function in `ast`, recording each function's
/// `FrameId` back into its own `stack_frame` field. Returns the completed
/// table, indexed by `FrameId`.
pub fn plan(ast: &Ast) -> IndexVec<FrameId, StackFrame> {
    let mut planner = FramePlanner::new();
    planner.plan_func(ast, ast.root);
    planner.into_frames()
}
