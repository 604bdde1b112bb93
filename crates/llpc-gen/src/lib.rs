//! LLVM IR emission (§4.4): turns a semantically-analyzed AST and its
//! planned stack frames into an LLVM module, then writes that module out as
//! IR text, assembly, or an object file.

pub mod error;
pub mod linker;
pub mod llvm;
pub mod types;

#[cfg(test)]
mod edge_cases;

pub use error::{CodeGenError, Result};
pub use linker::Linker;
pub use llvm::CodeGenerator;
pub use types::TypeMapper;

use inkwell::context::Context;
use inkwell::OptimizationLevel;

use llpc_frame::StackFrame;
use llpc_par::ast::Ast;
use llpc_util::index_vec::IndexVec;

/// Lowers `ast` (already planned by `llpc_frame::plan`) into an LLVM module
/// named `module_name`, targeting `target_triple`. `opt_level` is
/// pass-through to the backend, set by the `-O` flag.
pub fn emit<'ctx>(
    context: &'ctx Context,
    ast: &Ast,
    frames: &IndexVec<llpc_par::ast::FrameId, StackFrame>,
    module_name: &str,
    target_triple: String,
    opt_level: OptimizationLevel,
) -> Result<CodeGenerator<'ctx>> {
    let mut codegen = CodeGenerator::new(context, module_name, target_triple, opt_level);
    codegen.compile(ast, frames)?;
    Ok(codegen)
}
