//! Error types for IR emission.
//!
//! Everything here is an internal error: by the time a semantically clean
//! AST reaches `llpc-gen`, every name has resolved and every type has
//! checked, so any failure encountered during lowering indicates an
//! inconsistency between the analyzer, the frame planner, and the emitter.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodeGenError {
    /// An lvalue's identifier was not found in its own frame or any ancestor
    /// reached by walking access links.
    #[error("internal error: identifier '{0}' not found in any enclosing frame")]
    UnresolvedIdentifier(String),

    /// A runtime library or user function was referenced but never declared
    /// in the module.
    #[error("internal error: function '{0}' not found in module")]
    FunctionNotFound(String),

    #[error("LLVM operation failed: {0}")]
    LlvmOperationFailed(String),

    #[error("type mapping error: {0}")]
    TypeMappingError(String),

    #[error("compilation error: {0}")]
    CompilationError(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, CodeGenError>;
