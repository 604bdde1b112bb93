//! Walks the AST from the root function downward, building one `StackFrame`
//! per function in the same order the IR emitter will later walk it.

use llpc_par::ast::{Ast, FrameId, FuncId, LocalDef};
use llpc_util::index_vec::IndexVec;
use llpc_util::Symbol;

use crate::frame::StackFrame;

pub struct FramePlanner {
    frames: IndexVec<FrameId, StackFrame>,
}

impl FramePlanner {
    pub fn new() -> Self {
        Self { frames: IndexVec::new() }
    }

    pub fn into_frames(self) -> IndexVec<FrameId, StackFrame> {
        self.frames
    }

    /// Plans `func_id`'s frame, then recurses into its nested definitions.
    /// Idempotent: a function that already has a `stack_frame` keeps it.
    pub fn plan_func(&mut self, ast: &Ast, func_id: FuncId) -> FrameId {
        let func = &ast.funcs[func_id];
        if let Some(existing) = *func.stack_frame.borrow() {
            return existing;
        }

        let has_access_link = func.parent_func.get().is_some();
        let type_name = Symbol::intern(&format!("frame_{}", func.header.id.as_str()));
        let mut frame = StackFrame::new(type_name, has_access_link);

        for fpar in &func.header.fpar_defs {
            let is_array = fpar.param_type.is_array();
            let is_ref = fpar.by_reference || is_array;
            frame.push_parameter(fpar.id, is_ref, is_array, fpar.param_type.clone());
        }

        for local in &func.local_defs {
            if let LocalDef::VarDef(var) = local {
                frame.push_local(var.id, var.var_type.is_array(), var.var_type.clone());
            }
        }

        let frame_id = self.frames.push(frame);
        func.stack_frame.replace(Some(frame_id));

        for local in &func.local_defs {
            if let LocalDef::FuncDef(child_id) = local {
                self.plan_func(ast, *child_id);
            }
        }

        frame_id
    }
}

impl Default for FramePlanner {
    fn default() -> Self {
        Self::new()
    }
}
