//! LLVM IR code generation (§4.4): walks a semantically-analyzed AST and its
//! planned stack frames, emitting one LLVM function per source function plus
//! the externs for the runtime library it calls into.
//!
//! Nothing here re-checks names or types: a clean AST is a precondition, and
//! any inconsistency encountered while lowering is a `CodeGenError::Internal`
//! bug in the analyzer or the frame planner, not a user-facing diagnostic.

use inkwell::builder::Builder;
use inkwell::context::Context;
use inkwell::module::{Linkage, Module};
use inkwell::types::{BasicMetadataTypeEnum, StructType};
use inkwell::values::{BasicMetadataValueEnum, BasicValueEnum, FunctionValue, IntValue, PointerValue};
use inkwell::{IntPredicate, OptimizationLevel};
use std::path::Path;

use llpc_par::ast::{Ast, BinOp, CallExpr, CompareOp, Cond, Expr, FuncId, LValue, LValueKind, LocalDef, Stmt, Type, UnOp};
use llpc_util::index_vec::IndexVec;
use llpc_util::{FxHashMap, Symbol};

use crate::error::{CodeGenError, Result};
use crate::types::{flatten_array_dims, total_element_count, TypeMapper};
use llpc_frame::{FrameId, StackFrame, VarRecord};

/// The 12 runtime library routines (§6), declared once per module as
/// external functions with no access link, matching `llpc-sem`'s
/// `runtime_library` table. The two tables are grounded in the same source
/// text but kept independent on purpose: one drives call-site type
/// checking, the other drives the externs the linker resolves.
fn runtime_library_signatures() -> Vec<(&'static str, Vec<Type>, Type)> {
    let open_char_array = Type::Array(Box::new(Type::Char), Type::OPEN_ARRAY);
    vec![
        ("writeInteger", vec![Type::Int], Type::None),
        ("writeChar", vec![Type::Char], Type::None),
        ("writeString", vec![open_char_array.clone()], Type::None),
        ("readInteger", vec![], Type::Int),
        ("readChar", vec![], Type::Char),
        ("readString", vec![Type::Int, open_char_array.clone()], Type::None),
        ("ascii", vec![Type::Char], Type::Int),
        ("chr", vec![Type::Int], Type::Char),
        ("strlen", vec![open_char_array.clone()], Type::Int),
        ("strcmp", vec![open_char_array.clone(), open_char_array.clone()], Type::Int),
        ("strcpy", vec![open_char_array.clone(), open_char_array.clone()], Type::None),
        ("strcat", vec![open_char_array.clone(), open_char_array], Type::None),
    ]
}

/// Every runtime-library parameter that is a char array is passed by
/// reference (a pointer); everything else is a plain scalar by value. There
/// is no `ref` keyword on an extern signature to read this off of, so the
/// rule is just "array means pointer" here.
fn is_runtime_array_param(ty: &Type) -> bool {
    ty.is_array()
}

/// Compile-time resolution of an identifier to the frame that declares it
/// and its slot, without needing the symbol table: semantic analysis already
/// guarantees the name resolves, so walking `parent_func` links alongside
/// the planned frames is enough.
fn resolve_binding<'a>(
    ast: &Ast,
    frames: &'a IndexVec<FrameId, StackFrame>,
    mut func_id: FuncId,
    name: Symbol,
) -> (usize, &'a VarRecord) {
    let mut levels_up = 0;
    loop {
        let frame_id = ast.funcs[func_id].stack_frame.borrow().expect("function has no planned frame");
        if let Some(record) = frames[frame_id].find(name) {
            return (levels_up, record);
        }
        func_id = ast.funcs[func_id]
            .parent_func
            .get()
            .expect("identifier not found in any enclosing frame");
        levels_up += 1;
    }
}

fn base_elem(ty: &Type) -> &Type {
    flatten_array_dims(ty).1
}

fn rebuild_array_type(base: Type, dims: &[i64]) -> Type {
    dims.iter().rev().fold(base, |acc, &dim| Type::Array(Box::new(acc), dim))
}

pub struct CodeGenerator<'ctx> {
    context: &'ctx Context,
    module: Module<'ctx>,
    builder: Builder<'ctx>,
    target_triple: String,
    opt_level: OptimizationLevel,
    type_mapper: TypeMapper<'ctx>,

    frame_types: FxHashMap<FrameId, StructType<'ctx>>,
    functions: FxHashMap<FuncId, FunctionValue<'ctx>>,
    current_func: Option<FuncId>,
    current_frame_ptr: Option<PointerValue<'ctx>>,
    return_slot: Option<PointerValue<'ctx>>,
    return_block: Option<inkwell::basic_block::BasicBlock<'ctx>>,
    /// Fresh per call so generated short-circuit block/slot names stay
    /// unique within a function.
    cond_slot_counter: u32,
}

impl<'ctx> CodeGenerator<'ctx> {
    pub fn new(context: &'ctx Context, module_name: &str, target_triple: String, opt_level: OptimizationLevel) -> Self {
        let module = context.create_module(module_name);

        let triple = inkwell::targets::TargetTriple::create(&target_triple);
        module.set_triple(&triple);
        if let Ok(target) = inkwell::targets::Target::from_triple(&triple) {
            if let Some(target_machine) = target.create_target_machine(
                &triple,
                "generic",
                "",
                opt_level,
                inkwell::targets::RelocMode::Default,
                inkwell::targets::CodeModel::Default,
            ) {
                let data_layout = target_machine.get_target_data().get_data_layout();
                module.set_data_layout(&data_layout);
            }
        }

        let mut codegen = Self {
            context,
            module,
            builder: context.create_builder(),
            target_triple,
            opt_level,
            type_mapper: TypeMapper::new(context),
            frame_types: FxHashMap::default(),
            functions: FxHashMap::default(),
            current_func: None,
            current_frame_ptr: None,
            return_slot: None,
            return_block: None,
            cond_slot_counter: 0,
        };
        codegen.declare_runtime_library();
        codegen
    }

    fn declare_runtime_library(&mut self) {
        for (name, params, ret_type) in runtime_library_signatures() {
            let param_types: Vec<BasicMetadataTypeEnum> = params
                .iter()
                .map(|ty| {
                    if is_runtime_array_param(ty) {
                        self.type_mapper.ptr_type().into()
                    } else {
                        self.type_mapper.scalar_type(ty).into()
                    }
                })
                .collect();
            let fn_type = match ret_type {
                Type::None => self.context.void_type().fn_type(&param_types, false),
                scalar => self.type_mapper.scalar_type(&scalar).fn_type(&param_types, false),
            };
            self.module.add_function(name, fn_type, Some(Linkage::External));
        }
    }

    /// Emits the whole program: every frame's struct type, every function's
    /// signature, then every function's body. Signatures are declared before
    /// any body is lowered so that calls between sibling functions resolve
    /// regardless of source order.
    pub fn compile(&mut self, ast: &Ast, frames: &IndexVec<FrameId, StackFrame>) -> Result<()> {
        self.build_frame_types(ast, frames);
        self.declare_all_functions(ast, frames);
        self.compile_func(ast, frames, ast.root)?;
        Ok(())
    }

    /// Builds an opaque struct type per frame. Access-link fields are a
    /// generic opaque pointer, so no struct needs another struct's concrete
    /// type available yet and this runs as one flat, order-independent pass.
    fn build_frame_types(&mut self, ast: &Ast, frames: &IndexVec<FrameId, StackFrame>) {
        for (_, func) in ast.funcs.iter_enumerated() {
            let frame_id = func.stack_frame.borrow().expect("unplanned frame");
            if self.frame_types.contains_key(&frame_id) {
                continue;
            }
            let frame = &frames[frame_id];
            let struct_ty = self.context.opaque_struct_type(frame.type_name.as_str());

            let mut field_types = Vec::with_capacity(frame.slot_count() as usize);
            if frame.has_access_link {
                field_types.push(self.type_mapper.ptr_type().into());
            }
            for record in &frame.records {
                field_types.push(self.frame_slot_type(record));
            }
            struct_ty.set_body(&field_types, false);
            self.frame_types.insert(frame_id, struct_ty);
        }
    }

    fn frame_slot_type(&self, record: &VarRecord) -> inkwell::types::BasicTypeEnum<'ctx> {
        if record.is_ref || record.is_array {
            self.type_mapper.ptr_type().into()
        } else {
            self.type_mapper.scalar_type(&record.var_type)
        }
    }

    fn declare_all_functions(&mut self, ast: &Ast, frames: &IndexVec<FrameId, StackFrame>) {
        for (func_id, func) in ast.funcs.iter_enumerated() {
            let frame_id = func.stack_frame.borrow().expect("unplanned frame");
            let frame = &frames[frame_id];

            let mut param_types: Vec<BasicMetadataTypeEnum> = Vec::new();
            if frame.has_access_link {
                param_types.push(self.type_mapper.ptr_type().into());
            }
            for record in &frame.records[..func.header.fpar_defs.len()] {
                param_types.push(self.frame_slot_type(record).into());
            }

            let fn_type = match &func.header.ret_type {
                Type::None => self.context.void_type().fn_type(&param_types, false),
                scalar => self.type_mapper.scalar_type(scalar).fn_type(&param_types, false),
            };

            let comp_id = func.header.comp_id.borrow().expect("comp_id not set by semantic analysis");
            let function = self.module.add_function(comp_id.as_str(), fn_type, None);
            self.functions.insert(func_id, function);
        }
    }

    // ----- per-function prologue ------------------------------------------------

    fn compile_func(&mut self, ast: &Ast, frames: &IndexVec<FrameId, StackFrame>, func_id: FuncId) -> Result<()> {
        let func = &ast.funcs[func_id];
        let frame_id = func.stack_frame.borrow().expect("unplanned frame");
        let frame = &frames[frame_id];
        let frame_struct = self.frame_types[&frame_id];
        let function = self.functions[&func_id];
        let label = func.header.comp_id.borrow().expect("comp_id not set").as_str().to_string();

        let entry = self.context.append_basic_block(function, &format!("entry_{label}"));
        let return_block = self.context.append_basic_block(function, &format!("return_{label}"));
        self.builder.position_at_end(entry);

        let saved_func = self.current_func.replace(func_id);
        let saved_frame_ptr = self.current_frame_ptr;
        let saved_return_slot = self.return_slot;
        let saved_return_block = self.return_block.replace(return_block);

        let frame_ptr = self
            .builder
            .build_alloca(frame_struct, "frame")
            .map_err(|e| CodeGenError::LlvmOperationFailed(e.to_string()))?;
        self.current_frame_ptr = Some(frame_ptr);

        // Store incoming arguments into the frame; the access link (if any)
        // is always the first incoming argument.
        let mut llvm_args = function.get_param_iter();
        if frame.has_access_link {
            let link = llvm_args.next().expect("missing access link argument");
            self.store_slot(frame_struct, frame_ptr, 0, link)?;
        }
        for fpar_index in 0..func.header.fpar_defs.len() {
            let record = &frame.records[fpar_index];
            let arg = llvm_args.next().expect("missing parameter argument");
            self.store_slot(frame_struct, frame_ptr, record.slot_index, arg)?;
        }

        // Array locals get their own backing allocation; the slot itself
        // holds a pointer to it.
        for record in &frame.records[func.header.fpar_defs.len()..] {
            if record.is_array {
                let elem_ty = self.type_mapper.base_scalar_type(&record.var_type);
                let count = total_element_count(&record.var_type);
                let array_ty = elem_ty.array_type(count.max(0) as u32);
                let backing = self
                    .builder
                    .build_alloca(array_ty, &format!("{}_storage", record.name.as_str()))
                    .map_err(|e| CodeGenError::LlvmOperationFailed(e.to_string()))?;
                self.store_slot(frame_struct, frame_ptr, record.slot_index, backing.into())?;
            }
        }

        let return_slot = match &func.header.ret_type {
            Type::None => None,
            ret_type => Some(
                self.builder
                    .build_alloca(self.type_mapper.scalar_type(ret_type), "retval")
                    .map_err(|e| CodeGenError::LlvmOperationFailed(e.to_string()))?,
            ),
        };
        self.return_slot = return_slot;

        self.compile_block(ast, frames, func_id, &func.body)?;

        if self.builder.get_insert_block().unwrap().get_terminator().is_none() {
            self.builder
                .build_unconditional_branch(return_block)
                .map_err(|e| CodeGenError::LlvmOperationFailed(e.to_string()))?;
        }

        self.builder.position_at_end(return_block);
        match return_slot {
            Some(slot) => {
                let value = self
                    .builder
                    .build_load(self.type_mapper.scalar_type(&func.header.ret_type), slot, "ret")
                    .map_err(|e| CodeGenError::LlvmOperationFailed(e.to_string()))?;
                self.builder.build_return(Some(&value)).map_err(|e| CodeGenError::LlvmOperationFailed(e.to_string()))?;
            }
            None => {
                self.builder.build_return(None).map_err(|e| CodeGenError::LlvmOperationFailed(e.to_string()))?;
            }
        }

        self.current_func = saved_func;
        self.current_frame_ptr = saved_frame_ptr;
        self.return_slot = saved_return_slot;
        self.return_block = saved_return_block;

        // Nested functions are emitted after their parent's own body, the
        // same order the frame planner recursed in.
        for local in &func.local_defs {
            if let LocalDef::FuncDef(child_id) = local {
                self.compile_func(ast, frames, *child_id)?;
            }
        }
        Ok(())
    }

    fn store_slot(
        &self,
        frame_struct: StructType<'ctx>,
        frame_ptr: PointerValue<'ctx>,
        slot_index: u32,
        value: BasicValueEnum<'ctx>,
    ) -> Result<()> {
        let field_ptr = self
            .builder
            .build_struct_gep(frame_struct, frame_ptr, slot_index, "slot")
            .map_err(|e| CodeGenError::LlvmOperationFailed(e.to_string()))?;
        self.builder.build_store(field_ptr, value).map_err(|e| CodeGenError::LlvmOperationFailed(e.to_string()))?;
        Ok(())
    }

    // ----- lvalue addressing (§4.4) ---------------------------------------------

    fn lvalue_address(&mut self, ast: &Ast, frames: &IndexVec<FrameId, StackFrame>, lvalue: &LValue) -> Result<(PointerValue<'ctx>, Type)> {
        match &lvalue.kind {
            LValueKind::Id(name) => self.named_address(ast, frames, *name),
            LValueKind::StringLit(text) => {
                let ptr = self.global_string_ptr(text)?;
                let ty = Type::Array(Box::new(Type::Char), text.as_str().len() as i64 + 1);
                Ok((ptr, ty))
            }
            LValueKind::Index(..) => self.index_address(ast, frames, lvalue),
        }
    }

    /// Walks from the current frame up through access links until the
    /// frame that declares `name` is reached, then computes that slot's
    /// address: a by-value scalar's field is its own address; a
    /// by-reference or array slot holds a pointer that must be loaded.
    fn named_address(&mut self, ast: &Ast, frames: &IndexVec<FrameId, StackFrame>, name: Symbol) -> Result<(PointerValue<'ctx>, Type)> {
        let func_id = self.current_func.expect("no function being compiled");
        let (levels_up, record) = resolve_binding(ast, frames, func_id, name);
        let record = record.clone();

        let mut frame_ptr = self.current_frame_ptr.expect("no active frame");
        let mut owner = func_id;
        for _ in 0..levels_up {
            let owner_frame_id = ast.funcs[owner].stack_frame.borrow().expect("unplanned frame");
            let owner_struct = self.frame_types[&owner_frame_id];
            let link_ptr = self
                .builder
                .build_struct_gep(owner_struct, frame_ptr, 0, "link")
                .map_err(|e| CodeGenError::LlvmOperationFailed(e.to_string()))?;
            frame_ptr = self
                .builder
                .build_load(self.type_mapper.ptr_type(), link_ptr, "parent_frame")
                .map_err(|e| CodeGenError::LlvmOperationFailed(e.to_string()))?
                .into_pointer_value();
            owner = ast.funcs[owner].parent_func.get().expect("walked past root");
        }

        let target_frame_id = ast.funcs[owner].stack_frame.borrow().expect("unplanned frame");
        let target_struct = self.frame_types[&target_frame_id];
        let field_ptr = self
            .builder
            .build_struct_gep(target_struct, frame_ptr, record.slot_index, name.as_str())
            .map_err(|e| CodeGenError::LlvmOperationFailed(e.to_string()))?;

        if record.is_ref || record.is_array {
            let addr = self
                .builder
                .build_load(self.type_mapper.ptr_type(), field_ptr, "deref")
                .map_err(|e| CodeGenError::LlvmOperationFailed(e.to_string()))?
                .into_pointer_value();
            Ok((addr, record.var_type.clone()))
        } else {
            Ok((field_ptr, record.var_type.clone()))
        }
    }

    /// Flattens a chain of `Index` nodes outermost-first, matching the order
    /// `flatten_array_dims` returns declared dimensions in: the parser's
    /// type grammar and its lvalue grammar nest brackets the same direction
    /// (first-written bracket innermost), so descending both trees the same
    /// way pairs matching dimensions with matching indices.
    fn flatten_index_chain(lvalue: &LValueKind) -> (&LValueKind, Vec<&Expr>) {
        let mut indices = Vec::new();
        let mut cur = lvalue;
        while let LValueKind::Index(sub, index) = cur {
            indices.push(index.as_ref());
            cur = sub;
        }
        indices.reverse();
        (cur, indices)
    }

    fn index_address(&mut self, ast: &Ast, frames: &IndexVec<FrameId, StackFrame>, lvalue: &LValue) -> Result<(PointerValue<'ctx>, Type)> {
        let (base_kind, indices) = Self::flatten_index_chain(&lvalue.kind);
        let array_type = lvalue
            .lv_type
            .borrow()
            .as_ref()
            .and_then(|t| t.array_type.clone())
            .ok_or_else(|| CodeGenError::Internal("indexed lvalue missing array_type annotation".into()))?;
        let (dims, base_ty) = flatten_array_dims(&array_type);

        let base_lvalue = LValue {
            kind: base_kind.clone(),
            lv_type: std::cell::RefCell::new(None),
            span: lvalue.span,
        };
        let (base_ptr, _) = self.lvalue_address(ast, frames, &base_lvalue)?;

        let i64_ty = self.context.i64_type();
        let mut linear = i64_ty.const_zero();
        for (dim_index, index_expr) in indices.iter().enumerate() {
            let index_value = self.compile_expr(ast, frames, index_expr)?.into_int_value();
            let dim = dims.get(dim_index).copied().unwrap_or(1).max(0);
            linear = self
                .builder
                .build_int_mul(linear, i64_ty.const_int(dim as u64, true), "idx_scale")
                .map_err(|e| CodeGenError::LlvmOperationFailed(e.to_string()))?;
            linear = self
                .builder
                .build_int_add(linear, index_value, "idx_add")
                .map_err(|e| CodeGenError::LlvmOperationFailed(e.to_string()))?;
        }
        let remaining: i64 = dims[indices.len()..].iter().copied().product::<i64>().max(1);
        if remaining != 1 {
            linear = self
                .builder
                .build_int_mul(linear, i64_ty.const_int(remaining as u64, true), "idx_stride")
                .map_err(|e| CodeGenError::LlvmOperationFailed(e.to_string()))?;
        }

        let elem_ty = self.type_mapper.scalar_type(base_ty);
        let addr = unsafe {
            self.builder
                .build_gep(elem_ty, base_ptr, &[linear], "elem_addr")
                .map_err(|e| CodeGenError::LlvmOperationFailed(e.to_string()))?
        };
        let result_type = if indices.len() < dims.len() {
            rebuild_array_type(base_ty.clone(), &dims[indices.len()..])
        } else {
            base_ty.clone()
        };
        Ok((addr, result_type))
    }

    fn global_string_ptr(&mut self, text: &Symbol) -> Result<PointerValue<'ctx>> {
        let global = self
            .builder
            .build_global_string_ptr(text.as_str(), "str")
            .map_err(|e| CodeGenError::LlvmOperationFailed(e.to_string()))?;
        Ok(global.as_pointer_value())
    }

    // ----- expression lowering ----------------------------------------------------

    fn compile_expr(&mut self, ast: &Ast, frames: &IndexVec<FrameId, StackFrame>, expr: &Expr) -> Result<BasicValueEnum<'ctx>> {
        match expr {
            Expr::IntLiteral(v, _) => Ok(self.context.i64_type().const_int(*v as u64, true).into()),
            Expr::CharLiteral(c, _) => Ok(self.context.i8_type().const_int(*c as u64, false).into()),
            Expr::Paren(inner) => self.compile_expr(ast, frames, inner),
            Expr::LValue(lvalue) => {
                let (addr, ty) = self.lvalue_address(ast, frames, lvalue)?;
                let scalar_ty = self.type_mapper.scalar_type(base_elem(&ty));
                self.builder
                    .build_load(scalar_ty, addr, "load")
                    .map_err(|e| CodeGenError::LlvmOperationFailed(e.to_string()))
            }
            Expr::Call(call) => self
                .compile_call(ast, frames, call)?
                .ok_or_else(|| CodeGenError::Internal(format!("call to '{}' used as a value but returns nothing", call.callee.as_str()))),
            Expr::Signed(UnOp::Plus, inner, _) => self.compile_expr(ast, frames, inner),
            Expr::Signed(UnOp::Minus, inner, _) => {
                let value = self.compile_expr(ast, frames, inner)?.into_int_value();
                self.builder
                    .build_int_neg(value, "neg")
                    .map(Into::into)
                    .map_err(|e| CodeGenError::LlvmOperationFailed(e.to_string()))
            }
            Expr::Binary(lhs, op, rhs, _) => {
                let l = self.compile_expr(ast, frames, lhs)?.into_int_value();
                let r = self.compile_expr(ast, frames, rhs)?.into_int_value();
                self.compile_binop(*op, l, r)
            }
        }
    }

    fn compile_binop(&self, op: BinOp, l: IntValue<'ctx>, r: IntValue<'ctx>) -> Result<BasicValueEnum<'ctx>> {
        let result = match op {
            BinOp::Add => self.builder.build_int_add(l, r, "add"),
            BinOp::Sub => self.builder.build_int_sub(l, r, "sub"),
            BinOp::Mul => self.builder.build_int_mul(l, r, "mul"),
            BinOp::Div => self.builder.build_int_signed_div(l, r, "sdiv"),
            BinOp::Mod => self.builder.build_int_signed_rem(l, r, "srem"),
        };
        result.map(Into::into).map_err(|e| CodeGenError::LlvmOperationFailed(e.to_string()))
    }

    /// Lowers a call to either a user function or a runtime library
    /// routine. Returns `None` for a call with no return value.
    fn compile_call(&mut self, ast: &Ast, frames: &IndexVec<FrameId, StackFrame>, call: &CallExpr) -> Result<Option<BasicValueEnum<'ctx>>> {
        let resolved_comp_id = call
            .resolved_comp_id
            .borrow()
            .ok_or_else(|| CodeGenError::Internal(format!("call to '{}' has no resolved target", call.callee.as_str())))?;
        let callee_func = self.lookup_user_func(ast, resolved_comp_id);

        let mut args: Vec<BasicMetadataValueEnum> = Vec::new();
        let (function, param_is_ref) = match callee_func {
            Some(callee_id) => {
                let frame_id = ast.funcs[callee_id].stack_frame.borrow().expect("unplanned frame");
                let frame = &frames[frame_id];
                let fpar_count = ast.funcs[callee_id].header.fpar_defs.len();
                let refs: Vec<bool> = frame.records[..fpar_count].iter().map(|r| r.is_ref).collect();
                args.push(self.access_link_for_call(ast, callee_id)?.into());
                (self.functions[&callee_id], refs)
            }
            None => {
                let params = runtime_library_signatures()
                    .into_iter()
                    .find(|(name, _, _)| *name == resolved_comp_id.as_str())
                    .map(|(_, p, _)| p)
                    .ok_or_else(|| CodeGenError::FunctionNotFound(resolved_comp_id.as_str().to_string()))?;
                let refs: Vec<bool> = params.iter().map(is_runtime_array_param).collect();
                let function = self
                    .module
                    .get_function(resolved_comp_id.as_str())
                    .ok_or_else(|| CodeGenError::FunctionNotFound(resolved_comp_id.as_str().to_string()))?;
                (function, refs)
            }
        };

        for (arg_expr, is_ref) in call.args.iter().zip(param_is_ref.iter()) {
            if *is_ref {
                let lvalue = match arg_expr {
                    Expr::LValue(lv) => lv,
                    _ => return Err(CodeGenError::Internal("by-reference argument is not an lvalue".into())),
                };
                let (addr, _) = self.lvalue_address(ast, frames, lvalue)?;
                args.push(addr.into());
            } else {
                args.push(self.compile_expr(ast, frames, arg_expr)?.into());
            }
        }

        let call_site = self
            .builder
            .build_call(function, &args, call.callee.as_str())
            .map_err(|e| CodeGenError::LlvmOperationFailed(e.to_string()))?;
        Ok(call_site.try_as_basic_value().basic())
    }

    /// Resolves a call's target by the unique `comp_id` semantic analysis
    /// already assigned it, not by `header.id`: two sibling nested functions
    /// may legally share a plain name in different scopes, so the name alone
    /// can't tell them apart.
    fn lookup_user_func(&self, ast: &Ast, comp_id: Symbol) -> Option<FuncId> {
        ast.funcs
            .iter_enumerated()
            .find(|(_, f)| f.header.comp_id.borrow().expect("comp_id set during analysis") == comp_id)
            .map(|(id, _)| id)
    }

    /// Computes the access link to pass when calling `callee` from the
    /// function currently being emitted: the caller's own frame if `callee`
    /// is one of its direct locals, otherwise the caller's access-link
    /// chain walked up to the frame that owns `callee`.
    fn access_link_for_call(&mut self, ast: &Ast, callee: FuncId) -> Result<PointerValue<'ctx>> {
        let caller = self.current_func.expect("no function being compiled");
        let callee_parent = ast.funcs[callee].parent_func.get();

        if callee_parent == Some(caller) {
            return Ok(self.current_frame_ptr.expect("no active frame"));
        }

        let target_owner = callee_parent.expect("non-root function with no parent");
        let mut owner = caller;
        let mut levels_up = 0;
        while owner != target_owner {
            owner = ast.funcs[owner].parent_func.get().expect("walked past root while resolving access link");
            levels_up += 1;
        }

        let mut frame_ptr = self.current_frame_ptr.expect("no active frame");
        let mut walker = caller;
        for _ in 0..levels_up {
            let walker_frame_id = ast.funcs[walker].stack_frame.borrow().expect("unplanned frame");
            let walker_struct = self.frame_types[&walker_frame_id];
            let link_ptr = self
                .builder
                .build_struct_gep(walker_struct, frame_ptr, 0, "link")
                .map_err(|e| CodeGenError::LlvmOperationFailed(e.to_string()))?;
            frame_ptr = self
                .builder
                .build_load(self.type_mapper.ptr_type(), link_ptr, "parent_frame")
                .map_err(|e| CodeGenError::LlvmOperationFailed(e.to_string()))?
                .into_pointer_value();
            walker = ast.funcs[walker].parent_func.get().expect("walked past root");
        }
        Ok(frame_ptr)
    }

    // ----- condition lowering (short-circuit) --------------------------------------

    fn compile_cond(&mut self, ast: &Ast, frames: &IndexVec<FrameId, StackFrame>, cond: &Cond) -> Result<IntValue<'ctx>> {
        match cond {
            Cond::Lit(v, _) => Ok(self.context.bool_type().const_int(*v as u64, false)),
            Cond::Compare(lhs, op, rhs, _) => {
                let l = self.compile_expr(ast, frames, lhs)?.into_int_value();
                let r = self.compile_expr(ast, frames, rhs)?.into_int_value();
                let predicate = match op {
                    CompareOp::Eq => IntPredicate::EQ,
                    CompareOp::Ne => IntPredicate::NE,
                    CompareOp::Lt => IntPredicate::SLT,
                    CompareOp::Gt => IntPredicate::SGT,
                    CompareOp::Le => IntPredicate::SLE,
                    CompareOp::Ge => IntPredicate::SGE,
                };
                self.builder.build_int_compare(predicate, l, r, "cmp").map_err(|e| CodeGenError::LlvmOperationFailed(e.to_string()))
            }
            Cond::Not(inner, _) => {
                let v = self.compile_cond(ast, frames, inner)?;
                self.builder.build_not(v, "not").map_err(|e| CodeGenError::LlvmOperationFailed(e.to_string()))
            }
            Cond::And(lhs, rhs, _) => self.compile_short_circuit(ast, frames, lhs, rhs, false),
            Cond::Or(lhs, rhs, _) => self.compile_short_circuit(ast, frames, lhs, rhs, true),
        }
    }

    /// `and` short-circuits to false the moment the left side is false;
    /// `or` short-circuits to true the moment the left side is true.
    fn compile_short_circuit(
        &mut self,
        ast: &Ast,
        frames: &IndexVec<FrameId, StackFrame>,
        lhs: &Cond,
        rhs: &Cond,
        short_circuit_on_true: bool,
    ) -> Result<IntValue<'ctx>> {
        let function = self.builder.get_insert_block().unwrap().get_parent().unwrap();

        self.cond_slot_counter += 1;
        let n = self.cond_slot_counter;
        let bool_ty = self.context.bool_type();
        let result_slot = self
            .builder
            .build_alloca(bool_ty, &format!("cond_result_{n}"))
            .map_err(|e| CodeGenError::LlvmOperationFailed(e.to_string()))?;

        let rhs_block = self.context.append_basic_block(function, &format!("cond_rhs_{n}"));
        let short_block = self.context.append_basic_block(function, &format!("cond_short_{n}"));
        let merge_block = self.context.append_basic_block(function, &format!("cond_merge_{n}"));

        let lhs_value = self.compile_cond(ast, frames, lhs)?;
        let (then_block, else_block) = if short_circuit_on_true { (short_block, rhs_block) } else { (rhs_block, short_block) };
        self.builder
            .build_conditional_branch(lhs_value, then_block, else_block)
            .map_err(|e| CodeGenError::LlvmOperationFailed(e.to_string()))?;

        self.builder.position_at_end(short_block);
        self.builder
            .build_store(result_slot, bool_ty.const_int(short_circuit_on_true as u64, false))
            .map_err(|e| CodeGenError::LlvmOperationFailed(e.to_string()))?;
        self.builder.build_unconditional_branch(merge_block).map_err(|e| CodeGenError::LlvmOperationFailed(e.to_string()))?;

        self.builder.position_at_end(rhs_block);
        let rhs_value = self.compile_cond(ast, frames, rhs)?;
        self.builder.build_store(result_slot, rhs_value).map_err(|e| CodeGenError::LlvmOperationFailed(e.to_string()))?;
        self.builder.build_unconditional_branch(merge_block).map_err(|e| CodeGenError::LlvmOperationFailed(e.to_string()))?;

        self.builder.position_at_end(merge_block);
        self.builder
            .build_load(bool_ty, result_slot, "cond_value")
            .map(|v| v.into_int_value())
            .map_err(|e| CodeGenError::LlvmOperationFailed(e.to_string()))
    }

    // ----- statement lowering -------------------------------------------------------

    fn compile_block(&mut self, ast: &Ast, frames: &IndexVec<FrameId, StackFrame>, func_id: FuncId, block: &[Stmt]) -> Result<()> {
        for stmt in block {
            self.compile_stmt(ast, frames, func_id, stmt)?;
            if self.builder.get_insert_block().unwrap().get_terminator().is_some() {
                break;
            }
        }
        Ok(())
    }

    fn compile_stmt(&mut self, ast: &Ast, frames: &IndexVec<FrameId, StackFrame>, func_id: FuncId, stmt: &Stmt) -> Result<()> {
        match stmt {
            Stmt::Empty(_) => Ok(()),
            Stmt::Assign(lvalue, expr, _) => {
                let value = self.compile_expr(ast, frames, expr)?;
                let (addr, _) = self.lvalue_address(ast, frames, lvalue)?;
                self.builder.build_store(addr, value).map_err(|e| CodeGenError::LlvmOperationFailed(e.to_string()))?;
                Ok(())
            }
            Stmt::Call(call) => {
                self.compile_call(ast, frames, call)?;
                Ok(())
            }
            Stmt::Block(body, _) => self.compile_block(ast, frames, func_id, body),
            Stmt::If(cond, then_branch, else_branch, _) => {
                let function = self.builder.get_insert_block().unwrap().get_parent().unwrap();
                let cond_value = self.compile_cond(ast, frames, cond)?;

                let then_block = self.context.append_basic_block(function, "if_then");
                let cont_block = self.context.append_basic_block(function, "if_cont");
                let else_block = if else_branch.is_some() {
                    self.context.append_basic_block(function, "if_else")
                } else {
                    cont_block
                };

                self.builder
                    .build_conditional_branch(cond_value, then_block, else_block)
                    .map_err(|e| CodeGenError::LlvmOperationFailed(e.to_string()))?;

                self.builder.position_at_end(then_block);
                self.compile_stmt(ast, frames, func_id, then_branch)?;
                if self.builder.get_insert_block().unwrap().get_terminator().is_none() {
                    self.builder.build_unconditional_branch(cont_block).map_err(|e| CodeGenError::LlvmOperationFailed(e.to_string()))?;
                }

                if let Some(else_stmt) = else_branch {
                    self.builder.position_at_end(else_block);
                    self.compile_stmt(ast, frames, func_id, else_stmt)?;
                    if self.builder.get_insert_block().unwrap().get_terminator().is_none() {
                        self.builder.build_unconditional_branch(cont_block).map_err(|e| CodeGenError::LlvmOperationFailed(e.to_string()))?;
                    }
                }

                self.builder.position_at_end(cont_block);
                Ok(())
            }
            Stmt::While(cond, body, _) => {
                let function = self.builder.get_insert_block().unwrap().get_parent().unwrap();
                let cond_block = self.context.append_basic_block(function, "while_cond");
                let body_block = self.context.append_basic_block(function, "while_body");
                let after_block = self.context.append_basic_block(function, "while_after");

                self.builder.build_unconditional_branch(cond_block).map_err(|e| CodeGenError::LlvmOperationFailed(e.to_string()))?;

                self.builder.position_at_end(cond_block);
                let cond_value = self.compile_cond(ast, frames, cond)?;
                self.builder
                    .build_conditional_branch(cond_value, body_block, after_block)
                    .map_err(|e| CodeGenError::LlvmOperationFailed(e.to_string()))?;

                self.builder.position_at_end(body_block);
                self.compile_stmt(ast, frames, func_id, body)?;
                if self.builder.get_insert_block().unwrap().get_terminator().is_none() {
                    self.builder.build_unconditional_branch(cond_block).map_err(|e| CodeGenError::LlvmOperationFailed(e.to_string()))?;
                }

                self.builder.position_at_end(after_block);
                Ok(())
            }
            Stmt::Return(value, _) => {
                if let Some(expr) = value {
                    let v = self.compile_expr(ast, frames, expr)?;
                    let slot = self.return_slot.expect("return with a value from a procedure");
                    self.builder.build_store(slot, v).map_err(|e| CodeGenError::LlvmOperationFailed(e.to_string()))?;
                }
                let return_block = self.return_block.expect("no return block for current function");
                self.builder.build_unconditional_branch(return_block).map_err(|e| CodeGenError::LlvmOperationFailed(e.to_string()))?;
                Ok(())
            }
        }
    }

    // ----- output -------------------------------------------------------------------

    pub fn emit_llvm_ir(&self) -> String {
        self.module.print_to_string().to_string()
    }

    pub fn write_ir_to_file(&self, path: &Path) -> std::io::Result<()> {
        use std::fs::File;
        use std::io::Write;

        let ir = self.emit_llvm_ir();
        let mut file = File::create(path)?;
        file.write_all(ir.as_bytes())?;
        Ok(())
    }

    pub fn get_module(&self) -> &Module<'ctx> {
        &self.module
    }

    pub fn write_object_file(&self, path: &Path) -> Result<()> {
        self.write_with_file_type(path, inkwell::targets::FileType::Object)
    }

    pub fn write_asm_file(&self, path: &Path) -> Result<()> {
        self.write_with_file_type(path, inkwell::targets::FileType::Assembly)
    }

    fn write_with_file_type(&self, path: &Path, file_type: inkwell::targets::FileType) -> Result<()> {
        use inkwell::targets::TargetTriple;

        let triple = TargetTriple::create(&self.target_triple);
        let target = inkwell::targets::Target::from_triple(&triple)
            .map_err(|e| CodeGenError::CompilationError(format!("failed to get target: {e}")))?;

        let target_machine = target
            .create_target_machine(
                &triple,
                "generic",
                "",
                self.opt_level,
                inkwell::targets::RelocMode::Default,
                inkwell::targets::CodeModel::Default,
            )
            .ok_or_else(|| CodeGenError::CompilationError("failed to create target machine".to_string()))?;

        target_machine
            .write_to_file(&self.module, file_type, path)
            .map_err(|e| CodeGenError::CompilationError(format!("failed to write output file: {e}")))
    }
}
