//! Name resolution, typing, and control-flow analysis (§4.2): walks the AST
//! built by `llpc-par`, fills in the `comp_id`/`lv_type`/`ret_type`/`func_def`
//! annotations, and reports every semantic error through the shared
//! diagnostic handler. Nothing here mutates the tree's shape, only the
//! `Cell`/`RefCell` annotation fields the parser left empty.

use std::hash::Hasher;

use rustc_hash::FxHasher;

use llpc_par::ast::{
    Ast, BinOp, CallExpr, CompareOp, Cond, Expr, FuncId, Header, LValue, LValueKind, LValueType, LocalDef, Stmt, Type, UnOp,
};
use llpc_util::diagnostic::DiagnosticBuilder;
use llpc_util::{Handler, Span, Symbol};

use crate::scope::{EntryKind, FuncState, PassMode, Parameter, ScopeId, SymbolTable};
use crate::types::{equal_types, fpar_lists_match};

/// The 12 pre-declared routines every program links against (§6). Installed
/// into the module scope before the root function is analyzed, so ordinary
/// name lookup finds them exactly like a user-defined function.
fn runtime_library() -> Vec<(&'static str, Vec<Parameter>, Type)> {
    let open_char_array = Type::Array(Box::new(Type::Char), Type::OPEN_ARRAY);
    let value = |ty: Type| Parameter {
        name: Symbol::intern("_"),
        param_type: ty,
        passing: PassMode::ByValue,
    };
    let by_ref = |ty: Type| Parameter {
        name: Symbol::intern("_"),
        param_type: ty,
        passing: PassMode::ByReference,
    };

    vec![
        ("writeInteger", vec![value(Type::Int)], Type::None),
        ("writeChar", vec![value(Type::Char)], Type::None),
        ("writeString", vec![by_ref(open_char_array.clone())], Type::None),
        ("readInteger", vec![], Type::Int),
        ("readChar", vec![], Type::Char),
        (
            "readString",
            vec![value(Type::Int), by_ref(open_char_array.clone())],
            Type::None,
        ),
        ("ascii", vec![value(Type::Char)], Type::Int),
        ("chr", vec![value(Type::Int)], Type::Char),
        ("strlen", vec![by_ref(open_char_array.clone())], Type::Int),
        (
            "strcmp",
            vec![by_ref(open_char_array.clone()), by_ref(open_char_array.clone())],
            Type::Int,
        ),
        (
            "strcpy",
            vec![by_ref(open_char_array.clone()), by_ref(open_char_array.clone())],
            Type::None,
        ),
        ("strcat", vec![by_ref(open_char_array.clone()), by_ref(open_char_array)], Type::None),
    ]
}

/// The return-producing type of a statement or block, per §4.2.4's
/// `type_of_block`. `None` means "does not definitely return"; `Some(ty)`
/// means every path through this statement ends in a `return` of type `ty`.
type FlowType = Option<Type>;

pub struct SemanticAnalyzer<'a> {
    table: SymbolTable,
    handler: &'a mut Handler,
    ancestors: Vec<Symbol>,
    current_ret_type: Type,
}

impl<'a> SemanticAnalyzer<'a> {
    pub fn new(root_name: Symbol, handler: &'a mut Handler) -> Self {
        Self {
            table: SymbolTable::new(root_name),
            handler,
            ancestors: Vec::new(),
            current_ret_type: Type::None,
        }
    }

    pub fn has_errors(&self) -> bool {
        self.handler.has_errors()
    }

    pub fn error_count(&self) -> usize {
        self.handler.error_count()
    }

    fn error(&mut self, message: impl Into<String>, span: Span) {
        DiagnosticBuilder::error(message).span(span).emit(self.handler);
    }

    fn warn(&mut self, message: impl Into<String>, span: Span) {
        DiagnosticBuilder::warning(message).span(span).emit(self.handler);
    }

    fn install_runtime_library(&mut self) {
        for (name, params, ret_type) in runtime_library() {
            let symbol = Symbol::intern(name);
            self.table
                .enter_function(symbol, params, ret_type, FuncState::Defined, symbol);
        }
    }

    /// Entry point: analyzes the whole program starting from its root
    /// function. Re-running this on an already-annotated `Ast` is a no-op,
    /// since every annotation setter below only fills a `None`.
    pub fn analyze(&mut self, ast: &Ast) {
        self.install_runtime_library();
        self.analyze_func_def(ast, ast.root, None);
    }

    fn analyze_func_def(&mut self, ast: &Ast, func_id: FuncId, parent: Option<FuncId>) {
        let func = &ast.funcs[func_id];

        if func.parent_func.get().is_none() {
            func.parent_func.set(parent);
        }

        if func_id == ast.root && (func.header.ret_type != Type::None || !func.header.fpar_defs.is_empty()) {
            self.error("the main program must return nothing and take no parameters", func.header.span);
        }

        self.process_header(&func.header, true);

        let scope = self.table.open_scope(func.header.id);
        for fpar in &func.header.fpar_defs {
            if self.table.lookup_in(scope, fpar.id).is_some() {
                self.error(
                    format!("duplicate parameter name '{}'", fpar.id.as_str()),
                    fpar.span,
                );
                continue;
            }
            let passing = if fpar.by_reference { PassMode::ByReference } else { PassMode::ByValue };
            self.table.enter_parameter(fpar.id, fpar.param_type.clone(), passing);
        }

        self.ancestors.push(func.header.id);
        for (index, local) in func.local_defs.iter().enumerate() {
            self.analyze_local_def(ast, scope, func_id, local, &func.local_defs[index + 1..]);
        }
        self.ancestors.pop();

        if func_id == ast.root {
            for name in self.table.get_undefined_functions(scope) {
                self.error(
                    format!("function '{}' is declared but never defined", name.as_str()),
                    func.span,
                );
            }
        }

        let saved_ret_type = std::mem::replace(&mut self.current_ret_type, func.header.ret_type.clone());
        let actual = self.analyze_block(&func.body);
        self.current_ret_type = saved_ret_type;

        match actual {
            Some(ty) if !equal_types(&ty, &func.header.ret_type) => {
                self.error(
                    format!(
                        "function '{}' must return {:?} on every path, found {:?}",
                        func.header.id.as_str(),
                        func.header.ret_type,
                        ty
                    ),
                    func.span,
                );
            },
            None if func.header.ret_type != Type::None => {
                self.error(
                    format!("function '{}' does not return a value on every path", func.header.id.as_str()),
                    func.span,
                );
            },
            _ => {},
        }

        self.table.close_scope();
    }

    fn analyze_local_def(&mut self, ast: &Ast, scope: ScopeId, owner: FuncId, local: &LocalDef, rest: &[LocalDef]) {
        match local {
            LocalDef::VarDef(v) => {
                if self.table.lookup_in(scope, v.id).is_some() {
                    self.error(format!("'{}' is already declared in this scope", v.id.as_str()), v.span);
                    return;
                }
                self.check_array_dims(&v.var_type, v.span);
                self.table.enter_variable(v.id, v.var_type.clone());
            },
            LocalDef::FuncDecl(decl) => {
                let was_declared_before = self.table.lookup_in(scope, decl.header.id).is_some();
                self.process_header(&decl.header, false);

                let defines_same_name =
                    |ld: &LocalDef| matches!(ld, LocalDef::FuncDef(id) if ast.funcs[*id].header.id == decl.header.id);
                if let Some(LocalDef::FuncDef(def_id)) = rest.iter().find(|ld| defines_same_name(ld)) {
                    if decl.func_def.borrow().is_none() {
                        decl.func_def.replace(Some(*def_id));
                    }
                    decl.is_redundant.set(was_declared_before);
                    if was_declared_before {
                        self.warn(
                            format!("redundant forward declaration of '{}'", decl.header.id.as_str()),
                            decl.span,
                        );
                    }
                } else {
                    self.error(
                        format!("function '{}' is declared but never defined in this scope", decl.header.id.as_str()),
                        decl.span,
                    );
                }
            },
            LocalDef::FuncDef(child_id) => {
                self.analyze_func_def(ast, *child_id, Some(owner));
            },
        }
    }

    /// Enters or matches the function entry for a header in the *current*
    /// scope (i.e. before that header's own scope is opened), computing its
    /// mangled `comp_id` from the chain of enclosing function names.
    fn process_header(&mut self, header: &Header, is_definition: bool) {
        if header.comp_id.borrow().is_none() {
            let comp_id = self.mangle(header.id);
            header.comp_id.replace(Some(comp_id));
        }
        let comp_id = header.comp_id.borrow().expect("just set above");

        for fpar in &header.fpar_defs {
            self.check_array_dims(&fpar.param_type, fpar.span);
        }

        let params: Vec<Parameter> = header
            .fpar_defs
            .iter()
            .map(|fpar| Parameter {
                name: fpar.id,
                param_type: fpar.param_type.clone(),
                passing: if fpar.by_reference { PassMode::ByReference } else { PassMode::ByValue },
            })
            .collect();

        let scope = self.table.current_scope();
        let existing = self.table.lookup_in(scope, header.id).cloned();

        match existing {
            None => {
                let state = if is_definition { FuncState::Defined } else { FuncState::Declared };
                self.table.enter_function(header.id, params, header.ret_type.clone(), state, comp_id);
            },
            Some(entry) => match &entry.kind {
                EntryKind::Function {
                    parameters,
                    return_type,
                    state,
                    ..
                } => {
                    if !equal_types(return_type, &header.ret_type) {
                        self.error(format!("'{}' redeclared with a different return type", header.id.as_str()), header.span);
                    } else if parameters.len() != params.len() {
                        self.error(format!("'{}' redeclared with a different number of parameters", header.id.as_str()), header.span);
                    } else if !fpar_lists_match(parameters, &params) {
                        self.error(
                            format!("'{}' redeclared with different parameter types or passing modes", header.id.as_str()),
                            header.span,
                        );
                    } else if is_definition && *state == FuncState::Defined {
                        self.error(format!("function '{}' is redefined", header.id.as_str()), header.span);
                    } else if is_definition {
                        self.table.set_func_defined(scope, header.id);
                    }
                },
                EntryKind::Variable { .. } | EntryKind::Parameter { .. } => {
                    self.error(
                        format!("'{}' is already declared as a variable in this scope", header.id.as_str()),
                        header.span,
                    );
                },
            },
        }
    }

    /// `size ≥ 1` denotes a fixed dimension; the open-array sentinel
    /// (`Type::OPEN_ARRAY`) is the only other legal value. Recurses through
    /// nested array types so every dimension of a multi-dimensional array
    /// gets checked, not just the outermost one.
    fn check_array_dims(&mut self, ty: &Type, span: Span) {
        if let Type::Array(inner, size) = ty {
            if *size != Type::OPEN_ARRAY && *size < 1 {
                self.error(format!("array dimension declared as {}, dimensions must be at least 1", size), span);
            }
            self.check_array_dims(inner, span);
        }
    }

    fn mangle(&self, name: Symbol) -> Symbol {
        if self.ancestors.is_empty() {
            return name;
        }
        let mut hasher = FxHasher::default();
        for ancestor in &self.ancestors {
            hasher.write(ancestor.as_str().as_bytes());
        }
        Symbol::intern(&format!("{}_{:x}", name.as_str(), hasher.finish()))
    }

    // ---- statements -------------------------------------------------------

    fn analyze_block(&mut self, block: &[Stmt]) -> FlowType {
        let mut result: FlowType = None;
        let mut warned = false;
        for stmt in block {
            let ty = self.analyze_stmt(stmt);
            if result.is_none() {
                result = ty;
            } else if !warned {
                self.warn("unreachable code", stmt_span(stmt));
                warned = true;
            }
        }
        result
    }

    fn analyze_stmt(&mut self, stmt: &Stmt) -> FlowType {
        match stmt {
            Stmt::Empty(_) => None,
            Stmt::Assign(lvalue, rhs, span) => {
                self.analyze_assign(lvalue, rhs, *span);
                None
            },
            Stmt::Call(call) => {
                let return_type = self.infer_call(call);
                if return_type != Type::None {
                    self.warn(format!("unused return value of call to '{}'", call.callee.as_str()), call.span);
                }
                None
            },
            Stmt::Block(body, _) => self.analyze_block(body),
            Stmt::If(cond, then_branch, else_branch, span) => {
                self.analyze_cond(cond);
                let then_ty = self.analyze_stmt(then_branch);
                match else_branch {
                    Some(else_stmt) => {
                        let else_ty = self.analyze_stmt(else_stmt);
                        match (then_ty, else_ty) {
                            (Some(a), Some(b)) if equal_types(&a, &b) => Some(a),
                            (Some(_), Some(_)) => {
                                self.error("if/else branches return different types", *span);
                                None
                            },
                            _ => None,
                        }
                    },
                    None => {
                        if then_ty.is_some() && self.const_cond_value(cond) == Some(true) {
                            then_ty
                        } else {
                            None
                        }
                    },
                }
            },
            Stmt::While(cond, body, span) => {
                self.analyze_cond(cond);
                let body_ty = self.analyze_stmt(body);
                let always_true = self.const_cond_value(cond) == Some(true);
                if always_true && body_ty.is_none() {
                    self.warn("infinite loop: condition is always true and the body never returns", *span);
                }
                if always_true { body_ty } else { None }
            },
            Stmt::Return(value, span) => {
                let ty = match value {
                    Some(expr) => self.infer_expr(expr),
                    None => Type::None,
                };
                if !equal_types(&ty, &self.current_ret_type) {
                    self.error(
                        format!("return type mismatch: expected {:?}, found {:?}", self.current_ret_type, ty),
                        *span,
                    );
                }
                Some(ty)
            },
        }
    }

    fn analyze_assign(&mut self, lvalue: &LValue, rhs: &Expr, span: Span) {
        let lhs_ty = self.resolve_lvalue(lvalue).elem_type;
        let rhs_ty = self.infer_expr(rhs);

        if matches!(lvalue.kind, LValueKind::StringLit(_)) {
            self.error("cannot assign into a string literal", span);
            return;
        }
        if lhs_ty.is_array() || matches!(lhs_ty, Type::Func(_)) {
            self.error("cannot assign to an array or a function result", span);
            return;
        }
        if !equal_types(&lhs_ty, &rhs_ty) {
            self.error(format!("cannot assign {:?} to a variable of type {:?}", rhs_ty, lhs_ty), span);
        }
    }

    // ---- conditions ---------------------------------------------------------

    fn analyze_cond(&mut self, cond: &Cond) {
        match cond {
            Cond::Lit(_, _) => {},
            Cond::Compare(lhs, _, rhs, span) => {
                let lhs_ty = self.infer_expr(lhs);
                let rhs_ty = self.infer_expr(rhs);
                if !equal_types(&lhs_ty, &rhs_ty) {
                    self.error(format!("cannot compare {:?} with {:?}", lhs_ty, rhs_ty), *span);
                }
            },
            Cond::And(a, b, _) | Cond::Or(a, b, _) => {
                self.analyze_cond(a);
                self.analyze_cond(b);
            },
            Cond::Not(c, _) => self.analyze_cond(c),
        }
    }

    // ---- expressions --------------------------------------------------------

    fn infer_expr(&mut self, expr: &Expr) -> Type {
        match expr {
            Expr::IntLiteral(_, _) => Type::Int,
            Expr::CharLiteral(_, _) => Type::Char,
            Expr::Paren(inner) => self.infer_expr(inner),
            Expr::LValue(lv) => self.resolve_lvalue(lv).elem_type,
            Expr::Call(call) => self.infer_call(call),
            Expr::Signed(_, inner, span) => {
                let ty = self.infer_expr(inner);
                if ty != Type::Int {
                    self.error("unary sign requires an integer operand", *span);
                }
                Type::Int
            },
            Expr::Binary(lhs, _, rhs, span) => {
                let lhs_ty = self.infer_expr(lhs);
                let rhs_ty = self.infer_expr(rhs);
                if lhs_ty != Type::Int || rhs_ty != Type::Int {
                    self.error("arithmetic operands must be integers", *span);
                }
                Type::Int
            },
        }
    }

    fn infer_call(&mut self, call: &CallExpr) -> Type {
        let entry = self.table.lookup(call.callee).cloned();
        let Some(entry) = entry else {
            self.error(format!("undefined function '{}'", call.callee.as_str()), call.span);
            call.ret_type.replace(Some(Type::None));
            return Type::None;
        };

        let EntryKind::Function { parameters, return_type, comp_id, .. } = entry.kind else {
            self.error(format!("'{}' is not a function", call.callee.as_str()), call.span);
            call.ret_type.replace(Some(Type::None));
            return Type::None;
        };

        if call.resolved_comp_id.borrow().is_none() {
            call.resolved_comp_id.replace(Some(comp_id));
        }

        if parameters.len() != call.args.len() {
            self.error(
                format!(
                    "'{}' expects {} argument(s), found {}",
                    call.callee.as_str(),
                    parameters.len(),
                    call.args.len()
                ),
                call.span,
            );
        }

        for (index, arg) in call.args.iter().enumerate() {
            let arg_ty = self.infer_expr(arg);
            let Some(param) = parameters.get(index) else { continue };
            if !equal_types(&arg_ty, &param.param_type) {
                self.error(
                    format!("argument {} of '{}' has type {:?}, expected {:?}", index + 1, call.callee.as_str(), arg_ty, param.param_type),
                    arg.span(),
                );
            }
            if param.passing == PassMode::ByReference && !is_lvalue(arg) {
                self.error(
                    format!("argument {} of '{}' must be an lvalue (parameter is passed by reference)", index + 1, call.callee.as_str()),
                    arg.span(),
                );
            }
        }

        if call.ret_type.borrow().is_none() {
            call.ret_type.replace(Some(return_type.clone()));
        }
        return_type
    }

    fn resolve_lvalue(&mut self, lvalue: &LValue) -> LValueType {
        if let Some(existing) = lvalue.lv_type.borrow().as_ref() {
            return existing.clone();
        }
        let result = match &lvalue.kind {
            LValueKind::Id(name) => match self.table.lookup(*name) {
                Some(entry) => {
                    let elem_type = match &entry.kind {
                        EntryKind::Variable { var_type } => var_type.clone(),
                        EntryKind::Parameter { param_type, .. } => param_type.clone(),
                        EntryKind::Function { return_type, .. } => return_type.clone(),
                    };
                    LValueType { elem_type, array_type: None }
                },
                None => {
                    self.error(format!("undefined identifier '{}'", name.as_str()), lvalue.span);
                    LValueType { elem_type: Type::Int, array_type: None }
                },
            },
            LValueKind::StringLit(text) => LValueType {
                elem_type: Type::Char,
                array_type: Some(Type::Array(Box::new(Type::Char), text.as_str().len() as i64 + 1)),
            },
            LValueKind::Index(sub, index_expr) => {
                let index_ty = self.infer_expr(index_expr);
                if index_ty != Type::Int {
                    self.error("array index must be an integer", lvalue.span);
                }
                let sub_type = self.resolve_lvalue_kind(sub, lvalue.span);
                match sub_type {
                    Type::Array(inner, size) => {
                        if size != Type::OPEN_ARRAY {
                            if let Some(value) = self.const_expr_value(index_expr) {
                                if value < 0 || value >= size {
                                    self.error(format!("array index {value} out of bounds for size {size}"), lvalue.span);
                                }
                            }
                        }
                        LValueType {
                            elem_type: *inner.clone(),
                            array_type: Some(Type::Array(inner, size)),
                        }
                    },
                    other => {
                        self.error(format!("cannot index into non-array type {other:?}"), lvalue.span);
                        LValueType { elem_type: Type::Int, array_type: None }
                    },
                }
            },
        };
        lvalue.lv_type.replace(Some(result.clone()));
        result
    }

    /// Types a nested `LValueKind` (the sub-lvalue of an `Index` node)
    /// without requiring it to already be wrapped in a full `LValue`.
    fn resolve_lvalue_kind(&mut self, kind: &LValueKind, span: Span) -> Type {
        match kind {
            LValueKind::Id(name) => match self.table.lookup(*name) {
                Some(entry) => match &entry.kind {
                    EntryKind::Variable { var_type } => var_type.clone(),
                    EntryKind::Parameter { param_type, .. } => param_type.clone(),
                    EntryKind::Function { return_type, .. } => return_type.clone(),
                },
                None => {
                    self.error(format!("undefined identifier '{}'", name.as_str()), span);
                    Type::Int
                },
            },
            LValueKind::StringLit(text) => Type::Array(Box::new(Type::Char), text.as_str().len() as i64 + 1),
            LValueKind::Index(inner, index_expr) => {
                let index_ty = self.infer_expr(index_expr);
                if index_ty != Type::Int {
                    self.error("array index must be an integer", span);
                }
                match self.resolve_lvalue_kind(inner, span) {
                    Type::Array(elem, _) => *elem,
                    other => {
                        self.error(format!("cannot index into non-array type {other:?}"), span);
                        Type::Int
                    },
                }
            },
        }
    }

    // ---- constant evaluation (§4.2, "Constant evaluation") -------------------

    fn const_expr_value(&self, expr: &Expr) -> Option<i64> {
        match expr {
            Expr::IntLiteral(n, _) => Some(*n),
            Expr::CharLiteral(c, _) => Some(*c as i64),
            Expr::Paren(inner) => self.const_expr_value(inner),
            Expr::Signed(op, inner, _) => {
                let v = self.const_expr_value(inner)?;
                Some(match op {
                    UnOp::Plus => v,
                    UnOp::Minus => -v,
                })
            },
            Expr::Binary(lhs, op, rhs, _) => {
                let l = self.const_expr_value(lhs)?;
                let r = self.const_expr_value(rhs)?;
                Some(match op {
                    BinOp::Add => l + r,
                    BinOp::Sub => l - r,
                    BinOp::Mul => l * r,
                    BinOp::Div if r != 0 => l / r,
                    BinOp::Mod if r != 0 => l % r,
                    _ => return None,
                })
            },
            Expr::LValue(_) | Expr::Call(_) => None,
        }
    }

    fn const_cond_value(&self, cond: &Cond) -> Option<bool> {
        match cond {
            Cond::Lit(b, _) => Some(*b),
            Cond::Compare(lhs, op, rhs, _) => {
                let l = self.const_expr_value(lhs)?;
                let r = self.const_expr_value(rhs)?;
                Some(match op {
                    CompareOp::Eq => l == r,
                    CompareOp::Ne => l != r,
                    CompareOp::Lt => l < r,
                    CompareOp::Gt => l > r,
                    CompareOp::Le => l <= r,
                    CompareOp::Ge => l >= r,
                })
            },
            Cond::And(a, b, _) => Some(self.const_cond_value(a)? && self.const_cond_value(b)?),
            Cond::Or(a, b, _) => Some(self.const_cond_value(a)? || self.const_cond_value(b)?),
            Cond::Not(c, _) => Some(!self.const_cond_value(c)?),
        }
    }
}

fn stmt_span(stmt: &Stmt) -> Span {
    match stmt {
        Stmt::Assign(_, _, s)
        | Stmt::Block(_, s)
        | Stmt::If(_, _, _, s)
        | Stmt::While(_, _, s)
        | Stmt::Return(_, s)
        | Stmt::Empty(s) => *s,
        Stmt::Call(c) => c.span,
    }
}

fn is_lvalue(expr: &Expr) -> bool {
    match expr {
        Expr::LValue(_) => true,
        Expr::Paren(inner) => is_lvalue(inner),
        _ => false,
    }
}
