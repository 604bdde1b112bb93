//! AST node definitions for the parsed program.
//!
//! Function nesting is cyclic (a function's body can reference a sibling
//! that forward-declares it, and every nested function keeps a back-link to
//! its parent), so functions live in one flat arena (`IndexVec<FuncId,
//! FuncDef>`) and refer to each other by `FuncId` rather than by `Box`/`Rc`.
//! Everything else nests the ordinary way.

use std::cell::{Cell, RefCell};

use llpc_util::define_idx;
use llpc_util::index_vec::IndexVec;
use llpc_util::{Span, Symbol};

define_idx!(FuncId);

/// Opaque key into the stack-frame side table that `llpc-frame` builds once
/// semantic analysis has finished. The frame layout itself lives outside the
/// AST; this is just where analysis later records "this function's frame is
/// number N".
define_idx!(FrameId);

/// A fully parsed program: every function definition the source declares,
/// plus the id of the root (the `program` itself, modeled as a function with
/// no parameters and no return value).
#[derive(Debug)]
pub struct Ast {
    pub funcs: IndexVec<FuncId, FuncDef>,
    pub root: FuncId,
}

/// `int`, `char`, a fixed- or open-size array of some element type, the
/// return type of a function that returns nothing, or the declared return
/// type of a function used where a type is otherwise expected.
///
/// Two array types are equal if either side's outermost dimension is the
/// open-array sentinel (`-1`), regardless of the other side's size — see
/// `equal_types` in `llpc-sem`, which owns the actual comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Int,
    Char,
    Array(Box<Type>, i64),
    None,
    Func(Box<Type>),
}

impl Type {
    pub const OPEN_ARRAY: i64 = -1;

    pub fn is_array(&self) -> bool {
        matches!(self, Type::Array(..))
    }
}

/// A `program`, `function`, or `procedure` header.
///
/// A procedure is just a function whose `ret_type` is `Type::None`; the
/// parser does not keep the keyword around once the header is built.
#[derive(Debug, Clone)]
pub struct Header {
    pub id: Symbol,
    pub fpar_defs: Vec<FparDef>,
    pub ret_type: Type,
    /// Mangled name used by codegen, filled in during semantic analysis.
    pub comp_id: RefCell<Option<Symbol>>,
    pub span: Span,
}

/// One name in a grouped formal-parameter declaration (`var a, b : int`).
#[derive(Debug, Clone)]
pub struct FparDef {
    pub id: Symbol,
    pub param_type: Type,
    pub by_reference: bool,
    pub span: Span,
}

/// One name in a grouped local variable declaration.
#[derive(Debug, Clone)]
pub struct VarDef {
    pub id: Symbol,
    pub var_type: Type,
    pub span: Span,
}

/// A local declaration inside a function body: a variable block, a forward
/// declaration of a sibling function, or a fully nested function definition.
#[derive(Debug, Clone)]
pub enum LocalDef {
    VarDef(VarDef),
    FuncDecl(FuncDecl),
    FuncDef(FuncId),
}

/// A forward declaration: a header with no body, immediately terminated by
/// `;`. Resolved during semantic analysis against the sibling `FuncDef` that
/// later defines it; `is_redundant` is set if the definition turns out to
/// repeat its own forward declaration's header verbatim in the same scope.
#[derive(Debug, Clone)]
pub struct FuncDecl {
    pub header: Header,
    pub is_redundant: Cell<bool>,
    pub func_def: RefCell<Option<FuncId>>,
    pub span: Span,
}

/// A function (or procedure, or the program itself) definition.
#[derive(Debug, Clone)]
pub struct FuncDef {
    pub header: Header,
    pub local_defs: Vec<LocalDef>,
    pub body: Block,
    pub parent_func: Cell<Option<FuncId>>,
    pub stack_frame: RefCell<Option<FrameId>>,
    pub span: Span,
}

pub type Block = Vec<Stmt>;

/// The shape an lvalue takes syntactically. `StringLit` is an lvalue because
/// a string literal types as a `Char` array and can be indexed and passed by
/// reference just like a named array.
#[derive(Debug, Clone)]
pub enum LValueKind {
    Id(Symbol),
    StringLit(Symbol),
    Index(Box<LValueKind>, Box<Expr>),
}

/// The type annotation filled in on an lvalue once semantic analysis has
/// resolved it: `elem_type` is the type of the lvalue itself, `array_type` is
/// set only for `Index` nodes and records the array type being indexed into
/// (needed by codegen to compute per-dimension strides).
#[derive(Debug, Clone)]
pub struct LValueType {
    pub elem_type: Type,
    pub array_type: Option<Type>,
}

#[derive(Debug, Clone)]
pub struct LValue {
    pub kind: LValueKind,
    pub lv_type: RefCell<Option<LValueType>>,
    pub span: Span,
}

/// A call to a user function or a runtime library routine.
#[derive(Debug, Clone)]
pub struct CallExpr {
    pub callee: Symbol,
    pub args: Vec<Expr>,
    /// Filled in during semantic analysis from the resolved function's
    /// declared return type.
    pub ret_type: RefCell<Option<Type>>,
    /// The resolved target's mangled `comp_id`, filled in alongside
    /// `ret_type`. `callee` alone isn't unique (two sibling nested functions
    /// may share a plain name in different scopes), so codegen resolves
    /// calls by this field instead of re-deriving a target from `callee`.
    pub resolved_comp_id: RefCell<Option<Symbol>>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Plus,
    Minus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

/// Value-producing expressions. Conditions are a separate grammar
/// (`Cond`) and are never interchangeable with `Expr`: `if (x)` is a syntax
/// error here, unlike in a C-family language.
#[derive(Debug, Clone)]
pub enum Expr {
    IntLiteral(i64, Span),
    CharLiteral(char, Span),
    LValue(LValue),
    Call(CallExpr),
    Signed(UnOp, Box<Expr>, Span),
    Binary(Box<Expr>, BinOp, Box<Expr>, Span),
    Paren(Box<Expr>),
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::IntLiteral(_, s) | Expr::CharLiteral(_, s) | Expr::Signed(_, _, s) | Expr::Binary(_, _, _, s) => *s,
            Expr::LValue(lv) => lv.span,
            Expr::Call(c) => c.span,
            Expr::Paren(e) => e.span(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

/// Boolean-valued conditions, used only where the grammar calls for one
/// (`if`, `while`): comparisons between two `Expr`s, and/or/not combinations
/// of other conditions. Precedence, tightest to loosest, is `not` > `and` >
/// `or`; there is no parenthesized-condition production, so `not` only ever
/// negates the single comparison immediately to its right.
#[derive(Debug, Clone)]
pub enum Cond {
    Lit(bool, Span),
    Compare(Box<Expr>, CompareOp, Box<Expr>, Span),
    And(Box<Cond>, Box<Cond>, Span),
    Or(Box<Cond>, Box<Cond>, Span),
    Not(Box<Cond>, Span),
}

/// A statement. `Empty` is the empty statement (a bare `;`), legal anywhere
/// a statement is, including as the entire body of an `if`/`while`.
#[derive(Debug, Clone)]
pub enum Stmt {
    Assign(LValue, Expr, Span),
    Call(CallExpr),
    Block(Block, Span),
    If(Cond, Box<Stmt>, Option<Box<Stmt>>, Span),
    While(Cond, Box<Stmt>, Span),
    Return(Option<Expr>, Span),
    Empty(Span),
}
