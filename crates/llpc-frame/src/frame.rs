//! The planned layout of a single function's frame (§4.3): an access link
//! (if the function is nested) followed by one slot per parameter, then one
//! slot per local variable, in declaration order.

use llpc_par::ast::Type;
use llpc_util::Symbol;

/// One frame slot, recorded with enough detail for lvalue lowering to
/// compute its address without re-deriving anything from the AST.
#[derive(Debug, Clone)]
pub struct VarRecord {
    pub name: Symbol,
    pub slot_index: u32,
    /// True when the slot holds a pointer to the value rather than the
    /// value itself: by-reference parameters, and array parameters, which
    /// are always by-reference regardless of the `ref` keyword.
    pub is_ref: bool,
    /// True for array-typed locals: the slot itself holds a base pointer
    /// into a separate backing allocation, not the array's contents.
    pub is_array: bool,
    pub var_type: Type,
}

/// A function's frame: an opaque struct type identifier plus its ordered
/// slots. Slot 0 is the access link when `has_access_link` is set; every
/// other slot is described by an entry in `records`.
#[derive(Debug, Clone)]
pub struct StackFrame {
    pub type_name: Symbol,
    pub has_access_link: bool,
    pub records: Vec<VarRecord>,
}

impl StackFrame {
    pub fn new(type_name: Symbol, has_access_link: bool) -> Self {
        Self {
            type_name,
            has_access_link,
            records: Vec::new(),
        }
    }

    fn push(&mut self, name: Symbol, is_ref: bool, is_array: bool, var_type: Type) -> u32 {
        let slot_index = self.has_access_link as u32 + self.records.len() as u32;
        self.records.push(VarRecord {
            name,
            slot_index,
            is_ref,
            is_array,
            var_type,
        });
        slot_index
    }

    pub fn push_parameter(&mut self, name: Symbol, is_ref: bool, is_array: bool, var_type: Type) -> u32 {
        self.push(name, is_ref, is_array, var_type)
    }

    pub fn push_local(&mut self, name: Symbol, is_array: bool, var_type: Type) -> u32 {
        self.push(name, false, is_array, var_type)
    }

    pub fn find(&self, name: Symbol) -> Option<&VarRecord> {
        self.records.iter().find(|record| record.name == name)
    }

    /// Total slot count, access link included.
    pub fn slot_count(&self) -> u32 {
        self.has_access_link as u32 + self.records.len() as u32
    }
}
