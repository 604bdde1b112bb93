//! The symbol table (§4.1): scopes form a tree, one per function plus the
//! root, and every entry records which of the three shapes (`Variable`,
//! `Parameter`, `Function`) it has.

use std::collections::HashMap;

use llpc_par::ast::Type;
use llpc_util::define_idx;
use llpc_util::index_vec::IndexVec;
use llpc_util::Symbol;

define_idx!(ScopeId);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassMode {
    ByValue,
    ByReference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuncState {
    Declared,
    Defined,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: Symbol,
    pub param_type: Type,
    pub passing: PassMode,
}

#[derive(Debug, Clone)]
pub enum EntryKind {
    Variable { var_type: Type },
    Parameter { param_type: Type, passing: PassMode },
    Function {
        parameters: Vec<Parameter>,
        return_type: Type,
        state: FuncState,
        /// The mangled name codegen resolves the call target with; see
        /// `CallExpr::resolved_comp_id`. Equal to the plain name for the
        /// runtime library's entries, which are never mangled.
        comp_id: Symbol,
    },
}

#[derive(Debug, Clone)]
pub struct Entry {
    pub id: Symbol,
    pub declaring_scope: ScopeId,
    pub kind: EntryKind,
}

pub struct Scope {
    pub name: Symbol,
    pub parent: Option<ScopeId>,
    pub depth: u32,
    pub entries: HashMap<Symbol, Entry>,
}

/// A tree of scopes plus a cursor (`current`) that analysis moves down into
/// a child on `open_scope` and back up on `close_scope`. Analysis visits
/// functions depth-first, so the cursor only ever needs to track "where am I
/// right now", never a branching set of scopes.
pub struct SymbolTable {
    scopes: IndexVec<ScopeId, Scope>,
    current: ScopeId,
}

impl SymbolTable {
    pub fn new(root_name: Symbol) -> Self {
        let mut scopes = IndexVec::new();
        let root = scopes.push(Scope {
            name: root_name,
            parent: None,
            depth: 0,
            entries: HashMap::new(),
        });
        Self { scopes, current: root }
    }

    pub fn open_scope(&mut self, name: Symbol) -> ScopeId {
        let depth = self.scopes[self.current].depth + 1;
        let id = self.scopes.push(Scope {
            name,
            parent: Some(self.current),
            depth,
            entries: HashMap::new(),
        });
        self.current = id;
        id
    }

    pub fn close_scope(&mut self) {
        if let Some(parent) = self.scopes[self.current].parent {
            self.current = parent;
        }
    }

    pub fn current_scope(&self) -> ScopeId {
        self.current
    }

    fn insert(&mut self, name: Symbol, kind: EntryKind) {
        let scope = self.current;
        self.scopes[scope].entries.insert(
            name,
            Entry {
                id: name,
                declaring_scope: scope,
                kind,
            },
        );
    }

    pub fn enter_variable(&mut self, name: Symbol, var_type: Type) {
        self.insert(name, EntryKind::Variable { var_type });
    }

    pub fn enter_parameter(&mut self, name: Symbol, param_type: Type, passing: PassMode) {
        self.insert(name, EntryKind::Parameter { param_type, passing });
    }

    pub fn enter_function(&mut self, name: Symbol, parameters: Vec<Parameter>, return_type: Type, state: FuncState, comp_id: Symbol) {
        self.insert(
            name,
            EntryKind::Function {
                parameters,
                return_type,
                state,
                comp_id,
            },
        );
    }

    pub fn set_func_defined(&mut self, scope: ScopeId, name: Symbol) {
        if let Some(entry) = self.scopes[scope].entries.get_mut(&name) {
            if let EntryKind::Function { state, .. } = &mut entry.kind {
                *state = FuncState::Defined;
            }
        }
    }

    /// Walks outward from the current scope, the way nested-function
    /// visibility works: an inner function sees its own locals first, then
    /// its ancestors', all the way to the root.
    pub fn lookup(&self, name: Symbol) -> Option<&Entry> {
        let mut scope = self.current;
        loop {
            if let Some(entry) = self.scopes[scope].entries.get(&name) {
                return Some(entry);
            }
            match self.scopes[scope].parent {
                Some(parent) => scope = parent,
                None => return None,
            }
        }
    }

    pub fn lookup_in(&self, scope: ScopeId, name: Symbol) -> Option<&Entry> {
        self.scopes[scope].entries.get(&name)
    }

    /// Names still `Declared` (forward-declared but never defined) in the
    /// given scope, used once a function body finishes to report the
    /// "declared but not defined" error for any sibling that never got a
    /// matching definition.
    pub fn get_undefined_functions(&self, scope: ScopeId) -> Vec<Symbol> {
        self.scopes[scope]
            .entries
            .values()
            .filter_map(|entry| match &entry.kind {
                EntryKind::Function {
                    state: FuncState::Declared,
                    ..
                } => Some(entry.id),
                _ => None,
            })
            .collect()
    }
}
