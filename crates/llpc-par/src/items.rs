//! Header, parameter/variable group, and function-definition parsing.
//!
//! Functions nest, so the arena (`Parser::funcs`) is built incrementally: a
//! function's `FuncId` is reserved with a placeholder entry *before* its
//! body is parsed, so nested definitions inside that body can record it as
//! their `parent_func` right away. The placeholder's `local_defs`/`body`
//! are overwritten in place once parsing finishes.

use std::cell::{Cell, RefCell};

use llpc_lex::Token;
use llpc_util::{Span, Symbol};

use crate::ast::{Block, FparDef, FuncDecl, FuncDef, FuncId, Header, LocalDef, Type, VarDef};
use crate::Parser;

impl<'a> Parser<'a> {
    pub fn parse_program(&mut self) -> Option<FuncId> {
        let header = self.parse_program_header()?;
        let root = self.funcs.push(FuncDef {
            header,
            local_defs: Vec::new(),
            body: Vec::new(),
            parent_func: Cell::new(None),
            stack_frame: RefCell::new(None),
            span: Span::DUMMY,
        });
        let (local_defs, body) = self.parse_func_tail(root)?;
        self.funcs[root].local_defs = local_defs;
        self.funcs[root].body = body;
        Some(root)
    }

    fn parse_program_header(&mut self) -> Option<Header> {
        self.expect(Token::Program)?;
        let id = self.parse_ident()?;
        self.expect(Token::Semicolon)?;
        Some(Header {
            id,
            fpar_defs: Vec::new(),
            ret_type: Type::None,
            comp_id: RefCell::new(None),
            span: Span::DUMMY,
        })
    }

    /// Local declarations followed by the mandatory `begin`...`end` body.
    /// Shared by the program itself and every nested function/procedure.
    pub(crate) fn parse_func_tail(&mut self, owner: FuncId) -> Option<(Vec<LocalDef>, Block)> {
        let mut local_defs = Vec::new();
        loop {
            match self.current_token() {
                Token::Var => {
                    let vars = self.parse_var_def_group()?;
                    local_defs.extend(vars.into_iter().map(LocalDef::VarDef));
                },
                Token::Function | Token::Procedure => {
                    let header = self.parse_header()?;
                    if self.match_token(Token::Semicolon) {
                        local_defs.push(LocalDef::FuncDecl(FuncDecl {
                            header,
                            is_redundant: Cell::new(false),
                            func_def: RefCell::new(None),
                            span: Span::DUMMY,
                        }));
                    } else {
                        let child = self.funcs.push(FuncDef {
                            header,
                            local_defs: Vec::new(),
                            body: Vec::new(),
                            parent_func: Cell::new(Some(owner)),
                            stack_frame: RefCell::new(None),
                            span: Span::DUMMY,
                        });
                        let (child_locals, child_body) = self.parse_func_tail(child)?;
                        self.funcs[child].local_defs = child_locals;
                        self.funcs[child].body = child_body;
                        local_defs.push(LocalDef::FuncDef(child));
                    }
                },
                _ => break,
            }
        }

        let body = self.parse_block()?;
        Some((local_defs, body))
    }

    /// `function` or `procedure`, name, parenthesized parameter groups, and
    /// (for a function) the `: type` return annotation. Whether this header
    /// is a forward declaration or a full definition is decided by the
    /// caller, based on whether a `;` or a `var`/nested-header/`begin`
    /// follows.
    fn parse_header(&mut self) -> Option<Header> {
        let is_function = match self.current_token() {
            Token::Function => {
                self.advance();
                true
            },
            Token::Procedure => {
                self.advance();
                false
            },
            _ => {
                self.error("expected 'function' or 'procedure'".to_string());
                return None;
            },
        };

        let id = self.parse_ident()?;
        self.expect(Token::LParen)?;
        let fpar_defs = self.parse_fpar_defs()?;
        self.expect(Token::RParen)?;

        let ret_type = if is_function {
            self.expect(Token::Colon)?;
            self.parse_type()?
        } else {
            Type::None
        };

        Some(Header {
            id,
            fpar_defs,
            ret_type,
            comp_id: RefCell::new(None),
            span: Span::DUMMY,
        })
    }

    /// Parameter groups are separated by `;`; within a group, `ref` (if
    /// present) and the type apply to every name in the comma-separated
    /// `id` list.
    fn parse_fpar_defs(&mut self) -> Option<Vec<FparDef>> {
        let mut out = Vec::new();
        if self.current_token() == Token::RParen {
            return Some(out);
        }

        loop {
            let by_reference = self.match_token(Token::Ref);
            let ids = self.parse_ident_list()?;
            self.expect(Token::Colon)?;
            let ty = self.parse_type()?;
            for id in ids {
                out.push(FparDef {
                    id,
                    param_type: ty.clone(),
                    by_reference,
                    span: Span::DUMMY,
                });
            }
            if !self.match_token(Token::Semicolon) {
                break;
            }
        }

        Some(out)
    }

    /// `var` id_list `:` type `;`, expanded into one `VarDef` per name.
    fn parse_var_def_group(&mut self) -> Option<Vec<VarDef>> {
        self.expect(Token::Var)?;
        let ids = self.parse_ident_list()?;
        self.expect(Token::Colon)?;
        let ty = self.parse_type()?;
        self.expect(Token::Semicolon)?;
        Some(
            ids.into_iter()
                .map(|id| VarDef {
                    id,
                    var_type: ty.clone(),
                    span: Span::DUMMY,
                })
                .collect(),
        )
    }

    fn parse_ident_list(&mut self) -> Option<Vec<Symbol>> {
        let mut out = vec![self.parse_ident()?];
        while self.match_token(Token::Comma) {
            out.push(self.parse_ident()?);
        }
        Some(out)
    }
}
