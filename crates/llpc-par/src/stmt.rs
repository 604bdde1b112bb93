//! Statement parsing: assignment, call, block, if/else, while, return, empty.

use std::cell::RefCell;

use llpc_lex::Token;
use llpc_util::Span;

use crate::ast::{Block, CallExpr, LValue, LValueKind, Stmt};
use crate::Parser;

impl<'a> Parser<'a> {
    /// `begin` `stmt`* `end`. Each non-compound statement consumes its own
    /// trailing `;`, so there is no separator logic here.
    pub fn parse_block(&mut self) -> Option<Block> {
        self.expect(Token::Begin)?;
        let mut stmts = Vec::new();
        while self.current_token() != Token::End && !self.is_at_end() {
            stmts.push(self.parse_stmt()?);
        }
        self.expect(Token::End)?;
        Some(stmts)
    }

    pub fn parse_stmt(&mut self) -> Option<Stmt> {
        match self.current_token() {
            Token::Semicolon => {
                self.advance();
                Some(Stmt::Empty(Span::DUMMY))
            },
            Token::Begin => {
                let body = self.parse_block()?;
                Some(Stmt::Block(body, Span::DUMMY))
            },
            Token::If => self.parse_if_stmt(),
            Token::While => self.parse_while_stmt(),
            Token::Return => self.parse_return_stmt(),
            Token::Ident(_) => self.parse_assign_or_call_stmt(),
            _ => {
                self.error("expected statement".to_string());
                None
            },
        }
    }

    fn parse_if_stmt(&mut self) -> Option<Stmt> {
        self.expect(Token::If)?;
        self.expect(Token::LParen)?;
        let cond = self.parse_cond()?;
        self.expect(Token::RParen)?;
        self.expect(Token::Then)?;
        let then_branch = Box::new(self.parse_stmt()?);
        let else_branch = if self.match_token(Token::Else) {
            Some(Box::new(self.parse_stmt()?))
        } else {
            None
        };
        Some(Stmt::If(cond, then_branch, else_branch, Span::DUMMY))
    }

    fn parse_while_stmt(&mut self) -> Option<Stmt> {
        self.expect(Token::While)?;
        self.expect(Token::LParen)?;
        let cond = self.parse_cond()?;
        self.expect(Token::RParen)?;
        self.expect(Token::Do)?;
        let body = Box::new(self.parse_stmt()?);
        Some(Stmt::While(cond, body, Span::DUMMY))
    }

    fn parse_return_stmt(&mut self) -> Option<Stmt> {
        self.expect(Token::Return)?;
        let value = if self.current_token() == Token::Semicolon {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(Token::Semicolon)?;
        Some(Stmt::Return(value, Span::DUMMY))
    }

    /// An identifier starts either an assignment (`lvalue := expr;`) or a
    /// call statement (`id(args);`); only the token right after the
    /// identifier tells them apart.
    fn parse_assign_or_call_stmt(&mut self) -> Option<Stmt> {
        let id = self.parse_ident()?;
        if self.match_token(Token::LParen) {
            let args = self.parse_call_args()?;
            self.expect(Token::Semicolon)?;
            return Some(Stmt::Call(CallExpr {
                callee: id,
                args,
                ret_type: RefCell::new(None),
                resolved_comp_id: RefCell::new(None),
                span: Span::DUMMY,
            }));
        }

        let kind = self.parse_index_suffix(LValueKind::Id(id))?;
        self.expect(Token::Assign)?;
        let value = self.parse_expr()?;
        self.expect(Token::Semicolon)?;
        Some(Stmt::Assign(
            LValue {
                kind,
                lv_type: RefCell::new(None),
                span: Span::DUMMY,
            },
            value,
            Span::DUMMY,
        ))
    }
}
