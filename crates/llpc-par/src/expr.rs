//! Expression and condition parsing.
//!
//! Expressions and conditions are separate grammars: `expr` produces an
//! `Int`/`Char` value via the usual addop/mulop precedence ladder, while
//! `cond` produces a boolean used only by `if`/`while` and never appears
//! where an `Expr` is expected. Precedence inside `cond`, tightest to
//! loosest, is `not` > `and` > `or`.

use std::cell::RefCell;

use llpc_lex::Token;
use llpc_util::Span;

use crate::ast::{BinOp, CallExpr, CompareOp, Cond, Expr, LValue, LValueKind, UnOp};
use crate::Parser;

impl<'a> Parser<'a> {
    pub fn parse_expr(&mut self) -> Option<Expr> {
        let mut lhs = self.parse_term()?;
        loop {
            let op = match self.current_token() {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_term()?;
            lhs = Expr::Binary(Box::new(lhs), op, Box::new(rhs), Span::DUMMY);
        }
        Some(lhs)
    }

    fn parse_term(&mut self) -> Option<Expr> {
        let mut lhs = self.parse_factor()?;
        loop {
            let op = match self.current_token() {
                Token::Star => BinOp::Mul,
                Token::Div => BinOp::Div,
                Token::Mod => BinOp::Mod,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_factor()?;
            lhs = Expr::Binary(Box::new(lhs), op, Box::new(rhs), Span::DUMMY);
        }
        Some(lhs)
    }

    fn parse_factor(&mut self) -> Option<Expr> {
        match self.current_token() {
            Token::Plus => {
                self.advance();
                Some(Expr::Signed(UnOp::Plus, Box::new(self.parse_factor()?), Span::DUMMY))
            },
            Token::Minus => {
                self.advance();
                Some(Expr::Signed(UnOp::Minus, Box::new(self.parse_factor()?), Span::DUMMY))
            },
            Token::IntLiteral(n) => {
                self.advance();
                Some(Expr::IntLiteral(n, Span::DUMMY))
            },
            Token::CharLiteral(c) => {
                self.advance();
                Some(Expr::CharLiteral(c, Span::DUMMY))
            },
            Token::StringLiteral(s) => {
                self.advance();
                let kind = self.parse_index_suffix(LValueKind::StringLit(s))?;
                Some(Expr::LValue(LValue {
                    kind,
                    lv_type: RefCell::new(None),
                    span: Span::DUMMY,
                }))
            },
            Token::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(Token::RParen)?;
                Some(Expr::Paren(Box::new(inner)))
            },
            Token::Ident(name) => {
                self.advance();
                if self.match_token(Token::LParen) {
                    let args = self.parse_call_args()?;
                    Some(Expr::Call(CallExpr {
                        callee: name,
                        args,
                        ret_type: RefCell::new(None),
                        resolved_comp_id: RefCell::new(None),
                        span: Span::DUMMY,
                    }))
                } else {
                    let kind = self.parse_index_suffix(LValueKind::Id(name))?;
                    Some(Expr::LValue(LValue {
                        kind,
                        lv_type: RefCell::new(None),
                        span: Span::DUMMY,
                    }))
                }
            },
            _ => {
                self.error("expected expression".to_string());
                None
            },
        }
    }

    /// `lvalue [ expr ] [ expr ] ...` — every `[`-`]` pair indexes one more
    /// dimension of the array being addressed.
    pub(crate) fn parse_index_suffix(&mut self, mut kind: LValueKind) -> Option<LValueKind> {
        while self.match_token(Token::LBracket) {
            let index = self.parse_expr()?;
            self.expect(Token::RBracket)?;
            kind = LValueKind::Index(Box::new(kind), Box::new(index));
        }
        Some(kind)
    }

    /// Parses the comma-separated argument list of a call, up to and
    /// including the closing `)` (the opening `(` is already consumed by the
    /// caller, which is the only way to tell a call from a bare lvalue).
    pub(crate) fn parse_call_args(&mut self) -> Option<Vec<Expr>> {
        let mut args = Vec::new();
        if self.current_token() != Token::RParen {
            args.push(self.parse_expr()?);
            while self.match_token(Token::Comma) {
                args.push(self.parse_expr()?);
            }
        }
        self.expect(Token::RParen)?;
        Some(args)
    }

    pub fn parse_cond(&mut self) -> Option<Cond> {
        let mut lhs = self.parse_cond_and()?;
        while self.match_token(Token::Or) {
            let rhs = self.parse_cond_and()?;
            lhs = Cond::Or(Box::new(lhs), Box::new(rhs), Span::DUMMY);
        }
        Some(lhs)
    }

    fn parse_cond_and(&mut self) -> Option<Cond> {
        let mut lhs = self.parse_cond_not()?;
        while self.match_token(Token::And) {
            let rhs = self.parse_cond_not()?;
            lhs = Cond::And(Box::new(lhs), Box::new(rhs), Span::DUMMY);
        }
        Some(lhs)
    }

    fn parse_cond_not(&mut self) -> Option<Cond> {
        if self.match_token(Token::Not) {
            let inner = self.parse_cond_not()?;
            return Some(Cond::Not(Box::new(inner), Span::DUMMY));
        }
        self.parse_cond_atom()
    }

    fn parse_cond_atom(&mut self) -> Option<Cond> {
        match self.current_token() {
            Token::True => {
                self.advance();
                return Some(Cond::Lit(true, Span::DUMMY));
            },
            Token::False => {
                self.advance();
                return Some(Cond::Lit(false, Span::DUMMY));
            },
            _ => {},
        }

        let lhs = self.parse_expr()?;
        let op = self.parse_compare_op()?;
        let rhs = self.parse_expr()?;
        Some(Cond::Compare(Box::new(lhs), op, Box::new(rhs), Span::DUMMY))
    }

    fn parse_compare_op(&mut self) -> Option<CompareOp> {
        let op = match self.current_token() {
            Token::Eq => CompareOp::Eq,
            Token::NotEq => CompareOp::Ne,
            Token::Lt => CompareOp::Lt,
            Token::Gt => CompareOp::Gt,
            Token::Le => CompareOp::Le,
            Token::Ge => CompareOp::Ge,
            _ => {
                self.error("expected a comparison operator".to_string());
                return None;
            },
        };
        self.advance();
        Some(op)
    }
}
