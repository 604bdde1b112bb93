//! Recursive-descent parser.
//!
//! Grammar is split by concern across sibling modules the way `lexer/` is
//! split in `llpc-lex`: [`items`] has headers, parameter/variable groups and
//! function-definition wiring; [`stmt`] has the statement grammar; [`expr`]
//! has the `Expr` and `Cond` grammars; [`types`] has type annotations and
//! the shared identifier helper. This file owns the `Parser` struct itself
//! and the token-stream primitives every other module calls into.

use llpc_lex::Token;
use llpc_util::diagnostic::DiagnosticBuilder;
use llpc_util::index_vec::IndexVec;
use llpc_util::{Handler, Span};

pub mod ast;
mod expr;
mod items;
mod stmt;
mod types;

#[cfg(test)]
mod edge_cases;

pub use ast::Ast;

/// Parses a full token stream into an [`Ast`]. Returns `None` if the program
/// header itself could not be parsed; the partial arena built up to that
/// point is discarded along with it, matching §7's "no local recovery past a
/// fatal error" rule at the top level.
pub fn parse(tokens: Vec<Token>, handler: &mut Handler) -> Option<Ast> {
    Parser::new(tokens, handler).parse()
}

pub struct Parser<'a> {
    tokens: Vec<Token>,
    position: usize,
    prev_position: usize,
    handler: &'a mut Handler,
    funcs: IndexVec<ast::FuncId, ast::FuncDef>,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<Token>, handler: &'a mut Handler) -> Self {
        Self {
            tokens,
            position: 0,
            prev_position: 0,
            handler,
            funcs: IndexVec::new(),
        }
    }

    pub fn parse(&mut self) -> Option<Ast> {
        let root = self.parse_program()?;
        if !self.is_at_end() {
            self.error(format!("unexpected trailing token {:?}", self.current_token()));
        }
        Some(Ast {
            funcs: std::mem::take(&mut self.funcs),
            root,
        })
    }

    pub(crate) fn current_token(&self) -> Token {
        self.tokens.get(self.position).cloned().unwrap_or(Token::Eof)
    }

    pub(crate) fn is_at_end(&self) -> bool {
        matches!(self.current_token(), Token::Eof)
    }

    pub(crate) fn advance(&mut self) {
        if !self.is_at_end() {
            self.prev_position = self.position;
            self.position += 1;
        }
    }

    pub(crate) fn expect(&mut self, expected: Token) -> Option<()> {
        if self.current_token() == expected {
            self.advance();
            Some(())
        } else {
            self.error(format!("expected {:?}, found {:?}", expected, self.current_token()));
            None
        }
    }

    pub(crate) fn match_token(&mut self, expected: Token) -> bool {
        if self.current_token() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Token streams from `llpc-lex` carry no span of their own (see
    /// `Lexer`'s `Iterator<Item = Token>` impl), so every node built here
    /// gets a placeholder span; only the token identity matters to parsing.
    pub(crate) fn current_span(&self) -> Span {
        Span::DUMMY
    }

    pub(crate) fn span_from_start(&self, _start: usize) -> Span {
        Span::DUMMY
    }

    /// Reports a syntax error. Per §7, there is no local recovery: the
    /// caller's `?` chain unwinds to `parse_program`'s top-level `None`,
    /// which aborts parsing of this source entirely.
    pub(crate) fn error(&mut self, message: String) {
        DiagnosticBuilder::error(message).span(self.current_span()).emit(self.handler);
    }
}
