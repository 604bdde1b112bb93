//! Type-annotation parsing and the identifier helper shared by every other
//! parsing module.

use llpc_lex::Token;
use llpc_util::Symbol;

use crate::ast::Type;
use crate::Parser;

impl<'a> Parser<'a> {
    /// `int` or `char`, followed by zero or more `[` `]` pairs.
    ///
    /// A bracket pair with a number inside (`[3]`) is a fixed dimension; an
    /// empty pair (`[]`) is the open-array sentinel and is only legal on a
    /// by-reference formal parameter — that restriction is a semantic check,
    /// not a syntactic one, so the parser accepts `[]` anywhere a dimension
    /// is allowed and leaves the rejection to `llpc-sem`.
    pub fn parse_type(&mut self) -> Option<Type> {
        let mut ty = match self.current_token() {
            Token::Int => {
                self.advance();
                Type::Int
            },
            Token::Char => {
                self.advance();
                Type::Char
            },
            _ => {
                self.error("expected type".to_string());
                return None;
            },
        };

        while self.match_token(Token::LBracket) {
            if self.match_token(Token::RBracket) {
                ty = Type::Array(Box::new(ty), Type::OPEN_ARRAY);
                continue;
            }
            let size = self.parse_array_size()?;
            self.expect(Token::RBracket)?;
            ty = Type::Array(Box::new(ty), size);
        }

        Some(ty)
    }

    fn parse_array_size(&mut self) -> Option<i64> {
        match self.current_token() {
            Token::IntLiteral(n) => {
                self.advance();
                Some(n)
            },
            _ => {
                self.error("expected array size".to_string());
                None
            },
        }
    }

    /// Parse a bare identifier, for use anywhere a name is expected (a
    /// declaration, an lvalue, a call target).
    pub fn parse_ident(&mut self) -> Option<Symbol> {
        match self.current_token() {
            Token::Ident(sym) => {
                self.advance();
                Some(sym)
            },
            _ => {
                self.error("expected identifier".to_string());
                None
            },
        }
    }
}
