//! Operator and punctuation lexing.
//!
//! This module handles lexing of the operators and delimiters in §3's
//! punctuation list: `( ) [ ] { } , ; : := = <> < > <= >= + - * / &`. The
//! single-character delimiters are dispatched directly in `core::next_token`;
//! this module covers everything that needs more than one character of
//! lookahead.

use crate::token::Token;
use crate::Lexer;

impl<'a> Lexer<'a> {
    /// Lexes `+`.
    pub fn lex_plus(&mut self) -> Token {
        self.cursor.bump();
        Token::Plus
    }

    /// Lexes `-`. A second `-` is a line comment and is handled by
    /// `skip_whitespace_and_comments` before `next_token` ever dispatches
    /// here, so this always sees a bare minus.
    pub fn lex_minus(&mut self) -> Token {
        self.cursor.bump();
        Token::Minus
    }

    /// Lexes `*`.
    pub fn lex_star(&mut self) -> Token {
        self.cursor.bump();
        Token::Star
    }

    /// Lexes `/`.
    pub fn lex_slash(&mut self) -> Token {
        self.cursor.bump();
        Token::Slash
    }

    /// Lexes `&`.
    pub fn lex_ampersand(&mut self) -> Token {
        self.cursor.bump();
        Token::Ampersand
    }

    /// Lexes `=`.
    pub fn lex_equals(&mut self) -> Token {
        self.cursor.bump();
        Token::Eq
    }

    /// Lexes `<`, `<=`, or `<>`.
    pub fn lex_less(&mut self) -> Token {
        self.cursor.bump();
        if self.cursor.eat('=') {
            Token::Le
        } else if self.cursor.eat('>') {
            Token::NotEq
        } else {
            Token::Lt
        }
    }

    /// Lexes `>` or `>=`.
    pub fn lex_greater(&mut self) -> Token {
        self.cursor.bump();
        if self.cursor.eat('=') {
            Token::Ge
        } else {
            Token::Gt
        }
    }

    /// Lexes `:` or `:=`.
    pub fn lex_colon(&mut self) -> Token {
        self.cursor.bump();
        if self.cursor.eat('=') {
            Token::Assign
        } else {
            Token::Colon
        }
    }
}
