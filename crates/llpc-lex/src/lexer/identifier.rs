//! Identifier and keyword lexing.

use crate::token::{keyword_from_ident, Token};
use crate::unicode::is_ascii_ident_continue;
use crate::Lexer;
use llpc_util::Symbol;

impl<'a> Lexer<'a> {
    /// Lexes an identifier or keyword starting at the cursor's current
    /// position (the caller has already confirmed the first character is a
    /// valid identifier start).
    pub fn lex_identifier(&mut self) -> Token {
        while is_ascii_ident_continue(self.cursor.peek()) {
            self.cursor.bump();
        }
        let text = self.cursor.text_since(self.token_start);
        keyword_from_ident(text).unwrap_or_else(|| Token::Ident(Symbol::intern(text)))
    }
}
