//! Number literal lexing.
//!
//! This language has only decimal integer literals (§3); no hex/binary/octal
//! prefixes and no floating point.

use crate::token::Token;
use crate::Lexer;

impl<'a> Lexer<'a> {
    /// Lexes a decimal integer literal.
    pub fn lex_number(&mut self) -> Token {
        let start = self.cursor.byte_offset();

        while self.cursor.peek().is_ascii_digit() {
            self.cursor.bump();
        }

        let text = self.cursor.text_since(start);
        match text.parse::<i64>() {
            Ok(value) => Token::IntLiteral(value),
            Err(e) => {
                self.report_error(format!("integer literal '{}' out of range: {}", text, e));
                Token::IntLiteral(0)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use llpc_util::Handler;

    fn lex_num(source: &str) -> Token {
        let mut handler = Handler::new();
        let mut lexer = crate::Lexer::new(source, &mut handler);
        lexer.lex_number()
    }

    #[test]
    fn test_decimal_integer() {
        assert_eq!(lex_num("42"), Token::IntLiteral(42));
        assert_eq!(lex_num("0"), Token::IntLiteral(0));
        assert_eq!(lex_num("123456"), Token::IntLiteral(123456));
    }

    #[test]
    fn test_leading_zeros() {
        assert_eq!(lex_num("007"), Token::IntLiteral(7));
    }

    #[test]
    fn test_overflow_reports_error() {
        let mut handler = Handler::new();
        let mut lexer = crate::Lexer::new("99999999999999999999999999", &mut handler);
        let _ = lexer.lex_number();
        assert!(handler.has_errors());
    }
}
