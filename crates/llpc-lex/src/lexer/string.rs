//! String and character literal lexing.
//!
//! No raw strings and no `\u{...}` escape: §3's escape set is `\n \t \r \0
//! \\ \' \" \xHH`.

use crate::token::Token;
use crate::Lexer;
use llpc_util::Symbol;

impl<'a> Lexer<'a> {
    /// Lexes a double-quoted string literal.
    pub fn lex_string(&mut self) -> Token {
        self.cursor.bump();

        let mut content = String::new();

        loop {
            if self.cursor.at_end() {
                self.report_error("unterminated string literal".to_string());
                break;
            }

            let c = self.cursor.peek();

            if c == '"' {
                self.cursor.bump();
                break;
            }

            if c == '\n' {
                self.report_error("unterminated string literal".to_string());
                break;
            }

            if c == '\\' {
                self.cursor.bump();
                if let Some(escaped) = self.parse_escape() {
                    content.push(escaped);
                }
            } else {
                content.push(c);
                self.cursor.bump();
            }
        }

        Token::StringLiteral(Symbol::intern(&content))
    }

    /// Lexes a single-quoted character literal.
    pub fn lex_char(&mut self) -> Token {
        self.cursor.bump();

        if self.cursor.at_end() {
            self.report_error("unterminated character literal".to_string());
            return Token::CharLiteral('\0');
        }

        let c = if self.cursor.peek() == '\\' {
            self.cursor.bump();
            self.parse_escape().unwrap_or('\0')
        } else {
            let c = self.cursor.peek();
            if c == '\'' || c == '\n' {
                self.report_error("empty character literal".to_string());
                return Token::CharLiteral('\0');
            }
            self.cursor.bump();
            c
        };

        if self.cursor.peek() != '\'' {
            self.report_error("unterminated character literal".to_string());
            while !self.cursor.at_end()
                && self.cursor.peek() != '\''
                && self.cursor.peek() != '\n'
            {
                self.cursor.bump();
            }
        } else {
            self.cursor.bump();
        }

        Token::CharLiteral(c)
    }

    /// Parses an escape sequence: `\n`, `\t`, `\r`, `\0`, `\\`, `\'`, `\"`,
    /// `\xHH`.
    pub fn parse_escape(&mut self) -> Option<char> {
        if self.cursor.at_end() {
            self.report_error("unterminated escape sequence".to_string());
            return None;
        }

        let c = self.cursor.peek();
        self.cursor.bump();

        match c {
            'n' => Some('\n'),
            't' => Some('\t'),
            'r' => Some('\r'),
            '\\' => Some('\\'),
            '"' => Some('"'),
            '\'' => Some('\''),
            '0' => Some('\0'),
            'x' => {
                let mut hex = String::new();
                for _ in 0..2 {
                    let h = self.cursor.peek();
                    if h.is_ascii_hexdigit() {
                        hex.push(h);
                        self.cursor.bump();
                    } else {
                        break;
                    }
                }
                match crate::unicode::parse_hex_byte(&hex) {
                    Some(b) => Some(b as char),
                    None => {
                        self.report_error("invalid hex escape sequence".to_string());
                        None
                    },
                }
            },
            _ => {
                self.report_error(format!("unknown escape sequence: \\{}", c));
                None
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use llpc_util::Handler;

    fn lex_str(source: &str) -> Token {
        let mut handler = Handler::new();
        let mut lexer = crate::Lexer::new(source, &mut handler);
        lexer.lex_string()
    }

    fn lex_char(source: &str) -> Token {
        let mut handler = Handler::new();
        let mut lexer = crate::Lexer::new(source, &mut handler);
        lexer.lex_char()
    }

    #[test]
    fn test_simple_string() {
        let token = lex_str("\"hello\"");
        assert_eq!(token, Token::StringLiteral(Symbol::intern("hello")));
    }

    #[test]
    fn test_string_with_escape() {
        let token = lex_str("\"hello\\nworld\"");
        assert_eq!(token, Token::StringLiteral(Symbol::intern("hello\nworld")));
    }

    #[test]
    fn test_empty_string() {
        let token = lex_str("\"\"");
        assert_eq!(token, Token::StringLiteral(Symbol::intern("")));
    }

    #[test]
    fn test_unterminated_string_reports_error() {
        let mut handler = Handler::new();
        let mut lexer = crate::Lexer::new("\"unterminated", &mut handler);
        let _ = lexer.lex_string();
        assert!(handler.has_errors());
    }

    #[test]
    fn test_character() {
        assert_eq!(lex_char("'a'"), Token::CharLiteral('a'));
    }

    #[test]
    fn test_character_escape() {
        assert_eq!(lex_char("'\\n'"), Token::CharLiteral('\n'));
    }

    #[test]
    fn test_character_hex_escape() {
        assert_eq!(lex_char("'\\x41'"), Token::CharLiteral('A'));
    }

    #[test]
    fn test_unterminated_char_reports_error() {
        let mut handler = Handler::new();
        let mut lexer = crate::Lexer::new("'x", &mut handler);
        let _ = lexer.lex_char();
        assert!(handler.has_errors());
    }
}
