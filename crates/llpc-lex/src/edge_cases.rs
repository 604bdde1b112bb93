//! Edge case tests for llpc-lex

#[cfg(test)]
mod tests {
    use crate::{Lexer, Token};
    use llpc_util::Handler;

    fn lex_all(source: &str) -> Vec<Token> {
        let mut handler = Handler::new();
        let mut lexer = Lexer::new(source, &mut handler);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            if token == Token::Eof {
                break;
            }
            tokens.push(token);
        }
        tokens
    }

    #[test]
    fn test_edge_empty_source() {
        assert!(lex_all("").is_empty());
    }

    #[test]
    fn test_edge_single_char_ident() {
        let t = lex_all("x");
        assert_eq!(t[0], Token::Ident(llpc_util::Symbol::intern("x")));
    }

    #[test]
    fn test_edge_long_identifier() {
        let name = "a".repeat(10000);
        let t = lex_all(&format!("var {}: int;", name));
        assert!(t.contains(&Token::Ident(llpc_util::Symbol::intern(&name))));
    }

    #[test]
    fn test_edge_keywords_not_idents() {
        let t = lex_all("program var");
        assert_eq!(t[0], Token::Program);
        assert_eq!(t[1], Token::Var);
    }

    #[test]
    fn test_edge_empty_string() {
        let t = lex_all("\"\"");
        if let Token::StringLiteral(s) = &t[0] {
            assert_eq!(s.as_str(), "");
        } else {
            panic!("expected StringLiteral, got {:?}", t[0]);
        }
    }

    #[test]
    fn test_edge_all_relational_operators() {
        let t = lex_all("= <> < > <= >=");
        assert_eq!(
            t,
            vec![Token::Eq, Token::NotEq, Token::Lt, Token::Gt, Token::Le, Token::Ge]
        );
    }

    #[test]
    fn test_edge_all_delimiters() {
        let t = lex_all("( ) [ ] { } , ; : :=");
        assert_eq!(
            t,
            vec![
                Token::LParen,
                Token::RParen,
                Token::LBracket,
                Token::RBracket,
                Token::LBrace,
                Token::RBrace,
                Token::Comma,
                Token::Semicolon,
                Token::Colon,
                Token::Assign,
            ]
        );
    }

    #[test]
    fn test_edge_nested_parens() {
        let t = lex_all("((()))");
        assert_eq!(t.iter().filter(|x| **x == Token::LParen).count(), 3);
    }

    #[test]
    fn test_edge_case_sensitivity() {
        let t = lex_all("If if");
        assert_eq!(t[0], Token::Ident(llpc_util::Symbol::intern("If")));
        assert_eq!(t[1], Token::If);
    }

    #[test]
    fn test_edge_bools() {
        let t = lex_all("true false");
        assert_eq!(t[0], Token::True);
        assert_eq!(t[1], Token::False);
    }

    #[test]
    fn test_edge_max_int() {
        let t = lex_all("9223372036854775807");
        assert_eq!(t[0], Token::IntLiteral(9223372036854775807));
    }

    #[test]
    fn test_edge_all_keywords() {
        let t = lex_all(
            "program function procedure var begin end if then else while do \
             not and or div mod ref true false return int char",
        );
        assert_eq!(t.len(), 22);
        assert_eq!(t[0], Token::Program);
        assert_eq!(t[21], Token::Char);
    }

    #[test]
    fn test_edge_comment_then_more_code() {
        let t = lex_all("var x: int; -- trailing remark\nvar y: int;");
        assert_eq!(t[0], Token::Var);
        assert!(t.contains(&Token::Ident(llpc_util::Symbol::intern("y"))));
    }

    // ==================== ERROR CASES ====================

    #[test]
    fn test_err_unterminated_string() {
        let mut h = Handler::new();
        let _ = Lexer::new("\"unterminated", &mut h).next_token();
        assert!(h.has_errors());
    }

    #[test]
    fn test_err_empty_char() {
        let mut h = Handler::new();
        let t = Lexer::new("''", &mut h).next_token();
        assert!(matches!(t, Token::CharLiteral(_)));
        assert!(h.has_errors());
    }

    #[test]
    fn test_err_unterminated_char() {
        let mut h = Handler::new();
        let _ = Lexer::new("'x", &mut h).next_token();
        assert!(h.has_errors());
    }

    #[test]
    fn test_err_invalid_chars() {
        let mut h = Handler::new();
        let mut lex = Lexer::new("@#$%", &mut h);
        while lex.next_token() != Token::Eof {}
        assert!(h.has_errors());
    }

    #[test]
    fn test_err_mixed_valid_invalid() {
        let mut h = Handler::new();
        let mut lex = Lexer::new("var x # int;", &mut h);
        while lex.next_token() != Token::Eof {}
        assert!(h.has_errors());
    }

    #[test]
    fn test_edge_whitespace_variations() {
        let t = lex_all("var\tx\n:\nint");
        assert!(t.contains(&Token::Var));
        assert!(t.contains(&Token::Int));
    }
}
