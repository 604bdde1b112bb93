//! Edge case tests for the parser.

#[cfg(test)]
mod tests {
    use crate::ast::{Ast, CompareOp, Cond, Expr, LocalDef, Stmt, Type};
    use crate::Parser;
    use llpc_lex::{Lexer, Token};
    use llpc_util::Handler;

    fn parse_source(source: &str) -> (Option<Ast>, Handler) {
        let mut handler = Handler::new();
        let mut lexer = Lexer::new(source, &mut handler);
        let tokens: Vec<_> = std::iter::from_fn(|| Some(lexer.next_token()))
            .take_while(|t| *t != Token::Eof)
            .collect();
        let mut parser = Parser::new(tokens, &mut handler);
        let ast = parser.parse();
        (ast, handler)
    }

    fn ok(source: &str) -> Ast {
        let (ast, handler) = parse_source(source);
        assert!(!handler.has_errors(), "unexpected parse errors for: {source}");
        ast.expect("parser returned None without reporting an error")
    }

    #[test]
    fn test_edge_minimal_program() {
        let ast = ok("program p; begin end");
        let root = &ast.funcs[ast.root];
        assert_eq!(root.header.id, llpc_util::Symbol::intern("p"));
        assert!(root.local_defs.is_empty());
        assert!(root.body.is_empty());
    }

    #[test]
    fn test_edge_var_group_expands_per_name() {
        let ast = ok("program p; var a, b, c : int; begin end");
        let root = &ast.funcs[ast.root];
        assert_eq!(root.local_defs.len(), 3);
        for def in &root.local_defs {
            match def {
                LocalDef::VarDef(v) => assert_eq!(v.var_type, Type::Int),
                _ => panic!("expected a VarDef"),
            }
        }
    }

    #[test]
    fn test_edge_open_array_param() {
        let ast = ok("program p; procedure q(ref s : char[]) begin end begin end");
        let root = &ast.funcs[ast.root];
        let LocalDef::FuncDef(child_id) = &root.local_defs[0] else {
            panic!("expected a nested function definition");
        };
        let child = &ast.funcs[*child_id];
        let param = &child.header.fpar_defs[0];
        assert!(param.by_reference);
        assert_eq!(param.param_type, Type::Array(Box::new(Type::Char), Type::OPEN_ARRAY));
    }

    #[test]
    fn test_edge_fixed_array_param() {
        let ast = ok("program p; procedure q(ref s : int[10]) begin end begin end");
        let root = &ast.funcs[ast.root];
        let LocalDef::FuncDef(child_id) = &root.local_defs[0] else {
            panic!("expected a nested function definition");
        };
        let param = &ast.funcs[*child_id].header.fpar_defs[0];
        assert_eq!(param.param_type, Type::Array(Box::new(Type::Int), 10));
    }

    #[test]
    fn test_edge_forward_declaration_then_definition() {
        let ast = ok(
            "program p; \
             function f(x : int) : int; \
             function f(x : int) : int begin return x; end \
             begin end",
        );
        let root = &ast.funcs[ast.root];
        assert_eq!(root.local_defs.len(), 2);
        assert!(matches!(root.local_defs[0], LocalDef::FuncDecl(_)));
        assert!(matches!(root.local_defs[1], LocalDef::FuncDef(_)));
    }

    #[test]
    fn test_edge_nested_function_parent_link() {
        let ast = ok(
            "program p; \
             function outer() : int begin \
               function inner() : int begin return 1; end \
               return inner(); \
             end \
             begin end",
        );
        let root = &ast.funcs[ast.root];
        let LocalDef::FuncDef(outer_id) = &root.local_defs[0] else {
            panic!("expected outer to be a definition");
        };
        let outer_id = *outer_id;
        let outer = &ast.funcs[outer_id];
        let LocalDef::FuncDef(inner_id) = &outer.local_defs[0] else {
            panic!("expected inner to be a definition");
        };
        let inner_id = *inner_id;
        assert_eq!(ast.funcs[inner_id].parent_func.get(), Some(outer_id));
        assert_eq!(outer.parent_func.get(), Some(ast.root));
    }

    #[test]
    fn test_edge_arithmetic_precedence() {
        let ast = ok("program p; var x : int; begin x := 1 + 2 * 3; end");
        let Stmt::Assign(_, Expr::Binary(lhs, op, rhs, _), _) = &ast.funcs[ast.root].body[0] else {
            panic!("expected an assignment of a binary expression");
        };
        assert!(matches!(**lhs, Expr::IntLiteral(1, _)));
        assert_eq!(*op, crate::ast::BinOp::Add);
        assert!(matches!(**rhs, Expr::Binary(..)));
    }

    #[test]
    fn test_edge_div_mod_keywords() {
        let ast = ok("program p; var x : int; begin x := 7 div 2 mod 3; end");
        assert!(matches!(ast.funcs[ast.root].body[0], Stmt::Assign(..)));
    }

    #[test]
    fn test_edge_unary_sign() {
        let ast = ok("program p; var x : int; begin x := -x + +x; end");
        assert!(matches!(ast.funcs[ast.root].body[0], Stmt::Assign(..)));
    }

    #[test]
    fn test_edge_indexed_lvalue() {
        let ast = ok("program p; var a : int[10]; begin a[0] := a[1]; end");
        let Stmt::Assign(lvalue, _, _) = &ast.funcs[ast.root].body[0] else {
            panic!("expected an assignment");
        };
        assert!(matches!(lvalue.kind, crate::ast::LValueKind::Index(..)));
    }

    #[test]
    fn test_edge_call_statement_vs_call_expr() {
        let ast = ok("program p; var x : int; begin writeInteger(1); x := ascii('a'); end");
        assert!(matches!(ast.funcs[ast.root].body[0], Stmt::Call(_)));
        let Stmt::Assign(_, Expr::Call(_), _) = &ast.funcs[ast.root].body[1] else {
            panic!("expected an assignment of a call");
        };
    }

    #[test]
    fn test_edge_if_else() {
        let ast = ok("program p; var x : int; begin if (x = 1) then x := 2; else x := 3; end");
        assert!(matches!(ast.funcs[ast.root].body[0], Stmt::If(_, _, Some(_), _)));
    }

    #[test]
    fn test_edge_if_without_else() {
        let ast = ok("program p; var x : int; begin if (x <> 1) then x := 2; end");
        assert!(matches!(ast.funcs[ast.root].body[0], Stmt::If(_, _, None, _)));
    }

    #[test]
    fn test_edge_while_loop() {
        let ast = ok("program p; var x : int; begin while (x < 10) do x := x + 1; end");
        assert!(matches!(ast.funcs[ast.root].body[0], Stmt::While(..)));
    }

    #[test]
    fn test_edge_compare_operators() {
        for (src, expected) in [
            ("x = 1", CompareOp::Eq),
            ("x <> 1", CompareOp::Ne),
            ("x < 1", CompareOp::Lt),
            ("x > 1", CompareOp::Gt),
            ("x <= 1", CompareOp::Le),
            ("x >= 1", CompareOp::Ge),
        ] {
            let source = format!("program p; var x : int; begin while ({src}) do ; end");
            let ast = ok(&source);
            let Stmt::While(Cond::Compare(_, op, _, _), _, _) = &ast.funcs[ast.root].body[0] else {
                panic!("expected a comparison condition for {src}");
            };
            assert_eq!(*op, expected, "wrong operator for {src}");
        }
    }

    #[test]
    fn test_edge_and_or_not_precedence() {
        let ast = ok("program p; var x, y : int; begin while (not x = 0 and y = 0 or x = 1) do ; end");
        let Stmt::While(cond, _, _) = &ast.funcs[ast.root].body[0] else {
            panic!("expected a while statement");
        };
        assert!(matches!(cond, Cond::Or(..)));
    }

    #[test]
    fn test_edge_boolean_literal_condition() {
        let ast = ok("program p; begin while (true) do ; end");
        assert!(matches!(
            ast.funcs[ast.root].body[0],
            Stmt::While(Cond::Lit(true, _), _, _)
        ));
    }

    #[test]
    fn test_edge_empty_statement() {
        let ast = ok("program p; begin ; ; end");
        assert_eq!(ast.funcs[ast.root].body.len(), 2);
        assert!(ast.funcs[ast.root].body.iter().all(|s| matches!(s, Stmt::Empty(_))));
    }

    #[test]
    fn test_edge_nested_block_statement() {
        let ast = ok("program p; begin begin end end");
        assert!(matches!(ast.funcs[ast.root].body[0], Stmt::Block(..)));
    }

    #[test]
    fn test_edge_return_with_and_without_value() {
        let ast = ok("program p; function f() : int begin return 1; end begin end");
        let LocalDef::FuncDef(id) = &ast.funcs[ast.root].local_defs[0] else {
            panic!("expected a function definition");
        };
        assert!(matches!(ast.funcs[*id].body[0], Stmt::Return(Some(_), _)));

        let ast = ok("program p; procedure f() begin return; end begin end");
        let LocalDef::FuncDef(id) = &ast.funcs[ast.root].local_defs[0] else {
            panic!("expected a function definition");
        };
        assert!(matches!(ast.funcs[*id].body[0], Stmt::Return(None, _)));
    }

    #[test]
    fn test_edge_string_literal_is_indexable() {
        let ast = ok(r#"program p; var c : char; begin c := "hi"[0]; end"#);
        let Stmt::Assign(_, Expr::LValue(lv), _) = &ast.funcs[ast.root].body[0] else {
            panic!("expected an assignment of an lvalue");
        };
        assert!(matches!(lv.kind, crate::ast::LValueKind::Index(..)));
    }

    #[test]
    fn test_edge_multiple_fpar_groups() {
        let ast = ok("program p; function f(x : int; ref s : char[]) : int begin return x; end begin end");
        let LocalDef::FuncDef(id) = &ast.funcs[ast.root].local_defs[0] else {
            panic!("expected a function definition");
        };
        assert_eq!(ast.funcs[*id].header.fpar_defs.len(), 2);
    }

    #[test]
    fn test_err_missing_end_reports_error() {
        let (_, handler) = parse_source("program p; begin");
        assert!(handler.has_errors());
    }

    #[test]
    fn test_err_missing_semicolon_after_program_header() {
        let (_, handler) = parse_source("program p begin end");
        assert!(handler.has_errors());
    }

    #[test]
    fn test_err_unknown_statement_start_reports_error() {
        let (_, handler) = parse_source("program p; begin + end");
        assert!(handler.has_errors());
    }

    #[test]
    fn test_err_malformed_condition_reports_error() {
        let (_, handler) = parse_source("program p; begin if (1 +) then ; end");
        assert!(handler.has_errors());
    }
}
