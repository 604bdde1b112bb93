//! Edge case tests for semantic analysis, driven end-to-end through the
//! lexer and parser so each test reads like a small program rather than a
//! hand-built tree.

#[cfg(test)]
mod tests {
    use llpc_lex::{Lexer, Token};
    use llpc_par::ast::{Ast, LocalDef};
    use llpc_util::Handler;

    fn analyze_source(source: &str) -> (Ast, Handler) {
        let mut handler = Handler::new();
        let mut lexer = Lexer::new(source, &mut handler);
        let tokens: Vec<_> = std::iter::from_fn(|| Some(lexer.next_token()))
            .take_while(|t| *t != Token::Eof)
            .collect();
        let ast = llpc_par::Parser::new(tokens, &mut handler)
            .parse()
            .expect("program should parse");
        crate::analyze(&ast, &mut handler);
        (ast, handler)
    }

    #[test]
    fn test_edge_minimal_program_has_no_errors() {
        let (_, handler) = analyze_source("program p; begin end");
        assert!(!handler.has_errors());
    }

    #[test]
    fn test_edge_forward_declaration_links_to_definition() {
        let (ast, handler) = analyze_source(
            "program p; \
             function f(x : int) : int; \
             function f(x : int) : int begin return x; end \
             begin end",
        );
        assert!(!handler.has_errors());
        let LocalDef::FuncDecl(decl) = &ast.funcs[ast.root].local_defs[0] else {
            panic!("expected a forward declaration");
        };
        assert!(decl.func_def.borrow().is_some());
        assert!(!decl.is_redundant.get());
    }

    #[test]
    fn test_edge_redundant_forward_declaration_warns_not_errors() {
        let (ast, handler) = analyze_source(
            "program p; \
             function f(x : int) : int; \
             function f(x : int) : int; \
             function f(x : int) : int begin return x; end \
             begin end",
        );
        assert!(!handler.has_errors());
        let LocalDef::FuncDecl(second_decl) = &ast.funcs[ast.root].local_defs[1] else {
            panic!("expected the second forward declaration");
        };
        assert!(second_decl.is_redundant.get());
    }

    #[test]
    fn test_edge_declared_but_never_defined_is_fatal() {
        let (_, handler) = analyze_source("program p; function f(x : int) : int; begin end");
        assert!(handler.has_errors());
    }

    #[test]
    fn test_edge_open_array_parameter_accepts_fixed_array_argument() {
        let (_, handler) = analyze_source(
            "program p; \
             var buf : char[10]; \
             procedure consume(ref s : char[]) begin end \
             begin consume(buf); end",
        );
        assert!(!handler.has_errors(), "open array param should accept a fixed array lvalue");
    }

    #[test]
    fn test_edge_redeclaration_with_different_param_types_is_fatal() {
        let (_, handler) = analyze_source(
            "program p; \
             function f(x : int) : int; \
             function f(x : char) : int begin return 0; end \
             begin end",
        );
        assert!(handler.has_errors());
    }

    #[test]
    fn test_edge_function_name_collides_with_variable() {
        let (_, handler) = analyze_source(
            "program p; \
             var f : int; \
             function f() : int begin return 0; end \
             begin end",
        );
        assert!(handler.has_errors());
    }

    #[test]
    fn test_edge_duplicate_parameter_name_is_fatal() {
        let (_, handler) = analyze_source("program p; procedure q(x : int; x : char) begin end begin end");
        assert!(handler.has_errors());
    }

    #[test]
    fn test_edge_duplicate_local_variable_is_fatal() {
        let (_, handler) = analyze_source("program p; var x : int; var x : char; begin end");
        assert!(handler.has_errors());
    }

    #[test]
    fn test_edge_local_variable_collides_with_parameter() {
        let (_, handler) = analyze_source("program p; procedure q(x : int) var x : int; begin end begin end");
        assert!(handler.has_errors());
    }

    #[test]
    fn test_edge_assignment_type_mismatch_is_fatal() {
        let (_, handler) = analyze_source("program p; var x : int; var c : char; begin x := c; end");
        assert!(handler.has_errors());
    }

    #[test]
    fn test_edge_assignment_between_int_and_char_without_coercion_is_fatal() {
        let (_, handler) = analyze_source("program p; var x : int; begin x := 'a'; end");
        assert!(handler.has_errors());
    }

    #[test]
    fn test_edge_cannot_assign_to_string_literal_element() {
        let (_, handler) = analyze_source(r#"program p; begin "hi"[0] := 'x'; end"#);
        assert!(handler.has_errors());
    }

    #[test]
    fn test_edge_return_type_mismatch_is_fatal() {
        let (_, handler) = analyze_source("program p; function f() : int begin return; end begin end");
        assert!(handler.has_errors());
    }

    #[test]
    fn test_edge_missing_return_on_some_path_is_fatal() {
        let (_, handler) =
            analyze_source("program p; var x : int; function f() : int begin if (x = 1) then return 1; end begin end");
        assert!(handler.has_errors());
    }

    #[test]
    fn test_edge_if_else_both_returning_same_type_is_ok() {
        let (_, handler) = analyze_source(
            "program p; var x : int; \
             function f() : int begin if (x = 1) then return 1; else return 2; end \
             begin end",
        );
        assert!(!handler.has_errors());
    }

    #[test]
    fn test_edge_undefined_identifier_is_fatal() {
        let (_, handler) = analyze_source("program p; begin y := 1; end");
        assert!(handler.has_errors());
    }

    #[test]
    fn test_edge_call_wrong_argument_count_is_fatal() {
        let (_, handler) = analyze_source("program p; begin writeInteger(1, 2); end");
        assert!(handler.has_errors());
    }

    #[test]
    fn test_edge_by_reference_argument_must_be_lvalue() {
        let (_, handler) = analyze_source(
            "program p; \
             procedure q(ref x : int) begin end \
             begin q(1 + 2); end",
        );
        assert!(handler.has_errors());
    }

    #[test]
    fn test_edge_array_index_constant_out_of_bounds_is_fatal() {
        let (_, handler) = analyze_source("program p; var a : int[4]; var x : int; begin x := a[10]; end");
        assert!(handler.has_errors());
    }

    #[test]
    fn test_edge_array_index_in_bounds_is_ok() {
        let (_, handler) = analyze_source("program p; var a : int[4]; var x : int; begin x := a[3]; end");
        assert!(!handler.has_errors());
    }

    #[test]
    fn test_edge_while_true_without_return_warns_but_does_not_error() {
        let (_, handler) = analyze_source("program p; procedure q() begin while (true) do ; end begin end");
        assert!(!handler.has_errors());
    }

    #[test]
    fn test_edge_comp_id_differs_for_same_named_nested_functions() {
        let (ast, handler) = analyze_source(
            "program p; \
             function outer1() : int begin \
               function helper() : int begin return 1; end \
               return helper(); \
             end \
             function outer2() : int begin \
               function helper() : int begin return 2; end \
               return helper(); \
             end \
             begin end",
        );
        assert!(!handler.has_errors());

        let find_helper_comp_id = |outer_index: usize| {
            let LocalDef::FuncDef(outer_id) = &ast.funcs[ast.root].local_defs[outer_index] else {
                panic!("expected a function definition");
            };
            let outer = &ast.funcs[*outer_id];
            let LocalDef::FuncDef(helper_id) = &outer.local_defs[0] else {
                panic!("expected a nested function definition");
            };
            ast.funcs[*helper_id].header.comp_id.borrow().unwrap()
        };

        assert_ne!(find_helper_comp_id(0), find_helper_comp_id(1));
    }

    #[test]
    fn test_edge_reanalysis_is_idempotent() {
        let mut handler = Handler::new();
        let mut lexer = Lexer::new(
            "program p; function f(x : int) : int begin return x; end begin end",
            &mut handler,
        );
        let tokens: Vec<_> = std::iter::from_fn(|| Some(lexer.next_token()))
            .take_while(|t| *t != Token::Eof)
            .collect();
        let ast = llpc_par::Parser::new(tokens, &mut handler).parse().unwrap();

        crate::analyze(&ast, &mut handler);
        let LocalDef::FuncDef(f_id) = &ast.funcs[ast.root].local_defs[0] else {
            panic!("expected a function definition");
        };
        let first_comp_id = ast.funcs[*f_id].header.comp_id.borrow().unwrap();

        crate::analyze(&ast, &mut handler);
        let second_comp_id = ast.funcs[*f_id].header.comp_id.borrow().unwrap();

        assert_eq!(first_comp_id, second_comp_id);
    }
}
