//! Edge case tests for IR emission, driven end-to-end through the lexer,
//! parser, semantic analyzer, and frame planner so each test emits IR for a
//! real program. None of these run the emitted IR (no toolchain available
//! here): they assert on the structure of the printed module text instead.

#[cfg(test)]
mod tests {
    use inkwell::context::Context;
    use inkwell::OptimizationLevel;

    use llpc_lex::{Lexer, Token};
    use llpc_util::Handler;

    fn compile_source(source: &str) -> String {
        let mut handler = Handler::new();
        let mut lexer = Lexer::new(source, &mut handler);
        let tokens: Vec<_> = std::iter::from_fn(|| Some(lexer.next_token()))
            .take_while(|t| *t != Token::Eof)
            .collect();
        let ast = llpc_par::Parser::new(tokens, &mut handler).parse().expect("program should parse");
        llpc_sem::analyze(&ast, &mut handler);
        assert!(!handler.has_errors(), "unexpected semantic errors for: {source}");
        let frames = llpc_frame::plan(&ast);

        let context = Context::create();
        let codegen = crate::emit(&context, &ast, &frames, "test_module", "x86_64-unknown-linux-gnu".to_string(), OptimizationLevel::None)
            .expect("codegen should succeed on a semantically clean program");
        codegen.emit_llvm_ir()
    }

    #[test]
    fn test_edge_empty_program_emits_root_function() {
        let ir = compile_source("program p; begin end");
        assert!(ir.contains("define void @p("));
    }

    #[test]
    fn test_edge_runtime_library_declared_as_externs() {
        let ir = compile_source("program p; begin writeInteger(1) end");
        assert!(ir.contains("declare void @writeInteger"));
    }

    #[test]
    fn test_edge_nested_function_has_access_link_parameter() {
        let source = "program p; procedure q() begin writeInteger(1) end begin q() end";
        let ir = compile_source(source);
        // the nested function's first parameter is the access link, typed as
        // an opaque pointer with no corresponding source parameter.
        assert!(ir.contains("define void @"));
        assert!(ir.contains("ptr"));
    }

    #[test]
    fn test_edge_local_variable_gets_a_frame_slot() {
        let source = "program p; var x : int; begin x := 1; writeInteger(x) end";
        let ir = compile_source(source);
        assert!(ir.contains("%frame_p = type"));
    }

    #[test]
    fn test_edge_function_with_return_value_compiles() {
        let source = "function f() : int; begin return 1 end program p; begin writeInteger(f()) end";
        let ir = compile_source(source);
        assert!(ir.contains("ret i64"));
    }

    #[test]
    fn test_edge_if_else_emits_both_branches() {
        let source = "program p; var x : int; begin x := 1; if (x = 1) writeInteger(1) else writeInteger(0) end";
        let ir = compile_source(source);
        assert!(ir.contains("if_then"));
        assert!(ir.contains("if_else"));
    }

    #[test]
    fn test_edge_while_loop_emits_backedge() {
        let source = "program p; var x : int; begin x := 0; while (x < 10) x := x + 1 end";
        let ir = compile_source(source);
        assert!(ir.contains("while_cond"));
        assert!(ir.contains("while_body"));
    }

    #[test]
    fn test_edge_short_circuit_and_emits_merge_block() {
        let source = "program p; var x : int; begin x := 1; if (x > 0 and x < 10) writeInteger(1) end";
        let ir = compile_source(source);
        assert!(ir.contains("cond_merge_"));
    }

    #[test]
    fn test_edge_array_local_gets_backing_allocation() {
        let source = "program p; var a : array [10] of int; begin a[0] := 1; writeInteger(a[0]) end";
        let ir = compile_source(source);
        assert!(ir.contains("_storage"));
    }

    #[test]
    fn test_edge_string_literal_becomes_global_constant() {
        let source = "program p; begin writeString(\"hi\") end";
        let ir = compile_source(source);
        assert!(ir.contains("@str") || ir.contains("c\"hi"));
    }

    #[test]
    fn test_edge_by_reference_parameter_is_a_pointer() {
        let source = "procedure inc(ref x : int) begin x := x + 1 end program p; var y : int; begin y := 0; inc(y) end";
        let ir = compile_source(source);
        assert!(ir.contains("define void @"));
    }

    #[test]
    fn test_edge_deeply_nested_function_walks_multiple_access_links() {
        let source = "program p; var a : int; \
                       procedure q() \
                         var b : int; \
                         procedure r() begin a := 1; b := 2 end \
                       begin r() end \
                     begin q() end";
        let ir = compile_source(source);
        assert!(ir.contains("define void @"));
    }

    #[test]
    fn test_edge_recompiling_the_same_ast_is_deterministic() {
        let source = "program p; var x : int; begin x := 1; writeInteger(x) end";
        let ir1 = compile_source(source);
        let ir2 = compile_source(source);
        assert_eq!(ir1, ir2);
    }
}
