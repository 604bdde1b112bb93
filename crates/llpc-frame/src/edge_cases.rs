//! Edge case tests for stack-frame planning, driven end-to-end through the
//! lexer, parser, and semantic analyzer so each test plans a real program.

#[cfg(test)]
mod tests {
    use llpc_lex::{Lexer, Token};
    use llpc_par::ast::{Ast, LocalDef};
    use llpc_util::Handler;

    fn plan_source(source: &str) -> (Ast, llpc_util::index_vec::IndexVec<llpc_par::ast::FrameId, crate::StackFrame>) {
        let mut handler = Handler::new();
        let mut lexer = Lexer::new(source, &mut handler);
        let tokens: Vec<_> = std::iter::from_fn(|| Some(lexer.next_token()))
            .take_while(|t| *t != Token::Eof)
            .collect();
        let ast = llpc_par::Parser::new(tokens, &mut handler).parse().expect("program should parse");
        llpc_sem::analyze(&ast, &mut handler);
        assert!(!handler.has_errors(), "unexpected semantic errors for: {source}");
        let frames = crate::plan(&ast);
        (ast, frames)
    }

    #[test]
    fn test_edge_root_has_no_access_link() {
        let (ast, frames) = plan_source("program p; begin end");
        let frame_id = ast.funcs[ast.root].stack_frame.borrow().unwrap();
        assert!(!frames[frame_id].has_access_link);
    }

    #[test]
    fn test_edge_nested_function_has_access_link() {
        let (ast, frames) = plan_source("program p; procedure q() begin end begin end");
        let LocalDef::FuncDef(q_id) = &ast.funcs[ast.root].local_defs[0] else {
            panic!("expected a function definition");
        };
        let frame_id = ast.funcs[*q_id].stack_frame.borrow().unwrap();
        assert!(frames[frame_id].has_access_link);
        assert_eq!(frames[frame_id].slot_count(), 1);
    }

    #[test]
    fn test_edge_parameters_occupy_slots_in_declaration_order() {
        let (ast, frames) =
            plan_source("program p; procedure q(a : int; b : char) begin end begin end");
        let LocalDef::FuncDef(q_id) = &ast.funcs[ast.root].local_defs[0] else {
            panic!("expected a function definition");
        };
        let frame_id = ast.funcs[*q_id].stack_frame.borrow().unwrap();
        let frame = &frames[frame_id];
        assert_eq!(frame.records[0].name, llpc_util::Symbol::intern("a"));
        assert_eq!(frame.records[0].slot_index, 1);
        assert_eq!(frame.records[1].name, llpc_util::Symbol::intern("b"));
        assert_eq!(frame.records[1].slot_index, 2);
    }

    #[test]
    fn test_edge_array_parameter_is_always_by_reference() {
        let (ast, frames) = plan_source("program p; procedure q(a : int[5]) begin end begin end");
        let LocalDef::FuncDef(q_id) = &ast.funcs[ast.root].local_defs[0] else {
            panic!("expected a function definition");
        };
        let frame_id = ast.funcs[*q_id].stack_frame.borrow().unwrap();
        let record = frames[frame_id].find(llpc_util::Symbol::intern("a")).unwrap();
        assert!(record.is_ref);
        assert!(record.is_array);
    }

    #[test]
    fn test_edge_by_value_scalar_parameter_is_not_by_reference() {
        let (ast, frames) = plan_source("program p; procedure q(a : int) begin end begin end");
        let LocalDef::FuncDef(q_id) = &ast.funcs[ast.root].local_defs[0] else {
            panic!("expected a function definition");
        };
        let frame_id = ast.funcs[*q_id].stack_frame.borrow().unwrap();
        let record = frames[frame_id].find(llpc_util::Symbol::intern("a")).unwrap();
        assert!(!record.is_ref);
        assert!(!record.is_array);
    }

    #[test]
    fn test_edge_array_local_is_marked_array() {
        let (ast, frames) = plan_source("program p; var buf : char[10]; begin end");
        let frame_id = ast.funcs[ast.root].stack_frame.borrow().unwrap();
        let record = frames[frame_id].find(llpc_util::Symbol::intern("buf")).unwrap();
        assert!(record.is_array);
    }

    #[test]
    fn test_edge_locals_follow_parameters_in_slot_order() {
        let (ast, frames) = plan_source("program p; procedure q(a : int) var b : int; begin end begin end");
        let LocalDef::FuncDef(q_id) = &ast.funcs[ast.root].local_defs[0] else {
            panic!("expected a function definition");
        };
        let frame_id = ast.funcs[*q_id].stack_frame.borrow().unwrap();
        let frame = &frames[frame_id];
        let a = frame.find(llpc_util::Symbol::intern("a")).unwrap();
        let b = frame.find(llpc_util::Symbol::intern("b")).unwrap();
        assert!(a.slot_index < b.slot_index);
    }

    #[test]
    fn test_edge_replanning_is_idempotent() {
        let mut handler = Handler::new();
        let mut lexer = Lexer::new("program p; procedure q() begin end begin end", &mut handler);
        let tokens: Vec<_> = std::iter::from_fn(|| Some(lexer.next_token()))
            .take_while(|t| *t != Token::Eof)
            .collect();
        let ast = llpc_par::Parser::new(tokens, &mut handler).parse().unwrap();
        llpc_sem::analyze(&ast, &mut handler);

        let first = crate::plan(&ast);
        let first_id = ast.funcs[ast.root].stack_frame.borrow().unwrap();

        let second = crate::plan(&ast);
        let second_id = ast.funcs[ast.root].stack_frame.borrow().unwrap();

        assert_eq!(first_id, second_id);
        assert_eq!(first[first_id].slot_count(), second[second_id].slot_count());
    }
}
