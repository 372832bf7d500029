#[cfg(test)]
mod parser_tests {
    use lox_interpreter as lox;

    use lox::ast::{Expr, ExprId, ExprKind, LiteralValue, Stmt};
    use lox::ast_printer::AstPrinter;
    use lox::error::LoxError;
    use lox::parser::*;
    use lox::scanner::scan_tokens;

    fn parse_program(source: &str) -> Result<Vec<Stmt>, Vec<LoxError>> {
        let (tokens, errors) = scan_tokens(source);
        assert!(errors.is_empty(), "unexpected scan errors: {:?}", errors);

        Parser::new(tokens).parse()
    }

    fn parse_expr(source: &str) -> Expr {
        let (tokens, _) = scan_tokens(source);

        Parser::new(tokens)
            .parse_expression()
            .expect("expression should parse")
    }

    fn messages(errors: &[LoxError]) -> Vec<String> {
        errors.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_precedence_and_associativity() {
        let cases = [
            ("1 + 2 * 3", "(+ 1.0 (* 2.0 3.0))"),
            ("1 - 2 - 3", "(- (- 1.0 2.0) 3.0)"),
            ("-a.b", "(- (. a b))"),
            ("!!true", "(! (! true))"),
            ("a = b = c", "(= a (= b c))"),
            ("a or b and c", "(or a (and b c))"),
            ("1 < 2 == 3 >= 4", "(== (< 1.0 2.0) (>= 3.0 4.0))"),
            ("f(1)(2).x", "(. (call (call f 1.0) 2.0) x)"),
            ("obj.field = 1", "(.= obj field 1.0)"),
        ];

        for (source, expected) in cases {
            assert_eq!(AstPrinter::print(&parse_expr(source)), expected, "{}", source);
        }
    }

    #[test]
    fn test_program_shapes() {
        let program = parse_program(
            "var a;\nclass Point { init(x) { this.x = x; } len() { return 0; } }\nfun f() {}\nif (a) print 1; else print 2;",
        )
        .expect("program should parse");

        assert_eq!(program.len(), 4);
        assert!(matches!(&program[0], Stmt::Var { initializer: None, .. }));

        match &program[1] {
            Stmt::Class { name, methods } => {
                assert_eq!(name.lexeme, "Point");
                let names: Vec<&str> = methods.iter().map(|m| m.name.lexeme.as_str()).collect();
                assert_eq!(names, ["init", "len"]);
                assert_eq!(methods[0].params.len(), 1);
            }
            other => panic!("expected class, got {:?}", other),
        }

        assert!(matches!(&program[2], Stmt::Function(f) if f.body.is_empty()));
        assert!(matches!(&program[3], Stmt::If { else_branch: Some(_), .. }));
    }

    #[test]
    fn test_for_without_clauses_is_a_bare_while() {
        let program = parse_program("for (;;) print 1;").expect("program should parse");

        assert_eq!(program.len(), 1);
        match &program[0] {
            Stmt::While { condition, body } => {
                assert_eq!(condition.kind, ExprKind::Literal(LiteralValue::Bool(true)));
                assert!(matches!(body.as_ref(), Stmt::Print(_)));
            }
            other => panic!("expected while, got {:?}", other),
        }
    }

    #[test]
    fn test_for_with_all_clauses_desugars() {
        let program =
            parse_program("for (var i = 0; i < 3; i = i + 1) print i;").expect("program should parse");

        assert_eq!(
            AstPrinter::print_stmt(&program[0]),
            "(block (var i 0.0) (while (< i 3.0) (block (print i) (; (= i (+ i 1.0))))))"
        );
    }

    #[test]
    fn test_errors_are_collected_after_synchronizing() {
        let errors = parse_program("print ;\nvar x = ;\nprint 1;").unwrap_err();

        assert_eq!(
            messages(&errors),
            [
                "[line 1] Error at ';': Expect expression.",
                "[line 2] Error at ';': Expect expression.",
            ]
        );
    }

    #[test]
    fn test_error_at_end() {
        let errors = parse_program("print 1").unwrap_err();

        assert_eq!(
            messages(&errors),
            ["[line 1] Error at end: Expect ';' after value."]
        );
    }

    #[test]
    fn test_invalid_assignment_target_keeps_parsing() {
        let errors = parse_program("1 = 2;\n(a) = 3;\nprint ;").unwrap_err();

        assert_eq!(
            messages(&errors),
            [
                "[line 1] Error at '=': Invalid assignment target.",
                "[line 2] Error at '=': Invalid assignment target.",
                "[line 3] Error at ';': Expect expression.",
            ]
        );
    }

    #[test]
    fn test_too_many_arguments_is_reported_once() {
        let args: Vec<String> = (0..256).map(|n| n.to_string()).collect();
        let source = format!("f({});", args.join(", "));

        let errors = parse_program(&source).unwrap_err();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message(), "Can't have more than 255 arguments.");
        assert_eq!(
            errors[0].to_string(),
            "[line 1] Error at '255': Can't have more than 255 arguments."
        );
    }

    #[test]
    fn test_too_many_parameters() {
        let params: Vec<String> = (0..=MAX_ARITY).map(|n| format!("p{}", n)).collect();
        let source = format!("fun f({}) {{}}", params.join(", "));

        let errors = parse_program(&source).unwrap_err();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message(), "Can't have more than 255 parameters.");
    }

    #[test]
    fn test_missing_class_brace() {
        let errors = parse_program("class A m() {}").unwrap_err();

        assert_eq!(errors[0].message(), "Expect '{' before class body.");
    }

    #[test]
    fn test_ids_are_unique_across_parsers() {
        let (first, _) = scan_tokens("a + b;");
        let mut parser = Parser::new(first);
        let program = parser.parse().expect("program should parse");
        let resume: ExprId = parser.next_id();

        let Stmt::Expression(sum) = &program[0] else {
            panic!("expected expression statement");
        };
        assert_eq!(resume, ExprId(3));
        assert!(sum.id < resume);

        let (second, _) = scan_tokens("c;");
        let program = Parser::starting_at(second, resume)
            .parse()
            .expect("program should parse");

        let Stmt::Expression(c) = &program[0] else {
            panic!("expected expression statement");
        };
        assert_eq!(c.id, ExprId(3));
    }

    #[test]
    fn test_missing_eof_is_supplied() {
        let (mut tokens, _) = scan_tokens("print 1;");
        tokens.pop();

        let program = Parser::new(tokens).parse().expect("program should parse");
        assert_eq!(program.len(), 1);
    }
}
