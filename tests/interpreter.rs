#[cfg(test)]
mod interpreter_tests {
    use std::thread;

    use lox_interpreter as lox;

    use lox::ast_printer::AstPrinter;
    use lox::error::RunError;
    use lox::interpreter::*;
    use lox::parser::Parser;
    use lox::scanner::scan_tokens;
    use lox::value::Value;
    use lox::Lox;

    fn session() -> Lox<Vec<u8>> {
        Lox::with_output(Vec::new())
    }

    fn printed(lox: &Lox<Vec<u8>>) -> String {
        String::from_utf8(lox.output().clone()).expect("output should be UTF-8")
    }

    /// Run `source` in a fresh session, returning what it printed.
    fn run(source: &str) -> (String, Result<(), RunError>) {
        let mut lox = session();
        let result = lox.run(source);

        (printed(&lox), result)
    }

    fn run_ok(source: &str) -> String {
        let (out, result) = run(source);
        if let Err(e) = result {
            panic!("program failed:\n{}\noutput so far:\n{}", e, out);
        }
        out
    }

    fn runtime_message(source: &str) -> String {
        match run(source).1 {
            Err(RunError::Runtime(e)) => e.message,
            other => panic!("expected a runtime error, got {:?}", other),
        }
    }

    // ───────────────────────────── statements ─────────────────────────────

    #[test]
    fn test_empty_program() {
        assert_eq!(run_ok(""), "");
        assert_eq!(run_ok("// only a comment\n"), "");
    }

    #[test]
    fn test_arithmetic_and_printing() {
        assert_eq!(run_ok("print 1 + 2 * 3;"), "7\n");
        assert_eq!(run_ok("print 7 / 2;"), "3.5\n");
        assert_eq!(run_ok("print -(2 - 5);"), "3\n");
        assert_eq!(run_ok("print \"a\" + \"b\";"), "ab\n");
        assert_eq!(run_ok("print nil; print true; print !nil;"), "nil\ntrue\ntrue\n");
    }

    #[test]
    fn test_division_by_zero_follows_ieee() {
        assert_eq!(run_ok("print 1 / 0; print -1 / 0;"), "inf\n-inf\n");
        assert_eq!(run_ok("var n = 0 / 0; print n == n;"), "false\n");
    }

    #[test]
    fn test_equality() {
        assert_eq!(
            run_ok("print 1 == 1; print \"a\" == \"a\"; print nil == false; print 0 == \"0\"; print nil == nil;"),
            "true\ntrue\nfalse\nfalse\ntrue\n"
        );
    }

    #[test]
    fn test_logical_operators_return_operands() {
        assert_eq!(
            run_ok("print nil or \"yes\"; print \"a\" and \"b\"; print false and undefined;"),
            "yes\nb\nfalse\n"
        );
        assert_eq!(run_ok("print 0 or 1;"), "0\n");
    }

    #[test]
    fn test_block_shadowing() {
        assert_eq!(
            run_ok("var a = 1; { var a = 2; print a; } print a;"),
            "2\n1\n"
        );
    }

    #[test]
    fn test_control_flow() {
        let source = r#"
            var total = 0;
            for (var i = 1; i <= 4; i = i + 1) {
                if (i == 3) total = total + 100; else total = total + i;
            }
            print total;
            var n = 3;
            while (n > 0) n = n - 1;
            print n;
        "#;

        assert_eq!(run_ok(source), "107\n0\n");
    }

    #[test]
    fn test_uninitialized_variable_is_nil() {
        assert_eq!(run_ok("var x; print x;"), "nil\n");
    }

    // ───────────────────────────── functions ──────────────────────────────

    #[test]
    fn test_recursion_and_return() {
        let source = r#"
            fun fib(n) {
                if (n < 2) return n;
                return fib(n - 1) + fib(n - 2);
            }
            print fib(10);
        "#;

        assert_eq!(run_ok(source), "55\n");
    }

    #[test]
    fn test_function_without_return_yields_nil() {
        assert_eq!(run_ok("fun f() {} print f();"), "nil\n");
    }

    #[test]
    fn test_return_exits_nested_loops() {
        let source = r#"
            fun first() {
                for (var i = 0; i < 10; i = i + 1) {
                    while (true) { return i; }
                }
            }
            print first();
        "#;

        assert_eq!(run_ok(source), "0\n");
    }

    #[test]
    fn test_closures_keep_their_own_counter() {
        let source = r#"
            fun makeCounter() {
                var count = 0;
                fun increment() {
                    count = count + 1;
                    return count;
                }
                return increment;
            }
            var a = makeCounter();
            var b = makeCounter();
            print a();
            print a();
            print b();
        "#;

        assert_eq!(run_ok(source), "1\n2\n1\n");
    }

    #[test]
    fn test_closure_binding_is_lexical() {
        let source = r#"
            var a = "global";
            {
                fun show() { print a; }
                show();
                var a = "block";
                show();
            }
        "#;

        assert_eq!(run_ok(source), "global\nglobal\n");
    }

    #[test]
    fn test_callable_display() {
        assert_eq!(
            run_ok("fun f() {} print f; print clock; class C {} print C; print C();"),
            "<fn f>\n<native fn>\nC\nC instance\n"
        );
    }

    #[test]
    fn test_clock_is_a_number() {
        assert_eq!(run_ok("print clock() > 0;"), "true\n");
    }

    // ────────────────────────────── classes ───────────────────────────────

    #[test]
    fn test_fields_and_methods() {
        let source = r#"
            class Foo {
                init(v) { this.v = v; }
                getV() { return this.v; }
            }
            print Foo(5).getV();
        "#;

        assert_eq!(run_ok(source), "5\n");
    }

    #[test]
    fn test_bound_method_remembers_instance() {
        let source = r#"
            class Cell {
                init(n) { this.n = n; }
                get() { return this.n; }
            }
            var m = Cell(7).get;
            print m();
        "#;

        assert_eq!(run_ok(source), "7\n");
    }

    #[test]
    fn test_fields_shadow_methods() {
        let source = r#"
            class A { m() { return "method"; } }
            var a = A();
            a.m = "field";
            print a.m;
        "#;

        assert_eq!(run_ok(source), "field\n");
    }

    #[test]
    fn test_initializer_returns_instance() {
        let source = r#"
            class P {
                init(x) { this.x = x; return; }
            }
            var p = P(3);
            print p.init(4) == p;
            print p.x;
        "#;

        assert_eq!(run_ok(source), "true\n4\n");
    }

    #[test]
    fn test_class_arity_comes_from_init() {
        assert_eq!(
            runtime_message("class P { init(a, b) {} } P(1);"),
            "Expected 2 arguments but got 1."
        );
        assert_eq!(
            runtime_message("class Q {} Q(1);"),
            "Expected 0 arguments but got 1."
        );
    }

    // ─────────────────────────── runtime errors ───────────────────────────

    #[test]
    fn test_runtime_error_stops_the_program() {
        let (out, result) = run("print \"before\";\nprint 1 + \"b\";\nprint \"after\";");

        assert_eq!(out, "before\n");

        let err = result.unwrap_err();
        assert_eq!(err.exit_code(), 70);
        assert_eq!(
            err.to_string(),
            "Operands must be two numbers or two strings.: PLUS + null\n[line 2]"
        );
    }

    #[test]
    fn test_runtime_error_messages() {
        let cases = [
            ("print -\"x\";", "Operand must be a number."),
            ("print 1 < \"2\";", "Operands must be numbers."),
            ("print nope;", "Undefined variable 'nope'."),
            ("nope = 1;", "Undefined variable 'nope'."),
            ("\"str\"();", "Can only call functions and classes."),
            ("fun f(a, b) {} f(1);", "Expected 2 arguments but got 1."),
            ("var x = 1; print x.y;", "Only instances have properties."),
            ("var x = 1; x.y = 2;", "Only instances have fields."),
            ("class A {} print A().z;", "Undefined property 'z'."),
        ];

        for (source, expected) in cases {
            assert_eq!(runtime_message(source), expected, "{}", source);
        }
    }

    #[test]
    fn test_global_self_reference_fails_at_runtime() {
        assert_eq!(runtime_message("var a = a;"), "Undefined variable 'a'.");
    }

    /// Run `f` on a thread with the stack the driver gives a session.
    fn on_interpreter_stack<T, F>(f: F) -> T
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        thread::Builder::new()
            .stack_size(INTERPRETER_STACK_SIZE)
            .spawn(f)
            .unwrap()
            .join()
            .unwrap()
    }

    const COUNT_DOWN: &str = "fun count(n) { if (n > 0) return count(n - 1); return n; }";

    #[test]
    fn test_unbounded_recursion_is_a_runtime_error() {
        let message = on_interpreter_stack(|| runtime_message("fun f() { f(); }\nf();"));

        assert_eq!(message, "Stack overflow.");
    }

    #[test]
    fn test_deep_recursion_succeeds() {
        let out = on_interpreter_stack(|| {
            run_ok(&format!("{}\nprint count(300);\nprint count(3000);", COUNT_DOWN))
        });

        assert_eq!(out, "0\n0\n");
    }

    #[test]
    fn test_call_depth_limit_is_exact() {
        // count(n) nests n + 1 calls.
        let deepest = MAX_CALL_DEPTH - 1;

        let out = on_interpreter_stack(move || {
            run_ok(&format!("{}\nprint count({});", COUNT_DOWN, deepest))
        });
        assert_eq!(out, "0\n");

        let message = on_interpreter_stack(move || {
            runtime_message(&format!("{}\ncount({});", COUNT_DOWN, deepest + 1))
        });
        assert_eq!(message, "Stack overflow.");
    }

    #[test]
    fn test_static_errors_prevent_execution() {
        let (out, result) = run("print \"never\";\nprint $;\nreturn 1;");

        assert_eq!(out, "");

        let err = result.unwrap_err();
        assert_eq!(err.exit_code(), 65);
        assert_eq!(
            err.diagnostics(),
            [
                "[line 2] Error: Unexpected character: $",
                "[line 2] Error at ';': Expect expression.",
            ]
        );
    }

    #[test]
    fn test_resolver_errors_are_static() {
        let (out, result) = run("print 1;\n{ var a = a; }");

        assert_eq!(out, "");
        assert!(matches!(result, Err(RunError::Static(ref errors)) if errors.len() == 1));
    }

    // ────────────────────────── interpreter API ───────────────────────────

    #[test]
    fn test_printed_source_evaluates_the_same() {
        let sources = [
            "1 + 2 * 3 - -4 / 2",
            "!(1 < 2) == false",
            "\"a\" + \"b\" == \"ab\" and 3 >= 3",
            "nil or (2 - 3) * 4",
        ];

        for source in sources {
            let (tokens, _) = scan_tokens(source);
            let expr = Parser::new(tokens).parse_expression().unwrap();

            let printed = AstPrinter::source(&expr);
            let (tokens, _) = scan_tokens(&printed);
            let reparsed = Parser::new(tokens).parse_expression().unwrap();

            let mut interpreter = Interpreter::with_output(Vec::new());
            assert_eq!(
                interpreter.evaluate(&expr).unwrap(),
                interpreter.evaluate(&reparsed).unwrap(),
                "{} vs {}",
                source,
                printed
            );
        }
    }

    #[test]
    fn test_globals_hold_natives() {
        let interpreter = Interpreter::with_output(Vec::new());
        let clock = interpreter.globals().borrow().lookup("clock");

        assert!(matches!(clock, Some(Value::NativeFunction { arity: 0, .. })));
    }
}
