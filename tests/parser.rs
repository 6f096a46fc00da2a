#[cfg(test)]
mod parser_tests {
    use kestrel::ast_printer::AstPrinter;
    use kestrel::parse_source;
    use kestrel::parser::*;
    use kestrel::scanner::scan_all;

    /// Parse `source`, failing the test on any diagnostic.
    fn parse_ok(source: &str) -> Program {
        let (program, errors) = parse_source(source);

        assert!(errors.is_empty(), "unexpected errors for {:?}: {:?}", source, errors);

        program
    }

    fn assert_renders(source: &str, expected: &str) {
        let program = parse_ok(source);

        assert_eq!(
            AstPrinter::print_program(&program),
            expected,
            "rendering of {:?}",
            source
        );
    }

    #[test]
    fn test_operator_precedence() {
        let cases = [
            ("-a * b", "((-a) * b)"),
            ("!-a", "(!(-a))"),
            ("a + b + c", "((a + b) + c)"),
            ("a + b - c", "((a + b) - c)"),
            ("a * b * c", "((a * b) * c)"),
            ("a * b / c", "((a * b) / c)"),
            ("a + b / c", "(a + (b / c))"),
            ("a + b * c + d / e - f", "(((a + (b * c)) + (d / e)) - f)"),
            ("3 + 4; -5 * 5", "(3 + 4)((-5) * 5)"),
            ("5 > 4 == 3 < 4", "((5 > 4) == (3 < 4))"),
            ("5 <= 4 != 3 >= 4", "((5 <= 4) != (3 >= 4))"),
            ("3 + 4 * 5 == 3 * 1 + 4 * 5", "((3 + (4 * 5)) == ((3 * 1) + (4 * 5)))"),
            ("true == !false", "(true == (!false))"),
            ("(5 + 5) * 2", "((5 + 5) * 2)"),
            ("2 / (5 + 5)", "(2 / (5 + 5))"),
            ("-(5 + 5)", "(-(5 + 5))"),
            ("a + add(b * c) + d", "((a + add((b * c))) + d)"),
            (
                "add(a, b, 1, 2 * 3, 4 + 5, add(6, 7 * 8))",
                "add(a, b, 1, (2 * 3), (4 + 5), add(6, (7 * 8)))",
            ),
            ("add(a + b + c * d / f + g)", "add((((a + b) + ((c * d) / f)) + g))"),
            ("a * [1, 2, 3, 4][b * c] * d", "((a * ([1, 2, 3, 4][(b * c)])) * d)"),
            ("add(a * b[2], b[1], 2 * [1, 2][1])", "add((a * (b[2])), (b[1]), (2 * ([1, 2][1])))"),
        ];

        for (source, expected) in cases {
            assert_renders(source, expected);
        }
    }

    #[test]
    fn test_literals() {
        assert_renders(r#"1 2.5 3.0 "hi" true false null"#, "12.53.0\"hi\"truefalsenull");
        assert_renders("[]", "[]");

        let program = parse_ok("7; 1.5;");
        assert_eq!(
            program.statements,
            vec![
                Stmt::Expression(Expr::Integer(7)),
                Stmt::Expression(Expr::Float(1.5)),
            ]
        );
    }

    #[test]
    fn test_infix_tree_shape() {
        let program = parse_ok("1 - 2 - 3");

        let expected = Expr::Infix {
            operator: InfixOperator::Subtract,
            left: Box::new(Expr::Infix {
                operator: InfixOperator::Subtract,
                left: Box::new(Expr::Integer(1)),
                right: Box::new(Expr::Integer(2)),
            }),
            right: Box::new(Expr::Integer(3)),
        };

        assert_eq!(program.statements, vec![Stmt::Expression(expected)]);
    }

    #[test]
    fn test_var_assign_and_return() {
        let program = parse_ok("var x = 5; x = x + 1; return x;");

        assert_eq!(program.statements.len(), 3);
        assert_eq!(
            program.statements[0],
            Stmt::Var {
                name: "x".into(),
                value: Expr::Integer(5),
            }
        );
        assert!(matches!(&program.statements[1], Stmt::Assign { name, .. } if name == "x"));
        assert!(matches!(&program.statements[2], Stmt::Return { value: Some(Expr::Identifier(n)) } if n == "x"));

        assert_renders("var x = 5; x = x + 1; return x;", "var x = 5;x = (x + 1);return x;");
    }

    #[test]
    fn test_semicolons_are_optional() {
        assert_renders("var a = 1\nvar b = 2\na + b", "var a = 1;var b = 2;(a + b)");
        assert_renders("return", "return;");
        assert_renders("func() { return }", "func() { return; }");
    }

    #[test]
    fn test_equality_is_not_assignment() {
        let program = parse_ok("x == 1");

        assert!(matches!(
            &program.statements[0],
            Stmt::Expression(Expr::Infix { operator: InfixOperator::Equal, .. })
        ));
    }

    #[test]
    fn test_if_expression() {
        assert_renders("if (x < y) { x }", "if ((x < y)) { x }");
        assert_renders("if (x < y) { x } else { y }", "if ((x < y)) { x } else { y }");
        assert_renders("if (x) { }", "if (x) { }");
    }

    #[test]
    fn test_else_if_nests_in_alternative() {
        let program = parse_ok("if (a) { 1 } else if (b) { 2 } else { 3 }");

        assert_eq!(
            AstPrinter::print_program(&program),
            "if (a) { 1 } else { if (b) { 2 } else { 3 } }"
        );

        let Stmt::Expression(Expr::If { alternative, .. }) = &program.statements[0] else {
            panic!("expected an if expression");
        };
        let alternative = alternative.as_ref().expect("else branch");

        assert_eq!(alternative.statements.len(), 1);
        assert!(matches!(
            alternative.statements[0],
            Stmt::Expression(Expr::If { .. })
        ));
    }

    #[test]
    fn test_function_literal() {
        assert_renders("func(x, y) { x + y; }", "func(x, y) { (x + y) }");
        assert_renders("func() { }", "func() { }");

        let program = parse_ok("func(a, b, c) { }");
        let Stmt::Expression(Expr::Function(literal)) = &program.statements[0] else {
            panic!("expected a function literal");
        };

        assert_eq!(&*literal.parameters, &["a", "b", "c"]);
        assert!(literal.body.statements.is_empty());
    }

    #[test]
    fn test_call_on_function_literal() {
        assert_renders("func(x) { x }(5)", "func(x) { x }(5)");

        let program = parse_ok("func(x) { x }(5)");
        assert!(matches!(
            &program.statements[0],
            Stmt::Expression(Expr::Call { function, arguments })
                if matches!(**function, Expr::Function(_)) && arguments.len() == 1
        ));
    }

    #[test]
    fn test_for_statement() {
        assert_renders(
            "for (var i = 0; i < 10; i = i + 1) { puts(i); }",
            "for (var i = 0; (i < 10); i = (i + 1)) { puts(i) }",
        );
        assert_renders("for (;;) { }", "for (; ; ) { }");

        let program = parse_ok("for (; x; ) { 1 } x");
        assert_eq!(program.statements.len(), 2);

        let Stmt::For {
            init,
            condition,
            update,
            body,
        } = &program.statements[0]
        else {
            panic!("expected a for statement");
        };

        assert!(init.is_none());
        assert_eq!(condition, &Some(Expr::Identifier("x".into())));
        assert!(update.is_none());
        assert_eq!(body.statements, vec![Stmt::Expression(Expr::Integer(1))]);
    }

    #[test]
    fn test_index_and_array() {
        assert_renders("myArray[1 + 1]", "(myArray[(1 + 1)])");
        assert_renders("[1, 2 * 2, 3 + 3]", "[1, (2 * 2), (3 + 3)]");
        assert_renders("a[0][1]", "((a[0])[1])");
    }

    #[test]
    fn test_missing_token_error() {
        let (_, errors) = parse_source("var x 5;");

        assert_eq!(
            errors,
            vec!["[line 1:7] expected next token to be EQUAL, got INT ('5') while parsing var statement"]
        );
    }

    #[test]
    fn test_unclosed_group_reports_eof() {
        let (_, errors) = parse_source("(1 + 2");

        assert_eq!(
            errors,
            vec!["[line 1:7] expected next token to be RIGHT_PAREN, got EOF ('') while parsing grouped expression"]
        );
    }

    #[test]
    fn test_no_prefix_parse_function() {
        let (program, errors) = parse_source("}");

        assert!(program.statements.is_empty());
        assert_eq!(errors, vec!["[line 1:1] no prefix parse function for RIGHT_BRACE ('}')"]);
    }

    #[test]
    fn test_integer_overflow_is_a_parse_error() {
        let (_, errors) = parse_source("99999999999999999999");

        assert_eq!(
            errors,
            vec!["[line 1:1] could not parse '99999999999999999999' as integer"]
        );
    }

    #[test]
    fn test_errors_accumulate_and_parsing_recovers() {
        let (program, errors) = parse_source("var = 1; var y = 2; var z 3; y");

        assert_eq!(errors.len(), 2, "errors: {:?}", errors);
        assert!(errors[0].contains("expected next token to be IDENTIFIER, got EQUAL"));
        assert!(errors[1].contains("expected next token to be EQUAL, got INT ('3')"));

        assert_eq!(AstPrinter::print_program(&program), "var y = 2;y");
    }

    #[test]
    fn test_recovery_inside_block_keeps_block() {
        let (program, errors) = parse_source("var f = func() { var = 1; 2 }; f");

        assert_eq!(errors.len(), 1, "errors: {:?}", errors);
        assert_eq!(AstPrinter::print_program(&program), "var f = func() { 2 };f");
    }

    #[test]
    fn test_lex_errors_come_first() {
        let (program, errors) = parse_source("var a = 1; $ var b = ;");

        assert_eq!(errors.len(), 2, "errors: {:?}", errors);
        assert_eq!(errors[0], "[line 1:12] Error: Unexpected character: $");
        assert!(errors[1].starts_with("[line 1:22] no prefix parse function for SEMICOLON"));

        assert_eq!(AstPrinter::print_program(&program), "var a = 1;");
    }

    #[test]
    fn test_parser_over_raw_tokens() {
        let (tokens, lex_errors) = scan_all("a + b");
        assert!(lex_errors.is_empty());

        let mut parser = Parser::new(&tokens);
        let (program, errors) = parser.parse_program();

        assert!(errors.is_empty());
        assert!(parser.errors().is_empty());
        assert_eq!(program.to_string(), "(a + b)");
    }

    #[test]
    fn test_program_serializes_to_json() {
        let program = parse_ok("var x = -1;");
        let json = serde_json::to_value(&program).expect("serializable");

        assert_eq!(json["statements"][0]["Var"]["name"], "x");
        assert_eq!(
            json["statements"][0]["Var"]["value"]["Prefix"]["operator"],
            "Negate"
        );
    }
}
