#[cfg(test)]
mod scanner_tests {
    use kestrel::error::KestrelError;
    use kestrel::scanner::*;
    use kestrel::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source);
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), expected.len());

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    fn assert_token_matches(
        result: &Result<Token, KestrelError>,
        expected_type: TokenType,
        expected_lexeme: &str,
    ) {
        match result {
            Ok(token) => {
                assert_eq!(
                    token.token_type, expected_type,
                    "Expected token type {:?}, got {:?}",
                    expected_type, token.token_type
                );
                assert_eq!(
                    token.lexeme, expected_lexeme,
                    "Expected lexeme '{}', got '{}'",
                    expected_lexeme, token.lexeme
                );
            }
            Err(e) => panic!("Expected token but got error: {}", e),
        }
    }

    #[test]
    fn test_scanner_01_symbols() {
        assert_token_sequence(
            "({*,+*})[];",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::STAR, "*"),
                (TokenType::COMMA, ","),
                (TokenType::PLUS, "+"),
                (TokenType::STAR, "*"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::LEFT_BRACKET, "["),
                (TokenType::RIGHT_BRACKET, "]"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_02_two_char_operators() {
        assert_token_sequence(
            "! != = == < <= > >= / -",
            &[
                (TokenType::BANG, "!"),
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::EQUAL, "="),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::LESS, "<"),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::GREATER, ">"),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::SLASH, "/"),
                (TokenType::MINUS, "-"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_03_keywords_and_identifiers() {
        assert_token_sequence(
            "func var true false null if else return for forty _x1",
            &[
                (TokenType::FUNC, "func"),
                (TokenType::VAR, "var"),
                (TokenType::TRUE, "true"),
                (TokenType::FALSE, "false"),
                (TokenType::NULL, "null"),
                (TokenType::IF, "if"),
                (TokenType::ELSE, "else"),
                (TokenType::RETURN, "return"),
                (TokenType::FOR, "for"),
                (TokenType::IDENTIFIER, "forty"),
                (TokenType::IDENTIFIER, "_x1"),
                (TokenType::EOF, ""),
            ],
        );

        assert_eq!(lookup_ident("return"), TokenType::RETURN);
        assert_eq!(lookup_ident("fn"), TokenType::IDENTIFIER);
    }

    #[test]
    fn test_scanner_04_literals_carry_values() {
        let (tokens, errors) = scan_all(r#"42 3.25 7.0 "hi there" 99999999999999999999"#);

        assert!(errors.is_empty());
        assert_eq!(tokens.len(), 6);

        assert!(matches!(tokens[0].token_type, TokenType::INT(Some(42))));
        assert!(matches!(tokens[1].token_type, TokenType::FLOAT(n) if n == 3.25));
        assert!(matches!(tokens[2].token_type, TokenType::FLOAT(n) if n == 7.0));
        assert!(matches!(&tokens[3].token_type, TokenType::STRING(s) if s == "hi there"));
        assert_eq!(tokens[3].lexeme, "\"hi there\"");

        // Overflowing integers are flagged for the parser, not the scanner.
        assert!(matches!(tokens[4].token_type, TokenType::INT(None)));
    }

    #[test]
    fn test_scanner_05_trailing_dot_is_not_a_float() {
        let (tokens, errors) = scan_all("1.");

        assert!(matches!(tokens[0].token_type, TokenType::INT(Some(1))));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "[line 1:2] Error: Unexpected character: .");
    }

    #[test]
    fn test_scanner_06_comments_are_skipped() {
        assert_token_sequence(
            "var a = 1; // the rest ( is ignored\na",
            &[
                (TokenType::VAR, "var"),
                (TokenType::IDENTIFIER, "a"),
                (TokenType::EQUAL, "="),
                (TokenType::INT(Some(1)), "1"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::IDENTIFIER, "a"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_07_positions() {
        let (tokens, _) = scan_all("var x\n  = 10;");

        assert_eq!(tokens[0].position, Position::new(1, 1));
        assert_eq!(tokens[1].position, Position::new(1, 5));
        assert_eq!(tokens[2].position, Position::new(2, 3));
        assert_eq!(tokens[3].position, Position::new(2, 5));

        let eof = tokens.last().expect("EOF token");
        assert_eq!(eof.token_type, TokenType::EOF);
        assert_eq!(eof.position, Position::new(2, 8));
    }

    #[test]
    fn test_unexpected_chars_token_sequence() {
        let source = ",;$(#";
        let scanner = Scanner::new(source);

        let results: Vec<_> = scanner.collect();

        // 0: COMMA, 1: SEMICOLON, 2: error '$', 3: LEFT_PAREN, 4: error '#', 5: EOF
        assert_eq!(results.len(), 6, "Expected 6 items in result");

        assert_token_matches(&results[0], TokenType::COMMA, ",");
        assert_token_matches(&results[1], TokenType::SEMICOLON, ";");
        assert_token_matches(&results[3], TokenType::LEFT_PAREN, "(");
        assert_token_matches(&results[5], TokenType::EOF, "");

        let errors: Vec<String> = results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .map(ToString::to_string)
            .collect();

        assert_eq!(
            errors,
            vec![
                "[line 1:3] Error: Unexpected character: $".to_string(),
                "[line 1:5] Error: Unexpected character: #".to_string(),
            ]
        );
    }

    #[test]
    fn test_non_ascii_character_is_one_error() {
        let (tokens, errors) = scan_all("a é b");

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "[line 1:3] Error: Unexpected character: é");

        let lexemes: Vec<&str> = tokens.iter().map(|t| t.lexeme).collect();
        assert_eq!(lexemes, vec!["a", "b", ""]);
    }

    #[test]
    fn test_unterminated_string() {
        let (tokens, errors) = scan_all("\"abc");

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "[line 1:1] Error: Unterminated string.");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].token_type, TokenType::EOF);
    }

    #[test]
    fn test_exactly_one_eof() {
        let mut scanner = Scanner::new("");

        assert_token_matches(
            &scanner.next().expect("EOF token"),
            TokenType::EOF,
            "",
        );
        assert!(scanner.next().is_none());
        assert!(scanner.next().is_none());
    }

    #[test]
    fn test_token_display() {
        let (tokens, _) = scan_all(r#"x 12 2.0 2.5 "s""#);
        let shown: Vec<String> = tokens.iter().map(ToString::to_string).collect();

        assert_eq!(
            shown,
            vec![
                "IDENTIFIER x null",
                "INT 12 12",
                "FLOAT 2.0 2.0",
                "FLOAT 2.5 2.5",
                "STRING \"s\" s",
                "EOF  null",
            ]
        );
    }
}
