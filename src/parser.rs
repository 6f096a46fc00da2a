/*!
Syntax tree and precedence‑climbing parser for Kestrel.

### Contract

`Parser::parse_program` never aborts.  Each malformed statement is dropped,
its diagnostic is appended to the error list, and parsing resumes at the
next statement boundary (`;`, a statement keyword, or the closing `}` of the
enclosing block).  The caller receives the partial program together with
every message and decides whether to proceed.

### Logging Policy

| Location                     | Level  | Purpose                                   |
|------------------------------|--------|-------------------------------------------|
| `Parser::new`, `parse_program` | `info` | Lifecycle milestones.                   |
| statement rules              | `debug`| High‑level descent into grammar branches. |
| Error paths (`consume`, etc.)| `debug`| Context before returning structured error.|

--------------------------------------------------------------------------------
Grammar (EBNF — condensed)
--------------------------------------------------------

```text
program        → statement* EOF ;
statement      → ( varStmt | assignStmt | returnStmt | exprStmt ) ";"?
               | forStmt ;
varStmt        → "var" IDENT "=" expression ;
assignStmt     → IDENT "=" expression ;
returnStmt     → "return" expression? ;
forStmt        → "for" "(" simpleStmt? ";" expression? ";" simpleStmt? ")" block ;
simpleStmt     → varStmt | assignStmt | expression ;
block          → "{" statement* "}" ;
exprStmt       → expression ;

expression     → prefix ( infix )*            (precedence climbing)
prefix         → INT | FLOAT | STRING | "true" | "false" | "null" | IDENT
               | ( "!" | "-" ) expression
               | "(" expression ")"
               | "[" arguments? "]"
               | "if" "(" expression ")" block ( "else" ( ifExpr | block ) )?
               | "func" "(" parameters? ")" block ;
infix          → ( "==" | "!=" | "<" | ">" | "<=" | ">=" | "+" | "-" | "*" | "/" ) expression
               | "(" arguments? ")"
               | "[" expression "]" ;
```

Binding power, low → high: equality < relational < additive <
multiplicative < prefix < call < index.  All binary operators associate to
the left.
*/

use std::fmt;
use std::rc::Rc;

use log::{debug, info};
use serde::Serialize;

use crate::error::{KestrelError, Result};
use crate::token::{Token, TokenType};

/// Root of the syntax tree: the ordered top‑level statements.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

/// Braced statement sequence used by `if`, `for` and function bodies.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct BlockStatement {
    pub statements: Vec<Stmt>,
}

/// **Abstract‑Syntax‑Tree node** for *statements*.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Stmt {
    /// Bare expression; its value becomes the enclosing block's value.
    Expression(Expr),

    /// `var name = value` — binds in the current scope.
    Var { name: String, value: Expr },

    /// `name = value` — rebinds the nearest existing binding.
    Assign { name: String, value: Expr },

    /// `return value?` — absent value returns `null`.
    Return { value: Option<Expr> },

    For {
        init: Option<Box<Stmt>>,
        condition: Option<Expr>,
        update: Option<Box<Stmt>>,
        body: BlockStatement,
    },
}

/// Prefix (unary) operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PrefixOperator {
    Not,
    Negate,
}

/// Infix (binary) operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InfixOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
}

impl PrefixOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            PrefixOperator::Not => "!",
            PrefixOperator::Negate => "-",
        }
    }
}

impl InfixOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            InfixOperator::Add => "+",
            InfixOperator::Subtract => "-",
            InfixOperator::Multiply => "*",
            InfixOperator::Divide => "/",
            InfixOperator::Equal => "==",
            InfixOperator::NotEqual => "!=",
            InfixOperator::Less => "<",
            InfixOperator::Greater => ">",
            InfixOperator::LessEqual => "<=",
            InfixOperator::GreaterEqual => ">=",
        }
    }

    fn from_token(tt: &TokenType) -> Option<Self> {
        let op = match tt {
            TokenType::PLUS => InfixOperator::Add,
            TokenType::MINUS => InfixOperator::Subtract,
            TokenType::STAR => InfixOperator::Multiply,
            TokenType::SLASH => InfixOperator::Divide,
            TokenType::EQUAL_EQUAL => InfixOperator::Equal,
            TokenType::BANG_EQUAL => InfixOperator::NotEqual,
            TokenType::LESS => InfixOperator::Less,
            TokenType::GREATER => InfixOperator::Greater,
            TokenType::LESS_EQUAL => InfixOperator::LessEqual,
            TokenType::GREATER_EQUAL => InfixOperator::GreaterEqual,
            _ => return None,
        };

        Some(op)
    }
}

impl fmt::Display for PrefixOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl fmt::Display for InfixOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A function literal.  Parameters and body are reference counted so every
/// closure created from the literal shares them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionLiteral {
    pub parameters: Rc<[String]>,
    pub body: Rc<BlockStatement>,
}

/// **Abstract‑Syntax‑Tree node** representing every kind of *expression*.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    Identifier(String),

    Integer(i64),

    Float(f64),

    /// String literal without surrounding quotes.
    Str(String),

    Boolean(bool),

    Null,

    /// `[a, b, c]`
    Array(Vec<Expr>),

    /// *Example:* `!ready` or `-42`
    Prefix {
        operator: PrefixOperator,
        operand: Box<Expr>,
    },

    /// *Example:* `a + b`, `x <= y`
    Infix {
        operator: InfixOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    If {
        condition: Box<Expr>,
        consequence: BlockStatement,
        alternative: Option<BlockStatement>,
    },

    Function(FunctionLiteral),

    /// *Example:* `add(1, 2)` or `make()(3)`
    Call {
        function: Box<Expr>,
        arguments: Vec<Expr>,
    },

    /// *Example:* `xs[0]`
    Index {
        collection: Box<Expr>,
        index: Box<Expr>,
    },
}

/// Binding power of infix tokens, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Lowest,
    Equals,
    LessGreater,
    Sum,
    Product,
    Prefix,
    Call,
    Index,
}

impl Precedence {
    /// Infix binding power of `tt`; tokens without an infix role are `Lowest`.
    pub fn of(tt: &TokenType) -> Self {
        match tt {
            TokenType::EQUAL_EQUAL | TokenType::BANG_EQUAL => Precedence::Equals,
            TokenType::LESS
            | TokenType::GREATER
            | TokenType::LESS_EQUAL
            | TokenType::GREATER_EQUAL => Precedence::LessGreater,
            TokenType::PLUS | TokenType::MINUS => Precedence::Sum,
            TokenType::STAR | TokenType::SLASH => Precedence::Product,
            TokenType::LEFT_PAREN => Precedence::Call,
            TokenType::LEFT_BRACKET => Precedence::Index,
            _ => Precedence::Lowest,
        }
    }
}

/// Top‑level parser over an immutable slice of tokens.
///
/// The slice must end with an `EOF` token, as produced by the scanner.
pub struct Parser<'a> {
    tokens: &'a [Token<'a>],
    current: usize,
    block_depth: usize,
    errors: Vec<KestrelError>,
}

impl<'a> Parser<'a> {
    /// Construct a new parser.
    pub fn new(tokens: &'a [Token<'a>]) -> Self {
        info!("Parser created with {} tokens", tokens.len());

        Self {
            tokens,
            current: 0,
            block_depth: 0,
            errors: Vec::new(),
        }
    }

    // ───────────────────────── public API ─────────────────────────

    /// Parse the whole token stream, returning the (possibly partial)
    /// program and every diagnostic collected along the way.
    pub fn parse_program(&mut self) -> (Program, Vec<String>) {
        info!("Beginning parse phase");

        let mut program = Program::default();

        while !self.is_at_end() {
            if let Some(stmt) = self.statement_or_recover() {
                program.statements.push(stmt);
            }
        }

        info!(
            "Parsed {} statements with {} errors",
            program.statements.len(),
            self.errors.len()
        );

        let errors = self.errors.drain(..).map(|e| e.to_string()).collect();

        (program, errors)
    }

    /// Structured errors accumulated so far.
    pub fn errors(&self) -> &[KestrelError] {
        &self.errors
    }

    // ──────────────────────── statement rules ─────────────────────

    fn statement_or_recover(&mut self) -> Option<Stmt> {
        match self.statement() {
            Ok(stmt) => Some(stmt),

            Err(e) => {
                debug!("Parse debug: {}", e);

                self.errors.push(e);
                self.synchronize();

                None
            }
        }
    }

    fn statement(&mut self) -> Result<Stmt> {
        debug!("Entering statement at {}", self.peek().position);

        if self.matches(TokenType::FOR) {
            return self.for_statement();
        }

        let stmt = if self.matches(TokenType::RETURN) {
            self.return_statement()?
        } else {
            self.simple_statement()?
        };

        self.matches(TokenType::SEMICOLON);

        Ok(stmt)
    }

    /// The statements allowed in `for` clauses: no trailing `;` is consumed.
    fn simple_statement(&mut self) -> Result<Stmt> {
        if self.matches(TokenType::VAR) {
            self.var_statement()
        } else if self.check(TokenType::IDENTIFIER) && self.check_next(TokenType::EQUAL) {
            self.assign_statement()
        } else {
            Ok(Stmt::Expression(self.expression()?))
        }
    }

    fn var_statement(&mut self) -> Result<Stmt> {
        let name: &Token<'_> = self.consume(TokenType::IDENTIFIER, "var statement")?;

        self.consume(TokenType::EQUAL, "var statement")?;

        let value: Expr = self.expression()?;

        Ok(Stmt::Var {
            name: name.lexeme.to_string(),
            value,
        })
    }

    fn assign_statement(&mut self) -> Result<Stmt> {
        let name: &Token<'_> = self.consume(TokenType::IDENTIFIER, "assignment")?;

        self.consume(TokenType::EQUAL, "assignment")?;

        let value: Expr = self.expression()?;

        Ok(Stmt::Assign {
            name: name.lexeme.to_string(),
            value,
        })
    }

    fn return_statement(&mut self) -> Result<Stmt> {
        let value: Option<Expr> = if self.check(TokenType::SEMICOLON)
            || self.check(TokenType::RIGHT_BRACE)
            || self.is_at_end()
        {
            None
        } else {
            Some(self.expression()?)
        };

        Ok(Stmt::Return { value })
    }

    fn for_statement(&mut self) -> Result<Stmt> {
        self.consume(TokenType::LEFT_PAREN, "for statement")?;

        let init: Option<Box<Stmt>> = if self.check(TokenType::SEMICOLON) {
            None
        } else {
            Some(Box::new(self.simple_statement()?))
        };
        self.consume(TokenType::SEMICOLON, "for initializer")?;

        let condition: Option<Expr> = if self.check(TokenType::SEMICOLON) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenType::SEMICOLON, "for condition")?;

        let update: Option<Box<Stmt>> = if self.check(TokenType::RIGHT_PAREN) {
            None
        } else {
            Some(Box::new(self.simple_statement()?))
        };
        self.consume(TokenType::RIGHT_PAREN, "for clauses")?;

        self.consume(TokenType::LEFT_BRACE, "for body")?;
        let body: BlockStatement = self.block()?;

        Ok(Stmt::For {
            init,
            condition,
            update,
            body,
        })
    }

    /// Parse statements up to and including the closing `}`.  The opening
    /// `{` must already be consumed.  Bad statements inside are reported and
    /// skipped without abandoning the block.
    fn block(&mut self) -> Result<BlockStatement> {
        self.block_depth += 1;

        let mut statements: Vec<Stmt> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            if let Some(stmt) = self.statement_or_recover() {
                statements.push(stmt);
            }
        }

        self.block_depth -= 1;

        self.consume(TokenType::RIGHT_BRACE, "block")?;

        Ok(BlockStatement { statements })
    }

    // ─────────────────────── expression rules (Pratt) ─────────────

    fn expression(&mut self) -> Result<Expr> {
        self.parse_expression(Precedence::Lowest)
    }

    /// Precedence climbing: parse a prefix construct, then keep folding
    /// infix constructs that bind tighter than `min`.
    fn parse_expression(&mut self, min: Precedence) -> Result<Expr> {
        let mut left: Expr = self.prefix()?;

        while Precedence::of(&self.peek().token_type) > min {
            let operator: &Token<'_> = self.advance();

            left = self.infix(left, operator)?;
        }

        Ok(left)
    }

    fn prefix(&mut self) -> Result<Expr> {
        let token: &'a Token<'a> = self.peek();

        let expr = match &token.token_type {
            TokenType::IDENTIFIER => {
                self.advance();
                Expr::Identifier(token.lexeme.to_string())
            }

            TokenType::INT(Some(n)) => {
                self.advance();
                Expr::Integer(*n)
            }

            TokenType::INT(None) => {
                return Err(KestrelError::parse(
                    token.position,
                    format!("could not parse '{}' as integer", token.lexeme),
                ));
            }

            TokenType::FLOAT(n) => {
                self.advance();
                Expr::Float(*n)
            }

            TokenType::STRING(s) => {
                self.advance();
                Expr::Str(s.clone())
            }

            TokenType::TRUE => {
                self.advance();
                Expr::Boolean(true)
            }

            TokenType::FALSE => {
                self.advance();
                Expr::Boolean(false)
            }

            TokenType::NULL => {
                self.advance();
                Expr::Null
            }

            TokenType::BANG | TokenType::MINUS => {
                self.advance();

                let operator = if token.token_type == TokenType::BANG {
                    PrefixOperator::Not
                } else {
                    PrefixOperator::Negate
                };
                let operand: Expr = self.parse_expression(Precedence::Prefix)?;

                Expr::Prefix {
                    operator,
                    operand: Box::new(operand),
                }
            }

            TokenType::LEFT_PAREN => {
                self.advance();

                let expr: Expr = self.expression()?;
                self.consume(TokenType::RIGHT_PAREN, "grouped expression")?;

                expr
            }

            TokenType::LEFT_BRACKET => {
                self.advance();

                Expr::Array(self.expression_list(TokenType::RIGHT_BRACKET, "array literal")?)
            }

            TokenType::IF => {
                self.advance();
                self.if_expression()?
            }

            TokenType::FUNC => {
                self.advance();
                self.function_literal()?
            }

            _ => {
                debug!("No prefix rule for {:?}", token.token_type);

                return Err(KestrelError::parse(
                    token.position,
                    format!(
                        "no prefix parse function for {} ('{}')",
                        token.token_type.name(),
                        token.lexeme
                    ),
                ));
            }
        };

        Ok(expr)
    }

    /// `operator` has already been consumed.
    fn infix(&mut self, left: Expr, operator: &'a Token<'a>) -> Result<Expr> {
        match operator.token_type {
            TokenType::LEFT_PAREN => {
                let arguments = self.expression_list(TokenType::RIGHT_PAREN, "call arguments")?;

                Ok(Expr::Call {
                    function: Box::new(left),
                    arguments,
                })
            }

            TokenType::LEFT_BRACKET => {
                let index: Expr = self.expression()?;
                self.consume(TokenType::RIGHT_BRACKET, "index expression")?;

                Ok(Expr::Index {
                    collection: Box::new(left),
                    index: Box::new(index),
                })
            }

            _ => {
                let precedence = Precedence::of(&operator.token_type);
                let op = InfixOperator::from_token(&operator.token_type).ok_or_else(|| {
                    KestrelError::parse(
                        operator.position,
                        format!("no infix parse function for {}", operator.token_type.name()),
                    )
                })?;

                // Same precedence on the right keeps the operator left‑associative.
                let right: Expr = self.parse_expression(precedence)?;

                Ok(Expr::Infix {
                    operator: op,
                    left: Box::new(left),
                    right: Box::new(right),
                })
            }
        }
    }

    fn if_expression(&mut self) -> Result<Expr> {
        self.consume(TokenType::LEFT_PAREN, "if condition")?;
        let condition: Expr = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "if condition")?;

        self.consume(TokenType::LEFT_BRACE, "if consequence")?;
        let consequence: BlockStatement = self.block()?;

        let alternative: Option<BlockStatement> = if self.matches(TokenType::ELSE) {
            if self.matches(TokenType::IF) {
                // `else if` is an alternative block holding the nested if.
                let nested: Expr = self.if_expression()?;

                Some(BlockStatement {
                    statements: vec![Stmt::Expression(nested)],
                })
            } else {
                self.consume(TokenType::LEFT_BRACE, "else branch")?;
                Some(self.block()?)
            }
        } else {
            None
        };

        Ok(Expr::If {
            condition: Box::new(condition),
            consequence,
            alternative,
        })
    }

    fn function_literal(&mut self) -> Result<Expr> {
        self.consume(TokenType::LEFT_PAREN, "function parameters")?;

        let mut parameters: Vec<String> = Vec::new();

        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                let param = self.consume(TokenType::IDENTIFIER, "function parameters")?;
                parameters.push(param.lexeme.to_string());

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        self.consume(TokenType::RIGHT_PAREN, "function parameters")?;
        self.consume(TokenType::LEFT_BRACE, "function body")?;

        let body: BlockStatement = self.block()?;

        Ok(Expr::Function(FunctionLiteral {
            parameters: parameters.into(),
            body: Rc::new(body),
        }))
    }

    /// Comma separated expressions up to `end`; the opening token is consumed.
    fn expression_list(&mut self, end: TokenType, context: &str) -> Result<Vec<Expr>> {
        let mut items: Vec<Expr> = Vec::new();

        if self.matches(end.clone()) {
            return Ok(items);
        }

        loop {
            items.push(self.expression()?);

            if !self.matches(TokenType::COMMA) {
                break;
            }
        }

        self.consume(end, context)?;

        Ok(items)
    }

    // ────────────────────── utility helpers ───────────────────────

    #[inline(always)]
    fn matches(&mut self, ttype: TokenType) -> bool {
        if self.check(ttype) {
            self.advance();

            return true;
        }

        false
    }

    fn consume(&mut self, ttype: TokenType, context: &str) -> Result<&'a Token<'a>> {
        if self.check(ttype.clone()) {
            return Ok(self.advance());
        }

        let found: &Token<'_> = self.peek();
        debug!("consume failed: wanted {:?}, found {:?}", ttype, found.token_type);

        Err(KestrelError::parse(
            found.position,
            format!(
                "expected next token to be {}, got {} ('{}') while parsing {}",
                ttype.name(),
                found.token_type.name(),
                found.lexeme,
                context
            ),
        ))
    }

    #[inline(always)]
    fn check(&self, ttype: TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }

        self.peek().token_type == ttype
    }

    #[inline(always)]
    fn check_next(&self, ttype: TokenType) -> bool {
        self.tokens
            .get(self.current + 1)
            .is_some_and(|t| t.token_type == ttype)
    }

    #[inline(always)]
    fn advance(&mut self) -> &'a Token<'a> {
        if !self.is_at_end() {
            self.current += 1;
        }

        self.previous()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        matches!(self.peek().token_type, TokenType::EOF)
    }

    /// Current token.  A slice without `EOF` is treated as ending at its last token.
    #[inline(always)]
    fn peek(&self) -> &'a Token<'a> {
        let tokens: &'a [Token<'a>] = self.tokens;

        &tokens[self.current.min(tokens.len().saturating_sub(1))]
    }

    #[inline(always)]
    fn previous(&self) -> &'a Token<'a> {
        let tokens: &'a [Token<'a>] = self.tokens;

        &tokens[self.current.saturating_sub(1)]
    }

    /// Discards tokens until it thinks it is at a statement boundary.
    fn synchronize(&mut self) {
        let in_block: bool = self.block_depth > 0;

        // A `}` that caused the error belongs to the enclosing block.
        if !(in_block && self.check(TokenType::RIGHT_BRACE)) {
            self.advance();
        }

        while !self.is_at_end() {
            if matches!(self.previous().token_type, TokenType::SEMICOLON) {
                return;
            }

            match self.peek().token_type {
                TokenType::VAR | TokenType::FOR | TokenType::RETURN => return,
                TokenType::RIGHT_BRACE if in_block => return,
                _ => {}
            }

            self.advance();
        }
    }
}
