use std::fmt;

use crate::parser::{BlockStatement, Expr, FunctionLiteral, Program, Stmt};

/// Renders syntax trees back to source‑like text in which every prefix and
/// infix expression is fully parenthesised, e.g. `a + b * c` → `(a + (b * c))`.
///
/// Top‑level statements are concatenated without separators, so the program
/// `3 + 4; -5 * 5` renders as `(3 + 4)((-5) * 5)`.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print_program(program: &Program) -> String {
        program.statements.iter().map(Self::print_stmt).collect()
    }

    pub fn print_stmt(stmt: &Stmt) -> String {
        match stmt {
            Stmt::Expression(expr) => Self::print(expr),

            Stmt::Var { name, value } => format!("var {} = {};", name, Self::print(value)),

            Stmt::Assign { name, value } => format!("{} = {};", name, Self::print(value)),

            Stmt::Return { value: Some(value) } => format!("return {};", Self::print(value)),

            Stmt::Return { value: None } => "return;".into(),

            Stmt::For {
                init,
                condition,
                update,
                body,
            } => {
                // Clause statements print without their own trailing ';'.
                let clause = |stmt: &Option<Box<Stmt>>| {
                    stmt.as_deref()
                        .map(|s| Self::print_stmt(s).trim_end_matches(';').to_string())
                        .unwrap_or_default()
                };

                format!(
                    "for ({}; {}; {}) {}",
                    clause(init),
                    condition.as_ref().map(Self::print).unwrap_or_default(),
                    clause(update),
                    Self::print_block(body)
                )
            }
        }
    }

    pub fn print_block(block: &BlockStatement) -> String {
        if block.statements.is_empty() {
            return "{ }".into();
        }

        let inner: Vec<String> = block.statements.iter().map(Self::print_stmt).collect();

        format!("{{ {} }}", inner.join(" "))
    }

    pub fn print(expr: &Expr) -> String {
        match expr {
            // ── literals ────────────────────────────────────────────────
            Expr::Identifier(name) => name.clone(),

            Expr::Integer(n) => n.to_string(),

            // 3.0 stays "3.0" so floats are never mistaken for integers
            Expr::Float(n) => format!("{:?}", n),

            Expr::Str(s) => format!("\"{}\"", s),

            Expr::Boolean(b) => b.to_string(),

            Expr::Null => "null".into(),

            Expr::Array(elements) => format!("[{}]", Self::join(elements)),

            // ── operators ──────────────────────────────────────────────
            Expr::Prefix { operator, operand } => format!("({}{})", operator, Self::print(operand)),

            Expr::Infix {
                operator,
                left,
                right,
            } => format!(
                "({} {} {})",
                Self::print(left),
                operator,
                Self::print(right)
            ),

            // ── compound forms ─────────────────────────────────────────
            Expr::If {
                condition,
                consequence,
                alternative,
            } => {
                let mut s = format!(
                    "if ({}) {}",
                    Self::print(condition),
                    Self::print_block(consequence)
                );

                if let Some(alt) = alternative {
                    s.push_str(" else ");
                    s.push_str(&Self::print_block(alt));
                }

                s
            }

            Expr::Function(FunctionLiteral { parameters, body }) => {
                format!("func({}) {}", parameters.join(", "), Self::print_block(body))
            }

            Expr::Call {
                function,
                arguments,
            } => format!("{}({})", Self::print(function), Self::join(arguments)),

            Expr::Index { collection, index } => {
                format!("({}[{}])", Self::print(collection), Self::print(index))
            }
        }
    }

    fn join(exprs: &[Expr]) -> String {
        exprs.iter().map(Self::print).collect::<Vec<_>>().join(", ")
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&AstPrinter::print_program(self))
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&AstPrinter::print_stmt(self))
    }
}

impl fmt::Display for BlockStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&AstPrinter::print_block(self))
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&AstPrinter::print(self))
    }
}
