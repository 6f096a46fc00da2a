//! Tree‑walking evaluator.
//!
//! Every rule returns [`IResult<Value>`].  The `Err` side carries the two
//! control‑flow signals of the language, so `?` is the short‑circuit at each
//! composition point:
//!
//! * [`Signal::Return`] unwinds through blocks and loops until a function
//!   call boundary unwraps it (or it reaches the top level);
//! * [`Signal::Error`] unwinds all the way out and becomes the result of the
//!   program.
//!
//! Operands, arguments and array elements are evaluated left to right; the
//! first error stops evaluation of the remaining siblings.

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, info};
use thiserror::Error;

use crate::builtins;
use crate::environment::Environment;
use crate::error::{KestrelError, Result};
use crate::parser::{BlockStatement, Expr, InfixOperator, PrefixOperator, Program, Stmt};
use crate::value::{Function, Value, NULL};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Signal {
    #[error("{0}")]
    Error(String),

    #[error("Return signal with value: {0}")]
    Return(Value),
}

/// Convenient alias for evaluation results.
pub type IResult<T> = std::result::Result<T, Signal>;

fn error<T>(message: String) -> IResult<T> {
    debug!("Error: {}", message);

    Err(Signal::Error(message))
}

pub struct Interpreter {
    globals: Rc<RefCell<Environment>>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Creates an interpreter with an empty root environment.
    pub fn new() -> Self {
        info!("Initializing Interpreter");

        Self {
            globals: Environment::new_root(),
        }
    }

    /// Creates an interpreter evaluating against an existing root environment.
    pub fn with_environment(globals: Rc<RefCell<Environment>>) -> Self {
        info!("Initializing Interpreter over a caller-supplied environment");

        Self { globals }
    }

    /// The root environment; bindings persist across `eval_program` calls.
    pub fn environment(&self) -> &Rc<RefCell<Environment>> {
        &self.globals
    }

    /// Evaluates a program in the root environment.
    ///
    /// A top‑level `return` yields `Value::Return`, a failure `Value::Error`;
    /// otherwise the value of the last statement (or `null`).
    pub fn eval_program(&mut self, program: &Program) -> Value {
        debug!("Interpreting {} statements", program.statements.len());

        let globals = Rc::clone(&self.globals);

        let value = match self.execute_statements(&program.statements, &globals) {
            Ok(value) => value,
            Err(Signal::Return(value)) => Value::Return(Box::new(value)),
            Err(Signal::Error(message)) => Value::Error(message),
        };

        info!("Interpretation completed with {}", value.type_name());

        value
    }

    /// Like [`eval_program`](Self::eval_program), but maps an error result to
    /// [`KestrelError::Runtime`] and unwraps a top‑level return.
    pub fn interpret(&mut self, program: &Program) -> Result<Value> {
        match self.eval_program(program) {
            Value::Error(message) => Err(KestrelError::Runtime(message)),
            Value::Return(value) => Ok(*value),
            value => Ok(value),
        }
    }

    // ───────────────────────────── statements ─────────────────────────────

    /// Runs statements in `env`; the value is that of the last one.
    fn execute_statements(&self, stmts: &[Stmt], env: &Rc<RefCell<Environment>>) -> IResult<Value> {
        let mut result = NULL;

        for stmt in stmts {
            result = self.execute(stmt, env)?;
        }

        Ok(result)
    }

    fn execute_block(&self, block: &BlockStatement, env: &Rc<RefCell<Environment>>) -> IResult<Value> {
        self.execute_statements(&block.statements, env)
    }

    /// Executes a single statement.
    pub fn execute(&self, stmt: &Stmt, env: &Rc<RefCell<Environment>>) -> IResult<Value> {
        match stmt {
            Stmt::Expression(expr) => self.evaluate(expr, env),

            Stmt::Var { name, value } => {
                debug!("Defining variable '{}'", name);

                let value = self.evaluate(value, env)?;
                env.borrow_mut().define(name, value);

                Ok(NULL)
            }

            Stmt::Assign { name, value } => {
                debug!("Assigning to variable '{}'", name);

                let value = self.evaluate(value, env)?;
                env.borrow_mut().assign(name, value).map_err(Signal::Error)?;

                Ok(NULL)
            }

            Stmt::Return { value } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr, env)?,
                    None => NULL,
                };

                debug!("Returning value: {}", value);

                Err(Signal::Return(value))
            }

            Stmt::For {
                init,
                condition,
                update,
                body,
            } => self.execute_for(init.as_deref(), condition.as_ref(), update.as_deref(), body, env),
        }
    }

    fn execute_for(
        &self,
        init: Option<&Stmt>,
        condition: Option<&Expr>,
        update: Option<&Stmt>,
        body: &BlockStatement,
        env: &Rc<RefCell<Environment>>,
    ) -> IResult<Value> {
        debug!("Entering for loop");

        // One scope for the whole loop: init, condition, body and update.
        let loop_env = Environment::new_enclosed(env);

        if let Some(init) = init {
            self.execute(init, &loop_env)?;
        }

        let mut result = NULL;
        let mut iterations: usize = 0;

        loop {
            if let Some(condition) = condition {
                if !self.evaluate(condition, &loop_env)?.is_truthy() {
                    break;
                }
            }

            result = self.execute_block(body, &loop_env)?;
            iterations += 1;

            if let Some(update) = update {
                self.execute(update, &loop_env)?;
            }
        }

        debug!("Exited for loop after {} iterations", iterations);

        Ok(result)
    }

    // ───────────────────────────── expressions ────────────────────────────

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&self, expr: &Expr, env: &Rc<RefCell<Environment>>) -> IResult<Value> {
        match expr {
            Expr::Identifier(name) => self.evaluate_identifier(name, env),

            Expr::Integer(n) => Ok(Value::Integer(*n)),

            Expr::Float(n) => Ok(Value::Float(*n)),

            Expr::Str(s) => Ok(Value::from(s.as_str())),

            Expr::Boolean(b) => Ok(Value::from(*b)),

            Expr::Null => Ok(NULL),

            Expr::Array(elements) => {
                let items = self.evaluate_all(elements, env)?;

                Ok(Value::Array(Rc::new(items)))
            }

            Expr::Prefix { operator, operand } => {
                let operand = self.evaluate(operand, env)?;

                evaluate_prefix(*operator, operand)
            }

            Expr::Infix {
                operator,
                left,
                right,
            } => {
                let left = self.evaluate(left, env)?;
                let right = self.evaluate(right, env)?;

                evaluate_infix(*operator, &left, &right)
            }

            Expr::If {
                condition,
                consequence,
                alternative,
            } => {
                let condition = self.evaluate(condition, env)?;

                if condition.is_truthy() {
                    self.execute_block(consequence, env)
                } else if let Some(alternative) = alternative {
                    self.execute_block(alternative, env)
                } else {
                    Ok(NULL)
                }
            }

            Expr::Function(literal) => Ok(Value::Function(Rc::new(Function {
                parameters: Rc::clone(&literal.parameters),
                body: Rc::clone(&literal.body),
                env: Rc::clone(env),
            }))),

            Expr::Call {
                function,
                arguments,
            } => {
                let callee = self.evaluate(function, env)?;
                let args = self.evaluate_all(arguments, env)?;

                self.invoke_callable(&callee, args)
            }

            Expr::Index { collection, index } => {
                let collection = self.evaluate(collection, env)?;
                let index = self.evaluate(index, env)?;

                evaluate_index(&collection, &index)
            }
        }
    }

    fn evaluate_all(&self, exprs: &[Expr], env: &Rc<RefCell<Environment>>) -> IResult<Vec<Value>> {
        exprs.iter().map(|e| self.evaluate(e, env)).collect()
    }

    fn evaluate_identifier(&self, name: &str, env: &Rc<RefCell<Environment>>) -> IResult<Value> {
        if let Some(value) = env.borrow().get(name) {
            return Ok(value);
        }

        if let Some(builtin) = builtins::lookup(name) {
            return Ok(Value::Builtin(builtin));
        }

        error(format!("identifier not found: {}", name))
    }

    /// Invokes a callable (user-defined closure or builtin).
    fn invoke_callable(&self, callee: &Value, args: Vec<Value>) -> IResult<Value> {
        match callee {
            Value::Function(func) => {
                debug!("Calling function with {} args", args.len());

                if args.len() != func.parameters.len() {
                    return error(format!(
                        "wrong number of arguments: want={}, got={}",
                        func.parameters.len(),
                        args.len()
                    ));
                }

                // Parent is the captured scope, not the caller's.
                let call_env = Environment::new_enclosed(&func.env);
                {
                    let mut scope = call_env.borrow_mut();
                    for (param, arg) in func.parameters.iter().zip(args) {
                        scope.define(param, arg);
                    }
                }

                match self.execute_block(&func.body, &call_env) {
                    Err(Signal::Return(value)) => Ok(value),
                    other => other,
                }
            }

            Value::Builtin(builtin) => builtin.call(&args).map_err(Signal::Error),

            other => error(format!("not a function: {}", other.type_name())),
        }
    }
}

// ───────────────────────────── operators ──────────────────────────────────

fn evaluate_prefix(operator: PrefixOperator, operand: Value) -> IResult<Value> {
    match operator {
        PrefixOperator::Not => Ok(Value::from(!operand.is_truthy())),

        PrefixOperator::Negate => match operand {
            Value::Integer(n) => Ok(Value::Integer(n.wrapping_neg())),
            Value::Float(n) => Ok(Value::Float(-n)),
            other => error(format!("unknown operator: -{}", other.type_name())),
        },
    }
}

fn evaluate_infix(operator: InfixOperator, left: &Value, right: &Value) -> IResult<Value> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => integer_infix(operator, *a, *b),

        (Value::Float(a), Value::Float(b)) => Ok(float_infix(operator, *a, *b)),
        (Value::Float(a), Value::Integer(b)) => Ok(float_infix(operator, *a, *b as f64)),
        (Value::Integer(a), Value::Float(b)) => Ok(float_infix(operator, *a as f64, *b)),

        (Value::String(a), Value::String(b)) => string_infix(operator, a, b),

        _ if operator == InfixOperator::Equal => Ok(Value::from(left.identical(right))),
        _ if operator == InfixOperator::NotEqual => Ok(Value::from(!left.identical(right))),

        _ if left.type_name() != right.type_name() => error(format!(
            "type mismatch: {} {} {}",
            left.type_name(),
            operator,
            right.type_name()
        )),

        _ => error(format!(
            "unknown operator: {} {} {}",
            left.type_name(),
            operator,
            right.type_name()
        )),
    }
}

/// Wrapping arithmetic, truncating division.
fn integer_infix(operator: InfixOperator, a: i64, b: i64) -> IResult<Value> {
    let value = match operator {
        InfixOperator::Add => Value::Integer(a.wrapping_add(b)),
        InfixOperator::Subtract => Value::Integer(a.wrapping_sub(b)),
        InfixOperator::Multiply => Value::Integer(a.wrapping_mul(b)),
        InfixOperator::Divide => {
            if b == 0 {
                return error("division by zero".to_string());
            }

            Value::Integer(a.wrapping_div(b))
        }
        InfixOperator::Equal => Value::from(a == b),
        InfixOperator::NotEqual => Value::from(a != b),
        InfixOperator::Less => Value::from(a < b),
        InfixOperator::Greater => Value::from(a > b),
        InfixOperator::LessEqual => Value::from(a <= b),
        InfixOperator::GreaterEqual => Value::from(a >= b),
    };

    Ok(value)
}

fn float_infix(operator: InfixOperator, a: f64, b: f64) -> Value {
    match operator {
        InfixOperator::Add => Value::Float(a + b),
        InfixOperator::Subtract => Value::Float(a - b),
        InfixOperator::Multiply => Value::Float(a * b),
        InfixOperator::Divide => Value::Float(a / b),
        InfixOperator::Equal => Value::from(a == b),
        InfixOperator::NotEqual => Value::from(a != b),
        InfixOperator::Less => Value::from(a < b),
        InfixOperator::Greater => Value::from(a > b),
        InfixOperator::LessEqual => Value::from(a <= b),
        InfixOperator::GreaterEqual => Value::from(a >= b),
    }
}

fn string_infix(operator: InfixOperator, a: &str, b: &str) -> IResult<Value> {
    match operator {
        InfixOperator::Add => {
            let mut joined = String::with_capacity(a.len() + b.len());
            joined.push_str(a);
            joined.push_str(b);

            Ok(Value::String(Rc::from(joined)))
        }
        InfixOperator::Equal => Ok(Value::from(a == b)),
        InfixOperator::NotEqual => Ok(Value::from(a != b)),
        _ => error(format!("unknown operator: STRING {} STRING", operator)),
    }
}

/// Out‑of‑range (including negative) indices yield `null`.
fn evaluate_index(collection: &Value, index: &Value) -> IResult<Value> {
    match (collection, index) {
        (Value::Array(items), Value::Integer(i)) => Ok(usize::try_from(*i)
            .ok()
            .and_then(|i| items.get(i).cloned())
            .unwrap_or(NULL)),

        (Value::String(s), Value::Integer(i)) => Ok(usize::try_from(*i)
            .ok()
            .and_then(|i| s.chars().nth(i))
            .map(|c| Value::from(c.to_string().as_str()))
            .unwrap_or(NULL)),

        _ => error(format!(
            "index operator not supported: {}[{}]",
            collection.type_name(),
            index.type_name()
        )),
    }
}
