use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::ast_printer::AstPrinter;
use crate::builtins::Builtin;
use crate::environment::Environment;
use crate::parser::BlockStatement;

/// Shared boolean/null constants.  Every `true`, `false` and `null` produced
/// by the evaluator is one of these, so [`Value::identical`] holds between any
/// two of them with the same payload.
pub const TRUE: Value = Value::Boolean(true);
pub const FALSE: Value = Value::Boolean(false);
pub const NULL: Value = Value::Null;

/// A closure: parameter names and body shared with the defining literal, plus
/// the environment that was active where the literal was evaluated.
pub struct Function {
    pub parameters: Rc<[String]>,
    pub body: Rc<BlockStatement>,
    pub env: Rc<RefCell<Environment>>,
}

impl PartialEq for Function {
    /// Functions are equal only to themselves.
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

// The captured environment may contain this very function; never print it.
impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("parameters", &self.parameters)
            .field("body", &AstPrinter::print_block(&self.body))
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    String(Rc<str>),
    Boolean(bool),
    Null,
    Array(Rc<Vec<Value>>),
    Function(Rc<Function>),
    Builtin(&'static Builtin),

    /// Result of a top‑level `return`; never stored in an environment.
    Return(Box<Value>),

    /// Evaluation failure surfaced to the caller of `eval_program`.
    Error(String),
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        if b {
            TRUE
        } else {
            FALSE
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Rc::from(s))
    }
}

impl Value {
    /// Upper‑case type name used in runtime error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "INTEGER",
            Value::Float(_) => "FLOAT",
            Value::String(_) => "STRING",
            Value::Boolean(_) => "BOOLEAN",
            Value::Null => "NULL",
            Value::Array(_) => "ARRAY",
            Value::Function(_) => "FUNCTION",
            Value::Builtin(_) => "BUILTIN",
            Value::Return(_) => "RETURN_VALUE",
            Value::Error(_) => "ERROR",
        }
    }

    /// `null` and `false` are falsy; everything else, including `0`, `0.0`
    /// and `""`, is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Boolean(false))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// Reference identity.  Booleans and null are shared constants and are
    /// identical by payload; strings, arrays and functions only when they are
    /// the same allocation.  Numbers are never compared this way.
    pub fn identical(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::String(a), Value::String(b)) => Rc::ptr_eq(a, b),
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => std::ptr::eq(*a, *b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => {
                let mut buf: itoa::Buffer = itoa::Buffer::new();
                f.write_str(buf.format(*n))
            }

            Value::Float(n) => {
                if n.is_finite() && n.fract() == 0.0 {
                    write!(f, "{:.1}", n)
                } else {
                    write!(f, "{}", n)
                }
            }

            Value::String(s) => f.write_str(s),

            Value::Boolean(b) => write!(f, "{}", b),

            Value::Null => f.write_str("null"),

            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }

            Value::Function(func) => write!(
                f,
                "func({}) {}",
                func.parameters.join(", "),
                AstPrinter::print_block(&func.body)
            ),

            Value::Builtin(builtin) => write!(f, "<builtin {}>", builtin.name),

            Value::Return(inner) => write!(f, "{}", inner),

            Value::Error(message) => write!(f, "ERROR: {}", message),
        }
    }
}
