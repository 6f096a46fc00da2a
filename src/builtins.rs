//! Host‑implemented functions, consulted only after an identifier is not
//! found anywhere in the environment chain.

use std::fmt;
use std::rc::Rc;

use chrono::Utc;
use log::debug;
use phf::phf_map;

use crate::value::{Value, NULL};

/// Signature shared by every builtin.  An `Err` becomes an error signal at
/// the call site.
pub type BuiltinFn = fn(&[Value]) -> Result<Value, String>;

pub struct Builtin {
    pub name: &'static str,

    /// `None` accepts any number of arguments.
    pub arity: Option<usize>,

    func: BuiltinFn,
}

impl Builtin {
    /// Check arity and run the host function.
    pub fn call(&self, args: &[Value]) -> Result<Value, String> {
        debug!("Calling builtin '{}' with {} args", self.name, args.len());

        if let Some(want) = self.arity {
            if args.len() != want {
                return Err(format!(
                    "wrong number of arguments. got={}, want={}",
                    args.len(),
                    want
                ));
            }
        }

        (self.func)(args)
    }
}

impl PartialEq for Builtin {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builtin")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

static BUILTINS: phf::Map<&'static str, Builtin> = phf_map! {
    "len"   => Builtin { name: "len",   arity: Some(1), func: builtin_len },
    "first" => Builtin { name: "first", arity: Some(1), func: builtin_first },
    "last"  => Builtin { name: "last",  arity: Some(1), func: builtin_last },
    "rest"  => Builtin { name: "rest",  arity: Some(1), func: builtin_rest },
    "push"  => Builtin { name: "push",  arity: Some(2), func: builtin_push },
    "puts"  => Builtin { name: "puts",  arity: None,    func: builtin_puts },
    "type"  => Builtin { name: "type",  arity: Some(1), func: builtin_type },
    "clock" => Builtin { name: "clock", arity: Some(0), func: builtin_clock },
};

/// Look up a builtin by name.
pub fn lookup(name: &str) -> Option<&'static Builtin> {
    BUILTINS.get(name)
}

fn builtin_len(args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::String(s) => Ok(Value::Integer(s.chars().count() as i64)),
        Value::Array(items) => Ok(Value::Integer(items.len() as i64)),
        other => Err(format!(
            "argument to `len` not supported, got {}",
            other.type_name()
        )),
    }
}

fn expect_array<'v>(name: &str, arg: &'v Value) -> Result<&'v Rc<Vec<Value>>, String> {
    match arg {
        Value::Array(items) => Ok(items),
        other => Err(format!(
            "argument to `{}` must be ARRAY, got {}",
            name,
            other.type_name()
        )),
    }
}

fn builtin_first(args: &[Value]) -> Result<Value, String> {
    let items = expect_array("first", &args[0])?;

    Ok(items.first().cloned().unwrap_or(NULL))
}

fn builtin_last(args: &[Value]) -> Result<Value, String> {
    let items = expect_array("last", &args[0])?;

    Ok(items.last().cloned().unwrap_or(NULL))
}

fn builtin_rest(args: &[Value]) -> Result<Value, String> {
    let items = expect_array("rest", &args[0])?;

    if items.is_empty() {
        return Ok(NULL);
    }

    Ok(Value::Array(Rc::new(items[1..].to_vec())))
}

/// Arrays are immutable; `push` returns a new one.
fn builtin_push(args: &[Value]) -> Result<Value, String> {
    let items = expect_array("push", &args[0])?;

    let mut pushed: Vec<Value> = Vec::with_capacity(items.len() + 1);
    pushed.extend(items.iter().cloned());
    pushed.push(args[1].clone());

    Ok(Value::Array(Rc::new(pushed)))
}

fn builtin_puts(args: &[Value]) -> Result<Value, String> {
    for arg in args {
        println!("{}", arg);
    }

    Ok(NULL)
}

fn builtin_type(args: &[Value]) -> Result<Value, String> {
    Ok(Value::from(args[0].type_name()))
}

fn builtin_clock(_args: &[Value]) -> Result<Value, String> {
    let millis: i64 = Utc::now().timestamp_millis();

    Ok(Value::Float(millis as f64 / 1000.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn len_counts_chars_and_elements() {
        let len = lookup("len").expect("len is a builtin");

        assert_eq!(len.call(&[Value::from("héllo")]), Ok(Value::Integer(5)));
        assert_eq!(
            len.call(&[Value::Array(Rc::new(vec![NULL, NULL]))]),
            Ok(Value::Integer(2))
        );
        assert_eq!(
            len.call(&[Value::Integer(1)]),
            Err("argument to `len` not supported, got INTEGER".to_string())
        );
    }

    #[test]
    fn arity_is_checked() {
        let len = lookup("len").expect("len is a builtin");

        assert_eq!(
            len.call(&[]),
            Err("wrong number of arguments. got=0, want=1".to_string())
        );
    }

    #[test]
    fn unknown_names_are_absent() {
        assert!(lookup("nope").is_none());
    }
}
