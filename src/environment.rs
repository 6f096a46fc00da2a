use crate::value::Value;
use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// One lexical scope.  Children hold a strong reference to their parent;
/// parents never reference their children.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Fresh shared root scope.
    pub fn new_root() -> Rc<RefCell<Environment>> {
        Rc::new(RefCell::new(Environment::new()))
    }

    /// Fresh shared scope whose parent is `enclosing`.
    pub fn new_enclosed(enclosing: &Rc<RefCell<Environment>>) -> Rc<RefCell<Environment>> {
        Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(enclosing))))
    }

    /// Bind `name` in this scope, replacing a binding of the same name here
    /// and shadowing any outer one.
    pub fn define(&mut self, name: &str, value: Value) {
        debug!("define {} = {}", name, value);

        self.values.insert(name.to_string(), value);
    }

    /// Look `name` up in this scope, then outward through the parents.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.values.get(name) {
            Some(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            None
        }
    }

    /// Rebind the nearest existing binding of `name`.
    pub fn assign(&mut self, name: &str, value: Value) -> Result<(), String> {
        if let Some(slot) = self.values.get_mut(name) {
            debug!("assign {} = {}", name, value);
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(format!("identifier not found: {}", name))
        }
    }

    /// Is `name` bound in this scope (ignoring parents)?
    pub fn contains_local(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_walks_outward() {
        let root = Environment::new_root();
        root.borrow_mut().define("x", Value::Integer(1));

        let child = Environment::new_enclosed(&root);

        assert_eq!(child.borrow().get("x"), Some(Value::Integer(1)));
        assert_eq!(child.borrow().get("y"), None);
    }

    #[test]
    fn define_shadows_without_touching_parent() {
        let root = Environment::new_root();
        root.borrow_mut().define("x", Value::Integer(1));

        let child = Environment::new_enclosed(&root);
        child.borrow_mut().define("x", Value::Integer(2));

        assert_eq!(child.borrow().get("x"), Some(Value::Integer(2)));
        assert_eq!(root.borrow().get("x"), Some(Value::Integer(1)));
        assert!(child.borrow().contains_local("x"));
    }

    #[test]
    fn assign_updates_nearest_binding() {
        let root = Environment::new_root();
        root.borrow_mut().define("x", Value::Integer(1));

        let child = Environment::new_enclosed(&root);
        child
            .borrow_mut()
            .assign("x", Value::Integer(5))
            .expect("x is bound in the root");

        assert_eq!(root.borrow().get("x"), Some(Value::Integer(5)));
        assert!(!child.borrow().contains_local("x"));
    }

    #[test]
    fn assign_to_unbound_name_fails() {
        let root = Environment::new_root();

        let err = root
            .borrow_mut()
            .assign("nope", Value::Null)
            .unwrap_err();

        assert_eq!(err, "identifier not found: nope");
    }
}
