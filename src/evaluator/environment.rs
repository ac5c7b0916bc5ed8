use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::Error;
use crate::ast::{Callable, Primitive, PrimitiveFn, Value};
use crate::evaluator::Arity;
use crate::symbol::Symbol;

struct Frame {
    bindings: RefCell<HashMap<Symbol, Value>>,
    parent: Option<Environment>,
}

/// Lexical scope: a shared handle to one frame of bindings plus its parent
/// chain. Cloning the handle shares the frame, so closures see later
/// `define`s and `set!`s made through any other handle.
#[derive(Clone)]
pub struct Environment(Rc<Frame>);

impl Environment {
    /// A root frame with no parent
    pub fn new() -> Self {
        Environment(Rc::new(Frame {
            bindings: RefCell::new(HashMap::new()),
            parent: None,
        }))
    }

    pub fn with_parent(parent: &Environment) -> Self {
        Environment(Rc::new(Frame {
            bindings: RefCell::new(HashMap::new()),
            parent: Some(parent.clone()),
        }))
    }

    pub fn parent(&self) -> Option<&Environment> {
        self.0.parent.as_ref()
    }

    /// Bind `name` in this frame only, shadowing any outer binding
    pub fn define(&self, name: Symbol, value: Value) {
        self.0.bindings.borrow_mut().insert(name, value);
    }

    /// Look `name` up in this frame, then outward
    pub fn find(&self, name: Symbol) -> Option<Value> {
        let mut env = self;
        loop {
            if let Some(value) = env.0.bindings.borrow().get(&name) {
                return Some(value.clone());
            }
            env = env.parent()?;
        }
    }

    /// Overwrite the innermost existing binding of `name`. Never creates one.
    pub fn set(&self, name: Symbol, value: Value) -> Result<(), Error> {
        let mut env = self;
        loop {
            if let Some(slot) = env.0.bindings.borrow_mut().get_mut(&name) {
                *slot = value;
                return Ok(());
            }
            env = env.parent().ok_or_else(|| Error::undefined_variable(name))?;
        }
    }

    /// Register a host function as a primitive procedure.
    ///
    /// Arity is checked before `func` runs, so the function may index its
    /// arguments freely within the declared bounds.
    ///
    /// # Example
    /// ```
    /// use schemelet::ast::Value;
    /// use schemelet::evaluator::{Arity, create_global_env, eval};
    /// use schemelet::scheme::parse_scheme;
    ///
    /// let env = create_global_env();
    /// env.register_builtin_function("twice", Arity::Exact(1), |args| match &args[0] {
    ///     Value::Integer(n) => Ok(Value::Integer(n * 2)),
    ///     other => Err(schemelet::Error::bad_type(format!("twice: {other}"))),
    /// });
    /// let expr = parse_scheme("(twice 21)").unwrap();
    /// assert_eq!(eval(&expr, &env).unwrap(), Value::Integer(42));
    /// ```
    pub fn register_builtin_function<F>(&self, name: &str, arity: Arity, func: F)
    where
        F: Fn(Vec<Value>) -> Result<Value, Error> + 'static,
    {
        let func: Rc<PrimitiveFn> = Rc::new(func);
        self.define(
            Symbol::intern(name),
            Value::procedure(Callable::Primitive(Primitive {
                name: name.to_owned(),
                arity,
                func,
            })),
        );
    }

    /// Get all bindings visible from this environment, sorted by name.
    /// Inner bindings hide outer ones of the same name.
    pub fn get_all_bindings(&self) -> Vec<(String, Value)> {
        let mut chain = vec![self];
        while let Some(parent) = chain[chain.len() - 1].parent() {
            chain.push(parent);
        }

        let mut bindings = HashMap::new();
        for env in chain.into_iter().rev() {
            for (name, value) in env.0.bindings.borrow().iter() {
                bindings.insert(name.name(), value.clone());
            }
        }

        let mut result: Vec<_> = bindings.into_iter().collect();
        result.sort_by(|a, b| a.0.cmp(&b.0));
        result
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::new()
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut depth = 0;
        let mut env = self;
        while let Some(parent) = env.parent() {
            depth += 1;
            env = parent;
        }
        write!(
            f,
            "Environment({} bindings, depth {depth})",
            self.0.bindings.borrow().len()
        )
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::ast::val;
    use maplit::hashmap;

    fn s(name: &str) -> Symbol {
        Symbol::intern(name)
    }

    fn populated(bindings: HashMap<&str, Value>, parent: Option<&Environment>) -> Environment {
        let env = match parent {
            Some(parent) => Environment::with_parent(parent),
            None => Environment::new(),
        };
        for (name, value) in bindings {
            env.define(s(name), value);
        }
        env
    }

    #[test]
    fn test_define_shadows_without_touching_parent() {
        let parent = populated(hashmap! { "x" => val(1), "y" => val("outer") }, None);
        let child = populated(hashmap! { "x" => val(2) }, Some(&parent));

        assert_eq!(child.find(s("x")), Some(val(2)));
        assert_eq!(parent.find(s("x")), Some(val(1)));
        assert_eq!(child.find(s("y")), Some(val("outer")));
        assert_eq!(child.find(s("missing")), None);
    }

    #[test]
    fn test_set_mutates_owning_frame() {
        let parent = populated(hashmap! { "counter" => val(0) }, None);
        let child = Environment::with_parent(&parent);

        child.set(s("counter"), val(5)).unwrap();
        assert_eq!(parent.find(s("counter")), Some(val(5)));
        assert_eq!(child.find(s("counter")), Some(val(5)));
        // Still owned by the parent only
        assert!(child.0.bindings.borrow().is_empty());

        let err = child.set(s("nowhere"), val(1)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UndefinedVariable);
        assert!(err.message.contains("nowhere"));
        assert_eq!(parent.find(s("nowhere")), None);
    }

    #[test]
    fn test_shared_frames_see_updates() {
        let env = Environment::new();
        let alias = env.clone();
        assert!(Rc::ptr_eq(&env.0, &alias.0));

        alias.define(s("late"), val(true));
        assert_eq!(env.find(s("late")), Some(val(true)));
        assert!(!Rc::ptr_eq(&env.0, &Environment::new().0));
    }

    #[test]
    fn test_get_all_bindings_sorted_and_shadowed() {
        let root = populated(hashmap! { "b" => val(1), "a" => val(2) }, None);
        let inner = populated(hashmap! { "b" => val(3), "c" => val(4) }, Some(&root));

        let names_and_values = inner.get_all_bindings();
        assert_eq!(
            names_and_values,
            vec![
                ("a".to_owned(), val(2)),
                ("b".to_owned(), val(3)),
                ("c".to_owned(), val(4)),
            ]
        );
        assert_eq!(root.get_all_bindings().len(), 2);
    }

    #[test]
    fn test_register_builtin_function() {
        let env = Environment::new();
        env.register_builtin_function("count-args", Arity::Any, |args| {
            Ok(Value::Integer(args.len() as i64))
        });

        let Some(Value::Procedure(callable)) = env.find(s("count-args")) else {
            panic!("expected a procedure binding");
        };
        let Callable::Primitive(primitive) = callable.as_ref() else {
            panic!("expected a primitive");
        };
        assert_eq!(primitive.name, "count-args");
        assert_eq!((primitive.func)(vec![val(1), val(2)]).unwrap(), val(2));
    }
}
