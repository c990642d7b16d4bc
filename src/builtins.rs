//! Generic helpers a host may install next to its engine functions.

use crate::environment::{Arity, Environment};
use crate::error::HandlerError;
use crate::value::Value;

pub fn install(environment: &mut Environment) {
    environment.register("print", Arity::AtLeast(0), print);
    environment.register("len", Arity::Exact(1), len);
    environment.register("type", Arity::Exact(1), type_of);
}

/// Environment with only the built-ins registered.
pub fn environment() -> Environment {
    let mut environment = Environment::new();
    install(&mut environment);
    environment
}

fn print(args: Vec<Value>) -> Result<Value, HandlerError> {
    println!("{}", join(&args));
    Ok(Value::Nil)
}

fn len(args: Vec<Value>) -> Result<Value, HandlerError> {
    match &args[0] {
        Value::String(s) => Ok(Value::Number(s.chars().count() as f64)),
        Value::Tuple(t) => Ok(Value::Number(t.len() as f64)),
        other => Err(HandlerError::new(format!(
            "len() not supported for type {}",
            other.type_name()
        ))),
    }
}

fn type_of(args: Vec<Value>) -> Result<Value, HandlerError> {
    Ok(Value::String(args[0].type_name().to_string()))
}

fn join(args: &[Value]) -> String {
    args.iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn len_of_tuples_and_strings() {
        let tuple = Value::Tuple(vec![Value::Number(1.0), Value::Number(2.0)]);
        assert_eq!(len(vec![tuple]).unwrap(), Value::Number(2.0));
        assert_eq!(len(vec![Value::from("m.dump")]).unwrap(), Value::Number(6.0));
        assert_eq!(
            len(vec![Value::Number(1.0)]).unwrap_err().message,
            "len() not supported for type number"
        );
    }

    #[test]
    fn type_names() {
        assert_eq!(type_of(vec![Value::Nil]).unwrap(), Value::from("nil"));
        assert_eq!(type_of(vec![Value::Tuple(vec![])]).unwrap(), Value::from("tuple"));
    }

    #[test]
    fn print_joins_with_spaces() {
        let args = vec![Value::from("t ="), Value::Number(1e-9)];
        assert_eq!(join(&args), "t = 0.000000001");
    }

    #[test]
    fn installed_builtins_are_rebindable() {
        let mut env = environment();
        assert_eq!(env.names(), vec!["len", "print", "type"]);
        env.define_variable("len", Value::Number(3.0));
        assert_eq!(env.get_variable("len"), Some(&Value::Number(3.0)));
    }
}
