use crate::ast::{Expr, Program, Stmt};
use crate::environment::{Binding, Environment, Function};
use crate::error::{ScriptError, Span};
use crate::stack::ensure_sufficient_stack;
use crate::value::Value;
use std::rc::Rc;

/// Runs parsed statements against an environment it owns.
pub struct Evaluator {
    environment: Environment,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(Environment::new())
    }
}

impl Evaluator {
    pub fn new(environment: Environment) -> Self {
        Self { environment }
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn environment_mut(&mut self) -> &mut Environment {
        &mut self.environment
    }

    pub fn into_environment(self) -> Environment {
        self.environment
    }

    /// Execute statements in order, stopping at the first error. Effects of
    /// statements that already ran are kept.
    pub fn evaluate_program(&mut self, program: &Program) -> Result<(), ScriptError> {
        for statement in &program.statements {
            self.execute_statement(statement)?;
        }
        Ok(())
    }

    pub fn execute_statement(&mut self, stmt: &Stmt) -> Result<(), ScriptError> {
        tracing::debug!(line = stmt.line(), "executing statement");

        match stmt {
            Stmt::Assign { name, value, .. } => {
                let value = self.evaluate_expression(value)?;
                self.environment.define_variable(name, value);
                Ok(())
            }
            Stmt::Expression { expr, .. } => {
                self.evaluate_expression(expr)?;
                Ok(())
            }
        }
    }

    pub fn evaluate_expression(&mut self, expr: &Expr) -> Result<Value, ScriptError> {
        ensure_sufficient_stack(|| self.evaluate_expression_inner(expr))
    }

    fn evaluate_expression_inner(&mut self, expr: &Expr) -> Result<Value, ScriptError> {
        match expr {
            Expr::Literal { value, .. } => Ok(value.clone()),
            Expr::Variable { name, span } => match self.environment.resolve(name, *span)? {
                Binding::Variable(value) => Ok(value.clone()),
                Binding::Function(function) => Ok(Value::Function(function.clone())),
            },
            Expr::Tuple { elements, .. } => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.evaluate_expression(element)?);
                }
                Ok(Value::Tuple(values))
            }
            Expr::Call { name, args, span } => {
                let function = self.resolve_function(name, *span)?;
                function.check_arity(args.len(), *span)?;

                let mut arg_values = Vec::with_capacity(args.len());
                for arg in args {
                    arg_values.push(self.evaluate_expression(arg)?);
                }

                tracing::trace!(
                    function = %function.name,
                    args = arg_values.len(),
                    line = span.line,
                    "call"
                );
                function.invoke(arg_values, *span)
            }
        }
    }

    /// The callee is looked up when the call runs, so rebinding a name
    /// between statements changes what later calls reach.
    fn resolve_function(&self, name: &str, span: Span) -> Result<Rc<Function>, ScriptError> {
        match self.environment.resolve(name, span)? {
            Binding::Function(function) => Ok(function.clone()),
            Binding::Variable(Value::Function(function)) => Ok(function.clone()),
            Binding::Variable(value) => Err(ScriptError::NotCallable {
                span,
                name: name.to_string(),
                type_name: value.type_name(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::Arity;
    use crate::error::HandlerError;
    use crate::lexer::tokenize;
    use crate::parser::Parser;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    fn run(evaluator: &mut Evaluator, source: &str) -> Result<(), ScriptError> {
        let program = Parser::new(tokenize(source)?).parse()?;
        evaluator.evaluate_program(&program)
    }

    fn number(n: f64) -> Value {
        Value::Number(n)
    }

    #[test]
    fn tuple_evaluates_in_order() {
        let mut evaluator = Evaluator::default();
        run(&mut evaluator, "c=(1,2,3)\nd=(\"a\",(c,4))").unwrap();

        let c = Value::Tuple(vec![number(1.0), number(2.0), number(3.0)]);
        assert_eq!(evaluator.environment().get_variable("c"), Some(&c));
        assert_eq!(
            evaluator.environment().get_variable("d"),
            Some(&Value::Tuple(vec![
                Value::from("a"),
                Value::Tuple(vec![c.clone(), number(4.0)]),
            ]))
        );
    }

    #[test]
    fn reassignment_is_late_bound() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        let mut env = Environment::new();
        env.register("record", Arity::Exact(1), move |args: Vec<Value>| {
            log.borrow_mut().extend(args);
            Ok(Value::Nil)
        });

        let mut evaluator = Evaluator::new(env);
        run(&mut evaluator, "alpha=1\nrecord(alpha)\nalpha=2\nrecord(alpha)").unwrap();

        assert_eq!(*seen.borrow(), vec![number(1.0), number(2.0)]);
        assert_eq!(evaluator.environment().get_variable("alpha"), Some(&number(2.0)));
    }

    #[test]
    fn arguments_are_evaluated_left_to_right_before_the_call() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut env = Environment::new();
        for name in ["outer", "a", "b"] {
            let order = order.clone();
            env.register(name, Arity::AtLeast(0), move |_args: Vec<Value>| {
                order.borrow_mut().push(name);
                Ok(Value::Nil)
            });
        }

        let mut evaluator = Evaluator::new(env);
        run(&mut evaluator, "outer(a(), (b(), 1))").unwrap();
        assert_eq!(*order.borrow(), vec!["a", "b", "outer"]);
    }

    #[test]
    fn undefined_function_is_a_name_error_on_its_line() {
        let mut evaluator = Evaluator::default();
        let err = run(&mut evaluator, "a=1\n\nrun(1e-9)").unwrap_err();
        assert!(matches!(err, ScriptError::Name { ref name, .. } if name == "run"));
        assert_eq!(err.line(), 3);
    }

    #[test]
    fn arity_error_skips_argument_evaluation() {
        let calls = Rc::new(RefCell::new(0));
        let counter = calls.clone();
        let mut env = Environment::new();
        env.register("run", Arity::Exact(1), |_args: Vec<Value>| Ok(Value::Nil));
        env.register("tick", Arity::Exact(0), move |_args: Vec<Value>| {
            *counter.borrow_mut() += 1;
            Ok(Value::Nil)
        });

        let mut evaluator = Evaluator::new(env);
        let err = run(&mut evaluator, "run(tick(), tick())").unwrap_err();
        assert!(matches!(err, ScriptError::Arity { got: 2, .. }));
        assert_eq!(*calls.borrow(), 0);
    }

    #[test]
    fn failure_keeps_earlier_bindings() {
        let mut env = Environment::new();
        env.register("fail", Arity::Exact(0), |_args: Vec<Value>| {
            Err(HandlerError::new("solver diverged"))
        });

        let mut evaluator = Evaluator::new(env);
        let err = run(&mut evaluator, "a=1\nfail()\nb=2").unwrap_err();
        assert!(matches!(err, ScriptError::Handler { ref message, .. } if message == "solver diverged"));
        assert_eq!(err.line(), 2);
        assert_eq!(evaluator.environment().get_variable("a"), Some(&number(1.0)));
        assert!(!evaluator.environment().contains("b"));
    }

    #[test]
    fn calling_a_variable_is_not_callable() {
        let mut evaluator = Evaluator::default();
        let err = run(&mut evaluator, "m=(1,0,0)\nm(1)").unwrap_err();
        assert!(matches!(err, ScriptError::NotCallable { type_name: "tuple", .. }));
    }

    #[test]
    fn functions_can_be_aliased_and_rebound() {
        let mut env = Environment::new();
        env.register("twice", Arity::Exact(1), |args: Vec<Value>| {
            let n = args[0].as_number().ok_or_else(|| HandlerError::new("expected a number"))?;
            Ok(Value::Number(2.0 * n))
        });

        let mut evaluator = Evaluator::new(env);
        run(&mut evaluator, "f=twice\ny=f(3)\ntwice=1").unwrap();
        assert_eq!(evaluator.environment().get_variable("y"), Some(&number(6.0)));
        assert_eq!(evaluator.environment().get_variable("twice"), Some(&number(1.0)));

        let err = run(&mut evaluator, "twice(3)").unwrap_err();
        assert!(matches!(err, ScriptError::NotCallable { .. }));
        // The alias still holds the original function.
        run(&mut evaluator, "z=f(4)").unwrap();
        assert_eq!(evaluator.environment().get_variable("z"), Some(&number(8.0)));
    }

    #[test]
    fn deeply_nested_calls_evaluate() {
        let depth = 10_000;
        let source = format!("y={}1{}", "inc(".repeat(depth), ")".repeat(depth));

        // Same stack size as a process main thread; the test harness threads are smaller.
        let result = std::thread::Builder::new()
            .stack_size(8 * 1024 * 1024)
            .spawn(move || {
                let mut env = Environment::new();
                env.register("inc", Arity::Exact(1), |args: Vec<Value>| {
                    let n = args[0]
                        .as_number()
                        .ok_or_else(|| HandlerError::new("expected a number"))?;
                    Ok(Value::Number(n + 1.0))
                });
                let mut evaluator = Evaluator::new(env);
                run(&mut evaluator, &source)
                    .map(|()| evaluator.environment().get_variable("y").and_then(Value::as_number))
            })
            .unwrap()
            .join()
            .unwrap();

        assert_eq!(result, Ok(Some(10_001.0)));
    }

    #[test]
    fn bare_expression_has_no_effect() {
        let mut evaluator = Evaluator::default();
        run(&mut evaluator, "(1,2,3)\n\"text\"\n4").unwrap();
        assert!(evaluator.environment().names().is_empty());
    }
}
