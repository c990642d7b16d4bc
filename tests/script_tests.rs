// End-to-end script runs against a recording stand-in for the engine.

use mxscript::{runner, Arity, Environment, Evaluator, HandlerError, ScriptError, Value};
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;

const SAMPLE: &str = "alpha=1
\tsave(avg(m), \"m.dump\", 1e-12)
\trun(1e-9)
\tb=sin(2,(3,4)) // bye bye;
\tc=(1,2,3)
";

type CallLog = Rc<RefCell<Vec<(String, Vec<Value>)>>>;

/// Engine functions that record every call they receive.
fn engine() -> (Environment, CallLog) {
    let log: CallLog = Rc::new(RefCell::new(Vec::new()));
    let mut env = Environment::new();
    let unit_x = Value::Tuple(vec![Value::Number(1.0), Value::Number(0.0), Value::Number(0.0)]);
    env.define_variable("m", unit_x.clone());

    let functions = [
        ("save", Arity::Exact(3), Value::Nil),
        ("avg", Arity::Exact(1), unit_x),
        ("run", Arity::Exact(1), Value::Nil),
        ("sin", Arity::Exact(2), Value::Number(0.5)),
    ];
    for (name, arity, result) in functions {
        let log = log.clone();
        env.register(name, arity, move |args: Vec<Value>| {
            log.borrow_mut().push((name.to_string(), args));
            Ok(result.clone())
        });
    }

    (env, log)
}

fn calls_to<'a>(log: &'a [(String, Vec<Value>)], name: &str) -> Vec<&'a Vec<Value>> {
    log.iter()
        .filter(|(called, _)| called == name)
        .map(|(_, args)| args)
        .collect()
}

#[test]
fn sample_script_parses_into_five_statements() {
    let program = runner::parse(SAMPLE).unwrap();
    assert_eq!(program.statements.len(), 5);
    assert_eq!(runner::check(SAMPLE).unwrap(), 5);
}

#[test]
fn sample_script_dispatches_to_the_engine() {
    let (env, log) = engine();
    let mut evaluator = Evaluator::new(env);
    runner::run(SAMPLE, &mut evaluator).unwrap();

    let log = log.borrow();
    let names: Vec<&str> = log.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, vec!["avg", "save", "run", "sin"]);

    let save = calls_to(&log, "save");
    assert_eq!(save.len(), 1);
    assert_eq!(save[0].len(), 3);
    assert_eq!(save[0][0].type_name(), "tuple");
    assert_eq!(save[0][1], Value::from("m.dump"));
    assert_eq!(save[0][2], Value::Number(1e-12));

    assert_eq!(calls_to(&log, "run")[0], &vec![Value::Number(1e-9)]);

    let sin = calls_to(&log, "sin");
    assert_eq!(
        sin[0],
        &vec![
            Value::Number(2.0),
            Value::Tuple(vec![Value::Number(3.0), Value::Number(4.0)]),
        ]
    );

    let env = evaluator.into_environment();
    assert_eq!(env.get_variable("alpha"), Some(&Value::Number(1.0)));
    assert_eq!(env.get_variable("b"), Some(&Value::Number(0.5)));
    assert_eq!(
        env.get_variable("c"),
        Some(&Value::Tuple(vec![Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)]))
    );
}

#[test]
fn parse_errors_abort_before_anything_runs() {
    let (env, log) = engine();
    let mut evaluator = Evaluator::new(env);
    let err = runner::run("run(1e-9)\nalpha=1\nrun(1e-9", &mut evaluator).unwrap_err();

    assert!(matches!(err, ScriptError::Parse { .. }));
    assert_eq!(err.line(), 3);
    assert!(log.borrow().is_empty());
    assert!(!evaluator.environment().contains("alpha"));
}

#[test]
fn evaluation_errors_keep_completed_statements() {
    let (env, log) = engine();
    let mut evaluator = Evaluator::new(env);
    let err = runner::run("alpha=1\nrun(1e-9)\nrelax()\nbeta=2", &mut evaluator).unwrap_err();

    assert_eq!(
        err,
        ScriptError::Name {
            span: *err.span(),
            name: "relax".to_string()
        }
    );
    assert_eq!(err.line(), 3);
    assert_eq!(log.borrow().len(), 1);
    assert_eq!(evaluator.environment().get_variable("alpha"), Some(&Value::Number(1.0)));
    assert!(!evaluator.environment().contains("beta"));
}

#[test]
fn wrong_argument_count_never_reaches_the_handler() {
    let (env, log) = engine();
    let mut evaluator = Evaluator::new(env);
    let err = runner::run("run(1e-9, 2)", &mut evaluator).unwrap_err();

    match err {
        ScriptError::Arity {
            ref name,
            ref expected,
            got,
            ..
        } => {
            assert_eq!(name, "run");
            assert_eq!(expected, "1");
            assert_eq!(got, 2);
        }
        other => panic!("expected arity error, got {:?}", other),
    }
    assert!(log.borrow().is_empty());
}

#[test]
fn handler_errors_surface_with_line() {
    let mut env = Environment::new();
    env.register("load", Arity::Exact(1), |args: Vec<Value>| {
        let file = args[0].as_str().ok_or_else(|| HandlerError::new("expected a file name"))?;
        Err(HandlerError::new(format!("cannot open {}", file)))
    });
    let mut evaluator = Evaluator::new(env);

    let err = runner::run("\n\nload(\"m0.dump\")", &mut evaluator).unwrap_err();
    assert_eq!(err.to_string(), "line 3: load(): cannot open m0.dump");
}

#[test]
fn environment_survives_across_runs() {
    let (env, _log) = engine();
    let mut evaluator = Evaluator::new(env);
    runner::run("alpha=1", &mut evaluator).unwrap();
    runner::run("alpha=2\nbeta=alpha", &mut evaluator).unwrap();
    assert_eq!(evaluator.environment().get_variable("beta"), Some(&Value::Number(2.0)));
}
