use crate::ast::Stmt;
use crate::environment::Environment;
use crate::error::ScriptError;
use crate::evaluator::Evaluator;
use crate::runner;
use crate::value::Value;
use std::io::{self, BufRead, Write};

/// Interactive prompt. Bindings persist from one line to the next.
pub fn start(environment: Environment) {
    println!("mxscript v{}", env!("CARGO_PKG_VERSION"));
    println!("Type 'exit' or press Ctrl+D to quit");
    println!();

    let mut evaluator = Evaluator::new(environment);
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        if io::stdout().flush().is_err() {
            break;
        }

        let line = match lines.next() {
            None => {
                // EOF reached (Ctrl+D or piped input ended)
                println!();
                break;
            }
            Some(Ok(line)) => line,
            Some(Err(error)) => {
                eprintln!("Error reading input: {}", error);
                break;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "exit" || line == "quit" {
            break;
        }

        match eval_line(line, &mut evaluator) {
            Ok(Some(value)) => println!("{}", value),
            Ok(None) => {}
            Err(error) => error.report(line, None),
        }
    }
}

/// Run one line. A lone expression yields its value for display; calls that
/// return nothing and assignments yield `None`.
pub fn eval_line(source: &str, evaluator: &mut Evaluator) -> Result<Option<Value>, ScriptError> {
    let program = runner::parse(source)?;

    if let [Stmt::Expression { expr, .. }] = program.statements.as_slice() {
        return match evaluator.evaluate_expression(expr)? {
            Value::Nil => Ok(None),
            value => Ok(Some(value)),
        };
    }

    evaluator.evaluate_program(&program)?;
    Ok(None)
}
