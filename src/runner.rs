use crate::ast::Program;
use crate::error::ScriptError;
use crate::evaluator::Evaluator;
use crate::lexer::tokenize;
use crate::parser::Parser;

/// Lex and parse the whole script. Nothing runs if this fails.
pub fn parse(source: &str) -> Result<Program, ScriptError> {
    let tokens = tokenize(source)?;
    Parser::new(tokens).parse()
}

/// Validate a script without executing it; returns the statement count.
pub fn check(source: &str) -> Result<usize, ScriptError> {
    parse(source).map(|program| program.statements.len())
}

/// Parse `source` completely, then execute it with `evaluator`.
///
/// On an evaluation error the evaluator keeps every binding made by the
/// statements that ran before the failing one.
#[tracing::instrument(level = "debug", skip_all, fields(bytes = source.len()))]
pub fn run(source: &str, evaluator: &mut Evaluator) -> Result<(), ScriptError> {
    let program = parse(source)?;
    evaluator.evaluate_program(&program)
}
