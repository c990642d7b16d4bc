// mxscript
//
// Front end of the command language that drives the simulation engine:
// lexer, parser, environment and evaluator. Simulation primitives are
// registered by the engine as native functions.

// Public modules
pub mod ast;
pub mod builtins;
pub mod config;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod repl;
pub mod runner;
pub mod value;

mod stack;

// Re-export commonly used items
pub use ast::{Expr, Program, Stmt};
pub use config::Config;
pub use environment::{Arity, Binding, Environment, Function, NativeFunction};
pub use error::{HandlerError, ScriptError, Span};
pub use evaluator::Evaluator;
pub use lexer::{tokenize, Lexer, Token, TokenType};
pub use parser::Parser;
pub use value::Value;

// Re-export main functions
pub use repl::start as start_repl;
pub use runner::{check, parse, run};
