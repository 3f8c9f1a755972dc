//! Syntactic function-name inference for JavaScript.
//!
//! Anonymous functions, arrows, generators, async functions and classes take
//! their `name` from where they appear in the source: the binding they
//! initialize, the identifier they are assigned to, the property or class
//! element key they define, or the destructuring target they default. The
//! [`naming`] module holds the inference engine; [`interpreter`] is a small
//! tree-walking host that calls into it at every construction site.

pub mod ast;
pub mod interpreter;
pub mod lexer;
pub mod logging;
pub mod naming;
pub mod parser;
pub mod types;

use interpreter::{Completion, Interpreter, NameRecord};
use parser::ParseError;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("Uncaught {0}")]
    Uncaught(String),
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Keep a [`NameRecord`] for every nameable value the script creates.
    pub record_names: bool,
}

#[derive(Debug, Default)]
pub struct RunOutput {
    /// Empty unless [`RunOptions::record_names`] was set.
    pub names: Vec<NameRecord>,
}

/// Parses and runs `source` as a classic script in a fresh realm.
pub fn run_source(source: &str, options: &RunOptions) -> Result<RunOutput, EngineError> {
    let program = parser::parse(source)?;
    let mut interp = Interpreter::new();
    if options.record_names {
        interp.record_names();
    }
    let completion = interp.run(&program);
    let names = interp.take_name_log();
    debug!(records = names.len(), "script finished");
    match completion {
        Completion::Throw(e) => Err(EngineError::Uncaught(interp.format_value(&e))),
        Completion::Normal(_) | Completion::Return(_) => Ok(RunOutput { names }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_errors_are_reported_before_running() {
        let err = run_source("var = ;", &RunOptions::default()).unwrap_err();
        assert!(matches!(err, EngineError::Parse(_)));
        assert!(err.to_string().starts_with("SyntaxError"));
    }

    #[test]
    fn uncaught_exceptions_render_name_and_message() {
        let err = run_source("throw new TypeError('nope');", &RunOptions::default()).unwrap_err();
        assert_eq!(err.to_string(), "Uncaught TypeError: nope");
    }

    #[test]
    fn names_are_only_recorded_on_request() {
        let source = "var f = function() {};";
        let quiet = run_source(source, &RunOptions::default()).unwrap();
        assert!(quiet.names.is_empty());
        let recorded = run_source(source, &RunOptions { record_names: true }).unwrap();
        assert_eq!(recorded.names.len(), 1);
        assert_eq!(recorded.names[0].name.as_deref(), Some("f"));
    }
}
