use ariadne::{Color, Fmt, IndexType, Label, Report, ReportKind, Source};
use std::io;
use std::ops::Range;
use thiserror::Error;

/// Byte range into the script source, plus the 1-based line it starts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize) -> Self {
        Self { start, end, line }
    }

    /// Span covering `self` through `other`, keeping the first line.
    pub fn to(&self, other: &Span) -> Self {
        Self {
            start: self.start,
            end: other.end.max(self.start),
            line: self.line,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScriptError {
    #[error("line {}: {message}", .span.line)]
    Lex { span: Span, message: String },

    #[error("line {}: expected {expected}, found {found}", .span.line)]
    Parse {
        span: Span,
        expected: String,
        found: String,
        help: Option<String>,
    },

    #[error("line {}: undefined name '{name}'", .span.line)]
    Name { span: Span, name: String },

    #[error("line {}: '{name}' is a {type_name}, not a function", .span.line)]
    NotCallable {
        span: Span,
        name: String,
        type_name: &'static str,
    },

    #[error("line {}: {name}() takes {expected} argument(s), got {got}", .span.line)]
    Arity {
        span: Span,
        name: String,
        expected: String,
        got: usize,
    },

    #[error("line {}: {name}(): {message}", .span.line)]
    Handler {
        span: Span,
        name: String,
        message: String,
    },
}

impl ScriptError {
    pub fn lex_error(span: Span, message: String) -> Self {
        ScriptError::Lex { span, message }
    }

    pub fn illegal_character(span: Span, character: char) -> Self {
        ScriptError::Lex {
            span,
            message: format!("Unexpected character: '{}'", character),
        }
    }

    pub fn parse_error(span: Span, expected: impl Into<String>, found: impl Into<String>) -> Self {
        ScriptError::Parse {
            span,
            expected: expected.into(),
            found: found.into(),
            help: None,
        }
    }

    pub fn parse_error_with_help(
        span: Span,
        expected: impl Into<String>,
        found: impl Into<String>,
        help: impl Into<String>,
    ) -> Self {
        ScriptError::Parse {
            span,
            expected: expected.into(),
            found: found.into(),
            help: Some(help.into()),
        }
    }

    pub fn span(&self) -> &Span {
        match self {
            ScriptError::Lex { span, .. }
            | ScriptError::Parse { span, .. }
            | ScriptError::Name { span, .. }
            | ScriptError::NotCallable { span, .. }
            | ScriptError::Arity { span, .. }
            | ScriptError::Handler { span, .. } => span,
        }
    }

    pub fn line(&self) -> usize {
        self.span().line
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            ScriptError::Lex { .. } => "Lexical Error",
            ScriptError::Parse { .. } => "Parse Error",
            ScriptError::Name { .. } => "Name Error",
            ScriptError::NotCallable { .. } => "Call Error",
            ScriptError::Arity { .. } => "Arity Error",
            ScriptError::Handler { .. } => "Handler Error",
        }
    }

    /// Message without the line prefix, used as the label text in reports.
    pub fn message(&self) -> String {
        match self {
            ScriptError::Lex { message, .. } => message.clone(),
            ScriptError::Parse {
                expected, found, ..
            } => format!("expected {}, found {}", expected, found),
            ScriptError::Name { name, .. } => format!("undefined name '{}'", name),
            ScriptError::NotCallable {
                name, type_name, ..
            } => format!("'{}' is a {}, not a function", name, type_name),
            ScriptError::Arity {
                name,
                expected,
                got,
                ..
            } => format!("{}() takes {} argument(s), got {}", name, expected, got),
            ScriptError::Handler { name, message, .. } => format!("{}(): {}", name, message),
        }
    }

    fn help(&self) -> Option<&str> {
        match self {
            ScriptError::Parse { help, .. } => help.as_deref(),
            _ => None,
        }
    }

    /// Render the error against `source` on stderr.
    pub fn report(&self, source: &str, filename: Option<&str>) {
        let filename = filename.unwrap_or("<repl>");
        let _ = self
            .build_report(filename, true)
            .eprint((filename, Source::from(source)));
    }

    /// Render the error without colours into `writer`.
    pub fn write_report<W: io::Write>(
        &self,
        source: &str,
        filename: Option<&str>,
        writer: W,
    ) -> io::Result<()> {
        let filename = filename.unwrap_or("<repl>");
        self.build_report(filename, false)
            .write((filename, Source::from(source)), writer)
    }

    fn build_report<'a>(
        &self,
        filename: &'a str,
        colored: bool,
    ) -> Report<'static, (&'a str, Range<usize>)> {
        let span = self.span();
        let color = match self {
            ScriptError::Lex { .. } => Color::Red,
            ScriptError::Parse { .. } => Color::Yellow,
            _ => Color::Magenta,
        };
        let paint = |text: &str, color: Color| {
            if colored {
                text.fg(color).to_string()
            } else {
                text.to_string()
            }
        };

        // Spans are byte offsets.
        let config = ariadne::Config::default()
            .with_index_type(IndexType::Byte)
            .with_color(colored);

        let message = self.message();
        let mut report_builder = Report::build(ReportKind::Error, filename, span.start)
            .with_config(config)
            .with_message(format!("{}: {}", paint(self.kind_name(), color), message))
            .with_label(
                Label::new((filename, span.start..span.end))
                    .with_message(&message)
                    .with_color(color),
            );

        if let Some(help_text) = self.help() {
            report_builder =
                report_builder.with_note(format!("{}: {}", paint("help", Color::Cyan), help_text));
        }

        report_builder.finish()
    }
}

/// Failure reported by a native function handler.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct HandlerError {
    pub message: String,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
