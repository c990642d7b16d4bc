use crate::error::Span;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

/// One line of script.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `name = expr`
    Assign {
        name: String,
        value: Expr,
        span: Span,
    },
    /// A bare expression, usually a call evaluated for its effect.
    Expression { expr: Expr, span: Span },
}

impl Stmt {
    pub fn span(&self) -> &Span {
        match self {
            Stmt::Assign { span, .. } => span,
            Stmt::Expression { span, .. } => span,
        }
    }

    pub fn line(&self) -> usize {
        self.span().line
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Number or string literal
    Literal { value: Value, span: Span },
    Variable { name: String, span: Span },
    /// Two or more comma-separated expressions in parentheses
    Tuple { elements: Vec<Expr>, span: Span },
    Call {
        name: String,
        args: Vec<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> &Span {
        match self {
            Expr::Literal { span, .. } => span,
            Expr::Variable { span, .. } => span,
            Expr::Tuple { span, .. } => span,
            Expr::Call { span, .. } => span,
        }
    }
}
