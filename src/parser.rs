use crate::ast::{Expr, Program, Stmt};
use crate::error::{ScriptError, Span};
use crate::lexer::{Token, TokenType};
use crate::stack::ensure_sufficient_stack;
use crate::value::Value;

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.token_type) != Some(TokenType::Eof) {
            let end = tokens.last().map(|t| t.span).unwrap_or(Span::new(0, 0, 1));
            tokens.push(Token::new(
                TokenType::Eof,
                String::new(),
                Span::new(end.end, end.end, end.line),
            ));
        }
        Self { tokens, current: 0 }
    }

    pub fn parse(&mut self) -> Result<Program, ScriptError> {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            if self.match_types(&[TokenType::Newline]) {
                continue;
            }
            statements.push(self.statement()?);
        }

        tracing::debug!(statements = statements.len(), "parsed script");
        Ok(Program { statements })
    }

    fn statement(&mut self) -> Result<Stmt, ScriptError> {
        let start_span = self.peek().span;

        let stmt = if self.check(&TokenType::Identifier) && self.check_next(&TokenType::Equal) {
            let name = self.advance().lexeme.clone();
            self.advance(); // consume the '='
            let value = self.expression()?;
            Stmt::Assign {
                name,
                value,
                span: start_span.to(&self.previous().span),
            }
        } else {
            let expr = self.expression()?;
            if self.check(&TokenType::Equal) {
                return Err(ScriptError::parse_error_with_help(
                    *expr.span(),
                    "identifier before '='",
                    describe_expr(&expr),
                    "Only plain names can be assigned to. Example: alpha = 1",
                ));
            }
            Stmt::Expression {
                expr,
                span: start_span.to(&self.previous().span),
            }
        };

        self.end_of_statement()?;
        Ok(stmt)
    }

    fn end_of_statement(&mut self) -> Result<(), ScriptError> {
        if self.match_types(&[TokenType::Newline]) || self.check(&TokenType::Eof) {
            return Ok(());
        }

        let token = self.peek();
        Err(ScriptError::parse_error_with_help(
            token.span,
            TokenType::Newline.describe(),
            token.describe(),
            "Each statement goes on its own line.",
        ))
    }

    fn expression(&mut self) -> Result<Expr, ScriptError> {
        ensure_sufficient_stack(|| self.primary())
    }

    fn primary(&mut self) -> Result<Expr, ScriptError> {
        let token = self.peek().clone();

        match token.token_type {
            TokenType::Number => {
                self.advance();
                let value = token.lexeme.parse::<f64>().map_err(|_| {
                    ScriptError::parse_error(token.span, "number", token.describe())
                })?;
                Ok(Expr::Literal {
                    value: Value::Number(value),
                    span: token.span,
                })
            }
            TokenType::String => {
                self.advance();
                Ok(Expr::Literal {
                    value: Value::String(token.lexeme),
                    span: token.span,
                })
            }
            TokenType::Identifier => {
                self.advance();
                if self.match_types(&[TokenType::LeftParen]) {
                    self.finish_call(token)
                } else {
                    Ok(Expr::Variable {
                        name: token.lexeme,
                        span: token.span,
                    })
                }
            }
            TokenType::LeftParen => {
                self.advance();
                self.parenthesized(token.span)
            }
            _ => {
                let help_msg = match token.token_type {
                    TokenType::RightParen => "Found ')' without matching '('. Check for unbalanced parentheses.",
                    TokenType::Comma => "Found ',' without a value before it. Check for a doubled or trailing comma.",
                    TokenType::Newline | TokenType::Eof => "The line ended while an expression was still expected.",
                    _ => "Expected a number, string, name, call or parenthesized expression here.",
                };

                Err(ScriptError::parse_error_with_help(
                    token.span,
                    "expression",
                    token.describe(),
                    help_msg,
                ))
            }
        }
    }

    /// `(` has been consumed: one expression is a grouping, more are a tuple.
    fn parenthesized(&mut self, start_span: Span) -> Result<Expr, ScriptError> {
        if self.check(&TokenType::RightParen) {
            return Err(ScriptError::parse_error_with_help(
                start_span.to(&self.peek().span),
                "expression",
                "')'",
                "Empty parentheses are not allowed. Parentheses hold one expression or a tuple: (1, 2)",
            ));
        }

        let mut elements = vec![self.expression()?];
        while self.match_types(&[TokenType::Comma]) {
            elements.push(self.expression()?);
        }

        let end_span = self
            .consume_with_help(
                TokenType::RightParen,
                "Every opening parenthesis '(' must have a matching closing parenthesis ')' on the same line.",
            )?
            .span;

        if elements.len() == 1 {
            return Ok(elements.remove(0));
        }

        Ok(Expr::Tuple {
            elements,
            span: start_span.to(&end_span),
        })
    }

    /// The callee name and `(` have been consumed.
    fn finish_call(&mut self, callee: Token) -> Result<Expr, ScriptError> {
        let mut args = Vec::new();

        if !self.check(&TokenType::RightParen) {
            loop {
                args.push(self.expression()?);
                if !self.match_types(&[TokenType::Comma]) {
                    break;
                }
            }
        }

        let paren = self.consume_with_help(
            TokenType::RightParen,
            "Function calls must be closed with ')' after the arguments. Example: run(1e-9)",
        )?;

        Ok(Expr::Call {
            span: callee.span.to(&paren.span),
            name: callee.lexeme,
            args,
        })
    }

    fn match_types(&mut self, types: &[TokenType]) -> bool {
        for token_type in types {
            if self.check(token_type) {
                self.advance();
                return true;
            }
        }
        false
    }

    fn check(&self, token_type: &TokenType) -> bool {
        &self.peek().token_type == token_type
    }

    fn check_next(&self, token_type: &TokenType) -> bool {
        self.tokens
            .get(self.current + 1)
            .is_some_and(|t| &t.token_type == token_type)
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().token_type == TokenType::Eof
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn consume_with_help(
        &mut self,
        token_type: TokenType,
        help: &str,
    ) -> Result<&Token, ScriptError> {
        if self.check(&token_type) {
            Ok(self.advance())
        } else {
            let token = self.peek();
            Err(ScriptError::parse_error_with_help(
                token.span,
                token_type.describe(),
                token.describe(),
                help,
            ))
        }
    }
}

fn describe_expr(expr: &Expr) -> String {
    match expr {
        Expr::Literal { value, .. } => value.type_name().to_string(),
        Expr::Variable { name, .. } => format!("'{}'", name),
        Expr::Tuple { .. } => "tuple".to_string(),
        Expr::Call { name, .. } => format!("call to '{}'", name),
    }
}
