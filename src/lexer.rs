use crate::error::{ScriptError, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    // Single-character tokens
    LeftParen,
    RightParen,
    Comma,
    Equal,

    // Literals
    Identifier,
    String,
    Number,

    // Statement separator
    Newline,

    // Special
    Eof,
}

impl TokenType {
    /// Human-readable name used in parse diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            TokenType::LeftParen => "'('",
            TokenType::RightParen => "')'",
            TokenType::Comma => "','",
            TokenType::Equal => "'='",
            TokenType::Identifier => "identifier",
            TokenType::String => "string",
            TokenType::Number => "number",
            TokenType::Newline => "end of line",
            TokenType::Eof => "end of input",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    /// Source text of the token; for strings, the text between the quotes.
    pub lexeme: String,
    pub span: Span,
}

impl Token {
    pub fn new(token_type: TokenType, lexeme: String, span: Span) -> Self {
        Self {
            token_type,
            lexeme,
            span,
        }
    }

    pub fn line(&self) -> usize {
        self.span.line
    }

    /// How the token is named when it shows up where it should not.
    pub fn describe(&self) -> String {
        match self.token_type {
            TokenType::Identifier | TokenType::Number => format!("'{}'", self.lexeme),
            TokenType::String => format!("\"{}\"", self.lexeme),
            _ => self.token_type.describe().to_string(),
        }
    }
}

pub struct Lexer<'src> {
    source: &'src str,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
    line: usize,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            tokens: Vec::new(),
            start: 0,
            current: 0,
            line: 1,
        }
    }

    pub fn scan_tokens(mut self) -> Result<Vec<Token>, ScriptError> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token()?;
        }

        self.tokens.push(Token::new(
            TokenType::Eof,
            String::new(),
            Span::new(self.current, self.current, self.line),
        ));

        tracing::trace!(count = self.tokens.len(), "tokenized script");
        Ok(self.tokens)
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn scan_token(&mut self) -> Result<(), ScriptError> {
        let c = self.advance();

        match c {
            '(' => self.add_token(TokenType::LeftParen),
            ')' => self.add_token(TokenType::RightParen),
            ',' => self.add_token(TokenType::Comma),
            '=' => self.add_token(TokenType::Equal),
            '/' if self.peek() == '/' => {
                // Comment goes until end of line
                while self.peek() != '\n' && !self.is_at_end() {
                    self.advance();
                }
            }
            ' ' | '\r' | '\t' => {}
            '\n' => {
                self.newline();
                self.line += 1;
            }
            '"' => self.string()?,
            c if c.is_ascii_digit() => self.number(),
            c if c.is_ascii_alphabetic() || c == '_' => self.identifier(),
            _ => {
                return Err(ScriptError::illegal_character(
                    Span::new(self.start, self.current, self.line),
                    c,
                ));
            }
        }

        Ok(())
    }

    fn advance(&mut self) -> char {
        match self.source[self.current..].chars().next() {
            Some(c) => {
                self.current += c.len_utf8();
                c
            }
            None => '\0',
        }
    }

    fn peek(&self) -> char {
        self.source[self.current..].chars().next().unwrap_or('\0')
    }

    fn peek_next(&self) -> char {
        let mut chars = self.source[self.current..].chars();
        chars.next();
        chars.next().unwrap_or('\0')
    }

    fn peek_at(&self, offset: usize) -> char {
        self.source[self.current..].chars().nth(offset).unwrap_or('\0')
    }

    /// Blank lines and leading line breaks collapse into nothing.
    fn newline(&mut self) {
        match self.tokens.last() {
            None => {}
            Some(token) if token.token_type == TokenType::Newline => {}
            Some(_) => self.add_token_with_content(TokenType::Newline, "\n".to_string()),
        }
    }

    fn string(&mut self) -> Result<(), ScriptError> {
        while self.peek() != '"' && self.peek() != '\n' && !self.is_at_end() {
            self.advance();
        }

        if self.peek() != '"' {
            return Err(ScriptError::lex_error(
                Span::new(self.start, self.current, self.line),
                "Unterminated string".to_string(),
            ));
        }

        // Consume the closing "
        self.advance();

        let content = &self.source[self.start + 1..self.current - 1];
        self.add_token_with_content(TokenType::String, content.to_string());
        Ok(())
    }

    fn number(&mut self) {
        self.digits();

        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            self.advance();
            self.digits();
        }

        // Only take the exponent when it is well formed; otherwise the 'e'
        // belongs to whatever comes next.
        if matches!(self.peek(), 'e' | 'E') {
            let sign = matches!(self.peek_next(), '+' | '-');
            let first_digit = if sign { self.peek_at(2) } else { self.peek_next() };
            if first_digit.is_ascii_digit() {
                self.advance();
                if sign {
                    self.advance();
                }
                self.digits();
            }
        }

        self.add_token(TokenType::Number);
    }

    fn digits(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }
    }

    fn identifier(&mut self) {
        while self.peek().is_ascii_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        self.add_token(TokenType::Identifier);
    }

    fn add_token(&mut self, token_type: TokenType) {
        let text = &self.source[self.start..self.current];
        self.add_token_with_content(token_type, text.to_string());
    }

    fn add_token_with_content(&mut self, token_type: TokenType, lexeme: String) {
        let token = Token::new(
            token_type,
            lexeme,
            Span::new(self.start, self.current, self.line),
        );
        tracing::trace!(
            kind = ?token.token_type,
            lexeme = %token.lexeme,
            line = self.line,
            "token"
        );
        self.tokens.push(token);
    }
}

/// Convert script text into tokens, ending with a single `Eof`.
pub fn tokenize(source: &str) -> Result<Vec<Token>, ScriptError> {
    Lexer::new(source).scan_tokens()
}
