//! Tokenizer for BASIC source code
//!
//! Converts raw source text into an ordered sequence of tokens. Keywords and
//! identifiers are uppercased (the language is case-insensitive), newlines
//! are kept as tokens because they separate program lines, and comments are
//! captured whole so the listing can reproduce them.

use crate::error::{LexError, LexErrorKind};

/// Token categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Number,
    String,
    Identifier,
    Keyword,
    Operator,
    Newline,
    EndOfInput,
    Comment,
}

/// A single lexeme with the position where it starts
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Raw lexeme. Uppercased for identifiers and keywords, unquoted for
    /// strings, the remainder of the line for comments.
    pub text: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            line,
            column,
        }
    }

    /// True if this is the given keyword
    pub fn is_keyword(&self, word: &str) -> bool {
        self.kind == TokenKind::Keyword && self.text == word
    }

    /// True if this is the given operator or delimiter
    pub fn is_operator(&self, symbol: &str) -> bool {
        self.kind == TokenKind::Operator && self.text == symbol
    }

    /// True for the tokens that end a physical line
    pub fn ends_line(&self) -> bool {
        matches!(self.kind, TokenKind::Newline | TokenKind::EndOfInput)
    }
}

/// Reserved words. Several are reserved without being statements so that
/// they cannot be used as variable names.
pub const KEYWORDS: &[&str] = &[
    "PRINT", "LET", "IF", "THEN", "ELSE", "FOR", "TO", "STEP", "NEXT", "WHILE", "WEND", "GOTO",
    "GOSUB", "RETURN", "END", "INPUT", "DIM", "AND", "OR", "NOT", "REM", "DATA", "READ",
    "RESTORE", "CLS", "STOP", "RUN", "LIST", "NEW", "SAVE", "LOAD", "POKE", "PEEK", "SYS",
    // Graphics
    "GRAPHICS", "PLOT", "LINE", "CIRCLE", "RECT", "FILL", "COLOR", "PSET", "SCREEN", "LOCATE",
    "POINT", "PAINT",
];

/// Check an (already uppercased) word against the reserved set
pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

const TWO_CHAR_OPERATORS: &[&str] = &["<=", ">=", "<>", "!="];

const SINGLE_CHAR_OPERATORS: &[char] = &[
    '+', '-', '*', '/', '^', '=', '<', '>', '(', ')', '[', ']', '{', '}', ',', ';', ':',
];

/// Tokenize a complete source text. The result always ends with an
/// `EndOfInput` token.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source).run()
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    tokens: Vec<Token>,
    /// Tokens emitted since the last newline
    tokens_on_line: usize,
}

impl Lexer {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            tokens: Vec::new(),
            tokens_on_line: 0,
        }
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.chars.get(self.pos).copied()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn push(&mut self, token: Token) {
        if token.kind == TokenKind::Newline {
            self.tokens_on_line = 0;
        } else {
            self.tokens_on_line += 1;
        }
        self.tokens.push(token);
    }

    fn error(&self, line: usize, column: usize, kind: LexErrorKind) -> LexError {
        LexError { line, column, kind }
    }

    fn run(mut self) -> Result<Vec<Token>, LexError> {
        while let Some(ch) = self.peek(0) {
            let (line, column) = (self.line, self.column);

            if matches!(ch, ' ' | '\t' | '\r') {
                self.advance();
            } else if ch == '\n' {
                self.advance();
                self.push(Token::new(TokenKind::Newline, "\n", line, column));
            } else if ch.is_ascii_digit() {
                let token = self.read_number(line, column);
                self.push(token);
            } else if ch == '\'' && self.at_statement_start() {
                self.advance();
                let token = self.read_comment(line, column);
                self.push(token);
            } else if ch == '"' || ch == '\'' {
                let token = self.read_string(ch, line, column)?;
                self.push(token);
            } else if ch.is_alphabetic() || ch == '_' {
                let word = self.read_word();
                let token = if word == "REM" {
                    self.read_comment(line, column)
                } else if is_keyword(&word) {
                    Token::new(TokenKind::Keyword, word, line, column)
                } else {
                    Token::new(TokenKind::Identifier, word, line, column)
                };
                self.push(token);
            } else if SINGLE_CHAR_OPERATORS.contains(&ch) || ch == '!' {
                let token = self.read_operator(ch, line, column)?;
                self.push(token);
            } else {
                return Err(self.error(line, column, LexErrorKind::UnexpectedCharacter(ch)));
            }
        }

        let (line, column) = (self.line, self.column);
        self.push(Token::new(TokenKind::EndOfInput, "", line, column));
        Ok(self.tokens)
    }

    /// An apostrophe comment is only recognised where a statement may begin:
    /// first on the line, or right after a leading line number.
    fn at_statement_start(&self) -> bool {
        match self.tokens_on_line {
            0 => true,
            1 => self
                .tokens
                .last()
                .map_or(false, |t| t.kind == TokenKind::Number),
            _ => false,
        }
    }

    fn read_number(&mut self, line: usize, column: usize) -> Token {
        let mut text = String::new();
        let mut seen_dot = false;

        while let Some(ch) = self.peek(0) {
            if ch.is_ascii_digit() {
                text.push(ch);
            } else if ch == '.' && !seen_dot {
                seen_dot = true;
                text.push(ch);
            } else {
                break;
            }
            self.advance();
        }

        Token::new(TokenKind::Number, text, line, column)
    }

    fn read_string(&mut self, quote: char, line: usize, column: usize) -> Result<Token, LexError> {
        self.advance(); // opening quote
        let mut text = String::new();

        loop {
            match self.advance() {
                Some(ch) if ch == quote => break,
                Some(ch) => text.push(ch),
                None => {
                    return Err(self.error(line, column, LexErrorKind::UnterminatedString(quote)))
                }
            }
        }

        Ok(Token::new(TokenKind::String, text, line, column))
    }

    fn read_word(&mut self) -> String {
        let mut word = String::new();
        while let Some(ch) = self.peek(0) {
            if ch.is_alphanumeric() || ch == '_' || ch == '$' {
                word.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        word.to_uppercase()
    }

    /// Everything up to, but excluding, the newline
    fn read_comment(&mut self, line: usize, column: usize) -> Token {
        let mut text = String::new();
        while let Some(ch) = self.peek(0) {
            if ch == '\n' {
                break;
            }
            text.push(ch);
            self.advance();
        }
        Token::new(TokenKind::Comment, text, line, column)
    }

    fn read_operator(&mut self, ch: char, line: usize, column: usize) -> Result<Token, LexError> {
        if let Some(next) = self.peek(1) {
            let pair: String = [ch, next].iter().collect();
            if TWO_CHAR_OPERATORS.contains(&pair.as_str()) {
                self.advance();
                self.advance();
                return Ok(Token::new(TokenKind::Operator, pair, line, column));
            }
        }

        // A lone '!' is only valid as the start of "!="
        if ch == '!' {
            return Err(self.error(line, column, LexErrorKind::UnexpectedCharacter(ch)));
        }

        self.advance();
        Ok(Token::new(TokenKind::Operator, ch.to_string(), line, column))
    }
}
