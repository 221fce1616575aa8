//! Parser for BASIC programs
//!
//! Recursive descent over the token stream produced by the tokenizer. Each
//! physical line holds an optional line number followed by a single
//! statement. A line that holds only a number is kept as a deletion
//! directive for the program store.

use crate::error::ParseError;
use crate::program::ProgramStore;
use crate::tokenizer::{Token, TokenKind};

/// Binary operators, loosest binding first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Logical
    Or,
    And,

    // Comparison
    Equal,
    NotEqual,
    LessThan,
    GreaterThan,
    LessThanOrEqual,
    GreaterThanOrEqual,

    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
}

impl BinaryOperator {
    /// Canonical source symbol. `!=` is read as `NotEqual` and written back
    /// as `<>`.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Or => "OR",
            BinaryOperator::And => "AND",
            BinaryOperator::Equal => "=",
            BinaryOperator::NotEqual => "<>",
            BinaryOperator::LessThan => "<",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::LessThanOrEqual => "<=",
            BinaryOperator::GreaterThanOrEqual => ">=",
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Power => "^",
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Plus,
    Minus,
    Not,
}

/// Expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Integer literal
    Integer(i64),
    /// Real number literal
    Real(f64),
    /// String literal
    String(String),
    /// Variable reference
    Variable(String),
    /// Function call. An identifier followed by `(` is always a call.
    FunctionCall {
        name: String,
        args: Vec<Expression>,
    },
    /// Binary operation
    BinaryOp {
        left: Box<Expression>,
        op: BinaryOperator,
        right: Box<Expression>,
    },
    /// Unary operation
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expression>,
    },
}

/// Separator following a PRINT item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintSeparator {
    Semicolon,
    Comma,
}

/// Statements
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// PRINT with the separator captured after each item
    Print {
        items: Vec<Expression>,
        separators: Vec<PrintSeparator>,
    },
    /// Assignment, with or without LET
    Let {
        name: String,
        expression: Expression,
    },
    /// INPUT ["prompt"] var
    Input {
        prompt: Option<String>,
        name: String,
    },
    /// IF cond THEN stmt [ELSE stmt]
    If {
        condition: Expression,
        then_branch: Box<Statement>,
        else_branch: Option<Box<Statement>>,
    },
    /// FOR var = start TO end [STEP step]
    For {
        variable: String,
        start: Expression,
        end: Expression,
        step: Expression,
    },
    /// NEXT [var]
    Next {
        variable: Option<String>,
    },
    /// WHILE cond
    While {
        condition: Expression,
    },
    Wend,
    Goto {
        line_number: u32,
    },
    Gosub {
        line_number: u32,
    },
    Return,
    End,
    Cls,
    /// REM text or ' text
    Comment {
        text: String,
    },

    // Graphics
    Graphics {
        mode: u32,
    },
    Plot {
        x: Expression,
        y: Expression,
    },
    Line {
        x1: Expression,
        y1: Expression,
        x2: Expression,
        y2: Expression,
    },
    Circle {
        x: Expression,
        y: Expression,
        radius: Expression,
    },
    Rect {
        x: Expression,
        y: Expression,
        width: Expression,
        height: Expression,
    },
    Color {
        value: Expression,
    },
    Pset {
        x: Expression,
        y: Expression,
    },
}

impl Statement {
    /// Check if statement draws on, or opens, the drawing surface
    pub fn is_graphics(&self) -> bool {
        match self {
            Statement::Graphics { .. }
            | Statement::Plot { .. }
            | Statement::Line { .. }
            | Statement::Circle { .. }
            | Statement::Rect { .. }
            | Statement::Color { .. }
            | Statement::Pset { .. } => true,
            Statement::If {
                then_branch,
                else_branch,
                ..
            } => then_branch.is_graphics() || else_branch.as_ref().map_or(false, |s| s.is_graphics()),
            _ => false,
        }
    }
}

/// One physical source line after parsing
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLine {
    pub line_number: Option<u32>,
    /// `None` only for a numbered line with nothing after the number
    pub statement: Option<Statement>,
}

/// Parse tokens into a fresh program
pub fn parse(tokens: &[Token]) -> Result<ProgramStore, ParseError> {
    let lines = parse_lines(tokens)?;
    let mut program = ProgramStore::new();
    program.merge(lines);
    Ok(program)
}

/// Parse tokens into lines without assembling a program. Either every line
/// parses or nothing is returned.
pub fn parse_lines(tokens: &[Token]) -> Result<Vec<ParsedLine>, ParseError> {
    Parser::new(tokens).parse_program()
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    /// Stands in for a missing trailing `EndOfInput`
    eof: Token,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        let line = tokens.last().map_or(1, |t| t.line);
        Self {
            tokens,
            pos: 0,
            eof: Token::new(TokenKind::EndOfInput, "", line, 0),
        }
    }

    fn current(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&self.eof)
    }

    fn peek_next(&self) -> &Token {
        self.tokens.get(self.pos + 1).unwrap_or(&self.eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(self.current().line, message)
    }

    fn expect_operator(&mut self, symbol: &str) -> Result<(), ParseError> {
        if self.current().is_operator(symbol) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(format!("Expected '{}'", symbol)))
        }
    }

    fn expect_keyword(&mut self, word: &str) -> Result<(), ParseError> {
        if self.current().is_keyword(word) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(format!("Expected {}", word)))
        }
    }

    fn expect_identifier(&mut self) -> Result<String, ParseError> {
        if self.current().kind == TokenKind::Identifier {
            Ok(self.advance().text)
        } else {
            Err(self.error("Expected variable name"))
        }
    }

    fn parse_program(&mut self) -> Result<Vec<ParsedLine>, ParseError> {
        let mut lines = Vec::new();
        loop {
            while self.current().kind == TokenKind::Newline {
                self.advance();
            }
            if self.current().kind == TokenKind::EndOfInput {
                break;
            }
            lines.push(self.parse_line()?);
        }
        Ok(lines)
    }

    fn parse_line(&mut self) -> Result<ParsedLine, ParseError> {
        let line_number = if self.current().kind == TokenKind::Number {
            Some(self.parse_line_number()?)
        } else {
            None
        };

        let statement = if self.current().ends_line() {
            None
        } else {
            Some(self.parse_statement()?)
        };

        match self.current().kind {
            TokenKind::Newline => {
                self.advance();
            }
            TokenKind::EndOfInput => {}
            _ => return Err(self.error(format!("Unexpected token: {}", self.current().text))),
        }

        Ok(ParsedLine {
            line_number,
            statement,
        })
    }

    fn parse_line_number(&mut self) -> Result<u32, ParseError> {
        let token = self.current();
        if token.kind != TokenKind::Number {
            return Err(self.error("Expected line number"));
        }
        let number = token
            .text
            .parse::<u32>()
            .map_err(|_| self.error(format!("Invalid line number: {}", token.text)))?;
        self.advance();
        Ok(number)
    }

    fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        let token = self.advance();
        match token.kind {
            TokenKind::Comment => Ok(Statement::Comment {
                text: comment_text(&token.text),
            }),
            TokenKind::Keyword => match token.text.as_str() {
                "PRINT" => self.parse_print(),
                "LET" => self.parse_assignment(),
                "INPUT" => self.parse_input(),
                "IF" => self.parse_if(),
                "FOR" => self.parse_for(),
                "NEXT" => {
                    let variable = if self.current().kind == TokenKind::Identifier {
                        Some(self.advance().text)
                    } else {
                        None
                    };
                    Ok(Statement::Next { variable })
                }
                "WHILE" => Ok(Statement::While {
                    condition: self.parse_expression()?,
                }),
                "WEND" => Ok(Statement::Wend),
                "GOTO" => Ok(Statement::Goto {
                    line_number: self.parse_line_number()?,
                }),
                "GOSUB" => Ok(Statement::Gosub {
                    line_number: self.parse_line_number()?,
                }),
                "RETURN" => Ok(Statement::Return),
                "END" => Ok(Statement::End),
                "CLS" => Ok(Statement::Cls),
                "GRAPHICS" => self.parse_graphics(),
                "PLOT" => {
                    let (x, y) = self.parse_pair()?;
                    Ok(Statement::Plot { x, y })
                }
                "PSET" => {
                    let (x, y) = self.parse_pair()?;
                    Ok(Statement::Pset { x, y })
                }
                "LINE" => {
                    let (x1, y1) = self.parse_pair()?;
                    self.expect_keyword("TO")?;
                    let (x2, y2) = self.parse_pair()?;
                    Ok(Statement::Line { x1, y1, x2, y2 })
                }
                "CIRCLE" => {
                    let (x, y) = self.parse_pair()?;
                    self.expect_operator(",")?;
                    let radius = self.parse_expression()?;
                    Ok(Statement::Circle { x, y, radius })
                }
                "RECT" => {
                    let (x, y) = self.parse_pair()?;
                    self.expect_operator(",")?;
                    let (width, height) = self.parse_pair()?;
                    Ok(Statement::Rect {
                        x,
                        y,
                        width,
                        height,
                    })
                }
                "COLOR" => Ok(Statement::Color {
                    value: self.parse_expression()?,
                }),
                other => Err(ParseError::new(
                    token.line,
                    format!("Unknown statement: {}", other),
                )),
            },
            TokenKind::Identifier if self.current().is_operator("=") => {
                // Bare assignment: step back so the identifier is re-read as
                // the assignment target
                self.pos -= 1;
                self.parse_assignment()
            }
            TokenKind::Identifier => Err(ParseError::new(
                token.line,
                format!("Unknown statement: {}", token.text),
            )),
            _ => Err(ParseError::new(
                token.line,
                format!("Unexpected token: {}", token.text),
            )),
        }
    }

    fn parse_print(&mut self) -> Result<Statement, ParseError> {
        let mut items = Vec::new();
        let mut separators = Vec::new();

        if !self.at_print_end() {
            items.push(self.parse_expression()?);
            loop {
                let separator = if self.current().is_operator(";") {
                    PrintSeparator::Semicolon
                } else if self.current().is_operator(",") {
                    PrintSeparator::Comma
                } else {
                    break;
                };
                self.advance();
                separators.push(separator);
                if self.at_print_end() {
                    break;
                }
                items.push(self.parse_expression()?);
            }
        }

        Ok(Statement::Print { items, separators })
    }

    /// PRINT items stop at the end of the line or at the ELSE of an
    /// enclosing IF
    fn at_print_end(&self) -> bool {
        self.current().ends_line() || self.current().is_keyword("ELSE")
    }

    fn parse_assignment(&mut self) -> Result<Statement, ParseError> {
        let name = self.expect_identifier()?;
        self.expect_operator("=")?;
        let expression = self.parse_expression()?;
        Ok(Statement::Let { name, expression })
    }

    fn parse_input(&mut self) -> Result<Statement, ParseError> {
        let prompt = if self.current().kind == TokenKind::String {
            let text = self.advance().text;
            if self.current().is_operator(",") || self.current().is_operator(";") {
                self.advance();
            }
            Some(text)
        } else {
            None
        };
        let name = self.expect_identifier()?;
        Ok(Statement::Input { prompt, name })
    }

    fn parse_if(&mut self) -> Result<Statement, ParseError> {
        let condition = self.parse_expression()?;
        self.expect_keyword("THEN")?;
        let then_branch = Box::new(self.parse_branch()?);
        let else_branch = if self.current().is_keyword("ELSE") {
            self.advance();
            Some(Box::new(self.parse_branch()?))
        } else {
            None
        };
        Ok(Statement::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    /// A THEN/ELSE branch: a single statement, or a bare line number
    /// standing for GOTO
    fn parse_branch(&mut self) -> Result<Statement, ParseError> {
        if self.current().kind == TokenKind::Number {
            return Ok(Statement::Goto {
                line_number: self.parse_line_number()?,
            });
        }
        if self.current().ends_line() || self.current().is_keyword("ELSE") {
            return Err(self.error("Expected statement"));
        }
        self.parse_statement()
    }

    fn parse_for(&mut self) -> Result<Statement, ParseError> {
        let variable = self.expect_identifier()?;
        self.expect_operator("=")?;
        let start = self.parse_expression()?;
        self.expect_keyword("TO")?;
        let end = self.parse_expression()?;
        let step = if self.current().is_keyword("STEP") {
            self.advance();
            self.parse_expression()?
        } else {
            Expression::Integer(1)
        };
        Ok(Statement::For {
            variable,
            start,
            end,
            step,
        })
    }

    fn parse_graphics(&mut self) -> Result<Statement, ParseError> {
        let mode = if self.current().kind == TokenKind::Number {
            let token = self.advance();
            token
                .text
                .parse::<u32>()
                .map_err(|_| ParseError::new(token.line, format!("Invalid graphics mode: {}", token.text)))?
        } else {
            0
        };
        Ok(Statement::Graphics { mode })
    }

    fn parse_pair(&mut self) -> Result<(Expression, Expression), ParseError> {
        let first = self.parse_expression()?;
        self.expect_operator(",")?;
        let second = self.parse_expression()?;
        Ok((first, second))
    }

    // Expressions, loosest binding first

    fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_and()?;
        while self.current().is_keyword("OR") {
            self.advance();
            let right = self.parse_and()?;
            left = binary(left, BinaryOperator::Or, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_equality()?;
        while self.current().is_keyword("AND") {
            self.advance();
            let right = self.parse_equality()?;
            left = binary(left, BinaryOperator::And, right);
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match self.current_operator() {
                Some("=") => BinaryOperator::Equal,
                Some("<>") | Some("!=") => BinaryOperator::NotEqual,
                _ => break,
            };
            self.advance();
            let right = self.parse_relational()?;
            left = binary(left, op, right);
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.current_operator() {
                Some("<") => BinaryOperator::LessThan,
                Some(">") => BinaryOperator::GreaterThan,
                Some("<=") => BinaryOperator::LessThanOrEqual,
                Some(">=") => BinaryOperator::GreaterThanOrEqual,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive()?;
            left = binary(left, op, right);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.current_operator() {
                Some("+") => BinaryOperator::Add,
                Some("-") => BinaryOperator::Subtract,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = binary(left, op, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_power()?;
        loop {
            let op = match self.current_operator() {
                Some("*") => BinaryOperator::Multiply,
                Some("/") => BinaryOperator::Divide,
                _ => break,
            };
            self.advance();
            let right = self.parse_power()?;
            left = binary(left, op, right);
        }
        Ok(left)
    }

    /// `^` is right-associative and its operands are unary expressions, so
    /// `-2 ^ 2` is `(-2) ^ 2`
    fn parse_power(&mut self) -> Result<Expression, ParseError> {
        let base = self.parse_unary()?;
        if self.current().is_operator("^") {
            self.advance();
            let exponent = self.parse_power()?;
            return Ok(binary(base, BinaryOperator::Power, exponent));
        }
        Ok(base)
    }

    fn parse_unary(&mut self) -> Result<Expression, ParseError> {
        let op = if self.current().is_operator("-") {
            UnaryOperator::Minus
        } else if self.current().is_operator("+") {
            UnaryOperator::Plus
        } else if self.current().is_keyword("NOT") {
            UnaryOperator::Not
        } else {
            return self.parse_primary();
        };
        self.advance();
        let operand = self.parse_unary()?;
        Ok(Expression::UnaryOp {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_primary(&mut self) -> Result<Expression, ParseError> {
        let token = self.current().clone();
        match token.kind {
            TokenKind::Number => {
                self.advance();
                parse_number(&token)
            }
            TokenKind::String => {
                self.advance();
                Ok(Expression::String(token.text))
            }
            TokenKind::Identifier if self.peek_next().is_operator("(") => {
                self.advance();
                self.advance();
                let mut args = Vec::new();
                if !self.current().is_operator(")") {
                    args.push(self.parse_expression()?);
                    while self.current().is_operator(",") {
                        self.advance();
                        args.push(self.parse_expression()?);
                    }
                }
                self.expect_operator(")")?;
                Ok(Expression::FunctionCall {
                    name: token.text,
                    args,
                })
            }
            TokenKind::Identifier => {
                self.advance();
                Ok(Expression::Variable(token.text))
            }
            TokenKind::Operator if token.text == "(" => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect_operator(")")?;
                Ok(inner)
            }
            TokenKind::Newline | TokenKind::EndOfInput => Err(self.error("Unexpected end of line")),
            _ => Err(self.error(format!("Unexpected token: {}", token.text))),
        }
    }

    fn current_operator(&self) -> Option<&str> {
        let token = self.current();
        if token.kind == TokenKind::Operator {
            Some(token.text.as_str())
        } else {
            None
        }
    }
}

fn binary(left: Expression, op: BinaryOperator, right: Expression) -> Expression {
    Expression::BinaryOp {
        left: Box::new(left),
        op,
        right: Box::new(right),
    }
}

/// Integer vs real is decided by the presence of a decimal point
fn parse_number(token: &Token) -> Result<Expression, ParseError> {
    if token.text.contains('.') {
        token
            .text
            .parse::<f64>()
            .map(Expression::Real)
            .map_err(|_| ParseError::new(token.line, format!("Invalid number: {}", token.text)))
    } else {
        token
            .text
            .parse::<i64>()
            .map(Expression::Integer)
            .map_err(|_| ParseError::new(token.line, format!("Invalid number: {}", token.text)))
    }
}

/// Comment text with a single separating space removed
fn comment_text(raw: &str) -> String {
    raw.strip_prefix(' ').unwrap_or(raw).to_string()
}
