//! Line-numbered BASIC interpreter
//!
//! Source text flows through three stages: the tokenizer turns it into
//! tokens, the parser turns tokens into statements keyed by line number,
//! and the executor walks those statements with a line-number program
//! counter, GOSUB/RETURN call stack and FOR/WHILE loop stacks. Graphics
//! statements are forwarded to a [`graphics::DrawingSurface`] and all
//! text I/O goes through a [`console::Console`].

pub mod console;
pub mod executor;
pub mod graphics;
pub mod listing;
pub mod parser;
pub mod program;
pub mod tokenizer;
pub mod variables;

// Re-export core types for convenience
pub use crate::error::{BasicError, LexError, ParseError, Result, RuntimeError};
pub use console::{BufferedConsole, Console, StdConsole};
pub use executor::{Executor, Flow};
pub use graphics::{Canvas, DrawingSurface};
pub use parser::{parse, BinaryOperator, Expression, Statement, UnaryOperator};
pub use program::ProgramStore;
pub use tokenizer::{tokenize, Token, TokenKind};
pub use variables::{Value, VariableStore};

/// Error types for every stage of the interpreter
pub mod error {
    use thiserror::Error;

    /// Result type for interpreter operations
    pub type Result<T> = std::result::Result<T, BasicError>;

    /// What went wrong while scanning source text
    #[derive(Debug, Clone, PartialEq, Error)]
    pub enum LexErrorKind {
        #[error("Unexpected character: {0}")]
        UnexpectedCharacter(char),
        #[error("Unterminated string starting with {0}")]
        UnterminatedString(char),
    }

    /// A character the tokenizer could not place, with its source position
    #[derive(Debug, Clone, PartialEq, Error)]
    #[error("Lexer error at line {line}, column {column}: {kind}")]
    pub struct LexError {
        pub line: usize,
        pub column: usize,
        pub kind: LexErrorKind,
    }

    /// A grammar violation, reported against the offending token's line
    #[derive(Debug, Clone, PartialEq, Error)]
    #[error("Parse error at line {line}: {message}")]
    pub struct ParseError {
        pub line: usize,
        pub message: String,
    }

    impl ParseError {
        pub fn new(line: usize, message: impl Into<String>) -> Self {
            Self {
                line,
                message: message.into(),
            }
        }
    }

    /// Runtime failure categories
    #[derive(Debug, Clone, PartialEq, Error)]
    pub enum RuntimeErrorKind {
        #[error("Line {0} not found")]
        LineNotFound(u32),
        #[error("NEXT without FOR")]
        NextWithoutFor,
        #[error("FOR without NEXT")]
        ForWithoutNext,
        #[error("WEND without WHILE")]
        WendWithoutWhile,
        #[error("WHILE without matching WEND")]
        WhileWithoutWend,
        #[error("RETURN without GOSUB")]
        ReturnWithoutGosub,
        #[error("Division by zero")]
        DivisionByZero,
        #[error("Unknown function: {0}")]
        UnknownFunction(String),
        #[error("Error calling function {name}: {reason}")]
        FunctionFailed { name: String, reason: String },
        #[error("Type mismatch: {0}")]
        TypeMismatch(String),
        #[error("Input failed: {0}")]
        Input(String),
        #[error("Graphics error: {0}")]
        Graphics(String),
    }

    /// A runtime failure tagged with the program line that was executing
    #[derive(Debug, Clone, PartialEq, Error)]
    #[error("Runtime Error at line {line}: {kind}")]
    pub struct RuntimeError {
        pub line: u32,
        pub kind: RuntimeErrorKind,
    }

    impl RuntimeError {
        pub fn new(line: u32, kind: RuntimeErrorKind) -> Self {
            Self { line, kind }
        }
    }

    /// Any error the interpreter can surface to its caller
    #[derive(Debug, Error)]
    pub enum BasicError {
        #[error(transparent)]
        Lex(#[from] LexError),
        #[error(transparent)]
        Parse(#[from] ParseError),
        #[error(transparent)]
        Runtime(#[from] RuntimeError),
        #[error("I/O error: {0}")]
        Io(#[from] std::io::Error),
    }

}
