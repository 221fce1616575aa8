//! Program listing
//!
//! Writes statement trees back out as BASIC source that the parser reads
//! back into the same trees. Binary operations are always parenthesized so
//! no precedence information is lost.

use crate::parser::{BinaryOperator, Expression, PrintSeparator, Statement, UnaryOperator};
use crate::program::ProgramStore;
use std::fmt;

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOperator::Plus => f.write_str("+"),
            UnaryOperator::Minus => f.write_str("-"),
            UnaryOperator::Not => f.write_str("NOT "),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Integer(value) => write!(f, "{}", value),
            Expression::Real(value) => f.write_str(&format_real(*value)),
            Expression::String(text) => f.write_str(&quote(text)),
            Expression::Variable(name) => f.write_str(name),
            Expression::FunctionCall { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
            Expression::BinaryOp { left, op, right } => write!(f, "({} {} {})", left, op, right),
            Expression::UnaryOp { op, operand } => write!(f, "{}{}", op, operand),
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Print { items, separators } => {
                f.write_str("PRINT")?;
                for (i, item) in items.iter().enumerate() {
                    write!(f, " {}", item)?;
                    match separators.get(i) {
                        Some(PrintSeparator::Semicolon) => f.write_str(";")?,
                        Some(PrintSeparator::Comma) => f.write_str(",")?,
                        None => {}
                    }
                }
                Ok(())
            }
            Statement::Let { name, expression } => write!(f, "LET {} = {}", name, expression),
            Statement::Input { prompt, name } => match prompt {
                Some(prompt) => write!(f, "INPUT {}; {}", quote(prompt), name),
                None => write!(f, "INPUT {}", name),
            },
            Statement::If {
                condition,
                then_branch,
                else_branch,
            } => {
                write!(f, "IF {} THEN {}", condition, then_branch)?;
                if let Some(else_branch) = else_branch {
                    write!(f, " ELSE {}", else_branch)?;
                }
                Ok(())
            }
            Statement::For {
                variable,
                start,
                end,
                step,
            } => write!(f, "FOR {} = {} TO {} STEP {}", variable, start, end, step),
            Statement::Next { variable } => match variable {
                Some(name) => write!(f, "NEXT {}", name),
                None => f.write_str("NEXT"),
            },
            Statement::While { condition } => write!(f, "WHILE {}", condition),
            Statement::Wend => f.write_str("WEND"),
            Statement::Goto { line_number } => write!(f, "GOTO {}", line_number),
            Statement::Gosub { line_number } => write!(f, "GOSUB {}", line_number),
            Statement::Return => f.write_str("RETURN"),
            Statement::End => f.write_str("END"),
            Statement::Cls => f.write_str("CLS"),
            Statement::Comment { text } if text.is_empty() => f.write_str("REM"),
            Statement::Comment { text } => write!(f, "REM {}", text),
            Statement::Graphics { mode: 0 } => f.write_str("GRAPHICS"),
            Statement::Graphics { mode } => write!(f, "GRAPHICS {}", mode),
            Statement::Plot { x, y } => write!(f, "PLOT {}, {}", x, y),
            Statement::Line { x1, y1, x2, y2 } => {
                write!(f, "LINE {}, {} TO {}, {}", x1, y1, x2, y2)
            }
            Statement::Circle { x, y, radius } => write!(f, "CIRCLE {}, {}, {}", x, y, radius),
            Statement::Rect {
                x,
                y,
                width,
                height,
            } => write!(f, "RECT {}, {}, {}, {}", x, y, width, height),
            Statement::Color { value } => write!(f, "COLOR {}", value),
            Statement::Pset { x, y } => write!(f, "PSET {}, {}", x, y),
        }
    }
}

/// One listing line, with its number if it has one
pub fn format_line(line_number: Option<u32>, statement: &Statement) -> String {
    match line_number {
        Some(number) => format!("{} {}", number, statement),
        None => statement.to_string(),
    }
}

/// The whole program in source order, one line per entry
pub fn format_program(program: &ProgramStore) -> String {
    let mut out = String::new();
    for entry in program.listing() {
        out.push_str(&format_line(entry.line_number, &entry.statement));
        out.push('\n');
    }
    out
}

/// Reals always carry a decimal point so they read back as reals
fn format_real(value: f64) -> String {
    let text = value.to_string();
    if value.is_finite() && !text.contains('.') {
        format!("{}.0", text)
    } else {
        text
    }
}

/// Double quotes unless the text contains one
fn quote(text: &str) -> String {
    if text.contains('"') {
        format!("'{}'", text)
    } else {
        format!("\"{}\"", text)
    }
}
