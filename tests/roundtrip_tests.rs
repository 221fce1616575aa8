//! Listing a statement and parsing the text back yields the same tree

use linebasic::listing::format_line;
use linebasic::parser::{parse_lines, ParsedLine, PrintSeparator};
use linebasic::{tokenize, BinaryOperator, Expression, Statement, UnaryOperator};
use quickcheck::{Arbitrary, Gen, QuickCheck};
use quickcheck_macros::quickcheck;

const VARIABLES: &[&str] = &["A", "B2", "X$", "COUNT", "N_1", "TOTAL$"];
const FUNCTIONS: &[&str] = &["ABS", "LEN", "RND", "CHR", "MYFN"];
const WORDS: &[&str] = &["hello", "x", "42", "a=b", "ok!", "done"];

const BINARY_OPERATORS: &[BinaryOperator] = &[
    BinaryOperator::Or,
    BinaryOperator::And,
    BinaryOperator::Equal,
    BinaryOperator::NotEqual,
    BinaryOperator::LessThan,
    BinaryOperator::GreaterThan,
    BinaryOperator::LessThanOrEqual,
    BinaryOperator::GreaterThanOrEqual,
    BinaryOperator::Add,
    BinaryOperator::Subtract,
    BinaryOperator::Multiply,
    BinaryOperator::Divide,
    BinaryOperator::Power,
];

const UNARY_OPERATORS: &[UnaryOperator] =
    &[UnaryOperator::Plus, UnaryOperator::Minus, UnaryOperator::Not];

fn pick<T: Copy>(g: &mut Gen, items: &[T]) -> T {
    *g.choose(items).unwrap()
}

fn below(g: &mut Gen, n: usize) -> usize {
    usize::arbitrary(g) % n
}

/// String literal text. A string may hold one kind of quote, never both.
fn text(g: &mut Gen) -> String {
    let quote = if bool::arbitrary(g) { "\"" } else { "'" };
    let mut out = String::new();
    for _ in 0..below(g, 4) {
        match below(g, 4) {
            0 => out.push_str(quote),
            1 => out.push(' '),
            _ => out.push_str(pick(g, WORDS)),
        }
    }
    out
}

/// Comment text: words separated by single spaces
fn comment(g: &mut Gen) -> String {
    let words: Vec<&str> = (0..below(g, 4)).map(|_| pick(g, &["note", "x1", "A", "2"])).collect();
    words.join(" ")
}

fn leaf(g: &mut Gen) -> Expression {
    match below(g, 4) {
        0 => Expression::Integer(i64::from(u32::arbitrary(g))),
        1 => {
            // Literals are never negative, a minus sign is a unary operator
            let x = f64::arbitrary(g);
            Expression::Real(if x.is_finite() { x.abs() } else { 0.5 })
        }
        2 => Expression::String(text(g)),
        _ => Expression::Variable(pick(g, VARIABLES).to_string()),
    }
}

fn expression(g: &mut Gen, depth: usize) -> Expression {
    if depth == 0 {
        return leaf(g);
    }
    match below(g, 5) {
        0 => leaf(g),
        1 => Expression::UnaryOp {
            op: pick(g, UNARY_OPERATORS),
            operand: Box::new(expression(g, depth - 1)),
        },
        2 => Expression::FunctionCall {
            name: pick(g, FUNCTIONS).to_string(),
            args: (0..below(g, 3)).map(|_| expression(g, depth - 1)).collect(),
        },
        _ => Expression::BinaryOp {
            left: Box::new(expression(g, depth - 1)),
            op: pick(g, BINARY_OPERATORS),
            right: Box::new(expression(g, depth - 1)),
        },
    }
}

fn print(g: &mut Gen) -> Statement {
    let count = below(g, 4);
    let items: Vec<Expression> = (0..count).map(|_| expression(g, 2)).collect();
    let mut separators = Vec::new();
    for i in 0..count {
        // Only the last item may go without a separator
        if i + 1 < count || bool::arbitrary(g) {
            separators.push(pick(g, &[PrintSeparator::Semicolon, PrintSeparator::Comma]));
        }
    }
    Statement::Print { items, separators }
}

/// Any statement except IF and comments
fn simple(g: &mut Gen) -> Statement {
    let name = pick(g, VARIABLES).to_string();
    match below(g, 18) {
        0 => print(g),
        1 => Statement::Let {
            name,
            expression: expression(g, 3),
        },
        2 => Statement::Input {
            prompt: if bool::arbitrary(g) { Some(text(g)) } else { None },
            name,
        },
        3 => Statement::For {
            variable: name,
            start: expression(g, 2),
            end: expression(g, 2),
            step: expression(g, 2),
        },
        4 => Statement::Next {
            variable: if bool::arbitrary(g) { Some(name) } else { None },
        },
        5 => Statement::While {
            condition: expression(g, 2),
        },
        6 => Statement::Wend,
        7 => Statement::Goto {
            line_number: u32::arbitrary(g),
        },
        8 => Statement::Gosub {
            line_number: u32::arbitrary(g),
        },
        9 => Statement::Return,
        10 => Statement::End,
        11 => Statement::Cls,
        12 => Statement::Graphics {
            mode: u32::arbitrary(g),
        },
        13 => Statement::Plot {
            x: expression(g, 1),
            y: expression(g, 1),
        },
        14 => Statement::Line {
            x1: expression(g, 1),
            y1: expression(g, 1),
            x2: expression(g, 1),
            y2: expression(g, 1),
        },
        15 => Statement::Circle {
            x: expression(g, 1),
            y: expression(g, 1),
            radius: expression(g, 1),
        },
        16 => Statement::Rect {
            x: expression(g, 1),
            y: expression(g, 1),
            width: expression(g, 1),
            height: expression(g, 1),
        },
        _ => {
            if bool::arbitrary(g) {
                Statement::Color {
                    value: expression(g, 2),
                }
            } else {
                Statement::Pset {
                    x: expression(g, 1),
                    y: expression(g, 1),
                }
            }
        }
    }
}

/// An IF whose branches read back unambiguously. A THEN branch followed by
/// ELSE may not swallow that ELSE, so it is neither a comment nor an IF.
fn conditional(g: &mut Gen, depth: usize) -> Statement {
    let has_else = bool::arbitrary(g);
    let then_branch = if has_else || depth == 0 {
        simple(g)
    } else {
        statement(g, depth - 1)
    };
    let else_branch = if has_else {
        Some(Box::new(if depth == 0 {
            simple(g)
        } else {
            statement(g, depth - 1)
        }))
    } else {
        None
    };
    Statement::If {
        condition: expression(g, 2),
        then_branch: Box::new(then_branch),
        else_branch,
    }
}

fn statement(g: &mut Gen, depth: usize) -> Statement {
    match below(g, 6) {
        0 => Statement::Comment { text: comment(g) },
        1 => conditional(g, depth),
        _ => simple(g),
    }
}

#[derive(Debug, Clone)]
struct ArbitraryExpression(Expression);

impl Arbitrary for ArbitraryExpression {
    fn arbitrary(g: &mut Gen) -> Self {
        ArbitraryExpression(expression(g, 4))
    }
}

#[derive(Debug, Clone)]
struct ArbitraryStatement(Statement);

impl Arbitrary for ArbitraryStatement {
    fn arbitrary(g: &mut Gen) -> Self {
        ArbitraryStatement(statement(g, 2))
    }
}

fn reparse(source: &str) -> Option<Vec<ParsedLine>> {
    let tokens = tokenize(source).ok()?;
    parse_lines(&tokens).ok()
}

#[quickcheck]
fn expression_survives_listing(expr: ArbitraryExpression) -> bool {
    let statement = Statement::Let {
        name: "A".to_string(),
        expression: expr.0,
    };
    let source = format_line(None, &statement);
    reparse(&source)
        == Some(vec![ParsedLine {
            line_number: None,
            statement: Some(statement),
        }])
}

#[test]
fn test_statement_roundtrip_property() {
    fn property(statement: ArbitraryStatement, line_number: u32) -> bool {
        let line = ParsedLine {
            line_number: Some(line_number),
            statement: Some(statement.0),
        };
        let source = format_line(line.line_number, line.statement.as_ref().unwrap());
        reparse(&source) == Some(vec![line])
    }

    QuickCheck::new()
        .tests(500)
        .quickcheck(property as fn(ArbitraryStatement, u32) -> bool);
}

#[test]
fn test_unnumbered_statement_roundtrip_property() {
    fn property(statement: ArbitraryStatement) -> bool {
        let source = statement.0.to_string();
        reparse(&source)
            == Some(vec![ParsedLine {
                line_number: None,
                statement: Some(statement.0),
            }])
    }

    QuickCheck::new()
        .tests(500)
        .quickcheck(property as fn(ArbitraryStatement) -> bool);
}

#[test]
fn test_known_listings_reparse() {
    let cases = [
        "10 PRINT \"A\"; 1, 2",
        "20 IF (X > 3) THEN PRINT \"big\" ELSE GOTO 100",
        "30 FOR I = 1 TO 10 STEP 2",
        "40 LET Y = (-2 ^ 2)",
        "50 REM",
        "60 REM keep  spacing",
        "70 INPUT 'say \"hi\"'; N$",
        "80 LINE 0, 0 TO 10, 10",
        "90 LET Z = NOT (A AND B)",
    ];
    for source in cases {
        let lines = reparse(source).unwrap();
        let [ParsedLine {
            line_number,
            statement: Some(statement),
        }] = lines.as_slice()
        else {
            panic!("expected one line from {:?}", source);
        };
        assert_eq!(format_line(*line_number, statement), source);
    }
}
