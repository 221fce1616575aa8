//! Values and variable storage
//!
//! Variables are untyped slots holding an integer, a real or a string. A
//! slot takes whatever kind is assigned to it. Arithmetic follows BASIC's
//! late-bound coercion: integers stay integers until mixed with a real or
//! until they overflow.

use crate::error::RuntimeErrorKind;
use crate::parser::BinaryOperator;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

/// A runtime value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Str(String),
}

/// Both operands of a numeric operation, after widening
enum Numbers {
    Integers(i64, i64),
    Floats(f64, f64),
}

impl Value {
    /// BASIC's 1/0 truth convention
    pub fn from_bool(flag: bool) -> Self {
        Value::Integer(if flag { 1 } else { 0 })
    }

    /// Nonzero numbers and non-empty strings are true
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Integer(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
        }
    }

    /// Numeric view of the value, `None` for strings
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            Value::Str(_) => None,
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Float(_) => "real",
            Value::Str(_) => "string",
        }
    }

    fn numbers(&self, other: &Value, op: &str) -> Result<Numbers, RuntimeErrorKind> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Ok(Numbers::Integers(*a, *b)),
            (Value::Integer(a), Value::Float(b)) => Ok(Numbers::Floats(*a as f64, *b)),
            (Value::Float(a), Value::Integer(b)) => Ok(Numbers::Floats(*a, *b as f64)),
            (Value::Float(a), Value::Float(b)) => Ok(Numbers::Floats(*a, *b)),
            _ => Err(RuntimeErrorKind::TypeMismatch(format!(
                "cannot apply {} to {} and {}",
                op,
                self.type_name(),
                other.type_name()
            ))),
        }
    }

    /// Apply a binary operator. Logical operators work on truthiness and
    /// are not short-circuited by the caller.
    pub fn binary(&self, op: BinaryOperator, other: &Value) -> Result<Value, RuntimeErrorKind> {
        match op {
            BinaryOperator::Add => self.add(other),
            BinaryOperator::Subtract => self.arithmetic(other, "-", i64::checked_sub, |a, b| a - b),
            BinaryOperator::Multiply => self.arithmetic(other, "*", i64::checked_mul, |a, b| a * b),
            BinaryOperator::Divide => self.divide(other),
            BinaryOperator::Power => self.power(other),
            BinaryOperator::Equal => Ok(Value::from_bool(self.loosely_equals(other))),
            BinaryOperator::NotEqual => Ok(Value::from_bool(!self.loosely_equals(other))),
            BinaryOperator::LessThan => self.ordered(other, "<", Ordering::is_lt),
            BinaryOperator::GreaterThan => self.ordered(other, ">", Ordering::is_gt),
            BinaryOperator::LessThanOrEqual => self.ordered(other, "<=", Ordering::is_le),
            BinaryOperator::GreaterThanOrEqual => self.ordered(other, ">=", Ordering::is_ge),
            BinaryOperator::And => Ok(Value::from_bool(self.is_truthy() && other.is_truthy())),
            BinaryOperator::Or => Ok(Value::from_bool(self.is_truthy() || other.is_truthy())),
        }
    }

    fn add(&self, other: &Value) -> Result<Value, RuntimeErrorKind> {
        if let (Value::Str(a), Value::Str(b)) = (self, other) {
            return Ok(Value::Str(format!("{}{}", a, b)));
        }
        self.arithmetic(other, "+", i64::checked_add, |a, b| a + b)
    }

    /// Integer arithmetic widens to real on overflow
    fn arithmetic(
        &self,
        other: &Value,
        symbol: &str,
        integer_op: fn(i64, i64) -> Option<i64>,
        float_op: fn(f64, f64) -> f64,
    ) -> Result<Value, RuntimeErrorKind> {
        match self.numbers(other, symbol)? {
            Numbers::Integers(a, b) => Ok(match integer_op(a, b) {
                Some(n) => Value::Integer(n),
                None => Value::Float(float_op(a as f64, b as f64)),
            }),
            Numbers::Floats(a, b) => Ok(Value::Float(float_op(a, b))),
        }
    }

    fn divide(&self, other: &Value) -> Result<Value, RuntimeErrorKind> {
        let (a, b) = match self.numbers(other, "/")? {
            Numbers::Integers(a, b) => (a as f64, b as f64),
            Numbers::Floats(a, b) => (a, b),
        };
        if b == 0.0 {
            return Err(RuntimeErrorKind::DivisionByZero);
        }
        Ok(Value::Float(a / b))
    }

    fn power(&self, other: &Value) -> Result<Value, RuntimeErrorKind> {
        match self.numbers(other, "^")? {
            Numbers::Integers(0, exponent) if exponent < 0 => Err(RuntimeErrorKind::DivisionByZero),
            Numbers::Integers(base, exponent) if exponent >= 0 => {
                let exact = u32::try_from(exponent)
                    .ok()
                    .and_then(|e| base.checked_pow(e));
                Ok(match exact {
                    Some(n) => Value::Integer(n),
                    None => Value::Float((base as f64).powf(exponent as f64)),
                })
            }
            Numbers::Integers(base, exponent) => Ok(Value::Float((base as f64).powf(exponent as f64))),
            Numbers::Floats(base, exponent) => {
                if base == 0.0 && exponent < 0.0 {
                    Err(RuntimeErrorKind::DivisionByZero)
                } else {
                    Ok(Value::Float(base.powf(exponent)))
                }
            }
        }
    }

    /// Equality never fails: values of different kinds are unequal
    fn loosely_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Str(_), _) | (_, Value::Str(_)) => false,
            _ => self.as_f64() == other.as_f64(),
        }
    }

    fn ordered(
        &self,
        other: &Value,
        symbol: &str,
        test: fn(Ordering) -> bool,
    ) -> Result<Value, RuntimeErrorKind> {
        let ordering = match (self, other) {
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            _ => match self.numbers(other, symbol)? {
                Numbers::Integers(a, b) => Some(a.cmp(&b)),
                Numbers::Floats(a, b) => a.partial_cmp(&b),
            },
        };
        // NaN compares false both ways
        Ok(Value::from_bool(ordering.map_or(false, test)))
    }

    /// Unary minus
    pub fn negate(&self) -> Result<Value, RuntimeErrorKind> {
        match self {
            Value::Integer(n) => Ok(n
                .checked_neg()
                .map_or(Value::Float(-(*n as f64)), Value::Integer)),
            Value::Float(f) => Ok(Value::Float(-f)),
            Value::Str(_) => Err(RuntimeErrorKind::TypeMismatch(
                "cannot negate a string".to_string(),
            )),
        }
    }

    /// Unary plus
    pub fn identity(&self) -> Result<Value, RuntimeErrorKind> {
        match self {
            Value::Str(_) => Err(RuntimeErrorKind::TypeMismatch(
                "unary + on a string".to_string(),
            )),
            number => Ok(number.clone()),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Integer(0)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{}", n),
            Value::Float(x) => {
                let text = x.to_string();
                if x.is_finite() && !text.contains('.') {
                    write!(f, "{}.0", text)
                } else {
                    f.write_str(&text)
                }
            }
            Value::Str(s) => f.write_str(s),
        }
    }
}

/// Variable storage system
#[derive(Debug, Clone, Default)]
pub struct VariableStore {
    variables: HashMap<String, Value>,
}

impl VariableStore {
    /// Create a new variable store
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a variable, creating it or changing its kind as needed
    pub fn set(&mut self, name: &str, value: Value) {
        self.variables.insert(name.to_string(), value);
    }

    /// Look up a variable that may never have been assigned
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// Read a variable. Unassigned variables read as integer 0.
    pub fn value_of(&self, name: &str) -> Value {
        self.variables.get(name).cloned().unwrap_or_default()
    }

    /// Check if a variable exists
    pub fn has_variable(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Clear all variables
    pub fn clear(&mut self) {
        self.variables.clear();
    }
}
