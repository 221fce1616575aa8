//! Execution engine for BASIC programs
//!
//! Walks the program one numbered line at a time. Every statement returns a
//! [`Flow`] telling the run loop where to go next, so jumps never rely on
//! shared "did we jump" state. Faults inside an expression (division by
//! zero, a failing built-in) are reported on the console, evaluate to 0 and
//! halt the run once the statement completes. Control-flow errors abort
//! the statement straight away.

use crate::console::{Console, StdConsole};
use crate::error::{BasicError, RuntimeError, RuntimeErrorKind};
use crate::graphics::{Canvas, DrawingSurface};
use crate::listing::format_program;
use crate::parser::{
    parse_lines, BinaryOperator, Expression, ParsedLine, PrintSeparator, Statement, UnaryOperator,
};
use crate::program::ProgramStore;
use crate::tokenizer::tokenize;
use crate::variables::{Value, VariableStore};
use log::{debug, trace, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// What the run loop does after a statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Advance to the next numbered line
    Continue,
    /// Resume at this line
    JumpTo(u32),
    /// Stop the run normally
    Halt,
}

/// Active FOR loop
#[derive(Debug, Clone)]
struct ForFrame {
    variable: String,
    end: f64,
    step: Value,
    /// Line of the FOR statement
    line: u32,
}

/// BASIC program executor
pub struct Executor<C = StdConsole, G = Canvas> {
    program: ProgramStore,
    variables: VariableStore,
    // GOSUB origin lines, `None` for a GOSUB typed at the prompt
    return_stack: Vec<Option<u32>>,
    for_loops: Vec<ForFrame>,
    // WHILE origin lines
    while_stack: Vec<u32>,
    current_line: Option<u32>,
    running: bool,
    // First expression fault of the statement being executed
    pending_fault: Option<RuntimeError>,
    last_error: Option<RuntimeError>,
    console: C,
    graphics: G,
    rng: StdRng,
    started: Instant,
    interrupt: Arc<AtomicBool>,
}

impl Executor {
    /// Executor on the terminal with an off-screen canvas
    pub fn new() -> Self {
        Self::with_io(StdConsole::new(), Canvas::new())
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Console, G: DrawingSurface> Executor<C, G> {
    /// Create an executor on the given console and drawing surface
    pub fn with_io(console: C, graphics: G) -> Self {
        Self {
            program: ProgramStore::new(),
            variables: VariableStore::new(),
            return_stack: Vec::new(),
            for_loops: Vec::new(),
            while_stack: Vec::new(),
            current_line: None,
            running: false,
            pending_fault: None,
            last_error: None,
            console,
            graphics,
            rng: StdRng::from_entropy(),
            started: Instant::now(),
            interrupt: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Make RND reproducible
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Flag that stops a running program before its next statement
    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupt)
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    pub fn console_mut(&mut self) -> &mut C {
        &mut self.console
    }

    pub fn graphics(&self) -> &G {
        &self.graphics
    }

    pub fn graphics_mut(&mut self) -> &mut G {
        &mut self.graphics
    }

    pub fn program(&self) -> &ProgramStore {
        &self.program
    }

    pub fn variables(&self) -> &VariableStore {
        &self.variables
    }

    /// Read a variable the way a program would
    pub fn variable(&self, name: &str) -> Value {
        self.variables.value_of(&name.to_uppercase())
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn current_line(&self) -> Option<u32> {
        self.current_line
    }

    /// Most recent runtime error, if any
    pub fn last_error(&self) -> Option<&RuntimeError> {
        self.last_error.as_ref()
    }

    /// Parse source text and merge it into the program. Nothing changes
    /// unless the whole text lexes and parses.
    pub fn load(&mut self, source: &str) -> Result<(), BasicError> {
        let tokens = tokenize(source)?;
        let lines = parse_lines(&tokens)?;
        debug!("loaded {} line(s)", lines.len());
        self.program.merge(lines);
        Ok(())
    }

    /// Delete a numbered line
    pub fn delete_line(&mut self, line_number: u32) -> bool {
        self.program.delete_line(line_number)
    }

    /// Program text in source order
    pub fn listing(&self) -> String {
        format_program(&self.program)
    }

    /// NEW: drop the program and all execution state
    pub fn clear_program(&mut self) {
        self.program.clear_program();
        self.reset_state();
    }

    /// Drop variables and control stacks, keeping the program
    pub fn reset_state(&mut self) {
        self.variables.clear();
        self.clear_stacks();
        self.current_line = None;
        self.running = false;
        self.pending_fault = None;
        self.last_error = None;
    }

    fn clear_stacks(&mut self) {
        self.return_stack.clear();
        self.for_loops.clear();
        self.while_stack.clear();
    }

    /// Run the program from its first line. Runtime errors are reported on
    /// the console and also returned.
    pub fn run(&mut self) -> Result<(), RuntimeError> {
        let Some(first) = self.program.first_line() else {
            self.console.write_line("No program loaded");
            return Ok(());
        };

        self.interrupt.store(false, Ordering::SeqCst);
        self.clear_stacks();
        self.last_error = None;

        if self.graphics.is_open() && self.program.contains_graphics() {
            debug!("resetting graphics surface");
            self.graphics.close();
            if let Err(e) = self.graphics.open(0) {
                let error = RuntimeError::new(first, RuntimeErrorKind::Graphics(e.to_string()));
                self.report(&error);
                return Err(error);
            }
        }
        if self.graphics.is_open() {
            self.graphics.clear();
        } else {
            self.console.clear();
        }

        debug!("run started at line {}", first);
        let result = self.execute_from(first);
        debug!("run stopped at line {:?}", self.current_line);
        result
    }

    /// Parse a chunk of text typed at the prompt. Numbered lines are merged
    /// into the program; other statements execute now.
    pub fn execute_immediate(&mut self, source: &str) -> Result<(), BasicError> {
        let tokens = tokenize(source)?;
        let lines = parse_lines(&tokens)?;

        for line in lines {
            match (line.line_number, line.statement) {
                (None, Some(statement)) => self.execute_direct(&statement)?,
                (line_number, statement) => self.program.merge(vec![ParsedLine {
                    line_number,
                    statement,
                }]),
            }
        }
        Ok(())
    }

    /// Statements typed without a number run as line 0
    fn execute_direct(&mut self, statement: &Statement) -> Result<(), RuntimeError> {
        let line = 0;
        self.current_line = None;
        self.running = true;
        self.pending_fault = None;

        let flow = match self.execute_statement(statement, line) {
            Ok(flow) => flow,
            Err(error) => {
                self.running = false;
                self.report(&error);
                return Err(error);
            }
        };
        if let Some(error) = self.pending_fault.take() {
            self.running = false;
            return Err(error);
        }

        match flow {
            // A jump from the prompt carries on into the program
            Flow::JumpTo(target) if self.running => self.execute_from(target),
            _ => {
                self.running = false;
                Ok(())
            }
        }
    }

    /// The run loop
    fn execute_from(&mut self, start: u32) -> Result<(), RuntimeError> {
        let mut line = start;
        self.running = true;

        let result = loop {
            if self.interrupt.swap(false, Ordering::SeqCst) {
                debug!("interrupted before line {}", line);
                self.console.write_line("Program interrupted");
                break Ok(());
            }

            let Some(statement) = self.program.get_line(line) else {
                break Ok(());
            };
            self.current_line = Some(line);
            self.pending_fault = None;
            trace!("line {}: {:?}", line, statement);

            let flow = match self.execute_statement(&statement, line) {
                Ok(flow) => flow,
                Err(error) => {
                    self.report(&error);
                    break Err(error);
                }
            };
            if let Some(error) = self.pending_fault.take() {
                break Err(error);
            }

            match flow {
                Flow::Continue => match self.program.next_line_after(line) {
                    Some(next) => line = next,
                    None => break Ok(()),
                },
                Flow::JumpTo(target) => line = target,
                Flow::Halt => break Ok(()),
            }
        };

        self.running = false;
        result
    }

    fn report(&mut self, error: &RuntimeError) {
        warn!("{}", error);
        self.console.write_line(&error.to_string());
        self.last_error = Some(error.clone());
    }

    /// Report an expression fault and carry on with 0
    fn fault(&mut self, kind: RuntimeErrorKind) -> Value {
        let error = RuntimeError::new(self.current_line.unwrap_or(0), kind);
        self.report(&error);
        self.running = false;
        if self.pending_fault.is_none() {
            self.pending_fault = Some(error);
        }
        Value::Integer(0)
    }

    /// Continue after `line`, or stop if it is the last line
    fn resume_after(&self, line: u32) -> Flow {
        match self.program.next_line_after(line) {
            Some(next) => Flow::JumpTo(next),
            None => Flow::Halt,
        }
    }

    /// Execute a statement
    fn execute_statement(&mut self, statement: &Statement, line: u32) -> Result<Flow, RuntimeError> {
        let error = |kind: RuntimeErrorKind| RuntimeError::new(line, kind);

        match statement {
            Statement::Print { items, separators } => {
                self.execute_print(items, separators);
                Ok(Flow::Continue)
            }
            Statement::Let { name, expression } => {
                let value = self.evaluate(expression);
                self.variables.set(name, value);
                Ok(Flow::Continue)
            }
            Statement::Input { prompt, name } => {
                self.execute_input(prompt.as_deref(), name).map_err(error)?;
                Ok(Flow::Continue)
            }
            Statement::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition).is_truthy() {
                    self.execute_statement(then_branch, line)
                } else if let Some(else_branch) = else_branch {
                    self.execute_statement(else_branch, line)
                } else {
                    Ok(Flow::Continue)
                }
            }
            Statement::For {
                variable,
                start,
                end,
                step,
            } => self.execute_for(variable, start, end, step, line).map_err(error),
            Statement::Next { .. } => self.execute_next().map_err(error),
            Statement::While { condition } => self.execute_while(condition, line).map_err(error),
            Statement::Wend => self.execute_wend().map_err(error),
            Statement::Goto { line_number } => {
                if !self.program.contains_line(*line_number) {
                    return Err(error(RuntimeErrorKind::LineNotFound(*line_number)));
                }
                Ok(Flow::JumpTo(*line_number))
            }
            Statement::Gosub { line_number } => {
                if !self.program.contains_line(*line_number) {
                    return Err(error(RuntimeErrorKind::LineNotFound(*line_number)));
                }
                self.return_stack.push(self.current_line);
                Ok(Flow::JumpTo(*line_number))
            }
            Statement::Return => match self.return_stack.pop() {
                Some(Some(origin)) => Ok(self.resume_after(origin)),
                // Back to the prompt
                Some(None) => Ok(Flow::Halt),
                None => Err(error(RuntimeErrorKind::ReturnWithoutGosub)),
            },
            Statement::End => {
                self.running = false;
                Ok(Flow::Halt)
            }
            Statement::Cls => {
                if self.graphics.is_open() {
                    self.graphics.clear();
                } else {
                    self.console.clear();
                }
                Ok(Flow::Continue)
            }
            Statement::Comment { .. } => Ok(Flow::Continue),
            Statement::Graphics { mode } => {
                self.graphics
                    .open(*mode)
                    .map_err(|e| error(RuntimeErrorKind::Graphics(e.to_string())))?;
                Ok(Flow::Continue)
            }
            Statement::Plot { x, y } | Statement::Pset { x, y } => {
                let (x, y) = (self.number(x), self.number(y));
                self.graphics.point(x, y);
                Ok(Flow::Continue)
            }
            Statement::Line { x1, y1, x2, y2 } => {
                let (x1, y1) = (self.number(x1), self.number(y1));
                let (x2, y2) = (self.number(x2), self.number(y2));
                self.graphics.line(x1, y1, x2, y2);
                Ok(Flow::Continue)
            }
            Statement::Circle { x, y, radius } => {
                let (x, y, radius) = (self.number(x), self.number(y), self.number(radius));
                self.graphics.circle(x, y, radius);
                Ok(Flow::Continue)
            }
            Statement::Rect {
                x,
                y,
                width,
                height,
            } => {
                let (x, y) = (self.number(x), self.number(y));
                let (width, height) = (self.number(width), self.number(height));
                self.graphics.rect(x, y, width, height);
                Ok(Flow::Continue)
            }
            Statement::Color { value } => {
                let index = self.number(value);
                self.graphics.set_color(index as i64);
                Ok(Flow::Continue)
            }
        }
    }

    /// `;` joins items directly, `,` inserts four spaces, and items with no
    /// captured separator are joined by one space
    fn execute_print(&mut self, items: &[Expression], separators: &[PrintSeparator]) {
        let mut output = String::new();
        for (i, item) in items.iter().enumerate() {
            let value = self.evaluate(item);
            output.push_str(&value.to_string());
            match separators.get(i) {
                Some(PrintSeparator::Semicolon) => {}
                Some(PrintSeparator::Comma) => output.push_str("    "),
                None if i + 1 < items.len() => output.push(' '),
                None => {}
            }
        }
        self.console.write_line(&output);
    }

    fn execute_input(&mut self, prompt: Option<&str>, name: &str) -> Result<(), RuntimeErrorKind> {
        let prompt = match prompt {
            Some(text) => format!("{} ", text),
            None => "? ".to_string(),
        };
        let text = self
            .console
            .read_line(&prompt)
            .map_err(|e| RuntimeErrorKind::Input(e.to_string()))?;
        self.variables.set(name, parse_input(&text));
        Ok(())
    }

    fn execute_for(
        &mut self,
        variable: &str,
        start: &Expression,
        end: &Expression,
        step: &Expression,
        line: u32,
    ) -> Result<Flow, RuntimeErrorKind> {
        let start = self.evaluate(start);
        let end = self.evaluate(end);
        let step = self.evaluate(step);

        let (Some(first), Some(last), Some(increment)) = (start.as_f64(), end.as_f64(), step.as_f64())
        else {
            return Err(RuntimeErrorKind::TypeMismatch(
                "FOR needs numeric bounds".to_string(),
            ));
        };

        self.variables.set(variable, start);

        let enters = if increment >= 0.0 {
            first <= last
        } else {
            first >= last
        };
        if !enters {
            // Skip the body entirely
            let next = self
                .find_matching_next(line)
                .ok_or(RuntimeErrorKind::ForWithoutNext)?;
            trace!("FOR at line {} skipped to NEXT at line {}", line, next);
            return Ok(self.resume_after(next));
        }

        self.for_loops.push(ForFrame {
            variable: variable.to_string(),
            end: last,
            step,
            line,
        });
        Ok(Flow::Continue)
    }

    /// NEXT always steps the innermost loop, whatever variable it names
    fn execute_next(&mut self) -> Result<Flow, RuntimeErrorKind> {
        let frame = self
            .for_loops
            .last()
            .cloned()
            .ok_or(RuntimeErrorKind::NextWithoutFor)?;

        let current = self.variables.value_of(&frame.variable);
        let value = current.binary(BinaryOperator::Add, &frame.step)?;
        let position = value.as_f64().unwrap_or(f64::NAN);
        self.variables.set(&frame.variable, value);

        let step = frame.step.as_f64().unwrap_or(0.0);
        let again = (step > 0.0 && position <= frame.end) || (step < 0.0 && position >= frame.end);
        if again {
            Ok(self.resume_after(frame.line))
        } else {
            self.for_loops.pop();
            Ok(Flow::Continue)
        }
    }

    fn execute_while(&mut self, condition: &Expression, line: u32) -> Result<Flow, RuntimeErrorKind> {
        if self.evaluate(condition).is_truthy() {
            self.while_stack.push(line);
            return Ok(Flow::Continue);
        }
        let wend = self
            .find_matching_wend(line)
            .ok_or(RuntimeErrorKind::WhileWithoutWend)?;
        Ok(self.resume_after(wend))
    }

    fn execute_wend(&mut self) -> Result<Flow, RuntimeErrorKind> {
        let origin = *self
            .while_stack
            .last()
            .ok_or(RuntimeErrorKind::WendWithoutWhile)?;

        let condition = match self.program.get_line(origin).as_deref() {
            Some(Statement::While { condition }) => condition.clone(),
            // The WHILE line was edited away under the loop
            _ => {
                self.while_stack.pop();
                return Err(RuntimeErrorKind::WendWithoutWhile);
            }
        };

        if self.evaluate(&condition).is_truthy() {
            Ok(self.resume_after(origin))
        } else {
            self.while_stack.pop();
            Ok(Flow::Continue)
        }
    }

    /// Line of the NEXT closing the FOR at `line`, counting nested loops
    fn find_matching_next(&self, line: u32) -> Option<u32> {
        self.find_closer(
            line,
            |s| matches!(s, Statement::For { .. }),
            |s| matches!(s, Statement::Next { .. }),
        )
    }

    /// Line of the WEND closing the WHILE at `line`, counting nested loops
    fn find_matching_wend(&self, line: u32) -> Option<u32> {
        self.find_closer(
            line,
            |s| matches!(s, Statement::While { .. }),
            |s| matches!(s, Statement::Wend),
        )
    }

    fn find_closer(
        &self,
        line: u32,
        opens: fn(&Statement) -> bool,
        closes: fn(&Statement) -> bool,
    ) -> Option<u32> {
        let mut depth = 0usize;
        for (number, statement) in self.program.lines_after(line) {
            let (opened, closed) = loop_markers(statement, opens, closes);
            depth += opened;
            if closed > depth {
                return Some(number);
            }
            depth -= closed;
        }
        None
    }

    /// Evaluate a graphics operand as a number
    fn number(&mut self, expression: &Expression) -> f64 {
        match self.evaluate(expression) {
            Value::Str(_) => {
                self.fault(RuntimeErrorKind::TypeMismatch("expected a number".to_string()));
                0.0
            }
            value => value.as_f64().unwrap_or(0.0),
        }
    }

    /// Evaluate an expression. Faults are reported and read as 0.
    pub fn evaluate(&mut self, expression: &Expression) -> Value {
        match expression {
            Expression::Integer(n) => Value::Integer(*n),
            Expression::Real(x) => Value::Float(*x),
            Expression::String(s) => Value::Str(s.clone()),
            Expression::Variable(name) => self.variables.value_of(name),
            Expression::BinaryOp { left, op, right } => {
                // Both sides are always evaluated
                let left = self.evaluate(left);
                let right = self.evaluate(right);
                match left.binary(*op, &right) {
                    Ok(value) => value,
                    Err(kind) => self.fault(kind),
                }
            }
            Expression::UnaryOp { op, operand } => {
                let operand = self.evaluate(operand);
                let result = match op {
                    UnaryOperator::Minus => operand.negate(),
                    UnaryOperator::Plus => operand.identity(),
                    UnaryOperator::Not => Ok(Value::from_bool(!operand.is_truthy())),
                };
                match result {
                    Ok(value) => value,
                    Err(kind) => self.fault(kind),
                }
            }
            Expression::FunctionCall { name, args } => {
                let args: Vec<Value> = args.iter().map(|arg| self.evaluate(arg)).collect();
                match self.call_function(name, &args) {
                    Ok(value) => value,
                    Err(kind) => self.fault(kind),
                }
            }
        }
    }

    /// Built-in functions, looked up by uppercased name
    fn call_function(&mut self, name: &str, args: &[Value]) -> Result<Value, RuntimeErrorKind> {
        let failed = |reason: &str| RuntimeErrorKind::FunctionFailed {
            name: name.to_string(),
            reason: reason.to_string(),
        };
        let arity = |expected: usize| {
            if args.len() == expected {
                Ok(())
            } else {
                Err(failed(&format!(
                    "expected {} argument(s), got {}",
                    expected,
                    args.len()
                )))
            }
        };
        let number = |value: &Value| value.as_f64().ok_or_else(|| failed("expected a number"));

        match name {
            "ABS" => {
                arity(1)?;
                match &args[0] {
                    Value::Integer(n) => Ok(n
                        .checked_abs()
                        .map_or(Value::Float((*n as f64).abs()), Value::Integer)),
                    other => Ok(Value::Float(number(other)?.abs())),
                }
            }
            "INT" => {
                arity(1)?;
                match &args[0] {
                    Value::Integer(n) => Ok(Value::Integer(*n)),
                    other => {
                        let x = number(other)?.trunc();
                        if x.is_finite() && x >= i64::MIN as f64 && x < i64::MAX as f64 {
                            Ok(Value::Integer(x as i64))
                        } else {
                            Err(failed("cannot convert to integer"))
                        }
                    }
                }
            }
            "SQR" => {
                arity(1)?;
                let x = number(&args[0])?;
                if x < 0.0 {
                    return Err(failed("math domain error"));
                }
                Ok(Value::Float(x.sqrt()))
            }
            "SIN" => {
                arity(1)?;
                Ok(Value::Float(number(&args[0])?.sin()))
            }
            "COS" => {
                arity(1)?;
                Ok(Value::Float(number(&args[0])?.cos()))
            }
            "TAN" => {
                arity(1)?;
                Ok(Value::Float(number(&args[0])?.tan()))
            }
            "RND" => match args {
                [] => Ok(Value::Float(self.rng.gen::<f64>())),
                [limit] => {
                    let limit = number(limit)?.trunc();
                    if limit < 1.0 || limit > i64::MAX as f64 {
                        return Err(failed("empty range for RND"));
                    }
                    Ok(Value::Integer(self.rng.gen_range(1..=limit as i64)))
                }
                _ => Err(failed(&format!(
                    "expected at most 1 argument(s), got {}",
                    args.len()
                ))),
            },
            "LEN" => {
                arity(1)?;
                let length = args[0].to_string().chars().count();
                Ok(Value::Integer(length as i64))
            }
            "CHR" => {
                arity(1)?;
                let code = number(&args[0])?.trunc();
                if !(0.0..=u32::MAX as f64).contains(&code) {
                    return Err(failed("chr() arg not in range"));
                }
                char::from_u32(code as u32)
                    .map(|c| Value::Str(c.to_string()))
                    .ok_or_else(|| failed("chr() arg not in range"))
            }
            "ASC" => {
                arity(1)?;
                let code = args[0].to_string().chars().next().map_or(0, |c| c as i64);
                Ok(Value::Integer(code))
            }
            "TIMER" => {
                arity(0)?;
                Ok(Value::Float(self.started.elapsed().as_secs_f64()))
            }
            _ => Err(RuntimeErrorKind::UnknownFunction(name.to_string())),
        }
    }
}

/// Loop openers and closers in a statement, looking inside IF branches
fn loop_markers(
    statement: &Statement,
    opens: fn(&Statement) -> bool,
    closes: fn(&Statement) -> bool,
) -> (usize, usize) {
    match statement {
        Statement::If {
            then_branch,
            else_branch,
            ..
        } => {
            let (mut opened, mut closed) = loop_markers(then_branch, opens, closes);
            if let Some(else_branch) = else_branch {
                let (o, c) = loop_markers(else_branch, opens, closes);
                opened += o;
                closed += c;
            }
            (opened, closed)
        }
        s if opens(s) => (1, 0),
        s if closes(s) => (0, 1),
        _ => (0, 0),
    }
}

/// INPUT text becomes an integer, a real if it has a decimal point, or
/// else stays a string
fn parse_input(text: &str) -> Value {
    let trimmed = text.trim();
    if trimmed.contains('.') {
        if let Ok(x) = trimmed.parse::<f64>() {
            return Value::Float(x);
        }
    } else if let Ok(n) = trimmed.parse::<i64>() {
        return Value::Integer(n);
    }
    Value::Str(text.to_string())
}
