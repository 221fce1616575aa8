//! Text I/O for PRINT, INPUT and CLS
//!
//! The executor never touches stdin/stdout directly. `StdConsole` is the
//! terminal; `BufferedConsole` captures output and replays queued input,
//! which is what the tests drive.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

/// ANSI clear screen and cursor home
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Line-oriented console
pub trait Console {
    /// Write one line of output. The newline is added by the console.
    fn write_line(&mut self, text: &str);

    /// Show a prompt and read one line, without its line terminator
    fn read_line(&mut self, prompt: &str) -> io::Result<String>;

    /// Clear the text screen
    fn clear(&mut self);
}

/// Terminal console on stdin/stdout
#[derive(Debug, Default)]
pub struct StdConsole;

impl StdConsole {
    pub fn new() -> Self {
        Self
    }
}

impl Console for StdConsole {
    fn write_line(&mut self, text: &str) {
        println!("{}", text);
    }

    fn read_line(&mut self, prompt: &str) -> io::Result<String> {
        print!("{}", prompt);
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().lock().read_line(&mut input)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "end of input"));
        }
        Ok(input.trim_end_matches(&['\r', '\n'][..]).to_string())
    }

    fn clear(&mut self) {
        print!("{}", CLEAR_SCREEN);
        // Nothing useful to do if the terminal has gone away
        let _ = io::stdout().flush();
    }
}

/// In-memory console with captured output and scripted input
#[derive(Debug, Default)]
pub struct BufferedConsole {
    output: Vec<String>,
    input: VecDeque<String>,
    prompts: Vec<String>,
    clears: usize,
}

impl BufferedConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Console that answers INPUT with the given lines in order
    pub fn with_input<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            input: lines.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Queue another line of input
    pub fn push_input(&mut self, line: impl Into<String>) {
        self.input.push_back(line.into());
    }

    /// Lines written so far
    pub fn lines(&self) -> &[String] {
        &self.output
    }

    /// All output joined with newlines, as a terminal would show it
    pub fn output(&self) -> String {
        let mut text = String::new();
        for line in &self.output {
            text.push_str(line);
            text.push('\n');
        }
        text
    }

    /// Prompts shown by INPUT
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    /// Number of times the screen was cleared
    pub fn clear_count(&self) -> usize {
        self.clears
    }

    /// Drop captured output
    pub fn take_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.output)
    }
}

impl Console for BufferedConsole {
    fn write_line(&mut self, text: &str) {
        self.output.push(text.to_string());
    }

    fn read_line(&mut self, prompt: &str) -> io::Result<String> {
        self.prompts.push(prompt.to_string());
        self.input
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no input queued"))
    }

    fn clear(&mut self) {
        self.clears += 1;
    }
}
