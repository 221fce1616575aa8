//! Program storage and management
//!
//! Numbered lines live in a sorted map used for execution. Every line,
//! numbered or not, also has an entry in a source-order listing used for
//! LIST and SAVE. Loading merges by line number.

use crate::parser::{ParsedLine, Statement};
use log::debug;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::rc::Rc;

/// One entry of the source-order listing
#[derive(Debug, Clone, PartialEq)]
pub struct ListingEntry {
    pub line_number: Option<u32>,
    pub statement: Rc<Statement>,
}

/// Program line storage
#[derive(Debug, Clone, Default)]
pub struct ProgramStore {
    lines: BTreeMap<u32, Rc<Statement>>,
    listing: Vec<ListingEntry>,
}

impl ProgramStore {
    /// Create a new program store
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge parsed lines in order. A numbered line replaces any existing
    /// line with that number and moves to the end of the listing. A number
    /// with no statement deletes the line.
    pub fn merge(&mut self, lines: Vec<ParsedLine>) {
        for line in lines {
            match (line.line_number, line.statement) {
                (Some(number), Some(statement)) => self.store_line(number, statement),
                (Some(number), None) => {
                    self.delete_line(number);
                }
                (None, Some(statement)) => self.listing.push(ListingEntry {
                    line_number: None,
                    statement: Rc::new(statement),
                }),
                (None, None) => {}
            }
        }
    }

    /// Store a numbered program line
    pub fn store_line(&mut self, line_number: u32, statement: Statement) {
        if self.lines.contains_key(&line_number) {
            debug!("replacing line {}", line_number);
            self.remove_from_listing(line_number);
        }
        let statement = Rc::new(statement);
        self.lines.insert(line_number, Rc::clone(&statement));
        self.listing.push(ListingEntry {
            line_number: Some(line_number),
            statement,
        });
    }

    /// Delete a numbered line from both the map and the listing
    pub fn delete_line(&mut self, line_number: u32) -> bool {
        if self.lines.remove(&line_number).is_some() {
            self.remove_from_listing(line_number);
            debug!("deleted line {}", line_number);
            true
        } else {
            false
        }
    }

    fn remove_from_listing(&mut self, line_number: u32) {
        self.listing
            .retain(|entry| entry.line_number != Some(line_number));
    }

    /// Get a program line
    pub fn get_line(&self, line_number: u32) -> Option<Rc<Statement>> {
        self.lines.get(&line_number).cloned()
    }

    pub fn contains_line(&self, line_number: u32) -> bool {
        self.lines.contains_key(&line_number)
    }

    /// Smallest line number in the program
    pub fn first_line(&self) -> Option<u32> {
        self.lines.keys().next().copied()
    }

    /// Smallest line number strictly greater than `line_number`
    pub fn next_line_after(&self, line_number: u32) -> Option<u32> {
        self.lines
            .range((Bound::Excluded(line_number), Bound::Unbounded))
            .next()
            .map(|(number, _)| *number)
    }

    /// Numbered lines after `line_number`, in ascending order
    pub fn lines_after(&self, line_number: u32) -> impl Iterator<Item = (u32, &Statement)> + '_ {
        self.lines
            .range((Bound::Excluded(line_number), Bound::Unbounded))
            .map(|(number, statement)| (*number, statement.as_ref()))
    }

    /// Entries in source order
    pub fn listing(&self) -> &[ListingEntry] {
        &self.listing
    }

    /// Number of numbered lines
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// True if any numbered line uses the drawing surface
    pub fn contains_graphics(&self) -> bool {
        self.lines.values().any(|statement| statement.is_graphics())
    }

    /// Clear all program lines
    pub fn clear_program(&mut self) {
        self.lines.clear();
        self.listing.clear();
    }
}
