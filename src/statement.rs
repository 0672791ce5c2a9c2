use crate::config::ConsistencyLevel;
use crate::value::CqlValue;

use std::iter::Peekable;
use std::str::Chars;
use std::time::Duration;

/// A statement ready for execution: text, positional bind values and request options
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    cql: String,
    values: Vec<CqlValue>,
    consistency_level: Option<ConsistencyLevel>,
    timeout: Option<Duration>,
    prepare: bool,
}

impl Statement {
    /// Creates a statement with no bind values
    pub fn new(cql: impl Into<String>) -> Self {
        Self {
            cql: cql.into(),
            values: Vec::new(),
            consistency_level: None,
            timeout: None,
            prepare: true,
        }
    }

    /// Sets the positional bind values
    pub fn with_values(mut self, values: Vec<CqlValue>) -> Self {
        self.values = values;
        self
    }

    /// Sets the consistency level
    pub fn with_consistency_level(mut self, level: Option<ConsistencyLevel>) -> Self {
        self.consistency_level = level;
        self
    }

    /// Sets the request timeout
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets whether the driver should prepare the statement
    pub fn with_prepare(mut self, prepare: bool) -> Self {
        self.prepare = prepare;
        self
    }

    pub fn cql(&self) -> &str {
        &self.cql
    }

    pub fn values(&self) -> &[CqlValue] {
        &self.values
    }

    pub fn consistency_level(&self) -> Option<ConsistencyLevel> {
        self.consistency_level
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn prepare(&self) -> bool {
        self.prepare
    }

    /// Number of `?` placeholders outside of quoted text and comments.
    ///
    /// Skips `'...'` and `$$...$$` strings, `"..."` identifiers, `--` and `//` line
    /// comments, and `/* ... */` block comments.
    pub fn placeholder_count(&self) -> usize {
        let mut count = 0;
        let mut chars = self.cql.chars().peekable();
        while let Some(c) = chars.next() {
            let next = chars.peek().copied();
            match (c, next) {
                ('\'', _) | ('"', _) => skip_until(&mut chars, c),
                ('$', Some('$')) => {
                    chars.next();
                    while let Some(next) = chars.next() {
                        if next == '$' && chars.next_if_eq(&'$').is_some() {
                            break;
                        }
                    }
                }
                ('-', Some('-')) | ('/', Some('/')) => skip_until(&mut chars, '\n'),
                ('/', Some('*')) => {
                    chars.next();
                    while let Some(next) = chars.next() {
                        if next == '*' && chars.next_if_eq(&'/').is_some() {
                            break;
                        }
                    }
                }
                ('?', _) => count += 1,
                _ => {}
            }
        }
        count
    }
}

fn skip_until(chars: &mut Peekable<Chars<'_>>, end: char) {
    for c in chars.by_ref() {
        if c == end {
            break;
        }
    }
}
