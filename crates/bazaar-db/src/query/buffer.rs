//! Parameter-tracking SQL buffer.
//!
//! Holds growing SQL text, the positional values bound so far, and the
//! cursor: the value count at the last commit point. Fragments are written
//! with local placeholders `?1..?k` and renumbered on append to
//! `?cursor+1..?cursor+k`, so every composer can be written independently
//! of what ran before it.
//!
//! ```text
//! append("AND o.status = ?1", ["waiting"])   cursor 3
//!        │
//!        ▼
//! text  += "AND o.status = ?4"
//! values = [.., .., .., "waiting"]
//! commit()                                   cursor 4
//! ```
//!
//! A buffer belongs to exactly one query construction. It is not shared
//! across tasks and never reused between a Find and its Count. `finish`
//! leaves it empty, so nothing from one statement can leak into a later one.

use super::{BuiltQuery, SqlValue};

#[derive(Debug, Default)]
pub(crate) struct SqlBuffer {
    text: String,
    values: Vec<SqlValue>,
    cursor: usize,
}

impl SqlBuffer {
    pub(crate) fn new() -> Self {
        SqlBuffer::default()
    }

    /// Appends SQL that binds nothing.
    pub(crate) fn push_sql(&mut self, sql: &str) {
        self.text.push_str(sql);
    }

    /// Appends a fragment written with local placeholders `?1..?k` together
    /// with its `k` values.
    pub(crate) fn append(&mut self, fragment: &str, values: Vec<SqlValue>) {
        debug_assert_eq!(
            self.cursor,
            self.values.len(),
            "append after uncommitted values"
        );
        self.text.push_str(&renumber(fragment, self.cursor));
        self.values.extend(values);
    }

    /// Marks every value appended so far as placed.
    pub(crate) fn commit(&mut self) {
        self.cursor = self.values.len();
    }

    /// Clears text, values and cursor.
    pub(crate) fn reset(&mut self) {
        self.text.clear();
        self.values.clear();
        self.cursor = 0;
    }

    #[cfg(test)]
    pub(crate) fn cursor(&self) -> usize {
        self.cursor
    }

    /// Hands out the built statement and leaves the buffer reset.
    pub(crate) fn finish(&mut self) -> BuiltQuery {
        let built = BuiltQuery {
            sql: std::mem::take(&mut self.text),
            values: std::mem::take(&mut self.values),
        };
        self.reset();
        built
    }
}

/// Shifts every `?N` outside string literals by `offset`.
fn renumber(fragment: &str, offset: usize) -> String {
    if offset == 0 {
        return fragment.to_string();
    }

    let mut out = String::with_capacity(fragment.len() + 8);
    let mut chars = fragment.chars().peekable();
    let mut in_quote = false;

    while let Some(c) = chars.next() {
        out.push(c);
        match c {
            '\'' => in_quote = !in_quote,
            '?' if !in_quote => {
                let mut digits = String::new();
                while let Some(d) = chars.peek().copied().filter(char::is_ascii_digit) {
                    digits.push(d);
                    chars.next();
                }
                match digits.parse::<usize>() {
                    Ok(n) => out.push_str(&(n + offset).to_string()),
                    Err(_) => out.push_str(&digits),
                }
            }
            _ => {}
        }
    }

    out
}
