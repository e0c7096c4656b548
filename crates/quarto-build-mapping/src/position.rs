/*
 * position.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Line/column tracking over appended text

use crate::types::Offset;

/// Running (line, column) position at the end of everything appended so far.
///
/// Columns count UTF-16 code units, the granularity used by source map
/// consumers. `\r\n` is a single break; a lone `\r` or `\n` is also a break.
/// Both counters saturate at `u32::MAX` rather than wrap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    line: u32,
    column: u32,
}

impl Cursor {
    pub fn new() -> Self {
        Cursor::default()
    }

    /// Move back to (0, 0)
    pub fn reset(&mut self) {
        self.line = 0;
        self.column = 0;
    }

    /// Advance past `text`
    ///
    /// # Example
    ///
    /// ```
    /// use quarto_build_mapping::Cursor;
    ///
    /// let mut cursor = Cursor::new();
    /// cursor.advance("ab\r\ncd");
    /// assert_eq!((cursor.line(), cursor.column()), (1, 2));
    /// cursor.advance("ef");
    /// assert_eq!((cursor.line(), cursor.column()), (1, 4));
    /// ```
    pub fn advance(&mut self, text: &str) {
        let mut breaks: u32 = 0;
        let mut since_break: u32 = 0;
        let mut chars = text.chars().peekable();

        while let Some(ch) = chars.next() {
            match ch {
                '\r' | '\n' => {
                    if ch == '\r' && chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                    breaks = breaks.saturating_add(1);
                    since_break = 0;
                }
                _ => since_break = since_break.saturating_add(ch.len_utf16() as u32),
            }
        }

        if breaks == 0 {
            self.column = self.column.saturating_add(since_break);
        } else {
            self.line = self.line.saturating_add(breaks);
            self.column = since_break;
        }
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn column(&self) -> u32 {
        self.column
    }

    /// The current position as an [`Offset`]
    pub fn position(&self) -> Offset {
        Offset::new(self.line, self.column)
    }
}
