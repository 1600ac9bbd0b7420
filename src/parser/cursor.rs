//! Character cursor over a source document.
//!
//! Line endings are normalized as they are read: `\r\n` and a lone `\r` both
//! read as a single `\n`. Byte offsets still refer to the raw source.

use super::token::Position;
use std::sync::Arc;

/// Saved cursor state for backtracking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark {
    position: Position,
}

/// Forward-only reader with mark/reset
#[derive(Debug, Clone)]
pub struct Cursor {
    source: Arc<str>,
    position: Position,
}

impl Cursor {
    pub fn new(source: impl Into<Arc<str>>) -> Self {
        Self {
            source: source.into(),
            position: Position::default(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// The current char, `None` at end of input
    pub fn current(&self) -> Option<char> {
        match self.raw_char()? {
            '\r' => Some('\n'),
            ch => Some(ch),
        }
    }

    /// Current char compared against `expected`
    pub fn is(&self, expected: char) -> bool {
        self.current() == Some(expected)
    }

    /// Move past the current char and return the new current char
    pub fn advance(&mut self) -> Option<char> {
        let ch = self.raw_char()?;

        match ch {
            '\r' => {
                self.position.byte += 1;
                if self.source.as_bytes().get(self.position.byte) == Some(&b'\n') {
                    self.position.byte += 1;
                }
                self.position.line += 1;
                self.position.col = 0;
            }
            '\n' => {
                self.position.byte += 1;
                self.position.line += 1;
                self.position.col = 0;
            }
            _ => {
                self.position.byte += ch.len_utf8();
                self.position.col += 1;
            }
        }

        self.current()
    }

    /// Advance while `pred` holds for the current char
    pub fn skip_while<F: Fn(char) -> bool>(&mut self, pred: F) {
        while let Some(ch) = self.current() {
            if !pred(ch) {
                break;
            }
            self.advance();
        }
    }

    pub fn mark(&self) -> Mark {
        Mark { position: self.position }
    }

    pub fn reset(&mut self, mark: Mark) {
        self.position = mark.position;
    }

    fn raw_char(&self) -> Option<char> {
        let b = *self.source.as_bytes().get(self.position.byte)?;
        // Simple ASCII fast path
        if b < 128 {
            Some(b as char)
        } else {
            self.source[self.position.byte..].chars().next()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_tracks_lines_and_columns() {
        let mut cursor = Cursor::new("ab\ncd");
        assert_eq!(cursor.current(), Some('a'));
        assert_eq!(cursor.advance(), Some('b'));
        assert_eq!(cursor.advance(), Some('\n'));
        assert_eq!(cursor.position(), Position::new(2, 0, 2));
        assert_eq!(cursor.advance(), Some('c'));
        assert_eq!(cursor.position(), Position::new(3, 1, 0));
        cursor.advance();
        assert_eq!(cursor.advance(), None);
        assert_eq!(cursor.current(), None);
        assert_eq!(cursor.advance(), None);
    }

    #[test]
    fn test_crlf_reads_as_single_newline() {
        let mut cursor = Cursor::new("\r\nx\ry");
        assert_eq!(cursor.current(), Some('\n'));
        assert_eq!(cursor.advance(), Some('x'));
        assert_eq!(cursor.position(), Position::new(2, 1, 0));
        assert_eq!(cursor.advance(), Some('\n'));
        assert_eq!(cursor.advance(), Some('y'));
        assert_eq!(cursor.position(), Position::new(4, 2, 0));
    }

    #[test]
    fn test_multibyte_columns() {
        let mut cursor = Cursor::new("é<");
        assert_eq!(cursor.advance(), Some('<'));
        assert_eq!(cursor.position(), Position::new(2, 0, 1));
    }

    #[test]
    fn test_mark_and_reset() {
        let mut cursor = Cursor::new("<!--x");
        cursor.advance();
        let mark = cursor.mark();
        cursor.skip_while(|c| c != 'x');
        assert!(cursor.is('x'));
        cursor.reset(mark);
        assert!(cursor.is('!'));
        assert_eq!(cursor.position(), Position::new(1, 0, 1));
    }
}
