use std::fmt::{self, Display};

/// Identifies the input file a range belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub u32);

/// The line/column span of one token. Lines are 1-based, columns 0-based,
/// and `end_col` is the column of the last character of the token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SourceRange {
    pub begin_line: u32,
    pub end_line: u32,
    pub begin_col: u32,
    pub end_col: u32,
    pub file: Option<FileId>,
}

impl Display for SourceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}-{}:{}",
            self.begin_line, self.begin_col, self.end_line, self.end_col
        )
    }
}

/// A scan position within a source buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cursor {
    pub offset: usize,
    pub line: u32,
    pub column: u32,
}

impl Default for Cursor {
    fn default() -> Cursor {
        Cursor {
            offset: 0,
            line: 1,
            column: 0,
        }
    }
}

/// Tracks the live scan position and the mark taken at the start of the
/// token being scanned.
#[derive(Clone, Debug, Default)]
pub struct Tracker {
    live: Cursor,
    mark: Cursor,
    /// Position of the last consumed byte.
    last: Cursor,
    file: Option<FileId>,
}

impl Tracker {
    pub fn new(file: Option<FileId>) -> Tracker {
        Tracker {
            file,
            ..Tracker::default()
        }
    }

    pub fn live(&self) -> Cursor {
        self.live
    }

    pub fn mark(&self) -> Cursor {
        self.mark
    }

    pub fn save_mark(&mut self) {
        self.mark = self.live;
    }

    pub fn advance(&mut self, byte: u8) {
        self.last = self.live;
        self.live.offset += 1;
        if byte == b'\n' {
            self.live.line += 1;
            self.live.column = 0;
        } else {
            self.live.column += 1;
        }
    }

    pub fn advance_over(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.advance(byte);
        }
    }

    /// The range from the mark to the last consumed byte, which for a
    /// trailing newline is the newline's own position. Nothing consumed since
    /// the mark yields an empty range at the live cursor.
    pub fn current_range(&self) -> SourceRange {
        let end = if self.live.offset == self.mark.offset {
            self.live
        } else {
            self.last
        };
        SourceRange {
            begin_line: self.mark.line,
            end_line: end.line,
            begin_col: self.mark.column,
            end_col: end.column,
            file: self.file,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn range_covers_consumed_bytes() {
        let mut tracker = Tracker::new(Some(FileId(3)));
        tracker.advance_over(b"  ");
        tracker.save_mark();
        tracker.advance_over(b"int");
        assert_eq!(tracker.mark().column, 2);
        assert_eq!(
            tracker.current_range(),
            SourceRange {
                begin_line: 1,
                end_line: 1,
                begin_col: 2,
                end_col: 4,
                file: Some(FileId(3)),
            }
        );
    }

    #[test]
    fn newline_moves_to_next_line_start() {
        let mut tracker = Tracker::new(None);
        tracker.advance_over(b"abcde\n");
        tracker.save_mark();
        tracker.advance(b'x');
        let range = tracker.current_range();
        assert_eq!((range.begin_line, range.begin_col), (2, 0));
        assert_eq!((range.end_line, range.end_col), (2, 0));
        assert_eq!(tracker.live().offset, 7);
    }

    #[test]
    fn trailing_newline_ends_on_its_own_line() {
        let mut tracker = Tracker::new(None);
        tracker.advance_over(b"x ");
        tracker.save_mark();
        tracker.advance_over(b"/*\n");
        let range = tracker.current_range();
        assert_eq!((range.begin_line, range.begin_col), (1, 2));
        assert_eq!((range.end_line, range.end_col), (1, 4));
    }

    #[test]
    fn empty_mark_collapses_to_live_cursor() {
        let mut tracker = Tracker::new(None);
        tracker.advance_over(b"ab");
        tracker.save_mark();
        let range = tracker.current_range();
        assert_eq!((range.begin_col, range.end_col), (2, 2));
        assert_eq!(range.to_string(), "1:2-1:2");
    }
}
