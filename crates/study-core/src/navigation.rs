/// Position of the current chapter within the ordered chapter list.
///
/// Moves are clamped: asking for a chapter before the first or after the
/// last leaves the cursor where it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChapterCursor {
    index: usize,
    count: usize,
}

impl ChapterCursor {
    pub fn new(count: usize) -> Self {
        Self { index: 0, count }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn has_previous(&self) -> bool {
        self.index > 0
    }

    pub fn has_next(&self) -> bool {
        self.index + 1 < self.count
    }

    /// Returns whether the cursor moved.
    pub fn next(&mut self) -> bool {
        if !self.has_next() {
            return false;
        }
        self.index += 1;
        true
    }

    pub fn previous(&mut self) -> bool {
        if !self.has_previous() {
            return false;
        }
        self.index -= 1;
        true
    }

    pub fn jump_to(&mut self, index: usize) -> bool {
        if index >= self.count || index == self.index {
            return false;
        }
        self.index = index;
        true
    }

    /// One-based position label, e.g. "2/4".
    pub fn label(&self) -> String {
        format!("{}/{}", self.index + 1, self.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn previous_at_start_is_noop() {
        let mut cursor = ChapterCursor::new(4);
        assert!(!cursor.has_previous());
        assert!(!cursor.previous());
        assert_eq!(cursor.index(), 0);
    }

    #[test]
    fn next_at_end_is_noop() {
        let mut cursor = ChapterCursor::new(3);
        assert!(cursor.next());
        assert!(cursor.next());
        assert!(!cursor.has_next());
        assert!(!cursor.next());
        assert_eq!(cursor.index(), 2);
        assert_eq!(cursor.label(), "3/3");
    }

    #[test]
    fn jump_is_clamped_not_wrapped() {
        let mut cursor = ChapterCursor::new(4);
        assert!(cursor.jump_to(3));
        assert!(!cursor.jump_to(4));
        assert!(!cursor.jump_to(3));
        assert_eq!(cursor.index(), 3);
        assert!(cursor.previous());
        assert_eq!(cursor.label(), "3/4");
    }

    #[test]
    fn single_chapter_never_moves() {
        let mut cursor = ChapterCursor::new(1);
        assert!(!cursor.next());
        assert!(!cursor.previous());
        assert!(!cursor.jump_to(0));
    }
}
