/// Position within a fixed-length sequence that wraps in both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    len: usize,
    current: usize,
}

impl Cursor {
    pub fn new(len: usize) -> Self {
        Self { len, current: 0 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self) -> usize {
        self.current
    }

    /// Moves to `index` modulo the length. Empty sequences never move.
    pub fn show(&mut self, index: isize) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        self.current = index.rem_euclid(self.len as isize) as usize;
        Some(self.current)
    }

    pub fn next(&mut self) -> Option<usize> {
        self.show(self.current as isize + 1)
    }

    pub fn prev(&mut self) -> Option<usize> {
        self.show(self.current as isize - 1)
    }
}
