use rand::Rng;

/// Cursor into the filtered, sorted result set.
///
/// `index` is always `< count` unless the set is empty, in which case both
/// are zero. Movement helpers return `None` when there is nowhere to go so
/// callers can skip the identifier lookup entirely.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Position {
    index: usize,
    count: usize,
}

impl Position {
    pub fn new(index: usize, count: usize) -> Self {
        Self { index: 0, count }.with_index(index)
    }

    pub fn index(self) -> usize {
        self.index
    }

    pub fn count(self) -> usize {
        self.count
    }

    pub fn is_empty(self) -> bool {
        self.count == 0
    }

    /// Replace the count, pulling the index back inside the new bounds.
    pub fn with_count(self, count: usize) -> Self {
        Self {
            index: self.index,
            count,
        }
        .with_index(self.index)
    }

    /// Move to `index`, clamped to the last valid position.
    pub fn with_index(self, index: usize) -> Self {
        let index = match self.count {
            0 => 0,
            count => index.min(count - 1),
        };
        Self {
            index,
            count: self.count,
        }
    }

    pub fn first(self) -> Option<Self> {
        (!self.is_empty()).then(|| self.with_index(0))
    }

    pub fn last(self) -> Option<Self> {
        (!self.is_empty()).then(|| self.with_index(self.count - 1))
    }

    pub fn next(self) -> Option<Self> {
        (!self.is_empty()).then(|| self.with_index((self.index + 1) % self.count))
    }

    pub fn previous(self) -> Option<Self> {
        (!self.is_empty()).then(|| {
            let index = if self.index == 0 {
                self.count - 1
            } else {
                self.index - 1
            };
            self.with_index(index)
        })
    }

    pub fn random<R: Rng + ?Sized>(self, rng: &mut R) -> Option<Self> {
        if self.is_empty() {
            return None;
        }
        Some(self.with_index(rng.random_range(0..self.count)))
    }

    /// One-based "i of N" label, or `None` for an empty set.
    pub fn label(self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(format!("{} of {}", self.index + 1, self.count))
        }
    }
}
