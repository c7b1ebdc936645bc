use std::fmt;

/// Half-open bucket range `[left, right)`; always non-empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interval {
    pub(crate) left: u64,
    pub(crate) right: u64,
}

impl Interval {
    pub const fn left(&self) -> u64 {
        self.left
    }

    /// Exclusive upper bound.
    pub const fn right(&self) -> u64 {
        self.right
    }

    pub const fn len(&self) -> u64 {
        self.right - self.left
    }

    pub const fn is_empty(&self) -> bool {
        self.left >= self.right
    }
}

/// Renders with inclusive bounds: `"5"` or `"0-2"`.
impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.left + 1 == self.right {
            write!(f, "{}", self.left)
        } else {
            write!(f, "{}-{}", self.left, self.right - 1)
        }
    }
}
