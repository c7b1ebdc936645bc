//! Interval-set algebra over a fixed bucket space.
//!
//! A partition spec such as `"0-2,5"` names the buckets a strategy owns.
//! [`IntervalSet`] is the parsed, canonical form: sorted, disjoint, maximally
//! merged half-open intervals bound to a bucket count `max`. Sets are
//! immutable; every combinator returns a new set.
//!
//! Combinators between sets bound to different `max` values do not fail:
//! `contains`/`intersects` answer `false` and `union`/`difference` return a
//! copy of the left operand.

mod interval;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests;

pub use interval::Interval;

use abtest_types::PartitionError;
use regex::Regex;
use std::fmt;
use std::ops::{Add, Sub};
use std::sync::OnceLock;

static RANGE_TOKEN_REGEX: OnceLock<Regex> = OnceLock::new();
static NUMBER_TOKEN_REGEX: OnceLock<Regex> = OnceLock::new();

fn range_token_regex() -> &'static Regex {
    RANGE_TOKEN_REGEX
        .get_or_init(|| Regex::new(r"^[0-9]+-[0-9]+$").expect("Range token regex is valid"))
}

fn number_token_regex() -> &'static Regex {
    NUMBER_TOKEN_REGEX
        .get_or_init(|| Regex::new(r"^(0|[1-9][0-9]*)$").expect("Number token regex is valid"))
}

/// Canonical set of bucket indices in `[0, max)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct IntervalSet {
    max: u64,
    intervals: Vec<Interval>,
}

impl IntervalSet {
    pub const fn empty(max: u64) -> Self {
        Self { max, intervals: Vec::new() }
    }

    /// Parse a comma-separated list of `N` / `N-M` tokens (inclusive bounds).
    ///
    /// Tokens must be strictly increasing across the whole string and every
    /// value must be below `max`. The first offending token aborts the parse.
    /// A `max` of zero yields an empty set regardless of `spec`.
    pub fn parse(spec: &str, max: u64) -> Result<Self, PartitionError> {
        if max == 0 {
            return Ok(Self::empty(0));
        }

        let mut set = Self::empty(max);
        if spec.is_empty() {
            return Ok(set);
        }

        let mut last_end: Option<u64> = None;
        for token in spec.split(',') {
            let (start, end) = parse_token(token)?;

            if last_end.is_some_and(|prev| start <= prev) || start > end {
                return Err(PartitionError::NotMonotonic { token: token.to_string() });
            }
            if end >= max {
                return Err(PartitionError::OutOfRange { value: end, max });
            }

            last_end = Some(end);
            set.push(start, end + 1);
        }

        Ok(set)
    }

    pub const fn max(&self) -> u64 {
        self.max
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Number of member buckets.
    pub fn len(&self) -> u64 {
        self.intervals.iter().map(Interval::len).sum()
    }

    /// Comma-joined `N` / `N-M` tokens; parsing the result yields `self` again.
    pub fn canonical(&self) -> String {
        self.to_string()
    }

    /// True iff every bucket of `other` is also in `self`.
    pub fn contains(&self, other: &Self) -> bool {
        if self.max != other.max {
            return false;
        }

        let mut cursor = self.intervals.iter().peekable();
        other.intervals.iter().all(|needle| {
            while let Some(hay) = cursor.peek().copied() {
                if hay.right < needle.left {
                    cursor.next();
                    continue;
                }
                return hay.left <= needle.left && hay.right >= needle.right;
            }
            false
        })
    }

    /// True iff at least one bucket is in both sets.
    pub fn intersects(&self, other: &Self) -> bool {
        if self.max != other.max {
            return false;
        }

        let (mut i, mut j) = (0, 0);
        while let (Some(a), Some(b)) = (self.intervals.get(i), other.intervals.get(j)) {
            if a.right <= b.left {
                i += 1;
            } else if b.right <= a.left {
                j += 1;
            } else {
                return true;
            }
        }
        false
    }

    /// Buckets in either set.
    pub fn union(&self, other: &Self) -> Self {
        if self.max != other.max {
            return self.clone();
        }

        let mut out = Self::empty(self.max);
        let (mut i, mut j) = (0, 0);
        loop {
            let next = match (self.intervals.get(i), other.intervals.get(j)) {
                (Some(a), Some(b)) if a.left <= b.left => {
                    i += 1;
                    *a
                },
                (_, Some(b)) => {
                    j += 1;
                    *b
                },
                (Some(a), None) => {
                    i += 1;
                    *a
                },
                (None, None) => break,
            };
            out.push(next.left, next.right);
        }
        out
    }

    /// Buckets in `self` but not in `other`.
    pub fn difference(&self, other: &Self) -> Self {
        if self.max != other.max || self.is_empty() || other.is_empty() {
            return self.clone();
        }

        let mut out = Self::empty(self.max);
        let mut cuts = other.intervals.iter().peekable();

        for interval in &self.intervals {
            let (mut left, right) = (interval.left, interval.right);
            loop {
                match cuts.peek().copied() {
                    None => {
                        out.push(left, right);
                        break;
                    },
                    // Cut lies entirely before the remaining piece
                    Some(cut) if cut.right <= left => {
                        cuts.next();
                    },
                    // Cut lies entirely after the remaining piece
                    Some(cut) if right <= cut.left => {
                        out.push(left, right);
                        break;
                    },
                    Some(cut) => {
                        if left < cut.left {
                            out.push(left, cut.left);
                        }
                        if right > cut.right {
                            left = cut.right;
                            cuts.next();
                        } else {
                            break;
                        }
                    },
                }
            }
        }
        out
    }

    /// Every member bucket in ascending order.
    ///
    /// Allocates one entry per bucket; meant for partition-count sized spaces.
    pub fn expand(&self) -> Vec<u64> {
        self.intervals.iter().flat_map(|i| i.left..i.right).collect()
    }

    /// Append `[left, right)`, merging into the last interval when they touch.
    /// Callers push in ascending `left` order.
    fn push(&mut self, left: u64, right: u64) {
        if let Some(last) = self.intervals.last_mut() {
            if last.right >= left {
                last.right = last.right.max(right);
                return;
            }
        }
        self.intervals.push(Interval { left, right });
    }
}

fn parse_token(token: &str) -> Result<(u64, u64), PartitionError> {
    let syntax = || PartitionError::Syntax { token: token.to_string() };

    if range_token_regex().is_match(token) {
        let (start, end) = token.split_once('-').ok_or_else(syntax)?;
        let start = start.parse::<u64>().map_err(|_| syntax())?;
        let end = end.parse::<u64>().map_err(|_| syntax())?;
        Ok((start, end))
    } else if number_token_regex().is_match(token) {
        let value = token.parse::<u64>().map_err(|_| syntax())?;
        Ok((value, value))
    } else {
        Err(syntax())
    }
}

impl fmt::Display for IntervalSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, interval) in self.intervals.iter().enumerate() {
            if idx > 0 {
                f.write_str(",")?;
            }
            write!(f, "{interval}")?;
        }
        Ok(())
    }
}

impl Add for &IntervalSet {
    type Output = IntervalSet;

    fn add(self, rhs: Self) -> IntervalSet {
        self.union(rhs)
    }
}

impl Sub for &IntervalSet {
    type Output = IntervalSet;

    fn sub(self, rhs: Self) -> IntervalSet {
        self.difference(rhs)
    }
}
