//! Segment algebra over GPS time.
//!
//! A [Segment] is the half-open interval `[start, end)` of integer GPS
//! seconds. A [SegmentList] is an ordered collection of segments. All set
//! operations on a [SegmentList] take `&self` and return a new, coalesced
//! list, so the precedence logic built on top of them can be written as a
//! chain of pure expressions.

use std::{
    cmp::{max, min},
    fmt,
    ops::{BitAnd, BitOr, Sub},
};

/// The half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Segment {
    start: i64,
    end: i64,
}

impl Segment {
    /// Create a segment. The bounds may be given in either order.
    pub fn new(a: i64, b: i64) -> Self {
        Self {
            start: min(a, b),
            end: max(a, b),
        }
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn end(&self) -> i64 {
        self.end
    }

    pub fn duration(&self) -> i64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains_time(&self, t: i64) -> bool {
        self.start <= t && t < self.end
    }

    /// True if the two segments share a time interval of positive length.
    pub fn intersects(&self, other: &Segment) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// True if the two segments overlap or are adjacent.
    pub fn touches(&self, other: &Segment) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    pub fn intersection(&self, other: &Segment) -> Option<Segment> {
        let start = max(self.start, other.start);
        let end = min(self.end, other.end);
        if start < end {
            Some(Segment { start, end })
        } else {
            None
        }
    }

    /// The smallest segment containing both.
    pub fn hull(&self, other: &Segment) -> Segment {
        Segment {
            start: min(self.start, other.start),
            end: max(self.end, other.end),
        }
    }

    pub fn shift(&self, dt: i64) -> Segment {
        Segment {
            start: self.start + dt,
            end: self.end + dt,
        }
    }

    /// Grow both ends by `dt`.
    pub fn protract(&self, dt: i64) -> Segment {
        Segment::new(self.start - dt, self.end + dt)
    }

    /// Shrink both ends by `dt`. A segment shrunk past zero length collapses
    /// onto its midpoint.
    pub fn contract(&self, dt: i64) -> Segment {
        let start = self.start + dt;
        let end = self.end - dt;
        if start <= end {
            Segment { start, end }
        } else {
            let mid = self.start + self.duration() / 2;
            Segment {
                start: mid,
                end: mid,
            }
        }
    }
}

impl From<(i64, i64)> for Segment {
    fn from((a, b): (i64, i64)) -> Self {
        Segment::new(a, b)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// An ordered collection of segments.
///
/// [SegmentList::new] keeps segments exactly as given. Every other
/// constructor and every set operation produces a coalesced list: sorted,
/// with no empty, overlapping or adjacent segments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SegmentList {
    segments: Vec<Segment>,
}

impl SegmentList {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// A coalesced list holding the single segment `[start, end)`.
    pub fn from_window(start: i64, end: i64) -> Self {
        Self::new(vec![Segment::new(start, end)]).coalesced()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Segment> {
        self.segments.iter()
    }

    pub fn as_slice(&self) -> &[Segment] {
        &self.segments
    }

    pub fn into_vec(self) -> Vec<Segment> {
        self.segments
    }

    /// Merge overlapping and adjacent segments and drop empty ones.
    pub fn coalesced(&self) -> SegmentList {
        let mut sorted: Vec<Segment> = self
            .segments
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect();
        sorted.sort();

        let mut out: Vec<Segment> = Vec::with_capacity(sorted.len());
        for seg in sorted {
            match out.last_mut() {
                Some(last) if last.touches(&seg) => {
                    *last = last.hull(&seg);
                }
                _ => out.push(seg),
            }
        }
        SegmentList { segments: out }
    }

    pub fn is_coalesced(&self) -> bool {
        self.segments.iter().all(|s| !s.is_empty())
            && self.segments.windows(2).all(|w| w[0].end < w[1].start)
    }

    pub fn union(&self, other: &SegmentList) -> SegmentList {
        let mut all = Vec::with_capacity(self.len() + other.len());
        all.extend_from_slice(&self.segments);
        all.extend_from_slice(&other.segments);
        SegmentList::new(all).coalesced()
    }

    pub fn intersection(&self, other: &SegmentList) -> SegmentList {
        let a = self.coalesced();
        let b = other.coalesced();
        let mut out = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            let sa = &a.segments[i];
            let sb = &b.segments[j];
            if let Some(seg) = sa.intersection(sb) {
                out.push(seg);
            }
            if sa.end < sb.end {
                i += 1;
            } else {
                j += 1;
            }
        }
        SegmentList::new(out).coalesced()
    }

    /// The parts of `self` not covered by `other`.
    pub fn difference(&self, other: &SegmentList) -> SegmentList {
        let a = self.coalesced();
        let b = other.coalesced();
        let mut out = Vec::new();
        let mut j = 0;
        for seg in a.iter() {
            let mut start = seg.start;
            let end = seg.end;
            // Segments of `b` wholly before this one can never matter again.
            while j < b.len() && b.segments[j].end <= start {
                j += 1;
            }
            let mut k = j;
            while k < b.len() && b.segments[k].start < end {
                let cut = &b.segments[k];
                if cut.start > start {
                    out.push(Segment {
                        start,
                        end: cut.start,
                    });
                }
                start = max(start, cut.end);
                if start >= end {
                    break;
                }
                k += 1;
            }
            if start < end {
                out.push(Segment { start, end });
            }
        }
        SegmentList::new(out).coalesced()
    }

    /// Intersection with a single window.
    pub fn clip(&self, window: Segment) -> SegmentList {
        self.intersection(&SegmentList::new(vec![window]))
    }

    /// Total time covered, counting overlaps once.
    pub fn duration(&self) -> i64 {
        self.coalesced().iter().map(Segment::duration).sum()
    }

    /// The smallest segment containing every segment of the list.
    pub fn extent(&self) -> Option<Segment> {
        let mut iter = self.segments.iter();
        let first = *iter.next()?;
        Some(iter.fold(first, |acc, s| acc.hull(s)))
    }

    pub fn contains_time(&self, t: i64) -> bool {
        self.segments.iter().any(|s| s.contains_time(t))
    }
}

impl FromIterator<Segment> for SegmentList {
    fn from_iter<T: IntoIterator<Item = Segment>>(iter: T) -> Self {
        SegmentList::new(iter.into_iter().collect()).coalesced()
    }
}

impl<'a> IntoIterator for &'a SegmentList {
    type Item = &'a Segment;
    type IntoIter = std::slice::Iter<'a, Segment>;
    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}

impl IntoIterator for SegmentList {
    type Item = Segment;
    type IntoIter = std::vec::IntoIter<Segment>;
    fn into_iter(self) -> Self::IntoIter {
        self.segments.into_iter()
    }
}

impl BitOr for &SegmentList {
    type Output = SegmentList;
    fn bitor(self, rhs: &SegmentList) -> SegmentList {
        self.union(rhs)
    }
}

impl BitAnd for &SegmentList {
    type Output = SegmentList;
    fn bitand(self, rhs: &SegmentList) -> SegmentList {
        self.intersection(rhs)
    }
}

impl Sub for &SegmentList {
    type Output = SegmentList;
    fn sub(self, rhs: &SegmentList) -> SegmentList {
        self.difference(rhs)
    }
}

impl fmt::Display for SegmentList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{seg}")?;
        }
        write!(f, "]")
    }
}
