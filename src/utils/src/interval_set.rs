use std::ops::Deref;

/// Span is a half-open `[start, end)` range of unix nano timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: i64,
    pub end: i64,
}

impl Span {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// contains returns true if `[start, end)` lies completely inside this span.
    pub fn contains(&self, start: i64, end: i64) -> bool {
        self.start <= start && self.end >= end
    }

    pub fn overlaps(&self, start: i64, end: i64) -> bool {
        self.start < end && self.end > start
    }
}

/// IntervalSet holds ordered, non-overlapping spans. Inserting a span that
/// overlaps or touches existing spans coalesces them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntervalSet {
    spans: Vec<Span>,
}

impl IntervalSet {
    pub fn new() -> Self {
        Self { spans: vec![] }
    }

    pub fn insert(&mut self, start: i64, end: i64) {
        let span = Span::new(start, end);
        if span.is_empty() {
            return;
        }

        // first span whose end reaches the new start
        let lo = self.spans.partition_point(|s| s.end < span.start);
        // first span starting strictly after the new end
        let hi = self.spans.partition_point(|s| s.start <= span.end);

        if lo == hi {
            self.spans.insert(lo, span);
            return;
        }

        let merged = Span::new(
            span.start.min(self.spans[lo].start),
            span.end.max(self.spans[hi - 1].end),
        );
        self.spans.splice(lo..hi, std::iter::once(merged));
    }

    /// covers returns true if a single span contains all of `[start, end)`.
    pub fn covers(&self, start: i64, end: i64) -> bool {
        let i = self.spans.partition_point(|s| s.end < end);
        i < self.spans.len() && self.spans[i].contains(start, end)
    }

    pub fn overlaps(&self, start: i64, end: i64) -> bool {
        let i = self.spans.partition_point(|s| s.end <= start);
        i < self.spans.len() && self.spans[i].overlaps(start, end)
    }

    /// total returns the summed length of all spans.
    pub fn total(&self) -> i64 {
        self.spans.iter().map(|s| s.end - s.start).sum()
    }
}

impl Deref for IntervalSet {
    type Target = [Span];

    fn deref(&self) -> &Self::Target {
        self.spans.as_slice()
    }
}

impl FromIterator<Span> for IntervalSet {
    fn from_iter<T: IntoIterator<Item = Span>>(iter: T) -> Self {
        let mut set = Self::new();
        for span in iter {
            set.insert(span.start, span.end);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use quickcheck::quickcheck;

    use crate::interval_set::{IntervalSet, Span};

    #[test]
    fn test_insert_coalesces() {
        let mut set = IntervalSet::new();
        set.insert(30, 40);
        set.insert(10, 20);
        set.insert(15, 25);
        assert_eq!(set.to_vec(), vec![Span::new(10, 25), Span::new(30, 40)]);

        // adjacent spans join
        set.insert(25, 30);
        assert_eq!(set.to_vec(), vec![Span::new(10, 40)]);

        // empty spans are ignored
        set.insert(50, 50);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_insert_swallows_many() {
        let set: IntervalSet = vec![
            Span::new(0, 1),
            Span::new(2, 3),
            Span::new(4, 5),
            Span::new(-5, 10),
        ]
        .into_iter()
        .collect();
        assert_eq!(set.to_vec(), vec![Span::new(-5, 10)]);
    }

    #[test]
    fn test_covers() {
        let set: IntervalSet = vec![Span::new(5, 25), Span::new(40, 50)]
            .into_iter()
            .collect();
        assert!(set.covers(10, 20));
        assert!(set.covers(5, 25));
        assert!(!set.covers(20, 30));
        assert!(!set.covers(30, 35));
        assert!(set.overlaps(20, 30));
        assert!(!set.overlaps(25, 40));
    }

    quickcheck! {
        fn prop_spans_disjoint_and_sorted(pairs: Vec<(i16, i16)>) -> bool {
            let mut set = IntervalSet::new();
            let mut total_in = 0i64;
            for (a, b) in pairs {
                let (a, b) = (a as i64, b as i64);
                set.insert(a.min(b), a.max(b));
                total_in += (a - b).abs();
            }
            let ordered = set.windows(2).all(|w| w[0].end < w[1].start);
            ordered && set.iter().all(|s| !s.is_empty()) && set.total() <= total_in
        }
    }
}
