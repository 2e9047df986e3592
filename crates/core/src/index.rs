use indexmap::IndexMap;

use crate::bucket::Bucket;
use crate::error::{CompareError, Result};
use crate::normalize::{Convention, PathGranularity};
use crate::position::SourcePosition;
use crate::record::{by_impressions_desc, Record};

pub const DEFAULT_ABSOLUTE_THRESHOLD: i64 = 10;
pub const DEFAULT_PERCENT_THRESHOLD: f64 = 0.01;

/// Limits a bucket's delta must exceed, both of them, to be reported as differing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiffThresholds {
    pub absolute: i64,
    /// Relative delta as a fraction: `0.01` is one percent.
    pub percent: f64,
}

impl Default for DiffThresholds {
    fn default() -> Self {
        Self {
            absolute: DEFAULT_ABSOLUTE_THRESHOLD,
            percent: DEFAULT_PERCENT_THRESHOLD,
        }
    }
}

/// Canonical path -> [`Bucket`] for one comparison run.
///
/// Mutation is refused until both conventions are known. Buckets are kept in first-seen
/// order so queries are deterministic.
#[derive(Debug, Clone)]
pub struct ComparisonIndex {
    conventions: [Option<Convention>; 2],
    granularity: PathGranularity,
    buckets: IndexMap<String, Bucket>,
}

impl ComparisonIndex {
    pub fn new(first: Convention, second: Convention, granularity: PathGranularity) -> Self {
        Self {
            conventions: [Some(first), Some(second)],
            granularity,
            buckets: IndexMap::new(),
        }
    }

    /// An index with no conventions yet; see [`ComparisonIndex::set_convention`].
    pub fn inactive(granularity: PathGranularity) -> Self {
        Self {
            conventions: [None, None],
            granularity,
            buckets: IndexMap::new(),
        }
    }

    /// Sets the convention of an empty slot. Returns `false` if it was already set.
    pub fn set_convention(&mut self, position: SourcePosition, convention: Convention) -> bool {
        let slot = &mut self.conventions[position.index()];
        if slot.is_some() {
            return false;
        }
        *slot = Some(convention);
        true
    }

    pub fn convention(&self, position: SourcePosition) -> Option<Convention> {
        self.conventions[position.index()]
    }

    pub fn granularity(&self) -> PathGranularity {
        self.granularity
    }

    pub fn is_active(&self) -> bool {
        self.active_conventions().is_some()
    }

    fn active_conventions(&self) -> Option<[Convention; 2]> {
        match self.conventions {
            [Some(first), Some(second)] => Some([first, second]),
            _ => None,
        }
    }

    /// Routes `record` into the bucket of its canonical path, creating it if needed.
    /// Returns `false` when the identical record was already present.
    pub fn add(&mut self, record: Record, position: SourcePosition) -> Result<bool> {
        let conventions = self.active_conventions().ok_or(CompareError::NotActive)?;
        let expected = conventions[position.index()];
        if record.convention() != expected {
            return Err(CompareError::WrongConvention(format!(
                "source {} expects {} but record {} is {}",
                position,
                expected,
                record.url(),
                record.convention()
            )));
        }
        let path = record.canonical_path(self.granularity);
        let granularity = self.granularity;
        let bucket = self
            .buckets
            .entry(path)
            .or_insert_with_key(|path| Bucket::new(path.clone(), conventions, granularity));
        bucket.add(record, position)
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&Bucket> {
        self.buckets.get(path)
    }

    pub fn buckets(&self) -> impl Iterator<Item = &Bucket> {
        self.buckets.values()
    }

    /// Sum over every bucket, saturating at `i64::MAX`.
    pub fn total_impressions(&self, position: SourcePosition) -> i64 {
        self.buckets()
            .fold(0i64, |acc, b| acc.saturating_add(b.impressions(position)))
    }

    /// Records of the other source whose canonical path has no impressions in `position`,
    /// highest impression count first.
    pub fn missing(&self, position: SourcePosition) -> Vec<Record> {
        let mut out: Vec<Record> = self
            .buckets()
            .filter(|b| b.is_missing(position))
            .flat_map(|b| b.records(position.other()))
            .collect();
        out.sort_by(by_impressions_desc);
        out
    }

    /// Total impressions carried by [`ComparisonIndex::missing`] for `position`,
    /// saturating at `i64::MAX`.
    pub fn missing_impressions(&self, position: SourcePosition) -> i64 {
        self.buckets()
            .filter(|b| b.is_missing(position))
            .fold(0i64, |acc, b| acc.saturating_add(b.impressions(position.other())))
    }

    /// Copies of the buckets whose sums differ by more than both thresholds, measured
    /// from `position` against the other source.
    pub fn differing(&self, position: SourcePosition, thresholds: &DiffThresholds) -> Vec<Bucket> {
        self.buckets()
            .filter(|b| {
                let delta = b.difference(position).unsigned_abs();
                let exceeds_absolute =
                    u64::try_from(thresholds.absolute).map_or(true, |limit| delta > limit);
                exceeds_absolute && b.difference_ratio(position).abs() > thresholds.percent
            })
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> ComparisonIndex {
        ComparisonIndex::new(
            Convention::FullUrl,
            Convention::PathWithQuery,
            PathGranularity::WithExtension,
        )
    }

    #[test]
    fn inactive_index_refuses_records() {
        let mut idx = ComparisonIndex::inactive(PathGranularity::WithExtension);
        let r = Record::new("/a", Convention::PathWithQuery, 1);
        assert!(matches!(
            idx.add(r.clone(), SourcePosition::Second),
            Err(CompareError::NotActive)
        ));
        assert!(idx.set_convention(SourcePosition::Second, Convention::PathWithQuery));
        assert!(!idx.is_active());
        assert!(matches!(
            idx.add(r.clone(), SourcePosition::Second),
            Err(CompareError::NotActive)
        ));
        assert!(idx.set_convention(SourcePosition::First, Convention::FullUrl));
        assert!(!idx.set_convention(SourcePosition::First, Convention::DottedHost));
        assert!(idx.is_active());
        assert!(idx.add(r, SourcePosition::Second).unwrap());
    }

    #[test]
    fn rejects_record_of_wrong_convention() {
        let mut idx = index();
        let r = Record::new("/a", Convention::PathWithQuery, 1);
        assert!(matches!(
            idx.add(r, SourcePosition::First),
            Err(CompareError::WrongConvention(_))
        ));
        assert!(idx.is_empty());
    }

    #[test]
    fn missing_lists_records_without_counterpart() {
        let mut idx = index();
        idx.add(
            Record::new("http://x.com/only-first.html", Convention::FullUrl, 1200),
            SourcePosition::First,
        )
        .unwrap();
        idx.add(
            Record::new("http://x.com/both.html", Convention::FullUrl, 10),
            SourcePosition::First,
        )
        .unwrap();
        idx.add(
            Record::new("/both.html?ref=a", Convention::PathWithQuery, 12),
            SourcePosition::Second,
        )
        .unwrap();

        let missing = idx.missing(SourcePosition::Second);
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].url(), "http://x.com/only-first.html");
        assert_eq!(missing[0].impressions(), 1200);
        assert!(idx.missing(SourcePosition::First).is_empty());
        assert_eq!(idx.missing_impressions(SourcePosition::Second), 1200);
        assert_eq!(idx.len(), 2);
        assert_eq!(idx.total_impressions(SourcePosition::First), 1210);
    }

    #[test]
    fn differing_applies_both_thresholds() {
        let mut idx = index();
        let rows = [
            ("big.html", 1200, 1300),
            ("small.html", 1200, 1205),
            ("ratio.html", 100_000, 100_050),
        ];
        for (page, first, second) in rows {
            idx.add(
                Record::new(format!("http://x.com/{page}"), Convention::FullUrl, first),
                SourcePosition::First,
            )
            .unwrap();
            idx.add(
                Record::new(format!("/{page}"), Convention::PathWithQuery, second),
                SourcePosition::Second,
            )
            .unwrap();
        }

        let differing = idx.differing(SourcePosition::First, &DiffThresholds::default());
        assert_eq!(differing.len(), 1);
        assert_eq!(differing[0].path(), "/big.html");
        assert_eq!(differing[0].impressions(SourcePosition::First), 1200);
        assert_eq!(differing[0].impressions(SourcePosition::Second), 1300);

        let loose = DiffThresholds {
            absolute: 0,
            percent: 0.0,
        };
        assert_eq!(idx.differing(SourcePosition::Second, &loose).len(), 3);
    }

    #[test]
    fn differing_returns_copies() {
        let mut idx = index();
        idx.add(
            Record::new("http://x.com/p.html", Convention::FullUrl, 500),
            SourcePosition::First,
        )
        .unwrap();
        let mut copies = idx.differing(SourcePosition::First, &DiffThresholds::default());
        copies[0]
            .add(
                Record::new("http://x.com/p.html", Convention::FullUrl, 7),
                SourcePosition::First,
            )
            .unwrap();
        assert_eq!(copies[0].impressions(SourcePosition::First), 507);
        assert_eq!(
            idx.get("/p.html").unwrap().impressions(SourcePosition::First),
            500
        );
    }

    #[test]
    fn without_extension_merges_variants() {
        let mut idx = ComparisonIndex::new(
            Convention::FullUrl,
            Convention::PathWithQuery,
            PathGranularity::WithoutExtension,
        );
        idx.add(
            Record::new("http://x.com/page.html", Convention::FullUrl, 10),
            SourcePosition::First,
        )
        .unwrap();
        idx.add(
            Record::new("/page.php", Convention::PathWithQuery, 10),
            SourcePosition::Second,
        )
        .unwrap();
        assert_eq!(idx.len(), 1);
        assert!(idx.get("/page").is_some());
    }

    #[test]
    fn extreme_sums_saturate_instead_of_wrapping() {
        let mut idx = index();
        for page in ["a.html", "b.html"] {
            idx.add(
                Record::new(format!("http://x.com/{page}"), Convention::FullUrl, i64::MAX),
                SourcePosition::First,
            )
            .unwrap();
        }
        assert_eq!(idx.total_impressions(SourcePosition::First), i64::MAX);
        assert_eq!(idx.missing_impressions(SourcePosition::Second), i64::MAX);

        let differing = idx.differing(SourcePosition::Second, &DiffThresholds::default());
        assert_eq!(differing.len(), 2);
        assert_eq!(differing[0].difference(SourcePosition::Second), -i64::MAX);
    }
}
