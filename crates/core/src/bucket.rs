use rustc_hash::FxHashSet;

use crate::error::{CompareError, Result};
use crate::normalize::{Convention, PathGranularity};
use crate::position::SourcePosition;
use crate::record::{by_impressions_desc, Record};
use crate::tokenizer::render_line;

#[derive(Debug, Clone, Default)]
struct Slot {
    records: FxHashSet<Record>,
    impressions: i64,
}

/// All records of both sources that share one canonical path.
#[derive(Debug, Clone)]
pub struct Bucket {
    path: String,
    conventions: [Convention; 2],
    granularity: PathGranularity,
    slots: [Slot; 2],
}

impl Bucket {
    pub fn new(
        path: impl Into<String>,
        conventions: [Convention; 2],
        granularity: PathGranularity,
    ) -> Self {
        Self {
            path: path.into(),
            conventions,
            granularity,
            slots: Default::default(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn conventions(&self) -> [Convention; 2] {
        self.conventions
    }

    pub fn granularity(&self) -> PathGranularity {
        self.granularity
    }

    /// Adds `record` to the slot of `position` and returns `false` when an identical
    /// record was already there. Sums are only touched by newly inserted records.
    ///
    /// A record that would push the slot's sum past `i64::MAX` is rejected and leaves
    /// the slot unchanged.
    pub fn add(&mut self, record: Record, position: SourcePosition) -> Result<bool> {
        let expected = self.conventions[position.index()];
        if record.convention() != expected {
            return Err(CompareError::WrongConvention(format!(
                "record {} is {} but position {} expects {}",
                record.url(),
                record.convention(),
                position,
                expected
            )));
        }
        let path = record.canonical_path(self.granularity);
        if path != self.path {
            return Err(CompareError::WrongConvention(format!(
                "record {} normalizes to {} instead of {}",
                record.url(),
                path,
                self.path
            )));
        }
        let slot = &mut self.slots[position.index()];
        if slot.records.contains(&record) {
            return Ok(false);
        }
        let total = slot
            .impressions
            .checked_add(record.impressions())
            .ok_or_else(|| {
                CompareError::ImpressionOverflow(format!(
                    "adding {} impressions of {} to {} at position {}",
                    record.impressions(),
                    record.url(),
                    self.path,
                    position
                ))
            })?;
        slot.records.insert(record);
        slot.impressions = total;
        Ok(true)
    }

    pub fn impressions(&self, position: SourcePosition) -> i64 {
        self.slots[position.index()].impressions
    }

    /// Records of `position`, highest impression count first.
    pub fn records(&self, position: SourcePosition) -> Vec<Record> {
        let mut records: Vec<Record> = self.slots[position.index()]
            .records
            .iter()
            .cloned()
            .collect();
        records.sort_by(by_impressions_desc);
        records
    }

    pub fn record_count(&self, position: SourcePosition) -> usize {
        self.slots[position.index()].records.len()
    }

    pub fn is_missing(&self, position: SourcePosition) -> bool {
        self.impressions(position) == 0
    }

    /// This position's sum minus the other position's sum, saturating at the `i64` range.
    pub fn difference(&self, position: SourcePosition) -> i64 {
        self.impressions(position)
            .saturating_sub(self.impressions(position.other()))
    }

    /// [`Bucket::difference`] relative to the other position's sum; the raw delta when
    /// that sum is zero.
    pub fn difference_ratio(&self, position: SourcePosition) -> f64 {
        let delta = self.difference(position) as f64;
        match self.impressions(position.other()) {
            0 => delta,
            other => delta / other as f64,
        }
    }

    /// One `url<separator>impressions` line per record of `position`.
    pub fn to_delimited(&self, position: SourcePosition, separator: char) -> String {
        let mut out = String::new();
        for record in self.records(position) {
            let impressions = record.impressions().to_string();
            out.push_str(&render_line(&[record.url(), impressions.as_str()], separator));
            out.push('\n');
        }
        out
    }
}
