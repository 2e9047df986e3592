use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::normalize::{Convention, PathGranularity};

/// One `url -> impressions` observation read from a source.
///
/// Equality covers every field but the hash covers only `url`: two rows with the same
/// literal URL and different counts are distinct entries that share a hash slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    url: String,
    convention: Convention,
    impressions: i64,
}

impl Record {
    pub fn new(url: impl Into<String>, convention: Convention, impressions: i64) -> Self {
        Self {
            url: url.into(),
            convention,
            impressions,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn convention(&self) -> Convention {
        self.convention
    }

    pub fn impressions(&self) -> i64 {
        self.impressions
    }

    pub fn canonical_path(&self, granularity: PathGranularity) -> String {
        self.convention.normalize(&self.url, granularity)
    }
}

impl Hash for Record {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.url.hash(state);
    }
}

/// Descending by impressions, ties broken by URL so listings are stable.
pub(crate) fn by_impressions_desc(a: &Record, b: &Record) -> Ordering {
    b.impressions
        .cmp(&a.impressions)
        .then_with(|| a.url.cmp(&b.url))
}
