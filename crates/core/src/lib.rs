//! Ingestion and reconciliation of two `url -> impressions` exports.
//!
//! Each source is read with its own [`SourceDescriptor`], every URL is mapped to a
//! canonical path by its [`Convention`], and a [`ComparisonIndex`] sums impressions per
//! path and source so missing and differing paths can be queried.

mod bucket;
mod descriptor;
mod error;
mod index;
mod ingest;
mod normalize;
mod numeric;
mod position;
mod record;
mod tokenizer;

pub use bucket::Bucket;
pub use descriptor::SourceDescriptor;
pub use error::{CompareError, IngestionError, Result};
pub use index::{
    ComparisonIndex, DiffThresholds, DEFAULT_ABSOLUTE_THRESHOLD, DEFAULT_PERCENT_THRESHOLD,
};
pub use ingest::{ingest, ingest_lines, IngestSummary};
pub use normalize::{strip_extension, Convention, PathGranularity};
pub use numeric::parse_int;
pub use position::SourcePosition;
pub use record::Record;
pub use tokenizer::{render_line, strip_bom, tokenize};
