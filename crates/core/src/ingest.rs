use std::io::{self, BufRead};

use crate::descriptor::SourceDescriptor;
use crate::error::{CompareError, IngestionError, Result};
use crate::index::ComparisonIndex;
use crate::numeric::parse_int;
use crate::position::SourcePosition;
use crate::record::Record;
use crate::tokenizer::{strip_bom, tokenize};

/// Counters for one ingested source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    /// Lines read, header included.
    pub lines: usize,
    /// Records handed to the index.
    pub records: usize,
    /// Records the index already held verbatim.
    pub duplicates: usize,
}

pub fn ingest<R: BufRead>(
    reader: R,
    descriptor: &SourceDescriptor,
    index: &mut ComparisonIndex,
    position: SourcePosition,
) -> std::result::Result<IngestSummary, IngestionError> {
    ingest_lines(reader.lines(), descriptor, index, position)
}

/// Feeds every line into `index` at `position`.
///
/// The first error aborts the rest of the source. Records already added stay in the
/// index: there is no rollback, the caller decides whether a partial index is usable.
pub fn ingest_lines<I>(
    lines: I,
    descriptor: &SourceDescriptor,
    index: &mut ComparisonIndex,
    position: SourcePosition,
) -> std::result::Result<IngestSummary, IngestionError>
where
    I: IntoIterator<Item = io::Result<String>>,
{
    descriptor
        .validate()
        .map_err(IngestionError::before_reading)?;
    tracing::info!(
        source = %position,
        convention = %descriptor.convention,
        "ingesting source"
    );

    let mut summary = IngestSummary::default();
    let mut columns = None;
    for (line_no, line) in lines.into_iter().enumerate() {
        let line = line.map_err(|err| IngestionError::at_line(line_no, err.into()))?;
        summary.lines += 1;
        let row = if line_no == 0 {
            if descriptor.has_header {
                tracing::debug!(header = %strip_bom(&line), "skipping header row");
                continue;
            }
            strip_bom(&line)
        } else {
            line.as_str()
        };
        match ingest_row(row, line_no, &mut columns, descriptor, index, position) {
            Ok(true) => summary.records += 1,
            Ok(false) => {
                summary.records += 1;
                summary.duplicates += 1;
                tracing::debug!(line = line_no, "identical record already present");
            }
            Err(err) => {
                tracing::warn!(
                    source = %position,
                    line = line_no,
                    error = %err,
                    "ingestion aborted"
                );
                return Err(IngestionError::at_line(line_no, err));
            }
        }
    }

    tracing::info!(
        source = %position,
        lines = summary.lines,
        records = summary.records,
        duplicates = summary.duplicates,
        "source ingested"
    );
    Ok(summary)
}

fn ingest_row(
    row: &str,
    line_no: usize,
    columns: &mut Option<usize>,
    descriptor: &SourceDescriptor,
    index: &mut ComparisonIndex,
    position: SourcePosition,
) -> Result<bool> {
    let mut fields = tokenize(row, descriptor.value_separator)?;
    let expected = *columns.get_or_insert(fields.len());
    if fields.len() != expected {
        return Err(CompareError::MalformedRow(format!(
            "wrong number of columns at line {line_no}: expected {expected}, found {}",
            fields.len()
        )));
    }
    let impressions = field(&fields, descriptor.impressions_column, line_no)?;
    let impressions = parse_int(
        impressions,
        descriptor.thousands_separator,
        Some(descriptor.decimal_separator),
    )?;
    field(&fields, descriptor.url_column, line_no)?;
    let url = fields.swap_remove(descriptor.url_column);
    index.add(Record::new(url, descriptor.convention, impressions), position)
}

fn field<'a>(fields: &'a [String], column: usize, line_no: usize) -> Result<&'a str> {
    fields.get(column).map(String::as_str).ok_or_else(|| {
        CompareError::MalformedRow(format!(
            "column {column} missing at line {line_no}: only {} columns",
            fields.len()
        ))
    })
}
