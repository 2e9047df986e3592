use std::io::Write;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use urlcompare_core::{
    render_line, Bucket, ComparisonIndex, Convention, DiffThresholds, Record, SourcePosition,
};

/// A record whose canonical path has no impressions in `missing_from`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MissingRow {
    pub missing_from: usize,
    pub url: String,
    pub convention: Convention,
    pub impressions: i64,
}

impl MissingRow {
    fn new(missing_from: SourcePosition, record: &Record) -> Self {
        Self {
            missing_from: missing_from.index(),
            url: record.url().to_string(),
            convention: record.convention(),
            impressions: record.impressions(),
        }
    }
}

/// A canonical path whose sums diverge beyond the thresholds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DifferenceRow {
    pub path: String,
    pub impressions: [i64; 2],
    pub delta: i64,
    pub delta_ratio: f64,
}

impl DifferenceRow {
    fn new(bucket: &Bucket) -> Self {
        Self {
            path: bucket.path().to_string(),
            impressions: [
                bucket.impressions(SourcePosition::First),
                bucket.impressions(SourcePosition::Second),
            ],
            delta: bucket.difference(SourcePosition::First),
            delta_ratio: bucket.difference_ratio(SourcePosition::First),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MissingSection {
    pub missing_from: usize,
    pub total_impressions: i64,
    pub rows: Vec<MissingRow>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Report {
    pub conventions: Vec<Convention>,
    /// One section per source position, when the missing check ran.
    pub missing: Vec<MissingSection>,
    /// `None` when the differences check did not run.
    pub differences: Option<Vec<DifferenceRow>>,
}

impl Report {
    /// Collects the requested checks from a fully ingested index.
    ///
    /// Difference rows are measured from the first source and sorted by absolute delta,
    /// largest first.
    pub fn build(
        index: &ComparisonIndex,
        missing: bool,
        thresholds: Option<&DiffThresholds>,
    ) -> Self {
        let conventions = SourcePosition::BOTH
            .iter()
            .filter_map(|pos| index.convention(*pos))
            .collect();
        let missing = if missing {
            SourcePosition::BOTH
                .iter()
                .map(|&pos| MissingSection {
                    missing_from: pos.index(),
                    total_impressions: index.missing_impressions(pos),
                    rows: index
                        .missing(pos)
                        .iter()
                        .map(|record| MissingRow::new(pos, record))
                        .collect(),
                })
                .collect()
        } else {
            Vec::new()
        };
        let differences = thresholds.map(|thresholds| {
            let mut rows: Vec<DifferenceRow> = index
                .differing(SourcePosition::First, thresholds)
                .iter()
                .map(DifferenceRow::new)
                .collect();
            rows.sort_by(|a, b| {
                b.delta
                    .unsigned_abs()
                    .cmp(&a.delta.unsigned_abs())
                    .then_with(|| a.path.cmp(&b.path))
            });
            rows
        });
        Self {
            conventions,
            missing,
            differences,
        }
    }

    pub fn has_findings(&self) -> bool {
        self.missing.iter().any(|section| !section.rows.is_empty())
            || self
                .differences
                .as_ref()
                .is_some_and(|rows| !rows.is_empty())
    }
}

pub struct JsonlWriter<W> {
    writer: W,
}

impl<W: Write> JsonlWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn write_record<T: Serialize>(&mut self, record: &T) -> Result<()> {
        let mut buf = serde_json::to_vec(record)?;
        buf.push(b'\n');
        self.writer.write_all(&buf)?;
        Ok(())
    }

    /// Every missing row, then every difference row, one JSON object per line.
    pub fn write_report(&mut self, report: &Report) -> Result<()> {
        for section in &report.missing {
            for row in &section.rows {
                self.write_record(row)?;
            }
        }
        for row in report.differences.iter().flatten() {
            self.write_record(row)?;
        }
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Plain-text report with `separator`-delimited tables.
pub struct TextWriter<W> {
    writer: W,
    separator: char,
}

impl<W: Write> TextWriter<W> {
    pub fn new(writer: W, separator: char) -> Self {
        Self { writer, separator }
    }

    fn row<S: AsRef<str>>(&mut self, fields: &[S]) -> Result<()> {
        writeln!(self.writer, "{}", render_line(fields, self.separator))?;
        Ok(())
    }

    pub fn write_report(&mut self, report: &Report) -> Result<()> {
        for (pos, convention) in report.conventions.iter().enumerate() {
            writeln!(
                self.writer,
                "Format {}: {} ({})",
                pos + 1,
                convention,
                convention.sample()
            )?;
        }
        writeln!(self.writer)?;
        for section in &report.missing {
            writeln!(
                self.writer,
                "{} elements are missing from source {} for a total of {} page impressions.",
                section.rows.len(),
                section.missing_from + 1,
                section.total_impressions
            )?;
            if !section.rows.is_empty() {
                self.row(&["url", "impressions"])?;
                for row in &section.rows {
                    self.row(&[row.url.clone(), row.impressions.to_string()])?;
                }
            }
            writeln!(self.writer)?;
        }
        if let Some(rows) = &report.differences {
            writeln!(
                self.writer,
                "{} paths differ beyond the thresholds.",
                rows.len()
            )?;
            if !rows.is_empty() {
                self.row(&[
                    "path",
                    "impressions fmt 1",
                    "impressions fmt 2",
                    "delta",
                    "delta %",
                ])?;
                for row in rows {
                    self.row(&[
                        row.path.clone(),
                        row.impressions[0].to_string(),
                        row.impressions[1].to_string(),
                        row.delta.to_string(),
                        format!("{:.2}", row.delta_ratio * 100.0),
                    ])?;
                }
            }
        }
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use urlcompare_core::PathGranularity;

    fn sample_index() -> ComparisonIndex {
        let mut index = ComparisonIndex::new(
            Convention::FullUrl,
            Convention::PathWithQuery,
            PathGranularity::WithExtension,
        );
        let first = [("a.html", 1200), ("b.html", 1200), ("only;first.html", 90)];
        for (page, pi) in first {
            index
                .add(
                    Record::new(format!("http://x.com/{page}"), Convention::FullUrl, pi),
                    SourcePosition::First,
                )
                .unwrap();
        }
        for (page, pi) in [("a.html", 1300), ("b.html", 1000)] {
            index
                .add(
                    Record::new(format!("/{page}"), Convention::PathWithQuery, pi),
                    SourcePosition::Second,
                )
                .unwrap();
        }
        index
    }

    #[test]
    fn builds_sorted_sections() {
        let report = Report::build(&sample_index(), true, Some(&DiffThresholds::default()));
        assert_eq!(report.missing.len(), 2);
        assert!(report.missing[0].rows.is_empty());
        assert_eq!(report.missing[1].rows.len(), 1);
        assert_eq!(report.missing[1].total_impressions, 90);

        let diffs = report.differences.as_ref().unwrap();
        let paths: Vec<&str> = diffs.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["/b.html", "/a.html", "/only;first.html"]);
        assert_eq!(diffs[0].delta, 200);
        assert_eq!(diffs[1].delta, -100);
        assert_eq!(diffs[2].delta_ratio, 90.0);
        assert!(report.has_findings());
    }

    #[test]
    fn skipped_checks_have_no_findings() {
        let report = Report::build(&sample_index(), false, None);
        assert!(report.missing.is_empty());
        assert!(report.differences.is_none());
        assert!(!report.has_findings());
    }

    #[test]
    fn jsonl_writer_emits_one_row_per_line() {
        let report = Report::build(&sample_index(), true, Some(&DiffThresholds::default()));
        let mut writer = JsonlWriter::new(Vec::new());
        writer.write_report(&report).unwrap();
        let buf = writer.into_inner();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        let missing: MissingRow = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(missing.url, "http://x.com/only;first.html");
        assert_eq!(missing.missing_from, 1);
        let diff: DifferenceRow = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(diff.impressions, [1200, 1000]);
    }

    #[test]
    fn text_writer_quotes_fields_with_separator() {
        let report = Report::build(&sample_index(), true, None);
        let mut writer = TextWriter::new(Vec::new(), ';');
        writer.write_report(&report).unwrap();
        let text = String::from_utf8(writer.into_inner()).unwrap();
        assert!(text.contains("Format 1: full-url"));
        assert!(text.contains("1 elements are missing from source 2 for a total of 90"));
        assert!(text.contains("\"http://x.com/only;first.html\";90"));
        assert!(!text.contains("paths differ"));
    }
}
