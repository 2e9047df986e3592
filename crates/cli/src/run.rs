use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};

use anyhow::{bail, Context, Result};
use urlcompare_core::{ingest, ComparisonIndex, SourcePosition};
use urlcompare_report::{JsonlWriter, Report, TextWriter};

use crate::cli::{CompareArgs, OutputFormat};
use crate::config::{load_config, resolve, ResolvedRun};

const TOP_ROWS: usize = 5;

pub fn run(args: CompareArgs) -> Result<()> {
    let cfg = load_config(&args.config)?;
    let resolved = resolve(cfg, &args)?;
    let report = compare(&resolved)?;
    print_summary(&resolved, &report, &mut io::stdout().lock())?;
    if let Some(path) = &resolved.output {
        let file = File::create(path)
            .with_context(|| format!("failed to create report {}", path.display()))?;
        write_report(&report, resolved.format, resolved.separator, BufWriter::new(file))?;
        tracing::info!(path = %path.display(), "report written");
    }
    if resolved.strict && report.has_findings() {
        bail!("strict mode: the sources disagree");
    }
    Ok(())
}

/// Ingests both sources, in position order, and collects the configured checks.
///
/// A failing source aborts the whole run; the partially filled index is discarded.
pub fn compare(resolved: &ResolvedRun) -> Result<Report> {
    let mut index = ComparisonIndex::new(
        resolved.input(SourcePosition::First).descriptor.convention,
        resolved.input(SourcePosition::Second).descriptor.convention,
        resolved.granularity,
    );
    for position in SourcePosition::BOTH {
        let input = resolved.input(position);
        let file = File::open(&input.file)
            .with_context(|| format!("failed to open {}", input.file.display()))?;
        let summary = ingest(BufReader::new(file), &input.descriptor, &mut index, position)
            .with_context(|| format!("failed to ingest {}", input.file.display()))?;
        tracing::info!(
            file = %input.file.display(),
            records = summary.records,
            duplicates = summary.duplicates,
            "loaded source"
        );
    }
    tracing::info!(paths = index.len(), granularity = %index.granularity(), "index ready");
    Ok(Report::build(
        &index,
        resolved.check_missing,
        resolved.thresholds.as_ref(),
    ))
}

fn write_report<W: Write>(
    report: &Report,
    format: OutputFormat,
    separator: char,
    writer: W,
) -> Result<()> {
    match format {
        OutputFormat::Text => TextWriter::new(writer, separator).write_report(report),
        OutputFormat::Jsonl => {
            let mut writer = JsonlWriter::new(writer);
            writer.write_report(report)?;
            writer.into_inner().flush()?;
            Ok(())
        }
    }
}

fn print_summary<W: Write>(resolved: &ResolvedRun, report: &Report, out: &mut W) -> Result<()> {
    for section in &report.missing {
        let missing_from = resolved.inputs[section.missing_from].file.display();
        writeln!(out)?;
        writeln!(
            out,
            "{} elements are missing from {} for a total of {} page impressions.",
            section.rows.len(),
            missing_from,
            section.total_impressions
        )?;
        if !section.rows.is_empty() {
            writeln!(out, "Top {TOP_ROWS}:")?;
        }
        for row in section.rows.iter().take(TOP_ROWS) {
            writeln!(out, "{}\t{}", row.url, row.impressions)?;
        }
    }
    if let Some(rows) = &report.differences {
        writeln!(out)?;
        writeln!(
            out,
            "{} paths show different values between {} and {}",
            rows.len(),
            resolved.inputs[0].file.display(),
            resolved.inputs[1].file.display()
        )?;
        if !rows.is_empty() {
            writeln!(out, "Top {TOP_ROWS}:")?;
        }
        for row in rows.iter().take(TOP_ROWS) {
            writeln!(
                out,
                "{}\t{}\t{:.2}%",
                row.path,
                row.delta,
                row.delta_ratio * 100.0
            )?;
        }
    }
    Ok(())
}
