use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use urlcompare_core::{
    DiffThresholds, PathGranularity, SourceDescriptor, SourcePosition,
    DEFAULT_ABSOLUTE_THRESHOLD, DEFAULT_PERCENT_THRESHOLD,
};

use crate::cli::{CompareArgs, OutputFormat};

pub const DEFAULT_CONFIG: &str = "urlcompare.toml";

pub const SAMPLE_CONFIG: &str = r#"# urlcompare run configuration

# "with-extension" keeps /page.html and /page.php apart,
# "without-extension" compares them as /page.
granularity = "with-extension"

[checks]
missing = true
differences = true

# A path differs when both limits are exceeded.
[thresholds]
absolute = 10
percent = 0.01

[output]
# path = "report.tsv"
separator = "\t"
format = "text" # or "jsonl"

# Conventions: dotted-host, full-url, no-scheme-host,
# full-url-with-query, path-with-query, no-scheme-host-with-query
[[input]]
file = "input0.csv"
position = 0
convention = "full-url"
value_separator = ";"
decimal_separator = ","
thousands_separator = "."
has_header = true
url_column = 0
impressions_column = 1

[[input]]
file = "input1.csv"
position = 1
convention = "path-with-query"
value_separator = ","
decimal_separator = "."
thousands_separator = ","
has_header = true
url_column = 0
impressions_column = 1
"#;

#[derive(Debug, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub granularity: PathGranularity,
    #[serde(default)]
    pub checks: ChecksConfig,
    #[serde(default)]
    pub thresholds: ThresholdsConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default, rename = "input")]
    pub inputs: Vec<InputConfig>,
}

#[derive(Debug, Deserialize)]
pub struct ChecksConfig {
    #[serde(default = "default_true")]
    pub missing: bool,
    #[serde(default = "default_true")]
    pub differences: bool,
}

impl Default for ChecksConfig {
    fn default() -> Self {
        Self {
            missing: true,
            differences: true,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct ThresholdsConfig {
    #[serde(default = "default_absolute")]
    pub absolute: i64,
    #[serde(default = "default_percent")]
    pub percent: f64,
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            absolute: DEFAULT_ABSOLUTE_THRESHOLD,
            percent: DEFAULT_PERCENT_THRESHOLD,
        }
    }
}

fn default_absolute() -> i64 {
    DEFAULT_ABSOLUTE_THRESHOLD
}

fn default_percent() -> f64 {
    DEFAULT_PERCENT_THRESHOLD
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "default_output_separator")]
    pub separator: char,
    #[serde(default)]
    pub format: OutputFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: None,
            separator: default_output_separator(),
            format: OutputFormat::default(),
        }
    }
}

fn default_output_separator() -> char {
    '\t'
}

#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    pub file: PathBuf,
    pub position: SourcePosition,
    #[serde(flatten)]
    pub descriptor: SourceDescriptor,
}

/// Everything a comparison run needs, after command-line overrides.
#[derive(Debug)]
pub struct ResolvedRun {
    pub granularity: PathGranularity,
    /// Indexed by source position.
    pub inputs: [InputConfig; 2],
    pub check_missing: bool,
    pub thresholds: Option<DiffThresholds>,
    pub output: Option<PathBuf>,
    pub separator: char,
    pub format: OutputFormat,
    pub strict: bool,
}

pub fn load_config(path: &Path) -> Result<RunConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    toml::from_str(&contents).map_err(|e| anyhow!("invalid config {}: {e}", path.display()))
}

pub fn resolve(cfg: RunConfig, args: &CompareArgs) -> Result<ResolvedRun> {
    if cfg.inputs.len() != 2 {
        bail!(
            "run config must declare exactly two [[input]] tables, found {}",
            cfg.inputs.len()
        );
    }
    let mut slots: [Option<InputConfig>; 2] = [None, None];
    for input in cfg.inputs {
        let slot = &mut slots[input.position.index()];
        if slot.is_some() {
            bail!("two inputs share position {}", input.position);
        }
        input
            .descriptor
            .validate()
            .with_context(|| format!("invalid input {}", input.file.display()))?;
        *slot = Some(input);
    }
    let [Some(mut first), Some(mut second)] = slots else {
        bail!("inputs must use positions 0 and 1");
    };
    if let Some(file) = &args.first {
        first.file = file.clone();
    }
    if let Some(file) = &args.second {
        second.file = file.clone();
    }

    let granularity = if args.no_extension {
        PathGranularity::WithoutExtension
    } else {
        cfg.granularity
    };
    let thresholds = cfg.checks.differences.then(|| DiffThresholds {
        absolute: args.abs_threshold.unwrap_or(cfg.thresholds.absolute),
        percent: args.pct_threshold.unwrap_or(cfg.thresholds.percent),
    });
    Ok(ResolvedRun {
        granularity,
        inputs: [first, second],
        check_missing: cfg.checks.missing,
        thresholds,
        output: args.output.clone().or(cfg.output.path),
        separator: cfg.output.separator,
        format: args.format.unwrap_or(cfg.output.format),
        strict: args.strict,
    })
}

impl ResolvedRun {
    pub fn input(&self, position: SourcePosition) -> &InputConfig {
        &self.inputs[position.index()]
    }
}
