use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompareError {
    #[error("malformed number {input:?}: {reason}")]
    MalformedNumber { input: String, reason: &'static str },
    #[error("malformed row: {0}")]
    MalformedRow(String),
    #[error("comparison index is not active: both conventions must be set")]
    NotActive,
    #[error("wrong convention: {0}")]
    WrongConvention(String),
    #[error("impression sum overflows: {0}")]
    ImpressionOverflow(String),
    #[error("invalid source descriptor: {0}")]
    InvalidDescriptor(String),
    #[error("invalid source position {0}: only 0 and 1 are allowed")]
    InvalidPosition(usize),
    #[error("unknown url convention: {0}")]
    UnknownConvention(String),
    #[error("unknown path granularity: {0}")]
    UnknownGranularity(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CompareError>;

impl CompareError {
    pub(crate) fn malformed_number(input: &str, reason: &'static str) -> Self {
        Self::MalformedNumber {
            input: input.to_string(),
            reason,
        }
    }
}

/// A failure while ingesting one source, tagged with the 0-based line that caused it.
///
/// `line` is `None` when the source was rejected before any line was read, such as
/// an invalid descriptor. Records inserted from earlier lines stay in the index;
/// ingestion is fail-fast and never rolled back.
#[derive(Error, Debug)]
#[error("{}{source}", line_prefix(.line))]
pub struct IngestionError {
    pub line: Option<usize>,
    #[source]
    pub source: CompareError,
}

impl IngestionError {
    pub fn at_line(line: usize, source: CompareError) -> Self {
        Self {
            line: Some(line),
            source,
        }
    }

    pub fn before_reading(source: CompareError) -> Self {
        Self { line: None, source }
    }
}

fn line_prefix(line: &Option<usize>) -> String {
    line.map(|line| format!("line {line}: ")).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ingestion_error_names_the_line_when_known() {
        let err = IngestionError::at_line(3, CompareError::MalformedRow("short".into()));
        assert_eq!(err.to_string(), "line 3: malformed row: short");

        let err = IngestionError::before_reading(CompareError::InvalidDescriptor(
            "columns overlap".into(),
        ));
        assert_eq!(err.to_string(), "invalid source descriptor: columns overlap");
    }
}
