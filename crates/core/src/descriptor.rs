use serde::{Deserialize, Serialize};

use crate::error::{CompareError, Result};
use crate::normalize::Convention;

/// How to read one delimited export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    #[serde(default = "default_value_separator")]
    pub value_separator: char,
    #[serde(default = "default_decimal_separator")]
    pub decimal_separator: char,
    /// `None` when the export does not group thousands.
    #[serde(default)]
    pub thousands_separator: Option<char>,
    #[serde(default = "default_has_header")]
    pub has_header: bool,
    pub url_column: usize,
    pub impressions_column: usize,
    pub convention: Convention,
}

fn default_value_separator() -> char {
    ','
}

fn default_decimal_separator() -> char {
    '.'
}

fn default_has_header() -> bool {
    true
}

impl SourceDescriptor {
    pub fn new(convention: Convention, url_column: usize, impressions_column: usize) -> Self {
        Self {
            value_separator: default_value_separator(),
            decimal_separator: default_decimal_separator(),
            thousands_separator: None,
            has_header: default_has_header(),
            url_column,
            impressions_column,
            convention,
        }
    }

    pub fn value_separator(mut self, separator: char) -> Self {
        self.value_separator = separator;
        self
    }

    pub fn decimal_separator(mut self, separator: char) -> Self {
        self.decimal_separator = separator;
        self
    }

    pub fn thousands_separator(mut self, separator: Option<char>) -> Self {
        self.thousands_separator = separator;
        self
    }

    pub fn has_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.url_column == self.impressions_column {
            return Err(CompareError::InvalidDescriptor(format!(
                "url and impressions share column {}",
                self.url_column
            )));
        }
        if self.thousands_separator == Some(self.decimal_separator) {
            return Err(CompareError::InvalidDescriptor(format!(
                "thousands and decimal separator are both {:?}",
                self.decimal_separator
            )));
        }
        if self.value_separator == '"' {
            return Err(CompareError::InvalidDescriptor(
                "the value separator cannot be a double quote".to_string(),
            ));
        }
        Ok(())
    }
}
