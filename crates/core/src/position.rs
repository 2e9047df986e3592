use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CompareError;

/// Which of the two compared sources a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub enum SourcePosition {
    First,
    Second,
}

impl SourcePosition {
    pub const BOTH: [SourcePosition; 2] = [SourcePosition::First, SourcePosition::Second];

    pub fn index(self) -> usize {
        match self {
            SourcePosition::First => 0,
            SourcePosition::Second => 1,
        }
    }

    pub fn other(self) -> Self {
        match self {
            SourcePosition::First => SourcePosition::Second,
            SourcePosition::Second => SourcePosition::First,
        }
    }
}

impl TryFrom<usize> for SourcePosition {
    type Error = CompareError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(SourcePosition::First),
            1 => Ok(SourcePosition::Second),
            other => Err(CompareError::InvalidPosition(other)),
        }
    }
}

impl From<SourcePosition> for usize {
    fn from(value: SourcePosition) -> Self {
        value.index()
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}
