//! Source locations as typed by a user: `path:line:column`, 1-based.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LocationError {
    #[error("expected `path:line:column`, got `{0}`")]
    Format(String),

    #[error("line and column are 1-based, got `{0}`")]
    Zero(String),
}

/// A 1-based position in a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub path: PathBuf,
    pub line: u32,
    pub column: u32,
}

impl Location {
    /// Line and column as the worker expects them (0-based). A zero
    /// position maps to the first line or column.
    pub fn zero_based(&self) -> (u32, u32) {
        (self.line.saturating_sub(1), self.column.saturating_sub(1))
    }
}

impl FromStr for Location {
    type Err = LocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let format_err = || LocationError::Format(s.to_string());

        // Split from the right so `C:\src\main.sk:3:4` keeps its drive prefix.
        let mut parts = s.rsplitn(3, ':');
        let column = parts.next().ok_or_else(format_err)?;
        let line = parts.next().ok_or_else(format_err)?;
        let path = parts.next().filter(|p| !p.is_empty()).ok_or_else(format_err)?;

        let line: u32 = line.parse().map_err(|_| format_err())?;
        let column: u32 = column.parse().map_err(|_| format_err())?;
        if line == 0 || column == 0 {
            return Err(LocationError::Zero(s.to_string()));
        }

        Ok(Self {
            path: PathBuf::from(path),
            line,
            column,
        })
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.path.display(), self.line, self.column)
    }
}
