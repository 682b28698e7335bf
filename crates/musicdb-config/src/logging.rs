use std::fmt;
use std::str::FromStr;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Supported logging output formats.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// Structured JSON suitable for ingestion by logging stacks.
    #[default]
    Json,
    /// Human-readable single line output.
    Compact,
}

/// Errors encountered while parsing a [`LogFormat`] from text.
pub type LogFormatParseError = strum::ParseError;

/// Destination for daemon log records.
///
/// Parsed from the literal strings `stderr` and `stdout`; any other value is
/// treated as the path of a log file opened in append mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LogTarget {
    /// Standard error.
    #[default]
    Stderr,
    /// Standard output.
    Stdout,
    /// Append to the given file.
    File(Utf8PathBuf),
}

impl From<String> for LogTarget {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "stderr" | "" => Self::Stderr,
            "stdout" => Self::Stdout,
            _ => Self::File(Utf8PathBuf::from(value.trim())),
        }
    }
}

impl From<LogTarget> for String {
    fn from(value: LogTarget) -> Self {
        value.to_string()
    }
}

impl FromStr for LogTarget {
    type Err = std::convert::Infallible;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(input.to_owned()))
    }
}

impl fmt::Display for LogTarget {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stderr => formatter.write_str("stderr"),
            Self::Stdout => formatter.write_str("stdout"),
            Self::File(path) => write!(formatter, "{path}"),
        }
    }
}
