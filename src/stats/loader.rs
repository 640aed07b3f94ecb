use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;
use tracing::{debug, info};

use super::StatRecord;

/// Errors raised while loading a stats file.
#[derive(Debug, Error)]
pub enum StatsError {
    /// Input path does not exist.
    #[error("stats file {} not found", path.display())]
    NotFound {
        /// Path that was requested.
        path: PathBuf,
    },

    /// Input could not be opened.
    #[error("failed to open stats file {}", path.display())]
    Io {
        /// Path that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// Reading a line from the input failed.
    #[error("failed to read line {line}")]
    Read {
        /// 1-based line number.
        line: usize,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// Non-empty line without a `key value` separator.
    #[error("malformed line {line}: expected `<key> <value>`, found {content:?}")]
    MalformedLine {
        /// 1-based line number.
        line: usize,
        /// Trimmed line content.
        content: String,
    },

    /// Value that is not a base-10 unsigned integer.
    #[error("invalid value {value:?} for key {key:?} on line {line}")]
    InvalidValue {
        /// 1-based line number.
        line: usize,
        /// Key the value belongs to.
        key: String,
        /// Offending value text.
        value: String,
    },
}

impl StatRecord {
    /// Load a stats file from disk.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, StatsError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => StatsError::NotFound {
                path: path.to_path_buf(),
            },
            _ => StatsError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;

        let record = Self::from_reader(BufReader::new(file))?;
        info!(path = %path.display(), keys = record.len(), "loaded stats");
        Ok(record)
    }

    /// Parse `key value` lines from any buffered reader.
    ///
    /// Blank lines are skipped. The first space separates the key from the
    /// value; a repeated key overwrites the earlier value.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, StatsError> {
        let mut record = StatRecord::new();

        for (idx, line) in reader.lines().enumerate() {
            let line_no = idx + 1;
            let line = line.map_err(|source| StatsError::Read {
                line: line_no,
                source,
            })?;
            let Some((key, value)) = parse_line(&line, line_no)? else {
                continue;
            };

            if let Some(previous) = record.insert(key.to_string(), value) {
                debug!(key, previous, value, line = line_no, "duplicate key overwritten");
            }
        }

        Ok(record)
    }
}

impl FromStr for StatRecord {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_reader(s.as_bytes())
    }
}

/// Split one line into its key and parsed value. Returns `None` for blank lines.
fn parse_line(line: &str, line_no: usize) -> Result<Option<(&str, u64)>, StatsError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let (key, raw_value) = trimmed
        .split_once(' ')
        .ok_or_else(|| StatsError::MalformedLine {
            line: line_no,
            content: trimmed.to_string(),
        })?;

    let raw_value = raw_value.trim();
    let value = raw_value
        .parse::<u64>()
        .map_err(|_| StatsError::InvalidValue {
            line: line_no,
            key: key.to_string(),
            value: raw_value.to_string(),
        })?;

    Ok(Some((key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pairs_and_skips_blank_lines() {
        let record: StatRecord = "load.vector 10\n\n   \nload.non_vector  90 \n"
            .parse()
            .unwrap();
        assert_eq!(record.len(), 2);
        assert_eq!(record.get("load.vector"), Some(10));
        assert_eq!(record.get("load.non_vector"), Some(90));
    }

    #[test]
    fn splits_on_first_space_only() {
        let err = "load.vector 1 2".parse::<StatRecord>().unwrap_err();
        match err {
            StatsError::InvalidValue { line, key, value } => {
                assert_eq!(line, 1);
                assert_eq!(key, "load.vector");
                assert_eq!(value, "1 2");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn reports_line_number_of_malformed_line() {
        let err = "a 1\nb 2\nonlykey\n".parse::<StatRecord>().unwrap_err();
        assert!(matches!(
            err,
            StatsError::MalformedLine { line: 3, ref content } if content == "onlykey"
        ));
    }

    #[test]
    fn duplicate_key_last_write_wins() {
        let record: StatRecord = "k 1\nk 5\n".parse().unwrap();
        assert_eq!(record.get("k"), Some(5));
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = StatRecord::from_path("/definitely/not/here/inspector.stats.txt").unwrap_err();
        assert!(matches!(err, StatsError::NotFound { .. }));
    }
}
