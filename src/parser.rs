use log::{debug, warn};

use crate::error::{ReportError, Result};
use crate::table::{ReportRow, ReportTable};

const COLUMN_SEPARATOR: char = '|';
const RULE_CHAR: char = '─';
const FINISHED_MARKER: &str = "Deploy Finished";

/// Banner lines printed by the deployment tool before the table.
pub const DEFAULT_HEAD_LINES: usize = 7;
/// Summary lines printed by the deployment tool after the table.
pub const DEFAULT_TAIL_LINES: usize = 2;

/// Where the table body sits inside a job log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFraming {
    /// Drop a fixed number of lines from the start and the end of the log.
    Fixed { head: usize, tail: usize },
    /// Take the lines between the table's divider rule and the
    /// `Deploy Finished` line.
    Markers,
}

impl Default for LogFraming {
    fn default() -> Self {
        Self::Fixed {
            head: DEFAULT_HEAD_LINES,
            tail: DEFAULT_TAIL_LINES,
        }
    }
}

impl LogFraming {
    fn body<'a>(&self, lines: &[&'a str]) -> Vec<&'a str> {
        match *self {
            Self::Fixed { head, tail } => {
                let end = lines.len().saturating_sub(tail);
                if head >= end {
                    warn!(
                        "Log has {} lines, nothing left after dropping {head} head and {tail} tail lines",
                        lines.len()
                    );
                    return Vec::new();
                }
                lines[head..end].to_vec()
            }
            Self::Markers => {
                let Some(divider) = lines.iter().position(|line| is_divider(line)) else {
                    warn!("No table divider found in log");
                    return Vec::new();
                };
                lines[divider + 1..]
                    .iter()
                    .take_while(|line| !line.trim_start().starts_with(FINISHED_MARKER))
                    .copied()
                    .collect()
            }
        }
    }
}

fn is_divider(line: &str) -> bool {
    line.contains(COLUMN_SEPARATOR) && line.contains(RULE_CHAR)
}

/// Parses the deployment table out of a job log using the default framing.
///
/// # Errors
///
/// Returns [`ReportError::Format`] for the first table line that does not
/// split into exactly four fields.
#[cfg(test)]
pub fn parse_deployment_log(raw_log: &str) -> Result<ReportTable> {
    parse_with_framing(raw_log, LogFraming::default())
}

/// Parses the deployment table out of a job log.
///
/// Lines inside the framed body that contain `|` (and are not the divider
/// rule) are table lines. The first space-delimited token of a line is the
/// row marker and is dropped; the remaining tokens, with the column padding
/// collapsed, are the fields. Every table line must produce exactly four
/// fields; there is no best-effort recovery, so a Name or Path with an
/// embedded space, a marker glued to the State (`|Unchanged`) or an indented
/// marker (`  | Unchanged`) is rejected.
///
/// # Errors
///
/// Returns [`ReportError::Format`] carrying the offending tokens.
pub fn parse_with_framing(raw_log: &str, framing: LogFraming) -> Result<ReportTable> {
    let lines: Vec<&str> = raw_log.split('\n').collect();
    let body = framing.body(&lines);
    debug!("Scanning {} of {} log lines for table rows", body.len(), lines.len());

    let mut table = ReportTable::new();
    for line in body
        .into_iter()
        .filter(|line| line.contains(COLUMN_SEPARATOR) && !line.contains(RULE_CHAR))
    {
        let tokens = split_fields(line);
        let row = ReportRow::try_from(tokens).map_err(|tokens| ReportError::Format { tokens })?;
        table.push(row);
    }

    debug!("Parsed {} data rows", table.data_rows().len());
    Ok(table)
}

fn split_fields(line: &str) -> Vec<String> {
    line.split(' ')
        .skip(1)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
        .collect()
}
