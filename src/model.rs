use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, UtcOffset};

pub const DEFAULT_MACHINES: &[&str] = &["M-1", "M-2", "M-3", "M-4", "M-5"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Success,
    Failure,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Success => "success",
            TaskStatus::Failure => "failure",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(TaskStatus::Success),
            "failure" => Ok(TaskStatus::Failure),
            other => Err(format!("unknown status {other:?}")),
        }
    }
}

/// Error code attached to a task. Successful tasks carry the `"None"`
/// sentinel rather than an absent value so the column is never null.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ErrorCode {
    #[serde(rename = "E-100")]
    E100,
    #[serde(rename = "E-200")]
    E200,
    #[serde(rename = "E-300")]
    E300,
    #[serde(rename = "None")]
    NoError,
}

impl ErrorCode {
    pub const FAILURES: [ErrorCode; 3] = [ErrorCode::E100, ErrorCode::E200, ErrorCode::E300];

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::E100 => "E-100",
            ErrorCode::E200 => "E-200",
            ErrorCode::E300 => "E-300",
            ErrorCode::NoError => "None",
        }
    }

    pub fn is_failure(self) -> bool {
        self != ErrorCode::NoError
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "E-100" => Ok(ErrorCode::E100),
            "E-200" => Ok(ErrorCode::E200),
            "E-300" => Ok(ErrorCode::E300),
            "None" => Ok(ErrorCode::NoError),
            other => Err(format!("unknown error code {other:?}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub machine_id: String,
    pub task_duration: f64,
    pub status: TaskStatus,
    pub error_code: ErrorCode,
}

impl LogRecord {
    pub fn is_consistent(&self) -> bool {
        match self.status {
            TaskStatus::Success => self.error_code == ErrorCode::NoError,
            TaskStatus::Failure => self.error_code.is_failure(),
        }
    }

    pub fn utc_timestamp(&self) -> OffsetDateTime {
        self.timestamp.to_offset(UtcOffset::UTC)
    }

    pub fn utc_date(&self) -> Date {
        self.utc_timestamp().date()
    }
}

pub fn format_timestamp(ts: OffsetDateTime) -> Result<String, time::error::Format> {
    ts.to_offset(time::UtcOffset::UTC)
        .format(&format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"))
}

pub fn parse_timestamp(text: &str) -> Result<OffsetDateTime, time::error::Parse> {
    let parsed = PrimitiveDateTime::parse(
        text.trim(),
        &format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    )?;
    Ok(parsed.assume_utc())
}
