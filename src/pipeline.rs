use crate::generator::round2;
use crate::model::{ErrorCode, LogRecord, TaskStatus};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use time::Date;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    pub start: Option<Date>,
    pub end: Option<Date>,
    pub machine_id: Option<String>,
    pub error_codes: Vec<ErrorCode>,
}

impl Criteria {
    pub fn is_empty(&self) -> bool {
        self.start.is_none()
            && self.end.is_none()
            && self.machine_id.is_none()
            && self.error_codes.is_empty()
    }

    pub fn matches(&self, record: &LogRecord) -> bool {
        let day = record.utc_date();

        if let Some(start) = self.start
            && day < start
        {
            return false;
        }

        if let Some(end) = self.end
            && day > end
        {
            return false;
        }

        if let Some(machine) = &self.machine_id
            && &record.machine_id != machine
        {
            return false;
        }

        if !self.error_codes.is_empty() && !self.error_codes.contains(&record.error_code) {
            return false;
        }

        true
    }
}

/// A share of a total. Renders as `"0%"` when the total is zero and with
/// two decimals otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rate {
    pub hits: usize,
    pub total: usize,
}

impl Rate {
    pub fn new(hits: usize, total: usize) -> Self {
        Self { hits, total }
    }

    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.hits as f64 * 100.0 / self.total as f64
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.total == 0 {
            return f.write_str("0%");
        }
        write!(f, "{:.2}%", self.percent())
    }
}

impl Serialize for Rate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyStatus {
    pub month: String,
    pub status: TaskStatus,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregates {
    pub total: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub success_rate: Rate,
    pub failure_rate: Rate,
    pub avg_duration: f64,
    pub per_machine: BTreeMap<String, usize>,
    pub machine_avg_duration: BTreeMap<String, f64>,
    pub per_error_code: BTreeMap<ErrorCode, usize>,
    pub monthly_status: Vec<MonthlyStatus>,
}

pub fn filter(records: &[LogRecord], criteria: &Criteria) -> Vec<LogRecord> {
    if criteria.is_empty() {
        return records.to_vec();
    }

    records
        .iter()
        .filter(|record| criteria.matches(record))
        .cloned()
        .collect()
}

pub fn aggregate(records: &[LogRecord]) -> Aggregates {
    let total = records.len();
    let success_count = records
        .iter()
        .filter(|r| r.status == TaskStatus::Success)
        .count();
    let failure_count = total - success_count;

    let avg_duration = if total == 0 {
        0.0
    } else {
        round2(records.iter().map(|r| r.task_duration).sum::<f64>() / total as f64)
    };

    let mut per_machine: BTreeMap<String, usize> = BTreeMap::new();
    let mut machine_durations: BTreeMap<String, f64> = BTreeMap::new();
    let mut per_error_code: BTreeMap<ErrorCode, usize> = BTreeMap::new();

    for record in records {
        *per_machine.entry(record.machine_id.clone()).or_default() += 1;
        *machine_durations
            .entry(record.machine_id.clone())
            .or_default() += record.task_duration;

        if record.status == TaskStatus::Failure {
            *per_error_code.entry(record.error_code).or_default() += 1;
        }
    }

    let machine_avg_duration = machine_durations
        .into_iter()
        .map(|(machine, sum)| {
            let count = per_machine.get(&machine).copied().unwrap_or(1).max(1);
            (machine, round2(sum / count as f64))
        })
        .collect();

    Aggregates {
        total,
        success_count,
        failure_count,
        success_rate: Rate::new(success_count, total),
        failure_rate: Rate::new(failure_count, total),
        avg_duration,
        per_machine,
        machine_avg_duration,
        per_error_code,
        monthly_status: monthly_status(records),
    }
}

pub fn apply(records: &[LogRecord], criteria: &Criteria) -> (Vec<LogRecord>, Aggregates) {
    let filtered = filter(records, criteria);
    let aggregates = aggregate(&filtered);
    (filtered, aggregates)
}

fn monthly_status(records: &[LogRecord]) -> Vec<MonthlyStatus> {
    let mut counts: BTreeMap<(String, TaskStatus), usize> = BTreeMap::new();
    let mut month_totals: BTreeMap<String, usize> = BTreeMap::new();

    for record in records {
        let month = month_key(record);
        *counts.entry((month.clone(), record.status)).or_default() += 1;
        *month_totals.entry(month).or_default() += 1;
    }

    counts
        .into_iter()
        .map(|((month, status), count)| {
            let month_total = month_totals.get(&month).copied().unwrap_or(0);
            MonthlyStatus {
                percentage: round2(Rate::new(count, month_total).percent()),
                month,
                status,
                count,
            }
        })
        .collect()
}

fn month_key(record: &LogRecord) -> String {
    let ts = record.utc_timestamp();
    format!("{:04}-{:02}", ts.year(), u8::from(ts.month()))
}
