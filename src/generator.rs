use crate::model::{DEFAULT_MACHINES, ErrorCode, LogRecord, TaskStatus};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use time::{Duration, OffsetDateTime};

pub const WINDOW_MINUTES: i64 = 1440;
pub const MIN_DURATION: f64 = 5.0;
pub const MAX_DURATION: f64 = 60.0;
pub const DEFAULT_BATCH: usize = 500;

const SUCCESS_WEIGHT: u32 = 9;
const FAILURE_WEIGHT: u32 = 1;

#[derive(Debug, Clone)]
pub struct Generator {
    machines: Vec<String>,
}

impl Default for Generator {
    fn default() -> Self {
        Self {
            machines: DEFAULT_MACHINES.iter().map(|m| m.to_string()).collect(),
        }
    }
}

impl Generator {
    pub fn new(machines: Vec<String>) -> Self {
        if machines.is_empty() {
            return Self::default();
        }
        Self { machines }
    }

    pub fn machines(&self) -> &[String] {
        &self.machines
    }

    pub fn generate<R: Rng>(&self, rng: &mut R, now: OffsetDateTime, n: usize) -> Vec<LogRecord> {
        (0..n).map(|_| self.record(rng, now)).collect()
    }

    fn record<R: Rng>(&self, rng: &mut R, now: OffsetDateTime) -> LogRecord {
        let offset = rng.random_range(0..=WINDOW_MINUTES);
        let machine = &self.machines[rng.random_range(0..self.machines.len())];
        let duration = round2(rng.random_range(MIN_DURATION..=MAX_DURATION));

        let status = if rng.random_ratio(SUCCESS_WEIGHT, SUCCESS_WEIGHT + FAILURE_WEIGHT) {
            TaskStatus::Success
        } else {
            TaskStatus::Failure
        };

        let error_code = match status {
            TaskStatus::Success => ErrorCode::NoError,
            TaskStatus::Failure => {
                ErrorCode::FAILURES[rng.random_range(0..ErrorCode::FAILURES.len())]
            }
        };

        LogRecord {
            timestamp: whole_second_within(now, now - Duration::minutes(offset)),
            machine_id: machine.clone(),
            task_duration: duration,
            status,
            error_code,
        }
    }
}

pub fn seeded(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

pub fn from_entropy() -> StdRng {
    StdRng::from_os_rng()
}

pub fn rng_for(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => seeded(seed),
        None => from_entropy(),
    }
}

fn truncate_to_second(ts: OffsetDateTime) -> OffsetDateTime {
    ts - Duration::nanoseconds(i64::from(ts.nanosecond()))
}

// Rounds up so the result never falls before `ts`, then clamps to `now`.
fn whole_second_within(now: OffsetDateTime, ts: OffsetDateTime) -> OffsetDateTime {
    let floor = truncate_to_second(ts);
    let ceil = if floor == ts { ts } else { floor + Duration::SECOND };
    if ceil > now {
        truncate_to_second(now)
    } else {
        ceil
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
