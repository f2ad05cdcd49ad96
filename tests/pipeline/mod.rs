use time::macros::{date, datetime};
use time::{Date, OffsetDateTime};
use warehouse_dash::generator::{Generator, seeded};
use warehouse_dash::model::{ErrorCode, LogRecord, TaskStatus};
use warehouse_dash::pipeline::{Criteria, Rate, aggregate, apply, filter};

fn record(
    at: OffsetDateTime,
    machine: &str,
    status: TaskStatus,
    code: ErrorCode,
    duration: f64,
) -> LogRecord {
    LogRecord {
        timestamp: at,
        machine_id: machine.to_string(),
        task_duration: duration,
        status,
        error_code: code,
    }
}

fn ok(at: OffsetDateTime, machine: &str) -> LogRecord {
    record(at, machine, TaskStatus::Success, ErrorCode::NoError, 10.0)
}

fn failed(at: OffsetDateTime, machine: &str, code: ErrorCode) -> LogRecord {
    record(at, machine, TaskStatus::Failure, code, 30.0)
}

fn sample() -> Vec<LogRecord> {
    Generator::default().generate(&mut seeded(21), datetime!(2024-03-02 06:00:00 UTC), 300)
}

fn day_range(start: Date, end: Date) -> Criteria {
    Criteria {
        start: Some(start),
        end: Some(end),
        ..Criteria::default()
    }
}

#[test]
fn empty_criteria_returns_input_unchanged() {
    let records = sample();
    let filtered = filter(&records, &Criteria::default());
    assert_eq!(filtered, records);
}

#[test]
fn filtering_is_idempotent() {
    let records = sample();
    let criteria = Criteria {
        start: Some(date!(2024 - 03 - 01)),
        machine_id: Some("M-2".to_string()),
        error_codes: vec![ErrorCode::NoError, ErrorCode::E200],
        ..Criteria::default()
    };

    let once = filter(&records, &criteria);
    let twice = filter(&once, &criteria);
    assert_eq!(once, twice);
    assert!(once.iter().all(|r| r.machine_id == "M-2"));
}

#[test]
fn nine_successes_one_failure_on_one_machine() {
    let at = datetime!(2024-05-10 08:00:00 UTC);
    let mut records: Vec<LogRecord> = (0..9).map(|_| ok(at, "M-1")).collect();
    records.push(failed(at, "M-1", ErrorCode::E100));
    records.push(ok(at, "M-2"));

    let criteria = Criteria {
        machine_id: Some("M-1".to_string()),
        ..Criteria::default()
    };
    let (filtered, agg) = apply(&records, &criteria);

    assert_eq!(filtered.len(), 10);
    assert_eq!(agg.total, 10);
    assert_eq!(agg.success_rate.to_string(), "90.00%");
    assert_eq!(agg.failure_rate.to_string(), "10.00%");
    assert_eq!(agg.per_error_code.len(), 1);
    assert_eq!(agg.per_error_code.get(&ErrorCode::E100), Some(&1));
    assert_eq!(agg.avg_duration, 12.0);
}

#[test]
fn date_range_excluding_everything_yields_zero_aggregates() {
    let records = sample();
    let criteria = day_range(date!(2020 - 01 - 01), date!(2020 - 01 - 31));
    let (filtered, agg) = apply(&records, &criteria);

    assert!(filtered.is_empty());
    assert_eq!(agg.total, 0);
    assert_eq!(agg.success_count, 0);
    assert_eq!(agg.failure_count, 0);
    assert_eq!(agg.avg_duration, 0.0);
    assert_eq!(format!("{:.2}", agg.avg_duration), "0.00");
    assert_eq!(agg.success_rate.to_string(), "0%");
    assert_eq!(agg.failure_rate.to_string(), "0%");
    assert!(agg.per_machine.is_empty());
    assert!(agg.per_error_code.is_empty());
    assert!(agg.monthly_status.is_empty());
}

#[test]
fn date_bounds_are_inclusive_and_optional() {
    let records = vec![
        ok(datetime!(2024-04-01 00:00:00 UTC), "M-1"),
        ok(datetime!(2024-04-02 23:59:59 UTC), "M-1"),
        ok(datetime!(2024-04-03 00:00:00 UTC), "M-1"),
    ];

    let both = filter(
        &records,
        &day_range(date!(2024 - 04 - 01), date!(2024 - 04 - 02)),
    );
    assert_eq!(both.len(), 2);

    let open_end = filter(
        &records,
        &Criteria {
            start: Some(date!(2024 - 04 - 02)),
            ..Criteria::default()
        },
    );
    assert_eq!(open_end.len(), 2);

    let open_start = filter(
        &records,
        &Criteria {
            end: Some(date!(2024 - 04 - 01)),
            ..Criteria::default()
        },
    );
    assert_eq!(open_start.len(), 1);
}

#[test]
fn inverted_date_range_matches_nothing() {
    let records = sample();
    let filtered = filter(
        &records,
        &day_range(date!(2024 - 03 - 02), date!(2024 - 03 - 01)),
    );
    assert!(filtered.is_empty());
}

#[test]
fn error_code_filter_restricts_only_when_non_empty() {
    let at = datetime!(2024-05-10 08:00:00 UTC);
    let records = vec![
        ok(at, "M-1"),
        failed(at, "M-2", ErrorCode::E200),
        failed(at, "M-3", ErrorCode::E300),
    ];

    let only_e300 = filter(
        &records,
        &Criteria {
            error_codes: vec![ErrorCode::E300],
            ..Criteria::default()
        },
    );
    assert_eq!(only_e300.len(), 1);
    assert_eq!(only_e300[0].machine_id, "M-3");

    let unrestricted = filter(
        &records,
        &Criteria {
            error_codes: Vec::new(),
            ..Criteria::default()
        },
    );
    assert_eq!(unrestricted.len(), 3);
}

#[test]
fn rates_add_up_to_one_hundred() {
    let records = sample();
    let agg = aggregate(&records);
    assert!(agg.total > 0);
    let sum = agg.success_rate.percent() + agg.failure_rate.percent();
    assert!((sum - 100.0).abs() < 1e-9, "sum = {sum}");
    assert_eq!(agg.success_count + agg.failure_count, agg.total);
    assert_eq!(agg.per_machine.values().sum::<usize>(), agg.total);
    assert_eq!(agg.per_error_code.values().sum::<usize>(), agg.failure_count);
}

#[test]
fn monthly_status_is_normalized_within_month() {
    let jan = datetime!(2024-01-20 10:00:00 UTC);
    let feb = datetime!(2024-02-03 10:00:00 UTC);
    let records = vec![
        ok(jan, "M-1"),
        ok(jan, "M-2"),
        ok(jan, "M-3"),
        failed(jan, "M-1", ErrorCode::E200),
        ok(feb, "M-1"),
    ];

    let agg = aggregate(&records);
    let rows: Vec<(&str, TaskStatus, usize, f64)> = agg
        .monthly_status
        .iter()
        .map(|m| (m.month.as_str(), m.status, m.count, m.percentage))
        .collect();

    assert_eq!(
        rows,
        vec![
            ("2024-01", TaskStatus::Success, 3, 75.0),
            ("2024-01", TaskStatus::Failure, 1, 25.0),
            ("2024-02", TaskStatus::Success, 1, 100.0),
        ]
    );
}

#[test]
fn machine_averages_follow_counts() {
    let at = datetime!(2024-05-10 08:00:00 UTC);
    let records = vec![
        record(at, "M-1", TaskStatus::Success, ErrorCode::NoError, 10.0),
        record(at, "M-1", TaskStatus::Success, ErrorCode::NoError, 20.0),
        record(at, "M-4", TaskStatus::Success, ErrorCode::NoError, 7.5),
    ];

    let agg = aggregate(&records);
    assert_eq!(agg.per_machine.get("M-1"), Some(&2));
    assert_eq!(agg.machine_avg_duration.get("M-1"), Some(&15.0));
    assert_eq!(agg.machine_avg_duration.get("M-4"), Some(&7.5));
}

#[test]
fn rate_formatting() {
    assert_eq!(Rate::new(0, 0).to_string(), "0%");
    assert_eq!(Rate::new(1, 3).to_string(), "33.33%");
    assert_eq!(Rate::new(3, 3).to_string(), "100.00%");
}

#[test]
fn offset_timestamps_bucket_by_utc_day_and_month() {
    let records = vec![
        ok(datetime!(2024-04-02 01:00:00 +05:00), "M-1"),
        ok(datetime!(2024-04-01 20:00:00 -06:00), "M-2"),
    ];

    let march_31 = filter(&records, &day_range(date!(2024 - 03 - 31), date!(2024 - 03 - 31)));
    assert!(march_31.is_empty());

    let april_1 = filter(&records, &day_range(date!(2024 - 04 - 01), date!(2024 - 04 - 01)));
    assert_eq!(april_1, records[..1].to_vec());

    let april_2 = filter(&records, &day_range(date!(2024 - 04 - 02), date!(2024 - 04 - 02)));
    assert_eq!(april_2, records[1..].to_vec());

    let aggregated = aggregate(&records);
    let months: Vec<&str> = aggregated
        .monthly_status
        .iter()
        .map(|m| m.month.as_str())
        .collect();
    assert_eq!(months, ["2024-04"]);

    let leap = [ok(datetime!(2024-03-01 02:00:00 +05:00), "M-3")];
    assert_eq!(aggregate(&leap).monthly_status[0].month, "2024-02");
}
