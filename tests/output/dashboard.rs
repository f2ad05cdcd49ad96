use time::macros::datetime;
use warehouse_dash::dashboard::{ViewState, compute};
use warehouse_dash::model::{ErrorCode, LogRecord, TaskStatus};
use warehouse_dash::output::{print_breakdowns, print_dashboard, print_kpis, print_tick};
use warehouse_dash::pipeline::aggregate;
use warehouse_dash::snapshot::Snapshot;

fn records() -> Vec<LogRecord> {
    let at = datetime!(2024-09-01 07:00:00 UTC);
    let mut rows: Vec<LogRecord> = (0..9)
        .map(|_| LogRecord {
            timestamp: at,
            machine_id: "M-1".to_string(),
            task_duration: 20.0,
            status: TaskStatus::Success,
            error_code: ErrorCode::NoError,
        })
        .collect();
    rows.push(LogRecord {
        timestamp: at,
        machine_id: "M-1".to_string(),
        task_duration: 30.0,
        status: TaskStatus::Failure,
        error_code: ErrorCode::E100,
    });
    rows
}

#[test]
fn print_kpis_shows_rates() {
    let mut out = Vec::new();
    print_kpis(&mut out, &aggregate(&records())).expect("print kpis");
    let text = String::from_utf8(out).expect("utf8");
    assert!(text.contains("total tasks"));
    assert!(text.contains("90.00%"));
    assert!(text.contains("10.00%"));
    assert!(text.contains("21.00 min"));
}

#[test]
fn print_breakdowns_empty() {
    let mut out = Vec::new();
    print_breakdowns(&mut out, &aggregate(&[])).expect("print breakdowns");
    let text = String::from_utf8(out).expect("utf8");
    assert!(text.contains("No failures in range"));
    assert!(text.contains("No tasks in range"));
}

#[test]
fn print_breakdowns_rows() {
    let mut out = Vec::new();
    print_breakdowns(&mut out, &aggregate(&records())).expect("print breakdowns");
    let text = String::from_utf8(out).expect("utf8");
    assert!(text.contains("E-100"));
    assert!(text.contains("2024-09"));
    assert!(text.contains("90.00%"));
}

#[test]
fn print_dashboard_and_tick() {
    let snap = Snapshot::new(4, records());
    let view = compute(&snap, &ViewState::default());

    let mut out = Vec::new();
    print_dashboard(&mut out, &view).expect("print dashboard");
    let text = String::from_utf8(out).expect("utf8");
    assert!(text.contains("Warehouse KPIs"));
    assert!(text.contains("Log records"));
    assert!(text.contains("page 1 of 1 (10 matching records)"));

    let mut out = Vec::new();
    print_tick(&mut out, 7, &view).expect("print tick");
    let text = String::from_utf8(out).expect("utf8");
    assert!(text.contains("tick"));
    assert!(text.contains("v4"));
    assert!(text.contains("matched=10"));
}
