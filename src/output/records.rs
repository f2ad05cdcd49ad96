use crate::model::{LogRecord, TaskStatus};
use crate::output::{Tone, format_timestamp, paint};
use std::io::Write;

pub fn print_records(
    mut w: impl Write,
    rows: &[LogRecord],
    page: usize,
    page_count: usize,
    matched: usize,
) -> std::io::Result<()> {
    writeln!(w, "{}", paint(Tone::Heading, "Log records"))?;

    if rows.is_empty() {
        writeln!(
            w,
            "  {}",
            paint(Tone::Dim, "No records match the current filters.")
        )?;
        return Ok(());
    }

    writeln!(
        w,
        "  {:<19}  {:<8}  {:>8}  {:<7}  {}",
        "timestamp (UTC)", "machine", "minutes", "status", "error"
    )?;

    for row in rows {
        let status = match row.status {
            TaskStatus::Success => paint(Tone::Good, &format!("{:<7}", "success")),
            TaskStatus::Failure => paint(Tone::Bad, &format!("{:<7}", "failure")),
        };

        writeln!(
            w,
            "  {:<19}  {}  {:>8.2}  {}  {}",
            format_timestamp(row.timestamp),
            paint(Tone::Machine, &format!("{:<8}", row.machine_id)),
            row.task_duration,
            status,
            row.error_code
        )?;
    }

    writeln!(
        w,
        "  {}",
        paint(
            Tone::Dim,
            &format!(
                "page {} of {} ({} matching records)",
                page + 1,
                page_count.max(1),
                matched
            )
        )
    )
}
