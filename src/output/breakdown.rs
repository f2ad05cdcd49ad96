use crate::model::TaskStatus;
use crate::output::{Tone, format_minutes, paint};
use crate::pipeline::Aggregates;
use std::io::Write;

const BAR_WIDTH: usize = 30;

pub fn print_breakdowns(mut w: impl Write, agg: &Aggregates) -> std::io::Result<()> {
    writeln!(w, "{}", paint(Tone::Heading, "Incidents by error code"))?;
    if agg.per_error_code.is_empty() {
        writeln!(w, "  {}", paint(Tone::Dim, "No failures in range."))?;
    } else {
        let max = agg.per_error_code.values().copied().max().unwrap_or(0);
        for (code, count) in &agg.per_error_code {
            writeln!(
                w,
                "  {:<6} {} {}",
                code.as_str(),
                paint(Tone::Bad, &bar(*count, max)),
                count
            )?;
        }
    }

    writeln!(w)?;
    writeln!(w, "{}", paint(Tone::Heading, "Tasks per machine"))?;
    if agg.per_machine.is_empty() {
        writeln!(w, "  {}", paint(Tone::Dim, "No tasks in range."))?;
    } else {
        let max = agg.per_machine.values().copied().max().unwrap_or(0);
        for (machine, count) in &agg.per_machine {
            let avg = agg
                .machine_avg_duration
                .get(machine)
                .copied()
                .unwrap_or(0.0);
            writeln!(
                w,
                "  {} {} {} (avg {})",
                paint(Tone::Machine, &format!("{machine:<8}")),
                paint(Tone::Value, &bar(*count, max)),
                count,
                format_minutes(avg)
            )?;
        }
    }

    writeln!(w)?;
    writeln!(w, "{}", paint(Tone::Heading, "Monthly status"))?;
    if agg.monthly_status.is_empty() {
        writeln!(w, "  {}", paint(Tone::Dim, "No data."))?;
        return Ok(());
    }

    for entry in &agg.monthly_status {
        let tone = match entry.status {
            TaskStatus::Success => Tone::Good,
            TaskStatus::Failure => Tone::Bad,
        };
        writeln!(
            w,
            "  {} {} {:>6.2}% ({})",
            entry.month,
            paint(tone, &format!("{:<7}", entry.status.as_str())),
            entry.percentage,
            entry.count
        )?;
    }

    Ok(())
}

fn bar(count: usize, max: usize) -> String {
    if max == 0 || count == 0 {
        return String::new();
    }
    let len = (count * BAR_WIDTH).div_ceil(max).max(1);
    "#".repeat(len)
}
