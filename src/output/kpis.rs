use crate::dashboard::ViewModel;
use crate::output::{Tone, format_minutes, paint};
use crate::pipeline::Aggregates;
use std::io::Write;

pub fn print_kpis(mut w: impl Write, agg: &Aggregates) -> std::io::Result<()> {
    let failure_tone = if agg.failure_count > 0 {
        Tone::Bad
    } else {
        Tone::Value
    };

    writeln!(w, "{}", paint(Tone::Heading, "Warehouse KPIs"))?;
    writeln!(
        w,
        "  total tasks:  {}",
        paint(Tone::Value, &agg.total.to_string())
    )?;
    writeln!(
        w,
        "  success rate: {} ({} tasks)",
        paint(Tone::Good, &agg.success_rate.to_string()),
        agg.success_count
    )?;
    writeln!(
        w,
        "  failure rate: {} ({} tasks)",
        paint(failure_tone, &agg.failure_rate.to_string()),
        agg.failure_count
    )?;
    writeln!(
        w,
        "  avg duration: {}",
        paint(Tone::Value, &format_minutes(agg.avg_duration))
    )
}

pub fn print_tick(mut w: impl Write, tick: u64, view: &ViewModel) -> std::io::Result<()> {
    let agg = &view.aggregates;
    writeln!(
        w,
        "{} tick {} {} matched={} success={} failure={} avg={}",
        paint(Tone::Dim, "."),
        paint(Tone::Value, &tick.to_string()),
        paint(Tone::Dim, &format!("v{}", view.snapshot_version)),
        agg.total,
        paint(Tone::Good, &agg.success_rate.to_string()),
        paint(Tone::Bad, &agg.failure_rate.to_string()),
        format_minutes(agg.avg_duration),
    )
}
