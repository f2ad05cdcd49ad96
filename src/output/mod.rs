mod breakdown;
mod kpis;
mod records;
mod style;

pub use breakdown::print_breakdowns;
pub use kpis::{print_kpis, print_tick};
pub use records::print_records;
pub use style::{Tone, configure, paint};

use crate::dashboard::ViewModel;
use crate::model;
use std::io::Write;
use time::OffsetDateTime;

pub fn print_dashboard(mut w: impl Write, view: &ViewModel) -> std::io::Result<()> {
    print_kpis(&mut w, &view.aggregates)?;
    writeln!(w)?;
    print_breakdowns(&mut w, &view.aggregates)?;
    writeln!(w)?;
    print_records(&mut w, &view.rows, view.page, view.page_count, view.matched)
}

pub fn format_minutes(value: f64) -> String {
    format!("{value:.2} min")
}

pub fn format_timestamp(ts: OffsetDateTime) -> String {
    model::format_timestamp(ts).unwrap_or_else(|_| "-".to_string())
}
