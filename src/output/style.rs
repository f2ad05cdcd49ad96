use std::sync::atomic::{AtomicBool, Ordering};

static ENABLED: AtomicBool = AtomicBool::new(true);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Heading,
    Dim,
    Good,
    Bad,
    Value,
    Machine,
}

impl Tone {
    fn sgr(self) -> &'static str {
        match self {
            Tone::Heading => "1",
            Tone::Dim => "2",
            Tone::Good => "32",
            Tone::Bad => "31",
            Tone::Value => "96",
            Tone::Machine => "36",
        }
    }
}

pub fn configure(no_color: bool) {
    let forced = std::env::var("CLICOLOR_FORCE").ok().as_deref() == Some("1");
    let dumb = std::env::var("TERM").is_ok_and(|term| term.eq_ignore_ascii_case("dumb"));
    let suppressed = no_color || dumb || std::env::var_os("NO_COLOR").is_some();

    ENABLED.store(forced || !suppressed, Ordering::Relaxed);
}

pub fn paint(tone: Tone, text: &str) -> String {
    if text.is_empty() || !ENABLED.load(Ordering::Relaxed) {
        return text.to_string();
    }

    format!("\x1b[{}m{text}\x1b[0m", tone.sgr())
}
