pub mod app_error;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod generator;
pub mod logging;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod refresh;
pub mod snapshot;
pub mod store;
pub mod version;

pub fn run() -> i32 {
    match cli::run_cli() {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("{} {err}", output::paint(output::Tone::Bad, "error:"));
            err.code()
        }
    }
}
