use crate::app_error::AppError;
use crate::config::{self, Settings};
use crate::dashboard::{Dashboard, Event, ViewModel, ViewState};
use crate::generator::{self, Generator};
use crate::logging;
use crate::model::ErrorCode;
use crate::output::{self, Tone, paint};
use crate::pipeline::{self, Criteria};
use crate::store::{MemoryStore, RecordStore, SqliteStore};
use crate::version;
use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Generator as CompletionGenerator, generate};
use rand::rngs::StdRng;
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use time::macros::format_description;
use time::{Date, OffsetDateTime};
use tracing::debug;

const DEFAULT_CONFIG_TEMPLATE: &str = r#"version: 1

database:
  path: "warehouse.db"   # SQLite file holding the logs table

generator:
  machines: ["M-1", "M-2", "M-3", "M-4", "M-5"]
  batch_size: 500        # rows generated when the database is empty
  # seed: 42             # fixed seed for reproducible data

refresh:
  interval: "2s"         # time between ticks in `warehouse watch`
  every_ticks: 5         # append a batch on every Nth tick
  batch_size: 50
  dedupe: false          # skip refresh rows identical to one already loaded

table:
  page_size: 10
"#;

#[derive(Debug, Parser)]
#[command(
    name = "warehouse",
    version = version::VALUE,
    about = "Simulated warehouse task logs with filterable KPI dashboards",
    styles = clap_styles()
)]
struct Cli {
    #[arg(long = "no-color", global = true)]
    no_color: bool,
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Init(InitArgs),
    Seed(SeedArgs),
    Report(ReportArgs),
    Records(RecordsArgs),
    Watch(WatchArgs),
    Validate(ValidateArgs),
    Version,
    Completion(CompletionArgs),
}

#[derive(Debug, Args)]
struct InitArgs {
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    force: bool,
}

#[derive(Debug, Args)]
struct SeedArgs {
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    db: Option<PathBuf>,
    #[arg(long)]
    count: Option<usize>,
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Debug, Args)]
struct SourceArgs {
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    db: Option<PathBuf>,
    /// Keep records in memory instead of the SQLite database.
    #[arg(long, conflicts_with = "db")]
    memory: bool,
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Debug, Args)]
struct FilterArgs {
    /// First day to include (YYYY-MM-DD).
    #[arg(long)]
    from: Option<String>,
    /// Last day to include (YYYY-MM-DD).
    #[arg(long)]
    to: Option<String>,
    #[arg(long)]
    machine: Option<String>,
    #[arg(long = "error-code")]
    error_codes: Vec<String>,
}

#[derive(Debug, Args)]
struct ReportArgs {
    #[command(flatten)]
    source: SourceArgs,
    #[command(flatten)]
    filters: FilterArgs,
    #[arg(long, default_value_t = 1)]
    page: usize,
    #[arg(long = "page-size")]
    page_size: Option<usize>,
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct RecordsArgs {
    #[command(flatten)]
    source: SourceArgs,
    #[command(flatten)]
    filters: FilterArgs,
    #[arg(long)]
    limit: Option<usize>,
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct WatchArgs {
    #[command(flatten)]
    source: SourceArgs,
    #[command(flatten)]
    filters: FilterArgs,
    /// Stop after this many ticks.
    #[arg(long)]
    ticks: Option<u64>,
    #[arg(long)]
    interval: Option<String>,
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct ValidateArgs {
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct CompletionArgs {
    #[arg(value_enum)]
    shell: Shell,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

fn clap_styles() -> Styles {
    Styles::plain()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .error(AnsiColor::Red.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default())
        .literal(AnsiColor::Cyan.on_default())
        .placeholder(AnsiColor::Cyan.on_default())
        .valid(AnsiColor::Cyan.on_default())
        .invalid(AnsiColor::Cyan.on_default())
}

pub fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    output::configure(cli.no_color);
    logging::init(cli.verbose);

    match cli.command {
        Commands::Init(args) => run_init(args),
        Commands::Seed(args) => run_seed(args),
        Commands::Report(args) => run_report(args),
        Commands::Records(args) => run_records(args),
        Commands::Watch(args) => run_watch(args),
        Commands::Validate(args) => run_validate(args),
        Commands::Version => {
            println!("{}", version::VALUE);
            Ok(())
        }
        Commands::Completion(args) => run_completion(args),
    }
}

fn run_init(args: InitArgs) -> Result<(), AppError> {
    let config_path = args
        .config
        .unwrap_or_else(|| PathBuf::from(config::DEFAULT_PATH));

    if config_path.exists() && !args.force {
        return Err(AppError::usage(format!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        )));
    }

    fs::write(&config_path, DEFAULT_CONFIG_TEMPLATE)
        .map_err(|e| AppError::internal(format!("write {}: {e}", config_path.display())))?;

    println!(
        "created {}",
        paint(Tone::Value, &config_path.display().to_string())
    );
    Ok(())
}

fn run_seed(args: SeedArgs) -> Result<(), AppError> {
    let settings = load_settings(args.config.as_deref())?;
    let path = args.db.unwrap_or(settings.database_path);
    let count = args.count.unwrap_or(settings.batch_size);

    let mut store = SqliteStore::open(&path)?;
    store.ensure_initialized()?;

    let mut rng = generator::rng_for(args.seed.or(settings.seed));
    let records =
        Generator::new(settings.machines).generate(&mut rng, OffsetDateTime::now_utc(), count);
    store.save(&records)?;

    println!(
        "{} appended {} records to {}",
        paint(Tone::Good, "ok"),
        paint(Tone::Value, &records.len().to_string()),
        paint(Tone::Value, &path.display().to_string())
    );
    Ok(())
}

fn run_report(args: ReportArgs) -> Result<(), AppError> {
    if args.page == 0 {
        return Err(AppError::usage("--page starts at 1"));
    }
    if args.page_size == Some(0) {
        return Err(AppError::usage("--page-size must be at least 1"));
    }

    let settings = load_settings(args.source.config.as_deref())?;
    let state = ViewState {
        criteria: build_criteria(&args.filters)?,
        page: args.page - 1,
        page_size: args.page_size.unwrap_or(settings.page_size),
    };

    let mut dashboard = open_dashboard(&args.source, &settings)?;
    let view = dashboard.handle(Event::FiltersChanged(state), OffsetDateTime::now_utc())?;

    if args.json {
        return write_json(&view, "report");
    }

    output::print_dashboard(io::stdout().lock(), &view)
        .map_err(|e| AppError::internal(format!("print report: {e}")))
}

fn run_records(args: RecordsArgs) -> Result<(), AppError> {
    if args.limit == Some(0) {
        return Err(AppError::usage("--limit must be at least 1"));
    }

    let settings = load_settings(args.source.config.as_deref())?;
    let criteria = build_criteria(&args.filters)?;
    let dashboard = open_dashboard(&args.source, &settings)?;

    let snapshot = dashboard.snapshot();
    let mut rows = pipeline::filter(snapshot.records(), &criteria);
    let matched = rows.len();
    if let Some(limit) = args.limit {
        rows.truncate(limit);
    }

    if args.json {
        return write_json(&rows, "records");
    }

    output::print_records(io::stdout().lock(), &rows, 0, 1, matched)
        .map_err(|e| AppError::internal(format!("print records: {e}")))
}

#[derive(Serialize)]
struct TickPayload<'a> {
    tick: u64,
    #[serde(flatten)]
    view: &'a ViewModel,
}

fn run_watch(args: WatchArgs) -> Result<(), AppError> {
    let mut settings = load_settings(args.source.config.as_deref())?;
    if let Some(interval) = &args.interval {
        settings.refresh.interval = config::parse_duration(interval)
            .map_err(|e| AppError::usage(format!("--interval: {e}")))?;
    }

    let state = ViewState {
        criteria: build_criteria(&args.filters)?,
        page: 0,
        page_size: settings.page_size,
    };

    let mut dashboard = open_dashboard(&args.source, &settings)?.with_state(state);
    let mut stdout = io::stdout().lock();

    let view = dashboard.handle(Event::Initial, OffsetDateTime::now_utc())?;
    if args.json {
        write_tick_line(&mut stdout, 0, &view)?;
    } else {
        output::print_dashboard(&mut stdout, &view)
            .map_err(|e| AppError::internal(format!("print dashboard: {e}")))?;
        writeln!(stdout).map_err(|e| AppError::internal(format!("write output: {e}")))?;
    }

    let mut tick = 0_u64;
    while args.ticks.is_none_or(|limit| tick < limit) {
        thread::sleep(settings.refresh.interval);
        tick += 1;

        let view = dashboard.handle(Event::Tick(tick), OffsetDateTime::now_utc())?;
        debug!(tick, version = view.snapshot_version, "tick handled");

        if args.json {
            write_tick_line(&mut stdout, tick, &view)?;
        } else {
            output::print_tick(&mut stdout, tick, &view)
                .map_err(|e| AppError::internal(format!("print tick: {e}")))?;
        }
    }

    Ok(())
}

fn write_tick_line(w: &mut impl Write, tick: u64, view: &ViewModel) -> Result<(), AppError> {
    serde_json::to_writer(&mut *w, &TickPayload { tick, view })
        .map_err(|e| AppError::internal(format!("encode tick json: {e}")))?;
    writeln!(w)
        .and_then(|_| w.flush())
        .map_err(|e| AppError::internal(format!("write output: {e}")))
}

fn open_dashboard(
    source: &SourceArgs,
    settings: &Settings,
) -> Result<Dashboard<StdRng>, AppError> {
    let store: Box<dyn RecordStore> = if source.memory {
        Box::new(MemoryStore::new())
    } else {
        let path = source
            .db
            .clone()
            .unwrap_or_else(|| settings.database_path.clone());
        Box::new(SqliteStore::open(path)?)
    };

    let rng = generator::rng_for(source.seed.or(settings.seed));
    let dashboard = Dashboard::start(
        Some(store),
        Generator::new(settings.machines.clone()),
        settings.refresh.clone(),
        rng,
        settings.batch_size,
        OffsetDateTime::now_utc(),
    )?;

    Ok(dashboard.with_state(ViewState {
        page_size: settings.page_size,
        ..ViewState::default()
    }))
}

fn build_criteria(filters: &FilterArgs) -> Result<Criteria, AppError> {
    let start = filters
        .from
        .as_deref()
        .map(|text| parse_date("--from", text))
        .transpose()?;
    let end = filters
        .to
        .as_deref()
        .map(|text| parse_date("--to", text))
        .transpose()?;

    let machine_id = filters
        .machine
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string);

    let mut error_codes = Vec::with_capacity(filters.error_codes.len());
    for raw in &filters.error_codes {
        let code = raw
            .trim()
            .parse::<ErrorCode>()
            .map_err(|e| AppError::usage(format!("--error-code: {e}")))?;
        if !error_codes.contains(&code) {
            error_codes.push(code);
        }
    }

    Ok(Criteria {
        start,
        end,
        machine_id,
        error_codes,
    })
}

fn parse_date(flag: &str, text: &str) -> Result<Date, AppError> {
    Date::parse(text.trim(), &format_description!("[year]-[month]-[day]"))
        .map_err(|_| AppError::usage(format!("{flag} must be a date like 2024-05-31")))
}

fn load_settings(explicit: Option<&Path>) -> Result<Settings, AppError> {
    let path = explicit.unwrap_or_else(|| Path::new(config::DEFAULT_PATH));

    if !path.exists() {
        if explicit.is_some() {
            return Err(AppError::usage(format!(
                "config file {} not found",
                paint(Tone::Value, &path.display().to_string())
            )));
        }
        return Ok(Settings::default());
    }

    let cfg = load_config_classified(path)?;
    cfg.resolve().map_err(AppError::usage)
}

fn load_config_classified(path: &Path) -> Result<config::Config, AppError> {
    config::load(path).map_err(|err| {
        if err.starts_with("read config:") && !err.contains("No such file") {
            AppError::internal(err)
        } else {
            AppError::usage(err)
        }
    })
}

fn write_json<T: Serialize + ?Sized>(value: &T, what: &str) -> Result<(), AppError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)
        .map_err(|e| AppError::internal(format!("encode {what} json: {e}")))?;
    writeln!(stdout).map_err(|e| AppError::internal(format!("write output: {e}")))
}

fn run_validate(args: ValidateArgs) -> Result<(), AppError> {
    #[derive(Serialize)]
    struct Issue<'a> {
        field: &'a str,
        message: &'a str,
    }

    #[derive(Serialize)]
    struct ValidateOutput<'a> {
        valid: bool,
        config: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        issues: Option<Vec<Issue<'a>>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<&'a str>,
    }

    let config_path = args
        .config
        .unwrap_or_else(|| PathBuf::from(config::DEFAULT_PATH));
    let config_path_text = config_path.display().to_string();

    let cfg = match config::parse(&config_path) {
        Ok(cfg) => cfg,
        Err(err) => {
            if args.json {
                write_json(
                    &ValidateOutput {
                        valid: false,
                        config: &config_path_text,
                        issues: None,
                        error: Some(&err),
                    },
                    "validate",
                )?;
            }
            return Err(AppError::usage(err));
        }
    };

    match config::validate(&cfg) {
        Ok(()) => {
            if args.json {
                write_json(
                    &ValidateOutput {
                        valid: true,
                        config: &config_path_text,
                        issues: None,
                        error: None,
                    },
                    "validate",
                )?;
            } else {
                println!("valid {}", paint(Tone::Value, &config_path_text));
            }
            Ok(())
        }
        Err(err) => {
            if args.json {
                let issues: Vec<Issue<'_>> = err
                    .issues
                    .iter()
                    .map(|issue| Issue {
                        field: &issue.field,
                        message: &issue.message,
                    })
                    .collect();
                let message = err.to_string();
                write_json(
                    &ValidateOutput {
                        valid: false,
                        config: &config_path_text,
                        issues: Some(issues),
                        error: Some(&message),
                    },
                    "validate",
                )?;
            } else {
                for issue in &err.issues {
                    eprintln!(
                        "{} {}: {}",
                        paint(Tone::Bad, "x"),
                        issue.field,
                        issue.message
                    );
                }
            }
            Err(AppError::usage(err.to_string()))
        }
    }
}

fn run_completion(args: CompletionArgs) -> Result<(), AppError> {
    let mut cmd = Cli::command();
    let mut stdout = io::stdout().lock();

    match args.shell {
        Shell::Bash => generate_completion(clap_complete::shells::Bash, &mut cmd, &mut stdout),
        Shell::Zsh => generate_completion(clap_complete::shells::Zsh, &mut cmd, &mut stdout),
        Shell::Fish => generate_completion(clap_complete::shells::Fish, &mut cmd, &mut stdout),
        Shell::Powershell => {
            generate_completion(clap_complete::shells::PowerShell, &mut cmd, &mut stdout)
        }
    }
    .map_err(|e| AppError::internal(format!("generate completion: {e}")))
}

fn generate_completion<G: CompletionGenerator>(
    generator: G,
    cmd: &mut clap::Command,
    writer: &mut impl Write,
) -> Result<(), io::Error> {
    generate(generator, cmd, "warehouse", writer);
    writer.flush()
}
