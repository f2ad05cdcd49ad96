use crate::dashboard::DEFAULT_PAGE_SIZE;
use crate::generator::DEFAULT_BATCH;
use crate::model::DEFAULT_MACHINES;
use crate::refresh::{self, RefreshPolicy};
use crate::store;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

pub const CURRENT_VERSION: i32 = 1;
pub const DEFAULT_PATH: &str = "./warehouse.yml";

const MAX_BATCH: usize = 100_000;
const MAX_REFRESH_BATCH: usize = 10_000;
const MAX_PAGE_SIZE: usize = 500;

static MACHINE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]{0,31}$").expect("valid regex"));

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub version: i32,
    pub database: Database,
    pub generator: GeneratorSection,
    pub refresh: Refresh,
    pub table: Table,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Database {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorSection {
    pub machines: Vec<String>,
    pub batch_size: Option<usize>,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Refresh {
    pub interval: String,
    pub every_ticks: Option<u64>,
    pub batch_size: Option<usize>,
    pub dedupe: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Table {
    pub page_size: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub database_path: PathBuf,
    pub machines: Vec<String>,
    pub batch_size: usize,
    pub seed: Option<u64>,
    pub refresh: RefreshPolicy,
    pub page_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(store::DEFAULT_PATH),
            machines: DEFAULT_MACHINES.iter().map(|m| m.to_string()).collect(),
            batch_size: DEFAULT_BATCH,
            seed: None,
            refresh: RefreshPolicy::default(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct ValidationErrors {
    pub issues: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<F: Into<String>, M: Into<String>>(&mut self, field: F, message: M) {
        self.issues.push(ValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.issues.as_slice() {
            [] => write!(f, "configuration validation failed"),
            [only] => write!(
                f,
                "configuration validation failed: {}: {}",
                only.field, only.message
            ),
            [first, rest @ ..] => write!(
                f,
                "configuration validation failed: {}: {} (and {} more)",
                first.field,
                first.message,
                rest.len()
            ),
        }
    }
}

impl std::error::Error for ValidationErrors {}

pub fn load(path: &Path) -> Result<Config, String> {
    let cfg = parse(path)?;
    validate(&cfg).map_err(|e| e.to_string())?;
    Ok(cfg)
}

pub fn parse(path: &Path) -> Result<Config, String> {
    let text = fs::read_to_string(path).map_err(|e| format!("read config: {e}"))?;
    let cfg: Config = serde_yaml::from_str(&text).map_err(|e| format!("parse config yaml: {e}"))?;
    Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<(), ValidationErrors> {
    let mut issues = ValidationErrors::new();

    if cfg.version != CURRENT_VERSION {
        issues.add("version", format!("must be {CURRENT_VERSION}"));
    }

    if cfg.database.path.trim() != cfg.database.path {
        issues.add("database.path", "must not have surrounding whitespace");
    }

    validate_generator(&mut issues, &cfg.generator);
    validate_refresh(&mut issues, &cfg.refresh);

    if let Some(size) = cfg.table.page_size
        && !(1..=MAX_PAGE_SIZE).contains(&size)
    {
        issues.add(
            "table.page_size",
            format!("must be between 1 and {MAX_PAGE_SIZE}"),
        );
    }

    if issues.has_issues() {
        Err(issues)
    } else {
        Ok(())
    }
}

fn validate_generator(issues: &mut ValidationErrors, g: &GeneratorSection) {
    let mut seen = HashSet::new();
    for (idx, machine) in g.machines.iter().enumerate() {
        if !MACHINE_ID_RE.is_match(machine) {
            issues.add(
                format!("generator.machines[{idx}]"),
                "must match ^[A-Za-z0-9][A-Za-z0-9_-]{0,31}$",
            );
        }
        if !seen.insert(machine.as_str()) {
            issues.add(
                format!("generator.machines[{idx}]"),
                format!("duplicate machine {machine:?}"),
            );
        }
    }

    if let Some(size) = g.batch_size
        && !(1..=MAX_BATCH).contains(&size)
    {
        issues.add(
            "generator.batch_size",
            format!("must be between 1 and {MAX_BATCH}"),
        );
    }
}

fn validate_refresh(issues: &mut ValidationErrors, r: &Refresh) {
    if !r.interval.is_empty() {
        match parse_duration(&r.interval) {
            Ok(d) if d.is_zero() => issues.add("refresh.interval", "must be greater than zero"),
            Ok(_) => {}
            Err(_) => issues.add("refresh.interval", "must be a valid duration"),
        }
    }

    if r.every_ticks == Some(0) {
        issues.add("refresh.every_ticks", "must be at least 1");
    }

    if let Some(size) = r.batch_size
        && !(1..=MAX_REFRESH_BATCH).contains(&size)
    {
        issues.add(
            "refresh.batch_size",
            format!("must be between 1 and {MAX_REFRESH_BATCH}"),
        );
    }
}

impl Config {
    pub fn resolve(&self) -> Result<Settings, String> {
        let defaults = Settings::default();

        let interval = resolve_duration(&self.refresh.interval, refresh::DEFAULT_INTERVAL)
            .map_err(|e| format!("refresh.interval: {e}"))?;

        let database_path = if self.database.path.is_empty() {
            defaults.database_path
        } else {
            PathBuf::from(&self.database.path)
        };

        let machines = if self.generator.machines.is_empty() {
            defaults.machines
        } else {
            self.generator.machines.clone()
        };

        Ok(Settings {
            database_path,
            machines,
            batch_size: self.generator.batch_size.unwrap_or(defaults.batch_size),
            seed: self.generator.seed,
            refresh: RefreshPolicy {
                interval,
                every_ticks: self
                    .refresh
                    .every_ticks
                    .unwrap_or(defaults.refresh.every_ticks),
                batch_size: self
                    .refresh
                    .batch_size
                    .unwrap_or(defaults.refresh.batch_size),
                dedupe: self.refresh.dedupe,
            },
            page_size: self.table.page_size.unwrap_or(defaults.page_size),
        })
    }
}

pub fn parse_duration(text: &str) -> Result<Duration, humantime::DurationError> {
    humantime::parse_duration(text)
}

fn resolve_duration(value: &str, default_value: Duration) -> Result<Duration, String> {
    if value.is_empty() {
        return Ok(default_value);
    }

    parse_duration(value).map_err(|_| "must be a valid duration".to_string())
}
