use crate::generator::Generator;
use crate::model::{ErrorCode, LogRecord};
use crate::pipeline::{self, Aggregates, Criteria};
use crate::refresh::RefreshPolicy;
use crate::snapshot::{Snapshot, SnapshotStore};
use crate::store::{self, RecordStore, StoreError};
use rand::Rng;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{debug, info};

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub criteria: Criteria,
    pub page: usize,
    pub page_size: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            criteria: Criteria::default(),
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterOptions {
    pub min_date: Option<String>,
    pub max_date: Option<String>,
    pub machines: Vec<String>,
    pub error_codes: Vec<ErrorCode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationPoint {
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub machine_id: String,
    pub task_duration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewModel {
    pub snapshot_version: u64,
    pub options: FilterOptions,
    pub aggregates: Aggregates,
    pub matched: usize,
    pub page: usize,
    pub page_count: usize,
    pub rows: Vec<LogRecord>,
    pub duration_series: Vec<DurationPoint>,
}

pub fn compute(snapshot: &Snapshot, state: &ViewState) -> ViewModel {
    let (filtered, aggregates) = pipeline::apply(snapshot.records(), &state.criteria);

    let page_size = state.page_size.max(1);
    let page_count = filtered.len().div_ceil(page_size);
    let page = state.page.min(page_count.saturating_sub(1));
    let rows = filtered
        .iter()
        .skip(page * page_size)
        .take(page_size)
        .cloned()
        .collect();

    let duration_series = filtered
        .iter()
        .map(|r| DurationPoint {
            timestamp: r.timestamp,
            machine_id: r.machine_id.clone(),
            task_duration: r.task_duration,
        })
        .collect();

    ViewModel {
        snapshot_version: snapshot.version(),
        options: filter_options(snapshot.records()),
        aggregates,
        matched: filtered.len(),
        page,
        page_count,
        rows,
        duration_series,
    }
}

fn filter_options(records: &[LogRecord]) -> FilterOptions {
    let min = records.iter().map(LogRecord::utc_date).min();
    let max = records.iter().map(LogRecord::utc_date).max();
    let machines: BTreeSet<&str> = records.iter().map(|r| r.machine_id.as_str()).collect();
    let codes: BTreeSet<ErrorCode> = records.iter().map(|r| r.error_code).collect();

    FilterOptions {
        min_date: min.map(|d| d.to_string()),
        max_date: max.map(|d| d.to_string()),
        machines: machines.into_iter().map(str::to_string).collect(),
        error_codes: codes.into_iter().collect(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Initial,
    FiltersChanged(ViewState),
    Tick(u64),
}

pub struct Dashboard<R: Rng> {
    snapshots: SnapshotStore,
    store: Option<Box<dyn RecordStore>>,
    generator: Generator,
    policy: RefreshPolicy,
    rng: R,
    state: ViewState,
}

impl<R: Rng> Dashboard<R> {
    pub fn start(
        mut store: Option<Box<dyn RecordStore>>,
        generator: Generator,
        policy: RefreshPolicy,
        mut rng: R,
        batch: usize,
        now: OffsetDateTime,
    ) -> Result<Self, StoreError> {
        let records = match store.as_deref_mut() {
            Some(store) => store::bootstrap(store, &generator, &mut rng, now, batch)?,
            None => generator.generate(&mut rng, now, batch),
        };

        info!(count = records.len(), persistent = store.is_some(), "dashboard ready");

        Ok(Self {
            snapshots: SnapshotStore::new(records),
            store,
            generator,
            policy,
            rng,
            state: ViewState::default(),
        })
    }

    pub fn with_state(mut self, state: ViewState) -> Self {
        self.state = state;
        self
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshots.current()
    }

    pub fn handle(&mut self, event: Event, now: OffsetDateTime) -> Result<ViewModel, StoreError> {
        match event {
            Event::Initial => {}
            Event::FiltersChanged(state) => self.state = state,
            Event::Tick(tick) => {
                if self.policy.is_due(tick) {
                    self.refresh(now)?;
                }
            }
        }

        let snapshot = self.snapshots.current();
        let view = compute(&snapshot, &self.state);
        debug!(
            version = view.snapshot_version,
            matched = view.matched,
            "recomputed dashboard"
        );
        Ok(view)
    }

    fn refresh(&mut self, now: OffsetDateTime) -> Result<(), StoreError> {
        let mut batch = self
            .generator
            .generate(&mut self.rng, now, self.policy.batch_size);
        if self.policy.dedupe {
            batch = self.snapshots.unseen(batch);
        }

        if let Some(store) = self.store.as_deref_mut() {
            store.save(&batch)?;
        }

        let snapshot = self.snapshots.append(batch);
        info!(
            version = snapshot.version(),
            count = snapshot.len(),
            "appended refresh batch"
        );
        Ok(())
    }
}

