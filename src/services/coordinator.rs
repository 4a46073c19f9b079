//! Refresh cycle: concurrent fetch, pure merge, atomic publish

use crate::adapters::{AdapterRegistry, SourceAdapter};
use crate::config::{Endpoints, Settings};
use crate::services::eta::{Clock, SystemClock};
use crate::services::fetcher::HttpFetcher;
use crate::services::store::SnapshotStore;
use crate::types::{NavajaError, Result, Snapshot, SubscriptionList};
use chrono::DateTime;
use chrono_tz::Tz;
use futures_util::future::join_all;
use rayon::prelude::*;
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default polling cadence
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

/// Where the coordinator is within the current cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CyclePhase {
    Idle = 0,
    Fetching = 1,
    Merging = 2,
    Published = 3,
}

impl CyclePhase {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => CyclePhase::Fetching,
            2 => CyclePhase::Merging,
            3 => CyclePhase::Published,
            _ => CyclePhase::Idle,
        }
    }
}

/// Result of one source within a cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceStatus {
    /// Fragment applied
    Updated,
    /// Document fetched but held nothing usable; previous value kept
    Unusable,
    /// Fetch failed; previous value kept
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceOutcome {
    pub source: String,
    pub status: SourceStatus,
}

impl fmt::Display for SourceOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            SourceStatus::Updated => write!(f, "{}: updated", self.source),
            SourceStatus::Unusable => write!(f, "{}: unusable document", self.source),
            SourceStatus::Failed(reason) => write!(f, "{}: failed ({})", self.source, reason),
        }
    }
}

/// Per-source detail of a published cycle
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub outcomes: Vec<SourceOutcome>,
    /// Store generation of the published snapshot
    pub published: u64,
}

impl CycleReport {
    pub fn updated(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == SourceStatus::Updated)
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &SourceOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.status != SourceStatus::Updated)
    }
}

/// Merge one cycle's documents onto the previous snapshot.
///
/// `results[i]` is the fetch result for `adapters[i]`. Adapters run in
/// parallel; fragments are applied in adapter order onto a copy of
/// `previous` restricted to `stops`. A failed or unusable source leaves its
/// previous value in place.
pub fn assemble(
    previous: &Snapshot,
    stops: &[String],
    adapters: &[Box<dyn SourceAdapter>],
    results: &[Result<Value>],
    now: &DateTime<Tz>,
) -> (Snapshot, Vec<SourceOutcome>) {
    let adapted: Vec<_> = adapters
        .par_iter()
        .zip(results.par_iter())
        .map(|(adapter, result)| {
            let fragment = adapter.transform(result.as_ref().ok(), now);
            (adapter.name(), result, fragment)
        })
        .collect();

    let mut snapshot = previous.carry_forward(stops);
    let mut outcomes = Vec::with_capacity(adapted.len());

    for (source, result, fragment) in adapted {
        let status = match (result, fragment) {
            (Err(e), _) => SourceStatus::Failed(e.to_string()),
            (Ok(_), None) => SourceStatus::Unusable,
            (Ok(_), Some(fragment)) => {
                snapshot.apply(fragment);
                SourceStatus::Updated
            }
        };
        outcomes.push(SourceOutcome {
            source: source.to_string(),
            status,
        });
    }

    (snapshot, outcomes)
}

/// Owns the adapters for one subscription and is the only writer of its store
pub struct Coordinator {
    registry: AdapterRegistry,
    stops: Vec<String>,
    fetcher: HttpFetcher,
    clock: Arc<dyn Clock>,
    tz: Tz,
    interval: Duration,
    store: Arc<SnapshotStore>,
    phase: AtomicU8,
    cycle_guard: Mutex<()>,
    shutdown: CancellationToken,
}

impl Coordinator {
    pub fn new(
        endpoints: &Endpoints,
        subscription: &SubscriptionList,
        fetcher: HttpFetcher,
        clock: Arc<dyn Clock>,
        tz: Tz,
    ) -> Self {
        let stops = subscription.unique();
        let registry = AdapterRegistry::new(endpoints, &stops);
        let seeded = Snapshot::seeded(registry.currency_codes().iter().cloned(), &stops);

        Self {
            registry,
            stops,
            fetcher,
            clock,
            tz,
            interval: DEFAULT_INTERVAL,
            store: Arc::new(SnapshotStore::new(seeded)),
            phase: AtomicU8::new(CyclePhase::Idle as u8),
            cycle_guard: Mutex::new(()),
            shutdown: CancellationToken::new(),
        }
    }

    /// Build from validated settings with the wall clock
    pub fn from_settings(settings: &Settings, subscription: &SubscriptionList) -> Result<Self> {
        let fetcher = HttpFetcher::new(settings.request_timeout())?;
        let tz = settings.reference_tz()?;
        Ok(Self::new(
            &settings.endpoints,
            subscription,
            fetcher,
            Arc::new(SystemClock),
            tz,
        )
        .with_interval(settings.update_interval()))
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn store(&self) -> Arc<SnapshotStore> {
        Arc::clone(&self.store)
    }

    /// Deduplicated stops polled by this coordinator
    pub fn stops(&self) -> &[String] {
        &self.stops
    }

    pub fn phase(&self) -> CyclePhase {
        CyclePhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    fn enter(&self, phase: CyclePhase) {
        debug!(?phase, "cycle phase");
        self.phase.store(phase as u8, Ordering::Release);
    }

    /// Token cancelled by [`shutdown`](Self::shutdown)
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Tear the subscription down: an in-flight cycle is discarded and
    /// [`run`](Self::run) returns.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Run one cycle now. Waits for an in-flight cycle instead of overlapping it.
    pub async fn refresh(&self) -> Result<CycleReport> {
        let _guard = tokio::select! {
            biased;
            guard = self.cycle_guard.lock() => guard,
            _ = self.shutdown.cancelled() => return Err(NavajaError::Cancelled),
        };
        self.enter(CyclePhase::Idle);
        if self.shutdown.is_cancelled() {
            return Err(NavajaError::Cancelled);
        }

        self.enter(CyclePhase::Fetching);
        let adapters = self.registry.adapters();
        let fetches = adapters
            .iter()
            .map(|adapter| self.fetcher.fetch_json(adapter.url()));

        let results = tokio::select! {
            results = join_all(fetches) => results,
            _ = self.shutdown.cancelled() => {
                info!("refresh abandoned: subscription torn down");
                self.enter(CyclePhase::Idle);
                return Err(NavajaError::Cancelled);
            }
        };

        self.enter(CyclePhase::Merging);
        let now = self.clock.now().with_timezone(&self.tz);
        let previous = self.store.current();
        let (snapshot, outcomes) = assemble(&previous, &self.stops, adapters, &results, &now);

        if self.shutdown.is_cancelled() {
            self.enter(CyclePhase::Idle);
            return Err(NavajaError::Cancelled);
        }
        self.store.publish(snapshot);
        self.enter(CyclePhase::Published);

        let report = CycleReport {
            outcomes,
            published: self.store.generation(),
        };
        for outcome in report.failures() {
            warn!(source = %outcome.source, "{}", outcome);
        }
        info!(
            generation = report.published,
            updated = report.updated(),
            sources = report.outcomes.len(),
            "snapshot published"
        );
        Ok(report)
    }

    /// Refresh on a fixed interval until shutdown. The first cycle runs
    /// immediately; a slow cycle delays the next tick rather than stacking.
    pub async fn run<F>(&self, mut on_cycle: F)
    where
        F: FnMut(&CycleReport, &Snapshot),
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            interval_secs = self.interval.as_secs(),
            stops = ?self.stops,
            "coordinator started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = self.shutdown.cancelled() => break,
            }
            match self.refresh().await {
                Ok(report) => {
                    let snapshot = self.store.current();
                    on_cycle(&report, snapshot.as_ref());
                }
                Err(NavajaError::Cancelled) => break,
                Err(e) => warn!(error = %e, "refresh failed"),
            }
        }
        info!("coordinator stopped");
    }
}
