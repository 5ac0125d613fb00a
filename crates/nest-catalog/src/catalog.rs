use std::collections::BTreeSet;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use nest_alloc::Instrument;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::source::InstrumentSource;

/// Refresh window after which a snapshot is considered stale.
pub const DEFAULT_TTL: Duration = Duration::from_secs(6 * 60 * 60);

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Immutable, fully built view of the instrument universe.
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    pub instruments: Arc<[Instrument]>,
    pub built_at: DateTime<Utc>,
    pub source: String,
}

impl CatalogSnapshot {
    pub fn new(instruments: Vec<Instrument>, built_at: DateTime<Utc>, source: &str) -> Self {
        Self {
            instruments: instruments.into(),
            built_at,
            source: source.to_string(),
        }
    }

    /// Placeholder published before the first successful refresh.
    pub fn empty() -> Self {
        Self::new(Vec::new(), DateTime::<Utc>::MIN_UTC, "empty")
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    /// An empty snapshot is always stale.
    pub fn is_stale(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        if self.is_empty() {
            return true;
        }
        match chrono::Duration::from_std(ttl) {
            Ok(ttl) => now.signed_duration_since(self.built_at) > ttl,
            Err(_) => false,
        }
    }

    /// Candidates matching `query`, in snapshot order.
    pub fn list(&self, query: &CandidateQuery) -> Vec<Instrument> {
        self.instruments
            .iter()
            .filter(|i| query.matches(i))
            .cloned()
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

/// Filter for [`Catalog::list`]. The default matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateQuery {
    /// Exact category labels; empty means no category filter.
    pub categories: Vec<String>,
    pub exclude_ids: BTreeSet<u64>,
    /// Hard volatility ceiling. Instruments without a volatility figure pass.
    pub max_volatility: Option<f64>,
}

impl CandidateQuery {
    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn excluding<I: IntoIterator<Item = u64>>(mut self, ids: I) -> Self {
        self.exclude_ids.extend(ids);
        self
    }

    pub fn with_max_volatility(mut self, ceiling: f64) -> Self {
        self.max_volatility = Some(ceiling);
        self
    }

    pub fn matches(&self, instrument: &Instrument) -> bool {
        if !self.categories.is_empty() && !self.categories.iter().any(|c| *c == instrument.category)
        {
            return false;
        }
        if self.exclude_ids.contains(&instrument.id) {
            return false;
        }
        match (self.max_volatility, instrument.metrics.volatility) {
            (Some(ceiling), Some(vol)) => vol <= ceiling,
            _ => true,
        }
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// A new snapshot was published.
    Swapped { count: usize },
    /// The fetch failed or came back empty; readers keep the previous snapshot.
    Retained { error: String },
}

impl RefreshOutcome {
    pub fn is_swapped(&self) -> bool {
        matches!(self, RefreshOutcome::Swapped { .. })
    }
}

/// Shared instrument catalog with build-then-swap refresh.
///
/// Readers take an `Arc` to the current snapshot and never hold the lock
/// while working with it. A refresh builds the complete replacement off to
/// the side and publishes it with a single pointer write, so any reader sees
/// either the whole old universe or the whole new one.
pub struct Catalog {
    current: RwLock<Arc<CatalogSnapshot>>,
    source: Arc<dyn InstrumentSource>,
}

impl Catalog {
    pub fn new(source: Arc<dyn InstrumentSource>) -> Self {
        Self {
            current: RwLock::new(Arc::new(CatalogSnapshot::empty())),
            source,
        }
    }

    /// Construct and run one refresh. A failed first fetch still yields a
    /// catalog (empty) together with the outcome.
    pub async fn load(source: Arc<dyn InstrumentSource>) -> (Self, RefreshOutcome) {
        let catalog = Self::new(source);
        let outcome = catalog.refresh().await;
        (catalog, outcome)
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        // A poisoned lock still holds a complete snapshot.
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&*guard)
    }

    pub async fn refresh(&self) -> RefreshOutcome {
        self.refresh_at(Utc::now()).await
    }

    /// Refresh stamping the new snapshot with `now`.
    pub async fn refresh_at(&self, now: DateTime<Utc>) -> RefreshOutcome {
        let name = self.source.name();
        let fetched = match self.source.fetch().await {
            Ok(list) if list.is_empty() => Err("source returned no instruments".to_string()),
            Ok(list) => Ok(list),
            Err(e) => Err(format!("{e:#}")),
        };

        match fetched {
            Ok(list) => {
                let next = Arc::new(CatalogSnapshot::new(list, now, name));
                let count = next.len();
                self.publish(next);
                info!(source = name, count, "catalog snapshot swapped");
                RefreshOutcome::Swapped { count }
            }
            Err(error) => {
                let kept = self.snapshot().len();
                warn!(source = name, kept, %error, "catalog refresh failed; retaining previous snapshot");
                RefreshOutcome::Retained { error }
            }
        }
    }

    fn publish(&self, next: Arc<CatalogSnapshot>) {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        *guard = next;
    }

    pub fn is_stale(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        self.snapshot().is_stale(now, ttl)
    }

    /// Candidates from the current snapshot.
    pub fn list(&self, query: &CandidateQuery) -> Vec<Instrument> {
        self.snapshot().list(query)
    }
}

/// Refresh `catalog` every `interval`, starting immediately.
pub fn spawn_refresh_loop(catalog: Arc<Catalog>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            catalog.refresh().await;
        }
    })
}
