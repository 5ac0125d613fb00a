//! Periodic refresh task
//!
//! GREEN when:
//! - The loop refreshes immediately and then once per elapsed interval.
//! - Upstream changes show up after the next tick, not before.
//! - Aborting the handle stops further refreshes.
//!
//! The clock is paused; time only moves through `tokio::time::advance`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use nest_alloc::Instrument;
use nest_catalog::{spawn_refresh_loop, Catalog, InstrumentSource};

const INTERVAL: Duration = Duration::from_secs(60);

struct Counting {
    calls: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl InstrumentSource for Counting {
    fn name(&self) -> &str {
        "counting"
    }

    async fn fetch(&self) -> Result<Vec<Instrument>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![Instrument::new(1, "One", "Liquid")])
    }
}

/// Upstream whose universe the test rewrites between ticks.
struct Swappable {
    list: Arc<Mutex<Vec<Instrument>>>,
}

#[async_trait::async_trait]
impl InstrumentSource for Swappable {
    fn name(&self) -> &str {
        "swappable"
    }

    async fn fetch(&self) -> Result<Vec<Instrument>> {
        Ok(self.list.lock().unwrap().clone())
    }
}

/// Let spawned tasks run whatever is ready at the current instant.
async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn loop_ticks_per_interval_until_aborted() {
    let calls = Arc::new(AtomicUsize::new(0));
    let catalog = Arc::new(Catalog::new(Arc::new(Counting {
        calls: Arc::clone(&calls),
    })));

    let handle = spawn_refresh_loop(Arc::clone(&catalog), INTERVAL);
    settle().await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(catalog.snapshot().len(), 1);

    tokio::time::advance(INTERVAL).await;
    settle().await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    tokio::time::advance(INTERVAL - Duration::from_secs(1)).await;
    settle().await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    handle.abort();
    let _ = handle.await;

    tokio::time::advance(INTERVAL * 10).await;
    settle().await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn upstream_change_lands_on_next_tick() {
    let list = Arc::new(Mutex::new(vec![Instrument::new(1, "Alpha", "Large Cap")]));
    let catalog = Arc::new(Catalog::new(Arc::new(Swappable {
        list: Arc::clone(&list),
    })));

    let handle = spawn_refresh_loop(Arc::clone(&catalog), INTERVAL);
    settle().await;
    assert_eq!(catalog.snapshot().len(), 1);

    list.lock()
        .unwrap()
        .push(Instrument::new(2, "Beta", "Gold"));
    settle().await;
    assert_eq!(catalog.snapshot().len(), 1);

    tokio::time::advance(INTERVAL).await;
    settle().await;
    handle.abort();

    let snap = catalog.snapshot();
    assert_eq!(snap.len(), 2);
    assert_eq!(snap.source, "swappable");
}
