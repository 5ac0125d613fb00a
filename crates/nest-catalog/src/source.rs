use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use nest_alloc::Instrument;

// ---------------------------------------------------------------------------
// Source trait
// ---------------------------------------------------------------------------

/// Upstream instrument feed.
///
/// Held as `Arc<dyn InstrumentSource>` by the catalog, so implementations
/// must be object-safe and `Send + Sync`.
#[async_trait::async_trait]
pub trait InstrumentSource: Send + Sync {
    /// Short label recorded on every snapshot built from this source.
    fn name(&self) -> &str;

    /// Full instrument universe. Partial results are not a thing: either the
    /// whole list or an error.
    async fn fetch(&self) -> Result<Vec<Instrument>>;
}

// ---------------------------------------------------------------------------
// JSON file
// ---------------------------------------------------------------------------

/// Reads a JSON array of instruments from disk on every fetch.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl InstrumentSource for JsonFileSource {
    fn name(&self) -> &str {
        "json-file"
    }

    async fn fetch(&self) -> Result<Vec<Instrument>> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("read catalog file failed: {}", self.path.display()))?;
        parse_instruments(&bytes)
            .with_context(|| format!("parse catalog file failed: {}", self.path.display()))
    }
}

/// Decode a JSON array of instruments.
pub fn parse_instruments(bytes: &[u8]) -> Result<Vec<Instrument>> {
    let list: Vec<Instrument> =
        serde_json::from_slice(bytes).context("expected a JSON array of instruments")?;
    Ok(list)
}

// ---------------------------------------------------------------------------
// Static
// ---------------------------------------------------------------------------

/// Fixed in-memory list.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    instruments: Vec<Instrument>,
}

impl StaticSource {
    pub fn new(instruments: Vec<Instrument>) -> Self {
        Self { instruments }
    }
}

#[async_trait::async_trait]
impl InstrumentSource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch(&self) -> Result<Vec<Instrument>> {
        Ok(self.instruments.clone())
    }
}
