//! Command handler modules for nest-cli.
//!
//! Shared utilities used by multiple command paths live here.
//! Catalog-backed commands live in the submodules.

pub mod optimize;
pub mod recommend;

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use nest_alloc::{
    apportion_slots, parse_allocation, AllocationVector, Instrument, PersonaBlend, PersonaId,
    RegistryBlend,
};
use nest_catalog::{CandidateQuery, Catalog, JsonFileSource, RefreshOutcome};
use nest_config::{report_unused_keys, EngineConfig, UnusedKeyPolicy};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::CatalogArgs;

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Print `value` as pretty JSON on stdout.
pub fn emit<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("serialize output json failed")?;
    println!("{out}");
    Ok(())
}

/// Embedded defaults + `--config` overlays, typed. Keys nothing reads are
/// logged, not fatal.
pub fn load_engine(config_paths: &[String]) -> Result<EngineConfig> {
    let refs: Vec<&str> = config_paths.iter().map(|s| s.as_str()).collect();
    let loaded = nest_config::load_with_defaults(&refs)?;

    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)?;
    for pointer in &report.unused_leaf_pointers {
        warn!(%pointer, "config key is not consumed by any component");
    }

    let cfg = EngineConfig::from_loaded(&loaded)?;
    info!(
        config_hash = %cfg.config_hash,
        registry_version = %cfg.registry.version,
        "config loaded"
    );
    Ok(cfg)
}

/// Parse a `--target` style vector.
pub fn parse_target(raw: &str) -> Result<AllocationVector> {
    parse_allocation(raw).map_err(|e| anyhow!("invalid target vector '{raw}': {e}"))
}

/// Parse `slug=weight` pairs. Unlike `--persona`, unknown slugs here are an
/// error: silently folding them into the fallback would distort the blend.
pub fn parse_persona_weights(raw: &str) -> Result<BTreeMap<PersonaId, f64>> {
    let mut out = BTreeMap::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (slug, w) = part
            .split_once('=')
            .with_context(|| format!("expected persona=weight, got '{part}'"))?;
        let id = PersonaId::from_slug(slug.trim()).with_context(|| {
            format!(
                "unknown persona '{}'. expected one of: capital-guardian | balanced-voyager | accelerated-builder",
                slug.trim()
            )
        })?;
        let w: f64 = w
            .trim()
            .parse()
            .with_context(|| format!("invalid weight in '{part}'"))?;
        *out.entry(id).or_insert(0.0) += w;
    }
    if out.is_empty() {
        bail!("--weights is empty");
    }
    Ok(out)
}

/// Resolve `--persona`, warning when the slug is unknown.
pub fn resolve_persona(slug: &str) -> PersonaId {
    let r = PersonaId::resolve(slug);
    if r.fell_back {
        warn!(slug, fallback = %r.id, "unknown persona; using fallback");
    }
    r.id
}

/// `--catalog` when given, else `catalog.snapshot_path` from config.
pub fn catalog_source(cfg: &EngineConfig, args: &CatalogArgs) -> JsonFileSource {
    JsonFileSource::new(
        args.catalog
            .as_deref()
            .unwrap_or(cfg.catalog.snapshot_path.as_str()),
    )
}

/// Load the catalog once and return the filtered candidates.
pub async fn load_candidates(cfg: &EngineConfig, args: &CatalogArgs) -> Result<Vec<Instrument>> {
    let source = catalog_source(cfg, args);
    let path = source.path().display().to_string();

    let (catalog, outcome) = Catalog::load(Arc::new(source)).await;
    if let RefreshOutcome::Retained { error } = outcome {
        bail!("catalog load failed ({path}): {error}");
    }

    let query = CandidateQuery::default()
        .with_categories(args.categories.iter().cloned())
        .excluding(args.exclude.iter().copied());
    let candidates = catalog.list(&query);
    info!(
        catalog = %path,
        total = catalog.snapshot().len(),
        candidates = candidates.len(),
        "candidates selected"
    );
    Ok(candidates)
}

// ---------------------------------------------------------------------------
// Catalog-free commands
// ---------------------------------------------------------------------------

pub fn config_hash(paths: &[String]) -> Result<()> {
    let refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
    let loaded = nest_config::load_with_defaults(&refs)?;
    let canonical: Value =
        serde_json::from_str(&loaded.canonical_json).context("canonical json reparse failed")?;
    emit(&json!({
        "config_hash": loaded.config_hash,
        "config": canonical,
    }))
}

pub fn apportion(target: &str, slots: usize) -> Result<()> {
    let target = parse_target(target)?;
    let plan = apportion_slots(&target, slots);
    info!(slots, classes = plan.len(), "apportioned");
    emit(&json!({
        "total_slots": slots,
        "assigned": plan.values().sum::<usize>(),
        "plan": plan,
    }))
}

pub fn blend(cfg: &EngineConfig, weights: &str) -> Result<()> {
    let weights = parse_persona_weights(weights)?;
    let result = RegistryBlend::new(&cfg.registry).compute(&weights);
    emit(&result)
}
