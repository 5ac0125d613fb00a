//! Typed view over the merged config.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use nest_alloc::{AssetClass, OptimizerTables, PersonaId, PersonaTable, Registry};

use crate::{load_with_defaults, LoadedConfig};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogSettings {
    pub refresh_interval_secs: u64,
    pub snapshot_path: String,
}

impl CatalogSettings {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub config_hash: String,
    pub registry: Registry,
    pub catalog: CatalogSettings,
}

#[derive(Deserialize)]
struct RawConfig {
    registry_version: String,
    catalog: CatalogSettings,
    registry: RawRegistry,
}

#[derive(Deserialize)]
struct RawRegistry {
    categories: BTreeMap<String, AssetClass>,
    volatility_ceilings: BTreeMap<AssetClass, f64>,
    personas: PersonaTable,
    optimizer: OptimizerTables,
}

impl EngineConfig {
    /// Deserialize and validate. Unknown asset-class names and missing
    /// personas surface here as errors.
    pub fn from_loaded(loaded: &LoadedConfig) -> Result<Self> {
        let raw: RawConfig = serde_json::from_value(loaded.config_json.clone())
            .context("CONFIG_INVALID: engine config does not match the expected shape")?;

        let registry = Registry {
            version: raw.registry_version,
            categories: raw.registry.categories,
            volatility_ceilings: raw.registry.volatility_ceilings,
            personas: raw.registry.personas,
            optimizer: raw.registry.optimizer,
        };
        validate_registry(&registry)?;

        if raw.catalog.refresh_interval_secs == 0 {
            bail!("CONFIG_INVALID: catalog.refresh_interval_secs must be > 0");
        }

        Ok(Self {
            config_hash: loaded.config_hash.clone(),
            registry,
            catalog: raw.catalog,
        })
    }
}

/// Embedded defaults layered with `overlay_paths`, then typed.
pub fn load_engine_config(overlay_paths: &[&str]) -> Result<EngineConfig> {
    let loaded = load_with_defaults(overlay_paths)?;
    EngineConfig::from_loaded(&loaded)
}

fn validate_registry(registry: &Registry) -> Result<()> {
    for (class, ceiling) in &registry.volatility_ceilings {
        if !(*ceiling > 0.0) {
            bail!("CONFIG_INVALID: volatility ceiling for {class} must be > 0 (got {ceiling})");
        }
    }

    for (category, class) in &registry.optimizer.categories {
        if !matches!(class, AssetClass::Equity | AssetClass::Debt | AssetClass::Hybrid) {
            bail!(
                "CONFIG_INVALID: optimizer category '{category}' maps to {class}; \
                 expected equity | debt | hybrid"
            );
        }
    }

    for id in PersonaId::ALL {
        let p = registry.persona(id);
        for (class, w) in p.allocation.iter() {
            if !(0.0..=1.0).contains(&w) {
                bail!("CONFIG_INVALID: persona {id} allocation for {class} out of [0, 1]: {w}");
            }
        }
        if !(p.max_volatility > 0.0) {
            bail!("CONFIG_INVALID: persona {id} max_volatility must be > 0");
        }
        let o = &p.optimizer;
        if !(0.0..=1.0).contains(&o.max_equity) || !(0.0..=1.0).contains(&o.min_debt) {
            bail!("CONFIG_INVALID: persona {id} optimizer bounds must be fractions in [0, 1]");
        }
    }
    Ok(())
}
