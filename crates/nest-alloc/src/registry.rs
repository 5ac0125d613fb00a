//! nest-alloc: registry
//!
//! Typed lookup tables consumed by scoring, apportionment and the optimizer:
//! category → asset class, per-class volatility ceilings, persona profiles.
//!
//! The tables are data. `Registry::builtin()` carries the shipped values;
//! deployments override them through nest-config (YAML), which deserializes
//! straight into these types so an unknown asset class or a missing persona
//! is rejected at load time rather than discovered during a request.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{AllocationVector, AssetClass, Instrument};

/// Ceiling applied when a class has no configured volatility limit.
pub const DEFAULT_VOLATILITY_CEILING: f64 = 30.0;

// ─── PersonaId ───────────────────────────────────────────────────────────────

/// Investor risk archetype.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PersonaId {
    CapitalGuardian,
    BalancedVoyager,
    AcceleratedBuilder,
}

impl PersonaId {
    pub const ALL: [PersonaId; 3] = [
        PersonaId::CapitalGuardian,
        PersonaId::BalancedVoyager,
        PersonaId::AcceleratedBuilder,
    ];

    /// Persona used when a slug is not recognised.
    pub const FALLBACK: PersonaId = PersonaId::BalancedVoyager;

    pub fn slug(&self) -> &'static str {
        match self {
            PersonaId::CapitalGuardian => "capital-guardian",
            PersonaId::BalancedVoyager => "balanced-voyager",
            PersonaId::AcceleratedBuilder => "accelerated-builder",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        match slug.trim().to_ascii_lowercase().as_str() {
            "capital-guardian" => Some(PersonaId::CapitalGuardian),
            "balanced-voyager" => Some(PersonaId::BalancedVoyager),
            "accelerated-builder" => Some(PersonaId::AcceleratedBuilder),
            _ => None,
        }
    }

    /// Resolve a slug, substituting [`PersonaId::FALLBACK`] for unknown input.
    pub fn resolve(slug: &str) -> PersonaResolution {
        match Self::from_slug(slug) {
            Some(id) => PersonaResolution {
                id,
                fell_back: false,
            },
            None => PersonaResolution {
                id: Self::FALLBACK,
                fell_back: true,
            },
        }
    }
}

impl fmt::Display for PersonaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Outcome of [`PersonaId::resolve`]; `fell_back` is set when the input slug
/// was unknown so callers can surface it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PersonaResolution {
    pub id: PersonaId,
    pub fell_back: bool,
}

// ─── PersonaProfile ──────────────────────────────────────────────────────────

/// Bounds the persona-direct optimizer starts from (fractions of 1.0).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OptimizerDefaults {
    pub max_equity: f64,
    pub min_debt: f64,
    pub target_volatility: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PersonaProfile {
    pub name: String,
    pub risk_band: String,
    /// Strategic allocation used when blending personas.
    pub allocation: AllocationVector,
    /// Ordered best-first; rank feeds the category bonus.
    pub preferred_categories: Vec<String>,
    /// Hard volatility ceiling (percent) for single-persona recommendations.
    pub max_volatility: f64,
    pub optimizer: OptimizerDefaults,
}

/// One profile per persona. A struct rather than a map so completeness is
/// guaranteed by construction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PersonaTable {
    pub capital_guardian: PersonaProfile,
    pub balanced_voyager: PersonaProfile,
    pub accelerated_builder: PersonaProfile,
}

impl PersonaTable {
    pub fn get(&self, id: PersonaId) -> &PersonaProfile {
        match id {
            PersonaId::CapitalGuardian => &self.capital_guardian,
            PersonaId::BalancedVoyager => &self.balanced_voyager,
            PersonaId::AcceleratedBuilder => &self.accelerated_builder,
        }
    }
}

// ─── Optimizer tables ────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OptimizerTables {
    /// Category → sleeve. Only equity, debt and hybrid are meaningful here.
    pub categories: BTreeMap<String, AssetClass>,
    /// Annual, as a fraction.
    pub risk_free_rate: f64,
    pub model_version: String,
}

// ─── Registry ────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Registry {
    pub version: String,
    /// Category label → asset class for the blended path.
    pub categories: BTreeMap<String, AssetClass>,
    /// Percent annualized volatility allowed per asset class.
    pub volatility_ceilings: BTreeMap<AssetClass, f64>,
    pub personas: PersonaTable,
    pub optimizer: OptimizerTables,
}

impl Registry {
    /// Asset class for an instrument: explicit override, then the category
    /// table, then equity.
    pub fn classify(&self, instrument: &Instrument) -> AssetClass {
        instrument
            .asset_class
            .or_else(|| self.categories.get(&instrument.category).copied())
            .unwrap_or(AssetClass::Equity)
    }

    pub fn volatility_ceiling(&self, class: AssetClass) -> f64 {
        self.volatility_ceilings
            .get(&class)
            .copied()
            .unwrap_or(DEFAULT_VOLATILITY_CEILING)
    }

    pub fn persona(&self, id: PersonaId) -> &PersonaProfile {
        self.personas.get(id)
    }

    /// Optimizer sleeve for a category; anything that is not debt or hybrid
    /// is treated as equity.
    pub fn optimizer_class(&self, category: &str) -> AssetClass {
        match self.optimizer.categories.get(category) {
            Some(AssetClass::Debt) => AssetClass::Debt,
            Some(AssetClass::Hybrid) => AssetClass::Hybrid,
            _ => AssetClass::Equity,
        }
    }

    /// Shipped defaults.
    pub fn builtin() -> Self {
        use AssetClass::*;

        let categories = [
            ("Large Cap", Equity),
            ("Mid Cap", Equity),
            ("Small Cap", Equity),
            ("Flexi Cap", Equity),
            ("Large & Mid Cap", Equity),
            ("Multi Cap", Equity),
            ("Focused", Equity),
            ("ELSS", Equity),
            ("Sectoral", Equity),
            ("Thematic", Equity),
            ("Index", Equity),
            ("Contra", Equity),
            ("Value", Equity),
            ("Dividend Yield", Equity),
            ("Equity Scheme - Sectoral/ Thematic", Equity),
            ("Liquid", Liquid),
            ("Overnight", Liquid),
            ("Ultra Short Duration", Debt),
            ("Income", Debt),
            ("Low Duration", Debt),
            ("Short Duration", Debt),
            ("Medium Duration", Debt),
            ("Medium to Long Duration", Debt),
            ("Long Duration", Debt),
            ("Dynamic Bond", Debt),
            ("Corporate Bond", Debt),
            ("Credit Risk", Debt),
            ("Banking & PSU", Debt),
            ("Gilt", Debt),
            ("Floater", Debt),
            ("Balanced Advantage", Hybrid),
            ("Aggressive Hybrid", Hybrid),
            ("Conservative Hybrid", Hybrid),
            ("Multi Asset", Hybrid),
            ("Equity Savings", Hybrid),
            ("Arbitrage", Hybrid),
            ("Gold", Gold),
            ("Gold ETF", Gold),
            ("International", International),
            ("FOF - International", International),
        ];

        let optimizer_categories = [
            ("Large Cap", Equity),
            ("Mid Cap", Equity),
            ("Small Cap", Equity),
            ("Flexi Cap", Equity),
            ("Multi Cap", Equity),
            ("ELSS", Equity),
            ("Focused", Equity),
            ("Value", Equity),
            ("Contra", Equity),
            ("Dividend Yield", Equity),
            ("Sectoral", Equity),
            ("Thematic", Equity),
            ("Liquid", Debt),
            ("Ultra Short Duration", Debt),
            ("Low Duration", Debt),
            ("Money Market", Debt),
            ("Short Duration", Debt),
            ("Medium Duration", Debt),
            ("Corporate Bond", Debt),
            ("Banking and PSU", Debt),
            ("Gilt", Debt),
            ("Dynamic Bond", Debt),
            ("Credit Risk", Debt),
            ("Aggressive Hybrid", Hybrid),
            ("Conservative Hybrid", Hybrid),
            ("Balanced Advantage", Hybrid),
            ("Multi Asset Allocation", Hybrid),
            ("Equity Savings", Hybrid),
            ("Arbitrage", Hybrid),
        ];

        let volatility_ceilings = [
            (Equity, 30.0),
            (Debt, 5.0),
            (Hybrid, 15.0),
            (Gold, 20.0),
            (International, 25.0),
            (Liquid, 1.0),
        ];

        Self {
            version: "2".to_string(),
            categories: to_table(&categories),
            volatility_ceilings: volatility_ceilings.into_iter().collect(),
            personas: PersonaTable {
                capital_guardian: PersonaProfile {
                    name: "Capital Guardian".to_string(),
                    risk_band: "Capital Protection".to_string(),
                    allocation: AllocationVector::from_pairs([
                        (Equity, 0.15),
                        (Debt, 0.55),
                        (Hybrid, 0.15),
                        (Gold, 0.05),
                        (International, 0.00),
                        (Liquid, 0.10),
                    ]),
                    preferred_categories: strings(&[
                        "Liquid",
                        "Corporate Bond",
                        "Short Duration",
                        "Balanced Advantage",
                        "Large Cap",
                    ]),
                    max_volatility: 10.0,
                    optimizer: OptimizerDefaults {
                        max_equity: 0.35,
                        min_debt: 0.50,
                        target_volatility: 0.08,
                    },
                },
                balanced_voyager: PersonaProfile {
                    name: "Balanced Voyager".to_string(),
                    risk_band: "Balanced Growth".to_string(),
                    allocation: AllocationVector::from_pairs([
                        (Equity, 0.40),
                        (Debt, 0.30),
                        (Hybrid, 0.15),
                        (Gold, 0.05),
                        (International, 0.05),
                        (Liquid, 0.05),
                    ]),
                    preferred_categories: strings(&[
                        "Flexi Cap",
                        "Large & Mid Cap",
                        "Large Cap",
                        "Balanced Advantage",
                        "Corporate Bond",
                    ]),
                    max_volatility: 18.0,
                    optimizer: OptimizerDefaults {
                        max_equity: 0.65,
                        min_debt: 0.25,
                        target_volatility: 0.12,
                    },
                },
                accelerated_builder: PersonaProfile {
                    name: "Accelerated Builder".to_string(),
                    risk_band: "Accelerated Growth".to_string(),
                    allocation: AllocationVector::from_pairs([
                        (Equity, 0.65),
                        (Debt, 0.10),
                        (Hybrid, 0.10),
                        (Gold, 0.00),
                        (International, 0.10),
                        (Liquid, 0.05),
                    ]),
                    preferred_categories: strings(&[
                        "Small Cap",
                        "Mid Cap",
                        "Flexi Cap",
                        "Large & Mid Cap",
                        "Sectoral",
                    ]),
                    max_volatility: 30.0,
                    optimizer: OptimizerDefaults {
                        max_equity: 0.90,
                        min_debt: 0.05,
                        target_volatility: 0.18,
                    },
                },
            },
            optimizer: OptimizerTables {
                categories: to_table(&optimizer_categories),
                risk_free_rate: 0.065,
                model_version: "mvo-v1".to_string(),
            },
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn to_table(pairs: &[(&str, AssetClass)]) -> BTreeMap<String, AssetClass> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
