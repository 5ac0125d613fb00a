use anyhow::{bail, Result};
use clap::Args;
use nest_alloc::{optimize, InvestorProfile, OptimizationConstraints, OptimizationResult};
use nest_config::EngineConfig;
use serde::Serialize;
use tracing::{info, warn};

use super::{emit, load_candidates, resolve_persona};
use crate::CatalogArgs;

/// Optimizer bounds; unset flags keep the library defaults.
#[derive(Args, Debug, Clone, Default)]
pub struct ConstraintArgs {
    /// Equity ceiling, percent
    #[arg(long)]
    pub max_equity_pct: Option<f64>,

    /// Debt floor, percent
    #[arg(long)]
    pub min_debt_pct: Option<f64>,

    /// Cap on any single fund, percent
    #[arg(long)]
    pub max_single_pct: Option<f64>,

    #[arg(long)]
    pub min_funds: Option<usize>,

    #[arg(long)]
    pub max_funds: Option<usize>,
}

impl ConstraintArgs {
    pub fn to_constraints(&self) -> Result<OptimizationConstraints> {
        let mut c = OptimizationConstraints::default();
        if let Some(v) = self.max_equity_pct {
            c.max_equity_pct = v;
        }
        if let Some(v) = self.min_debt_pct {
            c.min_debt_pct = v;
        }
        if let Some(v) = self.max_single_pct {
            c.max_single_fund_pct = v;
        }
        if let Some(v) = self.min_funds {
            c.min_funds = v;
        }
        if let Some(v) = self.max_funds {
            c.max_funds = v;
        }

        for (flag, pct) in [
            ("--max-equity-pct", c.max_equity_pct),
            ("--min-debt-pct", c.min_debt_pct),
            ("--max-single-pct", c.max_single_fund_pct),
        ] {
            if !(0.0..=100.0).contains(&pct) {
                bail!("{flag} must be within 0..=100 (got {pct})");
            }
        }
        if c.max_funds == 0 {
            bail!("--max-funds must be > 0");
        }
        Ok(c)
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct ProfileArgs {
    /// Monthly contribution; also sets per-line amounts
    #[arg(long)]
    pub monthly: Option<f64>,

    #[arg(long)]
    pub lump_sum: Option<f64>,

    #[arg(long)]
    pub horizon_years: Option<u32>,
}

impl ProfileArgs {
    pub fn to_profile(&self) -> InvestorProfile {
        InvestorProfile {
            monthly_contribution: self.monthly,
            lump_sum: self.lump_sum,
            horizon_years: self.horizon_years,
        }
    }
}

#[derive(Serialize)]
struct OptimizeOutput<'a> {
    config_hash: &'a str,
    #[serde(flatten)]
    result: OptimizationResult,
}

/// Execute `nest optimize`.
pub async fn run(
    cfg: &EngineConfig,
    catalog: &CatalogArgs,
    persona: &str,
    constraints: &ConstraintArgs,
    profile: &ProfileArgs,
) -> Result<()> {
    let id = resolve_persona(persona);
    let constraints = constraints.to_constraints()?;
    let candidates = load_candidates(cfg, catalog).await?;

    let result = optimize(
        &cfg.registry,
        id,
        &constraints,
        &profile.to_profile(),
        &candidates,
    );
    for class in &result.dropped_classes {
        warn!(
            %class,
            "sleeve has a target but no candidates; its share is dropped and the remaining sleeves renormalized"
        );
    }
    info!(
        persona = %id,
        funds = result.allocation.len(),
        expected_return = result.metrics.expected_return,
        "optimized"
    );

    emit(&OptimizeOutput {
        config_hash: &cfg.config_hash,
        result,
    })
}
