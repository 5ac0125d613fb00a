//! nest-alloc: persona-direct optimizer
//!
//! A rule-driven equity/debt/hybrid split, not a mean-variance solver. There
//! is no covariance matrix; "risk" is a weighted average of per-instrument
//! volatility.
//!
//! Steps:
//! 1. Bounds: `max_equity = min(constraint, persona)`,
//!    `min_debt = max(constraint, persona)`, hybrid takes the rest. A negative
//!    hybrid share is resolved by shrinking equity to `1 − min_debt`.
//! 2. Partition candidates into the three sleeves via the optimizer category
//!    table and rank each sleeve with the optimizer score profile.
//! 3. Per sleeve with a positive target and at least one candidate:
//!    `count = max(1, floor(max_funds × target / Σtargets))`, each pick
//!    weighted `min(target / count, max_single)`.
//! 4. Renormalize the picks to sum to 1. A sleeve with a positive target and
//!    no candidates is left out; its share is absorbed by the renormalization
//!    and the sleeve is listed in `dropped_classes`.

use serde::{Deserialize, Serialize};

use crate::distribute::renormalize;
use crate::projection::projected_value;
use crate::registry::{PersonaId, Registry};
use crate::scoring::rank_for_optimizer;
use crate::types::{round_to, Allocation, AllocationLine, AllocationVector, AssetClass, Instrument};

const SLEEVES: [AssetClass; 3] = [AssetClass::Equity, AssetClass::Debt, AssetClass::Hybrid];

/// Fallback return (percent) for an instrument with neither 3y nor 1y data.
const DEFAULT_RETURN_PCT: f64 = 10.0;
/// Fallback volatility (percent).
const DEFAULT_VOLATILITY_PCT: f64 = 15.0;
const MIN_VOLATILITY: f64 = 0.01;
const DRAWDOWN_MULTIPLIER: f64 = 2.5;
pub const DEFAULT_HORIZON_YEARS: u32 = 10;

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Caller constraints. Percentages are 0–100.
///
/// `min_funds`, `target_return` and `max_volatility` are accepted and carried
/// through but do not influence selection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizationConstraints {
    pub max_equity_pct: f64,
    pub min_debt_pct: f64,
    pub max_single_fund_pct: f64,
    pub min_funds: usize,
    pub max_funds: usize,
    pub target_return: Option<f64>,
    pub max_volatility: Option<f64>,
}

impl Default for OptimizationConstraints {
    fn default() -> Self {
        Self {
            max_equity_pct: 100.0,
            min_debt_pct: 0.0,
            max_single_fund_pct: 30.0,
            min_funds: 3,
            max_funds: 10,
            target_return: None,
            max_volatility: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvestorProfile {
    pub monthly_contribution: Option<f64>,
    pub lump_sum: Option<f64>,
    pub horizon_years: Option<u32>,
}

// ─── Outputs ─────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PortfolioMetrics {
    pub expected_return: f64,
    pub expected_volatility: f64,
    pub sharpe: f64,
    /// 2.5 × volatility. A rough proxy, not a historical figure.
    pub max_drawdown: f64,
    pub projected_value: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OptimizationResult {
    pub persona: PersonaId,
    /// Sleeve targets after bound resolution.
    pub targets: AllocationVector,
    /// Lines carry the monthly contribution in `amount` when one was given.
    pub allocation: Allocation,
    pub metrics: PortfolioMetrics,
    /// Sleeves with a positive target but no candidates.
    pub dropped_classes: Vec<AssetClass>,
    pub model_version: String,
}

// ─── Optimizer ───────────────────────────────────────────────────────────────

/// Resolve equity/debt/hybrid targets for a persona under `constraints`.
pub fn sleeve_targets(
    registry: &Registry,
    persona: PersonaId,
    constraints: &OptimizationConstraints,
) -> AllocationVector {
    let defaults = &registry.persona(persona).optimizer;
    let mut equity = (constraints.max_equity_pct / 100.0).min(defaults.max_equity);
    let debt = (constraints.min_debt_pct / 100.0).max(defaults.min_debt);
    let mut hybrid = 1.0 - equity - debt;
    if hybrid < 0.0 {
        equity = 1.0 - debt;
        hybrid = 0.0;
    }
    AllocationVector::from_pairs([
        (AssetClass::Equity, equity),
        (AssetClass::Debt, debt),
        (AssetClass::Hybrid, hybrid),
    ])
}

pub fn optimize(
    registry: &Registry,
    persona: PersonaId,
    constraints: &OptimizationConstraints,
    profile: &InvestorProfile,
    instruments: &[Instrument],
) -> OptimizationResult {
    let targets = sleeve_targets(registry, persona, constraints);
    let target_sum = targets.total();
    let max_single = constraints.max_single_fund_pct / 100.0;

    let mut lines = Vec::new();
    let mut dropped_classes = Vec::new();

    for sleeve in SLEEVES {
        let target = targets.get(sleeve);
        if target <= 0.0 {
            continue;
        }
        let members: Vec<Instrument> = instruments
            .iter()
            .filter(|i| registry.optimizer_class(&i.category) == sleeve)
            .cloned()
            .collect();
        if members.is_empty() {
            dropped_classes.push(sleeve);
            continue;
        }

        let count = ((constraints.max_funds as f64 * target / target_sum).floor() as usize).max(1);
        let weight = (target / count as f64).min(max_single);
        for pick in rank_for_optimizer(&members).into_iter().take(count) {
            lines.push(AllocationLine {
                instrument: pick.instrument,
                asset_class: sleeve,
                score: pick.score,
                weight,
                amount: None,
            });
        }
    }

    renormalize(&mut lines);
    if let Some(monthly) = profile.monthly_contribution {
        for l in &mut lines {
            l.amount = Some((monthly * l.weight).round());
        }
    }

    let allocation = Allocation { lines };
    let metrics = portfolio_metrics(&allocation, profile, registry.optimizer.risk_free_rate);

    OptimizationResult {
        persona,
        targets,
        allocation,
        metrics,
        dropped_classes,
        model_version: registry.optimizer.model_version.clone(),
    }
}

/// Weighted-average return and volatility of the allocation, the derived
/// Sharpe ratio and drawdown proxy, and the projected value of the profile's
/// contributions.
pub fn portfolio_metrics(
    allocation: &Allocation,
    profile: &InvestorProfile,
    risk_free_rate: f64,
) -> PortfolioMetrics {
    let mut expected_return = 0.0;
    let mut expected_volatility = 0.0;
    let total_weight = allocation.total_weight();

    for l in &allocation.lines {
        let m = &l.instrument.metrics;
        let ret = m.return_3y.or(m.return_1y).unwrap_or(DEFAULT_RETURN_PCT);
        let vol = m.volatility.unwrap_or(DEFAULT_VOLATILITY_PCT);
        expected_return += l.weight * ret / 100.0;
        expected_volatility += l.weight * vol / 100.0;
    }
    if total_weight > 0.0 {
        expected_return /= total_weight;
        expected_volatility /= total_weight;
    }

    let sharpe = (expected_return - risk_free_rate) / expected_volatility.max(MIN_VOLATILITY);
    let horizon = profile.horizon_years.unwrap_or(DEFAULT_HORIZON_YEARS);
    let projected = projected_value(
        profile.monthly_contribution.unwrap_or(0.0),
        profile.lump_sum.unwrap_or(0.0),
        expected_return,
        horizon,
    );

    PortfolioMetrics {
        expected_return: round_to(expected_return, 4),
        expected_volatility: round_to(expected_volatility, 4),
        sharpe: round_to(sharpe, 2),
        max_drawdown: round_to(expected_volatility * DRAWDOWN_MULTIPLIER, 4),
        projected_value: (projected > 0.0).then(|| projected.round()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::InstrumentMetrics;

    fn fund(id: u64, category: &str, r3: f64, vol: f64) -> Instrument {
        Instrument::new(id, format!("Fund {id}"), category).with_metrics(InstrumentMetrics {
            return_3y: Some(r3),
            volatility: Some(vol),
            ..Default::default()
        })
    }

    #[test]
    fn constraint_tightens_persona_bounds() {
        let reg = Registry::builtin();
        let c = OptimizationConstraints {
            max_equity_pct: 50.0,
            min_debt_pct: 40.0,
            ..Default::default()
        };
        let t = sleeve_targets(&reg, PersonaId::BalancedVoyager, &c);
        assert!((t.get(AssetClass::Equity) - 0.5).abs() < 1e-12);
        assert!((t.get(AssetClass::Debt) - 0.4).abs() < 1e-12);
        assert!((t.get(AssetClass::Hybrid) - 0.1).abs() < 1e-9);
    }

    #[test]
    fn negative_hybrid_shrinks_equity() {
        let reg = Registry::builtin();
        let c = OptimizationConstraints {
            min_debt_pct: 30.0,
            ..Default::default()
        };
        // builder: equity 0.9, debt max(0.3, 0.05) = 0.3 → hybrid −0.2.
        let t = sleeve_targets(&reg, PersonaId::AcceleratedBuilder, &c);
        assert!((t.get(AssetClass::Equity) - 0.7).abs() < 1e-12);
        assert_eq!(t.get(AssetClass::Hybrid), 0.0);
    }

    #[test]
    fn weights_sum_to_one_and_contributions_round() {
        let reg = Registry::builtin();
        let funds = vec![
            fund(1, "Flexi Cap", 20.0, 16.0),
            fund(2, "Large Cap", 14.0, 13.0),
            fund(3, "Corporate Bond", 7.5, 2.0),
            fund(4, "Balanced Advantage", 11.0, 9.0),
        ];
        let profile = InvestorProfile {
            monthly_contribution: Some(10_000.0),
            ..Default::default()
        };
        let out = optimize(
            &reg,
            PersonaId::BalancedVoyager,
            &OptimizationConstraints::default(),
            &profile,
            &funds,
        );
        assert!((out.allocation.total_weight() - 1.0).abs() < 1e-9);
        assert!(out.dropped_classes.is_empty());
        for l in &out.allocation.lines {
            let amt = l.amount.unwrap();
            assert_eq!(amt, amt.round());
        }
        assert_eq!(out.model_version, "mvo-v1");
        assert!(out.metrics.projected_value.unwrap() > 0.0);
    }

    #[test]
    fn empty_universe_yields_zero_metrics() {
        let reg = Registry::builtin();
        let out = optimize(
            &reg,
            PersonaId::CapitalGuardian,
            &OptimizationConstraints::default(),
            &InvestorProfile::default(),
            &[],
        );
        assert!(out.allocation.is_empty());
        assert_eq!(out.metrics.expected_return, 0.0);
        assert_eq!(out.metrics.expected_volatility, 0.0);
        assert_eq!(out.metrics.sharpe, -6.5);
        assert_eq!(out.metrics.projected_value, None);
        assert_eq!(
            out.dropped_classes,
            vec![AssetClass::Equity, AssetClass::Debt, AssetClass::Hybrid]
        );
    }

    #[test]
    fn max_single_caps_before_renormalization() {
        let reg = Registry::builtin();
        let funds = vec![fund(1, "Large Cap", 12.0, 14.0), fund(2, "Gilt", 7.0, 3.0)];
        let c = OptimizationConstraints {
            max_funds: 2,
            max_single_fund_pct: 20.0,
            ..Default::default()
        };
        // guardian: equity 0.35, debt 0.5, hybrid 0.15 (no hybrid funds).
        // equity count max(1, floor(0.7)) = 1 → min(0.35, 0.2) = 0.2
        // debt count floor(1.0) = 1 → min(0.5, 0.2) = 0.2
        let out = optimize(&reg, PersonaId::CapitalGuardian, &c, &InvestorProfile::default(), &funds);
        assert_eq!(out.allocation.len(), 2);
        assert!((out.allocation.lines[0].weight - 0.5).abs() < 1e-12);
        assert_eq!(out.dropped_classes, vec![AssetClass::Hybrid]);
    }
}
