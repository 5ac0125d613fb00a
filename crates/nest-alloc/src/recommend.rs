//! nest-alloc: recommendation pipelines
//!
//! Blended path: target vector → slot plan → per-class scoring → equal split
//! → alignment report.
//!
//! Single-persona path: persona volatility filter → preference scoring →
//! top N → score-proportional weights.
//!
//! Both take an already filtered candidate list (category filters and
//! exclusions are the catalog's job) and never fail: degenerate input gives
//! an empty recommendation.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::alignment::{alignment_report, AlignmentBand, ClassBreakdown};
use crate::apportion::apportion_slots;
use crate::distribute::{distribute_by_score, distribute_weights};
use crate::reasoning::{blended_reasoning, persona_reasoning};
use crate::registry::{PersonaId, Registry};
use crate::scoring::{score_for_asset_class, score_for_persona};
use crate::types::{
    round_to, Allocation, AllocationLine, AllocationVector, AssetClass, Instrument, InstrumentMetrics,
    ScoredInstrument,
};

/// Volatility assumed for an unknown figure when describing a selection.
const ASSUMED_VOLATILITY: f64 = 15.0;

// ─── Output line ─────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RecommendedLine {
    pub id: u64,
    pub name: String,
    pub issuer: Option<String>,
    pub category: String,
    pub asset_class: AssetClass,
    /// Rounded to 2 places.
    pub score: f64,
    /// Display weight: 4 places on the blended path, 2 on the persona path.
    pub weight: f64,
    pub amount: Option<f64>,
    pub reasoning: String,
    pub metrics: InstrumentMetrics,
}

impl RecommendedLine {
    fn from_line(line: &AllocationLine, weight_places: i32, reasoning: String) -> Self {
        Self {
            id: line.instrument.id,
            name: line.instrument.name.clone(),
            issuer: line.instrument.issuer.clone(),
            category: line.instrument.category.clone(),
            asset_class: line.asset_class,
            score: round_to(line.score, 2),
            weight: round_to(line.weight, weight_places),
            amount: line.amount,
            reasoning,
            metrics: line.instrument.metrics.clone(),
        }
    }
}

// ─── Blended ─────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct BlendedRequest {
    pub target: AllocationVector,
    pub top_n: usize,
    pub investment_amount: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BlendedRecommendation {
    pub lines: Vec<RecommendedLine>,
    pub breakdown: Vec<ClassBreakdown>,
    pub alignment_score: f64,
    pub alignment_band: AlignmentBand,
    pub alignment_message: String,
}

pub fn group_by_class(
    candidates: &[Instrument],
    registry: &Registry,
) -> BTreeMap<AssetClass, Vec<Instrument>> {
    let mut grouped: BTreeMap<AssetClass, Vec<Instrument>> = BTreeMap::new();
    for i in candidates {
        grouped.entry(registry.classify(i)).or_default().push(i.clone());
    }
    grouped
}

pub fn recommend_blended(
    request: &BlendedRequest,
    candidates: &[Instrument],
    registry: &Registry,
) -> BlendedRecommendation {
    let active = request.target.positive();
    let grouped = group_by_class(candidates, registry);
    let plan = apportion_slots(&active, request.top_n);

    let mut selected: BTreeMap<AssetClass, Vec<ScoredInstrument>> = BTreeMap::new();
    for (class, slots) in &plan {
        let pool = match grouped.get(class) {
            Some(pool) if *slots > 0 => pool,
            _ => continue,
        };
        let ceiling = registry.volatility_ceiling(*class);
        let picks: Vec<ScoredInstrument> = score_for_asset_class(pool, ceiling)
            .into_iter()
            .take(*slots)
            .collect();
        if !picks.is_empty() {
            selected.insert(*class, picks);
        }
    }

    let allocation = distribute_weights(&plan, &selected, &active, request.investment_amount);

    // The report is computed over display-rounded weights so the breakdown
    // and the lines agree.
    let display = Allocation {
        lines: allocation
            .lines
            .iter()
            .map(|l| AllocationLine {
                weight: round_to(l.weight, 4),
                ..l.clone()
            })
            .collect(),
    };
    let report = alignment_report(&display, &request.target, request.investment_amount);

    let lines = allocation
        .lines
        .iter()
        .map(|l| {
            let reasoning = blended_reasoning(&l.instrument, l.asset_class, active.get(l.asset_class));
            RecommendedLine::from_line(l, 4, reasoning)
        })
        .collect();

    BlendedRecommendation {
        lines,
        breakdown: report.breakdown,
        alignment_score: report.score,
        alignment_band: report.band,
        alignment_message: report.message,
    }
}

// ─── Single persona ──────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PersonaRecommendation {
    pub persona: PersonaId,
    pub lines: Vec<RecommendedLine>,
    pub persona_alignment: String,
}

pub fn recommend_for_persona(
    persona: PersonaId,
    top_n: usize,
    candidates: &[Instrument],
    registry: &Registry,
) -> PersonaRecommendation {
    let profile = registry.persona(persona);
    let ceiling = profile.max_volatility;

    let eligible: Vec<Instrument> = candidates
        .iter()
        .filter(|i| !matches!(i.metrics.volatility, Some(v) if v > ceiling))
        .cloned()
        .collect();

    let picks: Vec<(AssetClass, ScoredInstrument)> =
        score_for_persona(&eligible, ceiling, &profile.preferred_categories)
            .into_iter()
            .take(top_n)
            .map(|s| (registry.classify(&s.instrument), s))
            .collect();

    let allocation = distribute_by_score(&picks, &score_shares(&picks), None);

    let lines: Vec<RecommendedLine> = allocation
        .lines
        .iter()
        .map(|l| {
            let reasoning = persona_reasoning(&l.instrument, &profile.preferred_categories);
            RecommendedLine::from_line(l, 2, reasoning)
        })
        .collect();

    let persona_alignment = describe_persona_fit(persona, &profile.name, &allocation);

    PersonaRecommendation {
        persona,
        lines,
        persona_alignment,
    }
}

/// Per-class share of the selection's total (non-negative) score, so that
/// score-proportional weighting within each class yields score-proportional
/// weights overall. Zero total falls back to the class's share of picks.
fn score_shares(picks: &[(AssetClass, ScoredInstrument)]) -> AllocationVector {
    let total: f64 = picks.iter().map(|(_, s)| s.score.max(0.0)).sum();
    let mut shares = AllocationVector::new();
    for (class, s) in picks {
        if total > 0.0 {
            shares.add(*class, s.score.max(0.0) / total);
        } else {
            shares.add(*class, 1.0 / picks.len() as f64);
        }
    }
    shares
}

fn describe_persona_fit(persona: PersonaId, name: &str, allocation: &Allocation) -> String {
    let mean_volatility = if allocation.is_empty() {
        0.0
    } else {
        allocation
            .lines
            .iter()
            .map(|l| l.instrument.metrics.volatility.unwrap_or(ASSUMED_VOLATILITY))
            .sum::<f64>()
            / allocation.len() as f64
    };

    match persona {
        PersonaId::CapitalGuardian if mean_volatility < 10.0 => {
            format!("Low volatility portfolio well-aligned with {name} profile")
        }
        PersonaId::CapitalGuardian => format!("Conservative selection suitable for {name} profile"),
        PersonaId::BalancedVoyager => {
            format!("Balanced mix of growth and stability for {name} profile")
        }
        PersonaId::AcceleratedBuilder => {
            format!("High growth potential aligned with {name} profile")
        }
    }
}
