//! nest-alloc: instrument scoring
//!
//! Every profile is a weighted sum of capped terms,
//! `Σ wᵢ × min(valueᵢ / capᵢ, 1.0)`. A missing metric contributes 0 to its
//! term; the remaining terms are not rescaled to compensate.
//!
//! Profiles:
//! - asset-class (blended path): hard volatility filter, then
//!   0.35 return_3y / 0.25 sharpe / 0.20 cost / 0.20 volatility fit.
//! - persona preference (single-persona path): category rank bonus, then
//!   0.3 return_3y / 0.2 sharpe / 0.1 cost / 0.1 volatility fit. Nothing is
//!   excluded here; callers filter candidates beforehand.
//! - optimizer: 0.4 return_3y / 0.3 return_5y / 0.2 sharpe / 0.1 cost, with
//!   a neutral 0.5 for instruments carrying none of those metrics.
//!
//! Output is sorted by score descending. The sort is stable so equal scores
//! keep catalog order.

use std::cmp::Ordering;

use crate::types::{Instrument, ScoredInstrument};

const RETURN_3Y_CAP: f64 = 30.0;
const SHARPE_CAP: f64 = 1.5;
const EXPENSE_SCALE: f64 = 2.0;

const OPT_RETURN_3Y_CAP: f64 = 30.0;
const OPT_RETURN_5Y_CAP: f64 = 25.0;
const OPT_SHARPE_CAP: f64 = 2.0;
const OPT_EXPENSE_SCALE: f64 = 2.5;
const OPT_NEUTRAL_SCORE: f64 = 0.5;

// ─── Terms ───────────────────────────────────────────────────────────────────

fn capped(value: Option<f64>, cap: f64) -> f64 {
    value.map(|v| (v / cap).min(1.0)).unwrap_or(0.0)
}

/// Lower expense is better; floored at 0.
fn cost(expense: Option<f64>, scale: f64) -> f64 {
    expense.map(|e| (1.0 - e / scale).max(0.0)).unwrap_or(0.0)
}

/// `1 − vol/ceiling` inside the ceiling, 0 outside or when unknown.
fn volatility_fit(volatility: Option<f64>, ceiling: f64) -> f64 {
    match volatility {
        Some(v) if ceiling > 0.0 && v <= ceiling => 1.0 - v / ceiling,
        _ => 0.0,
    }
}

fn exceeds(volatility: Option<f64>, ceiling: f64) -> bool {
    matches!(volatility, Some(v) if v > ceiling)
}

fn sort_desc(scored: &mut [ScoredInstrument]) {
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
}

// ─── Asset-class profile ─────────────────────────────────────────────────────

/// Score one instrument against a class ceiling. `None` when the instrument
/// breaches the ceiling.
pub fn asset_class_score(instrument: &Instrument, ceiling: f64) -> Option<f64> {
    let m = &instrument.metrics;
    if exceeds(m.volatility, ceiling) {
        return None;
    }
    Some(
        0.35 * capped(m.return_3y, RETURN_3Y_CAP)
            + 0.25 * capped(m.sharpe, SHARPE_CAP)
            + 0.20 * cost(m.expense_ratio, EXPENSE_SCALE)
            + 0.20 * volatility_fit(m.volatility, ceiling),
    )
}

/// Blended-path ranking within one asset class.
pub fn score_for_asset_class(instruments: &[Instrument], ceiling: f64) -> Vec<ScoredInstrument> {
    let mut scored: Vec<ScoredInstrument> = instruments
        .iter()
        .filter_map(|i| {
            asset_class_score(i, ceiling).map(|score| ScoredInstrument {
                instrument: i.clone(),
                score,
            })
        })
        .collect();
    sort_desc(&mut scored);
    scored
}

// ─── Persona-preference profile ──────────────────────────────────────────────

/// `0.3 × (1 − rank/len)` for a preferred category, else 0.
pub fn category_bonus(category: &str, preferred: &[String]) -> f64 {
    match preferred.iter().position(|c| c == category) {
        Some(rank) => 0.3 * (1.0 - rank as f64 / preferred.len() as f64),
        None => 0.0,
    }
}

pub fn persona_score(instrument: &Instrument, ceiling: f64, preferred: &[String]) -> f64 {
    let m = &instrument.metrics;
    category_bonus(&instrument.category, preferred)
        + 0.3 * capped(m.return_3y, RETURN_3Y_CAP)
        + 0.2 * capped(m.sharpe, SHARPE_CAP)
        + 0.1 * cost(m.expense_ratio, EXPENSE_SCALE)
        + 0.1 * volatility_fit(m.volatility, ceiling)
}

/// Single-persona ranking.
pub fn score_for_persona(
    instruments: &[Instrument],
    ceiling: f64,
    preferred: &[String],
) -> Vec<ScoredInstrument> {
    let mut scored: Vec<ScoredInstrument> = instruments
        .iter()
        .map(|i| ScoredInstrument {
            instrument: i.clone(),
            score: persona_score(i, ceiling, preferred),
        })
        .collect();
    sort_desc(&mut scored);
    scored
}

/// Entry point covering both request paths: a preference list selects the
/// persona profile, its absence the asset-class profile.
pub fn score_instruments(
    instruments: &[Instrument],
    ceiling: f64,
    preferred: Option<&[String]>,
) -> Vec<ScoredInstrument> {
    match preferred {
        Some(p) => score_for_persona(instruments, ceiling, p),
        None => score_for_asset_class(instruments, ceiling),
    }
}

// ─── Optimizer profile ───────────────────────────────────────────────────────

pub fn optimizer_score(instrument: &Instrument) -> f64 {
    let m = &instrument.metrics;
    let score = 0.4 * capped(m.return_3y, OPT_RETURN_3Y_CAP)
        + 0.3 * capped(m.return_5y, OPT_RETURN_5Y_CAP)
        + 0.2 * capped(m.sharpe, OPT_SHARPE_CAP)
        + 0.1 * cost(m.expense_ratio, OPT_EXPENSE_SCALE);
    // Nothing contributed, whether absent or zero-valued.
    if score == 0.0 {
        OPT_NEUTRAL_SCORE
    } else {
        score
    }
}

pub fn rank_for_optimizer(instruments: &[Instrument]) -> Vec<ScoredInstrument> {
    let mut scored: Vec<ScoredInstrument> = instruments
        .iter()
        .map(|i| ScoredInstrument {
            instrument: i.clone(),
            score: optimizer_score(i),
        })
        .collect();
    sort_desc(&mut scored);
    scored
}
