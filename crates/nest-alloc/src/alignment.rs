//! nest-alloc: alignment evaluation
//!
//! Target-weighted relative deviation between a target vector and what was
//! actually achieved. Large classes dominate: missing half of a 5% class
//! costs far less than missing half of a 40% class.

use std::fmt;

use serde::Serialize;

use crate::types::{round_to, Allocation, AllocationVector, AssetClass};

// ─── Band ────────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentBand {
    Close,
    Well,
    Reasonable,
    Partial,
}

impl AlignmentBand {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.95 {
            AlignmentBand::Close
        } else if score >= 0.85 {
            AlignmentBand::Well
        } else if score >= 0.70 {
            AlignmentBand::Reasonable
        } else {
            AlignmentBand::Partial
        }
    }

    pub fn phrase(&self) -> &'static str {
        match self {
            AlignmentBand::Close => "closely matches targets",
            AlignmentBand::Well => "well-aligned",
            AlignmentBand::Reasonable => "reasonably aligned, limited fund options",
            AlignmentBand::Partial => "partially aligned, consider adjusting targets",
        }
    }

    /// User-facing sentence with the integer percentage embedded.
    pub fn describe(&self, score: f64) -> String {
        let pct = (score * 100.0).round() as i64;
        match self {
            AlignmentBand::Close => {
                format!("Portfolio closely matches targets with {pct}% alignment")
            }
            AlignmentBand::Well => {
                format!("Portfolio well-aligned with blended targets ({pct}% alignment)")
            }
            AlignmentBand::Reasonable => format!(
                "Portfolio reasonably aligned, limited fund options in some asset classes \
                 ({pct}% alignment)"
            ),
            AlignmentBand::Partial => format!(
                "Portfolio partially aligned, consider adjusting targets or expanding the \
                 fund universe ({pct}% alignment)"
            ),
        }
    }
}

impl fmt::Display for AlignmentBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.phrase())
    }
}

// ─── Score ───────────────────────────────────────────────────────────────────

/// Alignment of `achieved` against `target`: `(score, band phrase)`.
///
/// Only classes with target > 0 participate. With none, alignment is
/// perfect. Score is `max(0, 1 − weighted deviation)` rounded to 2 places.
pub fn evaluate_alignment(
    target: &AllocationVector,
    achieved: &AllocationVector,
) -> (f64, &'static str) {
    let score = alignment_score(target, achieved);
    (score, AlignmentBand::from_score(score).phrase())
}

pub fn alignment_score(target: &AllocationVector, achieved: &AllocationVector) -> f64 {
    let mut weighted_deviation = 0.0;
    let mut total_target = 0.0;
    for (class, t) in target.iter() {
        if t > 0.0 {
            let deviation = (t - achieved.get(class)).abs() / t;
            weighted_deviation += deviation * t;
            total_target += t;
        }
    }
    if total_target == 0.0 {
        return 1.0;
    }
    round_to((1.0 - weighted_deviation / total_target).max(0.0), 2)
}

// ─── Breakdown ───────────────────────────────────────────────────────────────

/// One row of the per-class report.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClassBreakdown {
    pub asset_class: AssetClass,
    pub target: f64,
    pub achieved: f64,
    pub instrument_count: usize,
    pub total_amount: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AlignmentReport {
    pub breakdown: Vec<ClassBreakdown>,
    pub score: f64,
    pub band: AlignmentBand,
    pub message: String,
}

/// Rows for every class that is either targeted or achieved, in canonical
/// class order. Fractions are rounded to 4 places.
pub fn build_breakdown(
    allocation: &Allocation,
    target: &AllocationVector,
    total_amount: Option<f64>,
) -> Vec<ClassBreakdown> {
    let achieved = allocation.achieved();
    let counts = allocation.class_counts();

    AssetClass::ALL
        .iter()
        .copied()
        .filter(|c| target.classes().any(|t| t == *c) || counts.contains_key(c))
        .map(|class| {
            let a = achieved.get(class);
            ClassBreakdown {
                asset_class: class,
                target: round_to(target.get(class), 4),
                achieved: round_to(a, 4),
                instrument_count: counts.get(&class).copied().unwrap_or(0),
                total_amount: total_amount.map(|amt| round_to(a * amt, 2)),
            }
        })
        .collect()
}

/// Breakdown plus alignment over its rounded figures. A report with no rows
/// scores 0.
pub fn alignment_report(
    allocation: &Allocation,
    target: &AllocationVector,
    total_amount: Option<f64>,
) -> AlignmentReport {
    let breakdown = build_breakdown(allocation, target, total_amount);
    let score = if breakdown.is_empty() {
        0.0
    } else {
        let t: AllocationVector = breakdown.iter().map(|b| (b.asset_class, b.target)).collect();
        let a: AllocationVector = breakdown.iter().map(|b| (b.asset_class, b.achieved)).collect();
        alignment_score(&t, &a)
    };
    let band = AlignmentBand::from_score(score);
    AlignmentReport {
        breakdown,
        score,
        band,
        message: band.describe(score),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AssetClass::*;

    #[test]
    fn bands_follow_thresholds() {
        assert_eq!(AlignmentBand::from_score(0.95), AlignmentBand::Close);
        assert_eq!(AlignmentBand::from_score(0.94), AlignmentBand::Well);
        assert_eq!(AlignmentBand::from_score(0.85), AlignmentBand::Well);
        assert_eq!(AlignmentBand::from_score(0.70), AlignmentBand::Reasonable);
        assert_eq!(AlignmentBand::from_score(0.69), AlignmentBand::Partial);
    }

    #[test]
    fn no_positive_targets_is_perfect() {
        let zero = AllocationVector::from_pairs([(Gold, 0.0)]);
        let achieved = AllocationVector::from_pairs([(Equity, 1.0)]);
        assert_eq!(evaluate_alignment(&zero, &achieved), (1.0, "closely matches targets"));
    }

    #[test]
    fn total_miss_floors_at_zero() {
        let target = AllocationVector::from_pairs([(Equity, 0.5), (Debt, 0.5)]);
        let achieved = AllocationVector::from_pairs([(Equity, 1.5)]);
        // equity dev 2.0, debt dev 1.0 → weighted 1.5 → clamped.
        assert_eq!(alignment_score(&target, &achieved), 0.0);
    }

    #[test]
    fn messages_embed_band_phrase_and_percent() {
        let msg = AlignmentBand::Close.describe(0.94 + 0.01);
        assert!(msg.contains("95% alignment"));
        assert!(msg.contains("closely matches targets"));
        assert!(AlignmentBand::Partial.describe(0.4).contains("partially aligned, consider adjusting targets"));
    }

    #[test]
    fn empty_breakdown_scores_zero() {
        let report = alignment_report(&Allocation::default(), &AllocationVector::new(), None);
        assert!(report.breakdown.is_empty());
        assert_eq!(report.score, 0.0);
        assert_eq!(report.band, AlignmentBand::Partial);
    }
}
