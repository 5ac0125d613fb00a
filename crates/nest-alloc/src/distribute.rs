//! nest-alloc: weight distribution
//!
//! Two ways of turning selected instruments into portfolio weights:
//! - [`distribute_weights`] (blended path): each class's target fraction is
//!   split evenly across the instruments selected for it. Per class,
//!   Σ weights == target[class].
//! - [`distribute_by_score`] (persona path): weight ∝ score within a class,
//!   optionally capped per instrument, then the whole set is renormalized
//!   so Σ weights == 1.

use std::collections::BTreeMap;

use crate::types::{round_to, Allocation, AllocationLine, AllocationVector, AssetClass, ScoredInstrument, SlotPlan};

/// Equal split of each class target across its selection.
///
/// `selected` lists are taken in order and truncated to the class's slot
/// count in `plan`; classes absent from `plan` contribute nothing. When
/// `total_amount` is given, each line also carries `weight × amount`
/// rounded to 2 decimals.
pub fn distribute_weights(
    plan: &SlotPlan,
    selected: &BTreeMap<AssetClass, Vec<ScoredInstrument>>,
    target: &AllocationVector,
    total_amount: Option<f64>,
) -> Allocation {
    let mut lines = Vec::new();

    for (class, slots) in plan {
        let picks = match selected.get(class) {
            Some(list) => &list[..list.len().min(*slots)],
            None => continue,
        };
        if picks.is_empty() {
            continue;
        }
        let per_instrument = target.get(*class) / picks.len() as f64;
        for pick in picks {
            lines.push(AllocationLine {
                instrument: pick.instrument.clone(),
                asset_class: *class,
                score: pick.score,
                weight: per_instrument,
                amount: total_amount.map(|amt| round_to(per_instrument * amt, 2)),
            });
        }
    }

    Allocation { lines }
}

/// Score-proportional weights, renormalized across the whole selection.
///
/// Each `(class, pick)` gets `class_targets[class] × score / Σscore(class)`
/// (equal split inside a class whose scores sum to ≤ 0), capped at
/// `max_single` when given. Input order is preserved.
pub fn distribute_by_score(
    selected: &[(AssetClass, ScoredInstrument)],
    class_targets: &AllocationVector,
    max_single: Option<f64>,
) -> Allocation {
    let mut score_sums: BTreeMap<AssetClass, (f64, usize)> = BTreeMap::new();
    for (class, pick) in selected {
        let entry = score_sums.entry(*class).or_insert((0.0, 0));
        entry.0 += pick.score.max(0.0);
        entry.1 += 1;
    }

    let mut lines: Vec<AllocationLine> = selected
        .iter()
        .map(|(class, pick)| {
            let (sum, count) = score_sums[class];
            let share = if sum > 0.0 {
                pick.score.max(0.0) / sum
            } else {
                1.0 / count as f64
            };
            let mut weight = class_targets.get(*class) * share;
            if let Some(cap) = max_single {
                weight = weight.min(cap);
            }
            AllocationLine {
                instrument: pick.instrument.clone(),
                asset_class: *class,
                score: pick.score,
                weight,
                amount: None,
            }
        })
        .collect();

    renormalize(&mut lines);
    Allocation { lines }
}

/// Scale weights so they sum to 1. No-op when the sum is not positive.
pub(crate) fn renormalize(lines: &mut [AllocationLine]) {
    let total: f64 = lines.iter().map(|l| l.weight).sum();
    if total > 0.0 {
        for l in lines.iter_mut() {
            l.weight /= total;
        }
    }
}
