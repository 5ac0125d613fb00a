//! nest-alloc: slot apportionment
//!
//! Turns a continuous target vector plus a slot budget into per-class
//! instrument counts.
//!
//! Passes:
//! 1. Normalize; drop classes below [`MIN_CLASS_WEIGHT`] (not redistributed).
//! 2. Reserve one slot per surviving class, heaviest first. If the budget is
//!    smaller than the number of classes, the lightest classes go without.
//! 3. Remainder: each class asks for `round(w × remaining)` extra slots,
//!    granted heaviest first until the budget runs out.
//! 4. Cleanup: leftover single slots go to the heaviest classes in turn.
//!
//! Rounding is half-up (`f64::round` on non-negative input), so a class
//! whose proportional share sits exactly on x.5 rounds up.
//!
//! Invariant: Σ(plan) ≤ `total_slots`.

use std::cmp::Ordering;

use crate::types::{AllocationVector, AssetClass, SlotPlan};

/// Normalized weight below which a class gets no slot at all.
pub const MIN_CLASS_WEIGHT: f64 = 0.03;

/// Apportion `total_slots` across the classes of `target`.
///
/// Degenerate input (non-positive total, zero budget) yields an empty plan.
pub fn apportion_slots(target: &AllocationVector, total_slots: usize) -> SlotPlan {
    let mut plan = SlotPlan::new();
    if total_slots == 0 {
        return plan;
    }
    let normalized = match target.positive().normalized() {
        Some(v) => v,
        None => return plan,
    };

    let eligible = by_weight_desc(&normalized);
    if eligible.is_empty() {
        return plan;
    }

    // Reserve pass.
    for (class, _) in eligible.iter().take(total_slots) {
        plan.insert(*class, 1);
    }
    let mut remaining = total_slots - plan.len();

    // Remainder pass: shares are computed against the post-reserve budget.
    if remaining > 0 {
        let pool = remaining as f64;
        for (class, weight) in &eligible {
            if remaining == 0 {
                break;
            }
            let extra = (weight * pool).round() as usize;
            let granted = extra.min(remaining);
            if let Some(n) = plan.get_mut(class) {
                *n += granted;
            }
            remaining -= granted;
        }
    }

    // Cleanup pass.
    while remaining > 0 {
        for (class, _) in &eligible {
            if remaining == 0 {
                break;
            }
            if let Some(n) = plan.get_mut(class) {
                *n += 1;
            }
            remaining -= 1;
        }
    }

    plan
}

/// Classes at or above [`MIN_CLASS_WEIGHT`], heaviest first. Ties keep
/// canonical class order (stable sort over the ordered map).
fn by_weight_desc(normalized: &AllocationVector) -> Vec<(AssetClass, f64)> {
    let mut eligible: Vec<(AssetClass, f64)> = normalized
        .iter()
        .filter(|(_, w)| *w >= MIN_CLASS_WEIGHT)
        .collect();
    eligible.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    eligible
}
