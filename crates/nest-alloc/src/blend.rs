//! nest-alloc: persona blending
//!
//! Combines per-persona strategic allocations into one target vector using a
//! persona-weight distribution. How those weights are derived from a user's
//! answers is someone else's concern; this module only consumes them.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::registry::{PersonaId, Registry};
use crate::types::{round_to, AllocationVector, AssetClass};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BlendResult {
    /// Normalized to sum to 1. Empty when the input had no positive weight.
    pub persona_weights: BTreeMap<PersonaId, f64>,
    pub primary: Option<PersonaId>,
    pub blended: AllocationVector,
}

/// Source of a blended target allocation.
pub trait PersonaBlend {
    fn compute(&self, weights: &BTreeMap<PersonaId, f64>) -> BlendResult;
}

/// Blends using the persona allocations of a [`Registry`].
#[derive(Clone, Debug)]
pub struct RegistryBlend<'a> {
    registry: &'a Registry,
}

impl<'a> RegistryBlend<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }
}

impl PersonaBlend for RegistryBlend<'_> {
    fn compute(&self, weights: &BTreeMap<PersonaId, f64>) -> BlendResult {
        let total: f64 = weights.values().filter(|w| **w > 0.0).sum();
        if total <= 0.0 {
            return BlendResult {
                persona_weights: BTreeMap::new(),
                primary: None,
                blended: AssetClass::ALL.iter().map(|c| (*c, 0.0)).collect(),
            };
        }

        let persona_weights: BTreeMap<PersonaId, f64> = weights
            .iter()
            .filter(|(_, w)| **w > 0.0)
            .map(|(p, w)| (*p, w / total))
            .collect();

        // Highest weight wins; strict comparison keeps the earliest persona
        // on ties.
        let mut primary: Option<(PersonaId, f64)> = None;
        for (p, w) in &persona_weights {
            if primary.map_or(true, |(_, best)| *w > best) {
                primary = Some((*p, *w));
            }
        }

        let blended = AssetClass::ALL
            .iter()
            .map(|class| {
                let v: f64 = persona_weights
                    .iter()
                    .map(|(p, w)| w * self.registry.persona(*p).allocation.get(*class))
                    .sum();
                (*class, round_to(v, 4))
            })
            .collect();

        BlendResult {
            persona_weights,
            primary: primary.map(|(p, _)| p),
            blended,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_are_normalized() {
        let reg = Registry::builtin();
        let weights: BTreeMap<_, _> = [(PersonaId::CapitalGuardian, 2.0), (PersonaId::AcceleratedBuilder, 2.0)]
            .into_iter()
            .collect();
        let out = RegistryBlend::new(&reg).compute(&weights);
        assert_eq!(out.persona_weights[&PersonaId::CapitalGuardian], 0.5);
        // Tie: canonical order picks the guardian.
        assert_eq!(out.primary, Some(PersonaId::CapitalGuardian));
        assert_eq!(out.blended.get(AssetClass::Equity), 0.4);
    }

    #[test]
    fn zero_weights_give_empty_blend() {
        let reg = Registry::builtin();
        let weights: BTreeMap<_, _> = [(PersonaId::BalancedVoyager, 0.0)].into_iter().collect();
        let out = RegistryBlend::new(&reg).compute(&weights);
        assert!(out.persona_weights.is_empty());
        assert_eq!(out.primary, None);
        assert_eq!(out.blended.total(), 0.0);
    }

    #[test]
    fn single_persona_reproduces_its_allocation() {
        let reg = Registry::builtin();
        let weights: BTreeMap<_, _> = [(PersonaId::AcceleratedBuilder, 1.0)].into_iter().collect();
        let out = RegistryBlend::new(&reg).compute(&weights);
        assert_eq!(out.primary, Some(PersonaId::AcceleratedBuilder));
        assert_eq!(out.blended.get(AssetClass::Equity), 0.65);
        assert_eq!(out.blended.get(AssetClass::Gold), 0.0);
    }
}
