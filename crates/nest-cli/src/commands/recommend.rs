//! Recommendation command handlers.
//!
//! Covers `nest recommend` (blended target) and `nest recommend-persona`.

use anyhow::{bail, Result};
use nest_alloc::{
    recommend_blended, recommend_for_persona, BlendResult, BlendedRecommendation, BlendedRequest,
    PersonaBlend, RegistryBlend,
};
use nest_config::EngineConfig;
use serde::Serialize;
use tracing::info;

use super::{emit, load_candidates, parse_persona_weights, parse_target, resolve_persona};
use crate::CatalogArgs;

/// How the blended target is obtained.
pub enum TargetBasis {
    Vector(String),
    Weights(String),
}

#[derive(Serialize)]
struct BlendedOutput<'a> {
    config_hash: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    blend: Option<BlendResult>,
    #[serde(flatten)]
    recommendation: BlendedRecommendation,
}

pub async fn blended(
    cfg: &EngineConfig,
    catalog: &CatalogArgs,
    basis: TargetBasis,
    top_n: usize,
    amount: Option<f64>,
) -> Result<()> {
    let (target, blend) = match basis {
        TargetBasis::Vector(raw) => (parse_target(&raw)?, None),
        TargetBasis::Weights(raw) => {
            let weights = parse_persona_weights(&raw)?;
            let result = RegistryBlend::new(&cfg.registry).compute(&weights);
            if result.primary.is_none() {
                bail!("--weights has no positive persona weight");
            }
            (result.blended.clone(), Some(result))
        }
    };

    let candidates = load_candidates(cfg, catalog).await?;
    let request = BlendedRequest {
        target,
        top_n,
        investment_amount: amount,
    };
    let recommendation = recommend_blended(&request, &candidates, &cfg.registry);
    info!(
        lines = recommendation.lines.len(),
        alignment = recommendation.alignment_score,
        "blended recommendation built"
    );

    emit(&BlendedOutput {
        config_hash: &cfg.config_hash,
        blend,
        recommendation,
    })
}

pub async fn persona(
    cfg: &EngineConfig,
    catalog: &CatalogArgs,
    slug: &str,
    top_n: usize,
) -> Result<()> {
    let id = resolve_persona(slug);
    let candidates = load_candidates(cfg, catalog).await?;
    let out = recommend_for_persona(id, top_n, &candidates, &cfg.registry);
    info!(persona = %id, lines = out.lines.len(), "persona recommendation built");
    emit(&out)
}
