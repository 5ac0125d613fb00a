//! nest-alloc
//!
//! Allocation core for persona-driven fund selection:
//! - Persona blending into a target asset-class vector
//! - Slot apportionment (continuous weights → per-class instrument counts)
//! - Multi-factor instrument scoring
//! - Weight distribution and alignment scoring
//! - Persona-direct optimizer with projected metrics
//! - Pure deterministic logic (no IO, no time, no catalog wiring)

mod types;

pub mod alignment;
pub mod apportion;
pub mod blend;
pub mod distribute;
pub mod optimizer;
pub mod projection;
pub mod reasoning;
pub mod recommend;
pub mod registry;
pub mod scoring;

pub use alignment::{
    alignment_report, alignment_score, build_breakdown, evaluate_alignment, AlignmentBand,
    AlignmentReport, ClassBreakdown,
};
pub use apportion::{apportion_slots, MIN_CLASS_WEIGHT};
pub use blend::{BlendResult, PersonaBlend, RegistryBlend};
pub use distribute::{distribute_by_score, distribute_weights};
pub use optimizer::{
    optimize, portfolio_metrics, sleeve_targets, InvestorProfile, OptimizationConstraints,
    OptimizationResult, PortfolioMetrics,
};
pub use recommend::{
    recommend_blended, recommend_for_persona, BlendedRecommendation, BlendedRequest,
    PersonaRecommendation, RecommendedLine,
};
pub use registry::{
    OptimizerDefaults, OptimizerTables, PersonaId, PersonaProfile, PersonaResolution, PersonaTable,
    Registry, DEFAULT_VOLATILITY_CEILING,
};
pub use scoring::{score_for_asset_class, score_for_persona, score_instruments};

pub use types::{
    round_to, Allocation, AllocationLine, AllocationVector, AssetClass, Instrument,
    InstrumentMetrics, ParseAssetClassError, ScoredInstrument, SlotPlan,
};

/// Parse `class=fraction` pairs separated by commas, e.g.
/// `equity=0.4,debt=0.3`. Used by front ends that take vectors as text.
pub fn parse_allocation(s: &str) -> Result<AllocationVector, ParseAllocationError> {
    let mut v = AllocationVector::new();
    for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (k, val) = part
            .split_once('=')
            .ok_or_else(|| ParseAllocationError::MissingEquals(part.to_string()))?;
        let class = AssetClass::parse(k).map_err(ParseAllocationError::Class)?;
        let fraction: f64 = val
            .trim()
            .parse()
            .map_err(|_| ParseAllocationError::BadNumber(part.to_string()))?;
        v.set(class, fraction);
    }
    Ok(v)
}

#[derive(Clone, Debug, PartialEq)]
pub enum ParseAllocationError {
    MissingEquals(String),
    BadNumber(String),
    Class(ParseAssetClassError),
}

impl std::fmt::Display for ParseAllocationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingEquals(p) => write!(f, "expected class=fraction, got '{p}'"),
            Self::BadNumber(p) => write!(f, "invalid fraction in '{p}'"),
            Self::Class(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ParseAllocationError {}
