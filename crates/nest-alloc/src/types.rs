use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ─── AssetClass ──────────────────────────────────────────────────────────────

/// Coarse allocation bucket.
///
/// Variant order is the canonical iteration order used everywhere a
/// deterministic tie-break is needed (equity first, liquid last).
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    Equity,
    Debt,
    Hybrid,
    Gold,
    International,
    Liquid,
}

impl AssetClass {
    pub const ALL: [AssetClass; 6] = [
        AssetClass::Equity,
        AssetClass::Debt,
        AssetClass::Hybrid,
        AssetClass::Gold,
        AssetClass::International,
        AssetClass::Liquid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetClass::Equity => "equity",
            AssetClass::Debt => "debt",
            AssetClass::Hybrid => "hybrid",
            AssetClass::Gold => "gold",
            AssetClass::International => "international",
            AssetClass::Liquid => "liquid",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ParseAssetClassError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "equity" => Ok(AssetClass::Equity),
            "debt" => Ok(AssetClass::Debt),
            "hybrid" => Ok(AssetClass::Hybrid),
            "gold" => Ok(AssetClass::Gold),
            "international" => Ok(AssetClass::International),
            "liquid" => Ok(AssetClass::Liquid),
            other => Err(ParseAssetClassError(other.to_string())),
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An asset-class name outside the closed set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseAssetClassError(pub String);

impl fmt::Display for ParseAssetClassError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown asset class '{}'. expected one of: equity | debt | hybrid | gold | international | liquid",
            self.0
        )
    }
}

impl std::error::Error for ParseAssetClassError {}

// ─── AllocationVector ────────────────────────────────────────────────────────

/// Mapping asset class → fraction.
///
/// Vectors are not required to sum to exactly 1.0; consumers call
/// [`AllocationVector::normalized`] before relying on that. A class absent
/// from the map reads as 0.0.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllocationVector(BTreeMap<AssetClass, f64>);

impl AllocationVector {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Build from `(class, fraction)` pairs; later duplicates overwrite.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (AssetClass, f64)>,
    {
        Self(pairs.into_iter().collect())
    }

    pub fn get(&self, class: AssetClass) -> f64 {
        self.0.get(&class).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, class: AssetClass, value: f64) {
        self.0.insert(class, value);
    }

    pub fn add(&mut self, class: AssetClass, value: f64) {
        *self.0.entry(class).or_insert(0.0) += value;
    }

    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    /// Scaled copy summing to 1.0, or `None` when the total is not positive.
    pub fn normalized(&self) -> Option<Self> {
        let total = self.total();
        if !(total > 0.0) {
            return None;
        }
        Some(Self(self.0.iter().map(|(c, v)| (*c, v / total)).collect()))
    }

    /// Copy keeping only strictly positive entries.
    pub fn positive(&self) -> Self {
        Self(
            self.0
                .iter()
                .filter(|(_, v)| **v > 0.0)
                .map(|(c, v)| (*c, *v))
                .collect(),
        )
    }

    /// Iterate entries in canonical class order.
    pub fn iter(&self) -> impl Iterator<Item = (AssetClass, f64)> + '_ {
        self.0.iter().map(|(c, v)| (*c, *v))
    }

    pub fn classes(&self) -> impl Iterator<Item = AssetClass> + '_ {
        self.0.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl FromIterator<(AssetClass, f64)> for AllocationVector {
    fn from_iter<I: IntoIterator<Item = (AssetClass, f64)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

// ─── Instrument ──────────────────────────────────────────────────────────────

/// Performance and risk inputs. All values are percent except `sharpe`.
///
/// `None` means the metric is unknown, which is distinct from zero.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InstrumentMetrics {
    #[serde(default)]
    pub return_1y: Option<f64>,
    #[serde(default)]
    pub return_3y: Option<f64>,
    #[serde(default)]
    pub return_5y: Option<f64>,
    #[serde(default)]
    pub volatility: Option<f64>,
    #[serde(default)]
    pub sharpe: Option<f64>,
    #[serde(default)]
    pub expense_ratio: Option<f64>,
}

/// A candidate fund.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    /// Scheme code.
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub issuer: Option<String>,
    /// Fine-grained label such as "Flexi Cap".
    pub category: String,
    /// Explicit class; when absent the registry derives one from `category`.
    #[serde(default)]
    pub asset_class: Option<AssetClass>,
    #[serde(flatten)]
    pub metrics: InstrumentMetrics,
}

impl Instrument {
    pub fn new<N: Into<String>, C: Into<String>>(id: u64, name: N, category: C) -> Self {
        Self {
            id,
            name: name.into(),
            issuer: None,
            category: category.into(),
            asset_class: None,
            metrics: InstrumentMetrics::default(),
        }
    }

    pub fn with_issuer<S: Into<String>>(mut self, issuer: S) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn with_asset_class(mut self, class: AssetClass) -> Self {
        self.asset_class = Some(class);
        self
    }

    pub fn with_metrics(mut self, metrics: InstrumentMetrics) -> Self {
        self.metrics = metrics;
        self
    }
}

// ─── Scoring / slot outputs ──────────────────────────────────────────────────

/// An instrument paired with its score (effectively in [0, 1]).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScoredInstrument {
    pub instrument: Instrument,
    pub score: f64,
}

/// Asset class → number of instruments to select.
pub type SlotPlan = BTreeMap<AssetClass, usize>;

// ─── Allocation ──────────────────────────────────────────────────────────────

/// One weighted instrument in an allocation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AllocationLine {
    pub instrument: Instrument,
    pub asset_class: AssetClass,
    pub score: f64,
    /// Fraction of the whole portfolio.
    pub weight: f64,
    /// Currency amount: share of a supplied total, or a periodic contribution.
    pub amount: Option<f64>,
}

/// Instrument weights, in selection order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Allocation {
    pub lines: Vec<AllocationLine>,
}

impl Allocation {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn total_weight(&self) -> f64 {
        self.lines.iter().map(|l| l.weight).sum()
    }

    pub fn class_weight(&self, class: AssetClass) -> f64 {
        self.lines
            .iter()
            .filter(|l| l.asset_class == class)
            .map(|l| l.weight)
            .sum()
    }

    /// Realized per-class allocation.
    pub fn achieved(&self) -> AllocationVector {
        let mut v = AllocationVector::new();
        for l in &self.lines {
            v.add(l.asset_class, l.weight);
        }
        v
    }

    pub fn class_counts(&self) -> BTreeMap<AssetClass, usize> {
        let mut counts = BTreeMap::new();
        for l in &self.lines {
            *counts.entry(l.asset_class).or_insert(0) += 1;
        }
        counts
    }
}

/// Round half away from zero to `places` decimals.
pub fn round_to(value: f64, places: i32) -> f64 {
    let f = 10f64.powi(places);
    (value * f).round() / f
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_class_parse_round_trips_names() {
        for c in AssetClass::ALL {
            assert_eq!(AssetClass::parse(c.as_str()).unwrap(), c);
        }
        assert_eq!(AssetClass::parse(" Equity ").unwrap(), AssetClass::Equity);
        assert!(AssetClass::parse("crypto").is_err());
    }

    #[test]
    fn normalized_rejects_zero_total() {
        assert!(AllocationVector::new().normalized().is_none());
        let v = AllocationVector::from_pairs([(AssetClass::Equity, 0.0)]);
        assert!(v.normalized().is_none());
    }

    #[test]
    fn normalized_scales_to_one() {
        let v = AllocationVector::from_pairs([(AssetClass::Equity, 2.0), (AssetClass::Debt, 2.0)]);
        let n = v.normalized().unwrap();
        assert!((n.get(AssetClass::Equity) - 0.5).abs() < 1e-12);
        assert!((n.total() - 1.0).abs() < 1e-12);
        assert_eq!(n.get(AssetClass::Gold), 0.0);
    }

    #[test]
    fn instrument_json_flattens_metrics() {
        let raw = r#"{"id": 120503, "name": "Quant Flexi Cap", "category": "Flexi Cap",
                      "return_3y": 24.3, "volatility": 18.5}"#;
        let i: Instrument = serde_json::from_str(raw).unwrap();
        assert_eq!(i.metrics.return_3y, Some(24.3));
        assert_eq!(i.metrics.sharpe, None);
        assert_eq!(i.asset_class, None);
    }

    #[test]
    fn allocation_vector_serializes_snake_case_keys() {
        let v = AllocationVector::from_pairs([(AssetClass::International, 0.1)]);
        let s = serde_json::to_string(&v).unwrap();
        assert_eq!(s, r#"{"international":0.1}"#);
    }

    #[test]
    fn round_to_is_half_away_from_zero() {
        assert_eq!(round_to(0.125, 2), 0.13);
        assert_eq!(round_to(2.5, 0), 3.0);
    }
}
