//! nest-alloc: human-readable selection reasons
//!
//! Threshold phrases per metric. A metric that is absent yields no phrase.

use crate::types::{AssetClass, Instrument};

/// Reason string for a single-persona pick.
pub fn persona_reasoning(instrument: &Instrument, preferred: &[String]) -> String {
    let m = &instrument.metrics;
    let mut reasons = Vec::new();

    match m.return_3y {
        Some(r) if r > 20.0 => reasons.push(format!("Strong 3Y returns of {r}%")),
        Some(r) if r > 10.0 => reasons.push(format!("Solid 3Y returns of {r}%")),
        _ => {}
    }
    match m.sharpe {
        Some(s) if s > 1.0 => reasons.push(format!("excellent risk-adjusted returns (Sharpe: {s})")),
        Some(s) if s > 0.7 => reasons.push(format!("good risk-adjusted returns (Sharpe: {s})")),
        _ => {}
    }
    match m.volatility {
        Some(v) if v < 10.0 => reasons.push("low volatility for stability".to_string()),
        Some(v) if v < 18.0 => reasons.push("moderate volatility".to_string()),
        _ => {}
    }
    match m.expense_ratio {
        Some(e) if e < 0.5 => reasons.push("very low expense ratio".to_string()),
        Some(e) if e < 0.8 => reasons.push("competitive expense ratio".to_string()),
        _ => {}
    }
    if preferred.iter().take(2).any(|c| *c == instrument.category) {
        reasons.push(format!("ideal {} exposure for your profile", instrument.category));
    }

    if reasons.is_empty() {
        format!("Well-suited {} fund for diversification", instrument.category)
    } else {
        reasons.join(", ")
    }
}

/// Reason string for a blended-path pick; always opens with the class
/// target it was selected for.
pub fn blended_reasoning(instrument: &Instrument, class: AssetClass, class_target: f64) -> String {
    let m = &instrument.metrics;
    let pct = (class_target * 100.0).round() as i64;
    let mut reasons = vec![format!("Selected for {pct}% {class} target")];

    match m.return_3y {
        Some(r) if r > 20.0 => reasons.push(format!("strong 3Y returns ({r}%)")),
        Some(r) if r > 10.0 => reasons.push(format!("solid 3Y returns ({r}%)")),
        _ => {}
    }
    match m.sharpe {
        Some(s) if s > 1.0 => reasons.push("excellent risk-adjusted performance".to_string()),
        Some(s) if s > 0.7 => reasons.push("good risk-adjusted performance".to_string()),
        _ => {}
    }
    match m.volatility {
        Some(v) if v < 5.0 => reasons.push("very low volatility".to_string()),
        Some(v) if v < 12.0 => reasons.push("low volatility".to_string()),
        _ => {}
    }

    reasons.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::InstrumentMetrics;

    #[test]
    fn persona_reasons_join_thresholds() {
        let f = Instrument::new(1, "Parag Parikh Flexi Cap", "Flexi Cap").with_metrics(InstrumentMetrics {
            return_3y: Some(24.3),
            sharpe: Some(1.2),
            volatility: Some(13.2),
            expense_ratio: Some(0.58),
            ..Default::default()
        });
        let preferred = vec!["Flexi Cap".to_string(), "Large & Mid Cap".to_string()];
        assert_eq!(
            persona_reasoning(&f, &preferred),
            "Strong 3Y returns of 24.3%, excellent risk-adjusted returns (Sharpe: 1.2), \
             moderate volatility, competitive expense ratio, ideal Flexi Cap exposure for your profile"
        );
    }

    #[test]
    fn persona_reasons_fall_back_when_nothing_stands_out() {
        let f = Instrument::new(2, "Plain Gilt", "Gilt");
        assert_eq!(persona_reasoning(&f, &[]), "Well-suited Gilt fund for diversification");
    }

    #[test]
    fn blended_reasons_open_with_target() {
        let f = Instrument::new(3, "HDFC Corporate Bond", "Corporate Bond").with_metrics(InstrumentMetrics {
            return_3y: Some(7.2),
            sharpe: Some(0.58),
            volatility: Some(2.1),
            ..Default::default()
        });
        assert_eq!(
            blended_reasoning(&f, AssetClass::Debt, 0.32),
            "Selected for 32% debt target, very low volatility"
        );
    }
}
