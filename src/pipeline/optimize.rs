use crate::pipeline::coefficients::{DEFAULT_CARBON_INTENSITY, DEFAULT_ENERGY_PER_MILLION_TOKENS};
use crate::pipeline::estimate::{co2_kg, energy_kwh};

/// Rough token count for free text: one token per 4 characters, rounded up.
pub fn estimate_tokens(text: &str) -> i64 {
    let chars = text.chars().count() as i64;
    (chars + 3) / 4
}

/// CO2 saved by trimming `tokens_saved` tokens, priced at the default model
/// energy and default grid intensity. Negative when the rewrite grew.
pub fn co2_saved_kg(tokens_saved: i64) -> f64 {
    let magnitude = co2_kg(
        energy_kwh(tokens_saved.unsigned_abs(), DEFAULT_ENERGY_PER_MILLION_TOKENS),
        DEFAULT_CARBON_INTENSITY,
    );
    if tokens_saved < 0 {
        -magnitude
    } else {
        magnitude
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationSummary {
    pub original_tokens: i64,
    pub optimized_tokens: i64,
    pub tokens_saved: i64,
    pub co2_saved_kg: f64,
}

pub fn summarize(original: &str, optimized: &str) -> OptimizationSummary {
    let original_tokens = estimate_tokens(original);
    let optimized_tokens = estimate_tokens(optimized);
    let tokens_saved = original_tokens - optimized_tokens;
    OptimizationSummary {
        original_tokens,
        optimized_tokens,
        tokens_saved,
        co2_saved_kg: co2_saved_kg(tokens_saved),
    }
}
