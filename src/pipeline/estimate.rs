use crate::pipeline::coefficients::CoefficientTables;
use crate::pipeline::validate::WorkloadRequest;

/// CO2 output (kg) at which the sustainability score bottoms out at 0.
pub const SCORE_CEILING_CO2_KG: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmissionsEstimate {
    pub energy_kwh: f64,
    pub co2_kg: f64,
    pub carbon_intensity_g_per_kwh: u32,
    pub sustainability_score: u8,
}

pub fn energy_kwh(tokens: u64, energy_per_million_tokens: f64) -> f64 {
    (tokens as f64 / 1_000_000.0) * energy_per_million_tokens
}

pub fn co2_kg(energy_kwh: f64, carbon_intensity: u32) -> f64 {
    energy_kwh * carbon_intensity as f64 / 1000.0
}

/// Linear 0-100 score: 0 kg maps to 100, the ceiling or more maps to 0.
pub fn sustainability_score(co2_kg: f64) -> u8 {
    let raw = ((1.0 - co2_kg / SCORE_CEILING_CO2_KG) * 100.0).round();
    raw.clamp(0.0, 100.0) as u8
}

pub fn estimate(tables: &CoefficientTables, req: &WorkloadRequest) -> EmissionsEstimate {
    let carbon_intensity = tables.carbon_intensity(&req.cloud_region);
    let energy = energy_kwh(req.tokens, tables.energy_per_million_tokens(&req.model_name));
    let co2 = co2_kg(energy, carbon_intensity);

    EmissionsEstimate {
        energy_kwh: energy,
        co2_kg: co2,
        carbon_intensity_g_per_kwh: carbon_intensity,
        sustainability_score: sustainability_score(co2),
    }
}
