use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// kWh per 1M tokens for models missing from the table.
pub const DEFAULT_ENERGY_PER_MILLION_TOKENS: f64 = 0.25;
/// g CO2/kWh for regions missing from the table.
pub const DEFAULT_CARBON_INTENSITY: u32 = 450;

const BUILTIN_MODELS: &[(&str, f64, &str)] = &[
    ("gpt-4", 0.47, "GPT-4"),
    ("gpt-3.5-turbo", 0.06, "GPT-3.5 Turbo"),
    ("claude-3-opus", 0.45, "Claude 3 Opus"),
    ("claude-3-sonnet", 0.15, "Claude 3 Sonnet"),
    ("gemini-pro", 0.12, "Gemini Pro"),
    ("llama-2-70b", 0.35, "Llama 2 70B"),
    ("mistral-large", 0.28, "Mistral Large"),
];

const BUILTIN_REGIONS: &[(&str, u32, &str)] = &[
    ("us-west-1", 350, "US West (California)"),
    ("us-east-1", 450, "US East (Virginia)"),
    ("eu-west-1", 280, "EU West (Ireland)"),
    ("eu-central-1", 420, "EU Central (Germany)"),
    ("ap-southeast-1", 700, "Asia Pacific (Singapore)"),
    ("ap-northeast-1", 550, "Asia Pacific (Tokyo)"),
];

/// Per-model energy and per-region grid intensity. Built once at startup and
/// shared read-only.
#[derive(Debug, Clone)]
pub struct CoefficientTables {
    model_energy: HashMap<String, f64>,
    region_intensity: HashMap<String, u32>,
    labels: HashMap<String, String>,
}

/// Shape of the optional JSON override file.
#[derive(Debug, Default, Deserialize)]
struct CoefficientOverrides {
    #[serde(default)]
    models: HashMap<String, f64>,
    #[serde(default)]
    regions: HashMap<String, u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoefficientEntry<T> {
    pub key: String,
    pub label: Option<String>,
    pub value: T,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoefficientListing {
    pub models: Vec<CoefficientEntry<f64>>,
    pub regions: Vec<CoefficientEntry<u32>>,
    pub default_energy_per_million_tokens: f64,
    pub default_carbon_intensity: u32,
}

impl CoefficientTables {
    pub fn builtin() -> Self {
        let mut labels = HashMap::new();
        let model_energy = BUILTIN_MODELS
            .iter()
            .map(|(key, kwh, label)| {
                labels.insert(key.to_string(), label.to_string());
                (key.to_string(), *kwh)
            })
            .collect();
        let region_intensity = BUILTIN_REGIONS
            .iter()
            .map(|(key, g, label)| {
                labels.insert(key.to_string(), label.to_string());
                (key.to_string(), *g)
            })
            .collect();

        Self {
            model_energy,
            region_intensity,
            labels,
        }
    }

    /// Built-in tables with entries from a JSON file layered on top.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading coefficients from {}", path.display()))?;
        Self::builtin().with_overrides(&raw)
    }

    fn with_overrides(mut self, raw: &str) -> Result<Self> {
        let overrides: CoefficientOverrides =
            serde_json::from_str(raw).context("coefficients file is not valid JSON")?;

        for (model, kwh) in overrides.models {
            if !kwh.is_finite() || kwh < 0.0 {
                anyhow::bail!("energy coefficient for {} must be a non-negative number", model);
            }
            self.model_energy.insert(model, kwh);
        }
        self.region_intensity.extend(overrides.regions);
        Ok(self)
    }

    pub fn energy_per_million_tokens(&self, model: &str) -> f64 {
        self.model_energy
            .get(model)
            .copied()
            .unwrap_or(DEFAULT_ENERGY_PER_MILLION_TOKENS)
    }

    pub fn carbon_intensity(&self, region: &str) -> u32 {
        self.region_intensity
            .get(region)
            .copied()
            .unwrap_or(DEFAULT_CARBON_INTENSITY)
    }

    pub fn listing(&self) -> CoefficientListing {
        let mut models: Vec<_> = self
            .model_energy
            .iter()
            .map(|(key, value)| CoefficientEntry {
                key: key.clone(),
                label: self.labels.get(key).cloned(),
                value: *value,
            })
            .collect();
        models.sort_by(|a, b| a.key.cmp(&b.key));

        let mut regions: Vec<_> = self
            .region_intensity
            .iter()
            .map(|(key, value)| CoefficientEntry {
                key: key.clone(),
                label: self.labels.get(key).cloned(),
                value: *value,
            })
            .collect();
        regions.sort_by(|a, b| a.key.cmp(&b.key));

        CoefficientListing {
            models,
            regions,
            default_energy_per_million_tokens: DEFAULT_ENERGY_PER_MILLION_TOKENS,
            default_carbon_intensity: DEFAULT_CARBON_INTENSITY,
        }
    }
}

impl Default for CoefficientTables {
    fn default() -> Self {
        Self::builtin()
    }
}
