use crate::db::queries::CalculationRecord;
use serde::Serialize;

const TREND_POINTS: usize = 7;
const TOP_MODELS: usize = 5;

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_calculations: usize,
    pub total_co2_kg: f64,
    pub total_energy_kwh: f64,
    pub avg_score: i64,
    pub trend: Vec<TrendPoint>,
    pub by_model: Vec<ModelUsage>,
    pub by_region: Vec<RegionUsage>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub date: String,
    pub co2_kg: f64,
    pub energy_kwh: f64,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModelUsage {
    pub name: String,
    pub co2_kg: f64,
    pub count: usize,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RegionUsage {
    pub name: String,
    pub co2_kg: f64,
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

fn day_of(created_at: &str) -> String {
    chrono::NaiveDateTime::parse_from_str(created_at, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| created_at.to_string())
}

/// Aggregates `rows`, which must be ordered newest first.
pub fn summarize(rows: &[CalculationRecord]) -> DashboardStats {
    if rows.is_empty() {
        return DashboardStats {
            total_calculations: 0,
            total_co2_kg: 0.0,
            total_energy_kwh: 0.0,
            avg_score: 0,
            trend: Vec::new(),
            by_model: Vec::new(),
            by_region: Vec::new(),
        };
    }

    let total_co2: f64 = rows.iter().map(|r| r.co2_kg).sum();
    let total_energy: f64 = rows.iter().map(|r| r.energy_kwh).sum();
    let score_sum: i64 = rows.iter().map(|r| r.sustainability_score).sum();
    let avg_score = (score_sum as f64 / rows.len() as f64).round() as i64;

    let trend = rows
        .iter()
        .take(TREND_POINTS)
        .rev()
        .map(|r| TrendPoint {
            date: day_of(&r.created_at),
            co2_kg: r.co2_kg,
            energy_kwh: r.energy_kwh,
        })
        .collect();

    // Grouping keeps first-seen order, i.e. most recently used first.
    let mut by_model: Vec<ModelUsage> = Vec::new();
    let mut by_region: Vec<RegionUsage> = Vec::new();
    for r in rows {
        match by_model.iter_mut().find(|m| m.name == r.model_name) {
            Some(m) => {
                m.co2_kg += r.co2_kg;
                m.count += 1;
            }
            None => by_model.push(ModelUsage {
                name: r.model_name.clone(),
                co2_kg: r.co2_kg,
                count: 1,
            }),
        }
        match by_region.iter_mut().find(|g| g.name == r.cloud_region) {
            Some(g) => g.co2_kg += r.co2_kg,
            None => by_region.push(RegionUsage {
                name: r.cloud_region.clone(),
                co2_kg: r.co2_kg,
            }),
        }
    }
    by_model.truncate(TOP_MODELS);

    DashboardStats {
        total_calculations: rows.len(),
        total_co2_kg: round3(total_co2),
        total_energy_kwh: round3(total_energy),
        avg_score,
        trend,
        by_model,
        by_region,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(model: &str, region: &str, co2: f64, score: i64, created_at: &str) -> CalculationRecord {
        CalculationRecord {
            id: uuid::Uuid::new_v4().to_string(),
            model_name: model.into(),
            tokens: 1_000_000,
            gpu_type: None,
            cloud_region: region.into(),
            carbon_intensity: 450,
            energy_kwh: co2 * 2.0,
            co2_kg: co2,
            sustainability_score: score,
            created_at: created_at.into(),
        }
    }

    #[test]
    fn empty_history_is_all_zero() {
        let stats = summarize(&[]);
        assert_eq!(stats.total_calculations, 0);
        assert_eq!(stats.avg_score, 0);
        assert!(stats.trend.is_empty());
        assert!(stats.by_model.is_empty());
    }

    #[test]
    fn totals_and_average() {
        let rows = vec![
            row("gpt-4", "eu-west-1", 0.1316, 74, "2026-03-02 10:00:00"),
            row("gpt-4", "us-east-1", 0.2, 60, "2026-03-01 09:00:00"),
            row("gemini-pro", "eu-west-1", 0.0001, 100, "2026-02-28 08:00:00"),
        ];
        let stats = summarize(&rows);
        assert_eq!(stats.total_calculations, 3);
        assert_eq!(stats.total_co2_kg, 0.332);
        assert_eq!(stats.total_energy_kwh, 0.663);
        assert_eq!(stats.avg_score, 78);

        assert_eq!(stats.by_model.len(), 2);
        assert_eq!(stats.by_model[0].name, "gpt-4");
        assert_eq!(stats.by_model[0].count, 2);
        assert_eq!(stats.by_region[0].name, "eu-west-1");
        assert!((stats.by_region[0].co2_kg - 0.1317).abs() < 1e-12);
    }

    #[test]
    fn trend_is_latest_seven_oldest_first() {
        let rows: Vec<_> = (0..10)
            .map(|i| row("gpt-4", "eu-west-1", i as f64, 50, &format!("2026-03-{:02} 12:00:00", 20 - i)))
            .collect();
        let stats = summarize(&rows);
        assert_eq!(stats.trend.len(), 7);
        assert_eq!(stats.trend[0].date, "2026-03-14");
        assert_eq!(stats.trend[6].date, "2026-03-20");
        assert_eq!(stats.trend[6].co2_kg, 0.0);
    }

    #[test]
    fn at_most_five_models() {
        let rows: Vec<_> = ["a", "b", "c", "d", "e", "f", "a"]
            .iter()
            .map(|m| row(m, "r", 0.01, 90, "2026-03-01 00:00:00"))
            .collect();
        let stats = summarize(&rows);
        assert_eq!(stats.by_model.len(), 5);
        assert_eq!(stats.by_model[0].count, 2);
        assert!(stats.by_model.iter().all(|m| m.name != "f"));
    }
}
