use crate::pipeline::estimate::EmissionsEstimate;
use crate::pipeline::recommend::Recommendation;
use crate::pipeline::validate::WorkloadRequest;
use anyhow::Result;
use rusqlite::{params, Connection};
use serde::Serialize;

pub fn ping(conn: &Connection) -> Result<()> {
    conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
    Ok(())
}

// --- Calculations ---
pub fn insert_calculation(
    conn: &Connection,
    user_id: &str,
    workload: &WorkloadRequest,
    estimate: &EmissionsEstimate,
) -> Result<String> {
    let id = uuid::Uuid::new_v4().to_string();
    let gpu_type = Some(workload.accelerator_label.as_str()).filter(|s| !s.is_empty());
    conn.execute(
        "INSERT INTO calculations (id, user_id, model_name, tokens, gpu_type, cloud_region, carbon_intensity, energy_kwh, co2_kg, sustainability_score) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            id,
            user_id,
            workload.model_name,
            workload.tokens as i64,
            gpu_type,
            workload.cloud_region,
            estimate.carbon_intensity_g_per_kwh,
            estimate.energy_kwh,
            estimate.co2_kg,
            estimate.sustainability_score,
        ],
    )?;
    Ok(id)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationRecord {
    pub id: String,
    pub model_name: String,
    pub tokens: i64,
    pub gpu_type: Option<String>,
    pub cloud_region: String,
    pub carbon_intensity: i64,
    pub energy_kwh: f64,
    pub co2_kg: f64,
    pub sustainability_score: i64,
    pub created_at: String,
}

/// Newest first; rows inserted in the same second keep insertion order.
pub fn get_recent_calculations(
    conn: &Connection,
    user_id: &str,
    limit: usize,
) -> Result<Vec<CalculationRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, model_name, tokens, gpu_type, cloud_region, carbon_intensity, energy_kwh, co2_kg, sustainability_score, created_at FROM calculations WHERE user_id = ?1 ORDER BY created_at DESC, rowid DESC LIMIT ?2",
    )?;
    let rows = stmt.query_map(params![user_id, limit as i64], |row| {
        Ok(CalculationRecord {
            id: row.get(0)?,
            model_name: row.get(1)?,
            tokens: row.get(2)?,
            gpu_type: row.get(3)?,
            cloud_region: row.get(4)?,
            carbon_intensity: row.get(5)?,
            energy_kwh: row.get(6)?,
            co2_kg: row.get(7)?,
            sustainability_score: row.get(8)?,
            created_at: row.get(9)?,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn calculation_belongs_to(conn: &Connection, calculation_id: &str, user_id: &str) -> Result<bool> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM calculations WHERE id = ?1 AND user_id = ?2",
        params![calculation_id, user_id],
        |row| row.get(0),
    )?;
    Ok(n > 0)
}

// --- Prompts ---
pub struct PromptRecord<'a> {
    pub original_prompt: &'a str,
    pub original_tokens: i64,
    pub optimized_prompt: &'a str,
    pub optimized_tokens: i64,
    pub tokens_saved: i64,
    pub co2_saved_kg: f64,
}

pub fn insert_prompt(conn: &Connection, user_id: &str, prompt: &PromptRecord<'_>) -> Result<String> {
    let id = uuid::Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO prompts (id, user_id, original_prompt, original_tokens, optimized_prompt, optimized_tokens, tokens_saved, co2_saved_kg) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            id,
            user_id,
            prompt.original_prompt,
            prompt.original_tokens,
            prompt.optimized_prompt,
            prompt.optimized_tokens,
            prompt.tokens_saved,
            prompt.co2_saved_kg,
        ],
    )?;
    Ok(id)
}

#[cfg(test)]
pub fn count_prompts(conn: &Connection, user_id: &str) -> Result<i64> {
    let n = conn.query_row(
        "SELECT COUNT(*) FROM prompts WHERE user_id = ?1",
        params![user_id],
        |row| row.get(0),
    )?;
    Ok(n)
}

// --- Recommendations ---

/// Inserts all recommendations or none.
pub fn insert_recommendations(
    conn: &Connection,
    calculation_id: Option<&str>,
    recs: &[Recommendation],
) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    for rec in recs {
        tx.execute(
            "INSERT INTO recommendations (id, calculation_id, recommendation_type, title, description, estimated_reduction_percent, priority) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                uuid::Uuid::new_v4().to_string(),
                calculation_id,
                rec.kind,
                rec.title,
                rec.description,
                rec.estimated_reduction_percent,
                rec.priority,
            ],
        )?;
    }
    tx.commit()?;
    Ok(recs.len())
}

#[cfg(test)]
pub fn count_recommendations(conn: &Connection, calculation_id: &str) -> Result<i64> {
    let n = conn.query_row(
        "SELECT COUNT(*) FROM recommendations WHERE calculation_id = ?1",
        params![calculation_id],
        |row| row.get(0),
    )?;
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory;
    use crate::pipeline::coefficients::CoefficientTables;
    use crate::pipeline::estimate::estimate;
    use crate::pipeline::recommend::fallback_recommendations;

    fn workload(model: &str, accelerator: &str) -> WorkloadRequest {
        WorkloadRequest {
            model_name: model.into(),
            tokens: 1_000_000,
            accelerator_label: accelerator.into(),
            cloud_region: "eu-west-1".into(),
        }
    }

    fn insert(conn: &Connection, user: &str, model: &str) -> String {
        let w = workload(model, "");
        let e = estimate(&CoefficientTables::builtin(), &w);
        insert_calculation(conn, user, &w, &e).unwrap()
    }

    #[test]
    fn calculation_round_trips_through_table() {
        let conn = open_memory();
        let w = workload("gpt-4", "A100");
        let e = estimate(&CoefficientTables::builtin(), &w);
        let id = insert_calculation(&conn, "user-1", &w, &e).unwrap();

        let rows = get_recent_calculations(&conn, "user-1", 10).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, id);
        assert_eq!(rows[0].gpu_type.as_deref(), Some("A100"));
        assert_eq!(rows[0].carbon_intensity, 280);
        assert_eq!(rows[0].sustainability_score, 74);
        assert_eq!(rows[0].energy_kwh, 0.47);
    }

    #[test]
    fn empty_accelerator_is_stored_as_null() {
        let conn = open_memory();
        insert(&conn, "user-1", "gpt-4");
        let rows = get_recent_calculations(&conn, "user-1", 10).unwrap();
        assert_eq!(rows[0].gpu_type, None);
    }

    #[test]
    fn recent_calculations_are_scoped_and_ordered() {
        let conn = open_memory();
        insert(&conn, "user-1", "first");
        insert(&conn, "user-2", "other");
        insert(&conn, "user-1", "second");
        insert(&conn, "user-1", "third");

        let rows = get_recent_calculations(&conn, "user-1", 2).unwrap();
        let models: Vec<_> = rows.iter().map(|r| r.model_name.as_str()).collect();
        assert_eq!(models, vec!["third", "second"]);
    }

    #[test]
    fn calculation_ownership_is_per_user() {
        let conn = open_memory();
        let id = insert(&conn, "user-1", "gpt-4");
        assert!(calculation_belongs_to(&conn, &id, "user-1").unwrap());
        assert!(!calculation_belongs_to(&conn, &id, "user-2").unwrap());
        assert!(!calculation_belongs_to(&conn, "missing", "user-1").unwrap());
    }

    #[test]
    fn undecodable_history_row_is_an_error() {
        let conn = open_memory();
        insert(&conn, "user-1", "gpt-4");
        conn.execute("UPDATE calculations SET tokens = 'lots'", []).unwrap();
        assert!(get_recent_calculations(&conn, "user-1", 10).is_err());
    }

    #[test]
    fn prompts_are_counted_per_user() {
        let conn = open_memory();
        let record = PromptRecord {
            original_prompt: "please summarize",
            original_tokens: 4,
            optimized_prompt: "summarize",
            optimized_tokens: 3,
            tokens_saved: 1,
            co2_saved_kg: 0.0000001125,
        };
        insert_prompt(&conn, "user-1", &record).unwrap();
        insert_prompt(&conn, "user-1", &record).unwrap();
        assert_eq!(count_prompts(&conn, "user-1").unwrap(), 2);
        assert_eq!(count_prompts(&conn, "user-2").unwrap(), 0);
    }

    #[test]
    fn recommendations_link_to_calculation() {
        let conn = open_memory();
        let calc_id = insert(&conn, "user-1", "gpt-4");
        let n = insert_recommendations(&conn, Some(&calc_id), &fallback_recommendations()).unwrap();
        assert_eq!(n, 3);
        assert_eq!(count_recommendations(&conn, &calc_id).unwrap(), 3);

        insert_recommendations(&conn, None, &fallback_recommendations()).unwrap();
    }

    #[test]
    fn unknown_calculation_id_inserts_nothing() {
        let conn = open_memory();
        assert!(insert_recommendations(&conn, Some("missing"), &fallback_recommendations()).is_err());
        let total: i64 = conn
            .query_row("SELECT COUNT(*) FROM recommendations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(total, 0);
    }
}
