use anyhow::Result;
use rusqlite::Connection;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS calculations (
            id TEXT PRIMARY KEY,
            user_id TEXT,
            model_name TEXT NOT NULL,
            tokens INTEGER NOT NULL,
            gpu_type TEXT,
            cloud_region TEXT NOT NULL,
            carbon_intensity INTEGER NOT NULL,
            energy_kwh REAL NOT NULL,
            co2_kg REAL NOT NULL,
            sustainability_score INTEGER NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_calculations_user_created
            ON calculations(user_id, created_at);

        CREATE TABLE IF NOT EXISTS prompts (
            id TEXT PRIMARY KEY,
            user_id TEXT,
            original_prompt TEXT NOT NULL,
            original_tokens INTEGER NOT NULL,
            optimized_prompt TEXT NOT NULL,
            optimized_tokens INTEGER NOT NULL,
            tokens_saved INTEGER NOT NULL,
            co2_saved_kg REAL NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS recommendations (
            id TEXT PRIMARY KEY,
            calculation_id TEXT,
            recommendation_type TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            estimated_reduction_percent INTEGER NOT NULL,
            priority TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            FOREIGN KEY (calculation_id) REFERENCES calculations(id)
        );
        ",
    )?;

    Ok(())
}
