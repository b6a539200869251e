use crate::config::Config;
use crate::pipeline::coefficients::CoefficientTables;
use rusqlite::Connection;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: Arc<Config>,
    pub coefficients: Arc<CoefficientTables>,
}

impl AppState {
    pub fn new(conn: Connection, config: Config, coefficients: CoefficientTables) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            config: Arc::new(config),
            coefficients: Arc::new(coefficients),
        }
    }
}
