use sqlx::{postgres::PgPoolOptions, Pool, Postgres};
use std::time::Duration;
use tracing::info;

#[derive(Clone)]
pub struct Database {
    pub pool: Pool<Postgres>,
}

impl Database {
    /// Пул соединений; `acquire_timeout_seconds` ограничивает ожидание
    /// свободного соединения, чтобы запрос не висел при исчерпанном пуле.
    pub async fn new(
        database_url: &str,
        pool_size: u32,
        acquire_timeout_seconds: u64,
    ) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(Duration::from_secs(acquire_timeout_seconds))
            .connect(database_url)
            .await?;

        Ok(Database { pool })
    }

    // Для тестов: пул уже создан снаружи
    pub fn from_pool(pool: Pool<Postgres>) -> Self {
        Database { pool }
    }

    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Applying theater schema migrations...");
        sqlx::migrate!("./src/migrations")
            .run(&self.pool)
            .await?;
        info!("Migrations completed");
        Ok(())
    }
}
