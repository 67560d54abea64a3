use once_cell::sync::OnceCell;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

use super::migration_runner::build_sqlite_url;
use crate::shared::config::{self, Config};

static DB_CONN: OnceCell<DatabaseConnection> = OnceCell::new();

/// Подключение к базе модуля. Схема должна быть обновлена заранее
/// (`migration_runner::run_migrations`).
pub async fn initialize_database(cfg: &Config) -> anyhow::Result<()> {
    let db_path = config::get_database_path(cfg)?;
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut options = ConnectOptions::new(build_sqlite_url(&db_path));
    options.sqlx_logging(false);
    let conn = Database::connect(options).await?;
    tracing::info!("Database connected: {}", db_path.display());

    DB_CONN
        .set(conn)
        .map_err(|_| anyhow::anyhow!("Failed to set DB_CONN"))?;
    Ok(())
}

pub fn get_connection() -> anyhow::Result<&'static DatabaseConnection> {
    DB_CONN
        .get()
        .ok_or_else(|| anyhow::anyhow!("Database connection has not been initialized"))
}

/// База в памяти со схемой модуля для тестов репозиториев.
/// Схема обновляется без внешних ключей, затем они включаются, как в рабочем подключении.
#[cfg(test)]
pub async fn memory_database() -> DatabaseConnection {
    use super::migration_runner::{upgrade_database, MigrationRunner};
    use super::migrations::module_steps;
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
    use std::str::FromStr;

    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(false);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();
    upgrade_database(&pool, &MigrationRunner::new(module_steps()))
        .await
        .unwrap();
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await
        .unwrap();
    sea_orm::SqlxSqliteConnector::from_sqlx_sqlite_pool(pool)
}

/// Витрина для тестов со ссылками на store
#[cfg(test)]
pub async fn seed_store(conn: &DatabaseConnection, store_id: i32, code: &str) {
    use sea_orm::ConnectionTrait;

    conn.execute_unprepared(&format!(
        "INSERT INTO store (store_id, code, name) VALUES ({}, '{}', '{}')",
        store_id, code, code
    ))
    .await
    .unwrap();
}
