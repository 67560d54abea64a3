use crate::shared::config;
use crate::shared::data::schema::{ColumnSpec, SchemaAdapter, SchemaError, SeedValue, SqliteSchema};
use contracts::system::SchemaVersion;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::SqliteConnection;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Имя модуля в таблице setup_module
pub const MODULE_NAME: &str = "ec_marketplaces";

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Schema step {version} '{step}' failed on {change}: {source}")]
    StepFailed {
        version: SchemaVersion,
        step: String,
        change: String,
        #[source]
        source: SchemaError,
    },
    #[error("Recorded schema version is invalid: {0}")]
    InvalidRecordedVersion(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

// ============================================================================
// Guards
// ============================================================================

/// Условие, проверяемое по живой схеме перед изменением
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    TableExists(String),
    TableMissing(String),
    ColumnExists { table: String, column: String },
    ColumnMissing { table: String, column: String },
    /// Колонка есть, и ее объявленный тип уже целевого
    ColumnNarrower { table: String, column: ColumnSpec },
    RowMissing { table: String, key_column: String, key: i64 },
}

impl Guard {
    pub async fn holds<A>(&self, schema: &mut A) -> Result<bool, SchemaError>
    where
        A: SchemaAdapter + ?Sized,
    {
        match self {
            Self::TableExists(table) => schema.table_exists(table).await,
            Self::TableMissing(table) => Ok(!schema.table_exists(table).await?),
            Self::ColumnExists { table, column } => schema.column_exists(table, column).await,
            Self::ColumnMissing { table, column } => Ok(!schema.column_exists(table, column).await?),
            Self::ColumnNarrower { table, column } => Ok(schema
                .column_type(table, &column.name)
                .await?
                .map_or(false, |declared| column.column_type.is_wider_than_declared(&declared))),
            Self::RowMissing {
                table,
                key_column,
                key,
            } => Ok(!schema.row_exists(table, key_column, *key).await?),
        }
    }
}

// ============================================================================
// Changes and steps
// ============================================================================

/// Одно структурное изменение схемы
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaChange {
    CreateTable { table: String, columns: Vec<ColumnSpec> },
    AddColumn { table: String, column: ColumnSpec },
    WidenColumn { table: String, column: ColumnSpec },
    /// Строка начальных данных; первое значение является ключом
    SeedRow {
        table: String,
        key_column: String,
        key: i64,
        values: Vec<(String, SeedValue)>,
    },
}

impl SchemaChange {
    pub fn create_table(table: &str, columns: Vec<ColumnSpec>) -> Self {
        Self::CreateTable {
            table: table.to_string(),
            columns,
        }
    }

    pub fn add_column(table: &str, column: ColumnSpec) -> Self {
        Self::AddColumn {
            table: table.to_string(),
            column,
        }
    }

    pub fn widen_column(table: &str, column: ColumnSpec) -> Self {
        Self::WidenColumn {
            table: table.to_string(),
            column,
        }
    }

    pub fn seed_row(table: &str, key_column: &str, key: i64, values: Vec<(&str, SeedValue)>) -> Self {
        let mut row = vec![(key_column.to_string(), SeedValue::Integer(key))];
        row.extend(values.into_iter().map(|(name, value)| (name.to_string(), value)));
        Self::SeedRow {
            table: table.to_string(),
            key_column: key_column.to_string(),
            key,
            values: row,
        }
    }

    /// Все условия должны выполняться, иначе изменение пропускается
    pub fn guards(&self) -> Vec<Guard> {
        match self {
            Self::CreateTable { table, .. } => vec![Guard::TableMissing(table.clone())],
            Self::AddColumn { table, column } => vec![
                Guard::TableExists(table.clone()),
                Guard::ColumnMissing {
                    table: table.clone(),
                    column: column.name.clone(),
                },
            ],
            Self::WidenColumn { table, column } => vec![
                Guard::ColumnExists {
                    table: table.clone(),
                    column: column.name.clone(),
                },
                Guard::ColumnNarrower {
                    table: table.clone(),
                    column: column.clone(),
                },
            ],
            Self::SeedRow {
                table,
                key_column,
                key,
                ..
            } => vec![
                Guard::TableExists(table.clone()),
                Guard::RowMissing {
                    table: table.clone(),
                    key_column: key_column.clone(),
                    key: *key,
                },
            ],
        }
    }

    async fn guards_hold<A>(&self, schema: &mut A) -> Result<bool, SchemaError>
    where
        A: SchemaAdapter + ?Sized,
    {
        for guard in self.guards() {
            if !guard.holds(schema).await? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    async fn apply<A>(&self, schema: &mut A) -> Result<(), SchemaError>
    where
        A: SchemaAdapter + ?Sized,
    {
        match self {
            Self::CreateTable { table, columns } => schema.create_table(table, columns).await,
            Self::AddColumn { table, column } => schema.add_column(table, column).await,
            Self::WidenColumn { table, column } => schema.modify_column(table, column).await,
            Self::SeedRow { table, values, .. } => schema.insert_row(table, values).await,
        }
    }
}

impl fmt::Display for SchemaChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateTable { table, .. } => write!(f, "create table {}", table),
            Self::AddColumn { table, column } => write!(f, "add column {}.{}", table, column.name),
            Self::WidenColumn { table, column } => write!(
                f,
                "modify column {}.{} to {}",
                table,
                column.name,
                column.column_type.sql()
            ),
            Self::SeedRow {
                table,
                key_column,
                key,
                ..
            } => write!(f, "seed row {}.{} = {}", table, key_column, key),
        }
    }
}

/// Версионированный шаг обновления схемы
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStep {
    pub version: SchemaVersion,
    pub name: String,
    pub changes: Vec<SchemaChange>,
}

impl MigrationStep {
    pub fn new(version: SchemaVersion, name: &str, changes: Vec<SchemaChange>) -> Self {
        Self {
            version,
            name: name.to_string(),
            changes,
        }
    }
}

// ============================================================================
// Runner
// ============================================================================

/// Результат применения одного изменения
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeOutcome {
    pub version: SchemaVersion,
    pub change: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpgradeReport {
    pub from: Option<SchemaVersion>,
    /// Версия после обновления: последняя версия среди шагов или исходная
    pub to: Option<SchemaVersion>,
    pub applied: Vec<ChangeOutcome>,
    /// Изменения, условия которых не выполнились (уже применены или неприменимы)
    pub skipped: Vec<ChangeOutcome>,
}

impl UpgradeReport {
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }
}

/// Последовательное применение шагов схемы с версией выше текущей
pub struct MigrationRunner {
    steps: Vec<MigrationStep>,
}

impl MigrationRunner {
    pub fn new(mut steps: Vec<MigrationStep>) -> Self {
        steps.sort_by_key(|step| step.version);
        Self { steps }
    }

    pub fn steps(&self) -> &[MigrationStep] {
        &self.steps
    }

    pub fn latest_version(&self) -> Option<SchemaVersion> {
        self.steps.last().map(|step| step.version)
    }

    /// `current = None`: чистая установка, выполняются все шаги.
    ///
    /// Повторный запуск безопасен: каждое изменение заново проверяет свои
    /// условия по живой схеме, а не по записанной версии.
    pub async fn upgrade<A>(
        &self,
        schema: &mut A,
        current: Option<SchemaVersion>,
    ) -> Result<UpgradeReport, MigrationError>
    where
        A: SchemaAdapter + ?Sized,
    {
        let mut report = UpgradeReport {
            from: current,
            to: current,
            ..Default::default()
        };

        let pending = self
            .steps
            .iter()
            .filter(|step| current.map_or(true, |version| step.version > version));

        for step in pending {
            tracing::info!("Schema step {} '{}'", step.version, step.name);

            for change in &step.changes {
                let outcome = ChangeOutcome {
                    version: step.version,
                    change: change.to_string(),
                };
                let failed = |source: SchemaError| MigrationError::StepFailed {
                    version: step.version,
                    step: step.name.clone(),
                    change: change.to_string(),
                    source,
                };

                if !change.guards_hold(schema).await.map_err(failed)? {
                    tracing::info!("  skip: {}", outcome.change);
                    report.skipped.push(outcome);
                    continue;
                }

                change.apply(schema).await.map_err(failed)?;
                tracing::info!("  applied: {}", outcome.change);
                report.applied.push(outcome);
            }

            report.to = Some(step.version);
        }

        Ok(report)
    }
}

// ============================================================================
// SQLite entry point
// ============================================================================

pub fn build_sqlite_url(path: &Path) -> String {
    let normalized = path.to_string_lossy().replace('\\', "/");
    let needs_leading_slash = !normalized.starts_with('/') && normalized.contains(':');
    let prefix = if needs_leading_slash { "/" } else { "" };
    format!("sqlite://{}{}?mode=rwc", prefix, normalized)
}

async fn ensure_version_table(conn: &mut SqliteConnection) -> Result<(), MigrationError> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS setup_module (
            module TEXT PRIMARY KEY NOT NULL,
            schema_version TEXT NOT NULL
        )",
    )
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn recorded_version(
    conn: &mut SqliteConnection,
) -> Result<Option<SchemaVersion>, MigrationError> {
    let recorded: Option<String> =
        sqlx::query_scalar("SELECT schema_version FROM setup_module WHERE module = ?1")
            .bind(MODULE_NAME)
            .fetch_optional(&mut *conn)
            .await?;

    recorded
        .map(|value| SchemaVersion::from_str(&value).map_err(MigrationError::InvalidRecordedVersion))
        .transpose()
}

async fn record_version(conn: &mut SqliteConnection, version: SchemaVersion) -> Result<(), MigrationError> {
    sqlx::query(
        "INSERT INTO setup_module (module, schema_version) VALUES (?1, ?2)
         ON CONFLICT(module) DO UPDATE SET schema_version = excluded.schema_version",
    )
    .bind(MODULE_NAME)
    .bind(version.to_string())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Обновление схемы модуля одной транзакцией.
/// При ошибке транзакция откатывается при drop.
pub async fn upgrade_database(
    pool: &SqlitePool,
    runner: &MigrationRunner,
) -> Result<UpgradeReport, MigrationError> {
    let mut tx = pool.begin().await?;

    ensure_version_table(&mut tx).await?;
    let current = recorded_version(&mut tx).await?;

    let report = {
        let mut schema = SqliteSchema::new(&mut tx);
        runner.upgrade(&mut schema, current).await?
    };

    if let Some(target) = report.to {
        if current.map_or(true, |version| target > version) {
            record_version(&mut tx, target).await?;
        }
    }

    tx.commit().await?;
    Ok(report)
}

/// Пул для обновления схемы: внешние ключи отключены, чтобы SQLite позволял
/// добавлять колонки со ссылкой и ненулевым значением по умолчанию.
pub async fn connect_for_migrations(db_path: &Path) -> anyhow::Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let options = SqliteConnectOptions::from_str(&build_sqlite_url(db_path))?.foreign_keys(false);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;
    Ok(pool)
}

pub async fn run_migrations(cfg: &config::Config) -> anyhow::Result<()> {
    let db_path = config::get_database_path(cfg)?;

    let pool = connect_for_migrations(&db_path).await?;
    let runner = MigrationRunner::new(crate::shared::data::migrations::module_steps());

    let report = upgrade_database(&pool, &runner).await?;
    if report.is_noop() {
        tracing::info!(
            "Database schema is up to date ({})",
            report.to.map(|v| v.to_string()).unwrap_or_else(|| "empty".into())
        );
    } else {
        tracing::info!(
            "Database migrations applied successfully: {} change(s), {} skipped, version {:?} -> {:?}",
            report.applied.len(),
            report.skipped.len(),
            report.from.map(|v| v.to_string()),
            report.to.map(|v| v.to_string())
        );
    }

    pool.close().await;
    Ok(())
}
