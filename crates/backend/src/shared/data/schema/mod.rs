//! Описание структуры таблиц и доступ к живой схеме базы данных.

pub mod sqlite;

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

pub use sqlite::SqliteSchema;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Table '{0}' does not exist")]
    TableNotFound(String),
    #[error("Column '{table}.{column}' does not exist")]
    ColumnNotFound { table: String, column: String },
    #[error("Table '{0}' already exists")]
    TableExists(String),
}

// ============================================================================
// Column definitions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    SmallInt,
    Integer,
    Varchar(u32),
    Text,
}

impl ColumnType {
    /// Объявленный тип колонки в SQL
    pub fn sql(&self) -> String {
        match self {
            Self::SmallInt => "SMALLINT".to_string(),
            Self::Integer => "INTEGER".to_string(),
            Self::Varchar(length) => format!("VARCHAR({})", length),
            Self::Text => "TEXT".to_string(),
        }
    }

    /// Сравнение с объявленным типом из метаданных схемы (без учета регистра и пробелов)
    pub fn matches_declared(&self, declared: &str) -> bool {
        normalize_type(&self.sql()) == normalize_type(declared)
    }

    /// Колонка с объявленным типом `declared` уже этого типа.
    /// Более длинный VARCHAR и TEXT не сужаются.
    pub fn is_wider_than_declared(&self, declared: &str) -> bool {
        if self.matches_declared(declared) {
            return false;
        }
        match self {
            Self::Varchar(target) => {
                let declared = normalize_type(declared);
                if declared == "TEXT" {
                    return false;
                }
                declared
                    .strip_prefix("VARCHAR(")
                    .and_then(|rest| rest.strip_suffix(')'))
                    .and_then(|length| length.parse::<u32>().ok())
                    .map_or(true, |current| current < *target)
            }
            _ => true,
        }
    }
}

fn normalize_type(declared: &str) -> String {
    declared
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnDelete {
    Cascade,
    SetNull,
    SetDefault,
    Restrict,
}

impl OnDelete {
    pub fn sql(&self) -> &'static str {
        match self {
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
            Self::Restrict => "RESTRICT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeySpec {
    pub table: String,
    pub column: String,
    pub on_delete: OnDelete,
}

/// Описание колонки для создания или изменения
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
    /// `None`: DEFAULT NULL (или без значения по умолчанию для NOT NULL)
    pub default: Option<i64>,
    pub primary_key: bool,
    pub references: Option<ForeignKeySpec>,
}

impl ColumnSpec {
    pub fn new(name: &str, column_type: ColumnType) -> Self {
        Self {
            name: name.to_string(),
            column_type,
            nullable: true,
            default: None,
            primary_key: false,
            references: None,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn default_value(mut self, value: i64) -> Self {
        self.default = Some(value);
        self
    }

    pub fn references(mut self, table: &str, column: &str, on_delete: OnDelete) -> Self {
        self.references = Some(ForeignKeySpec {
            table: table.to_string(),
            column: column.to_string(),
            on_delete,
        });
        self
    }

    /// Определение колонки для CREATE TABLE / ALTER TABLE ADD COLUMN
    pub fn definition_sql(&self) -> String {
        let mut sql = format!("{} {}", quote_ident(&self.name), self.column_type.sql());
        if self.primary_key {
            sql.push_str(" PRIMARY KEY");
        } else if !self.nullable {
            sql.push_str(" NOT NULL");
        }
        if let Some(value) = self.default {
            sql.push_str(&format!(" DEFAULT {}", value));
        } else if self.nullable && !self.primary_key {
            sql.push_str(" DEFAULT NULL");
        }
        if let Some(fk) = &self.references {
            sql.push_str(&format!(
                " REFERENCES {}({}) ON DELETE {}",
                quote_ident(&fk.table),
                quote_ident(&fk.column),
                fk.on_delete.sql()
            ));
        }
        sql
    }
}

impl fmt::Display for ColumnSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.definition_sql())
    }
}

/// Значение колонки для начальных данных
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedValue {
    Integer(i64),
    Text(String),
}

pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

// ============================================================================
// Live schema access
// ============================================================================

/// Чтение метаданных и структурные изменения живой схемы.
/// Все вызовы одного обновления выполняются в рамках одной транзакции.
#[async_trait]
pub trait SchemaAdapter: Send {
    async fn table_exists(&mut self, table: &str) -> Result<bool, SchemaError>;

    async fn column_exists(&mut self, table: &str, column: &str) -> Result<bool, SchemaError>;

    /// Объявленный тип колонки или `None`, если колонки нет
    async fn column_type(&mut self, table: &str, column: &str) -> Result<Option<String>, SchemaError>;

    async fn create_table(&mut self, table: &str, columns: &[ColumnSpec]) -> Result<(), SchemaError>;

    async fn add_column(&mut self, table: &str, column: &ColumnSpec) -> Result<(), SchemaError>;

    /// Замена определения существующей колонки с сохранением данных
    async fn modify_column(&mut self, table: &str, column: &ColumnSpec) -> Result<(), SchemaError>;

    async fn row_exists(&mut self, table: &str, key_column: &str, key: i64) -> Result<bool, SchemaError>;

    async fn insert_row(&mut self, table: &str, values: &[(String, SeedValue)]) -> Result<(), SchemaError>;
}
