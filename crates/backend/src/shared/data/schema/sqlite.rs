use async_trait::async_trait;
use sqlx::SqliteConnection;

use super::{quote_ident, ColumnSpec, SchemaAdapter, SchemaError, SeedValue};

/// Схема SQLite поверх открытого соединения (обычно: транзакции обновления).
///
/// SQLite не умеет менять колонку на месте, поэтому `modify_column`
/// пересоздает таблицу: новая таблица, копирование строк, удаление старой,
/// переименование, восстановление индексов. Соединение должно быть открыто
/// с `foreign_keys = false`.
pub struct SqliteSchema<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> SqliteSchema<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    async fn execute(&mut self, sql: &str) -> Result<(), SchemaError> {
        tracing::debug!("schema: {}", sql);
        sqlx::query(sql).execute(&mut *self.conn).await?;
        Ok(())
    }

    async fn ensure_table(&mut self, table: &str) -> Result<(), SchemaError> {
        if self.table_exists(table).await? {
            Ok(())
        } else {
            Err(SchemaError::TableNotFound(table.to_string()))
        }
    }
}

/// Колонка из PRAGMA table_info
#[derive(Debug)]
struct TableColumn {
    name: String,
    declared_type: String,
    not_null: bool,
    default: Option<String>,
    pk_position: i64,
}

/// Ограничение из PRAGMA foreign_key_list (может быть составным)
#[derive(Debug)]
struct TableForeignKey {
    id: i64,
    table: String,
    from: Vec<String>,
    to: Vec<String>,
    on_delete: String,
}

impl TableForeignKey {
    fn constraint_sql(&self) -> String {
        let from = self.from.iter().map(|c| quote_ident(c)).collect::<Vec<_>>().join(", ");
        let mut sql = format!("FOREIGN KEY ({}) REFERENCES {}", from, quote_ident(&self.table));
        if !self.to.is_empty() {
            let to = self.to.iter().map(|c| quote_ident(c)).collect::<Vec<_>>().join(", ");
            sql.push_str(&format!("({})", to));
        }
        sql.push_str(&format!(" ON DELETE {}", self.on_delete));
        sql
    }
}

impl<'c> SqliteSchema<'c> {
    async fn table_columns(&mut self, table: &str) -> Result<Vec<TableColumn>, SchemaError> {
        let rows: Vec<(String, String, i64, Option<String>, i64)> = sqlx::query_as(
            "SELECT name, type, \"notnull\", dflt_value, pk FROM pragma_table_info(?1) ORDER BY cid",
        )
        .bind(table)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(name, declared_type, not_null, default, pk_position)| TableColumn {
                name,
                declared_type,
                not_null: not_null != 0,
                default,
                pk_position,
            })
            .collect())
    }

    async fn table_foreign_keys(&mut self, table: &str) -> Result<Vec<TableForeignKey>, SchemaError> {
        let rows: Vec<(i64, String, String, Option<String>, String)> = sqlx::query_as(
            "SELECT id, \"table\", \"from\", \"to\", on_delete FROM pragma_foreign_key_list(?1) ORDER BY id, seq",
        )
        .bind(table)
        .fetch_all(&mut *self.conn)
        .await?;

        let mut keys: Vec<TableForeignKey> = Vec::new();
        for (id, ref_table, from, to, on_delete) in rows {
            match keys.last_mut() {
                Some(key) if key.id == id => {
                    key.from.push(from);
                    key.to.extend(to);
                }
                _ => keys.push(TableForeignKey {
                    id,
                    table: ref_table,
                    from: vec![from],
                    to: to.into_iter().collect(),
                    on_delete,
                }),
            }
        }
        Ok(keys)
    }

    async fn table_indexes(&mut self, table: &str) -> Result<Vec<String>, SchemaError> {
        let rows: Vec<String> = sqlx::query_scalar(
            "SELECT sql FROM sqlite_master WHERE type = 'index' AND tbl_name = ?1 AND sql IS NOT NULL",
        )
        .bind(table)
        .fetch_all(&mut *self.conn)
        .await?;
        Ok(rows)
    }
}

#[async_trait]
impl<'c> SchemaAdapter for SqliteSchema<'c> {
    async fn table_exists(&mut self, table: &str) -> Result<bool, SchemaError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(1) FROM sqlite_master WHERE type='table' AND name = ?1",
        )
        .bind(table)
        .fetch_one(&mut *self.conn)
        .await?;
        Ok(count > 0)
    }

    async fn column_exists(&mut self, table: &str, column: &str) -> Result<bool, SchemaError> {
        Ok(self.column_type(table, column).await?.is_some())
    }

    async fn column_type(&mut self, table: &str, column: &str) -> Result<Option<String>, SchemaError> {
        let declared: Option<String> =
            sqlx::query_scalar("SELECT type FROM pragma_table_info(?1) WHERE name = ?2")
                .bind(table)
                .bind(column)
                .fetch_optional(&mut *self.conn)
                .await?;
        Ok(declared)
    }

    async fn create_table(&mut self, table: &str, columns: &[ColumnSpec]) -> Result<(), SchemaError> {
        if self.table_exists(table).await? {
            return Err(SchemaError::TableExists(table.to_string()));
        }
        let definitions = columns
            .iter()
            .map(ColumnSpec::definition_sql)
            .collect::<Vec<_>>()
            .join(", ");
        self.execute(&format!("CREATE TABLE {} ({})", quote_ident(table), definitions))
            .await
    }

    async fn add_column(&mut self, table: &str, column: &ColumnSpec) -> Result<(), SchemaError> {
        self.ensure_table(table).await?;
        self.execute(&format!(
            "ALTER TABLE {} ADD COLUMN {}",
            quote_ident(table),
            column.definition_sql()
        ))
        .await
    }

    async fn modify_column(&mut self, table: &str, column: &ColumnSpec) -> Result<(), SchemaError> {
        self.ensure_table(table).await?;

        let columns = self.table_columns(table).await?;
        if !columns.iter().any(|c| c.name == column.name) {
            return Err(SchemaError::ColumnNotFound {
                table: table.to_string(),
                column: column.name.clone(),
            });
        }
        let foreign_keys = self.table_foreign_keys(table).await?;
        let indexes = self.table_indexes(table).await?;

        let mut definitions = Vec::with_capacity(columns.len() + foreign_keys.len() + 1);
        for existing in &columns {
            if existing.name == column.name {
                // Первичный ключ задается ограничением таблицы ниже
                let mut replacement = column.clone();
                replacement.primary_key = false;
                if existing.pk_position > 0 {
                    replacement.nullable = false;
                }
                definitions.push(replacement.definition_sql());
            } else {
                let mut definition = format!("{} {}", quote_ident(&existing.name), existing.declared_type);
                if existing.not_null {
                    definition.push_str(" NOT NULL");
                }
                if let Some(default) = &existing.default {
                    definition.push_str(&format!(" DEFAULT {}", default));
                }
                definitions.push(definition);
            }
        }

        let mut primary_key: Vec<&TableColumn> = columns.iter().filter(|c| c.pk_position > 0).collect();
        primary_key.sort_by_key(|c| c.pk_position);
        if !primary_key.is_empty() {
            let names = primary_key
                .iter()
                .map(|c| quote_ident(&c.name))
                .collect::<Vec<_>>()
                .join(", ");
            definitions.push(format!("PRIMARY KEY ({})", names));
        }

        for key in &foreign_keys {
            // Ссылка задается в новом определении колонки
            if column.references.is_some() && key.from.iter().any(|c| c == &column.name) {
                continue;
            }
            definitions.push(key.constraint_sql());
        }

        let rebuild = format!("{}__rebuild", table);
        let column_list = columns
            .iter()
            .map(|c| quote_ident(&c.name))
            .collect::<Vec<_>>()
            .join(", ");

        tracing::info!("Rebuilding table '{}' to modify column '{}'", table, column.name);

        self.execute(&format!(
            "CREATE TABLE {} ({})",
            quote_ident(&rebuild),
            definitions.join(", ")
        ))
        .await?;
        self.execute(&format!(
            "INSERT INTO {} ({}) SELECT {} FROM {}",
            quote_ident(&rebuild),
            column_list,
            column_list,
            quote_ident(table)
        ))
        .await?;
        self.execute(&format!("DROP TABLE {}", quote_ident(table))).await?;
        self.execute(&format!(
            "ALTER TABLE {} RENAME TO {}",
            quote_ident(&rebuild),
            quote_ident(table)
        ))
        .await?;
        for index_sql in indexes {
            self.execute(&index_sql).await?;
        }
        Ok(())
    }

    async fn row_exists(&mut self, table: &str, key_column: &str, key: i64) -> Result<bool, SchemaError> {
        self.ensure_table(table).await?;
        let sql = format!(
            "SELECT COUNT(1) FROM {} WHERE {} = ?1",
            quote_ident(table),
            quote_ident(key_column)
        );
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(key)
            .fetch_one(&mut *self.conn)
            .await?;
        Ok(count > 0)
    }

    async fn insert_row(&mut self, table: &str, values: &[(String, SeedValue)]) -> Result<(), SchemaError> {
        self.ensure_table(table).await?;
        let columns = values
            .iter()
            .map(|(name, _)| quote_ident(name))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = (1..=values.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(table),
            columns,
            placeholders
        );
        tracing::debug!("schema: {}", sql);

        let mut query = sqlx::query(&sql);
        for (_, value) in values {
            query = match value {
                SeedValue::Integer(v) => query.bind(*v),
                SeedValue::Text(v) => query.bind(v.clone()),
            };
        }
        query.execute(&mut *self.conn).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::schema::{ColumnType, OnDelete};
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
    use sqlx::SqlitePool;
    use std::str::FromStr;

    async fn memory_pool() -> SqlitePool {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .unwrap()
            .foreign_keys(false);
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .unwrap()
    }

    async fn seed_order_lines(pool: &SqlitePool) {
        sqlx::query(
            "CREATE TABLE store (store_id INTEGER PRIMARY KEY, code VARCHAR(32) NOT NULL)",
        )
        .execute(pool)
        .await
        .unwrap();
        sqlx::query(
            "CREATE TABLE order_lines (
                entity_id INTEGER PRIMARY KEY,
                store_id INTEGER NOT NULL DEFAULT 0 REFERENCES store(store_id) ON DELETE CASCADE,
                ec_order_line_id VARCHAR(64) NOT NULL
            )",
        )
        .execute(pool)
        .await
        .unwrap();
        sqlx::query("CREATE INDEX idx_order_lines_line ON order_lines (ec_order_line_id)")
            .execute(pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO order_lines (entity_id, store_id, ec_order_line_id) VALUES (1, 3, 'line-1'), (2, 3, 'line-2')")
            .execute(pool)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn introspection_reports_tables_and_columns() {
        let pool = memory_pool().await;
        seed_order_lines(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut schema = SqliteSchema::new(&mut conn);

        assert!(schema.table_exists("order_lines").await.unwrap());
        assert!(!schema.table_exists("missing").await.unwrap());
        assert!(schema.column_exists("order_lines", "ec_order_line_id").await.unwrap());
        assert!(!schema.column_exists("order_lines", "export").await.unwrap());
        assert_eq!(
            schema.column_type("order_lines", "ec_order_line_id").await.unwrap().as_deref(),
            Some("VARCHAR(64)")
        );
    }

    #[tokio::test]
    async fn add_column_with_reference() {
        let pool = memory_pool().await;
        seed_order_lines(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut schema = SqliteSchema::new(&mut conn);

        let column = ColumnSpec::new("base_storeview_id", ColumnType::SmallInt)
            .not_null()
            .default_value(0)
            .references("store", "store_id", OnDelete::SetDefault);
        schema.add_column("order_lines", &column).await.unwrap();

        assert!(schema.column_exists("order_lines", "base_storeview_id").await.unwrap());
        let missing = schema.add_column("nope", &column).await;
        assert!(matches!(missing, Err(SchemaError::TableNotFound(_))));
    }

    #[tokio::test]
    async fn modify_column_keeps_rows_keys_and_indexes() {
        let pool = memory_pool().await;
        seed_order_lines(&pool).await;
        let mut conn = pool.acquire().await.unwrap();

        {
            let mut schema = SqliteSchema::new(&mut conn);
            let widened = ColumnSpec::new("ec_order_line_id", ColumnType::Varchar(128)).not_null();
            schema.modify_column("order_lines", &widened).await.unwrap();
            assert_eq!(
                schema.column_type("order_lines", "ec_order_line_id").await.unwrap().as_deref(),
                Some("VARCHAR(128)")
            );
            let keys = schema.table_foreign_keys("order_lines").await.unwrap();
            assert_eq!(keys.len(), 1);
            assert_eq!(keys[0].table, "store");
            assert_eq!(keys[0].on_delete, "CASCADE");
        }

        let lines: Vec<(i64, String)> =
            sqlx::query_as("SELECT entity_id, ec_order_line_id FROM order_lines ORDER BY entity_id")
                .fetch_all(&mut *conn)
                .await
                .unwrap();
        assert_eq!(lines, vec![(1, "line-1".to_string()), (2, "line-2".to_string())]);

        let index_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(1) FROM sqlite_master WHERE type = 'index' AND name = 'idx_order_lines_line'",
        )
        .fetch_one(&mut *conn)
        .await
        .unwrap();
        assert_eq!(index_count, 1);

        let leftovers: i64 = sqlx::query_scalar(
            "SELECT COUNT(1) FROM sqlite_master WHERE name = 'order_lines__rebuild'",
        )
        .fetch_one(&mut *conn)
        .await
        .unwrap();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn insert_row_and_lookup_by_key() {
        let pool = memory_pool().await;
        seed_order_lines(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut schema = SqliteSchema::new(&mut conn);

        assert!(!schema.row_exists("store", "store_id", 0).await.unwrap());
        schema
            .insert_row(
                "store",
                &[
                    ("store_id".to_string(), SeedValue::Integer(0)),
                    ("code".to_string(), SeedValue::Text("admin".into())),
                ],
            )
            .await
            .unwrap();

        assert!(schema.row_exists("store", "store_id", 0).await.unwrap());
        assert!(!schema.row_exists("store", "store_id", 1).await.unwrap());
        assert!(matches!(
            schema.row_exists("nope", "store_id", 0).await,
            Err(SchemaError::TableNotFound(_))
        ));
    }
}
