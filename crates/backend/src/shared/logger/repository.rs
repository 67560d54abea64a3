use chrono::Utc;
use contracts::shared::logger::LogEntry;
use sea_orm::entity::prelude::*;
use sea_orm::{QueryOrder, QuerySelect, Set};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "ec_marketplaces_log")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub entity_id: i64,
    pub created_at: String,
    pub connection_id: Option<i32>,
    pub category: String,
    pub message: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for LogEntry {
    fn from(m: Model) -> Self {
        LogEntry {
            id: m.entity_id,
            created_at: m.created_at,
            connection_id: m.connection_id,
            category: m.category,
            message: m.message,
        }
    }
}

/// Добавить запись в лог (одна строка на событие)
pub async fn log_event(
    conn: &DatabaseConnection,
    connection_id: Option<i32>,
    category: &str,
    message: &str,
) -> anyhow::Result<()> {
    let now = Utc::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string();

    let active = ActiveModel {
        entity_id: sea_orm::ActiveValue::NotSet,
        created_at: Set(now),
        connection_id: Set(connection_id),
        category: Set(category.to_string()),
        message: Set(message.to_string()),
    };

    active.insert(conn).await?;
    Ok(())
}

/// Последние записи лога, новые сверху
pub async fn list_recent(conn: &DatabaseConnection, limit: u64) -> anyhow::Result<Vec<LogEntry>> {
    let logs: Vec<LogEntry> = Entity::find()
        .order_by_desc(Column::EntityId)
        .limit(limit)
        .all(conn)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(logs)
}
