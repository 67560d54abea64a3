use serde::{Deserialize, Serialize};

/// Категория записей о неудачном импорте заказов
pub const CATEGORY_ORDERS_IMPORT: &str = "orders_import";

/// Запись лога модуля (таблица ec_marketplaces_log)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: i64,
    pub created_at: String,
    /// Подключение, к которому относится запись (если есть)
    pub connection_id: Option<i32>,
    pub category: String,
    pub message: String,
}
