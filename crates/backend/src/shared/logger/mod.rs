pub mod repository;

use contracts::domain::a001_connection::ConnectionId;
use contracts::shared::logger::{LogEntry, CATEGORY_ORDERS_IMPORT};
use sea_orm::DatabaseConnection;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

/// Журнал неудачных попыток импорта по подключению.
///
/// Запись не должна прерывать импорт: реализация сама обрабатывает свои ошибки.
pub trait ImportFailureLog: Send + Sync {
    fn record_import_failure(&self, connection_id: ConnectionId, message: &str);
}

/// Журнал модуля: tracing + таблица ec_marketplaces_log
#[derive(Clone)]
pub struct SystemLog {
    conn: DatabaseConnection,
    pending: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl SystemLog {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self {
            conn,
            pending: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Дождаться записи всех событий, отправленных до вызова
    pub async fn flush(&self) {
        let handles: Vec<JoinHandle<()>> = match self.pending.lock() {
            Ok(mut pending) => pending.drain(..).collect(),
            Err(_) => return,
        };
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!("Log writer task failed: {}", e);
            }
        }
    }

    pub async fn list_recent(&self, limit: u64) -> anyhow::Result<Vec<LogEntry>> {
        repository::list_recent(&self.conn, limit).await
    }
}

impl ImportFailureLog for SystemLog {
    fn record_import_failure(&self, connection_id: ConnectionId, message: &str) {
        tracing::warn!("Order import failed for connection {}: {}", connection_id, message);

        // Вне runtime остается только строка tracing
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::error!("Failed to log event: no async runtime");
            return;
        };

        let conn = self.conn.clone();
        let message = message.to_string();
        let handle = runtime.spawn(async move {
            if let Err(e) = repository::log_event(
                &conn,
                Some(connection_id.value()),
                CATEGORY_ORDERS_IMPORT,
                &message,
            )
            .await
            {
                tracing::error!("Failed to log event: {}", e);
            }
        });

        if let Ok(mut pending) = self.pending.lock() {
            pending.retain(|h| !h.is_finished());
            pending.push(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::memory_database;

    #[tokio::test]
    async fn failures_are_persisted_one_row_each() {
        let log = SystemLog::new(memory_database().await);

        log.record_import_failure(ConnectionId(3), "No connection found with id \"3\"");
        log.record_import_failure(ConnectionId(4), "Public key is empty");

        log.flush().await;
        let entries = log.list_recent(10).await.unwrap();

        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.category == CATEGORY_ORDERS_IMPORT));
        let mut ids: Vec<Option<i32>> = entries.iter().map(|e| e.connection_id).collect();
        ids.sort();
        assert_eq!(ids, vec![Some(3), Some(4)]);
    }

    #[tokio::test]
    async fn list_recent_returns_newest_first() {
        let conn = memory_database().await;
        repository::log_event(&conn, None, "system", "first").await.unwrap();
        repository::log_event(&conn, Some(1), CATEGORY_ORDERS_IMPORT, "second")
            .await
            .unwrap();

        let entries = SystemLog::new(conn).list_recent(1).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "second");
    }

    #[tokio::test]
    async fn failure_outside_runtime_does_not_panic() {
        let log = SystemLog::new(memory_database().await);

        let writer = log.clone();
        let outcome = std::thread::spawn(move || {
            writer.record_import_failure(ConnectionId(5), "Secret key is empty");
        })
        .join();

        assert!(outcome.is_ok());
        log.flush().await;
        assert!(log.list_recent(10).await.unwrap().is_empty());
    }
}
