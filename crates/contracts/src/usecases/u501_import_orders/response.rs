use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::a001_connection::ConnectionId;

/// Итоговый статус запуска импорта
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportStatus {
    Completed,
    CompletedWithErrors,
    /// Предыдущий запуск еще не завершился, этот пропущен
    Skipped,
}

/// Вид ошибки, после которой импорт продолжается со следующего подключения
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportFailureKind {
    ConnectionNotFound,
    InvalidCredentials,
}

/// Неудачный импорт одного подключения
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportFailure {
    pub connection_id: ConnectionId,
    pub kind: ImportFailureKind,
    pub message: String,
}

/// Результат одного запуска импорта заказов по всем активным подключениям
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportRunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub status: ImportStatus,
    pub imported: Vec<ConnectionId>,
    pub failed: Vec<ImportFailure>,
}

impl ImportRunSummary {
    pub fn start() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            status: ImportStatus::Completed,
            imported: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn skipped() -> Self {
        let mut summary = Self::start();
        summary.status = ImportStatus::Skipped;
        summary.finished_at = Some(summary.started_at);
        summary
    }

    pub fn record_imported(&mut self, connection_id: ConnectionId) {
        self.imported.push(connection_id);
    }

    pub fn record_failure(&mut self, failure: ImportFailure) {
        self.failed.push(failure);
    }

    pub fn finish(mut self) -> Self {
        self.finished_at = Some(Utc::now());
        self.status = if self.failed.is_empty() {
            ImportStatus::Completed
        } else {
            ImportStatus::CompletedWithErrors
        };
        self
    }

    pub fn processed_count(&self) -> usize {
        self.imported.len() + self.failed.len()
    }
}
