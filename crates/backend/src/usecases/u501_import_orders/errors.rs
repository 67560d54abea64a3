use contracts::usecases::u501_import_orders::ImportFailureKind;
use thiserror::Error;

/// Ошибка импорта заказов одного подключения
#[derive(Debug, Error)]
pub enum ImportError {
    /// Подключение не найдено; импорт продолжается со следующего
    #[error("{0}")]
    ConnectionNotFound(String),
    /// Ключи отклонены (проверкой или API); импорт продолжается со следующего
    #[error("{0}")]
    InvalidCredentials(String),
    /// Любая другая ошибка останавливает весь запуск
    #[error("Unexpected import failure: {0:#}")]
    Unexpected(#[from] anyhow::Error),
}

impl ImportError {
    pub fn connection_not_found(id: impl std::fmt::Display) -> Self {
        Self::ConnectionNotFound(format!("No connection found with id \"{}\"", id))
    }

    /// Вид ошибки, которая поглощается на уровне подключения
    pub fn kind(&self) -> Option<ImportFailureKind> {
        match self {
            Self::ConnectionNotFound(_) => Some(ImportFailureKind::ConnectionNotFound),
            Self::InvalidCredentials(_) => Some(ImportFailureKind::InvalidCredentials),
            Self::Unexpected(_) => None,
        }
    }

    pub fn is_connection_scoped(&self) -> bool {
        self.kind().is_some()
    }
}
