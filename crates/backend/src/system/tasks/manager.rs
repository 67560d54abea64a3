use anyhow::Result;
use async_trait::async_trait;

/// Задача, которую воркер запускает по расписанию
#[async_trait]
pub trait TaskManager: Send + Sync {
    /// Уникальный тип задачи (ключ в реестре)
    fn task_type(&self) -> &'static str;

    /// Один запуск задачи. `session_id` уникален для каждого запуска.
    async fn run(&self, session_id: &str) -> Result<()>;
}
