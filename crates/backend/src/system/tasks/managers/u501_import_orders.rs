use anyhow::Result;
use async_trait::async_trait;
use contracts::usecases::u501_import_orders::ImportStatus;
use std::sync::Arc;

use crate::system::tasks::manager::TaskManager;
use crate::usecases::u501_import_orders::ImportOrchestrator;

pub const TASK_TYPE: &str = "u501_import_orders";

/// Менеджер для задачи импорта заказов маркетплейса (u501)
pub struct U501ImportOrdersManager {
    orchestrator: Arc<ImportOrchestrator>,
}

impl U501ImportOrdersManager {
    pub fn new(orchestrator: Arc<ImportOrchestrator>) -> Self {
        Self { orchestrator }
    }
}

#[async_trait]
impl TaskManager for U501ImportOrdersManager {
    fn task_type(&self) -> &'static str {
        TASK_TYPE
    }

    async fn run(&self, session_id: &str) -> Result<()> {
        tracing::info!("Session {}: starting U501 order import", session_id);

        let summary = self.orchestrator.run().await?;

        match summary.status {
            ImportStatus::Skipped => {
                tracing::info!("Session {}: previous import still running, skipped", session_id)
            }
            ImportStatus::Completed | ImportStatus::CompletedWithErrors => {
                for failure in &summary.failed {
                    tracing::warn!(
                        "Session {}: connection {} failed ({:?}): {}",
                        session_id,
                        failure.connection_id,
                        failure.kind,
                        failure.message
                    );
                }
                tracing::info!(
                    "Session {}: U501 order import {:?}, run {}, {} imported, {} failed",
                    session_id,
                    summary.status,
                    summary.run_id,
                    summary.imported.len(),
                    summary.failed.len()
                );
            }
        }
        tracing::debug!("Session {}: run summary {}", session_id, serde_json::to_string(&summary)?);
        Ok(())
    }
}
