use anyhow::Result;
use std::sync::Arc;

use crate::shared::config::Config;
use crate::usecases::u501_import_orders::ImportOrchestrator;

use super::{
    managers::U501ImportOrdersManager, registry::TaskManagerRegistry,
    worker::ScheduledTaskWorker,
};

/// Инициализирует реестр задач и фоновый воркер.
pub fn initialize_scheduled_tasks(
    cfg: &Config,
    orchestrator: Arc<ImportOrchestrator>,
) -> Result<ScheduledTaskWorker> {
    let mut registry = TaskManagerRegistry::new();

    registry.register(
        U501ImportOrdersManager::new(orchestrator),
        &cfg.scheduler.import_orders_cron,
    )?;
    tracing::info!(
        "Order import scheduled with cron '{}'",
        cfg.scheduler.import_orders_cron
    );

    Ok(ScheduledTaskWorker::new(Arc::new(registry)))
}
