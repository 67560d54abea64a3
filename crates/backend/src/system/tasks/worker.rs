use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::time;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{manager::TaskManager, registry::TaskManagerRegistry};

/// Фоновый воркер для выполнения запланированных задач.
pub struct ScheduledTaskWorker {
    registry: Arc<TaskManagerRegistry>,
}

impl ScheduledTaskWorker {
    pub fn new(registry: Arc<TaskManagerRegistry>) -> Self {
        Self { registry }
    }

    /// Запускает цикл выполнения задач.
    /// Каждый запуск идет в отдельной tokio-задаче, ошибки только логируются.
    pub async fn run_loop(&self) {
        info!(
            "Scheduled task worker started with {} task(s)",
            self.registry.entries().len()
        );

        loop {
            let now = Utc::now();
            let Some((due_at, due)) = self.next_due(now) else {
                warn!("No upcoming scheduled tasks, worker stopped");
                return;
            };

            let wait = (due_at - now).to_std().unwrap_or_default();
            time::sleep(wait).await;

            for manager in due {
                tokio::spawn(run_task(manager));
            }
        }
    }

    /// Ближайшее время запуска и задачи, которые должны стартовать в этот момент.
    fn next_due(&self, now: DateTime<Utc>) -> Option<(DateTime<Utc>, Vec<Arc<dyn TaskManager>>)> {
        let mut next: Option<DateTime<Utc>> = None;
        let mut due: Vec<Arc<dyn TaskManager>> = Vec::new();

        for entry in self.registry.entries() {
            let Some(run_at) = entry.schedule.after(&now).next() else {
                continue;
            };
            match next {
                Some(current) if run_at > current => {}
                Some(current) if run_at == current => due.push(Arc::clone(&entry.manager)),
                _ => {
                    next = Some(run_at);
                    due = vec![Arc::clone(&entry.manager)];
                }
            }
        }

        next.map(|run_at| (run_at, due))
    }
}

/// Один запуск задачи с новым session_id. Возвращает `true` при успехе.
pub async fn run_task(manager: Arc<dyn TaskManager>) -> bool {
    let session_id = Uuid::new_v4().to_string();
    let task_type = manager.task_type();
    info!("Task '{}' session {} is due. Running...", task_type, session_id);

    match manager.run(&session_id).await {
        Ok(()) => {
            info!("Task '{}' session {} completed successfully", task_type, session_id);
            true
        }
        Err(e) => {
            error!("Task '{}' session {} failed: {:?}", task_type, session_id, e);
            false
        }
    }
}
