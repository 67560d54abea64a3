use anyhow::Context;
use cron::Schedule;
use std::str::FromStr;
use std::sync::Arc;

use super::manager::TaskManager;

/// Зарегистрированная задача и ее расписание
#[derive(Clone)]
pub struct ScheduledEntry {
    pub manager: Arc<dyn TaskManager>,
    pub schedule: Schedule,
}

/// Реестр менеджеров задач.
/// Каждая задача регистрируется вместе с cron-выражением (с секундами).
#[derive(Default)]
pub struct TaskManagerRegistry {
    entries: Vec<ScheduledEntry>,
}

impl TaskManagerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Регистрирует менеджер задач. Повторная регистрация типа заменяет прежнюю.
    pub fn register<T: TaskManager + 'static>(
        &mut self,
        manager: T,
        cron_expression: &str,
    ) -> anyhow::Result<()> {
        let schedule = Schedule::from_str(cron_expression).with_context(|| {
            format!(
                "Invalid cron expression '{}' for task '{}'",
                cron_expression,
                manager.task_type()
            )
        })?;

        self.entries
            .retain(|entry| entry.manager.task_type() != manager.task_type());
        self.entries.push(ScheduledEntry {
            manager: Arc::new(manager),
            schedule,
        });
        Ok(())
    }

    /// Возвращает менеджер задач по его типу.
    pub fn get(&self, task_type: &str) -> Option<Arc<dyn TaskManager>> {
        self.entries
            .iter()
            .find(|entry| entry.manager.task_type() == task_type)
            .map(|entry| Arc::clone(&entry.manager))
    }

    pub fn entries(&self) -> &[ScheduledEntry] {
        &self.entries
    }
}
