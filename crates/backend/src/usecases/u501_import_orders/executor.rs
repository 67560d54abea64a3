use contracts::domain::a001_connection::{Connection, ConnectionFilter};
use contracts::usecases::u501_import_orders::{ImportFailure, ImportRunSummary};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::connection_fetcher::SessionProvider;
use super::errors::ImportError;
use crate::domain::a001_connection::ConnectionRepository;
use crate::shared::logger::ImportFailureLog;

/// Executor для UseCase импорта заказов по всем активным подключениям
pub struct ImportOrchestrator {
    connections: Arc<dyn ConnectionRepository>,
    sessions: Arc<dyn SessionProvider>,
    failure_log: Arc<dyn ImportFailureLog>,
    run_guard: Mutex<()>,
}

impl ImportOrchestrator {
    pub fn new(
        connections: Arc<dyn ConnectionRepository>,
        sessions: Arc<dyn SessionProvider>,
        failure_log: Arc<dyn ImportFailureLog>,
    ) -> Self {
        Self {
            connections,
            sessions,
            failure_log,
            run_guard: Mutex::new(()),
        }
    }

    /// Один проход импорта.
    ///
    /// Подключения обрабатываются последовательно. Ошибки уровня подключения
    /// (не найдено, неверные ключи) пишутся в журнал и не прерывают проход;
    /// любая другая ошибка возвращается сразу. Если предыдущий проход еще
    /// выполняется, новый сразу возвращает сводку со статусом `Skipped`.
    pub async fn run(&self) -> Result<ImportRunSummary, ImportError> {
        let Ok(_running) = self.run_guard.try_lock() else {
            tracing::warn!("Order import is already running, skipping this run");
            return Ok(ImportRunSummary::skipped());
        };

        let mut summary = ImportRunSummary::start();
        tracing::info!("Starting order import run {}", summary.run_id);

        let connections = self.connections.list(&ConnectionFilter::active()).await?;
        tracing::info!("Found {} active connection(s)", connections.len());

        for connection in connections.iter().filter(|c| c.is_active) {
            match self.import_connection(connection).await {
                Ok(()) => {
                    tracing::info!("Connection {} ({}): orders imported", connection.id, connection.name);
                    summary.record_imported(connection.id);
                }
                Err(e) => {
                    let Some(kind) = e.kind() else {
                        tracing::error!(
                            "Order import run {} stopped at connection {}: {}",
                            summary.run_id,
                            connection.id,
                            e
                        );
                        return Err(e);
                    };
                    let message = e.to_string();
                    self.failure_log.record_import_failure(connection.id, &message);
                    summary.record_failure(ImportFailure {
                        connection_id: connection.id,
                        kind,
                        message,
                    });
                }
            }
        }

        let summary = summary.finish();
        tracing::info!(
            "Order import run {} finished: {} imported, {} failed",
            summary.run_id,
            summary.imported.len(),
            summary.failed.len()
        );
        Ok(summary)
    }

    async fn import_connection(&self, connection: &Connection) -> Result<(), ImportError> {
        let session = self.sessions.get_session(connection.id).await?;
        session.import_orders().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::marketplaces::OrderImportSession;
    use async_trait::async_trait;
    use contracts::domain::a001_connection::{ConnectionId, Credentials};
    use contracts::usecases::u501_import_orders::{ImportFailureKind, ImportStatus};
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;
    use tokio::sync::Notify;

    /// Репозиторий, который отдает все подключения, игнорируя фильтр
    struct Repo(Vec<Connection>);

    #[async_trait]
    impl ConnectionRepository for Repo {
        async fn list(&self, _filter: &ConnectionFilter) -> anyhow::Result<Vec<Connection>> {
            Ok(self.0.clone())
        }

        async fn get_by_id(&self, id: ConnectionId) -> anyhow::Result<Option<Connection>> {
            Ok(self.0.iter().find(|c| c.id == id).cloned())
        }
    }

    #[derive(Clone, Copy)]
    enum Outcome {
        Ok,
        NotFound,
        BadKey,
        Unexpected,
    }

    struct Session {
        outcome: Outcome,
        gate: Option<Arc<Notify>>,
    }

    #[async_trait]
    impl OrderImportSession for Session {
        async fn import_orders(&self) -> Result<(), ImportError> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            match self.outcome {
                Outcome::Ok => Ok(()),
                Outcome::BadKey => Err(ImportError::InvalidCredentials("bad key".into())),
                Outcome::Unexpected => Err(anyhow::anyhow!("socket closed").into()),
                Outcome::NotFound => Ok(()),
            }
        }
    }

    #[derive(Default)]
    struct Sessions {
        outcomes: HashMap<i32, Outcome>,
        gate: Option<Arc<Notify>>,
        requested: StdMutex<Vec<i32>>,
    }

    #[async_trait]
    impl SessionProvider for Sessions {
        async fn get_session(&self, id: ConnectionId) -> Result<Box<dyn OrderImportSession>, ImportError> {
            self.requested.lock().unwrap().push(id.value());
            let outcome = self.outcomes.get(&id.value()).copied().unwrap_or(Outcome::Ok);
            if let Outcome::NotFound = outcome {
                return Err(ImportError::connection_not_found(id));
            }
            Ok(Box::new(Session {
                outcome,
                gate: self.gate.clone(),
            }))
        }
    }

    #[derive(Default)]
    struct RecordingLog(StdMutex<Vec<(i32, String)>>);

    impl ImportFailureLog for RecordingLog {
        fn record_import_failure(&self, connection_id: ConnectionId, message: &str) {
            self.0.lock().unwrap().push((connection_id.value(), message.to_string()));
        }
    }

    fn connection(id: i32) -> Connection {
        Connection::new(ConnectionId(id), format!("Connection {}", id), Credentials::new("pk", "sk"))
    }

    struct Harness {
        orchestrator: ImportOrchestrator,
        sessions: Arc<Sessions>,
        log: Arc<RecordingLog>,
    }

    fn harness(connections: Vec<Connection>, sessions: Sessions) -> Harness {
        let sessions = Arc::new(sessions);
        let log = Arc::new(RecordingLog::default());
        let orchestrator =
            ImportOrchestrator::new(Arc::new(Repo(connections)), sessions.clone(), log.clone());
        Harness {
            orchestrator,
            sessions,
            log,
        }
    }

    fn with_outcomes(outcomes: &[(i32, Outcome)]) -> Sessions {
        Sessions {
            outcomes: outcomes.iter().copied().collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn invalid_credentials_are_logged_and_run_returns_normally() {
        let h = harness(vec![connection(7)], with_outcomes(&[(7, Outcome::BadKey)]));

        let summary = h.orchestrator.run().await.unwrap();

        assert_eq!(h.log.0.lock().unwrap().as_slice(), &[(7, "bad key".to_string())]);
        assert_eq!(summary.status, ImportStatus::CompletedWithErrors);
        assert_eq!(summary.failed[0].kind, ImportFailureKind::InvalidCredentials);
    }

    #[tokio::test]
    async fn connection_failures_do_not_stop_later_connections() {
        let h = harness(
            vec![connection(1), connection(2), connection(3)],
            with_outcomes(&[(1, Outcome::NotFound), (2, Outcome::BadKey)]),
        );

        let summary = h.orchestrator.run().await.unwrap();

        assert_eq!(*h.sessions.requested.lock().unwrap(), vec![1, 2, 3]);
        assert_eq!(summary.imported, vec![ConnectionId(3)]);
        assert_eq!(summary.failed.len(), 2);
        let log = h.log.0.lock().unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0], (1, "No connection found with id \"1\"".to_string()));
        assert_eq!(log[1], (2, "bad key".to_string()));
    }

    #[tokio::test]
    async fn inactive_connections_are_never_imported() {
        let h = harness(
            vec![connection(1).with_active(false), connection(2)],
            Sessions::default(),
        );

        let summary = h.orchestrator.run().await.unwrap();

        assert_eq!(*h.sessions.requested.lock().unwrap(), vec![2]);
        assert_eq!(summary.imported, vec![ConnectionId(2)]);
        assert_eq!(summary.status, ImportStatus::Completed);
    }

    #[tokio::test]
    async fn unexpected_error_halts_the_run() {
        let h = harness(
            vec![connection(1), connection(2), connection(3)],
            with_outcomes(&[(2, Outcome::Unexpected)]),
        );

        let err = h.orchestrator.run().await.unwrap_err();

        assert!(matches!(err, ImportError::Unexpected(_)));
        assert_eq!(*h.sessions.requested.lock().unwrap(), vec![1, 2]);
        assert!(h.log.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn no_connections_completes_empty() {
        let h = harness(Vec::new(), Sessions::default());

        let summary = h.orchestrator.run().await.unwrap();

        assert_eq!(summary.status, ImportStatus::Completed);
        assert_eq!(summary.processed_count(), 0);
        assert!(summary.finished_at.is_some());
    }

    #[tokio::test]
    async fn overlapping_run_is_skipped() {
        let gate = Arc::new(Notify::new());
        let h = Arc::new(harness(
            vec![connection(1)],
            Sessions {
                gate: Some(gate.clone()),
                ..Default::default()
            },
        ));

        let first = {
            let h = h.clone();
            tokio::spawn(async move { h.orchestrator.run().await.unwrap() })
        };
        while h.sessions.requested.lock().unwrap().is_empty() {
            tokio::task::yield_now().await;
        }

        let second = h.orchestrator.run().await.unwrap();
        assert_eq!(second.status, ImportStatus::Skipped);
        assert_eq!(second.processed_count(), 0);

        gate.notify_one();
        let first = first.await.unwrap();
        assert_eq!(first.status, ImportStatus::Completed);
        assert_eq!(*h.sessions.requested.lock().unwrap(), vec![1]);
    }
}
