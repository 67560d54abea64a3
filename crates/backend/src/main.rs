use std::sync::Arc;

use marketplace_backend::domain::a001_connection::{ConnectionRepository, SeaOrmConnectionRepository};
use marketplace_backend::shared::config;
use marketplace_backend::shared::data::{db, migration_runner};
use marketplace_backend::shared::logger::SystemLog;
use marketplace_backend::shared::marketplaces::HttpMarketplaceApi;
use marketplace_backend::system;
use marketplace_backend::system::tasks::managers::U501ImportOrdersManager;
use marketplace_backend::system::tasks::worker::run_task;
use marketplace_backend::usecases::u501_import_orders::{ConnectionFetcher, ImportOrchestrator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --once: один проход импорта без планировщика
    let run_once = std::env::args().skip(1).any(|arg| arg == "--once");

    let cfg = config::load_config()?;
    system::tracing::initialize(&cfg)?;

    migration_runner::run_migrations(&cfg)
        .await
        .map_err(|e| anyhow::anyhow!("db migration failed: {e:#}"))?;
    db::initialize_database(&cfg)
        .await
        .map_err(|e| anyhow::anyhow!("db init failed: {e}"))?;
    let conn = db::get_connection()?.clone();

    let connections: Arc<dyn ConnectionRepository> =
        Arc::new(SeaOrmConnectionRepository::new(conn.clone()));
    let api = Arc::new(HttpMarketplaceApi::new(&cfg.marketplace_api));
    let sessions = Arc::new(ConnectionFetcher::new(connections.clone(), api));
    let failure_log = Arc::new(SystemLog::new(conn));
    let orchestrator = Arc::new(ImportOrchestrator::new(
        connections,
        sessions,
        failure_log.clone(),
    ));

    if run_once {
        run_task(Arc::new(U501ImportOrdersManager::new(orchestrator))).await;
        failure_log.flush().await;
        return Ok(());
    }

    let worker = system::tasks::initialize_scheduled_tasks(&cfg, orchestrator)?;
    tokio::select! {
        _ = worker.run_loop() => {}
        result = tokio::signal::ctrl_c() => {
            result?;
            tracing::info!("Shutdown signal received");
        }
    }
    failure_log.flush().await;
    Ok(())
}
