use std::time::Duration;

use bbm_engine::{BackgroundTasks, DbService, ExpirySweeper, LoyaltyLedger, TaskKind, setup_environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. dotenv, config, logger
    let config = setup_environment();
    tracing::info!(environment = %config.environment, "BBM engine worker starting...");

    // 2. Database
    let db = DbService::new(&config.database_path).await?;
    let ledger = LoyaltyLedger::new(db.pool.clone());

    // 3. Background tasks
    let mut tasks = BackgroundTasks::new();
    let sweeper = ExpirySweeper::new(
        ledger,
        Duration::from_secs(config.expiry_sweep_interval_secs),
        tasks.shutdown_token(),
    );
    tasks.spawn("expiry_sweeper", TaskKind::Periodic, sweeper.run());
    tasks.log_summary();

    // 4. Run until Ctrl-C
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    tasks.shutdown().await;
    db.pool.close().await;
    Ok(())
}
