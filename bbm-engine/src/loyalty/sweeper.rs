//! Periodic BBM Bucks expiry sweep
//!
//! Registered as `TaskKind::Periodic`; runs one sweep at startup, then one per
//! interval until shutdown.

use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::LoyaltyLedger;

pub struct ExpirySweeper {
    ledger: LoyaltyLedger,
    interval: Duration,
    shutdown: CancellationToken,
}

impl ExpirySweeper {
    pub fn new(ledger: LoyaltyLedger, interval: Duration, shutdown: CancellationToken) -> Self {
        Self {
            ledger,
            interval,
            shutdown,
        }
    }

    /// Main loop
    pub async fn run(self) {
        tracing::info!(interval_secs = self.interval.as_secs(), "Expiry sweeper started");

        // First tick fires immediately
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Expiry sweeper received shutdown signal");
                    break;
                }
            }
            self.sweep_once().await;
        }

        tracing::info!("Expiry sweeper stopped");
    }

    async fn sweep_once(&self) {
        let now = shared::util::now_millis();
        if let Err(e) = self.ledger.expire_old(now).await {
            tracing::error!(error = %e, "BBM Bucks expiry sweep failed");
        }
    }
}
