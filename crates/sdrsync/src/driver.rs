//! The polling loop: tick, sleep, repeat until cancelled.

use std::time::Duration;

use sdrsync_core::SdrControl;
use tokio_util::sync::CancellationToken;

use crate::engine::{SyncEngine, TickFailure};

/// Why [`run`] returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopExit {
    /// The cancellation token fired.
    Cancelled,
    /// `failures` ticks in a row failed; `last` is the most recent.
    FailureCeiling { failures: u32, last: TickFailure },
}

/// Tick `engine` every `delay` until `cancel` fires.
///
/// Failed ticks are logged and the loop carries on. If
/// `max_consecutive_failures` is non-zero, that many failures in a row
/// end the loop; a successful tick resets the count. Cancellation is
/// checked before each tick and during the sleep, never in the middle of
/// a tick.
pub async fn run<C: SdrControl>(
    engine: &SyncEngine<C>,
    delay: Duration,
    max_consecutive_failures: u32,
    cancel: &CancellationToken,
) -> LoopExit {
    let mut consecutive: u32 = 0;

    loop {
        if cancel.is_cancelled() {
            return LoopExit::Cancelled;
        }

        match engine.tick().await {
            Ok(report) => {
                if consecutive > 0 {
                    tracing::info!(after = consecutive, "sync recovered");
                }
                consecutive = 0;
                tracing::debug!(writes = report.writes(), "tick complete");
            }
            Err(failure) => {
                consecutive = consecutive.saturating_add(1);
                tracing::warn!(
                    kind = %failure.error.kind(),
                    step = %failure.step,
                    consecutive,
                    "tick failed: {}",
                    failure.error
                );
                if max_consecutive_failures > 0 && consecutive >= max_consecutive_failures {
                    return LoopExit::FailureCeiling {
                        failures: consecutive,
                        last: failure,
                    };
                }
            }
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return LoopExit::Cancelled,
            _ = tokio::time::sleep(delay) => {}
        }
    }
}
