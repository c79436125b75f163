use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{error, info};

/// Default idle sleep between build attempts while a preferred state is
/// available.
pub const DEFAULT_SLEEP: Duration = Duration::from_millis(500);

/// What the next wake-up in the timer loop should do, as decided by the
/// caller-supplied probe.
pub enum WakeDecision {
    /// Sleep for the given duration, then probe again.
    Sleep(Duration),
    /// Attempt a build right away.
    BuildNow,
}

/// Drives the builder's timer task: wakes on its own timer, on an external
/// reset, or on a build-now signal from the mempool, and calls `probe` to
/// decide what to do and `attempt_build` to actually try packing a block.
///
/// `probe` returning `None` means the preferred chain state isn't available;
/// per the teacher's convention for an unrecoverable local condition, that's
/// logged as fatal and the loop exits rather than spinning.
pub struct BuilderLoop<Probe, Build> {
    probe: Probe,
    attempt_build: Build,
    build_signal: mpsc::Receiver<()>,
    reset_rx: mpsc::Receiver<()>,
    reset_tx: mpsc::Sender<()>,
    shutdown_rx: oneshot::Receiver<()>,
}

impl<Probe, Build> BuilderLoop<Probe, Build>
where
    Probe: FnMut() -> Option<WakeDecision>,
    Build: FnMut(),
{
    pub fn new(probe: Probe, attempt_build: Build, build_signal: mpsc::Receiver<()>) -> (Self, oneshot::Sender<()>, mpsc::Sender<()>) {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let (reset_tx, reset_rx) = mpsc::channel(1);
        let handle = reset_tx.clone();
        (
            BuilderLoop {
                probe,
                attempt_build,
                build_signal,
                reset_rx,
                reset_tx,
                shutdown_rx,
            },
            shutdown_tx,
            handle,
        )
    }

    /// A best-effort, non-blocking nudge to re-evaluate the sleep duration
    /// without waiting for the current timer to fire.
    pub fn reset_handle(&self) -> mpsc::Sender<()> {
        self.reset_tx.clone()
    }

    pub async fn run(mut self) {
        loop {
            let decision = match (self.probe)() {
                Some(d) => d,
                None => {
                    error!("preferred chain state unavailable, stopping block builder loop");
                    return;
                }
            };

            let sleep_for = match decision {
                WakeDecision::Sleep(d) => d,
                WakeDecision::BuildNow => {
                    (self.attempt_build)();
                    continue;
                }
            };

            tokio::select! {
                _ = tokio::time::sleep(sleep_for) => {
                    (self.attempt_build)();
                }
                _ = self.build_signal.recv() => {
                    (self.attempt_build)();
                }
                _ = self.reset_rx.recv() => {
                    continue;
                }
                _ = &mut self.shutdown_rx => {
                    info!("block builder loop shutting down");
                    return;
                }
            }
        }
    }
}
