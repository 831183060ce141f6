//! Stop coordination for long-running loops.

use tokio::sync::broadcast;

/// One-shot stop signal fanned out to any number of loops.
///
/// The health checker creates one per run, so a stopped checker can be
/// started again with a fresh signal. A loop drops its receiver when it
/// exits, which makes [`Shutdown::listeners`] a liveness check.
#[derive(Debug)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe before triggering; late subscribers miss the signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Signal every listener. Returns false when no loop was listening.
    pub fn trigger(&self) -> bool {
        self.tx.send(()).is_ok()
    }

    /// Loops still holding a receiver.
    pub fn listeners(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
