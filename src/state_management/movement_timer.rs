use std::time::Duration;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use tracing::{debug, warn};

/// # MovementTimer
///
/// Signals that the travel delay of a door movement has elapsed.
///
/// `start` spawns a one-shot task that sleeps for the delay and then fills a single-slot channel.
/// The slot is consumed by `try_complete`, which never blocks. There is no way to cancel a running timer;
/// the state machine keeps at most one of them alive at a time.
#[derive(Debug)]
pub struct MovementTimer {
    completion: oneshot::Receiver<()>,
    delay: Duration,
}

impl MovementTimer {
    /// Spawns the timer task. Must be called from within a tokio runtime.
    pub fn start(delay: Duration) -> Self {
        let (sender, completion) = oneshot::channel();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if sender.send(()).is_err() {
                debug!("Movement timer elapsed after its receiver was dropped");
            }
        });
        Self { completion, delay }
    }

    /// Returns `true` once the delay has elapsed.
    ///
    /// A timer task that ended without signalling also counts as complete, so a movement can never stay
    /// in progress forever.
    pub fn try_complete(&mut self) -> bool {
        match self.completion.try_recv() {
            Ok(()) => true,
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Closed) => {
                warn!("Movement timer ({:?}) ended without signalling completion", self.delay);
                true
            }
        }
    }
}
