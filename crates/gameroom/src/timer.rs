use crate::command::Command;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Per-turn deadline tracking for one table.
///
/// At most one turn timer is live per engine. Arming bumps an epoch and
/// spawns a task that posts `TurnWarning` at 80% of the budget and
/// `TurnTimeout` at the full budget back onto the table's command queue;
/// the room discards firings whose epoch is no longer current, so a
/// timeout that lost the race against a voluntary action is a no-op.
#[derive(Debug)]
pub struct TurnTimer {
    limit: Duration,
    epoch: u64,
    deadline: Option<Instant>,
    task: Option<JoinHandle<()>>,
}

impl TurnTimer {
    pub fn new(limit: Duration) -> Self {
        Self {
            limit,
            epoch: 0,
            deadline: None,
            task: None,
        }
    }
    pub fn limit(&self) -> Duration {
        self.limit
    }
    /// Starts a fresh turn clock, cancelling any previous one, and
    /// returns the epoch its firings will carry.
    pub fn arm(&mut self, tx: UnboundedSender<Command>) -> u64 {
        self.cancel();
        self.epoch += 1;
        let epoch = self.epoch;
        let warning = self.limit.mul_f64(felt_core::TURN_WARNING_FRACTION);
        let remainder = self.limit.saturating_sub(warning);
        self.deadline = Some(Instant::now() + self.limit);
        self.task = Some(tokio::spawn(async move {
            tokio::time::sleep(warning).await;
            let _ = tx.send(Command::TurnWarning { epoch });
            tokio::time::sleep(remainder).await;
            let _ = tx.send(Command::TurnTimeout { epoch });
        }));
        epoch
    }
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.deadline = None;
    }
    /// True if a firing with this epoch is still the live turn.
    pub fn is_current(&self, epoch: u64) -> bool {
        self.epoch == epoch && self.deadline.is_some()
    }
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }
}

impl Drop for TurnTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Spawns a one-shot task that posts a command after a delay. Used for
/// hand-start and empty-table-cleanup scheduling; staleness is handled by
/// the generation carried in the command.
pub fn schedule(tx: UnboundedSender<Command>, delay: Duration, command: Command) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let _ = tx.send(command);
    });
}
