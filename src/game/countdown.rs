use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::sleep;

/// How a round ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundEnd {
    Guessed,
    Skipped,
    Expired,
}

#[derive(Debug, Default)]
struct Settlement {
    outcome: Mutex<Option<RoundEnd>>,
    cancelled: Notify,
}

impl Settlement {
    fn outcome(&self) -> MutexGuard<'_, Option<RoundEnd>> {
        self.outcome.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Timer of a round, settled exactly once
///
/// Whoever settles first wins: either [`CountdownHandle::cancel`] or the
/// timer running out. The loser observes the winner's outcome.
#[derive(Debug)]
pub struct Countdown {
    duration: Duration,
    settlement: Arc<Settlement>,
}

/// Cancels a [`Countdown`] from outside the task awaiting it
#[derive(Debug, Clone)]
pub struct CountdownHandle {
    settlement: Arc<Settlement>,
}

impl Countdown {
    pub fn new(duration: Duration) -> (Countdown, CountdownHandle) {
        let settlement = Arc::new(Settlement::default());
        let handle = CountdownHandle {
            settlement: settlement.clone(),
        };
        (
            Countdown {
                duration,
                settlement,
            },
            handle,
        )
    }

    /// Wait for cancellation or expiry
    pub async fn finished(self) -> RoundEnd {
        tokio::select! {
            _ = sleep(self.duration) => {}
            _ = self.settlement.cancelled.notified() => {}
        }

        *self.settlement.outcome().get_or_insert(RoundEnd::Expired)
    }
}

impl CountdownHandle {
    /// Settle the countdown early. Returns false if it was already settled.
    pub fn cancel(&self, reason: RoundEnd) -> bool {
        {
            let mut outcome = self.settlement.outcome();
            if outcome.is_some() {
                return false;
            }
            *outcome = Some(reason);
        }
        // notify_one stores a permit, so this works before `finished` polls
        self.settlement.cancelled.notify_one();
        true
    }

    pub fn outcome(&self) -> Option<RoundEnd> {
        *self.settlement.outcome()
    }

    pub fn is_settled(&self) -> bool {
        self.outcome().is_some()
    }
}
