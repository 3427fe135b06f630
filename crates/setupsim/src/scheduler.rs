//! Stage-scoped timer scheduler over a logical clock.
//!
//! Auto-advance delays are explicit records here instead of implicit deferred
//! callbacks. Every timer is registered against the stage that scheduled it
//! and torn down when that stage exits, so a timer can never fire a
//! transition for a stage the user already left. The host drives the clock
//! with [`Simulation::advance`](crate::sim::Simulation::advance); the
//! scheduler itself never sleeps.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::stage::Stage;

/// Opaque handle identifying one scheduled delay. Tokens are unique for the
/// lifetime of a scheduler and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerToken(u64);

#[derive(Debug, Clone, Copy)]
struct ScheduledTimer {
    token: TimerToken,
    stage: Stage,
    due: Duration,
}

/// Pending delayed events keyed by stage-scoped tokens
#[derive(Debug, Default)]
pub struct Scheduler {
    now: Duration,
    next_seq: u64,
    pending: Vec<ScheduledTimer>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current logical time since session start
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Register a delayed event owned by `stage`
    pub fn schedule(&mut self, stage: Stage, delay: Duration) -> TimerToken {
        let token = TimerToken(self.next_seq);
        self.next_seq += 1;
        self.pending.push(ScheduledTimer {
            token,
            stage,
            due: self.now + delay,
        });
        token
    }

    /// Tear down every timer owned by `stage`. Called on stage exit.
    pub fn cancel_stage(&mut self, stage: Stage) {
        self.pending.retain(|t| t.stage != stage);
    }

    /// Remove and return the owning stage of a pending token. `None` means
    /// the token is stale: already fired, or canceled with its stage.
    pub fn take(&mut self, token: TimerToken) -> Option<Stage> {
        let idx = self.pending.iter().position(|t| t.token == token)?;
        Some(self.pending.swap_remove(idx).stage)
    }

    /// Pop the earliest timer due at or before `until`, advancing the clock
    /// to its due time. Returns `None` once no timer is due in the window.
    pub fn fire_next(&mut self, until: Duration) -> Option<(TimerToken, Stage)> {
        let idx = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= until)
            .min_by_key(|(_, t)| t.due)
            .map(|(i, _)| i)?;
        let timer = self.pending.swap_remove(idx);
        self.now = self.now.max(timer.due);
        Some((timer.token, timer.stage))
    }

    /// Move the clock to `until` after all due timers have fired
    pub fn settle(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }

    /// Whether `stage` has a pending timer
    pub fn has_pending(&self, stage: Stage) -> bool {
        self.pending.iter().any(|t| t.stage == stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn timers_fire_in_due_order() {
        let mut sched = Scheduler::new();
        let late = sched.schedule(Stage::BiosPost, 30 * MS);
        let early = sched.schedule(Stage::BiosPost, 10 * MS);

        let (first, _) = sched.fire_next(Duration::from_millis(100)).unwrap();
        assert_eq!(first, early);
        assert_eq!(sched.now(), 10 * MS);

        let (second, _) = sched.fire_next(Duration::from_millis(100)).unwrap();
        assert_eq!(second, late);
        assert_eq!(sched.now(), 30 * MS);

        assert!(sched.fire_next(Duration::from_millis(100)).is_none());
    }

    #[test]
    fn nothing_fires_before_it_is_due() {
        let mut sched = Scheduler::new();
        sched.schedule(Stage::BootPrompt, 50 * MS);
        assert!(sched.fire_next(20 * MS).is_none());
        sched.settle(20 * MS);
        assert_eq!(sched.now(), 20 * MS);
        assert!(sched.fire_next(50 * MS).is_some());
    }

    #[test]
    fn cancel_stage_drops_only_that_stage() {
        let mut sched = Scheduler::new();
        sched.schedule(Stage::BiosPost, 10 * MS);
        let kept = sched.schedule(Stage::SetupCopying, 10 * MS);

        sched.cancel_stage(Stage::BiosPost);
        assert!(!sched.has_pending(Stage::BiosPost));
        assert!(sched.has_pending(Stage::SetupCopying));

        let (token, stage) = sched.fire_next(Duration::from_millis(100)).unwrap();
        assert_eq!(token, kept);
        assert_eq!(stage, Stage::SetupCopying);
    }

    #[test]
    fn canceled_token_is_stale() {
        let mut sched = Scheduler::new();
        let token = sched.schedule(Stage::BiosPost, 10 * MS);
        sched.cancel_stage(Stage::BiosPost);
        assert_eq!(sched.take(token), None);
    }

    #[test]
    fn fired_token_cannot_be_taken_twice() {
        let mut sched = Scheduler::new();
        let token = sched.schedule(Stage::BootLogo, 5 * MS);
        let (fired, _) = sched.fire_next(Duration::from_millis(10)).unwrap();
        assert_eq!(fired, token);
        assert_eq!(sched.take(token), None);
    }

    #[test]
    fn tokens_are_never_reused() {
        let mut sched = Scheduler::new();
        let a = sched.schedule(Stage::BiosPost, MS);
        sched.cancel_stage(Stage::BiosPost);
        let b = sched.schedule(Stage::BiosPost, MS);
        assert_ne!(a, b);
    }
}
