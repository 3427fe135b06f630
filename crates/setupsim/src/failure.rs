//! Randomized failure engine - bounded simulated flakiness.
//!
//! Each flaky stage owns a [`FailureDecision`] rolled once at context
//! creation. The retry bound guarantees the simulation can always complete:
//! once `attempts_used` reaches `max_attempts`, every later evaluation
//! succeeds.

use rand::Rng;

/// First-attempt failure probability and retry bound for one flaky stage.
///
/// Stages document their own profile here rather than sharing inline magic
/// numbers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FailureProfile {
    /// Chance in [0.0, 1.0] that the first attempt fails
    pub probability: f64,
    /// Number of attempts that may fail before success is forced
    pub max_attempts: u32,
}

/// OOBE update check: ~30% first-attempt failure, one retry cap.
pub const UPDATE_CHECK: FailureProfile = FailureProfile {
    probability: 0.30,
    max_attempts: 1,
};

/// Driver install for the failure-prone device: ~40% failure, a single draw
/// persisted for the session, so the first user retry succeeds.
pub const DRIVER_INSTALL: FailureProfile = FailureProfile {
    probability: 0.40,
    max_attempts: 1,
};

/// File copy corruption past the progress threshold: ~30% chance, no
/// automatic retry - the user restarts the stage and the bound clears it.
pub const FILE_COPY: FailureProfile = FailureProfile {
    probability: 0.30,
    max_attempts: 1,
};

/// The full profile set, overridable per simulation for tests and demos.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FailureProfiles {
    pub update_check: FailureProfile,
    pub driver_install: FailureProfile,
    pub file_copy: FailureProfile,
}

impl Default for FailureProfiles {
    fn default() -> Self {
        Self {
            update_check: UPDATE_CHECK,
            driver_install: DRIVER_INSTALL,
            file_copy: FILE_COPY,
        }
    }
}

impl FailureProfiles {
    /// All probabilities pinned to zero - deterministic happy path
    pub fn never_fail() -> Self {
        Self::default().with_probability(0.0)
    }

    /// All probabilities pinned to one - maximal flakiness
    pub fn always_fail_first() -> Self {
        Self::default().with_probability(1.0)
    }

    fn with_probability(mut self, p: f64) -> Self {
        self.update_check.probability = p;
        self.driver_install.probability = p;
        self.file_copy.probability = p;
        self
    }
}

/// Ephemeral per-context failure record: one weighted coin flip, then a
/// bounded attempt counter.
#[derive(Debug, Clone, PartialEq)]
pub struct FailureDecision {
    will_fail: bool,
    attempts_used: u32,
    max_attempts: u32,
}

impl FailureDecision {
    /// Draw the decision for a fresh context. The flip happens exactly once;
    /// retries consult the attempt counter, never the RNG.
    pub fn roll(profile: FailureProfile, rng: &mut impl Rng) -> Self {
        let will_fail = profile.probability > 0.0 && rng.gen::<f64>() < profile.probability;
        Self {
            will_fail,
            attempts_used: 0,
            max_attempts: profile.max_attempts,
        }
    }

    /// Whether the current attempt should fail. False forever once the
    /// attempt bound is exhausted.
    pub fn should_fail(&self) -> bool {
        self.will_fail && self.attempts_used < self.max_attempts
    }

    /// Record a failed attempt. Call only when the attempt actually failed.
    pub fn record_attempt(&mut self) {
        self.attempts_used = self.attempts_used.saturating_add(1);
    }

    pub fn attempts_used(&self) -> u32 {
        self.attempts_used
    }
}
