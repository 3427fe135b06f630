//! Out-of-box-experience session state: the first-run wizard between the
//! post-install reboot and the desktop.
//!
//! Mostly linear, with two conditional branches owned by the orchestrator:
//! limited network setup skips the update check, and an empty password skips
//! the security questions.

use serde::{Deserialize, Serialize};

use crate::failure::FailureDecision;

/// The fixed security-question set shown when a password was set
pub const SECURITY_QUESTIONS: [&str; 3] = [
    "What was your first pet's name?",
    "What city were you born in?",
    "What was your childhood nickname?",
];

/// Progress of the simulated update check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateCheckState {
    Idle,
    Checking,
    Failed,
    Passed,
}

/// Mutable OOBE state, owned by the orchestrator
#[derive(Debug, Clone)]
pub struct OobeState {
    pub region: String,
    /// True when the user chose the limited-setup branch on the network page
    pub limited_setup: bool,
    pub update_state: UpdateCheckState,
    /// Update-check decision, rolled on first entry to the update stage
    pub update_fault: Option<FailureDecision>,
    pub username: String,
    /// Whether a non-empty password was entered (its value is not retained)
    pub password_set: bool,
    pub security_answers: [Option<String>; 3],
    pub privacy_accepted: bool,
}

impl Default for OobeState {
    fn default() -> Self {
        Self {
            region: "United States".to_string(),
            limited_setup: false,
            update_state: UpdateCheckState::Idle,
            update_fault: None,
            username: String::new(),
            password_set: false,
            security_answers: [None, None, None],
            privacy_accepted: false,
        }
    }
}

impl OobeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the account password choice. Only presence is simulated.
    pub fn set_password(&mut self, password: &str) {
        self.password_set = !password.is_empty();
    }

    /// Gate for leaving the account page
    pub fn account_complete(&self) -> bool {
        !self.username.trim().is_empty()
    }

    /// Whether the account page routes through security questions
    pub fn wants_security_questions(&self) -> bool {
        self.password_set
    }

    /// Record one security answer. Blank answers do not count.
    pub fn answer_security_question(&mut self, index: usize, answer: &str) -> bool {
        if index >= SECURITY_QUESTIONS.len() || answer.trim().is_empty() {
            return false;
        }
        self.security_answers[index] = Some(answer.trim().to_string());
        true
    }

    /// Gate for leaving the security-questions page
    pub fn answers_complete(&self) -> bool {
        self.security_answers.iter().all(|a| a.is_some())
    }
}
