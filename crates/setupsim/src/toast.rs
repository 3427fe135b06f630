//! Toast queue - ephemeral notifications for the presentation layer.
//!
//! FIFO, fixed TTL against the logical clock, observational only: nothing in
//! the transition logic ever reads a toast back.

use std::collections::VecDeque;
use std::time::Duration;

use serde::Serialize;

use crate::pacing;

/// One ephemeral notification message
#[derive(Debug, Clone, Serialize)]
pub struct Toast {
    pub message: String,
    posted_at: Duration,
}

/// FIFO queue of live toasts
#[derive(Debug)]
pub struct ToastQueue {
    toasts: VecDeque<Toast>,
    ttl: Duration,
}

impl Default for ToastQueue {
    fn default() -> Self {
        Self {
            toasts: VecDeque::new(),
            ttl: pacing::toast::TTL,
        }
    }
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, now: Duration, message: impl Into<String>) {
        self.toasts.push_back(Toast {
            message: message.into(),
            posted_at: now,
        });
    }

    /// Drop every toast whose TTL elapsed at `now`
    pub fn expire(&mut self, now: Duration) {
        let ttl = self.ttl;
        while let Some(front) = self.toasts.front() {
            if now.saturating_sub(front.posted_at) >= ttl {
                self.toasts.pop_front();
            } else {
                break;
            }
        }
    }

    /// Live toasts, oldest first
    pub fn active(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter()
    }

    pub fn messages(&self) -> Vec<&str> {
        self.toasts.iter().map(|t| t.message.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn toasts_are_fifo() {
        let mut queue = ToastQueue::new();
        queue.push(Duration::ZERO, "first");
        queue.push(Duration::ZERO, "second");
        assert_eq!(queue.messages(), vec!["first", "second"]);
    }

    #[test]
    fn toasts_expire_after_ttl() {
        let mut queue = ToastQueue::new();
        queue.push(Duration::ZERO, "old");
        queue.push(2000 * MS, "newer");

        queue.expire(3999 * MS);
        assert_eq!(queue.messages(), vec!["old", "newer"]);

        queue.expire(4000 * MS);
        assert_eq!(queue.messages(), vec!["newer"]);

        queue.expire(6000 * MS);
        assert!(queue.is_empty());
    }

    #[test]
    fn expiry_is_idempotent() {
        let mut queue = ToastQueue::new();
        queue.push(Duration::ZERO, "one");
        queue.expire(10_000 * MS);
        queue.expire(10_000 * MS);
        assert!(queue.is_empty());
    }
}
