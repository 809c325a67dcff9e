//! Toast notifications
//!
//! Toasts are transient messages raised by transitions. Each one is removed
//! by a `ToastExpired` event the runtime schedules when the toast is raised.

use std::collections::VecDeque;

use serde::Serialize;

/// Toast severity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum ToastLevel {
    /// Neutral information
    #[default]
    Info,
    /// Something completed
    Success,
    /// Something was refused or degraded
    Warning,
    /// Something failed
    Error,
}

/// A raised toast.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Toast {
    /// Id used to dismiss this toast
    pub id: u64,
    /// Text shown to the user
    pub message: String,
    /// Severity
    pub level: ToastLevel,
}

/// Maximum number of toasts kept at once. The oldest is dropped first.
pub const MAX_PENDING_TOASTS: usize = 8;

/// Visible toasts, oldest first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ToastQueue {
    toasts: VecDeque<Toast>,
    next_id: u64,
}

impl ToastQueue {
    /// Empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise a toast and return its id.
    pub fn push(&mut self, message: impl Into<String>, level: ToastLevel) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        if self.toasts.len() >= MAX_PENDING_TOASTS {
            self.toasts.pop_front();
        }
        self.toasts.push_back(Toast {
            id,
            message: message.into(),
            level,
        });
        id
    }

    /// Remove the toast with `id`. Returns false if it is already gone.
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|t| t.id != id);
        before != self.toasts.len()
    }

    /// The oldest visible toast.
    pub fn current(&self) -> Option<&Toast> {
        self.toasts.front()
    }

    /// All visible toasts.
    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter()
    }

    /// Visible toast texts, oldest first.
    pub fn messages(&self) -> Vec<&str> {
        self.toasts.iter().map(|t| t.message.as_str()).collect()
    }

    /// Number of visible toasts.
    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    /// True when nothing is visible.
    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_then_dismiss() {
        let mut queue = ToastQueue::new();
        let a = queue.push("a", ToastLevel::Info);
        let b = queue.push("b", ToastLevel::Error);
        assert_ne!(a, b);
        assert_eq!(queue.messages(), vec!["a", "b"]);

        assert!(queue.dismiss(a));
        assert!(!queue.dismiss(a));
        assert_eq!(queue.current().map(|t| t.id), Some(b));
    }

    #[test]
    fn oldest_toast_is_dropped_when_full() {
        let mut queue = ToastQueue::new();
        for i in 0..MAX_PENDING_TOASTS + 2 {
            queue.push(format!("t{i}"), ToastLevel::Info);
        }
        assert_eq!(queue.len(), MAX_PENDING_TOASTS);
        assert_eq!(queue.current().map(|t| t.message.as_str()), Some("t2"));
    }
}
