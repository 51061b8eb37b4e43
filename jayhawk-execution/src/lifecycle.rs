//! Worker runtime lifecycle states

use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::error::LifecycleError;

/// Lifecycle of a worker process. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuntimeState {
    Starting,
    Serving,
    Stopping,
    Terminated,
}

impl RuntimeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuntimeState::Starting => "STARTING",
            RuntimeState::Serving => "SERVING",
            RuntimeState::Stopping => "STOPPING",
            RuntimeState::Terminated => "TERMINATED",
        }
    }
}

impl fmt::Display for RuntimeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared, forward-only holder of the current [`RuntimeState`]
#[derive(Debug, Clone)]
pub struct StateTracker {
    inner: Arc<Mutex<Vec<RuntimeState>>>,
}

impl StateTracker {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(vec![RuntimeState::Starting])),
        }
    }

    pub fn current(&self) -> RuntimeState {
        self.inner
            .lock()
            .last()
            .copied()
            .unwrap_or(RuntimeState::Starting)
    }

    /// Move to `next`. Any later state may be reached directly, which is how
    /// a startup failure goes straight to `Terminated`. Staying put or going
    /// back is rejected.
    pub fn advance(&self, next: RuntimeState) -> Result<RuntimeState, LifecycleError> {
        let mut history = self.inner.lock();
        let current = history.last().copied().unwrap_or(RuntimeState::Starting);

        if next <= current {
            return Err(LifecycleError::InvalidTransition {
                from: current,
                to: next,
            });
        }

        debug!("Runtime state {} -> {}", current, next);
        history.push(next);
        Ok(current)
    }

    /// Every state visited so far, in order
    pub fn history(&self) -> Vec<RuntimeState> {
        self.inner.lock().clone()
    }
}

impl Default for StateTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions() {
        let tracker = StateTracker::new();
        assert_eq!(tracker.current(), RuntimeState::Starting);

        tracker.advance(RuntimeState::Serving).unwrap();
        tracker.advance(RuntimeState::Stopping).unwrap();
        let previous = tracker.advance(RuntimeState::Terminated).unwrap();

        assert_eq!(previous, RuntimeState::Stopping);
        assert_eq!(
            tracker.history(),
            vec![
                RuntimeState::Starting,
                RuntimeState::Serving,
                RuntimeState::Stopping,
                RuntimeState::Terminated
            ]
        );
    }

    #[test]
    fn test_terminated_reached_once() {
        let tracker = StateTracker::new();
        tracker.advance(RuntimeState::Terminated).unwrap();

        assert!(tracker.advance(RuntimeState::Terminated).is_err());
        assert!(tracker.advance(RuntimeState::Serving).is_err());
        assert_eq!(tracker.history().len(), 2);
    }

    #[test]
    fn test_clones_share_state() {
        let tracker = StateTracker::new();
        let observer = tracker.clone();
        tracker.advance(RuntimeState::Serving).unwrap();
        assert_eq!(observer.current(), RuntimeState::Serving);
        assert_eq!(serde_json::to_value(observer.current()).unwrap(), "SERVING");
    }
}
