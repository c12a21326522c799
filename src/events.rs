//! Observer channel for engine notifications.
//!
//! The controller publishes [`EngineEvent`]s; any number of subscribers receive
//! them over crossbeam channels. A subscriber that drops its receiver is pruned
//! on the next publish.

use crate::calibration::CalibrationProfile;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::{
    fmt,
    sync::{Arc, Mutex, PoisonError},
};

pub use crate::gestures::{GestureEvent, ScrollDirection};

/// Controller lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Stopped,
    Calibrating,
    Running,
    Paused,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Stopped => "stopped",
            Self::Calibrating => "calibrating",
            Self::Running => "running",
            Self::Paused => "paused",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    StateChanged(LifecycleState),
    /// Human readable progress message
    Status(String),
    Calibrated(CalibrationProfile),
    Gesture(GestureEvent),
    /// Human readable failure; the raw error stays in the logs
    Error(String),
}

/// Fan-out publisher; clones share the subscriber list
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<Sender<EngineEvent>>>>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber
    pub fn subscribe(&self) -> Receiver<EngineEvent> {
        let (tx, rx) = unbounded();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    /// Send `event` to every live subscriber
    pub fn publish(&self, event: &EngineEvent) {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
