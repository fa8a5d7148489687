//! Pipeline status, shared with whoever serves it.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum State {
    Loading,
    Ready,
    Error,
}

/// `{state, progress, message}` as published to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Status {
    pub state: State,
    pub progress: u8,
    pub message: String,
}

impl Status {
    fn new(state: State, progress: u8, message: impl Into<String>) -> Self {
        Self { state, progress, message: message.into() }
    }

    pub fn initializing() -> Self {
        Self::new(State::Loading, 0, "Initializing...")
    }

    pub fn downloading() -> Self {
        Self::new(State::Loading, 20, "Downloading source styles...")
    }

    pub fn mixing() -> Self {
        Self::new(State::Loading, 70, "Mixing styles...")
    }

    pub fn ready() -> Self {
        Self::new(State::Ready, 100, "Ready")
    }

    pub fn failed(message: impl std::fmt::Display) -> Self {
        Self::new(State::Error, 0, format!("Error: {message}"))
    }
}

/// Cloneable, thread-safe handle to the current [`Status`].
#[derive(Debug, Clone)]
pub struct StatusHandle {
    inner: Arc<RwLock<Status>>,
    started_at: DateTime<Utc>,
}

impl Default for StatusHandle {
    fn default() -> Self {
        Self { inner: Arc::new(RwLock::new(Status::initializing())), started_at: Utc::now() }
    }
}

impl StatusHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, status: Status) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = status;
    }

    pub fn get(&self) -> Status {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn uptime(&self) -> TimeDelta {
        Utc::now() - self.started_at
    }
}
