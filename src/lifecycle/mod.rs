//! Lazy start and stop of workers tied to listener registration.
//!
//! A category's worker starts on its first listener registration and stops
//! when the registry empties. Coordinators serialize lifecycle transitions,
//! so concurrent registrations never produce two live workers or leak a bound
//! port.

mod pull;
mod push;

pub use pull::PullCoordinator;
pub use push::PushCoordinator;

/// Lifecycle of one category's worker or callback server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

impl WorkerState {
    /// Lowercase label for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerState::Stopped => "stopped",
            WorkerState::Starting => "starting",
            WorkerState::Running => "running",
            WorkerState::Stopping => "stopping",
        }
    }
}
