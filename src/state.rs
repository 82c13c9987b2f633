//! Per-surface request state.

use crate::error::{KhayalError, Result};

/// What one surface is doing, or last did.
#[derive(Debug, Default)]
pub enum OperationState<T> {
    /// Nothing submitted yet.
    #[default]
    Idle,
    /// A request is running; the surface must not submit another.
    InFlight,
    /// The last request produced a result.
    Succeeded(T),
    /// The last request failed.
    Failed(KhayalError),
}

impl<T> OperationState<T> {
    /// Returns true while a request is running.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::InFlight)
    }

    /// The current result, if the last request succeeded.
    pub fn result(&self) -> Option<&T> {
        match self {
            Self::Succeeded(result) => Some(result),
            _ => None,
        }
    }

    /// The current error, if the last request failed.
    pub fn error(&self) -> Option<&KhayalError> {
        match self {
            Self::Failed(error) => Some(error),
            _ => None,
        }
    }
}

/// One UI surface: at most one request in flight and one result held.
#[derive(Debug, Default)]
pub struct Panel<T> {
    state: OperationState<T>,
}

impl<T> Panel<T> {
    /// Creates an idle panel.
    pub fn new() -> Self {
        Self {
            state: OperationState::Idle,
        }
    }

    /// Current state.
    pub fn state(&self) -> &OperationState<T> {
        &self.state
    }

    /// Marks a request as started and returns the guard that settles it.
    ///
    /// Fails with [`KhayalError::Busy`] if one is already running. The
    /// previous result is dropped here, which releases any object URL it
    /// owns before the new one is created. If the guard is dropped without
    /// [`InFlight::complete`], the panel records [`KhayalError::Cancelled`].
    pub fn begin(&mut self) -> Result<InFlight<'_, T>> {
        if self.state.is_in_flight() {
            return Err(KhayalError::Busy);
        }
        self.state = OperationState::InFlight;
        Ok(InFlight {
            panel: self,
            settled: false,
        })
    }

    /// Drops any result or error and returns to idle.
    pub fn reset(&mut self) {
        self.state = OperationState::Idle;
    }
}

/// A running request on a [`Panel`].
#[derive(Debug)]
#[must_use = "dropping the guard records the request as cancelled"]
pub struct InFlight<'p, T> {
    panel: &'p mut Panel<T>,
    settled: bool,
}

impl<T> InFlight<'_, T> {
    /// Records the outcome of the request.
    pub fn complete(mut self, outcome: Result<T>) {
        self.panel.state = match outcome {
            Ok(result) => OperationState::Succeeded(result),
            Err(error) => OperationState::Failed(error),
        };
        self.settled = true;
    }
}

impl<T> Drop for InFlight<'_, T> {
    fn drop(&mut self) {
        if !self.settled {
            tracing::debug!("request abandoned before completion");
            self.panel.state = OperationState::Failed(KhayalError::Cancelled);
        }
    }
}
