//! # Shared Deadline
//!
//! One cancellation token plus an expiry instant, shared by every fetch in
//! a race.
//!
//! Cloning a [`Deadline`] clones the handle, not the timer: cancelling any
//! clone cancels all of them.

use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Cancellable deadline covering all fetches of one race.
#[derive(Debug, Clone)]
pub struct Deadline {
    token: CancellationToken,
    started_at: Instant,
    expires_at: Instant,
}

impl Deadline {
    /// Starts a deadline that expires `timeout` from now.
    #[must_use]
    pub fn start(timeout: Duration) -> Self {
        let started_at = Instant::now();
        Self {
            token: CancellationToken::new(),
            started_at,
            expires_at: started_at + timeout,
        }
    }

    /// Returns the underlying cancellation token.
    #[inline]
    #[must_use]
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Fires the deadline early for every holder.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns true once [`Deadline::cancel`] was called on any clone.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Returns true once the expiry instant has passed.
    #[must_use]
    pub fn has_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    /// Time since the deadline started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Resolves when the deadline is cancelled or expires, whichever is first.
    pub async fn fired(&self) {
        tokio::select! {
            () = self.token.cancelled() => {}
            () = tokio::time::sleep_until(self.expires_at) => {}
        }
    }
}
