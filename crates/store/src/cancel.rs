//! Caller-supplied cancellation and timeout.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Cancellation signal observed at every suspension point the executors own.
///
/// Fires when the wrapped token is cancelled or when the optional deadline
/// passes, whichever comes first.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CancelSignal {
    /// Creates a signal that only fires when cancelled explicitly.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a signal driven by an existing token.
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Adds a deadline `timeout` from now.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    /// Returns the underlying token, e.g. to cancel from another task.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Cancels the signal.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns true if the token was cancelled or the deadline has passed.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Completes once the signal fires.
    pub async fn cancelled(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    () = self.token.cancelled() => {}
                    () = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.token.cancelled().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_signal_is_not_cancelled() {
        assert!(!CancelSignal::new().is_cancelled());
    }

    #[test]
    fn test_cancel_is_visible_through_clones() {
        let signal = CancelSignal::new();
        let clone = signal.clone();
        signal.cancel();
        assert!(clone.is_cancelled());
    }

    #[tokio::test]
    async fn test_deadline_fires_cancelled() {
        let signal = CancelSignal::new().with_timeout(Duration::from_millis(10));
        tokio::time::timeout(Duration::from_secs(5), signal.cancelled())
            .await
            .expect("deadline should fire");
        assert!(signal.is_cancelled());
    }

    #[tokio::test]
    async fn test_token_cancel_wakes_waiter() {
        let token = CancellationToken::new();
        let signal = CancelSignal::from_token(token.clone());

        let waiter = tokio::spawn(async move { signal.cancelled().await });
        token.cancel();

        tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .expect("waiter should wake")
            .unwrap();
    }
}
