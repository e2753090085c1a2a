//! Cancellation carrier passed through every client call.

use tokio::sync::watch;

/// Cancellation context for a single call or a group of calls.
///
/// Cloning is cheap; every clone observes the same cancellation.
#[derive(Debug, Clone, Default)]
pub struct Context {
    signal: Option<watch::Receiver<bool>>,
}

/// Cancels the [`Context`] it was created with.
#[derive(Debug)]
pub struct CancelHandle {
    sender: watch::Sender<bool>,
}

impl Context {
    /// A context that is never cancelled.
    pub fn background() -> Self {
        Self { signal: None }
    }

    /// A context plus the handle that cancels it.
    pub fn with_cancel() -> (Self, CancelHandle) {
        let (sender, receiver) = watch::channel(false);
        (
            Self {
                signal: Some(receiver),
            },
            CancelHandle { sender },
        )
    }

    /// Whether cancellation has already been requested.
    pub fn is_cancelled(&self) -> bool {
        self.signal.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Resolve once the context is cancelled.
    ///
    /// Never resolves for a background context or after the handle is
    /// dropped without cancelling.
    pub async fn cancelled(&self) {
        let Some(signal) = &self.signal else {
            return std::future::pending().await;
        };

        let mut rx = signal.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                return std::future::pending().await;
            }
        }
    }
}

impl CancelHandle {
    /// Cancel the associated context and all of its clones.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_background_is_never_cancelled() {
        let ctx = Context::background();
        assert!(!ctx.is_cancelled());
        assert!(!Context::default().is_cancelled());
    }

    #[test]
    fn test_cancel_reaches_clones() {
        let (ctx, handle) = Context::with_cancel();
        let clone = ctx.clone();
        assert!(!clone.is_cancelled());

        handle.cancel();
        assert!(ctx.is_cancelled());
        assert!(clone.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelled_resolves_after_cancel() {
        let (ctx, handle) = Context::with_cancel();

        let waiter = tokio::spawn(async move { ctx.cancelled().await });
        handle.cancel();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("cancelled() should resolve")
            .unwrap();
    }

    #[tokio::test]
    async fn test_dropped_handle_does_not_cancel() {
        let (ctx, handle) = Context::with_cancel();
        drop(handle);

        assert!(!ctx.is_cancelled());
        let result = tokio::time::timeout(Duration::from_millis(50), ctx.cancelled()).await;
        assert!(result.is_err());
    }
}
