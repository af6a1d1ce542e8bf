use tokio::sync::watch;

/// Where a completed session's record ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistStatus {
    /// Write still in flight.
    Pending,
    Saved,
    /// Nothing to persist, or no store configured.
    Skipped,
    Failed(String),
}

impl PersistStatus {
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, PersistStatus::Pending)
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, PersistStatus::Failed(_))
    }
}

/// Observer for a persistence attempt that may still be running.
///
/// Cloning shares the same underlying channel.
#[derive(Debug, Clone)]
pub struct PersistHandle {
    rx: watch::Receiver<PersistStatus>,
}

impl PersistHandle {
    /// Handle whose status is already final.
    #[must_use]
    pub fn settled(status: PersistStatus) -> Self {
        let (_tx, rx) = watch::channel(status);
        Self { rx }
    }

    /// Pending handle plus the sender that resolves it.
    #[must_use]
    pub(crate) fn pending() -> (watch::Sender<PersistStatus>, Self) {
        let (tx, rx) = watch::channel(PersistStatus::Pending);
        (tx, Self { rx })
    }

    /// Latest status without waiting.
    #[must_use]
    pub fn status(&self) -> PersistStatus {
        self.rx.borrow().clone()
    }

    /// Wait until the attempt leaves `Pending`.
    ///
    /// A writer that goes away without reporting resolves to `Failed`.
    pub async fn settled_status(&mut self) -> PersistStatus {
        let waited = self
            .rx
            .wait_for(|status| !status.is_pending())
            .await
            .map(|status| status.clone());
        match waited {
            Ok(status) => status,
            Err(_) => {
                let last = self.rx.borrow().clone();
                if last.is_pending() {
                    PersistStatus::Failed("persistence task ended without a result".into())
                } else {
                    last
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn settled_handle_reports_immediately() {
        let mut handle = PersistHandle::settled(PersistStatus::Skipped);
        assert_eq!(handle.status(), PersistStatus::Skipped);
        assert_eq!(handle.settled_status().await, PersistStatus::Skipped);
    }

    #[tokio::test]
    async fn pending_handle_waits_for_sender() {
        let (tx, mut handle) = PersistHandle::pending();
        assert!(handle.status().is_pending());

        let waiter = tokio::spawn(async move { handle.settled_status().await });
        tx.send_replace(PersistStatus::Saved);
        assert_eq!(waiter.await.unwrap(), PersistStatus::Saved);
    }

    #[tokio::test]
    async fn dropped_sender_resolves_to_failure() {
        let (tx, mut handle) = PersistHandle::pending();
        drop(tx);
        assert!(handle.settled_status().await.is_failed());
    }
}
