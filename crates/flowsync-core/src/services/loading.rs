//! In-flight request tracking behind each store's loading state

use tokio::sync::watch;

/// Counts the outstanding remote requests of one store.
///
/// A store is loading while the count is above zero, so overlapping
/// operations cannot clear each other's state.
#[derive(Debug)]
pub struct InFlight {
    count: watch::Sender<usize>,
}

impl InFlight {
    pub fn new() -> Self {
        let (count, _) = watch::channel(0);
        Self { count }
    }

    /// Registers a request; it stays registered until the guard is dropped.
    pub fn begin(&self) -> LoadingGuard<'_> {
        self.count.send_modify(|n| *n += 1);
        LoadingGuard { count: &self.count }
    }

    pub fn count(&self) -> usize {
        *self.count.borrow()
    }

    pub fn is_loading(&self) -> bool {
        self.count() > 0
    }

    /// Subscribes to the outstanding request count.
    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.count.subscribe()
    }

    /// Resolves once no request is outstanding.
    pub async fn wait_idle(&self) {
        let mut rx = self.count.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|n| *n == 0).await;
    }
}

impl Default for InFlight {
    fn default() -> Self {
        Self::new()
    }
}

/// Releases its request slot on drop, including when the owning future is
/// dropped before completion.
#[must_use = "the request is released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct LoadingGuard<'a> {
    count: &'a watch::Sender<usize>,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.count.send_modify(|n| *n = n.saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlapping_guards() {
        let in_flight = InFlight::new();
        assert!(!in_flight.is_loading());

        let first = in_flight.begin();
        let second = in_flight.begin();
        assert_eq!(in_flight.count(), 2);

        drop(first);
        assert!(in_flight.is_loading(), "second request is still outstanding");

        drop(second);
        assert!(!in_flight.is_loading());
    }

    #[test]
    fn test_wait_idle_on_idle_counter() {
        use tokio_test::block_on;

        let in_flight = InFlight::default();
        block_on(in_flight.wait_idle());
        assert_eq!(in_flight.count(), 0);
    }

    #[test]
    fn test_subscribers_observe_changes() {
        let in_flight = InFlight::new();
        let mut rx = in_flight.subscribe();

        let guard = in_flight.begin();
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), 1);

        drop(guard);
        assert_eq!(*rx.borrow_and_update(), 0);
    }

    #[tokio::test]
    async fn test_wait_idle_returns_when_drained() {
        let in_flight = InFlight::new();
        in_flight.wait_idle().await;

        let guard = in_flight.begin();
        let waiter = async {
            in_flight.wait_idle().await;
            in_flight.count()
        };
        let release = async move {
            tokio::task::yield_now().await;
            drop(guard);
        };

        let (count, ()) = tokio::join!(waiter, release);
        assert_eq!(count, 0);
    }
}
