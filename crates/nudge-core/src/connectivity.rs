//! Connectivity transitions
//!
//! Sync is kicked off on the offline→online edge only, never on every
//! connectivity report, so a flapping link cannot stampede the engine.

use std::future::Future;

use tokio::sync::watch;

/// Edge detector over a stream of online/offline reports
#[derive(Debug, Clone, Copy)]
pub struct ReconnectGuard {
    online: bool,
}

impl ReconnectGuard {
    #[must_use]
    pub const fn new(initially_online: bool) -> Self {
        Self {
            online: initially_online,
        }
    }

    /// Feed one connectivity report. Returns `true` only on the
    /// offline→online transition.
    pub fn observe(&mut self, online: bool) -> bool {
        let reconnected = online && !self.online;
        self.online = online;
        reconnected
    }

    #[must_use]
    pub const fn is_online(&self) -> bool {
        self.online
    }
}

/// Long-lived listener: runs `on_reconnect` for every offline→online edge
/// reported on the watch channel. Ends when the sender side is dropped.
pub async fn run_reconnect_listener<F, Fut>(mut connectivity: watch::Receiver<bool>, on_reconnect: F)
where
    F: Fn() -> Fut,
    Fut: Future<Output = ()>,
{
    let mut guard = ReconnectGuard::new(*connectivity.borrow());

    while connectivity.changed().await.is_ok() {
        let online = *connectivity.borrow();
        if guard.observe(online) {
            on_reconnect().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn fires_only_on_offline_to_online_edge() {
        let mut guard = ReconnectGuard::new(true);

        assert!(!guard.observe(true)); // online flap, no edge
        assert!(!guard.observe(false)); // going offline
        assert!(!guard.observe(false)); // offline flap
        assert!(guard.observe(true)); // the edge
        assert!(!guard.observe(true)); // already online
    }

    #[test]
    fn starting_offline_fires_on_first_online() {
        let mut guard = ReconnectGuard::new(false);
        assert!(guard.observe(true));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn listener_counts_edges_not_reports() {
        let (tx, rx) = watch::channel(true);
        let reconnects = Arc::new(AtomicUsize::new(0));
        let counter = reconnects.clone();

        let listener = tokio::spawn(run_reconnect_listener(rx, move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        }));

        for online in [false, false, true, true, false, true] {
            tx.send(online).unwrap();
            // Let the listener drain each report in order
            tokio::task::yield_now().await;
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        drop(tx);
        listener.await.unwrap();

        assert_eq!(reconnects.load(Ordering::SeqCst), 2);
    }
}
