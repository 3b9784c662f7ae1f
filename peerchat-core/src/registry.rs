//! Set-once peer registry with an async wait gate.

use std::net::SocketAddr;
use std::sync::{Mutex, MutexGuard};

use tokio::sync::Notify;

#[derive(Default)]
struct Slot {
    peer: Option<SocketAddr>,
    released: bool,
}

/// Single-slot holder of the confirmed remote endpoint.
///
/// The first `try_set` seals the slot; every later call is a no-op. The host's
/// send path waits on `wait_until_set`, which one `Notify` releases for both
/// wake reasons (peer discovered, session shutting down) so the two cannot
/// race each other to a missed wakeup.
pub struct PeerRegistry {
    slot: Mutex<Slot>,
    notify: Notify,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot::default()),
            notify: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record `peer` if the slot is still empty. Returns true only for the
    /// single call that seals the slot; later calls leave it unchanged.
    pub fn try_set(&self, peer: SocketAddr) -> bool {
        let mut slot = self.lock();
        if slot.peer.is_some() {
            return false;
        }
        slot.peer = Some(peer);
        drop(slot);
        self.notify.notify_waiters();
        true
    }

    /// Non-blocking snapshot of the sealed endpoint.
    pub fn get(&self) -> Option<SocketAddr> {
        self.lock().peer
    }

    /// Suspend until the slot is sealed or the registry is released.
    /// Returns `None` when shutdown released the wait before any peer appeared.
    pub async fn wait_until_set(&self) -> Option<SocketAddr> {
        loop {
            // Register for the wakeup before inspecting state, so a try_set or
            // release_waiters between the check and the await is not lost.
            let notified = self.notify.notified();
            {
                let slot = self.lock();
                if let Some(peer) = slot.peer {
                    return Some(peer);
                }
                if slot.released {
                    return None;
                }
            }
            notified.await;
        }
    }

    /// Release every waiter without sealing the slot. Idempotent; called by
    /// the session controller during shutdown.
    pub fn release_waiters(&self) {
        let mut slot = self.lock();
        if slot.released {
            return;
        }
        slot.released = true;
        drop(slot);
        self.notify.notify_waiters();
    }
}

impl Default for PeerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    fn addr(s: &str) -> SocketAddr {
        s.parse().unwrap()
    }

    #[test]
    fn only_first_set_wins() {
        let reg = PeerRegistry::new();
        let first = addr("127.0.0.1:5001");
        assert!(reg.try_set(first));
        assert!(!reg.try_set(addr("127.0.0.1:5002")));
        assert!(!reg.try_set(addr("10.0.0.9:6000")));
        assert_eq!(reg.get(), Some(first));
    }

    #[test]
    fn starts_empty() {
        assert_eq!(PeerRegistry::new().get(), None);
    }

    #[tokio::test]
    async fn wait_released_by_try_set() {
        let reg = Arc::new(PeerRegistry::new());
        let waiter = {
            let reg = reg.clone();
            tokio::spawn(async move { reg.wait_until_set().await })
        };
        // Give the waiter a chance to park first.
        tokio::task::yield_now().await;
        let peer = addr("192.168.0.7:5000");
        assert!(reg.try_set(peer));
        let got = timeout(Duration::from_secs(2), waiter)
            .await
            .expect("waiter should be released")
            .unwrap();
        assert_eq!(got, Some(peer));
    }

    #[tokio::test]
    async fn wait_released_by_shutdown() {
        let reg = Arc::new(PeerRegistry::new());
        let waiter = {
            let reg = reg.clone();
            tokio::spawn(async move { reg.wait_until_set().await })
        };
        tokio::task::yield_now().await;
        reg.release_waiters();
        let got = timeout(Duration::from_secs(2), waiter)
            .await
            .expect("waiter should be released")
            .unwrap();
        assert_eq!(got, None);
    }

    #[tokio::test]
    async fn later_set_attempts_leave_sealed_value_visible() {
        let reg = Arc::new(PeerRegistry::new());
        let sealed = addr("127.0.0.1:5001");
        assert!(reg.try_set(sealed));

        // Seal once more after a waiter arrives: the waiter sees the original.
        let waiter = {
            let reg = reg.clone();
            tokio::spawn(async move { reg.wait_until_set().await })
        };
        assert!(!reg.try_set(addr("127.0.0.1:9999")));
        let got = timeout(Duration::from_secs(2), waiter).await.unwrap().unwrap();
        assert_eq!(got, Some(sealed));
        assert_eq!(reg.get(), Some(sealed));
    }

    #[tokio::test(start_paused = true)]
    async fn wait_without_events_keeps_waiting() {
        let reg = Arc::new(PeerRegistry::new());
        let reg2 = reg.clone();
        let pending = tokio::spawn(async move { reg2.wait_until_set().await });
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(!pending.is_finished());
        reg.release_waiters();
        assert_eq!(pending.await.unwrap(), None);
    }

    #[test]
    fn release_is_idempotent() {
        let reg = PeerRegistry::new();
        reg.release_waiters();
        reg.release_waiters();
        // A set after release still seals; the slot itself is independent.
        assert!(reg.try_set(addr("127.0.0.1:5001")));
    }
}
