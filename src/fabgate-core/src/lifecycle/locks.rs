use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::OwnedMutexGuard;

type LabelLock = Arc<tokio::sync::Mutex<()>>;

#[derive(Default)]
struct Entry {
    lock: LabelLock,
    users: usize,
}

/// Async locks keyed by identity label. An entry lives only while someone holds or awaits it.
#[derive(Default)]
pub(super) struct LabelLocks {
    locks: Mutex<HashMap<String, Entry>>,
}

impl LabelLocks {
    pub async fn lock(&self, label: &str) -> LabelGuard<'_> {
        let lock = {
            let mut entries = self.entries();
            let entry = entries.entry(label.to_string()).or_default();
            entry.users += 1;
            entry.lock.clone()
        };
        // Registered before waiting so that a cancelled waiter still releases its entry.
        let mut guard = LabelGuard {
            locks: self,
            label: label.to_string(),
            guard: None,
        };
        guard.guard = Some(lock.lock_owned().await);
        guard
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub(super) struct LabelGuard<'a> {
    locks: &'a LabelLocks,
    label: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for LabelGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        let mut entries = self.locks.entries();
        if let Some(entry) = entries.get_mut(&self.label) {
            entry.users -= 1;
            if entry.users == 0 {
                entries.remove(&self.label);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_label_is_serialized() {
        let locks = Arc::new(LabelLocks::default());
        let held = locks.lock("alice").await;

        let waiter = tokio::spawn({
            let locks = locks.clone();
            async move {
                let _guard = locks.lock("alice").await;
            }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(held);
        waiter.await.unwrap();
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn different_labels_do_not_block() {
        let locks = LabelLocks::default();
        let _alice = locks.lock("alice").await;
        let _bob = tokio::time::timeout(Duration::from_millis(50), locks.lock("bob"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn abandoned_waiters_release_their_entry() {
        let locks = Arc::new(LabelLocks::default());
        let held = locks.lock("alice").await;

        let timed_out = tokio::time::timeout(Duration::from_millis(20), locks.lock("alice")).await;
        assert!(timed_out.is_err());

        let waiter = tokio::spawn({
            let locks = locks.clone();
            async move {
                let _guard = locks.lock("alice").await;
            }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        waiter.abort();
        assert!(waiter.await.unwrap_err().is_cancelled());

        drop(held);
        assert!(locks.is_empty());

        let _again = tokio::time::timeout(Duration::from_millis(50), locks.lock("alice"))
            .await
            .unwrap();
    }
}
