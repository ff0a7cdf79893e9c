//! The set of in-flight message ids.
//!
//! This is the only cross-task coordination point of a turn: a message id is
//! inserted when its network call starts and removed exactly once when the
//! call settles. Barriers wait for the set to become empty.

use chorus_domain::MessageId;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::watch;

/// Shared set of message ids whose responses are streaming.
///
/// Cloning yields another handle to the same set.
#[derive(Debug, Clone)]
pub struct StreamingSet {
    tx: Arc<watch::Sender<HashSet<MessageId>>>,
}

impl Default for StreamingSet {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamingSet {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(HashSet::new());
        Self { tx: Arc::new(tx) }
    }

    /// Atomically add `id`, returning a guard that removes it on drop.
    ///
    /// Returns `None` if the id is already present.
    pub fn try_enter(&self, id: &MessageId) -> Option<StreamingGuard> {
        let inserted = self.tx.send_if_modified(|set| set.insert(id.clone()));
        inserted.then(|| StreamingGuard {
            set: self.clone(),
            id: id.clone(),
            released: false,
        })
    }

    fn remove(&self, id: &MessageId) -> bool {
        self.tx.send_if_modified(|set| set.remove(id))
    }

    pub fn contains(&self, id: &MessageId) -> bool {
        self.tx.borrow().contains(id)
    }

    pub fn len(&self) -> usize {
        self.tx.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.borrow().is_empty()
    }

    /// Ids currently streaming, in no particular order
    pub fn snapshot(&self) -> Vec<MessageId> {
        self.tx.borrow().iter().cloned().collect()
    }

    /// Block until no response is streaming.
    pub async fn wait_until_empty(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(HashSet::is_empty).await;
    }
}

/// Membership of one message id in a [`StreamingSet`].
#[derive(Debug)]
pub struct StreamingGuard {
    set: StreamingSet,
    id: MessageId,
    released: bool,
}

impl StreamingGuard {
    /// Remove the id now instead of at drop.
    pub fn release(mut self) {
        self.released = true;
        self.set.remove(&self.id);
    }
}

impl Drop for StreamingGuard {
    fn drop(&mut self) {
        if !self.released {
            self.set.remove(&self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_enter_and_release() {
        let set = StreamingSet::new();
        let id = MessageId::new("m1");

        let guard = set.try_enter(&id).unwrap();
        assert!(set.contains(&id));
        assert_eq!(set.len(), 1);

        guard.release();
        assert!(set.is_empty());
    }

    #[test]
    fn test_same_id_cannot_enter_twice() {
        let set = StreamingSet::new();
        let id = MessageId::new("m1");

        let _guard = set.try_enter(&id).unwrap();
        assert!(set.try_enter(&id).is_none());
    }

    #[test]
    fn test_drop_removes_id() {
        let set = StreamingSet::new();
        let id = MessageId::new("m1");
        {
            let _guard = set.try_enter(&id).unwrap();
        }
        assert!(!set.contains(&id));
    }

    #[tokio::test]
    async fn test_wait_until_empty_returns_immediately_when_idle() {
        let set = StreamingSet::new();
        tokio::time::timeout(Duration::from_secs(1), set.wait_until_empty())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_wait_until_empty_blocks_until_last_release() {
        let set = StreamingSet::new();
        let a = set.try_enter(&MessageId::new("a")).unwrap();
        let b = set.try_enter(&MessageId::new("b")).unwrap();

        let waiter = {
            let set = set.clone();
            tokio::spawn(async move { set.wait_until_empty().await })
        };

        a.release();
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        drop(b);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }
}
