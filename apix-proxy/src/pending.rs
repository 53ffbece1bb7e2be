use std::collections::HashMap;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::error::ProxyError;

pub(crate) type ReplyResult = Result<Vec<u8>, ProxyError>;

struct PendingState {
    closed: bool,
    slots: HashMap<u64, oneshot::Sender<ReplyResult>>,
}

/// Outstanding calls keyed by correlation id. Insert, delivery and close all
/// happen under one lock, so a call can never register after the table was
/// drained.
pub(crate) struct PendingTable {
    state: Mutex<PendingState>,
}

impl PendingTable {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(PendingState {
                closed: false,
                slots: HashMap::new(),
            }),
        }
    }

    pub fn register(&self, id: u64) -> Result<oneshot::Receiver<ReplyResult>, ProxyError> {
        let (tx, rx) = oneshot::channel();
        let mut state = self.state.lock();
        if state.closed {
            return Err(ProxyError::StreamClosed);
        }
        state.slots.insert(id, tx);
        debug!(id, pending = state.slots.len(), "registered pending call");
        Ok(rx)
    }

    /// Delivers a reply. Returns false when no call is waiting on `id`.
    pub fn complete(&self, id: u64, body: Vec<u8>) -> bool {
        let slot = self.state.lock().slots.remove(&id);
        match slot {
            Some(tx) => {
                if tx.send(Ok(body)).is_err() {
                    debug!(id, "caller went away before its reply arrived");
                }
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, id: u64) -> bool {
        self.state.lock().slots.remove(&id).is_some()
    }

    /// Fails every outstanding call with `reason` and refuses new registrations.
    pub fn close(&self, reason: ProxyError) -> usize {
        let drained: Vec<_> = {
            let mut state = self.state.lock();
            state.closed = true;
            state.slots.drain().collect()
        };
        let count = drained.len();
        if count > 0 {
            warn!(count, %reason, "failing outstanding calls");
        }
        for (_, tx) in drained {
            let _ = tx.send(Err(reason.clone()));
        }
        count
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn len(&self) -> usize {
        self.state.lock().slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_reply_to_matching_slot() {
        let table = PendingTable::new();
        let rx = table.register(1).unwrap();
        assert!(table.complete(1, b"ok".to_vec()));
        assert_eq!(rx.await.unwrap().unwrap(), b"ok".to_vec());
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn unknown_reply_is_ignored() {
        let table = PendingTable::new();
        let _rx = table.register(1).unwrap();
        assert!(!table.complete(2, Vec::new()));
        assert_eq!(table.len(), 1);
    }

    #[tokio::test]
    async fn close_fails_waiters_and_rejects_new_calls() {
        let table = PendingTable::new();
        let rx = table.register(1).unwrap();
        assert_eq!(table.close(ProxyError::StreamClosed), 1);
        assert_eq!(rx.await.unwrap(), Err(ProxyError::StreamClosed));
        assert!(table.is_closed());
        assert_eq!(table.register(2).unwrap_err(), ProxyError::StreamClosed);
    }
}
