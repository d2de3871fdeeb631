//! Group membership and fan-out for live WS connections.
//!
//! Every accepted connection is attached with its outbound queue. A
//! connection sits in at most one group at a time; the per-connection index
//! makes leave-all on disconnect O(1). All membership changes take the single
//! write lock, so fan-out (read lock) never sees a connection half-moved.

use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use relay_core::types::ConnId;
use tokio::sync::mpsc;
use tracing::{debug, warn};

#[derive(Default)]
struct HubInner {
    /// Outbound queue per attached connection.
    senders: HashMap<ConnId, mpsc::Sender<String>>,
    /// group key -> members
    groups: HashMap<String, HashSet<ConnId>>,
    /// connection -> the one group it is in
    member_of: HashMap<ConnId, String>,
}

impl HubInner {
    fn remove_member(&mut self, conn: &ConnId) -> Option<String> {
        let key = self.member_of.remove(conn)?;
        if let Some(members) = self.groups.get_mut(&key) {
            members.remove(conn);
            if members.is_empty() {
                self.groups.remove(&key);
            }
        }
        Some(key)
    }

    fn add_member(&mut self, conn: &ConnId, key: &str) {
        self.remove_member(conn);
        self.groups
            .entry(key.to_string())
            .or_default()
            .insert(conn.clone());
        self.member_of.insert(conn.clone(), key.to_string());
    }
}

/// Channel-keyed membership table plus delivery to connection queues.
#[derive(Default)]
pub struct ChannelHub {
    inner: RwLock<HubInner>,
}

impl ChannelHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HubInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HubInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make a freshly accepted connection reachable by global broadcasts.
    pub fn attach(&self, conn: ConnId, tx: mpsc::Sender<String>) {
        self.write().senders.insert(conn, tx);
    }

    /// Forget the connection entirely: its queue and whatever group it was in.
    /// Returns the group key it left, if any.
    pub fn detach(&self, conn: &ConnId) -> Option<String> {
        let mut inner = self.write();
        inner.senders.remove(conn);
        inner.remove_member(conn)
    }

    /// Put `conn` into `key`, creating the group lazily.
    ///
    /// Single-channel model: any previous membership is dropped in the same step.
    pub fn join(&self, conn: &ConnId, key: &str) {
        self.write().add_member(conn, key);
        debug!(conn_id = %conn, key, "joined group");
    }

    /// Take `conn` out of `key`. No-op when it is not a member of that group.
    pub fn leave(&self, conn: &ConnId, key: &str) {
        let mut inner = self.write();
        if inner.member_of.get(conn).map(String::as_str) == Some(key) {
            inner.remove_member(conn);
            debug!(conn_id = %conn, key, "left group");
        }
    }

    /// Leave `from` and join `to` under one lock acquisition.
    pub fn switch(&self, conn: &ConnId, from: &str, to: &str) {
        let mut inner = self.write();
        if inner.member_of.get(conn).map(String::as_str) == Some(from) {
            inner.remove_member(conn);
        }
        inner.add_member(conn, to);
        debug!(conn_id = %conn, from, to, "switched group");
    }

    /// Deliver to one connection (replies such as `auth_ok`).
    pub fn send_to(&self, conn: &ConnId, payload: String) -> bool {
        let tx = self.read().senders.get(conn).cloned();
        match tx {
            Some(tx) => deliver(conn, &tx, payload),
            None => {
                debug!(conn_id = %conn, "send to unknown connection");
                false
            }
        }
    }

    /// Fan out to every current member of `key`. Returns how many queues accepted it.
    pub fn broadcast_to_group(&self, key: &str, payload: &str) -> usize {
        let recipients: Vec<(ConnId, mpsc::Sender<String>)> = {
            let inner = self.read();
            let Some(members) = inner.groups.get(key) else {
                return 0;
            };
            members
                .iter()
                .filter_map(|c| inner.senders.get(c).map(|tx| (c.clone(), tx.clone())))
                .collect()
        };
        fan_out(recipients, payload)
    }

    /// Fan out to every attached connection, whatever its group.
    pub fn broadcast_to_all(&self, payload: &str) -> usize {
        let recipients: Vec<(ConnId, mpsc::Sender<String>)> = self
            .read()
            .senders
            .iter()
            .map(|(c, tx)| (c.clone(), tx.clone()))
            .collect();
        fan_out(recipients, payload)
    }

    /// Group the connection is currently in.
    pub fn group_of(&self, conn: &ConnId) -> Option<String> {
        self.read().member_of.get(conn).cloned()
    }

    pub fn group_len(&self, key: &str) -> usize {
        self.read().groups.get(key).map_or(0, HashSet::len)
    }

    pub fn group_count(&self) -> usize {
        self.read().groups.len()
    }

    pub fn connection_count(&self) -> usize {
        self.read().senders.len()
    }
}

fn fan_out(recipients: Vec<(ConnId, mpsc::Sender<String>)>, payload: &str) -> usize {
    recipients
        .iter()
        .filter(|(conn, tx)| deliver(conn, tx, payload.to_string()))
        .count()
}

/// Non-blocking enqueue. A full queue drops the message; there is no retry.
fn deliver(conn: &ConnId, tx: &mpsc::Sender<String>, payload: String) -> bool {
    match tx.try_send(payload) {
        Ok(()) => true,
        Err(mpsc::error::TrySendError::Full(_)) => {
            warn!(conn_id = %conn, "send queue full, message dropped");
            false
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            debug!(conn_id = %conn, "send queue closed (connection gone)");
            false
        }
    }
}
