use dashmap::{mapref::entry::Entry, DashMap};
use relay_core::types::{ConnId, UserId};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::types::{ChannelChange, Session};

/// Authoritative map of live connections to their sessions.
///
/// Sharded by connection id, so sessions of different connections never
/// contend. Callbacks passed to the `*_with` methods run while the
/// connection's entry is still locked: group membership updated there can
/// never be observed out of step with the session.
#[derive(Default)]
pub struct ConnectionRegistry {
    sessions: DashMap<ConnId, Session>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create (or overwrite) the session for `conn`, parked in world.
    pub fn register(&self, conn: &ConnId, user_id: Option<UserId>) {
        self.register_with(conn, user_id, |_| {});
    }

    /// Like [`register`](Self::register); `on_register` receives the group key
    /// the connection held before (None for a first registration).
    #[instrument(skip_all, fields(conn_id = %conn, user_id = %UserId::label(user_id.as_ref())))]
    pub fn register_with<F>(&self, conn: &ConnId, user_id: Option<UserId>, on_register: F)
    where
        F: FnOnce(Option<String>),
    {
        let session = Session::new(user_id);
        match self.sessions.entry(conn.clone()) {
            Entry::Occupied(mut entry) => {
                let previous = entry.insert(session);
                let previous_user = UserId::label(previous.user_id.as_ref());
                debug!(previous = %previous_user, "session re-registered");
                on_register(Some(previous.key()));
            }
            Entry::Vacant(entry) => {
                let _guard = entry.insert(session);
                debug!("session registered");
                on_register(None);
            }
        }
    }

    /// Snapshot of the session, if the connection has authenticated.
    pub fn get(&self, conn: &ConnId) -> Option<Session> {
        self.sessions.get(conn).map(|s| s.value().clone())
    }

    /// Overwrite the session's channel. No-op (None) for unknown connections.
    pub fn set_channel(&self, conn: &ConnId, descriptor: Option<Value>) -> Option<ChannelChange> {
        self.set_channel_with(conn, descriptor, |_| {})
    }

    /// Like [`set_channel`](Self::set_channel); `on_change` runs before the entry is released.
    pub fn set_channel_with<F>(
        &self,
        conn: &ConnId,
        descriptor: Option<Value>,
        on_change: F,
    ) -> Option<ChannelChange>
    where
        F: FnOnce(&ChannelChange),
    {
        let mut entry = self.sessions.get_mut(conn)?;
        let session = entry.value_mut();
        let from = session.key();
        session.set_descriptor(descriptor);
        let change = ChannelChange { from, to: session.key() };
        on_change(&change);
        Some(change)
    }

    /// Drop the session; returns it so the caller can log or clean up.
    pub fn remove(&self, conn: &ConnId) -> Option<Session> {
        self.sessions.remove(conn).map(|(_, s)| s)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn register_get_remove() {
        let reg = ConnectionRegistry::new();
        let conn = ConnId::from("c1");
        assert!(reg.get(&conn).is_none());

        reg.register(&conn, Some("u-1".into()));
        let s = reg.get(&conn).unwrap();
        assert_eq!(s.user_id, Some("u-1".into()));
        assert_eq!(s.key(), "world");

        assert!(reg.remove(&conn).is_some());
        assert!(reg.get(&conn).is_none());
        assert!(reg.remove(&conn).is_none());
    }

    #[test]
    fn re_register_overwrites_and_resets_to_world() {
        let reg = ConnectionRegistry::new();
        let conn = ConnId::from("c1");
        reg.register(&conn, Some("u-1".into()));
        reg.set_channel(&conn, Some(json!({"type": "league", "leagueId": "L1"})));

        let mut previous = None;
        reg.register_with(&conn, Some("u-2".into()), |prev| previous = prev);

        assert_eq!(previous.as_deref(), Some("league:L1"));
        assert_eq!(reg.len(), 1);
        let s = reg.get(&conn).unwrap();
        assert_eq!(s.user_id, Some("u-2".into()));
        assert_eq!(s.key(), "world");
    }

    #[test]
    fn first_register_reports_no_previous_key() {
        let reg = ConnectionRegistry::new();
        let mut called = false;
        reg.register_with(&ConnId::from("c1"), Some("u-1".into()), |prev| {
            assert!(prev.is_none());
            called = true;
        });
        assert!(called);
    }

    #[test]
    fn set_channel_reports_change() {
        let reg = ConnectionRegistry::new();
        let conn = ConnId::from("c1");
        reg.register(&conn, Some("u-1".into()));

        let change = reg
            .set_channel(&conn, Some(json!({"type": "room", "leagueId": "L1", "roomId": "R3"})))
            .unwrap();
        assert_eq!(change, ChannelChange { from: "world".into(), to: "room:L1:R3".into() });

        let session = reg.get(&conn).unwrap();
        assert_eq!(session.key(), "room:L1:R3");
        assert_eq!(session.descriptor.unwrap()["roomId"], "R3");

        let change = reg.set_channel(&conn, Some(json!({"type": "bogus"}))).unwrap();
        assert_eq!(change, ChannelChange { from: "room:L1:R3".into(), to: "world".into() });
    }

    #[test]
    fn set_channel_on_unknown_connection_is_noop() {
        let reg = ConnectionRegistry::new();
        let mut ran = false;
        let change = reg.set_channel_with(&ConnId::from("ghost"), None, |_| ran = true);
        assert!(change.is_none());
        assert!(!ran);
        assert!(reg.is_empty());
    }
}
