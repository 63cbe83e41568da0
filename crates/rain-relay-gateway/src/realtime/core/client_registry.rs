use std::sync::atomic::{AtomicU64, Ordering};

use axum::extract::ws::Message;
use dashmap::{DashMap, DashSet};
use tokio::sync::mpsc;

use rain_relay_core::error::Result;
use rain_relay_core::protocol::client::ClientOutbound;

/// One client socket's outbound queue sender.
#[derive(Clone)]
pub struct Connection {
    pub tx: mpsc::Sender<Message>,
}

impl Connection {
    pub fn new(tx: mpsc::Sender<Message>) -> Self {
        Self { tx }
    }

    /// Lossy send: returns `false` when the queue is full or the socket is gone.
    pub fn send(&self, out: &ClientOutbound) -> Result<bool> {
        let text = out.to_json()?;
        Ok(self.tx.try_send(Message::Text(text)).is_ok())
    }
}

/// Client connection registry:
/// - `conn_key -> Connection`
/// - `user_id -> {conn_key...}` (sockets that have sent events for the user)
/// - `conn_key -> {user_id...}` (reverse index for cleanup)
#[derive(Default)]
pub struct ClientRegistry {
    conns: DashMap<String, Connection>,
    user_index: DashMap<String, DashSet<String>>,
    conn_users: DashMap<String, DashSet<String>>,
    seq: AtomicU64,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self {
            conns: DashMap::new(),
            user_index: DashMap::new(),
            conn_users: DashMap::new(),
            seq: AtomicU64::new(1),
        }
    }

    /// Allocate a process-unique connection key.
    pub fn next_conn_key(&self) -> String {
        format!("conn-{}", self.seq.fetch_add(1, Ordering::Relaxed))
    }

    pub fn insert(&self, conn_key: &str, conn: Connection) {
        self.conns.insert(conn_key.to_string(), conn);
    }

    /// Route future replies for `user_id` to `conn_key`. Idempotent.
    pub fn bind_user(&self, user_id: &str, conn_key: &str) {
        if !self.conns.contains_key(conn_key) {
            return;
        }
        self.user_index
            .entry(user_id.to_string())
            .or_insert_with(DashSet::new)
            .insert(conn_key.to_string());

        self.conn_users
            .entry(conn_key.to_string())
            .or_insert_with(DashSet::new)
            .insert(user_id.to_string());
    }

    /// Drop a connection and every user binding that points at it.
    pub fn remove_connection(&self, conn_key: &str) -> Option<Connection> {
        if let Some(users) = self.conn_users.remove(conn_key).map(|(_, v)| v) {
            for u in users.iter() {
                let user_id = u.key();
                if let Some(set) = self.user_index.get(user_id) {
                    set.remove(conn_key);
                }
                // emptiness is rechecked under the shard lock so a concurrent bind survives
                self.user_index.remove_if(user_id, |_, set| set.is_empty());
            }
        }
        self.conns.remove(conn_key).map(|(_, c)| c)
    }

    pub fn connections_for(&self, user_id: &str) -> Vec<Connection> {
        let Some(set) = self.user_index.get(user_id) else { return vec![]; };
        set.iter()
            .filter_map(|k| self.conns.get(k.key()).map(|c| c.value().clone()))
            .collect()
    }

    pub fn count_user_connections(&self, user_id: &str) -> usize {
        self.user_index.get(user_id).map(|s| s.len()).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.conns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conns.is_empty()
    }

    /// Deliver to every socket bound to `user_id`. Returns how many queues accepted it.
    pub fn send_to_user(&self, user_id: &str, out: &ClientOutbound) -> Result<usize> {
        let conns = self.connections_for(user_id);
        if conns.is_empty() {
            return Ok(0);
        }
        let text = out.to_json()?;
        let delivered = conns
            .iter()
            .filter(|c| c.tx.try_send(Message::Text(text.clone())).is_ok())
            .count();
        Ok(delivered)
    }
}
