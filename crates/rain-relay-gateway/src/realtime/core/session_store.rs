use dashmap::DashMap;

/// Session used for chat requests when neither the store nor the client names one.
pub const DEFAULT_SESSION: &str = "default_session";

/// `user_id -> session_id`, last write wins.
///
/// Entries are only written by matchmaking requests: a request naming a session
/// sets it, a request without one clears it. Nothing else evicts them.
#[derive(Default)]
pub struct SessionStore {
    map: DashMap<String, String>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self { map: DashMap::new() }
    }

    /// Set the active session for a user, returning the one it replaced.
    pub fn bind(&self, user_id: &str, session_id: &str) -> Option<String> {
        self.map.insert(user_id.to_string(), session_id.to_string())
    }

    /// Forget the user's session, returning the one it held.
    pub fn clear(&self, user_id: &str) -> Option<String> {
        self.map.remove(user_id).map(|(_, s)| s)
    }

    pub fn get(&self, user_id: &str) -> Option<String> {
        self.map.get(user_id).map(|s| s.value().clone())
    }

    /// Stored session, else the client-supplied one, else [`DEFAULT_SESSION`].
    /// Never writes.
    pub fn resolve(&self, user_id: &str, fallback: Option<&str>) -> String {
        self.get(user_id)
            .or_else(|| fallback.map(str::to_string))
            .unwrap_or_else(|| DEFAULT_SESSION.to_string())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
