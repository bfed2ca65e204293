// src/agent/session.rs

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::agent::widget::Widget;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatLine {
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatLine {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// One conversation: its transcript and the widget the last turn left behind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub transcript: Vec<ChatLine>,
    pub widget: Widget,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            transcript: Vec::new(),
            widget: Widget::Idle,
        }
    }

    pub fn push(&mut self, role: Role, text: impl Into<String>) {
        self.transcript.push(ChatLine::new(role, text));
    }
}

/// Default cap on live sessions.
pub const DEFAULT_MAX_SESSIONS: usize = 1_000;

struct Entry {
    session: Arc<Mutex<Session>>,
    last_used: AtomicU64,
}

/// In-memory sessions keyed by id. A turn holds its session's lock for its whole duration.
///
/// Holds at most `max_sessions` entries; opening one more evicts the least recently used.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<DashMap<String, Entry>>,
    clock: Arc<AtomicU64>,
    max_sessions: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_SESSIONS)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(max_sessions: usize) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            clock: Arc::new(AtomicU64::new(0)),
            max_sessions: max_sessions.max(1),
        }
    }

    pub fn get_or_create(&self, id: &str) -> Arc<Mutex<Session>> {
        let now = self.tick();
        if let Some(entry) = self.sessions.get(id) {
            entry.last_used.store(now, Ordering::Relaxed);
            return entry.session.clone();
        }

        while self.sessions.len() >= self.max_sessions {
            if !self.evict_oldest() {
                break;
            }
        }

        self.sessions
            .entry(id.to_string())
            .or_insert_with(|| Entry {
                session: Arc::new(Mutex::new(Session::new(id))),
                last_used: AtomicU64::new(now),
            })
            .session
            .clone()
    }

    pub fn get(&self, id: &str) -> Option<Arc<Mutex<Session>>> {
        let now = self.tick();
        self.sessions.get(id).map(|entry| {
            entry.last_used.store(now, Ordering::Relaxed);
            entry.session.clone()
        })
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    // The iterator's shard locks are released before `remove` takes one.
    fn evict_oldest(&self) -> bool {
        let oldest = self
            .sessions
            .iter()
            .min_by_key(|entry| entry.last_used.load(Ordering::Relaxed))
            .map(|entry| entry.key().clone());

        match oldest {
            Some(id) => {
                debug!(session_id = %id, "evicting least recently used session");
                self.sessions.remove(&id).is_some()
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_id_shares_one_session() {
        let store = SessionStore::new();
        store.get_or_create("a").lock().await.push(Role::User, "hello");
        let again = store.get_or_create("a");
        assert_eq!(again.lock().await.transcript.len(), 1);
        assert!(store.get("b").is_none());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn full_store_evicts_least_recently_used() {
        let store = SessionStore::with_capacity(2);
        store.get_or_create("a");
        store.get_or_create("b");
        // Touching "a" leaves "b" as the oldest.
        store.get_or_create("a").lock().await.push(Role::User, "still here");

        store.get_or_create("c");

        assert_eq!(store.len(), 2);
        assert!(store.get("b").is_none());
        let kept = store.get("a").unwrap();
        assert_eq!(kept.lock().await.transcript.len(), 1);
        assert!(store.get("c").is_some());
    }
}
