use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rfq_core::flows::QuoteWizard;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::info;
use uuid::Uuid;

pub type SharedWizard = Arc<Mutex<QuoteWizard>>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("wizard session capacity of {0} reached")]
    CapacityReached(usize),
}

struct SessionEntry {
    wizard: SharedWizard,
    last_touched: Instant,
}

impl SessionEntry {
    fn is_idle(&self, now: Instant, idle_limit: Duration) -> bool {
        now.saturating_duration_since(self.last_touched) >= idle_limit
    }
}

/// Open wizard sessions keyed by an opaque id. Each session is locked
/// independently so one slow submission never blocks another session.
///
/// A session nobody has touched for `idle_limit` is treated as abandoned:
/// lookups no longer find it and it is dropped when room is needed.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionEntry>>,
    capacity: usize,
    idle_limit: Duration,
}

impl SessionStore {
    pub fn new(capacity: usize, idle_limit: Duration) -> Self {
        Self { sessions: RwLock::new(HashMap::new()), capacity: capacity.max(1), idle_limit }
    }

    pub fn new_session_id() -> String {
        format!("qw-{}", Uuid::new_v4().simple())
    }

    pub async fn insert(&self, session_id: String, wizard: QuoteWizard) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().await;
        if sessions.len() >= self.capacity {
            evict_idle(&mut sessions, self.idle_limit);
        }
        if sessions.len() >= self.capacity {
            return Err(SessionError::CapacityReached(self.capacity));
        }
        let entry = SessionEntry { wizard: Arc::new(Mutex::new(wizard)), last_touched: Instant::now() };
        sessions.insert(session_id, entry);
        Ok(())
    }

    /// Returns the session and marks it as touched.
    pub async fn get(&self, session_id: &str) -> Option<SharedWizard> {
        let mut sessions = self.sessions.write().await;
        let now = Instant::now();

        if sessions.get(session_id)?.is_idle(now, self.idle_limit) {
            sessions.remove(session_id);
            info!(
                event_name = "wizard.session.expired",
                session_id = %session_id,
                "idle quote wizard session discarded"
            );
            return None;
        }

        let entry = sessions.get_mut(session_id)?;
        entry.last_touched = now;
        Some(entry.wizard.clone())
    }

    pub async fn remove(&self, session_id: &str) -> bool {
        self.sessions.write().await.remove(session_id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

fn evict_idle(sessions: &mut HashMap<String, SessionEntry>, idle_limit: Duration) {
    let now = Instant::now();
    let before = sessions.len();
    sessions.retain(|_, entry| !entry.is_idle(now, idle_limit));

    let evicted = before - sessions.len();
    if evicted > 0 {
        info!(
            event_name = "wizard.session.evicted",
            evicted,
            open_sessions = sessions.len(),
            "idle quote wizard sessions evicted"
        );
    }
}
