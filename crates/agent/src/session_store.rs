//! Session store: maps session ids to live [`Session`]s.
//!
//! Sessions are created on first use. On every access, sessions idle for
//! longer than the TTL are dropped; when the store is full, the least
//! recently used session is dropped to make room for a new one.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use taskclaw_core::session::{DEFAULT_SESSION_ID, Session};
use tracing::debug;

struct Slot {
    session: Arc<Session>,
    last_used: Instant,
}

pub struct SessionStore {
    slots: Mutex<HashMap<String, Slot>>,
    max_sessions: usize,
    idle_ttl: Duration,
}

impl SessionStore {
    pub fn new(max_sessions: usize, idle_ttl: Duration) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            max_sessions: max_sessions.max(1),
            idle_ttl,
        }
    }

    pub fn from_config(config: &taskclaw_config::SessionsConfig) -> Self {
        Self::new(config.max_sessions, Duration::from_secs(config.idle_ttl_secs))
    }

    /// Resolve a possibly-missing id to the id actually used.
    pub fn resolve_id(id: Option<&str>) -> &str {
        match id.map(str::trim) {
            Some(id) if !id.is_empty() => id,
            _ => DEFAULT_SESSION_ID,
        }
    }

    /// Fetch the session, creating it if needed.
    pub fn get_or_create(&self, id: Option<&str>) -> Arc<Session> {
        self.get_or_create_at(Self::resolve_id(id), Instant::now())
    }

    /// Fetch an existing session without creating one.
    pub fn get(&self, id: Option<&str>) -> Option<Arc<Session>> {
        self.get_at(Self::resolve_id(id), Instant::now())
    }

    /// Every live session, in no particular order.
    pub fn all(&self) -> Vec<Arc<Session>> {
        self.lock().values().map(|slot| slot.session.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Slot>> {
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn get_at(&self, id: &str, now: Instant) -> Option<Arc<Session>> {
        let mut slots = self.lock();
        self.evict_idle(&mut slots, now);
        slots.get_mut(id).map(|slot| {
            slot.last_used = now;
            slot.session.clone()
        })
    }

    fn get_or_create_at(&self, id: &str, now: Instant) -> Arc<Session> {
        let mut slots = self.lock();
        self.evict_idle(&mut slots, now);

        if let Some(slot) = slots.get_mut(id) {
            slot.last_used = now;
            return slot.session.clone();
        }

        if slots.len() >= self.max_sessions {
            let oldest = slots
                .iter()
                .min_by_key(|(_, slot)| slot.last_used)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                debug!(session = %oldest, "Evicting least recently used session");
                slots.remove(&oldest);
            }
        }

        let session = Arc::new(Session::new(id));
        slots.insert(
            id.to_string(),
            Slot {
                session: session.clone(),
                last_used: now,
            },
        );
        debug!(session = id, total = slots.len(), "Session created");
        session
    }

    fn evict_idle(&self, slots: &mut HashMap<String, Slot>, now: Instant) {
        let before = slots.len();
        slots.retain(|_, slot| now.saturating_duration_since(slot.last_used) <= self.idle_ttl);
        let evicted = before - slots.len();
        if evicted > 0 {
            debug!(evicted, "Evicted idle sessions");
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::from_config(&taskclaw_config::SessionsConfig::default())
    }
}
