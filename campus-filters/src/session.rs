use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use campus_core::serde_utils::{from_json_str, to_json};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::error::SessionError;
use crate::state::FilterState;

/// Key-value text storage scoped to a session.
pub trait SessionBackend: Send + Sync {
    fn get(&self, session_id: &str, key: &str) -> Result<Option<String>, SessionError>;
    fn set(&self, session_id: &str, key: &str, value: String) -> Result<(), SessionError>;
    fn remove(&self, session_id: &str, key: &str) -> Result<(), SessionError>;
}

impl<B: SessionBackend + ?Sized> SessionBackend for Arc<B> {
    fn get(&self, session_id: &str, key: &str) -> Result<Option<String>, SessionError> {
        (**self).get(session_id, key)
    }

    fn set(&self, session_id: &str, key: &str, value: String) -> Result<(), SessionError> {
        (**self).set(session_id, key, value)
    }

    fn remove(&self, session_id: &str, key: &str) -> Result<(), SessionError> {
        (**self).remove(session_id, key)
    }
}

/// Sessions untouched for this long are dropped from [`InMemorySessionBackend`].
pub const DEFAULT_SESSION_IDLE_TTL: Duration = Duration::from_secs(30 * 60);

struct SessionEntry {
    values: HashMap<String, String>,
    touched: Instant,
}

struct SessionTable {
    sessions: HashMap<String, SessionEntry>,
    last_sweep: Instant,
}

impl SessionTable {
    fn new() -> Self {
        Self {
            sessions: HashMap::new(),
            last_sweep: Instant::now(),
        }
    }

    fn sweep(&mut self, idle_ttl: Duration, now: Instant) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, entry| now.duration_since(entry.touched) < idle_ttl);
        self.last_sweep = now;
        before - self.sessions.len()
    }
}

/// In-memory session storage keyed by session id, then entry key.
///
/// Sessions idle for longer than the configured TTL read as empty and are
/// swept on a later write.
#[derive(Clone)]
pub struct InMemorySessionBackend {
    inner: Arc<RwLock<SessionTable>>,
    idle_ttl: Duration,
}

impl Default for InMemorySessionBackend {
    fn default() -> Self {
        Self::with_idle_ttl(DEFAULT_SESSION_IDLE_TTL)
    }
}

impl InMemorySessionBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_ttl(idle_ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(SessionTable::new())),
            idle_ttl,
        }
    }

    pub fn idle_ttl(&self) -> Duration {
        self.idle_ttl
    }

    /// Number of sessions currently held, including idle ones not yet swept.
    pub fn session_count(&self) -> usize {
        self.inner.read().sessions.len()
    }

    /// Drops every idle session and returns how many were removed.
    pub fn evict_idle(&self) -> usize {
        let evicted = self.inner.write().sweep(self.idle_ttl, Instant::now());
        if evicted > 0 {
            debug!(evicted, "evicted idle sessions");
        }
        evicted
    }
}

impl SessionBackend for InMemorySessionBackend {
    fn get(&self, session_id: &str, key: &str) -> Result<Option<String>, SessionError> {
        let now = Instant::now();
        let mut inner = self.inner.write();
        let expired = match inner.sessions.get(session_id) {
            Some(entry) => now.duration_since(entry.touched) >= self.idle_ttl,
            None => return Ok(None),
        };
        if expired {
            inner.sessions.remove(session_id);
            return Ok(None);
        }
        Ok(inner.sessions.get_mut(session_id).and_then(|entry| {
            entry.touched = now;
            entry.values.get(key).cloned()
        }))
    }

    fn set(&self, session_id: &str, key: &str, value: String) -> Result<(), SessionError> {
        let now = Instant::now();
        let mut inner = self.inner.write();
        if now.duration_since(inner.last_sweep) >= self.idle_ttl / 2 {
            let evicted = inner.sweep(self.idle_ttl, now);
            if evicted > 0 {
                debug!(evicted, "evicted idle sessions");
            }
        }
        let entry = inner
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionEntry {
                values: HashMap::new(),
                touched: now,
            });
        if now.duration_since(entry.touched) >= self.idle_ttl {
            entry.values.clear();
        }
        entry.touched = now;
        entry.values.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, session_id: &str, key: &str) -> Result<(), SessionError> {
        let mut inner = self.inner.write();
        if let Some(entry) = inner.sessions.get_mut(session_id) {
            entry.values.remove(key);
            if entry.values.is_empty() {
                inner.sessions.remove(session_id);
            }
        }
        Ok(())
    }
}

/// Page families. Each keeps its filter under its own session key.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PageFamily {
    Directory,
    Issues,
}

impl PageFamily {
    pub fn session_key(&self) -> &'static str {
        match self {
            PageFamily::Directory => "filters.directory",
            PageFamily::Issues => "filters.issues",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "directory" => Some(PageFamily::Directory),
            "issues" => Some(PageFamily::Issues),
            _ => None,
        }
    }
}

/// Where the request is and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub current_path: String,
    pub referer: Option<String>,
}

impl Navigation {
    pub fn new(current_path: impl Into<String>, referer: Option<String>) -> Self {
        Self {
            current_path: current_path.into(),
            referer,
        }
    }

    /// The request arrived from another page, or without a referrer.
    pub fn is_context_switch(&self) -> bool {
        match self.referer_path() {
            Some(path) => normalize_path(&path) != normalize_path(&self.current_path),
            None => true,
        }
    }

    fn referer_path(&self) -> Option<String> {
        let raw = self.referer.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        match Url::parse(raw) {
            Ok(url) => Some(url.path().to_string()),
            Err(_) => Some(raw.split(['?', '#']).next().unwrap_or(raw).to_string()),
        }
    }
}

fn normalize_path(path: &str) -> String {
    let trimmed = path.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Loads and saves [`FilterState`] under per-family session keys.
#[derive(Clone)]
pub struct SessionFilterStore<B> {
    backend: B,
}

impl<B: SessionBackend> SessionFilterStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Stored state, or `None` when missing, unreadable or malformed.
    pub fn load(&self, session_id: &str, family: PageFamily) -> Option<FilterState> {
        let raw = match self.backend.get(session_id, family.session_key()) {
            Ok(raw) => raw?,
            Err(err) => {
                warn!(?err, key = family.session_key(), "failed to read filter state");
                return None;
            }
        };

        match from_json_str::<FilterState>(&raw) {
            Ok(state) => Some(state),
            Err(err) => {
                warn!(%err, key = family.session_key(), "discarding malformed filter state");
                None
            }
        }
    }

    pub fn save(
        &self,
        session_id: &str,
        family: PageFamily,
        state: &FilterState,
    ) -> Result<(), SessionError> {
        let encoded = to_json(state).map_err(|err| SessionError::Encode(err.to_string()))?;
        self.backend.set(session_id, family.session_key(), encoded)
    }

    pub fn clear(&self, session_id: &str, family: PageFamily) -> Result<(), SessionError> {
        self.backend.remove(session_id, family.session_key())
    }

    /// State for this request: cleared on a context switch, then loaded,
    /// falling back to the injected defaults.
    pub fn resolve(
        &self,
        session_id: &str,
        family: PageFamily,
        navigation: &Navigation,
        defaults: &FilterState,
    ) -> FilterState {
        if navigation.is_context_switch() {
            debug!(
                key = family.session_key(),
                path = %navigation.current_path,
                "navigation context changed; resetting filter"
            );
            if let Err(err) = self.clear(session_id, family) {
                warn!(?err, key = family.session_key(), "failed to clear filter state");
            }
            return defaults.clone();
        }

        self.load(session_id, family)
            .unwrap_or_else(|| defaults.clone())
    }
}
