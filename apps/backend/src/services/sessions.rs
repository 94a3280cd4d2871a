//! In-memory session store.
//!
//! Each session is addressed by id and authenticated by an opaque bearer
//! token handed out at registration. Sessions idle for longer than the
//! store's TTL are evicted, unless an action is still in flight.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;
use verb_core::{Session, Ticket};

/// A stored session with its access metadata.
#[derive(Debug)]
pub struct SessionEntry {
    pub id: Uuid,
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    pub session: Session,
}

#[derive(Default)]
struct StoreInner {
    sessions: HashMap<Uuid, SessionEntry>,
    tokens: HashMap<String, Uuid>,
}

impl StoreInner {
    fn evict_idle(&mut self, ttl: Duration) -> usize {
        let Some(cutoff) = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| Utc::now().checked_sub_signed(ttl))
        else {
            return 0;
        };

        let expired: Vec<Uuid> = self
            .sessions
            .values()
            .filter(|entry| entry.last_seen_at < cutoff && entry.session.pending().is_none())
            .map(|entry| entry.id)
            .collect();

        for id in &expired {
            if let Some(entry) = self.sessions.remove(id) {
                self.tokens.remove(&entry.token);
            }
        }
        expired.len()
    }
}

/// Default idle time before a session is evicted.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Shared store of all live sessions.
pub struct SessionStore {
    inner: RwLock<StoreInner>,
    idle_ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_idle_ttl(DEFAULT_SESSION_TTL)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_ttl(idle_ttl: Duration) -> Self {
        Self {
            inner: RwLock::new(StoreInner::default()),
            idle_ttl,
        }
    }

    /// Store a new session and return its id and token. Idle sessions are
    /// evicted first.
    pub async fn create(&self, session: Session) -> (Uuid, String) {
        let id = Uuid::new_v4();
        let token = format!("vt_{}", Uuid::new_v4().simple());
        let now = Utc::now();

        let mut inner = self.inner.write().await;
        inner.evict_idle(self.idle_ttl);
        inner.tokens.insert(token.clone(), id);
        inner.sessions.insert(
            id,
            SessionEntry {
                id,
                token: token.clone(),
                created_at: now,
                last_seen_at: now,
                session,
            },
        );

        (id, token)
    }

    /// Resolve a token to its session id and mark the session as seen.
    pub async fn authenticate(&self, token: &str) -> Option<Uuid> {
        let mut inner = self.inner.write().await;
        let id = *inner.tokens.get(token)?;
        let entry = inner.sessions.get_mut(&id)?;
        entry.last_seen_at = Utc::now();
        Some(id)
    }

    /// Run `f` against a session under the store lock.
    ///
    /// `f` must not block; never call external services from inside it.
    pub async fn with_session<R>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut SessionEntry) -> R,
    ) -> Option<R> {
        let mut inner = self.inner.write().await;
        inner.sessions.get_mut(&id).map(f)
    }

    /// Drop sessions whose `last_seen_at` is older than the TTL. Returns how
    /// many were removed.
    pub async fn evict_idle(&self) -> usize {
        self.inner.write().await.evict_idle(self.idle_ttl)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.sessions.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Releases a session's in-flight slot if the holder goes away early.
///
/// Handlers hold one of these across every external call. Call
/// [`SlotGuard::disarm`] once the ticket has been redeemed, or
/// [`SlotGuard::release`] on a failed call. If the request is dropped
/// mid-flight (client disconnect), the drop abandons the ticket in the
/// background and nothing is merged.
pub struct SlotGuard {
    store: Arc<SessionStore>,
    session_id: Uuid,
    ticket: Option<Ticket>,
}

impl SlotGuard {
    pub fn new(store: Arc<SessionStore>, session_id: Uuid, ticket: Ticket) -> Self {
        Self {
            store,
            session_id,
            ticket: Some(ticket),
        }
    }

    pub fn disarm(mut self) {
        self.ticket = None;
    }

    /// Release the slot before returning an error, so an immediate retry is
    /// not refused while a drop-time release is still queued.
    pub async fn release(mut self) {
        if let Some(ticket) = self.ticket.take() {
            self.store
                .with_session(self.session_id, |entry| entry.session.abandon(ticket))
                .await;
        }
    }
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        let Some(ticket) = self.ticket.take() else {
            return;
        };
        let store = self.store.clone();
        let session_id = self.session_id;

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    store
                        .with_session(session_id, |entry| entry.session.abandon(ticket))
                        .await;
                });
            }
            Err(_) => {
                if let Ok(mut inner) = store.inner.try_write() {
                    if let Some(entry) = inner.sessions.get_mut(&session_id) {
                        entry.session.abandon(ticket);
                    }
                }
            }
        }
    }
}
