//! Session liveness
//!
//! A user talks to one persona at a time. Switching persona expires the old
//! session's token; background work (extraction, paced delivery) checks its
//! token before applying results so late arrivals are dropped instead of
//! written into a conversation nobody is looking at.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::domain::ConversationKey;

/// Liveness token carried by background tasks
#[derive(Debug, Clone)]
pub struct SessionToken {
    key: ConversationKey,
    alive: Arc<AtomicBool>,
}

impl SessionToken {
    fn new(key: ConversationKey) -> Self {
        Self {
            key,
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Token that is never registered anywhere; useful for one-off work
    pub fn detached(key: ConversationKey) -> Self {
        Self::new(key)
    }

    pub fn key(&self) -> &ConversationKey {
        &self.key
    }

    /// False once the session was replaced or closed
    pub fn is_live(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    fn expire(&self) {
        self.alive.store(false, Ordering::Release);
    }
}

/// Background task bound to a session. Aborted when dropped.
pub struct TrackHandle {
    handle: JoinHandle<()>,
}

impl TrackHandle {
    pub fn new(handle: JoinHandle<()>) -> Self {
        Self { handle }
    }
}

impl Drop for TrackHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// One active conversation view
pub struct Session {
    token: SessionToken,
    typing: watch::Sender<bool>,
    watcher: Mutex<Option<TrackHandle>>,
}

impl Session {
    fn new(key: ConversationKey) -> Self {
        let (typing, _) = watch::channel(false);
        Self {
            token: SessionToken::new(key),
            typing,
            watcher: Mutex::new(None),
        }
    }

    pub fn key(&self) -> &ConversationKey {
        self.token.key()
    }

    pub fn token(&self) -> SessionToken {
        self.token.clone()
    }

    pub fn is_live(&self) -> bool {
        self.token.is_live()
    }

    /// Whether the persona is currently "typing" a reply
    pub fn is_typing(&self) -> bool {
        *self.typing.borrow()
    }

    pub(crate) fn set_typing(&self, typing: bool) {
        self.typing.send_replace(typing);
    }

    /// Bind the self-narrative watcher; a previous one is aborted
    pub fn attach_watcher(&self, handle: TrackHandle) {
        if let Ok(mut slot) = self.watcher.lock() {
            *slot = Some(handle);
        }
    }

    fn close(&self) {
        self.token.expire();
        self.set_typing(false);
        if let Ok(mut slot) = self.watcher.lock() {
            slot.take();
        }
    }
}

/// Active session per user
#[derive(Default)]
pub struct SessionRegistry {
    active: Mutex<HashMap<String, Arc<Session>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `key` the user's active conversation. Any previous session of
    /// that user is closed, even when it pointed at the same persona.
    pub fn activate(&self, key: ConversationKey) -> Arc<Session> {
        let session = Arc::new(Session::new(key.clone()));
        let previous = self
            .active
            .lock()
            .ok()
            .and_then(|mut active| active.insert(key.user_id.clone(), session.clone()));

        if let Some(previous) = previous {
            tracing::info!(
                "🔀 Session switched for {}: {} -> {}",
                key.user_id,
                previous.key().persona_id,
                key.persona_id
            );
            previous.close();
        }

        session
    }

    /// The user's active session, whatever persona it points at
    pub fn current(&self, user_id: &str) -> Option<Arc<Session>> {
        self.active.lock().ok()?.get(user_id).cloned()
    }

    /// The active session only if it is for exactly this conversation
    pub fn find(&self, key: &ConversationKey) -> Option<Arc<Session>> {
        self.current(&key.user_id).filter(|s| s.key() == key)
    }

    /// Close the user's session, if any
    pub fn deactivate(&self, user_id: &str) -> bool {
        let removed = self
            .active
            .lock()
            .ok()
            .and_then(|mut active| active.remove(user_id));
        match removed {
            Some(session) => {
                session.close();
                true
            }
            None => false,
        }
    }
}
