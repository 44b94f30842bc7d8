use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

/// Inbound IRC events, already decoded by the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IrcEvent {
    /// A server numeric reply. The code is absent when the line carried none.
    ServerNumeric { code: Option<u16> },
    /// A QUIT, carrying the nickname of the user who left if known.
    Quit { nick: Option<String> },
}

/// Numeric replies that acknowledge away-state changes (RFC 2812 section 5.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericReply {
    /// 305: "You are no longer marked as being away"
    Unaway,
    /// 306: "You have been marked as being away"
    NowAway,
}

impl NumericReply {
    pub const RPL_UNAWAY: u16 = 305;
    pub const RPL_NOWAWAY: u16 = 306;

    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            Self::RPL_UNAWAY => Some(Self::Unaway),
            Self::RPL_NOWAWAY => Some(Self::NowAway),
            _ => None,
        }
    }

    pub fn code(&self) -> u16 {
        match self {
            Self::Unaway => Self::RPL_UNAWAY,
            Self::NowAway => Self::RPL_NOWAWAY,
        }
    }
}

/// What the dispatcher should do with a listener after it handled an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerControl {
    Continue,
    Detach,
}

pub trait IrcEventListener: Send + Sync + 'static {
    fn on_event(&self, event: &IrcEvent) -> ListenerControl;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Connection-side registry that delivers inbound events to listeners in
/// registration order.
#[derive(Default)]
pub struct IrcEventDispatcher {
    next_id: AtomicU64,
    listeners: RwLock<Vec<(ListenerId, Arc<dyn IrcEventListener>)>>,
}

impl IrcEventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, listener: Arc<dyn IrcEventListener>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, listener));
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unregister(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(registered, _)| *registered != id);
        listeners.len() != before
    }

    /// Deliver `event` to every listener. Listeners answering
    /// [`ListenerControl::Detach`] are removed once delivery completes.
    pub fn dispatch(&self, event: &IrcEvent) {
        // Listeners run without the lock held so they may register or
        // unregister from inside a callback.
        let snapshot: Vec<_> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let detached: Vec<ListenerId> = snapshot
            .iter()
            .filter(|(_, listener)| listener.on_event(event) == ListenerControl::Detach)
            .map(|(id, _)| *id)
            .collect();

        for id in detached {
            if self.unregister(id) {
                debug!(?id, "listener detached");
            }
        }
    }

    pub fn len(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
