use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, trace};

use chorus_core::presence::{PresenceStatus, PresenceStatusListener};

use crate::connection::{IrcConnection, IrcState};
use crate::error::IrcError;
use crate::event::{IrcEvent, IrcEventListener, ListenerControl, NumericReply};

#[derive(Debug, Default)]
struct AwayMessages {
    /// Confirmed by the server. Written only by the acknowledgement handlers.
    active: String,
    /// Last message the local user asked for.
    submitted: String,
}

/// Tracks the local user's away state on one IRC connection.
///
/// `set_away` only sends the request. The confirmed state changes when the
/// server answers with `RPL_NOWAWAY` (306) or `RPL_UNAWAY` (305), which the
/// connection delivers through [`IrcEventListener::on_event`] or the
/// `on_away_*` handlers directly.
pub struct PresenceManager {
    connection: Arc<dyn IrcConnection>,
    state: Arc<dyn IrcState>,
    status_listener: Arc<dyn PresenceStatusListener>,
    away: AtomicBool,
    attached: AtomicBool,
    messages: RwLock<AwayMessages>,
}

impl PresenceManager {
    pub fn builder() -> PresenceManagerBuilder {
        PresenceManagerBuilder::default()
    }

    pub fn is_away(&self) -> bool {
        self.away.load(Ordering::Acquire)
    }

    /// The confirmed away message, or an empty string when not away.
    pub fn message(&self) -> String {
        if self.is_away() {
            self.read_messages().active.clone()
        } else {
            String::new()
        }
    }

    /// False once the local user's QUIT has been seen.
    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }

    /// Ask the server to mark the user away with `message`, or to clear the
    /// away status when `message` is `None` or empty.
    pub fn set_away(&self, message: Option<&str>) {
        match message.filter(|m| !m.is_empty()) {
            None => {
                debug!("requesting away status removal");
                self.connection.send_raw("AWAY");
            }
            Some(message) => {
                self.write_messages().submitted = message.to_string();
                debug!(message = %message, "requesting away status");
                self.connection.send_raw(&format!("AWAY :{message}"));
            }
        }
    }

    /// Handle `RPL_NOWAWAY`: the last submitted message becomes active.
    pub fn on_away_confirmed(&self) {
        if !self.is_attached() {
            return;
        }
        {
            let mut messages = self.write_messages();
            messages.active = messages.submitted.clone();
        }
        self.away.store(true, Ordering::Release);
        self.status_listener
            .update_presence_status(PresenceStatus::Online, PresenceStatus::Away);
        debug!("away status enabled");
    }

    /// Handle `RPL_UNAWAY`.
    pub fn on_away_cleared(&self) {
        if !self.is_attached() {
            return;
        }
        self.write_messages().active.clear();
        self.away.store(false, Ordering::Release);
        self.status_listener
            .update_presence_status(PresenceStatus::Away, PresenceStatus::Online);
        debug!("away status disabled");
    }

    /// Handle a QUIT from `nick`. Detaches for good and returns `true` when
    /// `nick` is the local user; any other nick, or an unknown one, is ignored.
    pub fn on_local_user_disconnected(&self, nick: Option<&str>) -> bool {
        let Some(nick) = nick else {
            return false;
        };
        if self.state.nickname().as_deref() != Some(nick) {
            return false;
        }
        if self.attached.swap(false, Ordering::AcqRel) {
            debug!(nick = %nick, "local user quit, detaching presence manager");
        }
        true
    }

    fn handle_numeric(&self, code: Option<u16>) {
        match code.and_then(NumericReply::from_code) {
            Some(NumericReply::Unaway) => self.on_away_cleared(),
            Some(NumericReply::NowAway) => self.on_away_confirmed(),
            None => trace!(?code, "ignoring numeric reply"),
        }
    }

    fn read_messages(&self) -> RwLockReadGuard<'_, AwayMessages> {
        self.messages.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_messages(&self) -> RwLockWriteGuard<'_, AwayMessages> {
        self.messages.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl IrcEventListener for PresenceManager {
    fn on_event(&self, event: &IrcEvent) -> ListenerControl {
        if !self.is_attached() {
            return ListenerControl::Detach;
        }
        match event {
            IrcEvent::ServerNumeric { code } => {
                self.handle_numeric(*code);
                ListenerControl::Continue
            }
            IrcEvent::Quit { nick } => {
                if self.on_local_user_disconnected(nick.as_deref()) {
                    ListenerControl::Detach
                } else {
                    ListenerControl::Continue
                }
            }
        }
    }
}

impl std::fmt::Debug for PresenceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresenceManager")
            .field("away", &self.is_away())
            .field("attached", &self.is_attached())
            .finish_non_exhaustive()
    }
}

/// Collects the collaborators a [`PresenceManager`] needs. `build` rejects a
/// missing collaborator instead of deferring the failure to first use.
#[derive(Default)]
pub struct PresenceManagerBuilder {
    connection: Option<Arc<dyn IrcConnection>>,
    state: Option<Arc<dyn IrcState>>,
    status_listener: Option<Arc<dyn PresenceStatusListener>>,
}

impl PresenceManagerBuilder {
    pub fn connection(mut self, connection: Arc<dyn IrcConnection>) -> Self {
        self.connection = Some(connection);
        self
    }

    pub fn state(mut self, state: Arc<dyn IrcState>) -> Self {
        self.state = Some(state);
        self
    }

    pub fn status_listener(mut self, status_listener: Arc<dyn PresenceStatusListener>) -> Self {
        self.status_listener = Some(status_listener);
        self
    }

    pub fn build(self) -> Result<PresenceManager, IrcError> {
        let state = self.state.ok_or(IrcError::MissingCollaborator("state"))?;
        let status_listener = self
            .status_listener
            .ok_or(IrcError::MissingCollaborator("status listener"))?;
        let connection = self
            .connection
            .ok_or(IrcError::MissingCollaborator("connection"))?;

        Ok(PresenceManager {
            connection,
            state,
            status_listener,
            away: AtomicBool::new(false),
            attached: AtomicBool::new(true),
            messages: RwLock::new(AwayMessages::default()),
        })
    }
}
