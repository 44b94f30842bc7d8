use std::sync::{PoisonError, RwLock};

/// Outbound half of an IRC connection, as seen by protocol adapters.
pub trait IrcConnection: Send + Sync + 'static {
    /// Write one raw protocol line. Delivery is the connection's concern.
    fn send_raw(&self, command: &str);
}

/// Connection-scoped identity of the local user.
pub trait IrcState: Send + Sync + 'static {
    /// The local nickname, or `None` before registration completes.
    fn nickname(&self) -> Option<String>;
}

/// [`IrcState`] backed by a nickname the connection updates on NICK changes.
#[derive(Debug, Default)]
pub struct NicknameState {
    nickname: RwLock<Option<String>>,
}

impl NicknameState {
    pub fn new(nickname: impl Into<String>) -> Self {
        Self {
            nickname: RwLock::new(Some(nickname.into())),
        }
    }

    pub fn set_nickname(&self, nickname: impl Into<String>) {
        *self.nickname.write().unwrap_or_else(PoisonError::into_inner) = Some(nickname.into());
    }

    pub fn clear(&self) {
        *self.nickname.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl IrcState for NicknameState {
    fn nickname(&self) -> Option<String> {
        self.nickname
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
