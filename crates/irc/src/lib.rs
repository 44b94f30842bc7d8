pub mod connection;
pub mod error;
pub mod event;
pub mod presence;

pub use connection::{IrcConnection, IrcState, NicknameState};
pub use error::IrcError;
pub use event::{IrcEvent, IrcEventDispatcher, IrcEventListener, ListenerControl, ListenerId, NumericReply};
pub use presence::{PresenceManager, PresenceManagerBuilder};
