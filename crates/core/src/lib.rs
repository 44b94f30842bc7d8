pub mod config;
pub mod error;
pub mod logging;
pub mod presence;

pub use error::{ChorusError, Result};
pub use presence::{PresenceStatus, PresenceStatusListener};
