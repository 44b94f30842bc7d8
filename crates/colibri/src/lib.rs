pub mod error;
pub mod stats;

pub use error::ColibriError;
pub use stats::{NAMESPACE, Stat, StatValue, StatsExtension, escape_xml};
