use chorus_core::ChorusError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IrcError {
    #[error("{0} cannot be missing")]
    MissingCollaborator(&'static str),
}

impl From<IrcError> for ChorusError {
    fn from(error: IrcError) -> Self {
        ChorusError::Presence(error.to_string())
    }
}
