use crate::campaign::error::LoadError;
use crate::config::error::ConfigError;
use crate::schedule::error::ScheduleError;
use thiserror::Error;

pub type Result<T, E = ApplicationError> = std::result::Result<T, E>;

#[derive(Debug, Error, PartialEq)]
pub enum ApplicationError {
    #[error("The configuration is invalid: {0}")]
    Config(#[from] ConfigError),
    #[error("The campaign has not started: {0}")]
    Schedule(#[from] ScheduleError),
    #[error("The recipients or the template couldn't be loaded: {0}")]
    Load(#[from] LoadError),
}

impl ApplicationError {
    /// Process exit status. 0 is kept for runs that went through the whole campaign.
    pub fn exit_status(&self) -> u8 {
        match self {
            ApplicationError::Config(_) => 2,
            ApplicationError::Load(_) => 3,
            ApplicationError::Schedule(_) => 130,
        }
    }
}
