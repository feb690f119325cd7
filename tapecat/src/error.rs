//! Error handling.

use std::error::Error as StdError;

use displaydoc::Display;

pub type TapecatResult<T> = Result<T, TapecatError>;

/// An error.
#[derive(Debug, Display)]
pub enum TapecatError {
    /// Invalid security identity "{identity}": {reason}
    InvalidSecurityIdentity {
        identity: String,
        reason: &'static str,
    },

    /// Checksum error: {0}
    ChecksumError(super::checksum::Error),
}

impl TapecatError {
    pub fn name(&self) -> &'static str {
        match self {
            Self::InvalidSecurityIdentity { .. } => "InvalidSecurityIdentity",
            Self::ChecksumError(_) => "ChecksumError",
        }
    }
}

impl StdError for TapecatError {}

impl From<super::checksum::Error> for TapecatError {
    fn from(error: super::checksum::Error) -> Self {
        Self::ChecksumError(error)
    }
}
