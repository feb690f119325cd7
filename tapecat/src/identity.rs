//! Identities of the parties talking to the catalogue.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{TapecatError, TapecatResult};

/// The identity of an administrator issuing a command.
///
/// The textual form is `username@host`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SecurityIdentity {
    pub username: String,
    pub host: String,
}

/// The identity of the end user behind an archive or retrieve request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequesterIdentity {
    /// Name of the requester.
    pub name: String,

    /// Group of the requester.
    pub group: String,
}

/// Who changed an entry, from where, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryLog {
    pub username: String,
    pub host: String,
    pub time: DateTime<Utc>,
}

impl SecurityIdentity {
    pub fn new(username: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            host: host.into(),
        }
    }
}

impl RequesterIdentity {
    pub fn new(name: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group: group.into(),
        }
    }
}

impl EntryLog {
    /// Creates an entry log for an action taken now.
    pub fn now(admin: &SecurityIdentity) -> Self {
        Self {
            username: admin.username.clone(),
            host: admin.host.clone(),
            time: Utc::now(),
        }
    }
}

impl Display for SecurityIdentity {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}@{}", self.username, self.host)
    }
}

impl FromStr for SecurityIdentity {
    type Err = TapecatError;

    fn from_str(s: &str) -> TapecatResult<Self> {
        let invalid = |reason| TapecatError::InvalidSecurityIdentity {
            identity: s.to_owned(),
            reason,
        };

        let (username, host) = s.split_once('@').ok_or_else(|| invalid("No @ separator"))?;

        if username.is_empty() {
            return Err(invalid("Empty username"));
        }

        if host.is_empty() {
            return Err(invalid("Empty host"));
        }

        Ok(Self::new(username, host))
    }
}
