//! Caller identity supplied by the auth provider.

use serde::{Deserialize, Serialize};

use crate::ids::UserId;

/// The signed-in caller; credentials never reach this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub uid: UserId,
    pub email: String,
}

impl Identity {
    pub fn new(uid: impl Into<UserId>, email: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: email.into(),
        }
    }
}
