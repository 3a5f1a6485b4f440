//! The identifier of the user that owns transactions.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// A newtype wrapper for user IDs.
///
/// This helps disambiguate user IDs from other string IDs such as category IDs,
/// leading to better compile time errors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserId(String);

impl UserId {
    /// Create a new user ID.
    pub fn new(id: &str) -> Self {
        Self(id.to_owned())
    }

    /// The user ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
