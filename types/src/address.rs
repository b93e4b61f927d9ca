//! Account address type with `tellor1` prefix.

use crate::error::LayerError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A layer account address, always prefixed with `tellor1`.
///
/// Reporters, selectors, tippers, fee payers and the team account all share
/// this representation.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountAddress(String);

impl AccountAddress {
    /// The human-readable prefix for all layer account addresses.
    pub const PREFIX: &'static str = "tellor1";

    /// Create a new account address from a raw string.
    ///
    /// # Panics
    /// Panics if the string does not start with `tellor1`.
    pub fn new(raw: impl Into<String>) -> Self {
        let s = raw.into();
        assert!(s.starts_with(Self::PREFIX), "address must start with tellor1");
        Self(s)
    }

    /// Parse untrusted input (client messages, config files).
    pub fn parse(raw: &str) -> Result<Self, LayerError> {
        let candidate = Self(raw.trim().to_string());
        if candidate.is_valid() {
            Ok(candidate)
        } else {
            Err(LayerError::InvalidAddress(raw.to_string()))
        }
    }

    /// Return the raw address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validate that this address is well-formed.
    pub fn is_valid(&self) -> bool {
        self.0.starts_with(Self::PREFIX)
            && self.0.len() > Self::PREFIX.len()
            && self.0[Self::PREFIX.len()..]
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for AccountAddress {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}
