//! Secret names, values, and the process run mode.

use std::fmt;

use serde::{Serialize, Serializer};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Identifier of a credential record. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecretName(String);

impl SecretName {
    /// Wraps a raw name, returning `None` when it is empty.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SecretName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A secret payload, erased from memory on drop.
///
/// May be empty (test mode resolves unknown names to `""`), but a successful
/// lookup always yields a value.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecretValue(String);

impl SecretValue {
    /// Wraps a revealed secret.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the plaintext.
    ///
    /// The returned slice borrows from `self` and is not zeroized separately.
    #[inline]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SecretValue").field(&"[REDACTED]").finish()
    }
}

impl Serialize for SecretValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Whether external-tool interactions are real or substituted.
///
/// Chosen once at startup and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Talk to the real credential tool.
    #[default]
    Live,
    /// Resolve secrets from fixed fixtures and skip login.
    Test,
}

impl RunMode {
    /// Maps the boolean test-mode switch onto a run mode.
    pub fn from_test_flag(test_mode: bool) -> Self {
        if test_mode {
            RunMode::Test
        } else {
            RunMode::Live
        }
    }

    /// Returns `true` in test mode.
    pub fn is_test(self) -> bool {
        self == RunMode::Test
    }
}
