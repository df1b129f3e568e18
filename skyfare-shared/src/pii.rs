use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Wrapper for credentials and other sensitive fields. The inner value is
/// hidden from Debug/Display and from serialization, so request structs can
/// be logged with `tracing` without leaking passwords. Deserialization is
/// untouched: inbound JSON still populates the real value.
#[derive(Clone, Deserialize)]
#[serde(transparent)]
pub struct Masked<T>(T);

impl<T> Masked<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Borrow the real value. Call sites are the audit trail for where
    /// secrets are actually used.
    pub fn expose(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str("********")
    }
}
