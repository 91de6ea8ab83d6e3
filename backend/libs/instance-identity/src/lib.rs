//! Process-wide instance identity.
//!
//! One `InstanceId` is generated per process at startup and cloned into
//! every component that calls the Coordinator. It exists for exactly one
//! purpose: letting `Release` tell "my claim" from "someone else's claim".

use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// A 128-bit random identity, shared cheaply via `Arc<str>`.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct InstanceId(Arc<str>);

impl InstanceId {
    /// Generate a new identity. Call this once in `main`; every clone after
    /// that shares the same underlying string.
    pub fn generate() -> Self {
        Self(Arc::from(Uuid::new_v4().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("InstanceId").field(&self.0).finish()
    }
}

impl AsRef<str> for InstanceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_distinct_identities() {
        let a = InstanceId::generate();
        let b = InstanceId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn clone_shares_the_same_value() {
        let a = InstanceId::generate();
        let b = a.clone();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), b.as_str());
    }

    #[test]
    fn display_matches_as_str() {
        let id = InstanceId::generate();
        assert_eq!(id.to_string(), id.as_str());
    }
}
