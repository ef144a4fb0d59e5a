//! Explicit configuration for reconciliation components
//!
//! Configuration is built by the driver and passed down by value; nothing
//! in the core reads the process environment.

use std::collections::BTreeMap;

/// Infrastructure ownership tag pair stamped on every managed resource
///
/// Lookups and teardown tooling rely on this pair to tell managed
/// resources apart from everything else in the account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerTag {
    pub key: String,
    pub value: String,
}

impl OwnerTag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Insert the pair into a descriptor's tag set
    pub fn apply_to(&self, tags: &mut BTreeMap<String, String>) {
        tags.insert(self.key.clone(), self.value.clone());
    }
}

impl Default for OwnerTag {
    fn default() -> Self {
        Self::new("managed-by", "stratus")
    }
}

/// Settings consumed by provider client constructors
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    /// Provider region (e.g., "us-east-1")
    pub region: String,
}

impl ProviderSettings {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
        }
    }
}
