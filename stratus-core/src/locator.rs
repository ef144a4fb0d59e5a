//! Locator - answering "does this resource already exist?"

use async_trait::async_trait;

use crate::descriptor::{ResourceDescriptor, ResourceHandle};
use crate::error::StepError;
use crate::provider::ProviderClient;

/// Existence query contract used by the Reconciler
#[async_trait]
pub trait Locate: Send + Sync {
    /// Returns `Some(handle)` when exactly one resource matches the
    /// descriptor's identity, `None` when none does.
    async fn find(
        &self,
        descriptor: &ResourceDescriptor,
    ) -> Result<Option<ResourceHandle>, StepError>;
}

/// Provider-backed Locate implementation
pub struct Locator<C> {
    client: C,
}

impl<C> Locator<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C: ProviderClient> Locate for Locator<C> {
    async fn find(
        &self,
        descriptor: &ResourceDescriptor,
    ) -> Result<Option<ResourceHandle>, StepError> {
        let mut ids = self
            .client
            .list_matching(descriptor)
            .await
            .map_err(StepError::LookupFailed)?;

        match ids.len() {
            0 => Ok(None),
            1 => Ok(Some(ResourceHandle::found(ids.remove(0)))),
            _ => {
                // Never pick one silently; the candidates are listed so an
                // operator can clean up.
                ids.sort();
                Err(StepError::AmbiguousMatch { ids })
            }
        }
    }
}
