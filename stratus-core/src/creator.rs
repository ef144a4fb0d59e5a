//! Creator - provisioning a resource and attaching its tags
//!
//! Creation and tagging are distinct provider steps; a tagging failure
//! after a successful creation is a partial failure, not a total one, and
//! is reported with the created identifier.

use async_trait::async_trait;

use crate::descriptor::{ResourceDescriptor, ResourceHandle};
use crate::error::StepError;
use crate::provider::ProviderClient;

/// Creation contract used by the Reconciler
///
/// Only called after the Locator has ruled out existence. Not safe to
/// retry on its own: rerun the full reconcile instead.
#[async_trait]
pub trait Create: Send + Sync {
    async fn create(&self, descriptor: &ResourceDescriptor) -> Result<ResourceHandle, StepError>;
}

/// Provider-backed Create implementation
pub struct Creator<C> {
    client: C,
}

impl<C> Creator<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C: ProviderClient> Create for Creator<C> {
    async fn create(&self, descriptor: &ResourceDescriptor) -> Result<ResourceHandle, StepError> {
        let id = self
            .client
            .create(descriptor)
            .await
            .map_err(StepError::CreationFailed)?;

        if let Err(fault) = self.client.tag(descriptor, &id).await {
            return Err(StepError::TaggingFailed { id, fault });
        }

        Ok(ResourceHandle::created(id))
    }
}
