//! Reconciler - the idempotent ensure-exists core
//!
//! Given a descriptor, look the resource up; reuse it when present, create
//! it when absent. An existing resource is authoritative: neither
//! parameters nor tags are re-applied to it. Rerunning a reconcile with no
//! external change returns the same identifier.

use crate::creator::{Create, Creator};
use crate::descriptor::{ResourceDescriptor, ResourceHandle};
use crate::error::{ReconcileError, StepError};
use crate::locator::{Locate, Locator};
use crate::provider::ProviderClient;

/// Find-or-create over an injected Locator and Creator
///
/// Stateless between calls: every invocation re-queries the provider, and
/// the provider remains the source of truth under concurrent racers.
pub struct Reconciler<L, C> {
    locator: L,
    creator: C,
}

impl<L: Locate, C: Create> Reconciler<L, C> {
    pub fn new(locator: L, creator: C) -> Self {
        Self { locator, creator }
    }

    /// Ensure the described resource exists and return its handle
    ///
    /// No internal retries and no rollback: the first failure surfaces
    /// immediately, wrapped with the originating descriptor. The one
    /// exception is a creation conflict, which means another racer won the
    /// creation between our lookup and create; a single re-lookup resolves
    /// it to "already exists".
    pub async fn reconcile(
        &self,
        descriptor: &ResourceDescriptor,
    ) -> Result<ResourceHandle, ReconcileError> {
        let found = self
            .locator
            .find(descriptor)
            .await
            .map_err(|e| ReconcileError::new(descriptor.clone(), e))?;

        if let Some(handle) = found {
            return Ok(handle);
        }

        match self.creator.create(descriptor).await {
            Ok(handle) => Ok(handle),
            Err(StepError::CreationFailed(fault)) if fault.is_conflict() => {
                match self.locator.find(descriptor).await {
                    Ok(Some(handle)) => Ok(handle),
                    // A miss means the conflict was about something else;
                    // the original creation failure stands.
                    Ok(None) | Err(_) => Err(ReconcileError::new(
                        descriptor.clone(),
                        StepError::CreationFailed(fault),
                    )),
                }
            }
            Err(e) => Err(ReconcileError::new(descriptor.clone(), e)),
        }
    }
}

impl<P: ProviderClient + Clone> Reconciler<Locator<P>, Creator<P>> {
    /// Wire a Locator and Creator over the same provider client
    pub fn for_client(client: P) -> Self {
        Self::new(Locator::new(client.clone()), Creator::new(client))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::*;
    use crate::descriptor::ResourceKind;
    use crate::provider::{ProviderFault, ProviderResult};

    /// Scripted Locate: pops one prepared answer per call
    struct ScriptedLocator {
        answers: Mutex<Vec<Result<Option<ResourceHandle>, StepError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedLocator {
        fn new(answers: Vec<Result<Option<ResourceHandle>, StepError>>) -> Self {
            Self {
                answers: Mutex::new(answers),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Locate for ScriptedLocator {
        async fn find(
            &self,
            _descriptor: &ResourceDescriptor,
        ) -> Result<Option<ResourceHandle>, StepError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answers.lock().unwrap().remove(0)
        }
    }

    struct ScriptedCreator {
        answer: fn() -> Result<ResourceHandle, StepError>,
        calls: AtomicUsize,
    }

    impl ScriptedCreator {
        fn new(answer: fn() -> Result<ResourceHandle, StepError>) -> Self {
            Self {
                answer,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Create for ScriptedCreator {
        async fn create(
            &self,
            _descriptor: &ResourceDescriptor,
        ) -> Result<ResourceHandle, StepError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.answer)()
        }
    }

    fn bucket() -> ResourceDescriptor {
        ResourceDescriptor::new(ResourceKind::Bucket, "proj-bucket")
    }

    #[tokio::test]
    async fn absent_resource_is_created() {
        let reconciler = Reconciler::new(
            ScriptedLocator::new(vec![Ok(None)]),
            ScriptedCreator::new(|| Ok(ResourceHandle::created("b-123"))),
        );

        let handle = reconciler.reconcile(&bucket()).await.unwrap();
        assert_eq!(handle.id, "b-123");
        assert!(!handle.existed);
        assert_eq!(reconciler.creator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn present_resource_is_reused_without_creation() {
        let reconciler = Reconciler::new(
            ScriptedLocator::new(vec![Ok(Some(ResourceHandle::found("b-123")))]),
            ScriptedCreator::new(|| panic!("creator must not run")),
        );

        let handle = reconciler.reconcile(&bucket()).await.unwrap();
        assert_eq!(handle.id, "b-123");
        assert!(handle.existed);
        assert_eq!(reconciler.creator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn creation_failure_propagates_wrapped() {
        let reconciler = Reconciler::new(
            ScriptedLocator::new(vec![Ok(None)]),
            ScriptedCreator::new(|| {
                Err(StepError::CreationFailed(ProviderFault::new(
                    "quota exceeded",
                )))
            }),
        );

        let err = reconciler.reconcile(&bucket()).await.unwrap_err();
        assert!(matches!(err.step(), StepError::CreationFailed(_)));
        assert_eq!(err.descriptor.name, "proj-bucket");
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[tokio::test]
    async fn lookup_failure_short_circuits_before_creation() {
        let reconciler = Reconciler::new(
            ScriptedLocator::new(vec![Err(StepError::LookupFailed(ProviderFault::new(
                "api unreachable",
            )))]),
            ScriptedCreator::new(|| panic!("creator must not run")),
        );

        let err = reconciler.reconcile(&bucket()).await.unwrap_err();
        assert!(matches!(err.step(), StepError::LookupFailed(_)));
        assert_eq!(reconciler.creator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn ambiguous_lookup_is_surfaced() {
        let reconciler = Reconciler::new(
            ScriptedLocator::new(vec![Err(StepError::AmbiguousMatch {
                ids: vec!["b-1".to_string(), "b-2".to_string()],
            })]),
            ScriptedCreator::new(|| panic!("creator must not run")),
        );

        let err = reconciler.reconcile(&bucket()).await.unwrap_err();
        assert!(matches!(err.step(), StepError::AmbiguousMatch { .. }));
    }

    #[tokio::test]
    async fn tagging_failure_keeps_created_identity() {
        let reconciler = Reconciler::new(
            ScriptedLocator::new(vec![Ok(None)]),
            ScriptedCreator::new(|| {
                Err(StepError::TaggingFailed {
                    id: "b-123".to_string(),
                    fault: ProviderFault::new("tag api throttled"),
                })
            }),
        );

        let err = reconciler.reconcile(&bucket()).await.unwrap_err();
        assert_eq!(err.step().created_id(), Some("b-123"));
    }

    #[tokio::test]
    async fn lost_creation_race_resolves_to_existing() {
        // First lookup sees nothing, creation loses the race, the
        // follow-up lookup finds the winner's resource.
        let reconciler = Reconciler::new(
            ScriptedLocator::new(vec![Ok(None), Ok(Some(ResourceHandle::found("b-won")))]),
            ScriptedCreator::new(|| {
                Err(StepError::CreationFailed(ProviderFault::conflict(
                    "bucket already owned by you",
                )))
            }),
        );

        let handle = reconciler.reconcile(&bucket()).await.unwrap();
        assert_eq!(handle.id, "b-won");
        assert!(handle.existed);
        assert_eq!(reconciler.locator.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn conflict_without_visible_winner_stays_failed() {
        let reconciler = Reconciler::new(
            ScriptedLocator::new(vec![Ok(None), Ok(None)]),
            ScriptedCreator::new(|| {
                Err(StepError::CreationFailed(ProviderFault::conflict(
                    "name reserved",
                )))
            }),
        );

        let err = reconciler.reconcile(&bucket()).await.unwrap_err();
        assert!(matches!(err.step(), StepError::CreationFailed(_)));
    }

    /// In-memory provider client for end-to-end idempotence checks
    #[derive(Clone)]
    struct MemoryClient {
        store: Arc<Mutex<HashMap<String, String>>>,
        creations: Arc<AtomicUsize>,
    }

    impl MemoryClient {
        fn new() -> Self {
            Self {
                store: Arc::new(Mutex::new(HashMap::new())),
                creations: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl crate::provider::ProviderClient for MemoryClient {
        fn name(&self) -> &'static str {
            "memory"
        }

        async fn list_matching(
            &self,
            descriptor: &ResourceDescriptor,
        ) -> ProviderResult<Vec<String>> {
            let key = format!("{}.{}", descriptor.kind, descriptor.name);
            Ok(self
                .store
                .lock()
                .unwrap()
                .get(&key)
                .cloned()
                .into_iter()
                .collect())
        }

        async fn create(&self, descriptor: &ResourceDescriptor) -> ProviderResult<String> {
            let key = format!("{}.{}", descriptor.kind, descriptor.name);
            let mut store = self.store.lock().unwrap();
            if store.contains_key(&key) {
                return Err(ProviderFault::conflict("already exists"));
            }
            let n = self.creations.fetch_add(1, Ordering::SeqCst);
            let id = format!("m-{}", n);
            store.insert(key, id.clone());
            Ok(id)
        }

        async fn tag(&self, _descriptor: &ResourceDescriptor, _id: &str) -> ProviderResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn reconcile_twice_is_idempotent() {
        let client = MemoryClient::new();
        let reconciler = Reconciler::for_client(client.clone());
        let descriptor = bucket();

        let first = reconciler.reconcile(&descriptor).await.unwrap();
        let second = reconciler.reconcile(&descriptor).await.unwrap();

        assert!(!first.existed);
        assert!(second.existed);
        assert_eq!(first.id, second.id);
        assert_eq!(client.creations.load(Ordering::SeqCst), 1);
    }
}
