//! Error taxonomy for reconciliation
//!
//! Step failures stay distinguishable so callers can tell "nothing was
//! provisioned" apart from "provisioned but untagged".

use thiserror::Error;

use crate::descriptor::ResourceDescriptor;
use crate::provider::ProviderFault;

/// Failure of a single reconciliation step
#[derive(Debug, Error)]
pub enum StepError {
    /// The provider inventory query itself failed. Distinct from "not
    /// found", which is a normal empty result.
    #[error("provider lookup failed: {0}")]
    LookupFailed(#[source] ProviderFault),

    /// The creation call failed; nothing was provisioned
    #[error("resource creation failed: {0}")]
    CreationFailed(#[source] ProviderFault),

    /// The resource was created but applying tags failed. `id` identifies
    /// the untagged resource so a caller can record or delete it.
    #[error("resource {id} was created but tagging failed: {fault}")]
    TaggingFailed {
        id: String,
        #[source]
        fault: ProviderFault,
    },

    /// More than one live resource matched the descriptor's identity.
    /// Picking one silently would reconcile against an arbitrary resource.
    #[error("{} resources match, expected at most one: {}", .ids.len(), .ids.join(", "))]
    AmbiguousMatch { ids: Vec<String> },
}

impl StepError {
    /// Identifier of the resource a partially-failed creation left behind
    pub fn created_id(&self) -> Option<&str> {
        match self {
            StepError::TaggingFailed { id, .. } => Some(id),
            _ => None,
        }
    }
}

/// Umbrella failure for a reconcile call, carrying the originating descriptor
#[derive(Debug, Error)]
#[error("failed to reconcile {}.{}: {}", .descriptor.kind, .descriptor.name, .source)]
pub struct ReconcileError {
    pub descriptor: ResourceDescriptor,
    pub source: StepError,
}

impl ReconcileError {
    pub fn new(descriptor: ResourceDescriptor, source: StepError) -> Self {
        Self { descriptor, source }
    }

    /// The underlying step failure
    pub fn step(&self) -> &StepError {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::ResourceKind;

    #[test]
    fn lookup_failed_display() {
        let err = StepError::LookupFailed(ProviderFault::new("connection refused"));
        assert_eq!(err.to_string(), "provider lookup failed: connection refused");
    }

    #[test]
    fn tagging_failed_carries_created_id() {
        let err = StepError::TaggingFailed {
            id: "vpc-0a1b".to_string(),
            fault: ProviderFault::new("access denied"),
        };
        assert_eq!(err.created_id(), Some("vpc-0a1b"));
        assert!(err.to_string().contains("vpc-0a1b"));

        let other = StepError::CreationFailed(ProviderFault::new("quota exceeded"));
        assert_eq!(other.created_id(), None);
    }

    #[test]
    fn ambiguous_match_lists_candidates() {
        let err = StepError::AmbiguousMatch {
            ids: vec!["sg-1".to_string(), "sg-2".to_string()],
        };
        assert_eq!(err.to_string(), "2 resources match, expected at most one: sg-1, sg-2");
    }

    #[test]
    fn reconcile_error_names_descriptor_and_chains_source() {
        let descriptor = ResourceDescriptor::new(ResourceKind::Bucket, "proj-bucket");
        let err = ReconcileError::new(
            descriptor,
            StepError::CreationFailed(ProviderFault::new("quota exceeded")),
        );

        assert_eq!(
            err.to_string(),
            "failed to reconcile bucket.proj-bucket: resource creation failed: quota exceeded"
        );
        assert!(matches!(err.step(), StepError::CreationFailed(_)));

        let source = std::error::Error::source(&err).unwrap();
        assert!(source.to_string().contains("creation failed"));
    }
}
