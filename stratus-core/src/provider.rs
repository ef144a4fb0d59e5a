//! Provider - the capability set a cloud provider client must offer
//!
//! A ProviderClient answers inventory queries, provisions resources, and
//! attaches tags. One implementation exists per provider (AWS, Azure, GCP)
//! and is injected into the Locator and Creator at startup.

use async_trait::async_trait;

use crate::descriptor::ResourceDescriptor;

/// Classification of a provider fault
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// The provider rejected a creation because a matching resource
    /// already exists. Two racing reconcilers can both see "absent" and
    /// both attempt creation; the loser receives this.
    Conflict,
    /// Any other provider failure (network, auth, quota, ...)
    Other,
}

/// Error reported by a ProviderClient operation
#[derive(Debug)]
pub struct ProviderFault {
    pub message: String,
    pub kind: FaultKind,
    pub cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl std::fmt::Display for ProviderFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ProviderFault {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|e| e.as_ref() as &dyn std::error::Error)
    }
}

impl ProviderFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: FaultKind::Other,
            cause: None,
        }
    }

    /// Fault for a uniqueness conflict ("already exists")
    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: FaultKind::Conflict,
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    pub fn is_conflict(&self) -> bool {
        self.kind == FaultKind::Conflict
    }
}

pub type ProviderResult<T> = Result<T, ProviderFault>;

/// Capability set implemented per provider
///
/// The provider is the source of truth for existence and uniqueness; the
/// core holds no state between calls.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Name of this provider (e.g., "aws")
    fn name(&self) -> &'static str;

    /// Identifiers of all live resources matching the descriptor's
    /// identity. Absence is an empty list, not an error.
    async fn list_matching(&self, descriptor: &ResourceDescriptor) -> ProviderResult<Vec<String>>;

    /// Provision the described resource and return its provider-assigned
    /// identifier. Tags are not applied here; tagging is a distinct step.
    async fn create(&self, descriptor: &ResourceDescriptor) -> ProviderResult<String>;

    /// Attach the descriptor's tags to an already-created resource
    async fn tag(&self, descriptor: &ResourceDescriptor, id: &str) -> ProviderResult<()>;
}

/// ProviderClient implementation for Box<dyn ProviderClient>
/// This enables dynamic dispatch over provider clients
#[async_trait]
impl ProviderClient for Box<dyn ProviderClient> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    async fn list_matching(&self, descriptor: &ResourceDescriptor) -> ProviderResult<Vec<String>> {
        (**self).list_matching(descriptor).await
    }

    async fn create(&self, descriptor: &ResourceDescriptor) -> ProviderResult<String> {
        (**self).create(descriptor).await
    }

    async fn tag(&self, descriptor: &ResourceDescriptor, id: &str) -> ProviderResult<()> {
        (**self).tag(descriptor, id).await
    }
}
