//! Descriptor - declaring the identity and desired shape of a cloud resource

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::OwnerTag;

/// Kind of cloud resource a descriptor names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    Instance,
    Network,
    Subnet,
    SecurityGroup,
    Bucket,
    Role,
    RouteTable,
    Endpoint,
}

impl ResourceKind {
    /// All kinds, in declaration order
    pub const ALL: [ResourceKind; 8] = [
        ResourceKind::Instance,
        ResourceKind::Network,
        ResourceKind::Subnet,
        ResourceKind::SecurityGroup,
        ResourceKind::Bucket,
        ResourceKind::Role,
        ResourceKind::RouteTable,
        ResourceKind::Endpoint,
    ];

    /// Kebab-case kind name (e.g., "security-group")
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Instance => "instance",
            ResourceKind::Network => "network",
            ResourceKind::Subnet => "subnet",
            ResourceKind::SecurityGroup => "security-group",
            ResourceKind::Bucket => "bucket",
            ResourceKind::Role => "role",
            ResourceKind::RouteTable => "route-table",
            ResourceKind::Endpoint => "endpoint",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = ResourceKind::ALL.iter().map(|k| k.as_str()).collect();
                format!("unknown resource kind '{}' (expected one of: {})", s, known.join(", "))
            })
    }
}

/// Caller's declaration of desired resource identity and parameters
///
/// `kind` and `name` together decide existence; `parameters` are opaque to
/// the lookup path and consumed only at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    pub kind: ResourceKind,
    pub name: String,
    /// Tags attached after creation, including the infrastructure ownership pair
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    /// Provider-specific creation parameters (CIDR block, instance class, ...)
    #[serde(default)]
    pub parameters: BTreeMap<String, serde_json::Value>,
}

impl ResourceDescriptor {
    pub fn new(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            tags: BTreeMap::new(),
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn with_parameter(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Stamp the infrastructure ownership tag pair onto this descriptor
    pub fn owned_by(mut self, owner: &OwnerTag) -> Self {
        owner.apply_to(&mut self.tags);
        self
    }
}

/// Provider-assigned identity returned once a resource is confirmed present
///
/// Constructed once per reconciliation and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceHandle {
    /// Opaque provider identifier (e.g., "vpc-0a1b2c")
    pub id: String,
    /// True when the resource was found rather than created
    pub existed: bool,
}

impl ResourceHandle {
    /// Handle for a resource the lookup found already present
    pub fn found(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            existed: true,
        }
    }

    /// Handle for a resource this run provisioned
    pub fn created(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            existed: false,
        }
    }
}
