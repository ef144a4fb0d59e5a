//! Resource kind registry for the AWS Cloud Control API
//!
//! Maps each ResourceKind to its CloudFormation type name and records how
//! the resource's name is addressed on AWS: some types carry the name as
//! an intrinsic property (and for a few it doubles as the Cloud Control
//! identifier), the rest carry it as a `Name` tag.

use stratus_core::descriptor::ResourceKind;

/// How a kind maps onto Cloud Control
pub struct KindSpec {
    /// CloudFormation type name (e.g., "AWS::EC2::VPC")
    pub type_name: &'static str,
    /// Intrinsic property carrying the name at creation, when the type has one
    pub name_property: Option<&'static str>,
    /// Whether the Cloud Control identifier is the name itself
    pub name_is_identifier: bool,
}

pub const INSTANCE_SPEC: KindSpec = KindSpec {
    type_name: "AWS::EC2::Instance",
    name_property: None,
    name_is_identifier: false,
};

pub const NETWORK_SPEC: KindSpec = KindSpec {
    type_name: "AWS::EC2::VPC",
    name_property: None,
    name_is_identifier: false,
};

pub const SUBNET_SPEC: KindSpec = KindSpec {
    type_name: "AWS::EC2::Subnet",
    name_property: None,
    name_is_identifier: false,
};

pub const SECURITY_GROUP_SPEC: KindSpec = KindSpec {
    type_name: "AWS::EC2::SecurityGroup",
    // GroupName is create-only; the identifier is still the sg-xxx id.
    name_property: Some("GroupName"),
    name_is_identifier: false,
};

pub const BUCKET_SPEC: KindSpec = KindSpec {
    type_name: "AWS::S3::Bucket",
    name_property: Some("BucketName"),
    name_is_identifier: true,
};

pub const ROLE_SPEC: KindSpec = KindSpec {
    type_name: "AWS::IAM::Role",
    name_property: Some("RoleName"),
    name_is_identifier: true,
};

pub const ROUTE_TABLE_SPEC: KindSpec = KindSpec {
    type_name: "AWS::EC2::RouteTable",
    name_property: None,
    name_is_identifier: false,
};

pub const ENDPOINT_SPEC: KindSpec = KindSpec {
    type_name: "AWS::EC2::VPCEndpoint",
    name_property: None,
    name_is_identifier: false,
};

/// Get the Cloud Control mapping for a kind
pub fn kind_spec(kind: ResourceKind) -> &'static KindSpec {
    match kind {
        ResourceKind::Instance => &INSTANCE_SPEC,
        ResourceKind::Network => &NETWORK_SPEC,
        ResourceKind::Subnet => &SUBNET_SPEC,
        ResourceKind::SecurityGroup => &SECURITY_GROUP_SPEC,
        ResourceKind::Bucket => &BUCKET_SPEC,
        ResourceKind::Role => &ROLE_SPEC,
        ResourceKind::RouteTable => &ROUTE_TABLE_SPEC,
        ResourceKind::Endpoint => &ENDPOINT_SPEC,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_spec_type_names() {
        assert_eq!(kind_spec(ResourceKind::Network).type_name, "AWS::EC2::VPC");
        assert_eq!(kind_spec(ResourceKind::Bucket).type_name, "AWS::S3::Bucket");
        assert_eq!(
            kind_spec(ResourceKind::SecurityGroup).type_name,
            "AWS::EC2::SecurityGroup"
        );
    }

    #[test]
    fn test_name_addressed_kinds() {
        assert!(kind_spec(ResourceKind::Bucket).name_is_identifier);
        assert!(kind_spec(ResourceKind::Role).name_is_identifier);
        assert!(!kind_spec(ResourceKind::SecurityGroup).name_is_identifier);
        assert!(kind_spec(ResourceKind::Instance).name_property.is_none());
    }
}
