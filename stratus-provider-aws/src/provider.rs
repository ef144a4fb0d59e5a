//! AWS provider implementation over the Cloud Control API
//!
//! All kinds go through the same four Cloud Control verbs, so one client
//! covers the whole registry. Creation and tagging stay separate calls:
//! tags ride an update patch after the create operation settles.

use std::time::Duration;

use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_cloudcontrol::Client as CloudControlClient;
use aws_sdk_cloudcontrol::types::{HandlerErrorCode, OperationStatus};
use serde_json::json;

use stratus_core::config::ProviderSettings;
use stratus_core::descriptor::ResourceDescriptor;
use stratus_core::provider::{ProviderClient, ProviderFault, ProviderResult};

use crate::resources::{KindSpec, kind_spec};

/// AWS provider backed by the Cloud Control API
#[derive(Clone)]
pub struct AwsProvider {
    client: CloudControlClient,
    region: String,
}

impl AwsProvider {
    /// Create a provider for the configured region
    pub async fn new(settings: &ProviderSettings) -> Self {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()))
            .load()
            .await;

        Self {
            client: CloudControlClient::new(&config),
            region: settings.region.clone(),
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    // =========================================================================
    // Cloud Control API Methods
    // =========================================================================

    /// Get a resource's properties by identifier, None when it does not exist
    async fn cc_get_resource(
        &self,
        type_name: &str,
        identifier: &str,
    ) -> ProviderResult<Option<serde_json::Value>> {
        let result = self
            .client
            .get_resource()
            .type_name(type_name)
            .identifier(identifier)
            .send()
            .await;

        match result {
            Ok(response) => {
                if let Some(desc) = response.resource_description()
                    && let Some(props_str) = desc.properties()
                {
                    let props: serde_json::Value =
                        serde_json::from_str(props_str).unwrap_or_default();
                    Ok(Some(props))
                } else {
                    Ok(None)
                }
            }
            Err(e) => {
                let err_str = format!("{:?}", e);
                if err_str.contains("ResourceNotFound") || err_str.contains("NotFound") {
                    Ok(None)
                } else {
                    Err(ProviderFault::new(format!(
                        "failed to get resource: {:?}",
                        e
                    )))
                }
            }
        }
    }

    /// Fetch one listing page of (identifier, partial properties)
    async fn cc_list_page(
        &self,
        type_name: &str,
        next_token: Option<String>,
    ) -> ProviderResult<(Vec<(String, Option<serde_json::Value>)>, Option<String>)> {
        let mut request = self.client.list_resources().type_name(type_name);
        if let Some(token) = next_token {
            request = request.next_token(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProviderFault::new(format!("failed to list resources: {:?}", e)))?;

        let mut page = Vec::new();
        for desc in response.resource_descriptions() {
            let Some(identifier) = desc.identifier() else {
                continue;
            };
            let props = desc
                .properties()
                .and_then(|p| serde_json::from_str(p).ok());
            page.push((identifier.to_string(), props));
        }

        Ok((page, response.next_token().map(|t| t.to_string())))
    }

    /// Create a resource and wait for the operation to settle
    async fn cc_create_resource(
        &self,
        type_name: &str,
        desired_state: serde_json::Value,
    ) -> ProviderResult<String> {
        let result = self
            .client
            .create_resource()
            .type_name(type_name)
            .desired_state(desired_state.to_string())
            .send()
            .await
            .map_err(|e| classify_sdk_error("failed to create resource", &format!("{:?}", e)))?;

        let request_token = result
            .progress_event()
            .and_then(|p| p.request_token())
            .ok_or_else(|| ProviderFault::new("no request token returned"))?;

        self.wait_for_operation(request_token).await
    }

    /// Apply a JSON patch to a resource and wait for the operation to settle
    async fn cc_update_resource(
        &self,
        type_name: &str,
        identifier: &str,
        patch_ops: Vec<serde_json::Value>,
    ) -> ProviderResult<()> {
        if patch_ops.is_empty() {
            return Ok(());
        }

        let patch_document = serde_json::to_string(&patch_ops)
            .map_err(|e| ProviderFault::new(format!("failed to build patch: {}", e)))?;

        let result = self
            .client
            .update_resource()
            .type_name(type_name)
            .identifier(identifier)
            .patch_document(patch_document)
            .send()
            .await
            .map_err(|e| ProviderFault::new(format!("failed to update resource: {:?}", e)))?;

        if let Some(request_token) = result.progress_event().and_then(|p| p.request_token()) {
            self.wait_for_operation(request_token).await?;
        }

        Ok(())
    }

    /// Poll a Cloud Control operation until success or failure
    async fn wait_for_operation(&self, request_token: &str) -> ProviderResult<String> {
        let max_attempts = 120;
        let delay = Duration::from_secs(5);

        for _ in 0..max_attempts {
            let status = self
                .client
                .get_resource_request_status()
                .request_token(request_token)
                .send()
                .await
                .map_err(|e| {
                    ProviderFault::new(format!("failed to get operation status: {:?}", e))
                })?;

            if let Some(progress) = status.progress_event() {
                match progress.operation_status() {
                    Some(OperationStatus::Success) => {
                        return Ok(progress.identifier().unwrap_or("").to_string());
                    }
                    Some(OperationStatus::Failed) => {
                        let msg = progress.status_message().unwrap_or("unknown error");
                        if matches!(progress.error_code(), Some(HandlerErrorCode::AlreadyExists)) {
                            return Err(ProviderFault::conflict(format!(
                                "operation failed: {}",
                                msg
                            )));
                        }
                        return Err(ProviderFault::new(format!("operation failed: {}", msg)));
                    }
                    Some(OperationStatus::CancelComplete) => {
                        return Err(ProviderFault::new("operation was cancelled"));
                    }
                    _ => {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Err(ProviderFault::new("operation timed out"))
    }
}

#[async_trait]
impl ProviderClient for AwsProvider {
    fn name(&self) -> &'static str {
        "aws"
    }

    async fn list_matching(&self, descriptor: &ResourceDescriptor) -> ProviderResult<Vec<String>> {
        let spec = kind_spec(descriptor.kind);

        // Name-addressed types resolve with a single point read; the
        // provider enforces uniqueness, so ambiguity is impossible here.
        if spec.name_is_identifier {
            return Ok(
                match self.cc_get_resource(spec.type_name, &descriptor.name).await? {
                    Some(_) => vec![descriptor.name.clone()],
                    None => Vec::new(),
                },
            );
        }

        let mut matches = Vec::new();
        let mut next_token = None;
        loop {
            let (page, token) = self.cc_list_page(spec.type_name, next_token).await?;
            for (identifier, props) in page {
                // Listings may omit the properties we match on; fall back
                // to a point read for those.
                let props = match props {
                    Some(props) if props_sufficient(spec, &props) => Some(props),
                    _ => self.cc_get_resource(spec.type_name, &identifier).await?,
                };
                if let Some(props) = props
                    && matches_identity(descriptor, spec, &props)
                {
                    matches.push(identifier);
                }
            }
            next_token = token;
            if next_token.is_none() {
                break;
            }
        }

        Ok(matches)
    }

    async fn create(&self, descriptor: &ResourceDescriptor) -> ProviderResult<String> {
        let spec = kind_spec(descriptor.kind);
        self.cc_create_resource(spec.type_name, desired_state(descriptor, spec))
            .await
    }

    async fn tag(&self, descriptor: &ResourceDescriptor, id: &str) -> ProviderResult<()> {
        let spec = kind_spec(descriptor.kind);
        let tags = tag_values(descriptor, spec);
        if tags.is_empty() {
            return Ok(());
        }

        let patch_ops = vec![json!({"op": "add", "path": "/Tags", "value": tags})];
        self.cc_update_resource(spec.type_name, id, patch_ops).await
    }
}

// =============================================================================
// Identity and State Helpers
// =============================================================================

/// Build the desired state for creation: provider-shaped parameters plus
/// the intrinsic name property. Tags are deliberately absent; tagging is a
/// separate step.
fn desired_state(descriptor: &ResourceDescriptor, spec: &KindSpec) -> serde_json::Value {
    let mut state = serde_json::Map::new();
    for (key, value) in &descriptor.parameters {
        state.insert(key.clone(), value.clone());
    }
    if let Some(name_property) = spec.name_property {
        state.insert(name_property.to_string(), json!(descriptor.name));
    }
    serde_json::Value::Object(state)
}

/// Tags to attach after creation, in CloudFormation Key/Value form.
/// Kinds without an intrinsic name property carry their name as a `Name`
/// tag so lookups can recover it.
fn tag_values(descriptor: &ResourceDescriptor, spec: &KindSpec) -> Vec<serde_json::Value> {
    let mut tags = Vec::new();
    if spec.name_property.is_none() && !descriptor.tags.contains_key("Name") {
        tags.push(json!({"Key": "Name", "Value": descriptor.name}));
    }
    for (key, value) in &descriptor.tags {
        tags.push(json!({"Key": key, "Value": value}));
    }
    tags
}

/// Whether a listing's partial properties carry enough to match on
fn props_sufficient(spec: &KindSpec, props: &serde_json::Value) -> bool {
    match spec.name_property {
        Some(name_property) => props.get(name_property).is_some(),
        None => props.get("Tags").is_some(),
    }
}

/// Whether live-resource properties match the descriptor's identity
fn matches_identity(
    descriptor: &ResourceDescriptor,
    spec: &KindSpec,
    props: &serde_json::Value,
) -> bool {
    if let Some(name_property) = spec.name_property {
        return props.get(name_property).and_then(|v| v.as_str())
            == Some(descriptor.name.as_str());
    }

    if let Some(tags) = props.get("Tags").and_then(|v| v.as_array()) {
        return tags.iter().any(|tag| {
            tag.get("Key").and_then(|v| v.as_str()) == Some("Name")
                && tag.get("Value").and_then(|v| v.as_str()) == Some(descriptor.name.as_str())
        });
    }

    false
}

/// Map an SDK error string to a fault, detecting uniqueness conflicts
fn classify_sdk_error(context: &str, err: &str) -> ProviderFault {
    if err.contains("AlreadyExists") || err.contains("ConflictException") {
        ProviderFault::conflict(format!("{}: {}", context, err))
    } else {
        ProviderFault::new(format!("{}: {}", context, err))
    }
}
