//! Resource monitor request and response messages.
//!
//! Field names follow the monitor's JSON mapping (camelCase). Structured
//! property values are carried as [`Properties`]; their encoding is owned by
//! the caller.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A structured property bag.
pub type Properties = Map<String, Value>;

// ─────────────────────────────────────────────────────────────────────────────
// Shared Types
// ─────────────────────────────────────────────────────────────────────────────

/// URNs a single property depends on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyDependencies {
    /// Dependency URNs.
    pub urns: Vec<String>,
}

impl PropertyDependencies {
    /// Creates a dependency list.
    #[must_use]
    pub fn new(urns: Vec<String>) -> Self {
        Self { urns }
    }
}

/// A failed argument check reported by a provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckFailure {
    /// The offending property.
    pub property: String,
    /// Why the check failed.
    pub reason: String,
}

/// Per-operation timeouts, as duration strings (e.g. `"5m"`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomTimeouts {
    /// Timeout for create.
    pub create: String,
    /// Timeout for update.
    pub update: String,
    /// Timeout for delete.
    pub delete: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// SupportsFeature
// ─────────────────────────────────────────────────────────────────────────────

/// Request for `SupportsFeature`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupportsFeatureRequest {
    /// The feature id, e.g. `"secrets"`.
    pub id: String,
}

impl SupportsFeatureRequest {
    /// Creates a request for `id`.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Response of `SupportsFeature`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SupportsFeatureResponse {
    /// Whether the feature is supported.
    pub has_support: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Invoke / Call
// ─────────────────────────────────────────────────────────────────────────────

/// Request for `Invoke`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResourceInvokeRequest {
    /// The function token, e.g. `"aws:index/getRegion:getRegion"`.
    pub tok: String,
    /// Function arguments.
    pub args: Properties,
    /// Provider reference, empty for the default provider.
    pub provider: String,
    /// Provider plugin version.
    pub version: String,
    /// Whether resource references may be returned.
    pub accept_resources: bool,
}

/// Response of `Invoke`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvokeResponse {
    /// The returned properties.
    #[serde(rename = "return")]
    pub return_value: Option<Properties>,
    /// Argument checks that failed.
    pub failures: Vec<CheckFailure>,
}

/// Request for `Call`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CallRequest {
    /// The method token.
    pub tok: String,
    /// Method arguments, including `__self__` for resource methods.
    pub args: Properties,
    /// Dependencies of each argument.
    pub arg_dependencies: BTreeMap<String, PropertyDependencies>,
    /// Provider reference.
    pub provider: String,
    /// Provider plugin version.
    pub version: String,
}

/// Response of `Call`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CallResponse {
    /// The returned properties.
    #[serde(rename = "return")]
    pub return_value: Option<Properties>,
    /// Dependencies of each returned property.
    pub return_dependencies: BTreeMap<String, PropertyDependencies>,
    /// Argument checks that failed.
    pub failures: Vec<CheckFailure>,
}

// ─────────────────────────────────────────────────────────────────────────────
// ReadResource
// ─────────────────────────────────────────────────────────────────────────────

/// Request for `ReadResource`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReadResourceRequest {
    /// Id of the existing resource.
    pub id: String,
    /// Resource type token.
    #[serde(rename = "type")]
    pub type_token: String,
    /// Resource name.
    pub name: String,
    /// Parent URN, empty for none.
    pub parent: String,
    /// Input properties used to look the resource up.
    pub properties: Properties,
    /// URNs the read depends on.
    pub dependencies: Vec<String>,
    /// Provider reference.
    pub provider: String,
    /// Provider plugin version.
    pub version: String,
    /// Whether secrets may be returned.
    pub accept_secrets: bool,
    /// Output properties to treat as secret.
    pub additional_secret_outputs: Vec<String>,
    /// Whether resource references may be returned.
    pub accept_resources: bool,
}

/// Response of `ReadResource`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadResourceResponse {
    /// URN of the read resource.
    pub urn: String,
    /// Current state of the resource.
    pub properties: Properties,
}

// ─────────────────────────────────────────────────────────────────────────────
// RegisterResource
// ─────────────────────────────────────────────────────────────────────────────

/// Request for `RegisterResource`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisterResourceRequest {
    /// Resource type token.
    #[serde(rename = "type")]
    pub type_token: String,
    /// Resource name.
    pub name: String,
    /// Parent URN, empty for none.
    pub parent: String,
    /// Whether the resource has provider-managed CRUD.
    pub custom: bool,
    /// Input properties.
    pub object: Properties,
    /// Whether deletion is forbidden.
    pub protect: bool,
    /// URNs this resource depends on.
    pub dependencies: Vec<String>,
    /// Provider reference, empty for the default provider.
    pub provider: String,
    /// Dependencies of each input property.
    pub property_dependencies: BTreeMap<String, PropertyDependencies>,
    /// Whether to delete before replacing.
    pub delete_before_replace: bool,
    /// Provider plugin version.
    pub version: String,
    /// Properties whose changes are ignored.
    pub ignore_changes: Vec<String>,
    /// Whether secrets may be returned.
    pub accept_secrets: bool,
    /// Output properties to treat as secret.
    pub additional_secret_outputs: Vec<String>,
    /// Previous URNs of this resource.
    pub aliases: Vec<String>,
    /// Id of an existing resource to adopt.
    pub import_id: String,
    /// Per-operation timeouts.
    pub custom_timeouts: Option<CustomTimeouts>,
    /// Whether this is a remote component.
    pub remote: bool,
    /// Whether resource references may be returned.
    pub accept_resources: bool,
    /// Provider references by package, for components.
    pub providers: BTreeMap<String, String>,
    /// Properties whose changes force replacement.
    pub replace_on_changes: Vec<String>,
    /// Whether to keep the cloud resource when it is deleted.
    pub retain_on_delete: bool,
}

/// Response of `RegisterResource`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisterResourceResponse {
    /// URN assigned to the resource.
    pub urn: String,
    /// Provider-assigned id; empty for components or when unknown.
    pub id: String,
    /// Resulting output properties.
    pub object: Properties,
    /// Whether the resource will not change during this update.
    pub stable: bool,
    /// Properties that will not change during this update.
    pub stables: Vec<String>,
    /// Dependencies of each output property.
    pub property_dependencies: BTreeMap<String, PropertyDependencies>,
}

// ─────────────────────────────────────────────────────────────────────────────
// RegisterResourceOutputs
// ─────────────────────────────────────────────────────────────────────────────

/// Request for `RegisterResourceOutputs`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisterResourceOutputsRequest {
    /// URN of the component.
    pub urn: String,
    /// Complete snapshot of the component's outputs.
    pub outputs: Properties,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn register_request_uses_wire_names() {
        let request = RegisterResourceRequest {
            type_token: "aws:s3/bucket:Bucket".into(),
            name: "logs".into(),
            custom: true,
            ..Default::default()
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["type"], "aws:s3/bucket:Bucket");
        assert_eq!(value["custom"], true);
        assert!(value.get("deleteBeforeReplace").is_some());
        assert!(value.get("type_token").is_none());
    }

    #[test]
    fn register_response_tolerates_missing_fields() {
        let response: RegisterResourceResponse =
            serde_json::from_value(json!({ "urn": "urn:pulumi:s::p::t::n" })).unwrap();
        assert_eq!(response.urn, "urn:pulumi:s::p::t::n");
        assert!(response.id.is_empty());
        assert!(response.object.is_empty());
    }

    #[test]
    fn invoke_response_reads_return_key() {
        let response: InvokeResponse = serde_json::from_value(json!({
            "return": { "region": "us-west-2" },
            "failures": [{ "property": "name", "reason": "required" }]
        }))
        .unwrap();

        assert_eq!(response.return_value.unwrap()["region"], "us-west-2");
        assert_eq!(response.failures[0].reason, "required");
    }
}
