//! did:peer:2 identifiers derived from service-endpoint metadata
//!
//! A did:peer:2 identifier embeds its own service list, so it can be resolved
//! offline. Each service is abbreviated, serialized as canonical JSON,
//! base64url-encoded without padding and appended as an `S` segment:
//!
//! ```text
//! did:peer:2.S<service-0>.S<service-1>...
//! ```
//!
//! Derivation is pure: the same ordered descriptor list always yields the
//! same identifier, and any change in a field or in the ordering changes it.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD as B64URL, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::canonicalize::canonicalize_json;
use crate::errors::{RegistryError, RegistryResult};

pub const METHOD_PREFIX: &str = "did:peer:2";

const DID_CONTEXT: &str = "https://www.w3.org/ns/did/v1";
const MULTIKEY_CONTEXT: &str = "https://w3id.org/security/multikey/v1";

/// Key abbreviations applied before encoding (full name, abbreviation)
const ABBREVIATIONS: &[(&str, &str)] = &[("DIDCommMessaging", "dm")];

/// Endpoint details of a declared service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEndpoint {
    pub profile: String,
    pub uri: String,
    pub integrity: String,
}

/// A service entry to embed in a did:peer:2 identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDescriptor {
    pub id: String,
    #[serde(rename = "type")]
    pub service_type: String,
    pub service_endpoint: ServiceEndpoint,
}

impl ServiceDescriptor {
    pub fn new(
        id: impl Into<String>,
        service_type: impl Into<String>,
        profile: impl Into<String>,
        uri: impl Into<String>,
        integrity: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            service_type: service_type.into(),
            service_endpoint: ServiceEndpoint {
                profile: profile.into(),
                uri: uri.into(),
                integrity: integrity.into(),
            },
        }
    }
}

/// Derive a did:peer:2 identifier from an ordered, non-empty service list
pub fn derive_did_peer2(services: &[ServiceDescriptor]) -> RegistryResult<String> {
    if services.is_empty() {
        return Err(RegistryError::validation(
            "services",
            "at least one service descriptor is required",
        ));
    }

    let mut did = String::from(METHOD_PREFIX);
    for service in services {
        let value = serde_json::to_value(service)
            .map_err(|e| RegistryError::serialization("service descriptor", e))?;
        let canonical = canonicalize_json(&rename_keys(value, abbreviate))?;
        did.push_str(".S");
        did.push_str(&B64URL.encode(canonical.as_bytes()));
    }
    Ok(did)
}

fn abbreviate(key: &str) -> &str {
    ABBREVIATIONS
        .iter()
        .find(|(full, _)| *full == key)
        .map(|(_, short)| *short)
        .unwrap_or(key)
}

fn expand(key: &str) -> &str {
    ABBREVIATIONS
        .iter()
        .find(|(_, short)| *short == key)
        .map(|(full, _)| *full)
        .unwrap_or(key)
}

fn rename_keys(value: Value, rename: fn(&str) -> &str) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (rename(&k).to_string(), rename_keys(v, rename)))
                .collect(),
        ),
        Value::Array(items) => {
            Value::Array(items.into_iter().map(|v| rename_keys(v, rename)).collect())
        }
        other => other,
    }
}

/// Verification method entry of a resolved document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    pub id: String,
    #[serde(rename = "type")]
    pub method_type: String,
    pub controller: String,
    pub public_key_multibase: String,
}

/// DID document produced by offline resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidDocument {
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    pub id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub verification_method: Vec<VerificationMethod>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authentication: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assertion_method: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_agreement: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capability_invocation: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capability_delegation: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub service: Vec<Value>,
}

/// Resolve a did:peer:2 identifier into its DID document without any lookup
pub fn resolve_did_peer2(did: &str) -> RegistryResult<DidDocument> {
    let body = did
        .strip_prefix(METHOD_PREFIX)
        .ok_or_else(|| {
            RegistryError::validation("did", format!("'{did}' is not a {METHOD_PREFIX} identifier"))
        })?
        .trim_start_matches('.');

    let mut doc = DidDocument {
        context: vec![DID_CONTEXT.to_string(), MULTIKEY_CONTEXT.to_string()],
        id: did.to_string(),
        verification_method: Vec::new(),
        authentication: Vec::new(),
        assertion_method: Vec::new(),
        key_agreement: Vec::new(),
        capability_invocation: Vec::new(),
        capability_delegation: Vec::new(),
        service: Vec::new(),
    };

    for segment in body.split('.') {
        let mut chars = segment.chars();
        let (purpose, rest) = match chars.next() {
            Some(p) if segment.len() >= 2 => (p, chars.as_str()),
            _ => {
                return Err(RegistryError::validation(
                    "did",
                    format!("malformed segment '{segment}'"),
                ))
            }
        };

        match purpose {
            'V' | 'A' | 'E' | 'I' | 'D' => {
                let key_id = format!("#key-{}", doc.verification_method.len() + 1);
                doc.verification_method.push(VerificationMethod {
                    id: key_id.clone(),
                    method_type: "Multikey".to_string(),
                    controller: did.to_string(),
                    public_key_multibase: rest.to_string(),
                });
                let relationship = match purpose {
                    'V' => &mut doc.authentication,
                    'A' => &mut doc.assertion_method,
                    'E' => &mut doc.key_agreement,
                    'I' => &mut doc.capability_invocation,
                    _ => &mut doc.capability_delegation,
                };
                relationship.push(key_id);
            }
            'S' => {
                let service = decode_service(rest, doc.service.len())?;
                doc.service.push(service);
            }
            other => {
                return Err(RegistryError::validation(
                    "did",
                    format!("unknown purpose code '{other}' in segment '{segment}'"),
                ))
            }
        }
    }

    Ok(doc)
}

fn decode_service(encoded: &str, index: usize) -> RegistryResult<Value> {
    let bytes = B64URL
        .decode(encoded.trim_end_matches('='))
        .map_err(|e| RegistryError::validation("did", format!("undecodable service: {e}")))?;
    let value: Value = serde_json::from_slice(&bytes)
        .map_err(|e| RegistryError::validation("did", format!("service is not JSON: {e}")))?;

    let Value::Object(mut service) = rename_keys(value, expand) else {
        return Err(RegistryError::validation(
            "did",
            "decoded service is not an object",
        ));
    };
    let id = if index == 0 {
        "#service".to_string()
    } else {
        format!("#service-{index}")
    };
    service.insert("id".to_string(), Value::String(id));
    Ok(Value::Object(service))
}

/// First endpoint URI declared for a service of the given type
pub fn service_endpoint_uri(doc: &DidDocument, service_type: &str) -> Option<String> {
    doc.service
        .iter()
        .filter_map(Value::as_object)
        .find(|svc| svc.get("type").and_then(Value::as_str) == Some(service_type))
        .and_then(|svc| match svc.get("serviceEndpoint")? {
            Value::String(uri) => Some(uri.clone()),
            Value::Object(endpoint) => endpoint_uri(endpoint),
            _ => None,
        })
}

fn endpoint_uri(endpoint: &Map<String, Value>) -> Option<String> {
    match endpoint.get("uri")? {
        Value::String(uri) => Some(uri.clone()),
        Value::Array(uris) => uris.first().and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}
