//! Trust graph records as they appear in registry snapshots and admin requests

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Activation state of an ecosystem or entry.
///
/// `active` stays `None` when a snapshot omits the flag; how an unset flag is
/// read is decided by the evaluator, not here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default)]
    pub detail: String,
}

impl Status {
    pub fn active(detail: impl Into<String>) -> Self {
        Self {
            active: Some(true),
            detail: detail.into(),
        }
    }

    pub fn inactive(detail: impl Into<String>) -> Self {
        Self {
            active: Some(false),
            detail: detail.into(),
        }
    }

    pub fn is_explicitly_active(&self) -> bool {
        self.active == Some(true)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryMetadata {
    #[serde(default)]
    pub identifier: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Root snapshot: one per process
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustRegistry {
    #[serde(default)]
    pub metadata: RegistryMetadata,
    #[serde(default)]
    pub ecosystems: Vec<Ecosystem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcosystemMetadata {
    pub did: String,
    #[serde(rename = "type", default)]
    pub ecosystem_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: Status,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationType {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Declaration that an ecosystem accepts another ecosystem's governance framework
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionEntry {
    pub did: String,
    #[serde(default)]
    pub scope: String,
    #[serde(default)]
    pub status: Status,
}

/// Record asserting that an entity holds a named authorization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationEntry {
    pub id: String,
    pub did: String,
    #[serde(default, alias = "authorization")]
    pub authorization_type: String,
    #[serde(default)]
    pub status: Status,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ecosystem {
    pub metadata: EcosystemMetadata,
    #[serde(default)]
    pub authorization_types: BTreeMap<String, AuthorizationType>,
    #[serde(default)]
    pub recognition_entries: Vec<RecognitionEntry>,
    #[serde(default)]
    pub authorization_entries: Vec<AuthorizationEntry>,
}

impl Ecosystem {
    /// Empty ecosystem with the given metadata
    pub fn new(metadata: EcosystemMetadata) -> Self {
        Self {
            metadata,
            ..Default::default()
        }
    }

    pub fn did(&self) -> &str {
        &self.metadata.did
    }
}
