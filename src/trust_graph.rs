//! In-memory trust graph store
//!
//! One `TrustRegistry` snapshot behind a single `RwLock`: queries share the
//! read side, administrative mutations take the write side. The raw map is
//! never handed out; callers get clones or run a closure under the guard.

use std::sync::RwLock;
use tracing::{debug, info};

use crate::errors::{RegistryError, RegistryResult, SafeReadLock, SafeWriteLock};
use crate::model::{
    AuthorizationEntry, Ecosystem, RecognitionEntry, RegistryMetadata, Status, TrustRegistry,
};

const ECOSYSTEM: &str = "ecosystem";

#[derive(Debug, Default)]
pub struct TrustGraphStore {
    inner: RwLock<TrustRegistry>,
}

impl TrustGraphStore {
    /// Empty store carrying only registry metadata
    pub fn new(metadata: RegistryMetadata) -> Self {
        Self {
            inner: RwLock::new(TrustRegistry {
                metadata,
                ecosystems: Vec::new(),
            }),
        }
    }

    /// Build the store from a loaded snapshot, rejecting duplicate ecosystem DIDs
    pub fn seed(registry: TrustRegistry) -> RegistryResult<Self> {
        let store = Self::new(registry.metadata);
        for ecosystem in registry.ecosystems {
            store.create_ecosystem(ecosystem)?;
        }
        Ok(store)
    }

    pub fn registry_metadata(&self) -> RegistryResult<RegistryMetadata> {
        Ok(self.inner.safe_read()?.metadata.clone())
    }

    /// Fill in the registry identifier when the snapshot did not declare one
    pub fn ensure_registry_identifier(&self, identifier: &str) -> RegistryResult<String> {
        let mut registry = self.inner.safe_write()?;
        if registry.metadata.identifier.is_empty() {
            registry.metadata.identifier = identifier.to_string();
        }
        Ok(registry.metadata.identifier.clone())
    }

    pub fn create_ecosystem(&self, ecosystem: Ecosystem) -> RegistryResult<()> {
        let mut registry = self.inner.safe_write()?;
        if registry.ecosystems.iter().any(|e| e.did() == ecosystem.did()) {
            return Err(RegistryError::conflict(ECOSYSTEM, ecosystem.did()));
        }
        info!(did = %ecosystem.did(), "Creating ecosystem");
        registry.ecosystems.push(ecosystem);
        Ok(())
    }

    pub fn get_ecosystem_by_did(&self, did: &str) -> RegistryResult<Ecosystem> {
        self.read_ecosystem(did, Ecosystem::clone)
    }

    /// Run `f` against the stored ecosystem while holding the read guard
    pub fn read_ecosystem<R>(&self, did: &str, f: impl FnOnce(&Ecosystem) -> R) -> RegistryResult<R> {
        let registry = self.inner.safe_read()?;
        registry
            .ecosystems
            .iter()
            .find(|e| e.did() == did)
            .map(f)
            .ok_or_else(|| RegistryError::not_found(ECOSYSTEM, did))
    }

    /// Full replace of an existing ecosystem
    pub fn update_ecosystem(&self, ecosystem: Ecosystem) -> RegistryResult<()> {
        let mut registry = self.inner.safe_write()?;
        let slot = registry
            .ecosystems
            .iter_mut()
            .find(|e| e.did() == ecosystem.did())
            .ok_or_else(|| RegistryError::not_found(ECOSYSTEM, ecosystem.did()))?;
        info!(did = %ecosystem.did(), "Updating ecosystem");
        *slot = ecosystem;
        Ok(())
    }

    pub fn remove_ecosystem(&self, did: &str) -> RegistryResult<()> {
        let mut registry = self.inner.safe_write()?;
        let index = registry
            .ecosystems
            .iter()
            .position(|e| e.did() == did)
            .ok_or_else(|| RegistryError::not_found(ECOSYSTEM, did))?;
        registry.ecosystems.remove(index);
        info!(did = %did, "Removed ecosystem");
        Ok(())
    }

    /// All ecosystem DIDs in insertion order
    pub fn list_ecosystem_dids(&self) -> RegistryResult<Vec<String>> {
        let registry = self.inner.safe_read()?;
        Ok(registry
            .ecosystems
            .iter()
            .map(|e| e.did().to_string())
            .collect())
    }

    /// Record that `egf_did` recognizes `did`, replacing an existing entry for `did`
    pub fn recognize_ecosystem(
        &self,
        egf_did: &str,
        did: &str,
        scope: Option<String>,
    ) -> RegistryResult<RecognitionEntry> {
        self.with_ecosystem_mut(egf_did, |ecosystem| {
            let entry = RecognitionEntry {
                did: did.to_string(),
                scope: scope.unwrap_or_default(),
                status: Status::active("Recognized by administrator"),
            };
            match ecosystem
                .recognition_entries
                .iter_mut()
                .find(|e| e.did == did)
            {
                Some(existing) => *existing = entry.clone(),
                None => ecosystem.recognition_entries.push(entry.clone()),
            }
            debug!(egf = %egf_did, did = %did, "Recognition entry recorded");
            entry
        })
    }

    /// Upsert an authorization entry keyed by `(authorization_id, did)`
    pub fn authorize_entry(
        &self,
        egf_did: &str,
        did: &str,
        authorization_id: &str,
        active: Option<bool>,
    ) -> RegistryResult<AuthorizationEntry> {
        self.with_ecosystem_mut(egf_did, |ecosystem| {
            let status = Status {
                active,
                detail: String::new(),
            };
            let entry = match ecosystem
                .authorization_entries
                .iter_mut()
                .find(|e| e.id == authorization_id && e.did == did)
            {
                Some(existing) => {
                    existing.status = status;
                    existing.clone()
                }
                None => {
                    let entry = AuthorizationEntry {
                        id: authorization_id.to_string(),
                        did: did.to_string(),
                        authorization_type: authorization_id.to_string(),
                        status,
                    };
                    ecosystem.authorization_entries.push(entry.clone());
                    entry
                }
            };
            debug!(egf = %egf_did, did = %did, authorization_id = %authorization_id, "Authorization entry recorded");
            entry
        })
    }

    fn with_ecosystem_mut<R>(
        &self,
        did: &str,
        f: impl FnOnce(&mut Ecosystem) -> R,
    ) -> RegistryResult<R> {
        let mut registry = self.inner.safe_write()?;
        registry
            .ecosystems
            .iter_mut()
            .find(|e| e.did() == did)
            .map(f)
            .ok_or_else(|| RegistryError::not_found(ECOSYSTEM, did))
    }
}
