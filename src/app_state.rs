use tracing::info;

use crate::attestation::SigningContext;
use crate::config_loader::RegistryConfig;
use crate::did_peer::{derive_did_peer2, ServiceDescriptor};
use crate::errors::RegistryResult;
use crate::evaluator::QueryEvaluator;
use crate::model::{AuthorizationType, Ecosystem, EcosystemMetadata, Status, TrustRegistry};
use crate::trust_graph::TrustGraphStore;

pub const TRQP_PROFILE: &str = "https://trustoverip.org/profiles/trp/v2";
pub const EGF_PROFILE: &str = "https://trustoverip.org/profiles/trp/egfURI/v1";
pub const ECOSYSTEM_SERVICE_PROFILE: &str = "https://example.org/profiles/ecosystemService/v1";
/// sha2-256 multihash published for the registry endpoints
pub const ENDPOINT_INTEGRITY: &str =
    "122041dd7b6443542e75701aa98a0c235951a28a0d851b11564d20022ab11d2589a8";
const ECOSYSTEM_SERVICE_INTEGRITY: &str = "example_integrity_hash_value";

/// Shared state of a running registry: one store, one signing key
#[derive(Debug)]
pub struct AppState {
    pub config: RegistryConfig,
    pub store: TrustGraphStore,
    pub signer: SigningContext,
    pub trust_registry_did: String,
    pub ecosystem_did: String,
}

impl AppState {
    /// Derive the registry and root ecosystem DIDs, seed the store, create the key
    pub fn bootstrap(config: RegistryConfig, snapshot: TrustRegistry) -> RegistryResult<Self> {
        let origin = config.public_origin();

        let trust_registry_did = derive_did_peer2(&[ServiceDescriptor::new(
            "#tr-1",
            "TRQP",
            TRQP_PROFILE,
            format!("{origin}/api/v2/"),
            ENDPOINT_INTEGRITY,
        )])?;
        info!(did = %trust_registry_did, "Generated Trust Registry DID");

        let ecosystem_did = derive_did_peer2(&[
            ServiceDescriptor::new(
                "#egfURI",
                "egfURI",
                EGF_PROFILE,
                format!("{origin}/terms"),
                ENDPOINT_INTEGRITY,
            ),
            ServiceDescriptor::new(
                "#TRQP",
                "TRQP",
                ECOSYSTEM_SERVICE_PROFILE,
                trust_registry_did.clone(),
                ECOSYSTEM_SERVICE_INTEGRITY,
            ),
        ])?;
        info!(did = %ecosystem_did, "Generated Ecosystem DID");

        let store = TrustGraphStore::seed(snapshot)?;
        store.ensure_registry_identifier(&trust_registry_did)?;
        store.create_ecosystem(root_ecosystem(&ecosystem_did, &config.registry_name))?;

        let signer = SigningContext::generate()?.with_kid_header(config.jws_kid_header);
        info!(kid = %signer.kid(), "Attestation signing key generated");

        Ok(Self {
            config,
            store,
            signer,
            trust_registry_did,
            ecosystem_did,
        })
    }

    pub fn evaluator(&self) -> QueryEvaluator<'_> {
        QueryEvaluator::new(&self.store, self.config.missing_status_policy)
    }
}

fn root_ecosystem(did: &str, registry_name: &str) -> Ecosystem {
    let mut ecosystem = Ecosystem::new(EcosystemMetadata {
        did: did.to_string(),
        ecosystem_type: "Root".to_string(),
        name: registry_name.to_string(),
        description: format!("Root ecosystem for {registry_name}"),
        status: Status::active("Active ecosystem"),
    });
    ecosystem.authorization_types.insert(
        "auth1".to_string(),
        AuthorizationType {
            name: "auth1".to_string(),
            description: "Authorization type 1".to_string(),
        },
    );
    ecosystem
}
