//! Recognition and authorization lookups over the trust graph
//!
//! Both checks are pure functions of the store snapshot: the first matching
//! entry in stored order decides. A missing recognition is a negative answer;
//! a missing authorization record is `NotFound`.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, warn};

use crate::errors::{RegistryError, RegistryResult};
use crate::model::Status;
use crate::trust_graph::TrustGraphStore;

/// Validity window of every determination
pub const VALIDITY_WINDOW_SECS: i64 = 3600;

/// How an authorization entry without an explicit `active` flag is read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingStatusPolicy {
    /// Unset flag counts as authorized
    #[default]
    Allow,
    /// Unset flag counts as not authorized
    Deny,
}

impl MissingStatusPolicy {
    fn resolve(self, status: &Status) -> bool {
        status.active.unwrap_or(self == MissingStatusPolicy::Allow)
    }
}

impl FromStr for MissingStatusPolicy {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "allow" => Ok(MissingStatusPolicy::Allow),
            "deny" => Ok(MissingStatusPolicy::Deny),
            other => Err(RegistryError::config(format!(
                "unknown missing_status_policy '{other}' (expected 'allow' or 'deny')"
            ))),
        }
    }
}

/// Outcome of one trust question
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Determination {
    /// Ecosystem or entity the question is about
    pub subject: String,
    /// Governing ecosystem (EGF DID)
    pub target: String,
    pub authorization_id: Option<String>,
    pub result: bool,
    pub evaluated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Determination {
    fn new(
        subject: &str,
        target: &str,
        authorization_id: Option<&str>,
        result: bool,
        evaluated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            subject: subject.to_string(),
            target: target.to_string(),
            authorization_id: authorization_id.map(str::to_string),
            result,
            evaluated_at,
            expires_at: evaluated_at + Duration::seconds(VALIDITY_WINDOW_SECS),
        }
    }
}

pub struct QueryEvaluator<'a> {
    store: &'a TrustGraphStore,
    policy: MissingStatusPolicy,
}

impl<'a> QueryEvaluator<'a> {
    pub fn new(store: &'a TrustGraphStore, policy: MissingStatusPolicy) -> Self {
        Self { store, policy }
    }

    /// Does the ecosystem `egf_did` recognize `ecosystem_did`?
    pub fn check_ecosystem_recognition(
        &self,
        ecosystem_did: &str,
        egf_did: &str,
    ) -> RegistryResult<Determination> {
        self.check_ecosystem_recognition_at(ecosystem_did, egf_did, Utc::now())
    }

    pub fn check_ecosystem_recognition_at(
        &self,
        ecosystem_did: &str,
        egf_did: &str,
        now: DateTime<Utc>,
    ) -> RegistryResult<Determination> {
        let recognized = self.store.read_ecosystem(egf_did, |ecosystem| {
            if ecosystem.did() != egf_did {
                return Err(RegistryError::not_found("ecosystem", egf_did));
            }
            Ok(ecosystem
                .recognition_entries
                .iter()
                .any(|entry| entry.did == ecosystem_did && entry.status.is_explicitly_active()))
        })??;

        debug!(egf = %egf_did, ecosystem = %ecosystem_did, recognized, "Recognition evaluated");
        Ok(Determination::new(ecosystem_did, egf_did, None, recognized, now))
    }

    /// Is `entity_did` authorized under `authorization_id` within `egf_did`?
    pub fn check_authorization_status(
        &self,
        entity_did: &str,
        egf_did: &str,
        authorization_id: &str,
    ) -> RegistryResult<Determination> {
        self.check_authorization_status_at(entity_did, egf_did, authorization_id, Utc::now())
    }

    pub fn check_authorization_status_at(
        &self,
        entity_did: &str,
        egf_did: &str,
        authorization_id: &str,
        now: DateTime<Utc>,
    ) -> RegistryResult<Determination> {
        let status = self.store.read_ecosystem(egf_did, |ecosystem| {
            ecosystem
                .authorization_entries
                .iter()
                .find(|entry| entry.id == authorization_id && entry.did == entity_did)
                .map(|entry| entry.status.clone())
        })?;

        let status = status.ok_or_else(|| {
            RegistryError::not_found(
                "authorization",
                format!("{authorization_id} for {entity_did}"),
            )
        })?;

        if status.active.is_none() {
            warn!(
                egf = %egf_did,
                entity = %entity_did,
                authorization_id = %authorization_id,
                policy = ?self.policy,
                "Authorization entry has no explicit status; applying missing-status policy"
            );
        }
        let authorized = self.policy.resolve(&status);

        debug!(egf = %egf_did, entity = %entity_did, authorized, "Authorization evaluated");
        Ok(Determination::new(
            entity_did,
            egf_did,
            Some(authorization_id),
            authorized,
            now,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        AuthorizationEntry, Ecosystem, EcosystemMetadata, RecognitionEntry, RegistryMetadata,
        TrustRegistry,
    };

    fn graph() -> TrustGraphStore {
        let mut eco = Ecosystem::new(EcosystemMetadata {
            did: "did:eg:A".into(),
            status: Status::active(""),
            ..Default::default()
        });
        eco.recognition_entries = vec![
            RecognitionEntry {
                did: "did:eg:B".into(),
                scope: String::new(),
                status: Status::active(""),
            },
            RecognitionEntry {
                did: "did:eg:D".into(),
                scope: String::new(),
                status: Status::inactive("suspended"),
            },
            RecognitionEntry {
                did: "did:eg:D".into(),
                scope: String::new(),
                status: Status::active("later duplicate"),
            },
            RecognitionEntry {
                did: "did:eg:E".into(),
                scope: String::new(),
                status: Status::default(),
            },
        ];
        eco.authorization_entries = vec![
            AuthorizationEntry {
                id: "auth-1".into(),
                did: "entity-1".into(),
                authorization_type: "auth1".into(),
                status: Status::active(""),
            },
            AuthorizationEntry {
                id: "auth-2".into(),
                did: "entity-1".into(),
                authorization_type: "auth1".into(),
                status: Status::inactive("revoked"),
            },
            AuthorizationEntry {
                id: "auth-3".into(),
                did: "entity-1".into(),
                authorization_type: "auth1".into(),
                status: Status::default(),
            },
        ];
        TrustGraphStore::seed(TrustRegistry {
            metadata: RegistryMetadata::default(),
            ecosystems: vec![eco],
        })
        .unwrap()
    }

    #[test]
    fn active_recognition_is_recognized() {
        let store = graph();
        let eval = QueryEvaluator::new(&store, MissingStatusPolicy::Allow);
        let det = eval.check_ecosystem_recognition("did:eg:B", "did:eg:A").unwrap();
        assert!(det.result);
        assert_eq!(det.subject, "did:eg:B");
        assert_eq!(det.target, "did:eg:A");
        assert_eq!(det.authorization_id, None);
    }

    #[test]
    fn unknown_ecosystem_is_not_recognized_but_succeeds() {
        let store = graph();
        let eval = QueryEvaluator::new(&store, MissingStatusPolicy::Allow);
        let det = eval.check_ecosystem_recognition("did:eg:C", "did:eg:A").unwrap();
        assert!(!det.result);
    }

    #[test]
    fn recognition_skips_inactive_and_unset_entries() {
        let store = graph();
        let eval = QueryEvaluator::new(&store, MissingStatusPolicy::Allow);
        // an inactive entry does not hide a later active one for the same DID
        assert!(eval.check_ecosystem_recognition("did:eg:D", "did:eg:A").unwrap().result);
        assert!(!eval.check_ecosystem_recognition("did:eg:E", "did:eg:A").unwrap().result);
    }

    #[test]
    fn recognition_against_unknown_egf_is_not_found() {
        let store = graph();
        let eval = QueryEvaluator::new(&store, MissingStatusPolicy::Allow);
        assert!(matches!(
            eval.check_ecosystem_recognition("did:eg:B", "did:eg:Z"),
            Err(RegistryError::NotFound { .. })
        ));
    }

    #[test]
    fn authorization_reflects_entry_status() {
        let store = graph();
        let eval = QueryEvaluator::new(&store, MissingStatusPolicy::Allow);
        let det = eval
            .check_authorization_status("entity-1", "did:eg:A", "auth-1")
            .unwrap();
        assert!(det.result);
        assert_eq!(det.authorization_id.as_deref(), Some("auth-1"));

        assert!(!eval
            .check_authorization_status("entity-1", "did:eg:A", "auth-2")
            .unwrap()
            .result);
    }

    #[test]
    fn unknown_authorization_is_not_found() {
        let store = graph();
        let eval = QueryEvaluator::new(&store, MissingStatusPolicy::Allow);
        for (entity, auth) in [("entity-1", "auth-999"), ("entity-2", "auth-1")] {
            assert!(matches!(
                eval.check_authorization_status(entity, "did:eg:A", auth),
                Err(RegistryError::NotFound { .. })
            ));
        }
        assert!(matches!(
            eval.check_authorization_status("entity-1", "did:eg:Z", "auth-1"),
            Err(RegistryError::NotFound { .. })
        ));
    }

    #[test]
    fn missing_status_follows_policy() {
        let store = graph();
        let allow = QueryEvaluator::new(&store, MissingStatusPolicy::Allow);
        let deny = QueryEvaluator::new(&store, MissingStatusPolicy::Deny);
        assert!(allow
            .check_authorization_status("entity-1", "did:eg:A", "auth-3")
            .unwrap()
            .result);
        assert!(!deny
            .check_authorization_status("entity-1", "did:eg:A", "auth-3")
            .unwrap()
            .result);
    }

    #[test]
    fn repeated_evaluation_is_stable() {
        let store = graph();
        let eval = QueryEvaluator::new(&store, MissingStatusPolicy::Allow);
        let now = Utc::now();
        let first = eval.check_ecosystem_recognition_at("did:eg:B", "did:eg:A", now).unwrap();
        let second = eval.check_ecosystem_recognition_at("did:eg:B", "did:eg:A", now).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.expires_at - first.evaluated_at, Duration::hours(1));
    }

    #[test]
    fn policy_parses_from_config_strings() {
        assert_eq!("deny".parse::<MissingStatusPolicy>().unwrap(), MissingStatusPolicy::Deny);
        assert_eq!("Allow".parse::<MissingStatusPolicy>().unwrap(), MissingStatusPolicy::Allow);
        assert!("maybe".parse::<MissingStatusPolicy>().is_err());
    }
}
