//! Signed response envelopes
//!
//! A determination is turned into claims, signed, and wrapped with timing
//! metadata. The validity window is part of the signed claims so a verifier
//! can check it from the token alone.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::attestation::SigningContext;
use crate::errors::RegistryResult;
use crate::evaluator::Determination;

pub const RECOGNITION_MESSAGE: &str = "Ecosystem recognition evaluation";
pub const AUTHORIZATION_MESSAGE: &str = "Authorization status evaluation";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionClaims {
    pub ecosystem_did: String,
    pub egf_did: String,
    pub recognized: bool,
    pub timestamp: String,
    pub expires_at: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationClaims {
    pub entity_id: String,
    pub authorization_id: String,
    pub egf_did: String,
    pub authorized: bool,
    pub timestamp: String,
    pub expires_at: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionResponse {
    pub egf_did: String,
    pub evaluated_at: DateTime<Utc>,
    pub expiry_time: DateTime<Utc>,
    pub message: String,
    pub recognized: bool,
    pub response_time: DateTime<Utc>,
    pub jws: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationResponse {
    pub authorized: bool,
    pub egf_did: String,
    pub expiry_time: DateTime<Utc>,
    pub message: String,
    pub response_time: DateTime<Utc>,
    pub jws: String,
}

fn rfc3339(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn recognition_claims(det: &Determination) -> RecognitionClaims {
    RecognitionClaims {
        ecosystem_did: det.subject.clone(),
        egf_did: det.target.clone(),
        recognized: det.result,
        timestamp: rfc3339(det.evaluated_at),
        expires_at: rfc3339(det.expires_at),
        iat: det.evaluated_at.timestamp(),
        exp: det.expires_at.timestamp(),
        jti: Uuid::new_v4().to_string(),
    }
}

pub fn authorization_claims(det: &Determination) -> AuthorizationClaims {
    AuthorizationClaims {
        entity_id: det.subject.clone(),
        authorization_id: det.authorization_id.clone().unwrap_or_default(),
        egf_did: det.target.clone(),
        authorized: det.result,
        timestamp: rfc3339(det.evaluated_at),
        expires_at: rfc3339(det.expires_at),
        iat: det.evaluated_at.timestamp(),
        exp: det.expires_at.timestamp(),
        jti: Uuid::new_v4().to_string(),
    }
}

/// Sign a recognition determination and build its envelope
pub fn attest_recognition(
    signer: &SigningContext,
    det: &Determination,
) -> RegistryResult<RecognitionResponse> {
    let jws = signer.sign_claims(&recognition_claims(det))?;
    Ok(RecognitionResponse {
        egf_did: det.target.clone(),
        evaluated_at: det.evaluated_at,
        expiry_time: det.expires_at,
        message: RECOGNITION_MESSAGE.to_string(),
        recognized: det.result,
        response_time: Utc::now(),
        jws,
    })
}

/// Sign an authorization determination and build its envelope
pub fn attest_authorization(
    signer: &SigningContext,
    det: &Determination,
) -> RegistryResult<AuthorizationResponse> {
    let jws = signer.sign_claims(&authorization_claims(det))?;
    Ok(AuthorizationResponse {
        authorized: det.result,
        egf_did: det.target.clone(),
        expiry_time: det.expires_at,
        message: AUTHORIZATION_MESSAGE.to_string(),
        response_time: Utc::now(),
        jws,
    })
}
