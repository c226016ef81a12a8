//! ES256 attestation signing
//!
//! `SigningContext` owns the process signing key: an ECDSA P-256 keypair
//! generated once at startup and never persisted or rotated. Tokens use the
//! JWS compact serialization `header.payload.signature`, each segment
//! base64url without padding, with the fixed-length `r || s` signature that
//! ES256 requires.

use aws_lc_rs::rand::SystemRandom;
use aws_lc_rs::signature::{
    EcdsaKeyPair, KeyPair, UnparsedPublicKey, ECDSA_P256_SHA256_FIXED,
    ECDSA_P256_SHA256_FIXED_SIGNING,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD as B64URL, Engine as _};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::canonicalize::canonical_bytes;
use crate::errors::{RegistryError, RegistryResult};

pub const ALGORITHM: &str = "ES256";
pub const TOKEN_TYPE: &str = "JWT";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwsHeader {
    pub alg: String,
    pub typ: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
}

/// Public half of the signing key as a JSON Web Key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicJwk {
    pub kty: String,
    pub crv: String,
    pub x: String,
    pub y: String,
    pub kid: String,
    pub alg: String,
    #[serde(rename = "use")]
    pub key_use: String,
}

pub struct SigningContext {
    key_pair: EcdsaKeyPair,
    rng: SystemRandom,
    kid: String,
    kid_header: bool,
}

impl std::fmt::Debug for SigningContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningContext")
            .field("alg", &ALGORITHM)
            .field("kid", &self.kid)
            .field("kid_header", &self.kid_header)
            .finish()
    }
}

impl SigningContext {
    /// Generate the process keypair
    pub fn generate() -> RegistryResult<Self> {
        let rng = SystemRandom::new();
        let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, &rng)
            .map_err(|_| RegistryError::signing("ECDSA P-256 key generation failed"))?;
        let key_pair = EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, pkcs8.as_ref())
            .map_err(|e| RegistryError::signing(format!("generated key rejected: {e}")))?;

        let (x, y) = split_point(key_pair.public_key().as_ref())?;
        let kid = jwk_thumbprint(&x, &y)?;

        Ok(Self {
            key_pair,
            rng,
            kid,
            kid_header: true,
        })
    }

    /// Whether token headers carry `kid`; without it the header is exactly `{alg, typ}`
    pub fn with_kid_header(mut self, enabled: bool) -> Self {
        self.kid_header = enabled;
        self
    }

    /// Key id: RFC 7638 thumbprint of the public JWK
    pub fn kid(&self) -> &str {
        &self.kid
    }

    /// Uncompressed SEC1 public key point
    pub fn public_key_bytes(&self) -> &[u8] {
        self.key_pair.public_key().as_ref()
    }

    pub fn public_jwk(&self) -> RegistryResult<PublicJwk> {
        let (x, y) = split_point(self.public_key_bytes())?;
        Ok(PublicJwk {
            kty: "EC".to_string(),
            crv: "P-256".to_string(),
            x,
            y,
            kid: self.kid.clone(),
            alg: ALGORITHM.to_string(),
            key_use: "sig".to_string(),
        })
    }

    /// Sign a claims payload into a compact JWS
    pub fn sign_claims<T: Serialize>(&self, claims: &T) -> RegistryResult<String> {
        let header = JwsHeader {
            alg: ALGORITHM.to_string(),
            typ: TOKEN_TYPE.to_string(),
            kid: self.kid_header.then(|| self.kid.clone()),
        };
        let header_json = serde_json::to_vec(&header)
            .map_err(|e| RegistryError::signing(format!("jws header not encodable: {e}")))?;
        let payload_json = serde_json::to_vec(claims)
            .map_err(|e| RegistryError::signing(format!("jws payload not encodable: {e}")))?;

        let signing_input = format!(
            "{}.{}",
            B64URL.encode(header_json),
            B64URL.encode(payload_json)
        );
        let signature = self
            .key_pair
            .sign(&self.rng, signing_input.as_bytes())
            .map_err(|_| RegistryError::signing("ECDSA signature operation failed"))?;

        Ok(format!("{signing_input}.{}", B64URL.encode(signature.as_ref())))
    }

    /// Verify a token produced by this context and return its claims
    pub fn verify(&self, token: &str) -> RegistryResult<serde_json::Value> {
        verify_attestation(self.public_key_bytes(), token)
    }
}

/// Verify an ES256 compact token against an uncompressed P-256 public key
pub fn verify_attestation(public_key: &[u8], token: &str) -> RegistryResult<serde_json::Value> {
    let segments: Vec<&str> = token.split('.').collect();
    let [header_b64, payload_b64, signature_b64] = segments.as_slice() else {
        return Err(RegistryError::validation(
            "jws",
            format!("expected 3 segments, found {}", segments.len()),
        ));
    };

    let header: JwsHeader = serde_json::from_slice(&decode_segment("header", header_b64)?)
        .map_err(|e| RegistryError::validation("jws", format!("invalid header: {e}")))?;
    if header.alg != ALGORITHM {
        return Err(RegistryError::validation(
            "jws",
            format!("unsupported algorithm '{}'", header.alg),
        ));
    }

    let signature = decode_segment("signature", signature_b64)?;
    let signing_input = format!("{header_b64}.{payload_b64}");
    UnparsedPublicKey::new(&ECDSA_P256_SHA256_FIXED, public_key)
        .verify(signing_input.as_bytes(), &signature)
        .map_err(|_| RegistryError::validation("jws", "signature verification failed"))?;

    serde_json::from_slice(&decode_segment("payload", payload_b64)?)
        .map_err(|e| RegistryError::validation("jws", format!("invalid payload: {e}")))
}

fn decode_segment(name: &str, segment: &str) -> RegistryResult<Vec<u8>> {
    B64URL
        .decode(segment)
        .map_err(|e| RegistryError::validation("jws", format!("undecodable {name}: {e}")))
}

/// Split an uncompressed point (0x04 || x || y) into base64url coordinates
fn split_point(point: &[u8]) -> RegistryResult<(String, String)> {
    match point {
        [0x04, coords @ ..] if coords.len() == 64 => {
            Ok((B64URL.encode(&coords[..32]), B64URL.encode(&coords[32..])))
        }
        _ => Err(RegistryError::signing(format!(
            "unexpected public key encoding ({} bytes)",
            point.len()
        ))),
    }
}

fn jwk_thumbprint(x: &str, y: &str) -> RegistryResult<String> {
    // RFC 7638: required members only, canonical JSON
    let required = serde_json::json!({"crv": "P-256", "kty": "EC", "x": x, "y": y});
    Ok(B64URL.encode(Sha256::digest(canonical_bytes(&required)?)))
}
