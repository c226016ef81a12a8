use axum::{
    extract::{Path, Query, State},
    http::Method,
    response::{Html, Json},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::admin_web::admin_routes;
use crate::api_errors::AppError;
use crate::app_state::AppState;
use crate::attestation::PublicJwk;
use crate::composer::{self, AuthorizationResponse, RecognitionResponse};

#[derive(Debug, Default, Deserialize)]
pub struct RecognitionParams {
    pub egf_did: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AuthorizationParams {
    pub authorization_id: Option<String>,
    pub ecosystem_did: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MetadataParams {
    pub egf_did: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TrustRegistryMetadata {
    pub name: String,
    pub id: String,
    pub description: String,
    pub default_egf_did: String,
    pub controllers: Vec<String>,
    pub ecosystem_did: String,
    pub trust_registry_did: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JwkSet {
    pub keys: Vec<PublicJwk>,
}

pub(crate) fn require(value: Option<String>, name: &str) -> Result<String, AppError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::bad_request(format!("Missing required query parameter: {name}")))
}

/// Full application router: TRQP queries, admin endpoints, status and health
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
        .max_age(Duration::from_secs(300));

    Router::new()
        .route(
            "/api/v2/ecosystems/{ecosystem_did}/recognition",
            get(check_ecosystem_recognition),
        )
        .route(
            "/api/v2/entities/{entity_did}/authorization",
            get(check_authorization_status),
        )
        .route("/api/v2/metadata", get(trust_registry_metadata))
        .route("/api/v2/keys", get(signing_keys))
        .route("/terms", get(terms))
        .route("/", get(status))
        .route("/healthz", get(healthz))
        .merge(admin_routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn check_ecosystem_recognition(
    State(st): State<Arc<AppState>>,
    Path(ecosystem_did): Path<String>,
    Query(params): Query<RecognitionParams>,
) -> Result<Json<RecognitionResponse>, AppError> {
    let egf_did = require(params.egf_did, "egf_did")?;
    let det = st
        .evaluator()
        .check_ecosystem_recognition(&ecosystem_did, &egf_did)?;
    Ok(Json(composer::attest_recognition(&st.signer, &det)?))
}

async fn check_authorization_status(
    State(st): State<Arc<AppState>>,
    Path(entity_did): Path<String>,
    Query(params): Query<AuthorizationParams>,
) -> Result<Json<AuthorizationResponse>, AppError> {
    let authorization_id = require(params.authorization_id, "authorization_id")?;
    let egf_did = require(params.ecosystem_did, "ecosystem_did")?;
    let det = st
        .evaluator()
        .check_authorization_status(&entity_did, &egf_did, &authorization_id)?;
    Ok(Json(composer::attest_authorization(&st.signer, &det)?))
}

async fn trust_registry_metadata(
    State(st): State<Arc<AppState>>,
    Query(params): Query<MetadataParams>,
) -> Result<Json<TrustRegistryMetadata>, AppError> {
    let metadata = st.store.registry_metadata()?;

    // a requested EGF wins when this registry actually governs it
    let default_egf_did = match params.egf_did.filter(|d| !d.is_empty()) {
        Some(did) if st.store.read_ecosystem(&did, |_| ()).is_ok() => did,
        _ => st.ecosystem_did.clone(),
    };

    let name = if metadata.name.is_empty() {
        st.config.registry_name.clone()
    } else {
        metadata.name
    };

    Ok(Json(TrustRegistryMetadata {
        name,
        id: st.trust_registry_did.clone(),
        description: metadata.description,
        controllers: vec![default_egf_did.clone()],
        default_egf_did,
        ecosystem_did: st.ecosystem_did.clone(),
        trust_registry_did: st.trust_registry_did.clone(),
    }))
}

async fn signing_keys(State(st): State<Arc<AppState>>) -> Result<Json<JwkSet>, AppError> {
    Ok(Json(JwkSet {
        keys: vec![st.signer.public_jwk()?],
    }))
}

async fn status(State(st): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "name": st.config.registry_name,
        "trust_registry_did": st.trust_registry_did,
        "ecosystem_did": st.ecosystem_did,
    }))
}

/// Governance framework terms advertised by the ecosystem DID's `egfURI` service
async fn terms(State(st): State<Arc<AppState>>) -> Html<String> {
    match tokio::fs::read_to_string(&st.config.terms_path).await {
        Ok(html) => Html(html),
        Err(e) => {
            debug!(path = %st.config.terms_path, error = %e, "No terms file, serving built-in page");
            Html(default_terms(&st.config.registry_name))
        }
    }
}

fn default_terms(registry_name: &str) -> String {
    let name = registry_name
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");
    format!(
        "<!DOCTYPE html>\n<html><head><title>{name} terms</title></head>\n\
         <body><h1>{name}</h1><p>Ecosystem governance framework terms for {name}.</p></body></html>\n"
    )
}

async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
