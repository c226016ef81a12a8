//! Administrative endpoints over the trust graph store

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::api_errors::AppError;
use crate::app_state::AppState;
use crate::model::{AuthorizationEntry, Ecosystem, RecognitionEntry};
use crate::trqp_web::require;

#[derive(Debug, Default, Deserialize)]
pub struct RecognizeParams {
    pub did: Option<String>,
    pub egf: Option<String>,
    pub scope: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AuthorizeParams {
    pub did: Option<String>,
    pub egf: Option<String>,
    pub authorization_id: Option<String>,
    pub active: Option<String>,
}

pub fn admin_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/ecosystems", get(list_ecosystems).post(create_ecosystem))
        .route(
            "/admin/ecosystems/{did}",
            get(get_ecosystem)
                .put(update_ecosystem)
                .delete(remove_ecosystem),
        )
        .route("/admin/ecosystems/recognitions", post(recognize_ecosystem))
        .route("/admin/ecosystems/authorizations", post(authorize_entry))
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| AppError::bad_request(rejection.body_text()))
}

/// Accepts 1/0, t/f, T/F, true/false, TRUE/FALSE and True/False
fn parse_flag(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

async fn list_ecosystems(State(st): State<Arc<AppState>>) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(st.store.list_ecosystem_dids()?))
}

async fn create_ecosystem(
    State(st): State<Arc<AppState>>,
    body: Result<Json<Ecosystem>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let ecosystem = json_body(body)?;
    if ecosystem.did().is_empty() {
        return Err(AppError::bad_request("Ecosystem DID is required"));
    }
    st.store.create_ecosystem(ecosystem)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "ecosystem created" })),
    ))
}

async fn get_ecosystem(
    State(st): State<Arc<AppState>>,
    Path(did): Path<String>,
) -> Result<Json<Ecosystem>, AppError> {
    Ok(Json(st.store.get_ecosystem_by_did(&did)?))
}

async fn update_ecosystem(
    State(st): State<Arc<AppState>>,
    Path(did): Path<String>,
    body: Result<Json<Ecosystem>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let ecosystem = json_body(body)?;
    if ecosystem.did() != did {
        return Err(AppError::bad_request("Mismatched ecosystem DID"));
    }
    st.store.update_ecosystem(ecosystem)?;
    Ok(Json(json!({ "message": "ecosystem updated" })))
}

async fn remove_ecosystem(
    State(st): State<Arc<AppState>>,
    Path(did): Path<String>,
) -> Result<Json<Value>, AppError> {
    st.store.remove_ecosystem(&did)?;
    Ok(Json(json!({ "message": "ecosystem removed" })))
}

async fn recognize_ecosystem(
    State(st): State<Arc<AppState>>,
    Query(params): Query<RecognizeParams>,
) -> Result<Json<RecognitionEntry>, AppError> {
    let did = require(params.did, "did")?;
    let egf = require(params.egf, "egf")?;
    let scope = params.scope.filter(|s| !s.is_empty());
    Ok(Json(st.store.recognize_ecosystem(&egf, &did, scope)?))
}

async fn authorize_entry(
    State(st): State<Arc<AppState>>,
    Query(params): Query<AuthorizeParams>,
) -> Result<Json<AuthorizationEntry>, AppError> {
    let did = require(params.did, "did")?;
    let egf = require(params.egf, "egf")?;
    let authorization_id = require(params.authorization_id, "authorization_id")?;
    let active = match params.active.as_deref().filter(|a| !a.is_empty()) {
        None => None,
        Some(raw) => Some(parse_flag(raw).ok_or_else(|| {
            AppError::bad_request("Invalid 'active' query param; must be boolean")
        })?),
    };
    Ok(Json(st.store.authorize_entry(
        &egf,
        &did,
        &authorization_id,
        active,
    )?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_spellings() {
        for raw in ["1", "t", "T", "true", "TRUE", "True"] {
            assert_eq!(parse_flag(raw), Some(true), "{raw}");
        }
        for raw in ["0", "f", "F", "false", "FALSE", "False"] {
            assert_eq!(parse_flag(raw), Some(false), "{raw}");
        }
        for raw in ["yes", "tRuE", "2", " true"] {
            assert_eq!(parse_flag(raw), None, "{raw}");
        }
    }
}
