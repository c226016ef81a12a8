//! Admin endpoint tests: ecosystem CRUD and recognition/authorization upserts

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use trqp_registry::app_state::AppState;
use trqp_registry::composer::{AuthorizationResponse, RecognitionResponse};
use trqp_registry::config_loader::RegistryConfig;
use trqp_registry::model::TrustRegistry;
use trqp_registry::trqp_web::build_router;

fn test_app() -> (Router, Arc<AppState>) {
    let state = Arc::new(
        AppState::bootstrap(RegistryConfig::default(), TrustRegistry::default())
            .expect("bootstrap"),
    );
    (build_router(state.clone()), state)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().uri(uri).method(method);
    let req = match body {
        Some(b) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

fn ecosystem(did: &str, name: &str) -> Value {
    json!({
        "metadata": {"did": did, "type": "Education", "name": name,
                     "status": {"active": true, "detail": "Active"}},
        "authorization_types": {"teach": {"name": "teach", "description": "May teach"}}
    })
}

#[tokio::test]
async fn root_ecosystem_is_listed_after_bootstrap() {
    let (app, state) = test_app();
    let (status, body) = send(&app, "GET", "/admin/ecosystems", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([state.ecosystem_did]));
}

#[tokio::test]
async fn ecosystem_crud_lifecycle() {
    let (app, _) = test_app();

    let (status, body) = send(
        &app,
        "POST",
        "/admin/ecosystems",
        Some(ecosystem("did:example:X", "X")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "ecosystem created");

    let (status, _) = send(
        &app,
        "POST",
        "/admin/ecosystems",
        Some(ecosystem("did:example:X", "X again")),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(&app, "GET", "/admin/ecosystems/did:example:X", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["metadata"]["name"], "X");
    assert_eq!(body["authorization_types"]["teach"]["description"], "May teach");

    let (status, body) = send(
        &app,
        "PUT",
        "/admin/ecosystems/did:example:X",
        Some(ecosystem("did:example:X", "X renamed")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "ecosystem updated");

    let (_, body) = send(&app, "GET", "/admin/ecosystems/did:example:X", None).await;
    assert_eq!(body["metadata"]["name"], "X renamed");

    let (status, body) = send(&app, "DELETE", "/admin/ecosystems/did:example:X", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "ecosystem removed");

    let (status, body) = send(&app, "GET", "/admin/ecosystems/did:example:X", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 404);
}

#[tokio::test]
async fn update_with_mismatched_did_is_rejected() {
    let (app, _) = test_app();
    send(
        &app,
        "POST",
        "/admin/ecosystems",
        Some(ecosystem("did:example:X", "X")),
    )
    .await;

    let (status, body) = send(
        &app,
        "PUT",
        "/admin/ecosystems/did:example:X",
        Some(ecosystem("did:example:Y", "Y")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Mismatched ecosystem DID");
}

#[tokio::test]
async fn update_and_delete_of_unknown_ecosystem_are_404() {
    let (app, _) = test_app();
    let (status, _) = send(
        &app,
        "PUT",
        "/admin/ecosystems/did:example:ghost",
        Some(ecosystem("did:example:ghost", "ghost")),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", "/admin/ecosystems/did:example:ghost", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_ecosystem_body_is_400() {
    let (app, _) = test_app();
    let (status, body) = send(
        &app,
        "POST",
        "/admin/ecosystems",
        Some(json!({"name": "no metadata"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
}

#[tokio::test]
async fn recognition_added_by_admin_is_answered_by_query() {
    let (app, state) = test_app();
    let egf = state.ecosystem_did.clone();

    let (_, body) = send(
        &app,
        "GET",
        &format!("/api/v2/ecosystems/did:example:peer/recognition?egf_did={egf}"),
        None,
    )
    .await;
    let before: RecognitionResponse = serde_json::from_value(body).unwrap();
    assert!(!before.recognized);

    let (status, body) = send(
        &app,
        "POST",
        &format!("/admin/ecosystems/recognitions?did=did:example:peer&egf={egf}&scope=mutual"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["did"], "did:example:peer");
    assert_eq!(body["scope"], "mutual");
    assert_eq!(body["status"]["active"], true);

    let (_, body) = send(
        &app,
        "GET",
        &format!("/api/v2/ecosystems/did:example:peer/recognition?egf_did={egf}"),
        None,
    )
    .await;
    let after: RecognitionResponse = serde_json::from_value(body).unwrap();
    assert!(after.recognized);
}

#[tokio::test]
async fn authorization_upsert_toggles_query_result() {
    let (app, state) = test_app();
    let egf = state.ecosystem_did.clone();
    let query = format!(
        "/api/v2/entities/did:example:holder/authorization?authorization_id=auth1&ecosystem_did={egf}"
    );

    let (status, _) = send(&app, "GET", &query, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        "POST",
        &format!(
            "/admin/ecosystems/authorizations?did=did:example:holder&egf={egf}&authorization_id=auth1&active=true"
        ),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "auth1");
    assert_eq!(body["authorization_type"], "auth1");

    let (_, body) = send(&app, "GET", &query, None).await;
    let granted: AuthorizationResponse = serde_json::from_value(body).unwrap();
    assert!(granted.authorized);

    send(
        &app,
        "POST",
        &format!(
            "/admin/ecosystems/authorizations?did=did:example:holder&egf={egf}&authorization_id=auth1&active=false"
        ),
        None,
    )
    .await;
    let (_, body) = send(&app, "GET", &query, None).await;
    let revoked: AuthorizationResponse = serde_json::from_value(body).unwrap();
    assert!(!revoked.authorized);
}

#[tokio::test]
async fn admin_upserts_validate_parameters() {
    let (app, state) = test_app();
    let egf = state.ecosystem_did.clone();

    let (status, body) = send(&app, "POST", "/admin/ecosystems/recognitions?did=did:example:x", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("egf"));

    let (status, _) = send(
        &app,
        "POST",
        &format!("/admin/ecosystems/authorizations?did=did:example:x&egf={egf}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        &format!(
            "/admin/ecosystems/authorizations?did=did:example:x&egf={egf}&authorization_id=auth1&active=maybe"
        ),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/admin/ecosystems/recognitions?did=did:example:x&egf=did:example:ghost",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn active_flag_accepts_numeric_and_short_spellings() {
    let (app, state) = test_app();
    let egf = state.ecosystem_did.clone();
    let query = format!(
        "/api/v2/entities/did:example:holder/authorization?authorization_id=auth1&ecosystem_did={egf}"
    );
    let upsert = |active: &str| {
        format!(
            "/admin/ecosystems/authorizations?did=did:example:holder&egf={egf}&authorization_id=auth1&active={active}"
        )
    };

    let (status, body) = send(&app, "POST", &upsert("1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"]["active"], true);
    let (_, body) = send(&app, "GET", &query, None).await;
    let granted: AuthorizationResponse = serde_json::from_value(body).unwrap();
    assert!(granted.authorized);

    let (status, body) = send(&app, "POST", &upsert("F"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"]["active"], false);
    let (_, body) = send(&app, "GET", &query, None).await;
    let revoked: AuthorizationResponse = serde_json::from_value(body).unwrap();
    assert!(!revoked.authorized);
}
