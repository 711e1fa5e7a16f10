// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Integration tests for the HTTP surface.
//!
//! Tests cover:
//! - Registry gating of secret reads and rotations
//! - Secret generation, repeat reads and rotation
//! - Soft revoke through the admin API
//! - Admin key enforcement
//! - Key metadata and health endpoints

use axum::{
	body::Body,
	http::{Request, StatusCode},
	Router,
};
use envault_common_secret::SecretString;
use envault_server::{create_app_state, create_router, ServerConfig};
use envault_server_config::{
	AdminConfig, DatabaseConfig, HttpConfig, LoggingConfig, VaultConfig,
};
use envault_server_secrets::{MasterKey, VaultContext};
use serde_json::{json, Value};
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;

const ADMIN_KEY: &str = "test-admin-key";

/// Creates a test app over an isolated database and master key.
async fn setup_test_app() -> (Router, VaultContext, TempDir) {
	let dir = tempdir().unwrap();
	let master_key_path = dir.path().join("master-key.txt");
	MasterKey::write_new(&master_key_path).unwrap();

	let config = ServerConfig {
		http: HttpConfig::default(),
		database: DatabaseConfig {
			url: format!("sqlite:{}", dir.path().join("envault.db").display()),
			max_connections: 5,
		},
		vault: VaultConfig {
			master_key_path,
			..VaultConfig::default()
		},
		admin: AdminConfig {
			api_key: SecretString::new(ADMIN_KEY.to_string()),
		},
		logging: LoggingConfig::default(),
	};

	let ctx = VaultContext::initialize(&config).await.unwrap();
	let app = create_router(create_app_state(&ctx, &config.admin));
	(app, ctx, dir)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
	let response = app.clone().oneshot(request).await.unwrap();
	let status = response.status();
	let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
		.await
		.unwrap();
	let body = if bytes.is_empty() {
		Value::Null
	} else {
		serde_json::from_slice(&bytes).unwrap()
	};
	(status, body)
}

fn get(uri: &str) -> Request<Body> {
	Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str) -> Request<Body> {
	Request::builder()
		.method("POST")
		.uri(uri)
		.body(Body::empty())
		.unwrap()
}

fn admin(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
	let builder = Request::builder()
		.method(method)
		.uri(uri)
		.header("X-ADMIN-KEY", ADMIN_KEY);
	match body {
		Some(body) => builder
			.header("content-type", "application/json")
			.body(Body::from(body.to_string()))
			.unwrap(),
		None => builder.body(Body::empty()).unwrap(),
	}
}

async fn register(app: &Router, app_id: &str) {
	let (status, _) = send(
		app,
		admin(
			"POST",
			"/api/admin/apps",
			Some(json!({ "appId": app_id, "description": "test app" })),
		),
	)
	.await;
	assert_eq!(status, StatusCode::OK);
}

fn secret_value(body: &Value) -> String {
	body["secretValue"].as_str().unwrap().to_string()
}

// ============================================================================
// Access gate
// ============================================================================

#[tokio::test]
async fn test_unregistered_app_is_forbidden() {
	let (app, ctx, _dir) = setup_test_app().await;

	let (status, body) = send(&app, get("/api/secrets/intruder")).await;
	assert_eq!(status, StatusCode::FORBIDDEN);
	assert_eq!(body["error"], "access_denied");
	assert!(body["timestamp"].is_string());

	let (status, _) = send(&app, post("/api/secrets/intruder/rotate")).await;
	assert_eq!(status, StatusCode::FORBIDDEN);

	ctx.shutdown().await;
}

// ============================================================================
// Secret lifecycle
// ============================================================================

#[tokio::test]
async fn test_first_read_generates_and_repeats() {
	let (app, ctx, _dir) = setup_test_app().await;
	register(&app, "ledger").await;

	let (status, first) = send(&app, get("/api/secrets/ledger")).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(first["appId"], "ledger");
	assert_eq!(secret_value(&first).len(), 44);

	let (_, second) = send(&app, get("/api/secrets/ledger")).await;
	assert_eq!(secret_value(&first), secret_value(&second));
	assert_eq!(first["createdAt"], second["createdAt"]);

	ctx.shutdown().await;
}

#[tokio::test]
async fn test_payments_rotation_and_revoke_scenario() {
	let (app, ctx, _dir) = setup_test_app().await;
	register(&app, "payments").await;

	let (_, s1) = send(&app, get("/api/secrets/payments")).await;
	let (_, again) = send(&app, get("/api/secrets/payments")).await;
	assert_eq!(secret_value(&s1), secret_value(&again));

	let (status, s2) = send(&app, post("/api/secrets/payments/rotate")).await;
	assert_eq!(status, StatusCode::OK);
	assert_ne!(secret_value(&s1), secret_value(&s2));

	let (_, after) = send(&app, get("/api/secrets/payments")).await;
	assert_eq!(secret_value(&after), secret_value(&s2));

	let (status, body) = send(&app, admin("DELETE", "/api/admin/apps/payments", None)).await;
	assert_eq!(status, StatusCode::OK);
	assert!(body["message"].as_str().unwrap().contains("payments"));

	let (status, body) = send(&app, get("/api/secrets/payments")).await;
	assert_eq!(status, StatusCode::FORBIDDEN);
	assert_eq!(body["error"], "access_denied");

	ctx.shutdown().await;
}

#[tokio::test]
async fn test_secret_health_reports_lifecycle() {
	let (app, ctx, _dir) = setup_test_app().await;

	let (status, body) = send(&app, get("/api/secrets/payments/health")).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["status"], "UNREGISTERED");
	assert!(body.get("secretValue").is_none());

	register(&app, "payments").await;
	let (status, body) = send(&app, get("/api/secrets/payments/health")).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["status"], "ACTIVE");
	assert_eq!(body["isExpired"], false);
	assert!(body["expiresInSeconds"].as_i64().unwrap() > 3500);
	assert!(body.get("secretValue").is_none());

	ctx.shutdown().await;
}

// ============================================================================
// Admin surface
// ============================================================================

#[tokio::test]
async fn test_admin_routes_require_key() {
	let (app, ctx, _dir) = setup_test_app().await;

	let (status, body) = send(&app, get("/api/admin/apps")).await;
	assert_eq!(status, StatusCode::UNAUTHORIZED);
	assert_eq!(body["error"], "unauthorized");

	let wrong = Request::builder()
		.uri("/api/admin/keys")
		.header("X-ADMIN-KEY", "not-the-key")
		.body(Body::empty())
		.unwrap();
	let (status, _) = send(&app, wrong).await;
	assert_eq!(status, StatusCode::UNAUTHORIZED);

	let unauthenticated_delete = Request::builder()
		.method("DELETE")
		.uri("/api/admin/apps/payments")
		.body(Body::empty())
		.unwrap();
	let (status, _) = send(&app, unauthenticated_delete).await;
	assert_eq!(status, StatusCode::UNAUTHORIZED);

	ctx.shutdown().await;
}

#[tokio::test]
async fn test_register_rejects_blank_app_id() {
	let (app, ctx, _dir) = setup_test_app().await;

	let (status, body) = send(
		&app,
		admin("POST", "/api/admin/apps", Some(json!({ "appId": "   " }))),
	)
	.await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["error"], "bad_request");

	ctx.shutdown().await;
}

#[tokio::test]
async fn test_list_apps_returns_registrations() {
	let (app, ctx, _dir) = setup_test_app().await;
	register(&app, "payments").await;
	register(&app, "ledger").await;

	let (status, body) = send(&app, admin("GET", "/api/admin/apps", None)).await;
	assert_eq!(status, StatusCode::OK);
	let ids: Vec<&str> = body
		.as_array()
		.unwrap()
		.iter()
		.map(|a| a["appId"].as_str().unwrap())
		.collect();
	assert!(ids.contains(&"payments"));
	assert!(ids.contains(&"ledger"));

	ctx.shutdown().await;
}

#[tokio::test]
async fn test_key_lookup_by_alias() {
	let (app, ctx, _dir) = setup_test_app().await;

	let (status, body) = send(&app, admin("GET", "/api/admin/keys", None)).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["keyAltName"], "envault-data-key");
	assert_eq!(body["status"], "Active");
	assert_eq!(body["provider"], "local");
	assert_eq!(
		body["keyId"].as_str().unwrap(),
		ctx.service().active_key_id().to_string()
	);

	let (status, body) = send(
		&app,
		admin("GET", "/api/admin/keys?altName=unknown-alias", None),
	)
	.await;
	assert_eq!(status, StatusCode::NOT_FOUND);
	assert_eq!(body["error"], "not_found");

	ctx.shutdown().await;
}

// ============================================================================
// Operational
// ============================================================================

#[tokio::test]
async fn test_health_endpoint_reports_healthy() {
	let (app, ctx, _dir) = setup_test_app().await;

	let (status, body) = send(&app, get("/health")).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["status"], "healthy");

	ctx.shutdown().await;
}

#[tokio::test]
async fn test_health_endpoint_reports_unhealthy_after_shutdown() {
	let (app, ctx, _dir) = setup_test_app().await;
	ctx.shutdown().await;

	let (status, body) = send(&app, get("/health")).await;
	assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
	assert_eq!(body["status"], "unhealthy");
}

#[tokio::test]
async fn test_openapi_document_is_served() {
	let (app, ctx, _dir) = setup_test_app().await;

	let (status, body) = send(&app, get("/api/openapi.json")).await;
	assert_eq!(status, StatusCode::OK);
	assert!(body["paths"]["/api/secrets/{app_id}"].is_object());

	ctx.shutdown().await;
}
