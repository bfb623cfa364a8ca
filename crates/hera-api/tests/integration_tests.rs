//! # Integration Tests for hera-api
//!
//! Drives the full router with `oneshot`: guardrail rejections, organization
//! scoping, 503 without an RPC client, stored procedure passthrough against a
//! wiremock PostgREST, POS checkout, catalogs, metrics and OpenAPI.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_json, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use hera_api::auth::SecretToken;
use hera_api::middleware::rate_limit::RateLimitConfig;
use hera_api::state::{AppConfig, AppState};
use hera_rpc_client::{HeraClient, RpcConfig};

const ORG: &str = "550e8400-e29b-41d4-a716-446655440000";
const OTHER_ORG: &str = "00000000-0000-4000-8000-000000000001";
const ENTITY: &str = "6ba7b810-9dad-11d1-80b4-00c04fd430c8";
const CATEGORY: &str = "6ba7b811-9dad-11d1-80b4-00c04fd430c8";

/// Helper: build the test app with auth disabled and no RPC client.
fn test_app() -> axum::Router {
    let state = AppState::with_config(AppConfig::default(), None).unwrap();
    hera_api::app(state)
}

/// Helper: build the test app with auth enabled.
fn test_app_with_auth(token: &str) -> axum::Router {
    let config = AppConfig {
        auth_token: Some(SecretToken::new(token.to_string())),
        ..AppConfig::default()
    };
    hera_api::app(AppState::with_config(config, None).unwrap())
}

/// Helper: app whose RPC client points at the mock server.
fn mocked_app(mock_server: &MockServer, config: AppConfig) -> axum::Router {
    let rpc = RpcConfig::local_mock(mock_server.address().port(), "service-key").unwrap();
    let client = HeraClient::new(rpc).unwrap();
    hera_api::app(AppState::with_config(config, Some(client)).unwrap())
}

/// Helper: read response body as string.
async fn body_string(response: axum::http::Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Helper: read response body as JSON.
async fn body_json_value(response: axum::http::Response<Body>) -> Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn customer_body() -> Value {
    json!({
        "organization_id": ORG,
        "entity_type": "customer",
        "entity_name": "Jane Doe",
        "smart_code": "HERA.SALON.CRM.ENTITY.CUSTOMER.v1",
        "dynamic_fields": [
            { "field_name": "vip", "field_value": true }
        ]
    })
}

// -- Health Probes ------------------------------------------------------------

#[tokio::test]
async fn test_liveness_probe() {
    let response = test_app().oneshot(get("/health/liveness")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
}

#[tokio::test]
async fn test_readiness_without_client_is_503() {
    let response = test_app().oneshot(get("/health/readiness")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_readiness_probes_rest_endpoint() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&mock_server)
        .await;

    let app = mocked_app(&mock_server, AppConfig::default());
    let response = app.oneshot(get("/health/readiness")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ready");
}

// -- Guardrails ---------------------------------------------------------------

#[tokio::test]
async fn test_missing_organization_is_400() {
    let mut body = customer_body();
    body.as_object_mut().unwrap().remove("organization_id");
    let response = test_app()
        .oneshot(post_json("/api/universal/entities", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let err = body_json_value(response).await;
    assert_eq!(err["error"], "organization_id is required");
    assert_eq!(err["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_malformed_organization_is_400() {
    let mut body = customer_body();
    body["organization_id"] = json!("acme-salon");
    let response = test_app()
        .oneshot(post_json("/api/universal/entities", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let err = body_json_value(response).await;
    assert!(err["error"].as_str().unwrap().contains("must be a UUID"));
}

#[tokio::test]
async fn test_bad_smart_code_is_400() {
    let mut body = customer_body();
    body["smart_code"] = json!("HERA.SALON.CUSTOMER.V1");
    let response = test_app()
        .oneshot(post_json("/api/universal/entities", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let err = body_json_value(response).await;
    assert!(err["error"].as_str().unwrap().starts_with("smart_code:"));
}

#[tokio::test]
async fn test_preset_type_mismatch_is_400() {
    let body = json!({
        "organization_id": ORG,
        "entity_type": "PRODUCT",
        "entity_name": "Argan oil",
        "smart_code": "HERA.SALON.CATALOG.ENTITY.PRODUCT.v1",
        "dynamic_fields": [{ "field_name": "price", "field_value": "twelve" }]
    });
    let response = test_app()
        .oneshot(post_json("/api/universal/entities", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let err = body_json_value(response).await;
    assert_eq!(
        err["error"],
        "dynamic_fields[0].field_value is not a valid number value"
    );
}

#[tokio::test]
async fn test_preset_required_field_on_create_is_400() {
    let body = json!({
        "organization_id": ORG,
        "entity_type": "SERVICE",
        "entity_name": "Haircut",
        "smart_code": "HERA.SALON.CATALOG.ENTITY.SERVICE.v1",
        "dynamic_fields": [{ "field_name": "price", "field_value": 35 }]
    });
    let response = test_app()
        .oneshot(post_json("/api/v2/entities", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let err = body_json_value(response).await;
    assert!(err["error"].as_str().unwrap().contains("duration_minutes"));
}

#[tokio::test]
async fn test_malformed_json_is_400() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/universal/entities")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = test_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json_value(response).await["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_transaction_with_bad_line_code_is_400() {
    let body = json!({
        "organization_id": ORG,
        "transaction_type": "SALE",
        "smart_code": "HERA.SALON.POS.TXN.SALE.v1",
        "lines": [{ "line_type": "SERVICE", "line_amount": 40, "smart_code": "SERVICE" }]
    });
    let response = test_app()
        .oneshot(post_json("/api/universal/transactions", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let err = body_json_value(response).await;
    assert!(err["error"].as_str().unwrap().starts_with("lines[0].smart_code"));
}

// -- RPC client not configured ------------------------------------------------

#[tokio::test]
async fn test_valid_request_without_client_is_503() {
    let response = test_app()
        .oneshot(post_json("/api/universal/entities", customer_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json_value(response).await["code"], "SERVICE_UNAVAILABLE");
}

#[tokio::test]
async fn test_entity_read_without_client_is_503() {
    let uri = format!("/api/universal/entities/{ENTITY}?organization_id={ORG}");
    let response = test_app().oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

// -- Authentication & organization scope --------------------------------------

#[tokio::test]
async fn test_missing_token_is_401() {
    let app = test_app_with_auth("s3cret");
    let response = app.oneshot(get("/api/v2/presets")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_needs_no_token() {
    let app = test_app_with_auth("s3cret");
    let response = app.oneshot(get("/health/liveness")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_cross_organization_write_is_403() {
    let app = test_app_with_auth("s3cret");
    let mut request = post_json("/api/universal/entities", customer_body());
    request.headers_mut().insert(
        "authorization",
        format!("Bearer owner:{OTHER_ORG}:s3cret").parse().unwrap(),
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json_value(response).await["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_same_organization_passes_scope_check() {
    // Passes auth and scope; fails later only because no client is configured.
    let app = test_app_with_auth("s3cret");
    let mut request = post_json("/api/universal/entities", customer_body());
    request.headers_mut().insert(
        "authorization",
        format!("Bearer owner:{ORG}:s3cret").parse().unwrap(),
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_rate_limit_per_organization() {
    let config = AppConfig {
        rate_limit: RateLimitConfig {
            max_requests: 2,
            window_secs: 60,
        },
        ..AppConfig::default()
    };
    let app = hera_api::app(AppState::with_config(config, None).unwrap());

    let request = |org: &str| {
        Request::builder()
            .uri("/api/v2/presets")
            .header("x-organization-id", org)
            .body(Body::empty())
            .unwrap()
    };
    for _ in 0..2 {
        let response = app.clone().oneshot(request(ORG)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    let response = app.clone().oneshot(request(ORG)).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    let response = app.oneshot(request(OTHER_ORG)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_rate_limit_rotating_header_values_share_a_bucket() {
    let config = AppConfig {
        rate_limit: RateLimitConfig {
            max_requests: 2,
            window_secs: 60,
        },
        ..AppConfig::default()
    };
    let app = hera_api::app(AppState::with_config(config, None).unwrap());

    let mut statuses = Vec::new();
    for i in 0..5 {
        let request = Request::builder()
            .uri("/api/v2/presets")
            .header("x-organization-id", format!("not-a-uuid-{i}"))
            .body(Body::empty())
            .unwrap();
        statuses.push(app.clone().oneshot(request).await.unwrap().status());
    }
    assert_eq!(&statuses[..2], &[StatusCode::OK, StatusCode::OK]);
    assert!(statuses[2..].iter().all(|s| *s == StatusCode::TOO_MANY_REQUESTS));
}

// -- Stored procedure passthrough ---------------------------------------------

#[tokio::test]
async fn test_entity_upsert_completes_fields_from_preset() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/hera_entity_upsert_v1"))
        .and(body_json(json!({
            "p_organization_id": ORG,
            "p_entity_type": "CUSTOMER",
            "p_entity_name": "Jane Doe",
            "p_smart_code": "HERA.SALON.CRM.ENTITY.CUSTOMER.v1",
            "p_entity_id": null,
            "p_entity_code": null,
            "p_parent_entity_id": null,
            "p_status": null,
            "p_metadata": null,
            "p_dynamic": {
                "vip": {
                    "field_type": "boolean",
                    "field_value_boolean": true,
                    "smart_code": "HERA.SALON.CRM.DYN.VIP.v1"
                }
            }
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "success": true, "entity_id": ENTITY })),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = mocked_app(&mock_server, AppConfig::default());
    let response = app
        .oneshot(post_json("/api/universal/entities", customer_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json_value(response).await;
    assert_eq!(body["entity_id"], ENTITY);
}

#[tokio::test]
async fn test_rpc_rejection_passes_through_as_400() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/hera_entity_upsert_v1"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": "P0001",
            "message": "HERA_DUPLICATE_CODE: entity_code already exists",
            "details": null,
            "hint": "choose another entity_code"
        })))
        .mount(&mock_server)
        .await;

    let app = mocked_app(&mock_server, AppConfig::default());
    let response = app
        .oneshot(post_json("/api/universal/entities", customer_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let err = body_json_value(response).await;
    assert_eq!(err["error"], "HERA_DUPLICATE_CODE: entity_code already exists");
    assert_eq!(err["code"], "RPC_ERROR");
    assert_eq!(err["details"]["code"], "P0001");
    assert_eq!(err["details"]["hint"], "choose another entity_code");
}

#[tokio::test]
async fn test_rpc_server_error_passes_through_as_500() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/hera_txn_emit_v1"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "code": "XX000",
            "message": "posting rules not found for smart code"
        })))
        .mount(&mock_server)
        .await;

    let body = json!({
        "organization_id": ORG,
        "transaction_type": "SALE",
        "smart_code": "HERA.SALON.POS.TXN.SALE.v1",
        "lines": [{ "line_type": "SERVICE", "line_amount": 40, "smart_code": "HERA.SALON.POS.LINE.SERVICE.v1" }]
    });
    let app = mocked_app(&mock_server, AppConfig::default());
    let response = app
        .oneshot(post_json("/api/universal/transactions", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json_value(response).await["error"],
        "posting rules not found for smart code"
    );
}

#[tokio::test]
async fn test_unreachable_database_is_502() {
    // Bind then drop a listener so nothing answers on the port.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let rpc = RpcConfig::local_mock(port, "service-key").unwrap();
    let client = HeraClient::new(rpc).unwrap();
    let app = hera_api::app(AppState::with_config(AppConfig::default(), Some(client)).unwrap());

    let uri = format!("/api/universal/entities?organization_id={ORG}");
    let response = app.oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let err = body_json_value(response).await;
    assert_eq!(err["code"], "UPSTREAM_ERROR");
    assert!(!err["error"].as_str().unwrap().contains("127.0.0.1"));
}

#[tokio::test]
async fn test_entity_not_found_is_404() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/hera_entity_read_v1"))
        .and(body_partial_json(json!({
            "p_organization_id": ORG,
            "p_entity_id": ENTITY,
            "p_include_dynamic": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let app = mocked_app(&mock_server, AppConfig::default());
    let uri = format!("/api/universal/entities/{ENTITY}?organization_id={ORG}");
    let response = app.oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_entity_read_returns_row() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/hera_entity_read_v1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "id": ENTITY, "entity_name": "Jane Doe" }]
        })))
        .mount(&mock_server)
        .await;

    let app = mocked_app(&mock_server, AppConfig::default());
    let uri = format!("/api/v2/entities/{ENTITY}?organization_id={ORG}");
    let response = app.oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json_value(response).await["entity_name"], "Jane Doe");
}

#[tokio::test]
async fn test_entity_list_forwards_filter() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/hera_entity_read_v1"))
        .and(body_json(json!({
            "p_organization_id": ORG,
            "p_entity_id": null,
            "p_entity_type": "PRODUCT",
            "p_include_dynamic": false,
            "p_include_relationships": false,
            "p_limit": 1000,
            "p_offset": 20
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": ENTITY }])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = mocked_app(&mock_server, AppConfig::default());
    let uri = format!(
        "/api/universal/entities?organization_id={ORG}&entity_type=product&limit=5000&offset=20"
    );
    let response = app.oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json_value(response).await, json!([{ "id": ENTITY }]));
}

#[tokio::test]
async fn test_entity_delete_forwards_hard_flag() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/hera_entity_delete_v1"))
        .and(body_json(json!({
            "p_organization_id": ORG,
            "p_entity_id": ENTITY,
            "p_hard_delete": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = mocked_app(&mock_server, AppConfig::default());
    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/api/universal/entities/{ENTITY}?organization_id={ORG}&hard_delete=true"))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_relationship_batch_forwards_rows() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/hera_relationship_upsert_batch_v1"))
        .and(body_json(json!({
            "p_organization_id": ORG,
            "p_rows": [{
                "from_entity_id": ENTITY,
                "to_entity_id": CATEGORY,
                "relationship_type": "HAS_CATEGORY",
                "smart_code": "HERA.SALON.CATALOG.REL.HAS_CATEGORY.v1"
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "upserted": 1 })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let body = json!({
        "organization_id": ORG,
        "relationships": [{
            "from_entity_id": ENTITY,
            "to_entity_id": CATEGORY,
            "relationship_type": "has_category",
            "smart_code": "HERA.SALON.CATALOG.REL.HAS_CATEGORY.v1"
        }]
    });
    let app = mocked_app(&mock_server, AppConfig::default());
    let response = app
        .oneshot(post_json("/api/universal/relationships", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json_value(response).await["upserted"], 1);
}

#[tokio::test]
async fn test_dynamic_data_set_completes_from_entity_type() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/hera_dynamic_data_set_v1"))
        .and(body_json(json!({
            "p_organization_id": ORG,
            "p_entity_id": ENTITY,
            "p_fields": {
                "birthday": {
                    "field_type": "date",
                    "field_value_date": "1990-04-12",
                    "smart_code": "HERA.SALON.CRM.DYN.BIRTHDAY.v1"
                }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let body = json!({
        "organization_id": ORG,
        "entity_id": ENTITY,
        "entity_type": "CUSTOMER",
        "fields": [{ "field_name": "birthday", "field_value": "1990-04-12" }]
    });
    let app = mocked_app(&mock_server, AppConfig::default());
    let response = app
        .oneshot(post_json("/api/universal/dynamic-data", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_transaction_batch_uses_batch_procedure() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/hera_txn_emit_batch_v1"))
        .and(body_partial_json(json!({ "p_organization_id": ORG })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "emitted": 2 })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let txn = json!({
        "transaction_type": "SALE",
        "smart_code": "HERA.SALON.POS.TXN.SALE.v1",
        "lines": [{ "line_type": "SERVICE", "line_amount": 40, "smart_code": "HERA.SALON.POS.LINE.SERVICE.v1" }]
    });
    let body = json!({ "organization_id": ORG, "transactions": [txn.clone(), txn] });
    let app = mocked_app(&mock_server, AppConfig::default());
    let response = app
        .oneshot(post_json("/api/universal/transactions", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json_value(response).await["emitted"], 2);
}

// -- POS ----------------------------------------------------------------------

#[tokio::test]
async fn test_pos_checkout_emits_sale() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/hera_txn_emit_v1"))
        .and(body_partial_json(json!({
            "p_organization_id": ORG,
            "p_transaction": {
                "transaction_type": "SALE",
                "smart_code": "HERA.SALON.POS.TXN.SALE.v1",
                "total_amount": "195"
            }
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": true, "transaction_id": ENTITY })),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let sale = json!({
        "organization_id": ORG,
        "items": [{ "product_id": "p1", "qty": 2, "price": 100 }],
        "discount": 10,
        "tax": 5,
        "paid": 245,
        "payment_method": "cash"
    });
    let app = mocked_app(&mock_server, AppConfig::default());
    let response = app
        .oneshot(post_json("/api/v2/pos/checkout", sale))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json_value(response).await;
    assert_eq!(body["result"]["transaction_id"], ENTITY);
    let lines = body["payload"]["lines"].as_array().unwrap();
    let summary: Vec<(&str, &str)> = lines
        .iter()
        .map(|l| (l["line_type"].as_str().unwrap(), l["line_amount"].as_str().unwrap()))
        .collect();
    assert_eq!(
        summary,
        vec![("PRODUCT", "200"), ("DISCOUNT", "-10"), ("TAX", "5"), ("PAYMENT", "245")]
    );
    assert_eq!(body["payload"]["business_context"]["change_due"], "50");
}

#[tokio::test]
async fn test_pos_empty_basket_is_400() {
    let sale = json!({ "organization_id": ORG, "items": [] });
    let response = test_app()
        .oneshot(post_json("/api/v2/pos/checkout", sale))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_pos_amount_overflow_is_400() {
    let sale = json!({
        "organization_id": ORG,
        "items": [{ "product_id": "p1", "qty": "79228162514264337593543950335", "price": "2" }]
    });
    let response = test_app()
        .oneshot(post_json("/api/v2/pos/checkout", sale))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let err = body_json_value(response).await;
    assert_eq!(err["code"], "VALIDATION_ERROR");
    assert_eq!(err["error"], "items[0] qty * price overflows the supported amount range");
}

#[tokio::test]
async fn test_transaction_line_number_overflow_is_400() {
    let body = json!({
        "organization_id": ORG,
        "transaction_type": "SALE",
        "smart_code": "HERA.SALON.POS.TXN.SALE.v1",
        "lines": [
            { "line_number": 4294967295u32, "line_type": "SERVICE", "line_amount": 40, "smart_code": "HERA.SALON.POS.LINE.SERVICE.v1" },
            { "line_type": "TAX", "line_amount": 2, "smart_code": "HERA.SALON.POS.LINE.TAX.v1" }
        ]
    });
    let response = test_app()
        .oneshot(post_json("/api/universal/transactions", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let err = body_json_value(response).await;
    assert!(err["error"].as_str().unwrap().starts_with("lines[1].line_number"));
}

#[tokio::test]
async fn test_pos_is_v2_only() {
    let sale = json!({ "organization_id": ORG, "items": [] });
    let response = test_app()
        .oneshot(post_json("/api/universal/pos/checkout", sale))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// -- Catalogs -----------------------------------------------------------------

#[tokio::test]
async fn test_list_presets() {
    let response = test_app().oneshot(get("/api/v2/presets")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json_value(response).await;
    let types: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["entity_type"].as_str().unwrap())
        .collect();
    let mut sorted = types.clone();
    sorted.sort_unstable();
    assert_eq!(types, sorted);
    assert!(types.contains(&"CUSTOMER"));
}

#[tokio::test]
async fn test_get_preset_case_insensitive_and_404() {
    let app = test_app();
    let response = app.clone().oneshot(get("/api/v2/presets/service")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let preset = body_json_value(response).await;
    assert_eq!(preset["entity_type"], "SERVICE");
    // Mixin fields are resolved at load time.
    let names: Vec<&str> = preset["dynamic_fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"price"));

    let response = app.oneshot(get("/api/v2/presets/spaceship")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_navigation_filtered_by_role() {
    let app = test_app_with_auth("s3cret");
    let request = Request::builder()
        .uri("/api/v2/navigation")
        .header("authorization", "Bearer receptionist::s3cret")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json_value(response).await;
    let ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["dashboard", "appointments", "pos", "customers", "settings"]);
    let settings_children = body[4]["children"].as_array().unwrap();
    assert_eq!(settings_children.len(), 1);
    assert_eq!(settings_children[0]["id"], "profile");
}

#[tokio::test]
async fn test_navigation_admin_sees_everything() {
    let response = test_app().oneshot(get("/api/v2/navigation")).await.unwrap();
    let body = body_json_value(response).await;
    let ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["id"].as_str().unwrap())
        .collect();
    assert!(ids.contains(&"finance"));
    assert!(ids.contains(&"catalog"));
}

#[tokio::test]
async fn test_smart_code_validate_endpoint() {
    let app = test_app();
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/v2/smart-codes/validate",
            json!({ "smart_code": "HERA.SALON.SALE.TXN.RETAIL.v1" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let verdict = body_json_value(response).await;
    assert_eq!(verdict["valid"], true);
    assert_eq!(verdict["domain"], "SALON");

    let response = app
        .oneshot(post_json(
            "/api/v2/smart-codes/validate",
            json!({ "smart_code": "HERA.SALON.v1" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let verdict = body_json_value(response).await;
    assert_eq!(verdict["valid"], false);
    assert!(verdict["reason"].is_string());
}

// -- Metrics & OpenAPI --------------------------------------------------------

#[tokio::test]
async fn test_metrics_count_requests_and_rpc_outcomes() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/hera_entity_upsert_v1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .mount(&mock_server)
        .await;

    let app = mocked_app(&mock_server, AppConfig::default());
    let response = app
        .clone()
        .oneshot(post_json("/api/universal/entities", customer_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let text = body_string(response).await;
    assert!(text.contains(r#"hera_http_requests_total{method="POST",status="200"} 1"#));
    assert!(text.contains(
        r#"hera_rpc_calls_total{function="hera_entity_upsert_v1",outcome="ok"} 1"#
    ));
}

#[tokio::test]
async fn test_metrics_disabled_hides_endpoint() {
    let config = AppConfig {
        metrics_enabled: false,
        ..AppConfig::default()
    };
    let app = hera_api::app(AppState::with_config(config, None).unwrap());
    let response = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_openapi_document_served() {
    let response = test_app().oneshot(get("/openapi.json")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let doc = body_json_value(response).await;
    assert!(doc["paths"]["/api/universal/entities"].is_object());
    assert!(doc["paths"]["/api/v2/navigation"].is_object());
}

// -- Catalog files ------------------------------------------------------------

#[tokio::test]
async fn test_presets_loaded_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("presets.yaml");
    std::fs::write(
        &file,
        r#"
presets:
  - entity_type: vehicle
    label: Vehicle
    smart_code: HERA.FLEET.ASSET.ENTITY.VEHICLE.v1
    dynamic_fields:
      - name: plate
        field_type: text
        smart_code: HERA.FLEET.ASSET.DYN.PLATE.v1
        required: true
"#,
    )
    .unwrap();

    let config = AppConfig {
        presets_path: Some(file),
        ..AppConfig::default()
    };
    let app = hera_api::app(AppState::with_config(config, None).unwrap());
    let response = app.clone().oneshot(get("/api/v2/presets/VEHICLE")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let response = app.oneshot(get("/api/v2/presets/CUSTOMER")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
