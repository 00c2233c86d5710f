mod common;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use common::{FakePeople, Harness, catalog, harness};
use http_body_util::BodyExt;
use prospectr::clients::RunOperation;
use prospectr::domain::CampaignKey;
use serde_json::{Value, json};
use tower::ServiceExt;

const ORG_HEADER: &str = "x-organization-id";

async fn spawn_app(people: FakePeople) -> (Router, Harness) {
    let h = harness(people).await;
    let state = prospectr::api::create_app_state(h.shared.clone(), None);
    let app = prospectr::api::router(state).await;
    (app, h)
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .header(ORG_HEADER, "org_1")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    read(response).await
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(uri)
                .header(ORG_HEADER, "org_1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    read(response).await
}

async fn read(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn fetch_body(search_params: Option<Value>) -> Value {
    let mut body = json!({
        "campaignId": "camp_1",
        "appId": "app_1",
        "brandId": "brand_1",
        "runId": "parent_run",
    });
    if let Some(params) = search_params {
        body["searchParams"] = params;
    }
    body
}

#[tokio::test]
async fn test_health_endpoints() {
    let (app, _h) = spawn_app(FakePeople::default()).await;

    let (status, body) = get(&app, "/api/system/health/live").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "alive");

    let (status, body) = get(&app, "/api/system/health/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["ready"], true);
    assert_eq!(body["data"]["checks"]["database"], true);
}

#[tokio::test]
async fn test_missing_organization_header_is_unauthorized() {
    let (app, _h) = spawn_app(FakePeople::default()).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/people/next")
                .header("content-type", "application/json")
                .body(Body::from(fetch_body(None).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_fetch_next_pages_through_results() {
    let (app, _h) = spawn_app(FakePeople::with_catalog(catalog(30))).await;

    let (status, body) = post_json(
        &app,
        "/api/people/next",
        fetch_body(Some(json!({"person_titles": ["CTO"]}))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["people"].as_array().unwrap().len(), 25);
    assert_eq!(body["data"]["done"], false);
    assert_eq!(body["data"]["totalEntries"], 30);
    assert_eq!(body["data"]["people"][0]["organization"]["primary_domain"], "company1.com");

    let (status, body) = post_json(&app, "/api/people/next", fetch_body(None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["people"].as_array().unwrap().len(), 5);
    assert_eq!(body["data"]["done"], true);

    let (status, body) = get(&app, "/api/people/cursor/camp_1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["currentPage"], 3);
    assert_eq!(body["data"]["exhausted"], true);
    assert_eq!(body["data"]["filters"], json!({"person_titles": ["CTO"]}));
}

#[tokio::test]
async fn test_fetch_next_without_cursor_returns_no_cursor_code() {
    let (app, h) = spawn_app(FakePeople::with_catalog(catalog(5))).await;

    let (status, body) = post_json(&app, "/api/people/next", fetch_body(None)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "NO_CURSOR");
    assert_eq!(h.people.upstream_calls(), 0);
    assert!(h.runs.events().is_empty());
}

#[tokio::test]
async fn test_fetch_next_validation_errors() {
    let (app, h) = spawn_app(FakePeople::with_catalog(catalog(5))).await;

    let (status, body) = post_json(
        &app,
        "/api/people/next",
        json!({"campaignId": "camp_1", "appId": "app_1"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let details: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert_eq!(details, vec!["brandId is required", "runId is required"]);

    let (status, _) = post_json(
        &app,
        "/api/people/next",
        fetch_body(Some(json!({"person_titles": ["CTO"], "page": 4}))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/people/next")
                .header("content-type", "application/json")
                .header(ORG_HEADER, "org_1")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(h.people.upstream_calls(), 0);
}

#[tokio::test]
async fn test_provider_key_missing() {
    let (app, h) = spawn_app(FakePeople::with_catalog(catalog(5))).await;
    *h.keys.missing.lock().unwrap() = true;

    let (status, body) = post_json(
        &app,
        "/api/people/next",
        fetch_body(Some(json!({"person_titles": ["CTO"]}))),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "PROVIDER_KEY_MISSING");
}

#[tokio::test]
async fn test_upstream_failure_is_bad_gateway_with_status() {
    let (app, h) = spawn_app(FakePeople::with_catalog(catalog(5))).await;
    *h.people.fail_status.lock().unwrap() = Some(422);

    let (status, body) = post_json(
        &app,
        "/api/people/next",
        fetch_body(Some(json!({"person_titles": ["CTO"]}))),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "UPSTREAM_ERROR");
    assert!(body["error"].as_str().unwrap().contains("status 422"));
}

#[tokio::test]
async fn test_cost_tracking_failure_is_bad_gateway() {
    let (app, h) = spawn_app(FakePeople::with_catalog(catalog(5))).await;
    *h.runs.fail_on.lock().unwrap() = Some(RunOperation::Create);

    let (status, body) = post_json(
        &app,
        "/api/people/next",
        fetch_body(Some(json!({"person_titles": ["CTO"]}))),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "COST_TRACKING_FAILED");
    assert!(body["error"].as_str().unwrap().contains("creating run"));
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn test_concurrent_cursor_advance_is_a_conflict() {
    let (app, h) = spawn_app(FakePeople::with_catalog(catalog(60))).await;
    *h.people.race_cursor.lock().unwrap() =
        Some((h.store.clone(), CampaignKey::new("org_1", "camp_1")));

    let (status, body) = post_json(
        &app,
        "/api/people/next",
        fetch_body(Some(json!({"person_titles": ["CTO"]}))),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CURSOR_CONFLICT");
    assert_eq!(h.runs.cost_lines().len(), 1);
}

#[tokio::test]
async fn test_enrich_and_read_back() {
    let (app, _h) = spawn_app(FakePeople::with_catalog(catalog(2))).await;

    let (status, body) = post_json(
        &app,
        "/api/enrichments/enrich",
        json!({
            "externalPersonId": "p1",
            "appId": "app_1",
            "brandId": "brand_1",
            "runId": "parent_run",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["cached"], false);
    assert_eq!(body["data"]["person"]["email"], "person1@example.com");
    let id = body["data"]["enrichmentId"].as_str().unwrap().to_string();

    let (status, body) = get(&app, &format!("/api/enrichments/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["externalPersonId"], "p1");
    assert_eq!(body["data"]["enrichmentRunId"], "run_1");
    assert_eq!(body["data"]["person"]["organization"]["name"], "Company 1");

    let (status, _) = get(&app, "/api/enrichments/does-not-exist").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_match_requires_all_fields() {
    let (app, h) = spawn_app(FakePeople::with_catalog(catalog(2))).await;

    let (status, body) = post_json(
        &app,
        "/api/enrichments/match",
        json!({
            "firstName": "First1",
            "appId": "app_1",
            "brandId": "brand_1",
            "runId": "parent_run",
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["details"],
        json!(["lastName is required", "organizationDomain is required"])
    );
    assert_eq!(h.people.upstream_calls(), 0);
}

#[tokio::test]
async fn test_bulk_match_over_limit_is_rejected() {
    let (app, h) = spawn_app(FakePeople::default()).await;
    let items: Vec<Value> = (0..11)
        .map(|i| json!({"firstName": format!("F{i}"), "lastName": "L", "organizationDomain": "d.com"}))
        .collect();

    let (status, _) = post_json(
        &app,
        "/api/enrichments/bulk-match",
        json!({
            "items": items,
            "appId": "app_1",
            "brandId": "brand_1",
            "runId": "parent_run",
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(h.people.upstream_calls(), 0);
}

#[tokio::test]
async fn test_bulk_match_returns_positional_results() {
    let (app, _h) = spawn_app(FakePeople::with_catalog(catalog(2))).await;

    let (status, body) = post_json(
        &app,
        "/api/enrichments/bulk-match",
        json!({
            "items": [
                {"firstName": "First2", "lastName": "Last2", "organizationDomain": "company2.com"},
                {"firstName": "No", "lastName": "One", "organizationDomain": "none.com"},
                {"firstName": "First1", "lastName": "Last1", "organizationDomain": "company1.com"},
            ],
            "appId": "app_1",
            "brandId": "brand_1",
            "runId": "parent_run",
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 3);
    assert_eq!(data[0]["person"]["id"], "p2");
    assert!(data[1]["person"].is_null());
    assert!(data[1]["enrichmentId"].is_null());
    assert_eq!(data[2]["person"]["id"], "p1");
}

#[tokio::test]
async fn test_metrics_disabled_returns_not_found() {
    let (app, _h) = spawn_app(FakePeople::default()).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
