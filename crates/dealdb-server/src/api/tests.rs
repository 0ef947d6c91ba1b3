use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::Request;
use dealdb_catalog::{CatalogStore, RefreshCoordinator};
use dealdb_core::UpstreamSource;
use dealdb_scraper::UpstreamClient;
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;

fn app_for(sources: Vec<UpstreamSource>) -> Router {
    let client = UpstreamClient::new(2, 2, "dealdb-test/0.1").expect("client");
    let coordinator = Arc::new(RefreshCoordinator::new(
        client,
        sources,
        Arc::new(CatalogStore::new()),
    ));
    let catalog = CatalogService::new(coordinator, Duration::from_secs(4 * 60 * 60));
    build_app(AppState { catalog })
}

async fn two_retailer_server() -> (MockServer, Vec<UpstreamSource>) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/coles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "itemName": "Toothbrush", "retailer": "Coles",
            "productLink": "www.coles.com.au", "imageLink": "www.coles.com.au",
            "currentPrice": "7.50", "rrp": "10.00",
            "discountAmount": "2.50", "discountPercentage": "0.25"
        }])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/woolworths"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "itemName": "Toothbrush", "retailer": "Woolworths",
                "productLink": "www.woolworths.com.au", "imageLink": "www.woolworths.com.au",
                "currentPrice": "6.00", "rrp": "10.00",
                "discountAmount": "4.00", "discountPercentage": "0.40"
            },
            {
                "itemName": "Mouthwash", "retailer": "Woolworths",
                "productLink": "www.woolworths.com.au", "imageLink": "www.woolworths.com.au",
                "currentPrice": "8.50", "rrp": "10.00",
                "discountAmount": "1.50", "discountPercentage": "0.15"
            }
        ])))
        .mount(&server)
        .await;
    let sources = vec![
        UpstreamSource::new("coles", format!("{}/coles", server.uri())),
        UpstreamSource::new("woolworths", format!("{}/woolworths", server.uri())),
    ];
    (server, sources)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    serde_json::from_slice(&body).expect("json parse")
}

fn post_refresh(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/refresh")
        .header("content-type", "application/json")
        .body(Body::from(body.to_owned()))
        .expect("request")
}

#[test]
fn api_error_forbidden_maps_to_403() {
    let response = ApiError::new("req-1", "forbidden", "nope").into_response();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn products_is_never_throttled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    let app = app_for(vec![UpstreamSource::new(
        "coles",
        format!("{}/coles", server.uri()),
    )]);

    for _ in 0..150 {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/products")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[test]
fn api_error_unknown_code_maps_to_500() {
    let response = ApiError::new("req-1", "boom", "unexpected").into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn products_refreshes_stale_catalog_and_sorts_by_lowest_price() {
    let (_server, sources) = two_retailer_server().await;
    let app = app_for(sources);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/products?sort=lowest-price")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let rows = json["data"].as_array().expect("data array");
    let got: Vec<(&str, &str, &str)> = rows
        .iter()
        .map(|r| {
            (
                r["itemName"].as_str().unwrap_or_default(),
                r["retailer"].as_str().unwrap_or_default(),
                r["currentPrice"].as_str().unwrap_or_default(),
            )
        })
        .collect();
    assert_eq!(
        got,
        [("Toothbrush", "Coles", "7.50"), ("Mouthwash", "Woolworths", "8.50")]
    );
    assert!(json["meta"]["request_id"].is_string());
}

#[tokio::test]
async fn products_defaults_to_highest_percentage_for_unknown_sort() {
    let (_server, sources) = two_retailer_server().await;
    let app = app_for(sources);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/products?sort=cheapest-first")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    let json = body_json(response).await;
    let names: Vec<&str> = json["data"]
        .as_array()
        .expect("data array")
        .iter()
        .filter_map(|r| r["itemName"].as_str())
        .collect();
    assert_eq!(names, ["Toothbrush", "Mouthwash"]);
}

#[tokio::test]
async fn products_returns_empty_list_when_every_source_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let app = app_for(vec![
        UpstreamSource::new("a", format!("{}/a", server.uri())),
        UpstreamSource::new("b", format!("{}/b", server.uri())),
        UpstreamSource::new("c", format!("{}/c", server.uri())),
    ]);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/products")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"], json!([]));
}

#[tokio::test]
async fn refresh_with_true_runs_a_cycle() {
    let (_server, sources) = two_retailer_server().await;
    let app = app_for(sources);

    let response = app
        .oneshot(post_refresh(r#"{"refresh": "true"}"#))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["message"], "Successfully Refreshed Products");
    assert_eq!(json["data"]["report"]["succeeded"], 2);
    assert_eq!(json["data"]["report"]["products"], 2);
    assert_eq!(json["data"]["report"]["outcomes"][0]["status"], "fetched");
}

#[tokio::test]
async fn refresh_accepts_boolean_true() {
    let (_server, sources) = two_retailer_server().await;
    let response = app_for(sources)
        .oneshot(post_refresh(r#"{"refresh": true}"#))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::ACCEPTED);
}

#[tokio::test]
async fn refresh_with_other_value_is_forbidden_and_fetches_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;
    let app = app_for(vec![UpstreamSource::new(
        "coles",
        format!("{}/coles", server.uri()),
    )]);

    let response = app
        .oneshot(post_refresh(r#"{"refresh": "yes please"}"#))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "forbidden");
}

#[tokio::test]
async fn refresh_with_malformed_body_is_bad_request() {
    let (_server, sources) = two_retailer_server().await;
    let response = app_for(sources)
        .oneshot(post_refresh("{not json"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_reports_without_refreshing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;
    let app = app_for(vec![UpstreamSource::new(
        "coles",
        format!("{}/coles", server.uri()),
    )]);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "ok");
    assert_eq!(json["data"]["products"], 0);
    assert_eq!(json["data"]["sources"], 1);
    assert!(json["data"]["last_updated"].is_null());
}

#[tokio::test]
async fn cors_preflight_allows_any_origin() {
    let (_server, sources) = two_retailer_server().await;
    let response = app_for(sources)
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/products")
                .header("origin", "https://deals.example.com")
                .header("access-control-request-method", "GET")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}
