//! Server API tests

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use spendscan_core::extract::{AMOUNT_HEADER, DATE_HEADER, MERCHANT_HEADER};
use std::collections::HashMap;
use std::str::FromStr;
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "spendscan-test-boundary";

fn test_categories() -> CategoryConfig {
    let mut mapping = HashMap::new();
    mapping.insert("Cafe X".to_string(), "Food".to_string());
    CategoryConfig::new(
        vec!["Food".to_string(), "Travel".to_string()],
        mapping,
    )
}

fn setup_test_app() -> (Router, Database) {
    let db = Database::in_memory().unwrap();
    let app = create_router(db.clone(), test_categories(), None, ServerConfig::default());
    (app, db)
}

fn setup_scan_app(scan_dir: &std::path::Path) -> (Router, Database) {
    let db = Database::in_memory().unwrap();
    let config = ServerConfig {
        scan_dir: scan_dir.to_path_buf(),
        ..Default::default()
    };
    let app = create_router(db.clone(), test_categories(), None, config);
    (app, db)
}

async fn get_body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn entry(date: &str, merchant: &str, amount: &str) -> String {
    format!(
        r#"<section class="cc-table-entry">
            <div data-header="{}"><span>{}</span></div>
            <div data-header="{}"><span>{}</span></div>
            <div data-header="{}"><div class="ts-num"><span class="ng-star-inserted">{}</span></div></div>
        </section>"#,
        DATE_HEADER, date, MERCHANT_HEADER, merchant, AMOUNT_HEADER, amount
    )
}

fn statement(entries: &[String]) -> String {
    format!("<html><body>{}</body></html>", entries.concat())
}

fn multipart_body(filename: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
            filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: text/html\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn upload_request(filename: &str, content: &[u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(filename, content)))
        .unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn as_decimal(value: &serde_json::Value) -> Decimal {
    Decimal::from_str(value.as_str().unwrap()).unwrap()
}

// ========== Upload Tests ==========

#[tokio::test]
async fn test_upload_document() {
    let (app, db) = setup_test_app();
    let html = statement(&[
        entry("28/02/25", "Cafe X", "39.46"),
        entry("28/02/25", "Cafe X", "39.46"),
        entry("01/03/25", "Airline", "1,200.00"),
    ]);

    let response = app
        .oneshot(upload_request("feb.html", html.as_bytes()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["document"], "feb.html");
    assert_eq!(json["records_added"], 2);
    assert_eq!(json["duplicates_in_document"], 1);
    assert_eq!(json["message"], "Processed 1 files, added 2 transactions.");

    let cafe = db.get_merchant_by_name("Cafe X").unwrap().unwrap();
    assert_eq!(cafe.category, "Food");
}

#[tokio::test]
async fn test_upload_same_name_twice_conflicts() {
    let (app, db) = setup_test_app();
    let html = statement(&[entry("28/02/25", "Cafe X", "39.46")]);

    let response = app
        .clone()
        .oneshot(upload_request("feb.html", html.as_bytes()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(upload_request("feb.html", html.as_bytes()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = get_body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("feb.html"));

    assert_eq!(db.count_transactions().unwrap(), 1);
}

#[tokio::test]
async fn test_upload_strips_directories_from_name() {
    let (app, db) = setup_test_app();
    let html = statement(&[entry("28/02/25", "Cafe X", "39.46")]);

    let response = app
        .oneshot(upload_request("exports/march.html", html.as_bytes()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(db.is_document_processed("march.html").unwrap());
}

#[tokio::test]
async fn test_upload_rejects_non_utf8() {
    let (app, db) = setup_test_app();

    let response = app
        .oneshot(upload_request("broken.html", &[0xff, 0xfe, 0x00, 0xc3]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(!db.is_document_processed("broken.html").unwrap());
}

#[tokio::test]
async fn test_upload_drops_out_of_range_amounts() {
    let (app, db) = setup_test_app();
    let huge = "50,000,000,000,000,000,000,000,000,000";
    let html = statement(&[
        entry("01/01/25", "Shop", huge),
        entry("02/01/25", "Shop", huge),
    ]);

    let response = app
        .clone()
        .oneshot(upload_request("huge.html", html.as_bytes()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["invalid_records"], 2);
    assert_eq!(json["records_added"], 0);
    assert_eq!(db.count_transactions().unwrap(), 0);

    let response = app.oneshot(get("/api/dashboard")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_upload_without_file_field() {
    let (app, _db) = setup_test_app();
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhello\r\n--{b}--\r\n",
        b = BOUNDARY
    );

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/upload")
                .header(
                    "content-type",
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert_eq!(json["error"], "Missing file field");
}

// ========== Scan Tests ==========

#[tokio::test]
async fn test_scan_folder() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("a.html"),
        statement(&[entry("28/02/25", "Cafe X", "39.46")]),
    )
    .unwrap();
    std::fs::write(
        dir.path().join("b.html"),
        statement(&[
            entry("28/02/25", "Cafe X", "39.46"),
            entry("02/03/25", "Bakery", "12"),
        ]),
    )
    .unwrap();
    let (app, db) = setup_scan_app(dir.path());

    let response = app.clone().oneshot(post_json("/api/scan", serde_json::json!({}))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["documents_processed"], 2);
    assert_eq!(json["records_added"], 2);
    assert_eq!(json["duplicates_existing"], 1);
    assert_eq!(json["message"], "Processed 2 files, added 2 transactions.");

    // Nothing new on the second scan
    let response = app.oneshot(post_json("/api/scan", serde_json::json!({}))).await.unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["documents_processed"], 0);
    assert_eq!(json["documents_skipped"], 2);
    assert_eq!(json["message"], "Processed 0 files, added 0 transactions.");

    assert_eq!(db.count_transactions().unwrap(), 2);
}

#[tokio::test]
async fn test_scan_missing_folder() {
    let dir = TempDir::new().unwrap();
    let (app, _db) = setup_scan_app(&dir.path().join("excel_files"));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/scan")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = get_body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("excel_files"));
}

#[tokio::test]
async fn test_list_documents() {
    let (app, _db) = setup_test_app();
    let html = statement(&[entry("28/02/25", "Cafe X", "39.46")]);

    app.clone()
        .oneshot(upload_request("feb.html", html.as_bytes()))
        .await
        .unwrap();

    let response = app.oneshot(get("/api/documents")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    let docs = json.as_array().unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0]["name"], "feb.html");
    assert_eq!(docs[0]["records_added"], 1);
}

// ========== Transaction Tests ==========

#[tokio::test]
async fn test_create_transaction() {
    let (app, db) = setup_test_app();

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/transactions",
            serde_json::json!({
                "date": "2025-02-28",
                "merchant": "  Cafe X ",
                "amount": "39.46"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = get_body_json(response).await;
    assert_eq!(json["merchant"], "Cafe X");
    assert_eq!(json["date"], "2025-02-28");
    assert!(json["id"].as_i64().is_some());

    // Aggregates are refreshed right away
    let cafe = db.get_merchant_by_name("Cafe X").unwrap().unwrap();
    assert_eq!(cafe.total_amount, Decimal::from_str("39.46").unwrap());

    // Same natural key with a different text form is a duplicate
    let response = app
        .oneshot(post_json(
            "/api/transactions",
            serde_json::json!({
                "date": "28/02/25",
                "merchant": "Cafe X",
                "amount": "39.460"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(db.count_transactions().unwrap(), 1);
}

#[tokio::test]
async fn test_create_transaction_validation() {
    let (app, _db) = setup_test_app();

    for body in [
        serde_json::json!({"date": "yesterday", "merchant": "Shop", "amount": "1"}),
        serde_json::json!({"date": "2025-01-01", "merchant": "Shop", "amount": "lots"}),
        serde_json::json!({"date": "2025-01-01", "merchant": "   ", "amount": "1"}),
    ] {
        let response = app
            .clone()
            .oneshot(post_json("/api/transactions", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_list_transactions_pagination() {
    let (app, _db) = setup_test_app();
    let html = statement(&[
        entry("01/01/25", "A", "1"),
        entry("02/01/25", "B", "2"),
        entry("03/01/25", "C", "3"),
    ]);
    app.clone()
        .oneshot(upload_request("jan.html", html.as_bytes()))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(get("/api/transactions?limit=2&offset=0"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["total"], 3);
    let txs = json["transactions"].as_array().unwrap();
    assert_eq!(txs.len(), 2);
    assert_eq!(txs[0]["merchant"], "C");
    assert_eq!(txs[0]["source_document"], "jan.html");

    // Limits are clamped
    let response = app
        .oneshot(get("/api/transactions?limit=100000&offset=-5"))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["limit"], 1000);
    assert_eq!(json["offset"], 0);
}

// ========== Merchant Tests ==========

#[tokio::test]
async fn test_merchant_category_override() {
    let (app, db) = setup_test_app();
    let html = statement(&[entry("28/02/25", "Cafe X", "39.46")]);
    app.clone()
        .oneshot(upload_request("feb.html", html.as_bytes()))
        .await
        .unwrap();
    let cafe = db.get_merchant_by_name("Cafe X").unwrap().unwrap();

    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/merchants/{}", cafe.id),
            serde_json::json!({"category": "Travel"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["category"], "Travel");
    assert_eq!(json["category_source"], "user");

    // Override survives a recompute
    let response = app
        .clone()
        .oneshot(post_json("/api/aggregates/recompute", serde_json::json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get(&format!("/api/merchants/{}", cafe.id)))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["category"], "Travel");

    // Reset goes back to the default mapping
    let response = app
        .oneshot(post_json(
            &format!("/api/merchants/{}/reset", cafe.id),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["category"], "Food");
    assert_eq!(json["category_source"], "default");
}

#[tokio::test]
async fn test_merchant_category_errors() {
    let (app, db) = setup_test_app();
    let html = statement(&[entry("28/02/25", "Cafe X", "39.46")]);
    app.clone()
        .oneshot(upload_request("feb.html", html.as_bytes()))
        .await
        .unwrap();
    let cafe = db.get_merchant_by_name("Cafe X").unwrap().unwrap();

    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/merchants/{}", cafe.id),
            serde_json::json!({"category": "Groceries"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/merchants/9999",
            serde_json::json!({"category": "Food"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.oneshot(get("/api/merchants/9999")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ========== Dashboard Tests ==========

#[tokio::test]
async fn test_pie_data_and_dashboard() {
    let (app, _db) = setup_test_app();
    let html = statement(&[
        entry("01/02/25", "Cafe X", "39.46"),
        entry("02/02/25", "Cafe X", "10.04"),
        entry("03/02/25", "Garage", "250"),
    ]);
    app.clone()
        .oneshot(upload_request("feb.html", html.as_bytes()))
        .await
        .unwrap();

    let response = app.clone().oneshot(get("/api/pie_data")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(as_decimal(&json["Food"]), Decimal::from_str("49.5").unwrap());
    assert_eq!(
        as_decimal(&json["Uncategorized"]),
        Decimal::from_str("250").unwrap()
    );

    let response = app.oneshot(get("/api/dashboard")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["total_transactions"], 3);
    assert_eq!(json["recent_transactions"].as_array().unwrap().len(), 3);
    assert_eq!(json["merchants"].as_array().unwrap().len(), 2);
    assert!(json["categories"]
        .as_array()
        .unwrap()
        .iter()
        .any(|c| c == "Uncategorized"));
}

#[tokio::test]
async fn test_list_categories() {
    let (app, _db) = setup_test_app();

    let response = app.oneshot(get("/api/categories")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    let categories: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c.as_str().unwrap())
        .collect();
    assert!(categories.contains(&"Food"));
    assert!(categories.contains(&"Travel"));
    assert!(categories.contains(&"Uncategorized"));
}

// ========== Security Header Tests ==========

#[tokio::test]
async fn test_security_headers_present() {
    let (app, _db) = setup_test_app();

    let response = app.oneshot(get("/api/categories")).await.unwrap();
    let headers = response.headers();
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
    assert!(headers.get("content-security-policy").is_some());
}

#[tokio::test]
async fn test_static_fallback() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>SpendScan</h1>").unwrap();
    let db = Database::in_memory().unwrap();
    let app = create_router(
        db,
        test_categories(),
        dir.path().to_str(),
        ServerConfig::default(),
    );

    let response = app.oneshot(get("/index.html")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"<h1>SpendScan</h1>");
}
