//! End-to-end flows through the HTTP router.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body, Bytes};
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use reqwest::Client;
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::analytics::Analytics;
use crate::api::{self, VISITOR_COOKIE};
use crate::config::Config;
use crate::demo;
use crate::payment;
use crate::report::rasterizer::PrintFallback;
use crate::report::template::TemplateStore;
use crate::report::ReportGenerator;
use crate::site::SiteController;

// ─────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────

fn app_with(config: Config) -> Router {
    let reports = ReportGenerator::new(TemplateStore::builtin(), Arc::new(PrintFallback));
    let analytics = Analytics::new(Client::new(), None);
    let site = SiteController::new(config, reports, analytics).unwrap();
    api::router(Arc::new(site))
}

fn app() -> Router {
    app_with(Config {
        sample_report_path: PathBuf::from("does/not/exist/sample"),
        ..Config::default()
    })
}

/// One browser tab: keeps the visitor cookie the site hands out.
struct Browser {
    app: Router,
    cookie: Option<String>,
}

impl Browser {
    fn new(app: &Router) -> Self {
        Browser {
            app: app.clone(),
            cookie: None,
        }
    }

    async fn send(&mut self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, HeaderMap, Bytes) {
        let body = match body {
            Some(v) => Body::from(v.to_string()),
            None => Body::empty(),
        };
        let mut req = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = &self.cookie {
            req = req.header(header::COOKIE, cookie.as_str());
        }

        let resp = self.app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        if let Some(set) = headers.get(header::SET_COOKIE) {
            let pair = set.to_str().unwrap().split(';').next().unwrap();
            assert!(pair.starts_with(VISITOR_COOKIE));
            self.cookie = Some(pair.to_string());
        }
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, headers, bytes)
    }

    async fn post_json(&mut self, uri: &str, body: Value) -> (StatusCode, Value) {
        let (status, _, bytes) = self.send(Method::POST, uri, Some(body)).await;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn get_json(&mut self, uri: &str) -> Value {
        let (status, _, bytes) = self.send(Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::OK);
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn open_page(&mut self) -> String {
        let (status, _, bytes) = self.send(Method::GET, "/", None).await;
        assert_eq!(status, StatusCode::OK);
        String::from_utf8(bytes.to_vec()).unwrap()
    }
}

fn valid_hash() -> String {
    "ab".repeat(32)
}

// ─────────────────────────────────────────────────────────
// Plans
// ─────────────────────────────────────────────────────────

#[tokio::test]
async fn selecting_monthly_updates_summary_and_single_active_card() {
    let mut tab = Browser::new(&app());
    tab.open_page().await;

    let (status, body) = tab.post_json("/plans/select", json!({ "frequency": "monthly" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["frequency"], "monthly");
    assert_eq!(body["label"], "Monthly Strategic");
    assert_eq!(body["price"], 999);
    assert_eq!(body["notification"]["severity"], "success");

    let plans = tab.get_json("/plans").await;
    assert_eq!(plans["selected"]["price"], 999);
    let active: Vec<&Value> = plans["plans"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|p| p["active"] == true)
        .collect();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0]["frequency"], "monthly");
}

#[tokio::test]
async fn unknown_frequency_is_ignored() {
    let mut tab = Browser::new(&app());
    tab.open_page().await;

    let (status, body) = tab.post_json("/plans/select", json!({ "frequency": "yearly" })).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let plans = tab.get_json("/plans").await;
    assert_eq!(plans["selected"]["frequency"], "biweekly");
    assert_eq!(tab.get_json("/notifications/current").await, Value::Null);
}

#[tokio::test]
async fn landing_page_sets_visitor_cookie() {
    let app = app();
    let mut tab = Browser::new(&app);

    let (status, headers, bytes) = tab.send(Method::GET, "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/html"));
    let set_cookie = headers[header::SET_COOKIE].to_str().unwrap();
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("Path=/"));

    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert_eq!(html.matches("freq-option active").count(), 1);
    assert!(html.contains(r#"data-freq="biweekly" data-price="349""#));
    assert!(html.contains(crate::config::DEFAULT_USDT_ADDRESS));
}

#[tokio::test]
async fn reload_resets_selection_and_toast() {
    let mut tab = Browser::new(&app());
    tab.open_page().await;
    tab.post_json("/plans/select", json!({ "frequency": "weekly" })).await;
    assert_eq!(tab.get_json("/plans").await["selected"]["frequency"], "weekly");

    let html = tab.open_page().await;
    assert!(html.contains(r#"<strong id="selected-frequency">Twice a Month</strong>"#));
    assert_eq!(tab.get_json("/plans").await["selected"]["frequency"], "biweekly");
    assert_eq!(tab.get_json("/notifications/current").await, Value::Null);
}

#[tokio::test(start_paused = true)]
async fn visitors_keep_their_own_plan_and_notifications() {
    let app = app();
    let mut alice = Browser::new(&app);
    let mut bob = Browser::new(&app);
    alice.open_page().await;
    bob.open_page().await;
    assert_ne!(alice.cookie, bob.cookie);

    alice.post_json("/plans/select", json!({ "frequency": "monthly" })).await;
    bob.post_json("/plans/select", json!({ "frequency": "daily" })).await;

    let (_, body) = alice
        .post_json(
            "/payment/confirm",
            json!({ "tx_hash": valid_hash(), "email": "alice@private.io" }),
        )
        .await;
    assert_eq!(body["outcome"], "confirmed");
    assert_eq!(body["submission"]["frequency"], "monthly");
    assert_eq!(body["submission"]["price"], 999);

    let bob_before = bob.get_json("/notifications/current").await;
    assert_eq!(bob_before["message"], "Daily Updates plan selected: 1999 USDT");

    alice
        .post_json(
            "/demo/request",
            json!({ "company": "Alice Co", "email": "alice@private.io" }),
        )
        .await;
    tokio::time::sleep(Duration::from_millis(2100)).await;

    let delivered = alice.get_json("/notifications/current").await;
    assert_eq!(
        delivered["message"],
        "Demo report sent to alice@private.io! Check your inbox."
    );

    let bob_now = bob.get_json("/notifications/current").await;
    assert_ne!(bob_now["message"], delivered["message"]);
    assert!(!bob_now.to_string().contains("alice@private.io"));
    assert_eq!(bob.get_json("/plans").await["selected"]["price"], 1999);
}

#[tokio::test]
async fn request_without_cookie_gets_its_own_visitor() {
    let app = app();
    let mut tab = Browser::new(&app);
    tab.open_page().await;
    tab.post_json("/plans/select", json!({ "frequency": "monthly" })).await;

    let mut stranger = Browser::new(&app);
    assert_eq!(stranger.get_json("/plans").await["selected"]["frequency"], "biweekly");
    assert!(stranger.cookie.is_some());
    assert_ne!(stranger.cookie, tab.cookie);
}

// ─────────────────────────────────────────────────────────
// Payment
// ─────────────────────────────────────────────────────────

#[tokio::test]
async fn cancelled_prompt_never_confirms() {
    let mut tab = Browser::new(&app());

    let (status, body) = tab
        .post_json(
            "/payment/confirm",
            json!({ "tx_hash": null, "email": "buyer@example.com" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "cancelled");
    assert_eq!(body["notification"]["message"], payment::CANCELLED_MESSAGE);
    assert_eq!(body["notification"]["severity"], "error");
}

#[tokio::test]
async fn confirmation_carries_selected_plan() {
    let mut tab = Browser::new(&app());
    tab.post_json("/plans/select", json!({ "frequency": "daily" })).await;

    let (_, body) = tab
        .post_json(
            "/payment/confirm",
            json!({ "tx_hash": valid_hash(), "email": " buyer@example.com " }),
        )
        .await;
    assert_eq!(body["outcome"], "confirmed");
    assert_eq!(body["submission"]["frequency"], "daily");
    assert_eq!(body["submission"]["price"], 1999);
    assert_eq!(body["submission"]["email"], "buyer@example.com");
    assert_eq!(body["notification"]["message"], payment::CONFIRMED_MESSAGE);
}

#[tokio::test]
async fn short_hash_is_rejected_when_enforced() {
    let mut tab = Browser::new(&app());

    let (_, body) = tab
        .post_json(
            "/payment/confirm",
            json!({ "tx_hash": "abc123", "email": "buyer@example.com" }),
        )
        .await;
    assert_eq!(body["outcome"], "rejected");
    assert_eq!(body["validation"]["status"], "invalid");
    assert_eq!(body["notification"]["severity"], "error");
}

#[tokio::test]
async fn short_hash_confirms_in_advisory_mode() {
    let mut tab = Browser::new(&app_with(Config {
        validation_mode: payment::ValidationMode::Advisory,
        ..Config::default()
    }));

    let (_, body) = tab
        .post_json(
            "/payment/confirm",
            json!({ "tx_hash": "abc123", "email": "buyer@example.com" }),
        )
        .await;
    assert_eq!(body["outcome"], "confirmed");
    assert_eq!(body["validation"]["status"], "invalid");
}

#[tokio::test]
async fn copy_failure_posts_error_notice() {
    let mut tab = Browser::new(&app());

    let (_, body) = tab
        .post_json("/payment/copy-address", json!({ "outcome": "failed" }))
        .await;
    assert_eq!(body["severity"], "error");

    let (_, body) = tab
        .post_json(
            "/payment/copy-address",
            json!({ "outcome": "manual_selection" }),
        )
        .await;
    assert_eq!(body["severity"], "success");
}

// ─────────────────────────────────────────────────────────
// Demo & notifications
// ─────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn blank_demo_request_links_sample_once_without_delivery() {
    let mut tab = Browser::new(&app());

    let (_, body) = tab
        .post_json("/demo/request", json!({ "company": null, "email": "  " }))
        .await;
    assert_eq!(body["outcome"], "sample_report");
    assert_eq!(body["notification"]["link"], "/reports/sample");
    let id = body["notification"]["id"].clone();

    // Past the delivery delay but inside the TTL: still the same single notice.
    tokio::time::sleep(Duration::from_secs(3)).await;
    let current = tab.get_json("/notifications/current").await;
    assert_eq!(current["id"], id);
    assert_eq!(current["link"], "/reports/sample");

    tokio::time::sleep(Duration::from_secs(7)).await;
    assert_eq!(tab.get_json("/notifications/current").await, Value::Null);
}

#[tokio::test(start_paused = true)]
async fn submitted_demo_is_delivered_after_delay() {
    let mut tab = Browser::new(&app());

    let (_, body) = tab
        .post_json(
            "/demo/request",
            json!({ "company": "Acme", "email": "cto@acme.io" }),
        )
        .await;
    assert_eq!(body["outcome"], "submitted");
    assert_eq!(body["request"]["source"], demo::REQUEST_SOURCE);
    assert_eq!(body["notification"]["message"], demo::RECEIPT_MESSAGE);

    tokio::time::sleep(Duration::from_millis(1500)).await;
    let current = tab.get_json("/notifications/current").await;
    assert_eq!(current["message"], demo::RECEIPT_MESSAGE);

    tokio::time::sleep(Duration::from_millis(1000)).await;
    let current = tab.get_json("/notifications/current").await;
    assert_eq!(
        current["message"],
        "Demo report sent to cto@acme.io! Check your inbox."
    );
    assert_eq!(current["link"], "/reports/sample");
}

#[tokio::test(start_paused = true)]
async fn incomplete_demo_request_is_not_scheduled() {
    let mut tab = Browser::new(&app());

    let (_, body) = tab
        .post_json("/demo/request", json!({ "company": "Acme", "email": null }))
        .await;
    assert_eq!(body["outcome"], "incomplete");
    assert_eq!(body["notification"]["message"], demo::INCOMPLETE_MESSAGE);

    tokio::time::sleep(Duration::from_secs(3)).await;
    let current = tab.get_json("/notifications/current").await;
    assert_eq!(current["message"], demo::INCOMPLETE_MESSAGE);
}

#[tokio::test(start_paused = true)]
async fn newer_notification_replaces_older_and_expires() {
    let mut tab = Browser::new(&app());

    let (_, first) = tab.post_json("/plans/select", json!({ "frequency": "weekly" })).await;
    tokio::time::sleep(Duration::from_secs(3)).await;
    let (_, second) = tab.post_json("/plans/select", json!({ "frequency": "daily" })).await;

    let current = tab.get_json("/notifications/current").await;
    assert_eq!(current["id"], second["notification"]["id"]);
    assert_ne!(current["id"], first["notification"]["id"]);

    // The first notice's timer fires here and must not dismiss the second.
    tokio::time::sleep(Duration::from_secs(3)).await;
    let current = tab.get_json("/notifications/current").await;
    assert_eq!(current["id"], second["notification"]["id"]);

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(tab.get_json("/notifications/current").await, Value::Null);
}

// ─────────────────────────────────────────────────────────
// Reports
// ─────────────────────────────────────────────────────────

#[tokio::test]
async fn unknown_report_type_is_not_found() {
    let mut tab = Browser::new(&app());

    let (status, body) = tab
        .post_json("/reports/generate", json!({ "type": "quarterly" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("quarterly"));

    let current = tab.get_json("/notifications/current").await;
    assert_eq!(current["severity"], "error");
    assert!(current["message"]
        .as_str()
        .unwrap()
        .starts_with("Failed to generate PDF report"));
}

#[tokio::test]
async fn generated_report_falls_back_to_printable_html() {
    let mut tab = Browser::new(&app());

    let (status, headers, bytes) = tab
        .send(
            Method::POST,
            "/reports/generate",
            Some(json!({
                "type": "executive",
                "company_data": { "company_name": "Acme Corp" }
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "text/html; charset=utf-8");

    let disposition = headers[header::CONTENT_DISPOSITION].to_str().unwrap();
    assert!(disposition.starts_with("inline;"));
    assert!(disposition.contains("Acme-Corp"));

    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("Acme Corp"));
    assert!(html.contains("window.print()"));

    let current = tab.get_json("/notifications/current").await;
    assert_eq!(current["severity"], "success");
}

#[tokio::test]
async fn missing_sample_file_renders_demo_report() {
    let dir = tempfile::tempdir().unwrap();
    let mut tab = Browser::new(&app_with(Config {
        sample_report_path: dir.path().join("missing"),
        ..Config::default()
    }));

    let (status, headers, bytes) = tab.send(Method::GET, "/reports/sample", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "text/html; charset=utf-8");
    assert!(!bytes.is_empty());
}

#[tokio::test]
async fn sample_file_is_served_as_pdf_attachment() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Matrix_Intelligence_Report");
    std::fs::write(&path, b"%PDF-1.4\nsample").unwrap();

    let mut tab = Browser::new(&app_with(Config {
        sample_report_path: path,
        ..Config::default()
    }));

    let (status, headers, bytes) = tab.send(Method::GET, "/reports/sample", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"Matrix_Intelligence_Report.pdf\""
    );
    assert_eq!(&bytes[..], b"%PDF-1.4\nsample");
}

#[tokio::test]
async fn templates_endpoint_reports_builtins() {
    let mut tab = Browser::new(&app());

    let body = tab.get_json("/reports/templates").await;
    assert_eq!(body["ready"], true);
    assert_eq!(body["rasterizer"], "print");
    assert_eq!(
        body["templates"],
        json!(["demo", "executive", "comprehensive"])
    );
}
