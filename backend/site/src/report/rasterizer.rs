//! HTML → artifact conversion.
//!
//! Two implementations of [`Rasterizer`]; which one is used is decided once
//! at start-up from `RASTERIZER_URL`:
//!
//! * [`RemoteRasterizer`] posts the markup to an HTML-to-PDF service and
//!   returns real PDF bytes.
//! * [`PrintFallback`] wraps the markup in a print-ready HTML document that
//!   opens the browser's print dialog, leaving the "save as PDF" step to the
//!   visitor.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};
use v_htmlescape::escape;

use super::artifact::{Artifact, MediaType};
use crate::errors::{Result, SiteError};

/// Page settings forwarded to the rasterizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Top, right, bottom, left in millimetres.
    pub margin: [u32; 4],
    pub format: String,
    pub orientation: String,
    pub scale: u32,
    pub image_quality: f32,
    pub filename: Option<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            margin: [10, 10, 10, 10],
            format: "a4".to_string(),
            orientation: "portrait".to_string(),
            scale: 2,
            image_quality: 0.98,
            filename: None,
        }
    }
}

#[async_trait]
pub trait Rasterizer: Send + Sync {
    fn name(&self) -> &'static str;

    async fn to_artifact(&self, html: &str, options: &RenderOptions) -> Result<Artifact>;
}

/// Pick the rasterizer for this process.
pub fn select(url: Option<&str>, client: Client) -> Arc<dyn Rasterizer> {
    match url {
        Some(url) => {
            info!("Rasterizer: remote service at {url}");
            Arc::new(RemoteRasterizer::new(client, url))
        }
        None => {
            info!("Rasterizer: none configured, reports are served as printable HTML");
            Arc::new(PrintFallback)
        }
    }
}

// ─────────────────────────────────────────────────────────
// Remote service
// ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct EncodedPdf {
    pdf: String,
}

pub struct RemoteRasterizer {
    client: Client,
    url: String,
}

impl RemoteRasterizer {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        RemoteRasterizer {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl Rasterizer for RemoteRasterizer {
    fn name(&self) -> &'static str {
        "remote"
    }

    /// The service either answers with `application/pdf` bytes or with a
    /// JSON body `{ "pdf": "<base64>" }`.
    async fn to_artifact(&self, html: &str, options: &RenderOptions) -> Result<Artifact> {
        let resp = self
            .client
            .post(&self.url)
            .json(&json!({ "html": html, "options": options }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SiteError::Rasterizer(format!(
                "service answered {status}"
            )));
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let bytes = if content_type.starts_with("application/pdf") {
            resp.bytes().await?.to_vec()
        } else if content_type.starts_with("application/json") {
            let body: EncodedPdf = resp.json().await?;
            base64::engine::general_purpose::STANDARD.decode(body.pdf.trim())?
        } else {
            return Err(SiteError::Rasterizer(format!(
                "unexpected content type {content_type:?}"
            )));
        };

        debug!("Rasterizer produced {} bytes", bytes.len());
        Ok(Artifact::new(bytes, MediaType::Pdf))
    }
}

// ─────────────────────────────────────────────────────────
// Print fallback
// ─────────────────────────────────────────────────────────

const PRINT_STYLE: &str = "<style>@media print { body { margin: 0; } }</style>";

const PRINT_SCRIPT: &str = "<script>\
setTimeout(function () { window.print(); setTimeout(function () { window.close(); }, 1000); }, 500);\
</script>";

#[derive(Debug, Clone, Copy, Default)]
pub struct PrintFallback;

#[async_trait]
impl Rasterizer for PrintFallback {
    fn name(&self) -> &'static str {
        "print"
    }

    async fn to_artifact(&self, html: &str, options: &RenderOptions) -> Result<Artifact> {
        let title = options
            .filename
            .as_deref()
            .unwrap_or("Matrix-Intelligence-Report");
        Ok(Artifact::new(
            print_document(html, title).into_bytes(),
            MediaType::Html,
        ))
    }
}

/// Make `html` print itself on open. Full documents get the print hooks
/// injected; fragments are wrapped in a minimal document first.
pub fn print_document(html: &str, title: &str) -> String {
    let lower = html.to_ascii_lowercase();
    if let (Some(head_end), Some(body_end)) = (lower.find("</head>"), lower.rfind("</body>")) {
        if head_end < body_end {
            let mut out = String::with_capacity(html.len() + PRINT_SCRIPT.len() + PRINT_STYLE.len());
            out.push_str(&html[..head_end]);
            out.push_str(PRINT_STYLE);
            out.push_str(&html[head_end..body_end]);
            out.push_str(PRINT_SCRIPT);
            out.push_str(&html[body_end..]);
            return out;
        }
    }

    let title = escape(title);
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n<title>{title}</title>\n\
<style>body {{ font-family: Arial, sans-serif; margin: 0; padding: 20px; color: #333; }}</style>\n\
{PRINT_STYLE}\n</head>\n<body>\n{html}\n{PRINT_SCRIPT}\n</body>\n</html>\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::Value;

    /// Serve `router` on an ephemeral port and return its `/render` URL.
    async fn stub_service(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/render")
    }

    async fn render_with(router: Router) -> Result<Artifact> {
        let url = stub_service(router).await;
        RemoteRasterizer::new(Client::new(), url)
            .to_artifact("<h1>Acme</h1>", &RenderOptions::default())
            .await
    }

    #[tokio::test]
    async fn remote_pdf_bytes_are_returned() {
        let router = Router::new().route(
            "/render",
            post(|Json(body): Json<Value>| async move {
                let mut bytes = b"%PDF-1.7\n".to_vec();
                bytes.extend_from_slice(body["html"].as_str().unwrap_or_default().as_bytes());
                ([(axum::http::header::CONTENT_TYPE, "application/pdf")], bytes)
            }),
        );

        let artifact = render_with(router).await.unwrap();
        assert_eq!(artifact.media_type, MediaType::Pdf);
        assert_eq!(artifact.bytes, b"%PDF-1.7\n<h1>Acme</h1>".to_vec());
    }

    #[tokio::test]
    async fn remote_base64_json_is_decoded() {
        let router = Router::new().route(
            "/render",
            post(|| async {
                let pdf = base64::engine::general_purpose::STANDARD.encode(b"%PDF-1.7 encoded");
                Json(json!({ "pdf": pdf }))
            }),
        );

        let artifact = render_with(router).await.unwrap();
        assert_eq!(artifact.media_type, MediaType::Pdf);
        assert_eq!(artifact.bytes, b"%PDF-1.7 encoded".to_vec());
    }

    #[tokio::test]
    async fn remote_bad_base64_is_an_error() {
        let router = Router::new().route(
            "/render",
            post(|| async { Json(json!({ "pdf": "not base64!" })) }),
        );

        assert!(matches!(
            render_with(router).await,
            Err(SiteError::Base64(_))
        ));
    }

    #[tokio::test]
    async fn remote_plain_text_is_rejected() {
        let router = Router::new().route("/render", post(|| async { "not a pdf" }));

        match render_with(router).await {
            Err(SiteError::Rasterizer(msg)) => assert!(msg.contains("text/plain"), "{msg}"),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[tokio::test]
    async fn remote_error_status_is_rejected() {
        let router = Router::new().route(
            "/render",
            post(|| async { (StatusCode::BAD_GATEWAY, "renderer down").into_response() }),
        );

        match render_with(router).await {
            Err(SiteError::Rasterizer(msg)) => assert!(msg.contains("502"), "{msg}"),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[tokio::test]
    async fn fragment_title_is_escaped() {
        let options = RenderOptions {
            filename: Some("</title><script>alert(1)</script>".to_string()),
            ..RenderOptions::default()
        };
        let artifact = PrintFallback.to_artifact("<p>x</p>", &options).await.unwrap();
        let text = String::from_utf8(artifact.bytes).unwrap();

        assert!(!text.contains("<script>alert(1)</script>"));
        assert!(text.contains("&lt;script&gt;alert(1)"));
    }

    #[tokio::test]
    async fn fallback_wraps_fragment_as_printable_html() {
        let options = RenderOptions {
            filename: Some("Report.pdf".to_string()),
            ..RenderOptions::default()
        };
        let artifact = PrintFallback
            .to_artifact("<h1>Acme</h1>", &options)
            .await
            .unwrap();

        assert_eq!(artifact.media_type, MediaType::Html);
        let text = String::from_utf8(artifact.bytes).unwrap();
        assert!(text.starts_with("<!DOCTYPE html>"));
        assert!(text.contains("<title>Report.pdf</title>"));
        assert!(text.contains("<h1>Acme</h1>"));
        assert!(text.contains("window.print()"));
    }

    #[test]
    fn full_document_gets_hooks_injected_once() {
        let doc = "<html><head><title>x</title></head><body><p>hi</p></body></html>";
        let out = print_document(doc, "ignored");

        assert_eq!(out.matches("<html>").count(), 1);
        assert!(out.contains("@media print"));
        let script_at = out.find("window.print()").unwrap();
        assert!(script_at > out.find("<p>hi</p>").unwrap());
        assert!(script_at < out.find("</body>").unwrap());
        assert!(!out.contains("ignored"));
    }

    #[test]
    fn select_without_url_uses_fallback() {
        assert_eq!(select(None, Client::new()).name(), "print");
        assert_eq!(select(Some("http://localhost:9"), Client::new()).name(), "remote");
    }

    #[test]
    fn options_fill_missing_fields_with_defaults() {
        let options: RenderOptions = serde_json::from_str(r#"{"orientation":"landscape"}"#).unwrap();
        assert_eq!(options.orientation, "landscape");
        assert_eq!(options.format, "a4");
        assert_eq!(options.margin, [10, 10, 10, 10]);
    }

    #[tokio::test]
    async fn unreachable_service_is_an_error() {
        let remote = RemoteRasterizer::new(Client::new(), "http://127.0.0.1:9/render");
        let result = remote.to_artifact("<p/>", &RenderOptions::default()).await;
        assert!(result.is_err());
    }
}
