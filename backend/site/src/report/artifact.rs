//! Rendered report output and how it is handed to the browser.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MediaType {
    #[serde(rename = "application/pdf")]
    Pdf,
    #[serde(rename = "text/html")]
    Html,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Html => "text/html; charset=utf-8",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub bytes: Vec<u8>,
    pub media_type: MediaType,
}

impl Artifact {
    pub fn new(bytes: Vec<u8>, media_type: MediaType) -> Self {
        Artifact { bytes, media_type }
    }

    /// PDFs download as an attachment; the HTML fallback opens inline in a
    /// new tab so the visitor can print it.
    pub fn content_disposition(&self, file_name: &str) -> String {
        match self.media_type {
            MediaType::Pdf => format!("attachment; filename=\"{file_name}\""),
            MediaType::Html => {
                let stem = file_name.strip_suffix(".pdf").unwrap_or(file_name);
                format!("inline; filename=\"{stem}.html\"")
            }
        }
    }
}
