//! Report generation: default data + template → HTML → artifact.

pub mod artifact;
pub mod data;
pub mod rasterizer;
pub mod template;

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::errors::{Result, SiteError};
use artifact::Artifact;
use data::ReportData;
use rasterizer::{PrintFallback, Rasterizer, RenderOptions};
use template::TemplateStore;

/// Download name of the pre-built sample report. The file on disk has no
/// extension.
pub const SAMPLE_DOWNLOAD_NAME: &str = "Matrix_Intelligence_Report.pdf";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Demo,
    Executive,
    Comprehensive,
}

impl ReportKind {
    pub const ALL: [ReportKind; 3] = [
        ReportKind::Demo,
        ReportKind::Executive,
        ReportKind::Comprehensive,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "demo" => Some(Self::Demo),
            "executive" => Some(Self::Executive),
            "comprehensive" => Some(Self::Comprehensive),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Demo => "demo",
            Self::Executive => "executive",
            Self::Comprehensive => "comprehensive",
        }
    }

    /// Template file name without `.html`.
    pub fn file_stem(&self) -> &'static str {
        match self {
            Self::Demo => "demo-report",
            Self::Executive => "executive-summary",
            Self::Comprehensive => "comprehensive-analysis",
        }
    }

    fn file_prefix(&self) -> &'static str {
        match self {
            Self::Demo => "Demo",
            Self::Executive => "Executive",
            Self::Comprehensive => "Comprehensive",
        }
    }
}

/// `Matrix-Intelligence-<Kind>-Report[-<Company>]-<date>.pdf`
pub fn file_name(kind: ReportKind, company: Option<&str>, date: NaiveDate) -> String {
    let company = company
        .map(|c| {
            c.split_whitespace()
                .collect::<Vec<_>>()
                .join("-")
                .chars()
                .filter(|ch| ch.is_alphanumeric() || matches!(ch, '-' | '_' | '.'))
                .collect::<String>()
        })
        .filter(|c| !c.is_empty());

    match company {
        Some(company) => format!(
            "Matrix-Intelligence-{}-Report-{company}-{}.pdf",
            kind.file_prefix(),
            date.format("%Y-%m-%d")
        ),
        None => format!(
            "Matrix-Intelligence-{}-Report-{}.pdf",
            kind.file_prefix(),
            date.format("%Y-%m-%d")
        ),
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub company_data: Map<String, Value>,
    pub market_data: Map<String, Value>,
    pub options: RenderOptions,
}

impl Default for ReportRequest {
    fn default() -> Self {
        ReportRequest {
            kind: ReportKind::Demo.as_str().to_string(),
            company_data: Map::new(),
            market_data: Map::new(),
            options: RenderOptions::default(),
        }
    }
}

impl ReportRequest {
    pub fn demo_for(company: Option<&str>) -> Self {
        let mut request = Self::default();
        if let Some(company) = company {
            request
                .company_data
                .insert("company_name".to_string(), Value::String(company.to_string()));
        }
        request
    }
}

#[derive(Debug, Clone)]
pub struct GeneratedReport {
    pub kind: ReportKind,
    pub file_name: String,
    pub artifact: Artifact,
    pub data: ReportData,
}

pub struct ReportGenerator {
    templates: TemplateStore,
    rasterizer: Arc<dyn Rasterizer>,
}

impl ReportGenerator {
    pub fn new(templates: TemplateStore, rasterizer: Arc<dyn Rasterizer>) -> Self {
        ReportGenerator {
            templates,
            rasterizer,
        }
    }

    pub fn templates(&self) -> &TemplateStore {
        &self.templates
    }

    pub fn rasterizer_name(&self) -> &'static str {
        self.rasterizer.name()
    }

    /// Render the requested report. A failing rasterizer degrades to the
    /// printable HTML document; a missing template is an error.
    pub async fn generate(
        &self,
        request: &ReportRequest,
        now: DateTime<Utc>,
    ) -> Result<GeneratedReport> {
        let kind = ReportKind::from_name(&request.kind)
            .ok_or_else(|| SiteError::TemplateNotFound(request.kind.clone()))?;

        let data = ReportData::merged(&request.company_data, &request.market_data, now);
        let html = self.templates.render(kind, &data)?;

        let company = request
            .company_data
            .get("company_name")
            .and_then(Value::as_str);
        let file_name = file_name(kind, company, now.date_naive());

        let mut options = request.options.clone();
        options.filename.get_or_insert_with(|| file_name.clone());

        let artifact = match self.rasterizer.to_artifact(&html, &options).await {
            Ok(artifact) => artifact,
            Err(e) => {
                warn!(
                    rasterizer = self.rasterizer.name(),
                    "Report rasterization failed, serving printable HTML: {e}"
                );
                PrintFallback.to_artifact(&html, &options).await?
            }
        };

        info!(
            kind = kind.as_str(),
            file = %file_name,
            media_type = artifact.media_type.as_str(),
            "Report generated"
        );

        Ok(GeneratedReport {
            kind,
            file_name,
            artifact,
            data,
        })
    }
}

/// Read the pre-built sample report.
pub async fn read_sample(path: &Path) -> Result<Vec<u8>> {
    Ok(tokio::fs::read(path).await?)
}
