//! Report templates and `{{placeholder}}` substitution.

use std::collections::BTreeMap;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::{info, warn};

use super::data::ReportData;
use super::ReportKind;
use crate::errors::{Result, SiteError};

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{([A-Za-z0-9_]+)\}\}").expect("valid placeholder pattern"));

/// The three report slots, loaded once and never modified.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    templates: BTreeMap<ReportKind, String>,
}

impl TemplateStore {
    pub fn from_templates(templates: BTreeMap<ReportKind, String>) -> Self {
        TemplateStore { templates }
    }

    pub fn builtin() -> Self {
        Self::from_templates(
            ReportKind::ALL
                .into_iter()
                .map(|kind| (kind, builtin_template(kind)))
                .collect(),
        )
    }

    /// Read `<dir>/<stem>.html` for every slot. If any file is unreadable the
    /// whole store falls back to the built-ins.
    pub async fn load(dir: &Path) -> Self {
        let mut templates = BTreeMap::new();
        for kind in ReportKind::ALL {
            let path = dir.join(format!("{}.html", kind.file_stem()));
            match tokio::fs::read_to_string(&path).await {
                Ok(markup) => {
                    templates.insert(kind, markup);
                }
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        "Cannot load report template, using built-in templates: {e}"
                    );
                    return Self::builtin();
                }
            }
        }
        info!(dir = %dir.display(), "Report templates loaded");
        Self::from_templates(templates)
    }

    pub fn available(&self) -> Vec<ReportKind> {
        self.templates.keys().copied().collect()
    }

    pub fn is_ready(&self) -> bool {
        !self.templates.is_empty()
    }

    pub fn render(&self, kind: ReportKind, data: &ReportData) -> Result<String> {
        let template = self
            .templates
            .get(&kind)
            .ok_or_else(|| SiteError::TemplateNotFound(kind.as_str().to_string()))?;
        Ok(substitute(template, data))
    }
}

/// Replace every `{{key}}`; keys with no value render as `[key]`.
pub fn substitute(template: &str, data: &ReportData) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            let key = &caps[1];
            match data.get(key) {
                Some(value) => value.to_string(),
                None => {
                    warn!("Template variable {{{{{key}}}}} not found in data");
                    format!("[{key}]")
                }
            }
        })
        .into_owned()
}

// ─────────────────────────────────────────────────────────
// Built-in templates
// ─────────────────────────────────────────────────────────

const STYLE: &str = r#"
  * { margin: 0; padding: 0; box-sizing: border-box; }
  body { font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; line-height: 1.6; color: #333; background: #fff; }
  .pdf-container { max-width: 210mm; margin: 0 auto; }
  .page-break { page-break-after: always; break-after: page; }
  .pdf-header { background: linear-gradient(135deg, #0f172a 0%, #1e293b 100%); color: #fff; padding: 1.5rem 2rem; border-bottom: 4px solid #00dc82; display: flex; justify-content: space-between; align-items: center; }
  .logo { font-size: 1.8rem; font-weight: bold; color: #00dc82; }
  .subtitle, .report-date { font-size: 0.9rem; opacity: 0.8; }
  .report-type { font-size: 1.2rem; font-weight: bold; color: #00dc82; text-align: right; }
  .cover-page { min-height: 240mm; display: flex; align-items: center; justify-content: center; background: #0f172a; color: #fff; text-align: center; }
  .cover-page h1 { font-size: 3rem; margin-bottom: 2rem; color: #00dc82; line-height: 1.2; }
  .client-info { margin: 2rem 0; padding: 2rem; background: rgba(255, 255, 255, 0.1); border-radius: 12px; }
  .confidential { margin-top: 2rem; padding: 1rem 2rem; border: 2px solid #dc2626; border-radius: 25px; font-weight: bold; display: inline-block; }
  section { padding: 2rem; }
  h2 { color: #0f172a; font-size: 2rem; margin-bottom: 1.5rem; padding-bottom: 0.5rem; border-bottom: 3px solid #00dc82; }
  h3 { color: #1e293b; font-size: 1.3rem; margin: 1.5rem 0 1rem; }
  .summary-grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(200px, 1fr)); gap: 1.5rem; margin: 2rem 0; }
  .summary-card { background: #f8fafc; border: 2px solid #e2e8f0; border-radius: 12px; padding: 1.5rem; text-align: center; }
  .trend-indicator, .alert-level { display: inline-block; padding: 0.3rem 1rem; border-radius: 20px; font-size: 0.8rem; font-weight: bold; margin-top: 0.5rem; }
  .positive { background: #dcfce7; color: #166534; }
  .negative { background: #fee2e2; color: #991b1b; }
  .medium { background: #fef9c3; color: #854d0e; }
  table { width: 100%; border-collapse: collapse; margin: 1rem 0; }
  th, td { padding: 0.6rem; border-bottom: 1px solid #e2e8f0; text-align: left; }
  td.up { color: #10b981; } td.down { color: #dc2626; }
  .recommendation { border-left: 4px solid #00dc82; padding: 1rem 1.5rem; margin: 1rem 0; background: #f8fafc; }
  .pdf-footer { padding: 1.5rem 2rem; font-size: 0.8rem; color: #64748b; border-top: 1px solid #e2e8f0; }
"#;

const HEADER: &str = r#"
<header class="pdf-header">
  <div>
    <div class="logo">MATRIX INTELLIGENCE</div>
    <div class="subtitle">AI-Powered Market Analysis</div>
  </div>
  <div>
    <div class="report-type">{{report_label}}</div>
    <div class="report-date">{{report_date}}</div>
  </div>
</header>
"#;

const COVER: &str = r#"
<div class="cover-page">
  <div>
    <h1>Market Intelligence<br>{{report_title}}</h1>
    <div class="client-info">
      <h2>Prepared for {{company_name}}</h2>
      <p>Industry: {{industry}}</p>
      <p>Generated: {{generation_date}}</p>
    </div>
    <div class="confidential">CONFIDENTIAL &amp; PROPRIETARY</div>
  </div>
</div>
<div class="page-break"></div>
"#;

const SUMMARY: &str = r#"
<section class="executive-summary">
  <h2>Executive Summary</h2>
  <div class="summary-grid">
    <div class="summary-card">
      <h3>Market Overview</h3>
      <p>{{market_size}} growing at {{market_growth}} annually</p>
      <div class="trend-indicator {{market_trend}}">{{market_trend_text}}</div>
    </div>
    <div class="summary-card">
      <h3>Key Opportunity</h3>
      <p>{{key_opportunity}}</p>
      <p>Potential: {{opportunity_value}}</p>
    </div>
    <div class="summary-card">
      <h3>Competitive Alert</h3>
      <p>{{competitive_alert}}</p>
      <div class="alert-level {{alert_level}}">{{alert_level_text}}</div>
    </div>
  </div>
</section>
"#;

const MARKET: &str = r#"
<section class="market-analysis">
  <h2>Market Sizing</h2>
  <table>
    <tr><th>Total addressable market</th><td>{{tam_value}}</td></tr>
    <tr><th>Serviceable addressable market</th><td>{{sam_value}}</td></tr>
    <tr><th>Growth rate</th><td>{{growth_rate}}</td></tr>
  </table>
  <p>{{chart_data}}</p>
</section>
"#;

const COMPETITORS: &str = r#"
<section class="competitors">
  <h2>Competitive Landscape</h2>
  <table>
    <tr><th>Company</th><th>Share</th><th>Change</th><th>Advantage</th></tr>
    {{competitor_rows}}
  </table>
</section>
"#;

const RECOMMENDATIONS: &str = r#"
<section class="recommendations">
  <h2>Strategic Recommendations</h2>
  <div class="recommendation">
    <h3>{{high_priority_title}}</h3>
    <p>{{high_priority_description}}</p>
    <p><strong>{{high_impact}}</strong> &middot; {{high_timeframe}}</p>
  </div>
  <div class="recommendation">
    <h3>{{medium_priority_title}}</h3>
    <p>{{medium_priority_description}}</p>
  </div>
  <p>{{total_recommendations}} recommendations in the full report.</p>
</section>
"#;

const DEMO_NOTE: &str = r#"
<section class="summary-note">
  <p><strong>Note:</strong> This is a sample demo report. The full subscription includes detailed analysis, custom recommendations and regular updates at your chosen frequency.</p>
</section>
"#;

const FOOTER: &str = r#"
<footer class="pdf-footer">
  {{contact_email}} &middot; {{website_url}}
</footer>
"#;

fn builtin_template(kind: ReportKind) -> String {
    let (label, title) = match kind {
        ReportKind::Demo => ("DEMO REPORT", "Demo Report"),
        ReportKind::Executive => ("EXECUTIVE SUMMARY", "Executive Summary"),
        ReportKind::Comprehensive => ("COMPREHENSIVE ANALYSIS", "Comprehensive Analysis"),
    };
    let sections: &[&str] = match kind {
        ReportKind::Demo => &[COVER, SUMMARY, DEMO_NOTE],
        ReportKind::Executive => &[COVER, SUMMARY, RECOMMENDATIONS],
        ReportKind::Comprehensive => &[COVER, SUMMARY, MARKET, COMPETITORS, RECOMMENDATIONS],
    };

    let mut markup = String::from(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n<title>",
    );
    markup.push_str(title);
    markup.push_str(" - Matrix Intelligence</title>\n<style>");
    markup.push_str(STYLE);
    markup.push_str("</style>\n</head>\n<body>\n<div class=\"pdf-container\">");
    markup.push_str(
        &HEADER
            .replace("{{report_label}}", label)
            .replace("{{report_title}}", title),
    );
    for section in sections {
        markup.push_str(&section.replace("{{report_title}}", title));
    }
    markup.push_str(FOOTER);
    markup.push_str("</div>\n</body>\n</html>\n");
    markup
}
