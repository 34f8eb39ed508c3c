//! Values substituted into report templates.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

const COMPETITOR_ROWS: &str = r#"
<tr><td><strong>Coursera</strong></td><td>18.3%</td><td class="up">+2.1%</td><td>Brand recognition, university partnerships</td></tr>
<tr><td><strong>LinkedIn Learning</strong></td><td>15.7%</td><td class="up">+0.5%</td><td>Enterprise integration, professional network</td></tr>
<tr><td><strong>Udemy</strong></td><td>12.4%</td><td class="down">-1.2%</td><td>Marketplace model, course variety</td></tr>
<tr><td><strong>Docebo</strong></td><td>5.6%</td><td class="up">+3.4%</td><td>Enterprise LMS, AI features</td></tr>
"#;

const DEFAULTS: &[(&str, &str)] = &[
    ("company_name", "Sample Corporation"),
    ("industry", "Technology Services"),
    ("market_size", "$402.5 Billion"),
    ("market_growth", "12.4%"),
    ("market_trend", "positive"),
    ("market_trend_text", "Growing"),
    ("key_opportunity", "Expansion into the SME segment with AI-powered solutions"),
    ("opportunity_value", "$45M Annual Potential"),
    ("competitive_alert", "New market entrant with disruptive pricing model"),
    ("alert_level", "medium"),
    ("alert_level_text", "Monitor Closely"),
    ("tam_value", "$186.3B"),
    ("sam_value", "$45.8B"),
    ("growth_rate", "+12.4% YoY"),
    ("chart_data", "Simulated market growth data based on industry trends"),
    ("competitor_rows", COMPETITOR_ROWS),
    ("high_priority_title", "Develop an AI-Powered Personalization Engine"),
    (
        "high_priority_description",
        "Build learning paths from user behaviour, performance metrics and career goals to lift engagement and completion rates.",
    ),
    ("high_impact", "High Impact (40% engagement increase)"),
    ("high_timeframe", "3-6 months development"),
    ("medium_priority_title", "Expand Mobile Learning Capabilities"),
    (
        "medium_priority_description",
        "Offline learning, micro-learning modules and mobile-first delivery; mobile accounts for 68% of learning time.",
    ),
    ("total_recommendations", "15"),
    ("contact_email", "intelligence@matrix.ai"),
    ("website_url", "https://matrix-intelligence.com"),
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ReportData(BTreeMap<String, String>);

impl ReportData {
    pub fn defaults() -> Self {
        ReportData(
            DEFAULTS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    /// Defaults, then company fields, then market fields, then the dates.
    pub fn merged(
        company: &Map<String, Value>,
        market: &Map<String, Value>,
        now: DateTime<Utc>,
    ) -> Self {
        let mut data = Self::defaults();
        data.overlay(company);
        data.overlay(market);
        data.insert("report_date", now.format("%B %-d, %Y").to_string());
        data.insert("generation_date", now.format("%Y-%m-%d").to_string());
        data.insert("timestamp", now.to_rfc3339());
        data
    }

    /// `null` removes the key so the template shows its placeholder.
    pub fn overlay(&mut self, fields: &Map<String, Value>) {
        for (key, value) in fields {
            match value {
                Value::Null => {
                    self.0.remove(key);
                }
                Value::String(s) => {
                    self.0.insert(key.clone(), s.clone());
                }
                other => {
                    self.0.insert(key.clone(), other.to_string());
                }
            }
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ReportData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        ReportData(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
