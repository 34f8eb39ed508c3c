//! Demo request flow.
//!
//! A request is acknowledged right away; the "delivery" is a second
//! notification a couple of seconds later. Leaving both questions blank
//! skips the request and hands out the sample report directly.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::notify::Notice;
use crate::plans::Frequency;
use crate::prompt::Prompt;

pub const COMPANY_QUESTION: &str = "Please enter your company name:";
pub const EMAIL_QUESTION: &str = "Please enter your email for demo delivery:";
pub const RECEIPT_MESSAGE: &str = "Demo request received! We will contact you within 24 hours.";
pub const INCOMPLETE_MESSAGE: &str = "Please provide both company name and email";
pub const REQUEST_SOURCE: &str = "matrix_intelligence_landing";

/// Sections every demo report advertises.
pub const DEMO_SECTIONS: [&str; 5] = [
    "Market Overview Analysis",
    "Competitive Landscape",
    "Target Audience Insights",
    "Strategic Recommendations",
    "Implementation Roadmap",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DemoRequest {
    pub company: String,
    pub email: String,
    pub frequency: Frequency,
    pub timestamp: DateTime<Utc>,
    pub source: &'static str,
}

impl DemoRequest {
    pub fn delivered_notice(&self) -> Notice {
        Notice::success(format!(
            "Demo report sent to {}! Check your inbox.",
            self.email
        ))
    }

    pub fn content(&self, generated: DateTime<Utc>) -> DemoContent {
        DemoContent {
            company: self.company.clone(),
            frequency: self.frequency,
            sections: DEMO_SECTIONS.to_vec(),
            generated,
        }
    }
}

/// What the simulated e-mail would have contained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DemoContent {
    pub company: String,
    pub frequency: Frequency,
    pub sections: Vec<&'static str>,
    pub generated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DemoOutcome {
    /// Both answers blank: go straight to the sample report.
    SampleReport,
    Incomplete { notice: Notice },
    Submitted { request: DemoRequest, notice: Notice },
}

pub fn run(prompt: &mut dyn Prompt, frequency: Frequency, now: DateTime<Utc>) -> DemoOutcome {
    let company = prompt.ask(COMPANY_QUESTION);
    let email = prompt.ask(EMAIL_QUESTION);

    match (company, email) {
        (None, None) => DemoOutcome::SampleReport,
        (Some(company), Some(email)) => DemoOutcome::Submitted {
            request: DemoRequest {
                company,
                email,
                frequency,
                timestamp: now,
                source: REQUEST_SOURCE,
            },
            notice: Notice::success(RECEIPT_MESSAGE),
        },
        _ => DemoOutcome::Incomplete {
            notice: Notice::error(INCOMPLETE_MESSAGE),
        },
    }
}
