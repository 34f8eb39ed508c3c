//! The site controller.
//!
//! Owns the shared services (visitor registry, payment flow, report
//! generator) and runs the flows against one visitor's state. Built once in
//! `main` and shared with the HTTP handlers; nothing here touches a request
//! or response.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::analytics::{Analytics, TrackedEvent};
use crate::config::Config;
use crate::demo::{self, DemoOutcome};
use crate::errors::{Result, SiteError};
use crate::notify::{Notice, Notification};
use crate::payment::{
    self, CopyOutcome, PaymentFlow, PaymentInstructions, PaymentOutcome, PaymentSubmission,
    Validation,
};
use crate::plans::{PlanCatalog, PlanControl, PlanSelector, SelectedPlan};
use crate::prompt::Prompt;
use crate::report::artifact::{Artifact, MediaType};
use crate::report::{self, GeneratedReport, ReportGenerator, ReportRequest};
use crate::visitor::{Visitor, VisitorId, VisitorRegistry};

/// Route the page hits to download the sample report.
pub const SAMPLE_REPORT_ROUTE: &str = "/reports/sample";

/// Snapshot of the pricing grid.
#[derive(Debug, Clone, Serialize)]
pub struct PlansView {
    pub selected: SelectedPlan,
    pub plans: Vec<PlanCard>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanCard {
    #[serde(flatten)]
    pub control: PlanControl,
    pub label: &'static str,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FlowResponse<T> {
    #[serde(flatten)]
    pub outcome: T,
    pub notification: Notification,
}

/// A file ready to hand to the browser.
#[derive(Debug, Clone)]
pub struct Download {
    pub file_name: String,
    pub artifact: Artifact,
}

impl From<GeneratedReport> for Download {
    fn from(report: GeneratedReport) -> Self {
        Download {
            file_name: report.file_name,
            artifact: report.artifact,
        }
    }
}

pub struct SiteController {
    config: Config,
    visitors: VisitorRegistry,
    payment: PaymentFlow,
    reports: ReportGenerator,
    analytics: Analytics,
}

impl SiteController {
    pub fn new(config: Config, reports: ReportGenerator, analytics: Analytics) -> Result<Self> {
        let plans = PlanSelector::new(PlanCatalog::default())
            .ok_or_else(|| SiteError::Config("plan catalog is empty".to_string()))?;
        Ok(SiteController {
            visitors: VisitorRegistry::new(plans, config.notification_ttl, config.visitor_idle),
            payment: PaymentFlow::new(config.validation_mode),
            config,
            reports,
            analytics,
        })
    }

    pub fn reports(&self) -> &ReportGenerator {
        &self.reports
    }

    // ─── Visitors ─────────────────────────────────────────

    /// A fresh visitor; every page load starts over.
    pub async fn open_visitor(&self) -> (VisitorId, Arc<Visitor>) {
        self.visitors.open().await
    }

    pub async fn visitor(&self, id: Option<&str>) -> (VisitorId, Arc<Visitor>) {
        self.visitors.resolve(id).await
    }

    // ─── Plans ────────────────────────────────────────────

    pub async fn plans(&self, visitor: &Visitor) -> PlansView {
        let plans = visitor.plans.read().await;
        PlansView {
            selected: plans.selected(),
            plans: plans
                .active_flags()
                .into_iter()
                .map(|(control, active)| PlanCard {
                    control,
                    label: control.frequency.label(),
                    active,
                })
                .collect(),
        }
    }

    /// `None` when no card carries `tag`.
    pub async fn select_plan(
        &self,
        visitor: &Visitor,
        tag: &str,
    ) -> Option<FlowResponse<SelectedPlan>> {
        let outcome = visitor.plans.write().await.select(tag)?;
        info!(
            frequency = outcome.selected.frequency.as_str(),
            price = outcome.selected.price,
            "Plan selected"
        );
        let notification = visitor.notifications.push(outcome.notice).await;
        Some(FlowResponse {
            outcome: outcome.selected,
            notification,
        })
    }

    pub async fn proceed_to_payment(&self, visitor: &Visitor) -> Notification {
        let notice = visitor.plans.read().await.proceed_to_payment();
        visitor.notifications.push(notice).await
    }

    // ─── Payment ──────────────────────────────────────────

    pub fn payment_instructions(&self) -> PaymentInstructions {
        PaymentInstructions::usdt_trc20(self.config.usdt_address.clone())
    }

    pub async fn confirm_payment(
        &self,
        visitor: &Visitor,
        prompt: &mut (dyn Prompt + Send),
    ) -> FlowResponse<PaymentOutcome> {
        let plan = visitor.plans.read().await.selected();
        let outcome = self.payment.run(prompt, plan, Utc::now());

        match &outcome {
            PaymentOutcome::Cancelled { .. } => info!("Payment confirmation cancelled"),
            PaymentOutcome::Rejected { submission, .. } => {
                warn!(
                    email = %submission.email,
                    tx_hash = %submission.tx_hash,
                    "Payment rejected: invalid transaction hash"
                );
            }
            PaymentOutcome::Confirmed {
                submission,
                validation,
                ..
            } => {
                log_confirmation(submission, validation);
                let tx_hash = submission.tx_hash.clone();
                tokio::spawn(async move {
                    let confirmation = payment::simulate_confirmation(tx_hash).await;
                    info!(
                        tx_hash = %confirmation.tx_hash,
                        blocks = confirmation.blocks,
                        "Network confirmation simulated"
                    );
                });
            }
        }

        let notification = visitor.notifications.push(outcome.notice().clone()).await;
        FlowResponse {
            outcome,
            notification,
        }
    }

    pub async fn copy_address(&self, visitor: &Visitor, outcome: CopyOutcome) -> Notification {
        if outcome == CopyOutcome::Failed {
            warn!("Visitor could not copy the USDT address");
        }
        visitor.notifications.push(outcome.notice()).await
    }

    // ─── Demo ─────────────────────────────────────────────

    pub async fn request_demo(
        &self,
        visitor: &Visitor,
        prompt: &mut (dyn Prompt + Send),
    ) -> FlowResponse<DemoOutcome> {
        let frequency = visitor.plans.read().await.selected().frequency;
        let outcome = demo::run(prompt, frequency, Utc::now());

        let notice = match &outcome {
            DemoOutcome::SampleReport => {
                info!("Demo request left blank, handing out the sample report");
                Notice::success("Downloading the sample report").with_link(SAMPLE_REPORT_ROUTE)
            }
            DemoOutcome::Incomplete { notice } => notice.clone(),
            DemoOutcome::Submitted { request, notice } => {
                info!(
                    company = %request.company,
                    email = %request.email,
                    frequency = request.frequency.as_str(),
                    source = request.source,
                    timestamp = %request.timestamp,
                    "Demo request submitted"
                );
                self.schedule_demo_delivery(visitor, request.clone());
                notice.clone()
            }
        };

        let notification = visitor.notifications.push(notice).await;
        FlowResponse {
            outcome,
            notification,
        }
    }

    /// One-shot, uncancellable; the notice lands even if a newer flow has
    /// posted since.
    fn schedule_demo_delivery(&self, visitor: &Visitor, request: demo::DemoRequest) {
        let notifications = visitor.notifications.clone();
        let delay: Duration = self.config.demo_delivery_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let content = request.content(Utc::now());
            info!(
                email = %request.email,
                company = %content.company,
                sections = content.sections.len(),
                "Demo report delivered"
            );
            notifications
                .push(request.delivered_notice().with_link(SAMPLE_REPORT_ROUTE))
                .await;
        });
    }

    // ─── Reports ──────────────────────────────────────────

    /// The pre-built sample file, or a freshly rendered demo report if the
    /// file cannot be read.
    pub async fn sample_report(&self) -> Result<Download> {
        match report::read_sample(&self.config.sample_report_path).await {
            Ok(bytes) => {
                info!("Sample report download started");
                self.analytics.track(TrackedEvent::sample_download());
                Ok(Download {
                    file_name: report::SAMPLE_DOWNLOAD_NAME.to_string(),
                    artifact: Artifact::new(bytes, MediaType::Pdf),
                })
            }
            Err(e) => {
                warn!(
                    path = %self.config.sample_report_path.display(),
                    "Sample report unavailable, rendering the demo report instead: {e}"
                );
                self.reports
                    .generate(&ReportRequest::default(), Utc::now())
                    .await
                    .map(Download::from)
            }
        }
    }

    pub async fn generate_report(
        &self,
        visitor: &Visitor,
        request: &ReportRequest,
    ) -> Result<Download> {
        match self.reports.generate(request, Utc::now()).await {
            Ok(report) => {
                info!(
                    kind = report.kind.as_str(),
                    company = report.data.get("company_name").unwrap_or_default(),
                    "Report delivered"
                );
                visitor
                    .notifications
                    .push(Notice::success(format!(
                        "PDF report \"{}\" generated successfully",
                        report.file_name
                    )))
                    .await;
                Ok(report.into())
            }
            Err(e) => {
                warn!("PDF generation failed: {e}");
                visitor
                    .notifications
                    .push(Notice::error(format!("Failed to generate PDF report: {e}")))
                    .await;
                Err(e)
            }
        }
    }

    // ─── Notifications ────────────────────────────────────

    pub async fn current_notification(&self, visitor: &Visitor) -> Option<Notification> {
        visitor.notifications.current().await
    }
}

fn log_confirmation(submission: &PaymentSubmission, validation: &Validation) {
    if !validation.is_valid() {
        warn!(
            tx_hash = %submission.tx_hash,
            "Transaction hash failed validation; confirming anyway (advisory mode)"
        );
    }
    info!(
        frequency = submission.frequency.as_str(),
        price = submission.price,
        tx_hash = %submission.tx_hash,
        email = %submission.email,
        timestamp = %submission.timestamp,
        "Payment confirmed"
    );
}
