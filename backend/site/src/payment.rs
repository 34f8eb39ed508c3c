//! Manual USDT (TRC20) payment confirmation.
//!
//! There is no ledger lookup anywhere in here: the visitor pastes the hash
//! of a transfer they made themselves, the hash gets a length check, and the
//! submission is logged for the team to reconcile by hand.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::errors::SiteError;
use crate::notify::Notice;
use crate::plans::{Frequency, SelectedPlan};
use crate::prompt::Prompt;

pub const PAYMENT_METHOD: &str = "USDT (TRC20)";
pub const MIN_TX_HASH_LEN: usize = 64;
pub const TX_HASH_QUESTION: &str = "Please enter your USDT transaction hash:";
pub const EMAIL_QUESTION: &str = "Please enter your email for report delivery:";
pub const CONFIRMED_MESSAGE: &str =
    "Payment confirmed! Full report will be delivered within 48 hours.";
pub const CANCELLED_MESSAGE: &str = "Payment confirmation cancelled";
pub const REJECTED_MESSAGE: &str = "Invalid transaction hash. Please check it and try again.";

/// Simulated network confirmation delay.
const CONFIRMATION_DELAY: Duration = Duration::from_secs(2);

// ─────────────────────────────────────────────────────────
// Validation
// ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Validation {
    Valid { transaction: String },
    Invalid { error: String },
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid { .. })
    }
}

/// Length-only check on a TRC20 transaction hash.
pub fn validate_tx_hash(tx_hash: &str) -> Validation {
    if tx_hash.chars().count() < MIN_TX_HASH_LEN {
        return Validation::Invalid {
            error: "Invalid transaction hash".to_string(),
        };
    }
    Validation::Valid {
        transaction: tx_hash.to_string(),
    }
}

/// Whether a failed validation blocks the confirmation notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    /// The result is logged but the visitor is always told "confirmed".
    Advisory,
    /// A short hash is rejected with an error notification.
    Enforced,
}

impl FromStr for ValidationMode {
    type Err = SiteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "advisory" => Ok(Self::Advisory),
            "enforced" => Ok(Self::Enforced),
            other => Err(SiteError::Config(format!(
                "Invalid PAYMENT_VALIDATION: {other} (expected advisory or enforced)"
            ))),
        }
    }
}

// ─────────────────────────────────────────────────────────
// Flow
// ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentSubmission {
    pub frequency: Frequency,
    pub price: u32,
    pub tx_hash: String,
    pub email: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PaymentOutcome {
    Cancelled {
        notice: Notice,
    },
    Rejected {
        submission: PaymentSubmission,
        validation: Validation,
        notice: Notice,
    },
    Confirmed {
        submission: PaymentSubmission,
        validation: Validation,
        notice: Notice,
    },
}

impl PaymentOutcome {
    pub fn notice(&self) -> &Notice {
        match self {
            Self::Cancelled { notice }
            | Self::Rejected { notice, .. }
            | Self::Confirmed { notice, .. } => notice,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PaymentFlow {
    mode: ValidationMode,
}

impl PaymentFlow {
    pub fn new(mode: ValidationMode) -> Self {
        PaymentFlow { mode }
    }

    /// Ask for the hash and the e-mail, then confirm. Both questions are
    /// always asked; nothing is submitted unless both were answered.
    pub fn run(
        &self,
        prompt: &mut dyn Prompt,
        plan: SelectedPlan,
        now: DateTime<Utc>,
    ) -> PaymentOutcome {
        let tx_hash = prompt.ask(TX_HASH_QUESTION);
        let email = prompt.ask(EMAIL_QUESTION);

        let (Some(tx_hash), Some(email)) = (tx_hash, email) else {
            return PaymentOutcome::Cancelled {
                notice: Notice::error(CANCELLED_MESSAGE),
            };
        };

        let validation = validate_tx_hash(&tx_hash);
        let submission = PaymentSubmission {
            frequency: plan.frequency,
            price: plan.price,
            tx_hash,
            email,
            timestamp: now,
        };

        if self.mode == ValidationMode::Enforced && !validation.is_valid() {
            return PaymentOutcome::Rejected {
                submission,
                validation,
                notice: Notice::error(REJECTED_MESSAGE),
            };
        }

        PaymentOutcome::Confirmed {
            submission,
            validation,
            notice: Notice::success(CONFIRMED_MESSAGE),
        }
    }
}

// ─────────────────────────────────────────────────────────
// Instructions & simulated confirmation
// ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentInstructions {
    pub method: &'static str,
    pub network: &'static str,
    pub address: String,
    pub memo: &'static str,
    pub confirmation: &'static str,
}

impl PaymentInstructions {
    pub fn usdt_trc20(address: impl Into<String>) -> Self {
        PaymentInstructions {
            method: PAYMENT_METHOD,
            network: "TRON (TRC20)",
            address: address.into(),
            memo: "Optional: Your email for report delivery",
            confirmation: "Usually 2-5 minutes",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulatedConfirmation {
    pub confirmed: bool,
    pub tx_hash: String,
    pub timestamp: DateTime<Utc>,
    pub blocks: u32,
}

/// Pretend to wait for the network. Always confirms.
pub async fn simulate_confirmation(tx_hash: String) -> SimulatedConfirmation {
    tokio::time::sleep(CONFIRMATION_DELAY).await;
    SimulatedConfirmation {
        confirmed: true,
        tx_hash,
        timestamp: Utc::now(),
        blocks: rand::thread_rng().gen_range(1..=10),
    }
}

// ─────────────────────────────────────────────────────────
// Copy address
// ─────────────────────────────────────────────────────────

/// Which copy technique worked on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CopyOutcome {
    /// `navigator.clipboard.writeText` succeeded.
    Clipboard,
    /// The hidden-textarea `execCommand("copy")` fallback succeeded.
    ManualSelection,
    Failed,
}

impl CopyOutcome {
    pub fn notice(self) -> Notice {
        match self {
            Self::Clipboard | Self::ManualSelection => {
                Notice::success("USDT address copied to clipboard!")
            }
            Self::Failed => Notice::error("Could not copy the address, please copy it manually"),
        }
    }
}
