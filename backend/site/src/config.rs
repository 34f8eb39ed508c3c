//! Application configuration loaded from environment variables.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::{Result, SiteError};
use crate::payment::ValidationMode;

pub const DEFAULT_USDT_ADDRESS: &str = "TGvyTtKBiSY5RHsfWipRdTjpWroeQSGLTC";
pub const DEFAULT_SAMPLE_REPORT_PATH: &str = "pdf-templates/Matrix_Intelligence_Report";

#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the HTTP server
    pub site_port: u16,
    /// TRC20 wallet address shown in the payment block
    pub usdt_address: String,
    /// Whether a short transaction hash blocks the confirmation notice
    pub validation_mode: ValidationMode,
    /// How long a notification stays visible
    pub notification_ttl: Duration,
    /// Delay between the demo receipt and the simulated delivery
    pub demo_delivery_delay: Duration,
    /// Inactivity after which a visitor's selection and toast are dropped
    pub visitor_idle: Duration,
    /// Directory holding `demo-report.html` & co; built-ins are used when unset
    pub templates_dir: Option<PathBuf>,
    /// Pre-built sample report served by `/reports/sample`
    pub sample_report_path: PathBuf,
    /// HTML→PDF service; the print fallback is used when unset
    pub rasterizer_url: Option<String>,
    pub rasterizer_timeout: Duration,
    /// Fire-and-forget tracking endpoint
    pub analytics_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            site_port: 3000,
            usdt_address: DEFAULT_USDT_ADDRESS.to_string(),
            validation_mode: ValidationMode::Enforced,
            notification_ttl: Duration::from_millis(5000),
            demo_delivery_delay: Duration::from_millis(2000),
            visitor_idle: Duration::from_secs(1800),
            templates_dir: None,
            sample_report_path: PathBuf::from(DEFAULT_SAMPLE_REPORT_PATH),
            rasterizer_url: None,
            rasterizer_timeout: Duration::from_secs(30),
            analytics_url: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key/value source. Unset and blank values
    /// both fall back to the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Config::default();

        Ok(Config {
            site_port: parse_var(&var, "SITE_PORT")?.unwrap_or(defaults.site_port),
            usdt_address: var("USDT_ADDRESS").unwrap_or(defaults.usdt_address),
            validation_mode: parse_var(&var, "PAYMENT_VALIDATION")?
                .unwrap_or(defaults.validation_mode),
            notification_ttl: parse_var(&var, "NOTIFICATION_TTL_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.notification_ttl),
            demo_delivery_delay: parse_var(&var, "DEMO_DELIVERY_DELAY_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.demo_delivery_delay),
            visitor_idle: parse_var(&var, "VISITOR_IDLE_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.visitor_idle),
            templates_dir: var("TEMPLATES_DIR").map(PathBuf::from),
            sample_report_path: var("SAMPLE_REPORT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.sample_report_path),
            rasterizer_url: var("RASTERIZER_URL"),
            rasterizer_timeout: parse_var(&var, "RASTERIZER_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.rasterizer_timeout),
            analytics_url: var("ANALYTICS_URL"),
        })
    }
}

fn parse_var<T: FromStr>(var: impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>> {
    var(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|_| SiteError::Config(format!("Invalid {key}: {raw}")))
        })
        .transpose()
}
