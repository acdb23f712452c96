//! Core configuration structures for the slotrace reservation racer

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use slotrace_types::{CartMode, PayType};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Remote API and session identity
    #[serde(default)]
    pub session: SessionConfig,

    /// Race timing and parallelism
    #[serde(default)]
    pub race: RaceConfig,

    /// Background refresh loops
    #[serde(default)]
    pub daemon: DaemonConfig,

    /// Success notification
    #[serde(default)]
    pub notify: NotifyConfig,

    /// Logging
    #[serde(default)]
    pub log: LogConfig,
}

/// Session credential, client profile and checkout selections
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session cookie (`DDXQSESSID=` prefix optional)
    #[serde(default)]
    pub cookie: String,

    /// Base URL of the shopping endpoints (cart, order, reservation)
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Base URL of the account endpoints (user, address book)
    #[serde(default = "default_user_base_url")]
    pub user_base_url: String,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default = "default_app_version")]
    pub app_version: String,

    #[serde(default = "default_channel")]
    pub channel: String,

    #[serde(default = "default_app_client_id")]
    pub app_client_id: String,

    #[serde(default)]
    pub pay_type: PayType,

    #[serde(default)]
    pub cart_mode: CartMode,

    /// Address book index to use when no address is flagged as default
    #[serde(default)]
    pub address_index: Option<usize>,
}

/// Race timing and parallelism
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceConfig {
    /// Base request interval in milliseconds; every backoff adds up to 50% jitter
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Redundant submissions per open window
    #[serde(default = "default_one")]
    pub slot_multiplier: u32,

    /// Concurrent supervisor loops
    #[serde(default = "default_one")]
    pub parallelism: u32,

    /// Delay between supervisor loop starts in milliseconds
    #[serde(default = "default_stagger_ms")]
    pub stagger_ms: u64,

    /// Pause after an unwinnable error before reporting it, in seconds
    #[serde(default = "default_fatal_cooldown_secs")]
    pub fatal_cooldown_secs: u64,

    /// Hard wall-clock limit for the whole run, in seconds
    #[serde(default = "default_max_run_secs")]
    pub max_run_secs: u64,

    /// Time of day (`HH:MM:SS[.fff]`) before which nothing is submitted
    #[serde(default = "default_start_gate")]
    pub start_gate: Option<String>,

    /// Time of day the run starts at; the process sleeps until its next occurrence
    #[serde(default = "default_launch_at")]
    pub launch_at: Option<String>,

    /// Cap on simultaneously outstanding order submissions
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight_submissions: u32,
}

/// Background refresh loops
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Pause between request template rebuilds in milliseconds
    #[serde(default = "default_template_refresh_ms")]
    pub template_refresh_ms: u64,

    /// Base pause between cart / order-check polls in milliseconds
    #[serde(default = "default_interval_ms")]
    pub poll_interval_ms: u64,
}

/// Success notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Bark device key; notifications are skipped without it
    #[serde(default)]
    pub bark_key: Option<String>,

    #[serde(default = "default_bark_url")]
    pub bark_url: String,

    /// Number of push notifications sent after a win
    #[serde(default = "default_notify_attempts")]
    pub attempts: u32,

    /// Pause between push notifications in seconds
    #[serde(default = "default_notify_spacing_secs")]
    pub spacing_secs: u64,

    /// Times the success banner is logged
    #[serde(default = "default_banner_repeats")]
    pub banner_repeats: u32,
}

/// Logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` takes precedence
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

impl RaceConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn stagger(&self) -> Duration {
        Duration::from_millis(self.stagger_ms)
    }

    pub fn fatal_cooldown(&self) -> Duration {
        Duration::from_secs(self.fatal_cooldown_secs)
    }

    pub fn max_run(&self) -> Duration {
        Duration::from_secs(self.max_run_secs)
    }

    pub fn start_gate_time(&self) -> std::result::Result<Option<NaiveTime>, String> {
        self.start_gate.as_deref().map(parse_time_of_day).transpose()
    }

    pub fn launch_time(&self) -> std::result::Result<Option<NaiveTime>, String> {
        self.launch_at.as_deref().map(parse_time_of_day).transpose()
    }
}

impl DaemonConfig {
    pub fn template_refresh(&self) -> Duration {
        Duration::from_millis(self.template_refresh_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl NotifyConfig {
    pub fn spacing(&self) -> Duration {
        Duration::from_secs(self.spacing_secs)
    }
}

/// Parse `HH:MM:SS` or `HH:MM:SS.fff`
pub fn parse_time_of_day(value: &str) -> std::result::Result<NaiveTime, String> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M:%S%.f")
        .map_err(|e| format!("invalid time of day '{value}': {e}"))
}

// Default value functions
fn default_api_base_url() -> String {
    "https://maicai.api.ddxq.mobi".to_string()
}

fn default_user_base_url() -> String {
    "https://sunquan.api.ddxq.mobi".to_string()
}

fn default_api_version() -> String {
    "9.50.0".to_string()
}

fn default_app_version() -> String {
    "2.83.0".to_string()
}

fn default_channel() -> String {
    "applet".to_string()
}

fn default_app_client_id() -> String {
    "4".to_string()
}

fn default_interval_ms() -> u64 {
    200
}

fn default_one() -> u32 {
    1
}

fn default_stagger_ms() -> u64 {
    400
}

fn default_fatal_cooldown_secs() -> u64 {
    10
}

fn default_max_run_secs() -> u64 {
    480 // 8 minutes
}

fn default_start_gate() -> Option<String> {
    Some("05:59:59.899".to_string())
}

fn default_launch_at() -> Option<String> {
    Some("05:59:40".to_string())
}

fn default_max_in_flight() -> u32 {
    64
}

fn default_template_refresh_ms() -> u64 {
    1
}

fn default_bark_url() -> String {
    "https://api.day.app".to_string()
}

fn default_notify_attempts() -> u32 {
    120
}

fn default_notify_spacing_secs() -> u64 {
    2
}

fn default_banner_repeats() -> u32 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie: String::new(),
            api_base_url: default_api_base_url(),
            user_base_url: default_user_base_url(),
            api_version: default_api_version(),
            app_version: default_app_version(),
            channel: default_channel(),
            app_client_id: default_app_client_id(),
            pay_type: PayType::default(),
            cart_mode: CartMode::default(),
            address_index: None,
        }
    }
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            slot_multiplier: default_one(),
            parallelism: default_one(),
            stagger_ms: default_stagger_ms(),
            fatal_cooldown_secs: default_fatal_cooldown_secs(),
            max_run_secs: default_max_run_secs(),
            start_gate: default_start_gate(),
            launch_at: default_launch_at(),
            max_in_flight_submissions: default_max_in_flight(),
        }
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            template_refresh_ms: default_template_refresh_ms(),
            poll_interval_ms: default_interval_ms(),
        }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            bark_key: None,
            bark_url: default_bark_url(),
            attempts: default_notify_attempts(),
            spacing_secs: default_notify_spacing_secs(),
            banner_repeats: default_banner_repeats(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
