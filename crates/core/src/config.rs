use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_u16(key: &str, default: u16) -> u16 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_f32(key: &str, default: f32) -> f32 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

/// Redact a secret for check output: first and last 4 chars survive,
/// everything else turns into stars. Short values are fully starred.
pub fn mask_secret(value: &str) -> String {
    let len = value.chars().count();
    if len <= 8 {
        return "*".repeat(len);
    }
    let head: String = value.chars().take(4).collect();
    let tail: String = value.chars().skip(len - 4).collect();
    format!("{}{}{}", head, "*".repeat(len - 8), tail)
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid TARGET_DATE {raw:?}: expected YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS")]
    InvalidTargetDate { raw: String },
    #[error("invalid EMAIL_CONNECTION_TYPE {raw:?}: expected SSL or STARTTLS")]
    InvalidTlsMode { raw: String },
}

// ── TLS mode ──────────────────────────────────────────────────

/// How the SMTP session gets its TLS layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsMode {
    /// TLS from the first byte (classic smtps, port 465).
    Implicit,
    /// Plain connect upgraded in-session (submission port 587).
    StartTls,
}

impl TlsMode {
    /// The mode a failed delivery falls back to.
    pub fn other(self) -> Self {
        match self {
            TlsMode::Implicit => TlsMode::StartTls,
            TlsMode::StartTls => TlsMode::Implicit,
        }
    }
}

impl fmt::Display for TlsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TlsMode::Implicit => write!(f, "SSL"),
            TlsMode::StartTls => write!(f, "STARTTLS"),
        }
    }
}

impl FromStr for TlsMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SSL" | "SMTPS" | "IMPLICIT" => Ok(TlsMode::Implicit),
            "TLS" | "STARTTLS" => Ok(TlsMode::StartTls),
            _ => Err(ConfigError::InvalidTlsMode { raw: s.to_string() }),
        }
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Config {
    /// The instant the countdown runs toward.
    pub target: NaiveDateTime,
    pub llm: LlmConfig,
    pub mail: MailConfig,
    pub retry: RetryConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            target: parse_target_date(&env_or("TARGET_DATE", "2025-12-21"))?,
            llm: LlmConfig::from_env(),
            mail: MailConfig::from_env()?,
            retry: RetryConfig::from_env(),
        })
    }

    /// Required settings that are absent from the environment.
    pub fn missing_settings(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.llm.api_key.is_none() {
            missing.push("DEEPSEEK_API_KEY");
        }
        if self.mail.host.is_none() {
            missing.push("EMAIL_HOST");
        }
        if self.mail.username.is_none() {
            missing.push("EMAIL_USER");
        }
        if self.mail.password.is_none() {
            missing.push("EMAIL_PASSWORD");
        }
        if self.mail.recipient.is_none() {
            missing.push("EMAIL_RECIPIENT");
        }
        missing
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded:");
        tracing::info!("  target: {}", self.target);
        tracing::info!(
            "  llm:    base={}, model={}, key={}",
            self.llm.base_url,
            self.llm.model,
            if self.llm.api_key.is_some() { "set" } else { "missing" },
        );
        tracing::info!(
            "  mail:   host={}, ports={}/{}, preferred={}, to={}",
            self.mail.host.as_deref().unwrap_or("(none)"),
            self.mail.implicit_tls_port,
            self.mail.starttls_port,
            self.mail.preferred,
            self.mail.recipient.as_deref().unwrap_or("(none)"),
        );
        tracing::info!(
            "  retry:  attempts={}, base={}s, cap={}s",
            self.retry.max_attempts,
            self.retry.base_delay.as_secs(),
            self.retry.max_delay.as_secs(),
        );
    }
}

/// Accept a bare date (midnight) or a full datetime, local naive time.
fn parse_target_date(raw: &str) -> Result<NaiveDateTime, ConfigError> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Ok(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|d| d.and_time(NaiveTime::MIN))
        .map_err(|_| ConfigError::InvalidTargetDate { raw: raw.to_string() })
}

// ── LLM (DeepSeek) ────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl LlmConfig {
    fn from_env() -> Self {
        Self {
            base_url: env_or("DEEPSEEK_API_BASE_URL", "https://api.deepseek.com"),
            api_key: env_opt("DEEPSEEK_API_KEY"),
            model: env_or("DEEPSEEK_MODEL", "deepseek-chat"),
            temperature: env_f32("LLM_TEMPERATURE", 0.7),
            max_tokens: env_u32("LLM_MAX_TOKENS", 200),
            timeout: Duration::from_secs(env_u64("LLM_TIMEOUT_SECS", 30)),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

// ── Mail (SMTP) ───────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub host: Option<String>,
    pub implicit_tls_port: u16,
    pub starttls_port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Sender mailbox; falls back to the SMTP username.
    pub from: Option<String>,
    pub recipient: Option<String>,
    /// Where exhaustion alerts go; falls back to the SMTP username.
    pub operator: Option<String>,
    pub preferred: TlsMode,
    pub subject_prefix: String,
    pub signature: String,
    pub timeout: Duration,
}

impl MailConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let username = env_opt("EMAIL_USER");
        Ok(Self {
            host: env_opt("EMAIL_HOST"),
            implicit_tls_port: env_u16("EMAIL_PORT_SSL", 465),
            starttls_port: env_u16("EMAIL_PORT_TLS", 587),
            from: env_opt("EMAIL_FROM").or_else(|| username.clone()),
            operator: env_opt("EMAIL_OPERATOR").or_else(|| username.clone()),
            username,
            password: env_opt("EMAIL_PASSWORD"),
            recipient: env_opt("EMAIL_RECIPIENT"),
            preferred: env_or("EMAIL_CONNECTION_TYPE", "SSL").parse()?,
            subject_prefix: env_or("EMAIL_SUBJECT", "Daily countdown"),
            signature: env_or("EMAIL_SIGNATURE", "Your countdown courier"),
            timeout: Duration::from_secs(env_u64("EMAIL_TIMEOUT_SECS", 10)),
        })
    }

    /// Port the given mode connects to.
    pub fn port_for(&self, mode: TlsMode) -> u16 {
        match mode {
            TlsMode::Implicit => self.implicit_tls_port,
            TlsMode::StartTls => self.starttls_port,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.host.is_some()
            && self.username.is_some()
            && self.password.is_some()
            && self.recipient.is_some()
    }
}

// ── Retry ─────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryConfig {
    fn from_env() -> Self {
        Self {
            max_attempts: env_u32("RETRY_MAX_ATTEMPTS", 3),
            base_delay: Duration::from_secs(env_u64("RETRY_BASE_DELAY_SECS", 3600)),
            max_delay: Duration::from_secs(env_u64("RETRY_MAX_DELAY_SECS", 3600)),
        }
    }
}
