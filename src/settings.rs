use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use dotenv::dotenv;
use std::{env, fmt, str::FromStr, time::Duration};
use zeroize::Zeroizing;

use crate::entities::forms::FormType;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AppEnvironment {
    Development,
    Production,
    Testing,
}

impl FromStr for AppEnvironment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" => Ok(AppEnvironment::Development),
            "production" => Ok(AppEnvironment::Production),
            "testing" => Ok(AppEnvironment::Testing),
            _ => Err(ConfigError::Message(format!("Invalid environment: {}", s))),
        }
    }
}

/// Which delivery strategy this deployment uses. Exactly one is active.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    Smtp,
    RelayApi,
    Proxy,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransportKind::Smtp => "smtp",
            TransportKind::RelayApi => "relay_api",
            TransportKind::Proxy => "proxy",
        };
        write!(f, "{s}")
    }
}

/// What a submitter's rate-limit identity is keyed on.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum IdentityStrategy {
    #[default]
    Email,
    ClientIp,
    EmailAndIp,
}

#[derive(Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub struct AppConfig {
    #[serde(default = "default_env")]
    pub env: AppEnvironment,

    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    #[serde(default)]
    pub redis_url: Option<String>,

    #[serde(default = "default_cors_origins")]
    pub cors_allowed_origins: Vec<String>,

    #[serde(default)]
    pub trust_x_forwarded_for: bool,

    #[serde(default = "default_transport")]
    pub transport: TransportKind,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    // SMTP
    #[serde(default)]
    pub smtp_host: String,

    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    #[serde(default)]
    pub smtp_secure: bool,

    #[serde(default)]
    pub smtp_user: String,

    #[serde(default)]
    pub smtp_pass: String,

    #[serde(default)]
    pub smtp_from: Option<String>,

    // Destination addresses per form type
    #[serde(default = "default_email_contact")]
    pub email_contact: String,

    #[serde(default = "default_email_expert")]
    pub email_expert: String,

    #[serde(default = "default_email_careers")]
    pub email_careers: String,

    #[serde(default = "default_email_hr")]
    pub email_hr: String,

    #[serde(default = "default_email_general")]
    pub email_general: String,

    // Rate limiting
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_period_ms: u64,

    #[serde(default = "default_max_per_hour")]
    pub max_submissions_per_hour: u32,

    #[serde(default = "default_max_per_day")]
    pub max_submissions_per_day: u32,

    #[serde(default)]
    pub rate_limit_identity: IdentityStrategy,

    // Relay API
    #[serde(default = "default_relay_api_url")]
    pub relay_api_url: String,

    #[serde(default)]
    pub relay_service_id: String,

    #[serde(default)]
    pub relay_template_id: String,

    #[serde(default)]
    pub relay_public_key: String,

    #[serde(default)]
    pub relay_private_key: Option<String>,

    // Backend proxy
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

fn default_env() -> AppEnvironment {
    AppEnvironment::Development
}
fn default_name() -> String {
    "Scritique-Mailer".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_worker_count() -> usize {
    num_cpus::get()
}
fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}
fn default_transport() -> TransportKind {
    TransportKind::Smtp
}
fn default_request_timeout() -> u64 {
    10
}
fn default_smtp_port() -> u16 {
    587
}
fn default_email_contact() -> String {
    "contact@scritique.com".to_string()
}
fn default_email_expert() -> String {
    "expert@scritique.com".to_string()
}
fn default_email_careers() -> String {
    "careers@scritique.com".to_string()
}
fn default_email_hr() -> String {
    "hr@scritique.com".to_string()
}
fn default_email_general() -> String {
    "info@scritique.com".to_string()
}
fn default_cooldown_ms() -> u64 {
    60_000
}
fn default_max_per_hour() -> u32 {
    5
}
fn default_max_per_day() -> u32 {
    20
}
fn default_relay_api_url() -> String {
    "https://api.emailjs.com/api/v1.0/email/send".to_string()
}
fn default_api_base_url() -> String {
    String::new()
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            env: default_env(),
            name: default_name(),
            port: default_port(),
            host: default_host(),
            worker_count: default_worker_count(),
            redis_url: None,
            cors_allowed_origins: default_cors_origins(),
            trust_x_forwarded_for: false,
            transport: default_transport(),
            request_timeout_secs: default_request_timeout(),
            smtp_host: String::new(),
            smtp_port: default_smtp_port(),
            smtp_secure: false,
            smtp_user: String::new(),
            smtp_pass: String::new(),
            smtp_from: None,
            email_contact: default_email_contact(),
            email_expert: default_email_expert(),
            email_careers: default_email_careers(),
            email_hr: default_email_hr(),
            email_general: default_email_general(),
            cooldown_period_ms: default_cooldown_ms(),
            max_submissions_per_hour: default_max_per_hour(),
            max_submissions_per_day: default_max_per_day(),
            rate_limit_identity: IdentityStrategy::default(),
            relay_api_url: default_relay_api_url(),
            relay_service_id: String::new(),
            relay_template_id: String::new(),
            relay_public_key: String::new(),
            relay_private_key: None,
            api_base_url: default_api_base_url(),
        }
    }
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        dotenv().ok();

        let raw_env = env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let env_name = AppEnvironment::from_str(&raw_env)
            .map_err(|_| ConfigError::Message(format!("Invalid APP_ENV value: {}", raw_env)))?;

        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env_name)).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("cors_allowed_origins")
                    .ignore_empty(true),
            );

        let mut config: Self = builder.build()?.try_deserialize()?;

        config.env = env_name;

        config.validate()?;
        Ok(config)
    }

    /// Rejects values that would make the service misbehave. Missing mail
    /// credentials are not an error here; they surface through the health check.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.max_submissions_per_hour == 0 {
            errors.push("MAX_SUBMISSIONS_PER_HOUR must be greater than zero");
        }
        if self.max_submissions_per_day < self.max_submissions_per_hour {
            errors.push("MAX_SUBMISSIONS_PER_DAY cannot be lower than MAX_SUBMISSIONS_PER_HOUR");
        }
        if self.request_timeout_secs == 0 {
            errors.push("REQUEST_TIMEOUT_SECS must be greater than zero");
        }
        if i64::try_from(self.cooldown_period_ms).is_err() {
            errors.push("COOLDOWN_PERIOD_MS is out of range");
        }
        if self.transport == TransportKind::Proxy && !self.api_base_url.trim().is_empty() {
            match url::Url::parse(self.api_base_url.trim()) {
                Err(_) => errors.push("API_BASE_URL must be an absolute URL"),
                Ok(url) if self.is_own_address(&url) => {
                    errors.push("API_BASE_URL must not point at this service")
                }
                Ok(_) => {}
            }
        }
        if self.transport == TransportKind::RelayApi && url::Url::parse(&self.relay_api_url).is_err() {
            errors.push("RELAY_API_URL must be an absolute URL");
        }
        if self.is_production() && self.cors_origins().iter().any(|o| o == "*") {
            errors.push("Wildcard CORS (*) is not allowed in production");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Message(errors.join(", ")))
        }
    }

    /// Whether `url` would be served by this process: same port and a host
    /// that resolves here.
    fn is_own_address(&self, url: &url::Url) -> bool {
        if url.port_or_known_default() != Some(self.port) {
            return false;
        }
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.trim_start_matches('[').trim_end_matches(']');
        let is_local = |h: &str| {
            h.eq_ignore_ascii_case("localhost")
                || h.parse::<std::net::IpAddr>().is_ok_and(|ip| ip.is_loopback() || ip.is_unspecified())
        };
        host.eq_ignore_ascii_case(&self.host) || (is_local(host) && is_local(self.host.as_str()))
    }

    pub fn is_production(&self) -> bool {
        self.env == AppEnvironment::Production
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .iter()
            .flat_map(|origin| origin.split(','))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn smtp(&self) -> SmtpSettings {
        SmtpSettings {
            host: self.smtp_host.trim().to_string(),
            port: self.smtp_port,
            secure: self.smtp_secure,
            user: self.smtp_user.trim().to_string(),
            pass: Zeroizing::new(self.smtp_pass.clone()),
            from: self.smtp_from.clone().filter(|f| !f.trim().is_empty()),
        }
    }

    pub fn recipients(&self) -> RecipientSettings {
        RecipientSettings {
            contact: self.email_contact.clone(),
            expert: self.email_expert.clone(),
            careers: self.email_careers.clone(),
            job_application: self.email_hr.clone(),
            general: self.email_general.clone(),
        }
    }

    pub fn rate_limit_policy(&self) -> RateLimitPolicy {
        RateLimitPolicy {
            cooldown: i64::try_from(self.cooldown_period_ms)
                .ok()
                .and_then(chrono::Duration::try_milliseconds)
                .unwrap_or(chrono::Duration::MAX),
            max_per_hour: self.max_submissions_per_hour,
            max_per_day: self.max_submissions_per_day,
        }
    }

    pub fn relay_api(&self) -> RelayApiSettings {
        RelayApiSettings {
            url: self.relay_api_url.clone(),
            service_id: self.relay_service_id.trim().to_string(),
            template_id: self.relay_template_id.trim().to_string(),
            public_key: self.relay_public_key.trim().to_string(),
            private_key: self.relay_private_key.clone().map(Zeroizing::new),
        }
    }
}

#[derive(Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub secure: bool,
    pub user: String,
    pub pass: Zeroizing<String>,
    pub from: Option<String>,
}

impl SmtpSettings {
    /// Names of the required variables that are blank.
    pub fn missing_vars(&self) -> Vec<String> {
        [
            ("APP_SMTP_HOST", self.host.as_str()),
            ("APP_SMTP_USER", self.user.as_str()),
            ("APP_SMTP_PASS", self.pass.as_str()),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name.to_string())
        .collect()
    }

    pub fn sender(&self) -> &str {
        self.from.as_deref().unwrap_or(&self.user)
    }
}

impl fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("secure", &self.secure)
            .field("user", &self.user)
            .field("pass", &self.pass.redact())
            .field("from", &self.from)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecipientSettings {
    pub contact: String,
    pub expert: String,
    pub careers: String,
    pub job_application: String,
    pub general: String,
}

impl RecipientSettings {
    pub fn for_form(&self, form_type: FormType) -> &str {
        match form_type {
            FormType::Contact | FormType::ContactPopup => &self.contact,
            FormType::Expert => &self.expert,
            FormType::JobApplication => &self.job_application,
        }
    }

    /// Whether `address` is one of the site's own inboxes.
    pub fn contains(&self, address: &str) -> bool {
        let address = address.trim();
        [&self.contact, &self.expert, &self.careers, &self.job_application, &self.general]
            .into_iter()
            .any(|known| !known.is_empty() && known.eq_ignore_ascii_case(address))
    }
}

impl Default for RecipientSettings {
    fn default() -> Self {
        AppConfig::default().recipients()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimitPolicy {
    pub cooldown: chrono::Duration,
    pub max_per_hour: u32,
    pub max_per_day: u32,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        RateLimitPolicy {
            cooldown: chrono::Duration::milliseconds(default_cooldown_ms() as i64),
            max_per_hour: default_max_per_hour(),
            max_per_day: default_max_per_day(),
        }
    }
}

#[derive(Clone)]
pub struct RelayApiSettings {
    pub url: String,
    pub service_id: String,
    pub template_id: String,
    pub public_key: String,
    pub private_key: Option<Zeroizing<String>>,
}

impl RelayApiSettings {
    pub fn missing_vars(&self) -> Vec<String> {
        [
            ("APP_RELAY_SERVICE_ID", self.service_id.as_str()),
            ("APP_RELAY_TEMPLATE_ID", self.template_id.as_str()),
            ("APP_RELAY_PUBLIC_KEY", self.public_key.as_str()),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name.to_string())
        .collect()
    }
}

impl fmt::Debug for RelayApiSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayApiSettings")
            .field("url", &self.url)
            .field("service_id", &self.service_id)
            .field("template_id", &self.template_id)
            .field("public_key", &self.public_key.redact())
            .field("private_key", &self.private_key.as_ref().map(|k| k.redact()))
            .finish()
    }
}

impl fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AppEnvironment::Development => "development",
            AppEnvironment::Production => "production",
            AppEnvironment::Testing => "testing",
        };
        write!(f, "{s}")
    }
}

trait Redact {
    fn redact(&self) -> &str;
}

impl Redact for str {
    fn redact(&self) -> &str {
        if self.is_empty() {
            "[MISSING]"
        } else {
            "[REDACTED]"
        }
    }
}

impl Redact for String {
    fn redact(&self) -> &str {
        self.as_str().redact()
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("name", &self.name)
            .field("port", &self.port)
            .field("host", &self.host)
            .field("worker_count", &self.worker_count)
            .field("redis_url", &self.redis_url.as_ref().map(|u| u.redact()))
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("transport", &self.transport)
            .field("smtp", &self.smtp())
            .field("recipients", &self.recipients())
            .field("rate_limit", &self.rate_limit_policy())
            .field("rate_limit_identity", &self.rate_limit_identity)
            .field("relay_api", &self.relay_api())
            .field("api_base_url", &self.api_base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}
