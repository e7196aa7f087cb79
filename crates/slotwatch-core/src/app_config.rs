use std::net::SocketAddr;
use std::path::PathBuf;

/// How the wait between retries of one target grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffStrategy {
    /// Same delay before every retry.
    Fixed,
    /// Delay doubles with every retry, capped at one minute.
    Exponential,
}

impl std::fmt::Display for BackoffStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackoffStrategy::Fixed => write!(f, "fixed"),
            BackoffStrategy::Exponential => write!(f, "exponential"),
        }
    }
}

/// Anonymizing proxy and its control channel.
#[derive(Clone)]
pub struct TorConfig {
    pub socks_proxy: String,
    pub control_addr: SocketAddr,
    pub control_password: Option<String>,
    pub control_timeout_secs: u64,
}

impl std::fmt::Debug for TorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TorConfig")
            .field("socks_proxy", &self.socks_proxy)
            .field("control_addr", &self.control_addr)
            .field(
                "control_password",
                &self.control_password.as_ref().map(|_| "[redacted]"),
            )
            .field("control_timeout_secs", &self.control_timeout_secs)
            .finish()
    }
}

/// Authenticated mail submission settings. Present only when `SMTP_HOST` is set.
#[derive(Clone)]
pub struct MailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
    pub to: String,
    pub subject: String,
    pub template_path: Option<PathBuf>,
}

impl std::fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("subject", &self.subject)
            .field("template_path", &self.template_path)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub targets_path: PathBuf,
    pub base_url: String,
    pub workers: usize,
    pub polling_delay_secs: u64,
    pub limit_secs: u64,
    pub request_timeout_secs: u64,
    /// Retries after the first attempt. `None` retries forever.
    pub max_retries: Option<u32>,
    pub retry_backoff_ms: u64,
    pub retry_backoff: BackoffStrategy,
    pub max_rotation_failures: u32,
    pub max_log_failures: u32,
    pub result_log_path: PathBuf,
    pub tor: TorConfig,
    pub mail: Option<MailConfig>,
}
