use crate::app_config::{AppConfig, BackoffStrategy, MailConfig, TorConfig};
use crate::ConfigError;

/// One year, the default total run limit.
const DEFAULT_LIMIT_SECS: &str = "31536000";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Parsing and validation are decoupled from the real environment so tests
/// can drive this with a plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u16 = |var: &str, default: &str| -> Result<u16, ConfigError> {
        or_default(var, default)
            .parse::<u16>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let log_level = or_default("SLOTWATCH_LOG_LEVEL", "info");
    let targets_path = PathBuf::from(or_default(
        "SLOTWATCH_TARGETS_PATH",
        "./config/targets.yaml",
    ));

    let base_url = or_default(
        "SLOTWATCH_BASE_URL",
        "https://service.berlin.de/terminvereinbarung/termin/tag.php",
    );
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(invalid(
            "SLOTWATCH_BASE_URL",
            format!("\"{base_url}\" must start with http:// or https://"),
        ));
    }

    let workers = parse_usize("SLOTWATCH_WORKERS", "3")?;
    if workers == 0 {
        return Err(invalid("SLOTWATCH_WORKERS", "must be at least 1".to_string()));
    }

    let polling_delay_secs = parse_u64("SLOTWATCH_POLLING_DELAY_SECS", "30")?;
    let limit_secs = parse_u64("SLOTWATCH_LIMIT_SECS", DEFAULT_LIMIT_SECS)?;
    let request_timeout_secs = parse_u64("SLOTWATCH_REQUEST_TIMEOUT_SECS", "30")?;
    let max_retries = parse_max_retries(&or_default("SLOTWATCH_MAX_RETRIES", "3"))?;
    let retry_backoff_ms = parse_u64("SLOTWATCH_RETRY_BACKOFF_MS", "2000")?;
    let retry_backoff = parse_backoff_strategy(&or_default("SLOTWATCH_RETRY_BACKOFF", "fixed"))?;
    let max_rotation_failures = parse_u32("SLOTWATCH_MAX_ROTATION_FAILURES", "5")?;
    let max_log_failures = parse_u32("SLOTWATCH_MAX_LOG_FAILURES", "3")?;
    let result_log_path = PathBuf::from(or_default("SLOTWATCH_RESULT_LOG_PATH", "./dates.log"));

    let control_addr_raw = or_default("TOR_CONTROL_ADDR", "127.0.0.1:9051");
    let control_addr = control_addr_raw
        .parse::<SocketAddr>()
        .map_err(|e| invalid("TOR_CONTROL_ADDR", e.to_string()))?;
    let tor = TorConfig {
        socks_proxy: or_default("TOR_SOCKS_PROXY", "socks5h://127.0.0.1:9050"),
        control_addr,
        control_password: lookup("TOR_CONTROL_PASSWORD").ok(),
        control_timeout_secs: parse_u64("TOR_CONTROL_TIMEOUT_SECS", "10")?,
    };

    let mail = match lookup("SMTP_HOST") {
        Ok(smtp_host) => {
            let username = require("SMTP_USERNAME")?;
            let from = lookup("MAIL_FROM").unwrap_or_else(|_| username.clone());
            Some(MailConfig {
                smtp_host,
                smtp_port: parse_u16("SMTP_PORT", "587")?,
                password: require("SMTP_PASSWORD")?,
                to: require("MAIL_TO")?,
                subject: or_default("MAIL_SUBJECT", "Freier Buergeramtstermin"),
                template_path: lookup("MAIL_TEMPLATE_PATH").ok().map(PathBuf::from),
                from,
                username,
            })
        }
        Err(_) => None,
    };

    Ok(AppConfig {
        log_level,
        targets_path,
        base_url,
        workers,
        polling_delay_secs,
        limit_secs,
        request_timeout_secs,
        max_retries,
        retry_backoff_ms,
        retry_backoff,
        max_rotation_failures,
        max_log_failures,
        result_log_path,
        tor,
        mail,
    })
}

/// Parse the retry bound. `unbounded` disables the bound entirely.
fn parse_max_retries(s: &str) -> Result<Option<u32>, ConfigError> {
    if s.eq_ignore_ascii_case("unbounded") {
        return Ok(None);
    }
    s.parse::<u32>()
        .map(Some)
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: "SLOTWATCH_MAX_RETRIES".to_string(),
            reason: format!("{e}; expected a number or \"unbounded\""),
        })
}

fn parse_backoff_strategy(s: &str) -> Result<BackoffStrategy, ConfigError> {
    match s {
        "fixed" => Ok(BackoffStrategy::Fixed),
        "exponential" => Ok(BackoffStrategy::Exponential),
        other => Err(ConfigError::InvalidEnvVar {
            var: "SLOTWATCH_RETRY_BACKOFF".to_string(),
            reason: format!("unknown strategy \"{other}\"; expected fixed or exponential"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
