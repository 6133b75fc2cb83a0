use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;
use crate::error::{AppError, Result};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// The single storefront this service knows how to read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SiteConfig {
    /// Shown to users and stripped from the end of `<title>`.
    pub name: String,
    /// Substring every accepted product URL must contain.
    pub domain: String,
    /// Substring every kept image URL must contain.
    pub image_marker: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        SiteConfig {
            name: "Meesho".to_string(),
            domain: "meesho.com".to_string(),
            image_marker: "meesho".to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: SocketAddr,
    pub site: SiteConfig,
    pub user_agent: String,
    pub fetch_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            site: SiteConfig::default(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            fetch_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(15),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load environment variables from .env file if it exists
        dotenv::dotenv().ok();

        Self::from_vars(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup, falling back to defaults for
    /// keys that are not set.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let site_defaults = SiteConfig::default();

        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = lookup("PORT").unwrap_or_else(|| "3000".to_string());
        let port = port.parse::<u16>().map_err(|e| AppError::ConfigError(format!("Invalid port: {}", e)))?;
        let ip = IpAddr::from_str(&host).map_err(|e| AppError::ConfigError(format!("Invalid host address: {}", e)))?;

        let site = SiteConfig {
            name: non_empty(&lookup, "SITE_NAME")?.unwrap_or(site_defaults.name),
            domain: non_empty(&lookup, "SITE_DOMAIN")?.unwrap_or(site_defaults.domain),
            image_marker: non_empty(&lookup, "IMAGE_MARKER")?.unwrap_or(site_defaults.image_marker),
        };

        let user_agent = non_empty(&lookup, "USER_AGENT")?.unwrap_or(defaults.user_agent);
        let fetch_timeout = seconds(&lookup, "FETCH_TIMEOUT_SECS")?.unwrap_or(defaults.fetch_timeout);
        let request_timeout = seconds(&lookup, "REQUEST_TIMEOUT_SECS")?.unwrap_or(defaults.request_timeout);

        Ok(Config {
            server_addr: SocketAddr::new(ip, port),
            site,
            user_agent,
            fetch_timeout,
            request_timeout,
        })
    }
}

fn non_empty<F>(lookup: &F, key: &str) -> Result<Option<String>>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if value.trim().is_empty() => {
            Err(AppError::ConfigError(format!("{} must not be empty", key)))
        }
        other => Ok(other.map(|v| v.trim().to_string())),
    }
}

fn seconds<F>(lookup: &F, key: &str) -> Result<Option<Duration>>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };

    let secs = raw
        .trim()
        .parse::<u64>()
        .map_err(|e| AppError::ConfigError(format!("Invalid {}: {}", key, e)))?;

    if secs == 0 {
        return Err(AppError::ConfigError(format!("{} must be greater than zero", key)));
    }

    Ok(Some(Duration::from_secs(secs)))
}
