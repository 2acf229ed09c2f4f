//! Process configuration, read once at startup and handed to every handler
//! through `AppState`.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use crate::error::AppError;

pub const DEFAULT_LEDGER_RPC_URL: &str = "http://127.0.0.1:8545";
pub const DEFAULT_PINATA_API_URL: &str = "https://api.pinata.cloud";
pub const DEFAULT_IPFS_GATEWAY_URL: &str = "https://gateway.pinata.cloud/ipfs";

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    /// JSON-RPC endpoint exposing the campaign contract's read methods.
    pub ledger_rpc_url: String,
    /// Write/query credential for the pinning service. Absence is reported
    /// when a request needs it, not at startup.
    pub pinata_jwt: Option<String>,
    pub pinata_api_url: String,
    pub ipfs_gateway_url: String,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    /// Decimals used to render minor-unit amounts as display strings.
    pub amount_decimals: u32,
    pub rate_limit_burst: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            ledger_rpc_url: DEFAULT_LEDGER_RPC_URL.to_string(),
            pinata_jwt: None,
            pinata_api_url: DEFAULT_PINATA_API_URL.to_string(),
            ipfs_gateway_url: DEFAULT_IPFS_GATEWAY_URL.to_string(),
            read_timeout: Duration::from_secs(10),
            write_timeout: Duration::from_secs(30),
            amount_decimals: 18,
            rate_limit_burst: 30,
        }
    }
}

impl Config {
    /// Build the configuration from the environment (after `.env` has been loaded).
    pub fn from_env() -> Result<Self, AppError> {
        let defaults = Config::default();

        let bind_addr = match env::var("BIND_ADDR") {
            Ok(raw) => raw
                .parse()
                .map_err(|e| AppError::Configuration(format!("invalid BIND_ADDR '{}': {}", raw, e)))?,
            Err(_) => defaults.bind_addr,
        };

        let pinata_jwt = env::var("PINATA_JWT")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        Ok(Self {
            bind_addr,
            ledger_rpc_url: url_var("LEDGER_RPC_URL", defaults.ledger_rpc_url)?,
            pinata_jwt,
            pinata_api_url: url_var("PINATA_API_URL", defaults.pinata_api_url)?,
            ipfs_gateway_url: url_var("IPFS_GATEWAY_URL", defaults.ipfs_gateway_url)?,
            read_timeout: timeout_var("READ_TIMEOUT_SECS", defaults.read_timeout)?,
            write_timeout: timeout_var("WRITE_TIMEOUT_SECS", defaults.write_timeout)?,
            amount_decimals: parse_var("AMOUNT_DECIMALS", defaults.amount_decimals)?,
            rate_limit_burst: parse_var("RATE_LIMIT_BURST", defaults.rate_limit_burst)?,
        })
    }

    /// Returns the pinning credential or a configuration error naming it.
    pub fn require_pinata_jwt(&self) -> Result<&str, AppError> {
        self.pinata_jwt
            .as_deref()
            .ok_or_else(|| AppError::Configuration("PINATA_JWT is not configured".to_string()))
    }
}

/// Read an upstream endpoint, rejecting anything that is not an http(s) URL.
fn url_var(name: &str, default: String) -> Result<String, AppError> {
    let raw = env::var(name).unwrap_or(default);
    check_url(name, raw.trim())
}

fn check_url(name: &str, raw: &str) -> Result<String, AppError> {
    let parsed = url::Url::parse(raw)
        .map_err(|e| AppError::Configuration(format!("invalid {} '{}': {}", name, raw, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(raw.to_string()),
        other => Err(AppError::Configuration(format!(
            "invalid {} '{}': unsupported scheme {}",
            name, raw, other
        ))),
    }
}

fn timeout_var(name: &str, default: Duration) -> Result<Duration, AppError> {
    let secs = parse_var(name, default.as_secs())?;
    non_zero_timeout(name, secs)
}

/// A zero timeout would fail every upstream call immediately.
fn non_zero_timeout(name: &str, secs: u64) -> Result<Duration, AppError> {
    if secs == 0 {
        return Err(AppError::Configuration(format!("{} must be at least 1 second", name)));
    }
    Ok(Duration::from_secs(secs))
}

fn parse_var<T>(name: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Configuration(format!("invalid {} '{}': {}", name, raw, e))),
        Err(_) => Ok(default),
    }
}
