//! Environment configuration loading.
//!
//! All settings come from the process environment (optionally seeded from a
//! `.env` file in `main`), validated into a typed [`Config`].

use shamba_core::config::{DEFAULT_MPESA_BASE_URL, MpesaConfig};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use thiserror::Error;
use url::Url;

/// Default listen port, matching the storefront's expectations.
const DEFAULT_PORT: u16 = 3001;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    MissingVar(&'static str),

    #[error("invalid value for {name}: {message}")]
    Invalid { name: &'static str, message: String },
}

/// Validated server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address and port the HTTP server binds to.
    pub listen: SocketAddr,
    /// Bearer token for the administrative endpoints.
    pub admin_token: String,
    /// Daraja gateway credentials and routing.
    pub mpesa: MpesaConfig,
}

impl Config {
    /// Read and validate the configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match optional("PORT") {
            Some(raw) => raw.parse().map_err(|e| ConfigError::Invalid {
                name: "PORT",
                message: format!("{e}"),
            })?,
            None => DEFAULT_PORT,
        };

        let callback_url = parse_url("MPESA_CALLBACK_URL", required("MPESA_CALLBACK_URL")?)?;
        let base_url = match optional("MPESA_BASE_URL") {
            Some(raw) => parse_url("MPESA_BASE_URL", raw)?,
            None => default_base_url(),
        };

        Ok(Self {
            listen: listen_addr(port),
            admin_token: required("ADMIN_TOKEN")?,
            mpesa: MpesaConfig {
                consumer_key: required("MPESA_CONSUMER_KEY")?,
                consumer_secret: required("MPESA_CONSUMER_SECRET")?,
                business_short_code: required("MPESA_BUSINESS_SHORT_CODE")?,
                passkey: required("MPESA_PASSKEY")?,
                callback_url,
                base_url,
            },
        })
    }
}

fn listen_addr(port: u16) -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port)
}

fn default_base_url() -> Url {
    match DEFAULT_MPESA_BASE_URL.parse() {
        Ok(url) => url,
        // The constant is a valid URL; this arm is unreachable.
        Err(e) => unreachable!("default base url: {e}"),
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    optional(name).ok_or(ConfigError::MissingVar(name))
}

fn optional(name: &'static str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_url(name: &'static str, raw: String) -> Result<Url, ConfigError> {
    raw.parse().map_err(|e| ConfigError::Invalid {
        name,
        message: format!("{e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_listen_is_all_interfaces() {
        let addr = listen_addr(DEFAULT_PORT);
        assert_eq!(addr.port(), 3001);
        assert!(addr.ip().is_unspecified());
    }

    #[test]
    fn default_base_url_is_the_sandbox() {
        assert_eq!(
            default_base_url().as_str(),
            "https://sandbox.safaricom.co.ke/"
        );
    }
}
