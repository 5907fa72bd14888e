// src/config.rs

//! Process configuration.
//!
//! Everything here is resolved once at startup from environment variables
//! (optionally loaded from a `.env` file) and is read-only afterwards. Handlers
//! receive it as `web::Data<AppConfig>`.

use std::{env, net::SocketAddr, path::PathBuf};

use crate::error::ConfigError;

pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3328";
const WILDCARD: &str = "*";

/// Build flavour. Development mode relaxes CORS and pretty prints listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Development,
    Production,
}

impl Mode {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "dev" | "development" => Ok(Mode::Development),
            "prod" | "production" => Ok(Mode::Production),
            _ => Err(ConfigError::invalid("MOEFILE_MODE", value)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub mode: Mode,
    /// Reported as the bucket name in listings and in the `Server` header.
    pub server_name: String,
    pub listen_addr: SocketAddr,
    pub root_path: PathBuf,
    /// Comma separated CORS allow-list; `*` matches any origin.
    pub allowed_origins: String,
    pub xml_indent: bool,
    /// Embed the XSLT stylesheet so listings render in a browser.
    pub xml_stylesheet: bool,
}

impl AppConfig {
    /// Reads the `MOEFILE_*` variables. Unset variables take their defaults;
    /// unparsable ones are a startup error.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mode = match env::var("MOEFILE_MODE") {
            Ok(value) => Mode::parse(&value)?,
            Err(_) => Mode::Production,
        };
        let is_dev = mode == Mode::Development;

        let listen = var_or("MOEFILE_LISTEN", DEFAULT_LISTEN_ADDR);
        let listen_addr = listen
            .parse()
            .map_err(|_| ConfigError::invalid("MOEFILE_LISTEN", &listen))?;

        Ok(Self {
            mode,
            server_name: var_or("MOEFILE_SERVER_NAME", APP_NAME),
            listen_addr,
            root_path: PathBuf::from(var_or("MOEFILE_ROOT", ".")),
            allowed_origins: var_or("MOEFILE_ORIGINS", if is_dev { WILDCARD } else { "" }),
            xml_indent: bool_var("MOEFILE_XML_INDENT", is_dev)?,
            xml_stylesheet: bool_var("MOEFILE_XSLT", true)?,
        })
    }

    pub fn is_development(&self) -> bool {
        self.mode == Mode::Development
    }

    /// Default log filter handed to env_logger when `RUST_LOG` is unset.
    pub fn default_log_filter(&self) -> &'static str {
        if self.is_development() {
            "debug"
        } else {
            "info"
        }
    }

    pub fn cors_max_age(&self) -> &'static str {
        if self.is_development() {
            "0"
        } else {
            "3600"
        }
    }

    pub fn server_header(&self) -> String {
        format!("{}/{} ({})", APP_NAME, APP_VERSION, self.server_name)
    }

    pub fn is_allowed_origin(&self, origin: &str) -> bool {
        if origin.is_empty() {
            return false;
        }
        self.allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|allow| !allow.is_empty())
            .any(|allow| allow == WILDCARD || allow == origin)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Production,
            server_name: APP_NAME.to_string(),
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 3328)),
            root_path: PathBuf::from("."),
            allowed_origins: String::new(),
            xml_indent: false,
            xml_stylesheet: true,
        }
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn bool_var(key: &'static str, default: bool) -> Result<bool, ConfigError> {
    let Ok(value) = env::var(key) else {
        return Ok(default);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid(key, &value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_origins(origins: &str) -> AppConfig {
        AppConfig {
            allowed_origins: origins.to_string(),
            ..AppConfig::default()
        }
    }

    #[test]
    fn wildcard_allows_any_origin() {
        assert!(with_origins("*").is_allowed_origin("https://a.example"));
        assert!(with_origins("https://b.example, *").is_allowed_origin("https://a.example"));
    }

    #[test]
    fn exact_origin_match_only() {
        let config = with_origins(" https://a.example , https://b.example ");
        assert!(config.is_allowed_origin("https://a.example"));
        assert!(config.is_allowed_origin("https://b.example"));
        assert!(!config.is_allowed_origin("https://c.example"));
        assert!(!config.is_allowed_origin("https://a.example.evil"));
    }

    #[test]
    fn empty_allow_list_rejects_everything() {
        assert!(!with_origins("").is_allowed_origin("https://a.example"));
    }

    #[test]
    fn mode_parsing() {
        assert_eq!(Mode::parse("DEV").ok(), Some(Mode::Development));
        assert_eq!(Mode::parse("production").ok(), Some(Mode::Production));
        assert!(Mode::parse("staging").is_err());
    }

    #[test]
    fn server_header_names_instance() {
        let config = AppConfig {
            server_name: "nas".to_string(),
            ..AppConfig::default()
        };
        assert_eq!(
            config.server_header(),
            format!("moefile/{} (nas)", APP_VERSION)
        );
    }
}
