//! Resolver configuration loaded from environment variables.

use std::env;

use crate::error::{Error, Result};

/// Resolver configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base directory of the local repository
    pub local_repository: String,

    /// Offline mode: no network operations are attempted
    pub offline: bool,

    /// User agent string for connectors to send with requests
    pub user_agent: String,

    /// Connect timeout in seconds, honored by connectors
    pub connect_timeout_secs: u64,

    /// Per-request timeout in seconds, honored by connectors
    pub request_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// `RESOLVER_LOCAL_REPO` overrides the local repository location; when
    /// unset it defaults to `$HOME/.m2/repository`, and if neither is
    /// available loading fails.
    pub fn from_env() -> Result<Self> {
        let local_repository = match env::var("RESOLVER_LOCAL_REPO") {
            Ok(path) => path,
            Err(_) => {
                let home = env::var("HOME").map_err(|_| {
                    Error::Config("RESOLVER_LOCAL_REPO not set and HOME unavailable".into())
                })?;
                format!("{}/.m2/repository", home)
            }
        };

        Ok(Self {
            local_repository,
            offline: env::var("RESOLVER_OFFLINE")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            user_agent: env::var("RESOLVER_USER_AGENT")
                .unwrap_or_else(|_| "artifact-resolver/0.1".into()),
            connect_timeout_secs: env::var("RESOLVER_CONNECT_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".into())
                .parse()
                .unwrap_or(10),
            request_timeout_secs: env::var("RESOLVER_REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| "60".into())
                .parse()
                .unwrap_or(60),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            local_repository: ".m2/repository".into(),
            offline: false,
            user_agent: "artifact-resolver/0.1".into(),
            connect_timeout_secs: 10,
            request_timeout_secs: 60,
        }
    }
}
