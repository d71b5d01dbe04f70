use thiserror::Error;

use crate::feature::{FeatureTab, ParseTabError};

pub const LOGIN_LATENCY_VAR: &str = "PORTAL_LOGIN_LATENCY";
pub const FETCH_LATENCY_VAR: &str = "PORTAL_FETCH_LATENCY";
pub const INITIAL_TAB_VAR: &str = "PORTAL_INITIAL_TAB";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{var}: `{value}` is not a number of turns")]
    InvalidLatency { var: &'static str, value: String },
    #[error("{var}: {source}")]
    InvalidTab {
        var: &'static str,
        #[source]
        source: ParseTabError,
    },
}

/// Settings for the mocked portal backend and the logged-in shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalConfig {
    pub demo_member_id: String,
    pub demo_password: String,
    pub demo_member_name: String,
    pub demo_token: String,
    /// Turns a login takes to resolve.
    pub login_latency: u32,
    /// Turns a member or card fetch takes to resolve.
    pub fetch_latency: u32,
    pub initial_tab: FeatureTab,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            demo_member_id: "M123456".into(),
            demo_password: "demo".into(),
            demo_member_name: "John Doe".into(),
            demo_token: "mock-jwt-token".into(),
            login_latency: 3,
            fetch_latency: 2,
            initial_tab: FeatureTab::Dashboard,
        }
    }
}

impl PortalConfig {
    /// Defaults, overridden by `PORTAL_LOGIN_LATENCY`, `PORTAL_FETCH_LATENCY`
    /// and `PORTAL_INITIAL_TAB` when set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(value) = lookup(LOGIN_LATENCY_VAR) {
            config.login_latency = parse_turns(LOGIN_LATENCY_VAR, &value)?;
        }
        if let Some(value) = lookup(FETCH_LATENCY_VAR) {
            config.fetch_latency = parse_turns(FETCH_LATENCY_VAR, &value)?;
        }
        if let Some(value) = lookup(INITIAL_TAB_VAR) {
            config.initial_tab = value
                .parse()
                .map_err(|source| ConfigError::InvalidTab {
                    var: INITIAL_TAB_VAR,
                    source,
                })?;
        }
        Ok(config)
    }
}

fn parse_turns(var: &'static str, value: &str) -> Result<u32, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidLatency {
            var,
            value: value.to_string(),
        })
}
