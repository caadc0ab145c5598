#[cfg(feature = "cli")]
pub mod cli;
pub mod lambda;
pub mod local;
pub mod toml_config;

use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{validate_email, Validate};
use serde::{Deserialize, Serialize};

pub const ADMIN_EMAILS_VAR: &str = "ADMIN_EMAILS";
pub const DEV_BYPASS_VAR: &str = "DEV_BYPASS_AUTH";
pub const DEV_TOKEN_VAR: &str = "DEV_ADMIN_TOKEN";

/// Who may write content.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default, deserialize_with = "deserialize_allowlist")]
    pub admin_emails: Vec<String>,
    #[serde(default)]
    pub dev_bypass: bool,
    #[serde(default)]
    pub dev_admin_token: Option<String>,
}

impl AuthConfig {
    pub fn new(admin_emails: &str, dev_bypass: bool, dev_admin_token: Option<String>) -> Self {
        Self {
            admin_emails: parse_allowlist(admin_emails),
            dev_bypass,
            dev_admin_token: dev_admin_token
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any variable source (environment, Lambda, tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self::new(
            &lookup(ADMIN_EMAILS_VAR).unwrap_or_default(),
            parse_flag(&lookup(DEV_BYPASS_VAR).unwrap_or_default()),
            lookup(DEV_TOKEN_VAR),
        )
    }

    /// Later sources win only for values they actually set.
    pub fn merge(mut self, other: AuthConfig) -> Self {
        if !other.admin_emails.is_empty() {
            self.admin_emails = other.admin_emails;
        }
        self.dev_bypass = self.dev_bypass || other.dev_bypass;
        if other.dev_admin_token.is_some() {
            self.dev_admin_token = other.dev_admin_token;
        }
        self
    }
}

/// Comma-separated list, lowercased and trimmed, blanks dropped.
pub fn parse_allowlist(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Only the literal `true` (any case) enables a flag.
pub fn parse_flag(raw: &str) -> bool {
    raw.trim().eq_ignore_ascii_case("true")
}

fn deserialize_allowlist<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Joined(String),
        List(Vec<String>),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Joined(s) => parse_allowlist(&s),
        Raw::List(list) => parse_allowlist(&list.join(",")),
    })
}

impl ConfigProvider for AuthConfig {
    fn admin_emails(&self) -> &[String] {
        &self.admin_emails
    }

    fn dev_bypass_enabled(&self) -> bool {
        self.dev_bypass
    }

    fn dev_admin_token(&self) -> Option<&str> {
        self.dev_admin_token.as_deref()
    }
}

impl Validate for AuthConfig {
    fn validate(&self) -> Result<()> {
        for email in &self.admin_emails {
            validate_email("admin_emails", email)?;
        }

        if self.dev_bypass {
            tracing::warn!("⚠️ Dev auth bypass is enabled; writes accept X-Dev-Admin-Token");
            if self.dev_admin_token.is_none() {
                tracing::warn!("⚠️ DEV_ADMIN_TOKEN is not set, every write will be denied");
            }
        } else if self.admin_emails.is_empty() {
            tracing::warn!("⚠️ ADMIN_EMAILS is empty, every write will be denied");
        }

        Ok(())
    }
}
