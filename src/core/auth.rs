//! Write authorization.
//!
//! Two modes, decided by configuration:
//! - dev bypass: a shared secret in `X-Dev-Admin-Token`;
//! - production: the email the access proxy puts in
//!   `Cf-Access-Authenticated-User-Email`, checked against the allowlist.
//!
//! The header itself is trusted as-is; stripping it from untrusted traffic is
//! the proxy's job. Every denial carries a stable reason code.

use crate::domain::ports::ConfigProvider;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const ACCESS_EMAIL_HEADER: &str = "cf-access-authenticated-user-email";
pub const DEV_TOKEN_HEADER: &str = "x-dev-admin-token";

/// The credential-bearing parts of a request, already pulled out of the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthRequest {
    pub access_email: Option<String>,
    pub dev_token: Option<String>,
}

impl AuthRequest {
    /// `lookup` receives lowercase header names.
    pub fn from_header_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            access_email: lookup(ACCESS_EMAIL_HEADER),
            dev_token: lookup(DEV_TOKEN_HEADER),
        }
    }

    pub fn with_email(email: &str) -> Self {
        Self {
            access_email: Some(email.to_string()),
            dev_token: None,
        }
    }

    pub fn with_dev_token(token: &str) -> Self {
        Self {
            access_email: None,
            dev_token: Some(token.to_string()),
        }
    }

    fn normalized_email(&self) -> String {
        self.access_email
            .as_deref()
            .map(|e| e.trim().to_lowercase())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthDenied {
    DevTokenNotSet,
    MissingDevToken,
    BadDevToken,
    AllowlistEmpty,
    MissingAccessEmail { has_header: bool },
    NotInAllowlist { email: String, allowed_count: usize },
}

impl AuthDenied {
    pub fn code(&self) -> &'static str {
        match self {
            AuthDenied::DevTokenNotSet => "dev_token_not_set",
            AuthDenied::MissingDevToken => "missing_dev_token",
            AuthDenied::BadDevToken => "bad_dev_token",
            AuthDenied::AllowlistEmpty => "allowlist_empty",
            AuthDenied::MissingAccessEmail { .. } => "missing_access_email",
            AuthDenied::NotInAllowlist { .. } => "not_in_allowlist",
        }
    }

    pub fn details(&self) -> Option<Value> {
        match self {
            AuthDenied::MissingAccessEmail { has_header } => {
                Some(json!({ "hasAccessEmailHeader": has_header }))
            }
            AuthDenied::NotInAllowlist {
                email,
                allowed_count,
            } => Some(json!({ "email": email, "allowedCount": allowed_count })),
            _ => None,
        }
    }
}

impl std::fmt::Display for AuthDenied {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    Admin { email: String },
    DevToken,
}

pub fn authorize<C: ConfigProvider + ?Sized>(
    config: &C,
    request: &AuthRequest,
) -> Result<Principal, AuthDenied> {
    if config.dev_bypass_enabled() {
        let expected = config.dev_admin_token().map(str::trim).unwrap_or_default();
        if expected.is_empty() {
            return Err(AuthDenied::DevTokenNotSet);
        }

        let got = request.dev_token.as_deref().map(str::trim).unwrap_or_default();
        if got.is_empty() {
            return Err(AuthDenied::MissingDevToken);
        }

        if !constant_time_eq(got.as_bytes(), expected.as_bytes()) {
            return Err(AuthDenied::BadDevToken);
        }

        return Ok(Principal::DevToken);
    }

    let allowed = config.admin_emails();
    if allowed.is_empty() {
        return Err(AuthDenied::AllowlistEmpty);
    }

    let email = request.normalized_email();
    if email.is_empty() {
        return Err(AuthDenied::MissingAccessEmail {
            has_header: request.access_email.is_some(),
        });
    }

    if !allowed.iter().any(|a| *a == email) {
        return Err(AuthDenied::NotInAllowlist {
            email,
            allowed_count: allowed.len(),
        });
    }

    Ok(Principal::Admin { email })
}

/// Compares without short-circuiting on the first differing byte.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhoAmI {
    pub ok: bool,
    pub email: String,
    pub is_admin: bool,
    pub allowed_count: usize,
}

/// Allowlist view of the caller; never denies.
pub fn whoami<C: ConfigProvider + ?Sized>(config: &C, request: &AuthRequest) -> WhoAmI {
    let email = request.normalized_email();
    let allowed = config.admin_emails();
    WhoAmI {
        ok: true,
        is_admin: !email.is_empty() && allowed.iter().any(|a| *a == email),
        allowed_count: allowed.len(),
        email,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthConfig;

    fn prod(list: &str) -> AuthConfig {
        AuthConfig::new(list, false, None)
    }

    #[test]
    fn test_empty_allowlist_always_denies() {
        let config = prod("");
        let denied = authorize(&config, &AuthRequest::with_email("a@x.com")).unwrap_err();
        assert_eq!(denied, AuthDenied::AllowlistEmpty);
    }

    #[test]
    fn test_listed_email_is_case_insensitive_and_trimmed() {
        let config = prod("a@x.com,b@x.com");
        let principal = authorize(&config, &AuthRequest::with_email("  A@X.COM ")).unwrap();
        assert_eq!(
            principal,
            Principal::Admin {
                email: "a@x.com".to_string()
            }
        );
    }

    #[test]
    fn test_unlisted_email_is_denied_with_details() {
        let config = prod("a@x.com,b@x.com");
        let denied = authorize(&config, &AuthRequest::with_email("c@x.com")).unwrap_err();
        assert_eq!(denied.code(), "not_in_allowlist");
        let details = denied.details().unwrap();
        assert_eq!(details["email"], "c@x.com");
        assert_eq!(details["allowedCount"], 2);
    }

    #[test]
    fn test_missing_and_blank_email() {
        let config = prod("a@x.com");
        assert_eq!(
            authorize(&config, &AuthRequest::default()).unwrap_err(),
            AuthDenied::MissingAccessEmail { has_header: false }
        );
        assert_eq!(
            authorize(&config, &AuthRequest::with_email("   ")).unwrap_err(),
            AuthDenied::MissingAccessEmail { has_header: true }
        );
    }

    #[test]
    fn test_dev_bypass_takes_precedence() {
        let config = AuthConfig::new("a@x.com", true, Some("s3cret".to_string()));

        // an allowlisted email alone is not enough once the bypass is on
        assert_eq!(
            authorize(&config, &AuthRequest::with_email("a@x.com")).unwrap_err(),
            AuthDenied::MissingDevToken
        );
        assert_eq!(
            authorize(&config, &AuthRequest::with_dev_token("wrong!")).unwrap_err(),
            AuthDenied::BadDevToken
        );
        assert_eq!(
            authorize(&config, &AuthRequest::with_dev_token(" s3cret ")).unwrap(),
            Principal::DevToken
        );
    }

    #[test]
    fn test_dev_bypass_without_token_configured() {
        let config = AuthConfig::new("", true, None);
        assert_eq!(
            authorize(&config, &AuthRequest::with_dev_token("anything")).unwrap_err(),
            AuthDenied::DevTokenNotSet
        );
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
    }

    #[test]
    fn test_whoami() {
        let config = prod("a@x.com");
        let me = whoami(&config, &AuthRequest::with_email("A@x.com"));
        assert!(me.is_admin);
        assert_eq!(me.allowed_count, 1);

        let anon = whoami(&config, &AuthRequest::default());
        assert!(!anon.is_admin);
        assert_eq!(anon.email, "");
    }
}
