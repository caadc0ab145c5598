//! Transport-agnostic handling of the content routes.
//!
//! Both the axum server and the Lambda handler extract an [`AuthRequest`] and
//! the raw body, call into [`ContentService`], and map the outcome to their
//! own response type.

use crate::core::auth::{self, AuthDenied, AuthRequest, Principal, WhoAmI};
use crate::core::scan::find_data_image_urls;
use crate::domain::model::{ContentBundle, BUNDLE_KEY};
use crate::domain::ports::{ConfigProvider, Storage};
use crate::utils::error::SiteError;
use serde_json::{json, Value};

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

pub const CORS_HEADERS: [(&str, &str); 5] = [
    ("access-control-allow-origin", "*"),
    ("access-control-allow-methods", "GET,PUT,OPTIONS"),
    ("access-control-allow-headers", "Content-Type, X-Dev-Admin-Token"),
    ("access-control-max-age", "86400"),
    ("vary", "Origin"),
];

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("bad_request:{message}")]
    BadRequest {
        message: String,
        details: Option<Value>,
    },

    #[error("forbidden:{0}")]
    Forbidden(AuthDenied),

    #[error("not_found")]
    NotFound { message: String },

    #[error("method_not_allowed")]
    MethodNotAllowed,

    #[error("payload_too_large")]
    PayloadTooLarge { max_bytes: usize },

    #[error("internal_error")]
    Internal(#[from] SiteError),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            message: message.into(),
            details: None,
        }
    }

    pub fn status(&self) -> u16 {
        match self {
            ApiError::BadRequest { .. } => 400,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound { .. } => 404,
            ApiError::MethodNotAllowed => 405,
            ApiError::PayloadTooLarge { .. } => 413,
            ApiError::Internal(_) => 500,
        }
    }

    /// Machine-readable reason, e.g. `forbidden:not_in_allowlist`.
    pub fn reason(&self) -> String {
        self.to_string()
    }

    pub fn body(&self) -> Value {
        let mut body = json!({ "ok": false, "reason": self.reason() });
        match self {
            ApiError::BadRequest {
                details: Some(details),
                ..
            } => body["details"] = details.clone(),
            ApiError::Forbidden(denied) => {
                if let Some(details) = denied.details() {
                    body["details"] = details;
                }
            }
            ApiError::NotFound { message } => body["message"] = Value::String(message.clone()),
            ApiError::PayloadTooLarge { max_bytes } => {
                body["details"] = json!({ "maxBytes": max_bytes })
            }
            _ => {}
        }
        body
    }
}

pub fn ok_body() -> Value {
    json!({ "ok": true })
}

pub struct ContentService<S: Storage, C: ConfigProvider> {
    store: S,
    config: C,
    key: String,
}

impl<S: Storage, C: ConfigProvider> ContentService<S, C> {
    pub fn new(store: S, config: C) -> Self {
        Self::with_key(store, config, BUNDLE_KEY)
    }

    pub fn with_key(store: S, config: C, key: impl Into<String>) -> Self {
        Self {
            store,
            config,
            key: key.into(),
        }
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    /// Stored bytes, untouched.
    pub async fn get_content(&self) -> Result<Vec<u8>, ApiError> {
        match self.store.read(&self.key).await? {
            Some(raw) if !raw.iter().all(u8::is_ascii_whitespace) => Ok(raw),
            _ => Err(ApiError::NotFound {
                message: "No content stored yet".to_string(),
            }),
        }
    }

    pub async fn put_content(&self, auth: &AuthRequest, body: &[u8]) -> Result<Principal, ApiError> {
        let principal = auth::authorize(&self.config, auth).map_err(|denied| {
            tracing::warn!("🔒 Content write denied: {}", denied.code());
            ApiError::Forbidden(denied)
        })?;

        let value: Value =
            serde_json::from_slice(body).map_err(|_| ApiError::bad_request("Invalid JSON"))?;

        let Some(object) = value.as_object() else {
            return Err(ApiError::bad_request("Body must be an object"));
        };

        if !object.get("content").is_some_and(Value::is_object) {
            return Err(ApiError::bad_request("Missing 'content' object"));
        }

        let found_in = find_data_image_urls(&value);
        if !found_in.is_empty() {
            tracing::warn!("Rejected write with {} inlined image(s)", found_in.len());
            return Err(ApiError::BadRequest {
                message: "Images are not allowed in the content store. Upload them and store '/uploads/...'"
                    .to_string(),
                details: Some(json!({ "foundIn": found_in })),
            });
        }

        let raw = serde_json::to_string_pretty(&value).map_err(SiteError::from)?;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == "null" {
            return Err(ApiError::bad_request("Empty body"));
        }

        self.store.write(&self.key, raw.as_bytes()).await?;

        match &principal {
            Principal::Admin { email } => tracing::info!("✅ Content saved by {}", email),
            Principal::DevToken => tracing::info!("✅ Content saved with dev token"),
        }
        Ok(principal)
    }

    pub fn whoami(&self, auth: &AuthRequest) -> WhoAmI {
        auth::whoami(&self.config, auth)
    }

    /// Typed view of the stored bundle for rendering; `None` when nothing is stored.
    pub async fn load_bundle(&self) -> crate::utils::error::Result<Option<ContentBundle>> {
        match self.get_content().await {
            Ok(raw) => Ok(Some(ContentBundle::from_json(&raw)?)),
            Err(ApiError::NotFound { .. }) => Ok(None),
            Err(ApiError::Internal(e)) => Err(e),
            Err(other) => Err(SiteError::StoreError {
                message: other.reason(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::local::FileStore;
    use crate::config::AuthConfig;
    use tempfile::TempDir;

    fn service(dir: &TempDir) -> ContentService<FileStore, AuthConfig> {
        ContentService::new(
            FileStore::new(dir.path()),
            AuthConfig::new("a@x.com,b@x.com", false, None),
        )
    }

    fn admin() -> AuthRequest {
        AuthRequest::with_email("A@X.COM")
    }

    #[tokio::test]
    async fn test_get_before_any_put_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = service(&dir).get_content().await.unwrap_err();
        assert_eq!(err.status(), 404);
        assert_eq!(err.body()["reason"], "not_found");
    }

    #[tokio::test]
    async fn test_whitespace_only_store_is_not_found() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);
        svc.store.write(BUNDLE_KEY, b"  \n ").await.unwrap();
        assert_eq!(svc.get_content().await.unwrap_err().status(), 404);
    }

    #[tokio::test]
    async fn test_put_then_get_round_trip() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);
        let body = br#"{"defaultLocale":"en","locales":["en"],"content":{"en":{"x":1}}}"#;

        svc.put_content(&admin(), body).await.unwrap();

        let stored = svc.get_content().await.unwrap();
        let stored: Value = serde_json::from_slice(&stored).unwrap();
        let sent: Value = serde_json::from_slice(body).unwrap();
        assert_eq!(stored, sent);
    }

    #[tokio::test]
    async fn test_stored_json_keeps_key_order_and_indent() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);
        svc.put_content(&admin(), br#"{"z":1,"content":{},"a":2}"#)
            .await
            .unwrap();

        let stored = String::from_utf8(svc.get_content().await.unwrap()).unwrap();
        assert_eq!(stored, "{\n  \"z\": 1,\n  \"content\": {},\n  \"a\": 2\n}");
    }

    #[tokio::test]
    async fn test_put_requires_auth() {
        let dir = TempDir::new().unwrap();
        let err = service(&dir)
            .put_content(&AuthRequest::with_email("c@x.com"), br#"{"content":{}}"#)
            .await
            .unwrap_err();
        assert_eq!(err.status(), 403);
        assert_eq!(err.reason(), "forbidden:not_in_allowlist");
    }

    #[tokio::test]
    async fn test_put_shape_errors() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);

        let cases: [(&[u8], &str); 5] = [
            (b"", "bad_request:Invalid JSON"),
            (b"{nope", "bad_request:Invalid JSON"),
            (b"[1,2]", "bad_request:Body must be an object"),
            (br#"{"locales":[]}"#, "bad_request:Missing 'content' object"),
            (br#"{"content":"en"}"#, "bad_request:Missing 'content' object"),
        ];

        for (body, reason) in cases {
            let err = svc.put_content(&admin(), body).await.unwrap_err();
            assert_eq!(err.status(), 400);
            assert_eq!(err.reason(), reason);
        }
        assert!(svc.get_content().await.is_err());
    }

    #[tokio::test]
    async fn test_put_rejects_inlined_images_and_keeps_old_content() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);
        svc.put_content(&admin(), br#"{"content":{"en":{}}}"#)
            .await
            .unwrap();

        let err = svc
            .put_content(
                &admin(),
                br#"{"content":{"en":{"services":[{"imageUrl":"data:image/png;base64,AA"}]}}}"#,
            )
            .await
            .unwrap_err();

        assert_eq!(err.status(), 400);
        assert_eq!(
            err.body()["details"]["foundIn"][0],
            "$.content.en.services[0].imageUrl"
        );
        let stored: Value = serde_json::from_slice(&svc.get_content().await.unwrap()).unwrap();
        assert_eq!(stored, serde_json::json!({"content":{"en":{}}}));
    }

    #[tokio::test]
    async fn test_load_bundle_parses_seed() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);
        assert!(svc.load_bundle().await.unwrap().is_none());

        svc.put_content(&admin(), crate::domain::model::SEED_BUNDLE_JSON.as_bytes())
            .await
            .unwrap();
        let bundle = svc.load_bundle().await.unwrap().unwrap();
        assert_eq!(bundle.locales.len(), 3);
    }
}
