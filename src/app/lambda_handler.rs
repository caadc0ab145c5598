//! Hosted variant: API Gateway proxy events dispatched into [`ContentService`].
//!
//! Only the content routes exist here; uploads and page rendering belong to
//! the self-hosted server.

use crate::core::auth::AuthRequest;
use crate::core::content_api::{ok_body, ApiError, ContentService, CORS_HEADERS, JSON_CONTENT_TYPE};
use crate::domain::ports::{ConfigProvider, Storage};
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HttpEvent {
    pub http_method: String,
    pub path: String,
    pub headers: HashMap<String, String>,
    pub body: Option<String>,
    pub is_base64_encoded: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpResponse {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl HttpEvent {
    /// Header lookup that ignores the casing the gateway forwarded.
    pub fn header(&self, name: &str) -> Option<String> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.clone())
    }

    fn body_bytes(&self) -> Result<Vec<u8>, ApiError> {
        let Some(body) = &self.body else {
            return Ok(Vec::new());
        };
        if self.is_base64_encoded {
            base64::engine::general_purpose::STANDARD
                .decode(body)
                .map_err(|_| ApiError::bad_request("Invalid JSON"))
        } else {
            Ok(body.clone().into_bytes())
        }
    }
}

impl HttpResponse {
    fn json(status_code: u16, body: &Value) -> Self {
        Self::raw(status_code, body.to_string())
    }

    fn raw(status_code: u16, body: String) -> Self {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), JSON_CONTENT_TYPE.to_string());
        headers.insert("cache-control".to_string(), "no-store".to_string());
        Self {
            status_code,
            headers,
            body,
        }
    }

    fn with_cors(mut self) -> Self {
        for (name, value) in CORS_HEADERS {
            self.headers.insert(name.to_string(), value.to_string());
        }
        self
    }
}

impl From<ApiError> for HttpResponse {
    fn from(error: ApiError) -> Self {
        if let ApiError::Internal(e) = &error {
            tracing::error!("❌ Request failed: {}", e);
        }
        HttpResponse::json(error.status(), &error.body())
    }
}

pub async fn handle_event<S: Storage, C: ConfigProvider>(
    service: &ContentService<S, C>,
    event: &HttpEvent,
) -> HttpResponse {
    let path = event.path.trim_end_matches('/');
    let method = event.http_method.to_ascii_uppercase();
    tracing::info!("{} {}", method, event.path);

    let auth = AuthRequest::from_header_lookup(|name| event.header(name));

    match path {
        "/api/content" => content_route(service, event, &method, &auth).await.with_cors(),
        "/api/whoami" if method == "GET" => HttpResponse::json(
            200,
            &serde_json::to_value(service.whoami(&auth)).unwrap_or_else(|_| ok_body()),
        ),
        "/health" => HttpResponse::json(200, &ok_body()),
        _ => ApiError::NotFound {
            message: format!("no route for {}", event.path),
        }
        .into(),
    }
}

async fn content_route<S: Storage, C: ConfigProvider>(
    service: &ContentService<S, C>,
    event: &HttpEvent,
    method: &str,
    auth: &AuthRequest,
) -> HttpResponse {
    match method {
        "GET" => match service.get_content().await {
            Ok(raw) => HttpResponse::raw(200, String::from_utf8_lossy(&raw).into_owned()),
            Err(e) => e.into(),
        },
        "PUT" => {
            let body = match event.body_bytes() {
                Ok(body) => body,
                Err(e) => return e.into(),
            };
            match service.put_content(auth, &body).await {
                Ok(_) => HttpResponse::json(200, &ok_body()),
                Err(e) => e.into(),
            }
        }
        "OPTIONS" => HttpResponse {
            status_code: 204,
            headers: HashMap::new(),
            body: String::new(),
        },
        _ => ApiError::MethodNotAllowed.into(),
    }
}
