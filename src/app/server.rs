//! Self-hosted HTTP surface: content API, uploads, rendered pages and static files.

use crate::config::local::FileStore;
use crate::config::toml_config::SiteConfig;
use crate::config::AuthConfig;
use crate::core::auth::AuthRequest;
use crate::core::content_api::{ok_body, ApiError, ContentService, CORS_HEADERS, JSON_CONTENT_TYPE};
use crate::core::render::render_page_at;
use crate::core::upload::{UploadReceipt, UploadService};
use crate::domain::model::ContentBundle;
use crate::domain::{Locale, LOCALES};
use crate::utils::error::{Result, SiteError};
use axum::{
    body::Bytes,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        DefaultBodyLimit, Multipart, Path, State,
    },
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Multipart framing around the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub struct AppState {
    pub content: ContentService<FileStore, AuthConfig>,
    pub uploads: UploadService<FileStore>,
    pub seed_path: PathBuf,
    pub default_locale: Locale,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub async fn from_config(config: &SiteConfig) -> Result<Self> {
        tokio::fs::create_dir_all(&config.server.content_dir).await?;
        tokio::fs::create_dir_all(&config.server.upload_dir).await?;

        Ok(Self {
            content: ContentService::with_key(
                FileStore::new(&config.server.content_dir),
                config.auth.clone(),
                config.server.content_key.clone(),
            ),
            uploads: UploadService::new(
                FileStore::new(&config.server.upload_dir),
                config.upload.public_prefix.clone(),
                config.upload.max_bytes,
            ),
            seed_path: config.seed_path(),
            default_locale: crate::domain::DEFAULT_LOCALE,
        })
    }

    /// Stored bundle, else the seed file, else the embedded seed.
    pub async fn page_bundle(&self) -> Result<ContentBundle> {
        match self.content.load_bundle().await {
            Ok(Some(bundle)) => return Ok(bundle),
            Ok(None) => {}
            Err(e) => tracing::warn!("⚠️ Stored content unreadable, using seed: {}", e),
        }

        match tokio::fs::read(&self.seed_path).await {
            Ok(raw) => match ContentBundle::from_json(&raw) {
                Ok(bundle) => return Ok(bundle),
                Err(e) => tracing::warn!("⚠️ Seed file {} invalid: {}", self.seed_path.display(), e),
            },
            Err(e) => tracing::debug!("Seed file {} not readable: {}", self.seed_path.display(), e),
        }

        ContentBundle::seed()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(e) = &self {
            tracing::error!(
                "❌ Request failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
        }
        let status = StatusCode::from_u16(self.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, no_store(), Json(self.body())).into_response()
    }
}

fn no_store() -> [(HeaderName, HeaderValue); 1] {
    [(header::CACHE_CONTROL, HeaderValue::from_static("no-store"))]
}

fn with_cors(mut response: Response) -> Response {
    let headers = response.headers_mut();
    for (name, value) in CORS_HEADERS {
        headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }
    response
}

fn auth_request(headers: &HeaderMap) -> AuthRequest {
    AuthRequest::from_header_lookup(|name| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    })
}

pub fn router(state: SharedState, config: &SiteConfig) -> Router {
    let content_routes = get(get_content)
        .put(put_content)
        .options(content_options)
        .fallback(method_not_allowed)
        .layer(DefaultBodyLimit::max(config.server.max_content_bytes));

    let upload_route = post(upload)
        .layer(DefaultBodyLimit::max(config.upload.max_bytes + MULTIPART_OVERHEAD));

    let uploads_mount = format!("/{}", config.upload.public_prefix.trim_matches('/'));

    let mut app = Router::new();
    for locale in LOCALES {
        app = app.route(&format!("/{}", locale), get(bare_locale_page));
    }

    app.route("/api/content", content_routes)
        .route("/api/whoami", get(whoami))
        .route("/api/upload", upload_route)
        .route("/health", get(health))
        .route("/", get(root_redirect))
        .route("/:locale/", get(page))
        .nest_service(&uploads_mount, ServeDir::new(&config.server.upload_dir))
        .fallback_service(ServeDir::new(&config.server.public_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds and serves in the background; returns the bound address (port 0 picks a free one).
pub async fn start_server(config: SiteConfig) -> Result<SocketAddr> {
    let (listener, app) = prepare(&config).await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("❌ Server stopped: {}", e);
        }
    });

    Ok(addr)
}

/// Serves until Ctrl+C or SIGTERM.
pub async fn run_server(config: SiteConfig) -> Result<()> {
    let (listener, app) = prepare(&config).await?;
    tracing::info!("🌐 Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down");
    Ok(())
}

async fn prepare(config: &SiteConfig) -> Result<(TcpListener, Router)> {
    let state = Arc::new(AppState::from_config(config).await?);
    let app = router(state, config);
    let listener = TcpListener::bind(config.bind_address())
        .await
        .map_err(|e| SiteError::ConfigError {
            message: format!("cannot bind {}: {}", config.bind_address(), e),
        })?;
    Ok((listener, app))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

async fn get_content(State(state): State<SharedState>) -> Response {
    let response = match state.content.get_content().await {
        Ok(raw) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE)),
                (header::CACHE_CONTROL, HeaderValue::from_static("no-store")),
            ],
            raw,
        )
            .into_response(),
        Err(e) => e.into_response(),
    };
    with_cors(response)
}

async fn put_content(State(state): State<SharedState>, headers: HeaderMap, body: Bytes) -> Response {
    let response = match state.content.put_content(&auth_request(&headers), &body).await {
        Ok(_) => (StatusCode::OK, no_store(), Json(ok_body())).into_response(),
        Err(e) => e.into_response(),
    };
    with_cors(response)
}

async fn content_options() -> Response {
    with_cors(StatusCode::NO_CONTENT.into_response())
}

async fn method_not_allowed() -> Response {
    with_cors(ApiError::MethodNotAllowed.into_response())
}

async fn whoami(State(state): State<SharedState>, headers: HeaderMap) -> impl IntoResponse {
    (no_store(), Json(state.content.whoami(&auth_request(&headers))))
}

async fn health() -> impl IntoResponse {
    Json(ok_body())
}

async fn upload(
    State(state): State<SharedState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> std::result::Result<Json<UploadReceipt>, ApiError> {
    let mut multipart = multipart.map_err(|e| {
        tracing::debug!("Upload rejected before parsing: {}", e);
        ApiError::bad_request("file is required")
    })?;

    let max_bytes = state.uploads.max_bytes();
    let multipart_error = |e: MultipartError| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge { max_bytes }
        } else {
            ApiError::bad_request(format!("invalid multipart body: {}", e))
        }
    };

    let mut file: Option<(Option<String>, Bytes)> = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().map(str::to_string);
        let data = field.bytes().await.map_err(multipart_error)?;
        file = Some((name, data));
        break;
    }

    let (name, data) = match &file {
        Some((name, data)) => (name.as_deref(), Some(data.as_ref())),
        None => (None, None),
    };
    let receipt = state.uploads.accept(name, data).await?;
    Ok(Json(receipt))
}

async fn root_redirect(State(state): State<SharedState>) -> Response {
    let locale = match state.page_bundle().await {
        Ok(bundle) => bundle.default_locale,
        Err(e) => {
            tracing::warn!("⚠️ No bundle for redirect, using {}: {}", state.default_locale, e);
            state.default_locale
        }
    };
    let location = format!("/{}/", locale);
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

async fn page(State(state): State<SharedState>, Path(segment): Path<String>, uri: Uri) -> Response {
    if !Locale::is_locale(&segment) {
        return ApiError::NotFound {
            message: format!("unknown locale '{}'", segment),
        }
        .into_response();
    }
    render_locale_page(&state, &uri).await
}

/// `/ru` and friends; only known locales are routed here so static files still resolve.
async fn bare_locale_page(State(state): State<SharedState>, uri: Uri) -> Response {
    render_locale_page(&state, &uri).await
}

async fn render_locale_page(state: &AppState, uri: &Uri) -> Response {
    match state.page_bundle().await {
        Ok(bundle) => (no_store(), Html(render_page_at(&bundle, uri.path()))).into_response(),
        Err(e) => ApiError::Internal(e).into_response(),
    }
}
