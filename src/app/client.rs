//! Remote access to a running site's content API.

use crate::core::auth::{WhoAmI, ACCESS_EMAIL_HEADER, DEV_TOKEN_HEADER};
use crate::core::upload::UploadReceipt;
use crate::domain::model::ContentBundle;
use crate::domain::ports::BundleSink;
use crate::utils::error::{Result, SiteError};
use crate::utils::validation::validate_url;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use std::path::{Path, PathBuf};
use url::Url;

/// Where a fetched bundle came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleSource {
    Remote,
    Cache,
    Seed,
}

#[derive(Debug, Clone)]
pub struct FetchedBundle {
    pub bundle: ContentBundle,
    pub source: BundleSource,
}

/// Credentials sent with writes.
#[derive(Debug, Clone, Default)]
pub struct ClientAuth {
    pub email: Option<String>,
    pub dev_token: Option<String>,
}

pub struct ContentClient {
    client: Client,
    base_url: Url,
    auth: ClientAuth,
    cache_path: Option<PathBuf>,
    seed_path: Option<PathBuf>,
}

impl ContentClient {
    pub fn new(base_url: &str) -> Result<Self> {
        validate_url("remote", base_url)?;
        let base_url = Url::parse(base_url).map_err(|e| SiteError::InvalidConfigValueError {
            field: "remote".to_string(),
            value: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client: Client::new(),
            base_url,
            auth: ClientAuth::default(),
            cache_path: None,
            seed_path: None,
        })
    }

    pub fn with_auth(mut self, auth: ClientAuth) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_cache(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = Some(path.into());
        self
    }

    pub fn with_seed(mut self, path: impl Into<PathBuf>) -> Self {
        self.seed_path = Some(path.into());
        self
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| SiteError::ConfigError {
                message: format!("invalid endpoint {}: {}", path, e),
            })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let mut request = request;
        if let Some(email) = &self.auth.email {
            request = request.header(ACCESS_EMAIL_HEADER, email);
        }
        if let Some(token) = &self.auth.dev_token {
            request = request.header(DEV_TOKEN_HEADER, token);
        }
        request
    }

    /// Remote first, then the cache file, then the seed; never fails on network errors.
    pub async fn fetch_bundle(&self) -> Result<FetchedBundle> {
        match self.fetch_remote().await {
            Ok(bundle) => {
                self.write_cache(&bundle).await;
                return Ok(FetchedBundle {
                    bundle,
                    source: BundleSource::Remote,
                });
            }
            Err(e) => tracing::warn!("⚠️ Remote content unavailable: {}", e),
        }

        if let Some(cache) = &self.cache_path {
            match read_bundle_file(cache).await {
                Ok(bundle) => {
                    tracing::info!("📦 Using cached content from {}", cache.display());
                    return Ok(FetchedBundle {
                        bundle,
                        source: BundleSource::Cache,
                    });
                }
                Err(e) => tracing::debug!("Cache {} unusable: {}", cache.display(), e),
            }
        }

        let bundle = match &self.seed_path {
            Some(seed) => match read_bundle_file(seed).await {
                Ok(bundle) => bundle,
                Err(e) => {
                    tracing::warn!("⚠️ Seed {} unusable, using built-in seed: {}", seed.display(), e);
                    ContentBundle::seed()?
                }
            },
            None => ContentBundle::seed()?,
        };
        tracing::info!("🌱 Using seed content");
        Ok(FetchedBundle {
            bundle,
            source: BundleSource::Seed,
        })
    }

    async fn fetch_remote(&self) -> Result<ContentBundle> {
        let url = self.endpoint("/api/content")?;
        tracing::debug!("Fetching content from {}", url);
        let response = self.client.get(url).send().await?;
        let response = check_status(response).await?;
        let raw = response.bytes().await?;
        ContentBundle::from_json(&raw)
    }

    /// Cache first, then PUT; the local copy survives a rejected write.
    pub async fn push_bundle(&self, bundle: &ContentBundle) -> Result<()> {
        let raw = bundle.to_pretty_json()?;
        if let Some(cache) = &self.cache_path {
            write_file(cache, raw.as_bytes()).await?;
        }

        let url = self.endpoint("/api/content")?;
        let request = self
            .client
            .put(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(raw);
        let response = self.authorized(request).send().await?;
        check_status(response).await?;

        tracing::info!("✅ Content pushed to {}", self.base_url);
        Ok(())
    }

    pub async fn upload(&self, data: Vec<u8>, file_name: &str, mime_type: &str) -> Result<UploadReceipt> {
        let part = reqwest::multipart::Part::bytes(data)
            .file_name(file_name.to_string())
            .mime_str(mime_type)?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let url = self.endpoint("/api/upload")?;
        let response = self.authorized(self.client.post(url).multipart(form)).send().await?;
        let receipt: UploadReceipt = check_status(response).await?.json().await?;

        tracing::info!("📷 Uploaded {} as {}", file_name, receipt.url);
        Ok(receipt)
    }

    pub async fn whoami(&self) -> Result<WhoAmI> {
        let url = self.endpoint("/api/whoami")?;
        let response = self.authorized(self.client.get(url)).send().await?;
        Ok(check_status(response).await?.json().await?)
    }

    async fn write_cache(&self, bundle: &ContentBundle) {
        let Some(cache) = &self.cache_path else {
            return;
        };
        let result = match bundle.to_pretty_json() {
            Ok(raw) => write_file(cache, raw.as_bytes()).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            tracing::warn!("⚠️ Could not refresh cache {}: {}", cache.display(), e);
        }
    }
}

#[async_trait]
impl BundleSink for ContentClient {
    async fn save(&self, bundle: &ContentBundle) -> Result<()> {
        self.push_bundle(bundle).await
    }
}

/// Turns a non-2xx answer into `RemoteError` carrying the API's `reason`.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let reason = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("reason").and_then(|r| r.as_str()).map(str::to_string))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());

    Err(SiteError::RemoteError {
        status: status.as_u16(),
        reason,
    })
}

async fn read_bundle_file(path: &Path) -> Result<ContentBundle> {
    let raw = tokio::fs::read(path).await?;
    ContentBundle::from_json(&raw)
}

async fn write_file(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, data).await?;
    Ok(())
}
