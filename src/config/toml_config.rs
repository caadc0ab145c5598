use crate::config::AuthConfig;
use crate::domain::model::BUNDLE_KEY;
use crate::utils::error::{Result, SiteError};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 8 * 1024 * 1024;
pub const DEFAULT_MAX_CONTENT_BYTES: usize = 2 * 1024 * 1024;

/// Self-hosted deployment settings (`site.toml`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub upload: UploadSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
    pub public_dir: PathBuf,
    pub content_dir: PathBuf,
    pub content_key: String,
    pub upload_dir: PathBuf,
    pub seed_path: Option<PathBuf>,
    pub max_content_bytes: usize,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            public_dir: PathBuf::from("public"),
            content_dir: PathBuf::from("."),
            content_key: BUNDLE_KEY.to_string(),
            upload_dir: PathBuf::from("public/uploads"),
            seed_path: None,
            max_content_bytes: DEFAULT_MAX_CONTENT_BYTES,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadSection {
    pub max_bytes: usize,
    pub public_prefix: String,
}

impl Default for UploadSection {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            public_prefix: "/uploads".to_string(),
        }
    }
}

impl SiteConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(SiteError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| SiteError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${ADMIN_EMAILS})，未設定的保留原樣
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        use std::sync::OnceLock;

        static RE: OnceLock<Regex> = OnceLock::new();
        let re = RE.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("static env regex"));

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Seed file: explicit path, else `content.json` in the public dir.
    pub fn seed_path(&self) -> PathBuf {
        self.server
            .seed_path
            .clone()
            .unwrap_or_else(|| self.server.public_dir.join("content.json"))
    }
}

impl Validate for SiteConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("server.host", &self.server.host)?;
        validation::validate_positive_number("server.port", self.server.port as usize, 1)?;
        validation::validate_path(
            "server.public_dir",
            &self.server.public_dir.to_string_lossy(),
        )?;
        validation::validate_path(
            "server.upload_dir",
            &self.server.upload_dir.to_string_lossy(),
        )?;
        validation::validate_non_empty_string("server.content_key", &self.server.content_key)?;
        validation::validate_range(
            "upload.max_bytes",
            self.upload.max_bytes,
            1024,
            64 * 1024 * 1024,
        )?;

        let prefix = &self.upload.public_prefix;
        if !prefix.starts_with('/') || prefix.trim_matches('/').is_empty() {
            return Err(SiteError::InvalidConfigValueError {
                field: "upload.public_prefix".to_string(),
                value: prefix.clone(),
                reason: "Public prefix must start with '/' and name a directory".to_string(),
            });
        }

        self.auth.validate()
    }
}
