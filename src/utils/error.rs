use thiserror::Error;

#[derive(Error, Debug)]
pub enum SiteError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Image processing error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Content store error: {message}")]
    StoreError { message: String },

    #[error("Not found: {what}")]
    NotFound { what: String },

    #[error("Crop error: {message}")]
    CropError { message: String },

    #[error("Remote API answered {status}: {reason}")]
    RemoteError { status: u16, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Io,
    Configuration,
    Content,
    Storage,
    Image,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl SiteError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SiteError::HttpError(_) | SiteError::RemoteError { .. } => ErrorCategory::Network,
            SiteError::IoError(_) => ErrorCategory::Io,
            SiteError::ConfigError { .. }
            | SiteError::MissingConfigError { .. }
            | SiteError::InvalidConfigValueError { .. }
            | SiteError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            SiteError::SerializationError(_)
            | SiteError::ValidationError { .. }
            | SiteError::NotFound { .. } => ErrorCategory::Content,
            SiteError::StoreError { .. } => ErrorCategory::Storage,
            SiteError::ImageError(_) | SiteError::CropError { .. } => ErrorCategory::Image,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            SiteError::NotFound { .. } => ErrorSeverity::Low,
            SiteError::HttpError(_) | SiteError::RemoteError { .. } => ErrorSeverity::Medium,
            SiteError::SerializationError(_)
            | SiteError::ValidationError { .. }
            | SiteError::ImageError(_)
            | SiteError::CropError { .. } => ErrorSeverity::High,
            SiteError::IoError(_)
            | SiteError::StoreError { .. }
            | SiteError::ConfigError { .. }
            | SiteError::MissingConfigError { .. }
            | SiteError::InvalidConfigValueError { .. }
            | SiteError::ConfigValidationError { .. } => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            SiteError::HttpError(_) => {
                "Check that the site server is running and reachable".to_string()
            }
            SiteError::RemoteError { status: 403, .. } => {
                "Check ADMIN_EMAILS or the dev token (DEV_BYPASS_AUTH / DEV_ADMIN_TOKEN)".to_string()
            }
            SiteError::RemoteError { .. } => "Inspect the reason returned by the API".to_string(),
            SiteError::IoError(_) => "Check file paths and permissions".to_string(),
            SiteError::SerializationError(_) => {
                "Make sure the file contains a valid content bundle JSON".to_string()
            }
            SiteError::MissingConfigError { field } => {
                format!("Set '{}' via environment or site.toml", field)
            }
            SiteError::ConfigError { .. }
            | SiteError::InvalidConfigValueError { .. }
            | SiteError::ConfigValidationError { .. } => {
                "Review site.toml and environment variables".to_string()
            }
            SiteError::ValidationError { .. } => {
                "Fix the bundle so every locale and the default locale are present".to_string()
            }
            SiteError::StoreError { .. } => "Check the content store binding".to_string(),
            SiteError::NotFound { .. } => {
                "Seed the store with `site-cms import` first".to_string()
            }
            SiteError::ImageError(_) | SiteError::CropError { .. } => {
                "Try another image file or crop parameters".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not talk to the site API: {}", self),
            ErrorCategory::Io => format!("File operation failed: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Content => format!("Content problem: {}", self),
            ErrorCategory::Storage => format!("Content store problem: {}", self),
            ErrorCategory::Image => format!("Image problem: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, SiteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forbidden_remote_error_points_at_allowlist() {
        let err = SiteError::RemoteError {
            status: 403,
            reason: "forbidden:not_in_allowlist".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Network);
        assert!(err.recovery_suggestion().contains("ADMIN_EMAILS"));
    }

    #[test]
    fn test_severity_ordering() {
        let missing = SiteError::NotFound {
            what: "content".to_string(),
        };
        let config = SiteError::MissingConfigError {
            field: "S3_BUCKET".to_string(),
        };
        assert!(missing.severity() < config.severity());
    }
}
