use crate::utils::error::{Result, SiteError};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field_name: &str, value: impl Into<String>, reason: impl Into<String>) -> SiteError {
    SiteError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: value.into(),
        reason: reason.into(),
    }
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(invalid(field_name, url_str, "URL cannot be empty"));
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(invalid(
                field_name,
                url_str,
                format!("Unsupported URL scheme: {}", scheme),
            )),
        },
        Err(e) => Err(invalid(field_name, url_str, format!("Invalid URL format: {}", e))),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(invalid(field_name, path, "Path cannot be empty"));
    }

    if path.contains('\0') {
        return Err(invalid(field_name, path, "Path contains null bytes"));
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(invalid(
            field_name,
            value.to_string(),
            format!("Value must be at least {}", min_value),
        ));
    }
    Ok(())
}

/// Accepts `user@host.tld` shaped addresses; the access proxy owns real verification.
pub fn validate_email(field_name: &str, email: &str) -> Result<()> {
    let email = email.trim();
    let Some((local, domain)) = email.split_once('@') else {
        return Err(invalid(field_name, email, "Email must contain '@'"));
    };

    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err(invalid(field_name, email, "Email must look like user@domain.tld"));
    }

    if email.chars().any(|c| c.is_whitespace() || c == ',') {
        return Err(invalid(field_name, email, "Email cannot contain spaces or commas"));
    }

    Ok(())
}

/// Case-insensitive; `allowed` holds lowercase extensions without the dot.
pub fn validate_file_extension(field_name: &str, file: &str, allowed: &[&str]) -> Result<()> {
    let Some(ext) = std::path::Path::new(file).extension().and_then(|e| e.to_str()) else {
        return Err(invalid(field_name, file, "File has no extension"));
    };

    if allowed.iter().any(|a| a.eq_ignore_ascii_case(ext)) {
        Ok(())
    } else {
        Err(invalid(
            field_name,
            file,
            format!(".{} is not one of: {}", ext.to_ascii_lowercase(), allowed.join(", ")),
        ))
    }
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(field_name, value, "Value cannot be empty or whitespace-only"));
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(invalid(
            field_name,
            value.to_string(),
            format!("Value must be between {} and {}", min, max),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("remote", "https://example.com").is_ok());
        assert!(validate_url("remote", "http://localhost:8080").is_ok());
        assert!(validate_url("remote", "").is_err());
        assert!(validate_url("remote", "invalid-url").is_err());
        assert!(validate_url("remote", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("admin_emails", "a@x.com").is_ok());
        assert!(validate_email("admin_emails", " A@X.COM ").is_ok());
        assert!(validate_email("admin_emails", "no-at-sign").is_err());
        assert!(validate_email("admin_emails", "a@localhost").is_err());
        assert!(validate_email("admin_emails", "a b@x.com").is_err());
    }

    #[test]
    fn test_validate_file_extension() {
        assert!(validate_file_extension("input", "photo.JPG", &["jpg", "png"]).is_ok());
        assert!(validate_file_extension("input", "photo.gif", &["jpg", "png"]).is_err());
        assert!(validate_file_extension("input", "photo", &["jpg"]).is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("zoom", 1.5, 1.0, 3.0).is_ok());
        assert!(validate_range("zoom", 3.5, 1.0, 3.0).is_err());
    }
}
