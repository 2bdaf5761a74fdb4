//! Configuration module
//!
//! Settings for the media delivery pipeline: the HTTP upload endpoint, the FTP
//! fallback host, the public URL base and upload limits. Every host and credential
//! must come from the environment; there are no built-in fallback values for them.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::validation::{UploadLimits, DEFAULT_ALLOWED_CONTENT_TYPES};

const HTTP_TIMEOUT_SECS: u64 = 30;
const FTP_PORT: u16 = 21;
const FTP_CONNECT_TIMEOUT_SECS: u64 = 20;
const FTP_IDLE_TIMEOUT_SECS: u64 = 20;
const MAX_FILE_SIZE_MB: usize = 10;

/// Media delivery configuration
#[derive(Clone)]
pub struct MediaDeliveryConfig {
    // HTTP upload endpoint
    pub http_upload_url: String,
    pub http_upload_token: String,
    pub http_timeout_secs: u64,
    // FTP fallback
    pub ftp_host: String,
    pub ftp_port: u16,
    pub ftp_user: String,
    pub ftp_password: String,
    /// Remote directory that holds the per-entity folders. Empty means the login directory.
    pub ftp_root: String,
    pub ftp_connect_timeout_secs: u64,
    pub ftp_idle_timeout_secs: u64,
    // Public URL layout
    pub public_base_url: String,
    // Upload limits
    pub max_file_size_bytes: usize,
    pub allowed_content_types: Vec<String>,
}

impl fmt::Debug for MediaDeliveryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaDeliveryConfig")
            .field("http_upload_url", &self.http_upload_url)
            .field("http_upload_token", &"<redacted>")
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("ftp_host", &self.ftp_host)
            .field("ftp_port", &self.ftp_port)
            .field("ftp_user", &self.ftp_user)
            .field("ftp_password", &"<redacted>")
            .field("ftp_root", &self.ftp_root)
            .field("ftp_connect_timeout_secs", &self.ftp_connect_timeout_secs)
            .field("ftp_idle_timeout_secs", &self.ftp_idle_timeout_secs)
            .field("public_base_url", &self.public_base_url)
            .field("max_file_size_bytes", &self.max_file_size_bytes)
            .field("allowed_content_types", &self.allowed_content_types)
            .finish()
    }
}

impl MediaDeliveryConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String, anyhow::Error> {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| anyhow::anyhow!("{} must be set", key))
        };

        let max_file_size_mb: usize = parse_setting(
            "MEDIA_MAX_FILE_SIZE_MB",
            lookup("MEDIA_MAX_FILE_SIZE_MB"),
            MAX_FILE_SIZE_MB,
        )?;
        let max_file_size_bytes = max_file_size_mb
            .checked_mul(1024 * 1024)
            .ok_or_else(|| anyhow::anyhow!("MEDIA_MAX_FILE_SIZE_MB is too large"))?;

        let allowed_content_types = lookup("MEDIA_ALLOWED_CONTENT_TYPES")
            .map(|s| {
                s.split(',')
                    .map(|ct| ct.trim().to_lowercase())
                    .filter(|ct| !ct.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|types| !types.is_empty())
            .unwrap_or_else(|| {
                DEFAULT_ALLOWED_CONTENT_TYPES
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            });

        let config = MediaDeliveryConfig {
            http_upload_url: required("MEDIA_HTTP_UPLOAD_URL")?,
            http_upload_token: required("MEDIA_HTTP_UPLOAD_TOKEN")?,
            http_timeout_secs: parse_setting(
                "MEDIA_HTTP_TIMEOUT_SECS",
                lookup("MEDIA_HTTP_TIMEOUT_SECS"),
                HTTP_TIMEOUT_SECS,
            )?,
            ftp_host: required("MEDIA_FTP_HOST")?,
            ftp_port: parse_setting("MEDIA_FTP_PORT", lookup("MEDIA_FTP_PORT"), FTP_PORT)?,
            ftp_user: required("MEDIA_FTP_USER")?,
            ftp_password: required("MEDIA_FTP_PASSWORD")?,
            ftp_root: lookup("MEDIA_FTP_ROOT")
                .map(|s| s.trim().trim_end_matches('/').to_string())
                .unwrap_or_default(),
            ftp_connect_timeout_secs: parse_setting(
                "MEDIA_FTP_CONNECT_TIMEOUT_SECS",
                lookup("MEDIA_FTP_CONNECT_TIMEOUT_SECS"),
                FTP_CONNECT_TIMEOUT_SECS,
            )?,
            ftp_idle_timeout_secs: parse_setting(
                "MEDIA_FTP_IDLE_TIMEOUT_SECS",
                lookup("MEDIA_FTP_IDLE_TIMEOUT_SECS"),
                FTP_IDLE_TIMEOUT_SECS,
            )?,
            public_base_url: required("MEDIA_PUBLIC_BASE_URL")?
                .trim_end_matches('/')
                .to_string(),
            max_file_size_bytes,
            allowed_content_types,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !is_http_url(&self.http_upload_url) {
            return Err(anyhow::anyhow!(
                "MEDIA_HTTP_UPLOAD_URL must start with http:// or https://"
            ));
        }

        if !is_http_url(&self.public_base_url) {
            return Err(anyhow::anyhow!(
                "MEDIA_PUBLIC_BASE_URL must start with http:// or https://"
            ));
        }

        if self.http_timeout_secs == 0 {
            return Err(anyhow::anyhow!("MEDIA_HTTP_TIMEOUT_SECS must be greater than 0"));
        }

        if self.ftp_connect_timeout_secs == 0 || self.ftp_idle_timeout_secs == 0 {
            return Err(anyhow::anyhow!("FTP timeouts must be greater than 0"));
        }

        if self.ftp_port == 0 {
            return Err(anyhow::anyhow!("MEDIA_FTP_PORT must be greater than 0"));
        }

        if self.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MEDIA_MAX_FILE_SIZE_MB must be greater than 0"));
        }

        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn ftp_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.ftp_connect_timeout_secs)
    }

    pub fn ftp_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.ftp_idle_timeout_secs)
    }

    pub fn upload_limits(&self) -> UploadLimits {
        UploadLimits {
            max_file_size_bytes: self.max_file_size_bytes,
            allowed_content_types: self.allowed_content_types.clone(),
        }
    }
}

/// Parse a numeric setting. Unset or blank means the default; anything else must parse.
fn parse_setting<T: FromStr>(key: &str, value: Option<String>, default: T) -> Result<T, anyhow::Error> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a valid number, got {:?}", key, raw)),
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
