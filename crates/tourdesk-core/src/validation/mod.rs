//! Upload validation
//!
//! Checks applied to an [`AssetRequest`] before any transport is contacted.

use crate::error::AppError;
use crate::models::AssetRequest;

pub const DEFAULT_MAX_FILE_SIZE_BYTES: usize = 10 * 1024 * 1024;

pub const DEFAULT_ALLOWED_CONTENT_TYPES: [&str; 4] =
    ["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Size ceiling and MIME allow-list for uploaded assets
#[derive(Debug, Clone)]
pub struct UploadLimits {
    pub max_file_size_bytes: usize,
    pub allowed_content_types: Vec<String>,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            allowed_content_types: DEFAULT_ALLOWED_CONTENT_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Validate an asset request against the configured limits.
pub fn validate_asset_request(request: &AssetRequest, limits: &UploadLimits) -> Result<(), AppError> {
    validate_entity_id(&request.entity_id)?;
    if request.payload.is_empty() {
        return Err(AppError::InvalidInput("No file provided".to_string()));
    }
    validate_file_size(request.size(), limits.max_file_size_bytes)?;
    validate_content_type(&request.content_type, &limits.allowed_content_types)?;
    Ok(())
}

/// Entity ids become remote directory names, so they must be a single path segment.
pub fn validate_entity_id(entity_id: &str) -> Result<(), AppError> {
    let trimmed = entity_id.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidInput("Entity id is required".to_string()));
    }
    if trimmed != entity_id {
        return Err(AppError::InvalidInput(
            "Entity id must not have surrounding whitespace".to_string(),
        ));
    }
    if entity_id.contains(['/', '\\']) || entity_id.contains("..") {
        return Err(AppError::InvalidInput(
            "Entity id contains invalid path characters".to_string(),
        ));
    }
    if entity_id.chars().any(char::is_control) {
        return Err(AppError::InvalidInput(
            "Entity id contains control characters".to_string(),
        ));
    }
    // '_' separates stored name components and is dropped from the id when naming.
    if entity_id.chars().all(|c| c == '_') {
        return Err(AppError::InvalidInput(
            "Entity id must contain characters other than '_'".to_string(),
        ));
    }
    Ok(())
}

/// Validate file size
pub fn validate_file_size(file_size: usize, max_size: usize) -> Result<(), AppError> {
    if file_size > max_size {
        return Err(AppError::PayloadTooLarge(format!(
            "File size exceeds maximum allowed size of {} MB",
            max_size / 1024 / 1024
        )));
    }
    Ok(())
}

/// Normalize MIME type by stripping parameters (e.g. "image/jpeg; charset=utf-8" -> "image/jpeg").
fn normalize_mime_type(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .map(|s| s.trim())
        .unwrap_or(content_type)
}

/// Validate content type against allowlist. Compares normalized MIME type only.
pub fn validate_content_type(content_type: &str, allowed_types: &[String]) -> Result<(), AppError> {
    let normalized = normalize_mime_type(content_type).to_lowercase();
    if !allowed_types.iter().any(|ct| normalized == ct.to_lowercase()) {
        return Err(AppError::InvalidInput(format!(
            "Invalid content type. Allowed types: {}",
            allowed_types.join(", ")
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AssetCategory;

    fn request(content_type: &str, size: usize, entity_id: &str) -> AssetRequest {
        AssetRequest::new(
            vec![0u8; size],
            "photo.jpg",
            content_type,
            entity_id,
            AssetCategory::Profile,
        )
    }

    #[test]
    fn accepts_allowed_image() {
        let limits = UploadLimits::default();
        assert!(validate_asset_request(&request("image/jpeg", 1024, "CUST-1"), &limits).is_ok());
        assert!(
            validate_asset_request(&request("image/PNG; charset=binary", 1024, "CUST-1"), &limits)
                .is_ok()
        );
    }

    #[test]
    fn rejects_pdf() {
        let err = validate_asset_request(
            &request("application/pdf", 1024, "CUST-1"),
            &UploadLimits::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn rejects_oversized_payload() {
        let limits = UploadLimits::default();
        let err = validate_asset_request(
            &request("image/jpeg", DEFAULT_MAX_FILE_SIZE_BYTES + 1, "CUST-1"),
            &limits,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::PayloadTooLarge(_)));

        let at_limit = request("image/jpeg", DEFAULT_MAX_FILE_SIZE_BYTES, "CUST-1");
        assert!(validate_asset_request(&at_limit, &limits).is_ok());
    }

    #[test]
    fn rejects_empty_payload() {
        let err = validate_asset_request(&request("image/jpeg", 0, "CUST-1"), &UploadLimits::default())
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn rejects_bad_entity_ids() {
        for id in ["", "  ", "../etc", "a/b", "a\\b", " CUST-1", "CUST\n1"] {
            assert!(validate_entity_id(id).is_err(), "accepted {:?}", id);
        }
        assert!(validate_entity_id("CUST-1").is_ok());
        assert!(validate_entity_id("cust_42").is_ok());
    }

    #[test]
    fn rejects_separator_only_entity_ids() {
        for id in ["_", "__", "_____"] {
            assert!(validate_entity_id(id).is_err(), "accepted {:?}", id);
        }
        assert!(validate_entity_id("_a_").is_ok());
    }
}
