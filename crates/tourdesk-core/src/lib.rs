//! Tourdesk Core Library
//!
//! This crate provides the domain models, error types, configuration, and validation
//! shared by the media delivery pipeline and its binaries.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;
pub mod validation;

// Re-export commonly used types
pub use config::MediaDeliveryConfig;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{AssetCategory, AssetRequest, DeliveryOutcome};
pub use storage_types::TransportKind;
pub use validation::{validate_asset_request, UploadLimits};
