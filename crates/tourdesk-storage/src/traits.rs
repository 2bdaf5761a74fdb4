//! Delivery transport abstraction
//!
//! This module defines the trait both transports implement and the error type they
//! report. Transport errors stay inside this crate; callers only ever see
//! `tourdesk_core::AppError`.

use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use thiserror::Error;
use tourdesk_core::{AssetCategory, TransportKind};

/// Why a single delivery attempt failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// Connection, DNS, timeout or transfer failure
    Network,
    /// The remote was reached and reported failure
    RemoteRejected,
    /// The HTTP reply could not be reduced to a JSON object
    UnparsableReply,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Network => write!(f, "network"),
            FailureReason::RemoteRejected => write!(f, "remote-rejected"),
            FailureReason::UnparsableReply => write!(f, "unparsable-reply"),
        }
    }
}

/// Transport operation errors
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Remote rejected the request: {0}")]
    RemoteRejected(String),

    #[error("Unparsable reply: {0}")]
    UnparsableReply(String),
}

impl TransportError {
    pub fn reason(&self) -> FailureReason {
        match self {
            TransportError::Network(_) => FailureReason::Network,
            TransportError::RemoteRejected(_) => FailureReason::RemoteRejected,
            TransportError::UnparsableReply(_) => FailureReason::UnparsableReply,
        }
    }
}

/// Result type for a single delivery attempt
pub type TransportResult<T = DeliveredAsset> = Result<T, TransportError>;

/// Everything a transport needs to place one asset.
///
/// `file_name` is generated once by the uploader so every transport targets the
/// same remote name.
#[derive(Debug, Clone)]
pub struct DeliveryRequest {
    pub payload: Bytes,
    pub file_name: String,
    pub entity_id: String,
    pub category: AssetCategory,
}

/// A successfully delivered asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveredAsset {
    pub file_name: String,
    pub url: String,
}

/// Delivery transport trait
///
/// Implementations make exactly one attempt and never retry internally; ordering
/// and fallback belong to [`crate::FallbackChain`].
#[async_trait]
pub trait DeliveryTransport: Send + Sync {
    /// Which transport this is (for logging and delivery outcomes)
    fn kind(&self) -> TransportKind;

    /// Place the payload at `<entity_id>/<file_name>` on the remote host
    async fn deliver(&self, request: &DeliveryRequest) -> TransportResult;
}
