//! Tourdesk Storage Library
//!
//! This crate places customer images on the remote media host and removes them again.
//! The host is reachable through two transports: an HTTP upload script (tried first)
//! and FTP (fallback, and the only transport that can delete).
//!
//! # Remote layout
//!
//! Every asset lives at `<entity_id>/<file_name>` below the transport's root, and is
//! publicly served at `<public_base>/<entity_id>/<file_name>` regardless of which
//! transport wrote it. File names are generated by the `naming` module:
//!
//! `{entity_id}_{category}_{unix_millis}_{random}.{ext}`

pub mod deletion;
pub mod factory;
pub mod ftp;
pub mod http;
pub mod keys;
pub mod naming;
pub mod session;
pub mod traits;
pub mod uploader;

// Re-export commonly used types
pub use deletion::AssetRemover;
pub use factory::{create_remover, create_uploader};
pub use ftp::{FtpConnector, FtpDelivery, FtpSettings};
pub use http::{HttpDelivery, HttpDeliverySettings};
pub use keys::PublicUrlLayout;
pub use naming::StoredAssetName;
pub use session::{RemoteSession, SessionConnector};
pub use traits::{
    DeliveredAsset, DeliveryRequest, DeliveryTransport, FailureReason, TransportError,
    TransportResult,
};
pub use uploader::{AssetUploader, FallbackChain};
pub use tourdesk_core::TransportKind;
