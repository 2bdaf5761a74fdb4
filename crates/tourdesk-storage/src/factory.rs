use std::sync::Arc;

use tourdesk_core::{AppError, MediaDeliveryConfig};

use crate::deletion::AssetRemover;
use crate::ftp::{FtpConnector, FtpDelivery, FtpSettings};
use crate::http::{HttpDelivery, HttpDeliverySettings};
use crate::keys::PublicUrlLayout;
use crate::traits::DeliveryTransport;
use crate::uploader::{AssetUploader, FallbackChain};

fn ftp_connector(config: &MediaDeliveryConfig) -> Arc<FtpConnector> {
    Arc::new(FtpConnector::new(FtpSettings {
        host: config.ftp_host.clone(),
        port: config.ftp_port,
        user: config.ftp_user.clone(),
        password: config.ftp_password.clone(),
        connect_timeout: config.ftp_connect_timeout(),
        idle_timeout: config.ftp_idle_timeout(),
    }))
}

/// Create the uploader: HTTP delivery first, FTP as fallback.
pub fn create_uploader(config: &MediaDeliveryConfig) -> Result<AssetUploader, AppError> {
    let urls = PublicUrlLayout::new(config.public_base_url.clone());

    let http = HttpDelivery::new(
        HttpDeliverySettings {
            endpoint: config.http_upload_url.clone(),
            token: config.http_upload_token.clone(),
            timeout: config.http_timeout(),
        },
        urls.clone(),
    )?;
    let ftp = FtpDelivery::new(ftp_connector(config), config.ftp_root.clone(), urls);

    let chain = FallbackChain::default()
        .then(Arc::new(http) as Arc<dyn DeliveryTransport>)
        .then(Arc::new(ftp) as Arc<dyn DeliveryTransport>);

    tracing::debug!(transports = ?chain.kinds(), "Media uploader configured");

    Ok(AssetUploader::new(chain, config.upload_limits()))
}

/// Create the FTP-backed asset remover.
pub fn create_remover(config: &MediaDeliveryConfig) -> AssetRemover {
    AssetRemover::new(
        ftp_connector(config),
        config.ftp_root.clone(),
        PublicUrlLayout::new(config.public_base_url.clone()),
    )
}
