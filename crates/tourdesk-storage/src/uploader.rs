//! Upload orchestration.
//!
//! [`AssetUploader::store`] validates the request, names the asset once and hands it
//! to a [`FallbackChain`] that tries each transport in order until one succeeds.

use std::sync::Arc;

use tourdesk_core::{
    validate_asset_request, AppError, AssetRequest, DeliveryOutcome, TransportKind, UploadLimits,
};

use crate::naming::StoredAssetName;
use crate::traits::{DeliveredAsset, DeliveryRequest, DeliveryTransport, TransportError};

/// Ordered list of transports; the first success wins.
#[derive(Clone, Default)]
pub struct FallbackChain {
    transports: Vec<Arc<dyn DeliveryTransport>>,
}

impl FallbackChain {
    pub fn new(transports: Vec<Arc<dyn DeliveryTransport>>) -> Self {
        Self { transports }
    }

    pub fn then(mut self, transport: Arc<dyn DeliveryTransport>) -> Self {
        self.transports.push(transport);
        self
    }

    pub fn kinds(&self) -> Vec<TransportKind> {
        self.transports.iter().map(|t| t.kind()).collect()
    }

    /// Try each transport in order with the same request.
    ///
    /// On failure, returns every transport's error in attempt order.
    pub async fn deliver(
        &self,
        request: &DeliveryRequest,
    ) -> Result<(TransportKind, DeliveredAsset), Vec<(TransportKind, TransportError)>> {
        let mut failures = Vec::with_capacity(self.transports.len());

        for transport in &self.transports {
            let kind = transport.kind();
            match transport.deliver(request).await {
                Ok(delivered) => {
                    if !failures.is_empty() {
                        tracing::info!(
                            transport = %kind,
                            failed_attempts = failures.len(),
                            file_name = %request.file_name,
                            "Delivered through fallback transport"
                        );
                    }
                    return Ok((kind, delivered));
                }
                Err(e) => {
                    tracing::warn!(
                        transport = %kind,
                        reason = %e.reason(),
                        error = %e,
                        file_name = %request.file_name,
                        "Delivery attempt failed"
                    );
                    failures.push((kind, e));
                }
            }
        }

        Err(failures)
    }
}

/// Public entry point for storing customer images
#[derive(Clone)]
pub struct AssetUploader {
    chain: FallbackChain,
    limits: UploadLimits,
}

impl AssetUploader {
    pub fn new(chain: FallbackChain, limits: UploadLimits) -> Self {
        Self { chain, limits }
    }

    /// Transports in the order they are attempted
    pub fn transport_order(&self) -> Vec<TransportKind> {
        self.chain.kinds()
    }

    /// Store an asset on the media host.
    ///
    /// Fails with `InvalidInput`/`PayloadTooLarge` before any network call, or with
    /// `UploadFailed` once every transport has failed. Not idempotent: each call
    /// generates a new file name.
    #[tracing::instrument(
        skip(self, request),
        fields(
            entity_id = %request.entity_id,
            category = %request.category,
            size_bytes = request.size(),
        )
    )]
    pub async fn store(&self, request: &AssetRequest) -> Result<DeliveryOutcome, AppError> {
        validate_asset_request(request, &self.limits).map_err(|e| {
            tracing::debug!(error = %e, "Rejected asset before delivery");
            e
        })?;

        let name = StoredAssetName::generate(
            &request.entity_id,
            request.category,
            &request.original_file_name,
        );
        let delivery = DeliveryRequest {
            payload: request.payload.clone(),
            file_name: name.to_string(),
            entity_id: request.entity_id.clone(),
            category: request.category,
        };

        match self.chain.deliver(&delivery).await {
            Ok((transport, delivered)) => Ok(DeliveryOutcome {
                file_name: delivered.file_name,
                image_url: delivered.url,
                transport,
            }),
            Err(failures) => Err(Self::aggregate(&delivery, failures)),
        }
    }

    /// Fold per-transport failures into one error. The first attempt is the primary
    /// cause; later ones are only logged.
    fn aggregate(
        delivery: &DeliveryRequest,
        failures: Vec<(TransportKind, TransportError)>,
    ) -> AppError {
        let mut failures = failures.into_iter();
        let Some((primary_kind, primary)) = failures.next() else {
            return AppError::Internal("No delivery transport configured".to_string());
        };

        for (kind, error) in failures {
            tracing::warn!(
                transport = %kind,
                reason = %error.reason(),
                error = %error,
                file_name = %delivery.file_name,
                "Fallback transport also failed"
            );
        }

        tracing::error!(
            transport = %primary_kind,
            reason = %primary.reason(),
            error = %primary,
            file_name = %delivery.file_name,
            "Image upload failed on every transport"
        );

        AppError::upload_failed(
            "Failed to upload image to the media host, please try again later",
            primary,
        )
    }
}
