pub mod asset;

pub use asset::{AssetCategory, AssetRequest, DeliveryOutcome};
