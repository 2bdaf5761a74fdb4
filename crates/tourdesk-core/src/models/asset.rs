use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::storage_types::TransportKind;

/// Kind of image attached to an entity record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetCategory {
    Profile,
    IdFront,
    IdBack,
}

impl AssetCategory {
    pub const ALL: [AssetCategory; 3] = [
        AssetCategory::Profile,
        AssetCategory::IdFront,
        AssetCategory::IdBack,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetCategory::Profile => "profile",
            AssetCategory::IdFront => "id-front",
            AssetCategory::IdBack => "id-back",
        }
    }
}

impl FromStr for AssetCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "profile" => Ok(AssetCategory::Profile),
            "id-front" => Ok(AssetCategory::IdFront),
            "id-back" => Ok(AssetCategory::IdBack),
            _ => Err(anyhow::anyhow!(
                "Invalid asset category: {} (expected profile, id-front or id-back)",
                s
            )),
        }
    }
}

impl Display for AssetCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// An in-memory asset handed over by the request layer.
///
/// The caller is expected to have authenticated the request and checked the
/// payload against the allow-list already; the pipeline checks again.
#[derive(Debug, Clone)]
pub struct AssetRequest {
    pub payload: Bytes,
    pub original_file_name: String,
    pub content_type: String,
    pub entity_id: String,
    pub category: AssetCategory,
}

impl AssetRequest {
    pub fn new(
        payload: impl Into<Bytes>,
        original_file_name: impl Into<String>,
        content_type: impl Into<String>,
        entity_id: impl Into<String>,
        category: AssetCategory,
    ) -> Self {
        Self {
            payload: payload.into(),
            original_file_name: original_file_name.into(),
            content_type: content_type.into(),
            entity_id: entity_id.into(),
            category,
        }
    }

    pub fn size(&self) -> usize {
        self.payload.len()
    }
}

/// Result of a successful upload.
///
/// Serializes to `{"fileName": ..., "imageUrl": ...}`. The transport is kept for
/// logging only and is not part of the response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryOutcome {
    pub file_name: String,
    pub image_url: String,
    #[serde(skip)]
    pub transport: TransportKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_round_trips_through_str() {
        for category in AssetCategory::ALL {
            assert_eq!(category.as_str().parse::<AssetCategory>().unwrap(), category);
        }
        assert!("passport".parse::<AssetCategory>().is_err());
    }

    #[test]
    fn category_serializes_kebab_case() {
        let json = serde_json::to_string(&AssetCategory::IdFront).unwrap();
        assert_eq!(json, "\"id-front\"");
    }

    #[test]
    fn outcome_serializes_without_transport() {
        let outcome = DeliveryOutcome {
            file_name: "CUST-1_profile_1_2.jpg".to_string(),
            image_url: "https://cdn.example.com/CUST-1/CUST-1_profile_1_2.jpg".to_string(),
            transport: TransportKind::Ftp,
        };
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["fileName"], "CUST-1_profile_1_2.jpg");
        assert_eq!(
            value["imageUrl"],
            "https://cdn.example.com/CUST-1/CUST-1_profile_1_2.jpg"
        );
        assert!(value.get("transport").is_none());
    }
}
