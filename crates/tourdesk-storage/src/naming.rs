//! Stored asset names.
//!
//! Format: `{entity_id}_{category}_{unix_millis}_{random}.{ext}`. Names already stored
//! on the media host use this exact layout, so it must not change.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use tourdesk_core::AssetCategory;

/// Separator between name components. Never present inside a component.
pub const SEPARATOR: char = '_';

/// Extension used when the original file name has none
pub const FALLBACK_EXTENSION: &str = "bin";

/// A generated, collision-resistant remote file name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoredAssetName {
    entity_id: String,
    category: AssetCategory,
    timestamp_millis: i64,
    salt: u64,
    extension: String,
}

impl StoredAssetName {
    /// Generate a fresh name from the wall clock and a random salt.
    pub fn generate(entity_id: &str, category: AssetCategory, original_file_name: &str) -> Self {
        Self::compose(
            entity_id,
            category,
            original_file_name,
            chrono::Utc::now().timestamp_millis(),
            rand::random::<u64>(),
        )
    }

    /// Build a name from explicit clock and salt values.
    pub fn compose(
        entity_id: &str,
        category: AssetCategory,
        original_file_name: &str,
        timestamp_millis: i64,
        salt: u64,
    ) -> Self {
        Self {
            entity_id: entity_id.replace(SEPARATOR, ""),
            category,
            timestamp_millis,
            salt,
            extension: extension_of(original_file_name),
        }
    }

    /// Parse a stored file name back into its components.
    pub fn parse(file_name: &str) -> Option<Self> {
        let (stem, extension) = file_name.rsplit_once('.')?;
        if extension.is_empty() || !extension.chars().all(|c| c.is_ascii_alphanumeric()) {
            return None;
        }

        let mut parts = stem.split(SEPARATOR);
        let entity_id = parts.next().filter(|s| !s.is_empty())?;
        let category = AssetCategory::from_str(parts.next()?).ok()?;
        let timestamp_millis = parts.next()?.parse::<i64>().ok()?;
        let salt = parts.next()?.parse::<u64>().ok()?;
        if parts.next().is_some() {
            return None;
        }

        Some(Self {
            entity_id: entity_id.to_string(),
            category,
            timestamp_millis,
            salt,
            extension: extension.to_string(),
        })
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    pub fn category(&self) -> AssetCategory {
        self.category
    }

    pub fn timestamp_millis(&self) -> i64 {
        self.timestamp_millis
    }

    pub fn salt(&self) -> u64 {
        self.salt
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }
}

impl fmt::Display for StoredAssetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{sep}{}{sep}{}{sep}{}.{}",
            self.entity_id,
            self.category.as_str(),
            self.timestamp_millis,
            self.salt,
            self.extension,
            sep = SEPARATOR
        )
    }
}

/// Lowercase extension of `file_name`, reduced to ASCII alphanumerics.
fn extension_of(file_name: &str) -> String {
    let extension: String = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase();

    if extension.is_empty() {
        FALLBACK_EXTENSION.to_string()
    } else {
        extension
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn composes_expected_layout() {
        let name = StoredAssetName::compose("CUST-1", AssetCategory::IdFront, "Scan.JPG", 1700000000123, 42);
        assert_eq!(name.to_string(), "CUST-1_id-front_1700000000123_42.jpg");
    }

    #[test]
    fn strips_separator_from_entity_id() {
        let name = StoredAssetName::compose("cust_42", AssetCategory::Profile, "a.png", 1, 2);
        assert_eq!(name.entity_id(), "cust42");
        assert_eq!(name.to_string(), "cust42_profile_1_2.png");
    }

    #[test]
    fn falls_back_when_extension_missing() {
        for original in ["photo", "", "archive.", "dir.d/photo"] {
            let name = StoredAssetName::compose("CUST-1", AssetCategory::Profile, original, 1, 2);
            assert_eq!(name.extension(), FALLBACK_EXTENSION, "for {:?}", original);
        }
    }

    #[test]
    fn sanitizes_extension() {
        let name = StoredAssetName::compose("CUST-1", AssetCategory::Profile, "x.we_bp", 1, 2);
        assert_eq!(name.extension(), "webp");
    }

    #[test]
    fn parse_round_trips_components() {
        let name = StoredAssetName::generate("CUST-1", AssetCategory::IdBack, "back.webp");
        let parsed = StoredAssetName::parse(&name.to_string()).unwrap();
        assert_eq!(parsed, name);
        assert_eq!(parsed.entity_id(), "CUST-1");
        assert_eq!(parsed.category(), AssetCategory::IdBack);
        assert_eq!(parsed.extension(), "webp");
    }

    #[test]
    fn names_for_accepted_entity_ids_parse_back() {
        use tourdesk_core::validation::validate_entity_id;

        for entity_id in ["CUST-1", "cust_42", "_a_", "CUST.7", "Jean Dupont"] {
            assert!(validate_entity_id(entity_id).is_ok(), "rejected {:?}", entity_id);
            let name = StoredAssetName::generate(entity_id, AssetCategory::Profile, "a.jpg");
            assert_eq!(
                StoredAssetName::parse(&name.to_string()).as_ref(),
                Some(&name),
                "for {:?}",
                entity_id
            );
        }
        for entity_id in ["_", "__"] {
            assert!(validate_entity_id(entity_id).is_err(), "accepted {:?}", entity_id);
        }
    }

    #[test]
    fn parse_rejects_foreign_names() {
        for file_name in [
            "photo.jpg",
            "CUST-1_profile_abc_1.jpg",
            "CUST-1_passport_1_2.jpg",
            "CUST-1_profile_1_2_3.jpg",
            "CUST-1_profile_1_2",
            "_profile_1_2.jpg",
        ] {
            assert!(StoredAssetName::parse(file_name).is_none(), "parsed {:?}", file_name);
        }
    }

    #[test]
    fn same_millisecond_names_differ() {
        let names: HashSet<String> = (0..1000)
            .map(|_| {
                StoredAssetName::compose(
                    "CUST-1",
                    AssetCategory::Profile,
                    "a.jpg",
                    1700000000000,
                    rand::random::<u64>(),
                )
                .to_string()
            })
            .collect();
        assert_eq!(names.len(), 1000);
    }

    #[test]
    fn generated_names_are_unique() {
        let first = StoredAssetName::generate("CUST-1", AssetCategory::Profile, "a.jpg");
        let second = StoredAssetName::generate("CUST-1", AssetCategory::Profile, "a.jpg");
        assert_ne!(first.to_string(), second.to_string());
    }
}
