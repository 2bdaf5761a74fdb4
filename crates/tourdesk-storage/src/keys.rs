//! Shared key and URL layout for both transports.
//!
//! Remote key format: `<entity_id>/<file_name>`. Public URLs are
//! `<public_base>/<entity_id>/<file_name>` whichever transport stored the file.

/// Generate the remote key for an asset.
pub fn remote_key(entity_id: &str, file_name: &str) -> String {
    format!("{}/{}", entity_id, file_name)
}

/// Join a remote root directory with a relative key. An empty root means the
/// session's login directory.
pub fn join_remote(root: &str, key: &str) -> String {
    let root = root.trim_end_matches('/');
    if root.is_empty() {
        key.to_string()
    } else {
        format!("{}/{}", root, key)
    }
}

/// Public URL layout of the media host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicUrlLayout {
    base_url: String,
}

impl PublicUrlLayout {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Generate the public URL for an asset
    pub fn url_for(&self, entity_id: &str, file_name: &str) -> String {
        format!("{}/{}", self.base_url, remote_key(entity_id, file_name))
    }

    /// Recover `(entity_id, file_name)` from a URL produced by [`Self::url_for`].
    ///
    /// Returns `None` for URLs outside this layout.
    pub fn locate(&self, url: &str) -> Option<(String, String)> {
        let rest = url.strip_prefix(&self.base_url)?.strip_prefix('/')?;
        let rest = rest.split(['?', '#']).next().unwrap_or(rest);
        let (entity_id, file_name) = rest.split_once('/')?;
        if entity_id.is_empty() || file_name.is_empty() || file_name.contains('/') {
            return None;
        }
        Some((entity_id.to_string(), file_name.to_string()))
    }
}
