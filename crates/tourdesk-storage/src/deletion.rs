//! Asset deletion over FTP.
//!
//! `remove` reports a plain boolean: `false` covers a missing file, a refused
//! connection and a timeout alike. Callers cannot tell these apart.

use std::sync::Arc;

use crate::ftp::FtpConnector;
use crate::keys::{join_remote, remote_key, PublicUrlLayout};
use crate::session::{with_session, SessionConnector};

pub struct AssetRemover<C: SessionConnector = FtpConnector> {
    connector: Arc<C>,
    root: String,
    urls: PublicUrlLayout,
}

impl<C: SessionConnector> AssetRemover<C> {
    pub fn new(connector: Arc<C>, root: impl Into<String>, urls: PublicUrlLayout) -> Self {
        Self {
            connector,
            root: root.into(),
            urls,
        }
    }

    /// Delete `<entity_id>/<file_name>`. Returns `true` only when the host confirmed
    /// the deletion.
    #[tracing::instrument(skip(self))]
    pub async fn remove(&self, entity_id: &str, file_name: &str) -> bool {
        if tourdesk_core::validation::validate_entity_id(entity_id).is_err()
            || !is_plain_file_name(file_name)
        {
            tracing::warn!("Refusing to delete asset with invalid path components");
            return false;
        }

        let connector = self.connector.clone();
        let path = join_remote(&self.root, &remote_key(entity_id, file_name));
        let remote_path = path.clone();

        let result = tokio::task::spawn_blocking(move || {
            with_session(connector.as_ref(), |session| session.remove(&remote_path))
        })
        .await;

        match result {
            Ok(Ok(())) => {
                tracing::info!(path = %path, "Asset deleted");
                true
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, path = %path, "Asset deletion failed");
                false
            }
            Err(e) => {
                tracing::error!(error = %e, path = %path, "Asset deletion task failed");
                false
            }
        }
    }

    /// Delete the asset behind a public URL produced by this media host.
    pub async fn remove_by_url(&self, url: &str) -> bool {
        match self.urls.locate(url) {
            Some((entity_id, file_name)) => self.remove(&entity_id, &file_name).await,
            None => {
                tracing::warn!(url = %url, "URL does not belong to the media host");
                false
            }
        }
    }
}

fn is_plain_file_name(file_name: &str) -> bool {
    !file_name.is_empty()
        && !file_name.contains(['/', '\\'])
        && file_name != "."
        && !file_name.contains("..")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::fake::FakeConnector;

    const STORED: &str = "/uploads/CUST-1/CUST-1_profile_1_2.jpg";

    fn remover(connector: FakeConnector) -> AssetRemover<FakeConnector> {
        AssetRemover::new(
            Arc::new(connector),
            "/uploads",
            PublicUrlLayout::new("https://media.example.com/uploads"),
        )
    }

    #[tokio::test]
    async fn deletes_existing_file() {
        let connector = FakeConnector::default().with_file(STORED, b"jpeg");
        assert!(
            remover(connector.clone())
                .remove("CUST-1", "CUST-1_profile_1_2.jpg")
                .await
        );
        connector.snapshot(|s| {
            assert!(s.files.is_empty());
            assert_eq!(s.closed, 1);
        });
    }

    #[tokio::test]
    async fn missing_file_returns_false() {
        let connector = FakeConnector::default();
        assert!(
            !remover(connector.clone())
                .remove("CUST-1", "CUST-1_profile_1_2.jpg")
                .await
        );
        connector.snapshot(|s| assert_eq!(s.closed, 1));
    }

    #[tokio::test]
    async fn connection_failure_returns_false() {
        let connector = FakeConnector {
            refuse_connect: true,
            ..Default::default()
        };
        assert!(!remover(connector).remove("CUST-1", "a.jpg").await);
    }

    #[tokio::test]
    async fn traversal_is_refused_without_connecting() {
        let connector = FakeConnector::default();
        let remover = remover(connector.clone());
        assert!(!remover.remove("CUST-1", "../other/a.jpg").await);
        assert!(!remover.remove("..", "a.jpg").await);
        assert!(!remover.remove("CUST-1", "").await);
        connector.snapshot(|s| assert_eq!(s.opened, 0));
    }

    #[tokio::test]
    async fn deletes_by_public_url() {
        let connector = FakeConnector::default().with_file(STORED, b"jpeg");
        let remover = remover(connector.clone());
        assert!(
            remover
                .remove_by_url("https://media.example.com/uploads/CUST-1/CUST-1_profile_1_2.jpg")
                .await
        );
        assert!(
            !remover
                .remove_by_url("https://elsewhere.example.com/CUST-1/a.jpg")
                .await
        );
    }
}
