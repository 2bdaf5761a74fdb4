//! FTP transport.
//!
//! Fallback upload path and the only way to delete assets. Every operation opens
//! its own session through a [`SessionConnector`]; the production connector is
//! [`FtpConnector`].

use async_trait::async_trait;
use std::io::Cursor;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;
use suppaftp::types::FileType;
use suppaftp::{FtpError, FtpStream};
use tourdesk_core::TransportKind;

use crate::keys::{join_remote, remote_key, PublicUrlLayout};
use crate::session::{with_session, RemoteSession, SessionConnector};
use crate::traits::{DeliveredAsset, DeliveryRequest, DeliveryTransport, TransportError, TransportResult};

/// Connection settings for the FTP host
#[derive(Clone)]
pub struct FtpSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// Connect timeout for both the control and the data connection
    pub connect_timeout: Duration,
    /// Read/write timeout on the control and data connections
    pub idle_timeout: Duration,
}

/// Opens real FTP sessions with `suppaftp`
#[derive(Clone)]
pub struct FtpConnector {
    settings: FtpSettings,
}

impl FtpConnector {
    pub fn new(settings: FtpSettings) -> Self {
        Self { settings }
    }

    fn resolve(&self) -> Result<SocketAddr, TransportError> {
        (self.settings.host.as_str(), self.settings.port)
            .to_socket_addrs()
            .map_err(|e| {
                TransportError::Network(format!(
                    "Failed to resolve {}:{}: {}",
                    self.settings.host, self.settings.port, e
                ))
            })?
            .next()
            .ok_or_else(|| {
                TransportError::Network(format!(
                    "No address for {}:{}",
                    self.settings.host, self.settings.port
                ))
            })
    }
}

fn ftp_error(operation: &str, error: FtpError) -> TransportError {
    TransportError::Network(format!("FTP {} failed: {}", operation, error))
}

/// Passive-mode data connection with the same timeouts as the control connection.
fn open_data_stream(
    addr: SocketAddr,
    connect_timeout: Duration,
    idle_timeout: Duration,
) -> Result<TcpStream, FtpError> {
    let stream = TcpStream::connect_timeout(&addr, connect_timeout).map_err(FtpError::ConnectionError)?;
    stream
        .set_read_timeout(Some(idle_timeout))
        .and_then(|_| stream.set_write_timeout(Some(idle_timeout)))
        .map_err(FtpError::ConnectionError)?;
    Ok(stream)
}

impl SessionConnector for FtpConnector {
    fn open(&self) -> Result<Box<dyn RemoteSession>, TransportError> {
        let addr = self.resolve()?;
        let connect_timeout = self.settings.connect_timeout;
        let idle_timeout = self.settings.idle_timeout;
        let stream = FtpStream::connect_timeout(addr, connect_timeout)
            .map_err(|e| ftp_error("connect", e))?
            .passive_stream_builder(move |data_addr| {
                open_data_stream(data_addr, connect_timeout, idle_timeout)
            });

        let control = stream.get_ref();
        control
            .set_read_timeout(Some(idle_timeout))
            .and_then(|_| control.set_write_timeout(Some(idle_timeout)))
            .map_err(|e| TransportError::Network(format!("Failed to set FTP timeouts: {}", e)))?;

        let mut session = FtpSession { stream: Some(stream) };
        let stream = session.stream()?;
        let ready = stream
            .login(self.settings.user.as_str(), self.settings.password.as_str())
            .map_err(|e| ftp_error("login", e))
            .and_then(|_| {
                stream
                    .transfer_type(FileType::Binary)
                    .map_err(|e| ftp_error("TYPE I", e))
            });

        if let Err(e) = ready {
            session.close();
            return Err(e);
        }

        tracing::debug!(host = %self.settings.host, port = self.settings.port, "FTP session opened");
        Ok(Box::new(session))
    }
}

struct FtpSession {
    stream: Option<FtpStream>,
}

impl FtpSession {
    fn stream(&mut self) -> Result<&mut FtpStream, TransportError> {
        self.stream
            .as_mut()
            .ok_or_else(|| TransportError::Network("FTP session already closed".to_string()))
    }
}

impl RemoteSession for FtpSession {
    fn make_dir(&mut self, path: &str) -> Result<(), TransportError> {
        self.stream()?.mkdir(path).map_err(|e| ftp_error("MKD", e))
    }

    fn put(&mut self, path: &str, data: &[u8]) -> Result<(), TransportError> {
        let mut reader = Cursor::new(data);
        self.stream()?
            .put_file(path, &mut reader)
            .map(|_| ())
            .map_err(|e| ftp_error("STOR", e))
    }

    fn remove(&mut self, path: &str) -> Result<(), TransportError> {
        self.stream()?.rm(path).map_err(|e| ftp_error("DELE", e))
    }

    fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.quit() {
                tracing::debug!(error = %e, "FTP QUIT failed, dropping connection");
            }
        }
    }
}

impl Drop for FtpSession {
    fn drop(&mut self) {
        self.close();
    }
}

/// Upload transport backed by FTP
pub struct FtpDelivery<C: SessionConnector = FtpConnector> {
    connector: Arc<C>,
    root: String,
    urls: PublicUrlLayout,
}

impl<C: SessionConnector> FtpDelivery<C> {
    pub fn new(connector: Arc<C>, root: impl Into<String>, urls: PublicUrlLayout) -> Self {
        Self {
            connector,
            root: root.into(),
            urls,
        }
    }
}

#[async_trait]
impl<C: SessionConnector> DeliveryTransport for FtpDelivery<C> {
    fn kind(&self) -> TransportKind {
        TransportKind::Ftp
    }

    async fn deliver(&self, request: &DeliveryRequest) -> TransportResult {
        let connector = self.connector.clone();
        let dir = join_remote(&self.root, &request.entity_id);
        let path = join_remote(
            &self.root,
            &remote_key(&request.entity_id, &request.file_name),
        );
        let payload = request.payload.clone();
        let start = std::time::Instant::now();

        let remote_path = path.clone();
        let result = tokio::task::spawn_blocking(move || {
            with_session(connector.as_ref(), |session| {
                if let Err(e) = session.make_dir(&dir) {
                    tracing::debug!(dir = %dir, error = %e, "Remote directory not created, assuming it exists");
                }
                session.put(&remote_path, &payload)
            })
        })
        .await
        .map_err(|e| TransportError::Network(format!("FTP task failed: {}", e)))?;

        if let Err(e) = result {
            tracing::warn!(
                error = %e,
                path = %path,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "FTP upload failed"
            );
            return Err(e);
        }

        tracing::info!(
            entity_id = %request.entity_id,
            path = %path,
            size_bytes = request.payload.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "FTP upload successful"
        );

        Ok(DeliveredAsset {
            file_name: request.file_name.clone(),
            url: self.urls.url_for(&request.entity_id, &request.file_name),
        })
    }
}
