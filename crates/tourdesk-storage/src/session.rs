//! Scoped FTP sessions.
//!
//! A session is opened for exactly one unit of work (ensure directory + transfer, or
//! one delete) and closed on every exit path. Sessions are blocking; callers run
//! them on the blocking thread pool.

use crate::traits::TransportError;

/// One open session on the remote file host
pub trait RemoteSession: Send {
    /// Create a directory. Fails if it already exists.
    fn make_dir(&mut self, path: &str) -> Result<(), TransportError>;

    /// Store `data` at `path`, replacing any existing file
    fn put(&mut self, path: &str, data: &[u8]) -> Result<(), TransportError>;

    /// Delete the file at `path`
    fn remove(&mut self, path: &str) -> Result<(), TransportError>;

    /// End the session. Errors are logged, not reported.
    fn close(&mut self);
}

/// Opens authenticated sessions to the remote file host
pub trait SessionConnector: Send + Sync + 'static {
    fn open(&self) -> Result<Box<dyn RemoteSession>, TransportError>;
}

/// Run `work` inside a freshly opened session, closing it afterwards whatever the
/// outcome.
pub fn with_session<C, T, F>(connector: &C, work: F) -> Result<T, TransportError>
where
    C: SessionConnector + ?Sized,
    F: FnOnce(&mut dyn RemoteSession) -> Result<T, TransportError>,
{
    let mut session = connector.open()?;
    let result = work(session.as_mut());
    session.close();
    result
}
