//! Error taxonomy for the wire layer.
//!
//! Every variant maps to one recovery path: timeouts and short reads
//! eliminate the affected participant, an auth rejection sends the client
//! back to credentials, and nothing here ever reaches the simulation — by
//! the time bytes cross into the logic crate, failure has already been
//! reduced to a liveness flag.

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetError {
    #[error("i/o: {0}")]
    Io(io::Error),
    #[error("receive deadline expired")]
    Timeout,
    #[error("connection closed mid-message")]
    ShortRead,
    #[error("authentication rejected")]
    AuthRejected,
    #[error("malformed message: {0}")]
    Malformed(String),
}

impl From<io::Error> for NetError {
    /// Timeouts surface as `WouldBlock` or `TimedOut` depending on the
    /// platform; both collapse into [`NetError::Timeout`]. An unexpected
    /// EOF is a short read, everything else stays an i/o error.
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => NetError::Timeout,
            io::ErrorKind::UnexpectedEof => NetError::ShortRead,
            _ => NetError::Io(err),
        }
    }
}

impl NetError {
    /// True for failures that eliminate a participant rather than abort
    /// the session.
    pub fn eliminates_participant(&self) -> bool {
        matches!(
            self,
            NetError::Timeout | NetError::ShortRead | NetError::Io(_)
        )
    }
}
