// Error handling for the FTP client session and its transfer engines
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FtpError {
    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("Login refused by server (reply {0})")]
    Auth(u16),

    #[error("Session has been disposed")]
    SessionDisposed,

    #[error("Local path does not exist: {0}")]
    LocalPathNotFound(PathBuf),

    #[error("Transfer failed: {0}")]
    Transfer(String),

    #[error("Expected a single file but found a directory: {0}")]
    FileSystemMismatch(PathBuf),

    #[error("Unknown charset: {0}")]
    UnknownCharset(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl FtpError {
    /// True for errors raised before any remote command was issued because
    /// the caller broke a precondition (disposed session, missing local path).
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            FtpError::SessionDisposed | FtpError::LocalPathNotFound(_)
        )
    }
}

pub type FtpResult<T> = Result<T, FtpError>;
