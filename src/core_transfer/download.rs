use crate::constants::DEFAULT_READ_CHARSET;
use crate::core_encoding::charset_for_label;
use crate::core_error::{FtpError, FtpResult};
use crate::core_ftpcommand::FileType;
use crate::core_network::FtpTransport;
use crate::session::Session;
use log::{debug, info};
use std::io;
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::fs::{self, File};
use tokio::io::{AsyncRead, AsyncWriteExt, BufWriter, ReadBuf};

/// A remote file being read straight off its data connection.
///
/// Holds the session borrowed until it is dropped. Call [`FileReader::finish`]
/// after reading to collect the server's transfer reply; a reader that is
/// simply dropped leaves that reply to be consumed before the next command.
pub struct FileReader<'a, T: FtpTransport> {
    session: &'a mut Session<T>,
    inner: T::Reader,
}

impl<'a, T: FtpTransport> FileReader<'a, T> {
    /// Closes the data stream and reports whether the server confirmed the transfer.
    pub async fn finish(self) -> FtpResult<bool> {
        let FileReader { session, inner } = self;
        drop(inner);
        Ok(session.transport()?.complete_pending_command().await?)
    }
}

impl<'a, T: FtpTransport> AsyncRead for FileReader<'a, T> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_read(cx, buf)
    }
}

impl<T: FtpTransport> Session<T> {
    /// Retrieves `remote_path` into `local_path`, creating missing parent
    /// directories. The local file is flushed and closed whatever happens.
    pub async fn download(&mut self, remote_path: &str, local_path: impl AsRef<Path>) -> FtpResult<()> {
        let local_path = local_path.as_ref();
        let encoded = self.encode(remote_path);
        let buffer_size = self.buffer_size();
        let transport = self.transport()?;

        if let Some(parent) = local_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        transport.set_file_type(FileType::Binary).await?;

        let mut sink = BufWriter::with_capacity(buffer_size, File::create(local_path).await?);
        let received = transport.retrieve_file(&encoded, &mut sink).await;
        let closed = sink.shutdown().await;

        if !received? {
            // Nothing was written, do not leave an empty file behind.
            if let Err(e) = fs::remove_file(local_path).await {
                debug!("Could not remove {}: {}", local_path.display(), e);
            }
            return Err(FtpError::Transfer(format!(
                "server refused to send {}",
                remote_path
            )));
        }
        closed?;
        info!("Downloaded {} to {}", remote_path, local_path.display());
        Ok(())
    }

    /// Opens `remote_path` for reading in binary mode.
    ///
    /// `charset` (UTF-8 when `None`) becomes the control connection's text
    /// encoding. The returned stream is the caller's to read and finish.
    pub async fn read_file(
        &mut self,
        remote_path: &str,
        charset: Option<&str>,
    ) -> FtpResult<FileReader<'_, T>> {
        let encoding = charset_for_label(charset.unwrap_or(DEFAULT_READ_CHARSET))?;
        let encoded = self.encode(remote_path);
        let transport = self.transport()?;

        transport.set_control_encoding(encoding);
        transport.set_file_type(FileType::Binary).await?;
        match transport.retrieve_file_stream(&encoded).await? {
            Some(inner) => {
                debug!("Reading {}", remote_path);
                Ok(FileReader {
                    session: self,
                    inner,
                })
            }
            None => Err(FtpError::Transfer(format!(
                "server refused to send {}",
                remote_path
            ))),
        }
    }
}
