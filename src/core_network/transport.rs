use crate::core_ftpcommand::{FileType, FtpCommand};
use crate::core_network::listing::RemoteEntry;
use async_trait::async_trait;
use encoding_rs::Encoding;
use std::io;
use tokio::io::{AsyncRead, AsyncWrite};

/// The primitives a session needs from an FTP connection.
///
/// Methods returning `bool` report whether the server accepted the request;
/// `Err` is reserved for I/O failures of the connection itself.
#[async_trait]
pub trait FtpTransport: Send {
    /// Data stream handed out by `retrieve_file_stream`.
    type Reader: AsyncRead + Unpin + Send;

    /// Sends USER (and PASS when asked for) and returns the final reply code.
    async fn login(&mut self, user: &str, password: &str) -> io::Result<u16>;

    async fn send_command(&mut self, command: FtpCommand, arg: Option<&str>) -> io::Result<u16>;

    fn enter_passive_mode(&mut self);

    fn enter_active_mode(&mut self);

    async fn make_directory(&mut self, path: &str) -> io::Result<bool>;

    async fn change_working_directory(&mut self, path: &str) -> io::Result<bool>;

    async fn change_to_parent_directory(&mut self) -> io::Result<bool>;

    async fn print_working_directory(&mut self) -> io::Result<Option<String>>;

    async fn list_files(&mut self, path: &str) -> io::Result<Vec<RemoteEntry>>;

    /// Starts a RETR and returns the open data stream, or `None` when the
    /// server refused. The final reply must be read with
    /// `complete_pending_command`.
    async fn retrieve_file_stream(&mut self, path: &str) -> io::Result<Option<Self::Reader>>;

    async fn complete_pending_command(&mut self) -> io::Result<bool>;

    async fn retrieve_file(
        &mut self,
        path: &str,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> io::Result<bool>;

    async fn store_file(
        &mut self,
        path: &str,
        source: &mut (dyn AsyncRead + Unpin + Send),
    ) -> io::Result<bool>;

    async fn delete_file(&mut self, path: &str) -> io::Result<bool>;

    async fn remove_directory(&mut self, path: &str) -> io::Result<bool>;

    async fn set_file_type(&mut self, file_type: FileType) -> io::Result<bool>;

    fn set_control_encoding(&mut self, encoding: &'static Encoding);

    async fn logout(&mut self) -> io::Result<bool>;

    async fn disconnect(&mut self) -> io::Result<()>;

    fn is_connected(&self) -> bool;
}
