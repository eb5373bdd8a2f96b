use crate::constants::DEFAULT_CONTROL_CHARSET;
use crate::core_ftpcommand::reply::{is_positive_completion, is_positive_intermediate};
use crate::core_ftpcommand::{FileType, FtpCommand, Reply};
use crate::core_network::control::ControlChannel;
use crate::core_network::listing::{parse_listing, RemoteEntry};
use crate::core_network::transport::FtpTransport;
use crate::core_network::{pasv, port};
use async_trait::async_trait;
use encoding_rs::Encoding;
use log::{debug, info, warn};
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

/// FTP transport over a plain TCP control connection.
pub struct TcpTransport {
    control: ControlChannel,
    passive: bool,
    // A RETR stream was handed out and its final reply is still unread.
    pending: bool,
    connected: bool,
}

impl TcpTransport {
    /// Opens the control connection and waits for the server greeting.
    pub async fn connect(host: &str, port: u16) -> io::Result<Self> {
        let stream = TcpStream::connect((host, port)).await?;
        let encoding =
            Encoding::for_label(DEFAULT_CONTROL_CHARSET.as_bytes()).unwrap_or(encoding_rs::WINDOWS_1252);
        let mut control = ControlChannel::new(stream, encoding)?;

        let mut greeting = control.read_reply().await?;
        // 120: service ready in a few minutes, the real greeting follows.
        while greeting.code == 120 {
            greeting = control.read_reply().await?;
        }
        if !greeting.is_positive_completion() {
            return Err(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                format!("server greeting {} {}", greeting.code, greeting.message()),
            ));
        }
        info!("Connected to {}:{} ({})", host, port, greeting.message());

        Ok(Self {
            control,
            passive: true,
            pending: false,
            connected: true,
        })
    }

    async fn settle_pending(&mut self) -> io::Result<()> {
        if self.pending {
            self.pending = false;
            let reply = self.control.read_reply().await?;
            if !reply.is_positive_completion() {
                warn!("Abandoned transfer ended with {} {}", reply.code, reply.message());
            }
        }
        Ok(())
    }

    async fn command(&mut self, command: FtpCommand, arg: Option<&str>) -> io::Result<Reply> {
        self.settle_pending().await?;
        match self.control.command(command, arg).await {
            Ok(reply) => Ok(reply),
            Err(e) => {
                if e.kind() == io::ErrorKind::UnexpectedEof {
                    self.connected = false;
                }
                Err(e)
            }
        }
    }

    async fn command_ok(&mut self, command: FtpCommand, arg: Option<&str>) -> io::Result<bool> {
        let reply = self.command(command, arg).await?;
        Ok(reply.is_positive_completion())
    }

    /// Opens a data connection for `command`. Returns `None` when the server
    /// refuses the transfer command itself.
    async fn open_data(
        &mut self,
        command: FtpCommand,
        arg: Option<&str>,
    ) -> io::Result<Option<TcpStream>> {
        self.settle_pending().await?;

        if self.passive {
            let data = pasv::open_passive_data_connection(&mut self.control).await?;
            let reply = self.control.command(command, arg).await?;
            if !reply.is_positive_preliminary() {
                debug!("{} refused: {} {}", command, reply.code, reply.message());
                return Ok(None);
            }
            Ok(Some(data))
        } else {
            let listener = port::open_active_listener(&mut self.control).await?;
            let reply = self.control.command(command, arg).await?;
            if !reply.is_positive_preliminary() {
                debug!("{} refused: {} {}", command, reply.code, reply.message());
                return Ok(None);
            }
            Ok(Some(port::accept_active_connection(listener).await?))
        }
    }

    async fn finish_transfer(&mut self) -> io::Result<bool> {
        let reply = self.control.read_reply().await?;
        Ok(reply.is_positive_completion())
    }
}

#[async_trait]
impl FtpTransport for TcpTransport {
    type Reader = TcpStream;

    async fn login(&mut self, user: &str, password: &str) -> io::Result<u16> {
        let reply = self.command(FtpCommand::USER, Some(user)).await?;
        if !is_positive_intermediate(reply.code) {
            return Ok(reply.code);
        }
        let reply = self.command(FtpCommand::PASS, Some(password)).await?;
        Ok(reply.code)
    }

    async fn send_command(&mut self, command: FtpCommand, arg: Option<&str>) -> io::Result<u16> {
        Ok(self.command(command, arg).await?.code)
    }

    fn enter_passive_mode(&mut self) {
        self.passive = true;
    }

    fn enter_active_mode(&mut self) {
        self.passive = false;
    }

    async fn make_directory(&mut self, path: &str) -> io::Result<bool> {
        self.command_ok(FtpCommand::MKD, Some(path)).await
    }

    async fn change_working_directory(&mut self, path: &str) -> io::Result<bool> {
        self.command_ok(FtpCommand::CWD, Some(path)).await
    }

    async fn change_to_parent_directory(&mut self) -> io::Result<bool> {
        self.command_ok(FtpCommand::CDUP, None).await
    }

    async fn print_working_directory(&mut self) -> io::Result<Option<String>> {
        let reply = self.command(FtpCommand::PWD, None).await?;
        Ok(reply.parse_pwd_257())
    }

    async fn list_files(&mut self, path: &str) -> io::Result<Vec<RemoteEntry>> {
        let arg = if path.is_empty() { None } else { Some(path) };
        let mut data = match self.open_data(FtpCommand::LIST, arg).await? {
            Some(data) => data,
            None => return Ok(Vec::new()),
        };

        let mut raw = Vec::new();
        data.read_to_end(&mut raw).await?;
        drop(data);

        let (text, _) = self.control.encoding().decode_without_bom_handling(&raw);
        let entries = parse_listing(&text);
        if !self.finish_transfer().await? {
            warn!("LIST {} did not complete cleanly", path);
        }
        Ok(entries)
    }

    async fn retrieve_file_stream(&mut self, path: &str) -> io::Result<Option<Self::Reader>> {
        let data = self.open_data(FtpCommand::RETR, Some(path)).await?;
        self.pending = data.is_some();
        Ok(data)
    }

    async fn complete_pending_command(&mut self) -> io::Result<bool> {
        if !self.pending {
            return Ok(true);
        }
        self.pending = false;
        self.finish_transfer().await
    }

    async fn retrieve_file(
        &mut self,
        path: &str,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> io::Result<bool> {
        let mut data = match self.open_data(FtpCommand::RETR, Some(path)).await? {
            Some(data) => data,
            None => return Ok(false),
        };
        let copied = tokio::io::copy(&mut data, sink).await?;
        sink.flush().await?;
        drop(data);
        debug!("Received {} bytes for {}", copied, path);
        self.finish_transfer().await
    }

    async fn store_file(
        &mut self,
        path: &str,
        source: &mut (dyn AsyncRead + Unpin + Send),
    ) -> io::Result<bool> {
        let mut data = match self.open_data(FtpCommand::STOR, Some(path)).await? {
            Some(data) => data,
            None => return Ok(false),
        };
        let copied = tokio::io::copy(source, &mut data).await?;
        data.shutdown().await?;
        drop(data);
        debug!("Sent {} bytes for {}", copied, path);
        self.finish_transfer().await
    }

    async fn delete_file(&mut self, path: &str) -> io::Result<bool> {
        self.command_ok(FtpCommand::DELE, Some(path)).await
    }

    async fn remove_directory(&mut self, path: &str) -> io::Result<bool> {
        self.command_ok(FtpCommand::RMD, Some(path)).await
    }

    async fn set_file_type(&mut self, file_type: FileType) -> io::Result<bool> {
        self.command_ok(FtpCommand::TYPE, Some(file_type.type_code()))
            .await
    }

    fn set_control_encoding(&mut self, encoding: &'static Encoding) {
        self.control.set_encoding(encoding);
    }

    async fn logout(&mut self) -> io::Result<bool> {
        let reply = self.command(FtpCommand::QUIT, None).await?;
        Ok(is_positive_completion(reply.code))
    }

    async fn disconnect(&mut self) -> io::Result<()> {
        self.connected = false;
        self.control.shutdown().await
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}
