use crate::core_ftpcommand::{FtpCommand, Reply};
use encoding_rs::Encoding;
use log::{debug, trace};
use std::io;
use std::net::SocketAddr;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

/// Command/response channel of an FTP connection.
///
/// Command lines are written, and reply lines decoded, with the configured
/// control encoding.
pub struct ControlChannel {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    encoding: &'static Encoding,
    local_addr: SocketAddr,
    peer_addr: SocketAddr,
}

impl ControlChannel {
    pub fn new(stream: TcpStream, encoding: &'static Encoding) -> io::Result<Self> {
        let local_addr = stream.local_addr()?;
        let peer_addr = stream.peer_addr()?;
        let (reader, writer) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(reader),
            writer,
            encoding,
            local_addr,
            peer_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    pub fn set_encoding(&mut self, encoding: &'static Encoding) {
        debug!("Control encoding set to {}", encoding.name());
        self.encoding = encoding;
    }

    pub async fn send(&mut self, command: FtpCommand, arg: Option<&str>) -> io::Result<()> {
        let line = command.line(arg);
        if command == FtpCommand::PASS {
            debug!("> PASS ****");
        } else {
            debug!("> {}", line);
        }
        let (bytes, _, _) = self.encoding.encode(&line);
        self.writer.write_all(&bytes).await?;
        self.writer.write_all(b"\r\n").await?;
        self.writer.flush().await
    }

    /// Sends a command and waits for its reply.
    pub async fn command(&mut self, command: FtpCommand, arg: Option<&str>) -> io::Result<Reply> {
        self.send(command, arg).await?;
        self.read_reply().await
    }

    /// Reads one complete reply, following `123-` continuation lines up to
    /// the closing `123 ` line.
    pub async fn read_reply(&mut self) -> io::Result<Reply> {
        let first = self.read_line().await?;
        let (code, more, text) = parse_reply_line(&first)?;
        let mut lines = vec![text.to_string()];

        if more {
            let end_prefix = format!("{} ", code);
            loop {
                let line = self.read_line().await?;
                if let Some(rest) = line.strip_prefix(&end_prefix) {
                    lines.push(rest.to_string());
                    break;
                }
                trace!("< {}", line);
                lines.push(line);
            }
        }

        let reply = Reply { code, lines };
        debug!("< {} {}", reply.code, reply.message());
        Ok(reply)
    }

    async fn read_line(&mut self) -> io::Result<String> {
        let mut buffer = Vec::new();
        let n = self.reader.read_until(b'\n', &mut buffer).await?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "control connection closed by server",
            ));
        }
        while matches!(buffer.last(), Some(b'\n') | Some(b'\r')) {
            buffer.pop();
        }
        let (line, _) = self.encoding.decode_without_bom_handling(&buffer);
        Ok(line.into_owned())
    }

    pub async fn shutdown(&mut self) -> io::Result<()> {
        self.writer.shutdown().await
    }
}

/// Splits `230 Logged in` / `220-Welcome` into code, continuation flag and text.
pub fn parse_reply_line(line: &str) -> io::Result<(u16, bool, &str)> {
    let invalid = || {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("malformed reply line: {:?}", line),
        )
    };
    let digits = line.get(..3).ok_or_else(invalid)?;
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let code: u16 = digits.parse().map_err(|_| invalid())?;
    if !(100..600).contains(&code) {
        return Err(invalid());
    }
    match line.as_bytes().get(3) {
        None => Ok((code, false, "")),
        Some(b' ') => Ok((code, false, &line[4..])),
        Some(b'-') => Ok((code, true, &line[4..])),
        Some(_) => Err(invalid()),
    }
}
