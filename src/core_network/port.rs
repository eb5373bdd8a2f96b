use crate::core_ftpcommand::FtpCommand;
use crate::core_network::control::ControlChannel;
use log::{debug, info};
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};

/// How long to wait for the server to connect back in active mode.
pub const ACCEPT_TIMEOUT: Duration = Duration::from_secs(60);

/// Formats `h1,h2,h3,h4,p1,p2` for the PORT command. Only IPv4 can be announced.
pub fn format_port_argument(addr: SocketAddr) -> Option<String> {
    let ip = match addr.ip() {
        IpAddr::V4(ip) => ip,
        IpAddr::V6(_) => return None,
    };
    let o = ip.octets();
    Some(format!(
        "{},{},{},{},{},{}",
        o[0],
        o[1],
        o[2],
        o[3],
        addr.port() >> 8,
        addr.port() & 0xff
    ))
}

/// Binds a listener on the control connection's local address and announces
/// it with PORT.
pub async fn open_active_listener(control: &mut ControlChannel) -> io::Result<TcpListener> {
    let listener = TcpListener::bind((control.local_addr().ip(), 0)).await?;
    let addr = listener.local_addr()?;
    let arg = format_port_argument(addr).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::Unsupported,
            "active mode needs an IPv4 control connection",
        )
    })?;

    let reply = control.command(FtpCommand::PORT, Some(&arg)).await?;
    if !reply.is_positive_completion() {
        return Err(io::Error::new(
            io::ErrorKind::Other,
            format!("PORT refused: {} {}", reply.code, reply.message()),
        ));
    }
    debug!("Active mode listener announced on {}", addr);
    Ok(listener)
}

/// Waits for the server's data connection.
pub async fn accept_active_connection(listener: TcpListener) -> io::Result<TcpStream> {
    let (data_stream, addr) = tokio::time::timeout(ACCEPT_TIMEOUT, listener.accept())
        .await
        .map_err(|_| {
            io::Error::new(
                io::ErrorKind::TimedOut,
                "server did not open the data connection",
            )
        })??;
    info!("Accepted data connection from: {}", addr);
    Ok(data_stream)
}
