use crate::core_ftpcommand::FtpCommand;
use crate::core_network::control::ControlChannel;
use log::debug;
use std::io;
use std::net::SocketAddr;
use tokio::net::TcpStream;

/// Sends PASV and connects to the data port announced by the server.
pub async fn open_passive_data_connection(control: &mut ControlChannel) -> io::Result<TcpStream> {
    let reply = control.command(FtpCommand::PASV, None).await?;
    let announced = reply.parse_pasv_227().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::Other,
            format!("PASV refused: {} {}", reply.code, reply.message()),
        )
    })?;

    let addr = data_address(announced, control.peer_addr());
    debug!("Opening passive data connection to {}", addr);
    TcpStream::connect(addr).await
}

/// Servers behind NAT often announce 0.0.0.0; fall back to the control peer then.
pub fn data_address(announced: SocketAddr, control_peer: SocketAddr) -> SocketAddr {
    if announced.ip().is_unspecified() {
        SocketAddr::new(control_peer.ip(), announced.port())
    } else {
        announced
    }
}
