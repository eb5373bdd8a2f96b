//! An asynchronous FTP client: session management, recursive upload and
//! delete, downloads and streamed reads, with file name charset translation
//! for servers that do not speak UTF-8.

pub mod config;
pub mod constants;
pub mod core_cli;
pub mod core_encoding;
pub mod core_error;
pub mod core_ftpcommand;
pub mod core_log;
pub mod core_network;
pub mod core_transfer;
pub mod session;

pub use core_error::{FtpError, FtpResult};
pub use core_network::{EntryKind, FtpTransport, RemoteEntry, TcpTransport};
pub use core_transfer::FileReader;
pub use session::Session;
