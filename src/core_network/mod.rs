pub mod client;
pub mod control;
pub mod listing;
pub mod pasv;
pub mod port;
pub mod transport;


pub use client::TcpTransport;
pub use listing::{EntryKind, RemoteEntry};
pub use transport::FtpTransport;
