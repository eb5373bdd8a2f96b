// Client side of the FTP command set: verbs and reply handling
pub mod ftpcommand;
pub mod reply;

pub use ftpcommand::{FileType, FtpCommand};
pub use reply::Reply;
