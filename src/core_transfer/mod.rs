// Transfer engines built on a session: upload, download/read, delete, listing
pub mod delete;
pub mod dirstack;
pub mod download;
pub mod listing;
pub mod upload;

#[cfg(test)]
mod test_transfer;

pub use delete::{classify, DeletionFrontier, RemoteKind};
pub use dirstack::DirStack;
pub use download::FileReader;
