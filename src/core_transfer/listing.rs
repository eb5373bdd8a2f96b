use crate::core_error::FtpResult;
use crate::core_network::{FtpTransport, RemoteEntry};
use crate::session::Session;
use log::debug;

impl<T: FtpTransport> Session<T> {
    /// Lists `remote_path` in one call. Directory listings usually include
    /// "." and "..".
    pub async fn list_entries(&mut self, remote_path: &str) -> FtpResult<Vec<RemoteEntry>> {
        let encoded = self.encode(remote_path);
        let entries = self.transport()?.list_files(&encoded).await?;
        debug!("{} entries listed for {}", entries.len(), remote_path);
        Ok(entries)
    }
}
