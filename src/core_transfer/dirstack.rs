use crate::core_error::{FtpError, FtpResult};
use crate::core_network::FtpTransport;
use log::{error, trace};

/// Remote directories entered during a walk, innermost last.
///
/// Every `enter` is matched by exactly one CDUP, either through `leave` or
/// through `unwind`, which the caller runs on every exit path.
#[derive(Debug, Default)]
pub struct DirStack {
    entered: Vec<String>,
}

impl DirStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.entered.len()
    }

    /// Changes into `dir`. Returns false, without recording anything, when
    /// the server refuses.
    pub async fn enter<T: FtpTransport>(&mut self, transport: &mut T, dir: &str) -> FtpResult<bool> {
        if !transport.change_working_directory(dir).await? {
            return Ok(false);
        }
        trace!("Entered remote directory {} (depth {})", dir, self.entered.len() + 1);
        self.entered.push(dir.to_string());
        Ok(true)
    }

    /// Returns to the parent of the innermost entered directory.
    pub async fn leave<T: FtpTransport>(&mut self, transport: &mut T) -> FtpResult<()> {
        let Some(dir) = self.entered.pop() else {
            return Ok(());
        };
        if !transport.change_to_parent_directory().await? {
            return Err(FtpError::Transfer(format!(
                "server refused to leave remote directory {}",
                dir
            )));
        }
        Ok(())
    }

    /// Climbs back out of every directory still entered. All levels are
    /// attempted while the connection holds; the first failure is returned.
    pub async fn unwind<T: FtpTransport>(&mut self, transport: &mut T) -> FtpResult<()> {
        let mut first_failure = None;
        while let Some(dir) = self.entered.pop() {
            match transport.change_to_parent_directory().await {
                Ok(true) => trace!("Left remote directory {}", dir),
                Ok(false) => {
                    error!("Server refused CDUP out of {}", dir);
                    first_failure.get_or_insert(FtpError::Transfer(format!(
                        "server refused to leave remote directory {}",
                        dir
                    )));
                }
                Err(e) => {
                    error!("Lost connection while leaving {}: {}", dir, e);
                    self.entered.clear();
                    first_failure.get_or_insert(e.into());
                }
            }
        }
        first_failure.map_or(Ok(()), Err)
    }
}
