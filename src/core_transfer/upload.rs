use crate::core_error::{FtpError, FtpResult};
use crate::core_ftpcommand::FileType;
use crate::core_network::FtpTransport;
use crate::core_transfer::dirstack::DirStack;
use crate::session::Session;
use log::{debug, error, info};
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::BufReader;

enum UploadStep {
    Visit(PathBuf),
    Leave,
}

impl<T: FtpTransport> Session<T> {
    /// Mirrors a local file or directory tree into the remote directory
    /// reached by walking `target_dirs` from the current one.
    ///
    /// Each target segment is created if needed and entered. Directories are
    /// created before anything is stored in them and files always travel in
    /// binary mode. The first failure stops the walk: a store refused by the
    /// server yields `Ok(false)`, a broken connection an `Err`. Either way the
    /// session is back in its original working directory when this returns.
    pub async fn upload<S: AsRef<str>>(
        &mut self,
        local_path: impl AsRef<Path>,
        target_dirs: &[S],
    ) -> FtpResult<bool> {
        let local_path = local_path.as_ref();
        self.transport()?;
        if fs::metadata(local_path).await.is_err() {
            return Err(FtpError::LocalPathNotFound(local_path.to_path_buf()));
        }

        let mut stack = DirStack::new();
        let outcome = self.upload_walk(local_path, target_dirs, &mut stack).await;
        let unwound = stack.unwind(self.transport()?).await;

        match (outcome, unwound) {
            (Err(e), _) => {
                error!("Upload of {} failed: {}", local_path.display(), e);
                Err(e)
            }
            (Ok(_), Err(e)) => Err(e),
            (Ok(uploaded), Ok(())) => {
                if uploaded {
                    info!("Uploaded {}", local_path.display());
                }
                Ok(uploaded)
            }
        }
    }

    /// Stores one local file into the current remote directory, under
    /// `remote_name` or the file's own name.
    pub async fn upload_file(
        &mut self,
        local_file: impl AsRef<Path>,
        remote_name: Option<&str>,
    ) -> FtpResult<bool> {
        let local_file = local_file.as_ref();
        self.transport()?;
        if fs::metadata(local_file).await.is_err() {
            return Err(FtpError::LocalPathNotFound(local_file.to_path_buf()));
        }
        let name = match remote_name {
            Some(name) => name.to_string(),
            None => local_name(local_file).await?,
        };
        self.store_local_file(local_file, &name).await
    }

    async fn upload_walk<S: AsRef<str>>(
        &mut self,
        local_path: &Path,
        target_dirs: &[S],
        stack: &mut DirStack,
    ) -> FtpResult<bool> {
        for dir in target_dirs {
            let dir = dir.as_ref();
            let encoded = self.encode(dir);
            self.ensure_and_enter(&encoded, dir, stack).await?;
        }

        let mut steps = vec![UploadStep::Visit(local_path.to_path_buf())];
        while let Some(step) = steps.pop() {
            let path = match step {
                UploadStep::Leave => {
                    stack.leave(self.transport()?).await?;
                    continue;
                }
                UploadStep::Visit(path) => path,
            };

            let name = local_name(&path).await?;
            if !fs::metadata(&path).await?.is_dir() {
                if !self.store_local_file(&path, &name).await? {
                    error!("FTP transfer failed: {}", path.display());
                    return Ok(false);
                }
                continue;
            }

            let children = local_children(&path).await?;
            let encoded = self.encode(&name);
            if children.is_empty() {
                self.ensure_directory(&encoded).await?;
                debug!("Created empty remote directory {}", name);
                continue;
            }
            self.ensure_and_enter(&encoded, &name, stack).await?;
            steps.push(UploadStep::Leave);
            steps.extend(children.into_iter().rev().map(UploadStep::Visit));
        }
        Ok(true)
    }

    /// MKD is best effort: a refusal usually means the directory is already there.
    async fn ensure_directory(&mut self, encoded: &str) -> FtpResult<()> {
        if !self.transport()?.make_directory(encoded).await? {
            debug!("MKD {} refused, assuming it exists", encoded);
        }
        Ok(())
    }

    async fn ensure_and_enter(&mut self, encoded: &str, name: &str, stack: &mut DirStack) -> FtpResult<()> {
        self.ensure_directory(encoded).await?;
        if !stack.enter(self.transport()?, encoded).await? {
            return Err(FtpError::Transfer(format!(
                "cannot enter remote directory {}",
                name
            )));
        }
        Ok(())
    }

    async fn store_local_file(&mut self, local_file: &Path, name: &str) -> FtpResult<bool> {
        if fs::metadata(local_file).await?.is_dir() {
            return Err(FtpError::FileSystemMismatch(local_file.to_path_buf()));
        }
        let encoded = self.encode(name);
        let buffer_size = self.buffer_size();
        let transport = self.transport()?;

        transport.set_file_type(FileType::Binary).await?;
        let mut source = BufReader::with_capacity(buffer_size, File::open(local_file).await?);
        let stored = transport.store_file(&encoded, &mut source).await?;
        if stored {
            debug!("Stored {} as {}", local_file.display(), name);
        }
        Ok(stored)
    }
}

/// Base name of a local path; `.` and similar are resolved first.
async fn local_name(path: &Path) -> FtpResult<String> {
    if let Some(name) = path.file_name() {
        return Ok(name.to_string_lossy().into_owned());
    }
    let canonical = fs::canonicalize(path).await?;
    canonical
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| FtpError::Transfer(format!("cannot upload {}", path.display())))
}

/// Entries of a local directory, sorted by name.
async fn local_children(dir: &Path) -> FtpResult<Vec<PathBuf>> {
    let mut children = Vec::new();
    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        children.push(entry.path());
    }
    children.sort();
    Ok(children)
}
