use crate::core_error::FtpResult;
use crate::core_network::{EntryKind, FtpTransport, RemoteEntry};
use crate::session::Session;
use log::{debug, error, info, warn};
use std::io;

/// What a listing says about the path that was listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteKind {
    Absent,
    File,
    Directory,
}

/// Classifies a listed path from its own listing.
///
/// An empty listing means the path does not exist. A file lists as itself
/// alone; a directory lists its pseudo-entries and children. Without entry
/// types, a single entry is taken for the file itself.
pub fn classify(path: &str, entries: &[RemoteEntry]) -> RemoteKind {
    if entries.is_empty() {
        return RemoteKind::Absent;
    }
    if entries.iter().any(|e| e.is_pseudo()) {
        return RemoteKind::Directory;
    }
    if let [only] = entries {
        match only.kind {
            EntryKind::Unknown => return RemoteKind::File,
            EntryKind::File | EntryKind::Symlink if base_name(&only.name) == base_name(path) => {
                return RemoteKind::File
            }
            _ => {}
        }
    }
    RemoteKind::Directory
}

fn base_name(path: &str) -> &str {
    path.trim_end_matches('/').rsplit('/').next().unwrap_or(path)
}

fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir.trim_end_matches('/'), name)
    }
}

/// Position of the deletion walk: the directory listed one level up and the
/// sub-directory below it being emptied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionFrontier {
    pub base_dir: String,
    pub relative: String,
}

impl DeletionFrontier {
    pub fn root(base_dir: &str) -> Self {
        Self {
            base_dir: base_dir.to_string(),
            relative: String::new(),
        }
    }

    /// Full remote path of the directory this frontier points at.
    pub fn path(&self) -> String {
        if self.relative.is_empty() {
            self.base_dir.clone()
        } else {
            join(&self.base_dir, &self.relative)
        }
    }

    pub fn child_path(&self, name: &str) -> String {
        join(&self.path(), name)
    }

    pub fn descend(&self, name: &str) -> Self {
        Self {
            base_dir: self.path(),
            relative: name.to_string(),
        }
    }
}

struct Frame {
    frontier: DeletionFrontier,
    children: std::vec::IntoIter<RemoteEntry>,
}

impl<T: FtpTransport> Session<T> {
    /// Deletes a remote file, or a directory with everything below it.
    ///
    /// Best effort: failures are logged and reported as `Ok(false)`. A path
    /// that does not exist counts as deleted, so `true` does not tell the
    /// caller whether anything was removed. Servers that leave "." and ".."
    /// out of LIST give an empty directory an empty listing; such a directory
    /// is taken for absent and left in place while `true` is returned.
    /// Only a disposed session is an error. Paths are built explicitly; the
    /// working directory is untouched.
    pub async fn delete(&mut self, remote_path: &str) -> FtpResult<bool> {
        let encoded = self.encode(remote_path);
        let transport = self.transport()?;
        match delete_tree(transport, &encoded).await {
            Ok(true) => {
                info!("Deleted {}", remote_path);
                Ok(true)
            }
            Ok(false) => Ok(false),
            Err(e) => {
                error!("Failed to delete {}: {}", remote_path, e);
                Ok(false)
            }
        }
    }

    /// True when `remote_path` lists like a directory.
    pub async fn is_directory(&mut self, remote_path: &str) -> FtpResult<bool> {
        let encoded = self.encode(remote_path);
        let entries = self.transport()?.list_files(&encoded).await?;
        Ok(classify(&encoded, &entries) == RemoteKind::Directory)
    }
}

async fn delete_tree<T: FtpTransport>(transport: &mut T, path: &str) -> io::Result<bool> {
    let entries = transport.list_files(path).await?;
    match classify(path, &entries) {
        RemoteKind::Absent => {
            debug!("{} does not exist, nothing to delete", path);
            Ok(true)
        }
        RemoteKind::File => {
            if transport.delete_file(path).await? {
                return Ok(true);
            }
            // Without "." and "..", a directory holding one same-named
            // entry lists exactly like that file.
            debug!("DELE {} refused, retrying as a directory", path);
            let deleted = delete_directory(transport, path, entries).await?;
            if !deleted {
                warn!("Failed to delete: {}", path);
            }
            Ok(deleted)
        }
        RemoteKind::Directory => delete_directory(transport, path, entries).await,
    }
}

/// Empties and removes a directory depth first. Files go before the
/// directory holding them; a directory goes once its listing is exhausted.
async fn delete_directory<T: FtpTransport>(
    transport: &mut T,
    path: &str,
    entries: Vec<RemoteEntry>,
) -> io::Result<bool> {
    let mut stack = vec![Frame {
        frontier: DeletionFrontier::root(path),
        children: entries.into_iter(),
    }];

    while let Some(frame) = stack.last_mut() {
        let Some(entry) = frame.children.next() else {
            let dir = frame.frontier.path();
            stack.pop();
            if !transport.remove_directory(&dir).await? {
                warn!("Failed to remove directory: {}", dir);
                return Ok(false);
            }
            debug!("Removed directory {}", dir);
            continue;
        };
        if entry.is_pseudo() {
            continue;
        }

        let child = frame.frontier.child_path(&entry.name);
        let listing = match entry.kind {
            EntryKind::Directory => Some(transport.list_files(&child).await?),
            EntryKind::File | EntryKind::Symlink => None,
            _ => {
                let listing = transport.list_files(&child).await?;
                (listing.len() > 1).then_some(listing)
            }
        };

        match listing {
            Some(children) => {
                let frontier = frame.frontier.descend(&entry.name);
                stack.push(Frame {
                    frontier,
                    children: children.into_iter(),
                });
            }
            None => {
                if !transport.delete_file(&child).await? {
                    warn!("Failed to delete: {}", child);
                    return Ok(false);
                }
                debug!("Deleted file {}", child);
            }
        }
    }
    Ok(true)
}
