use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use super::SandboxError;

/// Exclusively owned working directory of one submission
///
/// The directory is removed by [`Workspace::destroy`] or, on any early exit,
/// when the value is dropped. Removal failures are logged and never returned.
#[derive(Debug)]
pub struct Workspace {
    dir: PathBuf,
    removed: bool,
}

impl Workspace {
    /// Creates a fresh, randomly named directory under `root`, creating `root` if absent
    pub fn create(root: &Path) -> Result<Self, SandboxError> {
        fs::create_dir_all(root).map_err(|e| SandboxError::workspace(root, e))?;

        let dir = root.join(Uuid::new_v4().to_string());
        // `create_dir` fails on an existing path, so a workspace is never shared
        fs::create_dir(&dir).map_err(|e| SandboxError::workspace(&dir, e))?;

        log::debug!("Created workspace {}", dir.display());
        Ok(Self {
            dir,
            removed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Writes the submission as `file_name` inside the workspace and returns its path
    pub fn write_source(&self, file_name: &str, source: &str) -> Result<PathBuf, SandboxError> {
        let is_plain_name = Path::new(file_name)
            .file_name()
            .is_some_and(|name| name == file_name);
        if !is_plain_name {
            return Err(SandboxError::workspace(
                self.dir.join(file_name),
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "source file name must not contain path components",
                ),
            ));
        }

        let source_path = self.dir.join(file_name);
        fs::write(&source_path, source).map_err(|e| SandboxError::workspace(&source_path, e))?;
        Ok(source_path)
    }

    /// Removes the workspace directory and everything in it
    pub fn destroy(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        if self.removed {
            return;
        }
        self.removed = true;

        match fs::remove_dir_all(&self.dir) {
            Ok(()) => log::debug!("Removed workspace {}", self.dir.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("Workspace {} already gone", self.dir.display());
            }
            Err(e) => log::warn!("Failed to remove workspace {}: {e}", self.dir.display()),
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        self.remove();
    }
}
