use std::{
    fs, io,
    path::{Path, PathBuf},
};

use tempfile::TempDir;

/// Process-wide scratch directory, removed recursively when dropped
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    pub fn create() -> io::Result<Self> {
        let dir = tempfile::Builder::new().prefix("clip-bot-").tempdir()?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Remove the directory now, reporting failures instead of ignoring them
    pub fn close(self) -> io::Result<()> {
        self.dir.close()
    }

    /// Fresh per-job subdirectory
    pub fn job_dir(root: &Path) -> io::Result<PathBuf> {
        let dir = root.join(uuid::Uuid::new_v4().to_string());
        fs::create_dir(&dir)?;
        Ok(dir)
    }
}

/// A produced clip. Its job directory is removed by [`ClipFile::remove`], or
/// synchronously if the handle is dropped first.
#[derive(Debug)]
pub struct ClipFile {
    path: PathBuf,
    job_dir: Option<PathBuf>,
    id: String,
    ext: String,
}

impl ClipFile {
    pub fn new(job_dir: PathBuf, id: impl Into<String>, ext: impl Into<String>) -> Self {
        let id = id.into();
        let ext = ext.into();
        let path = job_dir.join(format!("{}.{}", id, ext));
        Self {
            path,
            job_dir: Some(job_dir),
            id,
            ext,
        }
    }

    /// Remove the job directory off the async worker threads
    pub async fn remove(mut self) {
        if let Some(dir) = self.job_dir.take() {
            remove_job_dir_async(&dir).await;
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn ext(&self) -> &str {
        &self.ext
    }
}

/// Removes a job directory on drop unless it has been handed off
pub struct JobDirGuard {
    dir: Option<PathBuf>,
}

impl JobDirGuard {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir: Some(dir) }
    }

    pub fn path(&self) -> &Path {
        self.dir.as_deref().unwrap_or(Path::new(""))
    }

    /// Transfer cleanup responsibility to the caller
    pub fn release(mut self) -> PathBuf {
        self.dir.take().unwrap_or_default()
    }

    pub async fn remove(mut self) {
        if let Some(dir) = self.dir.take() {
            remove_job_dir_async(&dir).await;
        }
    }
}

impl Drop for JobDirGuard {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            remove_job_dir(&dir);
        }
    }
}

impl Drop for ClipFile {
    fn drop(&mut self) {
        if let Some(dir) = self.job_dir.take() {
            remove_job_dir(&dir);
        }
    }
}

fn remove_job_dir(dir: &Path) {
    log_removal(dir, fs::remove_dir_all(dir));
}

async fn remove_job_dir_async(dir: &Path) {
    log_removal(dir, tokio::fs::remove_dir_all(dir).await);
}

fn log_removal(dir: &Path, result: io::Result<()>) {
    match result {
        Ok(()) => log::debug!("Removed {}", dir.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("Failed to remove {}: {}", dir.display(), e),
    }
}
