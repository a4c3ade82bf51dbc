use std::{
    future::Future,
    io::ErrorKind,
    ops::Deref,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use fs4::tokio::AsyncFileExt;
use serde_json::Value;
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt},
};
use tracing::{debug, warn};

use crate::store::Work;

/// Interface for abstracting storage of the whole ledger.
pub trait SheetStorage {
    /// Reads the ledger. A sheet that doesn't exist yet is an empty ledger.
    fn load(&self) -> impl Future<Output = Result<Work>>;

    /// Replaces the stored ledger with `work`.
    fn save(&self, work: &Work) -> impl Future<Output = Result<()>>;
}

impl<T: Deref> SheetStorage for T
where
    T::Target: SheetStorage,
{
    fn load(&self) -> impl Future<Output = Result<Work>> {
        self.deref().load()
    }

    fn save(&self, work: &Work) -> impl Future<Output = Result<()>> {
        self.deref().save(work)
    }
}

/// The main realization of [SheetStorage]: a single pretty printed JSON file.
pub struct SheetFile {
    path: PathBuf,
}

impl SheetFile {
    pub fn new(path: PathBuf) -> Result<Self, std::io::Error> {
        if let Some(parent) = path.parent().filter(|v| !v.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_inner(path: &Path) -> std::result::Result<String, std::io::Error> {
        debug!("Reading sheet {path:?}");
        let mut file = File::open(path).await?;
        file.lock_shared()?;
        let mut content = String::new();
        let result = file.read_to_string(&mut content).await;
        file.unlock_async().await?;
        result.map(|_| content)
    }

    async fn write_inner(file: &mut File, content: &[u8]) -> Result<()> {
        file.set_len(0).await?;
        file.rewind().await?;
        file.write_all(content).await?;
        file.flush().await?;
        file.sync_all().await?;
        Ok(())
    }
}

impl SheetStorage for SheetFile {
    async fn load(&self) -> Result<Work> {
        let content = match Self::read_inner(&self.path).await {
            Ok(v) => v,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Sheet {:?} doesn't exist yet", self.path);
                return Ok(Work::new());
            }
            Err(e) => Err(e).with_context(|| format!("Failed to read {:?}", self.path))?,
        };

        if content.trim().is_empty() {
            warn!("Sheet {:?} is empty", self.path);
            return Ok(Work::new());
        }

        let raw: Value = serde_json::from_str(&content)
            .with_context(|| format!("Sheet {:?} is not valid json", self.path))?;
        if !raw.is_object() {
            bail!("Sheet {:?} doesn't hold a mapping of days", self.path);
        }
        Ok(Work::from_raw(&raw))
    }

    async fn save(&self, work: &Work) -> Result<()> {
        let mut content = serde_json::to_vec_pretty(&work.to_raw())?;
        content.push(b'\n');

        let mut file = File::options()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .await
            .with_context(|| format!("Failed to open {:?}", self.path))?;

        // Truncation has to wait for the lock, otherwise a reader may see a half written sheet.
        file.lock_exclusive()?;
        let result = Self::write_inner(&mut file, &content).await;
        file.unlock_async().await?;
        debug!("Saved sheet {:?}", self.path);
        result
    }
}
