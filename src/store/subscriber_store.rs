use std::path::{Path, PathBuf};
use std::sync::Arc;

use time::OffsetDateTime;
use tokio::io::AsyncWriteExt;

use super::StoreError;
use crate::domain::{NewSubscriber, Subscriber};

/// Owner of the subscribers file. Nothing else in the crate reads or writes it.
///
/// Every call goes back to disk; there is no cache shared between calls.
#[derive(Clone, Debug)]
pub struct SubscriberStore {
    path: Arc<PathBuf>,
}

impl SubscriberStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Arc::new(path.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the data directory and an empty collection if the file is absent.
    #[tracing::instrument(name = "Initialising the subscriber store", skip(self), fields(path = %self.path.display()))]
    pub async fn init(&self) -> Result<(), StoreError> {
        if let Some(parent) = non_empty_parent(&self.path) {
            tokio::fs::create_dir_all(parent).await?;
        }
        if tokio::fs::try_exists(self.path.as_path()).await? {
            return Ok(());
        }
        self.write_all(&[]).await?;
        tracing::info!("Created empty subscriber store");
        Ok(())
    }

    #[tracing::instrument(name = "Loading all subscribers", skip(self))]
    pub async fn load_all(&self) -> Result<Vec<Subscriber>, StoreError> {
        let raw = match tokio::fs::read(self.path.as_path()).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&raw).map_err(|source| StoreError::Corrupt {
            path: self.path.to_path_buf(),
            source,
        })
    }

    #[tracing::instrument(name = "Checking for an existing subscriber", skip(self))]
    pub async fn exists(&self, email: &str) -> Result<bool, StoreError> {
        let subscribers = self.load_all().await?;
        Ok(subscribers.iter().any(|s| s.has_email(email)))
    }

    /// Re-reads the collection, rejects the record if its email is already
    /// present, then atomically replaces the file with the extended collection.
    ///
    /// A file holding malformed data is moved aside before the write so its
    /// bytes survive for manual recovery.
    #[tracing::instrument(
        name = "Appending a subscriber to the store",
        skip(self, new_subscriber),
        fields(subscriber_email = %new_subscriber.email)
    )]
    pub async fn append(&self, new_subscriber: NewSubscriber) -> Result<Subscriber, StoreError> {
        let mut subscribers = match self.load_all().await {
            Ok(subscribers) => subscribers,
            Err(StoreError::Corrupt { source, .. }) => {
                let preserved = self.quarantine().await?;
                tracing::error!(
                    error.message = %source,
                    preserved_at = %preserved.display(),
                    "Subscriber store was malformed; moved it aside and started a new collection"
                );
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        if subscribers
            .iter()
            .any(|s| s.has_email(new_subscriber.email.as_ref()))
        {
            return Err(StoreError::Duplicate(new_subscriber.email.into()));
        }

        let subscriber = Subscriber::new(new_subscriber, OffsetDateTime::now_utc());
        subscribers.push(subscriber.clone());
        self.write_all(&subscribers).await?;
        Ok(subscriber)
    }

    // Writes to a sibling temp file and renames it over the target, so a crash
    // mid-write leaves the previous collection intact.
    async fn write_all(&self, subscribers: &[Subscriber]) -> Result<(), StoreError> {
        let data = serde_json::to_vec_pretty(subscribers).map_err(StoreError::Serialization)?;
        let tmp = self.sibling("tmp");

        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&data).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, self.path.as_path()).await?;
        if let Err(e) = fsync_parent_dir(&self.path).await {
            tracing::warn!(error.message = %e, "Failed to fsync the store directory");
        }
        Ok(())
    }

    // Never reuses the name of an earlier backup, since `rename` would replace it.
    async fn quarantine(&self) -> Result<PathBuf, StoreError> {
        let stamp = OffsetDateTime::now_utc().unix_timestamp_nanos();
        let mut target = self.sibling(&format!("corrupt-{}", stamp));
        let mut attempt = 1;
        while tokio::fs::try_exists(&target).await? {
            target = self.sibling(&format!("corrupt-{}-{}", stamp, attempt));
            attempt += 1;
        }
        tokio::fs::rename(self.path.as_path(), &target).await?;
        Ok(target)
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(format!(".{}", suffix));
        self.path.with_file_name(name)
    }
}

fn non_empty_parent(path: &Path) -> Option<&Path> {
    path.parent().filter(|p| !p.as_os_str().is_empty())
}

#[cfg(unix)]
async fn fsync_parent_dir(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = non_empty_parent(path) {
        tokio::fs::File::open(parent).await?.sync_all().await?;
    }
    Ok(())
}

#[cfg(not(unix))]
async fn fsync_parent_dir(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
