//! Session directories for uploaded spreadsheets
//!
//! Every upload lands in `<root>/<session_id>/data.xlsx`. Staging arms a
//! cleanup countdown that deletes the session directory once it runs out.
//! The countdown can be cancelled from any task; whichever of cancel and
//! expiry claims the registry entry first wins.
//!
//! Countdowns die with the process. `sweep_expired` removes sessions left
//! behind by earlier runs based on their modification time.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWriteExt};
use tokio::sync::oneshot;
use uuid::Uuid;

use super::error::ImportError;

/// File name of the staged workbook inside a session directory
pub const STAGED_FILE_NAME: &str = "data.xlsx";

/// Default lifetime of a staged upload
pub const DEFAULT_CLEANUP_AFTER: Duration = Duration::from_secs(30 * 60);

const MAX_SESSION_ID_LEN: usize = 255;

/// A staged upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedUpload {
    pub session_id: String,
    pub path: PathBuf,
}

struct Countdown {
    generation: u64,
    cancel: oneshot::Sender<()>,
}

type Registry = Arc<Mutex<HashMap<String, Countdown>>>;

fn lock(registry: &Registry) -> MutexGuard<'_, HashMap<String, Countdown>> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owner of all session directories below a root
#[derive(Clone)]
pub struct StagingStore {
    root: PathBuf,
    ttl: Duration,
    countdowns: Registry,
    generation: Arc<AtomicU64>,
}

impl std::fmt::Debug for StagingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StagingStore")
            .field("root", &self.root)
            .field("ttl", &self.ttl)
            .field("pending", &lock(&self.countdowns).len())
            .finish()
    }
}

impl StagingStore {
    pub fn new(root: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            root: root.into(),
            ttl,
            countdowns: Arc::new(Mutex::new(HashMap::new())),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Directory of a session; the id must be a plain path segment
    pub fn session_dir(&self, session_id: &str) -> Result<PathBuf, ImportError> {
        validate_session_id(session_id)?;
        Ok(self.root.join(session_id))
    }

    /// Path of the workbook staged under a session
    pub fn staged_file_path(&self, session_id: &str) -> Result<PathBuf, ImportError> {
        Ok(self.session_dir(session_id)?.join(STAGED_FILE_NAME))
    }

    /// Persist an upload and arm its cleanup countdown.
    ///
    /// Without a session id a new UUID is generated. Staging again under an
    /// existing id overwrites the file and replaces the pending countdown.
    pub async fn stage<R>(
        &self,
        session_id: Option<&str>,
        mut content: R,
    ) -> Result<StagedUpload, ImportError>
    where
        R: AsyncRead + Unpin,
    {
        let session_id = match session_id {
            Some(id) => id.to_string(),
            None => Uuid::new_v4().to_string(),
        };
        let dir = self.session_dir(&session_id)?;

        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| ImportError::Directory {
                session_id: session_id.clone(),
                reason: e.to_string(),
            })?;

        let path = dir.join(STAGED_FILE_NAME);
        let written = match write_upload(&path, &mut content).await {
            Ok(written) => written,
            Err(e) => {
                // A half written upload must not outlive the failed call
                self.cancel(&session_id);
                if let Err(cleanup) = remove_session_dir(&dir).await {
                    log::warn!("Failed to remove {}: {}", dir.display(), cleanup);
                }
                return Err(ImportError::Persist {
                    reason: e.to_string(),
                });
            }
        };

        log::info!(
            "Staged {} bytes for session {} at {}",
            written,
            session_id,
            path.display()
        );

        self.arm_countdown(&session_id, dir);
        Ok(StagedUpload { session_id, path })
    }

    fn arm_countdown(&self, session_id: &str, dir: PathBuf) {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let (cancel, cancelled) = oneshot::channel();

        let previous = lock(&self.countdowns).insert(
            session_id.to_string(),
            Countdown { generation, cancel },
        );
        if let Some(previous) = previous {
            log::debug!("Replacing cleanup countdown of session {}", session_id);
            let _ = previous.cancel.send(());
        }

        let registry = Arc::clone(&self.countdowns);
        let ttl = self.ttl;
        let session_id = session_id.to_string();

        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(ttl) => {
                    let owned = {
                        let mut map = lock(&registry);
                        match map.get(&session_id) {
                            Some(c) if c.generation == generation => {
                                map.remove(&session_id);
                                true
                            }
                            _ => false,
                        }
                    };
                    if owned {
                        log::info!("Session {} expired, removing staged upload", session_id);
                        if let Err(e) = remove_session_dir(&dir).await {
                            log::warn!("Failed to remove {}: {}", dir.display(), e);
                        }
                    }
                }
                _ = cancelled => {
                    log::debug!("Cleanup countdown of session {} cancelled", session_id);
                }
            }
        });
    }

    /// Stop the cleanup countdown of a session without deleting anything.
    /// Returns whether a countdown was pending.
    pub fn cancel(&self, session_id: &str) -> bool {
        match lock(&self.countdowns).remove(session_id) {
            Some(countdown) => {
                let _ = countdown.cancel.send(());
                true
            }
            None => false,
        }
    }

    pub fn has_pending_cleanup(&self, session_id: &str) -> bool {
        lock(&self.countdowns).contains_key(session_id)
    }

    /// Cancel the countdown and delete the session directory right away
    pub async fn discard(&self, session_id: &str) -> Result<(), ImportError> {
        let dir = self.session_dir(session_id)?;
        self.cancel(session_id);
        remove_session_dir(&dir)
            .await
            .map_err(|e| ImportError::Directory {
                session_id: session_id.to_string(),
                reason: e.to_string(),
            })?;
        log::debug!("Discarded session {}", session_id);
        Ok(())
    }

    /// Remove session directories older than the ttl that no countdown of
    /// this store owns. A missing root counts as empty.
    pub async fn sweep_expired(&self) -> std::io::Result<usize> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e),
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let Ok(session_id) = entry.file_name().into_string() else {
                continue;
            };
            let owned = self.has_pending_cleanup(&session_id);
            if owned || validate_session_id(&session_id).is_err() {
                continue;
            }
            let dir = entry.path();
            if !entry.file_type().await?.is_dir() || !self.is_expired(&dir).await {
                continue;
            }

            match remove_session_dir(&dir).await {
                Ok(()) => {
                    log::info!("Removed expired session {}", session_id);
                    removed += 1;
                }
                Err(e) => log::warn!("Failed to remove {}: {}", dir.display(), e),
            }
        }
        Ok(removed)
    }

    /// Age of the staged file, or of the directory when there is no file
    async fn is_expired(&self, dir: &Path) -> bool {
        let metadata = match tokio::fs::metadata(dir.join(STAGED_FILE_NAME)).await {
            Ok(metadata) => Ok(metadata),
            Err(_) => tokio::fs::metadata(dir).await,
        };
        metadata
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| modified.elapsed().ok())
            .is_some_and(|age| age >= self.ttl)
    }
}

async fn write_upload<R>(path: &Path, content: &mut R) -> std::io::Result<u64>
where
    R: AsyncRead + Unpin,
{
    let mut file = tokio::fs::File::create(path).await?;
    let written = tokio::io::copy(content, &mut file).await?;
    file.flush().await?;
    Ok(written)
}

/// Remove a session directory; a missing directory is not an error
async fn remove_session_dir(dir: &Path) -> std::io::Result<()> {
    match tokio::fs::remove_dir_all(dir).await {
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

fn validate_session_id(session_id: &str) -> Result<(), ImportError> {
    let reason = if session_id.is_empty() {
        "session id is empty"
    } else if session_id.len() > MAX_SESSION_ID_LEN {
        "session id is too long"
    } else if session_id.contains(['/', '\\', '\0']) {
        "session id contains a path separator or NUL"
    } else if session_id.contains("..") || session_id == "." {
        "session id must not contain '..'"
    } else {
        return Ok(());
    };

    Err(ImportError::Directory {
        session_id: session_id.to_string(),
        reason: reason.to_string(),
    })
}
