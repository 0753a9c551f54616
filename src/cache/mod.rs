//! Durable warm-start cache for the merged guide.
//!
//! File I/O runs on one dedicated thread fed by a channel, so loads and saves
//! against the cache file are applied strictly in submission order. Saves go
//! through a temp file and a rename, so a reader never sees a half-written
//! payload. Failures stay inside this module: `load` yields `None` and
//! `save` becomes a no-op.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::{mpsc, Arc, Mutex},
    thread::{self, JoinHandle},
};

use anyhow::{Context, Result};
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::sync::oneshot;

mod payload;

pub use payload::CachePayload;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_warn};

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("cache worker is not running")]
    WorkerGone,
}

type Reply<T> = oneshot::Sender<Result<T, CacheError>>;

enum CacheCommand {
    Load(Reply<Option<CachePayload>>),
    Save(Box<CachePayload>, Reply<()>),
    Clear(Reply<()>),
    Shutdown,
}

struct CacheInner {
    sender: mpsc::Sender<CacheCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for CacheInner {
    fn drop(&mut self) {
        let mut guard = match self.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(handle) = guard.take() {
            if let Err(err) = self.sender.send(CacheCommand::Shutdown) {
                log_error!("Failed to send shutdown to guide cache thread: {err}");
            }
            if let Err(join_err) = handle.join() {
                log_error!("Failed to join guide cache thread: {join_err:?}");
            }
        }
    }
}

#[derive(Clone)]
pub struct GuideCache {
    inner: Arc<CacheInner>,
    path: Arc<PathBuf>,
}

impl GuideCache {
    /// Starts the cache worker for `path`. The file itself need not exist.
    pub fn open(path: PathBuf) -> Result<Self> {
        let (command_tx, command_rx) = mpsc::channel::<CacheCommand>();
        let path_for_thread = path.clone();

        let worker = thread::Builder::new()
            .name("epg-guide-cache".into())
            .spawn(move || {
                while let Ok(command) = command_rx.recv() {
                    match command {
                        CacheCommand::Load(reply) => {
                            let _ = reply.send(read_payload(&path_for_thread));
                        }
                        CacheCommand::Save(payload, reply) => {
                            let _ = reply.send(write_payload(&path_for_thread, &payload));
                        }
                        CacheCommand::Clear(reply) => {
                            let _ = reply.send(remove_payload(&path_for_thread));
                        }
                        CacheCommand::Shutdown => break,
                    }
                }

                log_debug!("guide cache thread shutting down");
            })
            .with_context(|| "failed to spawn guide cache worker thread")?;

        Ok(Self {
            inner: Arc::new(CacheInner {
                sender: command_tx,
                worker: Mutex::new(Some(worker)),
            }),
            path: Arc::new(path),
        })
    }

    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// Last saved payload, or `None` when the file is missing, unreadable or
    /// no longer matches the payload shape.
    pub async fn load(&self) -> Option<CachePayload> {
        match self.request(CacheCommand::Load).await {
            Ok(payload) => payload,
            Err(err) => {
                log_warn!("guide cache load skipped: {err}");
                None
            }
        }
    }

    /// Best-effort overwrite of the cache file.
    pub async fn save(&self, payload: &CachePayload) {
        let payload = Box::new(payload.clone());
        if let Err(err) = self
            .request(move |reply| CacheCommand::Save(payload, reply))
            .await
        {
            log_warn!("guide cache save skipped: {err}");
        }
    }

    pub async fn clear(&self) {
        if let Err(err) = self.request(CacheCommand::Clear).await {
            log_warn!("guide cache clear skipped: {err}");
        }
    }

    async fn request<T, F>(&self, command: F) -> Result<T, CacheError>
    where
        F: FnOnce(Reply<T>) -> CacheCommand,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.inner
            .sender
            .send(command(reply_tx))
            .map_err(|_| CacheError::WorkerGone)?;

        reply_rx.await.map_err(|_| CacheError::WorkerGone)?
    }
}

fn io_error(path: &Path, source: io::Error) -> CacheError {
    CacheError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn read_payload(path: &Path) -> Result<Option<CachePayload>, CacheError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(io_error(path, err)),
    };

    Ok(Some(serde_json::from_str(&contents)?))
}

fn write_payload(path: &Path, payload: &CachePayload) -> Result<(), CacheError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|err| io_error(parent, err))?;

    let serialized = serde_json::to_vec(payload)?;
    // Other caches or processes may target the same file; temp names stay unique.
    let mut temp = NamedTempFile::new_in(parent).map_err(|err| io_error(parent, err))?;
    temp.write_all(&serialized)
        .map_err(|err| io_error(temp.path(), err))?;
    temp.persist(path).map_err(|err| io_error(path, err.error))?;

    log_debug!("guide cache written to {}", path.display());
    Ok(())
}

fn remove_payload(path: &Path) -> Result<(), CacheError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(io_error(path, err)),
    }
}
