//! Background removal of files whose records are already gone.
//!
//! Deleting an image or album completes as soon as its records are removed;
//! the files are handed to a [`FileReaper`] and disappear shortly after.
//! Nobody waits on a removal: a missing file is ignored and any other failure
//! is logged and dropped. Leftovers are inert and are picked up by the
//! reconciliation sweep.

use std::path::PathBuf;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

enum ReapJob {
    File(PathBuf),
    Dir(PathBuf),
    Flush(oneshot::Sender<()>),
}

/// Handle to the background file-removal task.
///
/// Cloning the handle shares the same worker. The worker processes jobs in
/// submission order and exits once every handle is dropped.
#[derive(Debug, Clone)]
pub struct FileReaper {
    sender: mpsc::UnboundedSender<ReapJob>,
}

impl std::fmt::Debug for ReapJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "File({})", path.display()),
            Self::Dir(path) => write!(f, "Dir({})", path.display()),
            Self::Flush(_) => write!(f, "Flush"),
        }
    }
}

impl FileReaper {
    /// Spawn the worker task on the current Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn spawn() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();

        tokio::spawn(process_jobs(receiver));

        Self { sender }
    }

    /// Queue files for removal and return immediately.
    pub fn remove_files<I>(&self, paths: I)
    where
        I: IntoIterator<Item = PathBuf>,
    {
        for path in paths {
            self.submit(ReapJob::File(path));
        }
    }

    /// Queue a directory for recursive removal and return immediately.
    pub fn remove_dir(&self, path: PathBuf) {
        self.submit(ReapJob::Dir(path));
    }

    /// Wait until every removal queued before this call has been attempted.
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        self.submit(ReapJob::Flush(tx));
        let _ = rx.await;
    }

    fn submit(&self, job: ReapJob) {
        if let Err(e) = self.sender.send(job) {
            warn!(job = ?e.0, "File reaper has stopped; removal dropped");
        }
    }
}

async fn process_jobs(mut receiver: mpsc::UnboundedReceiver<ReapJob>) {
    while let Some(job) = receiver.recv().await {
        match job {
            ReapJob::File(path) => match tokio::fs::remove_file(&path).await {
                Ok(()) => debug!(path = %path.display(), "Removed file"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove file"),
            },
            ReapJob::Dir(path) => match tokio::fs::remove_dir_all(&path).await {
                Ok(()) => debug!(path = %path.display(), "Removed directory"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove directory"),
            },
            ReapJob::Flush(done) => {
                let _ = done.send(());
            }
        }
    }

    debug!("File reaper stopped");
}
