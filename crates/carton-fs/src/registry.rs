//! Registry of live temp files and the background reclaimer.
//!
//! Every file created through [`TempFileRegistry`] is recorded in a live set
//! keyed by path. The caller receives a [`TempFile`] handle; when its last
//! clone is dropped the handle posts a reclaim ticket on a FIFO queue. A single
//! worker thread drains that queue and deletes each file exactly once.
//!
//! The worker is started by the first registration and parks itself (handing
//! the queue back to the registry) as soon as the live set is empty. The next
//! registration starts a fresh worker.
//!
//! Deletion timing follows handle reachability: a file outlives the call that
//! created it for as long as any clone of its handle is alive, and no longer
//! than one trip through the queue after that.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::{Error, ReclaimError, Result, io_at};
use crate::handle::TempFile;
use crate::options::{RegistryOptions, TempFileSpec};
use crate::path::{normalize_extension, resolve_dir, system_temp_root, validate_name};

const WORKER_NAME: &str = "carton-reclaim";

pub(crate) type TicketId = u64;

/// A handle that became unreachable.
#[derive(Debug)]
pub(crate) struct Ticket {
    pub(crate) path: PathBuf,
    pub(crate) id:   TicketId,
}

#[derive(Default)]
struct State {
    live:           HashMap<PathBuf, TicketId>,
    armed:          HashSet<PathBuf>,
    receiver:       Option<Receiver<Ticket>>,
    worker_running: bool,
}

pub(crate) struct Shared {
    root:              PathBuf,
    default_extension: String,
    next_id:           AtomicU64,
    queue:             Sender<Ticket>,
    state:             Mutex<State>,
    idle:              Condvar,
    failures:          Mutex<Vec<ReclaimError>>,
}

/// Creates temp files and deletes them once their handles are gone.
///
/// Cloning is cheap; all clones share one live set and one worker.
#[derive(Clone)]
pub struct TempFileRegistry {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for TempFileRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TempFileRegistry")
            .field("root", &self.shared.root)
            .field("live", &self.live_count())
            .finish()
    }
}

impl Default for TempFileRegistry {
    fn default() -> Self { Self::system() }
}

impl TempFileRegistry {
    pub fn new(options: RegistryOptions) -> Self {
        let (queue, receiver) = mpsc::channel();
        let root = options
            .get_root()
            .cloned()
            .unwrap_or_else(|| system_temp_root().to_path_buf());

        Self {
            shared: Arc::new(Shared {
                root,
                default_extension: options.get_default_extension().to_string(),
                next_id: AtomicU64::new(0),
                queue,
                state: Mutex::new(State {
                    receiver: Some(receiver),
                    ..State::default()
                }),
                idle: Condvar::new(),
                failures: Mutex::new(Vec::new()),
            }),
        }
    }

    /// A registry rooted at the OS temp directory.
    pub fn system() -> Self { Self::new(RegistryOptions::new()) }

    pub fn root(&self) -> &Path { &self.shared.root }

    /// Validates the name and extension of `spec` without touching the disk.
    pub fn check_spec(&self, spec: &TempFileSpec) -> Result<()> {
        validate_name(spec.base_name())?;
        normalize_extension(spec.extension_str(), &self.shared.default_extension).map(drop)
    }

    /// Creates a new, empty, uniquely named file and starts tracking it.
    pub fn create_empty(&self, spec: &TempFileSpec) -> Result<TempFile> {
        validate_name(spec.base_name())?;
        let extension = normalize_extension(spec.extension_str(), &self.shared.default_extension)?;
        let dir = resolve_dir(&self.shared.root, spec.segment_list())?;

        let path = tempfile::Builder::new()
            .prefix(spec.base_name())
            .suffix(&extension)
            .tempfile_in(&dir)
            .map_err(io_at(&dir))?
            .into_temp_path()
            .keep()
            .map_err(|e| Error::Io {
                path:   dir.clone(),
                source: e.error,
            })?;

        self.shared.register(path)
    }

    pub fn live_count(&self) -> usize { self.shared.lock_state().live.len() }

    pub fn is_live(&self, path: impl AsRef<Path>) -> bool {
        self.shared.lock_state().live.contains_key(path.as_ref())
    }

    /// Blocks until every registered file has been reclaimed and the worker
    /// has parked. Returns `false` on timeout.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.shared.lock_state();
        loop {
            if state.live.is_empty() && !state.worker_running {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            state = self
                .shared
                .idle
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    /// Drains the reclaim failures retained so far.
    pub fn take_reclaim_errors(&self) -> Vec<ReclaimError> {
        std::mem::take(&mut *self.shared.failures.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Deletes every file created by this registry that has not been reclaimed
    /// yet, whether or not its handle is still alive. Returns how many files
    /// were removed.
    pub fn sweep(&self) -> usize { self.shared.sweep() }

    /// Guard that sweeps the registry when dropped; hold it in `main`.
    pub fn exit_guard(&self) -> ExitGuard {
        ExitGuard {
            registry: self.clone(),
        }
    }
}

impl Shared {
    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn register(self: &Arc<Self>, path: PathBuf) -> Result<TempFile> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut state = self.lock_state();
        state.live.insert(path.clone(), id);
        state.armed.insert(path.clone());

        if !state.worker_running {
            state.worker_running = true;
            let shared = Arc::clone(self);
            let spawned = thread::Builder::new()
                .name(WORKER_NAME.to_string())
                .spawn(move || shared.run_worker());

            if let Err(source) = spawned {
                state.worker_running = false;
                state.live.remove(&path);
                state.armed.remove(&path);
                drop(state);
                let _ = std::fs::remove_file(&path);
                return Err(Error::Io { path, source });
            }
            debug!("reclaim worker started");
        }
        drop(state);

        debug!(path = %path.display(), id, "registered temp file");
        Ok(TempFile::new(path, id, Arc::clone(self)))
    }

    /// Posts a ticket for a handle whose last clone was dropped.
    pub(crate) fn enqueue(&self, ticket: Ticket) {
        if let Err(mpsc::SendError(ticket)) = self.queue.send(ticket) {
            // Only reachable if the worker died with the receiver.
            warn!(path = %ticket.path.display(), "reclaim queue closed, deleting inline");
            self.reclaim(ticket);
        }
    }

    fn run_worker(self: Arc<Self>) {
        let receiver = self.lock_state().receiver.take();
        let Some(receiver) = receiver else {
            self.lock_state().worker_running = false;
            self.idle.notify_all();
            return;
        };

        loop {
            let Ok(ticket) = receiver.recv() else {
                break;
            };
            self.reclaim(ticket);

            let mut state = self.lock_state();
            if state.live.is_empty() {
                state.receiver = Some(receiver);
                state.worker_running = false;
                drop(state);
                self.idle.notify_all();
                debug!("reclaim worker parked");
                return;
            }
            drop(state);
            self.idle.notify_all();
        }

        self.lock_state().worker_running = false;
        self.idle.notify_all();
    }

    fn reclaim(&self, ticket: Ticket) {
        {
            let mut state = self.lock_state();
            match state.live.get(&ticket.path) {
                Some(&id) if id == ticket.id => {
                    state.live.remove(&ticket.path);
                }
                _ => {
                    debug!(path = %ticket.path.display(), "ignoring stale reclaim ticket");
                    return;
                }
            }
        }

        match delete_file(&ticket.path) {
            Ok(existed) => {
                self.lock_state().armed.remove(&ticket.path);
                debug!(path = %ticket.path.display(), existed, "reclaimed temp file");
            }
            Err(source) => {
                warn!(path = %ticket.path.display(), error = %source, "failed to reclaim temp file");
                self.failures
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(ReclaimError {
                        path: ticket.path,
                        source,
                    });
            }
        }
    }

    fn sweep(&self) -> usize {
        let armed: Vec<PathBuf> = self.lock_state().armed.drain().collect();
        let mut removed = 0;
        let mut kept = Vec::new();

        for path in armed {
            match delete_file(&path) {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(error) => {
                    warn!(path = %path.display(), %error, "exit sweep could not delete temp file");
                    kept.push(path);
                }
            }
        }

        if !kept.is_empty() {
            self.lock_state().armed.extend(kept);
        }
        debug!(removed, "swept temp files");
        removed
    }
}

/// Deletes `path`. `Ok(false)` means there was nothing to delete.
fn delete_file(path: &Path) -> std::io::Result<bool> {
    if std::fs::symlink_metadata(path).is_err() {
        return Ok(false);
    }
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Sweeps its registry on drop.
///
/// Covers files whose handles are still alive, or whose reclaim failed, when
/// the owning scope (normally `main`) returns.
#[must_use = "the registry is swept when the guard is dropped"]
pub struct ExitGuard {
    registry: TempFileRegistry,
}

impl Drop for ExitGuard {
    fn drop(&mut self) { self.registry.sweep(); }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const WAIT: Duration = Duration::from_secs(10);

    fn registry(root: &Path) -> TempFileRegistry {
        TempFileRegistry::new(RegistryOptions::new().root(root))
    }

    #[test]
    fn test_create_empty_exists_and_is_empty() -> Result<()> {
        let root = tempdir().unwrap();
        let registry = registry(root.path());
        let file = registry.create_empty(&TempFileSpec::new("pkg"))?;

        assert!(file.path().is_file());
        assert_eq!(file.len()?, 0);
        assert!(file.path().starts_with(root.path()));
        assert_eq!(file.path().extension().unwrap(), "tmp");
        Ok(())
    }

    #[test]
    fn test_create_empty_under_segment_with_extension() -> Result<()> {
        let root = tempdir().unwrap();
        let registry = registry(root.path());
        let file = registry.create_empty(&TempFileSpec::new("pkg").extension("msi").segment("dist"))?;

        assert_eq!(file.path().parent().unwrap(), root.path().join("dist"));
        let name = file.file_name();
        assert!(name.starts_with("pkg"), "{name}");
        assert!(name.ends_with(".msi"), "{name}");
        Ok(())
    }

    #[test]
    fn test_dropped_handle_is_reclaimed() -> Result<()> {
        let root = tempdir().unwrap();
        let registry = registry(root.path());
        let file = registry.create_empty(&TempFileSpec::new("pkg").extension("msi").segment("dist"))?;
        let path = file.path().to_path_buf();
        assert!(registry.is_live(&path));

        drop(file);

        assert!(registry.wait_idle(WAIT));
        assert!(!path.exists());
        assert!(!registry.is_live(&path));
        assert!(registry.take_reclaim_errors().is_empty());
        Ok(())
    }

    #[test]
    fn test_clone_keeps_file_alive() -> Result<()> {
        let root = tempdir().unwrap();
        let registry = registry(root.path());
        let file = registry.create_empty(&TempFileSpec::new("shared"))?;
        let clone = file.clone();
        let path = file.path().to_path_buf();

        drop(file);
        assert!(!registry.wait_idle(Duration::from_millis(100)));
        assert!(path.exists());
        assert!(registry.is_live(&path));

        drop(clone);
        assert!(registry.wait_idle(WAIT));
        assert!(!path.exists());
        Ok(())
    }

    #[test]
    fn test_already_deleted_file_is_not_an_error() -> Result<()> {
        let root = tempdir().unwrap();
        let registry = registry(root.path());
        let file = registry.create_empty(&TempFileSpec::new("gone"))?;
        std::fs::remove_file(file.path()).unwrap();

        drop(file);

        assert!(registry.wait_idle(WAIT));
        assert!(registry.take_reclaim_errors().is_empty());
        Ok(())
    }

    #[test]
    fn test_failed_delete_is_retained_and_worker_continues() -> Result<()> {
        let root = tempdir().unwrap();
        let registry = registry(root.path());
        let stuck = registry.create_empty(&TempFileSpec::new("stuck"))?;
        let fine = registry.create_empty(&TempFileSpec::new("fine"))?;
        let stuck_path = stuck.path().to_path_buf();
        let fine_path = fine.path().to_path_buf();

        // A non-empty directory in place of the file cannot be removed with remove_file.
        std::fs::remove_file(&stuck_path).unwrap();
        std::fs::create_dir(&stuck_path).unwrap();
        std::fs::write(stuck_path.join("inner"), b"x").unwrap();

        drop(stuck);
        drop(fine);

        assert!(registry.wait_idle(WAIT));
        assert!(!fine_path.exists());
        assert!(stuck_path.exists());

        let errors = registry.take_reclaim_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, stuck_path);
        assert!(registry.take_reclaim_errors().is_empty());
        Ok(())
    }

    #[test]
    fn test_worker_restarts_after_parking() -> Result<()> {
        let root = tempdir().unwrap();
        let registry = registry(root.path());

        for round in 0..3 {
            let file = registry.create_empty(&TempFileSpec::new(format!("round{round}")))?;
            let path = file.path().to_path_buf();
            drop(file);
            assert!(registry.wait_idle(WAIT), "round {round}");
            assert!(!path.exists(), "round {round}");
        }
        Ok(())
    }

    #[test]
    fn test_unique_paths() -> Result<()> {
        let root = tempdir().unwrap();
        let registry = registry(root.path());
        let files = (0..64)
            .map(|_| registry.create_empty(&TempFileSpec::new("same").extension("bin")))
            .collect::<Result<Vec<_>>>()?;

        let paths: HashSet<_> = files.iter().map(|f| f.path().to_path_buf()).collect();
        assert_eq!(paths.len(), files.len());
        assert_eq!(registry.live_count(), files.len());

        drop(files);
        assert!(registry.wait_idle(WAIT));
        assert!(paths.iter().all(|p| !p.exists()));
        Ok(())
    }

    #[test]
    fn test_concurrent_creation_and_drop() {
        let root = tempdir().unwrap();
        let registry = registry(root.path());

        let workers: Vec<_> = (0..8)
            .map(|n| {
                let registry = registry.clone();
                thread::spawn(move || {
                    for _ in 0..25 {
                        let file = registry
                            .create_empty(&TempFileSpec::new(format!("t{n}")))
                            .unwrap();
                        assert!(file.path().exists());
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert!(registry.wait_idle(WAIT));
        assert_eq!(registry.live_count(), 0);
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_stale_ticket_is_ignored() -> Result<()> {
        let root = tempdir().unwrap();
        let registry = registry(root.path());
        let file = registry.create_empty(&TempFileSpec::new("keep"))?;

        registry.shared.enqueue(Ticket {
            path: file.path().to_path_buf(),
            id:   u64::MAX,
        });
        std::thread::sleep(Duration::from_millis(50));

        assert!(file.path().exists());
        assert!(registry.is_live(file.path()));
        Ok(())
    }

    #[test]
    fn test_invalid_name_creates_nothing() {
        let root = tempdir().unwrap();
        let registry = registry(root.path());
        let err = registry
            .create_empty(&TempFileSpec::new("a/b").segment("dist"))
            .unwrap_err();
        assert!(err.is_invalid_name());
        assert_eq!(registry.live_count(), 0);
        assert!(!root.path().join("dist").exists());
    }

    #[test]
    fn test_check_spec() {
        let root = tempdir().unwrap();
        let registry = registry(root.path());
        assert!(registry.check_spec(&TempFileSpec::new("pkg").extension("msi")).is_ok());
        assert!(registry.check_spec(&TempFileSpec::new("CON")).unwrap_err().is_invalid_name());
        assert!(registry.check_spec(&TempFileSpec::new("pkg").extension("m/si")).is_err());
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_exit_guard_sweeps_live_files() -> Result<()> {
        let root = tempdir().unwrap();
        let registry = registry(root.path());
        let file = registry.create_empty(&TempFileSpec::new("held"))?;

        {
            let _guard = registry.exit_guard();
        }

        assert!(!file.path().exists());
        let path = file.path().to_path_buf();
        drop(file);
        assert!(registry.wait_idle(WAIT));
        assert!(registry.take_reclaim_errors().is_empty());
        assert!(!path.exists());
        Ok(())
    }

    #[test]
    fn test_sweep_counts_removed_files() -> Result<()> {
        let root = tempdir().unwrap();
        let registry = registry(root.path());
        let a = registry.create_empty(&TempFileSpec::new("a"))?;
        let b = registry.create_empty(&TempFileSpec::new("b"))?;
        std::fs::remove_file(b.path()).unwrap();

        assert_eq!(registry.sweep(), 1);
        assert!(!a.path().exists());
        assert_eq!(registry.sweep(), 0);
        Ok(())
    }
}
