//! First-run import gate.
//!
//! # Responsibility
//! - Decide whether the remote seed still has to run.
//! - Run the fetch on a worker thread and hand its result back over a
//!   single-consumer channel.
//! - Merge fetched records into `TaskStore`, then commit the import flag.
//!
//! # Invariants
//! - At most one fetch is in flight per gate.
//! - `Imported` is only reached after the flag write succeeded.
//! - A failed fetch or merge leaves the gate `Unfetched` and the flag unset,
//!   so the next activation retries. A merge that failed half-way is not
//!   rolled back; its tasks are imported again on retry.
//! - Records with a blank title cannot become tasks. They are skipped and
//!   reported, and do not hold back the flag.

use crate::import::remote::{FetchError, RemoteSource, RemoteTask};
use crate::model::task::validate_name;
use crate::repo::flag_repo::ImportFlag;
use crate::repo::task_repo::{RepoError, TaskRepository};
use crate::service::task_store::{NewTask, StoreError, TaskStore};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;

type FetchResult = Result<Vec<RemoteTask>, FetchError>;

/// Import failure. Never fatal for the caller; the next launch retries.
#[derive(Debug)]
pub enum ImportError {
    Fetch(FetchError),
    /// Creating an imported task failed.
    Store(StoreError),
    /// Reading or writing the import flag failed.
    Flag(RepoError),
    /// Worker thread could not be spawned or exited without a result.
    Worker(String),
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fetch(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "import merge failed: {err}"),
            Self::Flag(err) => write!(f, "import flag access failed: {err}"),
            Self::Worker(message) => write!(f, "import worker failed: {message}"),
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Fetch(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Flag(err) => Some(err),
            Self::Worker(_) => None,
        }
    }
}

impl From<FetchError> for ImportError {
    fn from(value: FetchError) -> Self {
        Self::Fetch(value)
    }
}

/// Observable gate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// Flag unset and nothing in flight.
    Unfetched,
    /// A fetch is in flight. Held in memory only.
    Fetching,
    /// Flag set; every activation is a no-op.
    Imported,
}

/// Result of [`ImportGate::activate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Started,
    AlreadyFetching,
    AlreadyImported,
}

/// Result of applying a finished fetch.
#[derive(Debug)]
pub enum ImportOutcome {
    Imported {
        created: usize,
        /// Remote records with a blank title.
        skipped: usize,
    },
    Failed(ImportError),
}

/// One-shot guard around the first-run import.
pub struct ImportGate<F: ImportFlag> {
    flag: F,
    source: Arc<dyn RemoteSource>,
    inflight: Option<Receiver<FetchResult>>,
    imported: bool,
}

impl<F: ImportFlag> ImportGate<F> {
    pub fn new(flag: F, source: Arc<dyn RemoteSource>) -> Self {
        Self {
            flag,
            source,
            inflight: None,
            imported: false,
        }
    }

    pub fn state(&self) -> GateState {
        if self.imported {
            GateState::Imported
        } else if self.inflight.is_some() {
            GateState::Fetching
        } else {
            GateState::Unfetched
        }
    }

    /// Starts the fetch unless it is running or already done.
    ///
    /// # Errors
    /// - [`ImportError::Flag`] when the flag cannot be read; no fetch starts.
    /// - [`ImportError::Worker`] when the worker thread cannot be spawned.
    pub fn activate(&mut self) -> Result<Activation, ImportError> {
        if self.inflight.is_some() {
            info!("event=import_activate module=import status=skipped reason=fetching");
            return Ok(Activation::AlreadyFetching);
        }
        if self.imported || self.read_flag()? {
            self.imported = true;
            info!("event=import_activate module=import status=skipped reason=imported");
            return Ok(Activation::AlreadyImported);
        }

        let (sender, receiver) = mpsc::channel();
        let source = Arc::clone(&self.source);
        thread::Builder::new()
            .name("todo-import".to_string())
            .spawn(move || {
                // The gate may be gone or cancelled by now; a closed channel
                // just drops the result.
                let _ = sender.send(source.fetch_todos());
            })
            .map_err(|err| {
                warn!("event=import_activate module=import status=error error={err}");
                ImportError::Worker(err.to_string())
            })?;

        self.inflight = Some(receiver);
        info!("event=import_activate module=import status=started");
        Ok(Activation::Started)
    }

    /// Applies the fetch result if it has arrived. Never blocks.
    ///
    /// Returns `None` while the fetch is still running or when nothing is
    /// in flight.
    pub fn poll<R: TaskRepository>(&mut self, store: &mut TaskStore<R>) -> Option<ImportOutcome> {
        let received = match self.inflight.as_ref()?.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => {
                self.inflight = None;
                return Some(failed(worker_lost()));
            }
        };
        self.inflight = None;
        Some(self.apply(received, store))
    }

    /// Blocks until the in-flight fetch finishes, then applies it.
    ///
    /// Returns `None` when nothing is in flight.
    pub fn wait<R: TaskRepository>(&mut self, store: &mut TaskStore<R>) -> Option<ImportOutcome> {
        let receiver = self.inflight.take()?;
        match receiver.recv() {
            Ok(result) => Some(self.apply(result, store)),
            Err(_) => Some(failed(worker_lost())),
        }
    }

    /// Activates and waits in one call. Used by short-lived front-ends.
    pub fn run_blocking<R: TaskRepository>(
        &mut self,
        store: &mut TaskStore<R>,
    ) -> Result<Option<ImportOutcome>, ImportError> {
        match self.activate()? {
            Activation::AlreadyImported => Ok(None),
            Activation::Started | Activation::AlreadyFetching => Ok(self.wait(store)),
        }
    }

    /// Abandons the in-flight fetch. Its result is discarded on arrival.
    ///
    /// Returns whether a fetch was in flight.
    pub fn cancel(&mut self) -> bool {
        let cancelled = self.inflight.take().is_some();
        if cancelled {
            info!("event=import_activate module=import status=cancelled");
        }
        cancelled
    }

    fn read_flag(&self) -> Result<bool, ImportError> {
        self.flag.is_imported().map_err(|err| {
            warn!("event=import_activate module=import status=error error_code=flag_read_failed error={err}");
            ImportError::Flag(err)
        })
    }

    fn apply<R: TaskRepository>(
        &mut self,
        result: FetchResult,
        store: &mut TaskStore<R>,
    ) -> ImportOutcome {
        let records = match result {
            Ok(records) => records,
            Err(err) => {
                warn!("event=import_fetch module=import status=error error={err}");
                return ImportOutcome::Failed(err.into());
            }
        };
        info!(
            "event=import_fetch module=import status=ok count={}",
            records.len()
        );

        let mut created = 0;
        let mut skipped = 0;
        for record in records {
            if validate_name(&record.title).is_err() {
                skipped += 1;
                continue;
            }
            let input = NewTask {
                name: record.title,
                description: None,
                is_completed: record.completed,
                date: None,
                owner_ref: Some(record.owner_ref),
            };
            if let Err(err) = store.create_with(input) {
                return failed(ImportError::Store(err));
            }
            created += 1;
        }

        if let Err(err) = self.flag.mark_imported() {
            return failed(ImportError::Flag(err));
        }
        self.imported = true;
        if skipped > 0 {
            warn!("event=import_apply module=import status=partial reason=blank_title skipped={skipped}");
        }
        info!(
            "event=import_apply module=import status=ok created={created} skipped={skipped}"
        );
        ImportOutcome::Imported { created, skipped }
    }
}

fn failed(err: ImportError) -> ImportOutcome {
    warn!("event=import_apply module=import status=error error={err}");
    ImportOutcome::Failed(err)
}

fn worker_lost() -> ImportError {
    ImportError::Worker("worker exited without a result".to_string())
}

#[cfg(test)]
mod tests {
    use super::{Activation, GateState, ImportGate, ImportOutcome};
    use crate::db::open_db_in_memory;
    use crate::import::remote::{FetchError, RemoteSource, RemoteTask};
    use crate::repo::flag_repo::{ImportFlag, InMemoryImportFlag};
    use crate::repo::task_repo::SqliteTaskRepository;
    use crate::service::task_store::TaskStore;
    use std::sync::mpsc::{self, Receiver, Sender};
    use std::sync::{Arc, Mutex};

    /// Blocks each fetch until the test releases it.
    struct HeldSource {
        release: Mutex<Receiver<()>>,
    }

    impl HeldSource {
        fn new() -> (Arc<Self>, Sender<()>) {
            let (sender, receiver) = mpsc::channel();
            let source = Arc::new(Self {
                release: Mutex::new(receiver),
            });
            (source, sender)
        }
    }

    impl RemoteSource for HeldSource {
        fn fetch_todos(&self) -> Result<Vec<RemoteTask>, FetchError> {
            let release = self.release.lock().unwrap();
            release
                .recv()
                .map_err(|_| FetchError::Network("released".to_string()))?;
            Ok(vec![RemoteTask {
                remote_id: 9,
                title: "held".to_string(),
                completed: false,
                owner_ref: 1,
            }])
        }
    }

    #[test]
    fn second_activation_while_fetching_is_noop() {
        let conn = open_db_in_memory().unwrap();
        let mut store = TaskStore::load(SqliteTaskRepository::new(&conn)).unwrap();
        let flag = InMemoryImportFlag::default();
        let (source, release) = HeldSource::new();
        let mut gate = ImportGate::new(&flag, source);

        assert_eq!(gate.state(), GateState::Unfetched);
        assert_eq!(gate.activate().unwrap(), Activation::Started);
        assert_eq!(gate.state(), GateState::Fetching);
        assert_eq!(gate.activate().unwrap(), Activation::AlreadyFetching);
        assert!(gate.poll(&mut store).is_none());

        release.send(()).unwrap();
        let outcome = gate.wait(&mut store).unwrap();
        assert!(matches!(
            outcome,
            ImportOutcome::Imported {
                created: 1,
                skipped: 0
            }
        ));
        assert_eq!(gate.state(), GateState::Imported);
        assert_eq!(store.count(), 1);
        assert!(flag.is_imported().unwrap());
    }

    #[test]
    fn cancel_discards_late_result_and_allows_retry() {
        let conn = open_db_in_memory().unwrap();
        let mut store = TaskStore::load(SqliteTaskRepository::new(&conn)).unwrap();
        let flag = InMemoryImportFlag::default();
        let (source, release) = HeldSource::new();
        let mut gate = ImportGate::new(&flag, source);

        gate.activate().unwrap();
        assert!(gate.cancel());
        assert!(!gate.cancel());
        assert_eq!(gate.state(), GateState::Unfetched);

        release.send(()).unwrap();
        assert!(gate.poll(&mut store).is_none());
        assert_eq!(store.count(), 0);
        assert!(!flag.is_imported().unwrap());

        assert_eq!(gate.activate().unwrap(), Activation::Started);
        release.send(()).unwrap();
        assert!(matches!(
            gate.wait(&mut store),
            Some(ImportOutcome::Imported { created: 1, .. })
        ));
    }

    #[test]
    fn wait_without_activation_returns_none() {
        let conn = open_db_in_memory().unwrap();
        let mut store = TaskStore::load(SqliteTaskRepository::new(&conn)).unwrap();
        let (source, _release) = HeldSource::new();
        let mut gate = ImportGate::new(InMemoryImportFlag::default(), source);

        assert!(gate.wait(&mut store).is_none());
        assert!(gate.poll(&mut store).is_none());
    }
}
