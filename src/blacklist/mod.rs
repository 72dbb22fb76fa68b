//! Token revocation set with a background purge worker.
//!
//! A [`TokenBlacklist`] mirrors its persisted document into an in-process
//! set for O(1) membership checks. `add` makes a token unusable process-wide
//! immediately; one dedicated worker per instance periodically replaces the
//! persisted set with only the entries younger than the expiration window
//! and rebuilds the mirror from the result, so the append-only revocation
//! log stays bounded without request threads ever blocking on a purge.
//!
//! The service is an explicit object constructed once at process start —
//! typically two instances, one for short-lived access tokens and one for
//! longer-lived refresh tokens, each with its own window — and its worker
//! has an explicit [`PurgeHandle::stop`] controlled by the entry point.

mod store;

pub use store::{BlacklistDocument, BlacklistStore, JsonFileStore, MemoryStore};

use crate::error::StoreError;
use std::collections::HashSet;
use std::io;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

struct State {
    last_purge_ns: u64,
    tokens: HashSet<String>,
}

impl State {
    fn from_document(doc: &BlacklistDocument) -> Self {
        Self {
            last_purge_ns: doc.last_purge_ns,
            tokens: doc.entries.values().cloned().collect(),
        }
    }
}

/// Revocation set for signed tokens, persisted and mirrored in memory.
pub struct TokenBlacklist {
    store: Arc<dyn BlacklistStore>,
    expiration: Duration,
    state: RwLock<State>,
}

impl TokenBlacklist {
    /// Load the persisted document and build the in-memory mirror.
    pub fn open(
        store: Arc<dyn BlacklistStore>,
        expiration: Duration,
    ) -> Result<Arc<Self>, StoreError> {
        let doc = store.load()?;
        info!(
            entries = doc.entries.len(),
            expiration_secs = expiration.as_secs(),
            "blacklist loaded"
        );
        Ok(Arc::new(Self {
            store,
            expiration,
            state: RwLock::new(State::from_document(&doc)),
        }))
    }

    /// Validity window; entries older than this are removed by the purge.
    #[must_use]
    pub fn expiration(&self) -> Duration {
        self.expiration
    }

    /// Revoke a token: appended to the store keyed by insertion time and
    /// inserted into the mirror, effective immediately process-wide.
    pub fn add(&self, token: &str) -> Result<(), StoreError> {
        self.store.append(store::now_ns(), token)?;
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .tokens
            .insert(token.to_string());
        Ok(())
    }

    /// O(1) membership check against the in-memory mirror.
    #[must_use]
    pub fn contains(&self, token: &str) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .tokens
            .contains(token)
    }

    /// Time until the next purge is due:
    /// `max(0, expiration − (now − last_purge))`.
    fn next_purge_wait(&self) -> Duration {
        let last_purge_ns = self
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .last_purge_ns;
        let elapsed = Duration::from_nanos(store::now_ns().saturating_sub(last_purge_ns));
        self.expiration.saturating_sub(elapsed)
    }

    /// Replace the persisted set with the entries younger than the window
    /// and rebuild the mirror from the replace's result.
    fn purge(&self) -> Result<(), StoreError> {
        let cutoff_ns = store::now_ns()
            .saturating_sub(u64::try_from(self.expiration.as_nanos()).unwrap_or(u64::MAX));
        let doc = self.store.replace_newer_than(cutoff_ns)?;
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        *state = State::from_document(&doc);
        debug!(remaining = doc.entries.len(), "blacklist purged");
        Ok(())
    }

    /// Start this instance's dedicated purge worker.
    pub fn spawn_purge_worker(self: &Arc<Self>) -> io::Result<PurgeHandle> {
        let blacklist = Arc::clone(self);
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let thread = thread::Builder::new()
            .name("blacklist-purge".to_string())
            .spawn(move || loop {
                let wait = blacklist.next_purge_wait();
                debug!(wait_secs = wait.as_secs_f64(), "time until next purge");
                match stop_rx.recv_timeout(wait) {
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    Err(RecvTimeoutError::Timeout) => {
                        if let Err(e) = blacklist.purge() {
                            warn!(error = %e, "blacklist purge failed");
                        }
                    }
                }
            })?;
        info!("blacklist purge worker started");
        Ok(PurgeHandle { stop_tx, thread })
    }
}

/// Handle to a running purge worker; dropping it without calling
/// [`PurgeHandle::stop`] leaves the worker running for the process
/// lifetime, which matches the default deployment.
pub struct PurgeHandle {
    stop_tx: mpsc::Sender<()>,
    thread: JoinHandle<()>,
}

impl PurgeHandle {
    /// Interrupt the worker's sleep and wait for it to exit.
    pub fn stop(self) {
        let _ = self.stop_tx.send(());
        if self.thread.join().is_err() {
            warn!("blacklist purge worker panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_then_contains() {
        let bl = TokenBlacklist::open(Arc::new(MemoryStore::new()), Duration::from_secs(60))
            .unwrap();
        assert!(!bl.contains("tok"));
        bl.add("tok").unwrap();
        assert!(bl.contains("tok"));
    }

    #[test]
    fn test_purge_drops_expired_entries() {
        let bl =
            TokenBlacklist::open(Arc::new(MemoryStore::new()), Duration::ZERO).unwrap();
        bl.add("tok").unwrap();
        // zero window: everything is immediately older than the cutoff
        bl.purge().unwrap();
        assert!(!bl.contains("tok"));
    }
}
