//! Batched commits against a graph store.

use crate::models::ElementKind;
use crate::storage::GraphStore;
use crate::{Error, Result};

/// Groups element creations into bounded store transactions.
///
/// A batch size of `0` means a single commit at the end of the import.
/// Commit failures are surfaced as [`Error::Commit`] and never retried: an
/// earlier batch may already be visible to other readers of the store.
pub struct BatchCommitManager<'a, S: GraphStore + ?Sized> {
    store: &'a S,
    batch_size: usize,
    pending: usize,
    committed: usize,
    commits: usize,
}

impl<'a, S: GraphStore + ?Sized> BatchCommitManager<'a, S> {
    /// Creates a manager for the given store.
    #[must_use]
    pub const fn new(store: &'a S, batch_size: usize) -> Self {
        Self {
            store,
            batch_size,
            pending: 0,
            committed: 0,
            commits: 0,
        }
    }

    /// Records one created element in the current batch.
    pub fn record_created(&mut self, kind: ElementKind) {
        self.pending += 1;
        metrics::counter!("graphport_elements_created_total", "kind" => kind.as_str()).increment(1);
    }

    /// Commits if the current batch has reached the batch size.
    ///
    /// Returns whether a commit happened.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Commit`] if the store rejects the batch.
    pub fn maybe_flush(&mut self) -> Result<bool> {
        if self.batch_size > 0 && self.pending >= self.batch_size {
            self.commit()?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Commits whatever remains in the current batch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Commit`] if the store rejects the batch.
    pub fn final_flush(&mut self) -> Result<()> {
        if self.pending > 0 {
            self.commit()?;
        }
        Ok(())
    }

    /// Rolls back the current batch and returns how many elements it held.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rollback fails.
    pub fn rollback(&mut self) -> Result<usize> {
        let lost = std::mem::take(&mut self.pending);
        self.store.rollback()?;
        if lost > 0 {
            tracing::debug!(lost, "rolled back uncommitted batch");
        }
        Ok(lost)
    }

    fn commit(&mut self) -> Result<()> {
        let size = self.pending;
        match self.store.commit() {
            Ok(()) => {
                self.pending = 0;
                self.committed += size;
                self.commits += 1;
                metrics::counter!("graphport_batch_commits_total").increment(1);
                tracing::debug!(size, committed = self.committed, "batch committed");
                Ok(())
            },
            Err(e) => {
                self.pending = 0;
                metrics::counter!("graphport_batch_commit_failures_total").increment(1);
                tracing::warn!(lost = size, committed = self.committed, error = %e, "batch commit failed");
                Err(Error::Commit {
                    lost: size,
                    committed: self.committed,
                    cause: e.to_string(),
                })
            },
        }
    }

    /// Returns the number of successful commits.
    #[must_use]
    pub const fn commits(&self) -> usize {
        self.commits
    }

    /// Returns the number of elements committed so far.
    #[must_use]
    pub const fn committed(&self) -> usize {
        self.committed
    }

    /// Returns the number of elements in the current batch.
    #[must_use]
    pub const fn pending(&self) -> usize {
        self.pending
    }
}
