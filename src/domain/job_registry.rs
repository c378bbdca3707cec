//! Concurrent job storage with per-job fine-grained locking.
//!
//! [`JobRegistry`] stores jobs in a `HashMap` where each entry is
//! individually protected by a [`tokio::sync::RwLock`]. Every lifecycle
//! transition holds the job's write lock for its whole unit of work, so
//! competing transitions on one job are serialized and the loser observes
//! the winner's committed state.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::rental_job::JobSummary;
use super::{JobId, RentalJob};
use crate::error::RentalError;

/// In-memory job store.
///
/// Uses a `RwLock<HashMap<...>>` for the outer map and per-entry
/// `Arc<RwLock<RentalJob>>` for per-job locking.
///
/// # Concurrency
///
/// - Multiple tasks may read the same job concurrently.
/// - Writes to different jobs are concurrent.
/// - Writes to the same job are serialized.
#[derive(Debug)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<JobId, Arc<RwLock<RentalJob>>>>,
}

impl JobRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
        }
    }

    /// Inserts a new job.
    ///
    /// # Errors
    ///
    /// Returns [`RentalError::Validation`] if a job with the same ID
    /// already exists.
    pub async fn insert(&self, job: RentalJob) -> Result<JobId, RentalError> {
        let job_id = job.id.clone();
        let mut map = self.jobs.write().await;
        if map.contains_key(&job_id) {
            return Err(RentalError::Validation(format!(
                "job {job_id} already exists"
            )));
        }
        map.insert(job_id.clone(), Arc::new(RwLock::new(job)));
        Ok(job_id)
    }

    /// Returns the per-job lock for a job. Crate services hold it for the
    /// whole of a transition.
    ///
    /// # Errors
    ///
    /// Returns [`RentalError::JobNotFound`] if no job with the given ID
    /// exists.
    pub(crate) async fn get(&self, job_id: &JobId) -> Result<Arc<RwLock<RentalJob>>, RentalError> {
        let map = self.jobs.read().await;
        map.get(job_id)
            .cloned()
            .ok_or_else(|| RentalError::JobNotFound(job_id.clone()))
    }

    /// Returns an owned copy of a job.
    ///
    /// # Errors
    ///
    /// Returns [`RentalError::JobNotFound`] if no job with the given ID
    /// exists.
    pub async fn snapshot(&self, job_id: &JobId) -> Result<RentalJob, RentalError> {
        let entry = self.get(job_id).await?;
        let job = entry.read().await;
        Ok(job.clone())
    }

    /// Amends a job if nobody else committed since it was read.
    ///
    /// `expected_version` is the version the caller read; on success the
    /// stored job carries `expected_version + 1`. Only descriptive fields
    /// may change (see [`RentalJob::check_amendment`]); transitions go
    /// through the lifecycle and extension services.
    ///
    /// # Errors
    ///
    /// Returns [`RentalError::JobNotFound`] if the job does not exist,
    /// [`RentalError::Conflict`] if the stored version differs, or the
    /// error of [`RentalJob::check_amendment`].
    pub async fn replace(
        &self,
        mut job: RentalJob,
        expected_version: u64,
    ) -> Result<RentalJob, RentalError> {
        let entry = self.get(&job.id).await?;
        let mut stored = entry.write().await;
        if stored.version != expected_version {
            return Err(RentalError::Conflict {
                job_id: job.id.clone(),
                expected: expected_version,
                found: stored.version,
            });
        }
        stored.check_amendment(&job)?;
        job.version = expected_version;
        job.touch();
        *stored = job;
        Ok(stored.clone())
    }

    /// Returns summaries of all jobs, ordered by job ID.
    pub async fn list(&self) -> Vec<JobSummary> {
        let map = self.jobs.read().await;
        let mut summaries = Vec::with_capacity(map.len());
        for entry in map.values() {
            summaries.push(JobSummary::from(&*entry.read().await));
        }
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        summaries
    }

    /// Case-insensitive substring search over job ID, customer name, and
    /// contact. A blank query matches every job.
    pub async fn search(&self, query: &str) -> Vec<JobSummary> {
        let needle = query.trim().to_lowercase();
        self.list()
            .await
            .into_iter()
            .filter(|s| {
                needle.is_empty()
                    || s.id.as_str().to_lowercase().contains(&needle)
                    || s.customer_name.to_lowercase().contains(&needle)
                    || s.contact.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Returns the number of jobs in the registry.
    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    /// Returns `true` if the registry contains no jobs.
    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}
