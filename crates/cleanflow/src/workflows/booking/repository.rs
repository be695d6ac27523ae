use super::domain::{Job, JobId, JobState};
use crate::workflows::collaborators::RepositoryError;

/// Storage abstraction for job records.
///
/// `compare_and_swap` must be atomic: it replaces the stored record only while the stored
/// `state` still equals `expected`, and otherwise fails with [`RepositoryError::StaleState`].
/// This is what keeps two cleaners from both accepting the same offered job.
pub trait JobRepository: Send + Sync {
    fn fetch(&self, id: &JobId) -> Result<Option<Job>, RepositoryError>;
    fn compare_and_swap(&self, expected: JobState, job: Job) -> Result<(), RepositoryError>;
}
