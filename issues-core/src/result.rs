use error_stack::Report;

pub type RepoResult<T> = Result<T, Report<IssueRepoError>>;
pub type OptRepoResult<T> = Result<Option<T>, Report<IssueRepoError>>;

#[derive(Debug, thiserror::Error)]
pub enum IssueRepoError {
    #[error("failed to get issue")]
    Get,
    #[error("failed to list issues")]
    List,
    #[error("failed to create issue")]
    Create,
    #[error("failed to update issue status")]
    UpdateStatus,
    #[error("failed to delete issue")]
    Delete,
}

#[derive(Debug, thiserror::Error)]
#[error("failed to persist uploaded image")]
pub struct ImageStoreError;
