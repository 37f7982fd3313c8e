pub mod client;
pub mod repository;

use std::path::Path;

use thiserror::Error;
use url::Url;

pub use client::GitClient;
pub use repository::GitRepository;

#[derive(Error, Debug)]
pub enum GitError {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),
    #[error("Reference {reference} was not found in {url}")]
    ReferenceNotFound { reference: String, url: String },
    #[error("Working copy {path} is not a git repository")]
    NotARepository { path: String },
}

/// Creates handles on remote repositories checked out at a local path.
pub trait VcsClient {
    fn new_repo(
        &self,
        remote_url: &Url,
        local_path: &Path,
    ) -> anyhow::Result<Box<dyn VcsRepository + '_>>;
}

pub trait VcsRepository {
    /// Download branches and tags of the remote into the working copy.
    fn get(&self) -> anyhow::Result<()>;

    /// Check out `reference` (tag, branch or commit) into the working copy.
    fn update_version(&self, reference: &str) -> anyhow::Result<()>;

    fn is_reference(&self, reference: &str) -> bool;
}
