use std::path::{Path, PathBuf};

use git2::{build::CheckoutBuilder, Object, Repository};
use log::{debug, info, trace};

use super::{client::GitClient, GitError, VcsRepository};

const ORIGIN: &str = "origin";
const REFSPECS: [&str; 2] = [
    "+refs/heads/*:refs/remotes/origin/*",
    "+refs/tags/*:refs/tags/*",
];

/// A working copy of a remote repository.
pub struct GitRepository<'a> {
    client: &'a GitClient,
    url: String,
    path: PathBuf,
}

impl<'a> GitRepository<'a> {
    pub fn new(client: &'a GitClient, url: &str, path: &Path) -> GitRepository<'a> {
        GitRepository {
            client,
            url: url.to_owned(),
            path: path.to_path_buf(),
        }
    }

    fn open(&self) -> Result<Repository, GitError> {
        Repository::open(&self.path).map_err(|_| GitError::NotARepository {
            path: self.path.display().to_string(),
        })
    }

    fn open_or_init(&self) -> Result<Repository, GitError> {
        match Repository::open(&self.path) {
            Ok(repo) => {
                trace!("Opening existing repository at {}", self.path.display());
                {
                    let remote = repo.find_remote(ORIGIN)?;
                    if remote.url() != Some(self.url.as_str()) {
                        trace!(
                            "Updating remote existing url {:?} to new url {}",
                            remote.url(),
                            self.url
                        );
                        repo.remote_set_url(ORIGIN, &self.url)?;
                    }
                }
                Ok(repo)
            }
            Err(_) => {
                trace!("Creating a new repository at {}", self.path.display());
                let repo = Repository::init(&self.path)?;
                repo.remote(ORIGIN, &self.url)?;
                Ok(repo)
            }
        }
    }

    /// Tags win over branches, anything else is handed to revparse.
    fn resolve<'r>(&self, repo: &'r Repository, reference: &str) -> Option<Object<'r>> {
        let candidates = [
            format!("refs/tags/{reference}"),
            format!("refs/remotes/{ORIGIN}/{reference}"),
        ];
        candidates
            .iter()
            .find_map(|name| repo.find_reference(name).ok())
            .and_then(|found| found.peel(git2::ObjectType::Commit).ok())
            .or_else(|| {
                repo.revparse_single(reference)
                    .and_then(|object| object.peel(git2::ObjectType::Commit))
                    .ok()
            })
    }
}

impl VcsRepository for GitRepository<'_> {
    fn get(&self) -> anyhow::Result<()> {
        let repo = self.open_or_init()?;
        let mut remote = repo.find_remote(ORIGIN)?;
        info!("Fetching {} into {}", self.url, self.path.display());
        remote.fetch(&REFSPECS, Some(&mut self.client.fetch_options()), None)?;
        Ok(())
    }

    fn update_version(&self, reference: &str) -> anyhow::Result<()> {
        let repo = self.open()?;
        let commit = self
            .resolve(&repo, reference)
            .ok_or_else(|| GitError::ReferenceNotFound {
                reference: reference.to_owned(),
                url: self.url.clone(),
            })?;

        debug!("Checking out {} at {}", reference, commit.id());
        repo.checkout_tree(&commit, Some(CheckoutBuilder::new().force()))?;
        repo.set_head_detached(commit.id())?;
        Ok(())
    }

    fn is_reference(&self, reference: &str) -> bool {
        match self.open() {
            Ok(repo) => self.resolve(&repo, reference).is_some(),
            Err(error) => {
                debug!("{}", error);
                false
            }
        }
    }
}
