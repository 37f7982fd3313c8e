use std::path::{Path, PathBuf};

use log::{debug, info};
use tempfile::TempDir;
use thiserror::Error;

use crate::{
    chart::{ArchivePackager, ChartLoader, ChartPackager, DirectoryLoader},
    git::{GitClient, VcsClient},
    model::locator::{LocatorError, RepositoryLocator},
    path::{secure_join, PathError},
};

const SCRATCH_DIR_PREFIX: &str = "chartfetch-git-";
const LOOKUP_DIR_NAME: &str = "repository";

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("the version must be a valid tag or branch name for the git repo, not empty")]
    EmptyVersion,
    #[error("Invalid repository: {0}")]
    Locator(#[from] LocatorError),
    #[error("Invalid chart name {0:?}")]
    InvalidChartName(String),
    #[error("Unsafe path: {0}")]
    UnsafePath(#[from] PathError),
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
    #[error("Error while fetching {url}: {error:#}")]
    Clone { url: String, error: anyhow::Error },
    #[error("Error while checking out {reference} from {url}: {error:#}")]
    Checkout {
        url: String,
        reference: String,
        error: anyhow::Error,
    },
    #[error("Error while loading chart from {path}: {error:#}")]
    Load { path: String, error: anyhow::Error },
    #[error("Error while packaging chart {name}: {error:#}")]
    Package { name: String, error: anyhow::Error },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input, reported before any I/O.
    Validation,
    Filesystem,
    /// Clone or checkout failed.
    RemoteOperation,
    /// The checked out directory is not a valid chart.
    BundleFormat,
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::EmptyVersion | FetchError::Locator(_) | FetchError::InvalidChartName(_) => {
                ErrorKind::Validation
            }
            FetchError::UnsafePath(_) | FetchError::IO(_) => ErrorKind::Filesystem,
            FetchError::Clone { .. } | FetchError::Checkout { .. } => ErrorKind::RemoteOperation,
            FetchError::Load { .. } | FetchError::Package { .. } => ErrorKind::BundleFormat,
        }
    }
}

/// Fetches charts from git repositories and packages them.
///
/// Every call works in its own scratch directory below `scratch_dir`, which
/// is removed when the call returns.
pub struct GitGetter<V = GitClient, L = DirectoryLoader, P = ArchivePackager> {
    vcs: V,
    loader: L,
    packager: P,
    scratch_dir: PathBuf,
}

impl<V: VcsClient> GitGetter<V> {
    pub fn new(vcs: V, scratch_dir: impl Into<PathBuf>) -> Self {
        GitGetter::with_collaborators(vcs, DirectoryLoader, ArchivePackager, scratch_dir)
    }
}

impl<V, L, P> GitGetter<V, L, P>
where
    V: VcsClient,
    L: ChartLoader,
    P: ChartPackager,
{
    pub fn with_collaborators(
        vcs: V,
        loader: L,
        packager: P,
        scratch_dir: impl Into<PathBuf>,
    ) -> Self {
        GitGetter {
            vcs,
            loader,
            packager,
            scratch_dir: scratch_dir.into(),
        }
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    /// Clone `identifier`, check out `version` and return the packaged chart.
    ///
    /// `chart_name` only names the local working copy and is confined to
    /// the scratch directory.
    pub fn fetch(
        &self,
        identifier: &str,
        version: &str,
        chart_name: &str,
    ) -> Result<Vec<u8>, FetchError> {
        if version.is_empty() {
            return Err(FetchError::EmptyVersion);
        }
        let locator = RepositoryLocator::parse(identifier)?;

        let tmp_dir = self.create_scratch_dir()?;
        let working_copy = secure_join(tmp_dir.path(), chart_name)?;
        if working_copy == tmp_dir.path() {
            return Err(FetchError::InvalidChartName(chart_name.to_owned()));
        }
        std::fs::create_dir_all(&working_copy)?;

        let url = locator.remote_url();
        let repo = self
            .vcs
            .new_repo(url, &working_copy)
            .and_then(|repo| repo.get().map(|_| repo))
            .map_err(|error| FetchError::Clone {
                url: url.to_string(),
                error,
            })?;
        repo.update_version(version)
            .map_err(|error| FetchError::Checkout {
                url: url.to_string(),
                reference: version.to_owned(),
                error,
            })?;

        let chart_dir = match locator.subpath() {
            Some(subpath) => secure_join(&working_copy, subpath)?,
            None => working_copy,
        };
        debug!("Loading chart from {}", chart_dir.display());
        let chart = self
            .loader
            .load_dir(&chart_dir)
            .map_err(|error| FetchError::Load {
                path: chart_dir.display().to_string(),
                error,
            })?;

        // Next to the working copy, never inside it.
        let archive_path = self
            .packager
            .save(&chart, tmp_dir.path())
            .map_err(|error| FetchError::Package {
                name: chart.name().to_owned(),
                error,
            })?;
        let archive = std::fs::read(&archive_path)?;

        info!(
            "Fetched chart {} from {} at {} ({} bytes)",
            chart.name(),
            locator,
            version,
            archive.len()
        );
        Ok(archive)
    }

    /// Whether the repository behind `identifier` has a branch or tag named `reference`.
    pub fn has_reference(&self, identifier: &str, reference: &str) -> Result<bool, FetchError> {
        let locator = RepositoryLocator::parse(identifier)?;
        let tmp_dir = self.create_scratch_dir()?;
        let local = tmp_dir.path().join(LOOKUP_DIR_NAME);
        std::fs::create_dir_all(&local)?;

        let url = locator.remote_url();
        let repo = self
            .vcs
            .new_repo(url, &local)
            .and_then(|repo| repo.get().map(|_| repo))
            .map_err(|error| FetchError::Clone {
                url: url.to_string(),
                error,
            })?;
        let found = repo.is_reference(reference);
        debug!("Reference {} in {}: {}", reference, locator, found);
        Ok(found)
    }

    fn create_scratch_dir(&self) -> Result<TempDir, FetchError> {
        let tmp_dir = tempfile::Builder::new()
            .prefix(SCRATCH_DIR_PREFIX)
            .tempdir_in(&self.scratch_dir)?;
        debug!("Created scratch directory {}", tmp_dir.path().display());
        Ok(tmp_dir)
    }
}
