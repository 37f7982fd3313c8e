use std::path::{Path, PathBuf};

use log::info;

use crate::{
    fetch::{FetchError, GitGetter},
    git::GitClient,
    model::locator,
};

mod builder;

pub use builder::ChartFetchBuilder;

pub struct ChartFetch {
    getter: GitGetter<GitClient>,
}

impl ChartFetch {
    pub fn builder() -> ChartFetchBuilder {
        ChartFetchBuilder::default()
    }

    /// Whether `identifier` is handled by this getter (`git://` or `git+<scheme>://`).
    pub fn is_git_repository(identifier: &str) -> bool {
        locator::is_git_repository(identifier)
    }

    /// Fetches the chart at `version` and returns the packaged archive
    pub fn fetch(
        &self,
        identifier: &str,
        version: &str,
        chart_name: &str,
    ) -> Result<Vec<u8>, FetchError> {
        self.getter.fetch(identifier, version, chart_name)
    }

    /// Fetches the chart at `version` and writes it as `<chart_name>-<version>.tgz`.
    /// Path separators in the file name, e.g. from branch names, become `-`.
    pub fn download(
        &self,
        identifier: &str,
        version: &str,
        chart_name: &str,
        output_directory: impl AsRef<Path>,
    ) -> anyhow::Result<PathBuf> {
        let file_name = format!("{chart_name}-{version}.tgz").replace(['/', '\\'], "-");
        let archive = self.fetch(identifier, version, chart_name)?;

        let output_directory = output_directory.as_ref();
        std::fs::create_dir_all(output_directory)?;
        let path = output_directory.join(file_name);
        std::fs::write(&path, archive)?;

        info!("Wrote {}", path.display());
        Ok(path)
    }

    /// Checks whether a branch or tag exists in the repository
    pub fn has_reference(&self, identifier: &str, reference: &str) -> Result<bool, FetchError> {
        self.getter.has_reference(identifier, reference)
    }

    pub fn scratch_directory(&self) -> &Path {
        self.getter.scratch_dir()
    }
}
