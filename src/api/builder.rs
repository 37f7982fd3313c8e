use std::{env, error::Error, path::PathBuf};

use crate::{fetch::GitGetter, git::GitClient, ChartFetch};

#[derive(Default)]
pub struct ChartFetchBuilder {
    scratch_directory: Option<PathBuf>,
    git_config: Option<git2::Config>,
}

impl ChartFetchBuilder {
    /// Directory below which every fetch creates its temporary working copy.
    ///
    /// Defaults to the system temporary directory.
    pub fn scratch_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.scratch_directory = Some(path.into());
        self
    }

    /// Git configuration used for credential helpers.
    ///
    /// Defaults to the user's global git configuration.
    pub fn git_config(mut self, config: git2::Config) -> Self {
        self.git_config = Some(config);
        self
    }

    pub fn try_build(self) -> Result<ChartFetch, Box<dyn Error>> {
        let Self {
            scratch_directory,
            git_config,
        } = self;

        let scratch_directory = match scratch_directory {
            Some(path) => {
                std::fs::create_dir_all(&path)?;
                path
            }
            None => env::temp_dir(),
        };

        let git_config = match git_config {
            Some(config) => config,
            None => git2::Config::open_default()?,
        };

        Ok(ChartFetch {
            getter: GitGetter::new(GitClient::new(git_config), scratch_directory),
        })
    }
}
