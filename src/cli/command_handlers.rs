use log::info;

use crate::{model::locator::RepositoryLocator, ChartFetch};
use std::{
    error::Error,
    path::{Path, PathBuf},
};

const DEFAULT_OUTPUT_DIRECTORY_NAME: &str = ".";

/// Handler to fetch command
pub fn do_fetch(
    chartfetch: &ChartFetch,
    repository: &str,
    version: &str,
    name: Option<&str>,
    output_directory: Option<&Path>,
) -> Result<PathBuf, Box<dyn Error>> {
    let name = match name {
        Some(name) => name.to_owned(),
        None => RepositoryLocator::parse(repository)?
            .chart_name_hint()
            .ok_or("Chart name not given and could not be derived from the repository")?,
    };
    let output_directory =
        output_directory.unwrap_or(Path::new(DEFAULT_OUTPUT_DIRECTORY_NAME));

    info!("Fetching chart {} from {} at {}", name, repository, version);
    let path = chartfetch.download(repository, version, &name, output_directory)?;
    Ok(path)
}

/// Handler to has-ref command
pub fn do_has_ref(
    chartfetch: &ChartFetch,
    repository: &str,
    reference: &str,
) -> Result<bool, Box<dyn Error>> {
    let found = chartfetch.has_reference(repository, reference)?;
    if found {
        info!("Found {} in {}", reference, repository);
    } else {
        info!("{} does not exist in {}", reference, repository);
    }
    Ok(found)
}
