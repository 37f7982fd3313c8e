use std::{
    fmt::{Display, Formatter},
    str::FromStr,
    sync::OnceLock,
};

use regex_lite::Regex;
use thiserror::Error;
use url::Url;

/// Marker prepended to a regular URL scheme, e.g. `git+https://`.
const GIT_SCHEME_MARKER: &str = "git+";
/// Separates the repository path from the chart subpath inside the URL path.
pub const SUBPATH_DELIMITER: &str = "//";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum LocatorError {
    #[error("{0} is not a git repository URL, expected git:// or git+<scheme>://")]
    NotGitRepository(String),
    #[error("Invalid git repository URL {url}: {error}")]
    Parse { url: String, error: url::ParseError },
    #[error("git repository URL should not contain credentials - please use git credential helpers")]
    Credentials,
    #[error("Git repository URL {0} has no repository path before the subpath")]
    MissingRepositoryPath(String),
}

fn git_repository_url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^git(\+\w+)?://").unwrap())
}

/// Whether `identifier` should be fetched from a git repository.
///
/// Matches `git://...` and `git+<scheme>://...`.
pub fn is_git_repository(identifier: &str) -> bool {
    git_repository_url_re().is_match(identifier)
}

/// A git repository identifier split into the URL handed to git and the
/// directory of the chart inside the repository.
///
/// The chart directory is encoded after a `//` in the URL path:
/// `git+https://example.com/org/repo//charts/mychart`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryLocator {
    repository_url: String,
    remote_url: Url,
    subpath: Option<String>,
}

/// Splits the subpath off `url` before it is parsed, so dot segments and
/// escapes in the subpath never leak into the repository path.
///
/// Returns the URL without the subpath, the repository path and the raw subpath.
fn split_subpath(url: &str) -> Option<(String, &str, &str)> {
    let authority_start = url.find("://")? + "://".len();
    let path_start = authority_start + url[authority_start..].find(['/', '?', '#'])?;
    if !url[path_start..].starts_with('/') {
        return None;
    }
    let path_end = url[path_start..]
        .find(['?', '#'])
        .map_or(url.len(), |end| path_start + end);
    let path = &url[path_start..path_end];
    let delimiter = path.find(SUBPATH_DELIMITER)?;

    let repository_path = &path[..delimiter];
    let subpath = &path[delimiter + SUBPATH_DELIMITER.len()..];
    let remote = format!("{}{}", &url[..path_start + delimiter], &url[path_end..]);
    Some((remote, repository_path, subpath))
}

impl RepositoryLocator {
    pub fn parse(identifier: &str) -> Result<RepositoryLocator, LocatorError> {
        if !is_git_repository(identifier) {
            return Err(LocatorError::NotGitRepository(identifier.to_owned()));
        }

        let stripped = identifier
            .strip_prefix(GIT_SCHEME_MARKER)
            .unwrap_or(identifier);
        let (remote, subpath) = match split_subpath(stripped) {
            Some((remote, repository_path, subpath)) => {
                if repository_path.trim_matches('/').is_empty() {
                    return Err(LocatorError::MissingRepositoryPath(identifier.to_owned()));
                }
                let subpath = subpath.trim_matches('/');
                (remote, Some(subpath).filter(|s| !s.is_empty()))
            }
            None => (stripped.to_owned(), None),
        };

        let remote_url = Url::parse(&remote).map_err(|error| LocatorError::Parse {
            url: identifier.to_owned(),
            error,
        })?;
        if !remote_url.username().is_empty() || remote_url.password().is_some() {
            return Err(LocatorError::Credentials);
        }

        Ok(RepositoryLocator {
            repository_url: identifier.to_owned(),
            remote_url,
            subpath: subpath.map(str::to_owned),
        })
    }

    /// The identifier as given by the caller.
    pub fn repository_url(&self) -> &str {
        &self.repository_url
    }

    /// The URL to clone, without the `git+` marker and the subpath.
    pub fn remote_url(&self) -> &Url {
        &self.remote_url
    }

    /// Chart directory relative to the repository root, if not the root itself.
    pub fn subpath(&self) -> Option<&str> {
        self.subpath.as_deref()
    }

    /// Guess a chart name from the last subpath or repository path segment.
    pub fn chart_name_hint(&self) -> Option<String> {
        let path = match &self.subpath {
            Some(subpath) => subpath.as_str(),
            None => self.remote_url.path(),
        };
        path.trim_end_matches('/')
            .rsplit('/')
            .next()
            .map(|segment| segment.trim_end_matches(".git"))
            .filter(|segment| !segment.is_empty())
            .map(str::to_owned)
    }
}

impl FromStr for RepositoryLocator {
    type Err = LocatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RepositoryLocator::parse(s)
    }
}

impl Display for RepositoryLocator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.repository_url)
    }
}
