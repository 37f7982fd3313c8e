use std::path::Path;

use git2::{
    cert::Cert, AutotagOption, CertificateCheckStatus, Config, Cred, CredentialType, FetchOptions,
    RemoteCallbacks,
};
use log::{debug, trace};
use ssh_key::{known_hosts::HostPatterns, KnownHosts};
use url::Url;

use super::{repository::GitRepository, VcsClient, VcsRepository};

const GLOBAL_KNOWN_HOSTS: &str = "/etc/ssh/ssh_known_hosts";
const DEFAULT_SSH_USER: &str = "git";

/// [`VcsClient`] backed by libgit2.
pub struct GitClient {
    git_config: Config,
}

impl GitClient {
    pub fn new(git_config: Config) -> GitClient {
        GitClient { git_config }
    }

    pub(super) fn fetch_options(&self) -> FetchOptions<'_> {
        let mut callbacks = RemoteCallbacks::new();
        callbacks.credentials(|url, username, allowed_types| {
            self.credentials(url, username, allowed_types)
        });
        callbacks.certificate_check(|certificate, host| self.check_certificate(certificate, host));

        let mut fetch_options = FetchOptions::new();
        fetch_options
            .remote_callbacks(callbacks)
            .download_tags(AutotagOption::All);
        fetch_options
    }

    /// Repository URLs never carry credentials, so they come from the ssh
    /// agent or the configured git credential helpers.
    fn credentials(
        &self,
        url: &str,
        username: Option<&str>,
        allowed_types: CredentialType,
    ) -> Result<Cred, git2::Error> {
        trace!(
            "Requested credentials for {}, username {:?}, allowed types {:?}",
            url,
            username,
            allowed_types
        );
        if allowed_types.contains(CredentialType::USERNAME) {
            Cred::username(DEFAULT_SSH_USER)
        } else if allowed_types.contains(CredentialType::SSH_KEY) {
            Cred::ssh_key_from_agent(username.unwrap_or(DEFAULT_SSH_USER))
        } else if allowed_types.contains(CredentialType::USER_PASS_PLAINTEXT) {
            Cred::credential_helper(&self.git_config, url, username)
        } else {
            Err(git2::Error::from_str("no valid authentication available"))
        }
    }

    fn check_certificate(
        &self,
        certificate: &Cert<'_>,
        host: &str,
    ) -> Result<CertificateCheckStatus, git2::Error> {
        let Some(hostkey) = certificate.as_hostkey().and_then(|h| h.hostkey()) else {
            return Ok(CertificateCheckStatus::CertificatePassthrough);
        };
        if is_known_host(Path::new(GLOBAL_KNOWN_HOSTS), host, hostkey) {
            return Ok(CertificateCheckStatus::CertificateOk);
        }
        debug!("Host key of {} is not in {}", host, GLOBAL_KNOWN_HOSTS);
        Ok(CertificateCheckStatus::CertificatePassthrough)
    }
}

impl VcsClient for GitClient {
    fn new_repo(
        &self,
        remote_url: &Url,
        local_path: &Path,
    ) -> anyhow::Result<Box<dyn VcsRepository + '_>> {
        Ok(Box::new(GitRepository::new(
            self,
            remote_url.as_str(),
            local_path,
        )))
    }
}

/// Whether `file` lists `hostkey` for `host`. Unreadable files count as no match.
fn is_known_host(file: &Path, host: &str, hostkey: &[u8]) -> bool {
    let entries = match KnownHosts::read_file(file) {
        Ok(entries) => entries,
        Err(error) => {
            trace!("Could not load {}: {}", file.display(), error);
            return false;
        }
    };
    entries
        .into_iter()
        .filter(|entry| host_matches_patterns(host, entry.host_patterns()))
        .any(|entry| {
            let key = entry.public_key();
            let matches = key.to_bytes().as_deref() == Ok(hostkey);
            trace!(
                "{} entry for {} ({}): {}",
                file.display(),
                host,
                key.algorithm(),
                if matches { "match" } else { "different key" }
            );
            matches
        })
}

/// OpenSSH host pattern matching: `*` and `?` wildcards, `!` negates.
fn host_matches_patterns(host: &str, patterns: &HostPatterns) -> bool {
    let host = host.to_lowercase();
    match patterns {
        HostPatterns::Patterns(patterns) => {
            let mut match_found = false;
            for pattern in patterns {
                let pattern = pattern.to_lowercase();
                match pattern.strip_prefix('!') {
                    Some(negated) if wildcard_match(negated, &host) => return false,
                    Some(_) => {}
                    None => match_found |= wildcard_match(&pattern, &host),
                }
            }
            match_found
        }
        // Hashed names need HMAC-SHA1 of the host
        HostPatterns::HashedName { .. } => false,
    }
}

fn wildcard_match(pattern: &str, text: &str) -> bool {
    match pattern.chars().next() {
        None => text.is_empty(),
        Some('*') => {
            let rest = &pattern[1..];
            text.char_indices()
                .map(|(i, _)| i)
                .chain(std::iter::once(text.len()))
                .any(|i| wildcard_match(rest, &text[i..]))
        }
        Some(c) => {
            let mut chars = text.chars();
            match chars.next() {
                Some(t) if c == '?' || c == t => {
                    wildcard_match(&pattern[c.len_utf8()..], chars.as_str())
                }
                _ => false,
            }
        }
    }
}
