use std::{
    ffi::OsString,
    io::ErrorKind,
    path::{Component, Path, PathBuf},
};

use log::trace;
use thiserror::Error;

const MAX_SYMLINK_EXPANSIONS: usize = 255;

#[derive(Error, Debug)]
pub enum PathError {
    #[error("Too many symlinks while resolving {path} under {root}")]
    SymlinkLoop { root: String, path: String },
    #[error("Error while resolving {path}: {error}")]
    IO { path: String, error: std::io::Error },
}

enum Segment {
    Parent,
    Name(OsString),
}

fn segments(path: &Path) -> impl DoubleEndedIterator<Item = Segment> + '_ {
    path.components().filter_map(|component| match component {
        Component::Prefix(_) | Component::RootDir | Component::CurDir => None,
        Component::ParentDir => Some(Segment::Parent),
        Component::Normal(name) => Some(Segment::Name(name.to_os_string())),
    })
}

/// Join `unsafe_path` onto `root` so that the result never leaves `root`.
///
/// `unsafe_path` is resolved as if `root` were the filesystem root: absolute
/// paths are taken relative to `root`, `..` stops at `root` and symlinks that
/// already exist below `root` are expanded under the same rules.
pub fn secure_join(root: &Path, unsafe_path: impl AsRef<Path>) -> Result<PathBuf, PathError> {
    let unsafe_path = unsafe_path.as_ref();
    let mut resolved: Vec<OsString> = Vec::new();
    // Stack of segments still to visit, next one last.
    let mut pending: Vec<Segment> = segments(unsafe_path).rev().collect();
    let mut expansions = 0;

    while let Some(segment) = pending.pop() {
        let name = match segment {
            Segment::Parent => {
                resolved.pop();
                continue;
            }
            Segment::Name(name) => name,
        };

        let mut candidate = root.to_path_buf();
        candidate.extend(&resolved);
        candidate.push(&name);
        let metadata = match std::fs::symlink_metadata(&candidate) {
            Ok(metadata) => Some(metadata),
            Err(error) if error.kind() == ErrorKind::NotFound => None,
            Err(error) => {
                return Err(PathError::IO {
                    path: candidate.display().to_string(),
                    error,
                })
            }
        };

        if !metadata.is_some_and(|m| m.file_type().is_symlink()) {
            resolved.push(name);
            continue;
        }

        expansions += 1;
        if expansions > MAX_SYMLINK_EXPANSIONS {
            return Err(PathError::SymlinkLoop {
                root: root.display().to_string(),
                path: unsafe_path.display().to_string(),
            });
        }

        let target = std::fs::read_link(&candidate).map_err(|error| PathError::IO {
            path: candidate.display().to_string(),
            error,
        })?;
        trace!(
            "Expanding symlink {} -> {}",
            candidate.display(),
            target.display()
        );
        if target.has_root() {
            resolved.clear();
        }
        pending.extend(segments(&target).rev());
    }

    let mut joined = root.to_path_buf();
    joined.extend(resolved);
    Ok(joined)
}
