use std::path::Path;

use log::{debug, trace};
use walkdir::WalkDir;

use super::{Chart, ChartError, ChartFile, ChartLoader, Metadata, CHART_FILE_NAME};

const GIT_DIR: &str = ".git";

/// Loads a chart from an unpacked chart directory.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectoryLoader;

impl DirectoryLoader {
    pub fn load(&self, path: &Path) -> Result<Chart, ChartError> {
        if !path.is_dir() {
            return Err(ChartError::NotADirectory(path.display().to_string()));
        }

        // Symlinks are skipped like every other chart file.
        let chart_file = path.join(CHART_FILE_NAME);
        let is_regular_file = match std::fs::symlink_metadata(&chart_file) {
            Ok(metadata) => metadata.file_type().is_file(),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => false,
            Err(error) => return Err(error.into()),
        };
        if !is_regular_file {
            return Err(ChartError::MissingChartFile(path.display().to_string()));
        }
        let chart_data = std::fs::read(&chart_file)?;
        let metadata = Metadata::from_yaml_str(&String::from_utf8_lossy(&chart_data))?;

        let mut files = vec![ChartFile {
            name: CHART_FILE_NAME.into(),
            data: chart_data,
        }];
        let walker = WalkDir::new(path)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.file_name() != GIT_DIR);
        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                trace!("Skipping {}", entry.path().display());
                continue;
            }
            let name = entry
                .path()
                .strip_prefix(path)
                .map_err(|_| ChartError::NotADirectory(path.display().to_string()))?;
            if name == Path::new(CHART_FILE_NAME) {
                continue;
            }
            files.push(ChartFile {
                name: name.to_path_buf(),
                data: std::fs::read(entry.path())?,
            });
        }

        debug!(
            "Loaded chart {} {} with {} files from {}",
            metadata.name,
            metadata.version,
            files.len(),
            path.display()
        );
        Ok(Chart { metadata, files })
    }
}

impl ChartLoader for DirectoryLoader {
    fn load_dir(&self, path: &Path) -> anyhow::Result<Chart> {
        Ok(self.load(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn write(root: &Path, name: &str, content: &str) {
        let path = root.join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn load_chart_directory() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "values.yaml", "replicas: 1\n");
        write(dir.path(), "Chart.yaml", "name: mychart\nversion: 1.0.0\n");
        write(dir.path(), "templates/deployment.yaml", "kind: Deployment\n");
        write(dir.path(), ".git/HEAD", "ref: refs/heads/main\n");

        let chart = DirectoryLoader.load(dir.path()).unwrap();

        assert_eq!(chart.name(), "mychart");
        let names: Vec<PathBuf> = chart.files.iter().map(|f| f.name.clone()).collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("Chart.yaml"),
                PathBuf::from("templates/deployment.yaml"),
                PathBuf::from("values.yaml"),
            ]
        );
        assert_eq!(chart.files[2].data, b"replicas: 1\n");
    }

    #[test]
    fn missing_chart_file() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "values.yaml", "replicas: 1\n");

        assert!(matches!(
            DirectoryLoader.load(dir.path()),
            Err(ChartError::MissingChartFile(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_chart_file() {
        let outside = tempfile::tempdir().unwrap();
        write(outside.path(), "Chart.yaml", "name: secret\nversion: 1.0.0\n");
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "values.yaml", "replicas: 1\n");
        std::os::unix::fs::symlink(
            outside.path().join("Chart.yaml"),
            dir.path().join("Chart.yaml"),
        )
        .unwrap();

        assert!(matches!(
            DirectoryLoader.load(dir.path()),
            Err(ChartError::MissingChartFile(_))
        ));
    }

    #[test]
    fn not_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            DirectoryLoader.load(&dir.path().join("missing")),
            Err(ChartError::NotADirectory(_))
        ));
    }
}
