use std::{
    fs::File,
    path::{Path, PathBuf},
};

use flate2::{write::GzEncoder, Compression};
use log::info;

use super::{Chart, ChartError, ChartPackager};

const FILE_MODE: u32 = 0o644;

/// Packages charts as `<name>-<version>.tgz` with every file under `<name>/`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ArchivePackager;

impl ArchivePackager {
    pub fn archive_name(chart: &Chart) -> String {
        format!("{}-{}.tgz", chart.metadata.name, chart.metadata.version)
    }

    pub fn write(&self, chart: &Chart, destination: &Path) -> Result<PathBuf, ChartError> {
        let archive_path = destination.join(Self::archive_name(chart));
        let encoder = GzEncoder::new(File::create(&archive_path)?, Compression::default());
        let mut builder = tar::Builder::new(encoder);

        let base = Path::new(chart.name());
        for file in &chart.files {
            let mut header = tar::Header::new_gnu();
            header.set_size(file.data.len() as u64);
            header.set_mode(FILE_MODE);
            header.set_cksum();
            builder.append_data(&mut header, base.join(&file.name), file.data.as_slice())?;
        }
        builder.into_inner()?.finish()?;

        info!(
            "Packaged chart {} into {}",
            chart.name(),
            archive_path.display()
        );
        Ok(archive_path)
    }
}

impl ChartPackager for ArchivePackager {
    fn save(&self, chart: &Chart, destination: &Path) -> anyhow::Result<PathBuf> {
        Ok(self.write(chart, destination)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::chart::{ChartFile, Metadata};
    use flate2::read::GzDecoder;
    use pretty_assertions::assert_eq;
    use std::io::Read;

    #[test]
    fn write_archive() {
        let chart = Chart {
            metadata: Metadata::from_yaml_str("name: mychart\nversion: 0.1.0").unwrap(),
            files: vec![
                ChartFile {
                    name: "Chart.yaml".into(),
                    data: b"name: mychart\nversion: 0.1.0".to_vec(),
                },
                ChartFile {
                    name: "templates/service.yaml".into(),
                    data: b"kind: Service\n".to_vec(),
                },
            ],
        };
        let dir = tempfile::tempdir().unwrap();

        let path = ArchivePackager.write(&chart, dir.path()).unwrap();
        assert_eq!(path, dir.path().join("mychart-0.1.0.tgz"));

        let mut archive = tar::Archive::new(GzDecoder::new(File::open(&path).unwrap()));
        let entries: Vec<(PathBuf, String)> = archive
            .entries()
            .unwrap()
            .map(|entry| {
                let mut entry = entry.unwrap();
                let path = entry.path().unwrap().into_owned();
                let mut content = String::new();
                entry.read_to_string(&mut content).unwrap();
                (path, content)
            })
            .collect();
        assert_eq!(
            entries,
            vec![
                (
                    PathBuf::from("mychart/Chart.yaml"),
                    "name: mychart\nversion: 0.1.0".to_owned()
                ),
                (
                    PathBuf::from("mychart/templates/service.yaml"),
                    "kind: Service\n".to_owned()
                ),
            ]
        );
    }
}
