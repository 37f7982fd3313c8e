use std::{collections::HashMap, path::PathBuf};

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

pub struct ChartFetchConfig {
    pub scratch_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
}

impl ChartFetchConfig {
    pub fn load() -> anyhow::Result<Self> {
        let raw_config = RawConfig::load(None)?;

        Ok(Self {
            scratch_dir: raw_config.scratch.dir,
            output_dir: raw_config.output.dir,
        })
    }
}

#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
struct RawConfig {
    #[serde(default)]
    scratch: DirConfig,
    #[serde(default)]
    output: DirConfig,
}

#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
struct DirConfig {
    dir: Option<PathBuf>,
}

impl RawConfig {
    fn load(env: Option<HashMap<String, String>>) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(
                Environment::with_prefix("CHARTFETCH")
                    .separator("_")
                    .source(env),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn load_empty() {
        let env = HashMap::from([]);
        let config = RawConfig::load(Some(env)).unwrap();
        assert_eq!(
            config,
            RawConfig {
                scratch: DirConfig { dir: None },
                output: DirConfig { dir: None },
            }
        )
    }

    #[test]
    fn load_environment() {
        let env = HashMap::from([
            ("CHARTFETCH_SCRATCH_DIR".to_owned(), "/scratch".to_owned()),
            ("CHARTFETCH_OUTPUT_DIR".to_owned(), "/charts".to_owned()),
            ("OTHER_SCRATCH_DIR".to_owned(), "/ignored".to_owned()),
        ]);
        let config = RawConfig::load(Some(env)).unwrap();
        assert_eq!(
            config,
            RawConfig {
                scratch: DirConfig {
                    dir: Some("/scratch".into())
                },
                output: DirConfig {
                    dir: Some("/charts".into())
                },
            }
        )
    }
}
