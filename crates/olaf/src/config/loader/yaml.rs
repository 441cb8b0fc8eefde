use std::path::PathBuf;

use config::FileFormat;
use tracing::debug;

use crate::{config::AppConfig, fs::FileSystem};

use super::{ConfigLoadError, ConfigLoader};

const CONFIG_FILE_NAMES: [&str; 2] = ["config.yaml", "config.yml"];

pub struct Yaml<'a, F: FileSystem> {
    fs: &'a F,
}

impl<'a, F: FileSystem> Yaml<'a, F> {
    pub fn new(fs: &'a F) -> Self {
        Self { fs }
    }
}

impl<F: FileSystem> ConfigLoader for Yaml<'_, F> {
    fn load_config(&self) -> Result<AppConfig, ConfigLoadError> {
        let config_paths = self.find_config_file_paths();

        if config_paths.len() > 1 {
            return Err(ConfigLoadError::MultipleFound(
                config_paths
                    .into_iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>(),
            ));
        }

        let mut builder = config::Config::builder();

        if let Some(config_path) = config_paths.first() {
            debug!(path = %config_path.display(), "loading user configuration");
            let file_contents = self.fs.read_file(config_path)?;
            builder = builder.add_source(config::File::from_str(&file_contents, FileFormat::Yaml));
        } else {
            debug!("no user configuration file, using defaults");
        }

        let config = builder.build()?;

        Ok(config.try_deserialize()?)
    }

    fn find_config_file_paths(&self) -> Vec<PathBuf> {
        let Ok(config_dir) = self.fs.config_dir() else {
            return Vec::new();
        };

        CONFIG_FILE_NAMES
            .iter()
            .map(|name| config_dir.join(name))
            .filter(|path| self.fs.path_exists(path))
            .collect()
    }
}
