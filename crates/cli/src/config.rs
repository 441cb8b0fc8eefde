use olaf::config::{AppConfig, loader::ApplyToConfig};

use crate::cli::ClapCli;

impl ApplyToConfig for ClapCli {
    fn apply_to_config(&self, mut config: AppConfig) -> AppConfig {
        if let Some(target) = self.install.target.as_ref() {
            *config.target_directory_mut() = target.clone();
        }

        if let Some(local) = self.install.local.as_ref() {
            *config.local_root_mut() = local.clone();
        }

        // --repo and --branch go through InstallOptions; the project seed ranks above config.

        *config.verbose_mut() = self.verbose || config.verbose();
        *config.use_colors_mut() = !self.no_color && config.use_colors();

        config
    }
}
