use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;

static DEFAULT_VAULT_PATH: &str = "~/notes";

fn default_vault_path() -> PathBuf {
    PathBuf::from(DEFAULT_VAULT_PATH)
}

/// Global configuration at ~/.config/realcal/config.toml
///
/// Calendar settings (event folder, week start, ...) live inside each vault
/// in .realcal/data.json instead.
#[derive(Deserialize, Clone, Debug)]
pub struct GlobalConfig {
    #[serde(default = "default_vault_path")]
    pub vault_dir: PathBuf,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        GlobalConfig {
            vault_dir: default_vault_path(),
        }
    }
}

impl GlobalConfig {
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join("realcal");

        Ok(config_dir.join("config.toml"))
    }

    /// Load the global config, creating a commented default file first if
    /// there is none.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        Config::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .build()
            .with_context(|| format!("Could not read config file {}", path.display()))?
            .try_deserialize()
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> Result<()> {
        let contents = format!(
            "\
# realcal configuration

# Where your notes live:
# vault_dir = \"{}\"
",
            DEFAULT_VAULT_PATH
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Could not create config directory")?;
        }

        std::fs::write(path, contents).context("Could not write config file")?;

        Ok(())
    }

    /// The vault directory with `~` expanded.
    pub fn vault_path(&self) -> PathBuf {
        let full_path_str = shellexpand::tilde(&self.vault_dir.to_string_lossy()).into_owned();

        PathBuf::from(full_path_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_file_loads_as_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("realcal/config.toml");

        GlobalConfig::create_default_config(&path).unwrap();
        let config = GlobalConfig::load_from(&path).unwrap();

        assert_eq!(config.vault_dir, PathBuf::from("~/notes"));
    }

    #[test]
    fn reads_vault_dir() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "vault_dir = \"/srv/vault\"\n").unwrap();

        let config = GlobalConfig::load_from(&path).unwrap();
        assert_eq!(config.vault_path(), PathBuf::from("/srv/vault"));
    }
}
