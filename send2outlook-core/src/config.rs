//! Configuration management for send2outlook.

use std::fs;
use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::paths::AppPaths;

const APP_NAME: &str = "send2outlook";

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Override for the settings data file location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings_file: Option<String>,
    /// Mail client scripting configuration.
    pub mail_client: MailClientConfig,
    /// Markdown rendering options.
    pub markdown: MarkdownConfig,
}

/// How the external mail client is driven.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailClientConfig {
    /// Application name targeted by the `tell application` block.
    pub application: String,
    /// Scripting runner executable, invoked with `-e <script>`.
    pub runner: String,
    /// Shell used to run the single-line runner invocation.
    pub shell: String,
}

impl Default for MailClientConfig {
    fn default() -> Self {
        Self {
            application: "Microsoft Outlook".to_string(),
            runner: "osascript".to_string(),
            shell: "sh".to_string(),
        }
    }
}

/// Markdown extensions enabled when rendering a note.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkdownConfig {
    /// GitHub-style tables.
    pub tables: bool,
    /// `~~strikethrough~~`.
    pub strikethrough: bool,
    /// `- [ ]` task list items.
    pub tasklists: bool,
    /// `[^1]` footnotes.
    pub footnotes: bool,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            tables: true,
            strikethrough: true,
            tasklists: true,
            footnotes: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from paths with environment overlay.
    pub fn load(paths: &AppPaths) -> Result<Self> {
        let env_prefix = env_prefix();
        let mut builder = Config::builder()
            .add_source(
                File::from(paths.global_config.as_path())
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                File::from(paths.local_config.as_path())
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(Environment::with_prefix(&env_prefix).separator("__"));

        if let Some(cli_cfg) = &paths.cli_config {
            builder = builder.add_source(
                File::from(cli_cfg.as_path())
                    .format(FileFormat::Toml)
                    .required(true),
            );
        }

        let defaults = AppConfig::default();
        builder = builder
            .set_default("mail_client.application", defaults.mail_client.application)?
            .set_default("mail_client.runner", defaults.mail_client.runner)?
            .set_default("mail_client.shell", defaults.mail_client.shell)?
            .set_default("markdown.tables", defaults.markdown.tables)?
            .set_default("markdown.strikethrough", defaults.markdown.strikethrough)?
            .set_default("markdown.tasklists", defaults.markdown.tasklists)?
            .set_default("markdown.footnotes", defaults.markdown.footnotes)?;

        let config: AppConfig = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Write default config to a path.
    pub fn write_default(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("creating config directory {parent:?}: {e}")))?;
        }
        let cfg = AppConfig::default();
        let toml = toml::to_string_pretty(&cfg)
            .map_err(|e| Error::Config(format!("serializing default config: {e}")))?;
        let mut content = String::new();
        content.push_str("# send2outlook configuration\n");
        content.push_str(
            "# Place this file at $XDG_CONFIG_HOME/send2outlook/config.toml (or ~/.config/send2outlook/config.toml)\n",
        );
        content.push_str("# Default recipients live in the settings file, see `send2outlook settings path`.\n");
        content.push_str("# settings_file = \"~/notes/.send2outlook.json\"\n\n");
        content.push_str(&toml);
        content.push('\n');
        fs::write(path, content)
            .map_err(|e| Error::Config(format!("writing config file to {}: {e}", path.display())))
    }

    /// Ensure default config exists, creating it if necessary.
    pub fn ensure_default(path: &Path) -> Result<()> {
        if path.exists() {
            return Ok(());
        }
        Self::write_default(path)
    }
}

/// Generate environment variable prefix from app name.
fn env_prefix() -> String {
    APP_NAME
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn paths_in(dir: &Path, cli_config: Option<PathBuf>) -> AppPaths {
        AppPaths {
            global_config: dir.join("global.toml"),
            local_config: dir.join("local.toml"),
            cli_config,
            data_dir: dir.join("data"),
        }
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.mail_client.application, "Microsoft Outlook");
        assert_eq!(config.mail_client.runner, "osascript");
        assert_eq!(config.mail_client.shell, "sh");
        assert!(config.settings_file.is_none());
    }

    #[test]
    fn test_markdown_config_defaults() {
        let config = MarkdownConfig::default();
        assert!(config.tables);
        assert!(config.strikethrough);
        assert!(config.tasklists);
        assert!(!config.footnotes);
    }

    #[test]
    fn test_write_default_config() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("nested").join("config.toml");
        AppConfig::write_default(&config_path).unwrap();
        assert!(config_path.exists());
        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("[mail_client]"));
        assert!(content.contains("application = \"Microsoft Outlook\""));
        assert!(content.contains("[markdown]"));
    }

    #[test]
    fn test_load_defaults_without_files() {
        let temp = TempDir::new().unwrap();
        let config = AppConfig::load(&paths_in(temp.path(), None)).unwrap();
        assert_eq!(config.mail_client.runner, "osascript");
        assert!(config.markdown.tables);
    }

    #[test]
    fn test_load_cli_config_overrides() {
        let temp = TempDir::new().unwrap();
        let cli = temp.path().join("cli.toml");
        fs::write(
            &cli,
            "settings_file = \"/tmp/s2o.json\"\n[mail_client]\napplication = \"Outlook Beta\"\n[markdown]\nfootnotes = true\n",
        )
        .unwrap();

        let config = AppConfig::load(&paths_in(temp.path(), Some(cli))).unwrap();
        assert_eq!(config.mail_client.application, "Outlook Beta");
        assert_eq!(config.mail_client.runner, "osascript");
        assert!(config.markdown.footnotes);
        assert_eq!(config.settings_file.as_deref(), Some("/tmp/s2o.json"));
    }

    #[test]
    fn test_missing_cli_config_is_error() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("missing.toml");
        assert!(AppConfig::load(&paths_in(temp.path(), Some(missing))).is_err());
    }

    #[test]
    fn test_ensure_default_keeps_existing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "# mine\n").unwrap();
        AppConfig::ensure_default(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "# mine\n");
    }

    #[test]
    fn test_env_prefix() {
        assert_eq!(env_prefix(), "SEND2OUTLOOK");
    }
}
