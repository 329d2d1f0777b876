use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::constants;

/// A user-defined playback option: a title plus one or more argv templates.
///
/// Tokens may contain `$url` (the resolved stream URL) and `$file` (a local
/// copy of the asset, downloaded once per dispatch).
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
pub struct CustomCommand {
  pub title: String,
  #[serde(default)]
  pub commands: Vec<Vec<String>>,
  #[serde(default)]
  pub watchphrase: Option<String>,
  #[serde(default)]
  pub command_to_watch: Option<usize>,
}

impl CustomCommand {
  /// The command index whose stdout should be watched, if watching is configured.
  ///
  /// A non-empty watch-phrase is required; the index defaults to the first command
  /// and must point at an existing command.
  pub fn watch_target(&self) -> Option<(usize, &str)> {
    let phrase = self.watchphrase.as_deref().filter(|p| !p.is_empty())?;
    let index = self.command_to_watch.unwrap_or(0);
    (index < self.commands.len()).then_some((index, phrase))
  }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Config {
  #[serde(default = "default_language")]
  pub preferred_language: String,
  #[serde(default)]
  pub custom_playback_options: Vec<CustomCommand>,
}

fn default_language() -> String {
  "en".to_string()
}

impl Default for Config {
  fn default() -> Self {
    Self { preferred_language: default_language(), custom_playback_options: Vec::new() }
  }
}

impl Config {
  /// Default location: `<config dir>/config.toml`.
  pub fn default_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", &constants().app_name).map(|dirs| dirs.config_dir().join("config.toml"))
  }

  /// Load the configuration from `path` (or the default location).
  ///
  /// A missing file yields the defaults. A file that exists but cannot be parsed is an error.
  pub fn load(path: Option<&Path>) -> Result<Self> {
    let path = match path {
      Some(p) => p.to_path_buf(),
      None => match Self::default_path() {
        Some(p) => p,
        None => return Ok(Self::default()),
      },
    };
    let content = match std::fs::read_to_string(&path) {
      Ok(content) => content,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
      Err(e) => return Err(e).with_context(|| format!("Failed to read config file {}", path.display())),
    };
    Self::parse(&content, &path).with_context(|| format!("malformed configuration file {}", path.display()))
  }

  fn parse(content: &str, path: &Path) -> Result<Self> {
    if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")) {
      Ok(serde_json::from_str(content)?)
    } else {
      Ok(toml::from_str(content)?)
    }
  }

  /// Custom options that have at least one command to run.
  pub fn playable_options(&self) -> impl Iterator<Item = &CustomCommand> {
    self.custom_playback_options.iter().filter(|c| !c.commands.is_empty())
  }
}
