//! Layered settings: built-in defaults, then the optional TOML file, then
//! `PAYSTRUCT_*` environment variables, then command-line flags.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api/v1";
pub const DEFAULT_TOKEN_PATH: &str = "~/.config/paystruct/storage.json";
pub const DEFAULT_LOG_FILE: &str = "paystruct.log";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
  /// Base URL every endpoint path is joined onto.
  pub api_url:    String,
  /// Where the session token and role are persisted.
  pub token_path: PathBuf,
  /// TUI log destination; subcommands log to stderr.
  pub log_file:   PathBuf,
}

impl Settings {
  pub fn load(file: &Path, api_url: Option<&str>) -> anyhow::Result<Self> {
    Self::load_with_prefix(file, "PAYSTRUCT", api_url)
  }

  fn load_with_prefix(file: &Path, env_prefix: &str, api_url: Option<&str>) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .set_default("api_url", DEFAULT_API_URL)?
      .set_default("token_path", DEFAULT_TOKEN_PATH)?
      .set_default("log_file", DEFAULT_LOG_FILE)?
      .add_source(config::File::from(file.to_path_buf()).required(false))
      .add_source(config::Environment::with_prefix(env_prefix))
      .set_override_option("api_url", api_url)?
      .build()
      .with_context(|| format!("failed to read config file {}", file.display()))?;

    let mut settings: Settings = settings
      .try_deserialize()
      .context("failed to deserialise settings")?;
    settings.token_path = expand_tilde(&settings.token_path);
    settings.log_file = expand_tilde(&settings.log_file);
    Ok(settings)
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use std::fs;

  use super::*;

  fn scratch(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("paystruct-{name}-{}.toml", std::process::id()))
  }

  #[test]
  fn missing_file_gives_defaults() {
    let settings =
      Settings::load_with_prefix(Path::new("/nonexistent/paystruct.toml"), "PAYSTRUCT_TEST_NONE", None)
        .unwrap();
    assert_eq!(settings.api_url, DEFAULT_API_URL);
    assert_eq!(settings.log_file, PathBuf::from(DEFAULT_LOG_FILE));
    assert!(settings.token_path.ends_with(".config/paystruct/storage.json"));
  }

  #[test]
  fn file_then_flag() {
    let path = scratch("layers");
    fs::write(&path, "api_url = \"https://file.example/api\"\nlog_file = \"/tmp/ps.log\"\n").unwrap();

    let from_file = Settings::load_with_prefix(&path, "PAYSTRUCT_TEST_FILE", None).unwrap();
    assert_eq!(from_file.api_url, "https://file.example/api");
    assert_eq!(from_file.log_file, PathBuf::from("/tmp/ps.log"));

    let flagged =
      Settings::load_with_prefix(&path, "PAYSTRUCT_TEST_FILE", Some("https://flag.example")).unwrap();
    assert_eq!(flagged.api_url, "https://flag.example");
    assert_eq!(flagged.log_file, PathBuf::from("/tmp/ps.log"));

    fs::remove_file(&path).ok();
  }

  #[test]
  fn tilde_expands_against_home() {
    let Ok(home) = std::env::var("HOME") else {
      return;
    };
    assert_eq!(expand_tilde(Path::new("~/x/y")), PathBuf::from(home).join("x/y"));
    assert_eq!(expand_tilde(Path::new("/abs")), PathBuf::from("/abs"));
  }
}
