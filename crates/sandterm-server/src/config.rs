//! Server configuration.

use anyhow::Result;
use sandterm_core::AllowList;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    /// Shell started behind each console.
    #[serde(default = "default_shell")]
    pub shell: String,
    #[serde(default)]
    pub shell_args: Vec<String>,
    /// Working directory for new shells; the user's home when unset.
    #[serde(default = "default_working_dir")]
    pub working_dir: Option<PathBuf>,
    #[serde(default = "default_rows")]
    pub rows: u16,
    #[serde(default = "default_cols")]
    pub cols: u16,
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
    /// Largest WebSocket text message accepted from a browser, in bytes.
    #[serde(default = "default_max_input_size")]
    pub max_input_size: usize,
    /// Prompt label echoed before each submitted command; no echo when unset.
    #[serde(default)]
    pub local_echo: Option<String>,
    #[serde(default)]
    pub streaming: StreamingConfig,
}

/// Commands that switch a console to the live stream view.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamingConfig {
    #[serde(default = "default_streaming_exact")]
    pub exact: Vec<String>,
    #[serde(default = "default_streaming_prefixes")]
    pub prefixes: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8001
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("./frontend/dist")
}

fn default_shell() -> String {
    std::env::var("SHELL").unwrap_or_else(|_| "/bin/bash".to_string())
}

fn default_working_dir() -> Option<PathBuf> {
    dirs::home_dir()
}

fn default_rows() -> u16 {
    24
}

fn default_cols() -> u16 {
    80
}

fn default_max_sessions() -> usize {
    10
}

fn default_max_input_size() -> usize {
    64 * 1024
}

fn default_streaming_exact() -> Vec<String> {
    vec![
        "top".to_string(),
        r#"bash -c "$(curl https://grademe.fr)""#.to_string(),
    ]
}

fn default_streaming_prefixes() -> Vec<String> {
    vec!["vim".to_string()]
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            exact: default_streaming_exact(),
            prefixes: default_streaming_prefixes(),
        }
    }
}

impl StreamingConfig {
    pub fn allow_list(&self) -> AllowList {
        AllowList::new(self.exact.iter().cloned(), self.prefixes.iter().cloned())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
            shell: default_shell(),
            shell_args: Vec::new(),
            working_dir: default_working_dir(),
            rows: default_rows(),
            cols: default_cols(),
            max_sessions: default_max_sessions(),
            max_input_size: default_max_input_size(),
            local_echo: None,
            streaming: StreamingConfig::default(),
        }
    }
}

impl Config {
    /// Load config from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load config from the first of `config/default.toml` and
    /// `<user config dir>/sandterm/config.toml` that exists, or fall back to defaults.
    pub fn load() -> Result<Self> {
        for path in Self::search_paths() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }
        Ok(Config::default())
    }

    fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config/default.toml")];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("sandterm").join("config.toml"));
        }
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sandterm_core::CommandClassifier;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.port, 8001);
        assert_eq!((config.rows, config.cols), (24, 80));
        assert!(config.local_echo.is_none());
        assert!(config.streaming.allow_list().is_streaming("top"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
port = 9000
shell = "/bin/zsh"
local_echo = "guest@sandbox:~$"

[streaming]
prefixes = ["tail -f", "less"]
"#
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.shell, "/bin/zsh");
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.max_sessions, 10);
        assert_eq!(config.local_echo.as_deref(), Some("guest@sandbox:~$"));

        let allow = config.streaming.allow_list();
        assert!(allow.is_streaming("tail -f app.log"));
        assert!(allow.is_streaming("top"));
        assert!(!allow.is_streaming("vim notes"));
    }

    #[test]
    fn test_invalid_file_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = \"not a number\"").unwrap();
        assert!(Config::load_from(file.path()).is_err());
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from(&dir.path().join("absent.toml")).is_err());
    }
}
