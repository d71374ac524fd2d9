//! Configuration for condgate.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (CONDGATE_HOME, CONDGATE_LOG)
//! 2. Config file (.condgate/config.yaml)
//! 3. Defaults (~/.condgate, log level "info")
//!
//! Config file discovery:
//! - Searches current directory and parents for .condgate/config.yaml
//! - `home` in the config file is relative to the .condgate/ directory

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

const CONFIG_DIR: &str = ".condgate";
const CONFIG_FILE: &str = "config.yaml";
const DEFAULT_LOG_LEVEL: &str = "info";

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// State directory (relative to .condgate/)
    pub home: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// EnvFilter directive, e.g. "info" or "condgate=debug"
    pub level: Option<String>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Absolute path to condgate home (store and event logs)
    pub home: PathBuf,
    /// Default log filter directive
    pub log_level: String,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

impl ResolvedConfig {
    /// Directory holding one subdirectory per workflow run
    pub fn workflows_dir(&self) -> PathBuf {
        self.home.join("workflows")
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(CONFIG_DIR).join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to `base`
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(CONFIG_DIR);

    let config_file = find_config_file();
    let parsed = match config_file {
        Some(ref path) => Some(load_config_file(path)?),
        None => None,
    };

    let home = if let Ok(env_home) = std::env::var("CONDGATE_HOME") {
        PathBuf::from(env_home)
    } else if let (Some(path), Some(home_path)) = (
        config_file.as_ref(),
        parsed.as_ref().and_then(|c| c.paths.home.as_ref()),
    ) {
        let config_dir = path.parent().unwrap_or(Path::new("."));
        resolve_path(config_dir, home_path)
    } else {
        default_home
    };

    let log_level = std::env::var("CONDGATE_LOG")
        .ok()
        .or_else(|| {
            parsed
                .as_ref()
                .and_then(|c| c.logging.as_ref())
                .and_then(|l| l.level.clone())
        })
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

    Ok(ResolvedConfig {
        home,
        log_level,
        config_file,
    })
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Get the workflows directory ($CONDGATE_HOME/workflows)
pub fn workflows_dir() -> Result<PathBuf> {
    Ok(config()?.workflows_dir())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_config_file_parsing() {
        let temp = TempDir::new().unwrap();
        let config_dir = temp.path().join(CONFIG_DIR);
        std::fs::create_dir_all(&config_dir).unwrap();

        let config_path = config_dir.join(CONFIG_FILE);
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(
            file,
            r#"
version: "1.0"
paths:
  home: ./state
logging:
  level: condgate=debug
"#
        )
        .unwrap();

        let config = load_config_file(&config_path).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.paths.home, Some("./state".to_string()));
        assert_eq!(
            config.logging.unwrap().level,
            Some("condgate=debug".to_string())
        );
    }

    #[test]
    fn test_minimal_config_file() {
        let config: ConfigFile = serde_yaml::from_str("version: \"1.0\"\n").unwrap();
        assert!(config.paths.home.is_none());
        assert!(config.logging.is_none());
    }

    #[test]
    fn test_workflows_dir() {
        let config = ResolvedConfig {
            home: PathBuf::from("/test/.condgate"),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            config_file: None,
        };

        assert_eq!(
            config.workflows_dir(),
            PathBuf::from("/test/.condgate/workflows")
        );
    }

    #[test]
    fn test_resolve_relative_path() {
        let base = PathBuf::from("/home/user/project");

        assert_eq!(
            resolve_path(&base, "./subdir"),
            PathBuf::from("/home/user/project/subdir")
        );
        assert_eq!(
            resolve_path(&base, "/absolute/path"),
            PathBuf::from("/absolute/path")
        );
    }
}
