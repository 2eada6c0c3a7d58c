use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("max_display_depth in {config_path} must be at least 1, so root blocks stay visible")]
    ZeroDisplayDepth { config_path: PathBuf },
}

/// Settings for the page tools, read from `~/.config/blockpage/config.toml`.
///
/// ```toml
/// pages_path = "$SITE_ROOT/pages"
/// max_display_depth = 3
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding one `<slug>.json` file per page.
    pub pages_path: PathBuf,
    /// Outline depth cap. Unset means the editor's own default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_display_depth: Option<usize>,
}

impl Config {
    pub fn new(pages_path: impl Into<PathBuf>) -> Self {
        Self {
            pages_path: pages_path.into(),
            max_display_depth: None,
        }
    }

    pub fn with_max_display_depth(mut self, depth: usize) -> Self {
        self.max_display_depth = Some(depth);
        self
    }

    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        if config.max_display_depth == Some(0) {
            return Err(ConfigError::ZeroDisplayDepth {
                config_path: config_path.to_path_buf(),
            });
        }

        // Site roots are usually given as ~ or $VAR paths
        config.pages_path = Self::expand_path(&config.pages_path).unwrap_or(config.pages_path);

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        Self::load_from_path(Self::config_path())
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(config_path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to_path(Self::config_path())
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/blockpage");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        shellexpand::full(&path.to_string_lossy())
            .ok()
            .map(|expanded| PathBuf::from(expanded.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::env;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_config_path() {
        let path_str = Config::config_path().to_string_lossy().into_owned();

        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/blockpage/config.toml"));
    }

    #[test]
    fn test_display_depth_left_to_editor_when_unset() {
        let config: Config = toml::from_str(r#"pages_path = "/srv/school/pages""#).unwrap();

        assert_eq!(config, Config::new("/srv/school/pages"));
        assert_eq!(config.max_display_depth, None);
    }

    #[test]
    fn test_unset_depth_is_not_written() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        Config::new("/srv/school/pages").save_to_path(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written.trim(), r#"pages_path = "/srv/school/pages""#);
    }

    #[test]
    fn test_zero_display_depth_is_refused() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "pages_path = \"pages\"\nmax_display_depth = 0\n");

        assert!(matches!(
            Config::load_from_path(&path),
            Err(ConfigError::ZeroDisplayDepth { config_path }) if config_path == path
        ));
    }

    #[test]
    fn test_expand_pages_path_with_tilde() {
        let expanded = Config::expand_path(Path::new("~/site/pages")).unwrap();

        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.ends_with("site/pages"));
    }

    #[test]
    fn test_relative_pages_path_unchanged() {
        let path = PathBuf::from("site/pages");
        assert_eq!(Config::expand_path(&path).unwrap(), path);
    }

    #[test]
    fn test_missing_config_file_is_not_an_error() {
        let dir = TempDir::new().unwrap();

        assert!(Config::load_from_path(dir.path().join("absent.toml")).unwrap().is_none());
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "pages_path = \"pages\"\nmax_display_depth = \"deep\"\n");

        assert!(matches!(
            Config::load_from_path(&path),
            Err(ConfigError::ConfigParseError { .. })
        ));
    }

    #[test]
    fn test_save_and_load_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config::new("/srv/school/pages").with_max_display_depth(3);

        config.save_to_path(&path).unwrap();

        assert_eq!(Config::load_from_path(&path).unwrap(), Some(config));
    }

    #[test]
    fn test_pages_path_from_site_root_variable() {
        unsafe {
            env::set_var("BLOCKPAGE_SITE_ROOT", "/custom/site");
        }

        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "pages_path = \"$BLOCKPAGE_SITE_ROOT/pages\"\n");
        let config = Config::load_from_path(&path).unwrap().unwrap();

        assert_eq!(config.pages_path, PathBuf::from("/custom/site/pages"));

        unsafe {
            env::remove_var("BLOCKPAGE_SITE_ROOT");
        }
    }
}
