use crate::error::{ErkError, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    /// Directory holding issue bodies, relative to the project root.
    #[serde(default = "default_issues_dir")]
    pub issues_dir: String,
    /// Post an action-log comment on the issue after each roadmap update.
    #[serde(default)]
    pub post_comments: bool,
}

fn default_version() -> u32 {
    1
}

fn default_issues_dir() -> String {
    paths::DEFAULT_ISSUES_DIR.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            issues_dir: default_issues_dir(),
            post_comments: false,
        }
    }
}

impl Config {
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(ErkError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    /// Like [`Config::load`], but an uninitialized project gets the defaults.
    pub fn load_or_default(root: &Path) -> Result<Self> {
        match Self::load(root) {
            Ok(cfg) => Ok(cfg),
            Err(ErkError::NotInitialized) => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    pub fn issues_path(&self, root: &Path) -> PathBuf {
        root.join(&self.issues_dir)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.version != default_version() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "unknown config version {} (expected {})",
                    self.version,
                    default_version()
                ),
            });
        }

        if self.issues_dir.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "issues_dir is empty".to_string(),
            });
        } else if Path::new(&self.issues_dir).is_absolute() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "issues_dir '{}' is absolute; issue bodies will live outside the project",
                    self.issues_dir
                ),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn load_missing_is_not_initialized() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Config::load(dir.path()),
            Err(ErkError::NotInitialized)
        ));
        let cfg = Config::load_or_default(dir.path()).unwrap();
        assert_eq!(cfg.issues_dir, ".erk/issues");
        assert!(!cfg.post_comments);
    }

    #[test]
    fn save_and_load() {
        let dir = TempDir::new().unwrap();
        let cfg = Config {
            post_comments: true,
            ..Config::default()
        };
        cfg.save(dir.path()).unwrap();
        let loaded = Config::load(dir.path()).unwrap();
        assert!(loaded.post_comments);
        assert_eq!(loaded.version, 1);
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let cfg: Config = serde_yaml::from_str("post_comments: true\n").unwrap();
        assert_eq!(cfg.issues_dir, ".erk/issues");
        assert_eq!(cfg.version, 1);
    }

    #[test]
    fn default_config_has_no_warnings() {
        assert!(Config::default().validate().is_empty());
    }

    #[test]
    fn empty_issues_dir_is_an_error() {
        let cfg = Config {
            issues_dir: "  ".to_string(),
            ..Config::default()
        };
        let warnings = cfg.validate();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].level, WarnLevel::Error);
    }

    #[test]
    fn absolute_issues_dir_and_version_warn() {
        let cfg = Config {
            version: 3,
            issues_dir: "/var/issues".to_string(),
            post_comments: false,
        };
        let warnings = cfg.validate();
        assert_eq!(warnings.len(), 2);
        assert!(warnings.iter().all(|w| w.level == WarnLevel::Warning));
    }
}
