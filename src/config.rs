// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Configuration for k8s-extension
//!
//! All k8s-extension data is stored under ~/.k8s-extension/:
//! - ~/.k8s-extension/config.json - user configuration
//! - ~/.k8s-extension/log/ - rotated log files

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::kubernetes::{CONNECT_TIMEOUT, READ_TIMEOUT, Timeouts};

/// Get the base directory (~/.k8s-extension/)
pub fn base_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|p| p.join(".k8s-extension"))
        .context("Could not determine home directory")
}

fn default_connect_timeout_secs() -> u64 {
    CONNECT_TIMEOUT.as_secs()
}

fn default_read_timeout_secs() -> u64 {
    READ_TIMEOUT.as_secs()
}

/// k8s-extension configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Kubeconfig used when none is given explicitly
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubeconfig: Option<String>,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            kubeconfig: None,
            connect_timeout_secs: default_connect_timeout_secs(),
            read_timeout_secs: default_read_timeout_secs(),
        }
    }
}

impl Config {
    /// Load config from disk, or return default if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Get the config file path (~/.k8s-extension/config.json)
    pub fn config_path() -> Result<PathBuf> {
        Ok(base_dir()?.join("config.json"))
    }

    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            connect: Duration::from_secs(self.connect_timeout_secs),
            read: Duration::from_secs(self.read_timeout_secs),
        }
    }

    /// Locate the kubeconfig: `explicit`, then this config, then the first
    /// entry of $KUBECONFIG, then ~/.kube/config. The file must exist.
    pub fn kubeconfig_path(&self, explicit: Option<&str>) -> Result<PathBuf> {
        resolve_kubeconfig(
            explicit,
            self.kubeconfig.as_deref(),
            std::env::var_os("KUBECONFIG").as_deref(),
            dirs::home_dir().as_deref(),
        )
    }
}

fn resolve_kubeconfig(
    explicit: Option<&str>,
    configured: Option<&str>,
    env: Option<&OsStr>,
    home: Option<&Path>,
) -> Result<PathBuf> {
    let from_env = env.and_then(|value| {
        std::env::split_paths(value)
            .find(|p| !p.as_os_str().is_empty())
    });

    let path = match explicit.or(configured).filter(|p| !p.is_empty()) {
        Some(path) => expand_home(path, home)?,
        None => match from_env {
            Some(path) => path,
            None => home
                .map(|h| h.join(".kube").join("config"))
                .context("Could not determine home directory")?,
        },
    };

    if !path.exists() {
        bail!("kubeconfig not found: {}", path.display());
    }

    Ok(path)
}

/// Expand a leading `~` to the home directory
fn expand_home(path: &str, home: Option<&Path>) -> Result<PathBuf> {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest.trim_start_matches('/'),
        _ => return Ok(PathBuf::from(path)),
    };

    let home = home.context("Could not determine home directory")?;
    Ok(if rest.is_empty() {
        home.to_path_buf()
    } else {
        home.join(rest)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, relative: &str) -> PathBuf {
        let path = dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "apiVersion: v1\nkind: Config\n").unwrap();
        path
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.kubeconfig.is_none());
        assert_eq!(
            config.timeouts(),
            Timeouts {
                connect: CONNECT_TIMEOUT,
                read: READ_TIMEOUT,
            }
        );
        assert_eq!(config.timeouts().connect, Duration::from_secs(10));
        assert_eq!(config.timeouts().read, Duration::from_secs(30));
    }

    #[test]
    fn test_config_deserialize_partial() {
        let config: Config = serde_json::from_str(r#"{"read_timeout_secs": 5}"#).unwrap();
        assert_eq!(config.read_timeout_secs, 5);
        assert_eq!(config.connect_timeout_secs, 10);
        assert!(config.kubeconfig.is_none());
    }

    #[test]
    fn test_config_load_from_disk() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");

        // Missing file yields defaults
        assert_eq!(Config::load_from(&path).unwrap(), Config::default());

        fs::write(&path, r#"{"kubeconfig": "/etc/kube/admin.conf"}"#).unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.kubeconfig.as_deref(), Some("/etc/kube/admin.conf"));

        fs::write(&path, "{not json").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_resolve_prefers_explicit_path() {
        let temp_dir = TempDir::new().unwrap();
        let explicit = touch(temp_dir.path(), "explicit.yaml");
        let configured = touch(temp_dir.path(), "configured.yaml");

        let path = resolve_kubeconfig(
            explicit.to_str(),
            configured.to_str(),
            None,
            Some(temp_dir.path()),
        )
        .unwrap();
        assert_eq!(path, explicit);

        let path =
            resolve_kubeconfig(None, configured.to_str(), None, Some(temp_dir.path())).unwrap();
        assert_eq!(path, configured);
    }

    #[test]
    fn test_resolve_uses_first_env_entry() {
        let temp_dir = TempDir::new().unwrap();
        let first = touch(temp_dir.path(), "first.yaml");
        let second = touch(temp_dir.path(), "second.yaml");
        let env = std::env::join_paths([&first, &second]).unwrap();

        let path = resolve_kubeconfig(None, None, Some(&env), Some(temp_dir.path())).unwrap();
        assert_eq!(path, first);
    }

    #[test]
    fn test_resolve_falls_back_to_home() {
        let temp_dir = TempDir::new().unwrap();
        let default = touch(temp_dir.path(), ".kube/config");

        let path = resolve_kubeconfig(None, None, None, Some(temp_dir.path())).unwrap();
        assert_eq!(path, default);
    }

    #[test]
    fn test_resolve_expands_tilde() {
        let temp_dir = TempDir::new().unwrap();
        let expected = touch(temp_dir.path(), "clusters/lab.yaml");

        let path =
            resolve_kubeconfig(Some("~/clusters/lab.yaml"), None, None, Some(temp_dir.path()))
                .unwrap();
        assert_eq!(path, expected);
    }

    #[test]
    fn test_resolve_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope.yaml");

        let err = resolve_kubeconfig(missing.to_str(), None, None, Some(temp_dir.path()))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("kubeconfig not found: {}", missing.display())
        );
    }

    #[test]
    fn test_expand_home_leaves_other_paths() {
        let home = Path::new("/home/dev");
        assert_eq!(expand_home("/abs/config", Some(home)).unwrap(), PathBuf::from("/abs/config"));
        assert_eq!(expand_home("~other/config", Some(home)).unwrap(), PathBuf::from("~other/config"));
        assert_eq!(expand_home("~", Some(home)).unwrap(), PathBuf::from("/home/dev"));
    }
}
