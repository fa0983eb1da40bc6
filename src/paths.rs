//! Centralized path resolution for ivanti-agent
//!
//! # Environment Variables
//!
//! - `IVANTI_AGENT_CONFIG` - Path to the config file
//!
//! # Config File Resolution Priority
//!
//! 1. `--config` on the command line
//! 2. `IVANTI_AGENT_CONFIG` environment variable
//! 3. `/etc/ivanti-agent/config.toml`
//! 4. `<user config dir>/ivanti-agent/config.toml` (e.g. `~/.config`)
//!
//! An explicit path (1 or 2) must exist. The fallbacks are only used when
//! present; without any file the built-in defaults apply.

use anyhow::{Result, bail};
use std::path::{Path, PathBuf};

/// Environment variable for config file override
pub const ENV_CONFIG: &str = "IVANTI_AGENT_CONFIG";

/// System-wide config file
pub const SYSTEM_CONFIG: &str = "/etc/ivanti-agent/config.toml";

const APP_DIR: &str = "ivanti-agent";
const CONFIG_FILE: &str = "config.toml";

/// Expand ~ and environment variables in a path
pub fn expand_path(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| shellexpand::tilde(path).into_owned());
    PathBuf::from(expanded)
}

/// Per-user config file location
pub fn user_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

/// Resolve the config file to load, if any
pub fn config_file(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    let env = std::env::var(ENV_CONFIG).ok().filter(|v| !v.is_empty());
    resolve_config_file(explicit, env.as_deref(), &candidates())
}

fn candidates() -> Vec<PathBuf> {
    std::iter::once(PathBuf::from(SYSTEM_CONFIG))
        .chain(user_config_file())
        .collect()
}

fn resolve_config_file(
    explicit: Option<&Path>,
    env: Option<&str>,
    candidates: &[PathBuf],
) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        let path = expand_path(&path.to_string_lossy());
        if !path.exists() {
            bail!("Config file not found: {}", path.display());
        }
        log::debug!("Using config from --config: {}", path.display());
        return Ok(Some(path));
    }

    if let Some(value) = env {
        let path = expand_path(value);
        if !path.exists() {
            bail!("Config file from {} not found: {}", ENV_CONFIG, path.display());
        }
        log::debug!("Using config from {}: {}", ENV_CONFIG, path.display());
        return Ok(Some(path));
    }

    let found = candidates.iter().find(|p| p.exists()).cloned();
    match &found {
        Some(path) => log::debug!("Using config: {}", path.display()),
        None => log::debug!("No config file found, using defaults"),
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_explicit_wins() {
        let dir = TempDir::new().unwrap();
        let explicit = dir.path().join("a.toml");
        let env = dir.path().join("b.toml");
        std::fs::write(&explicit, "").unwrap();
        std::fs::write(&env, "").unwrap();

        let found = resolve_config_file(
            Some(&explicit),
            Some(&env.to_string_lossy()),
            &[],
        )
        .unwrap();
        assert_eq!(found, Some(explicit));
    }

    #[test]
    fn test_env_before_candidates() {
        let dir = TempDir::new().unwrap();
        let env = dir.path().join("env.toml");
        let system = dir.path().join("system.toml");
        std::fs::write(&env, "").unwrap();
        std::fs::write(&system, "").unwrap();

        let found = resolve_config_file(None, Some(&env.to_string_lossy()), &[system]).unwrap();
        assert_eq!(found, Some(env));
    }

    #[test]
    fn test_first_existing_candidate() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.toml");
        let user = dir.path().join("user.toml");
        std::fs::write(&user, "").unwrap();

        let found = resolve_config_file(None, None, &[missing, user.clone()]).unwrap();
        assert_eq!(found, Some(user));
    }

    #[test]
    fn test_no_config_is_fine() {
        let dir = TempDir::new().unwrap();
        let found = resolve_config_file(None, None, &[dir.path().join("nope.toml")]).unwrap();
        assert_eq!(found, None);
    }

    #[test]
    fn test_missing_explicit_is_an_error() {
        let err = resolve_config_file(Some(Path::new("/nonexistent/x.toml")), None, &[]);
        assert!(err.is_err());
    }

    #[test]
    fn test_expand_path_tilde() {
        let expanded = expand_path("~/x.toml");
        assert!(!expanded.to_string_lossy().starts_with('~'));
    }
}
