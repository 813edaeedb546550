//! Path resolution for patchctl
//!
//! # Environment Variables
//!
//! - `PATCHCTL_CONFIG_DIR` - Override config directory (e.g., `~/dotfiles/patchctl`)
//!
//! # Path Resolution Priority
//!
//! For config_dir():
//! 1. `PATCHCTL_CONFIG_DIR` environment variable
//! 2. `XDG_CONFIG_HOME/patchctl` (if set)
//! 3. Platform default:
//!    - Windows: `%APPDATA%\patchctl`
//!    - macOS/Linux: `~/.config/patchctl`

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Environment variable for config directory override
pub const ENV_CONFIG_DIR: &str = "PATCHCTL_CONFIG_DIR";

/// Settings file name inside the config directory
pub const CONFIG_FILE: &str = "config.toml";

/// Get the patchctl config directory path
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = expand(&dir);
        log::debug!(
            "Using config dir from {}: {}",
            ENV_CONFIG_DIR,
            path.display()
        );
        return Ok(path);
    }

    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        let path = PathBuf::from(xdg_config).join("patchctl");
        log::debug!("Using XDG_CONFIG_HOME: {}", path.display());
        return Ok(path);
    }

    #[cfg(windows)]
    {
        if let Some(app_data) = dirs::config_dir() {
            let path = app_data.join("patchctl");
            log::debug!("Using Windows config dir: {}", path.display());
            return Ok(path);
        }
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    let path = home.join(".config").join("patchctl");
    log::debug!("Using default config dir: {}", path.display());
    Ok(path)
}

/// Default settings file location
pub fn config_file() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE))
}

/// Expand ~ and environment variables in a path string.
///
/// Unknown variables are left as written.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    /// Run `f` with `key` set to `value`, restoring the previous value.
    ///
    /// # Safety
    /// Mutates the process environment; only for tests that do not race on
    /// the same variable.
    fn with_env_var<F, R>(key: &str, value: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let original = env::var(key).ok();
        // SAFETY: no other test reads or writes this variable concurrently
        unsafe { env::set_var(key, value) };
        let result = f();
        match original {
            // SAFETY: as above
            Some(v) => unsafe { env::set_var(key, v) },
            None => unsafe { env::remove_var(key) },
        }
        result
    }

    fn without_env_var<F, R>(key: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let original = env::var(key).ok();
        // SAFETY: no other test reads or writes this variable concurrently
        unsafe { env::remove_var(key) };
        let result = f();
        if let Some(v) = original {
            // SAFETY: as above
            unsafe { env::set_var(key, v) };
        }
        result
    }

    // Every case touches PATCHCTL_CONFIG_DIR, so they run in one test
    #[test]
    fn test_config_dir_resolution() {
        with_env_var(ENV_CONFIG_DIR, "/custom/patchctl", || {
            assert_eq!(config_dir().unwrap(), PathBuf::from("/custom/patchctl"));
            assert_eq!(
                config_file().unwrap(),
                PathBuf::from("/custom/patchctl/config.toml")
            );
        });

        let home = dirs::home_dir().unwrap();
        with_env_var(ENV_CONFIG_DIR, "~/dotfiles/patchctl-tilde-test", || {
            assert_eq!(
                config_dir().unwrap(),
                home.join("dotfiles").join("patchctl-tilde-test")
            );
        });

        if cfg!(unix) {
            without_env_var(ENV_CONFIG_DIR, || {
                with_env_var("XDG_CONFIG_HOME", "/tmp/xdg-patchctl-test", || {
                    assert_eq!(
                        config_dir().unwrap(),
                        PathBuf::from("/tmp/xdg-patchctl-test/patchctl")
                    );
                });
            });
        }
    }

    #[test]
    fn test_expand_with_tilde() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(expand("~/test/path"), home.join("test").join("path"));
    }

    #[test]
    fn test_expand_unknown_env_var_unchanged() {
        assert_eq!(
            expand("/path/$NONEXISTENT_PATCHCTL_VAR/file"),
            PathBuf::from("/path/$NONEXISTENT_PATCHCTL_VAR/file")
        );
    }
}
