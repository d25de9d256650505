//! Init command implementation

use anyhow::{Result, bail};
use std::path::{Path, PathBuf};

use panewarden::config::{Config, PROJECT_CONFIG, write_config_file};

/// Default configuration content for panewarden init
pub const DEFAULT_CONFIG: &str = r#"# panewarden configuration
#
# Every key is optional; the values below are the defaults.

# ============================================================================
# POLLER - reads session output and reports prompts and responses
# ============================================================================
[poller]
# Pause between poll cycles
interval_ms = 2000
# Lines of scrollback captured per cycle
capture_lines = 10000
# Upper bound for one capture made on behalf of a request
capture_timeout_ms = 5000

# ============================================================================
# AUTO-YES - answers prompts automatically for a bounded window
# ============================================================================
[auto_yes]
interval_ms = 2000
# Pause after sending an answer
cooldown_ms = 5000
# Ceiling for the backoff after failed cycles
max_backoff_ms = 60000
# Window used when none is given: 3600000 (1h), 10800000 (3h) or 28800000 (8h)
default_duration_ms = 3600000

# ============================================================================
# PASTE - clears "[Pasted text ...]" placeholders left by multi-line input
# ============================================================================
[paste]
delay_ms = 500
max_retries = 3
check_lines = 10

# ============================================================================
# TMUX
# ============================================================================
[tmux]
binary = "tmux"
# Sessions are named <prefix>-<tool>-<session id>
session_prefix = "pw"
"#;

/// Write the default config, to `config_path` when given, else the project
/// config under `work_dir` (or the user config with `global`).
pub fn init_command(
    work_dir: &Path,
    config_path: Option<PathBuf>,
    force: bool,
    global: bool,
) -> Result<()> {
    let config_path = config_path.unwrap_or_else(|| {
        if global {
            Config::global_config_path()
        } else {
            work_dir.join(PROJECT_CONFIG)
        }
    });

    if config_path.exists() && !force {
        bail!(
            "Configuration already exists: {}\nUse --force to overwrite.",
            config_path.display()
        );
    }

    write_config_file(&config_path, DEFAULT_CONFIG)?;
    println!("Created: {}", config_path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_defaults() {
        let parsed: Config = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempfile::TempDir::new().unwrap();
        init_command(dir.path(), None, false, false).unwrap();
        assert!(dir.path().join(PROJECT_CONFIG).exists());
        assert!(init_command(dir.path(), None, false, false).is_err());
        assert!(init_command(dir.path(), None, true, false).is_ok());
    }

    #[test]
    fn test_init_writes_loadable_config() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("custom/panewarden.toml");
        init_command(dir.path(), Some(path.clone()), false, false).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), DEFAULT_CONFIG);
        assert_eq!(Config::from_file(&path).unwrap(), Config::default());
        assert!(!path.with_extension("toml.tmp").exists());
    }
}
