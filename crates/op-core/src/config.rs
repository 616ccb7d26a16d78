//! Environment configuration
//!
//! op-ofctl reads its settings from process environment variables. An
//! optional `KEY=VALUE` file can seed them; values already present in the
//! environment always win over the file.
//!
//! ```rust,no_run
//! use op_core::config::{get_config, load_environment};
//!
//! load_environment();
//! let protocols = get_config("OFCTL_PROTOCOLS", "any");
//! ```

use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Environment variable naming an explicit environment file
pub const ENV_FILE_VAR: &str = "OP_OFCTL_ENV_FILE";

/// Files checked when `OP_OFCTL_ENV_FILE` is unset or unreadable, in order
pub const ENV_FILE_PATHS: &[&str] = &["/etc/op-ofctl/environment", ".env"];

/// Seed the process environment from the first environment file found.
///
/// Returns the path that was loaded.
pub fn load_environment() -> Option<String> {
    let explicit = std::env::var(ENV_FILE_VAR).ok();
    let loaded = explicit
        .iter()
        .map(String::as_str)
        .chain(ENV_FILE_PATHS.iter().copied())
        .find_map(apply_env_file);

    if loaded.is_none() {
        debug!("No environment file found, using process environment only");
    }
    loaded
}

fn apply_env_file(path: &str) -> Option<String> {
    if !Path::new(path).is_file() {
        return None;
    }

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Failed to read environment file {}: {}", path, e);
            return None;
        }
    };

    let mut applied = 0usize;
    for (key, value) in content.lines().filter_map(parse_env_line) {
        if std::env::var_os(&key).is_some() {
            debug!("Keeping {} from process environment", key);
            continue;
        }
        std::env::set_var(&key, &value);
        applied += 1;
    }

    info!("Applied {} setting(s) from {}", applied, path);
    Some(path.to_string())
}

/// Parse `KEY=VALUE`, `KEY="VALUE"` or `KEY='VALUE'`. Blank lines and
/// `#` comments yield None.
fn parse_env_line(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }

    let value = value.trim();
    let unquoted = ['"', '\'']
        .iter()
        .find_map(|q| value.strip_prefix(*q).and_then(|v| v.strip_suffix(*q)))
        .unwrap_or(value);

    Some((key.to_string(), unquoted.to_string()))
}

/// String setting with a default
pub fn get_config(key: &str, default: &str) -> String {
    get_config_opt(key).unwrap_or_else(|| default.to_string())
}

/// Setting that is unset or empty yields None
pub fn get_config_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

pub fn get_config_bool(key: &str, default: bool) -> bool {
    get_config_opt(key)
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "on"))
        .unwrap_or(default)
}

/// Integer setting; unparsable values fall back to the default
pub fn get_config_int(key: &str, default: i64) -> i64 {
    get_config_opt(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
