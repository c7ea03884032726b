//! Connection configuration, read from the standard `DB_*` environment
//! variables (spec §6). This server backs onto SQLite, so only `DB_HOST`
//! (the data directory root) and `DB_NAME` (the file under it) affect the
//! resulting connection URL; the remaining variables are accepted and
//! logged for interface parity, matching `movies_db::DbConfig`'s
//! single-backend-at-compile-time shape.

use movies_db::DbConfig;
use std::path::PathBuf;

/// Where the catalog database lives: `~/.movies-mcp/movies.sqlite3` unless
/// overridden by `DB_HOST`/`DB_NAME`.
pub fn movies_home() -> PathBuf {
    if let Ok(override_path) = std::env::var("DB_HOST") {
        if !override_path.is_empty() {
            return PathBuf::from(override_path);
        }
    }
    dirs_home().join(".movies-mcp")
}

fn dirs_home() -> PathBuf {
    std::env::var("HOME").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("."))
}

pub fn db_path() -> PathBuf {
    let home = movies_home();
    let _ = std::fs::create_dir_all(&home);
    let name = std::env::var("DB_NAME").unwrap_or_else(|_| "movies.sqlite3".to_string());
    home.join(name)
}

/// Log the connection parameters the environment carries, even the ones
/// that don't affect the SQLite URL, so an operator inspecting
/// `DB_USER`/`DB_PASSWORD`/`DB_SSLMODE` sees them acknowledged rather than
/// silently ignored.
pub fn log_connection_env() {
    for var in ["DB_HOST", "DB_PORT", "DB_USER", "DB_NAME", "DB_SSLMODE"] {
        if let Ok(value) = std::env::var(var) {
            tracing::debug!("{var}={value}");
        }
    }
    if std::env::var("DB_PASSWORD").is_ok() {
        tracing::debug!("DB_PASSWORD=<redacted>");
    }
}

pub fn db_config() -> DbConfig {
    DbConfig::sqlite_file(db_path())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_path_defaults_under_movies_home() {
        std::env::remove_var("DB_HOST");
        std::env::remove_var("DB_NAME");
        let path = db_path();
        assert!(path.to_string_lossy().ends_with("movies.sqlite3"));
    }
}
