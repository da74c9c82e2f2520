//! Credential store for the single opaque Canvas API token.
//!
//! The token is read from `$COURSEVAULT_TOKEN` first, then from
//! `~/.coursevault/token` (mode 0600).

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{io_err, ConfigError};
use crate::settings::{config_dir_at, ensure_config_dir_at, home, set_file_permissions};

/// Environment variable that overrides the stored token.
pub const TOKEN_ENV: &str = "COURSEVAULT_TOKEN";

/// `<home>/.coursevault/token`: pure, no I/O.
pub fn token_path_at(home: &Path) -> PathBuf {
    config_dir_at(home).join("token")
}

/// Read the stored token, ignoring the environment.
pub fn read_token_file_at(home: &Path) -> Result<Option<String>, ConfigError> {
    let path = token_path_at(home);
    match std::fs::read_to_string(&path) {
        Ok(contents) => {
            let token = contents.trim();
            Ok((!token.is_empty()).then(|| token.to_string()))
        }
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(io_err(path, err)),
    }
}

fn resolve_token_at(home: &Path, env_value: Option<String>) -> Result<Option<String>, ConfigError> {
    if let Some(token) = env_value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        return Ok(Some(token));
    }
    read_token_file_at(home)
}

/// Token from the environment or the token file, if any.
pub fn get_token_at(home: &Path) -> Result<Option<String>, ConfigError> {
    resolve_token_at(home, std::env::var(TOKEN_ENV).ok())
}

/// Token that must be present; absence is a fatal configuration error.
pub fn require_token_at(home: &Path) -> Result<String, ConfigError> {
    get_token_at(home)?.ok_or(ConfigError::MissingToken { env: TOKEN_ENV })
}

/// `require_token_at` convenience wrapper.
pub fn require_token() -> Result<String, ConfigError> {
    require_token_at(&home()?)
}

/// Store the token atomically with owner-only permissions.
pub fn set_token_at(home: &Path, token: &str) -> Result<(), ConfigError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(ConfigError::InvalidValue {
            key: "token".to_string(),
            value: String::new(),
            reason: "token must not be empty".to_string(),
        });
    }
    ensure_config_dir_at(home)?;
    let path = token_path_at(home);
    let tmp = path.with_file_name("token.tmp");
    std::fs::write(&tmp, token).map_err(|e| io_err(&tmp, e))?;
    set_file_permissions(&tmp)?;
    std::fs::rename(&tmp, &path).map_err(|e| io_err(&path, e))?;
    Ok(())
}

/// `set_token_at` convenience wrapper.
pub fn set_token(token: &str) -> Result<(), ConfigError> {
    set_token_at(&home()?, token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_token_file_is_none() {
        let home = TempDir::new().expect("home");
        assert_eq!(read_token_file_at(home.path()).expect("read"), None);
        assert_eq!(resolve_token_at(home.path(), None).expect("resolve"), None);
    }

    #[test]
    fn set_then_read_trims() {
        let home = TempDir::new().expect("home");
        set_token_at(home.path(), "  abc123\n").expect("set");
        assert_eq!(
            read_token_file_at(home.path()).expect("read").as_deref(),
            Some("abc123")
        );
    }

    #[test]
    fn environment_value_wins_over_file() {
        let home = TempDir::new().expect("home");
        set_token_at(home.path(), "from-file").expect("set");
        let token = resolve_token_at(home.path(), Some("from-env".to_string())).expect("resolve");
        assert_eq!(token.as_deref(), Some("from-env"));

        let blank_env = resolve_token_at(home.path(), Some("  ".to_string())).expect("resolve");
        assert_eq!(blank_env.as_deref(), Some("from-file"));
    }

    #[test]
    fn empty_token_rejected() {
        let home = TempDir::new().expect("home");
        assert!(matches!(
            set_token_at(home.path(), "   "),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn missing_token_message_names_env_var() {
        let err = ConfigError::MissingToken { env: TOKEN_ENV };
        assert!(err.to_string().contains(TOKEN_ENV));
    }
}
