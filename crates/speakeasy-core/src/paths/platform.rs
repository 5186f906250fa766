//! Platform-specific path detection and resolution.

use std::env;
use std::fs;
use std::path::PathBuf;

use super::error::PathError;

/// Environment variable that overrides the data root.
pub(super) const DATA_DIR_ENV: &str = "SPEAKEASY_DATA_DIR";

/// Get the root directory for application data.
///
/// Resolution order:
/// 1. `SPEAKEASY_DATA_DIR` environment variable (highest priority)
/// 2. System data directory (e.g., `~/.local/share/speakeasy`)
pub fn data_root() -> Result<PathBuf, PathError> {
    if let Ok(path) = env::var(DATA_DIR_ENV) {
        if !path.trim().is_empty() {
            return normalize_user_path(&path);
        }
    }

    let data_dir = dirs::data_local_dir().ok_or(PathError::NoDataDir)?;
    let root = data_dir.join("speakeasy");

    if !root.exists() {
        fs::create_dir_all(&root).map_err(|e| PathError::CreateFailed {
            path: root.clone(),
            reason: e.to_string(),
        })?;
        tracing::debug!(path = %root.display(), "Created data root");
    }

    Ok(root)
}

/// Normalize a user-provided path, expanding `~` and making it absolute.
pub(super) fn normalize_user_path(raw: &str) -> Result<PathBuf, PathError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PathError::EmptyPath);
    }

    let expanded = if trimmed.starts_with("~/") || trimmed == "~" {
        let home = dirs::home_dir().ok_or(PathError::NoHomeDir)?;
        if trimmed == "~" {
            home
        } else {
            home.join(trimmed.trim_start_matches("~/"))
        }
    } else {
        PathBuf::from(trimmed)
    };

    if expanded.is_absolute() {
        Ok(expanded)
    } else {
        env::current_dir()
            .map(|cwd| cwd.join(expanded))
            .map_err(|e| PathError::CurrentDirError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_rejects_empty() {
        assert!(matches!(
            normalize_user_path("   "),
            Err(PathError::EmptyPath)
        ));
    }

    #[test]
    fn test_normalize_keeps_absolute() {
        let path = normalize_user_path("/tmp/speakeasy-models").unwrap();
        assert_eq!(path, PathBuf::from("/tmp/speakeasy-models"));
    }

    #[test]
    fn test_normalize_makes_relative_absolute() {
        let path = normalize_user_path("voices").unwrap();
        assert!(path.is_absolute());
        assert!(path.ends_with("voices"));
    }

    #[test]
    fn test_normalize_expands_home() {
        if let Some(home) = dirs::home_dir() {
            let path = normalize_user_path("~/voices").unwrap();
            assert_eq!(path, home.join("voices"));
        }
    }
}
