//! OS-specific locations for persisted Docdex data.
//!
//! [`config_directory`] is pure apart from environment inspection; it never
//! touches the filesystem. Callers create the directory on first use via
//! [`ensure_directory`].

use std::env;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Resolve the OS-specific configuration directory for `app_name`.
///
/// Resolution order per platform:
/// - Windows: `%APPDATA%\<App>\<App>`, falling back to the home directory.
/// - macOS: `~/Library/Application Support/<App>`.
/// - Otherwise: `$XDG_CONFIG_HOME/<app>` (lowercased), falling back to
///   `~/.config/<app>`.
///
/// Always returns a path; it is the caller's job to create it.
pub fn config_directory(app_name: &str) -> PathBuf {
    if cfg!(target_os = "windows") {
        let base = env::var_os("APPDATA")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(home_dir);
        base.join(app_name).join(app_name)
    } else if cfg!(target_os = "macos") {
        home_dir()
            .join("Library")
            .join("Application Support")
            .join(app_name)
    } else {
        let base = env::var_os("XDG_CONFIG_HOME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| home_dir().join(".config"));
        base.join(app_name.to_lowercase())
    }
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// Create `path` and any missing ancestors. Idempotent; fails if `path`
/// exists as a non-directory entry.
pub fn ensure_directory(path: &Path) -> Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    std::fs::create_dir_all(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_directory_is_app_specific() {
        let a = config_directory("DocDex");
        let b = config_directory("OtherTool");
        assert_ne!(a, b);
        assert!(!a.as_os_str().is_empty());
    }

    #[test]
    #[cfg(all(unix, not(target_os = "macos")))]
    fn test_config_directory_lowercases_on_xdg() {
        let path = config_directory("DocDex");
        assert_eq!(
            path.file_name().and_then(|n| n.to_str()),
            Some("docdex")
        );
    }

    #[test]
    #[cfg(target_os = "macos")]
    fn test_config_directory_uses_application_support() {
        let path = config_directory("DocDex");
        let rendered = path.to_string_lossy();
        assert!(rendered.contains("Application Support"));
        assert!(rendered.ends_with("DocDex"));
    }

    #[test]
    fn test_ensure_directory_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a").join("b").join("c");

        ensure_directory(&nested).unwrap();
        assert!(nested.is_dir());

        // Second call is a no-op.
        ensure_directory(&nested).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn test_ensure_directory_conflicting_file() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let result = ensure_directory(&blocker);
        assert!(result.is_err());
    }
}
