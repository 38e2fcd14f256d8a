//! One-time hardening of the local credential directory.
//!
//! Creates `~/.clustrix/credentials`, restricts it to its owner, and makes
//! sure the project's `.gitignore` keeps credential files out of version
//! control. Running it again changes nothing.

use crate::{BrokerError, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// State directory created under the home directory.
pub const STATE_DIR_NAME: &str = ".clustrix";

/// Credentials subdirectory of the state directory.
pub const CREDENTIALS_DIR_NAME: &str = "credentials";

/// Ignore file patched in the working directory.
pub const IGNORE_FILE_NAME: &str = ".gitignore";

/// Marker line; its presence means the ignore file was already patched.
pub const IGNORE_SENTINEL: &str = "# Clustrix credentials - never commit these";

const IGNORE_PATTERNS: &[&str] = &[
    ".clustrix/",
    "credentials/",
    "*.pem",
    "*.key",
    "*-credentials.json",
    "*-service-account.json",
    ".env.validation",
    ".env.*.validation",
];

/// Hardens a state directory under `home` and the ignore file in `workdir`.
#[derive(Debug, Clone)]
pub struct EnvironmentHardener {
    home: PathBuf,
    workdir: PathBuf,
}

impl EnvironmentHardener {
    /// Uses the user's home directory and the process working directory.
    ///
    /// # Errors
    ///
    /// - [`BrokerError::HomeDirNotFound`] if no home directory is known
    /// - [`BrokerError::Io`] if the working directory cannot be read
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir().ok_or(BrokerError::HomeDirNotFound)?;
        let workdir = std::env::current_dir()?;
        Ok(Self::with_paths(home, workdir))
    }

    /// Uses explicit home and working directories.
    pub fn with_paths(home: impl Into<PathBuf>, workdir: impl Into<PathBuf>) -> Self {
        Self {
            home: home.into(),
            workdir: workdir.into(),
        }
    }

    /// Path of the credentials directory.
    pub fn credentials_dir(&self) -> PathBuf {
        self.home.join(STATE_DIR_NAME).join(CREDENTIALS_DIR_NAME)
    }

    /// Creates and restricts the credentials directory and patches the
    /// ignore file if present. Returns the credentials directory.
    ///
    /// Failing to restrict permissions is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::Io`] if a directory cannot be created or the
    /// ignore file cannot be read or appended to.
    pub async fn ensure(&self) -> Result<PathBuf> {
        let credentials_dir = self.credentials_dir();
        fs::create_dir_all(&credentials_dir).await?;
        restrict_permissions(&credentials_dir).await;

        let ignore_file = self.workdir.join(IGNORE_FILE_NAME);
        if fs::try_exists(&ignore_file).await? {
            patch_ignore_file(&ignore_file).await?;
        }

        Ok(credentials_dir)
    }
}

/// Hardens the default locations; see [`EnvironmentHardener::ensure`].
pub async fn ensure_secure_environment() -> Result<PathBuf> {
    EnvironmentHardener::new()?.ensure().await
}

async fn patch_ignore_file(path: &Path) -> Result<()> {
    // Ignore files are not required to be UTF-8.
    let raw = fs::read(path).await?;
    let existing = String::from_utf8_lossy(&raw);
    if existing.lines().any(|line| line.trim() == IGNORE_SENTINEL) {
        debug!(path = %path.display(), "Ignore file already patched");
        return Ok(());
    }

    let mut block = String::new();
    if !existing.is_empty() && !existing.ends_with('\n') {
        block.push('\n');
    }
    block.push('\n');
    block.push_str(IGNORE_SENTINEL);
    block.push('\n');
    for pattern in IGNORE_PATTERNS {
        block.push_str(pattern);
        block.push('\n');
    }

    let mut file = fs::OpenOptions::new().append(true).open(path).await?;
    file.write_all(block.as_bytes()).await?;
    file.flush().await?;

    debug!(path = %path.display(), "Added credential patterns to ignore file");
    Ok(())
}

#[cfg(unix)]
async fn restrict_permissions(dir: &Path) {
    use std::os::unix::fs::PermissionsExt;

    let perms = std::fs::Permissions::from_mode(0o700);
    if let Err(e) = fs::set_permissions(dir, perms).await {
        debug!(path = %dir.display(), error = %e, "Could not restrict credentials directory");
    }
}

#[cfg(not(unix))]
async fn restrict_permissions(_dir: &Path) {}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_creates_directories() {
        let home = tempdir().unwrap();
        let work = tempdir().unwrap();
        let hardener = EnvironmentHardener::with_paths(home.path(), work.path());

        let dir = hardener.ensure().await.unwrap();

        assert_eq!(dir, home.path().join(".clustrix").join("credentials"));
        assert!(dir.is_dir());
        // No ignore file in the working directory: none is created.
        assert!(!work.path().join(".gitignore").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_restricts_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let home = tempdir().unwrap();
        let work = tempdir().unwrap();
        let dir = EnvironmentHardener::with_paths(home.path(), work.path())
            .ensure()
            .await
            .unwrap();

        let mode = std::fs::metadata(&dir).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
    }

    #[tokio::test]
    async fn test_patches_ignore_file_once() {
        let home = tempdir().unwrap();
        let work = tempdir().unwrap();
        let ignore = work.path().join(".gitignore");
        std::fs::write(&ignore, "target/").unwrap();
        let hardener = EnvironmentHardener::with_paths(home.path(), work.path());

        hardener.ensure().await.unwrap();
        let patched = std::fs::read_to_string(&ignore).unwrap();

        assert!(patched.starts_with("target/\n\n# Clustrix credentials - never commit these\n"));
        assert!(patched.contains("\n*-service-account.json\n"));
        assert!(patched.ends_with(".env.*.validation\n"));

        hardener.ensure().await.unwrap();
        assert_eq!(std::fs::read_to_string(&ignore).unwrap(), patched);
    }

    #[tokio::test]
    async fn test_existing_sentinel_is_respected() {
        let home = tempdir().unwrap();
        let work = tempdir().unwrap();
        let ignore = work.path().join(".gitignore");
        let original = format!("*.log\n  {}\n.clustrix/\n", IGNORE_SENTINEL);
        std::fs::write(&ignore, &original).unwrap();

        EnvironmentHardener::with_paths(home.path(), work.path())
            .ensure()
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(&ignore).unwrap(), original);
    }

    #[tokio::test]
    async fn test_empty_ignore_file() {
        let home = tempdir().unwrap();
        let work = tempdir().unwrap();
        let ignore = work.path().join(".gitignore");
        std::fs::write(&ignore, "").unwrap();

        EnvironmentHardener::with_paths(home.path(), work.path())
            .ensure()
            .await
            .unwrap();

        let patched = std::fs::read_to_string(&ignore).unwrap();
        assert!(patched.starts_with("\n# Clustrix credentials"));
    }

    #[tokio::test]
    async fn test_non_utf8_ignore_file() {
        let home = tempdir().unwrap();
        let work = tempdir().unwrap();
        let ignore = work.path().join(".gitignore");
        std::fs::write(&ignore, b"# caf\xe9\ntarget/\n").unwrap();
        let hardener = EnvironmentHardener::with_paths(home.path(), work.path());

        let dir = hardener.ensure().await.unwrap();

        let patched = std::fs::read(&ignore).unwrap();
        assert!(patched.starts_with(b"# caf\xe9\ntarget/\n\n# Clustrix credentials"));
        assert!(patched.ends_with(b".env.*.validation\n"));

        hardener.ensure().await.unwrap();
        assert_eq!(std::fs::read(&ignore).unwrap(), patched);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&dir).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o700);
        }
        #[cfg(not(unix))]
        assert!(dir.is_dir());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_permissions_restricted_when_ignore_file_unreadable() {
        use std::os::unix::fs::PermissionsExt;

        let home = tempdir().unwrap();
        let work = tempdir().unwrap();
        // A directory in place of the ignore file cannot be read.
        std::fs::create_dir(work.path().join(".gitignore")).unwrap();
        let hardener = EnvironmentHardener::with_paths(home.path(), work.path());

        assert!(hardener.ensure().await.is_err());

        let mode = std::fs::metadata(hardener.credentials_dir())
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o700);
    }
}
