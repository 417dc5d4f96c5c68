//! # Model File I/O
//!
//! Model files often live on shared drives and are opened by several
//! engineers. Saves go through a synced `.tmp` sibling and a rename, and a
//! writer holds a [`FileLock`]: an fs2 lock on `<name>.MDL.lock` whose JSON
//! body names the holder.
//!
//! ## Example
//!
//! ```rust,no_run
//! use mdl_core::file_io::{load_model, save_model, FileLock};
//! use std::path::Path;
//!
//! let path = Path::new("TOWER_v1_0.MDL");
//! let lock = FileLock::acquire(path, "engineer@company.com")?;
//! let model = load_model(path)?;
//! save_model(&model, path)?;
//! drop(lock);
//! # Ok::<(), mdl_core::errors::ModelError>(())
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::{ModelError, ModelResult};
use crate::model_file::ModelFile;

/// Hours after which a lock is ignored even if its owner may be alive.
pub const STALE_LOCK_HOURS: i64 = 24;

/// Who holds a model open, as written into the `.lock` sidecar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    pub user_id: String,
    pub machine: String,
    pub pid: u32,
    pub locked_at: DateTime<Utc>,
}

impl LockInfo {
    pub fn new(user_id: impl Into<String>) -> Self {
        LockInfo {
            user_id: user_id.into(),
            machine: machine_name().unwrap_or_else(|| "unknown".to_string()),
            pid: std::process::id(),
            locked_at: Utc::now(),
        }
    }

    /// `user (machine)`, as shown in `FileLocked` errors and CLI warnings.
    pub fn holder(&self) -> String {
        format!("{} ({})", self.user_id, self.machine)
    }

    /// A lock is stale when its owner process is gone from this machine or
    /// when it is older than [`STALE_LOCK_HOURS`].
    pub fn is_stale_at(&self, now: DateTime<Utc>) -> bool {
        let local = machine_name().is_some_and(|name| name == self.machine);
        if local && owner_alive(self.pid) == Some(false) {
            return true;
        }
        (now - self.locked_at).num_hours() > STALE_LOCK_HOURS
    }

    fn read(lock_path: &Path) -> ModelResult<Self> {
        let contents = fs::read_to_string(lock_path).map_err(io_error("read lock", lock_path))?;
        Ok(serde_json::from_str(&contents)?)
    }
}

fn machine_name() -> Option<String> {
    let vars: &[&str] = if cfg!(windows) { &["COMPUTERNAME"] } else { &["HOSTNAME", "HOST"] };
    vars.iter().find_map(|var| std::env::var(var).ok())
}

/// `None` when liveness cannot be determined on this platform.
fn owner_alive(pid: u32) -> Option<bool> {
    #[cfg(unix)]
    {
        Some(Path::new("/proc").join(pid.to_string()).exists())
    }
    #[cfg(windows)]
    {
        let output = std::process::Command::new("tasklist")
            .args(["/FI", &format!("PID eq {pid}"), "/NH"])
            .output()
            .ok()?;
        Some(String::from_utf8_lossy(&output.stdout).contains(&pid.to_string()))
    }
    #[cfg(not(any(unix, windows)))]
    {
        let _ = pid;
        None
    }
}

/// `map_err` adapter turning an `io::Error` into `ModelError::FileError`.
fn io_error<'a>(operation: &'static str, path: &'a Path) -> impl FnOnce(std::io::Error) -> ModelError + 'a {
    move |err| ModelError::file_error(operation, path.display().to_string(), err.to_string())
}

/// Exclusive hold on a model file while it is being written.
///
/// The OS lock (fs2) sits on a `<model>.lock` sidecar whose body is the
/// holder's [`LockInfo`]. Dropping the guard deletes the sidecar.
#[derive(Debug)]
pub struct FileLock {
    model_path: PathBuf,
    lock_path: PathBuf,
    _lock_file: File,
    pub info: LockInfo,
}

impl FileLock {
    /// Fails with `ModelError::FileLocked` while a live lock exists; stale
    /// sidecars are overwritten.
    pub fn acquire(path: &Path, user_id: impl Into<String>) -> ModelResult<Self> {
        let lock_path = lock_path_for(path);
        let info = LockInfo::new(user_id);

        if let Ok(existing) = LockInfo::read(&lock_path) {
            if !existing.is_stale_at(info.locked_at) {
                return Err(ModelError::file_locked(
                    path.display().to_string(),
                    existing.holder(),
                    existing.locked_at.to_rfc3339(),
                ));
            }
            warn!(path = %path.display(), holder = %existing.holder(), "overwriting stale model lock");
        }

        let mut lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&lock_path)
            .map_err(io_error("create lock", &lock_path))?;
        lock_file
            .try_lock_exclusive()
            .map_err(|_| ModelError::file_locked(path.display().to_string(), "another process", "unknown"))?;
        write_synced(&mut lock_file, serde_json::to_string_pretty(&info)?.as_bytes(), &lock_path)?;

        debug!(path = %path.display(), holder = %info.holder(), "model lock acquired");
        Ok(FileLock {
            model_path: path.to_path_buf(),
            lock_path,
            _lock_file: lock_file,
            info,
        })
    }

    /// Holder of a live lock on `path`, if any.
    pub fn check(path: &Path) -> Option<LockInfo> {
        LockInfo::read(&lock_path_for(path))
            .ok()
            .filter(|info| !info.is_stale_at(Utc::now()))
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}

/// `TOWER.MDL` -> `TOWER.MDL.lock`
fn lock_path_for(model_path: &Path) -> PathBuf {
    sibling_with_suffix(model_path, ".lock")
}

fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

fn write_synced(file: &mut File, bytes: &[u8], path: &Path) -> ModelResult<()> {
    file.write_all(bytes).map_err(io_error("write", path))?;
    file.sync_all().map_err(io_error("sync", path))
}

/// Replace `path` with `bytes` through a synced `.tmp` sibling and a rename,
/// so readers never see a half-written model.
fn write_atomic(path: &Path, bytes: &[u8]) -> ModelResult<()> {
    let tmp_path = sibling_with_suffix(path, ".tmp");
    let mut tmp_file = File::create(&tmp_path).map_err(io_error("create temp file", &tmp_path))?;
    write_synced(&mut tmp_file, bytes, &tmp_path)?;
    drop(tmp_file);

    fs::rename(&tmp_path, path).map_err(|err| {
        let _ = fs::remove_file(&tmp_path);
        io_error("replace", path)(err)
    })
}

/// Save a model file with atomic write semantics.
pub fn save_model(model: &ModelFile, path: &Path) -> ModelResult<()> {
    let bytes = model.to_bytes()?;
    write_atomic(path, &bytes)?;
    debug!(path = %path.display(), blocks = model.blocks.len(), "model saved");
    Ok(())
}

/// Load a model file.
pub fn load_model(path: &Path) -> ModelResult<ModelFile> {
    let bytes = fs::read(path).map_err(io_error("read", path))?;
    let model = ModelFile::from_bytes(&bytes);
    debug!(path = %path.display(), blocks = model.blocks.len(), "model loaded");
    Ok(model)
}

/// Load a model, also reporting whether another user holds its lock.
pub fn load_model_with_lock_check(path: &Path) -> ModelResult<(ModelFile, Option<LockInfo>)> {
    let model = load_model(path)?;
    Ok((model, FileLock::check(path)))
}

/// Save any serializable value (e.g. a transform report) as pretty JSON.
pub fn save_json<T: Serialize>(value: &T, path: &Path) -> ModelResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    write_atomic(path, json.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "*NODEXY*\n   1  0 0  0\n*ELSET*\n   1   1   1  1  1\n";

    #[test]
    fn test_lock_sidecar_path() {
        let lock_path = lock_path_for(Path::new("/path/to/TOWER.MDL"));
        assert_eq!(lock_path, Path::new("/path/to/TOWER.MDL.lock"));
    }

    #[test]
    fn test_lock_info_names_this_process() {
        let info = LockInfo::new("test@example.com");
        assert_eq!(info.user_id, "test@example.com");
        assert!(info.pid > 0);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roundtrip.MDL");

        let model = ModelFile::parse(SAMPLE);
        save_model(&model, &path).unwrap();

        let loaded = load_model(&path).unwrap();
        assert_eq!(loaded, model);
        assert_eq!(fs::read_to_string(&path).unwrap(), SAMPLE);
    }

    #[test]
    fn test_atomic_save_creates_no_tmp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("atomic.MDL");

        save_model(&ModelFile::parse(SAMPLE), &path).unwrap();

        assert!(!dir.path().join("atomic.MDL.tmp").exists());
        assert!(path.exists());
    }

    #[test]
    fn test_file_lock_acquire_and_release() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("locked.MDL");
        File::create(&path).unwrap();

        let lock = FileLock::acquire(&path, "test@example.com").unwrap();
        assert_eq!(lock.info.user_id, "test@example.com");
        assert_eq!(lock.model_path(), path.as_path());

        let lock_path = lock_path_for(&path);
        assert!(lock_path.exists());

        drop(lock);
        assert!(!lock_path.exists());
    }

    #[test]
    fn test_live_lock_blocks_and_stale_lock_is_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shared.MDL");
        File::create(&path).unwrap();

        let mut info = LockInfo::new("first@example.com");
        info.machine = "elsewhere".to_string();
        fs::write(lock_path_for(&path), serde_json::to_string(&info).unwrap()).unwrap();

        let err = FileLock::acquire(&path, "second@example.com").unwrap_err();
        assert_eq!(err.error_code(), "FILE_LOCKED");
        assert_eq!(FileLock::check(&path).unwrap().user_id, "first@example.com");

        info.locked_at = Utc::now() - chrono::Duration::hours(STALE_LOCK_HOURS + 1);
        fs::write(lock_path_for(&path), serde_json::to_string(&info).unwrap()).unwrap();
        assert!(FileLock::check(&path).is_none());
        let lock = FileLock::acquire(&path, "second@example.com").unwrap();
        assert_eq!(lock.info.user_id, "second@example.com");
    }

    #[test]
    fn test_old_lock_is_stale() {
        let mut info = LockInfo::new("someone");
        info.machine = "elsewhere".to_string();
        info.locked_at = Utc::now() - chrono::Duration::hours(30);
        assert!(info.is_stale_at(Utc::now()));

        info.locked_at = Utc::now();
        assert!(!info.is_stale_at(Utc::now()));
        assert_eq!(info.holder(), "someone (elsewhere)");
    }

    #[test]
    fn test_load_with_lock_check() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("check.MDL");
        save_model(&ModelFile::parse(SAMPLE), &path).unwrap();

        let (loaded, lock_info) = load_model_with_lock_check(&path).unwrap();
        assert!(loaded.has_block("ELSET"));
        assert!(lock_info.is_none());
    }

    #[test]
    fn test_missing_file_is_file_error() {
        let err = load_model(Path::new("/definitely/not/here.MDL")).unwrap_err();
        assert_eq!(err.error_code(), "FILE_ERROR");
    }
}
