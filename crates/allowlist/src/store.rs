//! The persisted allow-list store.
//!
//! Layout: `<config-dir>/kwinrc`, group [`GROUP`], key [`CLASSES_KEY`].
//! Mutators run under an exclusive advisory lock on `kwinrc.lock` and
//! publish via temp-file + atomic rename so readers (the engine reload
//! path, `list-classes`) never observe a partial write and never need the
//! lock themselves.

use std::{
    env, fs,
    fs::File,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    thread,
    time::{Duration, Instant},
};

use fs2::FileExt;
use tracing::{debug, warn};

use crate::{
    error::{Error, Result},
    key::{join_list, normalize, parse_list},
    kwinrc::GroupedFile,
};

/// Config group owned by the focus-helper script.
pub const GROUP: &str = "Script-kwin-focus-helper";
/// Key holding the delimiter-separated class list.
pub const CLASSES_KEY: &str = "forceFocusClasses";
/// Environment override for the store's base directory.
pub const CONFIG_DIR_ENV: &str = "FORCEFOCUS_CONFIG_DIR";

/// KWin plugin registry group.
const PLUGINS_GROUP: &str = "Plugins";
/// Enable flag for the helper script within [`PLUGINS_GROUP`].
const ENABLED_KEY: &str = "kwin-focus-helperEnabled";
/// File name of the backing store inside the base directory.
const STORE_FILE: &str = "kwinrc";

/// Bounded wait for the mutation lock before giving up.
const LOCK_WAIT_MAX: Duration = Duration::from_secs(5);
/// Poll interval while waiting for the mutation lock.
const LOCK_POLL: Duration = Duration::from_millis(50);

/// Handle to the persisted allow-list file.
#[derive(Debug, Clone)]
pub struct Store {
    /// Full path of the backing file.
    path: PathBuf,
}

/// Held exclusive lock over the store; released on drop.
struct StoreLock {
    /// Open lock file carrying the advisory lock.
    file: File,
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Err(e) = fs2::FileExt::unlock(&self.file) {
            warn!("failed to release allow-list lock: {e}");
        }
    }
}

impl Store {
    /// Store rooted at an explicit base directory.
    pub fn at_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(STORE_FILE),
        }
    }

    /// Store at the resolved base directory: the explicit override if
    /// given, else `$FORCEFOCUS_CONFIG_DIR`, else the platform config dir.
    pub fn open(override_dir: Option<&Path>) -> Result<Self> {
        if let Some(dir) = override_dir {
            return Ok(Self::at_dir(dir));
        }
        if let Some(dir) = env::var_os(CONFIG_DIR_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::at_dir(Path::new(&dir)));
        }
        let dir = dirs::config_dir().ok_or(Error::NoConfigDir(CONFIG_DIR_ENV))?;
        Ok(Self::at_dir(&dir))
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored class list. A missing file is an empty list, not an
    /// error (absence means "not configured yet").
    pub fn load(&self) -> Result<Vec<String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let file = GroupedFile::parse(&contents);
                let value = file.get(GROUP, CLASSES_KEY).unwrap_or_default();
                Ok(parse_list(&value))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Read-tolerant listing: a transient read failure degrades to empty.
    pub fn list(&self) -> Vec<String> {
        self.load().unwrap_or_else(|e| {
            warn!("allow-list read failed, treating as empty: {e}");
            Vec::new()
        })
    }

    /// Whether `raw` (by normalized key) is currently stored.
    pub fn contains(&self, raw: &str) -> Result<bool> {
        let key = normalize(raw);
        if key.is_empty() {
            return Err(Error::EmptyClass);
        }
        Ok(self.load()?.iter().any(|c| normalize(c) == key))
    }

    /// Replace the whole class list.
    pub fn save(&self, classes: &[String]) -> Result<()> {
        let _lock = self.lock()?;
        self.write_classes(classes)
    }

    /// Insert `raw` if its key is not yet present. Returns true when the
    /// class was newly inserted.
    pub fn add(&self, raw: &str) -> Result<bool> {
        let spelled = raw.trim().to_string();
        let key = normalize(&spelled);
        if key.is_empty() {
            return Err(Error::EmptyClass);
        }

        let _lock = self.lock()?;
        let mut classes = self.load()?;
        if classes.iter().any(|c| normalize(c) == key) {
            return Ok(false);
        }
        classes.push(spelled);
        self.write_classes(&classes)?;
        Ok(true)
    }

    /// Remove `raw` by normalized key. Returns true when it was present.
    pub fn remove(&self, raw: &str) -> Result<bool> {
        let key = normalize(raw);
        if key.is_empty() {
            return Err(Error::EmptyClass);
        }

        let _lock = self.lock()?;
        let mut classes = self.load()?;
        let before = classes.len();
        classes.retain(|c| normalize(c) != key);
        if classes.len() == before {
            return Ok(false);
        }
        self.write_classes(&classes)?;
        Ok(true)
    }

    /// Current state of the script enable flag, `None` if unset.
    pub fn enabled(&self) -> Result<Option<bool>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let file = GroupedFile::parse(&contents);
                Ok(file.get(PLUGINS_GROUP, ENABLED_KEY).map(|v| {
                    let v = v.trim().to_lowercase();
                    v == "true" || v == "1" || v == "yes"
                }))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set the script enable flag.
    pub fn set_enabled(&self, enabled: bool) -> Result<()> {
        let _lock = self.lock()?;
        self.edit(|file| {
            file.set(
                PLUGINS_GROUP,
                ENABLED_KEY,
                if enabled { "true" } else { "false" },
            );
        })
    }

    /// Rewrite the class-list key. Caller must hold the lock.
    fn write_classes(&self, classes: &[String]) -> Result<()> {
        self.edit(|file| file.set(GROUP, CLASSES_KEY, &join_list(classes)))
    }

    /// Read-modify-write the backing file under the already-held lock,
    /// publishing with temp-file + atomic rename.
    fn edit(&self, mutate: impl FnOnce(&mut GroupedFile)) -> Result<()> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };
        let mut file = GroupedFile::parse(&contents);
        mutate(&mut file);

        let tmp = self.path.with_extension("tmp.forcefocus");
        {
            let mut out = File::create(&tmp)?;
            out.write_all(file.render().as_bytes())?;
            out.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        debug!("allow-list store rewritten at {}", self.path.display());
        Ok(())
    }

    /// Acquire the exclusive mutation lock, waiting up to [`LOCK_WAIT_MAX`].
    fn lock(&self) -> Result<StoreLock> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let lock_path = self.path.with_extension("lock");
        let file = File::create(&lock_path)?;

        let deadline = Instant::now() + LOCK_WAIT_MAX;
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => return Ok(StoreLock { file }),
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    if Instant::now() >= deadline {
                        return Err(Error::LockTimeout { path: lock_path });
                    }
                    thread::sleep(LOCK_POLL);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
