//! Naming-template defaults and the key-value settings store.
//!
//! The store is a flat string key-value surface. It seeds the naming
//! template at startup and is written back only on an explicit "save as
//! defaults"; no business logic lives here.

use crate::error::{ImcapError, ImcapResult};
use crate::naming::PathTemplate;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// The exact keys persisted by the application.
pub mod keys {
    pub const FILE_EXT: &str = "file_ext";
    pub const BASENAME: &str = "basename";
    pub const SAVE_DIR: &str = "save_dir";
    pub const INITIALS: &str = "initials";
    pub const EXP_ID: &str = "exp_id";
    pub const BATCH_ID: &str = "batch_id";
    pub const WIDTH: &str = "width";
    pub const HEIGHT: &str = "height";
    pub const LOW: &str = "low";
    pub const HIGH: &str = "high";
}

/// Factory defaults seeded into a fresh store. `initials` has no default:
/// it identifies the operator and must be supplied before the first capture.
pub mod defaults {
    pub const FILE_EXT: &str = ".png";
    pub const BASENAME: &str = "Unnamed";
    pub const EXP_ID: &str = "1";
    pub const BATCH_ID: &str = "A";
    // Sensor native resolution (5MP).
    pub const WIDTH: &str = "2592";
    pub const HEIGHT: &str = "1944";
    pub const LOW: &str = "1";
    pub const HIGH: &str = "99";
}

/// Key-value settings surface used to seed naming-template values.
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
}

/// Volatile store for tests and one-shot CLI runs.
#[derive(Debug, Default)]
pub struct MemorySettings {
    values: BTreeMap<String, String>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }
}

/// TOML-file-backed store. `set` updates memory only; [`FileSettings::save`]
/// persists, so nothing reaches disk without an explicit save.
#[derive(Debug)]
pub struct FileSettings {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileSettings {
    /// Open (or initialize empty from) the settings file at `path`.
    pub fn open(path: impl Into<PathBuf>) -> ImcapResult<Self> {
        let path = path.into();
        let values = if path.exists() {
            let text = std::fs::read_to_string(&path)?;
            toml::from_str(&text)
                .map_err(|e| ImcapError::Settings(format!("{}: {e}", path.display())))?
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, values })
    }

    /// Per-user default location of the settings file.
    pub fn default_path() -> ImcapResult<PathBuf> {
        let base = dirs::config_dir()
            .ok_or_else(|| ImcapError::Settings("no user config directory".into()))?;
        Ok(base.join("imcapp").join("settings.toml"))
    }

    /// Write the current values to disk.
    pub fn save(&self) -> ImcapResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = toml::to_string_pretty(&self.values)
            .map_err(|e| ImcapError::Settings(e.to_string()))?;
        std::fs::write(&self.path, text)?;
        tracing::info!(path = %self.path.display(), "settings saved");
        Ok(())
    }
}

impl SettingsStore for FileSettings {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }
}

/// Fill in any missing default, leaving present values untouched.
pub fn seed_defaults(store: &mut dyn SettingsStore) {
    let seeds = [
        (keys::FILE_EXT, defaults::FILE_EXT),
        (keys::BASENAME, defaults::BASENAME),
        (keys::EXP_ID, defaults::EXP_ID),
        (keys::BATCH_ID, defaults::BATCH_ID),
        (keys::WIDTH, defaults::WIDTH),
        (keys::HEIGHT, defaults::HEIGHT),
        (keys::LOW, defaults::LOW),
        (keys::HIGH, defaults::HIGH),
    ];
    for (key, value) in seeds {
        if store.get(key).is_none() {
            store.set(key, value);
        }
    }
}

/// Construct the startup naming template from stored values.
///
/// A stored `save_dir` pointing at a directory that no longer exists falls
/// back to the process working directory, so a stale network mount does not
/// block startup.
pub fn template_from_settings(store: &dyn SettingsStore) -> ImcapResult<PathTemplate> {
    let initials = store
        .get(keys::INITIALS)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ImcapError::InvalidTemplate("initials are not configured".into()))?;

    let save_dir = store
        .get(keys::SAVE_DIR)
        .map(PathBuf::from)
        .filter(|dir| dir.is_dir())
        .map(Ok)
        .unwrap_or_else(std::env::current_dir)?;

    PathTemplate::new(
        save_dir,
        initials,
        store.get(keys::EXP_ID).unwrap_or_else(|| defaults::EXP_ID.into()),
        store.get(keys::BATCH_ID).unwrap_or_else(|| defaults::BATCH_ID.into()),
        store.get(keys::BASENAME).unwrap_or_else(|| defaults::BASENAME.into()),
        store.get(keys::FILE_EXT).unwrap_or_else(|| defaults::FILE_EXT.into()),
    )
}

/// Write the template's fields back as the new defaults (explicit save).
pub fn save_template_defaults(store: &mut dyn SettingsStore, template: &PathTemplate) {
    store.set(keys::SAVE_DIR, &template.root_dir().to_string_lossy());
    store.set(keys::INITIALS, template.initials());
    store.set(keys::EXP_ID, template.experiment_id());
    store.set(keys::BATCH_ID, template.batch_id());
    store.set(keys::BASENAME, template.base_name());
    store.set(keys::FILE_EXT, template.extension());
}

/// Sensor resolution from the store, falling back to the factory defaults.
pub fn resolution_from_settings(store: &dyn SettingsStore) -> (u32, u32) {
    let parse = |key: &str, fallback: &str| {
        store
            .get(key)
            .and_then(|v| v.parse::<u32>().ok())
            .or_else(|| fallback.parse::<u32>().ok())
            .unwrap_or(0)
    };
    (
        parse(keys::WIDTH, defaults::WIDTH),
        parse(keys::HEIGHT, defaults::HEIGHT),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn seeding_fills_gaps_only() {
        let mut store = MemorySettings::new();
        store.set(keys::FILE_EXT, ".jpg");
        seed_defaults(&mut store);

        assert_eq!(store.get(keys::FILE_EXT).as_deref(), Some(".jpg"));
        assert_eq!(store.get(keys::BASENAME).as_deref(), Some("Unnamed"));
        assert_eq!(store.get(keys::BATCH_ID).as_deref(), Some("A"));
        assert!(store.get(keys::INITIALS).is_none());
    }

    #[test]
    fn template_requires_initials() {
        let mut store = MemorySettings::new();
        seed_defaults(&mut store);
        assert!(matches!(
            template_from_settings(&store),
            Err(ImcapError::InvalidTemplate(_))
        ));
    }

    #[test]
    fn stale_save_dir_falls_back_to_cwd() {
        let mut store = MemorySettings::new();
        seed_defaults(&mut store);
        store.set(keys::INITIALS, "AB");
        store.set(keys::SAVE_DIR, "/definitely/not/a/real/mount");

        let template = template_from_settings(&store).unwrap();
        assert_eq!(
            template.root_dir(),
            std::env::current_dir().unwrap().as_path()
        );
    }

    #[test]
    fn file_store_round_trips_on_explicit_save() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");

        let mut store = FileSettings::open(&path).unwrap();
        seed_defaults(&mut store);
        store.set(keys::INITIALS, "AB");

        // Not saved yet: a fresh open sees nothing.
        assert!(FileSettings::open(&path).unwrap().get(keys::INITIALS).is_none());

        store.save().unwrap();
        let reopened = FileSettings::open(&path).unwrap();
        assert_eq!(reopened.get(keys::INITIALS).as_deref(), Some("AB"));
        assert_eq!(reopened.get(keys::WIDTH).as_deref(), Some("2592"));
    }

    #[test]
    fn resolution_parses_with_fallback() {
        let mut store = MemorySettings::new();
        assert_eq!(resolution_from_settings(&store), (2592, 1944));

        store.set(keys::WIDTH, "1280");
        store.set(keys::HEIGHT, "bogus");
        assert_eq!(resolution_from_settings(&store), (1280, 1944));
    }

    #[test]
    fn save_template_defaults_writes_every_naming_key() {
        let dir = tempdir().unwrap();
        let template = PathTemplate::new(dir.path(), "CD", "7", "B", "larva", ".tif").unwrap();

        let mut store = MemorySettings::new();
        save_template_defaults(&mut store, &template);

        assert_eq!(store.get(keys::INITIALS).as_deref(), Some("CD"));
        assert_eq!(store.get(keys::EXP_ID).as_deref(), Some("7"));
        assert_eq!(store.get(keys::BATCH_ID).as_deref(), Some("B"));
        assert_eq!(store.get(keys::BASENAME).as_deref(), Some("larva"));
        assert_eq!(store.get(keys::FILE_EXT).as_deref(), Some(".tif"));
    }
}
