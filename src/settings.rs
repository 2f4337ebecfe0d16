//! Settings infrastructure for the tracking engine.
//!
//! This module provides support for loading and parsing linestamp.toml
//! files to configure where the timestamp store lives and how tracking
//! behaves when the engine has no prior content for a document.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

/// File name searched for by `discover_settings`.
pub const SETTINGS_FILE: &str = "linestamp.toml";

/// Store location used when no settings file configures one.
pub const DEFAULT_STORE_PATH: &str = ".linestamp/timestamps.json";

/// Root settings structure loaded from linestamp.toml.
#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    /// Store configuration.
    pub store: Option<StoreSettings>,

    /// Tracking behavior configuration.
    pub tracking: Option<TrackingSettings>,
}

/// Settings for the persisted timestamp store.
#[derive(Debug, Default, Deserialize)]
pub struct StoreSettings {
    /// Location of the store file. Relative paths resolve against the
    /// directory the settings file was found in.
    pub path: Option<PathBuf>,
}

/// Settings for tracking behavior.
#[derive(Debug, Default, Deserialize)]
pub struct TrackingSettings {
    /// What to diff against the first time a document is seen after the
    /// engine starts.
    pub cold_start: Option<ColdStart>,
}

/// Baseline used when a change arrives for a document with no last-known
/// content (first observation since the engine started).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColdStart {
    /// Seed the baseline from the document's current content. Untouched
    /// documents keep all their timestamps; the resume itself stamps
    /// nothing.
    #[default]
    Seed,

    /// Treat the prior content as empty: the first change stamps every
    /// line with the time of that change.
    Reset,
}

impl Settings {
    /// Resolve the store file location against the directory the settings
    /// were found in.
    pub fn store_file(&self, settings_dir: &Path) -> PathBuf {
        let configured = self
            .store
            .as_ref()
            .and_then(|s| s.path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_PATH));
        if configured.is_absolute() {
            configured
        } else {
            settings_dir.join(configured)
        }
    }

    /// Effective cold-start policy.
    pub fn cold_start(&self) -> ColdStart {
        self.tracking
            .as_ref()
            .and_then(|t| t.cold_start)
            .unwrap_or_default()
    }
}

/// Load settings from a linestamp.toml file.
///
/// Returns default settings if the file doesn't exist or can't be parsed.
pub fn load_settings(path: &Path) -> Settings {
    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to parse settings, using defaults");
                Settings::default()
            }
        },
        Err(_) => Settings::default(),
    }
}

/// Discover linestamp.toml by searching up the directory tree from
/// `start_dir`.
///
/// Returns `(settings, settings_dir)` where `settings_dir` is the directory
/// containing the found file (used for resolving relative paths). If not
/// found, returns `(Settings::default(), start_dir)`.
pub fn discover_settings(start_dir: &Path) -> (Settings, PathBuf) {
    let mut current = Some(start_dir);
    while let Some(dir) = current {
        let candidate = dir.join(SETTINGS_FILE);
        if candidate.is_file() {
            return (load_settings(&candidate), dir.to_path_buf());
        }
        current = dir.parent();
    }

    (Settings::default(), start_dir.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_missing() {
        let settings = load_settings(Path::new("/nonexistent/linestamp.toml"));
        assert!(settings.store.is_none());
        assert_eq!(settings.cold_start(), ColdStart::Seed);
    }

    #[test]
    fn defaults_when_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, "store = { path").unwrap();

        let settings = load_settings(&path);
        assert!(settings.store.is_none());
    }

    #[test]
    fn parse_store_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, "[store]\npath = \"history/stamps.json\"\n").unwrap();

        let settings = load_settings(&path);
        assert_eq!(
            settings.store_file(dir.path()),
            dir.path().join("history/stamps.json")
        );
    }

    #[test]
    fn absolute_store_path_is_kept() {
        let settings = Settings {
            store: Some(StoreSettings {
                path: Some(PathBuf::from("/var/lib/stamps.json")),
            }),
            tracking: None,
        };
        assert_eq!(
            settings.store_file(Path::new("/ignored")),
            PathBuf::from("/var/lib/stamps.json")
        );
    }

    #[test]
    fn default_store_path_resolves_against_settings_dir() {
        let settings = Settings::default();
        assert_eq!(
            settings.store_file(Path::new("/workspace")),
            Path::new("/workspace").join(DEFAULT_STORE_PATH)
        );
    }

    #[test]
    fn parse_cold_start() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, "[tracking]\ncold_start = \"reset\"\n").unwrap();

        let settings = load_settings(&path);
        assert_eq!(settings.cold_start(), ColdStart::Reset);
    }

    #[test]
    fn discover_in_current_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_FILE),
            "[tracking]\ncold_start = \"reset\"\n",
        )
        .unwrap();

        let (settings, settings_dir) = discover_settings(dir.path());
        assert_eq!(settings_dir, dir.path());
        assert_eq!(settings.cold_start(), ColdStart::Reset);
    }

    #[test]
    fn discover_in_parent_dir() {
        let parent = tempfile::tempdir().unwrap();
        let child = parent.path().join("notes/daily");
        std::fs::create_dir_all(&child).unwrap();
        std::fs::write(
            parent.path().join(SETTINGS_FILE),
            "[store]\npath = \"stamps.json\"\n",
        )
        .unwrap();

        let (settings, settings_dir) = discover_settings(&child);
        assert_eq!(settings_dir, parent.path());
        assert_eq!(
            settings.store_file(&settings_dir),
            parent.path().join("stamps.json")
        );
    }

    #[test]
    fn discover_not_found() {
        let dir = tempfile::tempdir().unwrap();

        let (settings, settings_dir) = discover_settings(dir.path());
        assert_eq!(settings_dir, dir.path());
        assert!(settings.store.is_none());
        assert!(settings.tracking.is_none());
    }

    #[test]
    fn nearest_settings_file_wins() {
        let parent = tempfile::tempdir().unwrap();
        let child = parent.path().join("nested");
        std::fs::create_dir_all(&child).unwrap();
        std::fs::write(
            parent.path().join(SETTINGS_FILE),
            "[tracking]\ncold_start = \"seed\"\n",
        )
        .unwrap();
        std::fs::write(
            child.join(SETTINGS_FILE),
            "[tracking]\ncold_start = \"reset\"\n",
        )
        .unwrap();

        let (settings, settings_dir) = discover_settings(&child);
        assert_eq!(settings_dir, child);
        assert_eq!(settings.cold_start(), ColdStart::Reset);
    }
}
