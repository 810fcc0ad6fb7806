#![deny(warnings)]

//! Snapshot persistence for idle sessions.
//!
//! Saves are single named JSON records. Loading is wholesale (no merge):
//! a missing field falls back to its initial value, and a corrupt file is
//! an error the caller resolves by starting fresh.

use chrono::{DateTime, Utc};
use fold_core::{GameState, OrigamiSet, Skill};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Save record name used when the caller does not pick one.
pub const DEFAULT_SAVE_NAME: &str = "paperfold-save";

/// Errors from the save store.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("save io error: {0}")]
    Io(#[from] io::Error),
    #[error("corrupt save: {0}")]
    Corrupt(#[from] serde_json::Error),
}

fn one() -> u32 {
    1
}

fn one_f64() -> f64 {
    1.0
}

/// A point-in-time copy of the game state plus a timestamp.
///
/// Every field defaults independently so that snapshots written before a
/// schema change still load, falling back per-field rather than failing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SaveSnapshot {
    #[serde(default)]
    pub fold_count: f64,
    #[serde(default = "one")]
    pub folds_per_click: u32,
    #[serde(default)]
    pub assistant_level: u32,
    #[serde(default = "one_f64")]
    pub base_folds_per_second: f64,
    #[serde(default)]
    pub skill_points: u32,
    #[serde(default)]
    pub prestige_count: u32,
    #[serde(default = "fold_core::default_origami_sets")]
    pub origami_sets: Vec<OrigamiSet>,
    #[serde(default = "fold_core::default_skills")]
    pub skills: Vec<Skill>,
    #[serde(default = "Utc::now")]
    pub saved_at: DateTime<Utc>,
}

/// Snapshot the current state, stamping it with the current time.
pub fn snapshot_from_state(state: &GameState) -> SaveSnapshot {
    SaveSnapshot {
        fold_count: state.fold_count,
        folds_per_click: state.folds_per_click,
        assistant_level: state.assistant_level,
        base_folds_per_second: state.base_folds_per_second,
        skill_points: state.skill_points,
        prestige_count: state.prestige_count,
        origami_sets: state.origami_sets.clone(),
        skills: state.skills.clone(),
        saved_at: Utc::now(),
    }
}

/// Rebuild a game state from a snapshot, dropping the timestamp.
pub fn state_from_snapshot(snapshot: SaveSnapshot) -> GameState {
    GameState {
        fold_count: snapshot.fold_count,
        folds_per_click: snapshot.folds_per_click,
        assistant_level: snapshot.assistant_level,
        base_folds_per_second: snapshot.base_folds_per_second,
        skill_points: snapshot.skill_points,
        prestige_count: snapshot.prestige_count,
        origami_sets: snapshot.origami_sets,
        skills: snapshot.skills,
    }
}

/// A named key-value store for save snapshots.
pub trait SaveStore {
    /// Write or replace the named snapshot.
    fn save(&self, name: &str, snapshot: &SaveSnapshot) -> Result<(), SaveError>;
    /// Read the named snapshot; `None` when no save exists.
    fn load(&self, name: &str) -> Result<Option<SaveSnapshot>, SaveError>;
    /// Delete the named snapshot if present.
    fn clear(&self, name: &str) -> Result<(), SaveError>;
}

/// File-backed store keeping one pretty-printed JSON file per record.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn record_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.json"))
    }
}

impl SaveStore for FileStore {
    fn save(&self, name: &str, snapshot: &SaveSnapshot) -> Result<(), SaveError> {
        fs::create_dir_all(&self.root)?;
        let text = serde_json::to_string_pretty(snapshot)?;
        fs::write(self.record_path(name), text)?;
        info!(name, "snapshot saved");
        Ok(())
    }

    fn load(&self, name: &str) -> Result<Option<SaveSnapshot>, SaveError> {
        let text = match fs::read_to_string(self.record_path(name)) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let snapshot: SaveSnapshot = serde_json::from_str(&text)?;
        info!(name, "snapshot loaded");
        Ok(Some(snapshot))
    }

    fn clear(&self, name: &str) -> Result<(), SaveError> {
        match fs::remove_file(self.record_path(name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn temp_store(tag: &str) -> FileStore {
        let dir = std::env::temp_dir().join(format!("fold-save-{}-{}", tag, std::process::id()));
        FileStore::new(dir)
    }

    #[test]
    fn snapshot_roundtrips_through_store() {
        let store = temp_store("roundtrip");
        let mut state = GameState {
            fold_count: 123.5,
            assistant_level: 3,
            ..GameState::default()
        };
        fold_core::evaluate_milestones(&mut state);
        let snap = snapshot_from_state(&state);
        store.save(DEFAULT_SAVE_NAME, &snap).unwrap();
        let back = store.load(DEFAULT_SAVE_NAME).unwrap().unwrap();
        assert_eq!(state_from_snapshot(back), state);
        store.clear(DEFAULT_SAVE_NAME).unwrap();
        assert!(store.load(DEFAULT_SAVE_NAME).unwrap().is_none());
    }

    #[test]
    fn missing_save_is_none() {
        let store = temp_store("missing");
        assert!(store.load("never-written").unwrap().is_none());
    }

    #[test]
    fn clearing_a_missing_save_is_fine() {
        let store = temp_store("clear");
        store.clear("never-written").unwrap();
    }

    #[test]
    fn missing_fields_default_per_field() {
        let snap: SaveSnapshot = serde_json::from_str(r#"{"fold_count": 42.0}"#).unwrap();
        assert_eq!(snap.fold_count, 42.0);
        assert_eq!(snap.folds_per_click, 1);
        assert_eq!(snap.assistant_level, 0);
        assert_eq!(snap.base_folds_per_second, 1.0);
        assert_eq!(snap.skill_points, 0);
        assert_eq!(snap.prestige_count, 0);
        assert_eq!(snap.origami_sets, fold_core::default_origami_sets());
        assert_eq!(snap.skills, fold_core::default_skills());
    }

    #[test]
    fn empty_record_is_a_fresh_state() {
        let snap: SaveSnapshot = serde_json::from_str("{}").unwrap();
        assert_eq!(state_from_snapshot(snap), GameState::default());
    }

    #[test]
    fn corrupt_save_is_an_error() {
        let store = temp_store("corrupt");
        fs::create_dir_all(&store.root).unwrap();
        fs::write(store.record_path("bad"), "not json at all").unwrap();
        assert!(matches!(store.load("bad"), Err(SaveError::Corrupt(_))));
        store.clear("bad").unwrap();
    }

    proptest! {
        #[test]
        fn state_fields_survive_the_snapshot(
            folds in 0.0f64..1e9,
            clicks in 1u32..1000,
            level in 0u32..1000,
            points in 0u32..1000,
            prestiges in 0u32..1000,
        ) {
            let state = GameState {
                fold_count: folds,
                folds_per_click: clicks,
                assistant_level: level,
                skill_points: points,
                prestige_count: prestiges,
                ..GameState::default()
            };
            let text = serde_json::to_string(&snapshot_from_state(&state)).unwrap();
            let back: SaveSnapshot = serde_json::from_str(&text).unwrap();
            prop_assert_eq!(state_from_snapshot(back), state);
        }
    }
}
