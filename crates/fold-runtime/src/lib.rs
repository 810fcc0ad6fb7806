#![deny(warnings)]

//! Session shell around the progression engine.
//!
//! A [`Session`] owns one [`GameState`] and one [`SaveStore`], advancing the
//! state in fixed ticks and autosaving every N ticks. Game rules live in
//! `fold-core`; this crate only sequences them and persists the result.

use fold_core::{GameState, ProgressionError};
use persistence::{snapshot_from_state, state_from_snapshot, SaveError, SaveStore};
use thiserror::Error;
use tracing::{info, warn};

/// Errors surfaced by session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Progression(#[from] ProgressionError),
    #[error(transparent)]
    Save(#[from] SaveError),
}

/// Tunable pacing knobs for a session.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Simulated seconds per tick.
    pub tick_seconds: f64,
    /// Autosave period, in ticks. Zero disables autosave.
    pub autosave_every_ticks: u32,
    /// Record name used for load, autosave, and explicit save.
    pub save_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            tick_seconds: 1.0,
            autosave_every_ticks: 30,
            save_name: persistence::DEFAULT_SAVE_NAME.to_string(),
        }
    }
}

/// One-line progress report for display.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionSummary {
    pub fold_count: f64,
    pub folds_per_second: f64,
    pub assistant_level: u32,
    pub skill_points: u32,
    pub prestige_count: u32,
    pub completed_sets: usize,
    pub total_sets: usize,
    /// Name of the cheapest uncompleted set, if any remain.
    pub next_set: Option<String>,
    /// Progress toward `next_set` as a whole percentage, capped at 100.
    pub next_set_percent: u32,
}

/// A running game session bound to a save store.
pub struct Session<S: SaveStore> {
    state: GameState,
    store: S,
    config: SessionConfig,
    ticks_since_save: u32,
}

impl<S: SaveStore> Session<S> {
    /// Open a session, resuming from the named save when one exists.
    ///
    /// A corrupt save is an error here; callers that want to discard it can
    /// `clear` the record and retry.
    pub fn open(store: S, config: SessionConfig) -> Result<Self, SessionError> {
        let state = match store.load(&config.save_name)? {
            Some(snapshot) => {
                info!(name = %config.save_name, "resuming saved session");
                state_from_snapshot(snapshot)
            }
            None => {
                info!(name = %config.save_name, "starting fresh session");
                GameState::default()
            }
        };
        Ok(Session {
            state,
            store,
            config,
            ticks_since_save: 0,
        })
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Advance one tick, then autosave if the period elapsed. Returns the
    /// names of any sets completed by this tick.
    pub fn tick(&mut self) -> Result<Vec<String>, SessionError> {
        let completed = fold_core::tick(&mut self.state, self.config.tick_seconds);
        self.ticks_since_save += 1;
        if self.config.autosave_every_ticks > 0
            && self.ticks_since_save >= self.config.autosave_every_ticks
        {
            self.save()?;
        }
        Ok(completed)
    }

    /// Run `count` ticks back to back, collecting completed set names.
    pub fn run_ticks(&mut self, count: u32) -> Result<Vec<String>, SessionError> {
        let mut completed = Vec::new();
        for _ in 0..count {
            completed.extend(self.tick()?);
        }
        Ok(completed)
    }

    pub fn click(&mut self) {
        fold_core::click(&mut self.state);
    }

    pub fn hire_assistant(&mut self) -> Result<(), SessionError> {
        fold_core::purchase_assistant(&mut self.state)?;
        Ok(())
    }

    pub fn purchase_skill(&mut self, skill_index: usize) -> Result<(), SessionError> {
        fold_core::purchase_skill(&mut self.state, skill_index)?;
        Ok(())
    }

    pub fn prestige(&mut self) {
        fold_core::prestige(&mut self.state);
    }

    /// Write the current state to the store and reset the autosave clock.
    pub fn save(&mut self) -> Result<(), SessionError> {
        let snapshot = snapshot_from_state(&self.state);
        self.store.save(&self.config.save_name, &snapshot)?;
        self.ticks_since_save = 0;
        Ok(())
    }

    /// Drop the save record and start over from a fresh state.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        self.store.clear(&self.config.save_name)?;
        self.state = GameState::default();
        self.ticks_since_save = 0;
        warn!(name = %self.config.save_name, "session reset");
        Ok(())
    }

    pub fn summary(&self) -> SessionSummary {
        let completed_sets = self
            .state
            .origami_sets
            .iter()
            .filter(|s| s.completed)
            .count();
        let next = self
            .state
            .origami_sets
            .iter()
            .filter(|s| !s.completed)
            .min_by(|a, b| a.cost.total_cmp(&b.cost));
        let next_set_percent = next
            .map(|s| (self.state.fold_count / s.cost * 100.0).min(100.0) as u32)
            .unwrap_or(100);
        SessionSummary {
            fold_count: self.state.fold_count,
            folds_per_second: fold_core::folds_per_second(&self.state),
            assistant_level: self.state.assistant_level,
            skill_points: self.state.skill_points,
            prestige_count: self.state.prestige_count,
            completed_sets,
            total_sets: self.state.origami_sets.len(),
            next_set: next.map(|s| s.name.clone()),
            next_set_percent,
        }
    }
}
