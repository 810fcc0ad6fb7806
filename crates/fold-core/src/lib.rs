#![deny(warnings)]

//! Idle progression engine: fold accrual, purchases, milestones, prestige.
//!
//! All operations are pure transitions over a single [`GameState`] record.
//! Purchase gates are checked before any field is touched, so every call
//! either applies fully or leaves the state unchanged.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Base cost of the first assistant.
pub const BASE_ASSISTANT_COST: f64 = 10.0;
/// Cost growth factor per assistant level.
pub const ASSISTANT_COST_GROWTH: f64 = 1.15;
/// Permanent accrual bonus per prestige.
pub const PRESTIGE_BONUS: f64 = 0.1;

/// Stable identifier for a skill's effect.
///
/// Effects dispatch on this id, never on the display name, so renaming a
/// skill in the UI cannot change gameplay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillId {
    /// Adds 0.5 to the per-assistant fold rate.
    FasterAssistants,
    /// Adds 1 fold per click.
    BonusClick,
    /// Doubles folds per click.
    DoubleClick,
}

/// A purchasable skill.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub id: SkillId,
    pub name: String,
    /// Cost in skill points.
    pub cost: u32,
    pub purchased: bool,
}

/// A one-time milestone granting a skill point when fold_count crosses it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrigamiSet {
    pub name: String,
    /// Cumulative fold count required to complete the set.
    pub cost: f64,
    pub completed: bool,
}

/// The whole progression state of one session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Accumulated currency; fractional because accrual is rate * elapsed.
    pub fold_count: f64,
    pub folds_per_click: u32,
    pub assistant_level: u32,
    /// Per-assistant fold rate before the prestige multiplier.
    pub base_folds_per_second: f64,
    pub skill_points: u32,
    pub prestige_count: u32,
    /// Milestones in ascending cost order.
    pub origami_sets: Vec<OrigamiSet>,
    pub skills: Vec<Skill>,
}

impl Default for GameState {
    fn default() -> Self {
        GameState {
            fold_count: 0.0,
            folds_per_click: 1,
            assistant_level: 0,
            base_folds_per_second: 1.0,
            skill_points: 0,
            prestige_count: 0,
            origami_sets: default_origami_sets(),
            skills: default_skills(),
        }
    }
}

/// The stock milestone list, ascending by cost.
pub fn default_origami_sets() -> Vec<OrigamiSet> {
    [
        ("Crane Set", 100.0),
        ("Flower Set", 500.0),
        ("Dragon Set", 2000.0),
        ("Garden Set", 10000.0),
    ]
    .into_iter()
    .map(|(name, cost)| OrigamiSet {
        name: name.to_string(),
        cost,
        completed: false,
    })
    .collect()
}

/// The stock skill list.
pub fn default_skills() -> Vec<Skill> {
    [
        (SkillId::FasterAssistants, "Faster Assistants", 1),
        (SkillId::BonusClick, "+1 Fold/Click", 1),
        (SkillId::DoubleClick, "Double Fold/Click", 2),
    ]
    .into_iter()
    .map(|(id, name, cost)| Skill {
        id,
        name: name.to_string(),
        cost,
        purchased: false,
    })
    .collect()
}

/// Gate failures reported by purchase operations.
#[derive(Debug, Error, PartialEq)]
pub enum ProgressionError {
    /// The purchase costs more than the available balance.
    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: f64, available: f64 },
    /// The skill was already bought this prestige cycle.
    #[error("skill already purchased: {0}")]
    AlreadyPurchased(String),
    /// No skill exists at the given index.
    #[error("no skill at index {0}")]
    UnknownSkill(usize),
}

/// Current passive accrual rate in folds per second.
pub fn folds_per_second(state: &GameState) -> f64 {
    f64::from(state.assistant_level)
        * state.base_folds_per_second
        * (1.0 + f64::from(state.prestige_count) * PRESTIGE_BONUS)
}

/// Cost of the next assistant: ceil(10 * 1.15^level).
pub fn assistant_cost(state: &GameState) -> f64 {
    (BASE_ASSISTANT_COST * ASSISTANT_COST_GROWTH.powi(state.assistant_level as i32)).ceil()
}

/// Advance time by `elapsed_seconds`, accruing folds and then evaluating
/// milestones. Returns the names of sets completed by this tick.
pub fn tick(state: &mut GameState, elapsed_seconds: f64) -> Vec<String> {
    state.fold_count += folds_per_second(state) * elapsed_seconds;
    evaluate_milestones(state)
}

/// Apply one manual click.
pub fn click(state: &mut GameState) {
    state.fold_count += f64::from(state.folds_per_click);
}

/// Complete every uncompleted set whose cost is reached, in list order,
/// granting one skill point each. Returns the completed set names.
pub fn evaluate_milestones(state: &mut GameState) -> Vec<String> {
    let mut completed = Vec::new();
    for set in &mut state.origami_sets {
        if !set.completed && state.fold_count >= set.cost {
            set.completed = true;
            state.skill_points += 1;
            info!(set = %set.name, "origami set completed");
            completed.push(set.name.clone());
        }
    }
    completed
}

/// Buy the next assistant level, deducting its fold cost.
pub fn purchase_assistant(state: &mut GameState) -> Result<(), ProgressionError> {
    let cost = assistant_cost(state);
    if state.fold_count < cost {
        return Err(ProgressionError::InsufficientFunds {
            needed: cost,
            available: state.fold_count,
        });
    }
    state.fold_count -= cost;
    state.assistant_level += 1;
    info!(level = state.assistant_level, "assistant hired");
    Ok(())
}

/// Buy the skill at `skill_index`, deducting skill points and applying its
/// effect. Gates are checked up front; a failed purchase changes nothing.
pub fn purchase_skill(state: &mut GameState, skill_index: usize) -> Result<(), ProgressionError> {
    let skill = state
        .skills
        .get(skill_index)
        .ok_or(ProgressionError::UnknownSkill(skill_index))?;
    if skill.purchased {
        return Err(ProgressionError::AlreadyPurchased(skill.name.clone()));
    }
    if state.skill_points < skill.cost {
        return Err(ProgressionError::InsufficientFunds {
            needed: f64::from(skill.cost),
            available: f64::from(state.skill_points),
        });
    }
    let (id, cost, name) = (skill.id, skill.cost, skill.name.clone());
    state.skill_points -= cost;
    state.skills[skill_index].purchased = true;
    match id {
        SkillId::FasterAssistants => state.base_folds_per_second += 0.5,
        SkillId::BonusClick => state.folds_per_click += 1,
        SkillId::DoubleClick => state.folds_per_click *= 2,
    }
    info!(skill = %name, "skill purchased");
    Ok(())
}

/// Reset all progression except the prestige counter, which increments and
/// permanently raises the accrual multiplier. Sets and skills both revert
/// to incomplete/unpurchased.
pub fn prestige(state: &mut GameState) {
    state.prestige_count += 1;
    state.fold_count = 0.0;
    state.skill_points = 0;
    state.assistant_level = 0;
    state.base_folds_per_second = 1.0;
    state.folds_per_click = 1;
    for set in &mut state.origami_sets {
        set.completed = false;
    }
    for skill in &mut state.skills {
        skill.purchased = false;
    }
    info!(prestige_count = state.prestige_count, "prestige applied");
}
