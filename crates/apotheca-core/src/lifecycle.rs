//! # Drug Lifecycle
//!
//! The soft-delete / lock / restore state machine.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   ┌────────┐   delete (unlocked)   ┌─────────┐   purge (admin)          │
//! │   │ Active │ ────────────────────► │ Deleted │ ──────────────► Purged   │
//! │   │        │ ◄──────────────────── │         │                          │
//! │   └────────┘       restore         └─────────┘                          │
//! │       │                                                                 │
//! │       └── purge (admin, unlocked) ─────────────────────────► Purged     │
//! │                                                                         │
//! │   toggleLock (admin): flips is_locked in either state                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Planning is pure: [`plan_transition`] and [`check_purge`] decide what
//! must happen and the database layer carries it out. The one rule that needs storage, a
//! restore colliding with an active drug's code, is checked there.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::{Drug, DrugState, Identity};

/// A lifecycle action requested on one drug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DrugAction {
    /// Move to the recycle bin.
    Delete,
    /// Bring back from the recycle bin.
    Restore,
    /// Remove the row and its history for good.
    Purge,
    ToggleLock,
}

impl DrugAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            DrugAction::Delete => "delete",
            DrugAction::Restore => "restore",
            DrugAction::Purge => "purge",
            DrugAction::ToggleLock => "toggleLock",
        }
    }

    /// The action as a state change, or `None` for a purge.
    pub fn state_change(self) -> Option<StateChange> {
        match self {
            DrugAction::Delete => Some(StateChange::Delete),
            DrugAction::Restore => Some(StateChange::Restore),
            DrugAction::ToggleLock => Some(StateChange::ToggleLock),
            DrugAction::Purge => None,
        }
    }
}

/// The actions after which the drug row still exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StateChange {
    Delete,
    Restore,
    ToggleLock,
}

impl StateChange {
    pub fn as_str(&self) -> &'static str {
        DrugAction::from(*self).as_str()
    }
}

impl From<StateChange> for DrugAction {
    fn from(change: StateChange) -> Self {
        match change {
            StateChange::Delete => DrugAction::Delete,
            StateChange::Restore => DrugAction::Restore,
            StateChange::ToggleLock => DrugAction::ToggleLock,
        }
    }
}

/// What the storage layer must write to carry out a [`StateChange`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    SoftDelete,
    Restore,
    SetLocked(bool),
    /// Nothing to write; return the drug unchanged.
    Unchanged,
}

fn admin_required(action: DrugAction) -> CoreError {
    CoreError::AdminRequired {
        action: action.as_str().to_string(),
    }
}

/// Decides the outcome of `change` on `drug` for `actor`.
///
/// ## Errors
/// - `AdminRequired` for lock toggles by non-admins
/// - `DrugLocked` when deleting a locked active drug
/// - `InvalidTransition` when deleting a drug already in the recycle bin
pub fn plan_transition(drug: &Drug, change: StateChange, actor: &Identity) -> CoreResult<Transition> {
    match (change, drug.state()) {
        (StateChange::Delete, DrugState::Active) => {
            if drug.is_locked {
                return Err(CoreError::DrugLocked {
                    code: drug.code.clone(),
                    action: "deleted".to_string(),
                });
            }
            Ok(Transition::SoftDelete)
        }
        (StateChange::Delete, DrugState::Deleted) => Err(CoreError::InvalidTransition {
            code: drug.code.clone(),
            action: change.as_str().to_string(),
            reason: "it is already in the recycle bin".to_string(),
        }),

        (StateChange::Restore, DrugState::Deleted) => Ok(Transition::Restore),
        (StateChange::Restore, DrugState::Active) => Ok(Transition::Unchanged),

        (StateChange::ToggleLock, _) => {
            if !actor.is_admin() {
                return Err(admin_required(DrugAction::ToggleLock));
            }
            Ok(Transition::SetLocked(!drug.is_locked))
        }
    }
}

/// Checks that `actor` may purge `drug`.
///
/// ## Errors
/// - `AdminRequired` for non-admins
/// - `DrugLocked` for a locked drug that is still active; a lock does not
///   protect what is already in the recycle bin
pub fn check_purge(drug: &Drug, actor: &Identity) -> CoreResult<()> {
    if !actor.is_admin() {
        return Err(admin_required(DrugAction::Purge));
    }
    if drug.state() == DrugState::Active && drug.is_locked {
        return Err(CoreError::DrugLocked {
            code: drug.code.clone(),
            action: "purged".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Batch Delete
// =============================================================================

/// How a batch delete splits the requested ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchDeletePlan {
    /// Active, unlocked drugs to soft-delete, in request order.
    pub deletable: Vec<String>,
    pub skipped_locked: u64,
    /// Unknown ids and drugs already in the recycle bin.
    pub skipped_missing: u64,
}

/// Partitions `ids` against the drugs that were found for them.
///
/// Repeated ids count once.
pub fn plan_batch_delete(ids: &[String], found: &[Drug]) -> BatchDeletePlan {
    let by_id: HashMap<&str, &Drug> = found.iter().map(|d| (d.id.as_str(), d)).collect();
    let mut seen = HashSet::with_capacity(ids.len());
    let mut plan = BatchDeletePlan::default();

    for id in ids {
        if !seen.insert(id.as_str()) {
            continue;
        }
        match by_id.get(id.as_str()) {
            Some(drug) if drug.is_deleted => plan.skipped_missing += 1,
            Some(drug) if drug.is_locked => plan.skipped_locked += 1,
            Some(drug) => plan.deletable.push(drug.id.clone()),
            None => plan.skipped_missing += 1,
        }
    }

    plan
}

// =============================================================================
// Unit Tests
// =============================================================================
