// Copyright (c) James Kassemi, SC, US. All rights reserved.

//! Stateless lifecycle classifier.
//!
//! Turns a decoded [`PoolRecord`] plus an optional caller (identity and
//! participation) into what that caller may do right now. The current time is
//! always passed in.

use core_types::{DoorIndex, Identity, Participation, PoolRecord, Stage, Timestamp};
use serde::{Deserialize, Serialize};

/// Reveal of any kind needs at least this many participants.
pub const MIN_PARTICIPANTS_FOR_REVEAL: u8 = 2;

/// How the caller relates to the record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerRoles {
    pub is_creator: bool,
    pub is_arbiter: bool,
    pub is_participant: bool,
}

/// Record states that decode fine but break the winner/stage invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordAnomaly {
    RevealedWithoutWinner,
    WinnerWhileUnrevealed(DoorIndex),
    WinnerOutOfRange(DoorIndex),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub display_stage: Stage,
    pub roles: CallerRoles,
    pub lock_elapsed: bool,
    pub can_reveal: bool,
    pub can_auto_reveal: bool,
    pub can_cancel: bool,
    pub can_claim: bool,
    pub did_win: Option<bool>,
    pub anomaly: Option<RecordAnomaly>,
}

impl Classification {
    /// Any action available to the caller.
    pub fn is_actionable(&self) -> bool {
        self.can_reveal || self.can_auto_reveal || self.can_cancel || self.can_claim
    }
}

/// Classify `record` for `caller` at `now`. Never fails.
pub fn classify(
    record: &PoolRecord,
    caller: Option<&Identity>,
    participation: Option<&Participation>,
    now: Timestamp,
) -> Classification {
    let roles = CallerRoles {
        is_creator: caller.is_some_and(|id| *id == record.creator),
        is_arbiter: caller.is_some_and(|id| *id == record.arbiter),
        is_participant: participation.is_some(),
    };
    let lock_elapsed = now >= record.lock_time;
    let enough_participants = record.participant_count >= MIN_PARTICIPANTS_FOR_REVEAL;
    let anomaly = detect_anomaly(record);

    let (can_reveal, can_auto_reveal, can_cancel) = match record.stage {
        Stage::Open => (
            !record.is_automatic && roles.is_arbiter && enough_participants,
            record.is_automatic && lock_elapsed && enough_participants,
            roles.is_creator,
        ),
        Stage::Revealed | Stage::Cancelled => (false, false, false),
    };

    let did_win = match (record.stage, record.winner_selection, participation) {
        (Stage::Revealed, Some(winner), Some(entry)) => Some(entry.chosen_door == winner),
        _ => None,
    };
    let can_claim = did_win == Some(true) && participation.is_some_and(|entry| !entry.has_claimed);

    Classification {
        display_stage: record.stage,
        roles,
        lock_elapsed,
        can_reveal,
        can_auto_reveal,
        can_cancel,
        can_claim,
        did_win,
        anomaly,
    }
}

fn detect_anomaly(record: &PoolRecord) -> Option<RecordAnomaly> {
    match (record.stage, record.winner_selection) {
        (Stage::Revealed, None) => Some(RecordAnomaly::RevealedWithoutWinner),
        (Stage::Revealed, Some(door)) if !door.is_valid() => {
            Some(RecordAnomaly::WinnerOutOfRange(door))
        }
        (Stage::Revealed, Some(_)) => None,
        (Stage::Open | Stage::Cancelled, Some(door)) => {
            Some(RecordAnomaly::WinnerWhileUnrevealed(door))
        }
        (Stage::Open | Stage::Cancelled, None) => None,
    }
}
