// Copyright (c) James Kassemi, SC, US. All rights reserved.

//! Byte layout of the on-ledger pool account.
//!
//! Fields are little-endian and packed back to back. The winner selection is a
//! presence-tagged `u8`, so every field after it sits one byte later when a
//! winner is recorded.

use core_types::{PUBKEY_LEN, Stage};

pub const DISCRIMINATOR_LEN: usize = 8;

/// First 8 bytes of `sha256("account:BetAccount")`.
pub const POOL_DISCRIMINATOR: [u8; DISCRIMINATOR_LEN] = [117, 187, 165, 174, 194, 28, 119, 76];

pub const CREATOR_OFFSET: usize = DISCRIMINATOR_LEN;
pub const ARBITER_OFFSET: usize = CREATOR_OFFSET + PUBKEY_LEN;
pub const MIN_DEPOSIT_OFFSET: usize = ARBITER_OFFSET + PUBKEY_LEN;
pub const TOTAL_POOL_OFFSET: usize = MIN_DEPOSIT_OFFSET + 8;
pub const LOCK_TIME_OFFSET: usize = TOTAL_POOL_OFFSET + 8;
pub const WINNER_TAG_OFFSET: usize = LOCK_TIME_OFFSET + 8;

/// stage, participant count, bump, automatic flag.
pub const TAIL_LEN: usize = 4;

/// Stage byte offset for records whose winner tag is `0`.
///
/// Only usable as a server-side filter for `Stage::Open`: an open record never
/// carries a winner, so its tag is always absent and nothing shifts the stage.
pub const OPEN_STAGE_OFFSET: usize = WINNER_TAG_OFFSET + 1;

pub const MIN_RECORD_LEN: usize = OPEN_STAGE_OFFSET + TAIL_LEN;
pub const MAX_RECORD_LEN: usize = MIN_RECORD_LEN + 1;

const _: () = assert!(OPEN_STAGE_OFFSET == 97);
const _: () = assert!(MIN_RECORD_LEN == 101);
const _: () = assert!(Stage::Open as u8 == 0);

/// Exact record length for a given winner presence.
pub const fn record_len(has_winner: bool) -> usize {
    if has_winner {
        MAX_RECORD_LEN
    } else {
        MIN_RECORD_LEN
    }
}
