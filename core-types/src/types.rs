// Copyright (c) James Kassemi, SC, US. All rights reserved.

//! Domain types shared by the decoder, classifier, cache, and projector.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const PUBKEY_LEN: usize = 32;

/// Highest door a participant can pick; doors are numbered from 1.
pub const MAX_DOORS: u8 = 25;

/// Smallest ledger unit (no fractional amounts are ever represented).
pub type Amount = u64;

/// Seconds since the unix epoch. May lie in the past or the future.
pub type Timestamp = i64;

/// Fixed-width 32-byte ledger key.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Pubkey(pub [u8; PUBKEY_LEN]);

/// Key of an acting party (creator, arbiter, caller).
pub type Identity = Pubkey;

/// Key of a ledger account holding one pool record.
pub type Address = Pubkey;

impl Pubkey {
    pub const fn new(bytes: [u8; PUBKEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; PUBKEY_LEN] {
        &self.0
    }

    pub fn to_bytes(self) -> [u8; PUBKEY_LEN] {
        self.0
    }
}

impl From<[u8; PUBKEY_LEN]> for Pubkey {
    fn from(bytes: [u8; PUBKEY_LEN]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pubkey({})", hex::encode(self.0))
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum PubkeyParseError {
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
}

impl FromStr for Pubkey {
    type Err = PubkeyParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; PUBKEY_LEN];
        hex::decode_to_slice(value.trim(), &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl Serialize for Pubkey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Pubkey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Door a participant commits to, or the winning door once revealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DoorIndex(pub u8);

impl DoorIndex {
    pub fn get(self) -> u8 {
        self.0
    }

    /// True when the door falls inside `1..=MAX_DOORS`.
    pub fn is_valid(self) -> bool {
        (1..=MAX_DOORS).contains(&self.0)
    }
}

impl fmt::Display for DoorIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "door {}", self.0)
    }
}

/// Lifecycle phase of a pool record, stored on the ledger as one byte.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Open = 0,
    Revealed = 1,
    Cancelled = 2,
}

impl Stage {
    pub const ALL: [Self; 3] = [Stage::Open, Stage::Revealed, Stage::Cancelled];

    pub fn as_byte(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            Stage::Open => "open",
            Stage::Revealed => "revealed",
            Stage::Cancelled => "cancelled",
        }
    }
}

impl TryFrom<u8> for Stage {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Stage::Open),
            1 => Ok(Stage::Revealed),
            2 => Ok(Stage::Cancelled),
            other => Err(other),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Decoded snapshot of one pool account.
///
/// `winner_selection` is expected to be `Some` exactly when `stage` is
/// [`Stage::Revealed`]; the decoder does not enforce this, the classifier
/// reports violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolRecord {
    pub creator: Identity,
    pub arbiter: Identity,
    pub min_deposit: Amount,
    pub total_pool: Amount,
    pub lock_time: Timestamp,
    pub winner_selection: Option<DoorIndex>,
    pub stage: Stage,
    pub participant_count: u8,
    pub is_automatic: bool,
}

impl PoolRecord {
    pub fn is_open(&self) -> bool {
        self.stage == Stage::Open
    }
}

/// A decoded record paired with the account address it was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolListing {
    pub address: Address,
    pub record: PoolRecord,
}

impl PoolListing {
    pub fn new(address: Address, record: PoolRecord) -> Self {
        Self { address, record }
    }
}

/// A caller's entry in one pool, resolved by whoever holds full account contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participation {
    pub chosen_door: DoorIndex,
    pub has_claimed: bool,
}
