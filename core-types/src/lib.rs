// Copyright (c) James Kassemi, SC, US. All rights reserved.

//! Shared pool types, configuration, retry policy, and status handles for the projector workspace.

pub mod config;
pub mod retry;
pub mod status;
pub mod types;

pub use types::{
    Address, Amount, DoorIndex, Identity, MAX_DOORS, PUBKEY_LEN, Participation, PoolListing,
    PoolRecord, Pubkey, Stage, Timestamp,
};
