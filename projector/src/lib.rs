// Copyright (c) James Kassemi, SC, US. All rights reserved.

//! Read-side projection of pool accounts.
//!
//! The crate exposes:
//! - [`PoolProjector`]: bulk loads (fetch, decode, filter, sort) with a TTL cache
//!   in front of the open-pool listing.
//! - [`inspect_account`]: decode and classify one known account for a caller.
//! - [`Clock`] / [`SystemClock`] / [`ManualClock`]: where "now" comes from.

pub mod clock;
pub mod error;
mod projector;

use core_types::{Identity, Participation, PoolRecord, Timestamp};
use lifecycle::Classification;
use pool_decoder::DecodeError;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ProjectorError, Result};
pub use projector::{
    DecodeReport, PoolProjector, creator_filter, decode_batch, open_stage_filter,
    sort_created_listings, sort_open_listings,
};

/// Decode a single account and classify it for `caller` at `now`.
pub fn inspect_account(
    data: &[u8],
    caller: Option<&Identity>,
    participation: Option<&Participation>,
    now: Timestamp,
) -> std::result::Result<(PoolRecord, Classification), DecodeError> {
    let record = pool_decoder::decode_pool_record(data)?;
    let classification = lifecycle::classify(&record, caller, participation, now);
    Ok((record, classification))
}
