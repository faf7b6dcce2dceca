// Copyright (c) James Kassemi, SC, US. All rights reserved.

use core_types::{DoorIndex, PoolRecord, Pubkey, Stage};

use crate::cursor::RecordCursor;
use crate::error::{DecodeError, Result};
use crate::layout::{DISCRIMINATOR_LEN, MIN_RECORD_LEN, POOL_DISCRIMINATOR, record_len};

/// Decode one pool account.
///
/// Bytes past the end of the record are ignored. The winner/stage invariant is
/// not checked here.
pub fn decode_pool_record(data: &[u8]) -> Result<PoolRecord> {
    if data.len() < MIN_RECORD_LEN {
        return Err(DecodeError::Truncated {
            needed: MIN_RECORD_LEN,
            available: data.len(),
        });
    }

    let mut cursor = RecordCursor::new(data);
    let discriminator = cursor.read_fixed::<DISCRIMINATOR_LEN>()?;
    if discriminator != POOL_DISCRIMINATOR {
        return Err(DecodeError::DiscriminatorMismatch {
            found: discriminator,
        });
    }

    let creator = Pubkey(cursor.read_fixed()?);
    let arbiter = Pubkey(cursor.read_fixed()?);
    let min_deposit = cursor.read_u64()?;
    let total_pool = cursor.read_u64()?;
    let lock_time = cursor.read_i64()?;
    let winner_selection = cursor.read_option(|c| c.read_u8().map(DoorIndex))?;
    let stage = Stage::try_from(cursor.read_u8()?).map_err(DecodeError::InvalidStage)?;
    let participant_count = cursor.read_u8()?;
    let _bump = cursor.read_u8()?;
    let is_automatic = cursor.read_bool()?;

    Ok(PoolRecord {
        creator,
        arbiter,
        min_deposit,
        total_pool,
        lock_time,
        winner_selection,
        stage,
        participant_count,
        is_automatic,
    })
}

/// Serialize a record in ledger layout, e.g. for fixtures.
pub fn encode_pool_record(record: &PoolRecord, bump: u8) -> Vec<u8> {
    let mut out = Vec::with_capacity(record_len(record.winner_selection.is_some()));
    out.extend_from_slice(&POOL_DISCRIMINATOR);
    out.extend_from_slice(record.creator.as_bytes());
    out.extend_from_slice(record.arbiter.as_bytes());
    out.extend_from_slice(&record.min_deposit.to_le_bytes());
    out.extend_from_slice(&record.total_pool.to_le_bytes());
    out.extend_from_slice(&record.lock_time.to_le_bytes());
    match record.winner_selection {
        Some(door) => out.extend_from_slice(&[1, door.get()]),
        None => out.push(0),
    }
    out.push(record.stage.as_byte());
    out.push(record.participant_count);
    out.push(bump);
    out.push(u8::from(record.is_automatic));
    out
}
