// Copyright (c) James Kassemi, SC, US. All rights reserved.

//! Decoder for the pool account byte layout.
//!
//! - [`decode_pool_record`]: raw account bytes to [`core_types::PoolRecord`].
//! - [`encode_pool_record`]: the inverse, for fixtures.
//! - [`layout`]: offsets and lengths, including the filter offsets used by bulk queries.

pub mod cursor;
pub mod error;
pub mod layout;
mod record;

pub use cursor::RecordCursor;
pub use error::DecodeError;
pub use layout::{
    CREATOR_OFFSET, MAX_RECORD_LEN, MIN_RECORD_LEN, OPEN_STAGE_OFFSET, POOL_DISCRIMINATOR,
};
pub use record::{decode_pool_record, encode_pool_record};
