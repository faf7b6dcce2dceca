// Copyright (c) James Kassemi, SC, US. All rights reserved.

use thiserror::Error;

use crate::layout::DISCRIMINATOR_LEN;

pub type Result<T> = std::result::Result<T, DecodeError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("record truncated: needed {needed} bytes, {available} available")]
    Truncated { needed: usize, available: usize },
    #[error("discriminator mismatch: found {found:?}")]
    DiscriminatorMismatch { found: [u8; DISCRIMINATOR_LEN] },
    #[error("stage byte {0} is not a known stage")]
    InvalidStage(u8),
    #[error("option presence tag {0} is neither 0 nor 1")]
    InvalidPresenceTag(u8),
    #[error("bool byte {0} is neither 0 nor 1")]
    InvalidBool(u8),
}
