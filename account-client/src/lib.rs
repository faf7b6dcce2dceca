// Copyright (c) James Kassemi, SC, US. All rights reserved.

//! Account fetch boundary.
//!
//! [`AccountFetcher`] is the only way the projector reaches the ledger. Transport,
//! authentication, and retry live on this side of the boundary.

mod memory;
mod retrying;

use std::sync::Arc;

use async_trait::async_trait;
use core_types::{Address, Pubkey};
use thiserror::Error;

pub use memory::InMemoryAccounts;
pub use retrying::RetryingFetcher;

/// Exact-match comparison of `bytes` at `offset` in the account data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemcmpFilter {
    pub offset: u32,
    pub bytes: Vec<u8>,
}

impl MemcmpFilter {
    pub fn new(offset: u32, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            offset,
            bytes: bytes.into(),
        }
    }

    pub fn matches(&self, data: &[u8]) -> bool {
        let start = self.offset as usize;
        start
            .checked_add(self.bytes.len())
            .and_then(|end| data.get(start..end))
            .is_some_and(|window| window == self.bytes.as_slice())
    }
}

/// One account as returned by the ledger query interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAccount {
    pub address: Address,
    pub data: Vec<u8>,
}

impl RawAccount {
    pub fn new(address: Address, data: impl Into<Vec<u8>>) -> Self {
        Self {
            address,
            data: data.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("request timed out")]
    Timeout,
    #[error("rate limited")]
    RateLimited,
    #[error("query rejected: {0}")]
    Rejected(String),
}

impl FetchError {
    /// Whether repeating the same request could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Transport(_) | FetchError::Timeout | FetchError::RateLimited => true,
            FetchError::Rejected(_) => false,
        }
    }
}

#[async_trait]
pub trait AccountFetcher: Send + Sync {
    /// All accounts owned by `program` whose data satisfies every filter.
    async fn fetch_accounts(
        &self,
        program: &Pubkey,
        filters: &[MemcmpFilter],
    ) -> Result<Vec<RawAccount>, FetchError>;
}

#[async_trait]
impl<T: AccountFetcher + ?Sized> AccountFetcher for Arc<T> {
    async fn fetch_accounts(
        &self,
        program: &Pubkey,
        filters: &[MemcmpFilter],
    ) -> Result<Vec<RawAccount>, FetchError> {
        (**self).fetch_accounts(program, filters).await
    }
}
