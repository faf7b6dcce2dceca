// Copyright (c) James Kassemi, SC, US. All rights reserved.

use async_trait::async_trait;
use core_types::Pubkey;
use parking_lot::Mutex;
use std::collections::VecDeque;

use crate::{AccountFetcher, FetchError, MemcmpFilter, RawAccount};

/// Fixed account set that applies filters locally.
///
/// Queued failures are returned, one per call, before the accounts are served.
#[derive(Default)]
pub struct InMemoryAccounts {
    program: Pubkey,
    accounts: Mutex<Vec<RawAccount>>,
    failures: Mutex<VecDeque<FetchError>>,
    calls: Mutex<Vec<Vec<MemcmpFilter>>>,
}

impl InMemoryAccounts {
    pub fn new(program: Pubkey, accounts: Vec<RawAccount>) -> Self {
        Self {
            program,
            accounts: Mutex::new(accounts),
            failures: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn replace_accounts(&self, accounts: Vec<RawAccount>) {
        *self.accounts.lock() = accounts;
    }

    pub fn fail_next(&self, err: FetchError) {
        self.failures.lock().push_back(err);
    }

    /// Filters passed on each call so far, oldest first.
    pub fn calls(&self) -> Vec<Vec<MemcmpFilter>> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl AccountFetcher for InMemoryAccounts {
    async fn fetch_accounts(
        &self,
        program: &Pubkey,
        filters: &[MemcmpFilter],
    ) -> Result<Vec<RawAccount>, FetchError> {
        self.calls.lock().push(filters.to_vec());
        if let Some(err) = self.failures.lock().pop_front() {
            return Err(err);
        }
        if *program != self.program {
            return Ok(Vec::new());
        }
        let accounts = self.accounts.lock();
        Ok(accounts
            .iter()
            .filter(|account| filters.iter().all(|f| f.matches(&account.data)))
            .cloned()
            .collect())
    }
}
