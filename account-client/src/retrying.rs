// Copyright (c) James Kassemi, SC, US. All rights reserved.

use async_trait::async_trait;
use core_types::Pubkey;
use core_types::config::RetrySettings;
use core_types::retry::RetryPolicy;
use log::warn;

use crate::{AccountFetcher, FetchError, MemcmpFilter, RawAccount};

/// Retries transient failures of an inner fetcher with jittered backoff.
pub struct RetryingFetcher<F> {
    inner: F,
    policy: RetryPolicy,
}

impl<F> RetryingFetcher<F> {
    pub fn new(inner: F, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn from_settings(inner: F, settings: &RetrySettings) -> Self {
        Self::new(inner, RetryPolicy::from_settings(settings))
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }
}

#[async_trait]
impl<F: AccountFetcher> AccountFetcher for RetryingFetcher<F> {
    async fn fetch_accounts(
        &self,
        program: &Pubkey,
        filters: &[MemcmpFilter],
    ) -> Result<Vec<RawAccount>, FetchError> {
        self.policy
            .retry_async_if(
                |attempt| async move {
                    let result = self.inner.fetch_accounts(program, filters).await;
                    if let Err(err) = &result {
                        warn!("account fetch attempt {} failed: {}", attempt + 1, err);
                    }
                    result
                },
                FetchError::is_transient,
            )
            .await
    }
}
