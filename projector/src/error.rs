// Copyright (c) James Kassemi, SC, US. All rights reserved.

use account_client::FetchError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProjectorError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProjectorError {
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),
}

impl ProjectorError {
    /// Bulk loads fail only on the fetch side, which the caller may retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProjectorError::Fetch(err) => err.is_transient(),
        }
    }
}
