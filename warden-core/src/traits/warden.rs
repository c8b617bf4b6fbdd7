use std::fmt::Debug;

use async_trait::async_trait;
use auto_impl::auto_impl;

use crate::{ChainResult, KeyCounts, Keychain};

/// Read access to the Warden custom modules.
#[async_trait]
#[auto_impl(&, Box, Arc)]
pub trait WardenProvider: Send + Sync + Debug {
    /// Number of spaces
    async fn spaces_total(&self) -> ChainResult<u64>;

    /// Keys grouped by type, walking every page
    async fn key_counts(&self) -> ChainResult<KeyCounts>;

    /// Number of keychains
    async fn keychains_total(&self) -> ChainResult<u64>;

    /// A single keychain
    async fn keychain(&self, id: u64) -> ChainResult<Keychain>;

    /// Number of key requests addressed to a keychain
    async fn key_requests_total(&self, keychain_id: u64) -> ChainResult<u64>;

    /// Number of signature requests addressed to a keychain
    async fn sign_requests_total(&self, keychain_id: u64) -> ChainResult<u64>;

    /// Number of intents in the legacy intent module
    async fn intents_total(&self) -> ChainResult<u64>;

    /// Number of actions in the act module
    async fn actions_total(&self) -> ChainResult<u64>;

    /// Number of rules in the act module
    async fn rules_total(&self) -> ChainResult<u64>;
}
