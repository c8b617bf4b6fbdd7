use std::fmt::Debug;

use async_trait::async_trait;
use auto_impl::auto_impl;

use crate::ChainResult;

/// Read access to balances and supply. Amounts are raw integer strings.
#[async_trait]
#[auto_impl(&, Box, Arc)]
pub trait BankProvider: Send + Sync + Debug {
    /// Balance of `address` in `denom`
    async fn balance(&self, address: &str, denom: &str) -> ChainResult<String>;

    /// Total supply of `denom`
    async fn supply_of(&self, denom: &str) -> ChainResult<String>;
}

/// Read access to the mint module. Values are `LegacyDec` bytes as sent on the wire.
#[async_trait]
#[auto_impl(&, Box, Arc)]
pub trait MintProvider: Send + Sync + Debug {
    /// Current inflation rate
    async fn inflation(&self) -> ChainResult<Vec<u8>>;

    /// Current annual provisions
    async fn annual_provisions(&self) -> ChainResult<Vec<u8>>;
}

/// Read access to the auth module.
#[async_trait]
#[auto_impl(&, Box, Arc)]
pub trait AuthProvider: Send + Sync + Debug {
    /// Total number of accounts
    async fn accounts_total(&self) -> ChainResult<u64>;
}
