use std::fmt::Debug;

use async_trait::async_trait;
use auto_impl::auto_impl;

use crate::{ChainResult, SigningInfo, ValidatorDescriptor};

/// Read access to the staking and slashing modules.
#[async_trait]
#[auto_impl(&, Box, Arc)]
pub trait StakingProvider: Send + Sync + Debug {
    /// Every validator signing info, following pagination to the end.
    async fn signing_infos(&self) -> ChainResult<Vec<SigningInfo>>;

    /// Every validator known to the staking module, following pagination to the end.
    async fn validators(&self) -> ChainResult<Vec<ValidatorDescriptor>>;
}
