use std::fmt::Debug;

use async_trait::async_trait;
use auto_impl::auto_impl;

use crate::{BlockHeader, ChainResult};

/// Read access to block headers.
#[async_trait]
#[auto_impl(&, Box, Arc)]
pub trait BlockProvider: Send + Sync + Debug {
    /// Header of the latest committed block
    async fn latest_block(&self) -> ChainResult<BlockHeader>;

    /// Header of the block at `height`
    async fn block_by_height(&self, height: u64) -> ChainResult<BlockHeader>;
}
