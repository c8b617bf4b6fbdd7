use async_trait::async_trait;
use chrono::DateTime;
use tonic::transport::{Channel, ClientTlsConfig, Endpoint};
use tracing::{debug, instrument};

use cosmrs::proto::cosmos::auth::v1beta1::{
    query_client::QueryClient as AuthQueryClient, QueryAccountsRequest,
};
use cosmrs::proto::cosmos::bank::v1beta1::{
    query_client::QueryClient as BankQueryClient, QueryBalanceRequest, QuerySupplyOfRequest,
};
use cosmrs::proto::cosmos::base::query::v1beta1::PageRequest;
use cosmrs::proto::cosmos::base::tendermint::v1beta1::{
    service_client::ServiceClient, GetBlockByHeightRequest, GetLatestBlockRequest,
};
use cosmrs::proto::cosmos::mint::v1beta1::{
    query_client::QueryClient as MintQueryClient, QueryAnnualProvisionsRequest,
    QueryInflationRequest,
};
use cosmrs::proto::cosmos::slashing::v1beta1::{
    query_client::QueryClient as SlashingQueryClient, QuerySigningInfosRequest,
};
use cosmrs::proto::cosmos::staking::v1beta1::{
    query_client::QueryClient as StakingQueryClient, QueryValidatorsRequest,
};

use warden_core::{
    AuthProvider, BankProvider, BlockHeader, BlockProvider, BondStatus, ChainCommunicationError,
    ChainResult, MintProvider, SigningInfo, StakingProvider, ValidatorDescriptor,
};

use crate::{ConnectionConf, ConsensusAddress, WardenCosmosError};

/// Request a page starting at `key` with the node's default page size.
pub(crate) fn page_from(key: Vec<u8>) -> Option<PageRequest> {
    Some(PageRequest {
        key,
        offset: 0,
        limit: 0,
        count_total: false,
        reverse: false,
    })
}

/// Request a single item, asking the node to report the total.
pub(crate) fn count_only() -> Option<PageRequest> {
    Some(PageRequest {
        key: vec![],
        offset: 0,
        limit: 1,
        count_total: true,
        reverse: false,
    })
}

/// Grpc Provider
///
/// One lazily connected channel to the node, shared by every query. Cloning
/// is cheap and clones share the connection.
#[derive(Clone, Debug)]
pub struct GrpcProvider {
    channel: Channel,
    conf: ConnectionConf,
}

impl GrpcProvider {
    /// New GrpcProvider. The channel connects on first use, so this must run
    /// inside a tokio runtime but never blocks.
    pub fn new(conf: ConnectionConf) -> ChainResult<Self> {
        let channel = Self::endpoint(&conf)?.connect_lazy();
        Ok(Self { channel, conf })
    }

    /// Open a dedicated connection to the node now, failing if it cannot be
    /// established. The connection closes once the provider and all of its
    /// clones are dropped.
    #[instrument(skip_all, fields(url = %conf.grpc_url()))]
    pub async fn connect(conf: ConnectionConf) -> ChainResult<Self> {
        let channel = Self::endpoint(&conf)?
            .connect()
            .await
            .map_err(WardenCosmosError::from)?;
        debug!("connected to the node");
        Ok(Self { channel, conf })
    }

    fn endpoint(conf: &ConnectionConf) -> ChainResult<Endpoint> {
        let mut endpoint = Endpoint::from_shared(conf.grpc_url().to_string())
            .map_err(WardenCosmosError::from)?
            .timeout(conf.timeout())
            .connect_timeout(conf.timeout());
        if conf.tls() {
            endpoint = endpoint
                .tls_config(ClientTlsConfig::new().with_native_roots())
                .map_err(WardenCosmosError::from)?;
        }
        Ok(endpoint)
    }

    /// Get the channel
    pub fn channel(&self) -> Channel {
        self.channel.clone()
    }

    /// The connection configuration
    pub fn conf(&self) -> &ConnectionConf {
        &self.conf
    }

    fn block_header(
        &self,
        height: i64,
        time: Option<(i64, i32)>,
        proposer_address: &[u8],
    ) -> ChainResult<BlockHeader> {
        let height =
            u64::try_from(height).map_err(|_| ChainCommunicationError::InvalidHeight(height))?;
        let (seconds, nanos) = time.ok_or(ChainCommunicationError::MissingField("header.time"))?;
        let time = DateTime::from_timestamp(seconds, u32::try_from(nanos).unwrap_or_default())
            .ok_or_else(|| {
                WardenCosmosError::ParsingFailed(format!("block time {seconds}s out of range"))
            })?;
        let proposer =
            ConsensusAddress::from_bytes(proposer_address, &self.conf.consensus_prefix())?;
        Ok(BlockHeader::new(height, time, proposer))
    }
}

#[async_trait]
impl StakingProvider for GrpcProvider {
    #[instrument(skip(self), level = "debug")]
    async fn signing_infos(&self) -> ChainResult<Vec<SigningInfo>> {
        let mut client = SlashingQueryClient::new(self.channel());
        let mut infos = vec![];
        let mut key = vec![];
        loop {
            let response = client
                .signing_infos(QuerySigningInfosRequest {
                    pagination: page_from(key),
                })
                .await
                .map_err(WardenCosmosError::from)?
                .into_inner();

            infos.extend(response.info.into_iter().map(|info| {
                SigningInfo::new(
                    info.address,
                    u64::try_from(info.missed_blocks_counter).unwrap_or_default(),
                    info.tombstoned,
                )
            }));

            key = match response.pagination {
                Some(page) if !page.next_key.is_empty() => page.next_key,
                _ => break,
            };
        }
        debug!(count = infos.len(), "Fetched signing infos");
        Ok(infos)
    }

    #[instrument(skip(self), level = "debug")]
    async fn validators(&self) -> ChainResult<Vec<ValidatorDescriptor>> {
        let mut client = StakingQueryClient::new(self.channel());
        let prefix = self.conf.consensus_prefix();
        let mut validators = vec![];
        let mut key = vec![];
        loop {
            let response = client
                .validators(QueryValidatorsRequest {
                    // empty status returns validators of every status
                    status: String::new(),
                    pagination: page_from(key),
                })
                .await
                .map_err(WardenCosmosError::from)?
                .into_inner();

            for validator in response.validators {
                let pub_key = validator
                    .consensus_pubkey
                    .as_ref()
                    .ok_or(ChainCommunicationError::MissingField("validator.consensus_pubkey"))?;
                validators.push(ValidatorDescriptor::new(
                    validator.operator_address,
                    ConsensusAddress::from_pubkey(pub_key, &prefix)?,
                    validator
                        .description
                        .map(|d| d.moniker)
                        .unwrap_or_default(),
                    validator.jailed,
                    BondStatus::from_proto(validator.status),
                    validator.tokens,
                    validator.delegator_shares,
                ));
            }

            key = match response.pagination {
                Some(page) if !page.next_key.is_empty() => page.next_key,
                _ => break,
            };
        }
        debug!(count = validators.len(), "Fetched validators");
        Ok(validators)
    }
}

#[async_trait]
impl BlockProvider for GrpcProvider {
    async fn latest_block(&self) -> ChainResult<BlockHeader> {
        let mut client = ServiceClient::new(self.channel());
        let response = client
            .get_latest_block(GetLatestBlockRequest {})
            .await
            .map_err(WardenCosmosError::from)?
            .into_inner();
        let header = response
            .block
            .ok_or(ChainCommunicationError::MissingField("block"))?
            .header
            .ok_or(ChainCommunicationError::MissingField("block.header"))?;
        self.block_header(
            header.height,
            header.time.map(|t| (t.seconds, t.nanos)),
            &header.proposer_address,
        )
    }

    async fn block_by_height(&self, height: u64) -> ChainResult<BlockHeader> {
        let request_height = i64::try_from(height)
            .map_err(|_| ChainCommunicationError::InvalidHeight(i64::MAX))?;
        let mut client = ServiceClient::new(self.channel());
        let response = client
            .get_block_by_height(GetBlockByHeightRequest {
                height: request_height,
            })
            .await
            .map_err(WardenCosmosError::from)?
            .into_inner();
        let header = response
            .block
            .ok_or(ChainCommunicationError::MissingField("block"))?
            .header
            .ok_or(ChainCommunicationError::MissingField("block.header"))?;
        self.block_header(
            header.height,
            header.time.map(|t| (t.seconds, t.nanos)),
            &header.proposer_address,
        )
    }
}

#[async_trait]
impl BankProvider for GrpcProvider {
    async fn balance(&self, address: &str, denom: &str) -> ChainResult<String> {
        let mut client = BankQueryClient::new(self.channel());
        let response = client
            .balance(QueryBalanceRequest {
                address: address.to_owned(),
                denom: denom.to_owned(),
            })
            .await
            .map_err(WardenCosmosError::from)?
            .into_inner();
        Ok(response
            .balance
            .map(|coin| coin.amount)
            .unwrap_or_else(|| "0".to_owned()))
    }

    async fn supply_of(&self, denom: &str) -> ChainResult<String> {
        let mut client = BankQueryClient::new(self.channel());
        let response = client
            .supply_of(QuerySupplyOfRequest {
                denom: denom.to_owned(),
            })
            .await
            .map_err(WardenCosmosError::from)?
            .into_inner();
        response
            .amount
            .map(|coin| coin.amount)
            .ok_or(ChainCommunicationError::MissingField("amount"))
    }
}

#[async_trait]
impl MintProvider for GrpcProvider {
    async fn inflation(&self) -> ChainResult<Vec<u8>> {
        let mut client = MintQueryClient::new(self.channel());
        let response = client
            .inflation(QueryInflationRequest {})
            .await
            .map_err(WardenCosmosError::from)?
            .into_inner();
        Ok(response.inflation)
    }

    async fn annual_provisions(&self) -> ChainResult<Vec<u8>> {
        let mut client = MintQueryClient::new(self.channel());
        let response = client
            .annual_provisions(QueryAnnualProvisionsRequest {})
            .await
            .map_err(WardenCosmosError::from)?
            .into_inner();
        Ok(response.annual_provisions)
    }
}

#[async_trait]
impl AuthProvider for GrpcProvider {
    async fn accounts_total(&self) -> ChainResult<u64> {
        let mut client = AuthQueryClient::new(self.channel());
        let response = client
            .accounts(QueryAccountsRequest {
                pagination: count_only(),
            })
            .await
            .map_err(WardenCosmosError::from)?
            .into_inner();
        response
            .pagination
            .map(|page| page.total)
            .ok_or(ChainCommunicationError::MissingField("pagination"))
    }
}
