use async_trait::async_trait;
use tonic::client::Grpc;
use tonic::codec::ProstCodec;
use tonic::codegen::http::uri::PathAndQuery;
use tracing::{debug, instrument};

use warden_core::{ChainCommunicationError, ChainResult, KeyCounts, Keychain, WardenProvider};

use crate::providers::{count_only, page_from};
use crate::warden::proto::{
    KeyType, QueryAllKeysRequest, QueryByKeychainRequest, QueryKeychainByIdRequest,
    QueryKeychainByIdResponse, QueryKeysResponse, QueryPaginatedRequest, QueryPaginatedResponse,
};
use crate::{GrpcProvider, WardenCosmosError};

const SPACES: &str = "/warden.warden.v1beta3.Query/Spaces";
const ALL_KEYS: &str = "/warden.warden.v1beta3.Query/AllKeys";
const KEYCHAINS: &str = "/warden.warden.v1beta3.Query/Keychains";
const KEYCHAIN_BY_ID: &str = "/warden.warden.v1beta3.Query/KeychainById";
const KEY_REQUESTS: &str = "/warden.warden.v1beta3.Query/KeyRequests";
const SIGN_REQUESTS: &str = "/warden.warden.v1beta3.Query/SignRequests";
const ACTIONS: &str = "/warden.act.v1beta1.Query/Actions";
const RULES: &str = "/warden.act.v1beta1.Query/Rules";
const INTENTS: &str = "/warden.intent.Query/Intents";

/// Page size used while walking every key
const KEY_PAGE_LIMIT: u64 = 200_000;

/// Query Client for the Warden custom modules
#[derive(Clone, Debug)]
pub struct WardenQueryClient {
    /// grpc provider
    grpc: GrpcProvider,
}

impl WardenQueryClient {
    /// Query the Warden modules over `grpc`'s channel.
    pub fn new(grpc: GrpcProvider) -> Self {
        Self { grpc }
    }

    async fn unary<Req, Resp>(&self, path: &'static str, request: Req) -> ChainResult<Resp>
    where
        Req: prost::Message + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        let mut grpc = Grpc::new(self.grpc.channel());
        grpc.ready().await.map_err(WardenCosmosError::from)?;
        let response = grpc
            .unary(
                tonic::Request::new(request),
                PathAndQuery::from_static(path),
                ProstCodec::<Req, Resp>::default(),
            )
            .await
            .map_err(WardenCosmosError::from)?;
        Ok(response.into_inner())
    }

    /// The total a list query reports for a one item page.
    async fn total<Req>(&self, path: &'static str, request: Req) -> ChainResult<u64>
    where
        Req: prost::Message + Send + Sync + 'static,
    {
        let response: QueryPaginatedResponse = self.unary(path, request).await?;
        response
            .pagination
            .map(|page| page.total)
            .ok_or(ChainCommunicationError::MissingField("pagination"))
    }
}

/// Group key types into counts. Anything not ECDSA or EdDSA is pending.
pub fn tally_key_types(types: impl IntoIterator<Item = i32>) -> KeyCounts {
    let mut counts = KeyCounts::default();
    for key_type in types {
        match key_type {
            t if t == KeyType::EcdsaSecp256k1 as i32 => counts.ecdsa += 1,
            t if t == KeyType::EddsaEd25519 as i32 => counts.eddsa += 1,
            _ => counts.pending += 1,
        }
    }
    counts
}

#[async_trait]
impl WardenProvider for WardenQueryClient {
    async fn spaces_total(&self) -> ChainResult<u64> {
        self.total(
            SPACES,
            QueryPaginatedRequest {
                pagination: count_only(),
            },
        )
        .await
    }

    #[instrument(skip(self), level = "debug")]
    async fn key_counts(&self) -> ChainResult<KeyCounts> {
        let mut counts = KeyCounts::default();
        let mut key = vec![];
        loop {
            let mut pagination = page_from(key);
            if let Some(page) = pagination.as_mut() {
                page.limit = KEY_PAGE_LIMIT;
            }
            let response: QueryKeysResponse = self
                .unary(ALL_KEYS, QueryAllKeysRequest { pagination })
                .await?;

            let page = tally_key_types(
                response
                    .keys
                    .iter()
                    .map(|k| k.key.as_ref().map(|k| k.r#type).unwrap_or_default()),
            );
            counts.ecdsa += page.ecdsa;
            counts.eddsa += page.eddsa;
            counts.pending += page.pending;

            key = match response.pagination {
                Some(page) if !page.next_key.is_empty() => page.next_key,
                _ => break,
            };
        }
        debug!(?counts, "Counted keys");
        Ok(counts)
    }

    async fn keychains_total(&self) -> ChainResult<u64> {
        self.total(
            KEYCHAINS,
            QueryPaginatedRequest {
                pagination: count_only(),
            },
        )
        .await
    }

    async fn keychain(&self, id: u64) -> ChainResult<Keychain> {
        let response: QueryKeychainByIdResponse = self
            .unary(KEYCHAIN_BY_ID, QueryKeychainByIdRequest { id })
            .await?;
        response
            .keychain
            .map(Keychain::from)
            .ok_or(ChainCommunicationError::MissingField("keychain"))
    }

    async fn key_requests_total(&self, keychain_id: u64) -> ChainResult<u64> {
        self.total(
            KEY_REQUESTS,
            QueryByKeychainRequest {
                pagination: count_only(),
                keychain_id,
            },
        )
        .await
    }

    async fn sign_requests_total(&self, keychain_id: u64) -> ChainResult<u64> {
        self.total(
            SIGN_REQUESTS,
            QueryByKeychainRequest {
                pagination: count_only(),
                keychain_id,
            },
        )
        .await
    }

    async fn intents_total(&self) -> ChainResult<u64> {
        self.total(
            INTENTS,
            QueryPaginatedRequest {
                pagination: count_only(),
            },
        )
        .await
    }

    async fn actions_total(&self) -> ChainResult<u64> {
        self.total(
            ACTIONS,
            QueryPaginatedRequest {
                pagination: count_only(),
            },
        )
        .await
    }

    async fn rules_total(&self) -> ChainResult<u64> {
        self.total(
            RULES,
            QueryPaginatedRequest {
                pagination: count_only(),
            },
        )
        .await
    }
}
