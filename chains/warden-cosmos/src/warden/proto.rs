//! Only the fields the exporter reads are declared; prost skips the rest
//! while decoding.

use cosmrs::proto::cosmos::base::query::v1beta1::{PageRequest, PageResponse};
use cosmrs::proto::cosmos::base::v1beta1::Coin as ProtoCoin;

use warden_core::{Coin, Keychain as WardenKeychain, KeychainFees as WardenKeychainFees};

/// Any list query that only takes pagination
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QueryPaginatedRequest {
    /// Page selection
    #[prost(message, optional, tag = "1")]
    pub pagination: Option<PageRequest>,
}

/// Any list response, read for its page totals only
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QueryPaginatedResponse {
    /// Page info
    #[prost(message, optional, tag = "1")]
    pub pagination: Option<PageResponse>,
}

/// `QueryKeyRequestsRequest` and `QuerySignRequestsRequest`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QueryByKeychainRequest {
    /// Page selection
    #[prost(message, optional, tag = "1")]
    pub pagination: Option<PageRequest>,
    /// Keychain the requests are addressed to
    #[prost(uint64, tag = "2")]
    pub keychain_id: u64,
}

/// `QueryAllKeysRequest`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QueryAllKeysRequest {
    /// Page selection
    #[prost(message, optional, tag = "1")]
    pub pagination: Option<PageRequest>,
}

/// `QueryKeysResponse`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QueryKeysResponse {
    /// Page info
    #[prost(message, optional, tag = "1")]
    pub pagination: Option<PageResponse>,
    /// Keys on this page
    #[prost(message, repeated, tag = "2")]
    pub keys: Vec<QueryKeyResponse>,
}

/// `QueryKeyResponse`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QueryKeyResponse {
    /// The key
    #[prost(message, optional, tag = "1")]
    pub key: Option<Key>,
}

/// `Key`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Key {
    /// Key id
    #[prost(uint64, tag = "1")]
    pub id: u64,
    /// Signature scheme, see [`KeyType`]
    #[prost(int32, tag = "4")]
    pub r#type: i32,
}

/// `KeyType` values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum KeyType {
    /// Not yet assigned
    Unspecified = 0,
    /// ECDSA secp256k1
    EcdsaSecp256k1 = 1,
    /// EdDSA ed25519
    EddsaEd25519 = 2,
}

/// `QueryKeychainByIdRequest`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QueryKeychainByIdRequest {
    /// Keychain id
    #[prost(uint64, tag = "1")]
    pub id: u64,
}

/// `QueryKeychainByIdResponse`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QueryKeychainByIdResponse {
    /// The keychain
    #[prost(message, optional, tag = "1")]
    pub keychain: Option<Keychain>,
}

/// `Keychain`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Keychain {
    /// Keychain id
    #[prost(uint64, tag = "1")]
    pub id: u64,
    /// Creator account
    #[prost(string, tag = "2")]
    pub creator: String,
    /// Display name
    #[prost(string, tag = "3")]
    pub name: String,
    /// Admin accounts
    #[prost(string, repeated, tag = "4")]
    pub admins: Vec<String>,
    /// Writer accounts
    #[prost(string, repeated, tag = "5")]
    pub writers: Vec<String>,
    /// Fees
    #[prost(message, optional, tag = "6")]
    pub fees: Option<KeychainFees>,
    /// Description
    #[prost(string, tag = "7")]
    pub description: String,
}

/// `KeychainFees`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct KeychainFees {
    /// Fee per key request
    #[prost(message, repeated, tag = "1")]
    pub key_req: Vec<ProtoCoin>,
    /// Fee per signature request
    #[prost(message, repeated, tag = "2")]
    pub sig_req: Vec<ProtoCoin>,
}

fn coins(coins: Vec<ProtoCoin>) -> Vec<Coin> {
    coins
        .into_iter()
        .map(|c| Coin::new(c.denom, c.amount))
        .collect()
}

impl From<Keychain> for WardenKeychain {
    fn from(keychain: Keychain) -> Self {
        let fees = keychain.fees.unwrap_or_default();
        WardenKeychain {
            id: keychain.id,
            creator: keychain.creator,
            name: keychain.name,
            admins: keychain.admins,
            fees: WardenKeychainFees {
                key_req: coins(fees.key_req),
                sig_req: coins(fees.sig_req),
            },
            description: keychain.description,
        }
    }
}
