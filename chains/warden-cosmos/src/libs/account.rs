use cosmrs::{crypto::PublicKey, AccountId, Any};
use tendermint::account::Id as TendermintAccountId;
use tendermint::public_key::PublicKey as TendermintPublicKey;

use warden_core::ChainResult;

use crate::WardenCosmosError;

/// Bech32 consensus addresses derived the way the chain derives them.
pub struct ConsensusAddress;

impl ConsensusAddress {
    /// Consensus address of a validator's packed consensus public key:
    /// the first 20 bytes of SHA256(pubkey) for ed25519, RIPEMD160(SHA256(pubkey))
    /// for secp256k1, encoded with `prefix`.
    pub fn from_pubkey(pub_key: &Any, prefix: &str) -> ChainResult<String> {
        let pub_key = PublicKey::try_from(pub_key)
            .map_err(|e| WardenCosmosError::PublicKeyError(e.to_string()))?;
        let tendermint_pub_key = TendermintPublicKey::from(pub_key);
        let tendermint_id = TendermintAccountId::from(tendermint_pub_key);
        Self::from_bytes(tendermint_id.as_bytes(), prefix)
    }

    /// Bech32 encode raw address bytes, e.g. a block header's proposer address.
    pub fn from_bytes(bytes: &[u8], prefix: &str) -> ChainResult<String> {
        let account_id = AccountId::new(prefix, bytes)
            .map_err(|e| WardenCosmosError::AddressError(e.to_string()))?;
        Ok(account_id.to_string())
    }
}
