use std::collections::HashMap;

use derive_new::new;
use serde::Serialize;

/// Prefix shared by every staking bond status enum name.
const BOND_STATUS_PREFIX: &str = "BOND_STATUS_";

/// A validator's position in the staking lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, strum::EnumIter)]
pub enum BondStatus {
    /// Status not reported
    #[default]
    Unspecified,
    /// Not in the active set and not unbonding
    Unbonded,
    /// Leaving the active set
    Unbonding,
    /// In the active set
    Bonded,
}

impl BondStatus {
    /// The protobuf enum name, e.g. `BOND_STATUS_BONDED`.
    pub fn proto_name(&self) -> &'static str {
        match self {
            BondStatus::Unspecified => "BOND_STATUS_UNSPECIFIED",
            BondStatus::Unbonded => "BOND_STATUS_UNBONDED",
            BondStatus::Unbonding => "BOND_STATUS_UNBONDING",
            BondStatus::Bonded => "BOND_STATUS_BONDED",
        }
    }

    /// Map the staking module's numeric status. Unknown values are unspecified.
    pub fn from_proto(value: i32) -> Self {
        match value {
            1 => BondStatus::Unbonded,
            2 => BondStatus::Unbonding,
            3 => BondStatus::Bonded,
            _ => BondStatus::Unspecified,
        }
    }

    /// Metric label for this status.
    pub fn label(&self) -> String {
        bond_status_label(self.proto_name())
    }
}

/// Strip the `BOND_STATUS_` prefix from an enum name and lower-case the rest.
///
/// `BOND_STATUS_UNBONDING` becomes `unbonding`. Names without the prefix are
/// only lower-cased.
pub fn bond_status_label(name: &str) -> String {
    name.strip_prefix(BOND_STATUS_PREFIX)
        .unwrap_or(name)
        .to_lowercase()
}

/// A slashing-module signing info record.
#[derive(Debug, Clone, Default, PartialEq, Eq, new)]
pub struct SigningInfo {
    /// Bech32 consensus address
    pub address: String,
    /// Blocks missed in the current signed-blocks window
    pub missed_blocks_counter: u64,
    /// Whether the validator was tombstoned for double signing
    pub tombstoned: bool,
}

/// A staking-module validator description.
#[derive(Debug, Clone, Default, PartialEq, new)]
pub struct ValidatorDescriptor {
    /// Bech32 operator (valoper) address
    pub operator_address: String,
    /// Bech32 consensus address derived from the consensus public key
    pub consensus_address: String,
    /// Human readable name
    pub moniker: String,
    /// Jailed flag
    pub jailed: bool,
    /// Bond status
    pub bond_status: BondStatus,
    /// Bonded tokens in the base denom, as an integer string
    pub tokens: String,
    /// Delegator shares as a decimal string
    pub delegator_shares: String,
}

/// A validator as exported: signing info joined with its staking description.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Validator {
    /// Bech32 consensus address
    pub consensus_address: String,
    /// Bech32 operator address
    pub operator_address: String,
    /// Human readable name
    pub moniker: String,
    /// Blocks missed in the current window
    pub missed_blocks: u64,
    /// Jailed flag
    pub jailed: bool,
    /// Tombstoned flag
    pub tombstoned: bool,
    /// Bond status
    pub bond_status: BondStatus,
    /// Blocks proposed within the scanned window
    pub blocks_proposed: u64,
    /// Bonded tokens in the base denom
    pub tokens: String,
    /// Delegator shares
    pub delegator_shares: String,
}

/// Join signing infos with validators by consensus address.
///
/// Signing infos whose address has no matching validator are skipped; this
/// happens when a validator is removed between the two paged queries. The
/// skipped addresses are returned alongside the joined records.
pub fn join_signing_infos(
    signing_infos: Vec<SigningInfo>,
    validators: Vec<ValidatorDescriptor>,
) -> (Vec<Validator>, Vec<String>) {
    let mut by_consensus_address: HashMap<String, ValidatorDescriptor> = validators
        .into_iter()
        .map(|v| (v.consensus_address.clone(), v))
        .collect();

    let mut joined = Vec::with_capacity(signing_infos.len());
    let mut skipped = Vec::new();
    for info in signing_infos {
        let Some(descriptor) = by_consensus_address.remove(&info.address) else {
            skipped.push(info.address);
            continue;
        };
        joined.push(Validator {
            consensus_address: info.address,
            operator_address: descriptor.operator_address,
            moniker: descriptor.moniker,
            missed_blocks: info.missed_blocks_counter,
            jailed: descriptor.jailed,
            tombstoned: info.tombstoned,
            bond_status: descriptor.bond_status,
            blocks_proposed: 0,
            tokens: descriptor.tokens,
            delegator_shares: descriptor.delegator_shares,
        });
    }
    (joined, skipped)
}

/// Overlay proposer counts onto validators. Validators without an entry keep zero.
pub fn merge_proposer_counts(validators: &mut [Validator], counts: &HashMap<String, u64>) {
    for validator in validators.iter_mut() {
        validator.blocks_proposed = counts
            .get(&validator.consensus_address)
            .copied()
            .unwrap_or_default();
    }
}
