use std::fmt::{Display, Formatter};

use derive_new::new;

/// An amount of a single denom.
#[derive(Debug, Clone, Default, PartialEq, Eq, new)]
pub struct Coin {
    /// Denomination
    pub denom: String,
    /// Integer amount in the smallest unit
    pub amount: String,
}

impl Display for Coin {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// Fees a keychain charges for its services.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeychainFees {
    /// Fee per key request
    pub key_req: Vec<Coin>,
    /// Fee per signature request
    pub sig_req: Vec<Coin>,
}

impl Display for KeychainFees {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let join = |coins: &[Coin]| {
            coins
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(",")
        };
        write!(
            f,
            "key_req:[{}] sig_req:[{}]",
            join(&self.key_req),
            join(&self.sig_req)
        )
    }
}

/// A Warden keychain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keychain {
    /// Keychain id
    pub id: u64,
    /// Account that created the keychain
    pub creator: String,
    /// Display name
    pub name: String,
    /// Admin accounts
    pub admins: Vec<String>,
    /// Fees
    pub fees: KeychainFees,
    /// Free-form description
    pub description: String,
}

/// Keys grouped by signature scheme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyCounts {
    /// ECDSA secp256k1 keys
    pub ecdsa: u64,
    /// EdDSA ed25519 keys
    pub eddsa: u64,
    /// Keys of any other type, still waiting on a keychain
    pub pending: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fees_render_both_lists() {
        let fees = KeychainFees {
            key_req: vec![Coin::new("award".into(), "100".into())],
            sig_req: vec![
                Coin::new("award".into(), "5".into()),
                Coin::new("uward".into(), "7".into()),
            ],
        };
        assert_eq!(fees.to_string(), "key_req:[100award] sig_req:[5award,7uward]");
        assert_eq!(KeychainFees::default().to_string(), "key_req:[] sig_req:[]");
    }
}
