use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::errors::WalletError;
use crate::stellar::strkey;

/// Number of stroops in one lumen.
pub const STROOPS_PER_XLM: i64 = 10_000_000;

/// Fractional digits carried by the native asset.
pub const XLM_DECIMALS: u32 = 7;

/// A validated `G...` account id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(String);

impl AccountId {
    pub fn parse(value: &str) -> Result<Self, WalletError> {
        strkey::decode_account_id(value)?;
        Ok(Self(value.to_string()))
    }

    pub fn from_public_key(public_key: &[u8; 32]) -> Self {
        Self(strkey::encode_account_id(public_key))
    }

    /// Raw ed25519 public key behind the id.
    pub fn public_key(&self) -> [u8; 32] {
        // checksum was verified on construction
        strkey::decode_account_id(&self.0).unwrap_or([0u8; 32])
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AccountId {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AccountId {
    type Error = WalletError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AccountId> for String {
    fn from(id: AccountId) -> Self {
        id.0
    }
}

/// Positive amount of XLM, held as stroops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(i64);

impl Amount {
    /// Smallest representable amount: one stroop.
    pub const MIN: Amount = Amount(1);

    pub fn from_stroops(stroops: i64) -> Result<Self, WalletError> {
        if stroops <= 0 {
            return Err(WalletError::InvalidAmount(format!(
                "{} stroops is not a positive amount",
                stroops
            )));
        }
        Ok(Self(stroops))
    }

    /// Converts an exact decimal lumen value. Callers validate range and
    /// precision first, see `core::validation::parse_amount`.
    pub(crate) fn from_decimal(value: Decimal) -> Option<Self> {
        let stroops = value.checked_mul(Decimal::from(STROOPS_PER_XLM))?.to_i64()?;
        if stroops <= 0 {
            return None;
        }
        Some(Self(stroops))
    }

    pub fn stroops(&self) -> i64 {
        self.0
    }

    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, XLM_DECIMALS)
    }
}

impl fmt::Display for Amount {
    /// Renders with all seven decimals, the way Horizon prints balances.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

/// Stellar networks the wallet knows how to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Testnet,
    Public,
    Futurenet,
}

impl Network {
    pub fn passphrase(&self) -> &'static str {
        match self {
            Network::Testnet => "Test SDF Network ; September 2015",
            Network::Public => "Public Global Stellar Network ; September 2015",
            Network::Futurenet => "Test SDF Future Network ; October 2022",
        }
    }

    pub fn default_horizon_url(&self) -> &'static str {
        match self {
            Network::Testnet => "https://horizon-testnet.stellar.org",
            Network::Public => "https://horizon.stellar.org",
            Network::Futurenet => "https://horizon-futurenet.stellar.org",
        }
    }

    pub fn default_explorer_url(&self) -> &'static str {
        match self {
            Network::Testnet => "https://stellar.expert/explorer/testnet",
            Network::Public => "https://stellar.expert/explorer/public",
            Network::Futurenet => "https://stellar.expert/explorer/futurenet",
        }
    }

    /// Name as reported by wallet extensions (`TESTNET`, `PUBLIC`).
    pub fn signer_name(&self) -> &'static str {
        match self {
            Network::Testnet => "TESTNET",
            Network::Public => "PUBLIC",
            Network::Futurenet => "FUTURENET",
        }
    }

    /// Accepts both config spellings and extension spellings.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "testnet" | "test" => Some(Network::Testnet),
            "public" | "mainnet" | "pubnet" => Some(Network::Public),
            "futurenet" => Some(Network::Futurenet),
            _ => None,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Testnet => write!(f, "testnet"),
            Network::Public => write!(f, "public"),
            Network::Futurenet => write!(f, "futurenet"),
        }
    }
}
