//! Instruction envelopes and the `data` shape of every path.
//!
//! An instruction is `{"path": <string>, "data": <object>}`. The envelope is
//! parsed first; `data` is only parsed once the path is known, so an unknown
//! path can be reported by name.

use alloy_primitives::Address;
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{RollupError, RollupResult};

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Envelope {
    pub path: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl Envelope {
    pub fn parse(payload: &[u8]) -> RollupResult<Self> {
        let envelope: Envelope = serde_json::from_slice(payload)?;
        if envelope.path.is_empty() {
            return Err(RollupError::validation("path is required"));
        }
        Ok(envelope)
    }

    /// Parses `data` as `T` and checks its required fields.
    pub fn data<T: DeserializeOwned + Validate>(&self) -> RollupResult<T> {
        let data: T = serde_json::from_value(self.data.clone())?;
        data.validate()?;
        Ok(data)
    }
}

/// Required-field checks that serde alone doesn't express: required strings
/// must be non-empty and required addresses non-zero.
pub trait Validate {
    fn validate(&self) -> RollupResult<()>;
}

fn required_str(field: &str, value: &str) -> RollupResult<()> {
    if value.is_empty() {
        return Err(RollupError::validation(format!("{field} is required")));
    }
    Ok(())
}

fn required_address(field: &str, value: &Address) -> RollupResult<()> {
    if value.is_zero() {
        return Err(RollupError::validation(format!("{field} is required")));
    }
    Ok(())
}

/// A token amount as written by the client: a decimal or `0x` hex string, or
/// a JSON integer of any size. Range is checked when the amount is encoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Amount {
    Text(String),
    /// The integer's digits exactly as they appeared in the JSON.
    Number(String),
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::String(text) => Ok(Amount::Text(text)),
            serde_json::Value::Number(number) => Ok(Amount::Number(number.to_string())),
            other => Err(de::Error::custom(format!(
                "amount must be an integer or a string, got {other}"
            ))),
        }
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Amount::Text(text) => serializer.serialize_str(text),
            Amount::Number(digits) => match digits.parse::<serde_json::Number>() {
                Ok(number) => number.serialize(serializer),
                Err(_) => serializer.serialize_str(digits),
            },
        }
    }
}

impl Amount {
    pub fn as_text(&self) -> String {
        let (Amount::Text(text) | Amount::Number(text)) = self;
        text.clone()
    }

    fn validate(&self) -> RollupResult<()> {
        let (Amount::Text(text) | Amount::Number(text)) = self;
        let well_formed = match text.strip_prefix("0x") {
            Some(hex) => !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()),
            None => !text.is_empty() && text.chars().all(|c| c.is_ascii_digit()),
        };
        if !well_formed {
            return Err(RollupError::validation(format!("amount {text:?} is not an integer")));
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DeployNft {
    pub name: String,
    pub symbol: String,
}

impl Validate for DeployNft {
    fn validate(&self) -> RollupResult<()> {
        required_str("name", &self.name)?;
        required_str("symbol", &self.symbol)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct MintNft {
    pub to: Address,
    pub uri: String,
    /// Which deployment to mint from; the most recent one when absent.
    #[serde(default)]
    pub nft: Option<Address>,
}

impl Validate for MintNft {
    fn validate(&self) -> RollupResult<()> {
        required_address("to", &self.to)?;
        required_str("uri", &self.uri)
    }
}

/// Shared by `safe_erc20_transfer` and `safe_erc20_transfer_targeted`.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Erc20Transfer {
    pub token: Address,
    pub to: Address,
    pub amount: Amount,
}

impl Validate for Erc20Transfer {
    fn validate(&self) -> RollupResult<()> {
        required_address("token", &self.token)?;
        required_address("to", &self.to)?;
        self.amount.validate()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct EmergencyErc20Withdraw {
    pub token: Address,
    pub to: Address,
}

impl Validate for EmergencyErc20Withdraw {
    fn validate(&self) -> RollupResult<()> {
        required_address("token", &self.token)?;
        required_address("to", &self.to)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct EmergencyEthWithdraw {
    pub to: Address,
}

impl Validate for EmergencyEthWithdraw {
    fn validate(&self) -> RollupResult<()> {
        required_address("to", &self.to)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Erc20Balance {
    pub token: Address,
    pub address: Address,
}

impl Validate for Erc20Balance {
    fn validate(&self) -> RollupResult<()> {
        required_address("token", &self.token)?;
        required_address("address", &self.address)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct EtherBalance {
    pub address: Address,
}

impl Validate for EtherBalance {
    fn validate(&self) -> RollupResult<()> {
        required_address("address", &self.address)
    }
}
