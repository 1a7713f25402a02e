use alloy_primitives::{Address, U256};
use thiserror::Error;

use crate::payload::ParamType;

/// Failure to build an outbound call payload from its declared schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("{operation} takes {expected} arguments, got {got}")]
    ArityMismatch {
        operation: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("{operation} argument {position} is not a valid {expected}")]
    TypeMismatch {
        operation: &'static str,
        position: usize,
        expected: ParamType,
    },

    #[error("value {0} does not fit in uint256")]
    Overflow(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("insufficient balance of {token} for {holder}: have {balance}, need {requested}")]
    InsufficientBalance {
        token: Address,
        holder: Address,
        balance: U256,
        requested: U256,
    },
}

/// Every way an instruction can be rejected. A rejected instruction never
/// mutates engine state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RollupError {
    #[error("failed to validate input: {0}")]
    Validation(String),

    #[error("unknown path: {0}")]
    UnknownPath(String),

    #[error("failed to encode payload: {0}")]
    Encoding(#[from] EncodeError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("no NFT deployed at {0}")]
    UnknownDeployment(Address),

    #[error("no NFT has been deployed yet")]
    NoDeployment,
}

impl RollupError {
    pub fn validation(msg: impl Into<String>) -> Self {
        RollupError::Validation(msg.into())
    }
}

impl From<serde_json::Error> for RollupError {
    fn from(e: serde_json::Error) -> Self {
        RollupError::Validation(e.to_string())
    }
}

pub type RollupResult<T> = Result<T, RollupError>;
