use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::error::RollupError;

/// Execution context the host supplies alongside every advance input.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Metadata {
    /// Who sent the input on the base layer.
    pub msg_sender: Address,
    /// Position of the input in the rollup's history; unique and increasing.
    pub index: u64,
    /// The application's own address on the base layer.
    pub app_contract: Address,
}

/// An asset deposit observed on the base layer. The portal contracts have
/// already moved the asset into the application's custody.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Deposit {
    Erc20 {
        token: Address,
        from: Address,
        amount: U256,
    },
    Ether {
        from: Address,
        value: U256,
    },
}

/// Every advance input is classified once, at the boundary, as either a
/// deposit notification or an application instruction.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum Input {
    Deposit(Deposit),
    /// Raw `{path, data}` JSON bytes.
    Instruction(Bytes),
}

/// Read-only output, never replayed on the base layer.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Report {
    pub payload: Bytes,
}

impl Report {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            payload: Bytes::from(text.into().into_bytes()),
        }
    }
}

/// What an accepted advance input produces, in emission order.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Output {
    Notice {
        payload: Bytes,
    },
    /// Replayed by the settlement bridge as a call to `destination`.
    Voucher {
        destination: Address,
        value: U256,
        payload: Bytes,
    },
    /// Replayed as a delegatecall, i.e. in the application's own storage and
    /// identity.
    DelegateVoucher {
        destination: Address,
        payload: Bytes,
    },
    Report(Report),
}

/// A rejected input: the reason, plus any reports emitted before rejecting.
/// Notices and vouchers of a rejected input are discarded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rejection {
    pub error: RollupError,
    pub reports: Vec<Report>,
}

impl From<RollupError> for Rejection {
    fn from(error: RollupError) -> Self {
        Self {
            error,
            reports: vec![],
        }
    }
}

/// The engine a rollup host drives, one input at a time.
///
/// `advance` either returns every output of the input and commits its state
/// changes, or rejects it and leaves state exactly as it was. `inspect` takes
/// `&self` and so cannot change state.
pub trait ExecutionEngine {
    fn advance(&mut self, metadata: Metadata, input: Input) -> Result<Vec<Output>, Rejection>;
    fn inspect(&self, payload: &[u8]) -> Result<Vec<Report>, Rejection>;
}
