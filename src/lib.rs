//! Deterministic rollup engine that turns application inputs into vouchers
//! for the base layer: NFT factory deployments at CREATE2-derived addresses,
//! ERC20 transfers backed by an internal ledger, and emergency withdrawals.

pub mod address;
pub mod config;
pub mod engine;
pub mod error;
pub mod inspect;
pub mod ledger;
pub mod payload;
pub mod rollup_lib;
pub mod tx;

pub use config::EngineConfig;
pub use engine::{RollupState, VoucherRollup};
pub use error::{RollupError, RollupResult};
pub use rollup_lib::{Deposit, ExecutionEngine, Input, Metadata, Output, Rejection, Report};
