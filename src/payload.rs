//! Call payloads for the contracts that vouchers are replayed against.
//!
//! Every payload is `selector(4 bytes) ++ abi_encode(args)`. The receiving
//! contracts' interfaces live in the single `sol!` block below, and
//! [`OPERATIONS`] describes the same functions as data so that callers can
//! encode from loosely typed arguments and get a typed error back instead of a
//! malformed call.

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::{sol, SolCall, SolValue};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::EncodeError;

sol! {
    function newNFT(address initialOwner, bytes32 salt, string name, string symbol) external;
    function safeMint(address nft, address to, string uri) external;
    function safeTransfer(address token, address to, uint256 amount) external;
    /// `target` is currently always equal to `to`.
    function safeTransferTargeted(address token, address to, address target, uint256 amount) external;
    function emergencyERC20Withdraw(address token, address to) external;
    function emergencyETHWithdraw(address to) external;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    Address,
    String,
    Bytes32,
    Uint256,
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ParamType::Address => "address",
            ParamType::String => "string",
            ParamType::Bytes32 => "bytes32",
            ParamType::Uint256 => "uint256",
        })
    }
}

/// The outbound calls the engine knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Operation {
    DeployNft,
    SafeMint,
    SafeTransfer,
    SafeTransferTargeted,
    EmergencyErc20Withdraw,
    EmergencyEthWithdraw,
}

#[derive(Debug, Serialize)]
pub struct OperationSchema {
    pub operation: Operation,
    pub name: &'static str,
    pub signature: &'static str,
    pub selector: [u8; 4],
    pub params: &'static [ParamType],
}

/// Indexed by `Operation as usize`.
pub static OPERATIONS: [OperationSchema; 6] = [
    OperationSchema {
        operation: Operation::DeployNft,
        name: "newNFT",
        signature: newNFTCall::SIGNATURE,
        selector: newNFTCall::SELECTOR,
        params: &[ParamType::Address, ParamType::Bytes32, ParamType::String, ParamType::String],
    },
    OperationSchema {
        operation: Operation::SafeMint,
        name: "safeMint",
        signature: safeMintCall::SIGNATURE,
        selector: safeMintCall::SELECTOR,
        params: &[ParamType::Address, ParamType::Address, ParamType::String],
    },
    OperationSchema {
        operation: Operation::SafeTransfer,
        name: "safeTransfer",
        signature: safeTransferCall::SIGNATURE,
        selector: safeTransferCall::SELECTOR,
        params: &[ParamType::Address, ParamType::Address, ParamType::Uint256],
    },
    OperationSchema {
        operation: Operation::SafeTransferTargeted,
        name: "safeTransferTargeted",
        signature: safeTransferTargetedCall::SIGNATURE,
        selector: safeTransferTargetedCall::SELECTOR,
        params: &[ParamType::Address, ParamType::Address, ParamType::Address, ParamType::Uint256],
    },
    OperationSchema {
        operation: Operation::EmergencyErc20Withdraw,
        name: "emergencyERC20Withdraw",
        signature: emergencyERC20WithdrawCall::SIGNATURE,
        selector: emergencyERC20WithdrawCall::SELECTOR,
        params: &[ParamType::Address, ParamType::Address],
    },
    OperationSchema {
        operation: Operation::EmergencyEthWithdraw,
        name: "emergencyETHWithdraw",
        signature: emergencyETHWithdrawCall::SIGNATURE,
        selector: emergencyETHWithdrawCall::SELECTOR,
        params: &[ParamType::Address],
    },
];

impl Operation {
    pub fn schema(self) -> &'static OperationSchema {
        &OPERATIONS[self as usize]
    }

    pub fn selector(self) -> [u8; 4] {
        self.schema().selector
    }
}

/// A runtime argument value, checked against the operation's declared
/// parameter types at encoding time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    Address(Address),
    String(String),
    Bytes32(B256),
    Uint256(U256),
}

impl Arg {
    pub fn param_type(&self) -> ParamType {
        match self {
            Arg::Address(_) => ParamType::Address,
            Arg::String(_) => ParamType::String,
            Arg::Bytes32(_) => ParamType::Bytes32,
            Arg::Uint256(_) => ParamType::Uint256,
        }
    }
}

/// Parses a decimal or `0x`-prefixed hex integer that has already been
/// checked for syntax. Anything that still fails to parse is out of range.
pub fn parse_uint256(text: &str) -> Result<U256, EncodeError> {
    U256::from_str(text).map_err(|_| EncodeError::Overflow(text.to_string()))
}

/// Walks the arguments in declared order, checking each against the schema.
struct ArgReader {
    schema: &'static OperationSchema,
    args: std::vec::IntoIter<Arg>,
    position: usize,
}

impl ArgReader {
    fn new(operation: Operation, args: Vec<Arg>) -> Result<Self, EncodeError> {
        let schema = operation.schema();
        if args.len() != schema.params.len() {
            return Err(EncodeError::ArityMismatch {
                operation: schema.name,
                expected: schema.params.len(),
                got: args.len(),
            });
        }
        Ok(Self {
            schema,
            args: args.into_iter(),
            position: 0,
        })
    }

    fn mismatch(&self, position: usize) -> EncodeError {
        EncodeError::TypeMismatch {
            operation: self.schema.name,
            position,
            expected: self.schema.params[position],
        }
    }

    fn next(&mut self) -> Result<(usize, Arg), EncodeError> {
        let position = self.position;
        let Some(arg) = self.args.next() else {
            return Err(EncodeError::ArityMismatch {
                operation: self.schema.name,
                expected: self.schema.params.len(),
                got: position,
            });
        };
        self.position += 1;
        if self.schema.params.get(position) != Some(&arg.param_type()) {
            return Err(self.mismatch(position));
        }
        Ok((position, arg))
    }

    fn address(&mut self) -> Result<Address, EncodeError> {
        match self.next()? {
            (_, Arg::Address(address)) => Ok(address),
            (position, _) => Err(self.mismatch(position)),
        }
    }

    fn string(&mut self) -> Result<String, EncodeError> {
        match self.next()? {
            (_, Arg::String(s)) => Ok(s),
            (position, _) => Err(self.mismatch(position)),
        }
    }

    fn bytes32(&mut self) -> Result<B256, EncodeError> {
        match self.next()? {
            (_, Arg::Bytes32(b)) => Ok(b),
            (position, _) => Err(self.mismatch(position)),
        }
    }

    fn uint256(&mut self) -> Result<U256, EncodeError> {
        match self.next()? {
            (_, Arg::Uint256(n)) => Ok(n),
            (position, _) => Err(self.mismatch(position)),
        }
    }
}

/// Builds the call payload for `operation`. Fails without side effects if the
/// arguments don't match the declared schema.
pub fn encode(operation: Operation, args: Vec<Arg>) -> Result<Bytes, EncodeError> {
    let mut r = ArgReader::new(operation, args)?;
    let payload = match operation {
        Operation::DeployNft => newNFTCall {
            initialOwner: r.address()?,
            salt: r.bytes32()?,
            name: r.string()?,
            symbol: r.string()?,
        }
        .abi_encode(),
        Operation::SafeMint => safeMintCall {
            nft: r.address()?,
            to: r.address()?,
            uri: r.string()?,
        }
        .abi_encode(),
        Operation::SafeTransfer => safeTransferCall {
            token: r.address()?,
            to: r.address()?,
            amount: r.uint256()?,
        }
        .abi_encode(),
        Operation::SafeTransferTargeted => safeTransferTargetedCall {
            token: r.address()?,
            to: r.address()?,
            target: r.address()?,
            amount: r.uint256()?,
        }
        .abi_encode(),
        Operation::EmergencyErc20Withdraw => emergencyERC20WithdrawCall {
            token: r.address()?,
            to: r.address()?,
        }
        .abi_encode(),
        Operation::EmergencyEthWithdraw => {
            emergencyETHWithdrawCall { to: r.address()? }.abi_encode()
        }
    };
    Ok(payload.into())
}

/// ABI-encoded `(address initialOwner, string name, string symbol)`, appended
/// to the NFT init code when the factory deploys it.
pub fn nft_constructor_args(initial_owner: Address, name: &str, symbol: &str) -> Vec<u8> {
    (initial_owner, name.to_string(), symbol.to_string()).abi_encode_params()
}
