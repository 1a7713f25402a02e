use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::address::{derive, salt_from_index};
use crate::config::EngineConfig;
use crate::error::{RollupError, RollupResult};
use crate::inspect;
use crate::ledger::AssetLedger;
use crate::payload::{self, Arg, Operation};
use crate::rollup_lib::{Deposit, ExecutionEngine, Input, Metadata, Output, Rejection, Report};
use crate::tx::{self, Envelope};

/// An NFT the factory was asked to deploy. The address is not stored; it is
/// recomputed from these fields whenever it's needed.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Deployment {
    pub index: u64,
    pub name: String,
    pub symbol: String,
    pub owner: Address,
    pub salt: B256,
}

impl Deployment {
    pub fn address(&self, config: &EngineConfig) -> Address {
        derive(
            config.contracts.nft_factory,
            self.salt,
            &config.nft_init_code,
            &payload::nft_constructor_args(self.owner, &self.name, &self.symbol),
        )
    }
}

/// Replicated state: the only thing that survives from one input to the next.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
pub struct RollupState {
    pub ledger: AssetLedger,
    /// Keyed by the index of the input that requested the deployment.
    pub deployments: BTreeMap<u64, Deployment>,
}

/// The voucher rollup: NFT factory deployments, ERC20 bookkeeping and
/// emergency withdrawals, driven one input at a time by the host.
#[derive(Debug, Clone)]
pub struct VoucherRollup {
    config: EngineConfig,
    state: RollupState,
}

impl VoucherRollup {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_state(config, RollupState::default())
    }

    pub fn with_state(config: EngineConfig, state: RollupState) -> Self {
        Self { config, state }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> &RollupState {
        &self.state
    }

    pub fn ledger(&self) -> &AssetLedger {
        &self.state.ledger
    }

    /// Deployed NFTs with their addresses, in input order.
    pub fn deployed_nfts(&self) -> impl Iterator<Item = (&Deployment, Address)> + '_ {
        self.state
            .deployments
            .values()
            .map(|deployment| (deployment, deployment.address(&self.config)))
    }

    fn deposit(&mut self, deposit: Deposit) -> Output {
        let text = match deposit {
            Deposit::Erc20 { token, from, amount } => {
                self.state.ledger.credit(token, from, amount);
                info!(%token, %from, %amount, "ERC20 deposit");
                format!("ERC20 deposit: token {token}, sender {from}, amount {amount}")
            }
            Deposit::Ether { from, value } => {
                self.state.ledger.credit_ether(from, value);
                info!(%from, %value, "ether deposit");
                format!("Ether deposit: sender {from}, value {value}")
            }
        };
        Output::Notice {
            payload: Bytes::from(text.into_bytes()),
        }
    }

    fn instruction(
        &mut self,
        metadata: &Metadata,
        payload: &[u8],
    ) -> Result<Vec<Output>, Rejection> {
        let envelope = Envelope::parse(payload)?;
        let output = match envelope.path.as_str() {
            "deploy_nft" => self.deploy_nft(metadata, envelope.data()?)?,
            "mint_nft" => self.mint_nft(envelope.data()?)?,
            "safe_erc20_transfer" => {
                self.safe_erc20_transfer(metadata, envelope.data()?, Operation::SafeTransfer)?
            }
            "safe_erc20_transfer_targeted" => self.safe_erc20_transfer(
                metadata,
                envelope.data()?,
                Operation::SafeTransferTargeted,
            )?,
            "emergency_erc20_withdraw" => self.emergency_erc20_withdraw(envelope.data()?)?,
            "emergency_eth_withdraw" => self.emergency_eth_withdraw(envelope.data()?)?,
            path => return Err(unknown_path(path)),
        };
        Ok(vec![output])
    }

    fn deploy_nft(&mut self, metadata: &Metadata, data: tx::DeployNft) -> RollupResult<Output> {
        if self.state.deployments.contains_key(&metadata.index) {
            return Err(RollupError::validation(format!(
                "input {} already deployed an NFT",
                metadata.index
            )));
        }
        let salt = salt_from_index(metadata.index);
        let payload = payload::encode(
            Operation::DeployNft,
            vec![
                Arg::Address(metadata.app_contract),
                Arg::Bytes32(salt),
                Arg::String(data.name.clone()),
                Arg::String(data.symbol.clone()),
            ],
        )?;
        let deployment = Deployment {
            index: metadata.index,
            name: data.name,
            symbol: data.symbol,
            owner: metadata.app_contract,
            salt,
        };
        info!(
            index = metadata.index,
            nft = %deployment.address(&self.config),
            "deploying NFT {}",
            deployment.name
        );
        self.state.deployments.insert(metadata.index, deployment);
        Ok(Output::Voucher {
            destination: self.config.contracts.nft_factory,
            value: U256::ZERO,
            payload,
        })
    }

    fn mint_nft(&mut self, data: tx::MintNft) -> RollupResult<Output> {
        let nft = match data.nft {
            Some(requested) => self
                .deployed_nfts()
                .find(|(_, address)| *address == requested)
                .map(|(_, address)| address)
                .ok_or(RollupError::UnknownDeployment(requested))?,
            None => self
                .state
                .deployments
                .last_key_value()
                .map(|(_, deployment)| deployment.address(&self.config))
                .ok_or(RollupError::NoDeployment)?,
        };
        let payload = payload::encode(
            Operation::SafeMint,
            vec![Arg::Address(nft), Arg::Address(data.to), Arg::String(data.uri)],
        )?;
        debug!(%nft, to = %data.to, "minting");
        Ok(Output::DelegateVoucher {
            destination: self.config.contracts.safe_erc721_mint,
            payload,
        })
    }

    /// The payload is built before the ledger is touched, and the debit is the
    /// last fallible step, so a rejected transfer leaves no trace.
    fn safe_erc20_transfer(
        &mut self,
        metadata: &Metadata,
        data: tx::Erc20Transfer,
        operation: Operation,
    ) -> RollupResult<Output> {
        let amount = payload::parse_uint256(&data.amount.as_text())?;
        let args = match operation {
            Operation::SafeTransferTargeted => vec![
                Arg::Address(data.token),
                Arg::Address(data.to),
                Arg::Address(data.to),
                Arg::Uint256(amount),
            ],
            _ => vec![
                Arg::Address(data.token),
                Arg::Address(data.to),
                Arg::Uint256(amount),
            ],
        };
        let payload = payload::encode(operation, args)?;
        self.state
            .ledger
            .debit(data.token, metadata.msg_sender, amount)?;
        info!(
            token = %data.token,
            from = %metadata.msg_sender,
            to = %data.to,
            %amount,
            "ERC20 transfer"
        );
        Ok(Output::DelegateVoucher {
            destination: self.config.contracts.safe_erc20_transfer,
            payload,
        })
    }

    fn emergency_erc20_withdraw(
        &mut self,
        data: tx::EmergencyErc20Withdraw,
    ) -> RollupResult<Output> {
        let payload = payload::encode(
            Operation::EmergencyErc20Withdraw,
            vec![Arg::Address(data.token), Arg::Address(data.to)],
        )?;
        warn!(token = %data.token, to = %data.to, "emergency ERC20 withdraw");
        Ok(Output::DelegateVoucher {
            destination: self.config.contracts.emergency_withdraw,
            payload,
        })
    }

    fn emergency_eth_withdraw(&mut self, data: tx::EmergencyEthWithdraw) -> RollupResult<Output> {
        let payload =
            payload::encode(Operation::EmergencyEthWithdraw, vec![Arg::Address(data.to)])?;
        warn!(to = %data.to, "emergency ether withdraw");
        Ok(Output::DelegateVoucher {
            destination: self.config.contracts.emergency_withdraw,
            payload,
        })
    }
}

pub(crate) fn unknown_path(path: &str) -> Rejection {
    Rejection {
        error: RollupError::UnknownPath(path.to_string()),
        reports: vec![Report::text(format!("Unknown path: {path}"))],
    }
}

impl ExecutionEngine for VoucherRollup {
    fn advance(&mut self, metadata: Metadata, input: Input) -> Result<Vec<Output>, Rejection> {
        let result = match input {
            Input::Deposit(deposit) => Ok(vec![self.deposit(deposit)]),
            Input::Instruction(payload) => self.instruction(&metadata, &payload),
        };
        match &result {
            Ok(outputs) => debug!(index = metadata.index, outputs = outputs.len(), "accepted"),
            Err(rejection) => warn!(index = metadata.index, "rejected: {}", rejection.error),
        }
        result
    }

    fn inspect(&self, payload: &[u8]) -> Result<Vec<Report>, Rejection> {
        inspect::inspect(self, payload)
    }
}
