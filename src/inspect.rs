//! Read-only queries over committed state. Nothing here can mutate the
//! rollup: every handler takes `&VoucherRollup`.

use alloy_primitives::Address;
use serde::Serialize;

use crate::engine::{unknown_path, VoucherRollup};
use crate::error::RollupResult;
use crate::rollup_lib::{Rejection, Report};
use crate::tx::{self, Envelope};

#[derive(Serialize, Debug, PartialEq, Eq)]
pub struct ContractEntry {
    pub name: String,
    /// EIP-55 checksummed.
    pub address: String,
}

impl ContractEntry {
    fn new(name: impl Into<String>, address: Address) -> Self {
        Self {
            name: name.into(),
            address: address.to_checksum(None),
        }
    }
}

pub fn inspect(rollup: &VoucherRollup, payload: &[u8]) -> Result<Vec<Report>, Rejection> {
    let envelope = Envelope::parse(payload)?;
    let report = match envelope.path.as_str() {
        "contracts" => contracts(rollup)?,
        "erc20_balance" => erc20_balance(rollup, envelope.data()?),
        "ether_balance" => ether_balance(rollup, envelope.data()?),
        path => return Err(unknown_path(path)),
    };
    Ok(vec![report])
}

/// Deployed NFTs in input order, then the fixed helper contracts.
pub fn contract_list(rollup: &VoucherRollup) -> Vec<ContractEntry> {
    let contracts = rollup.config().contracts;
    let mut entries: Vec<ContractEntry> = rollup
        .deployed_nfts()
        .map(|(deployment, address)| ContractEntry::new(deployment.name.clone(), address))
        .collect();
    entries.extend([
        ContractEntry::new("NFT Factory", contracts.nft_factory),
        ContractEntry::new("Emergency Withdraw", contracts.emergency_withdraw),
        ContractEntry::new("Safe ERC20 Transfer", contracts.safe_erc20_transfer),
        ContractEntry::new("Safe ERC721 Mint", contracts.safe_erc721_mint),
    ]);
    entries
}

fn contracts(rollup: &VoucherRollup) -> RollupResult<Report> {
    Ok(Report {
        payload: serde_json::to_vec(&contract_list(rollup))?.into(),
    })
}

fn erc20_balance(rollup: &VoucherRollup, data: tx::Erc20Balance) -> Report {
    let balance = rollup.ledger().balance_of(data.token, data.address);
    Report::text(format!("ERC20 balance of {}: {balance}", data.address))
}

fn ether_balance(rollup: &VoucherRollup, data: tx::EtherBalance) -> Report {
    let balance = rollup.ledger().ether_balance_of(data.address);
    Report::text(format!("Ether balance of {}: {balance}", data.address))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::{derive, salt_from_index};
    use crate::engine::tests::{instruction, metadata, rollup, SENDER};
    use crate::error::RollupError;
    use crate::payload::nft_constructor_args;
    use crate::rollup_lib::{Deposit, ExecutionEngine, Input};
    use alloy_primitives::{address, U256};

    const TOKEN: Address = address!("00000000000000000000000000000000000000ee");

    #[derive(serde::Deserialize)]
    struct Entry {
        name: String,
        address: Address,
    }

    fn report_text(reports: Vec<Report>) -> String {
        assert_eq!(reports.len(), 1);
        String::from_utf8(reports[0].payload.to_vec()).unwrap()
    }

    #[test]
    fn contracts_lists_derived_addresses() {
        let mut rollup = rollup();
        rollup
            .advance(
                metadata(0),
                instruction(r#"{"path":"deploy_nft","data":{"name":"Token","symbol":"TKN"}}"#),
            )
            .unwrap();
        rollup
            .advance(
                metadata(7),
                instruction(r#"{"path":"deploy_nft","data":{"name":"Badge","symbol":"BDG"}}"#),
            )
            .unwrap();

        let reports = rollup.inspect(br#"{"path":"contracts"}"#).unwrap();
        let entries: Vec<Entry> = serde_json::from_str(&report_text(reports)).unwrap();
        assert_eq!(entries.len(), 6);

        let factory = rollup.config().contracts.nft_factory;
        let code = &rollup.config().nft_init_code;
        let app = metadata(0).app_contract;
        assert_eq!(entries[0].name, "Token");
        assert_eq!(
            entries[0].address,
            derive(factory, salt_from_index(0), code, &nft_constructor_args(app, "Token", "TKN"))
        );
        assert_eq!(entries[1].name, "Badge");
        assert_eq!(
            entries[1].address,
            derive(factory, salt_from_index(7), code, &nft_constructor_args(app, "Badge", "BDG"))
        );
        assert_eq!(entries[2].name, "NFT Factory");
        assert_eq!(entries[2].address, factory);
    }

    #[test]
    fn helper_contracts_keep_their_positions() {
        let rollup = rollup();
        let contracts = rollup.config().contracts;
        let reports = rollup.inspect(br#"{"path":"contracts"}"#).unwrap();
        let entries: Vec<Entry> = serde_json::from_str(&report_text(reports)).unwrap();
        let listed: Vec<(&str, Address)> = entries
            .iter()
            .map(|entry| (entry.name.as_str(), entry.address))
            .collect();
        assert_eq!(
            listed,
            vec![
                ("NFT Factory", contracts.nft_factory),
                ("Emergency Withdraw", contracts.emergency_withdraw),
                ("Safe ERC20 Transfer", contracts.safe_erc20_transfer),
                ("Safe ERC721 Mint", contracts.safe_erc721_mint),
            ]
        );
    }

    #[test]
    fn contracts_uses_checksummed_addresses() {
        let rollup = rollup();
        let reports = rollup.inspect(br#"{"path":"contracts","data":{}}"#).unwrap();
        let text = report_text(reports);
        let factory = rollup.config().contracts.nft_factory.to_checksum(None);
        assert!(factory.chars().any(|c| c.is_ascii_uppercase()));
        assert!(text.starts_with(&format!(
            r#"[{{"name":"NFT Factory","address":"{factory}"}}"#
        )));
    }

    #[test]
    fn balances() {
        let mut rollup = rollup();
        rollup
            .advance(
                metadata(0),
                Input::Deposit(Deposit::Erc20 {
                    token: TOKEN,
                    from: SENDER,
                    amount: U256::from(1234),
                }),
            )
            .unwrap();
        rollup
            .advance(
                metadata(1),
                Input::Deposit(Deposit::Ether {
                    from: SENDER,
                    value: U256::from(5),
                }),
            )
            .unwrap();

        let query = format!(
            r#"{{"path":"erc20_balance","data":{{"token":"{TOKEN}","address":"{SENDER}"}}}}"#
        );
        let text = report_text(rollup.inspect(query.as_bytes()).unwrap());
        assert_eq!(text, format!("ERC20 balance of {SENDER}: 1234"));

        let query = format!(r#"{{"path":"ether_balance","data":{{"address":"{SENDER}"}}}}"#);
        let text = report_text(rollup.inspect(query.as_bytes()).unwrap());
        assert_eq!(text, format!("Ether balance of {SENDER}: 5"));
    }

    #[test]
    fn absent_balance_reads_as_zero() {
        let rollup = rollup();
        let query = format!(r#"{{"path":"ether_balance","data":{{"address":"{TOKEN}"}}}}"#);
        let text = report_text(rollup.inspect(query.as_bytes()).unwrap());
        assert_eq!(text, format!("Ether balance of {TOKEN}: 0"));
    }

    #[test]
    fn unknown_and_malformed_queries() {
        let rollup = rollup();
        let rejection = rollup.inspect(br#"{"path":"balances"}"#).unwrap_err();
        assert_eq!(rejection.error, RollupError::UnknownPath("balances".into()));
        assert_eq!(rejection.reports, vec![Report::text("Unknown path: balances")]);

        let rejection = rollup.inspect(br#"{"path":"erc20_balance","data":{}}"#).unwrap_err();
        assert!(matches!(rejection.error, RollupError::Validation(_)));
        assert!(rejection.reports.is_empty());
    }
}
