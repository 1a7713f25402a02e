use alloy_primitives::{address, Address, Bytes};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Base-layer helper contracts the engine emits vouchers to.
///
/// The defaults are the deterministic deployments made with salt "1596".
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct ContractAddresses {
    pub nft_factory: Address,
    pub safe_erc721_mint: Address,
    pub safe_erc20_transfer: Address,
    pub emergency_withdraw: Address,
}

impl Default for ContractAddresses {
    fn default() -> Self {
        Self {
            nft_factory: address!("24D451CC632BE1FF86f0AaEaAC026261fFd889A0"),
            safe_erc721_mint: address!("4F85347240488E62ab1C6169Cbc532A09223efa4"),
            safe_erc20_transfer: address!("86E244fbb3243f19492A3d61336e285bbf8E6154"),
            emergency_withdraw: address!("A716b0bE3a59b05A307b98c6bAf9d21dF796F37d"),
        }
    }
}

/// A compiled contract artifact, as written by solc-based toolchains. Only
/// the creation bytecode is read.
#[derive(Deserialize, Debug)]
pub struct NftArtifact {
    pub bytecode: Bytes,
}

impl NftArtifact {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read(path)
            .with_context(|| format!("reading NFT artifact {}", path.display()))?;
        let artifact: NftArtifact = serde_json::from_slice(&raw)
            .with_context(|| format!("parsing NFT artifact {}", path.display()))?;
        if artifact.bytecode.is_empty() {
            return Err(anyhow::anyhow!("bytecode not found in {}", path.display()));
        }
        Ok(artifact)
    }
}

/// On-disk configuration. Exactly one of `nft_artifact` and `nft_init_code`
/// must be set.
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct ConfigFile {
    pub contracts: ContractAddresses,
    pub nft_artifact: Option<PathBuf>,
    pub nft_init_code: Option<Bytes>,
}

/// Everything the engine needs that isn't part of its replicated state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    pub contracts: ContractAddresses,
    /// Creation bytecode of the NFT the factory deploys, without constructor
    /// arguments.
    pub nft_init_code: Bytes,
}

impl EngineConfig {
    pub fn new(nft_init_code: Bytes) -> Self {
        Self {
            contracts: ContractAddresses::default(),
            nft_init_code,
        }
    }

    /// Loads a JSON config file. A relative `nft_artifact` path is resolved
    /// against the config file's directory.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw =
            std::fs::read(path).with_context(|| format!("reading config {}", path.display()))?;
        let file: ConfigFile = serde_json::from_slice(&raw)
            .with_context(|| format!("parsing config {}", path.display()))?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_file(file, base)
    }

    pub fn from_file(file: ConfigFile, base: &Path) -> anyhow::Result<Self> {
        let nft_init_code = match (file.nft_artifact, file.nft_init_code) {
            (Some(artifact), None) => NftArtifact::load(&base.join(artifact))?.bytecode,
            (None, Some(code)) if !code.is_empty() => code,
            (None, Some(_)) => return Err(anyhow::anyhow!("nft_init_code is empty")),
            (Some(_), Some(_)) => {
                return Err(anyhow::anyhow!(
                    "set either nft_artifact or nft_init_code, not both"
                ))
            }
            (None, None) => return Err(anyhow::anyhow!("no NFT bytecode configured")),
        };
        Ok(Self {
            contracts: file.contracts,
            nft_init_code,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("voucher-rollup-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn inline_init_code_with_default_contracts() {
        let file: ConfigFile = serde_json::from_str(r#"{"nft_init_code":"0x6080"}"#).unwrap();
        let config = EngineConfig::from_file(file, Path::new(".")).unwrap();
        assert_eq!(config.contracts, ContractAddresses::default());
        assert_eq!(config.nft_init_code, Bytes::from(vec![0x60, 0x80]));
    }

    #[test]
    fn contract_overrides_are_partial() {
        let file: ConfigFile = serde_json::from_str(
            r#"{"nft_init_code":"0x00","contracts":{"nft_factory":"0x0000000000000000000000000000000000000042"}}"#,
        )
        .unwrap();
        let config = EngineConfig::from_file(file, Path::new(".")).unwrap();
        assert_eq!(
            config.contracts.nft_factory,
            address!("0000000000000000000000000000000000000042")
        );
        assert_eq!(
            config.contracts.emergency_withdraw,
            ContractAddresses::default().emergency_withdraw
        );
    }

    #[test]
    fn artifact_is_resolved_relative_to_config() {
        write_temp("NFT.json", r#"{"abi":[],"bytecode":"0x60806040"}"#);
        let config_path = write_temp("config.json", r#"{"nft_artifact":"NFT.json"}"#);
        let config = EngineConfig::load(&config_path).unwrap();
        assert_eq!(config.nft_init_code, Bytes::from(vec![0x60, 0x80, 0x60, 0x40]));
    }

    #[test]
    fn bytecode_must_be_present() {
        let path = write_temp("Empty.json", r#"{"bytecode":"0x"}"#);
        assert!(NftArtifact::load(&path).is_err());

        let file: ConfigFile = serde_json::from_str("{}").unwrap();
        assert!(EngineConfig::from_file(file, Path::new(".")).is_err());

        let file: ConfigFile =
            serde_json::from_str(r#"{"nft_init_code":"0x00","nft_artifact":"x.json"}"#).unwrap();
        assert!(EngineConfig::from_file(file, Path::new(".")).is_err());
    }
}
