use alloy_primitives::{keccak256, Address, B256};

/// Computes the address a contract will have once `deployer` creates it with
/// CREATE2, before the deployment has happened on the base layer:
///
/// `last_20_bytes(keccak256(0xff ++ deployer ++ salt ++ keccak256(init_code ++ constructor_args)))`
pub fn derive(deployer: Address, salt: B256, init_code: &[u8], constructor_args: &[u8]) -> Address {
    let init_code_hash = keccak256([init_code, constructor_args].concat());
    deployer.create2(salt.0, init_code_hash.0)
}

/// Salt for a deployment triggered by the input at `index`.
///
/// The decimal rendering of the index is read as hex digits and left-padded
/// to 32 bytes, so index 10 becomes `0x..10` and not `0x..0a`. Existing
/// factory deployments depend on this encoding.
pub fn salt_from_index(index: u64) -> B256 {
    let mut salt = B256::ZERO;
    for (i, digit) in index.to_string().bytes().rev().enumerate() {
        let nibble = digit - b'0';
        salt[31 - i / 2] |= if i % 2 == 0 { nibble } else { nibble << 4 };
    }
    salt
}
