use alloy_primitives::{keccak256, Address};
use k256::ecdsa::VerifyingKey;

// -- Function selectors --

/// First four bytes of `keccak256(signature)`, e.g. `transfer(address,uint256)`.
pub fn function_selector(signature: &str) -> [u8; 4] {
	let hash = keccak256(signature.as_bytes());
	[hash[0], hash[1], hash[2], hash[3]]
}

// -- Addresses --

/// Derive the account address for a public key: the last 20 bytes of the
/// keccak hash of the uncompressed point without its `0x04` prefix.
pub fn public_key_to_address(key: &VerifyingKey) -> Address {
	let point = key.to_encoded_point(false);
	let hash = keccak256(&point.as_bytes()[1..]);
	Address::from_slice(&hash[12..])
}

// -- Key file MAC --

/// MAC over a v3 key file ciphertext: `keccak256(derived[16..32] || ciphertext)`.
pub fn key_file_mac(derived_key: &[u8], ciphertext: &[u8]) -> [u8; 32] {
	let mut buf = Vec::with_capacity(16 + ciphertext.len());
	buf.extend_from_slice(&derived_key[16..32]);
	buf.extend_from_slice(ciphertext);
	keccak256(&buf).0
}
