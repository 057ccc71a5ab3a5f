use alloy_primitives::keccak256;

use crate::crypto;

/// Print the selector and full keccak hash of each signature.
pub fn run(signatures: &[String]) {
	for signature in signatures {
		let selector = crypto::function_selector(signature);
		println!(
			"{signature}: selector 0x{} hash 0x{}",
			hex::encode(selector),
			hex::encode(keccak256(signature.as_bytes()))
		);
	}
}
