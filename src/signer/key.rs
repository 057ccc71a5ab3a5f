use std::fmt;

use alloy_primitives::Address;
use zeroize::Zeroizing;

use crate::crypto;
use crate::error::SigningError;

/// A decrypted secp256k1 private key.
///
/// The inner `k256` key zeroizes its scalar on drop. `Debug` only shows
/// the derived address, so the key can never end up in a log line.
pub struct SigningKey {
	inner: k256::ecdsa::SigningKey,
	address: Address,
}

impl SigningKey {
	pub fn from_slice(bytes: &[u8]) -> Result<Self, SigningError> {
		let inner = k256::ecdsa::SigningKey::from_slice(bytes)
			.map_err(|e| SigningError::InvalidKey(e.to_string()))?;
		let address = crypto::public_key_to_address(inner.verifying_key());
		Ok(Self { inner, address })
	}

	/// Parse a hex-encoded scalar (with or without `0x`).
	pub fn from_hex(s: &str) -> Result<Self, SigningError> {
		let clean = s.strip_prefix("0x").unwrap_or(s);
		let bytes = Zeroizing::new(
			hex::decode(clean).map_err(|e| SigningError::InvalidKey(e.to_string()))?,
		);
		Self::from_slice(&bytes)
	}

	/// Address controlled by this key.
	pub fn address(&self) -> Address {
		self.address
	}

	/// Raw scalar bytes, wrapped so the copy is wiped when dropped.
	pub fn to_bytes(&self) -> Zeroizing<[u8; 32]> {
		Zeroizing::new(self.inner.to_bytes().into())
	}

	pub(crate) fn inner(&self) -> &k256::ecdsa::SigningKey {
		&self.inner
	}
}

impl fmt::Debug for SigningKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SigningKey")
			.field("address", &self.address)
			.finish_non_exhaustive()
	}
}
