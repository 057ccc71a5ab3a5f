pub mod key;

pub use key::SigningKey;

use alloy_consensus::transaction::RlpEcdsaEncodableTx;
use alloy_consensus::SignableTransaction;
use alloy_primitives::{keccak256, Address, Bytes, Signature, B256, U256};

use crate::error::SigningError;
use crate::tx_builder::UnsignedTransaction;

/// Replay-protection rules the target network expects.
///
/// A transaction signed under the wrong scheme is still produced locally;
/// the node is the one that rejects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningScheme {
	/// Pre-EIP-155 signatures, `v = 27 | 28`.
	Homestead,
	/// Chain-bound signatures, `v = recid + 35 + 2 * chain_id`.
	Eip155 { chain_id: u64 },
}

impl SigningScheme {
	pub fn from_chain_id(chain_id: Option<u64>) -> Self {
		match chain_id {
			Some(chain_id) => Self::Eip155 { chain_id },
			None => Self::Homestead,
		}
	}

	pub fn chain_id(&self) -> Option<u64> {
		match self {
			Self::Homestead => None,
			Self::Eip155 { chain_id } => Some(*chain_id),
		}
	}

	/// `v` for recovery id 0. Chain ids whose `v` does not fit a u64 are
	/// refused.
	fn v_base(&self) -> Result<u64, SigningError> {
		match self {
			Self::Homestead => Ok(27),
			Self::Eip155 { chain_id } => chain_id
				.checked_mul(2)
				.and_then(|v| v.checked_add(36))
				.map(|v| v - 1)
				.ok_or_else(|| {
					SigningError::InvalidTransaction(format!(
						"chain id {chain_id} is too large for a legacy signature"
					))
				}),
		}
	}
}

/// An immutable signed transaction together with its wire bytes and hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
	tx: UnsignedTransaction,
	signature: Signature,
	v: u64,
	raw: Bytes,
	hash: B256,
}

impl SignedTransaction {
	pub fn signature(&self) -> (u64, U256, U256) {
		(self.v, self.signature.r(), self.signature.s())
	}

	/// RLP bytes handed to `eth_sendRawTransaction`.
	pub fn raw(&self) -> &Bytes {
		&self.raw
	}

	/// On-chain identifier: `keccak256(raw)`.
	pub fn hash(&self) -> B256 {
		self.hash
	}

	/// Recover the sending address from the signature.
	pub fn recover_sender(&self) -> Result<Address, SigningError> {
		self.signature
			.recover_address_from_prehash(&self.tx.signature_hash())
			.map_err(|e| SigningError::Signature(e.to_string()))
	}
}

/// Sign `tx` under `scheme`.
///
/// The key is taken by value and dropped (zeroized) before this returns,
/// so it never outlives the signature it produced.
pub fn sign(
	mut tx: UnsignedTransaction,
	key: SigningKey,
	scheme: SigningScheme,
) -> Result<SignedTransaction, SigningError> {
	let v_base = scheme.v_base()?;
	tx.chain_id = scheme.chain_id();

	let sighash = tx.signature_hash();
	let signed = key.inner().sign_prehash_recoverable(sighash.as_slice());
	drop(key);
	let recoverable = signed.map_err(|e| SigningError::Signature(e.to_string()))?;

	// Nodes reject high-s signatures; normalizing flips the parity.
	let signature = Signature::from(recoverable).normalized_s();
	let v = v_base + u64::from(signature.v());

	let mut raw = Vec::with_capacity(tx.rlp_encoded_length_with_signature(&signature));
	tx.rlp_encode_signed(&signature, &mut raw);
	let raw = Bytes::from(raw);
	let hash = keccak256(&raw);
	tracing::debug!(%hash, nonce = tx.nonce, ?scheme, "signed transaction");

	Ok(SignedTransaction {
		tx,
		signature,
		v,
		raw,
		hash,
	})
}
