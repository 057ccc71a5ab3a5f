use alloy_consensus::TxLegacy;
use alloy_primitives::{Address, Bytes, TxKind, U256};

use crate::error::SigningError;

/// A legacy (untyped) transaction ready to be signed. `chain_id` stays
/// unset until the signer applies its scheme.
pub type UnsignedTransaction = TxLegacy;

/// Assemble an unsigned transaction. Value is unsigned by type; the gas
/// limit must be positive and the gas price must fit the legacy encoding.
pub fn build(
	nonce: u64,
	to: Address,
	value: U256,
	data: Bytes,
	gas_limit: u64,
	gas_price: U256,
) -> Result<UnsignedTransaction, SigningError> {
	if gas_limit == 0 {
		return Err(SigningError::InvalidTransaction(
			"gas limit must be positive".into(),
		));
	}
	let gas_price = u128::try_from(gas_price).map_err(|_| {
		SigningError::InvalidTransaction(format!("gas price {gas_price} exceeds u128"))
	})?;

	Ok(TxLegacy {
		chain_id: None,
		nonce,
		gas_price,
		gas_limit,
		to: TxKind::Call(to),
		value,
		input: data,
	})
}

/// Plain value transfer with empty call data.
pub fn build_transfer(
	nonce: u64,
	to: Address,
	value: U256,
	gas_limit: u64,
	gas_price: U256,
) -> Result<UnsignedTransaction, SigningError> {
	build(nonce, to, value, Bytes::new(), gas_limit, gas_price)
}

/// Contract write carrying ABI-encoded call data and no value.
pub fn build_contract_call(
	nonce: u64,
	contract: Address,
	data: Vec<u8>,
	gas_limit: u64,
	gas_price: U256,
) -> Result<UnsignedTransaction, SigningError> {
	build(nonce, contract, U256::ZERO, data.into(), gas_limit, gas_price)
}
