//! Solidity ABI values and revert decoding.
//!
//! Encoding and decoding go through `alloy-dyn-abi`. It does not range-check
//! integer widths, so [`check_widths`] runs on both sides of the wire.

pub use alloy_dyn_abi::{DynSolType, DynSolValue};

use alloy_primitives::I256;
use alloy_sol_types::{Panic, Revert, SolError};

/// Reject `uintN`/`intN` values that do not fit their declared width,
/// including those nested in arrays and tuples.
pub fn check_widths(values: &[DynSolValue]) -> Result<(), String> {
	for value in values {
		match value {
			DynSolValue::Uint(n, bits) if n.bit_len() > *bits => {
				return Err(format!("{n} does not fit uint{bits}"));
			}
			DynSolValue::Int(n, bits) if !int_fits(*n, *bits) => {
				return Err(format!("{n} does not fit int{bits}"));
			}
			DynSolValue::Array(items) | DynSolValue::FixedArray(items) | DynSolValue::Tuple(items) => {
				check_widths(items)?;
			}
			_ => {}
		}
	}
	Ok(())
}

fn int_fits(n: I256, bits: usize) -> bool {
	if bits == 0 || bits >= 256 {
		return bits != 0;
	}
	let limit = I256::ONE << (bits - 1);
	n >= -limit && n < limit
}

/// Human-readable reason from `Error(string)` or `Panic(uint256)` revert
/// data. Anything else yields `None`.
pub fn decode_revert_reason(data: &[u8]) -> Option<String> {
	if let Ok(revert) = Revert::abi_decode(data) {
		return Some(revert.reason);
	}
	Panic::abi_decode(data)
		.ok()
		.map(|panic| format!("panic code 0x{:x}", panic.code))
}
