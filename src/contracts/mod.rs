use std::collections::HashMap;
use std::sync::Arc;

use alloy_dyn_abi::{FunctionExt, JsonAbiExt, Specifier};
use alloy_json_abi::{Function, JsonAbi, StateMutability};
use alloy_primitives::{Address, B256, U256};

use crate::abi::{self, DynSolValue};
use crate::error::{AbiError, Error, Result};
use crate::rpc::{ChainClient, Transport};
use crate::signer::{self, SigningKey, SigningScheme};
use crate::tx_builder;

/// ABI of the token contract the CLI talks to by default: ERC-20 plus the
/// `lock` / `unlock` / `isLock` account toggle.
pub const TOKEN_ABI_JSON: &str = include_str!("token.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
	/// `view` / `pure`: answered by `eth_call`, never mutates state.
	Read,
	/// Anything else: needs a signed transaction.
	Write,
}

/// One callable contract function whose parameter types all resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
	pub kind: MethodKind,
	function: Function,
}

impl MethodDescriptor {
	fn new(function: Function) -> Result<Self, AbiError> {
		for param in function.inputs.iter().chain(&function.outputs) {
			param.resolve().map_err(|e| {
				AbiError::UnsupportedType(format!("{} in {}: {e}", param.ty, function.name))
			})?;
		}
		let kind = match function.state_mutability {
			StateMutability::View | StateMutability::Pure => MethodKind::Read,
			_ => MethodKind::Write,
		};
		Ok(Self { kind, function })
	}

	pub fn name(&self) -> &str {
		&self.function.name
	}

	/// Canonical signature, e.g. `transfer(address,uint256)`.
	pub fn signature(&self) -> String {
		self.function.signature()
	}

	pub fn selector(&self) -> [u8; 4] {
		self.function.selector().0
	}

	/// Selector followed by the encoded arguments.
	pub fn encode_call(&self, args: &[DynSolValue]) -> Result<Vec<u8>, AbiError> {
		let mismatch = |msg: String| AbiError::ArgumentTypeMismatch(format!("{}: {msg}", self.signature()));
		abi::check_widths(args).map_err(mismatch)?;
		self.function
			.abi_encode_input(args)
			.map_err(|e| mismatch(e.to_string()))
	}

	pub fn decode_result(&self, raw: &[u8]) -> Result<Vec<DynSolValue>, AbiError> {
		if raw.is_empty() && !self.function.outputs.is_empty() {
			return Err(AbiError::Decoding(format!(
				"{} returned no data; is there a contract at this address?",
				self.name()
			)));
		}
		let decoding = |msg: String| AbiError::Decoding(format!("{}: {msg}", self.signature()));
		let values = self
			.function
			.abi_decode_output(raw)
			.map_err(|e| decoding(e.to_string()))?;
		abi::check_widths(&values).map_err(decoding)?;
		Ok(values)
	}
}

// -- ABI table --

/// Method table built from a JSON ABI. Built once, then shared read-only.
#[derive(Debug, Default)]
pub struct ContractAbi {
	methods: HashMap<String, MethodDescriptor>,
}

impl ContractAbi {
	/// Load every function entry. Overloads after the first and methods
	/// with parameter types we cannot encode are skipped, not fatal.
	pub fn from_json(json: &str) -> Result<Self, AbiError> {
		let parsed: JsonAbi =
			serde_json::from_str(json).map_err(|e| AbiError::InvalidAbi(e.to_string()))?;

		let mut methods = HashMap::new();
		for (name, overloads) in parsed.functions {
			let mut overloads = overloads.into_iter();
			let Some(first) = overloads.next() else {
				continue;
			};
			for skipped in overloads {
				tracing::debug!(signature = %skipped.signature(), "skipping overloaded method");
			}
			match MethodDescriptor::new(first) {
				Ok(method) => {
					methods.insert(name, method);
				}
				Err(e) => tracing::debug!(method = %name, error = %e, "skipping method"),
			}
		}

		Ok(Self { methods })
	}

	/// The bundled token ABI.
	pub fn token() -> Result<Self, AbiError> {
		Self::from_json(TOKEN_ABI_JSON)
	}

	pub fn method(&self, name: &str) -> Result<&MethodDescriptor, AbiError> {
		self.methods
			.get(name)
			.ok_or_else(|| AbiError::UnknownMethod(name.to_owned()))
	}
}

// -- Binding --

/// Gas, nonce and replay settings for one contract write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxOptions {
	pub nonce: u64,
	pub gas_limit: u64,
	pub gas_price: U256,
	pub scheme: SigningScheme,
}

/// A deployed contract at `address` whose methods are described by `abi`.
#[derive(Debug, Clone)]
pub struct ContractBinding {
	address: Address,
	abi: Arc<ContractAbi>,
}

impl ContractBinding {
	pub fn new(address: Address, abi: Arc<ContractAbi>) -> Self {
		Self { address, abi }
	}

	pub fn address(&self) -> Address {
		self.address
	}

	pub fn encode_call(&self, method: &str, args: &[DynSolValue]) -> Result<Vec<u8>, AbiError> {
		self.abi.method(method)?.encode_call(args)
	}

	pub fn decode_result(&self, method: &str, raw: &[u8]) -> Result<Vec<DynSolValue>, AbiError> {
		self.abi.method(method)?.decode_result(raw)
	}

	/// Encode, `eth_call`, decode.
	pub async fn invoke_read<T: Transport>(
		&self,
		client: &ChainClient<T>,
		method: &str,
		args: &[DynSolValue],
	) -> Result<Vec<DynSolValue>> {
		let descriptor = self.abi.method(method)?;
		let input = descriptor.encode_call(args)?;
		let raw = client.call(self.address, &input).await?;
		Ok(descriptor.decode_result(&raw)?)
	}

	/// Encode, build a transaction to this contract, sign it and broadcast
	/// it. The key is consumed by signing. Returns the transaction hash; the
	/// transaction may still be pending or fail on-chain.
	pub async fn invoke_write<T: Transport>(
		&self,
		client: &ChainClient<T>,
		method: &str,
		args: &[DynSolValue],
		key: SigningKey,
		opts: TxOptions,
	) -> Result<B256> {
		let descriptor = self.abi.method(method)?;
		if descriptor.kind == MethodKind::Read {
			return Err(Error::Configuration(format!(
				"{} is a read-only method",
				descriptor.signature()
			)));
		}

		let data = descriptor.encode_call(args)?;
		let tx = tx_builder::build_contract_call(
			opts.nonce,
			self.address,
			data,
			opts.gas_limit,
			opts.gas_price,
		)?;
		let signed = signer::sign(tx, key, opts.scheme)?;

		let hash = client.send_raw_transaction(signed.raw()).await?;
		if hash != signed.hash() {
			tracing::warn!(local = %signed.hash(), node = %hash, "node reported a different transaction hash");
		}
		tracing::info!(%hash, method = %descriptor.signature(), contract = %self.address, "transaction sent");
		Ok(hash)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn bundled_token_abi_loads() {
		let abi = ContractAbi::token().unwrap();
		for name in ["name", "symbol", "decimals", "totalSupply", "balanceOf", "isLock"] {
			assert_eq!(abi.method(name).unwrap().kind, MethodKind::Read, "{name}");
		}
		for name in ["transfer", "lock", "unlock"] {
			assert_eq!(abi.method(name).unwrap().kind, MethodKind::Write, "{name}");
		}
		// Events are not methods.
		assert!(matches!(abi.method("Transfer"), Err(AbiError::UnknownMethod(_))));
	}

	#[test]
	fn transfer_signature_and_selector() {
		let abi = ContractAbi::token().unwrap();
		let transfer = abi.method("transfer").unwrap();
		assert_eq!(transfer.signature(), "transfer(address,uint256)");
		assert_eq!(transfer.selector(), [0xa9, 0x05, 0x9c, 0xbb]);
	}

	#[test]
	fn encode_call_prefixes_selector() {
		let abi = ContractAbi::token().unwrap();
		let owner: Address = "0x63fdb173af269faf42a85a6a5964bb72830b8151".parse().unwrap();
		let data = abi
			.method("balanceOf")
			.unwrap()
			.encode_call(&[DynSolValue::Address(owner)])
			.unwrap();
		assert_eq!(data.len(), 4 + 32);
		assert_eq!(&data[..4], &[0x70, 0xa0, 0x82, 0x31]);
		assert_eq!(&data[16..], owner.as_slice());
	}

	#[test]
	fn encode_call_reports_wrong_arity() {
		let abi = ContractAbi::token().unwrap();
		let err = abi.method("transfer").unwrap().encode_call(&[]).unwrap_err();
		match err {
			AbiError::ArgumentTypeMismatch(msg) => assert!(msg.contains("transfer(address,uint256)")),
			other => panic!("unexpected {other:?}"),
		}
	}

	#[test]
	fn empty_return_data_is_a_decoding_error() {
		let abi = ContractAbi::token().unwrap();
		assert!(matches!(
			abi.method("decimals").unwrap().decode_result(&[]),
			Err(AbiError::Decoding(_))
		));
		// Methods without outputs accept empty data.
		assert_eq!(abi.method("lock").unwrap().decode_result(&[]).unwrap(), vec![]);
	}

	#[test]
	fn oversized_argument_is_a_mismatch() {
		let abi = ContractAbi::from_json(
			r#"[{"type": "function", "name": "setLevel", "inputs": [{"name": "level", "type": "uint8"}], "outputs": [], "stateMutability": "nonpayable"}]"#,
		)
		.unwrap();
		let err = abi
			.method("setLevel")
			.unwrap()
			.encode_call(&[DynSolValue::Uint(U256::from(256), 8)])
			.unwrap_err();
		assert!(matches!(err, AbiError::ArgumentTypeMismatch(_)));
	}

	#[test]
	fn out_of_range_result_is_a_decoding_error() {
		let abi = ContractAbi::token().unwrap();
		let mut word = [0u8; 32];
		word[30] = 1;
		assert!(matches!(
			abi.method("decimals").unwrap().decode_result(&word),
			Err(AbiError::Decoding(_))
		));
	}

	#[test]
	fn legacy_constant_flag_marks_reads() {
		let abi = ContractAbi::from_json(
			r#"[
				{"type": "function", "constant": true, "name": "owner", "inputs": [], "outputs": [{"name": "", "type": "address"}]},
				{"type": "function", "constant": false, "name": "kill", "inputs": [], "outputs": []}
			]"#,
		)
		.unwrap();
		assert_eq!(abi.method("owner").unwrap().kind, MethodKind::Read);
		assert_eq!(abi.method("kill").unwrap().kind, MethodKind::Write);
	}

	#[test]
	fn first_overload_wins() {
		let abi = ContractAbi::from_json(
			r#"[
				{"type": "function", "name": "mint", "inputs": [{"name": "amount", "type": "uint256"}], "outputs": [], "stateMutability": "nonpayable"},
				{"type": "function", "name": "mint", "inputs": [{"name": "to", "type": "address"}, {"name": "amount", "type": "uint256"}], "outputs": [], "stateMutability": "nonpayable"}
			]"#,
		)
		.unwrap();
		assert_eq!(abi.method("mint").unwrap().signature(), "mint(uint256)");
	}

	#[test]
	fn tuple_parameters_are_supported() {
		let abi = ContractAbi::from_json(
			r#"[
				{"type": "function", "name": "balanceOf", "inputs": [{"name": "owner", "type": "address"}], "outputs": [{"name": "", "type": "uint256"}], "stateMutability": "view"},
				{"type": "function", "name": "submit", "inputs": [{"name": "order", "type": "tuple", "components": [{"name": "to", "type": "address"}, {"name": "amount", "type": "uint256"}]}], "outputs": [], "stateMutability": "nonpayable"}
			]"#,
		)
		.unwrap();
		let submit = abi.method("submit").unwrap();
		assert_eq!(submit.signature(), "submit((address,uint256))");
		let data = submit
			.encode_call(&[DynSolValue::Tuple(vec![
				DynSolValue::Address(Address::ZERO),
				DynSolValue::Uint(U256::from(7), 256),
			])])
			.unwrap();
		assert_eq!(&data[..4], &crate::crypto::function_selector("submit((address,uint256))"));
		assert_eq!(data.len(), 4 + 64);
		assert!(abi.method("balanceOf").is_ok());
	}

	#[test]
	fn unresolvable_method_is_skipped() {
		let abi = ContractAbi::from_json(
			r#"[
				{"type": "function", "name": "balanceOf", "inputs": [{"name": "owner", "type": "address"}], "outputs": [{"name": "", "type": "uint256"}], "stateMutability": "view"},
				{"type": "function", "name": "weird", "inputs": [{"name": "x", "type": "uint7"}], "outputs": [], "stateMutability": "nonpayable"}
			]"#,
		)
		.unwrap();
		assert!(matches!(abi.method("weird"), Err(AbiError::UnknownMethod(_))));
		let data = abi
			.method("balanceOf")
			.unwrap()
			.encode_call(&[DynSolValue::Address(Address::ZERO)])
			.unwrap();
		assert_eq!(&data[..4], &[0x70, 0xa0, 0x82, 0x31]);
	}

	#[test]
	fn binding_decodes_by_method_name() {
		let binding = ContractBinding::new(Address::ZERO, Arc::new(ContractAbi::token().unwrap()));
		let mut word = [0u8; 32];
		word[31] = 1;
		assert_eq!(
			binding.decode_result("isLock", &word).unwrap(),
			vec![DynSolValue::Bool(true)]
		);
		assert!(matches!(
			binding.decode_result("burn", &word),
			Err(AbiError::UnknownMethod(_))
		));
	}

	#[test]
	fn malformed_json_is_rejected() {
		assert!(matches!(ContractAbi::from_json("{"), Err(AbiError::InvalidAbi(_))));
	}
}
