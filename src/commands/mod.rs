pub mod account;
pub mod selector;
pub mod token;

use std::sync::Arc;

use alloy_primitives::{Address, U256};

use crate::cli::{Cli, Command, ContractArgs, GasArgs, KeyArgs};
use crate::config::Config;
use crate::contracts::{ContractAbi, ContractBinding};
use crate::error::{Error, Result};
use crate::keystore;
use crate::signer::{SigningKey, SigningScheme};

/// Load config and run the selected subcommand.
pub async fn run(cli: &Cli) -> anyhow::Result<()> {
	let config = Config::load(cli.config.as_deref())?;

	match &cli.command {
		Command::BalanceOf {
			account,
			contract: None,
			..
		} => account::balance_of(cli, &config, account).await,
		Command::BalanceOf {
			account,
			contract: Some(contract),
			abi,
		} => {
			let args = ContractArgs {
				contract: Some(contract.clone()),
				abi: abi.clone(),
			};
			token::balance_of(cli, &config, &args, account).await
		}
		Command::SendEtc {
			key,
			account,
			amounts,
			gas,
		} => account::send_etc(cli, &config, key, account, amounts, gas).await,
		Command::TokenInfo { contract } => token::info(cli, &config, contract).await,
		Command::SendToken {
			contract,
			key,
			account,
			amounts,
			gas,
		} => token::send_token(cli, &config, contract, key, account, amounts, gas).await,
		Command::Lock {
			contract,
			key,
			account,
			gas,
		} => token::set_lock(cli, &config, contract, key, account, gas, true).await,
		Command::Unlock {
			contract,
			key,
			account,
			gas,
		} => token::set_lock(cli, &config, contract, key, account, gas, false).await,
		Command::IsLock { contract, account } => {
			token::is_lock(cli, &config, contract, account).await
		}
		Command::Selector { signatures } => {
			selector::run(signatures);
			Ok(())
		}
	}
}

/// Resolve the RPC URL from CLI flag or config.
pub fn resolve_rpc(cli: &Cli, config: &Config) -> String {
	cli.rpc_url
		.clone()
		.unwrap_or_else(|| config.network.rpc_url.clone())
}

/// `--chain-id` wins over config; neither means Homestead.
pub fn resolve_scheme(cli: &Cli, config: &Config) -> SigningScheme {
	SigningScheme::from_chain_id(cli.chain_id.or(config.network.chain_id))
}

/// Gas settings given by flag or config. Unset fields are left for the
/// caller to default or estimate.
pub fn resolve_gas(gas: &GasArgs, config: &Config) -> (Option<u64>, Option<U256>) {
	let limit = gas.gas_limit.or(config.gas.limit);
	let price = gas.gas_price.or(config.gas.price).map(U256::from);
	(limit, price)
}

/// Read and decrypt the key file named on the command line. Fails before
/// any network traffic.
pub fn load_signing_key(key: &KeyArgs) -> Result<SigningKey> {
	let path = key
		.keyfile
		.as_deref()
		.ok_or_else(|| Error::Configuration("--keyfile is required".into()))?;
	let passphrase = key
		.privatekey
		.as_deref()
		.ok_or_else(|| Error::Configuration("--privatekey is required".into()))?;

	let json = keystore::read_key_file(path)?;
	let key = keystore::decrypt(&json, passphrase)?;
	tracing::debug!(address = %key.address(), "key file decrypted");
	Ok(key)
}

pub fn parse_address(label: &str, s: &str) -> Result<Address> {
	s.trim()
		.parse()
		.map_err(|e| Error::Configuration(format!("invalid {label} address {s:?}: {e}")))
}

/// Amount in base units: `0x`-prefixed hex or plain decimal.
pub fn parse_amount(s: &str) -> Result<U256> {
	let s = s.trim();
	let (digits, radix) = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
		Some(hex) => (hex, 16),
		None => (s, 10),
	};
	if digits.is_empty() {
		return Err(Error::Configuration(format!("invalid amount {s:?}: no digits")));
	}
	U256::from_str_radix(digits, radix).map_err(|e| Error::Configuration(format!("invalid amount {s:?}: {e}")))
}

/// Contract address and ABI from flags, then config, then the bundled
/// token ABI.
pub fn resolve_binding(args: &ContractArgs, config: &Config) -> Result<ContractBinding> {
	let address = args
		.contract
		.as_deref()
		.or(config.contract.address.as_deref())
		.ok_or_else(|| {
			Error::Configuration(
				"no contract address; pass --contract-addr or set [contract] address".into(),
			)
		})?;
	let address = parse_address("contract", address)?;

	let abi = match args.abi.as_ref().or(config.contract.abi.as_ref()) {
		Some(path) => {
			let json = std::fs::read_to_string(path)?;
			ContractAbi::from_json(&json)?
		}
		None => ContractAbi::token()?,
	};

	Ok(ContractBinding::new(address, Arc::new(abi)))
}
