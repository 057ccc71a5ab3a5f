use alloy_primitives::{Address, B256, U256};
use anyhow::Result;

use crate::abi::DynSolValue;
use crate::cli::{Cli, ContractArgs, GasArgs, KeyArgs};
use crate::config::Config;
use crate::contracts::{ContractBinding, TxOptions};
use crate::error::{self, AbiError};
use crate::rpc::{ChainClient, Transport};
use crate::signer::{SigningKey, SigningScheme};

use super::{
	load_signing_key, parse_address, parse_amount, resolve_binding, resolve_gas, resolve_rpc,
	resolve_scheme,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
	pub name: String,
	pub symbol: String,
	pub decimals: u8,
	pub total_supply: U256,
}

pub async fn info(cli: &Cli, config: &Config, contract: &ContractArgs) -> Result<()> {
	let binding = resolve_binding(contract, config)?;
	let client = ChainClient::dial(&resolve_rpc(cli, config))?;

	let res = token_info(&binding, &client).await;
	client.close();

	let info = res?;
	println!("TokenName:{}", info.name);
	println!("Decimals:{}", info.decimals);
	println!("TokenSymbol:{}", info.symbol);
	println!("TokenTotalSupply:{}", info.total_supply);
	Ok(())
}

pub async fn balance_of(
	cli: &Cli,
	config: &Config,
	contract: &ContractArgs,
	account: &str,
) -> Result<()> {
	let binding = resolve_binding(contract, config)?;
	let owner = parse_address("account", account)?;
	let client = ChainClient::dial(&resolve_rpc(cli, config))?;

	let res = token_balance(&binding, &client, owner).await;
	client.close();

	println!("{owner} balance:{}", res?);
	Ok(())
}

pub async fn is_lock(cli: &Cli, config: &Config, contract: &ContractArgs, account: &str) -> Result<()> {
	let binding = resolve_binding(contract, config)?;
	let target = parse_address("account", account)?;
	let client = ChainClient::dial(&resolve_rpc(cli, config))?;

	let res = is_locked(&binding, &client, target).await;
	client.close();

	println!("{target} locked:{}", res?);
	Ok(())
}

pub async fn send_token(
	cli: &Cli,
	config: &Config,
	contract: &ContractArgs,
	key: &KeyArgs,
	account: &str,
	amounts: &str,
	gas: &GasArgs,
) -> Result<()> {
	let binding = resolve_binding(contract, config)?;
	let to = parse_address("account", account)?;
	let amount = parse_amount(amounts)?;
	let args = [DynSolValue::Address(to), DynSolValue::Uint(amount, 256)];
	write(cli, config, &binding, "transfer", &args, key, gas).await
}

/// `lock(account)` when `locked`, otherwise `unlock(account)`.
pub async fn set_lock(
	cli: &Cli,
	config: &Config,
	contract: &ContractArgs,
	key: &KeyArgs,
	account: &str,
	gas: &GasArgs,
	locked: bool,
) -> Result<()> {
	let binding = resolve_binding(contract, config)?;
	let target = parse_address("account", account)?;
	let method = if locked { "lock" } else { "unlock" };
	write(cli, config, &binding, method, &[DynSolValue::Address(target)], key, gas).await
}

async fn write(
	cli: &Cli,
	config: &Config,
	binding: &ContractBinding,
	method: &str,
	args: &[DynSolValue],
	key: &KeyArgs,
	gas: &GasArgs,
) -> Result<()> {
	// Reject bad arguments before the key is touched.
	binding.encode_call(method, args)?;
	let (gas_limit, gas_price) = resolve_gas(gas, config);
	let scheme = resolve_scheme(cli, config);

	let key = load_signing_key(key)?;
	let client = ChainClient::dial(&resolve_rpc(cli, config))?;

	let res = submit(binding, &client, method, args, key, gas_limit, gas_price, scheme).await;
	client.close();

	println!("transaction hash:{}", res?);
	Ok(())
}

// -- Pipeline --

/// Read name, symbol, decimals and total supply.
pub async fn token_info<T: Transport>(
	binding: &ContractBinding,
	client: &ChainClient<T>,
) -> error::Result<TokenInfo> {
	let name = read_one(binding, client, "name", &[]).await?;
	let decimals = read_one(binding, client, "decimals", &[]).await?;
	let symbol = read_one(binding, client, "symbol", &[]).await?;
	let total_supply = read_one(binding, client, "totalSupply", &[]).await?;

	let decimals = uint(&decimals, "decimals")?;
	Ok(TokenInfo {
		name: string(name, "name")?,
		symbol: string(symbol, "symbol")?,
		decimals: u8::try_from(decimals)
			.map_err(|_| AbiError::Decoding(format!("decimals {decimals} exceeds uint8")))?,
		total_supply: uint(&total_supply, "totalSupply")?,
	})
}

pub async fn token_balance<T: Transport>(
	binding: &ContractBinding,
	client: &ChainClient<T>,
	owner: Address,
) -> error::Result<U256> {
	let v = read_one(binding, client, "balanceOf", &[DynSolValue::Address(owner)]).await?;
	Ok(uint(&v, "balanceOf")?)
}

pub async fn is_locked<T: Transport>(
	binding: &ContractBinding,
	client: &ChainClient<T>,
	target: Address,
) -> error::Result<bool> {
	let v = read_one(binding, client, "isLock", &[DynSolValue::Address(target)]).await?;
	v.as_bool()
		.ok_or_else(|| AbiError::Decoding(format!("isLock returned {v:?}, expected bool")).into())
}

/// Resolve nonce and any missing gas setting from the node, then invoke
/// `method` as a transaction. A missing limit is estimated and a missing
/// price is taken from `eth_gasPrice`.
#[allow(clippy::too_many_arguments)]
pub async fn submit<T: Transport>(
	binding: &ContractBinding,
	client: &ChainClient<T>,
	method: &str,
	args: &[DynSolValue],
	key: SigningKey,
	gas_limit: Option<u64>,
	gas_price: Option<U256>,
	scheme: SigningScheme,
) -> error::Result<B256> {
	let from = key.address();
	let nonce = client.nonce_at(from).await?;
	tracing::debug!(%from, nonce, "resolved nonce");

	let gas_price = match gas_price {
		Some(price) => price,
		None => client.gas_price().await?,
	};
	let gas_limit = match gas_limit {
		Some(limit) => limit,
		None => {
			let data = binding.encode_call(method, args)?;
			client
				.estimate_gas(from, binding.address(), U256::ZERO, &data)
				.await?
		}
	};
	tracing::debug!(gas_limit, %gas_price, "gas resolved");

	let opts = TxOptions {
		nonce,
		gas_limit,
		gas_price,
		scheme,
	};
	binding.invoke_write(client, method, args, key, opts).await
}

async fn read_one<T: Transport>(
	binding: &ContractBinding,
	client: &ChainClient<T>,
	method: &str,
	args: &[DynSolValue],
) -> error::Result<DynSolValue> {
	binding
		.invoke_read(client, method, args)
		.await?
		.into_iter()
		.next()
		.ok_or_else(|| AbiError::Decoding(format!("{method} returned no values")).into())
}

fn uint(v: &DynSolValue, method: &str) -> Result<U256, AbiError> {
	v.as_uint()
		.map(|(n, _)| n)
		.ok_or_else(|| AbiError::Decoding(format!("{method} returned {v:?}, expected uint")))
}

fn string(v: DynSolValue, method: &str) -> Result<String, AbiError> {
	match v {
		DynSolValue::String(s) => Ok(s),
		other => Err(AbiError::Decoding(format!(
			"{method} returned {other:?}, expected string"
		))),
	}
}
