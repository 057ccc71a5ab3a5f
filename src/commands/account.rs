use alloy_primitives::{Address, B256, U256};
use anyhow::Result;

use crate::cli::{Cli, GasArgs, KeyArgs};
use crate::config::Config;
use crate::rpc::{ChainClient, Transport};
use crate::signer::{self, SigningKey, SigningScheme};
use crate::tx_builder;

use super::{load_signing_key, parse_address, parse_amount, resolve_gas, resolve_rpc, resolve_scheme};

/// Gas limit for a plain transfer when neither flag nor config sets one.
pub const DEFAULT_TRANSFER_GAS_LIMIT: u64 = 1_000_000;
/// Gas price in wei for a plain transfer when neither flag nor config sets one.
pub const DEFAULT_TRANSFER_GAS_PRICE: u64 = 1;

pub async fn balance_of(cli: &Cli, config: &Config, account: &str) -> Result<()> {
	let address = parse_address("account", account)?;
	let client = ChainClient::dial(&resolve_rpc(cli, config))?;

	let res = client.balance_at(address).await;
	client.close();

	println!("balance for {address} : {} Wei", res?);
	Ok(())
}

pub async fn send_etc(
	cli: &Cli,
	config: &Config,
	key: &KeyArgs,
	account: &str,
	amounts: &str,
	gas: &GasArgs,
) -> Result<()> {
	let to = parse_address("account", account)?;
	let value = parse_amount(amounts)?;
	let (gas_limit, gas_price) = resolve_gas(gas, config);
	let gas_limit = gas_limit.unwrap_or(DEFAULT_TRANSFER_GAS_LIMIT);
	let gas_price = gas_price.unwrap_or(U256::from(DEFAULT_TRANSFER_GAS_PRICE));
	let scheme = resolve_scheme(cli, config);

	let key = load_signing_key(key)?;
	let client = ChainClient::dial(&resolve_rpc(cli, config))?;

	let res = transfer(&client, key, to, value, gas_limit, gas_price, scheme).await;
	client.close();

	println!("send transaction:{}", res?);
	Ok(())
}

/// Fetch the sender's nonce, then build, sign and broadcast a value
/// transfer. Returns the transaction hash.
pub async fn transfer<T: Transport>(
	client: &ChainClient<T>,
	key: SigningKey,
	to: Address,
	value: U256,
	gas_limit: u64,
	gas_price: U256,
	scheme: SigningScheme,
) -> crate::error::Result<B256> {
	let from = key.address();
	let nonce = client.nonce_at(from).await?;
	tracing::debug!(%from, nonce, "resolved nonce");

	let tx = tx_builder::build_transfer(nonce, to, value, gas_limit, gas_price)?;
	let signed = signer::sign(tx, key, scheme)?;

	let hash = client.send_raw_transaction(signed.raw()).await?;
	if hash != signed.hash() {
		tracing::warn!(local = %signed.hash(), node = %hash, "node reported a different transaction hash");
	}
	tracing::info!(%hash, %from, %to, %value, "transfer sent");
	Ok(hash)
}
