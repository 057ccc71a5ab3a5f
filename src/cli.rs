use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
	name = "ethutil",
	about = "Query balances and send signed transactions to an Ethereum-compatible node.",
	version
)]
pub struct Cli {
	/// Override RPC endpoint URL.
	#[arg(long = "rpc", global = true)]
	pub rpc_url: Option<String>,

	/// Sign with EIP-155 replay protection for this chain id.
	#[arg(long, global = true)]
	pub chain_id: Option<u64>,

	/// Config file to use instead of ~/.ethutil/config.toml.
	#[arg(long, global = true)]
	pub config: Option<PathBuf>,

	/// Increase log verbosity (-v debug, -vv trace).
	#[arg(short, long, action = ArgAction::Count, global = true)]
	pub verbose: u8,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
	/// Show the native balance of an account, or its token balance when a
	/// contract is given.
	#[command(name = "balanceOf")]
	BalanceOf {
		/// Account to query.
		#[arg(long)]
		account: String,

		/// Token contract to query instead of the native balance.
		#[arg(long = "contract-addr", alias = "contractAddr")]
		contract: Option<String>,

		/// JSON ABI file replacing the bundled token ABI.
		#[arg(long)]
		abi: Option<PathBuf>,
	},

	/// Send native currency to an account.
	#[command(name = "sendETC")]
	SendEtc {
		#[command(flatten)]
		key: KeyArgs,

		/// Recipient account.
		#[arg(long)]
		account: String,

		/// Amount in wei, hex (0x-prefixed) or decimal.
		#[arg(long, default_value = "0xDE0B6B3A7640000")]
		amounts: String,

		#[command(flatten)]
		gas: GasArgs,
	},

	/// Show token name, decimals, symbol and total supply.
	#[command(name = "tokenInfo")]
	TokenInfo {
		#[command(flatten)]
		contract: ContractArgs,
	},

	/// Transfer tokens to an account.
	#[command(name = "sendToken")]
	SendToken {
		#[command(flatten)]
		contract: ContractArgs,

		#[command(flatten)]
		key: KeyArgs,

		/// Recipient account.
		#[arg(long)]
		account: String,

		/// Token amount in base units, hex (0x-prefixed) or decimal.
		#[arg(long, default_value = "100")]
		amounts: String,

		#[command(flatten)]
		gas: GasArgs,
	},

	/// Lock an account on the token contract.
	Lock {
		#[command(flatten)]
		contract: ContractArgs,

		#[command(flatten)]
		key: KeyArgs,

		/// Account to lock.
		#[arg(long)]
		account: String,

		#[command(flatten)]
		gas: GasArgs,
	},

	/// Unlock an account on the token contract.
	Unlock {
		#[command(flatten)]
		contract: ContractArgs,

		#[command(flatten)]
		key: KeyArgs,

		/// Account to unlock.
		#[arg(long)]
		account: String,

		#[command(flatten)]
		gas: GasArgs,
	},

	/// Check whether an account is locked on the token contract.
	#[command(name = "islock")]
	IsLock {
		#[command(flatten)]
		contract: ContractArgs,

		/// Account to check.
		#[arg(long)]
		account: String,
	},

	/// Print the 4-byte selector of one or more function signatures.
	Selector {
		/// Signatures such as `transfer(address,uint256)`.
		#[arg(required = true)]
		signatures: Vec<String>,
	},
}

/// Encrypted key file and its passphrase.
#[derive(Args)]
pub struct KeyArgs {
	/// Web3 v3 key file.
	#[arg(long)]
	pub keyfile: Option<PathBuf>,

	/// Passphrase for the key file.
	#[arg(long)]
	pub privatekey: Option<String>,
}

#[derive(Args)]
pub struct GasArgs {
	#[arg(long)]
	pub gas_limit: Option<u64>,

	/// Gas price in wei.
	#[arg(long)]
	pub gas_price: Option<u64>,
}

#[derive(Args)]
pub struct ContractArgs {
	/// Token contract address.
	#[arg(long = "contract-addr", alias = "contractAddr")]
	pub contract: Option<String>,

	/// JSON ABI file replacing the bundled token ABI.
	#[arg(long)]
	pub abi: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
	use super::*;
	use clap::CommandFactory;

	#[test]
	fn definition_is_valid() {
		Cli::command().debug_assert();
	}

	#[test]
	fn send_etc_defaults() {
		let cli = Cli::parse_from([
			"ethutil", "sendETC", "--keyfile", "k.json", "--privatekey", "pw", "--account",
			"0x49e7888acb220790b363e7061a8a9b46d58bfdc8",
		]);
		match cli.command {
			Command::SendEtc { amounts, gas, key, .. } => {
				assert_eq!(amounts, "0xDE0B6B3A7640000");
				assert!(gas.gas_limit.is_none());
				assert_eq!(key.privatekey.as_deref(), Some("pw"));
			}
			_ => panic!("wrong subcommand"),
		}
	}

	#[test]
	fn contract_addr_alias_and_global_flags() {
		let cli = Cli::parse_from([
			"ethutil",
			"islock",
			"--contractAddr",
			"0xcc33f3073f3e645f1a8ca094098cca68d8c1087c",
			"--account",
			"0x01",
			"--rpc",
			"http://node:8545",
			"--chain-id",
			"61",
			"-vv",
		]);
		assert_eq!(cli.rpc_url.as_deref(), Some("http://node:8545"));
		assert_eq!(cli.chain_id, Some(61));
		assert_eq!(cli.verbose, 2);
		match cli.command {
			Command::IsLock { contract, .. } => assert_eq!(
				contract.contract.as_deref(),
				Some("0xcc33f3073f3e645f1a8ca094098cca68d8c1087c")
			),
			_ => panic!("wrong subcommand"),
		}
	}

	#[test]
	fn selector_needs_a_signature() {
		assert!(Cli::try_parse_from(["ethutil", "selector"]).is_err());
	}
}
