use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_RPC_URL: &str = "http://localhost:8545";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
	pub network: NetworkConfig,
	pub contract: ContractConfig,
	pub gas: GasConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
	pub rpc_url: String,
	/// Sign with EIP-155 replay protection for this chain. Unset means
	/// Homestead signatures.
	pub chain_id: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractConfig {
	/// Token contract used when `--contract-addr` is not given.
	pub address: Option<String>,
	/// JSON ABI replacing the bundled token ABI.
	pub abi: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GasConfig {
	pub limit: Option<u64>,
	pub price: Option<u64>,
}

impl Default for NetworkConfig {
	fn default() -> Self {
		Self {
			rpc_url: DEFAULT_RPC_URL.into(),
			chain_id: None,
		}
	}
}

impl Config {
	/// Directory where CLI state is stored (~/.ethutil/).
	pub fn dir() -> Option<PathBuf> {
		dirs::home_dir().map(|home| home.join(".ethutil"))
	}

	/// Path to the default config file.
	pub fn path() -> Option<PathBuf> {
		Self::dir().map(|dir| dir.join("config.toml"))
	}

	/// Load `explicit` if given, which must exist. Otherwise load the
	/// default file, falling back to defaults if there is none.
	pub fn load(explicit: Option<&Path>) -> Result<Self> {
		match explicit {
			Some(path) => Self::from_file(path),
			None => match Self::path() {
				Some(path) if path.exists() => Self::from_file(&path),
				_ => Ok(Self::default()),
			},
		}
	}

	pub fn from_file(path: &Path) -> Result<Self> {
		let content = std::fs::read_to_string(path)?;
		let config = Self::parse(&content)
			.map_err(|e| Error::Configuration(format!("{}: {e}", path.display())))?;
		tracing::debug!(path = %path.display(), "loaded config");
		Ok(config)
	}

	pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
		toml::from_str(content)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn defaults_are_sensible() {
		let c = Config::default();
		assert_eq!(c.network.rpc_url, DEFAULT_RPC_URL);
		assert!(c.network.chain_id.is_none());
		assert!(c.contract.address.is_none());
		assert!(c.contract.abi.is_none());
		assert_eq!(c.gas, GasConfig::default());
	}

	#[test]
	fn partial_file_keeps_defaults() {
		let c = Config::parse(
			r#"
			[network]
			chain_id = 61

			[gas]
			limit = 90000
			"#,
		)
		.unwrap();
		assert_eq!(c.network.rpc_url, DEFAULT_RPC_URL);
		assert_eq!(c.network.chain_id, Some(61));
		assert_eq!(c.gas.limit, Some(90000));
		assert!(c.gas.price.is_none());
	}

	#[test]
	fn full_file() {
		let c = Config::parse(
			r#"
			[network]
			rpc_url = "http://10.0.0.2:8545"

			[contract]
			address = "0xcc33f3073f3e645f1a8ca094098cca68d8c1087c"
			abi = "/etc/ethutil/token.abi"

			[gas]
			limit = 200000
			price = 20000000000
			"#,
		)
		.unwrap();
		assert_eq!(c.network.rpc_url, "http://10.0.0.2:8545");
		assert_eq!(
			c.contract.address.as_deref(),
			Some("0xcc33f3073f3e645f1a8ca094098cca68d8c1087c")
		);
		assert_eq!(c.contract.abi, Some(PathBuf::from("/etc/ethutil/token.abi")));
		assert_eq!(c.gas.price, Some(20_000_000_000));
	}

	#[test]
	fn toml_roundtrip() {
		let mut c = Config::default();
		c.network.chain_id = Some(1);
		c.contract.address = Some("0x01".into());

		let serialized = toml::to_string_pretty(&c).unwrap();
		assert_eq!(Config::parse(&serialized).unwrap(), c);
	}

	#[test]
	fn explicit_missing_file_is_an_error() {
		let err = Config::load(Some(Path::new("/nonexistent/ethutil.toml"))).unwrap_err();
		assert!(matches!(err, Error::Io(_)));
	}

	#[test]
	fn bad_toml_is_a_configuration_error() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		file.write_all(b"[network\nrpc_url = 1").unwrap();
		let err = Config::load(Some(file.path())).unwrap_err();
		assert!(matches!(err, Error::Configuration(_)));
	}
}
