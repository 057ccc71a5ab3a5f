use thiserror::Error;

/// Top-level error for every library operation.
#[derive(Debug, Error)]
pub enum Error {
	/// A required parameter is missing or invalid. Raised before any I/O.
	#[error("configuration: {0}")]
	Configuration(String),

	#[error(transparent)]
	Decryption(#[from] DecryptionError),

	#[error(transparent)]
	Rpc(#[from] RpcError),

	#[error(transparent)]
	Abi(#[from] AbiError),

	#[error(transparent)]
	Signing(#[from] SigningError),

	#[error("io: {0}")]
	Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecryptionError {
	#[error("malformed key file: {0}")]
	MalformedKeyFile(String),

	/// Wrong passphrase or corrupted ciphertext.
	#[error("could not decrypt key: MAC mismatch")]
	AuthenticationFailed,

	#[error("unsupported key file format: {0}")]
	UnsupportedFormat(String),
}

#[derive(Debug, Error)]
pub enum RpcError {
	/// The request never produced a JSON-RPC response.
	#[error("transport: {0}")]
	Transport(String),

	/// The node answered with a JSON-RPC error object.
	#[error("node error {code}: {message}")]
	Node { code: i64, message: String },

	#[error("malformed response: {0}")]
	Malformed(String),

	#[error(transparent)]
	Revert(#[from] RevertError),
}

/// A contract rejected the call through its own logic.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("execution reverted{}", .reason.as_ref().map(|r| format!(": {r}")).unwrap_or_default())]
pub struct RevertError {
	pub reason: Option<String>,
	/// Raw revert payload as returned by the node (may be empty).
	pub data: Vec<u8>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AbiError {
	#[error("argument type mismatch: {0}")]
	ArgumentTypeMismatch(String),

	#[error("decoding: {0}")]
	Decoding(String),

	#[error("unknown method: {0}")]
	UnknownMethod(String),

	#[error("unsupported ABI type: {0}")]
	UnsupportedType(String),

	#[error("invalid ABI: {0}")]
	InvalidAbi(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SigningError {
	#[error("invalid key material: {0}")]
	InvalidKey(String),

	#[error("invalid transaction: {0}")]
	InvalidTransaction(String),

	#[error("signature: {0}")]
	Signature(String),
}
