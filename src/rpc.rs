use std::sync::atomic::{AtomicU64, Ordering};

use alloy_primitives::{Address, B256, U256};
use serde_json::{json, Value};

use crate::abi;
use crate::error::{RevertError, RpcError};

/// Request/response channel to a JSON-RPC node.
///
/// The HTTP implementation is what the CLI uses; tests swap in a scripted
/// transport to drive the pipeline without a node.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
	/// Issue one request and return its `result` member.
	async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError>;

	/// Release the underlying connection. Called once, when the session ends.
	fn close(&self) {}
}

/// JSON-RPC 2.0 over HTTP POST.
pub struct HttpTransport {
	url: String,
	http: reqwest::Client,
	next_id: AtomicU64,
}

impl HttpTransport {
	pub fn new(url: &str) -> Result<Self, RpcError> {
		reqwest::Url::parse(url).map_err(|e| RpcError::Transport(format!("{url}: {e}")))?;
		Ok(Self {
			url: url.to_owned(),
			http: reqwest::Client::new(),
			next_id: AtomicU64::new(1),
		})
	}
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
	async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
		let id = self.next_id.fetch_add(1, Ordering::Relaxed);
		let body = json!({
			"id": id,
			"jsonrpc": "2.0",
			"method": method,
			"params": params,
		});

		let resp = self
			.http
			.post(&self.url)
			.json(&body)
			.send()
			.await
			.map_err(|e| RpcError::Transport(e.to_string()))?;
		let status = resp.status();
		let bytes = resp
			.bytes()
			.await
			.map_err(|e| RpcError::Transport(e.to_string()))?;

		interpret_http(status, &bytes)
	}
}

/// Nodes often answer reverts and rejected transactions with a non-2xx
/// status and a JSON-RPC error body. The body wins when it is JSON-RPC;
/// the status only matters when it is not.
fn interpret_http(status: reqwest::StatusCode, body: &[u8]) -> Result<Value, RpcError> {
	let parsed = serde_json::from_slice::<Value>(body)
		.ok()
		.filter(|v| v.get("result").is_some() || v.get("error").is_some_and(|e| !e.is_null()));
	match parsed {
		Some(resp) => unwrap_response(resp),
		None if !status.is_success() => Err(RpcError::Transport(format!("http status {status}"))),
		None => Err(RpcError::Malformed(format!(
			"not a JSON-RPC response: {}",
			String::from_utf8_lossy(body)
		))),
	}
}

/// A session against one node. Open with [`ChainClient::dial`], release
/// with [`ChainClient::close`].
pub struct ChainClient<T: Transport = HttpTransport> {
	transport: T,
}

impl ChainClient<HttpTransport> {
	pub fn dial(url: &str) -> Result<Self, RpcError> {
		tracing::debug!(url, "opening rpc session");
		Ok(Self::new(HttpTransport::new(url)?))
	}
}

impl<T: Transport> ChainClient<T> {
	pub fn new(transport: T) -> Self {
		Self { transport }
	}

	pub fn close(self) {
		self.transport.close();
		tracing::debug!("rpc session closed");
	}

	async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
		tracing::debug!(method, "rpc request");
		self.transport.request(method, params).await
	}

	// -- Account state --

	/// Balance in wei at the latest block.
	pub async fn balance_at(&self, address: Address) -> Result<U256, RpcError> {
		let v = self
			.request("eth_getBalance", json!([address, "latest"]))
			.await?;
		parse_quantity(&v)
	}

	/// Number of transactions sent from `address`, i.e. its next nonce.
	pub async fn nonce_at(&self, address: Address) -> Result<u64, RpcError> {
		let v = self
			.request("eth_getTransactionCount", json!([address, "latest"]))
			.await?;
		let n = parse_quantity(&v)?;
		u64::try_from(n).map_err(|_| RpcError::Malformed(format!("nonce {n} exceeds u64")))
	}

	// -- Contract calls --

	/// Execute a read-only call against the latest state.
	pub async fn call(&self, contract: Address, input: &[u8]) -> Result<Vec<u8>, RpcError> {
		let params = json!([
			{ "to": contract, "data": hex_data(input) },
			"latest"
		]);
		let v = self.request("eth_call", params).await?;
		parse_data(&v)
	}

	// -- Transactions --

	/// Broadcast signed transaction bytes. Returns as soon as the node has
	/// accepted them into its pool.
	pub async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, RpcError> {
		let v = self
			.request("eth_sendRawTransaction", json!([hex_data(raw)]))
			.await?;
		let hash = v
			.as_str()
			.ok_or_else(|| RpcError::Malformed(format!("expected hash, got {v}")))?;
		hash.parse()
			.map_err(|e| RpcError::Malformed(format!("transaction hash {hash}: {e}")))
	}

	pub async fn chain_id(&self) -> Result<u64, RpcError> {
		let v = self.request("eth_chainId", json!([])).await?;
		let id = parse_quantity(&v)?;
		u64::try_from(id).map_err(|_| RpcError::Malformed(format!("chain id {id} exceeds u64")))
	}

	/// Node-suggested gas price in wei.
	pub async fn gas_price(&self) -> Result<U256, RpcError> {
		let v = self.request("eth_gasPrice", json!([])).await?;
		parse_quantity(&v)
	}

	pub async fn estimate_gas(
		&self,
		from: Address,
		to: Address,
		value: U256,
		data: &[u8],
	) -> Result<u64, RpcError> {
		let params = json!([{
			"from": from,
			"to": to,
			"value": value,
			"data": hex_data(data),
		}]);
		let v = self.request("eth_estimateGas", params).await?;
		let gas = parse_quantity(&v)?;
		u64::try_from(gas).map_err(|_| RpcError::Malformed(format!("gas {gas} exceeds u64")))
	}
}

// -- Response parsing --

/// Pull `result` out of a JSON-RPC response, or turn its `error` into an
/// [`RpcError`]. Revert-shaped errors become [`RpcError::Revert`].
pub fn unwrap_response(mut resp: Value) -> Result<Value, RpcError> {
	if let Some(err) = resp.get("error").filter(|e| !e.is_null()) {
		return Err(node_error(err));
	}
	if let Some(result) = resp.get_mut("result") {
		return Ok(result.take());
	}
	Err(RpcError::Malformed(format!(
		"response has neither result nor error: {resp}"
	)))
}

/// Classify a JSON-RPC error object.
pub fn node_error(err: &Value) -> RpcError {
	let code = err.get("code").and_then(Value::as_i64).unwrap_or_default();
	let message = err
		.get("message")
		.and_then(Value::as_str)
		.unwrap_or_default()
		.to_owned();
	let data = err
		.get("data")
		.and_then(Value::as_str)
		.and_then(|s| hex::decode(s.strip_prefix("0x").unwrap_or(s)).ok())
		.unwrap_or_default();

	let reason = abi::decode_revert_reason(&data);
	let reverted = reason.is_some() || code == 3 || message.starts_with("execution reverted");
	if !reverted {
		return RpcError::Node { code, message };
	}

	let reason = reason.or_else(|| {
		message
			.strip_prefix("execution reverted")
			.map(|rest| rest.trim_start_matches(':').trim())
			.filter(|rest| !rest.is_empty())
			.map(str::to_owned)
	});
	RpcError::Revert(RevertError { reason, data })
}

fn parse_quantity(v: &Value) -> Result<U256, RpcError> {
	let s = v
		.as_str()
		.ok_or_else(|| RpcError::Malformed(format!("expected hex quantity, got {v}")))?;
	let digits = s
		.strip_prefix("0x")
		.filter(|d| !d.is_empty())
		.ok_or_else(|| RpcError::Malformed(format!("invalid quantity {s}")))?;
	U256::from_str_radix(digits, 16).map_err(|e| RpcError::Malformed(format!("quantity {s}: {e}")))
}

fn parse_data(v: &Value) -> Result<Vec<u8>, RpcError> {
	let s = v
		.as_str()
		.ok_or_else(|| RpcError::Malformed(format!("expected hex data, got {v}")))?;
	hex::decode(s.strip_prefix("0x").unwrap_or(s))
		.map_err(|e| RpcError::Malformed(format!("data {s}: {e}")))
}

fn hex_data(bytes: &[u8]) -> String {
	format!("0x{}", hex::encode(bytes))
}
