//! Web3 secret storage (version 3) key files.
//!
//! Both `scrypt` and `pbkdf2` (hmac-sha256) key derivation are accepted, with
//! `aes-128-ctr` as the only cipher, matching what geth and most wallets
//! write. Every buffer that holds secret material is wrapped in `Zeroizing`.

use std::path::Path;

use aes::cipher::{KeyIvInit, StreamCipher};
use alloy_primitives::Address;
use hmac::Hmac;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::crypto;
use crate::error::DecryptionError;
use crate::signer::SigningKey;

type Aes128Ctr = ctr::Ctr128BE<aes::Aes128>;

const CIPHER: &str = "aes-128-ctr";

#[derive(Debug, Serialize, Deserialize)]
struct KeyFile {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	address: Option<String>,
	#[serde(alias = "Crypto")]
	crypto: CryptoJson,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	id: Option<String>,
	version: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct CryptoJson {
	cipher: String,
	ciphertext: String,
	cipherparams: CipherParams,
	kdf: String,
	kdfparams: Value,
	mac: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct CipherParams {
	iv: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ScryptJson {
	dklen: usize,
	n: u64,
	r: u32,
	p: u32,
	salt: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Pbkdf2Json {
	c: u32,
	dklen: usize,
	prf: String,
	salt: String,
}

/// Key derivation settings used when writing a key file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KdfParams {
	Scrypt { log_n: u8, r: u32, p: u32 },
	Pbkdf2 { rounds: u32 },
}

impl KdfParams {
	/// geth's "standard" scrypt cost (n = 2^18, p = 1).
	pub fn standard() -> Self {
		Self::Scrypt {
			log_n: 18,
			r: 8,
			p: 1,
		}
	}

	/// geth's "light" scrypt cost (n = 2^12, p = 6).
	pub fn scrypt_light() -> Self {
		Self::Scrypt {
			log_n: 12,
			r: 8,
			p: 6,
		}
	}
}

/// Read a key file from disk. This is the only disk access the key store does.
pub fn read_key_file(path: &Path) -> std::io::Result<Vec<u8>> {
	std::fs::read(path)
}

/// Decrypt a key file with its passphrase.
pub fn decrypt(json: &[u8], passphrase: &str) -> Result<SigningKey, DecryptionError> {
	let file: KeyFile = serde_json::from_slice(json)
		.map_err(|e| DecryptionError::MalformedKeyFile(e.to_string()))?;

	if file.version != 3 {
		return Err(DecryptionError::UnsupportedFormat(format!(
			"version {}",
			file.version
		)));
	}
	if file.crypto.cipher != CIPHER {
		return Err(DecryptionError::UnsupportedFormat(format!(
			"cipher {}",
			file.crypto.cipher
		)));
	}

	let ciphertext = decode_field("ciphertext", &file.crypto.ciphertext)?;
	let iv = decode_field("iv", &file.crypto.cipherparams.iv)?;
	let mac = decode_field("mac", &file.crypto.mac)?;

	let derived = derive_key(&file.crypto.kdf, &file.crypto.kdfparams, passphrase)?;

	if crypto::key_file_mac(&derived, &ciphertext)[..] != mac[..] {
		return Err(DecryptionError::AuthenticationFailed);
	}

	let mut plain = Zeroizing::new(ciphertext);
	let mut cipher = Aes128Ctr::new_from_slices(&derived[..16], &iv)
		.map_err(|e| DecryptionError::MalformedKeyFile(format!("iv: {e}")))?;
	cipher.apply_keystream(&mut plain);

	let key = SigningKey::from_slice(&plain)
		.map_err(|e| DecryptionError::MalformedKeyFile(e.to_string()))?;

	if let Some(recorded) = file.address.as_deref() {
		let recorded: Address = recorded
			.parse()
			.map_err(|e| DecryptionError::MalformedKeyFile(format!("address: {e}")))?;
		if recorded != key.address() {
			return Err(DecryptionError::MalformedKeyFile(format!(
				"key derives {} but file records {recorded}",
				key.address()
			)));
		}
	}

	tracing::debug!(address = %key.address(), kdf = %file.crypto.kdf, "decrypted key file");
	Ok(key)
}

/// Encrypt a key into a version 3 key file.
pub fn encrypt(
	key: &SigningKey,
	passphrase: &str,
	kdf: KdfParams,
) -> Result<String, DecryptionError> {
	let mut rng = rand::thread_rng();
	let mut salt = [0u8; 32];
	let mut iv = [0u8; 16];
	rng.fill_bytes(&mut salt);
	rng.fill_bytes(&mut iv);

	let (kdf_name, kdfparams) = match kdf {
		KdfParams::Scrypt { log_n, r, p } => (
			"scrypt",
			serde_json::to_value(ScryptJson {
				dklen: 32,
				n: 1u64 << log_n,
				r,
				p,
				salt: hex::encode(salt),
			}),
		),
		KdfParams::Pbkdf2 { rounds } => (
			"pbkdf2",
			serde_json::to_value(Pbkdf2Json {
				c: rounds,
				dklen: 32,
				prf: "hmac-sha256".into(),
				salt: hex::encode(salt),
			}),
		),
	};
	let kdfparams = kdfparams.map_err(|e| DecryptionError::MalformedKeyFile(e.to_string()))?;
	let derived = derive_key(kdf_name, &kdfparams, passphrase)?;

	let mut ciphertext = key.to_bytes().to_vec();
	let mut cipher = Aes128Ctr::new_from_slices(&derived[..16], &iv)
		.map_err(|e| DecryptionError::MalformedKeyFile(e.to_string()))?;
	cipher.apply_keystream(&mut ciphertext);
	let mac = crypto::key_file_mac(&derived, &ciphertext);

	let file = KeyFile {
		address: Some(hex::encode(key.address())),
		crypto: CryptoJson {
			cipher: CIPHER.into(),
			ciphertext: hex::encode(&ciphertext),
			cipherparams: CipherParams { iv: hex::encode(iv) },
			kdf: kdf_name.into(),
			kdfparams,
			mac: hex::encode(mac),
		},
		id: Some(uuid::Uuid::new_v4().to_string()),
		version: 3,
	};
	serde_json::to_string_pretty(&file).map_err(|e| DecryptionError::MalformedKeyFile(e.to_string()))
}

// -- Helpers --

/// Derived key lengths we accept. The MAC needs the first 32 bytes; files
/// asking for more than 64 are not produced by any wallet.
const DKLEN_RANGE: std::ops::RangeInclusive<usize> = 32..=64;

fn check_dklen(dklen: usize) -> Result<(), DecryptionError> {
	if DKLEN_RANGE.contains(&dklen) {
		return Ok(());
	}
	Err(DecryptionError::MalformedKeyFile(format!(
		"dklen {dklen} is outside {}..={}",
		DKLEN_RANGE.start(),
		DKLEN_RANGE.end()
	)))
}

fn derive_key(
	kdf: &str,
	params: &Value,
	passphrase: &str,
) -> Result<Zeroizing<Vec<u8>>, DecryptionError> {
	match kdf {
		"scrypt" => {
			let p: ScryptJson = serde_json::from_value(params.clone())
				.map_err(|e| DecryptionError::MalformedKeyFile(format!("kdfparams: {e}")))?;
			if !p.n.is_power_of_two() || p.n < 2 {
				return Err(DecryptionError::MalformedKeyFile(format!(
					"scrypt n={} is not a power of two",
					p.n
				)));
			}
			check_dklen(p.dklen)?;
			let log_n = p.n.trailing_zeros() as u8;
			let salt = decode_field("salt", &p.salt)?;
			let params = scrypt::Params::new(log_n, p.r, p.p, p.dklen)
				.map_err(|e| DecryptionError::MalformedKeyFile(format!("scrypt params: {e}")))?;
			let mut out = Zeroizing::new(vec![0u8; p.dklen]);
			scrypt::scrypt(passphrase.as_bytes(), &salt, &params, &mut out)
				.map_err(|e| DecryptionError::MalformedKeyFile(format!("scrypt: {e}")))?;
			Ok(out)
		}
		"pbkdf2" => {
			let p: Pbkdf2Json = serde_json::from_value(params.clone())
				.map_err(|e| DecryptionError::MalformedKeyFile(format!("kdfparams: {e}")))?;
			if p.prf != "hmac-sha256" {
				return Err(DecryptionError::UnsupportedFormat(format!("prf {}", p.prf)));
			}
			check_dklen(p.dklen)?;
			let salt = decode_field("salt", &p.salt)?;
			let mut out = Zeroizing::new(vec![0u8; p.dklen]);
			pbkdf2::pbkdf2::<Hmac<Sha256>>(passphrase.as_bytes(), &salt, p.c, &mut out)
				.map_err(|e| DecryptionError::MalformedKeyFile(format!("pbkdf2: {e}")))?;
			Ok(out)
		}
		other => Err(DecryptionError::UnsupportedFormat(format!("kdf {other}"))),
	}
}

fn decode_field(name: &str, value: &str) -> Result<Vec<u8>, DecryptionError> {
	hex::decode(value.strip_prefix("0x").unwrap_or(value))
		.map_err(|e| DecryptionError::MalformedKeyFile(format!("{name}: {e}")))
}
