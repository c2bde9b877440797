//! Secret codec: symmetric translation between short plaintext IDs and the
//! unforgeable secure IDs handed to clients. Decode is deterministic; encode
//! draws a fresh nonce, so the same plaintext ID yields a different secure
//! ID on every call.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD as BASE64_URL, Engine};
use chacha20poly1305::{
	aead::{Aead, AeadCore, KeyInit, OsRng},
	XChaCha20Poly1305, XNonce,
};
use rand::{distr::Alphanumeric, RngExt};

use crate::prelude::*;

/// Length of the process-wide symmetric key in bytes
pub const SECRET_KEY_LEN: usize = 32;

const NONCE_LEN: usize = 24;

/// Length of a plaintext ID in characters
const PLAIN_ID_LEN: usize = 24;

/// Plaintext IDs are persistence keys, so they stay in the alphanumeric
/// range that is safe inside compound key paths.
fn random_plain_id() -> String {
	rand::rng().sample_iter(&Alphanumeric).take(PLAIN_ID_LEN).map(char::from).collect()
}

/// A freshly minted (secure, plaintext) ID pair
#[derive(Debug)]
pub struct IdPair {
	/// Client-facing opaque form
	pub sid: Box<str>,
	/// Persistence key; never leaves the process
	pub pid: Box<str>,
}

pub struct SecretCodec {
	cipher: XChaCha20Poly1305,
}

impl std::fmt::Debug for SecretCodec {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SecretCodec").finish()
	}
}

impl SecretCodec {
	pub fn new(key: &[u8]) -> GhResult<Self> {
		if key.len() != SECRET_KEY_LEN {
			return Err(Error::CryptoError(format!("secret key must be {} bytes", SECRET_KEY_LEN)));
		}
		let cipher = XChaCha20Poly1305::new_from_slice(key)
			.map_err(|_| Error::CryptoError("invalid secret key".into()))?;
		Ok(Self { cipher })
	}

	/// Generates a fresh random symmetric key.
	pub fn generate_key() -> [u8; SECRET_KEY_LEN] {
		XChaCha20Poly1305::generate_key(&mut OsRng).into()
	}

	/// Mints a new (secure, plaintext) ID pair.
	pub fn new_id(&self) -> GhResult<IdPair> {
		let pid = random_plain_id();
		let sid = self.encode(&pid)?;
		Ok(IdPair { sid: sid.into(), pid: pid.into() })
	}

	/// Seals a plaintext ID into its secure form.
	pub fn encode(&self, pid: &str) -> GhResult<String> {
		let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);
		let sealed = self
			.cipher
			.encrypt(&nonce, pid.as_bytes())
			.map_err(|_| Error::CryptoError("seal failed".into()))?;

		let mut buf = Vec::with_capacity(NONCE_LEN + sealed.len());
		buf.extend_from_slice(&nonce);
		buf.extend_from_slice(&sealed);
		Ok(BASE64_URL.encode(buf))
	}

	/// Opens a secure ID back into the plaintext ID. Any tampering or
	/// garbage input fails with `BadParameter`.
	pub fn decode(&self, sid: &str) -> GhResult<String> {
		let buf = BASE64_URL
			.decode(sid)
			.map_err(|_| Error::BadParameter("malformed secure id".into()))?;
		if buf.len() <= NONCE_LEN {
			return Err(Error::BadParameter("malformed secure id".into()));
		}
		let (nonce, sealed) = buf.split_at(NONCE_LEN);
		let pid = self
			.cipher
			.decrypt(XNonce::from_slice(nonce), sealed)
			.map_err(|_| Error::BadParameter("malformed secure id".into()))?;

		String::from_utf8(pid).map_err(|_| Error::BadParameter("malformed secure id".into()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn codec() -> SecretCodec {
		SecretCodec::new(&SecretCodec::generate_key()).unwrap()
	}

	#[test]
	fn test_round_trip() {
		let codec = codec();
		let pair = codec.new_id().unwrap();
		assert_eq!(codec.decode(&pair.sid).unwrap(), pair.pid.as_ref());
	}

	#[test]
	fn test_plain_id_shape() {
		let codec = codec();
		let a = codec.new_id().unwrap();
		let b = codec.new_id().unwrap();
		assert_eq!(a.pid.len(), PLAIN_ID_LEN);
		assert!(a.pid.chars().all(|c| c.is_ascii_alphanumeric()));
		assert_ne!(a.pid, b.pid);
	}

	#[test]
	fn test_encode_nondeterministic() {
		let codec = codec();
		let a = codec.encode("abc").unwrap();
		let b = codec.encode("abc").unwrap();
		assert_ne!(a, b);
		assert_eq!(codec.decode(&a).unwrap(), "abc");
		assert_eq!(codec.decode(&b).unwrap(), "abc");
	}

	#[test]
	fn test_tampered_id_rejected() {
		let codec = codec();
		let sid = codec.encode("abc").unwrap();
		let mut raw = BASE64_URL.decode(&sid).unwrap();
		let last = raw.len() - 1;
		raw[last] ^= 0x01;
		let tampered = BASE64_URL.encode(raw);
		assert!(matches!(codec.decode(&tampered), Err(Error::BadParameter(_))));
	}

	#[test]
	fn test_garbage_rejected() {
		let codec = codec();
		assert!(matches!(codec.decode("bla bla"), Err(Error::BadParameter(_))));
		assert!(matches!(codec.decode(""), Err(Error::BadParameter(_))));
	}

	#[test]
	fn test_wrong_key_rejected() {
		let a = codec();
		let b = codec();
		let sid = a.encode("abc").unwrap();
		assert!(b.decode(&sid).is_err());
	}
}

// vim: ts=4
