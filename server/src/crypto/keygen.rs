//! OpenSSH key primitives: keypair generation and host/user certificate
//! signing. All functions are synchronous and CPU-bound; callers run them
//! through the worker pool.

use ssh_key::{
	certificate::{Builder as CertBuilder, CertType, Certificate},
	rand_core::OsRng,
	Algorithm, HashAlg, LineEnding, PrivateKey, PublicKey,
};

use crate::prelude::*;

/// A generated key pair: OpenSSH PEM private half, authorized-key public half
#[derive(Debug)]
pub struct KeyPair {
	pub private_key: Box<str>,
	pub public_key: Box<str>,
}

/// Generates an Ed25519 OpenSSH key pair. An empty passphrase yields an
/// unencrypted private key; a nonempty one encrypts it.
pub fn generate_key_pair(passphrase: &str) -> GhResult<KeyPair> {
	let key = PrivateKey::random(&mut OsRng, Algorithm::Ed25519)?;
	let public_key = key.public_key().to_openssh()?;

	let key = if passphrase.is_empty() { key } else { key.encrypt(&mut OsRng, passphrase)? };
	let private_key = key.to_openssh(LineEnding::LF)?;

	Ok(KeyPair { private_key: private_key.to_string().into(), public_key: public_key.into() })
}

fn generate_cert(
	cert_type: CertType,
	ca_key: &str,
	public_key: &str,
	id: &str,
	principal: &str,
	ttl: Duration,
) -> GhResult<Box<str>> {
	let ca = PrivateKey::from_openssh(ca_key)?;
	let public = PublicKey::from_openssh(public_key.trim())?;

	let valid_after = Timestamp::now().0 as u64;
	// A zero TTL mints a certificate with no expiry
	let valid_before =
		if ttl.is_zero() { u64::MAX } else { valid_after.saturating_add(ttl.as_secs()) };

	let mut builder =
		CertBuilder::new_with_random_nonce(&mut OsRng, public.key_data().clone(), valid_after, valid_before)?;
	builder.cert_type(cert_type)?;
	builder.key_id(id)?;
	builder.valid_principal(principal)?;
	let cert = builder.sign(&ca)?;

	Ok(cert.to_openssh()?.into())
}

/// Signs `host_key` with the host CA private key, embedding `id` as the key
/// id and `fqdn` as the sole principal.
pub fn generate_host_cert(
	ca_key: &str,
	host_key: &str,
	id: &str,
	fqdn: &str,
	ttl: Duration,
) -> GhResult<Box<str>> {
	generate_cert(CertType::Host, ca_key, host_key, id, fqdn, ttl)
}

/// Signs `user_key` with the user CA private key, embedding `id` as the key
/// id and `username` as the sole principal.
pub fn generate_user_cert(
	ca_key: &str,
	user_key: &str,
	id: &str,
	username: &str,
	ttl: Duration,
) -> GhResult<Box<str>> {
	generate_cert(CertType::User, ca_key, user_key, id, username, ttl)
}

/// Checks whether `cert` was signed by the CA whose public half is
/// `ca_pub`, comparing the marshaled signing keys.
pub fn cert_signed_by(cert: &Certificate, ca_pub: &str) -> GhResult<bool> {
	let ca = PublicKey::from_openssh(ca_pub.trim())?;
	Ok(cert.signature_key() == ca.key_data())
}

/// Fully validates `cert` against `ca_pub`: signature, validity window and
/// trust anchor.
pub fn validate_cert(cert: &Certificate, ca_pub: &str) -> GhResult<()> {
	let ca = PublicKey::from_openssh(ca_pub.trim())?;
	let fingerprint = ca.fingerprint(HashAlg::Sha256);
	cert.validate_at(Timestamp::now().0 as u64, [&fingerprint])?;
	Ok(())
}


// vim: ts=4
