//! CA lifecycle, remote authority trust and certificate minting.

use super::AuthServer;
use crate::crypto::keygen;
use crate::prelude::*;
use crate::services::ca::{CaKind, CertAuthority, RemoteCert, RemoteCertKind};

impl AuthServer {
	async fn reset_ca(&self, kind: CaKind, passphrase: &str) -> GhResult<()> {
		let passphrase = passphrase.to_owned();
		let pair = self.worker.run_immed(move || keygen::generate_key_pair(&passphrase)).await??;

		let ca = CertAuthority { public_key: pair.public_key, private_key: pair.private_key };
		self.ca.upsert_ca(kind, &ca).await?;
		info!("{} reset", kind);
		Ok(())
	}

	/// Replaces the host CA with a freshly generated key pair. A crypto
	/// failure leaves the previous CA untouched.
	pub async fn reset_host_ca(&self, passphrase: &str) -> GhResult<()> {
		self.reset_ca(CaKind::Host, passphrase).await
	}

	/// Replaces the user CA with a freshly generated key pair.
	pub async fn reset_user_ca(&self, passphrase: &str) -> GhResult<()> {
		self.reset_ca(CaKind::User, passphrase).await
	}

	pub async fn get_host_ca_pub(&self) -> GhResult<Box<str>> {
		Ok(self.ca.read_ca(CaKind::Host).await?.public_key)
	}

	pub async fn get_user_ca_pub(&self) -> GhResult<Box<str>> {
		Ok(self.ca.read_ca(CaKind::User).await?.public_key)
	}

	/// Signs `host_key` with the current host CA.
	pub async fn generate_host_cert(
		&self,
		host_key: &str,
		id: &str,
		fqdn: &str,
		ttl: Duration,
	) -> GhResult<Box<str>> {
		let ca = self.ca.read_ca(CaKind::Host).await?;
		let (host_key, id, fqdn) = (host_key.to_owned(), id.to_owned(), fqdn.to_owned());
		self.worker
			.run_immed(move || {
				keygen::generate_host_cert(&ca.private_key, &host_key, &id, &fqdn, ttl)
			})
			.await?
	}

	/// Signs `user_key` with the current user CA.
	pub async fn generate_user_cert(
		&self,
		user_key: &str,
		id: &str,
		username: &str,
		ttl: Duration,
	) -> GhResult<Box<str>> {
		let ca = self.ca.read_ca(CaKind::User).await?;
		let (user_key, id, username) = (user_key.to_owned(), id.to_owned(), username.to_owned());
		self.worker
			.run_immed(move || {
				keygen::generate_user_cert(&ca.private_key, &user_key, &id, &username, ttl)
			})
			.await?
	}

	pub async fn generate_key_pair(&self, passphrase: &str) -> GhResult<keygen::KeyPair> {
		let passphrase = passphrase.to_owned();
		self.worker.run_immed(move || keygen::generate_key_pair(&passphrase)).await?
	}

	// Remote authority trust

	pub async fn upsert_remote_cert(&self, cert: &RemoteCert) -> GhResult<()> {
		self.ca.upsert_remote_cert(cert).await
	}

	pub async fn get_remote_certs(
		&self,
		kind: RemoteCertKind,
		fqdn: &str,
	) -> GhResult<Vec<RemoteCert>> {
		self.ca.get_remote_certs(kind, fqdn).await
	}

	pub async fn delete_remote_cert(
		&self,
		kind: RemoteCertKind,
		fqdn: &str,
		id: &str,
	) -> GhResult<()> {
		self.ca.delete_remote_cert(kind, fqdn, id).await
	}
}

// vim: ts=4
