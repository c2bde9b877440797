//! Provisioning tokens: mint, validate, consume.

use super::AuthServer;
use crate::prelude::*;

impl AuthServer {
	/// Mints a single-use provisioning token bound to `fqdn`. The returned
	/// value is the secure form; only the plaintext ID is persisted.
	pub async fn generate_token(&self, fqdn: &str, ttl: Duration) -> GhResult<Box<str>> {
		let ids = self.codec.new_id()?;
		self.provision.upsert_token(&ids.pid, fqdn, ttl).await?;
		Ok(ids.sid)
	}

	/// Checks that `token` exists and was minted for `fqdn`. Read-only:
	/// validation can be repeated for the token's whole lifetime.
	pub async fn validate_token(&self, token: &str, fqdn: &str) -> GhResult<()> {
		let pid = self.codec.decode(token)?;
		let stored = self.provision.read_token(&pid).await?;
		if stored.fqdn.as_ref() != fqdn {
			return Err(Error::BadParameter(format!("token is not valid for {:?}", fqdn)));
		}
		Ok(())
	}

	/// One-shot consumption. A second delete fails with `NotFound`.
	pub async fn delete_token(&self, token: &str) -> GhResult<()> {
		let pid = self.codec.decode(token)?;
		self.provision.delete_token(&pid).await
	}
}

// vim: ts=4
