//! Provisioning tokens: a TTL-bound mapping from plaintext token ID to the
//! FQDN the token was minted for.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::keystore_adapter::KeystoreAdapter;
use crate::prelude::*;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ProvisionToken {
	pub fqdn: Box<str>,
}

#[derive(Clone, Debug)]
pub struct ProvisionService {
	keystore: Arc<dyn KeystoreAdapter>,
}

impl ProvisionService {
	pub fn new(keystore: Arc<dyn KeystoreAdapter>) -> Self {
		Self { keystore }
	}

	pub async fn upsert_token(&self, pid: &str, fqdn: &str, ttl: Duration) -> GhResult<()> {
		let value = serde_json::to_vec(&ProvisionToken { fqdn: fqdn.into() })?;
		self.keystore.upsert(&["tokens", pid], &value, ttl).await
	}

	pub async fn read_token(&self, pid: &str) -> GhResult<ProvisionToken> {
		let value = self.keystore.read(&["tokens", pid]).await?;
		Ok(serde_json::from_slice(&value)?)
	}

	pub async fn delete_token(&self, pid: &str) -> GhResult<()> {
		self.keystore.delete(&["tokens", pid]).await
	}
}

// vim: ts=4
