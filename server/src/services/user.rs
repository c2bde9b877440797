//! User entities: authorized keys and password hashes, keyed by username.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::keystore_adapter::KeystoreAdapter;
use crate::prelude::*;

/// A user's public key certificate, keyed by a caller-chosen ID
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AuthorizedKey {
	pub id: Box<str>,
	/// Authorized-key form
	pub value: Box<str>,
}

#[derive(Clone, Debug)]
pub struct UserService {
	keystore: Arc<dyn KeystoreAdapter>,
}

impl UserService {
	pub fn new(keystore: Arc<dyn KeystoreAdapter>) -> Self {
		Self { keystore }
	}

	pub async fn get_users(&self) -> GhResult<Vec<Box<str>>> {
		self.keystore.list(&["web", "users"]).await
	}

	/// Deletes the user and everything under it: keys, password, sessions.
	pub async fn delete_user(&self, user: &str) -> GhResult<()> {
		if self.keystore.list(&["web", "users", user]).await?.is_empty() {
			return Err(Error::NotFound);
		}
		self.keystore.delete_range(&["web", "users", user]).await
	}

	pub async fn upsert_key(&self, user: &str, key: &AuthorizedKey, ttl: Duration) -> GhResult<()> {
		let value = serde_json::to_vec(key)?;
		self.keystore.upsert(&["web", "users", user, "keys", &key.id], &value, ttl).await
	}

	pub async fn get_keys(&self, user: &str) -> GhResult<Vec<AuthorizedKey>> {
		let ids = self.keystore.list(&["web", "users", user, "keys"]).await?;
		let mut keys = Vec::with_capacity(ids.len());
		for id in &ids {
			let value = match self.keystore.read(&["web", "users", user, "keys", id.as_ref()]).await
			{
				Ok(value) => value,
				// Expired between list and read
				Err(Error::NotFound) => continue,
				Err(err) => return Err(err),
			};
			keys.push(serde_json::from_slice(&value)?);
		}
		Ok(keys)
	}

	pub async fn delete_key(&self, user: &str, id: &str) -> GhResult<()> {
		self.keystore.delete(&["web", "users", user, "keys", id]).await
	}

	pub async fn upsert_password_hash(&self, user: &str, hash: &[u8]) -> GhResult<()> {
		self.keystore.upsert(&["web", "users", user, "password"], hash, Duration::ZERO).await
	}

	pub async fn get_password_hash(&self, user: &str) -> GhResult<Vec<u8>> {
		self.keystore.read(&["web", "users", user, "password"]).await
	}
}

// vim: ts=4
