//! Web entities: per-user web sessions and registered application tunnels.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::keystore_adapter::KeystoreAdapter;
use crate::prelude::*;

/// Key material of a web session. The public half is a user certificate
/// signed by the user CA; the private half is the matching unencrypted key.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct WebSessionData {
	/// OpenSSH PEM form
	pub private_key: Box<str>,
	/// Authorized-key form of the signed certificate
	pub cert: Box<str>,
}

/// A registered application tunnel, keyed by prefix
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct WebTun {
	pub prefix: Box<str>,
	pub target_addr: Box<str>,
	pub proxy_addr: Box<str>,
}

#[derive(Clone, Debug)]
pub struct WebService {
	keystore: Arc<dyn KeystoreAdapter>,
}

impl WebService {
	pub fn new(keystore: Arc<dyn KeystoreAdapter>) -> Self {
		Self { keystore }
	}

	/// Stores session data under the plaintext ID. Sessions are addressed
	/// externally only by their secure ID; the translation happens above
	/// this service.
	pub async fn upsert_session(
		&self,
		user: &str,
		pid: &str,
		data: &WebSessionData,
		ttl: Duration,
	) -> GhResult<()> {
		let value = serde_json::to_vec(data)?;
		self.keystore.upsert(&["web", "users", user, "sessions", pid], &value, ttl).await
	}

	pub async fn read_session(&self, user: &str, pid: &str) -> GhResult<WebSessionData> {
		let value = self.keystore.read(&["web", "users", user, "sessions", pid]).await?;
		Ok(serde_json::from_slice(&value)?)
	}

	pub async fn delete_session(&self, user: &str, pid: &str) -> GhResult<()> {
		self.keystore.delete(&["web", "users", user, "sessions", pid]).await
	}

	pub async fn get_sessions(&self, user: &str) -> GhResult<Vec<WebSessionData>> {
		let pids = self.keystore.list(&["web", "users", user, "sessions"]).await?;
		let mut sessions = Vec::with_capacity(pids.len());
		for pid in &pids {
			match self.read_session(user, pid).await {
				Ok(data) => sessions.push(data),
				Err(Error::NotFound) => continue,
				Err(err) => return Err(err),
			}
		}
		Ok(sessions)
	}

	pub async fn upsert_tun(&self, tun: &WebTun) -> GhResult<()> {
		let value = serde_json::to_vec(tun)?;
		self.keystore.upsert(&["web", "tunnels", &tun.prefix], &value, Duration::ZERO).await
	}

	pub async fn read_tun(&self, prefix: &str) -> GhResult<WebTun> {
		let value = self.keystore.read(&["web", "tunnels", prefix]).await?;
		Ok(serde_json::from_slice(&value)?)
	}

	pub async fn get_tuns(&self) -> GhResult<Vec<WebTun>> {
		let prefixes = self.keystore.list(&["web", "tunnels"]).await?;
		let mut tuns = Vec::with_capacity(prefixes.len());
		for prefix in &prefixes {
			match self.read_tun(prefix).await {
				Ok(tun) => tuns.push(tun),
				Err(Error::NotFound) => continue,
				Err(err) => return Err(err),
			}
		}
		Ok(tuns)
	}

	pub async fn delete_tun(&self, prefix: &str) -> GhResult<()> {
		self.keystore.delete(&["web", "tunnels", prefix]).await
	}
}

// vim: ts=4
