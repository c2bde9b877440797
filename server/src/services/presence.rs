//! Server presence: nodes upsert themselves with a short TTL as a
//! heartbeat; expired records drop out of listings on their own.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::keystore_adapter::KeystoreAdapter;
use crate::prelude::*;

/// A registered node
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Server {
	pub id: Box<str>,
	/// `host:port` of the node's SSH endpoint
	pub addr: Box<str>,
}

#[derive(Clone, Debug)]
pub struct PresenceService {
	keystore: Arc<dyn KeystoreAdapter>,
}

impl PresenceService {
	pub fn new(keystore: Arc<dyn KeystoreAdapter>) -> Self {
		Self { keystore }
	}

	pub async fn upsert_server(&self, server: &Server, ttl: Duration) -> GhResult<()> {
		let value = serde_json::to_vec(server)?;
		self.keystore.upsert(&["servers", &server.id], &value, ttl).await
	}

	pub async fn get_servers(&self) -> GhResult<Vec<Server>> {
		let ids = self.keystore.list(&["servers"]).await?;
		let mut servers = Vec::with_capacity(ids.len());
		for id in &ids {
			match self.keystore.read(&["servers", id.as_ref()]).await {
				Ok(value) => servers.push(serde_json::from_slice(&value)?),
				// Heartbeat expired between list and read
				Err(Error::NotFound) => continue,
				Err(err) => return Err(err),
			}
		}
		Ok(servers)
	}
}

// vim: ts=4
