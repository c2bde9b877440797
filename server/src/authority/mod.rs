//! The authority service: CA lifecycle, certificate minting, passwords, web
//! sessions and provisioning tokens. Owns all policy; the REST facade and
//! the tunnel server are thin callers.

use std::sync::Arc;

use crate::core::worker::WorkerPool;
use crate::crypto::seal::SecretCodec;
use crate::keystore_adapter::KeystoreAdapter;
use crate::prelude::*;
use crate::services::ca::CaService;
use crate::services::presence::{PresenceService, Server};
use crate::services::provision::ProvisionService;
use crate::services::user::UserService;
use crate::services::web::{WebService, WebTun};

mod ca;
mod token;
mod user;
mod web;

pub use web::Session;

#[derive(Debug)]
pub struct AuthServer {
	ca: CaService,
	users: UserService,
	web: WebService,
	presence: PresenceService,
	provision: ProvisionService,
	codec: Arc<SecretCodec>,
	worker: Arc<WorkerPool>,
}

impl AuthServer {
	pub fn new(
		keystore: Arc<dyn KeystoreAdapter>,
		codec: Arc<SecretCodec>,
		worker: Arc<WorkerPool>,
	) -> Self {
		Self {
			ca: CaService::new(keystore.clone()),
			users: UserService::new(keystore.clone()),
			web: WebService::new(keystore.clone()),
			presence: PresenceService::new(keystore.clone()),
			provision: ProvisionService::new(keystore),
			codec,
			worker,
		}
	}

	// Presence pass-through

	pub async fn upsert_server(&self, server: &Server, ttl: Duration) -> GhResult<()> {
		self.presence.upsert_server(server, ttl).await
	}

	pub async fn get_servers(&self) -> GhResult<Vec<Server>> {
		self.presence.get_servers().await
	}

	// Web tunnel pass-through

	pub async fn upsert_web_tun(&self, tun: &WebTun) -> GhResult<()> {
		self.web.upsert_tun(tun).await
	}

	pub async fn get_web_tun(&self, prefix: &str) -> GhResult<WebTun> {
		self.web.read_tun(prefix).await
	}

	pub async fn get_web_tuns(&self) -> GhResult<Vec<WebTun>> {
		self.web.get_tuns().await
	}

	pub async fn delete_web_tun(&self, prefix: &str) -> GhResult<()> {
		self.web.delete_tun(prefix).await
	}
}

// vim: ts=4
