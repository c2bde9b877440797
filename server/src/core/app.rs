//! App state type

use std::{
	path::{Path, PathBuf},
	sync::Arc,
};

use crate::authority::AuthServer;
use crate::bootstrap;
use crate::core::worker;
use crate::event_adapter::{EventAdapter, EventAdapterMemory};
use crate::keystore_adapter::KeystoreAdapter;
use crate::prelude::*;
use crate::services::lock::LockService;
use crate::session_adapter::{SessionAdapter, SessionAdapterMemory};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug)]
pub struct AppState {
	pub worker: Arc<worker::WorkerPool>,
	pub authority: Arc<AuthServer>,
	pub locks: LockService,
	pub opts: AppBuilderOpts,

	pub keystore: Arc<dyn KeystoreAdapter>,
	pub sessions: Arc<dyn SessionAdapter>,
	pub events: Arc<dyn EventAdapter>,
}

pub type App = Arc<AppState>;

#[derive(Debug)]
pub struct AppBuilderOpts {
	/// FQDN of this authority node
	pub fqdn: Box<str>,
	/// Cluster-wide name scoping the init lock
	pub auth_domain: Box<str>,
	/// Directory for the codec key and host key/cert files
	pub data_dir: Box<Path>,
	/// Local REST endpoint the tunnel forwards direct-tcpip channels to
	pub rest_addr: Box<str>,
	/// Listen address of the SSH tunnel server
	pub tunnel_addr: Box<str>,
}

pub struct AppBuilder {
	opts: AppBuilderOpts,
	worker: Option<Arc<worker::WorkerPool>>,
	keystore: Option<Arc<dyn KeystoreAdapter>>,
	sessions: Option<Arc<dyn SessionAdapter>>,
	events: Option<Arc<dyn EventAdapter>>,
}

impl AppBuilder {
	pub fn new() -> Self {
		AppBuilder {
			opts: AppBuilderOpts {
				fqdn: "localhost".into(),
				auth_domain: "gatehouse".into(),
				data_dir: PathBuf::from("./data").into(),
				rest_addr: "127.0.0.1:3025".into(),
				tunnel_addr: "127.0.0.1:3024".into(),
			},
			worker: None,
			keystore: None,
			sessions: None,
			events: None,
		}
	}

	// Opts
	pub fn fqdn(mut self, fqdn: impl Into<Box<str>>) -> Self { self.opts.fqdn = fqdn.into(); self }
	pub fn auth_domain(mut self, auth_domain: impl Into<Box<str>>) -> Self { self.opts.auth_domain = auth_domain.into(); self }
	pub fn data_dir(mut self, data_dir: impl Into<Box<Path>>) -> Self { self.opts.data_dir = data_dir.into(); self }
	pub fn rest_addr(mut self, rest_addr: impl Into<Box<str>>) -> Self { self.opts.rest_addr = rest_addr.into(); self }
	pub fn tunnel_addr(mut self, tunnel_addr: impl Into<Box<str>>) -> Self { self.opts.tunnel_addr = tunnel_addr.into(); self }
	pub fn worker(mut self, worker: Arc<worker::WorkerPool>) -> Self { self.worker = Some(worker); self }

	// Adapters
	pub fn keystore(mut self, keystore: Arc<dyn KeystoreAdapter>) -> Self { self.keystore = Some(keystore); self }
	pub fn sessions(mut self, sessions: Arc<dyn SessionAdapter>) -> Self { self.sessions = Some(sessions); self }
	pub fn events(mut self, events: Arc<dyn EventAdapter>) -> Self { self.events = Some(events); self }

	/// Assembles the app state. Loads (or creates) the codec secret in the
	/// data directory; cluster-level initialization happens separately in
	/// `bootstrap::init`.
	pub async fn build(self) -> GhResult<App> {
		let worker = self.worker.unwrap_or_else(|| Arc::new(worker::WorkerPool::new(1, 2)));
		let keystore = self.keystore.expect("FATAL: No keystore adapter");
		let sessions = self.sessions.unwrap_or_else(|| Arc::new(SessionAdapterMemory::new()));
		let events = self.events.unwrap_or_else(|| Arc::new(EventAdapterMemory::new()));

		let codec = Arc::new(bootstrap::load_secret(&self.opts.data_dir).await?);
		let authority = Arc::new(AuthServer::new(keystore.clone(), codec, worker.clone()));
		let locks = LockService::new(keystore.clone());

		Ok(Arc::new(AppState {
			worker,
			authority,
			locks,
			opts: self.opts,
			keystore,
			sessions,
			events,
		}))
	}
}

impl Default for AppBuilder {
	fn default() -> Self { Self::new() }
}

// vim: ts=4
