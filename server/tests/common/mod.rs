//! Shared test stack: memory keystore, temporary data directory, and
//! (optionally) the REST listener plus tunnel server in-process.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::net::TcpListener;

use gatehouse::tunnel::server::TunServer;
use gatehouse::{bootstrap, routes, App, AppBuilder};
use gatehouse_keystore_adapter_memory::KeystoreAdapterMemory;

pub const TEST_FQDN: &str = "auth.test.example.com";

/// Builds and bootstraps an app over a fresh memory keystore. The TempDir
/// must stay alive for the duration of the test.
pub async fn create_test_app() -> (App, TempDir) {
	create_test_app_with_rest("127.0.0.1:0").await
}

pub async fn create_test_app_with_rest(rest_addr: &str) -> (App, TempDir) {
	let tmp = TempDir::new().expect("tempdir");
	let app = AppBuilder::new()
		.fqdn(TEST_FQDN)
		.auth_domain("test-domain")
		.data_dir(tmp.path())
		.rest_addr(rest_addr)
		.keystore(Arc::new(KeystoreAdapterMemory::new()))
		.build()
		.await
		.expect("build app");
	bootstrap::init(&app).await.expect("bootstrap");
	(app, tmp)
}

/// A full in-process stack: authority + REST listener + tunnel server.
pub struct TestStack {
	pub app: App,
	pub tunnel_addr: SocketAddr,
	_tmp: TempDir,
}

impl TestStack {
	pub async fn start() -> Self {
		let rest_listener = TcpListener::bind("127.0.0.1:0").await.expect("bind rest");
		let rest_addr = rest_listener.local_addr().expect("rest addr");

		let (app, tmp) = create_test_app_with_rest(&rest_addr.to_string()).await;

		let router = routes::init(app.clone());
		tokio::spawn(async move {
			axum::serve(rest_listener, router).await.expect("rest server");
		});

		let tun_listener = TcpListener::bind("127.0.0.1:0").await.expect("bind tunnel");
		let tunnel_addr = tun_listener.local_addr().expect("tunnel addr");
		let tun = TunServer::new(app.clone()).await.expect("tunnel server");
		tokio::spawn(async move {
			let _ = tun.run_on_listener(tun_listener).await;
		});

		Self { app, tunnel_addr, _tmp: tmp }
	}
}

// vim: ts=4
