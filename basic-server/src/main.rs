//! Minimal single-node authority: redb keystore, REST on loopback, tunnel
//! on the public address.

use std::{env, path::PathBuf, sync::Arc};

use gatehouse::tunnel::server::TunServer;
use gatehouse::{bootstrap, routes, AppBuilder, GhResult};
use gatehouse_keystore_adapter_redb::KeystoreAdapterRedb;

#[tokio::main]
async fn main() -> GhResult<()> {
	gatehouse::init_logging();

	let data_dir = PathBuf::from(env::var("DATA_DIR").unwrap_or("./data".to_string()));
	let fqdn = env::var("FQDN").unwrap_or("localhost".to_string());
	std::fs::create_dir_all(&data_dir)?;

	let keystore = Arc::new(KeystoreAdapterRedb::new(data_dir.join("keystore.db"))?);

	let app = AppBuilder::new()
		.fqdn(fqdn)
		.data_dir(data_dir)
		.keystore(keystore)
		.build()
		.await?;
	bootstrap::init(&app).await?;

	let rest_listener = tokio::net::TcpListener::bind(app.opts.rest_addr.as_ref()).await?;
	let router = routes::init(app.clone());
	let rest = tokio::spawn(async move { axum::serve(rest_listener, router).await });

	let tunnel = TunServer::new(app.clone()).await?;
	tokio::spawn(async move {
		if let Err(err) = tunnel.run().await {
			tracing::error!("tunnel server failed: {}", err);
		}
	});

	rest.await??;
	Ok(())
}

// vim: ts=4
