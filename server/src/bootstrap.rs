//! Bootstrap: cluster init lock, codec secret, CA and host key material.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use zeroize::Zeroizing;

use crate::crypto::seal::SecretCodec;
use crate::prelude::*;
use crate::services::ca::CaKind;

/// TTL of the cluster init lock. A crashed initializer releases the cluster
/// after this long at the latest.
const INIT_LOCK_TTL: Duration = Duration::from_secs(60);

/// File name of the symmetric codec key inside the data directory
const SECRET_FILE: &str = "teleport.secret";

const FILE_MODE: u32 = 0o600;

async fn write_private(path: &Path, data: &[u8]) -> GhResult<()> {
	tokio::fs::write(path, data).await?;
	tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(FILE_MODE)).await?;
	Ok(())
}

/// Loads the process-local codec key from the data directory, creating a
/// fresh one on first start. The file carries a cluster secret, so it is
/// written at 0600 like the private key material.
pub async fn load_secret(data_dir: &Path) -> GhResult<SecretCodec> {
	tokio::fs::create_dir_all(data_dir).await?;
	let path = data_dir.join(SECRET_FILE);

	match tokio::fs::read(&path).await {
		Ok(encoded) => {
			let encoded = std::str::from_utf8(&encoded)?.trim().to_owned();
			let key = Zeroizing::new(
				BASE64
					.decode(encoded)
					.map_err(|_| Error::CryptoError("malformed codec key file".into()))?,
			);
			SecretCodec::new(&key)
		}
		Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
			info!("generating codec key: {}", path.display());
			let key = Zeroizing::new(SecretCodec::generate_key());
			write_private(&path, BASE64.encode(key.as_slice()).as_bytes()).await?;
			SecretCodec::new(key.as_slice())
		}
		Err(err) => Err(err.into()),
	}
}

/// Initializes cluster and host state under the cluster init lock:
/// both CAs exist afterwards, and the local host has a key and a host
/// certificate on disk.
pub async fn init(app: &App) -> GhResult<()> {
	app.locks.acquire(&app.opts.auth_domain, INIT_LOCK_TTL).await?;

	let res = init_cluster(app).await;
	// The lock is released even when init fails; it would auto-expire, but
	// an explicit release keeps restarts fast.
	app.locks.release(&app.opts.auth_domain).await?;
	res
}

async fn init_cluster(app: &App) -> GhResult<()> {
	ensure_ca(app, CaKind::Host).await?;
	ensure_ca(app, CaKind::User).await?;
	ensure_host_files(app).await?;
	Ok(())
}

async fn ensure_ca(app: &App, kind: CaKind) -> GhResult<()> {
	let res = match kind {
		CaKind::Host => app.authority.get_host_ca_pub().await,
		CaKind::User => app.authority.get_user_ca_pub().await,
	};
	match res {
		Ok(_) => Ok(()),
		Err(Error::NotFound) => {
			info!("no {} found, generating one", kind);
			match kind {
				CaKind::Host => app.authority.reset_host_ca("").await,
				CaKind::User => app.authority.reset_user_ca("").await,
			}
		}
		Err(err) => Err(err),
	}
}

/// Ensures `<fqdn>.key` and `<fqdn>.cert` exist in the data directory,
/// self-minting a host certificate through the authority when they don't.
async fn ensure_host_files(app: &App) -> GhResult<()> {
	let fqdn = app.opts.fqdn.as_ref();
	let key_path = app.opts.data_dir.join(format!("{}.key", fqdn));
	let cert_path = app.opts.data_dir.join(format!("{}.cert", fqdn));

	if tokio::fs::try_exists(&key_path).await? && tokio::fs::try_exists(&cert_path).await? {
		return Ok(());
	}

	info!("provisioning host key material for {}", fqdn);
	let pair = app.authority.generate_key_pair("").await?;
	let cert =
		app.authority.generate_host_cert(&pair.public_key, fqdn, fqdn, Duration::ZERO).await?;

	write_private(&key_path, pair.private_key.as_bytes()).await?;
	write_private(&cert_path, cert.as_bytes()).await?;
	Ok(())
}

/// Reads the host key and certificate written by `init`.
pub async fn read_host_files(app: &App) -> GhResult<(Box<str>, Box<str>)> {
	let fqdn = app.opts.fqdn.as_ref();
	let key = tokio::fs::read_to_string(app.opts.data_dir.join(format!("{}.key", fqdn))).await?;
	let cert = tokio::fs::read_to_string(app.opts.data_dir.join(format!("{}.cert", fqdn))).await?;
	Ok((key.into(), cert.into()))
}

// vim: ts=4
