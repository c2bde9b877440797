//! SSH tunnel client. Dials the tunnel lazily, caches one connection behind
//! a per-instance lock, and reaches the authority's REST API through
//! direct-tcpip channels.

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::Request;
use hyper_util::rt::TokioIo;
use russh::client::{self, AuthResult, Handle};
use russh::keys::{Certificate, HashAlg, PrivateKey};
use russh::{ChannelMsg, ChannelStream};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::prelude::*;
use crate::tunnel::agent::AgentClient;
use crate::tunnel::credentials::AuthCred;
use crate::tunnel::server::{ProvisionedIdentity, SealKey};
use crate::tunnel::{CHAN_NEW_AUTH, CHAN_PROVISION, CHAN_WEB_SESSION_AGENT};

/// How a client proves itself to the tunnel
#[derive(Debug)]
pub enum TunAuth {
	Password { user: Box<str>, pass: Box<str> },
	Session { user: Box<str>, sid: Box<str> },
	Token { fqdn: Box<str>, token: Box<str> },
	HostCert { user: Box<str>, key: Arc<PrivateKey>, cert: Certificate },
}

#[derive(Debug)]
pub struct ClientHandler;

impl client::Handler for ClientHandler {
	type Error = Error;

	async fn check_server_key(
		&mut self,
		server_public_key: &russh::keys::PublicKey,
	) -> Result<bool, Self::Error> {
		// The tunnel endpoint is part of the same trust domain; its key is
		// logged rather than pinned.
		debug!("tunnel server key: {}", server_public_key.fingerprint(HashAlg::Sha256));
		Ok(true)
	}
}

pub struct TunClient {
	addr: Box<str>,
	auth: TunAuth,
	conn: Mutex<Option<Handle<ClientHandler>>>,
}

impl std::fmt::Debug for TunClient {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("TunClient").field("addr", &self.addr).field("auth", &self.auth).finish()
	}
}

impl TunClient {
	pub fn new(addr: impl Into<Box<str>>, auth: TunAuth) -> Self {
		Self { addr: addr.into(), auth, conn: Mutex::new(None) }
	}

	pub fn with_password(
		addr: impl Into<Box<str>>,
		user: impl Into<Box<str>>,
		pass: impl Into<Box<str>>,
	) -> Self {
		Self::new(addr, TunAuth::Password { user: user.into(), pass: pass.into() })
	}

	pub fn with_session(
		addr: impl Into<Box<str>>,
		user: impl Into<Box<str>>,
		sid: impl Into<Box<str>>,
	) -> Self {
		Self::new(addr, TunAuth::Session { user: user.into(), sid: sid.into() })
	}

	pub fn with_token(
		addr: impl Into<Box<str>>,
		fqdn: impl Into<Box<str>>,
		token: impl Into<Box<str>>,
	) -> Self {
		Self::new(addr, TunAuth::Token { fqdn: fqdn.into(), token: token.into() })
	}

	pub fn with_host_cert(
		addr: impl Into<Box<str>>,
		user: impl Into<Box<str>>,
		key_pem: &str,
		cert_line: &str,
	) -> GhResult<Self> {
		let key = Arc::new(PrivateKey::from_openssh(key_pem)?);
		let cert = Certificate::from_openssh(cert_line.trim())?;
		Ok(Self::new(addr, TunAuth::HostCert { user: user.into(), key, cert }))
	}

	async fn connect(&self) -> GhResult<Handle<ClientHandler>> {
		let config = Arc::new(client::Config::default());
		let mut handle = client::connect(config, self.addr.as_ref(), ClientHandler).await?;

		let res = match &self.auth {
			TunAuth::Password { user, pass } => {
				let cred = AuthCred::password(user.clone(), pass.clone());
				handle.authenticate_password(user.as_ref(), cred.marshal()?).await?
			}
			TunAuth::Session { user, sid } => {
				let cred = AuthCred::session(user.clone(), sid.clone());
				handle.authenticate_password(user.as_ref(), cred.marshal()?).await?
			}
			TunAuth::Token { fqdn, token } => {
				let cred = AuthCred::token(fqdn.clone(), token.clone());
				handle.authenticate_password(fqdn.as_ref(), cred.marshal()?).await?
			}
			TunAuth::HostCert { user, key, cert } => {
				handle.authenticate_openssh_cert(user.as_ref(), key.clone(), cert.clone()).await?
			}
		};

		match res {
			AuthResult::Success => Ok(handle),
			_ => Err(Error::BadParameter("tunnel authentication rejected".into())),
		}
	}

	/// Returns the cached connection, dialing on first use.
	async fn handle(&self) -> GhResult<tokio::sync::MutexGuard<'_, Option<Handle<ClientHandler>>>> {
		let mut guard = self.conn.lock().await;
		if guard.is_none() {
			*guard = Some(self.connect().await?);
		}
		Ok(guard)
	}

	/// Opens a direct-tcpip channel. The server ignores the requested
	/// destination and splices onto the configured authority endpoint.
	pub async fn dial(&self) -> GhResult<ChannelStream<client::Msg>> {
		let guard = self.handle().await?;
		let handle =
			guard.as_ref().ok_or_else(|| Error::Internal("no tunnel connection".into()))?;
		let channel = handle.channel_open_direct_tcpip("authority", 0, "127.0.0.1", 0).await?;
		Ok(channel.into_stream())
	}

	/// One REST round-trip through the tunnel: form-encoded request, JSON
	/// response. Each call rides its own direct-tcpip channel.
	pub async fn call(
		&self,
		method: hyper::Method,
		path: &str,
		form: &[(&str, &str)],
	) -> GhResult<(u16, serde_json::Value)> {
		let stream = self.dial().await?;
		let io = TokioIo::new(stream);
		let (mut sender, conn) = hyper::client::conn::http1::handshake(io).await?;
		tokio::spawn(async move {
			if let Err(err) = conn.await {
				debug!("tunnel http connection ended: {}", err);
			}
		});

		let body = serde_urlencoded::to_string(form)
			.map_err(|_| Error::BadParameter("unencodable form".into()))?;
		let req = Request::builder()
			.method(method)
			.uri(path)
			.header(hyper::header::HOST, "authority")
			.header(hyper::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
			.body(Full::new(Bytes::from(body)))?;

		let res = sender.send_request(req).await?;
		let status = res.status().as_u16();
		let body = res.into_body().collect().await?.to_bytes();
		let value = if body.is_empty() {
			serde_json::Value::Null
		} else {
			serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null)
		};
		Ok((status, value))
	}

	/// Opens the web-session agent channel. Requires session auth.
	pub async fn get_agent(&self) -> GhResult<AgentClient<ChannelStream<client::Msg>>> {
		let guard = self.handle().await?;
		let handle =
			guard.as_ref().ok_or_else(|| Error::Internal("no tunnel connection".into()))?;
		let channel = handle.channel_open_session().await?;
		channel.request_subsystem(true, CHAN_WEB_SESSION_AGENT).await?;
		Ok(AgentClient::new(channel.into_stream()))
	}

	/// Runs the provisioning handshake: reads the minted host identity off
	/// the channel's stderr stream until EOF. Requires token auth.
	pub async fn provision(&self) -> GhResult<ProvisionedIdentity> {
		let guard = self.handle().await?;
		let handle =
			guard.as_ref().ok_or_else(|| Error::Internal("no tunnel connection".into()))?;
		let mut channel = handle.channel_open_session().await?;
		channel.request_subsystem(true, CHAN_PROVISION).await?;
		drop(guard);

		let payload = read_to_eof(&mut channel).await?;
		serde_json::from_slice(&payload)
			.map_err(|_| Error::Internal("malformed provisioning payload".into()))
	}

	/// Registers this authority's signing key with the peer and returns the
	/// peer's user CA public key. Requires token auth.
	pub async fn register_authority(&self, seal: &SealKey) -> GhResult<Box<str>> {
		let guard = self.handle().await?;
		let handle =
			guard.as_ref().ok_or_else(|| Error::Internal("no tunnel connection".into()))?;
		let mut channel = handle.channel_open_session().await?;
		channel.request_subsystem(true, CHAN_NEW_AUTH).await?;
		drop(guard);

		let payload = serde_json::to_vec(seal)?;
		channel.extended_data(1, &payload[..]).await?;
		channel.eof().await?;

		let reply = read_to_eof(&mut channel).await?;
		Ok(String::from_utf8_lossy(&reply).into())
	}
}

async fn read_to_eof(channel: &mut russh::Channel<client::Msg>) -> GhResult<Vec<u8>> {
	let mut payload = Vec::new();
	while let Some(msg) = channel.wait().await {
		match msg {
			ChannelMsg::ExtendedData { ref data, ext: 1 } => payload.extend_from_slice(data),
			ChannelMsg::Data { ref data } => payload.extend_from_slice(data),
			ChannelMsg::Eof | ChannelMsg::Close => break,
			ChannelMsg::Failure => {
				return Err(Error::BadParameter("channel request rejected".into()))
			}
			_ => {}
		}
	}
	Ok(payload)
}

// vim: ts=4
