//! SSH tunnel server: terminates SSH for nodes, proxies and web handlers,
//! then multiplexes the channel operations of the control plane onto the
//! local authority.

use russh::server::{Auth, Config, Handler, Msg, Server, Session};
use russh::{Channel, ChannelId, ChannelMsg};
use serde::{Deserialize, Serialize};
use russh::keys::{ssh_key::certificate::CertType, Certificate, PrivateKey};
use std::{collections::HashMap, net::SocketAddr, sync::Arc};
use tokio::net::{TcpListener, TcpStream};

use crate::bootstrap;
use crate::crypto::keygen;
use crate::prelude::*;
use crate::services::ca::{RemoteCert, RemoteCertKind};
use crate::tunnel::credentials::{AuthCred, CredKind};
use crate::tunnel::{agent, CHAN_NEW_AUTH, CHAN_PROVISION, CHAN_WEB_SESSION_AGENT};

/// The identity minted over a provisioning channel
#[derive(Debug, Deserialize, Serialize)]
pub struct ProvisionedIdentity {
	pub key: Vec<u8>,
	pub cert: Vec<u8>,
}

/// A peer authority's public signing key, as sent over a new-auth channel
#[derive(Debug, Deserialize, Serialize)]
pub struct SealKey {
	pub id: String,
	pub value: String,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum ChannelOp {
	WebSessionAgent,
	Provision,
	NewAuth,
}

/// Dispatch table for the subsystem channels
const CHANNEL_OPS: [(&str, ChannelOp); 3] = [
	(CHAN_WEB_SESSION_AGENT, ChannelOp::WebSessionAgent),
	(CHAN_PROVISION, ChannelOp::Provision),
	(CHAN_NEW_AUTH, ChannelOp::NewAuth),
];

fn lookup_op(name: &str) -> Option<ChannelOp> {
	CHANNEL_OPS.iter().find(|(n, _)| *n == name).map(|(_, op)| *op)
}

/// Which credential admitted the connection. Exactly one field is set after
/// a successful authentication; an unset field means reject for any channel
/// that requires it.
#[derive(Debug, Default)]
struct Extensions {
	host: Option<Box<str>>,
	web_session: Option<WebSessionExt>,
	web_password: Option<Box<str>>,
	token: Option<AuthCred>,
}

#[derive(Clone, Debug)]
struct WebSessionExt {
	user: Box<str>,
	sid: Box<str>,
}

pub struct TunServer {
	app: App,
	host_key: PrivateKey,
}

impl TunServer {
	/// Builds the tunnel server from the host key material written by
	/// `bootstrap::init`.
	pub async fn new(app: App) -> GhResult<Self> {
		let (key, _cert) = bootstrap::read_host_files(&app).await?;
		let host_key = PrivateKey::from_openssh(key.as_ref())?;
		Ok(Self { app, host_key })
	}

	fn config(&self) -> Arc<Config> {
		Arc::new(Config {
			keys: vec![self.host_key.clone()],
			auth_rejection_time: Duration::from_secs(1),
			auth_rejection_time_initial: Some(Duration::ZERO),
			inactivity_timeout: Some(Duration::from_secs(3600)),
			..Default::default()
		})
	}

	/// Serves connections from an already bound listener. Handler errors
	/// tear down their connection only; the listener stays up.
	pub async fn run_on_listener(mut self, listener: TcpListener) -> GhResult<()> {
		let config = self.config();
		info!("tunnel listening on {:?}", listener.local_addr());
		self.run_on_socket(config, &listener).await?;
		Ok(())
	}

	pub async fn run(self) -> GhResult<()> {
		let listener = TcpListener::bind(self.app.opts.tunnel_addr.as_ref()).await?;
		self.run_on_listener(listener).await
	}
}

impl Server for TunServer {
	type Handler = TunHandler;

	fn new_client(&mut self, peer: Option<SocketAddr>) -> TunHandler {
		debug!("tunnel connection from {:?}", peer);
		TunHandler {
			app: self.app.clone(),
			ext: Extensions::default(),
			channels: HashMap::new(),
		}
	}

	fn handle_session_error(&mut self, error: <Self::Handler as Handler>::Error) {
		warn!("tunnel session error: {}", error);
	}
}

pub struct TunHandler {
	app: App,
	ext: Extensions,
	channels: HashMap<ChannelId, Channel<Msg>>,
}

/// Authentication failures carry no hint about which method failed beyond
/// SSH's generic rejection.
fn reject() -> Auth {
	Auth::Reject { proceed_with_methods: None, partial_success: false }
}

impl TunHandler {
	async fn password_auth(&mut self, ssh_user: &str, password: &str) -> GhResult<()> {
		let cred = AuthCred::unmarshal(password)?;
		if cred.user.as_ref() != ssh_user {
			return Err(Error::BadParameter("credential user mismatch".into()));
		}

		let authority = &self.app.authority;
		match cred.kind {
			CredKind::Password => {
				authority.check_password(&cred.user, &cred.pass).await?;
				self.ext.web_password = Some(cred.user);
			}
			CredKind::Session => {
				authority.get_web_session(&cred.user, &cred.pass).await?;
				self.ext.web_session =
					Some(WebSessionExt { user: cred.user, sid: cred.pass });
			}
			CredKind::ProvisionToken => {
				authority.validate_token(&cred.pass, &cred.user).await?;
				// the extension keeps the full original bucket
				self.ext.token = Some(cred);
			}
		}
		Ok(())
	}

	async fn cert_auth(&mut self, user: &str, cert: &Certificate) -> GhResult<()> {
		if cert.cert_type() != CertType::Host {
			return Err(Error::BadParameter("only host certificates are accepted".into()));
		}
		let ca_pub = self.app.authority.get_host_ca_pub().await?;
		let cert = ssh_key::Certificate::from_openssh(&cert.to_openssh()?)?;
		if !keygen::cert_signed_by(&cert, &ca_pub)? {
			return Err(Error::BadParameter("certificate is not signed by the host CA".into()));
		}
		keygen::validate_cert(&cert, &ca_pub)?;
		self.ext.host = Some(user.into());
		Ok(())
	}

	async fn start_agent(&mut self, channel: Channel<Msg>) -> GhResult<()> {
		let Some(ws) = self.ext.web_session.clone() else {
			return Err(Error::BadParameter("connection has no web session grant".into()));
		};
		let data = self.app.authority.get_web_session(&ws.user, &ws.sid).await?;
		let key = ssh_key::PrivateKey::from_openssh(data.private_key.as_ref())?;
		let cert_line = data.cert.to_string();

		tokio::spawn(async move {
			if let Err(err) = agent::serve(channel.into_stream(), key, &cert_line).await {
				warn!("agent channel ended: {}", err);
			}
		});
		Ok(())
	}

	fn take_token(&self) -> GhResult<AuthCred> {
		self.ext
			.token
			.clone()
			.ok_or_else(|| Error::BadParameter("connection has no provisioning grant".into()))
	}

	fn start_provision(&mut self, channel: Channel<Msg>) -> GhResult<()> {
		let token = self.take_token()?;
		let app = self.app.clone();
		tokio::spawn(async move {
			if let Err(err) = provision(app, token, channel).await {
				warn!("provision channel failed: {}", err);
			}
		});
		Ok(())
	}

	fn start_new_auth(&mut self, channel: Channel<Msg>) -> GhResult<()> {
		let token = self.take_token()?;
		let app = self.app.clone();
		tokio::spawn(async move {
			if let Err(err) = new_auth(app, token, channel).await {
				warn!("new-auth channel failed: {}", err);
			}
		});
		Ok(())
	}
}

/// Mints a fresh host identity for the token's FQDN, writes it to the
/// channel's stderr stream and consumes the token.
async fn provision(app: App, token: AuthCred, channel: Channel<Msg>) -> GhResult<()> {
	let fqdn = token.user.as_ref();
	let pair = app.authority.generate_key_pair("").await?;
	let cert =
		app.authority.generate_host_cert(&pair.public_key, fqdn, fqdn, Duration::ZERO).await?;

	let identity = ProvisionedIdentity {
		key: pair.private_key.as_bytes().to_vec(),
		cert: cert.as_bytes().to_vec(),
	};
	let payload = serde_json::to_vec(&identity)?;

	channel.extended_data(1, &payload[..]).await?;
	channel.eof().await?;
	channel.close().await?;

	// consumed only once the identity went out
	app.authority.delete_token(&token.pass).await?;
	info!("provisioned host identity for {}", fqdn);
	Ok(())
}

/// Receives a peer authority's signing key, registers it under the token's
/// FQDN, answers with the local user CA public key and consumes the token.
async fn new_auth(app: App, token: AuthCred, mut channel: Channel<Msg>) -> GhResult<()> {
	let mut payload = Vec::new();
	while let Some(msg) = channel.wait().await {
		match msg {
			ChannelMsg::Data { ref data } => payload.extend_from_slice(data),
			ChannelMsg::ExtendedData { ref data, .. } => payload.extend_from_slice(data),
			ChannelMsg::Eof => break,
			_ => {}
		}
	}

	let seal: SealKey = serde_json::from_slice(&payload)
		.map_err(|_| Error::BadParameter("malformed seal key payload".into()))?;
	let cert = RemoteCert {
		kind: RemoteCertKind::User,
		fqdn: token.user.clone(),
		id: seal.id.into(),
		value: seal.value.into(),
	};
	app.authority.upsert_remote_cert(&cert).await?;

	let local = app.authority.get_user_ca_pub().await?;
	channel.extended_data(1, local.as_bytes()).await?;
	channel.eof().await?;
	channel.close().await?;

	app.authority.delete_token(&token.pass).await?;
	info!("registered remote authority for {}", token.user);
	Ok(())
}

async fn splice(channel: Channel<Msg>, addr: &str) -> GhResult<()> {
	let mut tcp = TcpStream::connect(addr).await?;
	let mut stream = channel.into_stream();
	tokio::io::copy_bidirectional(&mut stream, &mut tcp).await?;
	Ok(())
}

impl Handler for TunHandler {
	type Error = Error;

	async fn auth_password(&mut self, user: &str, password: &str) -> Result<Auth, Self::Error> {
		match self.password_auth(user, password).await {
			Ok(()) => Ok(Auth::Accept),
			Err(err) => {
				info!("password auth rejected for {:?}: {}", user, err);
				Ok(reject())
			}
		}
	}

	async fn auth_publickey(
		&mut self,
		user: &str,
		_public_key: &russh::keys::PublicKey,
	) -> Result<Auth, Self::Error> {
		// Raw public keys carry no trust statement; only host certificates
		// are accepted on this method.
		info!("publickey auth rejected for {:?}: not a certificate", user);
		Ok(reject())
	}

	async fn auth_openssh_certificate(
		&mut self,
		user: &str,
		certificate: &Certificate,
	) -> Result<Auth, Self::Error> {
		match self.cert_auth(user, certificate).await {
			Ok(()) => Ok(Auth::Accept),
			Err(err) => {
				info!("certificate auth rejected for {:?}: {}", user, err);
				Ok(reject())
			}
		}
	}

	async fn channel_open_session(
		&mut self,
		channel: Channel<Msg>,
		_session: &mut Session,
	) -> Result<bool, Self::Error> {
		self.channels.insert(channel.id(), channel);
		Ok(true)
	}

	async fn channel_open_direct_tcpip(
		&mut self,
		channel: Channel<Msg>,
		host_to_connect: &str,
		port_to_connect: u32,
		_originator_address: &str,
		_originator_port: u32,
		_session: &mut Session,
	) -> Result<bool, Self::Error> {
		if self.ext.host.is_none()
			&& self.ext.web_session.is_none()
			&& self.ext.web_password.is_none()
		{
			info!("direct-tcpip rejected: connection has no forwarding grant");
			return Ok(false);
		}

		// The requested destination is deliberately ignored; the tunnel
		// only ever dials the configured authority endpoint.
		debug!("direct-tcpip {}:{} -> {}", host_to_connect, port_to_connect, self.app.opts.rest_addr);
		let rest_addr = self.app.opts.rest_addr.to_string();
		tokio::spawn(async move {
			if let Err(err) = splice(channel, &rest_addr).await {
				warn!("direct-tcpip channel ended: {}", err);
			}
		});
		Ok(true)
	}

	async fn subsystem_request(
		&mut self,
		channel_id: ChannelId,
		name: &str,
		session: &mut Session,
	) -> Result<(), Self::Error> {
		let Some(op) = lookup_op(name) else {
			info!("unknown channel subsystem {:?}", name);
			session.channel_failure(channel_id)?;
			return Ok(());
		};
		let Some(channel) = self.channels.remove(&channel_id) else {
			session.channel_failure(channel_id)?;
			return Ok(());
		};

		let res = match op {
			ChannelOp::WebSessionAgent => self.start_agent(channel).await,
			ChannelOp::Provision => self.start_provision(channel),
			ChannelOp::NewAuth => self.start_new_auth(channel),
		};
		match res {
			Ok(()) => session.channel_success(channel_id)?,
			Err(err) => {
				warn!("{} rejected: {}", name, err);
				session.channel_failure(channel_id)?;
			}
		}
		Ok(())
	}
}

// vim: ts=4
